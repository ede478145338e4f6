//! OCR engine boundary.
//!
//! An [`OcrEngine`] is a factory; an [`OcrWorker`] is the stateful, scoped
//! resource that actually recognises pages. The recogniser acquires exactly
//! one worker per run, uses it for every page in order, and terminates it on
//! every exit path. Workers are not assumed to tolerate concurrent calls,
//! which `&mut self` on [`OcrWorker::recognize`] enforces.
//!
//! Engines report what they see in the *pixel buffer's own* coordinate space,
//! as a block → paragraph → line → word tree ([`OcrPage`]). Descaling and
//! flattening belong to [`crate::pipeline::recognize`].

pub mod tesseract;

use crate::error::{EngineError, RedactError};
use crate::model::{BoundingBox, PixelBuffer};
use serde::{Deserialize, Serialize};

/// Factory for OCR workers.
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs and errors.
    fn name(&self) -> &str;

    /// Acquire a worker. Fails with [`RedactError::OcrEngineUnavailable`]
    /// when the engine cannot be started at all.
    fn start_worker(&self) -> Result<Box<dyn OcrWorker>, RedactError>;
}

/// A started OCR engine instance.
pub trait OcrWorker: Send {
    /// Recognise one page.
    fn recognize(&mut self, page: &PixelBuffer) -> Result<OcrPage, EngineError>;

    /// Release the worker's resources. Called exactly once.
    fn terminate(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Engine output for one page, in raster space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    pub text: String,
    pub blocks: Vec<OcrBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrBlock {
    pub bbox: Option<BoundingBox>,
    pub paragraphs: Vec<OcrParagraph>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrParagraph {
    pub bbox: Option<BoundingBox>,
    pub lines: Vec<OcrLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    pub bbox: BoundingBox,
    /// 0–100.
    pub confidence: f64,
    pub words: Vec<OcrWord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub bbox: BoundingBox,
    pub confidence: f64,
}

impl OcrPage {
    /// Every line on the page in reading order.
    pub fn lines(&self) -> impl Iterator<Item = &OcrLine> {
        self.blocks
            .iter()
            .flat_map(|b| b.paragraphs.iter())
            .flat_map(|p| p.lines.iter())
    }
}

impl OcrLine {
    /// Build a line from its words: text joined by single spaces, confidence
    /// the mean of word confidences.
    pub fn from_words(bbox: BoundingBox, words: Vec<OcrWord>) -> Self {
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let confidence = if words.is_empty() {
            0.0
        } else {
            words.iter().map(|w| w.confidence).sum::<f64>() / words.len() as f64
        };
        Self {
            text,
            bbox,
            confidence,
            words,
        }
    }
}
