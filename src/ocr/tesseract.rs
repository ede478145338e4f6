//! Tesseract OCR via its command-line interface in TSV mode.
//!
//! Each worker owns a scratch [`TempDir`]; a page is written there as PNG,
//! `tesseract <png> stdout -l <lang> --psm <n> tsv` is run against it, and
//! the TSV rows are folded into an [`OcrPage`] tree:
//!
//! ```text
//! level page block par line word left top width height conf text
//!   2   block
//!   3     paragraph
//!   4       line           (conf = -1, no text)
//!   5         word         (conf 0–100, text)
//! ```
//!
//! Line text and confidence are rebuilt from the words, since tesseract
//! leaves both empty on line rows.

use super::{OcrBlock, OcrEngine, OcrLine, OcrPage, OcrParagraph, OcrWord, OcrWorker};
use crate::config::RedactionConfig;
use crate::error::{EngineError, RedactError};
use crate::model::{BoundingBox, PixelBuffer};
use crate::pipeline::encode;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info};

/// Factory for tesseract workers.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
    psm: u8,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>, psm: u8) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
            psm,
        }
    }

    pub fn from_config(config: &RedactionConfig) -> Self {
        Self::new(
            config.tesseract_path.clone(),
            config.ocr_language.clone(),
            config.page_segmentation_mode,
        )
    }

    fn unavailable(&self, detail: String) -> RedactError {
        RedactError::OcrEngineUnavailable {
            engine: "tesseract".to_string(),
            hint: format!(
                "Could not run '{}': {}\n\
                Install tesseract-ocr (with the '{}' language data) or point \
                --tesseract at the executable.",
                self.binary.display(),
                detail,
                self.language
            ),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn start_worker(&self) -> Result<Box<dyn OcrWorker>, RedactError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|e| self.unavailable(e.to_string()))?;
        if !output.status.success() {
            return Err(self.unavailable(format!("--version exited with {}", output.status)));
        }

        let version = String::from_utf8_lossy(&output.stdout);
        info!(
            "Starting tesseract worker ({}), lang={}, psm={}",
            version.lines().next().unwrap_or("unknown version").trim(),
            self.language,
            self.psm
        );

        let scratch = TempDir::new()
            .map_err(|e| RedactError::Internal(format!("OCR scratch directory: {e}")))?;

        Ok(Box::new(TesseractWorker {
            engine: self.clone(),
            scratch: Some(scratch),
        }))
    }
}

struct TesseractWorker {
    engine: TesseractEngine,
    scratch: Option<TempDir>,
}

impl OcrWorker for TesseractWorker {
    fn recognize(&mut self, page: &PixelBuffer) -> Result<OcrPage, EngineError> {
        let scratch = self
            .scratch
            .as_ref()
            .ok_or_else(|| EngineError::new("worker already terminated"))?;

        let png = encode::encode_png(&page.image)
            .map_err(|e| EngineError::new(format!("PNG encoding failed: {e}")))?;
        let image_path = scratch
            .path()
            .join(format!("page-{:04}.png", page.page_index + 1));
        std::fs::write(&image_path, &png)
            .map_err(|e| EngineError::new(format!("writing {}: {e}", image_path.display())))?;

        let output = Command::new(&self.engine.binary)
            .arg(&image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.engine.language)
            .arg("--psm")
            .arg(self.engine.psm.to_string())
            .arg("tsv")
            .output()
            .map_err(|e| EngineError::new(format!("failed to run tesseract: {e}")))?;

        // Best effort: the whole directory goes away on terminate anyway.
        let _ = std::fs::remove_file(&image_path);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::new(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let parsed = parse_tsv(&tsv)?;
        debug!(
            "tesseract page {}: {} blocks, {} bytes of text",
            page.page_index + 1,
            parsed.blocks.len(),
            parsed.text.len()
        );
        Ok(parsed)
    }

    fn terminate(&mut self) -> Result<(), EngineError> {
        match self.scratch.take() {
            Some(dir) => dir
                .close()
                .map_err(|e| EngineError::new(format!("removing OCR scratch directory: {e}"))),
            None => Ok(()),
        }
    }
}

/// Fold tesseract TSV output into a block/paragraph/line/word tree.
pub fn parse_tsv(tsv: &str) -> Result<OcrPage, EngineError> {
    let mut blocks: Vec<OcrBlock> = Vec::new();

    for (line_no, row) in tsv.lines().enumerate() {
        if row.trim().is_empty() || row.starts_with("level") {
            continue;
        }
        let cols: Vec<&str> = row.splitn(12, '\t').collect();
        if cols.len() < 11 {
            return Err(malformed(line_no, "expected at least 11 columns"));
        }

        let num = |i: usize| -> Result<f64, EngineError> {
            cols[i]
                .trim()
                .parse::<f64>()
                .map_err(|_| malformed(line_no, &format!("column {} is not numeric", i + 1)))
        };
        let level = num(0)? as u8;
        let (left, top, width, height) = (num(6)?, num(7)?, num(8)?, num(9)?);
        let conf = num(10)?;
        let text = cols.get(11).map(|t| t.trim()).unwrap_or("");
        let bbox = BoundingBox::new(left, top, left + width, top + height);

        match level {
            1 => {}
            2 => blocks.push(OcrBlock {
                bbox: Some(bbox),
                paragraphs: Vec::new(),
            }),
            3 => blocks
                .last_mut()
                .ok_or_else(|| malformed(line_no, "paragraph outside a block"))?
                .paragraphs
                .push(OcrParagraph {
                    bbox: Some(bbox),
                    lines: Vec::new(),
                }),
            4 => blocks
                .last_mut()
                .and_then(|b| b.paragraphs.last_mut())
                .ok_or_else(|| malformed(line_no, "line outside a paragraph"))?
                .lines
                .push(OcrLine::from_words(bbox, Vec::new())),
            5 => {
                if text.is_empty() {
                    continue;
                }
                blocks
                    .last_mut()
                    .and_then(|b| b.paragraphs.last_mut())
                    .and_then(|p| p.lines.last_mut())
                    .ok_or_else(|| malformed(line_no, "word outside a line"))?
                    .words
                    .push(OcrWord {
                        text: text.to_string(),
                        bbox,
                        confidence: conf.max(0.0),
                    });
            }
            other => {
                return Err(malformed(line_no, &format!("unknown level {other}")));
            }
        }
    }

    let mut page_text = Vec::new();
    for line in blocks
        .iter_mut()
        .flat_map(|b| b.paragraphs.iter_mut())
        .flat_map(|p| p.lines.iter_mut())
    {
        let words = std::mem::take(&mut line.words);
        *line = OcrLine::from_words(line.bbox, words);
        if !line.text.is_empty() {
            page_text.push(line.text.clone());
        }
    }

    Ok(OcrPage {
        text: page_text.join("\n"),
        blocks,
    })
}

fn malformed(line_no: usize, what: &str) -> EngineError {
    EngineError::new(format!("malformed tesseract TSV at line {}: {}", line_no + 1, what))
}
