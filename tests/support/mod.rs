//! In-memory PDF backend and OCR engine for pipeline tests.
//!
//! The fake "PDF" is a JSON document behind a `%PDF` header: page sizes plus
//! the rectangles drawn so far. Rendering paints those rectangles black on a
//! white page, and the fake OCR engine only reports a line when the centre
//! of its box is still visible, so a redacted document reads back without
//! the redacted text.

#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use pdf_ocr_redact::ocr::{OcrBlock, OcrLine, OcrParagraph, OcrWord};
use pdf_ocr_redact::{
    BoundingBox, EngineError, OcrEngine, OcrPage, OcrWorker, PageSize, PdfBackend,
    PdfDocumentHandle, PdfRect, PixelBuffer, RedactError, RedactionConfig,
    RedactionConfigBuilder, RedactionProgressCallback, RenderScale, RgbColor,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const HEADER: &[u8] = b"%PDF-fake\n";

// ── Fake PDF ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakePage {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub fail_render: bool,
    #[serde(default)]
    pub rects: Vec<PdfRect>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FakePdf {
    pub pages: Vec<FakePage>,
}

impl FakePdf {
    pub fn with_pages(sizes: &[(f64, f64)]) -> Self {
        Self {
            pages: sizes
                .iter()
                .map(|&(width, height)| FakePage {
                    width,
                    height,
                    fail_render: false,
                    rects: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = HEADER.to_vec();
        out.extend(serde_json::to_vec(self).expect("fake pdf serialises"));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let body = bytes.strip_prefix(HEADER)?;
        serde_json::from_slice(body).ok()
    }

    fn page(&self, index: usize) -> Result<&FakePage, EngineError> {
        self.pages
            .get(index)
            .ok_or_else(|| EngineError::new(format!("no page {index}")))
    }
}

impl PdfDocumentHandle for FakePdf {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, index: usize) -> Result<PageSize, EngineError> {
        let page = self.page(index)?;
        Ok(PageSize {
            width: page.width,
            height: page.height,
        })
    }

    fn render_page(&self, index: usize, scale: RenderScale) -> Result<DynamicImage, EngineError> {
        let page = self.page(index)?;
        if page.fail_render {
            return Err(EngineError::new("corrupt content stream"));
        }

        let s = f64::from(scale.get());
        let (w, h) = (
            (page.width * s).round() as u32,
            (page.height * s).round() as u32,
        );
        let mut img = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));

        for r in &page.rects {
            let x0 = (r.x * s).floor().max(0.0) as u32;
            let x1 = ((r.right() * s).ceil() as u32).min(w);
            let y0 = ((page.height - r.top()) * s).floor().max(0.0) as u32;
            let y1 = (((page.height - r.y) * s).ceil() as u32).min(h);
            for y in y0..y1 {
                for x in x0..x1 {
                    img.put_pixel(x, y, Rgb([0, 0, 0]));
                }
            }
        }

        Ok(DynamicImage::ImageRgb8(img))
    }

    fn draw_filled_rect(
        &mut self,
        index: usize,
        rect: PdfRect,
        _color: RgbColor,
    ) -> Result<(), EngineError> {
        self.pages
            .get_mut(index)
            .ok_or_else(|| EngineError::new(format!("no page {index}")))?
            .rects
            .push(rect);
        Ok(())
    }

    fn save(&self) -> Result<Vec<u8>, EngineError> {
        Ok(self.to_bytes())
    }
}

#[derive(Default)]
pub struct FakeBackend {
    opened: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn documents_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl PdfBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake-pdf"
    }

    fn with_document(
        &self,
        pdf: Vec<u8>,
        _password: Option<&str>,
        f: &mut dyn FnMut(&mut dyn PdfDocumentHandle) -> Result<(), RedactError>,
    ) -> Result<(), RedactError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let mut doc = FakePdf::from_bytes(&pdf).ok_or_else(|| RedactError::CorruptPdf {
            detail: "not a fake pdf".into(),
        })?;
        f(&mut doc)
    }
}

// ── Fake OCR ────────────────────────────────────────────────────────────

/// A line of text as it appears on the page, in reference space.
#[derive(Debug, Clone)]
pub struct TruthLine {
    pub text: String,
    pub bbox: BoundingBox,
    pub confidence: f64,
}

pub fn line(text: &str, (x0, y0, x1, y1): (f64, f64, f64, f64), confidence: f64) -> TruthLine {
    TruthLine {
        text: text.into(),
        bbox: BoundingBox::new(x0, y0, x1, y1),
        confidence,
    }
}

pub struct FakeOcr {
    scale: f64,
    pages: Arc<Vec<Vec<TruthLine>>>,
    fail_on: Option<usize>,
    panic_on: Option<usize>,
    delay: Option<Duration>,
    unavailable: bool,
    started: AtomicUsize,
    terminated: Arc<AtomicUsize>,
    recognized: Arc<AtomicUsize>,
}

impl FakeOcr {
    /// `scale` must match the render scale of the run.
    pub fn new(scale: f32, pages: Vec<Vec<TruthLine>>) -> Self {
        Self {
            scale: f64::from(scale),
            pages: Arc::new(pages),
            fail_on: None,
            panic_on: None,
            delay: None,
            unavailable: false,
            started: AtomicUsize::new(0),
            terminated: Arc::new(AtomicUsize::new(0)),
            recognized: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_on(mut self, page_index: usize) -> Self {
        self.fail_on = Some(page_index);
        self
    }

    pub fn panicking_on(mut self, page_index: usize) -> Self {
        self.panic_on = Some(page_index);
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn workers_started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn workers_terminated(&self) -> usize {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Pages the workers finished recognising.
    pub fn pages_recognized(&self) -> usize {
        self.recognized.load(Ordering::SeqCst)
    }
}

impl OcrEngine for FakeOcr {
    fn name(&self) -> &str {
        "fake-ocr"
    }

    fn start_worker(&self) -> Result<Box<dyn OcrWorker>, RedactError> {
        if self.unavailable {
            return Err(RedactError::OcrEngineUnavailable {
                engine: "fake-ocr".into(),
                hint: "not installed".into(),
            });
        }
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeWorker {
            scale: self.scale,
            pages: Arc::clone(&self.pages),
            fail_on: self.fail_on,
            panic_on: self.panic_on,
            delay: self.delay,
            terminated: Arc::clone(&self.terminated),
            recognized: Arc::clone(&self.recognized),
        }))
    }
}

struct FakeWorker {
    scale: f64,
    pages: Arc<Vec<Vec<TruthLine>>>,
    fail_on: Option<usize>,
    panic_on: Option<usize>,
    delay: Option<Duration>,
    terminated: Arc<AtomicUsize>,
    recognized: Arc<AtomicUsize>,
}

impl FakeWorker {
    fn visible(&self, image: &DynamicImage, bbox: &BoundingBox) -> bool {
        let cx = ((bbox.x0 + bbox.x1) / 2.0).max(0.0) as u32;
        let cy = ((bbox.y0 + bbox.y1) / 2.0).max(0.0) as u32;
        if cx >= image.width() || cy >= image.height() {
            return true;
        }
        let px = image.to_rgb8().get_pixel(cx, cy).0;
        px != [0, 0, 0]
    }
}

impl OcrWorker for FakeWorker {
    fn recognize(&mut self, page: &PixelBuffer) -> Result<OcrPage, EngineError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail_on == Some(page.page_index) {
            return Err(EngineError::new("engine crashed"));
        }
        if self.panic_on == Some(page.page_index) {
            panic!("engine aborted on page {}", page.page_index + 1);
        }

        let truth = self.pages.get(page.page_index).cloned().unwrap_or_default();
        let lines: Vec<OcrLine> = truth
            .iter()
            .map(|t| (t, t.bbox.descale(1.0 / self.scale)))
            .filter(|(_, raster_box)| self.visible(&page.image, raster_box))
            .map(|(t, raster_box)| {
                let words = t
                    .text
                    .split_whitespace()
                    .map(|w| OcrWord {
                        text: w.to_string(),
                        bbox: raster_box,
                        confidence: t.confidence,
                    })
                    .collect();
                OcrLine::from_words(raster_box, words)
            })
            .collect();

        let text = lines
            .iter()
            .map(|l| l.text.clone())
            .collect::<Vec<_>>()
            .join("\n");
        self.recognized.fetch_add(1, Ordering::SeqCst);
        Ok(OcrPage {
            text,
            blocks: vec![OcrBlock {
                bbox: None,
                paragraphs: vec![OcrParagraph { bbox: None, lines }],
            }],
        })
    }

    fn terminate(&mut self) -> Result<(), EngineError> {
        self.terminated.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Progress recorder ───────────────────────────────────────────────────

#[derive(Default)]
pub struct EventLog {
    pub events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn push(&self, e: String) {
        self.events.lock().unwrap().push(e);
    }
}

impl RedactionProgressCallback for EventLog {
    fn on_run_start(&self, total_pages: usize) {
        self.push(format!("start:{total_pages}"));
    }

    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        self.push(format!("rendered:{page_num}/{total_pages}"));
    }

    fn on_page_recognized(&self, page_num: usize, total_pages: usize, fragments: usize) {
        self.push(format!("recognized:{page_num}/{total_pages}:{fragments}"));
    }

    fn on_targets_found(&self, count: usize) {
        self.push(format!("targets:{count}"));
    }

    fn on_run_complete(&self, applied: usize, skipped: usize) {
        self.push(format!("complete:{applied}/{skipped}"));
    }
}

// ── Config helpers ──────────────────────────────────────────────────────

/// Builder wired to the fakes at render scale 2.0.
pub fn fake_config(backend: &Arc<FakeBackend>, ocr: &Arc<FakeOcr>) -> RedactionConfigBuilder {
    RedactionConfig::builder()
        .render_scale(2.0)
        .pdf_backend(backend.clone())
        .ocr_engine(ocr.clone())
}

/// Install a test subscriber once so `tracing` output shows on failure.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("pdf_ocr_redact=debug"))
        .with_test_writer()
        .try_init();
}
