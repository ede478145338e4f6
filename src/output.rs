//! Result types returned by the redaction entry points.

use crate::error::SkipReason;
use crate::model::{PageSize, PdfRect, RenderScale};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of one redaction run.
///
/// "Nothing matched" is an ordinary outcome, not an error: the caller keeps
/// the original document and no redacted copy is produced.
#[derive(Debug, Clone)]
pub enum RedactionOutcome {
    /// At least one target was found. The document may still have zero
    /// applied rectangles if every target was skipped; check
    /// `report.stats.skipped`.
    Redacted(RedactedDocument),
    /// No fragment matched any query above the confidence floor.
    NothingToRedact(RedactionReport),
}

impl RedactionOutcome {
    pub fn report(&self) -> &RedactionReport {
        match self {
            RedactionOutcome::Redacted(doc) => &doc.report,
            RedactionOutcome::NothingToRedact(report) => report,
        }
    }

    pub fn is_redacted(&self) -> bool {
        matches!(self, RedactionOutcome::Redacted(_))
    }

    pub fn into_document(self) -> Option<RedactedDocument> {
        match self {
            RedactionOutcome::Redacted(doc) => Some(doc),
            RedactionOutcome::NothingToRedact(_) => None,
        }
    }
}

/// A redacted PDF: the serialised bytes plus what was done to produce them.
///
/// The bytes are an ordinary PDF and may be fed straight back in as input.
#[derive(Debug, Clone)]
pub struct RedactedDocument {
    pub bytes: Vec<u8>,
    pub report: RedactionReport,
}

/// Everything a caller needs to judge a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedactionReport {
    /// Normalised queries the run matched against.
    pub queries: Vec<String>,
    pub render_scale: RenderScale,
    pub stats: RedactionStats,
    /// Rectangles drawn, in target order.
    pub redactions: Vec<AppliedRedaction>,
}

/// Aggregate counts and timings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionStats {
    pub total_pages: usize,
    /// Recognised lines across all pages.
    pub fragments: usize,
    /// Matched, confidence-passing fragments.
    pub targets: usize,
    pub applied: usize,
    pub skipped: usize,
    pub skipped_by_reason: BTreeMap<SkipReason, usize>,
    pub render_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub redact_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// One rectangle drawn on the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedRedaction {
    /// 0-based page index.
    pub page: usize,
    /// The recognised line that matched.
    pub word: String,
    /// PDF-space rectangle (bottom-left origin, points).
    pub rect: PdfRect,
}

/// Result of a multi-pass run.
#[derive(Debug, Clone)]
pub struct RedactionPasses {
    /// Output of the last pass that found targets, or `None` when the first
    /// pass found nothing to redact. A pass whose targets were all skipped
    /// still saves a document; it carries no new rectangles.
    pub document: Option<RedactedDocument>,
    /// One report per pass actually run, in order.
    pub reports: Vec<RedactionReport>,
}

/// Page layout of a PDF, read without rasterising or OCR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    /// Page sizes in points.
    pub pages: Vec<PageSize>,
    pub file_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_accessors() {
        let report = RedactionReport {
            queries: vec!["secret".into()],
            ..Default::default()
        };
        let nothing = RedactionOutcome::NothingToRedact(report.clone());
        assert!(!nothing.is_redacted());
        assert_eq!(nothing.report().queries, ["secret"]);
        assert!(nothing.into_document().is_none());

        let done = RedactionOutcome::Redacted(RedactedDocument {
            bytes: b"%PDF".to_vec(),
            report,
        });
        assert!(done.is_redacted());
        assert_eq!(done.into_document().unwrap().bytes, b"%PDF");
    }

    #[test]
    fn report_json_shape() {
        let mut stats = RedactionStats {
            total_pages: 1,
            targets: 2,
            applied: 1,
            skipped: 1,
            ..Default::default()
        };
        stats.skipped_by_reason.insert(SkipReason::InvalidBox, 1);
        let report = RedactionReport {
            queries: vec!["acme".into()],
            render_scale: RenderScale::default(),
            stats,
            redactions: vec![],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["render_scale"], 2.0);
        assert_eq!(json["stats"]["skipped_by_reason"]["invalid_box"], 1);

        let back: RedactionReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
