//! Query matching: recognised fragments → redaction targets.
//!
//! Pure and synchronous. A fragment becomes a target when its lower-cased
//! text contains any lower-cased query and its OCR confidence is strictly
//! above [`MIN_CONFIDENCE`]. Targets keep page order, then OCR order within
//! a page; nothing is deduplicated or merged.

use crate::error::RedactError;
use crate::model::{RecognizedFragment, RedactionTarget};
use tracing::debug;

/// Fragments at or below this OCR confidence are never redacted.
pub const MIN_CONFIDENCE: f64 = 60.0;

/// Normalised, non-empty set of query phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySet {
    queries: Vec<String>,
}

impl QuerySet {
    /// Lower-case every query and drop whitespace-only entries.
    ///
    /// An empty query would match every fragment, so a set with no usable
    /// queries is rejected.
    pub fn new<I, S>(queries: I) -> Result<Self, RedactError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let queries: Vec<String> = queries
            .into_iter()
            .filter(|q| !q.as_ref().trim().is_empty())
            .map(|q| q.as_ref().to_lowercase())
            .collect();

        if queries.is_empty() {
            return Err(RedactError::InvalidConfig(
                "at least one non-empty query is required".into(),
            ));
        }
        Ok(Self { queries })
    }

    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// Case-insensitive substring test, OR across queries.
    pub fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.queries.iter().any(|q| lower.contains(q.as_str()))
    }
}

/// Select the fragments to redact. `pages[i]` holds page `i`'s fragments.
pub fn find_targets(pages: &[Vec<RecognizedFragment>], queries: &QuerySet) -> Vec<RedactionTarget> {
    let mut targets = Vec::new();

    for (page, fragments) in pages.iter().enumerate() {
        for fragment in fragments {
            if !queries.matches(&fragment.text) {
                continue;
            }
            if fragment.confidence <= MIN_CONFIDENCE {
                debug!(
                    page = page + 1,
                    confidence = fragment.confidence,
                    "Match below confidence floor, not redacting"
                );
                continue;
            }
            targets.push(RedactionTarget {
                word: fragment.text.clone(),
                bbox: fragment.bbox,
                page,
            });
        }
    }

    debug!(targets = targets.len(), "Matching complete");
    targets
}
