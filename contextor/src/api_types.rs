//! Public result types re-used by external crates (e.g., the HTTP API layer).

use serde::Serialize;

/// Retrieval result: filtered context and the prompt built from it.
///
/// `context` and `similar_docs` are empty when nothing was relevant; `prompt`
/// is never empty.
///
/// # Example
/// ```
/// use contextor::RetrievalOutcome;
/// let r = RetrievalOutcome::default();
/// assert!(r.similar_docs.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RetrievalOutcome {
    /// Newline-joined texts of `similar_docs`.
    pub context: String,
    /// Relevant chunk texts, best first.
    pub similar_docs: Vec<String>,
    pub prompt: String,
}

/// Final answer together with the documents it was grounded on.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QaAnswer {
    pub answer: String,
    pub similar_docs: Vec<String>,
    pub context: String,
}

impl QaAnswer {
    pub(crate) fn from_outcome(answer: String, outcome: RetrievalOutcome) -> Self {
        Self {
            answer,
            similar_docs: outcome.similar_docs,
            context: outcome.context,
        }
    }

    pub(crate) fn canned(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            similar_docs: Vec::new(),
            context: String::new(),
        }
    }
}
