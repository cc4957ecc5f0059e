//! Question answering over the travel data.
//!
//! Public API: [`TravelAssistant`]. It provisions the index once, then for
//! each question embeds it, keeps the relevant chunks, renders the grounding
//! prompt and hands it to a [`TextGenerator`].

mod api_types;
pub mod assistant;
pub mod cfg;
mod error;
pub mod llm;
pub mod prompt;
pub mod retrieve;

pub use api_types::{QaAnswer, RetrievalOutcome};
pub use assistant::{GREETING_REPLY, TravelAssistant, is_greeting};
pub use cfg::ContextorConfig;
pub use error::ContextorError;
pub use llm::{GenerateFuture, TextGenerator};
pub use prompt::{NO_CONTEXT_FALLBACK, PromptTemplate};
pub use retrieve::Retriever;

pub use rag_store::progress::{IndicatifProgress, NoopProgress, Progress};
