use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai_llm_service::AiLlmError;
use contextor::{
    ContextorConfig, ContextorError, GREETING_REPLY, GenerateFuture, NO_CONTEXT_FALLBACK,
    NoopProgress, TextGenerator, TravelAssistant,
};
use rag_store::{EmbeddingsProvider, InMemoryIndex, IndexBackend, RagConfig, RagError, RagFuture};
use tempfile::NamedTempFile;

const JOURNEY: &str = r#"{
  "flights": [{"flight_number": "AI 101", "departure_airport": "DEL", "arrival_airport": "LHR", "departure": "2024-07-11T14:35:00"}],
  "hotels": [{"name": "Savoy", "city": "London", "nights": 4}],
  "traveler": {"name": "Ada Lovelace"}
}"#;

const FLIGHT_QUESTION: &str = "When is my flight?";
const WEAK_QUESTION: &str = "What is the weather like?";

/// Flight chunks point along x, everything else along y. Queries are placed so
/// that their cosine with the flight chunks is 0.82 or 0.4.
struct ScoredEmbedder {
    calls: AtomicUsize,
}

fn unit_with_x(x: f32) -> Vec<f32> {
    vec![x, 0.0, (1.0 - x * x).sqrt()]
}

impl EmbeddingsProvider for ScoredEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> RagFuture<'a, Vec<f32>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match text {
                FLIGHT_QUESTION => Ok(unit_with_x(0.82)),
                WEAK_QUESTION => Ok(unit_with_x(0.4)),
                "boom" => Err(RagError::Embedding("embedding endpoint timed out".into())),
                t if t.contains("\"flights\"") => Ok(vec![1.0, 0.0, 0.0]),
                _ => Ok(vec![0.0, 1.0, 0.0]),
            }
        })
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_id(&self) -> &str {
        "scored-stub"
    }
}

#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl TextGenerator for RecordingGenerator {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async move {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(AiLlmError::Timeout(Duration::from_secs(60)).into());
            }
            Ok("Your flight AI 101 departs on 11 July 2024 at 14:35.".to_string())
        })
    }
}

struct Fixture {
    assistant: TravelAssistant,
    embedder: Arc<ScoredEmbedder>,
    generator: Arc<RecordingGenerator>,
    _source: NamedTempFile,
}

async fn fixture(fail_generation: bool) -> Fixture {
    let mut source = NamedTempFile::new().unwrap();
    source.write_all(JOURNEY.as_bytes()).unwrap();

    let mut rag = RagConfig::new_default("http://localhost:6334", "trips");
    rag.backend = IndexBackend::Memory;
    rag.dimension = 3;
    rag.chunk_max_chars = 130;
    rag.source_path = source.path().to_path_buf();

    let embedder = Arc::new(ScoredEmbedder {
        calls: AtomicUsize::new(0),
    });
    let generator = Arc::new(RecordingGenerator {
        fail: fail_generation,
        ..Default::default()
    });
    let assistant = TravelAssistant::new(
        ContextorConfig::new(rag),
        Arc::new(InMemoryIndex::new()),
        embedder.clone(),
        generator.clone(),
        Arc::new(NoopProgress),
    )
    .await
    .unwrap();

    Fixture {
        assistant,
        embedder,
        generator,
        _source: source,
    }
}

#[tokio::test]
async fn relevant_chunk_passes_threshold() {
    let f = fixture(false).await;
    let out = f.assistant.get_answer(FLIGHT_QUESTION).await.unwrap();

    assert_eq!(out.similar_docs.len(), 1);
    assert!(out.similar_docs[0].contains("AI 101"));
    assert!(!out.context.contains("Savoy"));
    assert_eq!(out.context, out.similar_docs[0]);
    assert!(out.prompt.contains(&out.context));
    assert!(out.prompt.contains(FLIGHT_QUESTION));
}

#[tokio::test]
async fn nothing_relevant_uses_fallback() {
    let f = fixture(false).await;
    let out = f.assistant.get_answer(WEAK_QUESTION).await.unwrap();

    assert_eq!(out.context, "");
    assert!(out.similar_docs.is_empty());
    assert!(out.prompt.contains(NO_CONTEXT_FALLBACK));
    assert!(out.prompt.contains(WEAK_QUESTION));
}

#[tokio::test]
async fn lower_threshold_admits_more_documents() {
    let f = fixture(false).await;
    let out = f
        .assistant
        .retrieve(WEAK_QUESTION, Some(3), Some(0.0))
        .await
        .unwrap();
    assert!(!out.similar_docs.is_empty());
    assert!(out.similar_docs[0].contains("AI 101"));
}

#[tokio::test]
async fn ask_sends_the_grounding_prompt() {
    let f = fixture(false).await;
    let qa = f.assistant.ask(FLIGHT_QUESTION, None, None).await.unwrap();

    assert!(qa.answer.contains("AI 101"));
    assert_eq!(qa.similar_docs.len(), 1);
    let prompts = f.generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(&qa.context));
}

#[tokio::test]
async fn greeting_skips_retrieval_and_generation() {
    let f = fixture(false).await;
    let before = f.embedder.calls.load(Ordering::SeqCst);

    let qa = f.assistant.ask("  Good Morning ", None, None).await.unwrap();

    assert_eq!(qa.answer, GREETING_REPLY);
    assert!(qa.similar_docs.is_empty());
    assert_eq!(f.embedder.calls.load(Ordering::SeqCst), before);
    assert!(f.generator.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_parameters_are_rejected() {
    let f = fixture(false).await;
    let err = f.assistant.retrieve(FLIGHT_QUESTION, Some(0), None).await.unwrap_err();
    assert!(err.is_invalid_query(), "{err}");

    let err = f.assistant.retrieve(FLIGHT_QUESTION, None, Some(1.5)).await.unwrap_err();
    assert!(err.is_invalid_query(), "{err}");
}

#[tokio::test]
async fn embedding_failure_is_surfaced() {
    let f = fixture(false).await;
    let err = f.assistant.ask("boom", None, None).await.unwrap_err();
    assert!(matches!(err, ContextorError::Rag(RagError::Embedding(_))), "{err}");
    assert!(err.is_transient());
    assert!(f.generator.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn generation_failure_is_an_llm_error() {
    let f = fixture(true).await;
    let err = f.assistant.ask(FLIGHT_QUESTION, None, None).await.unwrap_err();
    assert!(matches!(err, ContextorError::Llm(_)), "{err}");
}
