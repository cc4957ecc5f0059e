//! Grounding prompt: fixed instructions around the retrieved context and the
//! user's question.

use std::borrow::Cow;
use std::path::Path;

use rag_store::RagError;

/// Context used when nothing passes the relevance threshold.
pub const NO_CONTEXT_FALLBACK: &str = "No relevant information found in the travel documents.";

const CONTEXT: &str = "{context}";
const QUESTION: &str = "{question}";

const BUILTIN_HEAD: &str = "You are a helpful travel assistant. Using the JSON travel information \
provided between <context> tags, answer the question between <question> tags.

<context>
";

const BUILTIN_MIDDLE: &str = "
</context>

<question>
";

const BUILTIN_TAIL: &str = "
</question>

Instructions:
- If the information contains flight details, include the flight number, departure/arrival times, and airports
- If the requested information is not found in the context, say so clearly
- Keep the response concise and focused on the question
- If dates and times are mentioned, format them clearly so the user can understand them like this: 11 July 2024 at 14:35

Please provide your response in a clear, natural language format.
";

/// Which placeholder comes first in the template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Order {
    ContextFirst,
    QuestionFirst,
}

/// A template with exactly one `{context}` and one `{question}` placeholder,
/// pre-split so rendering is a single concatenation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    head: Cow<'static, str>,
    middle: Cow<'static, str>,
    tail: Cow<'static, str>,
    order: Order,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptTemplate {
    /// The travel assistant template.
    pub const fn builtin() -> Self {
        Self {
            head: Cow::Borrowed(BUILTIN_HEAD),
            middle: Cow::Borrowed(BUILTIN_MIDDLE),
            tail: Cow::Borrowed(BUILTIN_TAIL),
            order: Order::ContextFirst,
        }
    }

    /// Parses an operator-supplied template.
    ///
    /// # Errors
    /// [`RagError::Config`] unless `{context}` and `{question}` each occur exactly once.
    pub fn parse(raw: &str) -> Result<Self, RagError> {
        for p in [CONTEXT, QUESTION] {
            let n = raw.matches(p).count();
            if n != 1 {
                return Err(RagError::Config(format!(
                    "prompt template must contain {p} exactly once, found {n}"
                )));
            }
        }
        let (first, second, order) = match (raw.find(CONTEXT), raw.find(QUESTION)) {
            (Some(c), Some(q)) if c < q => (CONTEXT, QUESTION, Order::ContextFirst),
            _ => (QUESTION, CONTEXT, Order::QuestionFirst),
        };
        let (head, rest) = raw.split_once(first).unwrap_or((raw, ""));
        let (middle, tail) = rest.split_once(second).unwrap_or((rest, ""));
        Ok(Self {
            head: Cow::Owned(head.to_string()),
            middle: Cow::Owned(middle.to_string()),
            tail: Cow::Owned(tail.to_string()),
            order,
        })
    }

    /// Reads and parses a template file.
    ///
    /// # Errors
    /// [`RagError::Io`] if the file cannot be read, otherwise as [`parse`](Self::parse).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RagError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Substitutes both placeholders in one pass; placeholder-like text inside
    /// `context` or `question` is left as is.
    pub fn render(&self, context: &str, question: &str) -> String {
        let (first, second) = match self.order {
            Order::ContextFirst => (context, question),
            Order::QuestionFirst => (question, context),
        };
        let mut out = String::with_capacity(
            self.head.len() + self.middle.len() + self.tail.len() + context.len() + question.len(),
        );
        out.push_str(&self.head);
        out.push_str(first);
        out.push_str(&self.middle);
        out.push_str(second);
        out.push_str(&self.tail);
        out
    }
}
