//! Answer generation grounded in retrieved transcript chunks.

use super::{DialogueHistory, DialogueTurn};
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::index::{ScoredChunk, SemanticIndex};
use crate::llm::{ChatMessage, ChatModel};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Conversational retrieval engine.
///
/// Stateless over sessions: the index and dialogue history are owned by the
/// session and passed into each call. Retrieval is scoped per question so
/// answers stay grounded in the currently relevant passages even as the
/// conversation topic shifts.
pub struct RetrievalEngine {
    chat: Arc<dyn ChatModel>,
    embedder: Arc<dyn Embedder>,
    prompts: Prompts,
    temperature: f32,
    top_k: usize,
    max_history_turns: usize,
}

impl RetrievalEngine {
    pub fn new(
        chat: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
        prompts: Prompts,
        temperature: f32,
        top_k: usize,
        max_history_turns: usize,
    ) -> Self {
        Self {
            chat,
            embedder,
            prompts,
            temperature,
            top_k,
            max_history_turns,
        }
    }

    /// Answer a question against the given index and history.
    ///
    /// The new turn is appended only after generation succeeds; on any
    /// failure the history is left unmodified.
    #[instrument(skip(self, index, history), fields(question = %question, turns = history.len()))]
    pub async fn answer(
        &self,
        index: &SemanticIndex,
        history: &mut DialogueHistory,
        question: &str,
    ) -> Result<String> {
        info!("Processing question");

        let query_embedding = self.embedder.embed(question).await?;
        let chunks = index.search(&query_embedding, self.top_k);
        debug!("Retrieved {} context chunks", chunks.len());

        let messages = self.build_messages(&chunks, history, question);
        let answer = self.chat.complete(&messages, self.temperature).await?;

        history.push(DialogueTurn::new(question, answer.clone()));
        Ok(answer)
    }

    /// Assemble the prompt: system instructions, prior dialogue turns, then
    /// the new question with its retrieved context.
    fn build_messages(
        &self,
        chunks: &[ScoredChunk],
        history: &DialogueHistory,
        question: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(self.prompts.rag.system.clone())];

        let start = history.len().saturating_sub(self.max_history_turns);
        for turn in &history[start..] {
            messages.push(ChatMessage::user(turn.question.clone()));
            messages.push(ChatMessage::assistant(turn.answer.clone()));
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context(chunks));

        messages.push(ChatMessage::user(
            self.prompts.render_with_custom(&self.prompts.rag.user, &vars),
        ));

        messages
    }
}

/// Format retrieved chunks as numbered excerpts for the prompt.
fn format_context(chunks: &[ScoredChunk]) -> String {
    if chunks.is_empty() {
        return "(no relevant transcript excerpts found)".to_string();
    }

    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("---\n[{}]\n{}\n---", i + 1, chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TubetalkError;
    use crate::index::IndexEntry;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Embeds every text to a fixed unit vector.
    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| self.0.clone()).collect())
        }

        fn dimensions(&self) -> usize {
            self.0.len()
        }
    }

    /// Records every request and replays scripted answers.
    struct ScriptedChat {
        requests: Mutex<Vec<Vec<ChatMessage>>>,
        answers: Mutex<Vec<Result<String>>>,
    }

    impl ScriptedChat {
        fn new(answers: Vec<Result<String>>) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                answers: Mutex::new(answers),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChat {
        async fn complete(&self, messages: &[ChatMessage], _temperature: f32) -> Result<String> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.answers.lock().unwrap().remove(0)
        }
    }

    fn test_index() -> SemanticIndex {
        SemanticIndex::from_entries(vec![
            IndexEntry {
                content: "the speaker explains ownership".to_string(),
                embedding: vec![1.0, 0.0],
            },
            IndexEntry {
                content: "closing remarks and thanks".to_string(),
                embedding: vec![0.0, 1.0],
            },
        ])
    }

    fn engine(chat: Arc<ScriptedChat>) -> RetrievalEngine {
        RetrievalEngine::new(
            chat,
            Arc::new(FixedEmbedder(vec![1.0, 0.0])),
            Prompts::default(),
            0.3,
            5,
            10,
        )
    }

    #[tokio::test]
    async fn test_answer_appends_turn() {
        let chat = Arc::new(ScriptedChat::new(vec![
            Ok("first answer".to_string()),
            Ok("second answer".to_string()),
        ]));
        let engine = engine(chat.clone());
        let index = test_index();
        let mut history = DialogueHistory::new();

        let a1 = engine
            .answer(&index, &mut history, "What is the video about?")
            .await
            .unwrap();
        let a2 = engine
            .answer(&index, &mut history, "Can you give an example?")
            .await
            .unwrap();

        assert_eq!(a1, "first answer");
        assert_eq!(a2, "second answer");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "What is the video about?");
        assert_eq!(history[1].answer, "second answer");
    }

    #[tokio::test]
    async fn test_second_prompt_includes_first_turn() {
        let chat = Arc::new(ScriptedChat::new(vec![
            Ok("it's about Rust".to_string()),
            Ok("sure".to_string()),
        ]));
        let engine = engine(chat.clone());
        let index = test_index();
        let mut history = DialogueHistory::new();

        engine
            .answer(&index, &mut history, "What is the video about?")
            .await
            .unwrap();
        engine
            .answer(&index, &mut history, "Can you give an example?")
            .await
            .unwrap();

        let requests = chat.requests.lock().unwrap();
        let second = &requests[1];

        // system + first Q + first A + new question
        assert_eq!(second.len(), 4);
        assert_eq!(second[1].content, "What is the video about?");
        assert_eq!(second[2].content, "it's about Rust");
        assert!(second[3].content.contains("Can you give an example?"));
    }

    #[tokio::test]
    async fn test_prompt_contains_retrieved_context() {
        let chat = Arc::new(ScriptedChat::new(vec![Ok("ok".to_string())]));
        let engine = engine(chat.clone());
        let index = test_index();
        let mut history = DialogueHistory::new();

        engine
            .answer(&index, &mut history, "What about ownership?")
            .await
            .unwrap();

        let requests = chat.requests.lock().unwrap();
        let user_message = &requests[0].last().unwrap().content;
        assert!(user_message.contains("the speaker explains ownership"));
        assert!(user_message.contains("What about ownership?"));
    }

    #[tokio::test]
    async fn test_failure_leaves_history_unmodified() {
        let chat = Arc::new(ScriptedChat::new(vec![Err(TubetalkError::Generation(
            "model exploded".to_string(),
        ))]));
        let engine = engine(chat);
        let index = test_index();
        let mut history = DialogueHistory::new();

        let result = engine.answer(&index, &mut history, "anything?").await;

        assert!(matches!(result, Err(TubetalkError::Generation(_))));
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_history_trimmed_in_prompt() {
        let answers: Vec<Result<String>> = (0..12).map(|i| Ok(format!("answer {}", i))).collect();
        let chat = Arc::new(ScriptedChat::new(answers));
        let engine = RetrievalEngine::new(
            chat.clone(),
            Arc::new(FixedEmbedder(vec![1.0, 0.0])),
            Prompts::default(),
            0.3,
            5,
            3,
        );
        let index = test_index();
        let mut history = DialogueHistory::new();

        for i in 0..12 {
            engine
                .answer(&index, &mut history, &format!("question {}", i))
                .await
                .unwrap();
        }

        // Full history is kept on the session even though the prompt only
        // carries the most recent turns.
        assert_eq!(history.len(), 12);

        let requests = chat.requests.lock().unwrap();
        let last = requests.last().unwrap();
        // system + 3 trimmed turns (Q+A each) + new question
        assert_eq!(last.len(), 1 + 3 * 2 + 1);
        assert_eq!(last[1].content, "question 8");
    }

    #[test]
    fn test_format_context_empty() {
        assert!(format_context(&[]).contains("no relevant transcript excerpts"));
    }
}
