//! Top-level facade for the question-answering pipeline.
//!
//! Wires identifier resolution, transcript fetching, indexing, the retrieval
//! engine, and the session registry into the single
//! `answer_for(video, query)` contract used by the CLI and the HTTP server.

use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::index::IndexBuilder;
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::rag::RetrievalEngine;
use crate::session::{SessionInfo, SessionRegistry};
use crate::transcript::{TranscriptFetcher, YoutubeTranscriptFetcher};
use crate::video_id::VideoId;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Conversational Q&A service over YouTube transcripts.
pub struct VideoChat {
    settings: Settings,
    fetcher: Arc<dyn TranscriptFetcher>,
    index_builder: IndexBuilder,
    engine: RetrievalEngine,
    registry: SessionRegistry,
}

impl VideoChat {
    /// Create a service with the default providers (YouTube captions,
    /// OpenAI embeddings and chat).
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let fetcher = Arc::new(YoutubeTranscriptFetcher::new(
            &settings.transcript.language,
            Duration::from_secs(settings.transcript.timeout_seconds),
        )?);
        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));
        let chat = Arc::new(OpenAIChatModel::new(&settings.rag.model));

        Self::with_components(settings, prompts, fetcher, embedder, chat)
    }

    /// Create a service with custom providers. Used by tests to inject fakes.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        fetcher: Arc<dyn TranscriptFetcher>,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let index_builder = IndexBuilder::new(
            embedder.clone(),
            settings.chunking.chunk_size,
            settings.chunking.chunk_overlap,
        );
        let engine = RetrievalEngine::new(
            chat,
            embedder,
            prompts,
            settings.rag.temperature,
            settings.rag.top_k,
            settings.rag.max_history_turns,
        );
        let registry = SessionRegistry::new(settings.session.capacity);

        Ok(Self {
            settings,
            fetcher,
            index_builder,
            engine,
            registry,
        })
    }

    /// Answer a question about a video, creating its session on first use.
    ///
    /// Answer calls against the same session are serialized: the history
    /// lock is held across retrieval, generation, and the turn append.
    #[instrument(skip(self, query), fields(input = %video_id_or_url))]
    pub async fn answer_for(&self, video_id_or_url: &str, query: &str) -> Result<String> {
        let id = VideoId::resolve(video_id_or_url)?;

        let session = self
            .registry
            .get_or_create(&id, || async {
                let transcript = self.fetcher.fetch(&id).await?;
                self.index_builder.build(&transcript.text()).await
            })
            .await?;

        let mut history = session.history().lock().await;
        self.engine
            .answer(session.index(), &mut history, query)
            .await
    }

    /// Drop the session for a video, if one exists.
    pub async fn evict(&self, video_id_or_url: &str) -> Result<bool> {
        let id = VideoId::resolve(video_id_or_url)?;
        Ok(self.registry.evict(&id).await)
    }

    /// Snapshot of active sessions.
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        self.registry.list().await
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
