//! Tubetalk - Conversational Q&A over YouTube transcripts
//!
//! Ask natural-language questions about what is said in a YouTube video.
//! Tubetalk fetches the video's transcript, builds a semantic index over it,
//! and answers questions grounded in the most relevant transcript passages,
//! keeping conversational context per video.
//!
//! # Overview
//!
//! Tubetalk allows you to:
//! - Resolve a YouTube URL or bare ID to a canonical video identifier
//! - Fetch and index the spoken-text transcript of a video
//! - Ask follow-up questions in a conversation scoped to that video
//! - Serve the whole pipeline over a small HTTP API
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `video_id` - Video identifier resolution
//! - `transcript` - Transcript fetching
//! - `chunking` - Recursive text splitting
//! - `embedding` - Embedding generation
//! - `index` - In-memory semantic index
//! - `llm` - Chat model abstraction
//! - `rag` - Conversational retrieval engine
//! - `session` - Per-video session registry
//! - `service` - Top-level facade wiring everything together
//!
//! # Example
//!
//! ```rust,no_run
//! use tubetalk::config::Settings;
//! use tubetalk::service::VideoChat;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let chat = VideoChat::new(settings)?;
//!
//!     let answer = chat
//!         .answer_for("https://youtube.com/watch?v=dQw4w9WgXcQ", "What is this video about?")
//!         .await?;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod llm;
pub mod openai;
pub mod rag;
pub mod service;
pub mod session;
pub mod transcript;
pub mod video_id;

pub use error::{Result, TubetalkError};
