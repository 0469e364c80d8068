//! Transcript acquisition for YouTube videos.
//!
//! Provides a trait-based interface so the pipeline can be tested against
//! fake providers.

mod youtube;

pub use youtube::YoutubeTranscriptFetcher;

use crate::error::Result;
use crate::video_id::VideoId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single timed caption segment from the transcript provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Spoken text of this segment.
    pub text: String,
    /// Start offset in seconds.
    pub start_seconds: f64,
    /// Duration in seconds.
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    pub fn new(text: String, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text,
            start_seconds,
            duration_seconds,
        }
    }
}

/// An ordered transcript for one video.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Video this transcript belongs to.
    pub video_id: VideoId,
    /// Segments in chronological order.
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    pub fn new(video_id: VideoId, segments: Vec<TranscriptSegment>) -> Self {
        Self { video_id, segments }
    }

    /// The full spoken text, segments joined with single spaces in order.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Fetch the transcript for a video in the configured default language.
    ///
    /// A single attempt per call; retries are the caller's concern.
    async fn fetch(&self, id: &VideoId) -> Result<Transcript>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_joins_segments_in_order() {
        let id = VideoId::resolve("dQw4w9WgXcQ").unwrap();
        let transcript = Transcript::new(
            id,
            vec![
                TranscriptSegment::new("never gonna".to_string(), 0.0, 1.5),
                TranscriptSegment::new(" give you up ".to_string(), 1.5, 1.5),
                TranscriptSegment::new("".to_string(), 3.0, 0.5),
                TranscriptSegment::new("never gonna let you down".to_string(), 3.5, 2.0),
            ],
        );

        assert_eq!(
            transcript.text(),
            "never gonna give you up never gonna let you down"
        );
    }
}
