//! YouTube caption track fetching.
//!
//! Resolves caption tracks via yt-dlp metadata and downloads the track in
//! json3 format.

use super::{Transcript, TranscriptFetcher, TranscriptSegment};
use crate::error::{Result, TubetalkError};
use crate::video_id::VideoId;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Transcript fetcher backed by YouTube caption tracks.
pub struct YoutubeTranscriptFetcher {
    http: reqwest::Client,
    command: String,
    language: String,
    timeout: Duration,
}

impl YoutubeTranscriptFetcher {
    /// Create a fetcher for the given caption language. The timeout bounds
    /// both the metadata subprocess and the caption download.
    pub fn new(language: &str, timeout: Duration) -> Result<Self> {
        Self::with_command("yt-dlp", language, timeout)
    }

    fn with_command(command: &str, language: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TubetalkError::TranscriptFetch(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            command: command.to_string(),
            language: language.to_string(),
            timeout,
        })
    }

    /// Fetch video metadata using yt-dlp.
    async fn fetch_metadata(&self, id: &VideoId) -> Result<serde_json::Value> {
        let run = tokio::process::Command::new(&self.command)
            .args([
                "--dump-json",
                "--no-download",
                "--no-warnings",
                &id.watch_url(),
            ])
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                TubetalkError::TranscriptFetch(format!(
                    "{} timed out after {:?}",
                    self.command, self.timeout
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TubetalkError::ToolNotFound(self.command.clone())
                } else {
                    TubetalkError::TranscriptFetch(format!("Failed to run {}: {}", self.command, e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("Video unavailable")
                || stderr.contains("This video is not available")
                || stderr.contains("Private video")
            {
                return Err(TubetalkError::VideoUnavailable);
            }
            return Err(TubetalkError::TranscriptFetch(format!(
                "{} failed for {}: {}",
                self.command, id, stderr
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            TubetalkError::TranscriptFetch(format!("Failed to parse {} output: {}", self.command, e))
        })
    }

    /// Find the json3 caption track URL for the configured language.
    ///
    /// Manual subtitles are preferred over automatic captions; an exact
    /// language match is preferred over a regional variant (en vs en-US).
    fn caption_url(&self, metadata: &serde_json::Value) -> Option<String> {
        for field in ["subtitles", "automatic_captions"] {
            let tracks = match metadata[field].as_object() {
                Some(t) => t,
                None => continue,
            };

            let key = if tracks.contains_key(&self.language) {
                Some(self.language.clone())
            } else {
                tracks
                    .keys()
                    .find(|k| k.starts_with(&format!("{}-", self.language)))
                    .cloned()
            };

            if let Some(key) = key {
                if let Some(formats) = tracks[&key].as_array() {
                    let track = formats
                        .iter()
                        .find(|f| f["ext"].as_str() == Some("json3"))
                        .or_else(|| formats.first());
                    if let Some(url) = track.and_then(|t| t["url"].as_str()) {
                        return Some(url.to_string());
                    }
                }
            }
        }
        None
    }

    /// Parse a json3 caption document into ordered segments.
    fn parse_json3(document: &serde_json::Value) -> Vec<TranscriptSegment> {
        let events = match document["events"].as_array() {
            Some(events) => events,
            None => return Vec::new(),
        };

        let mut segments = Vec::new();
        for event in events {
            let segs = match event["segs"].as_array() {
                Some(segs) => segs,
                None => continue,
            };

            let text: String = segs
                .iter()
                .filter_map(|s| s["utf8"].as_str())
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");

            if text.is_empty() {
                continue;
            }

            let start_ms = event["tStartMs"].as_f64().unwrap_or(0.0);
            let duration_ms = event["dDurationMs"].as_f64().unwrap_or(0.0);

            segments.push(TranscriptSegment::new(
                text,
                start_ms / 1000.0,
                duration_ms / 1000.0,
            ));
        }
        segments
    }
}

#[async_trait]
impl TranscriptFetcher for YoutubeTranscriptFetcher {
    #[instrument(skip(self), fields(video_id = %id))]
    async fn fetch(&self, id: &VideoId) -> Result<Transcript> {
        let metadata = self.fetch_metadata(id).await?;

        let url = self
            .caption_url(&metadata)
            .ok_or(TubetalkError::TranscriptUnavailable)?;

        debug!("Downloading caption track for {}", id);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TubetalkError::TranscriptFetch(format!("Caption download: {}", e)))?;

        if !response.status().is_success() {
            return Err(TubetalkError::TranscriptFetch(format!(
                "Caption download returned {}",
                response.status()
            )));
        }

        let document: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TubetalkError::TranscriptFetch(format!("Caption parse: {}", e)))?;

        let segments = Self::parse_json3(&document);
        if segments.is_empty() {
            return Err(TubetalkError::TranscriptUnavailable);
        }

        debug!("Fetched {} caption segments for {}", segments.len(), id);
        Ok(Transcript::new(id.clone(), segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json3() {
        let document = serde_json::json!({
            "events": [
                {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "hello "}, {"utf8": "world"}]},
                {"tStartMs": 1500, "dDurationMs": 500, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 2000, "dDurationMs": 1000, "segs": [{"utf8": "again"}]},
                {"tStartMs": 3000, "dDurationMs": 1000}
            ]
        });

        let segments = YoutubeTranscriptFetcher::parse_json3(&document);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "hello world");
        assert!((segments[0].start_seconds - 0.0).abs() < f64::EPSILON);
        assert!((segments[0].duration_seconds - 1.5).abs() < f64::EPSILON);
        assert_eq!(segments[1].text, "again");
        assert!((segments[1].start_seconds - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_caption_url_prefers_manual_subtitles() {
        let fetcher = YoutubeTranscriptFetcher::new("en", Duration::from_secs(10)).unwrap();
        let metadata = serde_json::json!({
            "subtitles": {
                "en": [{"ext": "json3", "url": "https://example.com/manual"}]
            },
            "automatic_captions": {
                "en": [{"ext": "json3", "url": "https://example.com/auto"}]
            }
        });

        assert_eq!(
            fetcher.caption_url(&metadata).as_deref(),
            Some("https://example.com/manual")
        );
    }

    #[test]
    fn test_caption_url_falls_back_to_regional_variant() {
        let fetcher = YoutubeTranscriptFetcher::new("en", Duration::from_secs(10)).unwrap();
        let metadata = serde_json::json!({
            "automatic_captions": {
                "en-US": [{"ext": "json3", "url": "https://example.com/en-us"}]
            }
        });

        assert_eq!(
            fetcher.caption_url(&metadata).as_deref(),
            Some("https://example.com/en-us")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_metadata_fetch_times_out() {
        use std::os::unix::fs::PermissionsExt;

        // A stand-in metadata command that hangs well past the timeout.
        let script = std::env::temp_dir().join(format!("tubetalk-slow-{}", std::process::id()));
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();

        let fetcher = YoutubeTranscriptFetcher::with_command(
            script.to_str().unwrap(),
            "en",
            Duration::from_millis(50),
        )
        .unwrap();
        let id = VideoId::resolve("dQw4w9WgXcQ").unwrap();

        let result = fetcher.fetch_metadata(&id).await;
        std::fs::remove_file(&script).ok();

        match result {
            Err(TubetalkError::TranscriptFetch(msg)) => {
                assert!(msg.contains("timed out"), "unexpected message: {}", msg)
            }
            other => panic!("expected a timeout error, got {:?}", other),
        }
    }

    #[test]
    fn test_caption_url_missing_language() {
        let fetcher = YoutubeTranscriptFetcher::new("en", Duration::from_secs(10)).unwrap();
        let metadata = serde_json::json!({
            "subtitles": {
                "de": [{"ext": "json3", "url": "https://example.com/de"}]
            }
        });

        assert!(fetcher.caption_url(&metadata).is_none());
    }
}
