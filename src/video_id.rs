//! Canonical YouTube video identifiers.
//!
//! A video ID is an 11-character token from the alphabet `[0-9A-Za-z_-]`.
//! Inputs may be bare IDs or URLs that embed the ID after `v=` or a path
//! separator.

use crate::error::{Result, TubetalkError};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

const ID_LEN: usize = 11;

fn bare_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9A-Za-z_-]{11}$").expect("Invalid regex"))
}

fn embedded_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("Invalid regex"))
}

/// A validated 11-character YouTube video identifier.
///
/// No `Deserialize` impl; external input must go through [`VideoId::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Resolve a raw input string (bare ID or URL) to a canonical video ID.
    ///
    /// A bare 11-character token that is not scheme-prefixed is accepted as
    /// is; otherwise the input is searched for `v=<id>` or `/<id>` and the
    /// first match wins.
    pub fn resolve(input: &str) -> Result<Self> {
        let input = input.trim();

        if input.len() == ID_LEN && !input.starts_with("http") {
            if bare_id_regex().is_match(input) {
                return Ok(Self(input.to_string()));
            }
            return Err(TubetalkError::InvalidIdentifier(input.to_string()));
        }

        if let Some(caps) = embedded_id_regex().captures(input) {
            return Ok(Self(caps[1].to_string()));
        }

        Err(TubetalkError::InvalidIdentifier(input.to_string()))
    }

    /// The raw 11-character identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for VideoId {
    type Err = TubetalkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s)
    }
}
