//! Command string construction.
//!
//! The host receives plain `<verb> <argument...>` strings and does its own
//! parsing; this side only concatenates. The verb and any fixed arguments
//! are configuration, so verb variants are config entries rather than
//! forked dispatchers.

use serde::{Deserialize, Serialize};

/// Template for the command sent on each accepted trigger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandSpec {
    /// Command verb, the first word on the wire
    pub verb: String,

    /// Fixed arguments inserted between the verb and the URL
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// The download command of the reference deployment:
    /// `dostuff ytdl.exe <url>`.
    pub fn dostuff() -> Self {
        Self {
            verb: "dostuff".to_string(),
            args: vec!["ytdl.exe".to_string()],
        }
    }

    /// The echo command variant: `mirror <url>`.
    pub fn mirror() -> Self {
        Self {
            verb: "mirror".to_string(),
            args: Vec::new(),
        }
    }

    /// Build the command string for a URL: verb, fixed arguments and URL
    /// joined by single spaces, URL unescaped.
    pub fn build(&self, url: &str) -> String {
        let mut parts = Vec::with_capacity(2 + self.args.len());
        parts.push(self.verb.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.push(url);
        parts.join(" ")
    }
}

impl Default for CommandSpec {
    fn default() -> Self {
        Self::dostuff()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dostuff_command() {
        let spec = CommandSpec::dostuff();
        assert_eq!(
            spec.build("https://example.com/x"),
            "dostuff ytdl.exe https://example.com/x"
        );
    }

    #[test]
    fn test_mirror_command() {
        let spec = CommandSpec::mirror();
        assert_eq!(
            spec.build("https://example.com/x"),
            "mirror https://example.com/x"
        );
    }

    #[test]
    fn test_url_is_not_escaped() {
        let spec = CommandSpec::mirror();
        assert_eq!(
            spec.build("https://example.com/watch?v=a b&c=d"),
            "mirror https://example.com/watch?v=a b&c=d"
        );
    }
}
