//! Line-oriented command protocol
//!
//! One command per input line, one JSON reply per output line:
//!
//! - `init <lang>`
//! - `read_text <path> [<lang>]` (path and language may be double-quoted)
//! - `close`

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::vision::ReadOutcome;

/// Language used when `read_text` does not name one
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid command")]
    UnknownCommand(String),
    #[error("Missing image path")]
    MissingPath,
    #[error("Unterminated quote in {0:?}")]
    UnterminatedQuote(String),
}

/// A parsed protocol command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Init { language: String },
    ReadText { path: PathBuf, language: String },
    Close,
}

impl Command {
    /// Parse one input line; blank lines yield `Ok(None)`
    pub fn parse(line: &str) -> Result<Option<Self>, ProtocolError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (line, ""),
        };

        let command = match name {
            "init" => Command::Init {
                language: non_empty_or_default(unquote(args)),
            },
            "read_text" => {
                let (path, rest) = split_first_argument(args)?;
                if path.is_empty() {
                    return Err(ProtocolError::MissingPath);
                }
                Command::ReadText {
                    path: PathBuf::from(path),
                    language: non_empty_or_default(unquote(rest.trim())),
                }
            }
            "close" => Command::Close,
            other => return Err(ProtocolError::UnknownCommand(other.to_string())),
        };

        Ok(Some(command))
    }
}

/// Split off the first argument, honouring a leading double-quoted span
fn split_first_argument(args: &str) -> Result<(&str, &str), ProtocolError> {
    if let Some(quoted) = args.strip_prefix('"') {
        let end = quoted
            .find('"')
            .ok_or_else(|| ProtocolError::UnterminatedQuote(args.to_string()))?;
        return Ok((&quoted[..end], &quoted[end + 1..]));
    }

    Ok(match args.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest),
        None => (args, ""),
    })
}

fn unquote(s: &str) -> &str {
    s.trim_matches('"')
}

fn non_empty_or_default(s: &str) -> String {
    if s.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        s.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
}

/// One JSON reply line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub langs: Option<String>,
    #[serde(flatten)]
    pub outcome: Option<ReadOutcome>,
}

impl Response {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: Some(message.into()),
            langs: None,
            outcome: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            langs: None,
            outcome: None,
        }
    }

    pub fn initialized(language: &str) -> Self {
        Self {
            langs: Some(language.to_string()),
            ..Self::success(format!("OCR engine initialized for {}", language))
        }
    }

    pub fn read(outcome: ReadOutcome) -> Self {
        Self {
            status: Status::Success,
            message: None,
            langs: None,
            outcome: Some(outcome),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Serialize to a single line of JSON
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "status": "error", "message": e.to_string() }).to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(Command::parse("   \n"), Ok(None));
    }

    #[test]
    fn test_parse_init() {
        assert_eq!(
            Command::parse("init ja\n"),
            Ok(Some(Command::Init {
                language: "ja".to_string()
            }))
        );
        assert_eq!(
            Command::parse("init"),
            Ok(Some(Command::Init {
                language: "en".to_string()
            }))
        );
    }

    #[test]
    fn test_parse_read_text_defaults_language() {
        assert_eq!(
            Command::parse("read_text /tmp/page.png"),
            Ok(Some(Command::ReadText {
                path: PathBuf::from("/tmp/page.png"),
                language: "en".to_string()
            }))
        );
    }

    #[test]
    fn test_parse_read_text_quoted() {
        assert_eq!(
            Command::parse(r#"read_text "/tmp/my pages/01.png" "ja""#),
            Ok(Some(Command::ReadText {
                path: PathBuf::from("/tmp/my pages/01.png"),
                language: "ja".to_string()
            }))
        );
    }

    #[test]
    fn test_parse_read_text_errors() {
        assert_eq!(Command::parse("read_text"), Err(ProtocolError::MissingPath));
        assert!(matches!(
            Command::parse(r#"read_text "/tmp/open.png"#),
            Err(ProtocolError::UnterminatedQuote(_))
        ));
    }

    #[test]
    fn test_parse_unknown() {
        let err = Command::parse("explode now").unwrap_err();
        assert_eq!(err, ProtocolError::UnknownCommand("explode".to_string()));
        assert_eq!(err.to_string(), "Invalid command");
    }

    #[test]
    fn test_parse_close() {
        assert_eq!(Command::parse("close"), Ok(Some(Command::Close)));
    }

    #[test]
    fn test_response_json() {
        assert_eq!(
            Response::error("Image not found: x.png").to_json_line(),
            r#"{"status":"error","message":"Image not found: x.png"}"#
        );
        assert_eq!(
            Response::initialized("ja").to_json_line(),
            r#"{"status":"success","message":"OCR engine initialized for ja","langs":"ja"}"#
        );
    }

    #[test]
    fn test_read_response_flattens_outcome() {
        let outcome = ReadOutcome {
            data: vec![],
            paragraphs: vec![],
            stats: None,
            message: Some("No text detected in image".to_string()),
        };
        let value: serde_json::Value =
            serde_json::from_str(&Response::read(outcome).to_json_line()).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["data"], serde_json::json!([]));
        assert_eq!(value["paragraphs"], serde_json::json!([]));
        assert_eq!(value["message"], "No text detected in image");
        assert!(value.get("stats").is_none());
    }
}
