//! Reader Session
//!
//! Owns the OCR engine handle for one protocol session and drives the
//! stdin/stdout command loop. The engine is created on demand for the
//! requested language, re-created when the language changes, and released
//! on `close` or when the session is dropped.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::protocol::{Command, Response};
use crate::vision::{self, EngineConfig, OcrEngine};

/// Builds an engine for a given configuration
pub type EngineFactory = Box<dyn Fn(EngineConfig) -> Result<OcrEngine> + Send>;

/// State of one command session
pub struct ReaderSession {
    config: AppConfig,
    engine: Option<OcrEngine>,
    factory: EngineFactory,
}

impl ReaderSession {
    /// Create a session whose engines read recognizer sidecar files
    pub fn new(config: AppConfig) -> Self {
        Self::with_engine_factory(config, Box::new(OcrEngine::new))
    }

    /// Create a session with a custom engine factory
    pub fn with_engine_factory(config: AppConfig, factory: EngineFactory) -> Self {
        Self {
            config,
            engine: None,
            factory,
        }
    }

    /// Language of the live engine, if any
    pub fn engine_language(&self) -> Option<&str> {
        self.engine.as_ref().map(OcrEngine::language)
    }

    /// Get the engine for `language`, creating or replacing it as needed
    fn engine_for(&mut self, language: &str) -> Result<&mut OcrEngine> {
        let reusable = self
            .engine
            .as_ref()
            .is_some_and(|engine| engine.language() == language);

        if !reusable {
            info!("Initializing OCR engine for language: {}", language);
            self.engine = None;
            let config = EngineConfig::from_settings(&self.config.ocr, language);
            self.engine = Some((self.factory)(config)?);
        }

        // Populated just above when missing
        self.engine
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("OCR engine unavailable"))
    }

    /// Handle `init <lang>`
    pub fn init(&mut self, language: &str) -> Response {
        match self.engine_for(language) {
            Ok(_) => Response::initialized(language),
            Err(e) => {
                error!("Failed to initialize OCR engine: {:#}", e);
                Response::error(format!("Failed to initialize OCR engine: {:#}", e))
            }
        }
    }

    /// Handle `read_text <path> <lang>`
    pub fn read_text(&mut self, path: &Path, language: &str) -> Response {
        if !path.exists() {
            return Response::error(format!("Image not found: {}", path.display()));
        }

        let config = self.config.clone();
        let result = self
            .engine_for(language)
            .and_then(|engine| vision::read_text(engine, path, &config));

        match result {
            Ok(outcome) => Response::read(outcome),
            Err(e) => {
                error!("Error processing image {:?}: {:#}", path, e);
                Response::error(format!("Error processing image: {:#}", e))
            }
        }
    }

    /// Handle `close`
    pub fn close(&mut self) -> Response {
        if let Some(engine) = self.engine.take() {
            info!("Releasing OCR engine ({})", engine.language());
        }
        Response::success("OCR cleaned up")
    }

    /// Handle one input line
    ///
    /// Returns `None` for blank lines, otherwise the reply and whether the
    /// session should stop.
    pub fn handle_line(&mut self, line: &str) -> Option<(Response, bool)> {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return None,
            Err(e) => return Some((Response::error(e.to_string()), false)),
        };

        debug!("Processing: {:?}", command);

        Some(match command {
            Command::Init { language } => (self.init(&language), false),
            Command::ReadText { path, language } => (self.read_text(&path, &language), false),
            Command::Close => (self.close(), true),
        })
    }
}

impl Drop for ReaderSession {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            debug!("Dropping OCR engine ({})", engine.language());
        }
    }
}

/// Read commands from `input` and write one JSON reply line each to `output`
///
/// Stops after `close` or at end of input. A line that is not valid UTF-8
/// gets an error reply and the loop keeps going.
pub fn run_command_loop<R: BufRead, W: Write>(
    session: &mut ReaderSession,
    mut input: R,
    mut output: W,
) -> Result<()> {
    info!("OCR server ready");
    info!("Supported commands: init <lang>, read_text <path> <lang>, close");

    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let reply = match std::str::from_utf8(&buf) {
            Ok(line) => session.handle_line(line.trim_end_matches(['\r', '\n'])),
            Err(e) => {
                warn!("Discarding undecodable command line: {}", e);
                Some((Response::error(format!("Invalid UTF-8 in command: {}", e)), false))
            }
        };
        let Some((response, stop)) = reply else {
            continue;
        };

        writeln!(output, "{}", response.to_json_line())?;
        output.flush()?;

        if stop {
            break;
        }
    }

    info!("OCR server stopped");
    Ok(())
}
