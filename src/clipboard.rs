//! Copying measurement IDs to the system clipboard.
//!
//! Strategies are tried in order; the first that succeeds wins.

use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("{0} is not available")]
    Unavailable(&'static str),
    #[error("{tool} failed: {reason}")]
    Failed { tool: String, reason: String },
    #[error("no clipboard strategy succeeded")]
    Exhausted,
}

pub trait ClipboardStrategy: Send {
    fn name(&self) -> &'static str;
    fn copy(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Pipe `text` into a helper program's stdin
fn pipe_to(program: &str, args: &[&str], text: &str) -> Result<(), ClipboardError> {
    let failed = |reason: String| ClipboardError::Failed {
        tool: program.to_string(),
        reason,
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| failed(e.to_string()))?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(text.as_bytes()) {
            drop(stdin);
            // reap the helper so it does not linger as a zombie
            let _ = child.kill();
            let _ = child.wait();
            return Err(failed(e.to_string()));
        }
    }

    let status = child.wait().map_err(|e| failed(e.to_string()))?;
    if status.success() {
        Ok(())
    } else {
        Err(failed(format!("exit status {}", status)))
    }
}

/// First candidate whose program is on PATH
fn locate(candidates: &[(&'static str, &'static [&'static str])]) -> Option<(&'static str, &'static [&'static str])> {
    candidates
        .iter()
        .find(|(program, _)| which::which(program).is_ok())
        .copied()
}

/// Platform clipboard service (Wayland, macOS, Windows)
pub struct SystemClipboard;

impl ClipboardStrategy for SystemClipboard {
    fn name(&self) -> &'static str {
        "system clipboard"
    }

    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        const CANDIDATES: &[(&str, &[&str])] =
            &[("wl-copy", &[]), ("pbcopy", &[]), ("clip", &[]), ("clip.exe", &[])];
        let (program, args) = locate(CANDIDATES).ok_or(ClipboardError::Unavailable(self.name()))?;
        pipe_to(program, args, text)
    }
}

/// X11 selection owners, for sessions without a clipboard service
pub struct SelectionClipboard;

impl ClipboardStrategy for SelectionClipboard {
    fn name(&self) -> &'static str {
        "X selection"
    }

    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        const CANDIDATES: &[(&str, &[&str])] = &[
            ("xclip", &["-selection", "clipboard"]),
            ("xsel", &["--clipboard", "--input"]),
        ];
        let (program, args) = locate(CANDIDATES).ok_or(ClipboardError::Unavailable(self.name()))?;
        pipe_to(program, args, text)
    }
}

pub struct Clipboard {
    strategies: Vec<Box<dyn ClipboardStrategy>>,
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new(vec![Box::new(SystemClipboard), Box::new(SelectionClipboard)])
    }
}

impl Clipboard {
    pub fn new(strategies: Vec<Box<dyn ClipboardStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn copy_text(&self, text: &str) -> Result<(), ClipboardError> {
        for strategy in &self.strategies {
            match strategy.copy(text) {
                Ok(()) => {
                    debug!(strategy = strategy.name(), "Copied to clipboard");
                    return Ok(());
                }
                Err(e) => debug!(strategy = strategy.name(), "Clipboard strategy failed: {}", e),
            }
        }
        warn!("Failed to copy to clipboard");
        Err(ClipboardError::Exhausted)
    }
}
