//! Captcha recognition
//!
//! The recognizer is a black box: image bytes in, best-effort text out, no
//! confidence signal.

use std::io::Write;
use std::process::{ChildStdin, Command, Stdio};
use thiserror::Error;

/// Number of characters the panel's captcha always has
pub const CAPTCHA_CODE_LEN: usize = 4;

/// Errors raised while recognizing a captcha
#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("Failed to run OCR program '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("OCR program '{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("OCR output is not UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Recognizer error: {0}")]
    Recognizer(String),
}

/// Result type for captcha recognition
pub type CaptchaResult<T> = Result<T, CaptchaError>;

/// Something that turns captcha image bytes into text
pub trait CaptchaSolver: Send + Sync {
    /// Returns the recognizer's best guess for `image`
    fn classify(&self, image: &[u8]) -> CaptchaResult<String>;
}

impl<F> CaptchaSolver for F
where
    F: Fn(&[u8]) -> CaptchaResult<String> + Send + Sync,
{
    fn classify(&self, image: &[u8]) -> CaptchaResult<String> {
        self(image)
    }
}

/// Solver that pipes the image to an external OCR program
///
/// The program receives the raw image on stdin and must print the code on stdout.
/// Surrounding whitespace in the output is dropped.
#[derive(Debug, Clone)]
pub struct CommandSolver {
    program: String,
    args: Vec<String>,
}

impl CommandSolver {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Builds a solver from the `[captcha]` config section
    pub fn from_config(config: &crate::config::CaptchaConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

impl CaptchaSolver for CommandSolver {
    /// Runs the program to completion; call it off the async runtime
    fn classify(&self, image: &[u8]) -> CaptchaResult<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CaptchaError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // stdin is fed from its own thread while stdout drains, so a program that
        // writes before it finishes reading cannot stall on a full pipe
        let stdin = child.stdin.take();
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || feed_stdin(stdin, image));
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output?;
        written.map_err(|_| CaptchaError::Recognizer("stdin writer panicked".to_string()))??;

        if !output.status.success() {
            return Err(CaptchaError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8(output.stdout)?;
        Ok(text.trim().to_string())
    }
}

/// Writes the image and closes stdin
///
/// A program that exits without reading stdin is judged by its exit status.
fn feed_stdin(stdin: Option<ChildStdin>, image: &[u8]) -> CaptchaResult<()> {
    if let Some(mut stdin) = stdin {
        match stdin.write_all(image) {
            Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e.into()),
            _ => {}
        }
    }
    Ok(())
}

/// Checks that a recognized code has exactly `CAPTCHA_CODE_LEN` characters
pub fn is_usable_code(code: &str) -> bool {
    code.chars().count() == CAPTCHA_CODE_LEN
}
