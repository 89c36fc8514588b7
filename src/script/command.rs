//! Script conversion through an external filter process.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use super::{Script, ScriptConverter};
use crate::error::{Error, Result};

/// Runs a stdin → stdout filter such as `opencc -c s2tw.json`.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a shell-style command line.
    #[cfg(feature = "cli")]
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = shell_words::split(command)
            .map_err(|e| Error::InvalidConfig(format!("bad converter command: {e}")))?;
        if parts.is_empty() {
            return Err(Error::InvalidConfig("converter command is empty".into()));
        }
        let program = parts.remove(0);
        Ok(Self::new(program, parts))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ScriptConverter for CommandConverter {
    fn convert(&self, text: &str, from: Script, to: Script) -> Result<String> {
        if from == to {
            return Ok(text.to_string());
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Converter(format!("cannot start {}: {e}", self.program)))?;

        // stdin is written on its own thread while wait_with_output drains
        // stdout and stderr together.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Converter("converter stdin unavailable".into()))?;
        let input = text.as_bytes().to_vec();
        let feeder = std::thread::spawn(move || stdin.write_all(&input));

        let output = child.wait_with_output();
        let fed = feeder.join();
        let output =
            output.map_err(|e| Error::Converter(format!("waiting for converter: {e}")))?;

        if !output.status.success() {
            return Err(Error::Converter(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        match fed {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::Converter(format!("writing converter input: {e}"))),
            Err(_) => return Err(Error::Converter("converter input thread panicked".into())),
        }

        let stdout = output.stdout;
        debug!(program = %self.program, bytes = stdout.len(), "external conversion done");
        String::from_utf8(stdout).map_err(|e| Error::Converter(format!("non-UTF-8 output: {e}")))
    }
}
