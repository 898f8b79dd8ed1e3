use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::instrument;
use wait_timeout::ChildExt;

pub const DEFAULT_PROGRAM: &str = "file";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How to run the external content-identification program.
///
/// The program is invoked as `<program> <args...> <path>` and is expected to
/// print `<path>: <description>` on standard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}
impl Default for MagicCommand {
    fn default() -> Self {
        Self { program: DEFAULT_PROGRAM.to_string(), args: Vec::new(), timeout: DEFAULT_TIMEOUT }
    }
}
impl MagicCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), ..Self::default() }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Locates the program on `PATH`.
    pub fn resolve(&self) -> Result<PathBuf> {
        which::which(&self.program).or_raise(|| ErrorKind::MagicUnavailable(self.program.clone()))
    }

    /// Describes the content of `path`.
    ///
    /// # Errors
    /// - [`ErrorKind::NoSource`] for a blank path.
    /// - [`ErrorKind::MagicUnavailable`] when the program cannot be found or started.
    /// - [`ErrorKind::MagicTimeout`] when it runs past the timeout; the child is
    ///   killed and reaped before returning.
    /// - [`ErrorKind::MagicFailed`] when it exits unsuccessfully.
    #[instrument(skip(self, path), fields(program = %self.program, path = %path.as_ref().display(), magic))]
    pub fn magic_type(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::NoSource);
        }
        let program = self.resolve()?;
        let mut child = Command::new(&program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .or_raise(|| ErrorKind::MagicUnavailable(self.program.clone()))?;
        // Drained concurrently so a chatty program cannot fill the pipe and stall.
        let stdout = child.stdout.take();
        let reader = thread::spawn(move || -> io::Result<Vec<u8>> {
            let mut output = Vec::new();
            if let Some(mut stdout) = stdout {
                stdout.read_to_end(&mut output)?;
            }
            Ok(output)
        });
        let status = match child.wait_timeout(self.timeout).or_raise(|| ErrorKind::MagicFailed(path.to_path_buf()))? {
            Some(status) => status,
            None => {
                if let Err(err) = child.kill() {
                    tracing::warn!(error = %err, "could not kill file type detector");
                }
                if let Err(err) = child.wait() {
                    tracing::warn!(error = %err, "could not reap file type detector");
                }
                // The reader is left detached: a grandchild may still hold the pipe open.
                exn::bail!(ErrorKind::MagicTimeout(path.to_path_buf()));
            },
        };
        if !status.success() {
            exn::bail!(ErrorKind::MagicFailed(path.to_path_buf()));
        }
        let output = match reader.join() {
            Ok(output) => output.or_raise(|| ErrorKind::MagicFailed(path.to_path_buf()))?,
            Err(_) => exn::bail!(ErrorKind::MagicFailed(path.to_path_buf())),
        };
        let magic = normalize_magic(&String::from_utf8_lossy(&output));
        tracing::Span::current().record("magic", magic.as_str());
        Ok(magic)
    }
}

/// Keeps the text after the first colon, trimmed.
pub fn normalize_magic(output: &str) -> String {
    output.split_once(':').map(|(_, description)| description).unwrap_or(output).trim().to_string()
}

/// Describes `path` with the default `file` program.
pub fn magic_type(path: impl AsRef<Path>) -> Result<String> {
    MagicCommand::default().magic_type(path)
}
