// src/tool.rs

//! External tool execution
//!
//! Every processor ends up shelling out to a command-line tool (makecatalogs,
//! munkiimport, choco, nuget, signtool). This module locates those tools and
//! runs them synchronously:
//!
//! - Explicit path overrides win over `PATH` lookup
//! - stdin is nulled so an interactive prompt can never hang a pipeline
//! - stdout and stderr are captured and mirrored to the log
//!
//! Exit status interpretation is left to the caller, since each processor
//! maps a failure to a different error.

use crate::error::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Locate an executable
///
/// When `explicit` is given it must point at an existing file; no fallback to
/// `PATH` is attempted. Otherwise `default` is used as-is if it contains a
/// path separator, or searched for on `PATH`.
pub fn resolve_program(tool: &str, default: &str, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::Launch {
            tool: tool.to_string(),
            reason: format!("executable not found at {}", path.display()),
        });
    }

    let default_path = Path::new(default);
    if default_path.components().count() > 1 {
        if default_path.is_file() {
            return Ok(default_path.to_path_buf());
        }
        return Err(Error::Launch {
            tool: tool.to_string(),
            reason: format!("executable not found at {}", default_path.display()),
        });
    }

    which::which(default).map_err(|e| Error::Launch {
        tool: tool.to_string(),
        reason: format!("'{}' not found in PATH: {}", default, e),
    })
}

/// Captured result of a finished tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Best diagnostic text: stderr, or stdout for tools that report there
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// A single invocation of an external tool
#[derive(Debug)]
pub struct ToolCommand {
    tool: String,
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Create a command for `program`; `tool` is the name used in logs and errors
    pub fn new(tool: &str, program: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.to_string(),
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Run the tool from a specific working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Run to completion and capture output
    ///
    /// Only spawn failures are errors here; a non-zero exit is reported
    /// through [`ToolOutput::code`].
    pub fn run(self) -> Result<ToolOutput> {
        info!("Running {}", self.tool);
        debug!("Executing: {} {:?}", self.program.display(), self.args);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|e| Error::Launch {
            tool: self.tool.clone(),
            reason: format!("failed to spawn {}: {}", self.program.display(), e),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        for line in stdout.lines() {
            debug!("[{}] {}", self.tool, line);
        }
        for line in stderr.lines() {
            warn!("[{}] {}", self.tool, line);
        }

        let code = output.status.code();
        if output.status.success() {
            debug!("{} exited successfully", self.tool);
        } else {
            warn!(
                "{} exited with code {}",
                self.tool,
                code.map_or_else(|| "none".to_string(), |c| c.to_string())
            );
        }

        Ok(ToolOutput {
            code,
            stdout,
            stderr,
        })
    }
}
