//! Structured invocation of package managers and build tools.
//!
//! Callers describe what to run as a [`ShellTask`] value and hand it to a
//! [`ShellRunner`]. Nothing in the crate assembles shell command strings;
//! arguments are passed to the process verbatim.
//!
//! The process-backed runner appends a timestamped record of each task's
//! stderr and exit status to `mc-build.log` in the task's working directory.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{ChildStderr, Command, Stdio};

use crate::error::{McError, Result};
use crate::{io, paths};

/// One external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellTask {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Run through `sudo`.
    pub elevate: bool,
    /// Forward the program's stdout to ours.
    pub mirror_output: bool,
    pub env: Vec<(String, String)>,
}

impl ShellTask {
    pub fn new(program: &str, cwd: &Path) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            elevate: false,
            mirror_output: true,
            env: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn elevate(mut self, elevate: bool) -> Self {
        self.elevate = elevate;
        self
    }

    pub fn mirror_output(mut self, mirror: bool) -> Self {
        self.mirror_output = mirror;
        self
    }

    pub fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.env.push((key.to_string(), value.into()));
        self
    }

    /// Human-readable form for progress lines and logs.
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 2);
        if self.elevate {
            parts.push("sudo".to_string());
        }
        parts.push(self.program.clone());
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Runs shell tasks to completion. A nonzero exit is an error.
pub trait ShellRunner {
    fn run(&self, task: &ShellTask) -> Result<()>;
}

/// Runs tasks as real child processes.
#[derive(Debug, Default, Clone)]
pub struct SystemShell;

impl SystemShell {
    pub fn new() -> Self {
        Self
    }
}

impl ShellRunner for SystemShell {
    fn run(&self, task: &ShellTask) -> Result<()> {
        // Resolved path, so `npm.cmd` and friends spawn on Windows.
        let program = which::which(&task.program)
            .map_err(|_| McError::ToolNotFound(task.program.clone()))?;

        let mut cmd = if task.elevate {
            let sudo = which::which("sudo").map_err(|_| McError::ToolNotFound("sudo".into()))?;
            let mut cmd = Command::new(sudo);
            cmd.arg(&program);
            cmd
        } else {
            Command::new(&program)
        };
        cmd.args(&task.args).current_dir(&task.cwd);
        for (k, v) in &task.env {
            cmd.env(k, v);
        }

        cmd.stdin(Stdio::inherit());
        cmd.stdout(if task.mirror_output {
            Stdio::inherit()
        } else {
            Stdio::null()
        });
        cmd.stderr(Stdio::piped());

        tracing::debug!(task = %task.display(), cwd = %task.cwd.display(), "spawning");
        let mut child = cmd.spawn()?;

        let log = paths::build_log_path(&task.cwd);
        let drained = match child.stderr.take() {
            Some(stderr) => forward_stderr(stderr, &log),
            None => Ok(()),
        };
        let status = child.wait()?;
        drained?;

        if status.success() {
            write_log(&log, "process exited OK.");
            return Ok(());
        }
        let exit_code = status.code().unwrap_or(-1);
        write_log(&log, &format!("process exited with code {exit_code}"));
        Err(McError::ToolFailed {
            program: task.program.clone(),
            exit_code,
        })
    }
}

/// Echo the child's stderr and copy it into the build log. Bytes that are
/// not UTF-8 are replaced, never fatal.
fn forward_stderr(stderr: ChildStderr, log: &Path) -> std::io::Result<()> {
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\n', '\r']);
        eprintln!("{line}");
        write_log(log, &format!("ERROR: {line}"));
    }
}

/// Best-effort: a build log that can't be written never fails the task.
fn write_log(path: &Path, msg: &str) {
    let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    if let Err(e) = io::append_text(path, &format!("\n{stamp} : {msg}")) {
        tracing::debug!(error = %e, path = %path.display(), "could not write build log");
    }
}
