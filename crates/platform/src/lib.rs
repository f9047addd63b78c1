//! Marquee Platform
//!
//! Operating system services used by the launcher:
//! - Launching card and sidebar commands as child processes
//! - Tracking the launched application until it exits
//! - System power commands (shutdown, restart, sleep)

use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Exit codes at or above this mean the shell could not run the program.
const SHELL_FAILURE_CODE: i32 = 127;

/// Window in which a shell failure code counts as a failed launch.
const LAUNCH_GRACE: Duration = Duration::from_millis(500);

/// Errors that can occur while running commands.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Failed to start '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("An application is already running")]
    AlreadyRunning,

    #[error("Failed to query child process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Power command {command:?} failed: {reason}")]
    PowerCommandFailed {
        command: SystemCommand,
        reason: String,
    },
}

/// Split a command line into program and raw parameters.
///
/// A leading double-quoted program path may contain spaces; otherwise the
/// program ends at the first space.
pub fn split_command(command: &str) -> Option<(String, Option<String>)> {
    let command = command.trim_start();
    if command.is_empty() {
        return None;
    }

    let params = |rest: &str| {
        let rest = rest.trim_start();
        (!rest.is_empty()).then(|| rest.to_string())
    };

    if let Some(quoted) = command.strip_prefix('"') {
        if let Some(end) = quoted.find('"') {
            return Some((quoted[..end].to_string(), params(&quoted[end + 1..])));
        }
    }

    match command.split_once(' ') {
        Some((program, rest)) => Some((program.to_string(), params(rest))),
        None => Some((command.to_string(), None)),
    }
}

/// Start `command` detached from the launcher's standard streams.
#[cfg(unix)]
pub fn start_process(command: &str) -> Result<Child, PlatformError> {
    if command.trim().is_empty() {
        return Err(PlatformError::EmptyCommand);
    }
    Command::new("/bin/sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| PlatformError::SpawnFailed {
            command: command.to_string(),
            source,
        })
}

/// Start `command` detached from the launcher's standard streams.
#[cfg(windows)]
pub fn start_process(command: &str) -> Result<Child, PlatformError> {
    use std::os::windows::process::CommandExt;

    let (program, params) = split_command(command).ok_or(PlatformError::EmptyCommand)?;
    let mut cmd = Command::new(program);
    if let Some(params) = params {
        cmd.raw_arg(params);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| PlatformError::SpawnFailed {
            command: command.to_string(),
            source,
        })
}

/// State of the tracked application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStatus {
    /// Nothing launched.
    Idle,
    Running,
    /// The application exited normally.
    Exited { code: Option<i32>, runtime: Duration },
    /// The shell reported that the program could not be run.
    FailedToStart { code: i32 },
}

/// Tracks the one application launched from the launcher.
#[derive(Debug, Default)]
pub struct Launcher {
    child: Option<Child>,
    command: String,
    started: Option<Instant>,
}

impl Launcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch an application. Fails while another one is still running.
    pub fn launch(&mut self, command: &str) -> Result<(), PlatformError> {
        if self.is_running() {
            return Err(PlatformError::AlreadyRunning);
        }
        let child = start_process(command)?;
        tracing::info!("Launched '{}' (pid {})", command, child.id());
        self.child = Some(child);
        self.command = command.to_string();
        self.started = Some(Instant::now());
        Ok(())
    }

    /// Check on the launched application. A terminal status is reported once,
    /// after which the launcher is idle again.
    pub fn poll(&mut self) -> Result<LaunchStatus, PlatformError> {
        let Some(child) = self.child.as_mut() else {
            return Ok(LaunchStatus::Idle);
        };
        let Some(status) = child.try_wait().map_err(PlatformError::Wait)? else {
            return Ok(LaunchStatus::Running);
        };

        let runtime = self.started.map(|s| s.elapsed()).unwrap_or_default();
        self.child = None;
        self.started = None;
        Ok(classify_exit(&self.command, status, runtime))
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Command of the tracked application, if one is running.
    pub fn command(&self) -> Option<&str> {
        self.child.as_ref().map(|_| self.command.as_str())
    }
}

fn classify_exit(command: &str, status: ExitStatus, runtime: Duration) -> LaunchStatus {
    match status.code() {
        Some(code) if code >= SHELL_FAILURE_CODE && runtime < LAUNCH_GRACE => {
            tracing::error!("'{}' failed to start (exit code {})", command, code);
            LaunchStatus::FailedToStart { code }
        }
        code => {
            tracing::info!(
                "'{}' exited with {:?} after {:.1}s",
                command,
                code,
                runtime.as_secs_f32()
            );
            LaunchStatus::Exited { code, runtime }
        }
    }
}

/// System power commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemCommand {
    Shutdown,
    Restart,
    Sleep,
}

impl SystemCommand {
    /// Program and arguments implementing the command on this platform.
    #[cfg(windows)]
    pub fn invocation(self) -> (&'static str, &'static [&'static str]) {
        match self {
            SystemCommand::Shutdown => ("shutdown", &["/s", "/t", "0"] as &[&str]),
            SystemCommand::Restart => ("shutdown", &["/r", "/t", "0"] as &[&str]),
            SystemCommand::Sleep => (
                "rundll32.exe",
                &["powrprof.dll,SetSuspendState", "0,1,0"] as &[&str],
            ),
        }
    }

    /// Program and arguments implementing the command on this platform.
    #[cfg(not(windows))]
    pub fn invocation(self) -> (&'static str, &'static [&'static str]) {
        match self {
            SystemCommand::Shutdown => ("systemctl", &["poweroff"] as &[&str]),
            SystemCommand::Restart => ("systemctl", &["reboot"] as &[&str]),
            SystemCommand::Sleep => ("systemctl", &["suspend"] as &[&str]),
        }
    }

    /// Run the power command and wait for it to be accepted.
    pub fn run(self) -> Result<(), PlatformError> {
        let (program, args) = self.invocation();
        tracing::info!("Running power command {:?}", self);
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| PlatformError::PowerCommandFailed {
                command: self,
                reason: e.to_string(),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(PlatformError::PowerCommandFailed {
                command: self,
                reason: format!("exit status {}", status),
            })
        }
    }
}
