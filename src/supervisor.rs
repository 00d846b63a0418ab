//! Lifecycle of the HTTP server child process
//!
//! At most one child is alive at a time: `start` stops any previous child
//! before spawning, and `stop` only returns once the child has exited
//! (gracefully or by force).

use log::{debug, error, info, warn};
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{ReloadError, ReloadResult};
use crate::watcher::RestartTarget;

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);
/// Gives the OS time to release the port between stop and start
pub const DEFAULT_RESTART_PAUSE: Duration = Duration::from_millis(500);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Program and arguments used to launch the server child
#[derive(Debug, Clone)]
pub struct ServerCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ServerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// This executable's `serve` subcommand, serving the working directory.
    pub fn serve_current_dir(host: &str, port: u16) -> ReloadResult<Self> {
        let exe = std::env::current_exe()?;
        Ok(Self::new(exe)
            .arg("serve")
            .arg("--host")
            .arg(host)
            .arg("--port")
            .arg(port.to_string())
            .arg("--document-root")
            .arg("."))
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    fn spawn(&self) -> ReloadResult<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ReloadError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Running,
}

pub struct Supervisor {
    command: ServerCommand,
    port: u16,
    stop_timeout: Duration,
    restart_pause: Duration,
    child: Option<Child>,
}

impl Supervisor {
    pub fn new(command: ServerCommand, port: u16) -> Self {
        Self {
            command,
            port,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            restart_pause: DEFAULT_RESTART_PAUSE,
            child: None,
        }
    }

    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    pub fn with_restart_pause(mut self, restart_pause: Duration) -> Self {
        self.restart_pause = restart_pause;
        self
    }

    pub fn state(&self) -> ServerState {
        if self.child.is_some() {
            ServerState::Running
        } else {
            ServerState::Stopped
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Spawns the server, stopping the current one first.
    ///
    /// A spawn failure is logged and leaves the supervisor stopped.
    pub fn start(&mut self) {
        if self.child.is_some() {
            self.stop();
        }

        match self.command.spawn() {
            Ok(mut child) => {
                drain_output(&mut child);
                self.child = Some(child);
                debug!("Server process {:?} spawned", self.pid());
                info!("Server started on http://localhost:{}", self.port);
            }
            Err(e) => {
                error!("Failed to start server: {}", e);
            }
        }
    }

    /// Terminates the server, killing it if it outlives the stop timeout.
    pub fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        let pid = child.id();
        terminate(&mut child);

        match wait_with_deadline(&mut child, self.stop_timeout) {
            Ok(Some(status)) => debug!("Server process {} exited with {}", pid, status),
            Ok(None) => {
                warn!(
                    "Server process {} did not exit within {:?}, killing it",
                    pid, self.stop_timeout
                );
                if let Err(e) = child.kill() {
                    debug!("Kill of process {} failed: {}", pid, e);
                }
                if let Err(e) = child.wait() {
                    error!("Failed to reap server process {}: {}", pid, e);
                }
            }
            Err(e) => {
                error!("Failed waiting for server process {}: {}", pid, e);
                let _ = child.kill();
                let _ = child.wait();
            }
        }

        info!("Server stopped");
    }

    /// Stop, pause for the port to be released, then start.
    pub fn restart(&mut self) {
        info!("Restarting server...");
        self.stop();
        thread::sleep(self.restart_pause);
        self.start();
    }
}

impl RestartTarget for Supervisor {
    fn restart(&mut self) {
        Supervisor::restart(self);
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    let pid = child.id() as libc::pid_t;
    if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
        // Already exited and not yet reaped; the wait below collects it.
        debug!(
            "SIGTERM to {} failed: {}",
            pid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("Terminating process {} failed: {}", child.id(), e);
    }
}

fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    // A timeout past the end of the clock waits for as long as it takes.
    let deadline = Instant::now().checked_add(timeout);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(None);
                }
                EXIT_POLL_INTERVAL.min(deadline - now)
            }
            None => EXIT_POLL_INTERVAL,
        };
        thread::sleep(pause);
    }
}

/// Forwards the child's output to the debug log so its pipes never fill up.
fn drain_output(child: &mut Child) {
    if let Some(stdout) = child.stdout.take() {
        spawn_drain("stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_drain("stderr", stderr);
    }
}

fn spawn_drain<R: Read + Send + 'static>(stream: &'static str, reader: R) {
    let spawned = thread::Builder::new()
        .name(format!("server-{}", stream))
        .spawn(move || {
            for line in BufReader::new(reader).lines() {
                match line {
                    Ok(line) => debug!(target: "server", "[{}] {}", stream, line),
                    Err(_) => break,
                }
            }
        });

    if let Err(e) = spawned {
        warn!("Could not forward server {}: {}", stream, e);
    }
}
