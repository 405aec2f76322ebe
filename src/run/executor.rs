//! Run executor: spawn the benchmark program and tee its output.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::BenchCommand;
use crate::{Error, Result};

/// How a spawned benchmark process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    exit_code: Option<i32>,
    elapsed: Duration,
}

impl RunOutcome {
    /// Exit code, or `None` if the process was killed by a signal.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Whether the process exited with status 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    /// Wall-clock time from spawn to exit.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

#[derive(Debug, Clone, Copy)]
enum Terminal {
    Stdout,
    Stderr,
}

/// Runs composed commands, duplicating combined stdout/stderr into an
/// output file and (optionally) the controlling terminal.
#[derive(Debug, Clone, Copy)]
pub struct RunExecutor {
    echo: bool,
}

impl Default for RunExecutor {
    fn default() -> Self {
        Self { echo: true }
    }
}

impl RunExecutor {
    /// Executor that echoes to the terminal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the terminal copy. The output file is always written.
    #[must_use]
    pub const fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Execute `command` in `working_dir`, writing its output to `output_file`.
    ///
    /// A non-zero exit is logged and returned in the outcome, not raised.
    ///
    /// # Errors
    ///
    /// Returns an error if the output file cannot be created, the program
    /// cannot be spawned, or reading its output fails.
    pub fn execute(
        &self,
        command: &BenchCommand,
        working_dir: &Path,
        output_file: &Path,
    ) -> Result<RunOutcome> {
        if let Some(parent) = output_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let sink = Arc::new(Mutex::new(File::create(output_file)?));

        debug!(command = %command, cwd = %working_dir.display(), "spawning benchmark");
        let started = Instant::now();
        let mut child = command
            .to_command()
            .current_dir(working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut pumps = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            pumps.push(self.spawn_pump(stdout, Arc::clone(&sink), Terminal::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(self.spawn_pump(stderr, Arc::clone(&sink), Terminal::Stderr));
        }

        let mut pump_result = Ok(());
        for pump in pumps {
            let joined = pump
                .join()
                .map_err(|_| Error::Other("output pump thread panicked".to_string()))
                .and_then(|r| r.map_err(Error::from));
            if pump_result.is_ok() {
                pump_result = joined;
            }
        }
        let status = child.wait()?;
        pump_result?;

        let outcome = RunOutcome {
            exit_code: status.code(),
            elapsed: started.elapsed(),
        };

        if outcome.success() {
            info!(
                elapsed_s = outcome.elapsed.as_secs_f64(),
                output = %output_file.display(),
                "benchmark process finished"
            );
        } else {
            warn!(
                exit_code = ?outcome.exit_code,
                output = %output_file.display(),
                "benchmark process exited unsuccessfully"
            );
        }

        Ok(outcome)
    }

    fn spawn_pump<R>(
        &self,
        reader: R,
        sink: Arc<Mutex<File>>,
        terminal: Terminal,
    ) -> thread::JoinHandle<io::Result<()>>
    where
        R: Read + Send + 'static,
    {
        let echo = self.echo.then_some(terminal);
        thread::spawn(move || pump(reader, &sink, echo))
    }
}

fn pump<R: Read>(mut reader: R, sink: &Mutex<File>, echo: Option<Terminal>) -> io::Result<()> {
    let mut buf = [0u8; 8192];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        let chunk = &buf[..n];

        // A closed terminal must not stop the capture.
        match echo {
            Some(Terminal::Stdout) => {
                let mut out = io::stdout().lock();
                let _ = out.write_all(chunk).and_then(|()| out.flush());
            }
            Some(Terminal::Stderr) => {
                let _ = io::stderr().lock().write_all(chunk);
            }
            None => {}
        }

        sink.lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "output file lock poisoned"))?
            .write_all(chunk)?;
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str) -> BenchCommand {
        BenchCommand::new("sh", ["-c", script])
    }

    #[test]
    fn test_captures_stdout_and_stderr() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("nested/out.txt");

        let outcome = RunExecutor::new()
            .echo(false)
            .execute(&sh("echo hello; echo oops >&2"), dir.path(), &output)
            .unwrap();

        assert!(outcome.success());
        let captured = std::fs::read_to_string(&output).unwrap();
        assert!(captured.contains("hello\n"));
        assert!(captured.contains("oops\n"));
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.txt");

        let outcome = RunExecutor::new()
            .echo(false)
            .execute(&sh("echo partial; exit 3"), dir.path(), &output)
            .unwrap();

        assert!(!outcome.success());
        assert_eq!(outcome.exit_code(), Some(3));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "partial\n");
    }

    #[test]
    fn test_runs_in_working_dir() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.txt");
        let work = dir.path().join("work");
        std::fs::create_dir(&work).unwrap();

        RunExecutor::new()
            .echo(false)
            .execute(&sh("touch marker"), &work, &output)
            .unwrap();

        assert!(work.join("marker").exists());
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let dir = TempDir::new().unwrap();
        let cmd = BenchCommand::new("/nonexistent/program-xyz", Vec::<String>::new());
        let err = RunExecutor::new()
            .echo(false)
            .execute(&cmd, dir.path(), &dir.path().join("out.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
