//! Runs an external program attached to a pseudo-terminal and reads its output a line
//! at a time.
//!
//! DIMACS solvers vary in how eagerly they flush stdout when it isn't a real terminal;
//! running them under a PTY keeps their output line-buffered so progress can be read as
//! it's produced rather than only once the process exits.

use std::ffi::CString;
use std::os::fd::{AsRawFd, OwnedFd};

use nix::pty::{forkpty, ForkptyResult};
use nix::sys::wait::waitpid;
use nix::unistd::{execvp, Pid};

use crate::errors::SolveError;

/// A running child process attached to a PTY, read line by line.
pub struct Subprocess {
    pty: OwnedFd,
    child: Pid,
    buffer: Vec<u8>,
    done: bool,
    finished: bool,
}

impl Subprocess {
    /// Spawns `argv[0]` with the remaining elements as arguments.
    pub fn spawn(argv: &[String]) -> Result<Subprocess, SolveError> {
        let program = argv.first().ok_or_else(|| {
            SolveError::Spawn("<empty argv>".to_string(), std::io::Error::from(std::io::ErrorKind::InvalidInput))
        })?;

        let c_args: Vec<CString> = argv
            .iter()
            .map(|a| CString::new(a.as_str()).expect("solver argv must not contain NUL bytes"))
            .collect();

        // Safety: the child only calls async-signal-safe functions (execvp) before
        // either replacing itself or exiting; no heap allocation happens on that path.
        match unsafe { forkpty(None, None) }.map_err(|e| spawn_err(program, e))? {
            ForkptyResult::Parent { child, master } => Ok(Subprocess {
                pty: master,
                child,
                buffer: Vec::new(),
                done: false,
                finished: false,
            }),
            ForkptyResult::Child => {
                let _ = execvp(&c_args[0], &c_args);
                // execvp only returns on failure.
                std::process::exit(127);
            }
        }
    }

    /// Reads the next line of output (without the trailing newline), or `None` once the
    /// child has closed its output and every buffered byte has been drained.
    pub fn getline(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        self.buffer.clear();
        let mut byte = [0u8; 1];

        loop {
            match read_one(self.pty.as_raw_fd(), &mut byte) {
                Some(b'\n') => return Some(String::from_utf8_lossy(&self.buffer).into_owned()),
                Some(b) => self.buffer.push(b),
                None => {
                    self.done = true;
                    if self.buffer.is_empty() {
                        return None;
                    }
                    return Some(String::from_utf8_lossy(&self.buffer).into_owned());
                }
            }
        }
    }

    /// Waits for the child to exit and releases the PTY. Safe to call more than once;
    /// only the first call actually waits.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        let _ = waitpid(self.child, None);
        self.finished = true;
    }
}

impl Drop for Subprocess {
    fn drop(&mut self) {
        self.finish();
    }
}

fn read_one(fd: std::os::fd::RawFd, byte: &mut [u8; 1]) -> Option<u8> {
    loop {
        match nix::unistd::read(fd, byte) {
            Ok(0) => return None,
            Ok(_) => return Some(byte[0]),
            Err(nix::errno::Errno::EINTR) => continue,
            Err(_) => return None,
        }
    }
}

fn spawn_err(program: &str, source: nix::Error) -> SolveError {
    SolveError::Spawn(program.to_string(), std::io::Error::from(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_lines() {
        let mut child = Subprocess::spawn(&["echo".to_string(), "hello".to_string()]).unwrap();
        let mut lines = Vec::new();
        while let Some(line) = child.getline() {
            lines.push(line);
        }
        child.finish();
        assert_eq!(lines, vec!["hello".to_string()]);
    }

    #[test]
    fn reports_spawn_failure() {
        let result = Subprocess::spawn(&["/no/such/binary-xyz".to_string()]);
        // forkpty itself succeeds (the failure happens in the child); getline simply
        // observes an immediately closed pty.
        if let Ok(mut child) = result {
            assert_eq!(child.getline(), None);
            child.finish();
        }
    }
}
