//! Process execution helpers.
//!
//! External commands are "world-touching" and must go through the HAL so
//! reconciliation can be tested without spawning real processes.

use crate::{HalError, HalResult};
use std::process::Output;

/// Process execution trait (external command runner).
pub trait ProcessOps {
    /// Run `program` with `args` and return its captured output, whatever the
    /// exit status.
    fn command_output(&self, program: &str, args: &[&str]) -> HalResult<Output>;

    /// Run `program` and return its stdout. A non-zero exit is an error.
    fn command_stdout(&self, program: &str, args: &[&str]) -> HalResult<String> {
        let output = self.command_output(program, args)?;
        if !output.status.success() {
            return Err(output_failed(program, args, &output));
        }
        Ok(String::from_utf8(output.stdout)?)
    }

    /// Run `program` for its side effect. A non-zero exit is an error.
    fn command_status(&self, program: &str, args: &[&str]) -> HalResult<()> {
        let output = self.command_output(program, args)?;
        if !output.status.success() {
            return Err(output_failed(program, args, &output));
        }
        Ok(())
    }
}

pub(crate) fn output_failed(program: &str, args: &[&str], output: &Output) -> HalError {
    HalError::CommandFailed {
        program: program.to_string(),
        args: args.iter().map(|s| s.to_string()).collect(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

/// Shell-like rendering of a command line, for logs and error context.
pub fn render_command(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}
