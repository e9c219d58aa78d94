//! Fake HAL implementation for testing.
//!
//! This implementation records all commands without executing them, serves
//! scripted stdout (for example a canned `mount` listing) and can be told to
//! fail specific invocations, allowing CI-safe testing without root.

use super::{HostInfoOps, ProcessOps};
use crate::HalResult;
use std::collections::HashMap;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Output};
use std::sync::{Arc, Mutex, MutexGuard};

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Command { program: String, args: Vec<String> },
}

#[derive(Debug, Clone)]
struct FailureRule {
    program: String,
    /// `None` matches any invocation of `program` that has arguments.
    args: Option<Vec<String>>,
    code: i32,
}

impl FailureRule {
    fn matches(&self, program: &str, args: &[String]) -> bool {
        if self.program != program {
            return false;
        }
        match &self.args {
            Some(expected) => expected.as_slice() == args,
            None => !args.is_empty(),
        }
    }
}

/// Shared state for FakeHal operations.
#[derive(Debug, Clone)]
struct FakeHalState {
    operations: Vec<Operation>,
    stdout: HashMap<String, String>,
    failures: Vec<FailureRule>,
    os_name: String,
}

impl Default for FakeHalState {
    fn default() -> Self {
        Self {
            operations: Vec::new(),
            stdout: HashMap::new(),
            failures: Vec::new(),
            os_name: "Linux".to_string(),
        }
    }
}

/// Fake HAL implementation that records commands without executing them.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeHalState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Report `name` from [`HostInfoOps::os_name`].
    pub fn with_os_name(self, name: impl Into<String>) -> Self {
        self.state().os_name = name.into();
        self
    }

    /// Serve `stdout` whenever `program` is run without arguments.
    pub fn set_stdout(&self, program: &str, stdout: impl Into<String>) {
        self.state()
            .stdout
            .insert(program.to_string(), stdout.into());
    }

    /// Make `program` exit with `code`. With `args == None` every invocation
    /// carrying arguments fails; otherwise only the exact argument list does.
    pub fn fail_command(&self, program: &str, args: Option<&[&str]>, code: i32) {
        self.state().failures.push(FailureRule {
            program: program.to_string(),
            args: args.map(|a| a.iter().map(|s| s.to_string()).collect()),
            code,
        });
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state().operations.clone()
    }

    /// Recorded commands as `(program, args)` pairs, in execution order.
    pub fn commands(&self) -> Vec<(String, Vec<String>)> {
        self.operations()
            .into_iter()
            .map(|op| match op {
                Operation::Command { program, args } => (program, args),
            })
            .collect()
    }

    /// Recorded commands that carried arguments, i.e. everything except
    /// bare state queries such as `mount`.
    pub fn mutating_commands(&self) -> Vec<(String, Vec<String>)> {
        self.commands()
            .into_iter()
            .filter(|(_, args)| !args.is_empty())
            .collect()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state().operations.iter().any(check)
    }

    /// Clear all recorded operations.
    pub fn clear(&self) {
        self.state().operations.clear();
    }
}

impl ProcessOps for FakeHal {
    fn command_output(&self, program: &str, args: &[&str]) -> HalResult<Output> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        log::info!("FAKE HAL: {} {:?}", program, args);

        let mut state = self.state();
        state.operations.push(Operation::Command {
            program: program.to_string(),
            args: args.clone(),
        });

        let code = state
            .failures
            .iter()
            .find(|rule| rule.matches(program, &args))
            .map(|rule| rule.code)
            .unwrap_or(0);

        let stdout = if args.is_empty() && code == 0 {
            state.stdout.get(program).cloned().unwrap_or_default()
        } else {
            String::new()
        };
        let stderr = if code == 0 {
            String::new()
        } else {
            format!("{}: simulated failure", program)
        };

        // Wait status encodes the exit code in the second byte.
        Ok(Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: stdout.into_bytes(),
            stderr: stderr.into_bytes(),
        })
    }
}

impl HostInfoOps for FakeHal {
    fn os_name(&self) -> HalResult<String> {
        Ok(self.state().os_name.clone())
    }
}
