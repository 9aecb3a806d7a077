use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::ProcessError;
use super::runner::{ExitStatus, ProcessCommand, ProcessOutput, ProcessRunner};

type ArgsMatcher = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

/// Scripted [`ProcessRunner`] for unit tests.
///
/// Expectations are checked in registration order; the first one whose
/// program and argument matcher accept the command answers it.
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    expectations: Arc<Mutex<Vec<MockExpectation>>>,
    call_history: Arc<Mutex<Vec<ProcessCommand>>>,
}

struct MockExpectation {
    program: String,
    args_matcher: Option<ArgsMatcher>,
    response: ProcessOutput,
    times_called: usize,
    expected_times: Option<usize>,
}

impl MockExpectation {
    fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args_matcher: None,
            response: ProcessOutput {
                status: ExitStatus::Success,
                stdout: String::new(),
                stderr: String::new(),
                duration: Duration::from_millis(10),
            },
            times_called: 0,
            expected_times: None,
        }
    }

    fn accepts(&self, command: &ProcessCommand) -> bool {
        if self.program != command.program {
            return false;
        }
        self.args_matcher
            .as_ref()
            .map_or(true, |matcher| matcher(&command.args))
    }
}

pub struct MockCommandConfig {
    runner: MockProcessRunner,
    expectation: MockExpectation,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_command(&mut self, program: &str) -> MockCommandConfig {
        MockCommandConfig {
            runner: self.clone(),
            expectation: MockExpectation::new(program),
        }
    }

    pub fn verify_called(&self, program: &str, times: usize) -> bool {
        self.get_call_history()
            .iter()
            .filter(|cmd| cmd.program == program)
            .count()
            == times
    }

    pub fn get_call_history(&self) -> Vec<ProcessCommand> {
        self.call_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    /// Answer every call to `program` with `response`; an `Err` becomes exit code 1
    pub async fn add_response(&self, program: &str, response: Result<ProcessOutput, ProcessError>) {
        let mut expectation = MockExpectation::new(program);
        match response {
            Ok(output) => expectation.response = output,
            Err(err) => {
                expectation.response.status = ExitStatus::Error(1);
                expectation.response.stderr = err.to_string();
            }
        }
        self.push(expectation);
    }

    /// Get all calls made to this mock
    pub async fn get_calls(&self) -> Vec<ProcessCommand> {
        self.get_call_history()
    }

    fn push(&self, expectation: MockExpectation) {
        if let Ok(mut expectations) = self.expectations.lock() {
            expectations.push(expectation);
        }
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, command: ProcessCommand) -> Result<ProcessOutput, ProcessError> {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(command.clone());
        }

        let mut expectations = self
            .expectations
            .lock()
            .map_err(|_| ProcessError::MockExpectationNotMet("mock poisoned".to_string()))?;

        let Some(expectation) = expectations.iter_mut().find(|e| e.accepts(&command)) else {
            return Err(ProcessError::MockExpectationNotMet(format!(
                "No expectation found for command: {} {:?}",
                command.program, command.args
            )));
        };

        expectation.times_called += 1;
        if let Some(expected) = expectation.expected_times {
            if expectation.times_called > expected {
                return Err(ProcessError::MockExpectationNotMet(format!(
                    "Command '{}' called {} times, expected {}",
                    command.program, expectation.times_called, expected
                )));
            }
        }

        Ok(expectation.response.clone())
    }
}

impl MockCommandConfig {
    pub fn with_args<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.expectation.args_matcher = Some(Box::new(matcher));
        self
    }

    pub fn returns_stdout(mut self, stdout: &str) -> Self {
        self.expectation.response.stdout = stdout.to_string();
        self
    }

    pub fn returns_stderr(mut self, stderr: &str) -> Self {
        self.expectation.response.stderr = stderr.to_string();
        self
    }

    pub fn returns_exit_code(mut self, code: i32) -> Self {
        self.expectation.response.status = if code == 0 {
            ExitStatus::Success
        } else {
            ExitStatus::Error(code)
        };
        self
    }

    pub fn returns_success(self) -> Self {
        self.returns_exit_code(0)
    }

    /// Fail the call after `n` matches
    pub fn times(mut self, n: usize) -> Self {
        self.expectation.expected_times = Some(n);
        self
    }

    pub fn finish(self) {
        self.runner.push(self.expectation);
    }
}
