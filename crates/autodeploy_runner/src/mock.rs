//! Mock provisioning tool for testing.
//!
//! Records every call and replays scripted responses per operation, so
//! orchestration can be tested without Terraform or cloud credentials.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::{RunnerError, RunnerResult};
use crate::tool::{ProvisioningTool, ToolOperation, ToolOutput};

/// Predefined mock response for a tool operation.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    /// When set, the call fails to run instead of producing output.
    pub error: Option<String>,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 100,
            error: None,
        }
    }

    pub fn failure(exit_code: i64, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 100,
            error: None,
        }
    }

    /// A call the tool could not run at all, reported as `ExecutionFailed`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
            error: Some(message.into()),
        }
    }
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub operation: ToolOperation,
    pub working_dir: PathBuf,
    pub at: DateTime<Utc>,
}

/// Mock provisioning tool for testing.
///
/// Responses are scripted per operation and cycle when exhausted; an
/// operation with no script succeeds with empty output.
#[derive(Clone)]
pub struct MockTool {
    /// Scripted responses per operation.
    responses: Arc<RwLock<HashMap<ToolOperation, Vec<MockResponse>>>>,
    /// Index of the next response per operation.
    cursors: Arc<RwLock<HashMap<ToolOperation, usize>>>,
    /// Total number of tool invocations.
    invocations: Arc<AtomicUsize>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Simulated failure to return (as a string message for ExecutionFailed).
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTool {
    /// Create a new mock tool.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(HashMap::new())),
            cursors: Arc::new(RwLock::new(HashMap::new())),
            invocations: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a response for the next call to `operation`.
    pub fn add_response(self, operation: ToolOperation, response: MockResponse) -> Self {
        self.responses
            .write()
            .entry(operation)
            .or_default()
            .push(response);
        self
    }

    /// Replace the responses for `operation`.
    pub fn with_responses(self, operation: ToolOperation, responses: Vec<MockResponse>) -> Self {
        self.responses.write().insert(operation, responses);
        self
    }

    /// Script `outputs` to return `json` as `output -json` would.
    pub fn with_outputs_json(self, json: impl Into<String>) -> Self {
        self.with_responses(ToolOperation::Outputs, vec![MockResponse::success(json)])
    }

    /// Set a failure to simulate for every operation.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Check if an operation was called.
    pub fn was_called(&self, operation: ToolOperation) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.operation == operation)
    }

    /// Get calls to a specific operation.
    pub fn get_operation_calls(&self, operation: ToolOperation) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Number of calls to a specific operation.
    pub fn operation_count(&self, operation: ToolOperation) -> usize {
        self.get_operation_calls(operation).len()
    }

    /// Operations in call order.
    pub fn operations(&self) -> Vec<ToolOperation> {
        self.captured_calls
            .read()
            .iter()
            .map(|c| c.operation)
            .collect()
    }

    fn record_call(&self, operation: ToolOperation, working_dir: &Path) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.captured_calls.write().push(CapturedCall {
            operation,
            working_dir: working_dir.to_path_buf(),
            at: Utc::now(),
        });
    }

    fn next_response(&self, operation: ToolOperation) -> MockResponse {
        let responses = self.responses.read();
        let Some(scripted) = responses.get(&operation).filter(|r| !r.is_empty()) else {
            return MockResponse::success("");
        };
        let mut cursors = self.cursors.write();
        let index = cursors.entry(operation).or_insert(0);
        let response = scripted[*index % scripted.len()].clone();
        *index += 1;
        response
    }

    fn check_failure(&self) -> RunnerResult<()> {
        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(RunnerError::ExecutionFailed(msg));
        }
        Ok(())
    }

    fn respond(&self, operation: ToolOperation, working_dir: &Path) -> RunnerResult<ToolOutput> {
        self.record_call(operation, working_dir);
        self.check_failure()?;

        let response = self.next_response(operation);
        if let Some(message) = response.error {
            return Err(RunnerError::ExecutionFailed(message));
        }
        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::milliseconds(response.duration_ms as i64);

        Ok(ToolOutput {
            operation,
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at,
            finished_at,
            duration_ms: response.duration_ms,
        })
    }
}

#[async_trait]
impl ProvisioningTool for MockTool {
    async fn version(&self) -> RunnerResult<String> {
        self.check_failure()?;
        Ok("mock-terraform 1.6.0".to_string())
    }

    async fn plan(&self, working_dir: &Path) -> RunnerResult<ToolOutput> {
        self.respond(ToolOperation::Plan, working_dir)
    }

    async fn apply(&self, working_dir: &Path) -> RunnerResult<ToolOutput> {
        self.respond(ToolOperation::Apply, working_dir)
    }

    async fn destroy(&self, working_dir: &Path) -> RunnerResult<ToolOutput> {
        self.respond(ToolOperation::Destroy, working_dir)
    }

    async fn outputs(&self, working_dir: &Path) -> RunnerResult<ToolOutput> {
        self.respond(ToolOperation::Outputs, working_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_tool_basic() {
        let tool = MockTool::new()
            .add_response(ToolOperation::Plan, MockResponse::success("Plan: 3 to add"));

        let result = tool.plan(Path::new("/tmp/deploy")).await.unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "Plan: 3 to add");
        assert_eq!(result.operation, ToolOperation::Plan);
    }

    #[tokio::test]
    async fn test_mock_tool_captures_calls() {
        let tool = MockTool::new();

        tool.plan(Path::new("/tmp/a")).await.unwrap();
        tool.apply(Path::new("/tmp/a")).await.unwrap();

        assert_eq!(tool.call_count(), 2);
        assert!(tool.was_called(ToolOperation::Apply));
        assert!(!tool.was_called(ToolOperation::Destroy));
        assert_eq!(
            tool.operations(),
            vec![ToolOperation::Plan, ToolOperation::Apply]
        );

        let calls = tool.get_operation_calls(ToolOperation::Plan);
        assert_eq!(calls[0].working_dir, PathBuf::from("/tmp/a"));
    }

    #[tokio::test]
    async fn test_mock_tool_scripts_are_per_operation() {
        let tool = MockTool::new()
            .with_responses(
                ToolOperation::Destroy,
                vec![MockResponse::failure(1, "first"), MockResponse::success("second")],
            )
            .add_response(ToolOperation::Plan, MockResponse::success("planned"));

        let dir = Path::new("/tmp/d");
        assert_eq!(tool.destroy(dir).await.unwrap().stderr, "first");
        assert_eq!(tool.plan(dir).await.unwrap().stdout, "planned");
        assert_eq!(tool.destroy(dir).await.unwrap().stdout, "second");
        // Scripts cycle
        assert_eq!(tool.destroy(dir).await.unwrap().exit_code, 1);
    }

    #[tokio::test]
    async fn test_mock_tool_failure_simulation() {
        let tool = MockTool::new().simulate_failure("simulated error");

        let result = tool.apply(Path::new("/tmp/x")).await;
        assert!(matches!(result, Err(RunnerError::ExecutionFailed(_))));
        assert_eq!(tool.operation_count(ToolOperation::Apply), 1);
    }

    #[tokio::test]
    async fn test_mock_tool_outputs() {
        let tool = MockTool::new()
            .with_outputs_json(r#"{"vpc_id": {"sensitive": false, "value": "vpc-1"}}"#);

        let outputs = tool.outputs(Path::new("/tmp/x")).await.unwrap();
        let parsed = outputs.parse_outputs().unwrap();
        assert_eq!(parsed["vpc_id"], serde_json::json!("vpc-1"));
    }
}
