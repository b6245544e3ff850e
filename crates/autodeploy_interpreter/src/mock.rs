//! Scripted oracle for tests and offline runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{OracleError, OracleResult};
use crate::oracle::{Oracle, OracleRequest};

/// Mock oracle.
///
/// Replies are consumed in order; the last one repeats once the script runs
/// out. With no script, every call answers `{}`.
#[derive(Clone, Default)]
pub struct MockOracle {
    replies: Arc<RwLock<VecDeque<OracleResult<String>>>>,
    calls: Arc<AtomicUsize>,
    requests: Arc<RwLock<Vec<OracleRequest>>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle that always answers with `json`.
    pub fn with_json(json: serde_json::Value) -> Self {
        Self::new().reply(json.to_string())
    }

    /// Queue a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.write().push_back(Ok(text.into()));
        self
    }

    /// Queue a failed call.
    pub fn fail(self, error: OracleError) -> Self {
        self.replies.write().push_back(Err(error));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received, in call order.
    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests.read().clone()
    }
}

#[async_trait]
impl Oracle for MockOracle {
    fn name(&self) -> String {
        "mock".to_string()
    }

    async fn complete(&self, request: &OracleRequest) -> OracleResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.write().push(request.clone());

        let mut replies = self.replies.write();
        match replies.len() {
            0 => Ok("{}".to_string()),
            1 => replies.front().cloned().unwrap_or_else(|| Ok("{}".to_string())),
            _ => replies.pop_front().unwrap_or_else(|| Ok("{}".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_repeat() {
        let oracle = MockOracle::new()
            .fail(OracleError::Network("timeout".into()))
            .reply("{\"environment\":\"dev\"}");
        let request = OracleRequest::for_instruction("Deploy");

        assert!(oracle.complete(&request).await.is_err());
        assert_eq!(oracle.complete(&request).await.unwrap(), "{\"environment\":\"dev\"}");
        assert_eq!(oracle.complete(&request).await.unwrap(), "{\"environment\":\"dev\"}");
        assert_eq!(oracle.call_count(), 3);
        assert_eq!(oracle.requests()[0], request);
    }

    #[tokio::test]
    async fn test_unscripted_answers_empty_object() {
        let oracle = MockOracle::new();
        let reply = oracle
            .complete(&OracleRequest::for_instruction("Deploy"))
            .await
            .unwrap();
        assert_eq!(reply, "{}");
    }
}
