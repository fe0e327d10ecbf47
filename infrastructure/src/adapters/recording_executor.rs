//! Executor that records payloads instead of applying them

use async_trait::async_trait;
use serde::Serialize;
use staged_application::{ActionExecutor, ExecutionError, ExecutionReceipt, ExecutionRequest};
use staged_domain::{ExecutionMode, Identity, ProposalId};
use std::sync::Mutex;
use tracing::info;

/// Action data that makes a simulated action fail
pub const FAILING_ACTION_DATA: &[u8] = b"fail";

/// One recorded execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRecord {
    pub proposal_id: ProposalId,
    pub target: Identity,
    pub mode: ExecutionMode,
    pub actions: usize,
    pub failure_map: u128,
}

/// Records every execution. An action whose data is [`FAILING_ACTION_DATA`]
/// fails; the execution survives that only when the allow-failure map
/// permits it.
#[derive(Default)]
pub struct RecordingExecutor {
    records: Mutex<Vec<ExecutionRecord>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ExecutionRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(
        &self,
        request: ExecutionRequest<'_>,
    ) -> Result<ExecutionReceipt, ExecutionError> {
        let mut results = Vec::with_capacity(request.actions.len());
        let mut failure_map = 0u128;

        for (index, action) in request.actions.iter().enumerate() {
            if action.data == FAILING_ACTION_DATA {
                if !request.allow_failure_map.allows(index) {
                    return Err(ExecutionError::ActionFailed { index });
                }
                failure_map |= 1 << index;
                results.push(Vec::new());
            } else {
                results.push(action.data.clone());
            }
        }

        info!(
            "Executed {} actions of proposal {} on {}",
            request.actions.len(),
            request.correlation_id.short(),
            request.target
        );
        if let Ok(mut records) = self.records.lock() {
            records.push(ExecutionRecord {
                proposal_id: *request.correlation_id,
                target: request.target.clone(),
                mode: request.mode,
                actions: request.actions.len(),
                failure_map,
            });
        }
        Ok(ExecutionReceipt {
            results,
            failure_map,
        })
    }
}
