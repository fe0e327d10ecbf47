//! Scenario runner
//!
//! Wires a [`Coordinator`] to simulated ports (a manual clock, scripted
//! bodies, a recording executor and the configured grants), applies the
//! configured stages, then plays the scenario steps one by one.
//!
//! Coordinator errors do not stop the run: they are recorded on the step
//! that caused them, and compared with the step's `expect` when it has one.
//! Only problems with the scenario itself (unknown labels or bodies) abort.

use super::scenario::{
    Expectation, Scenario, ScenarioCaller, ScenarioError, ScenarioStep,
};
use crate::adapters::{
    BodyBehavior, BodyRegistry, BodyReport, ExecutionRecord, GrantTable, ManualClock,
    RecordingExecutor, ScriptedBody,
};
use crate::config::FileConfig;
use crate::logging::JsonlEventLog;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use staged_application::{
    AdvanceOutcome, CallContext, Clock, Coordinator, CoordinatorError, CoordinatorPorts,
    CoordinatorState, CreateProposalInput, EventSink, FanoutEventSink, MemoryEventSink,
};
use staged_domain::{
    Action, AllowFailureMap, Identity, Permission, ProposalEvent, ProposalId, ProposalStatus,
    StageId, TargetConfig,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Result of one step (or of one body report delivered after a step)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    Ok { detail: String },
    Failed { error: String },
}

impl StepResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, StepResult::Ok { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    /// 1-based index of the scenario step
    pub step: usize,
    pub description: String,
    /// Simulated time the step ran at
    pub at: DateTime<Utc>,
    pub result: StepResult,
    pub expected: Option<Expectation>,
    /// Events committed by this step
    pub events: Vec<ProposalEvent>,
}

impl StepOutcome {
    /// Whether the step did what its `expect` said (always true without one)
    pub fn meets_expectation(&self) -> bool {
        match self.expected {
            Some(Expectation::Ok) => self.result.is_ok(),
            Some(Expectation::Error) => !self.result.is_ok(),
            None => true,
        }
    }
}

/// Where a labelled proposal ended up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalSummary {
    pub label: String,
    pub id: ProposalId,
    pub status: Option<ProposalStatus>,
    pub current_stage: StageId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub steps: Vec<StepOutcome>,
    pub proposals: Vec<ProposalSummary>,
    pub executions: Vec<ExecutionRecord>,
    #[serde(skip)]
    pub state: CoordinatorState,
}

impl SimulationReport {
    /// Steps whose outcome contradicts their `expect`
    pub fn unmet_expectations(&self) -> Vec<&StepOutcome> {
        self.steps
            .iter()
            .filter(|s| !s.meets_expectation())
            .collect()
    }
}

pub struct SimulationRunner {
    coordinator: Coordinator,
    clock: Arc<ManualClock>,
    registry: Arc<BodyRegistry>,
    executor: Arc<RecordingExecutor>,
    events: Arc<MemoryEventSink>,
    reports: mpsc::UnboundedReceiver<BodyReport>,
    labels: BTreeMap<String, ProposalId>,
    outcomes: Vec<StepOutcome>,
}

impl SimulationRunner {
    /// Build the coordinator for `scenario` and apply the configured stages.
    ///
    /// `state` resumes from a previous snapshot instead of starting empty;
    /// stages are then applied only when the snapshot has none.
    pub async fn build(
        config: &FileConfig,
        scenario: &Scenario,
        state: Option<CoordinatorState>,
        event_log: Option<Arc<JsonlEventLog>>,
    ) -> Result<Self, ScenarioError> {
        let errors = config.validate().iter().filter(|i| i.is_error()).count();
        if errors > 0 {
            return Err(ScenarioError::InvalidConfig(errors));
        }

        let (settings, _) = config.coordinator.to_settings();
        let grants = GrantTable::new(config.permissions.parse_grants().0);
        let administrator = grants.holders(Permission::UpdateStages).first().cloned().cloned();
        let stages = config.stages();

        let (tx, reports) = mpsc::unbounded_channel();
        let mut registry = BodyRegistry::new();
        for body in &scenario.bodies {
            registry.register(ScriptedBody::new(
                body.address.as_str(),
                body.behavior,
                tx.clone(),
            ));
        }
        for stage in &stages {
            for (_, body) in stage.automatic_bodies() {
                if registry.get(&body.address).is_none() {
                    debug!("Registering undeclared body {} as accepting", body.address);
                    registry.register(ScriptedBody::new(
                        body.address.clone(),
                        BodyBehavior::Accept,
                        tx.clone(),
                    ));
                }
            }
        }
        let registry = Arc::new(registry);

        let clock = Arc::new(ManualClock::new(scenario.start.unwrap_or_else(Utc::now)));
        let executor = Arc::new(RecordingExecutor::new());
        let events = Arc::new(MemoryEventSink::new());
        let mut sinks: Vec<Arc<dyn EventSink>> = vec![events.clone() as Arc<dyn EventSink>];
        if let Some(log) = event_log {
            sinks.push(log);
        }

        let ports = CoordinatorPorts {
            authorizer: Arc::new(grants),
            probe: registry.clone(),
            bodies: registry.clone(),
            executor: executor.clone(),
            clock: clock.clone(),
            events: Arc::new(FanoutEventSink::new(sinks)),
        };

        let mut coordinator = match state {
            Some(state) => Coordinator::restore(settings, ports, state),
            None => Coordinator::new(settings, ports),
        };

        let mut outcomes = Vec::new();
        if !stages.is_empty() && !coordinator.current_config_index().is_configured() {
            let admin = administrator.ok_or(ScenarioError::NoAdministrator)?;
            let index = coordinator
                .set_stages(&CallContext::direct(admin.clone()), stages)
                .await
                .map_err(|e| ScenarioError::Setup(e.to_string()))?;
            outcomes.push(StepOutcome {
                step: 0,
                description: format!("{} applies the configured stages", admin),
                at: clock.now(),
                result: StepResult::Ok {
                    detail: format!("configuration {}", index),
                },
                expected: None,
                events: events.drain(),
            });
        }

        Ok(Self {
            coordinator,
            clock,
            registry,
            executor,
            events,
            reports,
            labels: BTreeMap::new(),
            outcomes,
        })
    }

    /// Play every step and summarize the run
    pub async fn run(mut self, steps: &[ScenarioStep]) -> Result<SimulationReport, ScenarioError> {
        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            let at = self.clock.now();
            let (description, result) = self.play(number, step).await?;
            if let StepResult::Failed { error } = &result {
                warn!("Step {} ({}) failed: {}", number, description, error);
            }
            self.outcomes.push(StepOutcome {
                step: number,
                description,
                at,
                result,
                expected: step.expectation(),
                events: self.events.drain(),
            });
            self.deliver_reports(number).await;
        }

        let proposals = self
            .labels
            .iter()
            .filter_map(|(label, id)| {
                self.coordinator.proposal(id).map(|p| ProposalSummary {
                    label: label.clone(),
                    id: *id,
                    status: self.coordinator.status(id),
                    current_stage: p.current_stage,
                })
            })
            .collect();

        info!("Simulation finished after {} steps", steps.len());
        Ok(SimulationReport {
            steps: self.outcomes,
            proposals,
            executions: self.executor.records(),
            state: self.coordinator.snapshot(),
        })
    }

    async fn play(
        &mut self,
        number: usize,
        step: &ScenarioStep,
    ) -> Result<(String, StepResult), ScenarioError> {
        let played = match step {
            ScenarioStep::Create {
                caller,
                label,
                metadata,
                actions,
                allow_failure,
                start_in_secs,
                params,
                ..
            } => {
                if self.labels.contains_key(label) {
                    return Err(ScenarioError::DuplicateLabel {
                        step: number,
                        label: label.clone(),
                    });
                }
                let payload: Vec<Action> = actions.iter().map(Action::from).collect();
                let mut input = CreateProposalInput::new(payload, metadata.as_bytes())
                    .with_allow_failure_map(AllowFailureMap::from_indices(
                        allow_failure.iter().copied(),
                    ))
                    .with_custom_params(
                        params
                            .iter()
                            .map(|stage| stage.iter().map(|p| p.as_bytes().to_vec()).collect())
                            .collect(),
                    );
                if *start_in_secs > 0 {
                    let start = self
                        .clock
                        .now()
                        .checked_add_signed(seconds(*start_in_secs))
                        .unwrap_or(DateTime::<Utc>::MAX_UTC);
                    input = input.with_start_date(start);
                }

                let result = self.coordinator.create_proposal(&context(caller), input).await;
                if let Ok(id) = &result {
                    self.labels.insert(label.clone(), *id);
                }
                (
                    format!("{} creates '{}'", describe(caller), label),
                    settle(result.map(|id| format!("proposal {}", id.short()))),
                )
            }
            ScenarioStep::Report {
                caller,
                proposal,
                stage,
                result,
                try_advance,
                ..
            } => {
                let id = self.label(number, proposal)?;
                let outcome = self
                    .coordinator
                    .report_result(&context(caller), &id, *stage, *result, *try_advance)
                    .await;
                (
                    format!(
                        "{} reports {} on '{}' stage {}",
                        describe(caller),
                        result,
                        proposal,
                        stage
                    ),
                    settle(outcome.map(advance_detail)),
                )
            }
            ScenarioStep::Advance {
                caller, proposal, ..
            } => {
                let id = self.label(number, proposal)?;
                let outcome = self.coordinator.advance_proposal(&context(caller), &id).await;
                (
                    format!("{} advances '{}'", describe(caller), proposal),
                    settle(outcome.map(|o| advance_detail(Some(o)))),
                )
            }
            ScenarioStep::Execute {
                caller, proposal, ..
            } => {
                let id = self.label(number, proposal)?;
                let outcome = self.coordinator.execute(&context(caller), &id).await;
                (
                    format!("{} executes '{}'", describe(caller), proposal),
                    settle(outcome.map(|r| format!("executed (failure map {:#b})", r.failure_map))),
                )
            }
            ScenarioStep::SetForwarder {
                caller, forwarder, ..
            } => {
                let outcome = self.coordinator.set_trusted_forwarder(
                    &context(caller),
                    forwarder.as_deref().map(Identity::from),
                );
                (
                    format!(
                        "{} sets the trusted forwarder to {}",
                        describe(caller),
                        forwarder.as_deref().unwrap_or("none")
                    ),
                    settle(outcome.map(|_| "updated".to_string())),
                )
            }
            ScenarioStep::SetTarget {
                caller,
                target,
                mode,
                ..
            } => {
                let outcome = self.coordinator.set_target_config(
                    &context(caller),
                    TargetConfig::new(target.as_str(), *mode),
                );
                (
                    format!("{} sets the target to {}", describe(caller), target),
                    settle(outcome.map(|_| "updated".to_string())),
                )
            }
            ScenarioStep::Wait { secs } => {
                let now = self.clock.advance(seconds(*secs));
                (
                    format!("wait {}s", secs),
                    StepResult::Ok {
                        detail: format!("now {}", now.to_rfc3339()),
                    },
                )
            }
            ScenarioStep::Succeed { body, report } => {
                let scripted = self.registry.get(&Identity::from(body.as_str())).ok_or_else(
                    || ScenarioError::UnknownBody {
                        step: number,
                        body: body.clone(),
                    },
                )?;
                let concluded = scripted.succeed_all(*report);
                (
                    format!("{} concludes its sub-decisions", body),
                    StepResult::Ok {
                        detail: format!("{} concluded", concluded),
                    },
                )
            }
            ScenarioStep::Inspect { proposal } => {
                let id = self.label(number, proposal)?;
                let detail = match self.coordinator.tally(&id).await {
                    Ok(tally) => format!(
                        "{}; can advance: {}, can execute: {}, succeeded: {}",
                        tally.summary(),
                        self.coordinator.can_proposal_advance(&id).await,
                        self.coordinator.can_execute(&id).await,
                        self.coordinator.has_succeeded(&id).await
                    ),
                    Err(e) => return Ok((format!("inspect '{}'", proposal), failed(e))),
                };
                (
                    format!("inspect '{}'", proposal),
                    StepResult::Ok { detail },
                )
            }
        };
        Ok(played)
    }

    /// Deliver every report the bodies queued, as calls from the bodies
    async fn deliver_reports(&mut self, number: usize) {
        while let Ok(BodyReport { body, callback }) = self.reports.try_recv() {
            let at = self.clock.now();
            let outcome = self
                .coordinator
                .report_result(
                    &CallContext::direct(body.clone()),
                    &callback.proposal_id,
                    callback.stage_id,
                    callback.result_kind,
                    callback.try_advance,
                )
                .await;
            self.outcomes.push(StepOutcome {
                step: number,
                description: format!(
                    "{} reports {} on {} stage {}",
                    body,
                    callback.result_kind,
                    callback.proposal_id.short(),
                    callback.stage_id
                ),
                at,
                result: settle(outcome.map(advance_detail)),
                expected: None,
                events: self.events.drain(),
            });
        }
    }

    fn label(&self, step: usize, label: &str) -> Result<ProposalId, ScenarioError> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| ScenarioError::UnknownLabel {
                step,
                label: label.to_string(),
            })
    }
}

fn context(caller: &ScenarioCaller) -> CallContext {
    let ctx = match &caller.via {
        Some(via) => CallContext::forwarded(via.as_str(), caller.caller.as_str()),
        None => CallContext::direct(caller.caller.as_str()),
    };
    match caller.budget {
        Some(budget) => ctx.with_budget(budget),
        None => ctx,
    }
}

fn describe(caller: &ScenarioCaller) -> String {
    match &caller.via {
        Some(via) => format!("{} (via {})", caller.caller, via),
        None => caller.caller.clone(),
    }
}

/// Scenario seconds as a delta, saturating at `TimeDelta::MAX`
fn seconds(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

fn advance_detail(outcome: Option<AdvanceOutcome>) -> String {
    match outcome {
        Some(AdvanceOutcome::Advanced { stage }) => format!("advanced to stage {}", stage),
        Some(AdvanceOutcome::Executed) => "executed".to_string(),
        None => "recorded".to_string(),
    }
}

fn settle(result: Result<String, CoordinatorError>) -> StepResult {
    match result {
        Ok(detail) => StepResult::Ok { detail },
        Err(e) => failed(e),
    }
}

fn failed(error: impl std::fmt::Display) -> StepResult {
    StepResult::Failed {
        error: error.to_string(),
    }
}

/// Counts of each event kind across a run
pub fn event_counts(report: &SimulationReport) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for event in report.steps.iter().flat_map(|s| &s.events) {
        *counts.entry(event.kind()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests;
