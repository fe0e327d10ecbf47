use super::*;

const CONFIG: &str = r#"
[coordinator]
id = "spp"
trusted_forwarder = "relay"
target = "dao"

[[stages]]
max_advance_secs = 36000
vote_duration_secs = 3600
approval_threshold = 1
veto_threshold = 1

[[stages.bodies]]
address = "council"
try_advance = true
result_kind = "approval"

[[stages.bodies]]
address = "guardian"
manual = true
result_kind = "veto"

[[stages]]
max_advance_secs = 36000
approval_threshold = 1

[[stages.bodies]]
address = "committee"
try_advance = true
result_kind = "approval"

[permissions]
admin = ["update_stages", "create_proposal", "execute_proposal"]
committee = ["execute_proposal"]
"#;

fn config() -> FileConfig {
    toml::from_str(CONFIG).unwrap()
}

async fn simulate(config: &FileConfig, scenario: &str) -> Result<SimulationReport, ScenarioError> {
    let scenario = Scenario::parse(scenario).unwrap();
    SimulationRunner::build(config, &scenario, None, None)
        .await?
        .run(&scenario.steps)
        .await
}

fn kinds(outcome: &StepOutcome) -> Vec<&'static str> {
    outcome.events.iter().map(ProposalEvent::kind).collect()
}

#[tokio::test]
async fn test_proposal_runs_to_execution() {
    let report = simulate(
        &config(),
        r#"
start = "2026-03-01T12:00:00Z"

[[steps]]
action = "create"
caller = "admin"
label = "grant"
actions = [{ target = "treasury", data = "pay" }]

[[steps]]
action = "succeed"
body = "council"

[[steps]]
action = "wait"
secs = 3600

[[steps]]
action = "advance"
caller = "anyone"
proposal = "grant"

[[steps]]
action = "succeed"
body = "committee"
"#,
    )
    .await
    .unwrap();

    let steps: Vec<usize> = report.steps.iter().map(|s| s.step).collect();
    assert_eq!(steps, vec![0, 1, 2, 2, 3, 4, 5, 5]);
    assert!(report.steps.iter().all(|s| s.result.is_ok()));

    assert_eq!(kinds(&report.steps[0]), vec!["stages_updated"]);
    assert_eq!(
        kinds(&report.steps[1]),
        vec!["proposal_created", "sub_decision_created"]
    );
    // Council reports inside the veto period, so nothing advances yet
    assert_eq!(
        report.steps[3].result,
        StepResult::Ok {
            detail: "recorded".to_string()
        }
    );
    assert_eq!(
        report.steps[5].result,
        StepResult::Ok {
            detail: "advanced to stage 1".to_string()
        }
    );
    // The committee may execute, so its report finishes the proposal
    assert_eq!(
        report.steps[7].result,
        StepResult::Ok {
            detail: "executed".to_string()
        }
    );
    assert_eq!(
        kinds(&report.steps[7]),
        vec!["result_reported", "proposal_executed"]
    );

    assert_eq!(report.proposals.len(), 1);
    assert_eq!(report.proposals[0].label, "grant");
    assert_eq!(report.proposals[0].status, Some(ProposalStatus::Executed));
    assert_eq!(report.executions.len(), 1);
    assert_eq!(report.executions[0].target.as_str(), "dao");
    assert_eq!(event_counts(&report)["proposal_executed"], 1);
}

#[tokio::test]
async fn test_veto_blocks_and_expectations_are_checked() {
    let report = simulate(
        &config(),
        r#"
start = "2026-03-01T12:00:00Z"

[[steps]]
action = "create"
caller = "admin"
label = "grant"

[[steps]]
action = "report"
caller = "guardian"
via = "relay"
proposal = "grant"
stage = 0
result = "veto"

[[steps]]
action = "succeed"
body = "council"
report = false

[[steps]]
action = "wait"
secs = 3600

[[steps]]
action = "advance"
caller = "admin"
proposal = "grant"
expect = "error"

[[steps]]
action = "execute"
caller = "mallory"
proposal = "grant"
expect = "ok"

[[steps]]
action = "inspect"
proposal = "grant"
"#,
    )
    .await
    .unwrap();

    // The forwarded report counts for the guardian itself
    assert!(report.steps[2].events.iter().any(|e| matches!(
        e,
        ProposalEvent::ResultReported { body, .. } if body.as_str() == "guardian"
    )));

    let unmet = report.unmet_expectations();
    assert_eq!(unmet.len(), 1);
    assert_eq!(unmet[0].step, 6);
    assert!(matches!(unmet[0].result, StepResult::Failed { .. }));

    let inspect = report.steps.last().unwrap();
    match &inspect.result {
        StepResult::Ok { detail } => {
            assert!(detail.starts_with("[●✕]"), "{}", detail);
            assert!(detail.contains("can advance: false"));
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(report.proposals[0].status, Some(ProposalStatus::InStage(0)));
    assert!(report.executions.is_empty());
}

#[tokio::test]
async fn test_rejecting_body_is_recorded_as_not_created() {
    let report = simulate(
        &config(),
        r#"
[[bodies]]
address = "council"
behavior = "reject"

[[steps]]
action = "create"
caller = "admin"
label = "grant"

[[steps]]
action = "succeed"
body = "council"
"#,
    )
    .await
    .unwrap();

    assert_eq!(
        kinds(&report.steps[1]),
        vec!["proposal_created", "sub_decision_not_created"]
    );
    assert_eq!(
        report.steps[2].result,
        StepResult::Ok {
            detail: "0 concluded".to_string()
        }
    );
}

#[tokio::test]
async fn test_unsupported_body_fails_setup() {
    let scenario = Scenario::parse(
        r#"
[[bodies]]
address = "committee"
behavior = "unsupported"
"#,
    )
    .unwrap();

    let err = SimulationRunner::build(&config(), &scenario, None, None)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ScenarioError::Setup(_)));
}

#[tokio::test]
async fn test_scenario_errors_abort() {
    let err = simulate(
        &config(),
        r#"
[[steps]]
action = "advance"
caller = "admin"
proposal = "ghost"
"#,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownLabel { step: 1, .. }));

    let err = simulate(
        &config(),
        r#"
[[steps]]
action = "succeed"
body = "nobody"
"#,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownBody { step: 1, .. }));
}

#[tokio::test]
async fn test_stages_need_an_administrator() {
    let mut config = config();
    config.permissions = Default::default();

    let err = simulate(&config, "").await.unwrap_err();
    assert!(matches!(err, ScenarioError::NoAdministrator));
}

#[tokio::test]
async fn test_resumed_state_keeps_stages() {
    let first = simulate(
        &config(),
        r#"
[[steps]]
action = "create"
caller = "admin"
label = "grant"
"#,
    )
    .await
    .unwrap();

    let scenario = Scenario::default();
    let resumed = SimulationRunner::build(&config(), &scenario, Some(first.state.clone()), None)
        .await
        .unwrap()
        .run(&scenario.steps)
        .await
        .unwrap();

    assert!(resumed.steps.is_empty());
    assert_eq!(resumed.state, first.state);
}

#[tokio::test]
async fn test_out_of_range_seconds_saturate() {
    let report = simulate(
        &config(),
        r#"
start = "2026-03-01T12:00:00Z"

[[steps]]
action = "create"
caller = "admin"
label = "late"
start_in_secs = 9223372036854775807

[[steps]]
action = "wait"
secs = 10000000000000000
"#,
    )
    .await
    .unwrap();

    assert!(report.steps.iter().all(|s| s.result.is_ok()));
    assert_eq!(
        report.steps.last().map(|s| &s.result),
        Some(&StepResult::Ok {
            detail: format!("now {}", DateTime::<Utc>::MAX_UTC.to_rfc3339()),
        })
    );
}

#[tokio::test]
async fn test_summary_reports_expired_proposal() {
    let report = simulate(
        &config(),
        r#"
[[steps]]
action = "create"
caller = "admin"
label = "stale"

[[steps]]
action = "wait"
secs = 36001

[[steps]]
action = "advance"
caller = "admin"
proposal = "stale"
expect = "error"
"#,
    )
    .await
    .unwrap();

    assert!(report.unmet_expectations().is_empty());
    assert_eq!(report.proposals[0].status, Some(ProposalStatus::Expired));
}
