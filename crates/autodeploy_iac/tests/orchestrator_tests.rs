//! Orchestration tests against the mock provisioning tool.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use autodeploy_iac::{DeploymentStatus, IacError, Orchestrator, LOCK_FILE};
use autodeploy_runner::{MockResponse, MockTool, ToolOperation};
use autodeploy_spec::{ArtifactKind, ArtifactSet, DeploymentType};

const OUTPUTS_JSON: &str = r#"{
  "app_url": {"sensitive": false, "type": "string", "value": "http://autodeploy-web-dev.example.com"},
  "database_secret_arn": {"sensitive": true, "type": "string", "value": "arn:aws:secretsmanager:us-east-1:1:secret:db"}
}"#;

fn artifacts() -> ArtifactSet {
    let mut set = ArtifactSet::new(DeploymentType::WebApplication);
    for kind in ArtifactKind::ALL {
        set.insert(kind, format!("# {}\n", kind.file_name()));
    }
    set
}

fn orchestrator(tool: &MockTool) -> Orchestrator {
    Orchestrator::new(Arc::new(tool.clone())).with_destroy_backoff(Duration::from_millis(5))
}

#[tokio::test]
async fn test_dry_run_plans_without_applying() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new();

    let result = orchestrator(&tool)
        .deploy(dir.path(), &artifacts(), true)
        .await
        .unwrap();

    assert_eq!(result.status, DeploymentStatus::Planned);
    assert!(result.is_success());
    assert_eq!(tool.operations(), vec![ToolOperation::Plan]);
    assert!(!tool.was_called(ToolOperation::Apply));
    assert_eq!(result.artifacts.len(), 6);
    assert!(dir.path().join("provider.tf").exists());
}

#[tokio::test]
async fn test_full_deploy_collects_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new()
        .add_response(ToolOperation::Plan, MockResponse::success("Plan: 12 to add"))
        .add_response(ToolOperation::Apply, MockResponse::success("Apply complete!"))
        .with_outputs_json(OUTPUTS_JSON);

    let result = orchestrator(&tool)
        .deploy(dir.path(), &artifacts(), false)
        .await
        .unwrap();

    assert_eq!(result.status, DeploymentStatus::Applied);
    assert_eq!(
        tool.operations(),
        vec![
            ToolOperation::Plan,
            ToolOperation::Apply,
            ToolOperation::Outputs
        ]
    );
    assert_eq!(
        result.outputs["app_url"],
        "http://autodeploy-web-dev.example.com"
    );
    assert_eq!(result.outputs["database_secret_arn"], "(sensitive)");
    assert_eq!(result.plan_output.as_deref(), Some("Plan: 12 to add"));
    assert_eq!(result.apply_output.as_deref(), Some("Apply complete!"));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_failed_plan_skips_apply() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new().add_response(
        ToolOperation::Plan,
        MockResponse::failure(1, "Error: Unsupported argument"),
    );

    let result = orchestrator(&tool)
        .deploy(dir.path(), &artifacts(), false)
        .await
        .unwrap();

    assert_eq!(result.status, DeploymentStatus::Failed);
    assert!(!tool.was_called(ToolOperation::Apply));

    let error = result.error.unwrap();
    assert_eq!(error.stage, "plan");
    assert_eq!(error.exit_code, Some(1));
    assert!(error.output.contains("Unsupported argument"));
}

#[tokio::test]
async fn test_failed_apply_is_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new().add_response(
        ToolOperation::Apply,
        MockResponse::failure(1, "Error: creating EC2 Instance: UnauthorizedOperation"),
    );

    let result = orchestrator(&tool)
        .deploy(dir.path(), &artifacts(), false)
        .await
        .unwrap();

    assert_eq!(result.status, DeploymentStatus::Failed);
    assert_eq!(tool.operation_count(ToolOperation::Apply), 1);
    assert!(!tool.was_called(ToolOperation::Destroy));
    assert_eq!(result.error.unwrap().stage, "apply");

    // Working directory is kept for inspection
    assert!(dir.path().join("compute.tf").exists());
}

#[tokio::test]
async fn test_destroy_retries_once() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new().with_responses(
        ToolOperation::Destroy,
        vec![
            MockResponse::failure(1, "Error: DependencyViolation"),
            MockResponse::success("Destroy complete! Resources: 12 destroyed."),
        ],
    );
    let orchestrator = orchestrator(&tool);
    orchestrator
        .deploy(dir.path(), &artifacts(), false)
        .await
        .unwrap();

    let result = orchestrator.destroy(dir.path()).await.unwrap();

    assert_eq!(result.status, DeploymentStatus::Destroyed);
    assert_eq!(tool.operation_count(ToolOperation::Destroy), 2);
    assert_eq!(
        result.destroy_output.as_deref(),
        Some("Destroy complete! Resources: 12 destroyed.")
    );
}

#[tokio::test]
async fn test_destroy_gives_up_after_two_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new().add_response(
        ToolOperation::Destroy,
        MockResponse::failure(1, "Error: DependencyViolation"),
    );
    let orchestrator = orchestrator(&tool);
    orchestrator
        .deploy(dir.path(), &artifacts(), true)
        .await
        .unwrap();

    let result = orchestrator.destroy(dir.path()).await.unwrap();

    assert_eq!(result.status, DeploymentStatus::Failed);
    assert_eq!(tool.operation_count(ToolOperation::Destroy), 2);

    let error = result.error.unwrap();
    assert_eq!(error.stage, "destroy");
    assert!(error.message.contains("2 attempt(s)"));
    assert_eq!(error.exit_code, Some(1));
    assert!(error.output.contains("DependencyViolation"));
}

#[tokio::test]
async fn test_destroy_keeps_exit_detail_when_retry_cannot_run() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new().with_responses(
        ToolOperation::Destroy,
        vec![
            MockResponse::failure(1, "Error: DependencyViolation"),
            MockResponse::error("terraform timed out after 30s"),
        ],
    );
    let orchestrator = orchestrator(&tool);
    orchestrator
        .deploy(dir.path(), &artifacts(), true)
        .await
        .unwrap();

    let result = orchestrator.destroy(dir.path()).await.unwrap();

    assert_eq!(result.status, DeploymentStatus::Failed);
    assert_eq!(tool.operation_count(ToolOperation::Destroy), 2);

    let error = result.error.unwrap();
    assert_eq!(error.stage, "destroy");
    assert!(error.message.starts_with("Destroy failed after 2 attempt(s)"));
    assert!(error.message.contains("exit code 1"));
    assert!(error.message.contains("terraform timed out after 30s"));
    assert_eq!(error.exit_code, Some(1));
    assert!(error.output.contains("DependencyViolation"));
}

#[tokio::test]
async fn test_destroy_that_never_runs_is_still_destroy_failed() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new().add_response(
        ToolOperation::Destroy,
        MockResponse::error("docker: command not found"),
    );
    let orchestrator = orchestrator(&tool);
    orchestrator
        .deploy(dir.path(), &artifacts(), true)
        .await
        .unwrap();

    let result = orchestrator.destroy(dir.path()).await.unwrap();

    let error = result.error.unwrap();
    assert!(error.message.starts_with("Destroy failed after 2 attempt(s)"));
    assert!(error.message.contains("docker: command not found"));
    assert_eq!(error.exit_code, None);
    assert_eq!(tool.operation_count(ToolOperation::Destroy), 2);
}

#[tokio::test]
async fn test_destroy_reports_existing_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new();
    let orchestrator = orchestrator(&tool);
    orchestrator
        .deploy(dir.path(), &artifacts(), false)
        .await
        .unwrap();

    let result = orchestrator.destroy(dir.path()).await.unwrap();

    assert_eq!(result.status, DeploymentStatus::Destroyed);
    assert_eq!(result.artifacts[0], "provider.tf");
    assert_eq!(result.artifacts.len(), 6);
}

#[tokio::test]
async fn test_destroy_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new();

    let err = orchestrator(&tool)
        .destroy(&dir.path().join("never-deployed"))
        .await
        .unwrap_err();

    assert!(matches!(err, IacError::WorkdirNotFound(_)));
    assert_eq!(tool.call_count(), 0);
}

#[tokio::test]
async fn test_busy_directory_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new();
    let orchestrator = orchestrator(&tool);

    let held = orchestrator.open(dir.path()).unwrap();
    let err = orchestrator
        .deploy(dir.path(), &artifacts(), true)
        .await
        .unwrap_err();

    assert!(err.is_busy());
    assert_eq!(tool.call_count(), 0);
    drop(held);

    let result = orchestrator
        .deploy(dir.path(), &artifacts(), true)
        .await
        .unwrap();
    assert_eq!(result.status, DeploymentStatus::Planned);
    assert!(dir.path().join(LOCK_FILE).exists());
}

#[tokio::test]
async fn test_existing_terraform_project_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let user_config = "resource \"null_resource\" \"x\" {}";
    fs::write(dir.path().join("main.tf"), user_config).unwrap();
    let tool = MockTool::new();

    let result = orchestrator(&tool)
        .deploy(dir.path(), &artifacts(), false)
        .await
        .unwrap();

    assert_eq!(result.status, DeploymentStatus::Failed);
    assert!(result.artifacts.is_empty());
    let error = result.error.unwrap();
    assert_eq!(error.stage, "plan");
    assert!(error.message.contains("main.tf"));
    assert_eq!(tool.call_count(), 0);
    assert_eq!(
        fs::read_to_string(dir.path().join("main.tf")).unwrap(),
        user_config
    );
    assert!(!dir.path().join("outputs.tf").exists());
}

#[tokio::test]
async fn test_redeploy_into_own_directory() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new();
    let orchestrator = orchestrator(&tool);

    orchestrator
        .deploy(dir.path(), &artifacts(), true)
        .await
        .unwrap();
    fs::write(dir.path().join("outputs.tf"), "# edited").unwrap();
    let second = orchestrator
        .deploy(dir.path(), &artifacts(), true)
        .await
        .unwrap();

    assert_eq!(second.status, DeploymentStatus::Planned);
    assert_eq!(
        fs::read_to_string(dir.path().join("outputs.tf")).unwrap(),
        "# outputs.tf\n"
    );
    assert_eq!(tool.operation_count(ToolOperation::Plan), 2);
}

#[tokio::test]
async fn test_runner_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let tool = MockTool::new().simulate_failure("terraform: command not found");

    let result = orchestrator(&tool)
        .deploy(dir.path(), &artifacts(), false)
        .await
        .unwrap();

    assert_eq!(result.status, DeploymentStatus::Failed);
    let error = result.error.unwrap();
    assert_eq!(error.stage, "plan");
    assert_eq!(error.exit_code, None);
    assert!(error.message.contains("command not found"));
}
