//! Interpreter tests against a scripted oracle.

use std::sync::Arc;
use std::time::Duration;

use autodeploy_interpreter::{
    InstructionInterpreter, MockOracle, OracleError, ParseError, RetryPolicy,
};
use autodeploy_spec::{
    DeploymentType, Environment, ScalingRequirement, SecurityLevel, SpecError,
};
use serde_json::json;

fn interpreter(oracle: &MockOracle) -> InstructionInterpreter {
    InstructionInterpreter::new(Arc::new(oracle.clone())).with_retry(RetryPolicy::immediate())
}

fn server_error() -> OracleError {
    OracleError::Status {
        status: 503,
        body: "overloaded".to_string(),
    }
}

#[tokio::test]
async fn test_production_website() {
    let oracle = MockOracle::with_json(json!({
        "deployment_type": "web_application",
        "framework": "Node.js",
        "cloud_provider": "aws",
        "database_required": false,
        "scaling_requirements": "auto",
        "environment": "production",
        "security_level": "high",
        "region": "eu-west-1"
    }));
    let instruction = "Deploy a Node.js website on AWS using EC2 for production";

    let validated = interpreter(&oracle).interpret(instruction).await.unwrap();
    let spec = validated.spec;

    assert_eq!(spec.deployment_type, DeploymentType::WebApplication);
    assert_eq!(spec.framework.as_str(), "nodejs");
    assert_eq!(spec.environment, Environment::Production);
    assert_eq!(spec.scaling_requirements, ScalingRequirement::Auto);
    assert_eq!(spec.security_level, SecurityLevel::High);
    assert_eq!(spec.region, "eu-west-1");
    assert_eq!(spec.raw_instruction, instruction);
    assert!(validated.defaults.is_empty());
}

#[tokio::test]
async fn test_missing_scaling_defaults_to_manual() {
    let oracle = MockOracle::with_json(json!({
        "deployment_type": "web_application",
        "framework": "nodejs",
        "environment": "development"
    }));

    let validated = interpreter(&oracle)
        .interpret("Deploy a Node.js website on AWS using EC2")
        .await
        .unwrap();

    assert_eq!(
        validated.spec.scaling_requirements,
        ScalingRequirement::Manual
    );
    assert!(validated.was_defaulted("scaling_requirements"));
    assert!(validated.was_defaulted("security_level"));
    assert!(!validated.was_defaulted("framework"));
}

#[tokio::test]
async fn test_fenced_response() {
    let oracle = MockOracle::new()
        .reply("```json\n{\"deployment_type\": \"serverless\", \"framework\": \"python\"}\n```");

    let validated = interpreter(&oracle)
        .interpret("Create a serverless Python API")
        .await
        .unwrap();

    assert_eq!(validated.spec.deployment_type, DeploymentType::Serverless);
    assert_eq!(validated.spec.framework.as_str(), "python");
}

#[tokio::test]
async fn test_unknown_deployment_type_falls_back() {
    let oracle = MockOracle::with_json(json!({"deployment_type": "mainframe"}));

    let validated = interpreter(&oracle)
        .interpret("Run my COBOL batch job")
        .await
        .unwrap();

    assert_eq!(validated.spec.deployment_type, DeploymentType::WebApplication);
    assert!(validated.was_defaulted("deployment_type"));
}

#[tokio::test]
async fn test_empty_instruction_makes_no_call() {
    let oracle = MockOracle::new();

    let err = interpreter(&oracle).interpret("   \n").await.unwrap_err();

    assert!(matches!(err, ParseError::EmptyInstruction));
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let oracle = MockOracle::new()
        .fail(OracleError::Network("connection reset".into()))
        .fail(server_error())
        .reply(json!({"deployment_type": "container"}).to_string());

    let validated = interpreter(&oracle)
        .interpret("Run my Docker image")
        .await
        .unwrap();

    assert_eq!(validated.spec.deployment_type, DeploymentType::Container);
    assert_eq!(oracle.call_count(), 3);

    // Every attempt sends the same request
    let requests = oracle.requests();
    assert!(requests.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let oracle = MockOracle::new().fail(server_error());

    let err = interpreter(&oracle)
        .interpret("Deploy a static website")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ParseError::OracleUnavailable { attempts: 3, .. }
    ));
    assert_eq!(err.attempts(), 3);
    assert_eq!(oracle.call_count(), 3);
}

#[tokio::test]
async fn test_auth_failure_is_retried() {
    let oracle = MockOracle::new()
        .fail(OracleError::Status {
            status: 401,
            body: "expired token".into(),
        })
        .reply(json!({"environment": "production"}).to_string());

    let validated = interpreter(&oracle)
        .interpret("Deploy a Node.js website for production")
        .await
        .unwrap();

    assert_eq!(validated.spec.environment, Environment::Production);
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_bad_request_is_not_retried() {
    for status in [400, 404] {
        let oracle = MockOracle::new().fail(OracleError::Status {
            status,
            body: "unknown model".into(),
        });

        let err = interpreter(&oracle)
            .interpret("Deploy a static website")
            .await
            .unwrap_err();

        assert!(matches!(err, ParseError::OracleRejected { attempts: 1, .. }));
        assert_eq!(oracle.call_count(), 1);
    }
}

#[tokio::test]
async fn test_rejection_after_retries_reports_attempts() {
    let oracle = MockOracle::new()
        .fail(server_error())
        .fail(OracleError::Status {
            status: 400,
            body: "context length exceeded".into(),
        });

    let err = interpreter(&oracle)
        .interpret("Deploy a static website")
        .await
        .unwrap_err();

    assert!(matches!(err, ParseError::OracleRejected { attempts: 2, .. }));
    assert_eq!(err.attempts(), 2);
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_non_object_response_is_rejected() {
    let oracle = MockOracle::new().reply("[\"web_application\"]");

    let err = interpreter(&oracle)
        .interpret("Deploy a website")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ParseError::InvalidResponse(SpecError::NotAnObject(_))
    ));
}

#[tokio::test]
async fn test_prose_response_is_rejected() {
    let oracle = MockOracle::new().reply("Sure! Here is your deployment.");

    let err = interpreter(&oracle)
        .interpret("Deploy a website")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ParseError::InvalidResponse(SpecError::MalformedJson(_))
    ));
    assert_eq!(oracle.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_waits_between_attempts() {
    let oracle = MockOracle::new()
        .fail(server_error())
        .fail(server_error())
        .reply("{}");
    let interpreter = InstructionInterpreter::new(Arc::new(oracle.clone()))
        .with_retry(RetryPolicy::new(3, Duration::from_secs(1)));

    let started = tokio::time::Instant::now();
    interpreter.interpret("Deploy a website").await.unwrap();

    // 1s before the second attempt, 2s before the third
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(oracle.call_count(), 3);
}
