use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn spectrum(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("spectrum");
    cmd.current_dir(dir.path())
        .env_remove("AWS_ACCESS_KEY_ID")
        .env_remove("AWS_SECRET_ACCESS_KEY")
        .env_remove("ENVIRONMENT")
        .env_remove("CI");
    cmd
}

fn read_config(dir: &TempDir) -> serde_json::Value {
    let content = std::fs::read_to_string(dir.path().join("spectrum.config.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn write_complete_config(dir: &TempDir) {
    let config = serde_json::json!({
        "ProjectName": "acme",
        "RoleARN": "arn:aws:iam::123456789012:role/spectrum-role",
        "FargateAccountId": "123456789012",
        "FargateRegion": "us-east-1",
        "FargateStackName": "shared-fargate",
        "CostCenter": "eng",
        "HealthCheckPath": "/",
    });
    std::fs::write(
        dir.path().join("spectrum.config.json"),
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();
}

// ── Help / Version ──

#[test]
fn shows_help() {
    let tmp = TempDir::new().unwrap();
    spectrum(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("AWS Fargate"))
        .stdout(predicate::str::contains("deploy-branch"))
        .stdout(predicate::str::contains("--prune-docker-images"));
}

#[test]
fn shows_version() {
    let tmp = TempDir::new().unwrap();
    spectrum(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("spectrum"));
}

#[test]
fn describe_requires_app_argument() {
    let tmp = TempDir::new().unwrap();
    spectrum(&tmp)
        .arg("describe")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<APP>"));
}

// ── Init ──

#[test]
fn init_writes_config_with_defaults() {
    let tmp = TempDir::new().unwrap();

    spectrum(&tmp)
        .args([
            "init",
            "--project-name",
            "acme",
            "--account-id",
            "123456789012",
            "--stack-name",
            "shared-fargate",
            "--cost-center",
            "eng",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "arn:aws:iam::123456789012:role/spectrum-role",
        ))
        .stdout(predicate::str::contains("cloudformation:*"));

    let config = read_config(&tmp);
    assert_eq!(config["ProjectName"], "acme");
    assert_eq!(
        config["RoleARN"],
        "arn:aws:iam::123456789012:role/spectrum-role"
    );
    assert_eq!(config["AssumeRoleName"], "spectrum-role");
    assert_eq!(config["FargateRegion"], "us-east-1");
    assert_eq!(config["HealthCheckPath"], "/");
    assert_eq!(config["FargateStackName"], "shared-fargate");
}

#[test]
fn init_keeps_existing_values_and_groups() {
    let tmp = TempDir::new().unwrap();
    let existing = serde_json::json!({
        "ProjectName": "acme",
        "FargateAccountId": "123456789012",
        "CostCenter": "eng",
        "EnvironmentVariables": { "staging": { "LOG_LEVEL": "debug" } },
    });
    std::fs::write(
        tmp.path().join("spectrum.config.json"),
        existing.to_string(),
    )
    .unwrap();

    spectrum(&tmp)
        .args(["init", "--region", "eu-west-1", "--role-name", "deployer"])
        .assert()
        .success();

    let config = read_config(&tmp);
    assert_eq!(config["ProjectName"], "acme");
    assert_eq!(config["CostCenter"], "eng");
    assert_eq!(config["FargateRegion"], "eu-west-1");
    assert_eq!(config["RoleARN"], "arn:aws:iam::123456789012:role/deployer");
    assert_eq!(
        config["EnvironmentVariables"]["staging"]["LOG_LEVEL"],
        "debug"
    );
}

#[test]
fn init_reports_fields_still_missing() {
    let tmp = TempDir::new().unwrap();

    spectrum(&tmp)
        .args(["init", "--project-name", "acme"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FargateAccountId"))
        .stdout(predicate::str::contains("CostCenter"));

    assert!(read_config(&tmp).get("RoleARN").is_none());
}

// ── Preconditions ──

#[test]
fn deploy_without_config_fails() {
    let tmp = TempDir::new().unwrap();
    spectrum(&tmp)
        .arg("deploy-app")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("spectrum init"));
}

#[test]
fn deploy_with_incomplete_config_lists_missing_fields() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("spectrum.config.json"),
        r#"{ "ProjectName": "acme" }"#,
    )
    .unwrap();

    spectrum(&tmp)
        .arg("deploy-app")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("RoleARN"))
        .stderr(predicate::str::contains("CostCenter"));
}

#[test]
fn ci_deploy_reports_every_missing_variable() {
    let tmp = TempDir::new().unwrap();
    write_complete_config(&tmp);

    spectrum(&tmp)
        .args(["--ci", "deploy-app"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ENVIRONMENT"))
        .stderr(predicate::str::contains("AWS_ACCESS_KEY_ID"))
        .stderr(predicate::str::contains("AWS_SECRET_ACCESS_KEY"));
}

#[test]
fn destroy_without_credentials_fails_before_any_call() {
    let tmp = TempDir::new().unwrap();
    write_complete_config(&tmp);

    spectrum(&tmp)
        .arg("destroy-branch")
        .arg("feature-x")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("AWS credentials required"));

    assert!(!tmp.path().join(".spectrum").exists());
}
