use spectrum_core::config::{CONFIG_FILE, role_arn};
use spectrum_core::{Error, SpectrumConfig};
use tempfile::TempDir;

const FULL_CONFIG: &str = r#"{
  "ProjectName": "acme",
  "RoleARN": "arn:aws:iam::123456789012:role/spectrum-role",
  "AssumeRoleName": "spectrum-role",
  "FargateAccountId": "123456789012",
  "FargateRegion": "us-east-1",
  "FargateStackName": "shared-fargate",
  "CostCenter": "cc-42",
  "ProjectOwner": "ops",
  "HealthCheckPath": "/health",
  "EnvironmentVariables": {
    "staging": { "API_URL": "https://staging.example.com" },
    "production": { "API_URL": "https://example.com", "LOG_LEVEL": "warn" }
  }
}"#;

#[test]
fn load_fails_when_not_initialized() {
    let tmp = TempDir::new().unwrap();
    let result = SpectrumConfig::load(tmp.path());

    assert!(matches!(result, Err(Error::NotInitialized { ref path }) if path.ends_with(CONFIG_FILE)));
}

#[test]
fn load_or_default_returns_empty_config_when_absent() {
    let tmp = TempDir::new().unwrap();
    let config = SpectrumConfig::load_or_default(tmp.path()).unwrap();

    assert_eq!(config, SpectrumConfig::default());
}

#[test]
fn load_parses_full_config() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(CONFIG_FILE), FULL_CONFIG).unwrap();

    let config = SpectrumConfig::load(tmp.path()).unwrap();

    assert_eq!(config.project_name.as_deref(), Some("acme"));
    assert_eq!(
        config.role_arn.as_deref(),
        Some("arn:aws:iam::123456789012:role/spectrum-role")
    );
    assert_eq!(config.fargate_stack_name.as_deref(), Some("shared-fargate"));
    assert_eq!(config.health_check_interval_seconds, None);
    assert_eq!(config.environment_variables.len(), 2);
    assert_eq!(
        config.environment_variables["production"]["LOG_LEVEL"],
        "warn"
    );
}

#[test]
fn load_reports_parse_errors() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(CONFIG_FILE), "{ not json").unwrap();

    let result = SpectrumConfig::load(tmp.path());

    assert!(matches!(result, Err(Error::ConfigParse { .. })));
}

#[test]
fn validate_resolves_required_fields_and_defaults() {
    let config: SpectrumConfig = serde_json::from_str(FULL_CONFIG).unwrap();
    let resolved = config.validate().unwrap();

    assert_eq!(resolved.project_name, "acme");
    assert_eq!(resolved.account_id, "123456789012");
    assert_eq!(resolved.region, "us-east-1");
    assert_eq!(resolved.stack_name, "shared-fargate");
    assert_eq!(resolved.health_check_path, "/health");
    assert_eq!(resolved.health_check_interval_seconds, 60);
    assert_eq!(
        resolved.registry().host(),
        "123456789012.dkr.ecr.us-east-1.amazonaws.com"
    );
}

#[test]
fn validate_reports_every_missing_field() {
    let config = SpectrumConfig {
        project_name: Some("acme".to_owned()),
        cost_center: Some("   ".to_owned()),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();

    match err {
        Error::IncompleteConfig { missing } => assert_eq!(
            missing,
            vec![
                "RoleARN",
                "FargateAccountId",
                "FargateRegion",
                "FargateStackName",
                "CostCenter",
                "HealthCheckPath",
            ]
        ),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn merge_overlays_set_fields_only() {
    let base: SpectrumConfig = serde_json::from_str(FULL_CONFIG).unwrap();
    let update = SpectrumConfig {
        fargate_region: Some("eu-west-1".to_owned()),
        ..Default::default()
    };

    let merged = base.clone().merge(update);

    assert_eq!(merged.fargate_region.as_deref(), Some("eu-west-1"));
    assert_eq!(merged.project_name, base.project_name);
    assert_eq!(merged.environment_variables, base.environment_variables);
}

#[test]
fn save_then_load_preserves_config() {
    let tmp = TempDir::new().unwrap();
    let config: SpectrumConfig = serde_json::from_str(FULL_CONFIG).unwrap();

    let path = config.save(tmp.path()).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();

    assert!(written.contains("\"RoleARN\""));
    assert!(written.contains("\"FargateAccountId\""));
    assert!(!written.contains("HealthCheckIntervalSeconds"));
    assert_eq!(SpectrumConfig::load(tmp.path()).unwrap(), config);
}

#[test]
fn role_arn_is_composed_from_account_and_role() {
    assert_eq!(
        role_arn("123456789012", "spectrum-role"),
        "arn:aws:iam::123456789012:role/spectrum-role"
    );
}
