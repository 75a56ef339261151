use std::collections::BTreeMap;

use spectrum_core::artifacts::{
    DNS_RECORD_FILE, PARAMETERS_FILE, TAGS_FILE, TEMPLATE_FILE, file_uri, render_parameters,
    render_tags, render_template,
};
use spectrum_core::{
    AliasTarget, DeployScope, DeploymentConfig, DnsAction, DnsRecordIntent, HostedZone,
    ResourceName, ScratchDir, StackInputs,
};
use tempfile::TempDir;

fn deployment_config() -> DeploymentConfig {
    DeploymentConfig {
        project_name: "acme".to_owned(),
        role_arn: "arn:aws:iam::123456789012:role/spectrum-role".to_owned(),
        account_id: "123456789012".to_owned(),
        region: "us-east-1".to_owned(),
        stack_name: "shared-fargate".to_owned(),
        cost_center: "cc-42".to_owned(),
        project_owner: Some("ops".to_owned()),
        health_check_path: "/health".to_owned(),
        health_check_interval_seconds: 30,
        environment_variables: BTreeMap::new(),
    }
}

fn tag_value(tags: &serde_json::Value, key: &str) -> Option<String> {
    tags.as_array()?
        .iter()
        .find(|t| t["Key"] == key)
        .and_then(|t| t["Value"].as_str().map(str::to_owned))
}

fn param_value(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .as_array()?
        .iter()
        .find(|p| p["ParameterKey"] == key)
        .and_then(|p| p["ParameterValue"].as_str().map(str::to_owned))
}

// ── Stack inputs ──

#[test]
fn branch_inputs_use_branch_tag_in_image_url() {
    let inputs = StackInputs::new(
        &deployment_config(),
        &DeployScope::branch("feature-x"),
        BTreeMap::new(),
    );

    assert_eq!(inputs.resource.as_str(), "acme-feature-x");
    assert_eq!(
        inputs.image_url,
        "123456789012.dkr.ecr.us-east-1.amazonaws.com/acme:feature-x"
    );
    assert_eq!(inputs.owner, "ops");
}

// ── Tags ──

#[test]
fn tags_carry_deployment_marker_and_project() {
    let inputs = StackInputs::new(
        &deployment_config(),
        &DeployScope::branch("feature-x"),
        BTreeMap::new(),
    );
    let tags: serde_json::Value = serde_json::from_str(&render_tags(&inputs).unwrap()).unwrap();

    assert_eq!(tag_value(&tags, "spectrum:deployment").as_deref(), Some("true"));
    assert_eq!(tag_value(&tags, "mon:project").as_deref(), Some("acme-feature-x"));
    assert_eq!(tag_value(&tags, "mon:owner").as_deref(), Some("ops"));
    assert_eq!(tag_value(&tags, "mon:cost-center").as_deref(), Some("cc-42"));
}

// ── Parameters ──

#[test]
fn parameters_describe_the_application() {
    let inputs = StackInputs::new(&deployment_config(), &DeployScope::Primary, BTreeMap::new());
    let params: serde_json::Value =
        serde_json::from_str(&render_parameters(&inputs).unwrap()).unwrap();

    assert_eq!(param_value(&params, "ApplicationName").as_deref(), Some("acme"));
    assert_eq!(
        param_value(&params, "ImageUrl").as_deref(),
        Some("123456789012.dkr.ecr.us-east-1.amazonaws.com/acme:latest")
    );
    assert_eq!(
        param_value(&params, "FargateStackName").as_deref(),
        Some("shared-fargate")
    );
    assert_eq!(param_value(&params, "HealthCheckPath").as_deref(), Some("/health"));
    assert_eq!(
        param_value(&params, "HealthCheckIntervalSeconds").as_deref(),
        Some("30")
    );
    assert!(param_value(&params, "ListenerPriority").is_some());
}

// ── Template ──

#[test]
fn template_renders_environment_variables() {
    let env = BTreeMap::from([
        ("API_URL".to_owned(), "https://example.com".to_owned()),
        ("QUOTED".to_owned(), "say \"hi\"".to_owned()),
    ]);

    let template = render_template(&env).unwrap();

    assert!(template.contains("- Name: \"API_URL\"\n              Value: \"https://example.com\""));
    assert!(template.contains("Value: \"say \\\"hi\\\"\""));
    assert!(template.contains("- Name: \"PORT\""));
    assert!(!template.contains("__ENVIRONMENT__"));
}

#[test]
fn template_group_can_override_port() {
    let env = BTreeMap::from([("PORT".to_owned(), "8080".to_owned())]);
    let template = render_template(&env).unwrap();

    assert!(template.contains("Value: \"8080\""));
    assert_eq!(template.matches("- Name: \"PORT\"").count(), 1);
}

// ── Scratch directory ──

#[test]
fn write_stack_artifacts_creates_all_files() {
    let tmp = TempDir::new().unwrap();
    let scratch = ScratchDir::in_project(tmp.path());
    let inputs = StackInputs::new(&deployment_config(), &DeployScope::Primary, BTreeMap::new());

    let artifacts = scratch.write_stack_artifacts(&inputs).unwrap();

    assert_eq!(artifacts.template, tmp.path().join(".spectrum").join(TEMPLATE_FILE));
    assert_eq!(artifacts.parameters, tmp.path().join(".spectrum").join(PARAMETERS_FILE));
    assert_eq!(artifacts.tags, tmp.path().join(".spectrum").join(TAGS_FILE));
    assert!(artifacts.template.exists());
    assert!(artifacts.parameters.exists());
    assert!(artifacts.tags.exists());
}

#[test]
fn write_dns_change_renders_change_batch() {
    let tmp = TempDir::new().unwrap();
    let scratch = ScratchDir::in_project(tmp.path());
    let intent = DnsRecordIntent::new(
        DnsAction::Delete,
        &ResourceName::new("acme", &DeployScope::Primary),
        &HostedZone {
            id: "Z123".to_owned(),
            domain: "example.com.".to_owned(),
        },
        &AliasTarget {
            hosted_zone_id: "Z35SXDOTRQ7X7K".to_owned(),
            dns_name: "lb-1.us-east-1.elb.amazonaws.com".to_owned(),
        },
    );

    let path = scratch.write_dns_change(&intent).unwrap();
    let batch: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let change = &batch["Changes"][0];

    assert!(path.ends_with(DNS_RECORD_FILE));
    assert_eq!(change["Action"], "DELETE");
    assert_eq!(change["ResourceRecordSet"]["Name"], "acme.example.com.");
    assert_eq!(
        change["ResourceRecordSet"]["AliasTarget"]["HostedZoneId"],
        "Z35SXDOTRQ7X7K"
    );
    assert_eq!(
        change["ResourceRecordSet"]["AliasTarget"]["DNSName"],
        "lb-1.us-east-1.elb.amazonaws.com."
    );
}

#[test]
fn intent_reports_missing_fields() {
    let intent = DnsRecordIntent {
        action: DnsAction::Create,
        zone_id: String::new(),
        record_name: "acme.example.com.".to_owned(),
        alias_target_id: " ".to_owned(),
        alias_target_domain: "lb.".to_owned(),
    };

    assert_eq!(intent.missing_fields(), vec!["zoneId", "aliasTargetId"]);
}

#[test]
fn blank_lookups_stay_missing_after_dot_suffixing() {
    let intent = DnsRecordIntent::new(
        DnsAction::Create,
        &ResourceName::new("acme", &DeployScope::Primary),
        &HostedZone {
            id: "Z123".to_owned(),
            domain: String::new(),
        },
        &AliasTarget {
            hosted_zone_id: "Z35SXDOTRQ7X7K".to_owned(),
            dns_name: String::new(),
        },
    );

    assert_eq!(intent.record_name, "");
    assert_eq!(intent.alias_target_domain, "");
    assert_eq!(
        intent.missing_fields(),
        vec!["recordName", "aliasTargetDomain"]
    );
}

#[test]
fn root_label_alone_counts_as_missing() {
    let intent = DnsRecordIntent {
        action: DnsAction::Delete,
        zone_id: "Z123".to_owned(),
        record_name: "acme.example.com.".to_owned(),
        alias_target_id: "Z35SXDOTRQ7X7K".to_owned(),
        alias_target_domain: ".".to_owned(),
    };

    assert_eq!(intent.missing_fields(), vec!["aliasTargetDomain"]);
}

#[test]
fn file_uri_prefixes_path() {
    let uri = file_uri(std::path::Path::new("/tmp/.spectrum/tags.json")).unwrap();
    assert_eq!(uri, "file:///tmp/.spectrum/tags.json");
}
