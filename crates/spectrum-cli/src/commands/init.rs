use std::path::Path;

use clap::Args;
use spectrum_core::SpectrumConfig;
use spectrum_core::config::{
    DEFAULT_HEALTH_CHECK_PATH, DEFAULT_REGION, DEFAULT_ROLE_NAME, role_arn,
};
use spectrum_pipeline::EnvSnapshot;

/// Permissions the deployment role needs, as (service, IAM action).
const ROLE_PERMISSIONS: [(&str, &str); 16] = [
    ("S3", "s3:*"),
    ("Lambda", "lambda:*"),
    ("STS", "sts:*"),
    ("IAM", "iam:*"),
    ("Elastic Container Service", "ecs:*"),
    ("Elastic Container Registry", "ecr:*"),
    ("EC2", "ec2:*"),
    ("ELB / ELB v2", "elasticloadbalancing:*"),
    ("Route53", "route53:*"),
    ("CloudTrail", "cloudtrail:*"),
    ("CloudWatch Logs", "logs:*"),
    ("CloudFormation", "cloudformation:*"),
    ("CloudWatch Events", "events:*"),
    ("CloudWatch", "cloudwatch:*"),
    ("Lightsail", "lightsail:*"),
    ("Resource Group Tagging", "tag:*"),
];

#[derive(Debug, Default, Args)]
pub struct InitArgs {
    /// Application name (default: current directory name)
    #[arg(long)]
    pub project_name: Option<String>,
    /// AWS account that hosts the registry and the stacks
    #[arg(long)]
    pub account_id: Option<String>,
    /// Shared Fargate cluster stack the application imports from
    #[arg(long)]
    pub stack_name: Option<String>,
    /// AWS region (default: us-east-1)
    #[arg(long)]
    pub region: Option<String>,
    /// Cost center tag applied to every stack
    #[arg(long)]
    pub cost_center: Option<String>,
    /// IAM role assumed for deployments (default: spectrum-role)
    #[arg(long)]
    pub role_name: Option<String>,
    /// Path the load balancer health check requests (default: /)
    #[arg(long)]
    pub health_check_path: Option<String>,
    /// Owner tag applied to every stack (default: current user)
    #[arg(long)]
    pub owner: Option<String>,
}

/// Create or update spectrum.config.json in the current directory.
///
/// Values already in the file are kept unless a flag overrides them.
pub async fn init_project(args: InitArgs, env: &EnvSnapshot) -> anyhow::Result<()> {
    let project_dir = Path::new(".");
    let existing = SpectrumConfig::load_or_default(project_dir)?;

    let mut config = defaults(project_dir, env)?
        .merge(existing)
        .merge(SpectrumConfig {
            project_name: args.project_name,
            assume_role_name: args.role_name,
            fargate_account_id: args.account_id,
            fargate_region: args.region,
            fargate_stack_name: args.stack_name,
            cost_center: args.cost_center,
            project_owner: args.owner,
            health_check_path: args.health_check_path,
            ..SpectrumConfig::default()
        });

    if let (Some(account), Some(role)) = (&config.fargate_account_id, &config.assume_role_name) {
        config.role_arn = Some(role_arn(account, role));
    }

    let path = config.save(project_dir)?;
    println!("Wrote {}", path.display());
    if let Some(arn) = &config.role_arn {
        println!("Deployments will assume role {arn}");
    }

    if let Err(e) = config.validate() {
        println!();
        println!("{e}");
        println!("Run `spectrum init` again with the missing values, e.g. --account-id, --stack-name, --cost-center.");
    }

    println!();
    println!("The deployment role needs these permissions:");
    for (service, action) in ROLE_PERMISSIONS {
        println!("  {service:<28} {action}");
    }

    println!();
    println!("Tips:");
    println!("  - Add environment-variable groups under \"EnvironmentVariables\" in spectrum.config.json,");
    println!("    keyed by environment name, and select one with --environment or ENVIRONMENT.");
    println!("  - Put AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY in .env for local deploys.");
    println!("  - Deploy with `spectrum deploy-app`, or `spectrum deploy-branch` for the current branch.");

    Ok(())
}

fn defaults(project_dir: &Path, env: &EnvSnapshot) -> anyhow::Result<SpectrumConfig> {
    let dir = std::fs::canonicalize(project_dir)?;
    Ok(SpectrumConfig {
        project_name: dir
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_owned),
        assume_role_name: Some(DEFAULT_ROLE_NAME.to_owned()),
        fargate_region: Some(DEFAULT_REGION.to_owned()),
        project_owner: env.get("USER").or_else(|| env.get("USERNAME")),
        health_check_path: Some(DEFAULT_HEALTH_CHECK_PATH.to_owned()),
        ..SpectrumConfig::default()
    })
}
