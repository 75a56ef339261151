use std::path::{Path, PathBuf};

use spectrum_aws::{AwsClient, CredentialContext};
use spectrum_build::docker::local_image;
use spectrum_build::{DockerClient, current_branch};
use spectrum_core::{
    CommandExecutor, DeployScope, DeploymentConfig, DnsAction, DnsRecordIntent, RealExecutor,
    ResourceName, ScratchDir, StackIdentity, StackInputs,
};

use crate::error::PipelineError;
use crate::options::{EnvSnapshot, OptionInputs, resolve_credentials, resolve_options};
use crate::tracker::{StepReporter, StepTracker};

pub const DEPLOY_STEPS: [&str; 8] = [
    "Assuming Role",
    "Building Docker Container",
    "Configuring Elastic Container Registry",
    "Tagging Docker Container",
    "Publishing Docker container to AWS Elastic Container Registry",
    "Removing untagged images from ECR (cleanup)",
    "Deploying CloudFormation Application Stack",
    "Configuring Route53 DNS Entry",
];

pub fn destroy_steps(target: &Target) -> [&'static str; 4] {
    [
        "Assuming Role",
        "Deleting Application Stack",
        match target {
            Target::Primary => "Deleting Application Registry from ECR",
            Target::Branch(_) => "Deleting Application Container from ECR",
        },
        "Removing Route53 DNS Entry",
    ]
}

/// Which deployment a command acts on, before branch discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Primary,
    /// Branch scope; `None` reads the current branch of the working tree.
    Branch(Option<String>),
}

#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub resource: ResourceName,
    pub stack: StackIdentity,
    /// Registry image that was published
    pub image: String,
    /// Fully-qualified DNS record pointing at the load balancer
    pub record_name: String,
    pub environment: Option<String>,
}

impl DeployOutcome {
    /// Public URL of the deployment, without the zone's root dot.
    pub fn url(&self) -> String {
        format!("https://{}", self.record_name.trim_end_matches('.'))
    }
}

#[derive(Debug, Clone)]
pub struct TeardownOutcome {
    pub resource: ResourceName,
    /// Stack submitted for deletion, `None` when no stack matched.
    pub stack: Option<String>,
    pub record_name: String,
}

/// Runs the deploy and destroy pipelines for one project.
///
/// All external tools go through one executor; the AWS and docker clients
/// borrow it per run.
pub struct Orchestrator<E: CommandExecutor = RealExecutor> {
    executor: E,
    config: DeploymentConfig,
    project_dir: PathBuf,
    scratch: ScratchDir,
    env: EnvSnapshot,
}

impl Orchestrator<RealExecutor> {
    pub fn new(config: DeploymentConfig, project_dir: &Path, env: EnvSnapshot) -> Self {
        Self::with_executor(RealExecutor, config, project_dir, env)
    }
}

impl<E: CommandExecutor> Orchestrator<E> {
    pub fn with_executor(
        executor: E,
        config: DeploymentConfig,
        project_dir: &Path,
        env: EnvSnapshot,
    ) -> Self {
        Self {
            executor,
            config,
            project_dir: project_dir.to_path_buf(),
            scratch: ScratchDir::in_project(project_dir),
            env,
        }
    }

    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    pub(crate) fn aws(&self) -> AwsClient<&E> {
        AwsClient::with_executor(&self.executor)
    }

    fn docker(&self) -> DockerClient<&E> {
        DockerClient::with_executor(&self.executor)
    }

    /// Base credentials from the environment, exchanged for the configured role.
    pub(crate) async fn assume_role(
        &self,
        options: &OptionInputs,
    ) -> Result<CredentialContext, PipelineError> {
        let base = resolve_credentials(options, &self.env)?;
        Ok(self
            .aws()
            .exchange_credentials(&self.config.role_arn, Some(&base), &self.config.region)
            .await?)
    }

    /// Explicit branch wins, else the working tree's current branch.
    pub async fn resolve_scope(&self, target: &Target) -> Result<DeployScope, PipelineError> {
        match target {
            Target::Primary => Ok(DeployScope::Primary),
            Target::Branch(Some(branch)) if !branch.trim().is_empty() => {
                Ok(DeployScope::branch(branch))
            }
            Target::Branch(_) => Ok(DeployScope::branch(
                &current_branch(&self.executor).await?,
            )),
        }
    }

    // ── Deploy ──

    pub async fn deploy(
        &self,
        target: &Target,
        options: &OptionInputs,
        reporter: Box<dyn StepReporter>,
    ) -> Result<DeployOutcome, PipelineError> {
        let mut tracker = StepTracker::new(DEPLOY_STEPS, reporter);
        let result = self.run_deploy(target, options, &mut tracker).await;
        finish(&mut tracker, result)
    }

    async fn run_deploy(
        &self,
        target: &Target,
        options: &OptionInputs,
        tracker: &mut StepTracker,
    ) -> Result<DeployOutcome, PipelineError> {
        let config = &self.config;
        let resolved = resolve_options(options, config, &self.env)?;
        let scope = self.resolve_scope(target).await?;

        let project = config.project_name.as_str();
        let tag = scope.image_tag();
        let registry = config.registry();
        let resource = ResourceName::new(project, &scope);
        let aws = self.aws();
        let docker = self.docker();

        tracker.advance(Some(&format!("Assuming Role: {}", config.role_arn)));
        let creds = aws
            .exchange_credentials(&config.role_arn, Some(&resolved.credentials), &config.region)
            .await?;

        tracker.advance(Some(&format!(
            "Building Docker Container: {}",
            local_image(project, tag)
        )));
        docker.build(project, tag, &self.project_dir).await?;

        tracker.advance(None);
        aws.create_registry(&creds, project).await?;

        tracker.advance(Some(&format!("Tagging Container {project} with tag: {tag}")));
        let image = docker.tag(project, &registry, tag).await?;

        tracker.advance(Some(&format!(
            "Publishing Container: {} -> {image}",
            local_image(project, tag)
        )));
        aws.login_registry(&creds, &registry).await?;
        aws.publish_image(&creds, project, &registry, tag).await?;

        tracker.advance(None);
        match aws.delete_untagged_images(&creds, project).await {
            Ok(count) => tracing::debug!(count, "removed untagged images"),
            Err(e) => tracker.warn(&format!(
                "failed to clean up untagged images from ECR, you may need to remove them yourself: {e}"
            )),
        }

        tracker.advance(Some(&format!(
            "Deploying CloudFormation Application Stack: {resource}"
        )));
        let inputs = StackInputs::new(config, &scope, resolved.variables);
        let artifacts = self.scratch.write_stack_artifacts(&inputs)?;
        let stack = aws.create_stack(&creds, &resource, &artifacts).await?;

        tracker.advance(None);
        let record_name = self
            .apply_dns(&aws, &creds, DnsAction::Create, &resource)
            .await?;

        Ok(DeployOutcome {
            resource,
            stack,
            image,
            record_name,
            environment: resolved.environment,
        })
    }

    // ── Destroy ──

    pub async fn destroy(
        &self,
        target: &Target,
        options: &OptionInputs,
        reporter: Box<dyn StepReporter>,
    ) -> Result<TeardownOutcome, PipelineError> {
        let mut tracker = StepTracker::new(destroy_steps(target), reporter);
        let result = self.run_destroy(target, options, &mut tracker).await;
        finish(&mut tracker, result)
    }

    async fn run_destroy(
        &self,
        target: &Target,
        options: &OptionInputs,
        tracker: &mut StepTracker,
    ) -> Result<TeardownOutcome, PipelineError> {
        let config = &self.config;
        let aws = self.aws();

        tracker.advance(Some(&format!("Assuming Role: {}", config.role_arn)));
        let creds = self.assume_role(options).await?;

        let scope = self.resolve_scope(target).await?;
        let project = config.project_name.as_str();
        let resource = ResourceName::new(project, &scope);

        tracker.advance(Some(&format!("Deleting application stack: {resource}")));
        let stacks = aws.list_stacks(&creds, Some(resource.as_str())).await?;
        let stack = match stacks.split_first() {
            None => {
                tracker.warn(&format!(
                    "no stack found for {resource}, skipping stack deletion"
                ));
                None
            }
            Some((first, rest)) => {
                if !rest.is_empty() {
                    tracker.warn(&format!(
                        "several stacks match {resource}; deleting {first} and leaving {}",
                        rest.join(", ")
                    ));
                }
                if let Err(e) = aws.destroy_stack(&creds, first).await {
                    tracker.warn(&format!(
                        "there was an issue deleting stack {first}, it was probably rolled back; continuing: {e}"
                    ));
                }
                Some(first.clone())
            }
        };

        let registry = config.registry();
        match scope.branch_name() {
            None => {
                tracker.advance(Some(&format!(
                    "Deleting Container Repository: {}/{project}",
                    registry.host()
                )));
                aws.destroy_registry(&creds, project).await?;
            }
            Some(tag) => {
                tracker.advance(Some(&format!(
                    "Deleting Container Image: {}",
                    registry.image(project, tag)
                )));
                aws.delete_image_by_tag(&creds, project, tag).await?;
            }
        }

        tracker.advance(None);
        let record_name = self
            .apply_dns(&aws, &creds, DnsAction::Delete, &resource)
            .await?;

        Ok(TeardownOutcome {
            resource,
            stack,
            record_name,
        })
    }

    /// Look up zone and load balancer, then apply the alias change.
    async fn apply_dns(
        &self,
        aws: &AwsClient<&E>,
        creds: &CredentialContext,
        action: DnsAction,
        resource: &ResourceName,
    ) -> Result<String, PipelineError> {
        let zone = aws.get_hosted_zone(creds).await?;
        let target = aws.get_load_balancer(creds).await?;
        let intent = DnsRecordIntent::new(action, resource, &zone, &target);
        let change = aws.upsert_dns_record(creds, &intent, &self.scratch).await?;
        tracing::debug!(record = %intent.record_name, %action, ?change, "dns change");
        Ok(intent.record_name)
    }
}

fn finish<T>(
    tracker: &mut StepTracker,
    result: Result<T, PipelineError>,
) -> Result<T, PipelineError> {
    match &result {
        Ok(_) => tracker.complete(None),
        Err(e) => tracker.fail(e),
    }
    result
}
