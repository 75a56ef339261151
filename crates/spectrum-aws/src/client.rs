use serde::Deserialize;
use spectrum_core::artifacts::{DEPLOYMENT_TAG, PROJECT_TAG, file_uri};
use spectrum_core::executor::args;
use spectrum_core::{
    AliasTarget, CommandExecutor, DnsAction, DnsRecordIntent, HostedZone, RealExecutor,
    RegistryPath, ResourceName, ScratchDir, StackArtifacts, StackIdentity,
};

use crate::credentials::{AssumeRoleOutput, BaseCredentials, CredentialContext};
use crate::error::{AwsError, FailureReason};

const AWS: &str = "aws";
const DOCKER: &str = "docker";

/// Session name recorded in CloudTrail for assumed-role calls.
pub const ROLE_SESSION_NAME: &str = "spectrum-deployment";

/// `batch-delete-image` accepts at most this many image ids per call.
const IMAGE_DELETE_BATCH: usize = 100;

/// AWS operations client, parameterized over the executor for testability.
///
/// Every method wraps one `aws` (or `docker`) invocation and normalizes its
/// output. Methods after [`exchange_credentials`](Self::exchange_credentials)
/// take the resulting [`CredentialContext`] explicitly.
pub struct AwsClient<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl AwsClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for AwsClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> AwsClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    async fn aws(
        &self,
        operation: &'static str,
        creds: &CredentialContext,
        args: &[String],
    ) -> Result<String, AwsError> {
        self.executor
            .exec(AWS, args, &creds.env())
            .await
            .map_err(|e| AwsError::call(operation, e))
    }

    // ── Credentials ──

    /// Assume `role_arn` with the ambient base credentials.
    pub async fn exchange_credentials(
        &self,
        role_arn: &str,
        base: Option<&BaseCredentials>,
        region: &str,
    ) -> Result<CredentialContext, AwsError> {
        const OP: &str = "aws sts assume-role";
        require(OP, "role ARN", role_arn)?;
        let base = base.ok_or(AwsError::MissingBaseCredentials)?;

        let output = self
            .executor
            .exec(
                AWS,
                &args([
                    "sts",
                    "assume-role",
                    "--role-arn",
                    role_arn,
                    "--role-session-name",
                    ROLE_SESSION_NAME,
                    "--region",
                    region,
                    "--output",
                    "json",
                ]),
                &base.env(),
            )
            .await
            .map_err(|e| AwsError::call(OP, e))?;

        let parsed: AssumeRoleOutput = parse(OP, &output)?;
        tracing::debug!(role_arn, "assumed role");
        Ok(parsed.credentials.into_context(region))
    }

    // ── Registry ──

    /// Create the repository; an existing repository counts as success.
    pub async fn create_registry(
        &self,
        creds: &CredentialContext,
        name: &str,
    ) -> Result<RegistryDescriptor, AwsError> {
        const OP: &str = "aws ecr create-repository";
        require(OP, "repository name", name)?;

        let result = self
            .aws(
                OP,
                creds,
                &args([
                    "ecr",
                    "create-repository",
                    "--repository-name",
                    name,
                    "--region",
                    &creds.region,
                    "--output",
                    "json",
                ]),
            )
            .await;

        match result {
            Ok(output) => {
                let parsed: CreateRepositoryOutput = parse(OP, &output)?;
                Ok(RegistryDescriptor {
                    name: name.to_owned(),
                    uri: Some(parsed.repository.repository_uri),
                    created: true,
                })
            }
            Err(e) if e.reason() == Some(FailureReason::AlreadyExists) => {
                tracing::debug!(name, "repository already exists");
                Ok(RegistryDescriptor {
                    name: name.to_owned(),
                    uri: None,
                    created: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Log the container engine into the registry with a short-lived password.
    pub async fn login_registry(
        &self,
        creds: &CredentialContext,
        registry: &RegistryPath,
    ) -> Result<(), AwsError> {
        const OP: &str = "aws ecr get-login-password";
        require(OP, "account id", &registry.account_id)?;

        let password = self
            .aws(
                OP,
                creds,
                &args(["ecr", "get-login-password", "--region", &registry.region]),
            )
            .await?;

        self.executor
            .exec_with_stdin(
                DOCKER,
                &args([
                    "login",
                    "--username",
                    "AWS",
                    "--password-stdin",
                    &registry.host(),
                ]),
                &[],
                password.trim().as_bytes(),
            )
            .await
            .map_err(|e| AwsError::call("docker login", e))?;
        Ok(())
    }

    /// Push `{registry}/{name}:{tag}`; the image must already be tagged for the registry.
    pub async fn publish_image(
        &self,
        creds: &CredentialContext,
        name: &str,
        registry: &RegistryPath,
        tag: &str,
    ) -> Result<(), AwsError> {
        const OP: &str = "docker push";
        require(OP, "image name", name)?;
        require(OP, "account id", &registry.account_id)?;

        self.executor
            .exec_streaming(
                DOCKER,
                &args(["push", &registry.image(name, tag)]),
                &creds.env(),
            )
            .await
            .map_err(|e| AwsError::call(OP, e))
    }

    /// Remove untagged images left behind by previous pushes.
    ///
    /// Returns the number of images submitted for deletion.
    pub async fn delete_untagged_images(
        &self,
        creds: &CredentialContext,
        name: &str,
    ) -> Result<usize, AwsError> {
        const LIST_OP: &str = "aws ecr list-images";
        const DELETE_OP: &str = "aws ecr batch-delete-image";
        require(LIST_OP, "repository name", name)?;

        let output = self
            .aws(
                LIST_OP,
                creds,
                &args([
                    "ecr",
                    "list-images",
                    "--repository-name",
                    name,
                    "--filter",
                    "tagStatus=UNTAGGED",
                    "--query",
                    "imageIds[*]",
                    "--output",
                    "json",
                ]),
            )
            .await?;
        let images: Vec<serde_json::Value> = parse(LIST_OP, &output)?;

        if images.is_empty() {
            tracing::debug!(name, "no untagged images");
            return Ok(0);
        }

        for batch in images.chunks(IMAGE_DELETE_BATCH) {
            let ids = serde_json::to_string(batch).map_err(|e| AwsError::Parse {
                operation: DELETE_OP,
                source: e,
            })?;
            self.aws(
                DELETE_OP,
                creds,
                &args([
                    "ecr",
                    "batch-delete-image",
                    "--repository-name",
                    name,
                    "--image-ids",
                    &ids,
                ]),
            )
            .await?;
        }
        Ok(images.len())
    }

    pub async fn delete_image_by_tag(
        &self,
        creds: &CredentialContext,
        name: &str,
        tag: &str,
    ) -> Result<(), AwsError> {
        const OP: &str = "aws ecr batch-delete-image";
        require(OP, "repository name", name)?;
        require(OP, "image tag", tag)?;

        self.aws(
            OP,
            creds,
            &args([
                "ecr",
                "batch-delete-image",
                "--repository-name",
                name,
                "--image-ids",
                &format!("imageTag={tag}"),
            ]),
        )
        .await?;
        Ok(())
    }

    /// Delete the repository and every image in it.
    pub async fn destroy_registry(
        &self,
        creds: &CredentialContext,
        name: &str,
    ) -> Result<(), AwsError> {
        const OP: &str = "aws ecr delete-repository";
        require(OP, "repository name", name)?;

        self.aws(
            OP,
            creds,
            &args([
                "ecr",
                "delete-repository",
                "--force",
                "--repository-name",
                name,
            ]),
        )
        .await?;
        Ok(())
    }

    // ── Stacks ──

    /// Submit stack creation under a freshly generated name.
    pub async fn create_stack(
        &self,
        creds: &CredentialContext,
        resource: &ResourceName,
        artifacts: &StackArtifacts,
    ) -> Result<StackIdentity, AwsError> {
        const OP: &str = "aws cloudformation create-stack";
        require(OP, "resource name", resource.as_str())?;

        let uri = |path: &std::path::Path| {
            file_uri(path).map_err(|e| AwsError::Artifact {
                operation: OP,
                source: e,
            })
        };
        let template = uri(artifacts.template.as_path())?;
        let parameters = uri(artifacts.parameters.as_path())?;
        let tags = uri(artifacts.tags.as_path())?;

        let stack = StackIdentity::generate(resource);
        self.aws(
            OP,
            creds,
            &args([
                "cloudformation",
                "create-stack",
                "--stack-name",
                stack.name(),
                "--template-body",
                &template,
                "--parameters",
                &parameters,
                "--tags",
                &tags,
                "--capabilities",
                "CAPABILITY_IAM",
                "--region",
                &creds.region,
            ]),
        )
        .await?;

        tracing::debug!(stack = %stack, "stack creation submitted");
        Ok(stack)
    }

    /// Stacks spectrum created, as display strings in provider order.
    ///
    /// Without a filter every deployment-tagged stack is listed, decorated by
    /// status. With a filter only live stacks whose project tag equals it are
    /// listed, by plain name.
    pub async fn list_stacks(
        &self,
        creds: &CredentialContext,
        filter: Option<&str>,
    ) -> Result<Vec<String>, AwsError> {
        const OP: &str = "aws cloudformation describe-stacks";

        let output = self
            .aws(
                OP,
                creds,
                &args([
                    "cloudformation",
                    "describe-stacks",
                    "--region",
                    &creds.region,
                    "--output",
                    "json",
                ]),
            )
            .await?;
        let parsed: DescribeStacksOutput = parse(OP, &output)?;

        Ok(match filter {
            Some(project) => parsed
                .stacks
                .iter()
                .filter(|s| s.tag(PROJECT_TAG) == Some(project) && s.status.is_live())
                .map(|s| s.name.clone())
                .collect(),
            None => parsed
                .stacks
                .iter()
                .filter(|s| s.tag(DEPLOYMENT_TAG).is_some())
                .filter_map(StackSummary::display)
                .collect(),
        })
    }

    /// Raw `describe-stacks` output for one stack.
    pub async fn describe_stack(
        &self,
        creds: &CredentialContext,
        name: &str,
    ) -> Result<String, AwsError> {
        const OP: &str = "aws cloudformation describe-stacks";
        require(OP, "stack name", name)?;

        self.aws(
            OP,
            creds,
            &args([
                "cloudformation",
                "describe-stacks",
                "--stack-name",
                name,
                "--region",
                &creds.region,
            ]),
        )
        .await
    }

    pub async fn destroy_stack(
        &self,
        creds: &CredentialContext,
        stack_name: &str,
    ) -> Result<(), AwsError> {
        const OP: &str = "aws cloudformation delete-stack";
        require(OP, "stack name", stack_name)?;

        self.aws(
            OP,
            creds,
            &args([
                "cloudformation",
                "delete-stack",
                "--stack-name",
                stack_name,
                "--region",
                &creds.region,
            ]),
        )
        .await?;
        Ok(())
    }

    // ── DNS ──

    /// First hosted zone of the account.
    pub async fn get_hosted_zone(&self, creds: &CredentialContext) -> Result<HostedZone, AwsError> {
        const OP: &str = "aws route53 list-hosted-zones";

        let output = self
            .aws(
                OP,
                creds,
                &args(["route53", "list-hosted-zones", "--output", "json"]),
            )
            .await?;
        let parsed: ListHostedZonesOutput = parse(OP, &output)?;
        let zone = parsed.hosted_zones.into_iter().next().ok_or(AwsError::Empty {
            operation: OP,
            what: "hosted zone",
        })?;

        // "/hostedzone/Z123" -> "Z123"
        let id = zone
            .id
            .rsplit('/')
            .next()
            .unwrap_or(zone.id.as_str())
            .to_owned();
        Ok(HostedZone {
            id,
            domain: zone.name,
        })
    }

    /// First load balancer of the account, as an alias target.
    pub async fn get_load_balancer(
        &self,
        creds: &CredentialContext,
    ) -> Result<AliasTarget, AwsError> {
        const OP: &str = "aws elbv2 describe-load-balancers";

        let output = self
            .aws(
                OP,
                creds,
                &args([
                    "elbv2",
                    "describe-load-balancers",
                    "--region",
                    &creds.region,
                    "--output",
                    "json",
                ]),
            )
            .await?;
        let parsed: DescribeLoadBalancersOutput = parse(OP, &output)?;
        let lb = parsed
            .load_balancers
            .into_iter()
            .next()
            .ok_or(AwsError::Empty {
                operation: OP,
                what: "load balancer",
            })?;

        Ok(AliasTarget {
            hosted_zone_id: lb.canonical_hosted_zone_id,
            dns_name: lb.dns_name,
        })
    }

    /// Apply a DNS alias change.
    ///
    /// Creating a record that already exists and deleting one that is
    /// already gone both count as success.
    pub async fn upsert_dns_record(
        &self,
        creds: &CredentialContext,
        intent: &DnsRecordIntent,
        scratch: &ScratchDir,
    ) -> Result<RecordChange, AwsError> {
        const OP: &str = "aws route53 change-resource-record-sets";

        if let Some(missing) = intent.missing_fields().first() {
            return Err(AwsError::MissingInput {
                operation: OP,
                what: *missing,
            });
        }

        let artifact = |e| AwsError::Artifact {
            operation: OP,
            source: e,
        };
        let path = scratch.write_dns_change(intent).map_err(artifact)?;
        let batch = file_uri(&path).map_err(artifact)?;

        let result = self
            .aws(
                OP,
                creds,
                &args([
                    "route53",
                    "change-resource-record-sets",
                    "--hosted-zone-id",
                    &intent.zone_id,
                    "--change-batch",
                    &batch,
                ]),
            )
            .await;

        match (intent.action, result) {
            (_, Ok(_)) => Ok(RecordChange::Applied),
            (DnsAction::Create, Err(e)) if e.reason() == Some(FailureReason::AlreadyExists) => {
                tracing::debug!(record = %intent.record_name, "record already exists");
                Ok(RecordChange::AlreadyInPlace)
            }
            (DnsAction::Delete, Err(e)) if e.reason() == Some(FailureReason::NotFound) => {
                tracing::debug!(record = %intent.record_name, "record already absent");
                Ok(RecordChange::AlreadyInPlace)
            }
            (_, Err(e)) => Err(e),
        }
    }
}

fn require(operation: &'static str, what: &'static str, value: &str) -> Result<(), AwsError> {
    if value.trim().is_empty() {
        Err(AwsError::MissingInput { operation, what })
    } else {
        Ok(())
    }
}

fn parse<T: serde::de::DeserializeOwned>(
    operation: &'static str,
    output: &str,
) -> Result<T, AwsError> {
    serde_json::from_str(output).map_err(|e| AwsError::Parse {
        operation,
        source: e,
    })
}

// ── Result types ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryDescriptor {
    pub name: String,
    /// Known only when this call created the repository
    pub uri: Option<String>,
    pub created: bool,
}

/// Outcome of an idempotent DNS change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChange {
    Applied,
    /// The record was already in the requested state.
    AlreadyInPlace,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum StackStatus {
    CreateComplete,
    CreateInProgress,
    DeleteInProgress,
    Other(String),
}

impl StackStatus {
    /// Created or being created.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::CreateComplete | Self::CreateInProgress)
    }
}

impl From<String> for StackStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "CREATE_COMPLETE" => Self::CreateComplete,
            "CREATE_IN_PROGRESS" => Self::CreateInProgress,
            "DELETE_IN_PROGRESS" => Self::DeleteInProgress,
            _ => Self::Other(status),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StackTag {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StackSummary {
    #[serde(rename = "StackName")]
    pub name: String,
    #[serde(rename = "StackStatus")]
    pub status: StackStatus,
    #[serde(rename = "Tags", default)]
    pub tags: Vec<StackTag>,
}

impl StackSummary {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    /// Listing line for this stack, `None` for statuses that are not shown.
    pub fn display(&self) -> Option<String> {
        match self.status {
            StackStatus::CreateComplete => Some(self.name.clone()),
            StackStatus::CreateInProgress => Some(format!("[ DEPLOYING ] {}", self.name)),
            StackStatus::DeleteInProgress => Some(format!("[ DELETING ] {}", self.name)),
            StackStatus::Other(_) => None,
        }
    }
}

// ── CLI output shapes ──

#[derive(Deserialize)]
struct DescribeStacksOutput {
    #[serde(rename = "Stacks", default)]
    stacks: Vec<StackSummary>,
}

#[derive(Deserialize)]
struct CreateRepositoryOutput {
    repository: Repository,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Repository {
    repository_uri: String,
}

#[derive(Deserialize)]
struct ListHostedZonesOutput {
    #[serde(rename = "HostedZones", default)]
    hosted_zones: Vec<HostedZoneEntry>,
}

#[derive(Deserialize)]
struct HostedZoneEntry {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Deserialize)]
struct DescribeLoadBalancersOutput {
    #[serde(rename = "LoadBalancers", default)]
    load_balancers: Vec<LoadBalancerEntry>,
}

#[derive(Deserialize)]
struct LoadBalancerEntry {
    #[serde(rename = "CanonicalHostedZoneId")]
    canonical_hosted_zone_id: String,
    #[serde(rename = "DNSName")]
    dns_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(name: &str, status: &str, tags: &[(&str, &str)]) -> StackSummary {
        StackSummary {
            name: name.to_owned(),
            status: StackStatus::from(status.to_owned()),
            tags: tags
                .iter()
                .map(|(k, v)| StackTag {
                    key: (*k).to_owned(),
                    value: (*v).to_owned(),
                })
                .collect(),
        }
    }

    #[test]
    fn display_decorates_by_status() {
        assert_eq!(
            summary("acme-1", "CREATE_COMPLETE", &[]).display().as_deref(),
            Some("acme-1")
        );
        assert_eq!(
            summary("acme-1", "CREATE_IN_PROGRESS", &[]).display().as_deref(),
            Some("[ DEPLOYING ] acme-1")
        );
        assert_eq!(
            summary("acme-1", "DELETE_IN_PROGRESS", &[]).display().as_deref(),
            Some("[ DELETING ] acme-1")
        );
        assert_eq!(summary("acme-1", "ROLLBACK_COMPLETE", &[]).display(), None);
    }

    #[test]
    fn tag_lookup() {
        let stack = summary("acme-1", "CREATE_COMPLETE", &[("mon:project", "acme")]);
        assert_eq!(stack.tag("mon:project"), Some("acme"));
        assert_eq!(stack.tag("spectrum:deployment"), None);
    }
}
