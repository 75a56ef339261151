use std::path::Path;

use spectrum_core::executor::args;
use spectrum_core::{CommandError, CommandExecutor, RealExecutor, RegistryPath};

const DOCKER: &str = "docker";

/// Repository prefix of locally built images.
pub const IMAGE_NAMESPACE: &str = "spectrum";

/// Local image reference: `spectrum/{name}:{tag}`.
pub fn local_image(name: &str, tag: &str) -> String {
    format!("{IMAGE_NAMESPACE}/{name}:{tag}")
}

/// Container engine client, parameterized over the executor for testability.
pub struct DockerClient<E: CommandExecutor = RealExecutor> {
    executor: E,
}

impl DockerClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for DockerClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> DockerClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Build `spectrum/{name}:{tag}` from `context`, streaming engine output.
    pub async fn build(&self, name: &str, tag: &str, context: &Path) -> Result<(), DockerError> {
        require("image name", name)?;
        require("image tag", tag)?;
        let context = context
            .to_str()
            .ok_or_else(|| DockerError::NonUtf8Context(context.to_path_buf()))?;

        self.executor
            .exec_streaming(
                DOCKER,
                &args(["build", "-t", &local_image(name, tag), context]),
                &[],
            )
            .await
            .map_err(|e| DockerError::Build {
                image: local_image(name, tag),
                source: e,
            })
    }

    /// Re-tag the local image for the registry path.
    pub async fn tag(
        &self,
        name: &str,
        registry: &RegistryPath,
        tag: &str,
    ) -> Result<String, DockerError> {
        require("image name", name)?;
        require("account id", &registry.account_id)?;

        let target = registry.image(name, tag);
        self.executor
            .exec(
                DOCKER,
                &args(["tag", &local_image(name, tag), &target]),
                &[],
            )
            .await
            .map_err(|e| DockerError::Tag {
                image: target.clone(),
                source: e,
            })?;
        Ok(target)
    }

    /// Remove dangling local images. Returns the engine's summary line.
    pub async fn prune_local_images(&self) -> Result<String, DockerError> {
        let output = self
            .executor
            .exec(DOCKER, &args(["image", "prune", "--force"]), &[])
            .await
            .map_err(DockerError::Prune)?;
        Ok(output
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or_default()
            .trim()
            .to_owned())
    }
}

fn require(what: &'static str, value: &str) -> Result<(), DockerError> {
    if value.trim().is_empty() {
        Err(DockerError::MissingInput(what))
    } else {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("{0} is required")]
    MissingInput(&'static str),

    #[error("build context is not valid UTF-8: {0}")]
    NonUtf8Context(std::path::PathBuf),

    #[error("docker build of {image} failed")]
    Build {
        image: String,
        source: CommandError,
    },

    #[error("docker tag {image} failed")]
    Tag {
        image: String,
        source: CommandError,
    },

    #[error("docker image prune failed")]
    Prune(#[source] CommandError),
}

impl DockerError {
    /// Required input was missing; the engine was never invoked.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingInput(_) | Self::NonUtf8Context(_))
    }
}
