mod apps;
mod deploy;
mod destroy;
mod init;

use std::path::Path;

use spectrum_build::DockerClient;
use spectrum_core::SpectrumConfig;
use spectrum_pipeline::{EnvSnapshot, Orchestrator};

pub use apps::{apps, describe};
pub use deploy::deploy;
pub use destroy::destroy;
pub use init::{InitArgs, init_project};

/// Orchestrator for the project in the current directory.
///
/// Fails before any external call when spectrum.config.json is missing or
/// incomplete.
fn load_orchestrator(env: EnvSnapshot) -> anyhow::Result<Orchestrator> {
    let project_dir = Path::new(".");
    let config = SpectrumConfig::load(project_dir)?.validate()?;
    Ok(Orchestrator::new(config, project_dir, env))
}

/// Best-effort `docker image prune`; failures are only logged.
pub async fn prune_docker_images() {
    match DockerClient::new().prune_local_images().await {
        Ok(summary) => println!("{summary}"),
        Err(e) => tracing::warn!(error = %e, "failed to prune local docker images"),
    }
}
