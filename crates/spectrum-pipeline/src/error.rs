use spectrum_aws::AwsError;
use spectrum_build::{DockerError, GitError};

use crate::options::OptionsError;

/// Broad failure class of a pipeline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing input, configuration or credential; nothing external was attempted.
    Precondition,
    /// An external provider call failed.
    ProviderCall,
    /// Container build or tag failed.
    Build,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Artifacts(#[from] spectrum_core::Error),

    #[error(transparent)]
    Aws(#[from] AwsError),

    #[error(transparent)]
    Docker(#[from] DockerError),

    #[error(transparent)]
    Git(#[from] GitError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingArgument(_) | Self::Options(_) | Self::Artifacts(_) => {
                ErrorKind::Precondition
            }
            Self::Aws(e) if e.is_precondition() => ErrorKind::Precondition,
            Self::Aws(_) | Self::Git(_) => ErrorKind::ProviderCall,
            Self::Docker(e) if e.is_precondition() => ErrorKind::Precondition,
            Self::Docker(_) => ErrorKind::Build,
        }
    }
}
