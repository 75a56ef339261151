use std::fmt;

use spectrum_core::CommandError;

/// Why a provider call failed, classified once from the CLI's error output.
///
/// Callers decide idempotency by matching on this, never on provider text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The resource is already in the requested state (create of an existing resource).
    AlreadyExists,
    /// The resource does not exist.
    NotFound,
    /// Credentials were rejected or lack permission.
    AccessDenied,
    Other,
}

impl FailureReason {
    /// Classify `aws` CLI stderr.
    ///
    /// The CLI reports service errors as
    /// `An error occurred (<Code>) when calling the <Op> operation: <message>`.
    /// The code decides the reason; the message is only consulted for codes
    /// that cover several outcomes (Route53 `InvalidChangeBatch`,
    /// CloudFormation `ValidationError`).
    pub fn classify(stderr: &str) -> Self {
        let Some(code) = error_code(stderr) else {
            return Self::Other;
        };
        let message = stderr.to_ascii_lowercase();

        match code {
            "InvalidChangeBatch" | "ValidationError" => {
                if message.contains("already exists") {
                    Self::AlreadyExists
                } else if message.contains("not found") || message.contains("does not exist") {
                    Self::NotFound
                } else {
                    Self::Other
                }
            }
            "AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation"
            | "ExpiredToken" | "InvalidClientTokenId" | "SignatureDoesNotMatch" => {
                Self::AccessDenied
            }
            c if c.ends_with("AlreadyExistsException") || c.ends_with("AlreadyExists") => {
                Self::AlreadyExists
            }
            c if c.ends_with("NotFoundException")
                || c.ends_with("NotFound")
                || c.starts_with("NoSuch") =>
            {
                Self::NotFound
            }
            _ => Self::Other,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlreadyExists => "already exists",
            Self::NotFound => "not found",
            Self::AccessDenied => "access denied",
            Self::Other => "provider error",
        })
    }
}

fn error_code(stderr: &str) -> Option<&str> {
    let start = stderr.find("An error occurred (")? + "An error occurred (".len();
    let len = stderr[start..].find(')')?;
    Some(&stderr[start..start + len])
}

#[derive(Debug, thiserror::Error)]
pub enum AwsError {
    #[error("{what} is required for {operation}")]
    MissingInput {
        operation: &'static str,
        what: &'static str,
    },

    #[error(
        "AWS credentials required in environment — set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY"
    )]
    MissingBaseCredentials,

    #[error("{operation} failed ({reason})")]
    Call {
        operation: &'static str,
        reason: FailureReason,
        source: CommandError,
    },

    #[error("unexpected output from {operation}")]
    Parse {
        operation: &'static str,
        source: serde_json::Error,
    },

    #[error("{operation} returned no {what}")]
    Empty {
        operation: &'static str,
        what: &'static str,
    },

    #[error("failed to prepare input for {operation}")]
    Artifact {
        operation: &'static str,
        source: spectrum_core::Error,
    },
}

impl AwsError {
    pub(crate) fn call(operation: &'static str, source: CommandError) -> Self {
        let reason = source
            .stderr()
            .map_or(FailureReason::Other, FailureReason::classify);
        Self::Call {
            operation,
            reason,
            source,
        }
    }

    /// Failure reason for provider call errors.
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Call { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Required input or credential was missing; nothing was sent to the provider.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. } | Self::MissingBaseCredentials | Self::Artifact { .. }
        )
    }
}
