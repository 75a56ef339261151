//! AWS provider operations for spectrum.
//!
//! Every operation wraps one `aws` (or registry `docker`) invocation through
//! a [`spectrum_core::CommandExecutor`] and normalizes the result. Calls after
//! credential exchange take the run's [`CredentialContext`] explicitly.

pub mod client;
pub mod credentials;
pub mod error;

pub use client::{AwsClient, RecordChange, RegistryDescriptor, StackStatus, StackSummary};
pub use credentials::{BaseCredentials, CredentialContext};
pub use error::{AwsError, FailureReason};
