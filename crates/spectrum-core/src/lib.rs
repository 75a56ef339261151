//! Core types and configuration for spectrum.
//!
//! This crate defines the `spectrum.config.json` schema ([`SpectrumConfig`]),
//! resource naming ([`ResourceName`], [`StackIdentity`]), the rendered
//! deployment artifacts written to `.spectrum/`, and the [`CommandExecutor`]
//! seam every external tool invocation goes through.

pub mod artifacts;
pub mod config;
pub mod dns;
pub mod error;
pub mod executor;
pub mod naming;

pub use artifacts::{ScratchDir, StackArtifacts, StackInputs};
pub use config::{DeploymentConfig, SpectrumConfig};
pub use dns::{AliasTarget, DnsAction, DnsRecordIntent, HostedZone};
pub use error::{Error, Result};
pub use executor::{CommandError, CommandExecutor, RealExecutor};
pub use naming::{DeployScope, RegistryPath, ResourceName, StackIdentity};
