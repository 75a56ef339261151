//! Local container image and working-tree operations for spectrum.
//!
//! ```text
//! spectrum deploy-branch feature-x
//!   build ── docker build -t spectrum/acme:feature-x .
//!   tag   ── docker tag spectrum/acme:feature-x {registry}/acme:feature-x
//!   push  ── handled by spectrum-aws (registry credentials)
//! ```
//!
//! The branch of a branch-scoped deployment comes from [`git::current_branch`]
//! when none is given on the command line.

pub mod docker;
pub mod git;

pub use docker::{DockerClient, DockerError, IMAGE_NAMESPACE};
pub use git::{GitError, current_branch};
