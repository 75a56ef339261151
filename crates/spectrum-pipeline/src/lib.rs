//! Deploy and destroy pipelines for spectrum.
//!
//! # Deploy
//!
//! ```text
//! spectrum deploy-app | deploy-branch [branch]
//!   0. Options     ── environment group + base credentials (CI: from env only)
//!   0. Branch      ── argument, else `git branch`, else master (branch scope)
//!   1. Role        ── sts assume-role → CredentialContext
//!   2. Build       ── docker build spectrum/{project}:{tag}
//!   3. Registry    ── ecr create-repository (exists = ok)
//!   4. Tag         ── docker tag → {registry}/{project}:{tag}
//!   5. Publish     ── ecr login + docker push
//!   6. Cleanup     ── untagged images (warning on failure)
//!   7. Stack       ── render .spectrum/ files, cloudformation create-stack
//!   8. DNS         ── hosted zone + load balancer → CREATE alias {resource}.{zone}
//! ```
//!
//! # Destroy
//!
//! ```text
//! spectrum destroy-app | destroy-branch [branch]
//!   1. Role        ── sts assume-role
//!   2. Stack       ── find by project tag, delete-stack (warning on failure)
//!   3. Registry    ── delete repository (primary) or branch image tag (branch)
//!   4. DNS         ── DELETE alias (missing record = ok)
//! ```
//!
//! Every step runs to completion before the next starts. A fatal failure is
//! reported through the [`StepTracker`] and ends the pipeline; nothing is
//! rolled back.

pub mod error;
pub mod inspect;
pub mod options;
pub mod orchestrator;
pub mod tracker;

pub use error::{ErrorKind, PipelineError};
pub use options::{EnvSnapshot, OptionInputs, OptionsError, ResolvedOptions};
pub use orchestrator::{DeployOutcome, Orchestrator, Target, TeardownOutcome};
pub use tracker::{StepEvent, StepReporter, StepTracker, TerminalReporter, TrackerState};
