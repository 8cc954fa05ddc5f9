//! Error and outcome types.
//!
//! Collaborator faults arrive as [`BridgeError`]; primitives never propagate them and instead
//! report an [`Outcome`] whose failure side carries a [`FailureKind`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fault reported by the capability bridge.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The action went through but its confirmation event never arrived.
    #[error("no confirmation received for the action")]
    NoConfirmation,

    #[error("action rejected: {0}")]
    Rejected(String),

    #[error("environment unavailable: {0}")]
    Unavailable(String),
}

impl BridgeError {
    /// Benign faults mean the world almost certainly changed as requested.
    pub fn is_benign(&self) -> bool {
        matches!(self, BridgeError::NoConfirmation)
    }
}

/// Why a primitive gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Item not held in inventory.
    MissingResource,
    /// No block to place against.
    UnsupportedTarget,
    /// The environment rejected the action (after any retries).
    TransientActionFailure,
    /// The optional pre-check found the insertion cell filled.
    Occupied,
    NavigationFailed,
    Cancelled,
}

/// Why a primitive deliberately did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Toggle target is not the expected block type.
    TypeMismatch,
    AlreadyEmpty,
    NotDiggable,
    /// The target cell is not loaded.
    Unresolved,
}

/// Result of one primitive invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Done,
    Skipped(SkipReason),
    Failed(FailureKind),
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Collapses a batch into one outcome: the first failure wins, then any completed action,
    /// otherwise the first skip. An empty batch counts as done.
    pub fn summarize(outcomes: &[Outcome]) -> Outcome {
        if let Some(failed) = outcomes.iter().find(|o| o.is_failed()) {
            return *failed;
        }
        if outcomes.is_empty() || outcomes.iter().any(Outcome::is_done) {
            return Outcome::Done;
        }
        outcomes[0]
    }
}

/// Errors raised while loading a [`crate::config::BuildConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised while loading a [`crate::blueprint::Blueprint`].
#[derive(Error, Debug)]
pub enum BlueprintError {
    #[error("failed to parse blueprint: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("blueprint `{name}` has {} issue(s): {}", .issues.len(), .issues.join("; "))]
    Invalid { name: String, issues: Vec<String> },
}
