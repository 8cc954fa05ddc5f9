//! PAGI construction core.
//!
//! Turns local machine blueprints into world actions for an embodied agent. This crate
//! defines:
//! - [`CapabilityBridge`]: the async contract the agent implements (block lookup, equip,
//!   place, dig, activate, look, navigate, commands).
//! - [`OriginFrame`] and [`Offset`]: the `(right, up, forward)` coordinate system blueprints
//!   are written in.
//! - [`ConstructionSession`]: the per-run context, with the action primitives as methods.
//! - [`Blueprint`] and [`BlueprintRunner`]: declarative machines and their sequential,
//!   best-effort execution.
//! - [`InventoryProvisioner`]: requests whatever a blueprint is missing before it runs.
//!
//! Primitives never return errors. Each reports an [`Outcome`] and logs its decisions through
//! `tracing`, so a run always reaches its final step.

pub mod blueprint;
pub mod bridge;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod machines;
pub mod primitives;
pub mod provision;
pub mod runner;
pub mod session;
pub mod testing;

pub use blueprint::{Blueprint, DigDirective, Directive, PlacementDirective, StepDiff};
pub use bridge::{Block, CapabilityBridge, Control, Hand, ItemStack};
pub use config::BuildConfig;
pub use error::{BlueprintError, BridgeError, ConfigError, FailureKind, Outcome, SkipReason};
pub use frame::OriginFrame;
pub use geometry::{BlockPos, Facing, Offset, Vector3D};
pub use provision::{InventoryProvisioner, ProvisionReport, RequiredItems};
pub use runner::{BlueprintRunner, RunReport, StepRecord};
pub use session::ConstructionSession;

// Re-exported so callers can build cancellation signals without a direct `tokio-util`
// dependency.
pub use tokio_util::sync::CancellationToken;
