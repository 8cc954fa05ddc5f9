//! Origin frame: the reference point blueprints are laid out against.

use serde::{Deserialize, Serialize};

use crate::bridge::CapabilityBridge;
use crate::geometry::{Offset, Vector3D};

/// Snapshot of the agent's position and heading at the start of a build.
///
/// `forward` offsets run toward negative world `z` and `right` offsets toward positive world
/// `x`, whatever the captured heading. The heading is kept for diagnostics and for callers
/// that want to re-orient before a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OriginFrame {
    pub position: Vector3D,
    pub heading: f64,
}

impl OriginFrame {
    pub fn new(position: Vector3D, heading: f64) -> Self {
        Self { position, heading }
    }

    /// Reads the agent's current pose.
    pub fn capture<B: CapabilityBridge + ?Sized>(bridge: &B) -> Self {
        Self::new(bridge.position(), bridge.heading())
    }

    /// Absolute world coordinate for `offset`.
    pub fn resolve(&self, offset: Offset) -> Vector3D {
        Vector3D::new(
            self.position.x() + offset.right,
            self.position.y() + offset.up,
            self.position.z() - offset.forward,
        )
    }
}
