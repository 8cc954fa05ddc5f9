//! The capability surface the construction core consumes.
//!
//! Everything that touches the live world goes through [`CapabilityBridge`]. Queries are
//! synchronous snapshots of the agent's current view; actions are asynchronous and report
//! faults as [`BridgeError`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;
use crate::geometry::{BlockPos, Vector3D};

/// A block as seen by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub position: BlockPos,
}

impl Block {
    pub fn new(name: impl Into<String>, position: BlockPos) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// One inventory slot's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub name: String,
    pub count: u32,
    pub slot: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Main,
    Off,
}

/// Movement keys the agent can hold down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Sprint,
    Sneak,
}

/// The agent, as seen from the construction core.
///
/// Implementations own motion, block access and inventory protocol details; the core only
/// decides what to do and how to react to the results.
#[async_trait]
pub trait CapabilityBridge: Send + Sync {
    /// Current feet position.
    fn position(&self) -> Vector3D;

    /// Current yaw in radians.
    fn heading(&self) -> f64;

    /// Block occupying `pos`, or `None` if the cell is not loaded.
    fn block_at(&self, pos: BlockPos) -> Option<Block>;

    /// First inventory stack with this name.
    fn find_inventory_item(&self, name: &str) -> Option<ItemStack>;

    /// Total count per item name.
    fn inventory_counts(&self) -> HashMap<String, u32>;

    fn can_dig(&self, block: &Block) -> bool;

    async fn equip(&self, item: &ItemStack, hand: Hand) -> Result<(), BridgeError>;

    /// Places the held item against `reference`, on the face pointed to by `direction`.
    async fn place_block(&self, reference: &Block, direction: Vector3D)
        -> Result<(), BridgeError>;

    async fn activate_block(&self, block: &Block) -> Result<(), BridgeError>;

    async fn activate_held_item(&self) -> Result<(), BridgeError>;

    /// Resolves once the new orientation has been acknowledged.
    async fn look_at(&self, target: Vector3D) -> Result<(), BridgeError>;

    async fn set_control_state(&self, control: Control, active: bool) -> Result<(), BridgeError>;

    async fn dig(&self, block: &Block) -> Result<(), BridgeError>;

    /// Sends a chat command. Only used to request items.
    async fn send_command(&self, text: &str) -> Result<(), BridgeError>;

    async fn navigate_to(&self, target: Vector3D, tolerance: f64) -> Result<(), BridgeError>;

    /// Cooperative delay. Harnesses override this to make runs instant.
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
