//! Deterministic in-memory world for exercising primitives and blueprints.
//!
//! [`MockWorld`] implements [`CapabilityBridge`] over a block map and a slot-ordered
//! inventory. Every action is appended to a call journal so tests can assert on the exact
//! sequence a run produced. `sleep` records the request and returns immediately, so runs are
//! independent of wall-clock time.
//!
//! ```
//! use std::sync::Arc;
//! use pagi_construct_lib::testing::MockWorld;
//! use pagi_construct_lib::geometry::{BlockPos, Offset, Vector3D};
//! use pagi_construct_lib::{BuildConfig, ConstructionSession, Outcome};
//!
//! # tokio_test_block(async {
//! let world = Arc::new(MockWorld::new().with_item("dirt", 1));
//! world.set_block(BlockPos::new(0, -1, -1), "stone");
//! let mut session = ConstructionSession::new(Arc::clone(&world), BuildConfig::default());
//!
//! let outcome = session
//!     .place_at("dirt", Offset::from((0, -1, 1)), Vector3D::up(), None)
//!     .await;
//! assert_eq!(outcome, Outcome::Done);
//! assert_eq!(world.block_name(BlockPos::new(0, 0, -1)).as_deref(), Some("dirt"));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::bridge::{Block, CapabilityBridge, Control, Hand, ItemStack};
use crate::config::AIR;
use crate::error::BridgeError;
use crate::geometry::{BlockPos, Vector3D};

/// Stack size handed out when the world has unlimited inventory.
const UNLIMITED_STACK: u32 = 64;

/// One recorded bridge action.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Equip { item: String, hand: Hand },
    LookAt(Vector3D),
    Place { item: String, reference: BlockPos, direction: Vector3D },
    ActivateBlock(BlockPos),
    ActivateItem,
    Control(Control, bool),
    Dig(BlockPos),
    Command(String),
    Navigate(Vector3D),
    Sleep(Duration),
}

#[derive(Debug, Default)]
struct MockState {
    position: Vector3D,
    heading: f64,
    blocks: BTreeMap<BlockPos, String>,
    unloaded: HashSet<BlockPos>,
    undiggable: HashSet<String>,
    inventory: Vec<(String, u32)>,
    unlimited: bool,
    held: HashMap<Hand, String>,
    last_look: Option<Vector3D>,
    place_script: VecDeque<Result<(), BridgeError>>,
    dig_script: VecDeque<Result<(), BridgeError>>,
    activation_failure: Option<BridgeError>,
    rejected_commands: Vec<String>,
    calls: Vec<Call>,
}

impl MockState {
    fn name_at(&self, pos: BlockPos) -> String {
        self.blocks.get(&pos).cloned().unwrap_or_else(|| AIR.to_string())
    }

    fn count_of(&self, item: &str) -> u32 {
        self.inventory
            .iter()
            .filter(|(name, _)| name == item)
            .map(|(_, count)| *count)
            .sum()
    }

    fn give(&mut self, item: &str, count: u32) {
        if let Some(slot) = self.inventory.iter_mut().find(|(name, _)| name == item) {
            slot.1 += count;
        } else {
            self.inventory.push((item.to_string(), count));
        }
    }

    /// Removes one of `item`; clears every hand holding it once the last one is gone.
    fn consume(&mut self, item: &str) {
        if self.unlimited {
            return;
        }
        if let Some(index) = self.inventory.iter().position(|(name, _)| name == item) {
            self.inventory[index].1 -= 1;
            if self.inventory[index].1 == 0 {
                self.inventory.remove(index);
                self.held.retain(|_, held| held.as_str() != item);
            }
        }
    }

    fn apply_give_command(&mut self, text: &str) {
        let parts: Vec<&str> = text.split_whitespace().collect();
        if let ["/give", _target, item, count] = parts.as_slice() {
            if let Ok(count) = count.parse::<u32>() {
                self.give(item, count);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MockWorld {
    state: Mutex<MockState>,
}

impl MockWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places the agent at `position`.
    pub fn at(self, position: Vector3D) -> Self {
        self.state().position = position;
        self
    }

    pub fn with_item(self, item: &str, count: u32) -> Self {
        self.state().give(item, count);
        self
    }

    /// Any item can be equipped and nothing is consumed.
    pub fn unlimited(self) -> Self {
        self.state().unlimited = true;
        self
    }

    pub fn teleport(&self, position: Vector3D) {
        self.state().position = position;
    }

    pub fn set_heading(&self, heading: f64) {
        self.state().heading = heading;
    }

    pub fn set_block(&self, pos: BlockPos, name: &str) {
        let mut state = self.state();
        state.unloaded.remove(&pos);
        if name == AIR {
            state.blocks.remove(&pos);
        } else {
            state.blocks.insert(pos, name.to_string());
        }
    }

    /// Makes `pos` report no block at all.
    pub fn unload(&self, pos: BlockPos) {
        self.state().unloaded.insert(pos);
    }

    pub fn set_undiggable(&self, name: &str) {
        self.state().undiggable.insert(name.to_string());
    }

    /// Results returned by successive `place_block` calls; once drained, placements succeed.
    pub fn script_place_results(
        &self,
        results: impl IntoIterator<Item = Result<(), BridgeError>>,
    ) {
        self.state().place_script.extend(results);
    }

    pub fn script_dig_results(&self, results: impl IntoIterator<Item = Result<(), BridgeError>>) {
        self.state().dig_script.extend(results);
    }

    /// Every block and item activation fails with `err` from now on.
    pub fn fail_activations(&self, err: BridgeError) {
        self.state().activation_failure = Some(err);
    }

    /// Commands containing `fragment` are rejected from now on.
    pub fn reject_commands_containing(&self, fragment: &str) {
        self.state().rejected_commands.push(fragment.to_string());
    }

    pub fn block_name(&self, pos: BlockPos) -> Option<String> {
        let state = self.state();
        (!state.unloaded.contains(&pos)).then(|| state.name_at(pos))
    }

    /// Snapshot of every non-air block.
    pub fn blocks(&self) -> BTreeMap<BlockPos, String> {
        self.state().blocks.clone()
    }

    pub fn held(&self, hand: Hand) -> Option<String> {
        self.state().held.get(&hand).cloned()
    }

    pub fn item_count(&self, item: &str) -> u32 {
        self.state().count_of(item)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|c| predicate(c)).count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock world state poisoned")
    }
}

#[async_trait]
impl CapabilityBridge for MockWorld {
    fn position(&self) -> Vector3D {
        self.state().position
    }

    fn heading(&self) -> f64 {
        self.state().heading
    }

    fn block_at(&self, pos: BlockPos) -> Option<Block> {
        let state = self.state();
        if state.unloaded.contains(&pos) {
            return None;
        }
        Some(Block::new(state.name_at(pos), pos))
    }

    fn find_inventory_item(&self, name: &str) -> Option<ItemStack> {
        let state = self.state();
        if let Some(slot) = state.inventory.iter().position(|(item, _)| item == name) {
            return Some(ItemStack {
                name: name.to_string(),
                count: state.inventory[slot].1,
                slot,
            });
        }
        state.unlimited.then(|| ItemStack {
            name: name.to_string(),
            count: UNLIMITED_STACK,
            slot: 0,
        })
    }

    fn inventory_counts(&self) -> HashMap<String, u32> {
        let state = self.state();
        let mut counts = HashMap::new();
        for (name, count) in &state.inventory {
            *counts.entry(name.clone()).or_insert(0) += count;
        }
        counts
    }

    fn can_dig(&self, block: &Block) -> bool {
        !self.state().undiggable.contains(&block.name)
    }

    async fn equip(&self, item: &ItemStack, hand: Hand) -> Result<(), BridgeError> {
        let mut state = self.state();
        state.calls.push(Call::Equip {
            item: item.name.clone(),
            hand,
        });
        if !state.unlimited && state.count_of(&item.name) == 0 {
            return Err(BridgeError::Rejected(format!("{} not in inventory", item.name)));
        }
        state.held.insert(hand, item.name.clone());
        Ok(())
    }

    async fn place_block(&self, reference: &Block, direction: Vector3D) -> Result<(), BridgeError> {
        let mut state = self.state();
        let item = state.held.get(&Hand::Main).cloned().unwrap_or_default();
        state.calls.push(Call::Place {
            item: item.clone(),
            reference: reference.position,
            direction,
        });

        let scripted = state.place_script.pop_front().unwrap_or(Ok(()));
        if let Err(err) = &scripted {
            if !err.is_benign() {
                return scripted;
            }
        }
        if item.is_empty() {
            return Err(BridgeError::Rejected("nothing in hand".to_string()));
        }
        if state.name_at(reference.position) == AIR {
            return Err(BridgeError::Rejected("cannot place against air".to_string()));
        }

        let target = reference.position.step(direction);
        state.blocks.insert(target, item.clone());
        state.consume(&item);
        scripted
    }

    async fn activate_block(&self, block: &Block) -> Result<(), BridgeError> {
        let mut state = self.state();
        state.calls.push(Call::ActivateBlock(block.position));
        match &state.activation_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn activate_held_item(&self) -> Result<(), BridgeError> {
        let mut state = self.state();
        state.calls.push(Call::ActivateItem);
        if let Some(err) = &state.activation_failure {
            return Err(err.clone());
        }
        let held = state.held.get(&Hand::Main).cloned();
        if let (Some("water_bucket"), Some(target)) = (held.as_deref(), state.last_look) {
            let cell = target.floored();
            if state.name_at(cell) == AIR {
                state.blocks.insert(cell, "water".to_string());
            }
            state.consume("water_bucket");
            if !state.unlimited {
                state.give("bucket", 1);
            }
        }
        Ok(())
    }

    async fn look_at(&self, target: Vector3D) -> Result<(), BridgeError> {
        let mut state = self.state();
        state.calls.push(Call::LookAt(target));
        state.last_look = Some(target);
        Ok(())
    }

    async fn set_control_state(&self, control: Control, active: bool) -> Result<(), BridgeError> {
        self.state().calls.push(Call::Control(control, active));
        Ok(())
    }

    async fn dig(&self, block: &Block) -> Result<(), BridgeError> {
        let mut state = self.state();
        state.calls.push(Call::Dig(block.position));
        let scripted = state.dig_script.pop_front().unwrap_or(Ok(()));
        if let Err(err) = &scripted {
            if !err.is_benign() {
                return scripted;
            }
        }
        state.blocks.remove(&block.position);
        scripted
    }

    async fn send_command(&self, text: &str) -> Result<(), BridgeError> {
        let mut state = self.state();
        state.calls.push(Call::Command(text.to_string()));
        if state.rejected_commands.iter().any(|f| text.contains(f.as_str())) {
            return Err(BridgeError::Rejected(format!("command refused: {text}")));
        }
        state.apply_give_command(text);
        Ok(())
    }

    async fn navigate_to(&self, target: Vector3D, _tolerance: f64) -> Result<(), BridgeError> {
        let mut state = self.state();
        state.calls.push(Call::Navigate(target));
        state.position = target;
        Ok(())
    }

    async fn sleep(&self, duration: Duration) {
        self.state().calls.push(Call::Sleep(duration));
    }
}
