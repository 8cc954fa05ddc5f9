//! Action primitives.
//!
//! Each primitive resolves its coordinates through the session's origin frame, acts through
//! the bridge and reports an [`Outcome`]. Faults never escape: every decision is logged and
//! folded into the returned outcome so a blueprint run always reaches its last step.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::bridge::{CapabilityBridge, Control, Hand};
use crate::error::{FailureKind, Outcome, SkipReason};
use crate::geometry::{Facing, Offset, Vector3D};
use crate::session::ConstructionSession;

impl<B: CapabilityBridge + ?Sized> ConstructionSession<B> {
    /// Equips the first inventory stack named `item`.
    pub async fn equip(&self, item: &str, hand: Hand) -> Outcome {
        let Some(stack) = self.bridge.find_inventory_item(item) else {
            warn!(item, "cannot equip: not in inventory");
            return Outcome::Failed(FailureKind::MissingResource);
        };

        match self.bridge.equip(&stack, hand).await {
            Ok(()) => {
                debug!(item, ?hand, slot = stack.slot, "equipped");
                Outcome::Done
            }
            Err(err) => {
                warn!(item, ?hand, "equip failed: {err}");
                Outcome::Failed(FailureKind::TransientActionFailure)
            }
        }
    }

    /// Places `item` against the block at `offset`, on the face pointed to by `direction`.
    ///
    /// With `facing`, the agent first looks one unit that way from eye height so orientable
    /// blocks (stairs, pistons, levers) come out pointing the right way.
    pub async fn place_at(
        &mut self,
        item: &str,
        offset: Offset,
        direction: Vector3D,
        facing: Option<Facing>,
    ) -> Outcome {
        let (abs, reference) = self.block_at_offset(offset);
        let Some(reference) = reference else {
            error!(
                item,
                %offset,
                cell = %abs.floored(),
                "no block to place against; the support is missing or the chunk is not loaded"
            );
            return Outcome::Failed(FailureKind::UnsupportedTarget);
        };

        if self.config.check_target_empty {
            let insertion = reference.position.step(direction);
            if let Some(occupant) = self.bridge.block_at(insertion) {
                if !self.is_air(&occupant) {
                    warn!(
                        item,
                        cell = %insertion,
                        occupant = %occupant.name,
                        "insertion cell occupied; not placing"
                    );
                    return Outcome::Failed(FailureKind::Occupied);
                }
            }
        }

        let equipped = self.equip(item, Hand::Main).await;
        if !equipped.is_done() {
            warn!(item, %offset, "placement abandoned: could not equip");
            return equipped;
        }

        if let Some(facing) = facing {
            let eye = self
                .bridge
                .position()
                .translate(Vector3D::new(0.0, self.config.eye_height, 0.0));
            let look_target = eye.translate(facing.unit());
            if let Err(err) = self.look_and_settle(look_target).await {
                warn!(item, ?facing, "could not face direction, placing anyway: {err}");
            }
        }

        let attempts = self.config.place_attempts.max(1);
        for attempt in 1..=attempts {
            match self.bridge.place_block(&reference, direction).await {
                Ok(()) => {
                    info!(item, %offset, against = %reference.position, attempt, "placed");
                    return Outcome::Done;
                }
                Err(err) if err.is_benign() => {
                    info!(item, %offset, attempt, "placed (confirmation lost)");
                    return Outcome::Done;
                }
                Err(err) => {
                    warn!(item, %offset, attempt, attempts, "placement failed: {err}");
                }
            }
        }

        error!(item, %offset, attempts, "giving up on placement");
        Outcome::Failed(FailureKind::TransientActionFailure)
    }

    /// Empties the configured liquid container toward the point at `offset`.
    pub async fn pour_liquid(&mut self, offset: Offset) -> Outcome {
        let target = self.resolve(offset);
        let liquid = self.config.liquid_item.clone();

        let equipped = self.equip(&liquid, Hand::Main).await;
        if !equipped.is_done() {
            warn!(item = %liquid, %offset, "pour abandoned: could not equip");
            return equipped;
        }

        if let Err(err) = self.look_and_settle(target).await {
            warn!(%offset, "pour failed, could not aim: {err}");
            return Outcome::Failed(FailureKind::TransientActionFailure);
        }

        if let Err(err) = self.bridge.activate_held_item().await {
            if !err.is_benign() {
                warn!(%offset, "pour failed: {err}");
                return Outcome::Failed(FailureKind::TransientActionFailure);
            }
        }

        self.bridge.sleep(self.config.pour_settle()).await;
        info!(item = %liquid, %offset, point = %target, "poured");
        Outcome::Done
    }

    /// Activates the block at `offset` if it is exactly `expected`.
    pub async fn toggle_block(&mut self, expected: &str, offset: Offset) -> Outcome {
        let (abs, block) = self.block_at_offset(offset);
        let Some(block) = block else {
            warn!(expected, %offset, cell = %abs.floored(), "toggle skipped: cell not loaded");
            return Outcome::Skipped(SkipReason::Unresolved);
        };

        if block.name != expected {
            info!(expected, found = %block.name, %offset, "toggle skipped: type mismatch");
            return Outcome::Skipped(SkipReason::TypeMismatch);
        }

        match self.bridge.activate_block(&block).await {
            Ok(()) => {
                info!(block = %block.name, %offset, "toggled");
                Outcome::Done
            }
            Err(err) if err.is_benign() => {
                info!(block = %block.name, %offset, "toggled (confirmation lost)");
                Outcome::Done
            }
            Err(err) => {
                warn!(block = %block.name, %offset, "toggle failed: {err}");
                Outcome::Failed(FailureKind::TransientActionFailure)
            }
        }
    }

    /// Digs every cell in `offsets`, one at a time, reporting an outcome per cell.
    pub async fn dig_list(&mut self, offsets: &[Offset]) -> Vec<Outcome> {
        self.ensure_origin();
        let mut outcomes = Vec::with_capacity(offsets.len());

        for &offset in offsets {
            let (abs, block) = self.block_at_offset(offset);
            let outcome = match block {
                None => {
                    warn!(%offset, cell = %abs.floored(), "dig skipped: cell not loaded");
                    Outcome::Skipped(SkipReason::Unresolved)
                }
                Some(block) if self.is_air(&block) => {
                    debug!(%offset, "dig skipped: already empty");
                    Outcome::Skipped(SkipReason::AlreadyEmpty)
                }
                Some(block) if !self.bridge.can_dig(&block) => {
                    warn!(%offset, block = %block.name, "dig skipped: not diggable");
                    Outcome::Skipped(SkipReason::NotDiggable)
                }
                Some(block) => match self.bridge.dig(&block).await {
                    Ok(()) => {
                        info!(%offset, block = %block.name, "dug");
                        Outcome::Done
                    }
                    Err(err) if err.is_benign() => {
                        info!(%offset, block = %block.name, "dug (confirmation lost)");
                        Outcome::Done
                    }
                    Err(err) => {
                        warn!(%offset, block = %block.name, "dig failed: {err}");
                        Outcome::Failed(FailureKind::TransientActionFailure)
                    }
                },
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Hands motion to the bridge's navigator, targeting the point at `offset`.
    pub async fn walk_to(&mut self, offset: Offset) -> Outcome {
        let target = self.resolve(offset);
        let tolerance = self.config.navigate_tolerance;
        match self.bridge.navigate_to(target, tolerance).await {
            Ok(()) => {
                info!(%offset, point = %target, "arrived");
                Outcome::Done
            }
            Err(err) => {
                warn!(%offset, point = %target, "navigation failed: {err}");
                Outcome::Failed(FailureKind::NavigationFailed)
            }
        }
    }

    /// Holds the jump control for `duration`, checking for cancellation every tick.
    ///
    /// Elapsed time is counted in ticks slept, not wall-clock time.
    pub async fn jump_for(&self, duration: Duration) -> Outcome {
        if let Err(err) = self.bridge.set_control_state(Control::Jump, true).await {
            warn!("could not start jumping: {err}");
            return Outcome::Failed(FailureKind::TransientActionFailure);
        }

        let tick = self.config.tick();
        let mut elapsed = Duration::ZERO;
        let mut cancelled = false;
        while elapsed < duration {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }
            self.bridge.sleep(tick).await;
            elapsed += tick;
        }

        if let Err(err) = self.bridge.set_control_state(Control::Jump, false).await {
            warn!("could not release jump: {err}");
        }

        if cancelled {
            info!(?elapsed, "jumping interrupted");
            Outcome::Failed(FailureKind::Cancelled)
        } else {
            debug!(?elapsed, "jumping finished");
            Outcome::Done
        }
    }

    pub async fn wait(&self, duration: Duration) -> Outcome {
        self.bridge.sleep(duration).await;
        Outcome::Done
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::BuildConfig;
    use crate::error::BridgeError;
    use crate::geometry::BlockPos;
    use crate::testing::{Call, MockWorld};

    fn origin() -> Vector3D {
        Vector3D::new(0.5, 64.0, 0.5)
    }

    /// Flat stone floor at y = 63 around the origin.
    fn flat_world() -> MockWorld {
        let world = MockWorld::new().at(origin());
        for x in -4..=4 {
            for z in -8..=4 {
                world.set_block(BlockPos::new(x, 63, z), "stone");
            }
        }
        world
    }

    fn session(world: &Arc<MockWorld>) -> ConstructionSession<MockWorld> {
        ConstructionSession::new(Arc::clone(world), BuildConfig::default())
    }

    #[tokio::test]
    async fn equip_missing_item_fails_without_calling_bridge() {
        let world = Arc::new(flat_world());
        let session = session(&world);

        let outcome = session.equip("torch", Hand::Main).await;

        assert_eq!(outcome, Outcome::Failed(FailureKind::MissingResource));
        assert!(world.calls().is_empty());
    }

    #[tokio::test]
    async fn equip_binds_item_to_hand() {
        let world = Arc::new(flat_world().with_item("torch", 4));
        let session = session(&world);

        assert_eq!(session.equip("torch", Hand::Off).await, Outcome::Done);
        assert_eq!(world.held(Hand::Off).as_deref(), Some("torch"));
        assert_eq!(world.held(Hand::Main), None);
    }

    #[tokio::test]
    async fn place_on_top_of_floor() {
        let world = Arc::new(flat_world().with_item("dirt", 8));
        let mut session = session(&world);

        let outcome = session
            .place_at("dirt", Offset::from((0, -1, 2)), Vector3D::up(), None)
            .await;

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(world.block_name(BlockPos::new(0, 64, -2)).as_deref(), Some("dirt"));
    }

    #[tokio::test]
    async fn place_twice_matches_place_once() {
        let once = Arc::new(flat_world().unlimited());
        let twice = Arc::new(flat_world().unlimited());
        let offset = Offset::from((1, -1, 1));

        session(&once)
            .place_at("cobblestone", offset, Vector3D::up(), None)
            .await;
        let mut s = session(&twice);
        s.place_at("cobblestone", offset, Vector3D::up(), None).await;
        s.place_at("cobblestone", offset, Vector3D::up(), None).await;

        assert_eq!(once.blocks(), twice.blocks());
    }

    #[tokio::test]
    async fn place_without_support_fails_immediately() {
        let world = Arc::new(flat_world().with_item("dirt", 1));
        world.unload(BlockPos::new(0, 63, -3));
        let mut session = session(&world);

        let outcome = session
            .place_at("dirt", Offset::from((0, -1, 3)), Vector3D::up(), None)
            .await;

        assert_eq!(outcome, Outcome::Failed(FailureKind::UnsupportedTarget));
        assert!(world.calls().is_empty());
    }

    #[tokio::test]
    async fn place_retries_three_times_then_fails() {
        let world = Arc::new(flat_world().with_item("dirt", 8));
        world.script_place_results([
            Err(BridgeError::Rejected("too far".into())),
            Err(BridgeError::Rejected("too far".into())),
            Err(BridgeError::Rejected("too far".into())),
            Ok(()),
        ]);
        let mut session = session(&world);

        let outcome = session
            .place_at("dirt", Offset::from((0, -1, 1)), Vector3D::up(), None)
            .await;

        assert_eq!(outcome, Outcome::Failed(FailureKind::TransientActionFailure));
        assert_eq!(world.count_calls(|c| matches!(c, Call::Place { .. })), 3);
    }

    #[tokio::test]
    async fn place_succeeds_on_a_later_attempt() {
        let world = Arc::new(flat_world().with_item("dirt", 8));
        world.script_place_results([Err(BridgeError::Rejected("busy".into())), Ok(())]);
        let mut session = session(&world);

        let outcome = session
            .place_at("dirt", Offset::from((0, -1, 1)), Vector3D::up(), None)
            .await;

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(world.count_calls(|c| matches!(c, Call::Place { .. })), 2);
    }

    #[tokio::test]
    async fn confirmation_loss_counts_as_success() {
        let world = Arc::new(flat_world().with_item("dirt", 8));
        world.script_place_results([
            Err(BridgeError::Rejected("busy".into())),
            Err(BridgeError::NoConfirmation),
        ]);
        let mut session = session(&world);

        let outcome = session
            .place_at("dirt", Offset::from((0, -1, 1)), Vector3D::up(), None)
            .await;

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(world.count_calls(|c| matches!(c, Call::Place { .. })), 2);
        assert_eq!(world.block_name(BlockPos::new(0, 64, -1)).as_deref(), Some("dirt"));
    }

    #[tokio::test]
    async fn place_with_missing_item_does_not_retry() {
        let world = Arc::new(flat_world());
        let mut session = session(&world);

        let outcome = session
            .place_at("dirt", Offset::from((0, -1, 1)), Vector3D::up(), None)
            .await;

        assert_eq!(outcome, Outcome::Failed(FailureKind::MissingResource));
        assert_eq!(world.count_calls(|c| matches!(c, Call::Place { .. })), 0);
    }

    #[tokio::test]
    async fn facing_looks_from_eye_height_before_placing() {
        let world = Arc::new(flat_world().with_item("lever", 1));
        let mut session = session(&world);

        session
            .place_at("lever", Offset::from((1, -1, 1)), Vector3D::up(), Some(Facing::East))
            .await;

        let calls = world.calls();
        let look = calls
            .iter()
            .position(|c| matches!(c, Call::LookAt(_)))
            .expect("look_at issued");
        let place = calls
            .iter()
            .position(|c| matches!(c, Call::Place { .. }))
            .expect("place issued");
        assert!(look < place);
        assert_eq!(calls[look], Call::LookAt(Vector3D::new(1.5, 64.0 + 1.62, 0.5)));
    }

    #[tokio::test]
    async fn occupancy_check_is_off_by_default() {
        let world = Arc::new(flat_world().with_item("dirt", 8));
        world.set_block(BlockPos::new(0, 64, -1), "sand");
        let mut default_session = session(&world);

        let outcome = default_session
            .place_at("dirt", Offset::from((0, -1, 1)), Vector3D::up(), None)
            .await;
        assert_eq!(outcome, Outcome::Done);

        world.set_block(BlockPos::new(0, 64, -1), "sand");
        let config = BuildConfig {
            check_target_empty: true,
            ..BuildConfig::default()
        };
        let mut checked = ConstructionSession::new(Arc::clone(&world), config);
        let outcome = checked
            .place_at("dirt", Offset::from((0, -1, 1)), Vector3D::up(), None)
            .await;
        assert_eq!(outcome, Outcome::Failed(FailureKind::Occupied));
        assert_eq!(world.block_name(BlockPos::new(0, 64, -1)).as_deref(), Some("sand"));
    }

    #[tokio::test]
    async fn pour_equips_aims_and_activates() {
        let world = Arc::new(flat_world().with_item("water_bucket", 1));
        let mut session = session(&world);

        let outcome = session.pour_liquid(Offset::from((0, -1, 2))).await;

        assert_eq!(outcome, Outcome::Done);
        let calls = world.calls();
        assert!(matches!(
            calls[0],
            Call::Equip { ref item, hand: Hand::Main } if item == "water_bucket"
        ));
        assert_eq!(calls[1], Call::LookAt(Vector3D::new(0.5, 63.0, -1.5)));
        assert_eq!(calls[2], Call::ActivateItem);
        assert_eq!(calls[3], Call::Sleep(Duration::from_millis(1000)));
    }

    #[tokio::test]
    async fn pour_without_bucket_short_circuits() {
        let world = Arc::new(flat_world());
        let mut session = session(&world);

        let outcome = session.pour_liquid(Offset::from((0, -1, 2))).await;

        assert_eq!(outcome, Outcome::Failed(FailureKind::MissingResource));
        assert!(world.calls().is_empty());
    }

    #[tokio::test]
    async fn pour_reports_activation_failure() {
        let world = Arc::new(flat_world().with_item("water_bucket", 1));
        world.fail_activations(BridgeError::Rejected("nothing to pour into".into()));
        let mut session = session(&world);

        let outcome = session.pour_liquid(Offset::from((0, -1, 2))).await;

        assert_eq!(outcome, Outcome::Failed(FailureKind::TransientActionFailure));
    }

    #[tokio::test]
    async fn toggle_mismatch_is_a_no_op() {
        let world = Arc::new(flat_world());
        world.set_block(BlockPos::new(1, 64, -1), "stone_button");
        let mut session = session(&world);

        let outcome = session.toggle_block("lever", Offset::from((1, 0, 1))).await;

        assert_eq!(outcome, Outcome::Skipped(SkipReason::TypeMismatch));
        assert_eq!(world.count_calls(|c| matches!(c, Call::ActivateBlock(_))), 0);
    }

    #[tokio::test]
    async fn toggle_floors_fractional_offsets() {
        let world = Arc::new(flat_world());
        world.set_block(BlockPos::new(1, 64, -1), "lever");
        let mut session = session(&world);

        let outcome = session
            .toggle_block("lever", Offset::new(0.9, 0.4, 0.6))
            .await;

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(
            world.calls(),
            vec![Call::ActivateBlock(BlockPos::new(1, 64, -1))]
        );
    }

    #[tokio::test]
    async fn toggle_failure_is_not_retried() {
        let world = Arc::new(flat_world());
        world.set_block(BlockPos::new(1, 64, -1), "lever");
        world.fail_activations(BridgeError::Rejected("out of reach".into()));
        let mut session = session(&world);

        let outcome = session.toggle_block("lever", Offset::from((1, 0, 1))).await;

        assert_eq!(outcome, Outcome::Failed(FailureKind::TransientActionFailure));
        assert_eq!(world.count_calls(|c| matches!(c, Call::ActivateBlock(_))), 1);
    }

    #[tokio::test]
    async fn dig_list_keeps_going_past_empty_and_failed_cells() {
        let world = Arc::new(flat_world());
        world.set_block(BlockPos::new(0, 63, -2), "air");
        world.set_block(BlockPos::new(0, 63, -4), "bedrock");
        world.set_undiggable("bedrock");
        let mut session = session(&world);

        let offsets = [
            Offset::from((0, -1, 1)),
            Offset::from((0, -1, 2)),
            Offset::from((0, -1, 3)),
            Offset::from((0, -1, 4)),
        ];
        let outcomes = session.dig_list(&offsets).await;

        assert_eq!(
            outcomes,
            vec![
                Outcome::Done,
                Outcome::Skipped(SkipReason::AlreadyEmpty),
                Outcome::Done,
                Outcome::Skipped(SkipReason::NotDiggable),
            ]
        );
        assert_eq!(world.block_name(BlockPos::new(0, 63, -1)).as_deref(), Some("air"));
        assert_eq!(world.block_name(BlockPos::new(0, 63, -3)).as_deref(), Some("air"));
        assert_eq!(world.block_name(BlockPos::new(0, 63, -4)).as_deref(), Some("bedrock"));
    }

    #[tokio::test]
    async fn dig_failure_does_not_abort_batch() {
        let world = Arc::new(flat_world());
        world.script_dig_results([Err(BridgeError::Rejected("interrupted".into()))]);
        let mut session = session(&world);

        let outcomes = session
            .dig_list(&[Offset::from((0, -1, 1)), Offset::from((0, -1, 2))])
            .await;

        assert_eq!(
            outcomes,
            vec![Outcome::Failed(FailureKind::TransientActionFailure), Outcome::Done]
        );
        assert_eq!(world.block_name(BlockPos::new(0, 63, -2)).as_deref(), Some("air"));
    }

    #[tokio::test]
    async fn dig_list_skips_unloaded_cells_as_unresolved() {
        let world = Arc::new(flat_world());
        world.unload(BlockPos::new(0, 63, -1));
        let mut session = session(&world);

        let outcomes = session
            .dig_list(&[Offset::from((0, -1, 1)), Offset::from((0, -1, 2))])
            .await;

        assert_eq!(
            outcomes,
            vec![Outcome::Skipped(SkipReason::Unresolved), Outcome::Done]
        );
        assert_eq!(world.calls(), vec![Call::Dig(BlockPos::new(0, 63, -2))]);
    }

    #[tokio::test]
    async fn zero_place_attempts_still_tries_once() {
        let world = Arc::new(flat_world().with_item("dirt", 1));
        let config = BuildConfig {
            place_attempts: 0,
            ..BuildConfig::default()
        };
        let mut session = ConstructionSession::new(Arc::clone(&world), config);

        let outcome = session
            .place_at("dirt", Offset::from((0, -1, 1)), Vector3D::up(), None)
            .await;

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(world.count_calls(|c| matches!(c, Call::Place { .. })), 1);
    }

    #[tokio::test]
    async fn walk_uses_same_axis_convention() {
        let world = Arc::new(flat_world());
        let mut session = session(&world);

        let outcome = session.walk_to(Offset::from((2, 0, 3))).await;

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(
            world.calls(),
            vec![Call::Navigate(Vector3D::new(2.5, 64.0, -2.5))]
        );
    }

    #[tokio::test]
    async fn jump_for_releases_control_when_done() {
        let world = Arc::new(flat_world());
        let session = session(&world);

        let outcome = session.jump_for(Duration::from_millis(120)).await;

        assert_eq!(outcome, Outcome::Done);
        let calls = world.calls();
        assert_eq!(calls.first(), Some(&Call::Control(Control::Jump, true)));
        assert_eq!(calls.last(), Some(&Call::Control(Control::Jump, false)));
        assert_eq!(world.count_calls(|c| matches!(c, Call::Sleep(_))), 3);
    }

    #[tokio::test]
    async fn jump_for_with_zero_tick_terminates() {
        let world = Arc::new(flat_world());
        let config = BuildConfig {
            tick_ms: 0,
            ..BuildConfig::default()
        };
        let session = ConstructionSession::new(Arc::clone(&world), config);

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            session.jump_for(Duration::from_millis(3)),
        )
        .await
        .expect("jump_for should finish");

        assert_eq!(outcome, Outcome::Done);
        assert_eq!(
            world.count_calls(|c| *c == Call::Sleep(Duration::from_millis(1))),
            3
        );
    }

    #[tokio::test]
    async fn jump_for_stops_on_cancellation() {
        let world = Arc::new(flat_world());
        let session = session(&world);
        session.cancellation().cancel();

        let outcome = session.jump_for(Duration::from_secs(60)).await;

        assert_eq!(outcome, Outcome::Failed(FailureKind::Cancelled));
        assert_eq!(
            world.calls(),
            vec![
                Call::Control(Control::Jump, true),
                Call::Control(Control::Jump, false)
            ]
        );
    }
}
