//! Construction session: the context every primitive runs in.
//!
//! A session owns the bridge handle, the configuration, the origin frame of the current run
//! and the cancellation signal. Primitives live in [`crate::primitives`] as methods on it.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bridge::{Block, CapabilityBridge};
use crate::config::BuildConfig;
use crate::error::BridgeError;
use crate::frame::OriginFrame;
use crate::geometry::{Offset, Vector3D};

pub struct ConstructionSession<B: CapabilityBridge + ?Sized> {
    pub(crate) bridge: Arc<B>,
    pub(crate) config: BuildConfig,
    frame: Option<OriginFrame>,
    cancel: CancellationToken,
}

impl<B: CapabilityBridge + ?Sized> std::fmt::Debug for ConstructionSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructionSession")
            .field("frame", &self.frame)
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl<B: CapabilityBridge + ?Sized> ConstructionSession<B> {
    /// Accepts any config; an invalid one is logged and its loop bounds are clamped at use.
    pub fn new(bridge: Arc<B>, config: BuildConfig) -> Self {
        if let Err(err) = config.validate() {
            warn!("session config is out of range: {err}");
        }
        Self {
            bridge,
            config,
            frame: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn frame(&self) -> Option<OriginFrame> {
        self.frame
    }

    /// Captures the agent's current pose as the origin, replacing any existing frame.
    pub fn set_origin(&mut self) -> OriginFrame {
        let frame = OriginFrame::capture(self.bridge.as_ref());
        info!(position = %frame.position, heading = frame.heading, "origin frame set");
        self.frame = Some(frame);
        frame
    }

    /// Returns the current frame, capturing one first if none exists.
    pub fn ensure_origin(&mut self) -> OriginFrame {
        match self.frame {
            Some(frame) => frame,
            None => self.set_origin(),
        }
    }

    /// Drops the frame so the next run captures a fresh one.
    pub fn clear_origin(&mut self) {
        if self.frame.take().is_some() {
            debug!("origin frame cleared");
        }
    }

    pub fn resolve(&mut self, offset: Offset) -> Vector3D {
        self.ensure_origin().resolve(offset)
    }

    /// Block in the integer cell containing `offset`.
    pub(crate) fn block_at_offset(&mut self, offset: Offset) -> (Vector3D, Option<Block>) {
        let abs = self.resolve(offset);
        (abs, self.bridge.block_at(abs.floored()))
    }

    pub(crate) fn is_air(&self, block: &Block) -> bool {
        block.name == self.config.air_block
    }

    /// Turns toward `target` and waits for the acknowledgment, bounded by `look_settle`.
    ///
    /// A missing acknowledgment is not an error: the agent proceeds once the bound elapses.
    pub(crate) async fn look_and_settle(&self, target: Vector3D) -> Result<(), BridgeError> {
        let settle = self.config.look_settle();
        match tokio::time::timeout(settle, self.bridge.look_at(target)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(point = %target, ?settle, "look_at not acknowledged in time; proceeding");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWorld;

    #[test]
    fn ensure_origin_captures_once() {
        let world = Arc::new(MockWorld::new().at(Vector3D::new(10.5, 64.0, 10.5)));
        let mut session = ConstructionSession::new(Arc::clone(&world), BuildConfig::default());

        let first = session.ensure_origin();
        world.teleport(Vector3D::new(0.0, 0.0, 0.0));
        let second = session.ensure_origin();

        assert_eq!(first, second);
        assert_eq!(first.position, Vector3D::new(10.5, 64.0, 10.5));
    }

    #[test]
    fn set_origin_overwrites_and_clear_resets() {
        let world = Arc::new(MockWorld::new());
        let mut session = ConstructionSession::new(Arc::clone(&world), BuildConfig::default());
        session.set_origin();

        world.teleport(Vector3D::new(3.0, 70.0, -4.0));
        let moved = session.set_origin();
        assert_eq!(moved.position, Vector3D::new(3.0, 70.0, -4.0));

        session.clear_origin();
        assert!(session.frame().is_none());
    }

    #[test]
    fn resolve_lazily_creates_frame() {
        let world = Arc::new(MockWorld::new().at(Vector3D::new(1.0, 2.0, 3.0)));
        let mut session = ConstructionSession::new(world, BuildConfig::default());
        assert!(session.frame().is_none());

        let abs = session.resolve(Offset::from((1, 1, 1)));
        assert_eq!(abs, Vector3D::new(2.0, 3.0, 2.0));
        assert!(session.frame().is_some());
    }
}
