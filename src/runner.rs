//! Sequential blueprint execution.
//!
//! Steps run strictly in order, each one after the previous has settled, whatever its
//! outcome. There is no rollback and no branching: a failed step degrades the structure but
//! never stops the run. The cancellation signal only cuts short repetitive actions such as
//! timed jumping; every later step still runs.

use std::time::Duration;

use tracing::{info, warn};

use crate::blueprint::{Blueprint, Directive};
use crate::bridge::CapabilityBridge;
use crate::error::Outcome;
use crate::provision::{InventoryProvisioner, ProvisionReport};
use crate::session::ConstructionSession;

/// Outcome of one executed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub index: usize,
    pub label: String,
    pub outcome: Outcome,
    /// Per-cell outcomes for batch steps; empty otherwise.
    pub details: Vec<Outcome>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub machine: String,
    pub provision: Option<ProvisionReport>,
    pub steps: Vec<StepRecord>,
    /// The session's cancellation signal was raised by the end of the run.
    pub cancelled: bool,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| s.outcome.is_failed())
    }

    /// True when no step failed and the run was not interrupted.
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.failures().next().is_none()
    }
}

pub struct BlueprintRunner<'a> {
    blueprint: &'a Blueprint,
    provision: bool,
}

impl<'a> BlueprintRunner<'a> {
    pub fn new(blueprint: &'a Blueprint) -> Self {
        Self {
            blueprint,
            provision: true,
        }
    }

    /// Skip the inventory top-up before the first step.
    pub fn without_provisioning(mut self) -> Self {
        self.provision = false;
        self
    }

    /// Runs every step against `session`. The session's origin is reset first, so the run
    /// lays out relative to wherever the agent stands when it is first needed.
    #[tracing::instrument(skip_all, fields(machine = %self.blueprint.name))]
    pub async fn run<B: CapabilityBridge + ?Sized>(
        &self,
        session: &mut ConstructionSession<B>,
    ) -> RunReport {
        let mut report = RunReport {
            machine: self.blueprint.name.clone(),
            ..RunReport::default()
        };

        session.clear_origin();

        if self.provision && !self.blueprint.required_items.is_empty() {
            let provisioner = InventoryProvisioner::new(session.config());
            let provisioned = provisioner
                .provision(session.bridge(), &self.blueprint.required_items)
                .await;
            report.provision = Some(provisioned);
        }

        let total = self.blueprint.steps.len();
        for (index, step) in self.blueprint.steps.iter().enumerate() {
            let (outcome, details) = execute(session, step).await;
            let label = step.to_string();
            if outcome.is_failed() {
                warn!(step = index, total, %label, ?outcome, "step failed; continuing");
            } else {
                info!(step = index, total, %label, ?outcome, "step finished");
            }
            report.steps.push(StepRecord {
                index,
                label,
                outcome,
                details,
            });
        }

        report.cancelled = session.is_cancelled();
        let failed = report.failures().count();
        info!(
            steps = report.steps.len(),
            failed,
            cancelled = report.cancelled,
            "machine run finished"
        );
        report
    }
}

async fn execute<B: CapabilityBridge + ?Sized>(
    session: &mut ConstructionSession<B>,
    step: &Directive,
) -> (Outcome, Vec<Outcome>) {
    let outcome = match step {
        Directive::SetOrigin => {
            session.set_origin();
            Outcome::Done
        }
        Directive::Place(place) => {
            session
                .place_at(&place.item, place.offset, place.direction, place.facing)
                .await
        }
        Directive::Dig { cells } => {
            let offsets: Vec<_> = cells.iter().map(|c| c.offset).collect();
            let details = session.dig_list(&offsets).await;
            return (Outcome::summarize(&details), details);
        }
        Directive::Pour { offset } => session.pour_liquid(*offset).await,
        Directive::Toggle { block, offset } => session.toggle_block(block, *offset).await,
        Directive::Walk { offset } => session.walk_to(*offset).await,
        Directive::Jump { millis } => session.jump_for(Duration::from_millis(*millis)).await,
        Directive::Wait { millis } => session.wait(Duration::from_millis(*millis)).await,
    };
    (outcome, Vec::new())
}
