//! Declarative machine descriptions.
//!
//! A [`Blueprint`] is an ordered list of [`Directive`]s plus the items it consumes. The same
//! data drives execution ([`crate::runner::BlueprintRunner`]), validation, footprint
//! computation and diffing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BlueprintError;
use crate::geometry::{Facing, Offset, Vector3D};
use crate::provision::RequiredItems;

/// Place `item` against the block at `offset`, on the face along `direction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementDirective {
    pub item: String,
    pub offset: Offset,
    #[serde(rename = "insertion_direction", default = "Vector3D::up")]
    pub direction: Vector3D,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facing: Option<Facing>,
}

impl PlacementDirective {
    /// Place `item` on top of the block at `offset`.
    pub fn on_top(item: impl Into<String>, offset: impl Into<Offset>) -> Self {
        Self {
            item: item.into(),
            offset: offset.into(),
            direction: Vector3D::up(),
            facing: None,
        }
    }

    pub fn facing(mut self, facing: Facing) -> Self {
        self.facing = Some(facing);
        self
    }

    pub fn against(mut self, direction: Vector3D) -> Self {
        self.direction = direction;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DigDirective {
    pub offset: Offset,
}

/// One step of a machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Directive {
    /// Capture the agent's current pose as the origin.
    SetOrigin,
    Place(PlacementDirective),
    Dig { cells: Vec<DigDirective> },
    Pour { offset: Offset },
    Toggle { block: String, offset: Offset },
    Walk { offset: Offset },
    Jump { millis: u64 },
    Wait { millis: u64 },
}

impl Directive {
    pub fn dig(offsets: impl IntoIterator<Item = Offset>) -> Self {
        Directive::Dig {
            cells: offsets
                .into_iter()
                .map(|offset| DigDirective { offset })
                .collect(),
        }
    }

    /// Offsets this step reads or changes.
    pub fn offsets(&self) -> Vec<Offset> {
        match self {
            Directive::Place(place) => vec![place.offset],
            Directive::Dig { cells } => cells.iter().map(|c| c.offset).collect(),
            Directive::Pour { offset }
            | Directive::Toggle { offset, .. }
            | Directive::Walk { offset } => vec![*offset],
            Directive::SetOrigin | Directive::Jump { .. } | Directive::Wait { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::SetOrigin => f.write_str("set origin"),
            Directive::Place(place) => match place.facing {
                Some(facing) => write!(
                    f,
                    "place {} at {} facing {:?}",
                    place.item, place.offset, facing
                ),
                None => write!(f, "place {} at {}", place.item, place.offset),
            },
            Directive::Dig { cells } => write!(f, "dig {} cell(s)", cells.len()),
            Directive::Pour { offset } => write!(f, "pour at {offset}"),
            Directive::Toggle { block, offset } => write!(f, "toggle {block} at {offset}"),
            Directive::Walk { offset } => write!(f, "walk to {offset}"),
            Directive::Jump { millis } => write!(f, "jump for {millis}ms"),
            Directive::Wait { millis } => write!(f, "wait {millis}ms"),
        }
    }
}

/// A difference between two blueprints at one step index.
#[derive(Debug, Clone, PartialEq)]
pub struct StepDiff {
    pub index: usize,
    pub before: Option<Directive>,
    pub after: Option<Directive>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub name: String,
    #[serde(default)]
    pub required_items: RequiredItems,
    pub steps: Vec<Directive>,
}

impl Blueprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_items: RequiredItems::default(),
            steps: Vec::new(),
        }
    }

    pub fn requires(mut self, item: impl Into<String>, count: u32) -> Self {
        self.required_items = self.required_items.with(item, count);
        self
    }

    pub fn step(mut self, directive: Directive) -> Self {
        self.steps.push(directive);
        self
    }

    /// Parses and validates a JSON blueprint.
    pub fn from_json(raw: &str) -> Result<Self, BlueprintError> {
        let blueprint: Self = serde_json::from_str(raw)?;
        let issues = blueprint.validate();
        if !issues.is_empty() {
            return Err(BlueprintError::Invalid {
                name: blueprint.name,
                issues,
            });
        }
        Ok(blueprint)
    }

    pub fn to_json(&self) -> Result<String, BlueprintError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable problems that would make steps fail regardless of the world state.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.name.trim().is_empty() {
            issues.push("blueprint has no name".to_string());
        }

        for (index, step) in self.steps.iter().enumerate() {
            match step {
                Directive::Place(place) => {
                    if place.item.trim().is_empty() {
                        issues.push(format!("step {index}: place has no item"));
                    }
                    if place.direction.is_zero() {
                        issues.push(format!("step {index}: insertion direction is zero"));
                    }
                }
                Directive::Dig { cells } if cells.is_empty() => {
                    issues.push(format!("step {index}: dig batch is empty"));
                }
                Directive::Toggle { block, .. } if block.trim().is_empty() => {
                    issues.push(format!("step {index}: toggle has no block type"));
                }
                Directive::Jump { millis: 0 } => {
                    issues.push(format!("step {index}: jump duration is zero"));
                }
                _ => {}
            }
        }

        issues
    }

    /// Distinct offsets touched, in order of first use.
    pub fn footprint(&self) -> Vec<Offset> {
        let mut seen: Vec<Offset> = Vec::new();
        for offset in self.steps.iter().flat_map(Directive::offsets) {
            if !seen.contains(&offset) {
                seen.push(offset);
            }
        }
        seen
    }

    /// Step-by-step differences against `other`, including steps only one side has.
    pub fn diff(&self, other: &Blueprint) -> Vec<StepDiff> {
        let len = self.steps.len().max(other.steps.len());
        (0..len)
            .filter_map(|index| {
                let before = self.steps.get(index);
                let after = other.steps.get(index);
                (before != after).then(|| StepDiff {
                    index,
                    before: before.cloned(),
                    after: after.cloned(),
                })
            })
            .collect()
    }
}
