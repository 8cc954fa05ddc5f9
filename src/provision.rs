//! Inventory provisioning: request exactly what a blueprint is missing.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bridge::CapabilityBridge;
use crate::config::BuildConfig;

/// Minimum quantity per item name. Ordered so requests go out deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredItems(pub BTreeMap<String, u32>);

impl RequiredItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, item: impl Into<String>, count: u32) -> Self {
        self.0.insert(item.into(), count);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Items whose live count is below the requirement, with the missing amount.
    pub fn shortfall(&self, counts: &HashMap<String, u32>) -> Vec<(String, u32)> {
        self.iter()
            .filter_map(|(item, required)| {
                let have = counts.get(item).copied().unwrap_or(0);
                (have < required).then(|| (item.to_string(), required - have))
            })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for RequiredItems {
    fn from_iter<I: IntoIterator<Item = (S, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// What a provisioning pass asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub requested: Vec<(String, u32)>,
    /// Items whose request could not be sent.
    pub failed: Vec<String>,
}

/// Tops up the agent's inventory through acquisition commands.
///
/// Holdings are read once up front; requests are optimistic and not read back.
#[derive(Debug, Clone)]
pub struct InventoryProvisioner<'a> {
    config: &'a BuildConfig,
}

impl<'a> InventoryProvisioner<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self { config }
    }

    #[tracing::instrument(skip_all, fields(items = required.0.len()))]
    pub async fn provision<B: CapabilityBridge + ?Sized>(
        &self,
        bridge: &B,
        required: &RequiredItems,
    ) -> ProvisionReport {
        let counts = bridge.inventory_counts();
        let mut report = ProvisionReport::default();

        for (item, missing) in required.shortfall(&counts) {
            let command = self.config.acquire_command_for(&item, missing);
            match bridge.send_command(&command).await {
                Ok(()) => {
                    info!(item = %item, count = missing, "requested items");
                    report.requested.push((item, missing));
                }
                Err(err) => {
                    warn!(item = %item, count = missing, "item request failed: {err}");
                    report.failed.push(item);
                }
            }
            bridge.sleep(self.config.provision_settle()).await;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockWorld};

    #[test]
    fn shortfall_never_over_requests() {
        let required: RequiredItems = [("torch", 2), ("rail", 10), ("lever", 1)]
            .into_iter()
            .collect();
        let counts = HashMap::from([("rail".to_string(), 4), ("lever".to_string(), 3)]);

        assert_eq!(
            required.shortfall(&counts),
            vec![("rail".to_string(), 6), ("torch".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn requests_exact_shortfall_once() {
        let world = MockWorld::new();
        let config = BuildConfig::default();
        let required = RequiredItems::new().with("torch", 2);

        let report = InventoryProvisioner::new(&config)
            .provision(&world, &required)
            .await;

        assert_eq!(report.requested, vec![("torch".to_string(), 2)]);
        assert_eq!(
            world.count_calls(|c| matches!(c, Call::Command(_))),
            1
        );
        assert!(world
            .calls()
            .contains(&Call::Command("/give @s torch 2".to_string())));
        assert_eq!(world.item_count("torch"), 2);
    }

    #[tokio::test]
    async fn sufficient_holdings_issue_nothing() {
        let world = MockWorld::new().with_item("torch", 5);
        let config = BuildConfig::default();
        let required = RequiredItems::new().with("torch", 2);

        let report = InventoryProvisioner::new(&config)
            .provision(&world, &required)
            .await;

        assert!(report.requested.is_empty());
        assert!(world.calls().is_empty());
        assert_eq!(world.item_count("torch"), 5);
    }

    #[tokio::test]
    async fn waits_after_each_request() {
        let world = MockWorld::new();
        let config = BuildConfig::default();
        let required = RequiredItems::new().with("dirt", 1).with("sand", 1);

        InventoryProvisioner::new(&config)
            .provision(&world, &required)
            .await;

        let settle = config.provision_settle();
        assert_eq!(
            world.calls(),
            vec![
                Call::Command("/give @s dirt 1".to_string()),
                Call::Sleep(settle),
                Call::Command("/give @s sand 1".to_string()),
                Call::Sleep(settle),
            ]
        );
    }

    #[tokio::test]
    async fn failed_request_is_reported_and_the_rest_continue() {
        let world = MockWorld::new();
        world.reject_commands_containing("lever");
        let config = BuildConfig::default();
        let required = RequiredItems::new().with("lever", 1).with("rail", 4);

        let report = InventoryProvisioner::new(&config)
            .provision(&world, &required)
            .await;

        assert_eq!(report.failed, vec!["lever".to_string()]);
        assert_eq!(report.requested, vec![("rail".to_string(), 4)]);
        assert_eq!(world.item_count("lever"), 0);
        assert_eq!(world.item_count("rail"), 4);
        assert_eq!(world.count_calls(|c| matches!(c, Call::Sleep(_))), 2);
    }
}
