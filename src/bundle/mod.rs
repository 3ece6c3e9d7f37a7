//! Link-aggregation bundle: flow-to-egress-link assignment.
//!
//! This module implements the core assignment pipeline:
//! - Window layout over the flow signature space
//! - Stateless egress link picking
//! - Rebalancing when member links go down or come back up

mod picker;

pub use picker::{pick_link, window_layout, window_width, Window};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::flow::FlowDescriptor;
use crate::hashing::{compute_signature_with, HashPolicy};
use crate::types::{FlowSignature, LinkIndex};

/// Default number of member links a bundle supports.
pub const DEFAULT_MAX_SUPPORTED_LINKS: u16 = 256;

/// Result of assigning one flow to an egress link.
///
/// Only valid for the active/capacity pair it was computed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EgressAssignment {
    pub signature: FlowSignature,
    pub link: LinkIndex,
}

/// Hash a flow and pick its egress link in one step.
pub fn assign(
    policy: HashPolicy,
    active_links: u16,
    max_supported_links: u16,
    flow: &FlowDescriptor,
) -> Result<EgressAssignment> {
    let signature = compute_signature_with(policy, flow);
    let link = pick_link(active_links, max_supported_links, signature)?;
    Ok(EgressAssignment { signature, link })
}

/// Snapshot of a bundle's size: how many links it supports, how many are up,
/// and how it hashes.
///
/// A plain value: changing the active count re-partitions the signature
/// space without touching the hash, so every later assignment sees the new
/// layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkBundle {
    max_supported: u16,
    active: u16,
    policy: HashPolicy,
}

impl LinkBundle {
    /// Create a bundle with `active` of `max_supported` links up.
    pub fn new(max_supported: u16, active: u16) -> Result<Self> {
        if max_supported == 0 {
            return Err(Error::InvalidConfig(
                "bundle must support at least one link".into(),
            ));
        }
        if active > max_supported {
            return Err(Error::InvalidConfig(format!(
                "{active} active links exceed bundle capacity of {max_supported}"
            )));
        }
        Ok(Self {
            max_supported,
            active,
            policy: HashPolicy::default(),
        })
    }

    /// Use a different hash policy.
    pub fn with_policy(mut self, policy: HashPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn max_supported(&self) -> u16 {
        self.max_supported
    }

    pub fn active(&self) -> u16 {
        self.active
    }

    pub fn policy(&self) -> HashPolicy {
        self.policy
    }

    pub fn is_down(&self) -> bool {
        self.active == 0
    }

    /// Take one member link down. Returns the new active count.
    pub fn link_down(&mut self) -> u16 {
        self.active = self.active.saturating_sub(1);
        debug!(active = self.active, "member link down, rebalancing");
        self.active
    }

    /// Bring one member link up. Returns the new active count.
    pub fn link_up(&mut self) -> Result<u16> {
        if self.active >= self.max_supported {
            return Err(Error::BundleFull {
                max: self.max_supported,
            });
        }
        self.active += 1;
        debug!(active = self.active, "member link up, rebalancing");
        Ok(self.active)
    }

    /// Pick the egress link for an already computed signature.
    pub fn pick(&self, signature: FlowSignature) -> Result<LinkIndex> {
        pick_link(self.active, self.max_supported, signature)
    }

    /// Hash a flow and pick its egress link.
    pub fn assign(&self, flow: &FlowDescriptor) -> Result<EgressAssignment> {
        assign(self.policy, self.active, self.max_supported, flow)
    }

    /// Current window layout.
    pub fn windows(&self) -> Result<Vec<Window>> {
        window_layout(self.active, self.max_supported)
    }
}

impl Default for LinkBundle {
    fn default() -> Self {
        Self {
            max_supported: DEFAULT_MAX_SUPPORTED_LINKS,
            active: 1,
            policy: HashPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowGenerator;

    #[test]
    fn test_bundle_validation() {
        assert!(LinkBundle::new(0, 0).is_err());
        assert!(LinkBundle::new(4, 5).is_err());
        assert!(LinkBundle::new(4, 0).is_ok());
        assert!(LinkBundle::new(256, 256).is_ok());
    }

    #[test]
    fn test_link_up_down() {
        let mut bundle = LinkBundle::new(2, 1).unwrap();
        assert_eq!(bundle.link_up().unwrap(), 2);
        assert!(matches!(bundle.link_up(), Err(Error::BundleFull { max: 2 })));
        assert_eq!(bundle.link_down(), 1);
        assert_eq!(bundle.link_down(), 0);
        assert_eq!(bundle.link_down(), 0);
        assert!(bundle.is_down());
    }

    #[test]
    fn test_down_bundle_reports_no_links() {
        let bundle = LinkBundle::new(256, 0).unwrap();
        let flow = FlowGenerator::seeded(5).flow();
        assert!(matches!(bundle.assign(&flow), Err(Error::NoAvailableLinks)));
    }

    #[test]
    fn test_rebalance_keeps_signature() {
        let mut bundle = LinkBundle::new(256, 4).unwrap();
        for flow in FlowGenerator::seeded(9).take(200) {
            let before = bundle.assign(&flow).unwrap();
            bundle.link_down();
            let after = bundle.assign(&flow).unwrap();
            bundle.link_up().unwrap();

            assert_eq!(before.signature, after.signature);
            assert!(after.link.get() <= 3);
        }
    }

    #[test]
    fn test_assignment_in_range() {
        let bundle = LinkBundle::new(256, 5).unwrap().with_policy(HashPolicy::Layer2);
        for flow in FlowGenerator::seeded(10).take(500) {
            let assignment = bundle.assign(&flow).unwrap();
            assert!((1..=5).contains(&assignment.link.get()));
        }
    }
}
