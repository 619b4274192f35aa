// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redis key layout, shared with every head version

const PREFIX: &str = "campaign-management";

/// Hash field holding the JSON configuration of the campaign
pub const CONFIGURATION_FIELD: &str = "configuration";

/// Hash field holding the phase label
pub const STATE_FIELD: &str = "state";

/// Sorted set of the feedbacks scheduled by any head
pub const DELAYED_FEEDBACKS_KEY: &str = "campaign-management:delayed-feedbacks";

/// Hash of the campaign: `campaign-management:{tenant:key}`
pub fn campaign(tenant: &str, campaign_key: &str) -> String {
    format!("{PREFIX}:{{{tenant}:{campaign_key}}}")
}

/// Set of the feedbacks the current phase waits for
pub fn feedback(tenant: &str, campaign_key: &str) -> String {
    format!("{{{PREFIX}:{{{tenant}:{campaign_key}}}:feedback")
}

/// Set of the scenarios one factory still has to acknowledge
pub fn factory_feedback(tenant: &str, campaign_key: &str, node_id: &str) -> String {
    format!("{PREFIX}:{{{tenant}:{campaign_key}}}:factory:feedback:{node_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_hash_key() {
        assert_eq!(
            campaign("my-tenant", "my-campaign"),
            "campaign-management:{my-tenant:my-campaign}"
        );
    }

    #[test]
    fn feedback_set_key() {
        assert_eq!(
            feedback("my-tenant", "my-campaign"),
            "{campaign-management:{my-tenant:my-campaign}:feedback"
        );
    }

    #[test]
    fn factory_feedback_set_key() {
        assert_eq!(
            factory_feedback("my-tenant", "my-campaign", "node-1"),
            "campaign-management:{my-tenant:my-campaign}:factory:feedback:node-1"
        );
    }
}
