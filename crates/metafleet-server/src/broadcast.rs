use std::time::Duration;

use futures_util::future::join_all;
use tracing::debug;

use metafleet_core::event::{MetadataChangeEvent, WireMetadataChange};

use crate::audit;
use crate::config::FleetConfig;

/// Pushes cache invalidations to every other node in the fleet. The local
/// node is excluded by address comparison; a node must never re-apply an
/// event it originated.
pub struct InvalidationBroadcaster {
    client: reqwest::Client,
    endpoints: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub failed: usize,
}

/// Addresses may differ in case and trailing slashes across config files
/// on different nodes.
fn normalize_address(address: &str) -> String {
    address.trim().trim_end_matches('/').to_ascii_lowercase()
}

fn reset_endpoint(base: &str, context_path: &str) -> String {
    format!("{}{}/resetMemoryCache", normalize_address(base), context_path)
}

impl InvalidationBroadcaster {
    pub fn new(fleet: &FleetConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(fleet.broadcast_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoints: peer_endpoints(fleet),
        })
    }

    /// Number of peers an event will be pushed to.
    pub fn peer_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Send the event to every peer. Per-peer failures are logged and
    /// counted; one unreachable node never blocks the rest of the fleet.
    pub async fn broadcast(&self, event: &MetadataChangeEvent) -> BroadcastReport {
        let wire = WireMetadataChange::from_event(event);
        let sends = self.endpoints.iter().map(|endpoint| {
            let wire = wire.clone();
            async move {
                match self.client.post(endpoint).json(&wire).send().await {
                    Ok(response) if response.status().is_success() => {
                        debug!(endpoint = %endpoint, "peer invalidation delivered");
                        true
                    }
                    Ok(response) => {
                        audit::audit_broadcast_failure(
                            endpoint,
                            &format!("status {}", response.status()),
                        );
                        false
                    }
                    Err(err) => {
                        audit::audit_broadcast_failure(endpoint, &err.to_string());
                        false
                    }
                }
            }
        });

        let results = join_all(sends).await;
        BroadcastReport {
            attempted: results.len(),
            failed: results.iter().filter(|ok| !**ok).count(),
        }
    }
}

fn peer_endpoints(fleet: &FleetConfig) -> Vec<String> {
    let own = normalize_address(&fleet.node_address);
    fleet
        .peers
        .iter()
        .filter(|peer| normalize_address(peer) != own)
        .map(|peer| reset_endpoint(peer, &fleet.context_path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet(node: &str, peers: &[&str], context_path: &str) -> FleetConfig {
        FleetConfig {
            node_address: node.to_string(),
            peers: peers.iter().map(|p| p.to_string()).collect(),
            context_path: context_path.to_string(),
            broadcast_timeout_secs: 1,
        }
    }

    #[test]
    fn normalization_ignores_case_and_trailing_slash() {
        assert_eq!(
            normalize_address("HTTPS://Node-A:9097/"),
            "https://node-a:9097"
        );
        assert_eq!(normalize_address(" http://b "), "http://b");
    }

    #[test]
    fn own_address_is_excluded_from_the_peer_set() {
        let config = fleet(
            "https://node-a:9097",
            &["https://NODE-A:9097/", "https://node-b:9097"],
            "",
        );

        let endpoints = peer_endpoints(&config);

        assert_eq!(endpoints, vec!["https://node-b:9097/resetMemoryCache"]);
    }

    #[test]
    fn context_path_is_appended_before_the_endpoint() {
        let config = fleet("https://a", &["https://b"], "/fleet");

        let endpoints = peer_endpoints(&config);

        assert_eq!(endpoints, vec!["https://b/fleet/resetMemoryCache"]);
    }

    #[test]
    fn single_node_fleet_has_no_peers() {
        let config = fleet("https://a:9097", &["https://a:9097"], "");

        assert!(peer_endpoints(&config).is_empty());

        let broadcaster = InvalidationBroadcaster::new(&config).unwrap();
        assert_eq!(broadcaster.peer_count(), 0);
    }

    #[tokio::test]
    async fn broadcasting_to_no_peers_reports_nothing() {
        let config = fleet("https://a", &[], "");
        let broadcaster = InvalidationBroadcaster::new(&config).unwrap();

        let event = MetadataChangeEvent::new(
            metafleet_core::tenant::TenantId::new(1),
            metafleet_core::event::EntityType::Topics,
            metafleet_core::event::OperationType::Create,
            Some("orders".to_string()),
        );
        let report = broadcaster.broadcast(&event).await;

        assert_eq!(report, BroadcastReport { attempted: 0, failed: 0 });
    }
}
