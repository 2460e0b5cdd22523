use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::tenant::TenantId;

/// A user as cached on every node. User identity is the one collection
/// modeled cross-tenant; each record still names its home tenant.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub username: String,
    pub tenant_id: TenantId,
    pub team_id: i32,
    pub role: String,
    /// Ciphertext as stored by the system of record; decrypted only during
    /// credential-store reconciliation.
    pub encrypted_password: Option<String>,
    pub switch_teams: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub tenant_id: TenantId,
    pub team_id: i32,
    pub name: String,
    pub allowed_env_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub id: String,
    pub name: String,
    pub cluster_id: String,
    pub tenant_id: TenantId,
    /// Companion environment (e.g. the schema registry env paired with a
    /// Kafka env), when one exists.
    pub associated_env_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KafkaCluster {
    pub cluster_id: String,
    pub name: String,
    pub bootstrap_servers: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    pub name: String,
    pub environment_id: String,
    pub team_id: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TenantRecord {
    pub tenant_id: TenantId,
    pub name: String,
    pub active: bool,
}

/// Per-tenant configuration, rebuilt wholesale on PROPERTIES events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantProperties {
    /// Environment ids in topic promotion order.
    pub topic_promotion_order: Vec<String>,
    /// Environments in which topic requests may be opened.
    pub request_topic_envs: Vec<String>,
    #[serde(default)]
    pub extras: HashMap<String, String>,
}

/// One topic name with the set of environments it exists in. Inventory
/// rows are per-environment; summaries group them for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSummary {
    pub name: String,
    pub team_id: i32,
    pub environments: HashSet<String>,
}

/// Group per-environment topic rows by topic name.
pub fn summarize_topics(topics: &[Topic]) -> Vec<TopicSummary> {
    let mut grouped: HashMap<&str, TopicSummary> = HashMap::new();
    for topic in topics {
        grouped
            .entry(topic.name.as_str())
            .or_insert_with(|| TopicSummary {
                name: topic.name.clone(),
                team_id: topic.team_id,
                environments: HashSet::new(),
            })
            .environments
            .insert(topic.environment_id.clone());
    }
    let mut summaries: Vec<TopicSummary> = grouped.into_values().collect();
    summaries.sort_by(|a, b| a.name.cmp(&b.name));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(name: &str, env: &str, team: i32) -> Topic {
        Topic {
            name: name.to_string(),
            environment_id: env.to_string(),
            team_id: team,
        }
    }

    #[test]
    fn summarize_groups_rows_by_name() {
        let topics = vec![
            topic("orders", "dev", 3),
            topic("orders", "prod", 3),
            topic("payments", "dev", 4),
        ];

        let summaries = summarize_topics(&topics);

        assert_eq!(summaries.len(), 2);
        let orders = summaries.iter().find(|s| s.name == "orders").unwrap();
        assert_eq!(orders.environments.len(), 2);
        assert!(orders.environments.contains("dev"));
        assert!(orders.environments.contains("prod"));
        assert_eq!(orders.team_id, 3);
    }

    #[test]
    fn summarize_empty_inventory_is_empty() {
        assert!(summarize_topics(&[]).is_empty());
    }

    #[test]
    fn summaries_are_sorted_by_name() {
        let topics = vec![topic("zeta", "dev", 1), topic("alpha", "dev", 1)];

        let summaries = summarize_topics(&topics);

        assert_eq!(summaries[0].name, "alpha");
        assert_eq!(summaries[1].name, "zeta");
    }
}
