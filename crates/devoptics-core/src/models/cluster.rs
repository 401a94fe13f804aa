use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Minimal health snapshot for a Kubernetes cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ClusterHealth {
    pub cluster_name: String,
    pub status: String,
    pub timestamp: String,
    #[serde(default)]
    pub signals: BTreeMap<String, String>,
}

impl ClusterHealth {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cluster_health() {
        let json = r#"{"clusterName":"prod-eu","status":"healthy","timestamp":"2024-05-01T10:00:00Z","signals":{"nodes":"3/3","pods":"42 running"}}"#;
        let health: ClusterHealth = serde_json::from_str(json).expect("valid cluster health JSON");
        assert_eq!(health.cluster_name, "prod-eu");
        assert!(health.is_healthy());
        assert_eq!(health.signals.get("nodes").map(String::as_str), Some("3/3"));
    }

    #[test]
    fn test_parse_cluster_health_without_signals() {
        let json = r#"{"clusterName":"dev","status":"Degraded","timestamp":"2024-05-01T10:00:00Z"}"#;
        let health: ClusterHealth = serde_json::from_str(json).expect("signals are optional");
        assert!(health.signals.is_empty());
        assert!(!health.is_healthy());
    }
}
