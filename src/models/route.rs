//! TCP route mappings as returned by the routing control plane

use crate::error::{AppError, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Association between an external port on a router group and a backend's
/// internal address and port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMapping {
    #[serde(rename = "router_group_guid")]
    pub router_group_id: String,
    #[serde(rename = "port")]
    pub external_port: u16,
    #[serde(rename = "backend_ip")]
    pub host_ip: String,
    #[serde(rename = "backend_port")]
    pub host_port: u16,
}

impl RouteMapping {
    pub fn new(
        router_group_id: impl Into<String>,
        external_port: u16,
        host_ip: impl Into<String>,
        host_port: u16,
    ) -> Self {
        Self {
            router_group_id: router_group_id.into(),
            external_port,
            host_ip: host_ip.into(),
            host_port,
        }
    }

    /// Load a mapping from a JSON file and reject it if malformed
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read route mapping {}", path.display()))?;
        let mapping: RouteMapping = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse route mapping {}", path.display()))?;

        if !validate_tcp_route_mapping(&mapping) {
            return Err(AppError::validation(format!(
                "Malformed route mapping in {}: {}",
                path.display(),
                mapping
            )));
        }

        Ok(mapping)
    }
}

impl std::fmt::Display for RouteMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "router_group={} external_port={} -> {}:{}",
            self.router_group_id, self.external_port, self.host_ip, self.host_port
        )
    }
}

/// Returns true iff every field of the mapping can be trusted.
pub fn validate_tcp_route_mapping(mapping: &RouteMapping) -> bool {
    if mapping.router_group_id.is_empty() {
        return false;
    }

    if mapping.external_port == 0 {
        return false;
    }

    if mapping.host_ip.is_empty() {
        return false;
    }

    if mapping.host_port == 0 {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid_mapping() -> RouteMapping {
        RouteMapping::new("abc-123", 61000, "10.244.0.5", 3333)
    }

    #[test]
    fn test_valid_mapping() {
        assert!(validate_tcp_route_mapping(&valid_mapping()));
    }

    #[test]
    fn test_empty_router_group() {
        let mapping = RouteMapping { router_group_id: String::new(), ..valid_mapping() };
        assert!(!validate_tcp_route_mapping(&mapping));
    }

    #[test]
    fn test_zero_external_port() {
        let mapping = RouteMapping { external_port: 0, ..valid_mapping() };
        assert!(!validate_tcp_route_mapping(&mapping));
    }

    #[test]
    fn test_empty_host_ip() {
        let mapping = RouteMapping { host_ip: String::new(), ..valid_mapping() };
        assert!(!validate_tcp_route_mapping(&mapping));
    }

    #[test]
    fn test_zero_host_port() {
        let mapping = RouteMapping { host_port: 0, ..valid_mapping() };
        assert!(!validate_tcp_route_mapping(&mapping));
    }

    #[test]
    fn test_routing_api_json_shape() {
        let json = r#"{"router_group_guid":"rg-1","port":61000,"backend_ip":"10.0.16.4","backend_port":60000}"#;
        let mapping: RouteMapping = serde_json::from_str(json).unwrap();
        assert_eq!(mapping, RouteMapping::new("rg-1", 61000, "10.0.16.4", 60000));
    }

    #[test]
    fn test_negative_port_is_rejected_by_parser() {
        let json = r#"{"router_group_guid":"rg-1","port":-1,"backend_ip":"10.0.16.4","backend_port":60000}"#;
        assert!(serde_json::from_str::<RouteMapping>(json).is_err());
    }

    #[test]
    fn test_load_rejects_malformed_mapping() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"router_group_guid":"","port":61000,"backend_ip":"10.0.16.4","backend_port":60000}}"#).unwrap();

        let err = RouteMapping::load(file.path()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_load_valid_mapping() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"router_group_guid":"rg-1","port":61001,"backend_ip":"10.0.16.4","backend_port":3333}}"#).unwrap();

        let mapping = RouteMapping::load(file.path()).unwrap();
        assert_eq!(mapping.external_port, 61001);
    }

    proptest! {
        #[test]
        fn prop_complete_mappings_are_valid(
            group in "[a-z0-9-]{1,36}",
            external in 1u16..=u16::MAX,
            ip in "[0-9]{1,3}(\\.[0-9]{1,3}){3}",
            host_port in 1u16..=u16::MAX,
        ) {
            let mapping = RouteMapping::new(group, external, ip, host_port);
            prop_assert!(validate_tcp_route_mapping(&mapping));
        }

        #[test]
        fn prop_any_missing_field_is_invalid(
            group in "[a-z0-9-]{1,36}",
            external in 1u16..=u16::MAX,
            host_port in 1u16..=u16::MAX,
            broken in 0usize..4,
        ) {
            let mut mapping = RouteMapping::new(group, external, "10.0.0.1", host_port);
            match broken {
                0 => mapping.router_group_id.clear(),
                1 => mapping.external_port = 0,
                2 => mapping.host_ip.clear(),
                _ => mapping.host_port = 0,
            }
            prop_assert!(!validate_tcp_route_mapping(&mapping));
        }
    }
}
