//! Registry document normalization
//!
//! Turns a [`RawRegistryDocument`] into a [`StageResultSet`]: one
//! [`NormalizedApplication`] per application name, carrying host descriptors,
//! parsed consumers and a whitelisted subset of metadata.
//!
//! Metadata and consumers are read from the *first* instance of each
//! application only. Instances of one application are assumed to share their
//! metadata; this is not validated.

use super::document::{InstanceRecord, RawApplication, RawRegistryDocument};
use super::error::RegistryError;
use super::model::{ConsumerDescriptor, HostDescriptor, NormalizedApplication, StageResultSet};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Metadata keys promoted into [`NormalizedApplication::metadata`]
pub const METADATA_WHITELIST: &[&str] = &[
    "description",
    "bitbucketUrl",
    "ignoredCommitters",
    "fdOwner",
    "tags",
    "microserviceUrl",
    "ipAddress",
    "networkZone",
    "documentationLink",
    "buildMonitorLink",
    "monitoringLink",
];

/// Metadata key holding the comma/colon-delimited consumer list
pub const CONSUMES_KEY: &str = "consumes";

/// Normalizes a raw registry document into per-application records
///
/// A document without an `applications` wrapper or without any application is
/// treated as an empty registry. When two applications share a name the later
/// one wins.
///
/// # Errors
///
/// Returns [`RegistryError::MalformedDocument`] if an application has no
/// `name` or no instances.
pub fn normalize(doc: &RawRegistryDocument) -> Result<StageResultSet, RegistryError> {
    let mut result = StageResultSet::new();

    for (index, application) in doc.applications().iter().enumerate() {
        let normalized = normalize_application(index, application)?;
        if result.contains_key(&normalized.name) {
            debug!(
                application = %normalized.name,
                "Duplicate application name, later entry replaces earlier one"
            );
        }
        result.insert(normalized.name.clone(), normalized);
    }

    Ok(result)
}

fn normalize_application(
    index: usize,
    application: &RawApplication,
) -> Result<NormalizedApplication, RegistryError> {
    let name = application.name.as_deref().ok_or_else(|| {
        RegistryError::malformed(format!("application at index {} has no name", index))
    })?;

    let instances = application.instances();
    let first = instances.first().ok_or_else(|| {
        RegistryError::malformed(format!("application \"{}\" has no instances", name))
    })?;

    let empty = Map::new();
    let metadata = first.metadata.as_ref().unwrap_or(&empty);

    let mut normalized = NormalizedApplication::new(name);
    normalized.hosts = instances.iter().map(host_descriptor).collect();
    normalized.consumes = metadata
        .get(CONSUMES_KEY)
        .map(|value| parse_consumers(&value_text(value)))
        .unwrap_or_default();
    normalized.metadata = project_metadata(metadata);

    Ok(normalized)
}

fn host_descriptor(instance: &InstanceRecord) -> HostDescriptor {
    let ports = [&instance.port, &instance.secure_port]
        .into_iter()
        .flatten()
        .filter_map(|port| port.enabled_port())
        .collect();

    HostDescriptor {
        host_name: instance.host_name.clone(),
        ip_addr: instance.ip_addr.clone(),
        home_page_url: instance.home_page_url.clone(),
        ports,
    }
}

/// Copies whitelisted metadata entries verbatim, skipping absent keys
pub fn project_metadata(metadata: &Map<String, Value>) -> BTreeMap<String, Value> {
    METADATA_WHITELIST
        .iter()
        .filter_map(|key| {
            metadata
                .get(*key)
                .map(|value| ((*key).to_string(), value.clone()))
        })
        .collect()
}

/// Parses a `consumes` value such as `"billing:rest,inventory"`
///
/// Entries are comma-separated; each entry is `target[:type]`. Targets are
/// upper-cased. The type is kept only when the entry has exactly two parts and
/// the second is non-empty.
///
/// Parts are trimmed, so `"a, b: jms"` yields `B` with type `jms` rather than
/// a target of `" B"` and a type of `" jms"`. Entries without a target (as in
/// `"a,,b"` or `" :rest"`) are skipped instead of producing a consumer with an
/// empty name; a consumer always names a target service.
pub fn parse_consumers(input: &str) -> Vec<ConsumerDescriptor> {
    input
        .split(',')
        .filter_map(|entry| {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            let target = parts.first().filter(|target| !target.is_empty())?;

            let kind = match parts.as_slice() {
                [_, kind] if !kind.is_empty() => Some((*kind).to_string()),
                _ => None,
            };

            Some(ConsumerDescriptor::new(target.to_uppercase(), kind))
        })
        .collect()
}

// Non-string values are rendered as JSON text, strings without quotes.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use yare::parameterized;

    fn doc(value: Value) -> RawRegistryDocument {
        serde_json::from_value(value).unwrap()
    }

    fn instance(host: &str, metadata: Value) -> Value {
        json!({
            "hostName": host,
            "ipAddr": "10.0.0.1",
            "homePageUrl": format!("http://{}:8080/", host),
            "port": { "@enabled": "true", "$": 8080 },
            "securePort": { "@enabled": "false", "$": 8443 },
            "metadata": metadata
        })
    }

    #[test]
    fn test_normalize_single_application() {
        let raw = doc(json!({
            "applications": { "application": [{
                "name": "BILLING",
                "instance": [instance("billing-1", json!({
                    "description": "Billing service",
                    "consumes": "inventory:rest,audit",
                    "fdOwner": "team-payments"
                }))]
            }]}
        }));

        let result = normalize(&raw).unwrap();
        let app = &result["BILLING"];

        assert_eq!(app.name, "BILLING");
        assert_eq!(app.hosts.len(), 1);
        assert_eq!(app.hosts[0].host_name.as_deref(), Some("billing-1"));
        assert_eq!(app.hosts[0].ip_addr.as_deref(), Some("10.0.0.1"));
        assert_eq!(
            app.hosts[0].home_page_url.as_deref(),
            Some("http://billing-1:8080/")
        );
        assert_eq!(app.hosts[0].ports, vec![8080]);
        assert_eq!(
            app.consumes,
            vec![
                ConsumerDescriptor::new("INVENTORY", Some("rest".to_string())),
                ConsumerDescriptor::new("AUDIT", None),
            ]
        );
        assert_eq!(app.description(), Some("Billing service"));
        assert_eq!(app.owner(), Some("team-payments"));
    }

    #[test]
    fn test_one_host_per_instance() {
        let raw = doc(json!({
            "applications": { "application": [{
                "name": "BILLING",
                "instance": [
                    instance("billing-1", json!({})),
                    instance("billing-2", json!({})),
                    { "hostName": "billing-3" }
                ]
            }]}
        }));

        let result = normalize(&raw).unwrap();
        let hosts = &result["BILLING"].hosts;
        assert_eq!(hosts.len(), 3);
        assert_eq!(hosts[2].host_name.as_deref(), Some("billing-3"));
        assert!(hosts[2].ip_addr.is_none());
        assert!(hosts[2].ports.is_empty());
    }

    #[test]
    fn test_both_ports_enabled_in_order() {
        let raw = doc(json!({
            "applications": { "application": [{
                "name": "GATEWAY",
                "instance": [{
                    "securePort": { "@enabled": "true", "$": 8443 },
                    "port": { "@enabled": "true", "$": 8080 }
                }]
            }]}
        }));

        let result = normalize(&raw).unwrap();
        assert_eq!(result["GATEWAY"].hosts[0].ports, vec![8080, 8443]);
    }

    #[test]
    fn test_out_of_range_port_only_drops_that_port() {
        let raw = doc(json!({
            "applications": { "application": [
                { "name": "GOOD", "instance": [instance("good-1", json!({}))] },
                { "name": "ODD", "instance": [{
                    "hostName": 4711,
                    "port": { "@enabled": "false", "$": 70000 },
                    "securePort": { "@enabled": "true", "$": 99999 }
                }]}
            ]}
        }));

        let result = normalize(&raw).unwrap();
        assert_eq!(result["GOOD"].hosts[0].ports, vec![8080]);
        assert_eq!(result["ODD"].hosts[0].host_name.as_deref(), Some("4711"));
        assert!(result["ODD"].hosts[0].ports.is_empty());
    }

    #[test]
    fn test_metadata_whitelist() {
        let raw = doc(json!({
            "applications": { "application": [{
                "name": "BILLING",
                "instance": [instance("billing-1", json!({
                    "description": "x",
                    "secretInternalField": "y",
                    "tags": ["payments", "core"],
                    "ignoredCommitters": ["bot"]
                }))]
            }]}
        }));

        let result = normalize(&raw).unwrap();
        let metadata = &result["BILLING"].metadata;

        assert_eq!(metadata.get("description"), Some(&json!("x")));
        assert_eq!(metadata.get("tags"), Some(&json!(["payments", "core"])));
        assert_eq!(metadata.get("ignoredCommitters"), Some(&json!(["bot"])));
        assert!(!metadata.contains_key("secretInternalField"));
        assert!(!metadata.contains_key("consumes"));
        assert!(!metadata.contains_key("networkZone"));
    }

    #[test]
    fn test_first_instance_metadata_wins() {
        let raw = doc(json!({
            "applications": { "application": [{
                "name": "BILLING",
                "instance": [
                    instance("billing-1", json!({ "description": "first" })),
                    instance("billing-2", json!({
                        "description": "second",
                        "networkZone": "dmz",
                        "consumes": "inventory"
                    }))
                ]
            }]}
        }));

        let result = normalize(&raw).unwrap();
        let app = &result["BILLING"];
        assert_eq!(app.description(), Some("first"));
        assert_eq!(app.network_zone(), None);
        assert!(app.consumes.is_empty());
    }

    #[test]
    fn test_missing_metadata_is_empty() {
        let raw = doc(json!({
            "applications": { "application": [{
                "name": "BARE",
                "instance": [{ "hostName": "bare-1" }]
            }]}
        }));

        let result = normalize(&raw).unwrap();
        assert!(result["BARE"].metadata.is_empty());
        assert!(result["BARE"].consumes.is_empty());
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let raw = doc(json!({
            "applications": { "application": [
                { "name": "BILLING", "instance": [instance("old", json!({ "description": "old" }))] },
                { "name": "INVENTORY", "instance": [instance("inv", json!({}))] },
                { "name": "BILLING", "instance": [instance("new", json!({ "description": "new" }))] }
            ]}
        }));

        let result = normalize(&raw).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result["BILLING"].description(), Some("new"));
        assert_eq!(result["BILLING"].hosts[0].host_name.as_deref(), Some("new"));
    }

    #[test]
    fn test_missing_wrappers_produce_empty_result() {
        for value in [
            json!({}),
            json!({ "applications": {} }),
            json!({ "applications": { "application": [] } }),
        ] {
            assert!(normalize(&doc(value)).unwrap().is_empty());
        }
    }

    #[test]
    fn test_application_without_instances_is_malformed() {
        for value in [
            json!({ "applications": { "application": [{ "name": "EMPTY", "instance": [] }] } }),
            json!({ "applications": { "application": [{ "name": "EMPTY" }] } }),
        ] {
            let err = normalize(&doc(value)).unwrap_err();
            assert!(matches!(err, RegistryError::MalformedDocument { .. }));
            assert!(err.to_string().contains("EMPTY"));
        }
    }

    #[test]
    fn test_application_without_name_is_malformed() {
        let raw = doc(json!({
            "applications": { "application": [
                { "instance": [instance("anon", json!({}))] }
            ]}
        }));

        let err = normalize(&raw).unwrap_err();
        assert_eq!(
            err,
            RegistryError::malformed("application at index 0 has no name")
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = doc(json!({
            "applications": { "application": [
                { "name": "A", "instance": [instance("a", json!({ "consumes": "b:rest", "tags": "x" }))] },
                { "name": "B", "instance": [instance("b", json!({}))] }
            ]}
        }));

        assert_eq!(normalize(&raw).unwrap(), normalize(&raw).unwrap());
    }

    #[test]
    fn test_non_string_consumes_value() {
        let raw = doc(json!({
            "applications": { "application": [{
                "name": "A",
                "instance": [instance("a", json!({ "consumes": 42 }))]
            }]}
        }));

        let result = normalize(&raw).unwrap();
        assert_eq!(result["A"].consumes, vec![ConsumerDescriptor::new("42", None)]);
    }

    #[parameterized(
        target_and_type = { "billing:rest", &[("BILLING", Some("rest"))] },
        target_only = { "inventory", &[("INVENTORY", None)] },
        mixed = { "billing:rest,inventory", &[("BILLING", Some("rest")), ("INVENTORY", None)] },
        whitespace = { " billing : jms , inventory ", &[("BILLING", Some("jms")), ("INVENTORY", None)] },
        three_parts = { "billing:rest:v2", &[("BILLING", None)] },
        empty_type = { "billing:", &[("BILLING", None)] },
        empty_input = { "", &[] },
        only_separators = { ",:,", &[] },
        empty_entries = { "a,,b", &[("A", None), ("B", None)] },
    )]
    fn test_parse_consumers(input: &str, expected: &[(&str, Option<&str>)]) {
        let expected: Vec<ConsumerDescriptor> = expected
            .iter()
            .map(|(target, kind)| ConsumerDescriptor::new(*target, kind.map(str::to_string)))
            .collect();

        assert_eq!(parse_consumers(input), expected);
    }

    #[test]
    fn test_project_metadata_preserves_values_verbatim() {
        let mut metadata = Map::new();
        metadata.insert("monitoringLink".to_string(), json!({ "grafana": "http://g" }));
        metadata.insert("ipAddress".to_string(), json!(null));

        let projected = project_metadata(&metadata);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected["monitoringLink"], json!({ "grafana": "http://g" }));
        assert_eq!(projected["ipAddress"], Value::Null);
    }
}
