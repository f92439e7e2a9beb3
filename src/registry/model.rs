//! Normalized per-application domain types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Normalized applications of one stage, keyed and ordered by application name
pub type StageResultSet = BTreeMap<String, NormalizedApplication>;

/// Stable per-application summary built from registry instances
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedApplication {
    pub name: String,

    /// One descriptor per registered instance, in document order
    pub hosts: Vec<HostDescriptor>,

    /// Services this application declares it consumes
    pub consumes: Vec<ConsumerDescriptor>,

    /// Whitelisted metadata, keyed by the registry's metadata keys
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
}

/// Network location of a single instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_addr: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_page_url: Option<String>,

    /// Enabled ports; plain port first, then secure port
    pub ports: Vec<u16>,
}

/// A declared dependency on another service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerDescriptor {
    /// Target service name, upper-cased
    pub target: String,

    /// Communication type such as `rest` or `jms`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ConsumerDescriptor {
    pub fn new(target: impl Into<String>, kind: Option<String>) -> Self {
        Self {
            target: target.into(),
            kind,
        }
    }
}

impl NormalizedApplication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.metadata_str("description")
    }

    pub fn repository_url(&self) -> Option<&str> {
        self.metadata_str("bitbucketUrl")
    }

    pub fn owner(&self) -> Option<&str> {
        self.metadata_str("fdOwner")
    }

    pub fn microservice_url(&self) -> Option<&str> {
        self.metadata_str("microserviceUrl")
    }

    pub fn network_zone(&self) -> Option<&str> {
        self.metadata_str("networkZone")
    }

    /// All enabled ports across every instance
    pub fn all_ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.hosts.iter().flat_map(|host| host.ports.iter().copied())
    }
}
