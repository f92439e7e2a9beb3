//! Typed representation of the raw registry payload
//!
//! The registry serves a Eureka-style directory listing:
//!
//! ```text
//! { "applications": { "application": [
//!     { "name": "BILLING",
//!       "instance": [
//!         { "hostName": "...", "ipAddr": "...", "homePageUrl": "...",
//!           "port": { "@enabled": "true", "$": 8080 },
//!           "securePort": { "@enabled": "false", "$": 443 },
//!           "metadata": { "consumes": "inventory:rest", ... } } ] } ] } }
//! ```
//!
//! Every node is optional at this layer. Deciding which absences are fatal is
//! the normalizer's job. Structural nodes (`applications`, `application`,
//! `name`, `instance`, `metadata`) are decoded strictly, so a document of the
//! wrong shape fails with a `Category::Data` error. Leaf values of a single
//! instance (host fields, port numbers) are decoded leniently: an odd value
//! only loses that value, never the stage.
//!
//! Registries that convert from XML emit a bare object instead of a one-element
//! array for `application` and `instance`; both forms are accepted.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Root of a registry response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRegistryDocument {
    #[serde(default)]
    pub applications: Option<ApplicationsNode>,
}

/// The `applications` wrapper node
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApplicationsNode {
    #[serde(default)]
    pub application: Option<OneOrMany<RawApplication>>,
}

/// One registered application with its instances
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawApplication {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub instance: Option<OneOrMany<InstanceRecord>>,
}

/// One running instance of an application
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub host_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub ip_addr: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub home_page_url: Option<String>,

    #[serde(default)]
    pub port: Option<PortRecord>,

    #[serde(default)]
    pub secure_port: Option<PortRecord>,

    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// A declared port; `@enabled` is kept untyped so non-string flags can be rejected
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PortRecord {
    #[serde(rename = "@enabled", default)]
    pub enabled: Option<Value>,

    #[serde(rename = "$", default)]
    pub value: Option<Value>,
}

impl PortRecord {
    /// Enabled port number; only the literal string `"true"` counts as enabled
    ///
    /// The value may be a number or a numeric string; anything outside the
    /// `u16` range is treated as absent.
    pub fn enabled_port(&self) -> Option<u16> {
        match &self.enabled {
            Some(Value::String(flag)) if flag == "true" => {}
            _ => return None,
        }

        let port = match self.value.as_ref()? {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.trim().parse::<u64>().ok(),
            _ => None,
        }?;
        u16::try_from(port).ok()
    }
}

// Scalars become text, anything else is treated as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

/// Array node that registries sometimes collapse to a single object
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => std::slice::from_ref(item),
        }
    }
}

impl RawRegistryDocument {
    /// Parses a registry response body
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Applications listed in the document, empty when any wrapper node is absent
    pub fn applications(&self) -> &[RawApplication] {
        self.applications
            .as_ref()
            .and_then(|node| node.application.as_ref())
            .map(OneOrMany::as_slice)
            .unwrap_or_default()
    }
}

impl RawApplication {
    pub fn instances(&self) -> &[InstanceRecord] {
        self.instance
            .as_ref()
            .map(OneOrMany::as_slice)
            .unwrap_or_default()
    }
}
