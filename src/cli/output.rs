//! Output formatting for multiple formats
//!
//! Renders stage result sets, stage lists and configuration as JSON, YAML or
//! human-readable text.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::config::SvcatlasConfig;
use crate::registry::{NormalizedApplication, StageResultSet};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Output formatter for registry results
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats normalized applications grouped by stage
    pub fn format_services(&self, stages: &BTreeMap<String, &StageResultSet>) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(stages)
                .context("Failed to serialize applications to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(stages).context("Failed to serialize applications to YAML")
            }
            OutputFormat::Human => Ok(self.format_services_human(stages)),
        }
    }

    /// Formats the list of configured stages
    pub fn format_stages(&self, stages: &BTreeSet<String>) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(stages).context("Failed to serialize stages to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(stages).context("Failed to serialize stages to YAML")
            }
            OutputFormat::Human => {
                if stages.is_empty() {
                    return Ok("No stages configured.\n".to_string());
                }
                let mut out = String::new();
                for stage in stages {
                    let _ = writeln!(out, "{}", stage);
                }
                Ok(out)
            }
        }
    }

    /// Formats configuration display
    pub fn format_config(&self, config: &SvcatlasConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")
            }
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn format_services_human(&self, stages: &BTreeMap<String, &StageResultSet>) -> String {
        let mut out = String::new();

        for (stage, applications) in stages {
            let _ = writeln!(
                out,
                "Stage: {} ({} application{})",
                stage,
                applications.len(),
                if applications.len() == 1 { "" } else { "s" }
            );
            let _ = writeln!(out, "{}", "=".repeat(60));

            if applications.is_empty() {
                let _ = writeln!(out, "  (no applications)");
            }

            for app in applications.values() {
                format_application_human(&mut out, app);
            }
            out.push('\n');
        }

        out
    }
}

/// Metadata keys rendered as dedicated summary lines
const SUMMARY_KEYS: &[&str] = &[
    "description",
    "fdOwner",
    "bitbucketUrl",
    "microserviceUrl",
    "networkZone",
];

fn format_application_human(out: &mut String, app: &NormalizedApplication) {
    match app.description() {
        Some(description) => {
            let _ = writeln!(out, "\n  {} - {}", app.name, description);
        }
        None => {
            let _ = writeln!(out, "\n  {}", app.name);
        }
    }

    let summary = [
        ("owner", app.owner()),
        ("repository", app.repository_url()),
        ("url", app.microservice_url()),
        ("network zone", app.network_zone()),
    ];
    for (label, value) in summary {
        if let Some(value) = value {
            let _ = writeln!(out, "    {}: {}", label, value);
        }
    }

    let ports: BTreeSet<u16> = app.all_ports().collect();
    if !ports.is_empty() {
        let ports: Vec<String> = ports.iter().map(u16::to_string).collect();
        let _ = writeln!(out, "    ports: {}", ports.join(", "));
    }

    for (key, value) in &app.metadata {
        if SUMMARY_KEYS.contains(&key.as_str()) && value.is_string() {
            continue;
        }
        let rendered = match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        let _ = writeln!(out, "    {}: {}", key, rendered);
    }

    if !app.hosts.is_empty() {
        let _ = writeln!(out, "    hosts:");
        for host in &app.hosts {
            let name = host
                .host_name
                .as_deref()
                .or(host.ip_addr.as_deref())
                .unwrap_or("<unknown>");
            let ports: Vec<String> = host.ports.iter().map(u16::to_string).collect();
            let mut line = format!("      - {}", name);
            if let (Some(_), Some(ip)) = (&host.host_name, &host.ip_addr) {
                let _ = write!(line, " ({})", ip);
            }
            if !ports.is_empty() {
                let _ = write!(line, " ports: {}", ports.join(", "));
            }
            let _ = writeln!(out, "{}", line);
        }
    }

    if !app.consumes.is_empty() {
        let consumers: Vec<String> = app
            .consumes
            .iter()
            .map(|c| match &c.kind {
                Some(kind) => format!("{} ({})", c.target, kind),
                None => c.target.clone(),
            })
            .collect();
        let _ = writeln!(out, "    consumes: {}", consumers.join(", "));
    }
}
