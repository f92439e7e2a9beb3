//! Stage name to registry endpoint mapping

use super::error::RegistryError;
use std::collections::{BTreeMap, BTreeSet};

/// Immutable mapping from stage name to registry URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageRegistry {
    urls: BTreeMap<String, String>,
}

impl StageRegistry {
    pub fn new(urls: BTreeMap<String, String>) -> Self {
        Self { urls }
    }

    /// Returns the registry URL configured for `stage`
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownStage`] if the stage is not configured.
    pub fn resolve_url(&self, stage: &str) -> Result<&str, RegistryError> {
        self.urls
            .get(stage)
            .map(String::as_str)
            .ok_or_else(|| RegistryError::UnknownStage {
                stage: stage.to_string(),
            })
    }

    /// All configured stage names
    pub fn list_stages(&self) -> BTreeSet<String> {
        self.urls.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for StageRegistry
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(stage, url)| (stage.into(), url.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> StageRegistry {
        [
            ("dev", "http://dev-registry/eureka/apps"),
            ("prod", "http://prod-registry/eureka/apps"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_resolve_known_stage() {
        let registry = registry();
        assert_eq!(
            registry.resolve_url("prod").unwrap(),
            "http://prod-registry/eureka/apps"
        );
    }

    #[test]
    fn test_resolve_unknown_stage() {
        let err = registry().resolve_url("nosuchstage").unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownStage {
                stage: "nosuchstage".to_string()
            }
        );
    }

    #[test]
    fn test_stage_names_are_case_sensitive() {
        assert!(registry().resolve_url("PROD").is_err());
    }

    #[test]
    fn test_list_stages() {
        let stages = registry().list_stages();
        assert_eq!(
            stages.into_iter().collect::<Vec<_>>(),
            vec!["dev".to_string(), "prod".to_string()]
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = StageRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.list_stages().is_empty());
        assert!(registry.resolve_url("dev").is_err());
    }
}
