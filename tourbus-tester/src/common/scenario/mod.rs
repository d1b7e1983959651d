pub mod catalog;

use std::path::Path;

use crate::logic::SessionPlan;
use catalog::{CATALOG, CatalogEntry};

/// A named plan ready to run.
#[derive(Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: String,
    pub description: &'static str,
    pub plan: SessionPlan,
}

impl TestScenario {
    fn from_entry(entry: &CatalogEntry, save_dir: Option<&Path>) -> Self {
        let mut plan = (entry.build)();
        if plan.persist {
            plan.save_dir = save_dir.map(Path::to_path_buf);
        }
        Self {
            key: entry.key,
            name: entry.name.to_string(),
            description: entry.description,
            plan,
        }
    }
}

/// Look up a scenario by CLI key. Persistence scenarios write to `save_dir`
/// when given, otherwise to memory.
pub fn get_scenario(key: &str, save_dir: Option<&Path>) -> Option<TestScenario> {
    CATALOG
        .iter()
        .find(|entry| entry.key == key)
        .map(|entry| TestScenario::from_entry(entry, save_dir))
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    let mut listed: Vec<_> = CATALOG
        .iter()
        .map(|entry| (entry.key, entry.description))
        .collect();
    listed.push(("all", "Run every scenario above"));
    listed
}

/// Expand `all` into every catalog key, keeping explicit keys first and
/// dropping duplicates.
pub fn expand_scenarios(requested: &[String]) -> Vec<String> {
    let mut scenarios: Vec<String> = Vec::new();
    let mut push = |key: &str| {
        if !scenarios.iter().any(|existing| existing == key) {
            scenarios.push(key.to_string());
        }
    };
    for key in requested.iter().filter(|key| *key != "all") {
        push(key.as_str());
    }
    if requested.iter().any(|key| key == "all") {
        for entry in CATALOG {
            push(entry.key);
        }
    }
    scenarios
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_key_resolves() {
        for (key, description) in list_scenarios() {
            assert!(!description.is_empty());
            if key != "all" {
                assert!(get_scenario(key, None).is_some(), "missing {key}");
            }
        }
        assert!(get_scenario("nope", None).is_none());
    }

    #[test]
    fn all_expands_without_duplicates() {
        let requested = vec!["save-roundtrip".to_string(), "all".to_string()];
        let expanded = expand_scenarios(&requested);
        assert_eq!(expanded[0], "save-roundtrip");
        assert_eq!(expanded.len(), CATALOG.len());
        assert!(!expanded.iter().any(|key| key == "all"));
    }

    #[test]
    fn save_dir_only_reaches_persistent_plans() {
        let dir = Path::new("target/saves");
        let save = get_scenario("save-roundtrip", Some(dir)).unwrap();
        assert_eq!(save.plan.save_dir.as_deref(), Some(dir));
        let smoke = get_scenario("smoke", Some(dir)).unwrap();
        assert!(smoke.plan.save_dir.is_none());
    }
}
