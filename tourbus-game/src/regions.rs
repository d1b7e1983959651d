//! Region catalog and travel graph.
use serde::{Deserialize, Serialize};
use std::fmt;

const DEFAULT_REGION_DATA: &str = include_str!("../assets/regions.json");

/// Identifier of a tour region, e.g. `"midwest"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RegionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RegionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<RegionId> for String {
    fn from(value: RegionId) -> Self {
        value.0
    }
}

impl AsRef<str> for RegionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub id: RegionId,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub neighbors: Vec<RegionId>,
}

/// Static region catalog. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RegionGraph {
    #[serde(default)]
    pub regions: Vec<RegionInfo>,
}

impl RegionGraph {
    /// Parse a region catalog.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error for malformed documents.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_REGION_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn default_graph() -> Self {
        Self::load_from_static()
    }

    #[must_use]
    pub fn get(&self, id: &RegionId) -> Option<&RegionInfo> {
        self.regions.iter().find(|region| &region.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &RegionId) -> bool {
        self.get(id).is_some()
    }

    /// Adjacent regions, or an empty slice for unknown ids.
    #[must_use]
    pub fn neighbors(&self, id: &RegionId) -> &[RegionId] {
        self.get(id)
            .map(|region| region.neighbors.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn can_travel(&self, from: &RegionId, to: &RegionId) -> bool {
        self.neighbors(from).contains(to)
    }

    pub fn ids(&self) -> impl Iterator<Item = &RegionId> {
        self.regions.iter().map(|region| &region.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_graph_loads() {
        let graph = RegionGraph::default_graph();
        assert_eq!(graph.regions.len(), 5);
        let midwest = graph.get(&RegionId::from("midwest")).expect("midwest");
        assert_eq!(midwest.name, "Midwest");
        assert!(graph.contains(&RegionId::from("west")));
        assert!(!graph.contains(&RegionId::from("atlantis")));
    }

    #[test]
    fn bundled_adjacency_is_symmetric_and_closed() {
        let graph = RegionGraph::default_graph();
        for id in graph.ids() {
            for neighbor in graph.neighbors(id) {
                assert!(graph.contains(neighbor), "{id} lists unknown {neighbor}");
                assert!(
                    graph.can_travel(neighbor, id),
                    "{neighbor} does not link back to {id}"
                );
            }
        }
    }

    #[test]
    fn unknown_regions_have_no_neighbors() {
        let graph = RegionGraph::default_graph();
        let nowhere = RegionId::new("nowhere");
        assert!(graph.neighbors(&nowhere).is_empty());
        assert!(!graph.can_travel(&nowhere, &RegionId::from("midwest")));
    }

    #[test]
    fn region_id_serializes_as_plain_string() {
        let id = RegionId::from("south");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"south\"");
        assert_eq!(String::from(id), "south");
    }
}
