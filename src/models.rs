use crate::errors::StatsError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Weight per 1-based day index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayWeights {
    weights: BTreeMap<u32, f64>,
}

impl DayWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the weight previously stored for `day`, if any.
    pub fn insert(&mut self, day: u32, weight: f64) -> Option<f64> {
        self.weights.insert(day, weight)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of the weights for the days inside `window`.
    pub fn total_in(&self, window: DayWindow) -> f64 {
        self.weights
            .iter()
            .filter(|(day, _)| window.contains(**day))
            .map(|(_, weight)| weight)
            .sum()
    }
}

impl FromIterator<(u32, f64)> for DayWeights {
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

/// Which weighted days count as elapsed when averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayWindow {
    All,
    UpTo(u32),
}

impl DayWindow {
    pub fn contains(self, day: u32) -> bool {
        match self {
            DayWindow::All => true,
            DayWindow::UpTo(last) => day <= last,
        }
    }
}

impl fmt::Display for DayWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayWindow::All => f.write_str("all"),
            DayWindow::UpTo(day) => write!(f, "day {day}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    pub name: String,
    pub account: String,
    pub daily_spend: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityGroups {
    Flat(Vec<RawEntity>),
    Branches(BTreeMap<String, Vec<RawEntity>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub target: f64,
    pub day_weights: DayWeights,
    pub last_updated: String,
    pub groups: EntityGroups,
}

impl Dataset {
    /// Branch names in sorted order; empty for flat datasets.
    pub fn branch_names(&self) -> Vec<String> {
        match &self.groups {
            EntityGroups::Flat(_) => Vec::new(),
            EntityGroups::Branches(branches) => branches.keys().cloned().collect(),
        }
    }

    pub fn has_branches(&self) -> bool {
        matches!(self.groups, EntityGroups::Branches(_))
    }

    pub fn entity_count(&self) -> usize {
        match &self.groups {
            EntityGroups::Flat(entities) => entities.len(),
            EntityGroups::Branches(branches) => branches.values().map(Vec::len).sum(),
        }
    }

    /// Entities of the active group. Flat datasets ignore `branch`.
    pub fn select(&self, branch: Option<&str>) -> Result<&[RawEntity], StatsError> {
        match (&self.groups, branch) {
            (EntityGroups::Flat(entities), _) => Ok(entities.as_slice()),
            (EntityGroups::Branches(branches), Some(name)) => branches
                .get(name)
                .map(Vec::as_slice)
                .ok_or_else(|| StatsError::UnknownBranch(name.to_string())),
            (EntityGroups::Branches(_), None) => Err(StatsError::UnknownBranch(String::new())),
        }
    }
}

/// Projected days until the target is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    Days(i64),
    Unreachable,
}

impl Eta {
    pub const UNREACHABLE_TAG: &'static str = "unreachable";
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::Days(days) => write!(f, "{days}"),
            Eta::Unreachable => f.write_str("∞"),
        }
    }
}

impl Serialize for Eta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Eta::Days(days) => serializer.serialize_i64(*days),
            Eta::Unreachable => serializer.serialize_str(Self::UNREACHABLE_TAG),
        }
    }
}

impl<'de> Deserialize<'de> for Eta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Days(i64),
            Tag(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Days(days) => Ok(Eta::Days(days)),
            Wire::Tag(tag) if tag == Self::UNREACHABLE_TAG || tag == "∞" => Ok(Eta::Unreachable),
            Wire::Tag(tag) => Err(serde::de::Error::custom(format!("invalid eta '{tag}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedEntity {
    pub name: String,
    pub account: String,
    pub daily_spend: Vec<f64>,
    pub total: f64,
    pub average: f64,
    pub highest: f64,
    pub highest_day: usize,
    pub lowest: f64,
    pub lowest_day: usize,
    pub progress_percent: f64,
    pub est_days_to_target: Eta,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub branch: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub branch: Option<String>,
    pub sort: String,
    pub last_updated: String,
    pub target: f64,
    pub entities: Vec<EnrichedEntity>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchesResponse {
    pub branches: Vec<String>,
    pub last_updated: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub generation: u64,
    pub applied: bool,
    pub branches: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str) -> RawEntity {
        RawEntity {
            name: name.to_string(),
            account: format!("acc-{name}"),
            daily_spend: vec![1.0],
        }
    }

    #[test]
    fn window_limits_weight_total() {
        let weights: DayWeights = [(1, 1.0), (2, 0.5), (9, 2.0), (12, 1.0)].into_iter().collect();
        assert_eq!(weights.total_in(DayWindow::All), 4.5);
        assert_eq!(weights.total_in(DayWindow::UpTo(8)), 1.5);
        assert_eq!(weights.total_in(DayWindow::UpTo(0)), 0.0);
    }

    #[test]
    fn select_branch_by_name() {
        let mut branches = BTreeMap::new();
        branches.insert("north".to_string(), vec![entity("a"), entity("b")]);
        branches.insert("east".to_string(), vec![entity("c")]);
        let dataset = Dataset {
            target: 100.0,
            day_weights: DayWeights::new(),
            last_updated: String::new(),
            groups: EntityGroups::Branches(branches),
        };

        assert_eq!(dataset.branch_names(), vec!["east", "north"]);
        assert_eq!(dataset.select(Some("north")).unwrap().len(), 2);
        assert_eq!(dataset.entity_count(), 3);
        assert!(matches!(
            dataset.select(Some("west")),
            Err(StatsError::UnknownBranch(name)) if name == "west"
        ));
        assert!(dataset.select(None).is_err());
    }

    #[test]
    fn flat_dataset_ignores_branch() {
        let dataset = Dataset {
            target: 100.0,
            day_weights: DayWeights::new(),
            last_updated: String::new(),
            groups: EntityGroups::Flat(vec![entity("a")]),
        };
        assert!(dataset.branch_names().is_empty());
        assert_eq!(dataset.select(Some("anything")).unwrap().len(), 1);
    }

    #[test]
    fn eta_wire_format() {
        assert_eq!(serde_json::to_string(&Eta::Days(-3)).unwrap(), "-3");
        assert_eq!(serde_json::to_string(&Eta::Unreachable).unwrap(), "\"unreachable\"");
        let parsed: Eta = serde_json::from_str("\"unreachable\"").unwrap();
        assert_eq!(parsed, Eta::Unreachable);
        assert!(serde_json::from_str::<Eta>("\"soon\"").is_err());
        assert_eq!(Eta::Unreachable.to_string(), "∞");
    }
}
