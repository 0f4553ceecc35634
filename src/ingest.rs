//! Turns a parsed JSON document into a validated [`Dataset`].
//!
//! Spreadsheet exports carry numbers as strings and occasionally blanks. How
//! those are handled is decided by [`CoercionPolicy`]; everything downstream
//! receives plain `f64` values.

use crate::errors::StatsError;
use crate::models::{Dataset, DayWeights, EntityGroups, RawEntity};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

const ENTITY_KEYS: [&str; 2] = ["entities", "garages"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoercionPolicy {
    /// Non-numeric entries count as `0`.
    #[default]
    Lenient,
    /// Non-numeric entries reject the dataset.
    Strict,
}

impl FromStr for CoercionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lenient" | "zero" => Ok(Self::Lenient),
            "strict" | "reject" => Ok(Self::Strict),
            other => Err(format!("unknown coercion policy '{other}' (expected 'lenient' or 'strict')")),
        }
    }
}

pub fn parse_slice(bytes: &[u8], policy: CoercionPolicy) -> Result<Dataset, StatsError> {
    let document: Value =
        serde_json::from_slice(bytes).map_err(|err| StatsError::MalformedDataset(format!("invalid JSON: {err}")))?;
    parse_document(&document, policy)
}

pub fn parse_document(document: &Value, policy: CoercionPolicy) -> Result<Dataset, StatsError> {
    let root = document
        .as_object()
        .ok_or_else(|| StatsError::MalformedDataset("document must be a JSON object".into()))?;

    let target = parse_target(root)?;
    let day_weights = parse_day_weights(root, policy)?;
    let last_updated = match root.get("lastUpdated") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    };

    let groups = match root.get("branches") {
        Some(Value::Object(branches)) => {
            let mut parsed = BTreeMap::new();
            for (branch, sub_document) in branches {
                let sub_document = sub_document.as_object().ok_or_else(|| {
                    StatsError::MalformedDataset(format!("branch '{branch}' must be a JSON object"))
                })?;
                parsed.insert(branch.clone(), parse_entity_list(sub_document, policy)?);
            }
            EntityGroups::Branches(parsed)
        }
        Some(_) => return Err(StatsError::MalformedDataset("'branches' must be a JSON object".into())),
        None => EntityGroups::Flat(parse_entity_list(root, policy)?),
    };

    Ok(Dataset {
        target,
        day_weights,
        last_updated,
        groups,
    })
}

fn parse_target(root: &Map<String, Value>) -> Result<f64, StatsError> {
    let value = root
        .get("target")
        .ok_or_else(|| StatsError::MalformedDataset("missing 'target'".into()))?;
    let target = numeric(value).ok_or(StatsError::InvalidTarget(f64::NAN))?;
    if target <= 0.0 {
        return Err(StatsError::InvalidTarget(target));
    }
    Ok(target)
}

fn parse_day_weights(root: &Map<String, Value>, policy: CoercionPolicy) -> Result<DayWeights, StatsError> {
    let mut weights = DayWeights::new();
    match root.get("dayWeights") {
        Some(Value::Object(entries)) => {
            for (key, value) in entries {
                let day = key
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|day| *day >= 1)
                    .ok_or_else(|| StatsError::MalformedDataset(format!("day weight key '{key}' is not a day number")))?;
                if weights.insert(day, weight(value, day, policy)?).is_some() {
                    return Err(StatsError::MalformedDataset(format!(
                        "day weight key '{key}' repeats day {day}"
                    )));
                }
            }
        }
        Some(Value::Array(entries)) => {
            for (index, value) in entries.iter().enumerate() {
                let day = array_day(index)?;
                weights.insert(day, weight(value, day, policy)?);
            }
        }
        Some(_) => {
            return Err(StatsError::MalformedDataset(
                "'dayWeights' must be an object or an array".into(),
            ));
        }
        None => return Err(StatsError::MalformedDataset("missing 'dayWeights'".into())),
    }
    Ok(weights)
}

/// 1-based day for a position in an array of weights.
fn array_day(index: usize) -> Result<u32, StatsError> {
    index
        .checked_add(1)
        .and_then(|day| u32::try_from(day).ok())
        .ok_or_else(|| StatsError::MalformedDataset(format!("'dayWeights' has more than {} entries", u32::MAX)))
}

fn weight(value: &Value, day: u32, policy: CoercionPolicy) -> Result<f64, StatsError> {
    match (numeric(value), policy) {
        (Some(weight), _) => Ok(weight),
        (None, CoercionPolicy::Lenient) => {
            warn!("day {day} weight {value} is not numeric, counting it as 0");
            Ok(0.0)
        }
        (None, CoercionPolicy::Strict) => Err(StatsError::MalformedDataset(format!(
            "day {day} weight {value} is not numeric"
        ))),
    }
}

fn parse_entity_list(container: &Map<String, Value>, policy: CoercionPolicy) -> Result<Vec<RawEntity>, StatsError> {
    let list = ENTITY_KEYS
        .iter()
        .find_map(|key| container.get(*key))
        .ok_or_else(|| StatsError::MalformedDataset("missing 'entities' list".into()))?
        .as_array()
        .ok_or_else(|| StatsError::MalformedDataset("'entities' must be an array".into()))?;

    list.iter()
        .enumerate()
        .map(|(position, value)| parse_entity(position, value, policy))
        .collect()
}

fn parse_entity(position: usize, value: &Value, policy: CoercionPolicy) -> Result<RawEntity, StatsError> {
    let unnamed = || format!("#{}", position + 1);
    let object = value.as_object().ok_or_else(|| StatsError::MalformedEntity {
        entity: unnamed(),
        reason: "entry must be a JSON object".into(),
    })?;

    let name = match object.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        _ => {
            return Err(StatsError::MalformedEntity {
                entity: unnamed(),
                reason: "missing 'name'".into(),
            });
        }
    };

    let account = match object.get("account").or_else(|| object.get("id")) {
        Some(Value::String(account)) => account.clone(),
        Some(Value::Number(account)) => account.to_string(),
        _ => String::new(),
    };

    let raw_spend = match object.get("dailySpend") {
        Some(Value::Array(values)) => values,
        _ => {
            return Err(StatsError::MalformedEntity {
                entity: name,
                reason: "'dailySpend' must be an array".into(),
            });
        }
    };

    let mut daily_spend = Vec::with_capacity(raw_spend.len());
    let mut coerced = 0usize;
    for (index, value) in raw_spend.iter().enumerate() {
        match (numeric(value), policy) {
            (Some(amount), _) => daily_spend.push(amount),
            (None, CoercionPolicy::Lenient) => {
                coerced += 1;
                daily_spend.push(0.0);
            }
            (None, CoercionPolicy::Strict) => {
                return Err(StatsError::MalformedEntity {
                    entity: name,
                    reason: format!("day {} spend {value} is not numeric", index + 1),
                });
            }
        }
    }
    if coerced > 0 {
        warn!("{coerced} non-numeric spend values for '{name}' counted as 0");
    }

    Ok(RawEntity {
        name,
        account,
        daily_spend,
    })
}

/// Finite number from a JSON number or a numeric string.
fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayWindow;
    use serde_json::json;

    fn flat(spend: Value) -> Value {
        json!({
            "target": 1000,
            "dayWeights": { "1": 1, "2": "0.5", "3": 1 },
            "lastUpdated": "2025-06-08T18:00:00Z",
            "entities": [
                { "name": "Main St", "account": "ACC-1", "dailySpend": spend }
            ]
        })
    }

    fn only_entities(dataset: &Dataset) -> &[RawEntity] {
        dataset.select(None).unwrap()
    }

    #[test]
    fn parses_flat_document() {
        let dataset = parse_document(&flat(json!([100, "200", 300.5])), CoercionPolicy::Strict).unwrap();
        assert_eq!(dataset.target, 1000.0);
        assert_eq!(dataset.last_updated, "2025-06-08T18:00:00Z");
        assert_eq!(dataset.day_weights.total_in(DayWindow::All), 2.5);
        assert!(!dataset.has_branches());

        let entities = only_entities(&dataset);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].account, "ACC-1");
        assert_eq!(entities[0].daily_spend, vec![100.0, 200.0, 300.5]);
    }

    #[test]
    fn lenient_policy_zeroes_non_numeric_spend() {
        let dataset = parse_document(&flat(json!([10, "n/a", null, ""])), CoercionPolicy::Lenient).unwrap();
        assert_eq!(only_entities(&dataset)[0].daily_spend, vec![10.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn strict_policy_rejects_non_numeric_spend() {
        let err = parse_document(&flat(json!([10, "n/a"])), CoercionPolicy::Strict).unwrap_err();
        assert_eq!(
            err,
            StatsError::MalformedEntity {
                entity: "Main St".into(),
                reason: "day 2 spend \"n/a\" is not numeric".into(),
            }
        );
    }

    #[test]
    fn non_array_spend_names_the_entity() {
        let err = parse_document(&flat(json!("100,200")), CoercionPolicy::Lenient).unwrap_err();
        assert!(matches!(err, StatsError::MalformedEntity { entity, .. } if entity == "Main St"));
    }

    #[test]
    fn missing_name_reports_position() {
        let document = json!({
            "target": 10,
            "dayWeights": {},
            "entities": [
                { "name": "ok", "dailySpend": [1] },
                { "account": "X", "dailySpend": [1] }
            ]
        });
        let err = parse_document(&document, CoercionPolicy::Lenient).unwrap_err();
        assert!(matches!(err, StatsError::MalformedEntity { entity, .. } if entity == "#2"));
    }

    #[test]
    fn parses_branches_with_array_weights() {
        let document = json!({
            "target": "20000",
            "dayWeights": [1, 1, "0.5"],
            "lastUpdated": 1717862400000u64,
            "branches": {
                "Dublin": { "garages": [ { "name": "Quay", "id": 42, "dailySpend": [1, 2] } ] },
                "Cork": { "garages": [] }
            }
        });
        let dataset = parse_document(&document, CoercionPolicy::Strict).unwrap();
        assert_eq!(dataset.target, 20000.0);
        assert_eq!(dataset.last_updated, "1717862400000");
        assert_eq!(dataset.day_weights.len(), 3);
        assert_eq!(dataset.day_weights.total_in(DayWindow::UpTo(2)), 2.0);
        assert_eq!(dataset.branch_names(), vec!["Cork", "Dublin"]);

        let dublin = dataset.select(Some("Dublin")).unwrap();
        assert_eq!(dublin[0].account, "42");
        assert!(dataset.select(Some("Cork")).unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_targets() {
        for target in [json!(0), json!(-5), json!("lots"), json!(null)] {
            let document = json!({ "target": target, "dayWeights": {}, "entities": [] });
            let err = parse_document(&document, CoercionPolicy::Lenient).unwrap_err();
            assert!(matches!(err, StatsError::InvalidTarget(_)), "{err}");
        }

        let document = json!({ "dayWeights": {}, "entities": [] });
        assert!(matches!(
            parse_document(&document, CoercionPolicy::Lenient),
            Err(StatsError::MalformedDataset(_))
        ));
    }

    #[test]
    fn weight_keys_must_be_day_numbers() {
        let document = json!({ "target": 10, "dayWeights": { "monday": 1 }, "entities": [] });
        assert!(matches!(
            parse_document(&document, CoercionPolicy::Lenient),
            Err(StatsError::MalformedDataset(_))
        ));

        let document = json!({ "target": 10, "dayWeights": { "0": 1 }, "entities": [] });
        assert!(parse_document(&document, CoercionPolicy::Lenient).is_err());
    }

    #[test]
    fn repeated_day_keys_are_rejected() {
        for duplicate in [" 1", "01"] {
            let document = format!(r#"{{"target": 10, "dayWeights": {{"1": 1, "{duplicate}": 2}}, "entities": []}}"#);
            let err = parse_slice(document.as_bytes(), CoercionPolicy::Lenient).unwrap_err();
            assert!(
                matches!(&err, StatsError::MalformedDataset(reason) if reason.contains("repeats day 1")),
                "{err}"
            );
        }
    }

    #[test]
    fn array_positions_beyond_u32_are_rejected() {
        assert_eq!(array_day(0), Ok(1));
        assert_eq!(array_day(u32::MAX as usize - 1), Ok(u32::MAX));
        assert!(matches!(array_day(usize::MAX), Err(StatsError::MalformedDataset(_))));
    }

    #[test]
    fn non_numeric_weight_follows_policy() {
        let document = json!({ "target": 10, "dayWeights": { "1": "x", "2": 2 }, "entities": [] });
        let dataset = parse_document(&document, CoercionPolicy::Lenient).unwrap();
        assert_eq!(dataset.day_weights.total_in(DayWindow::All), 2.0);
        assert!(parse_document(&document, CoercionPolicy::Strict).is_err());
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = parse_slice(b"{ not json", CoercionPolicy::Lenient).unwrap_err();
        assert!(matches!(err, StatsError::MalformedDataset(_)));
    }

    #[test]
    fn policy_from_str() {
        assert_eq!("strict".parse::<CoercionPolicy>(), Ok(CoercionPolicy::Strict));
        assert_eq!(" Lenient ".parse::<CoercionPolicy>(), Ok(CoercionPolicy::Lenient));
        assert!("maybe".parse::<CoercionPolicy>().is_err());
    }
}
