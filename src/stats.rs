use crate::errors::StatsError;
use crate::models::{DayWeights, DayWindow, EnrichedEntity, Eta, RawEntity};

/// Derive per-entity aggregates. Output order matches input order.
pub fn compute(
    entities: &[RawEntity],
    target: f64,
    weights: &DayWeights,
    window: DayWindow,
) -> Result<Vec<EnrichedEntity>, StatsError> {
    if !target.is_finite() || target <= 0.0 {
        return Err(StatsError::InvalidTarget(target));
    }

    let total_weight = weights.total_in(window);
    entities
        .iter()
        .map(|entity| enrich(entity, target, total_weight))
        .collect()
}

fn enrich(entity: &RawEntity, target: f64, total_weight: f64) -> Result<EnrichedEntity, StatsError> {
    let spend = &entity.daily_spend;
    let (highest_index, highest) = first_max(spend).ok_or_else(|| StatsError::EmptySeries {
        entity: entity.name.clone(),
    })?;
    let (lowest_index, lowest) = last_min(spend).ok_or_else(|| StatsError::EmptySeries {
        entity: entity.name.clone(),
    })?;

    let total: f64 = spend.iter().sum();
    let average = if total_weight > 0.0 { total / total_weight } else { 0.0 };

    Ok(EnrichedEntity {
        name: entity.name.clone(),
        account: entity.account.clone(),
        daily_spend: spend.clone(),
        total,
        average,
        highest,
        highest_day: highest_index + 1,
        lowest,
        lowest_day: lowest_index + 1,
        progress_percent: (total / target * 100.0).min(100.0),
        est_days_to_target: eta(target, total, average),
    })
}

fn eta(target: f64, total: f64, average: f64) -> Eta {
    if average <= 0.0 {
        return Eta::Unreachable;
    }
    // `as` saturates on overflow for very small averages.
    Eta::Days(((target - total) / average).ceil() as i64)
}

// Ties keep the earliest index.
fn first_max(values: &[f64]) -> Option<(usize, f64)> {
    values.iter().copied().enumerate().fold(None, |best, (index, value)| match best {
        Some((_, current)) if value <= current => best,
        _ => Some((index, value)),
    })
}

// Ties move to the latest index.
fn last_min(values: &[f64]) -> Option<(usize, f64)> {
    values.iter().copied().enumerate().fold(None, |best, (index, value)| match best {
        Some((_, current)) if value > current => best,
        _ => Some((index, value)),
    })
}
