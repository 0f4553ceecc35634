use crate::errors::StatsError;
use crate::models::{EnrichedEntity, Eta};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    ProgressPercent,
    Average,
    EstDaysToTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A sort selection as offered by the dashboard, e.g. `percent-desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: Direction,
}

impl SortOrder {
    pub const DEFAULT: SortOrder = SortOrder {
        key: SortKey::ProgressPercent,
        direction: Direction::Descending,
    };

    /// Selector values in the order the dashboard lists them.
    pub const CHOICES: [SortOrder; 6] = [
        SortOrder::new(SortKey::ProgressPercent, Direction::Descending),
        SortOrder::new(SortKey::ProgressPercent, Direction::Ascending),
        SortOrder::new(SortKey::Average, Direction::Descending),
        SortOrder::new(SortKey::Average, Direction::Ascending),
        SortOrder::new(SortKey::EstDaysToTarget, Direction::Ascending),
        SortOrder::new(SortKey::EstDaysToTarget, Direction::Descending),
    ];

    pub const fn new(key: SortKey, direction: Direction) -> Self {
        Self { key, direction }
    }

    pub fn label(self) -> &'static str {
        match (self.key, self.direction) {
            (SortKey::ProgressPercent, Direction::Descending) => "Progress (high to low)",
            (SortKey::ProgressPercent, Direction::Ascending) => "Progress (low to high)",
            (SortKey::Average, Direction::Descending) => "Average/day (high to low)",
            (SortKey::Average, Direction::Ascending) => "Average/day (low to high)",
            (SortKey::EstDaysToTarget, Direction::Ascending) => "Days to target (soonest)",
            (SortKey::EstDaysToTarget, Direction::Descending) => "Days to target (latest)",
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            SortKey::ProgressPercent => "percent",
            SortKey::Average => "average",
            SortKey::EstDaysToTarget => "eta",
        };
        let direction = match self.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        write!(f, "{key}-{direction}")
    }
}

impl FromStr for SortOrder {
    type Err = StatsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (key, direction) = match trimmed.rsplit_once('-') {
            Some((key, "asc")) => (key, Some(Direction::Ascending)),
            Some((key, "desc")) => (key, Some(Direction::Descending)),
            _ => (trimmed, None),
        };

        let key = match key {
            "percent" | "progressPercent" => SortKey::ProgressPercent,
            "average" => SortKey::Average,
            "eta" | "estDaysToTarget" => SortKey::EstDaysToTarget,
            _ => return Err(StatsError::UnknownSortKey(value.to_string())),
        };

        // Bare key names default to the direction the dashboard lists first.
        let direction = direction.unwrap_or(match key {
            SortKey::EstDaysToTarget => Direction::Ascending,
            SortKey::ProgressPercent | SortKey::Average => Direction::Descending,
        });

        Ok(Self { key, direction })
    }
}

/// Return a sorted copy. Equal keys keep their relative order.
pub fn sort(entities: &[EnrichedEntity], order: SortOrder) -> Vec<EnrichedEntity> {
    let mut sorted = entities.to_vec();
    sorted.sort_by(|a, b| compare(a, b, order));
    sorted
}

pub fn compare(a: &EnrichedEntity, b: &EnrichedEntity, order: SortOrder) -> Ordering {
    match order.key {
        SortKey::ProgressPercent => directed(a.progress_percent.total_cmp(&b.progress_percent), order.direction),
        SortKey::Average => directed(a.average.total_cmp(&b.average), order.direction),
        SortKey::EstDaysToTarget => compare_eta(a.est_days_to_target, b.est_days_to_target, order.direction),
    }
}

// Unreachable stays last in both directions.
fn compare_eta(a: Eta, b: Eta, direction: Direction) -> Ordering {
    match (a, b) {
        (Eta::Unreachable, Eta::Unreachable) => Ordering::Equal,
        (Eta::Unreachable, Eta::Days(_)) => Ordering::Greater,
        (Eta::Days(_), Eta::Unreachable) => Ordering::Less,
        (Eta::Days(a), Eta::Days(b)) => directed(a.cmp(&b), direction),
    }
}

fn directed(ordering: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Ascending => ordering,
        Direction::Descending => ordering.reverse(),
    }
}
