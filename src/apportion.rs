//! Elevation distribution: splits building-wide progress counters into
//! per-direction sub-totals when the caller has no explicit breakdown.

use crate::error::NoticeError;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Fixed tie-break order used when a remainder has to be handed out.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionalCounts {
    pub north: u64,
    pub east: u64,
    pub south: u64,
    pub west: u64,
}

impl DirectionalCounts {
    pub fn new(north: u64, east: u64, south: u64, west: u64) -> Self {
        Self {
            north,
            east,
            south,
            west,
        }
    }

    pub fn get(&self, direction: Direction) -> u64 {
        match direction {
            Direction::North => self.north,
            Direction::East => self.east,
            Direction::South => self.south,
            Direction::West => self.west,
        }
    }

    fn slot_mut(&mut self, direction: Direction) -> &mut u64 {
        match direction {
            Direction::North => &mut self.north,
            Direction::East => &mut self.east,
            Direction::South => &mut self.south,
            Direction::West => &mut self.west,
        }
    }

    pub fn sum(&self) -> u64 {
        self.north + self.east + self.south + self.west
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, u64)> + '_ {
        Direction::ALL.into_iter().map(|d| (d, self.get(d)))
    }

    pub fn as_tuple(&self) -> (u64, u64, u64, u64) {
        (self.north, self.east, self.south, self.west)
    }
}

/// Split `total` into four directional counts that sum to `total`.
///
/// Every direction receives `total / 4`; the first `total % 4` directions in
/// [`Direction::ALL`] order receive one extra unit.
pub fn apportion(total: i64) -> Result<DirectionalCounts, NoticeError> {
    if total < 0 {
        return Err(NoticeError::InvalidArgument(format!(
            "cannot apportion negative total {total}"
        )));
    }
    let total = total as u64;
    let base = total / 4;
    let remainder = (total % 4) as usize;
    let mut counts = DirectionalCounts::default();
    for (idx, direction) in Direction::ALL.into_iter().enumerate() {
        *counts.slot_mut(direction) = if idx < remainder { base + 1 } else { base };
    }
    Ok(counts)
}

/// Caller-supplied per-direction values; any of them may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionalInput {
    pub north: Option<u64>,
    pub east: Option<u64>,
    pub south: Option<u64>,
    pub west: Option<u64>,
}

impl DirectionalInput {
    pub fn complete(north: u64, east: u64, south: u64, west: u64) -> Self {
        Self {
            north: Some(north),
            east: Some(east),
            south: Some(south),
            west: Some(west),
        }
    }

    /// All four values, or `None` when any one is missing.
    pub fn all(&self) -> Option<DirectionalCounts> {
        Some(DirectionalCounts {
            north: self.north?,
            east: self.east?,
            south: self.south?,
            west: self.west?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProgressSnapshotWire {
    total_units: i64,
    completed_units: i64,
    total_north: Option<u64>,
    total_east: Option<u64>,
    total_south: Option<u64>,
    total_west: Option<u64>,
    completed_north: Option<u64>,
    completed_east: Option<u64>,
    completed_south: Option<u64>,
    completed_west: Option<u64>,
}

/// Aggregate progress counters for one maintenance project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "ProgressSnapshotWire")]
pub struct ProgressSnapshot {
    pub total_units: i64,
    pub completed_units: i64,
    pub total_by_direction: DirectionalInput,
    pub completed_by_direction: DirectionalInput,
}

impl From<ProgressSnapshotWire> for ProgressSnapshot {
    fn from(wire: ProgressSnapshotWire) -> Self {
        Self {
            total_units: wire.total_units,
            completed_units: wire.completed_units,
            total_by_direction: DirectionalInput {
                north: wire.total_north,
                east: wire.total_east,
                south: wire.total_south,
                west: wire.total_west,
            },
            completed_by_direction: DirectionalInput {
                north: wire.completed_north,
                east: wire.completed_east,
                south: wire.completed_south,
                west: wire.completed_west,
            },
        }
    }
}

impl ProgressSnapshot {
    pub fn aggregate(total_units: i64, completed_units: i64) -> Self {
        Self {
            total_units,
            completed_units,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownSource {
    Explicit,
    Apportioned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElevationBreakdown {
    pub total: DirectionalCounts,
    pub completed: DirectionalCounts,
    pub total_source: BreakdownSource,
    pub completed_source: BreakdownSource,
}

impl ElevationBreakdown {
    /// Completed over total for one direction; `None` when that total is zero.
    /// Not clamped: over-reported directions yield ratios above 1.
    pub fn completion_ratio(&self, direction: Direction) -> Option<f64> {
        let total = self.total.get(direction);
        if total == 0 {
            return None;
        }
        Some(self.completed.get(direction) as f64 / total as f64)
    }

    /// Directions whose completed count exceeds their total count.
    pub fn over_reported(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| self.completed.get(*d) > self.total.get(*d))
            .collect()
    }
}

fn resolve_counter(
    aggregate: i64,
    explicit: &DirectionalInput,
) -> Result<(DirectionalCounts, BreakdownSource), NoticeError> {
    match explicit.all() {
        Some(counts) => Ok((counts, BreakdownSource::Explicit)),
        None => Ok((apportion(aggregate)?, BreakdownSource::Apportioned)),
    }
}

/// Resolve the per-direction breakdown of a snapshot.
///
/// The total and completed counters are resolved independently: complete
/// explicit values are used verbatim, anything less is replaced wholesale by
/// [`apportion`] of the aggregate.
pub fn project_elevations(snapshot: &ProgressSnapshot) -> Result<ElevationBreakdown, NoticeError> {
    let (total, total_source) = resolve_counter(snapshot.total_units, &snapshot.total_by_direction)?;
    let (completed, completed_source) =
        resolve_counter(snapshot.completed_units, &snapshot.completed_by_direction)?;
    let breakdown = ElevationBreakdown {
        total,
        completed,
        total_source,
        completed_source,
    };
    let over = breakdown.over_reported();
    if !over.is_empty() {
        log::debug!(
            "elevation breakdown reports completed above total for {:?}",
            over.iter().map(Direction::as_str).collect::<Vec<_>>()
        );
    }
    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn apportion_hands_remainder_out_in_fixed_order() {
        assert_eq!(apportion(10).unwrap().as_tuple(), (3, 3, 2, 2));
        assert_eq!(apportion(7).unwrap().as_tuple(), (2, 2, 2, 1));
        assert_eq!(apportion(0).unwrap().as_tuple(), (0, 0, 0, 0));
        assert_eq!(apportion(4).unwrap().as_tuple(), (1, 1, 1, 1));
        assert_eq!(apportion(1).unwrap().as_tuple(), (1, 0, 0, 0));
    }

    #[test]
    fn apportion_rejects_negative_totals() {
        let err = apportion(-1).unwrap_err();
        assert!(matches!(err, NoticeError::InvalidArgument(_)));
        assert!(err.to_string().contains("-1"));
    }

    proptest! {
        #[test]
        fn apportion_sums_to_total(total in 0i64..=1_000_000_000_000) {
            let counts = apportion(total).unwrap();
            prop_assert_eq!(counts.sum(), total as u64);
            let max = counts.iter().map(|(_, v)| v).max().unwrap();
            let min = counts.iter().map(|(_, v)| v).min().unwrap();
            prop_assert!(max - min <= 1);
        }
    }

    #[test]
    fn explicit_breakdown_is_used_verbatim() {
        let snapshot = ProgressSnapshot {
            total_units: 100,
            completed_units: 10,
            total_by_direction: DirectionalInput::complete(40, 30, 20, 5),
            completed_by_direction: DirectionalInput::default(),
        };
        let breakdown = project_elevations(&snapshot).unwrap();
        assert_eq!(breakdown.total.as_tuple(), (40, 30, 20, 5));
        assert_eq!(breakdown.total_source, BreakdownSource::Explicit);
        assert_eq!(breakdown.completed.as_tuple(), (3, 3, 2, 2));
        assert_eq!(breakdown.completed_source, BreakdownSource::Apportioned);
    }

    #[test]
    fn partial_explicit_breakdown_is_discarded() {
        let snapshot = ProgressSnapshot {
            total_units: 10,
            completed_units: 0,
            total_by_direction: DirectionalInput {
                north: Some(9),
                east: Some(1),
                south: Some(0),
                west: None,
            },
            completed_by_direction: DirectionalInput::default(),
        };
        let breakdown = project_elevations(&snapshot).unwrap();
        assert_eq!(breakdown.total.as_tuple(), (3, 3, 2, 2));
        assert_eq!(breakdown.total_source, BreakdownSource::Apportioned);
    }

    #[test]
    fn negative_aggregate_fails_only_when_apportioning() {
        let apportioned = ProgressSnapshot::aggregate(-5, 0);
        assert!(matches!(
            project_elevations(&apportioned),
            Err(NoticeError::InvalidArgument(_))
        ));

        let explicit = ProgressSnapshot {
            total_units: -5,
            completed_units: 0,
            total_by_direction: DirectionalInput::complete(1, 1, 1, 1),
            completed_by_direction: DirectionalInput::complete(0, 0, 0, 0),
        };
        assert!(project_elevations(&explicit).is_ok());
    }

    #[test]
    fn completed_is_not_clamped_to_total() {
        let snapshot = ProgressSnapshot {
            total_units: 4,
            completed_units: 3,
            total_by_direction: DirectionalInput::complete(0, 2, 1, 1),
            completed_by_direction: DirectionalInput::default(),
        };
        let breakdown = project_elevations(&snapshot).unwrap();
        assert_eq!(breakdown.completed.as_tuple(), (1, 1, 1, 0));
        assert_eq!(breakdown.over_reported(), vec![Direction::North]);
        assert_eq!(breakdown.completion_ratio(Direction::North), None);
        assert_eq!(breakdown.completion_ratio(Direction::East), Some(0.5));
    }

    #[test]
    fn snapshot_deserializes_from_camel_case_json() {
        let snapshot: ProgressSnapshot = serde_json::from_str(
            r#"{"totalUnits": 12, "completedUnits": 5,
                "totalNorth": 6, "totalEast": 2, "totalSouth": 2, "totalWest": 2}"#,
        )
        .unwrap();
        assert_eq!(snapshot.total_units, 12);
        assert_eq!(
            snapshot.total_by_direction.all(),
            Some(DirectionalCounts::new(6, 2, 2, 2))
        );
        assert_eq!(snapshot.completed_by_direction.all(), None);
    }
}
