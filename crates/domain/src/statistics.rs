use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;

use crate::{MuscleGroup, Weight, Workout};

/// Maximum number of groups in the muscle distribution.
pub const MUSCLE_DISTRIBUTION_LIMIT: usize = 10;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsWindow {
    _3M = 90,
    #[default]
    _1M = 30,
    _1W = 7,
}

impl StatisticsWindow {
    #[must_use]
    pub fn days(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
    All,
    _1Y = 365,
    _3M = 90,
    #[default]
    _1M = 30,
    _1W = 7,
}

impl HistoryWindow {
    #[must_use]
    pub fn days(self) -> Option<u32> {
        match self {
            HistoryWindow::All => None,
            _ => Some(self as u32),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Statistics {
    pub totals: Totals,
    pub muscle_distribution: Vec<MuscleShare>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Totals {
    pub workouts: u32,
    pub sets: u64,
    pub reps: u64,
    /// Volume in kilograms, every set counts at least one repetition.
    pub weight: f64,
    pub heaviest: f64,
    pub duration_min: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuscleShare {
    pub muscle_group: MuscleGroup,
    /// Rounded share of all sets in percent.
    pub percentage: u32,
}

/// Compute totals and the muscle distribution of all workouts started within the last
/// `window_days` days.
///
/// Workouts without a start are never included. Workouts without an end count as lasting until
/// `now`.
#[must_use]
pub fn aggregate(history: &[Workout], window_days: u32, now: DateTime<Utc>) -> Statistics {
    let cutoff = now - Duration::days(i64::from(window_days));
    let mut totals = Totals::default();
    let mut muscle_counts: IndexMap<MuscleGroup, u32> = IndexMap::new();

    for workout in history {
        let Some(start) = workout.start else {
            continue;
        };
        if start < cutoff || start > now {
            continue;
        }

        totals.workouts += 1;
        totals.duration_min += duration_min(start, workout.end.unwrap_or(now));

        for workout_exercise in &workout.exercises {
            let muscle_group = workout_exercise.muscle_group();
            for set in &workout_exercise.sets {
                let reps = set.reps.map_or(0, u32::from);
                totals.sets += 1;
                totals.reps += u64::from(reps);
                if let Some(weight) = set.weight {
                    let weight = kilograms(weight);
                    totals.weight += weight * f64::from(reps.max(1));
                    totals.heaviest = totals.heaviest.max(weight);
                }
                *muscle_counts.entry(muscle_group.clone()).or_default() += 1;
            }
        }
    }

    totals.weight = round_grams(totals.weight);

    Statistics {
        totals,
        muscle_distribution: muscle_distribution(muscle_counts),
    }
}

/// Weights are entered with at most a few decimals, the widening must not add `f32` noise.
fn kilograms(weight: Weight) -> f64 {
    round_grams(f64::from(f32::from(weight)))
}

fn round_grams(kilograms: f64) -> f64 {
    (kilograms * 1000.0).round() / 1000.0
}

#[allow(clippy::cast_possible_truncation)]
fn duration_min(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    #[allow(clippy::cast_precision_loss)]
    let minutes = (end - start).num_milliseconds() as f64 / 60_000.0;
    (minutes.round() as i64).max(0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn muscle_distribution(counts: IndexMap<MuscleGroup, u32>) -> Vec<MuscleShare> {
    let total = f64::from(counts.values().sum::<u32>().max(1));
    let mut shares = counts
        .into_iter()
        .map(|(muscle_group, count)| MuscleShare {
            muscle_group,
            percentage: (f64::from(count) * 100.0 / total).round() as u32,
        })
        .collect::<Vec<_>>();
    shares.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    shares.truncate(MUSCLE_DISTRIBUTION_LIMIT);
    shares
}

/// Workouts of the history listing, most recent first.
///
/// Workouts without a start are sorted last and only kept if all workouts are requested.
#[must_use]
pub fn filter_history(
    history: &[Workout],
    window: HistoryWindow,
    now: DateTime<Utc>,
) -> Vec<&Workout> {
    let cutoff = window
        .days()
        .map(|days| now - Duration::days(i64::from(days)));
    let mut workouts = history
        .iter()
        .filter(|w| match (cutoff, w.start) {
            (None, _) => true,
            (Some(cutoff), Some(start)) => start >= cutoff,
            (Some(_), None) => false,
        })
        .collect::<Vec<_>>();
    workouts.sort_by(|a, b| b.start.cmp(&a.start));
    workouts
}
