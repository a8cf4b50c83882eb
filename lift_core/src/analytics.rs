//! Aggregations over workout history.
//!
//! All functions are pure folds over a slice of logs (in any order) and
//! never fail: missing sets, weights or durations simply contribute nothing.
//! Time series come back oldest first, ordered by `logged_at` with ties
//! keeping input order. Dates are calendar dates in the local timezone.

use crate::week::{week_key, WeekKey};
use crate::{ExerciseLookup, LoggedExercise, MuscleGroup, WeightUnit, WorkoutLog};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Shown as the top muscle group when no exercise was ever logged
pub const NO_TOP_MUSCLE: &str = "—";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeekCount {
    pub week: WeekKey,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VolumePoint {
    pub date: NaiveDate,
    pub name: String,
    pub volume: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MuscleGroupCount {
    pub muscle_group: MuscleGroup,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub max_weight: f64,
    pub unit: WeightUnit,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DurationPoint {
    pub date: NaiveDate,
    pub name: String,
    pub duration: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub total_workouts: usize,
    pub total_volume: u64,
    pub total_duration: u64,
    /// Most frequently trained group, or [`NO_TOP_MUSCLE`]
    pub top_muscle: String,
}

/// Workouts per ISO week, ascending by week
pub fn weekly_frequency(logs: &[WorkoutLog]) -> Vec<WeekCount> {
    let mut counts: BTreeMap<WeekKey, usize> = BTreeMap::new();
    for log in logs {
        *counts.entry(week_key(log.local_date())).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(week, count)| WeekCount { week, count })
        .collect()
}

/// Training volume per session; sessions without volume are left out
pub fn volume_over_time(logs: &[WorkoutLog]) -> Vec<VolumePoint> {
    chronological(logs)
        .into_iter()
        .filter_map(|log| {
            let volume = log_volume(log).round() as u64;
            (volume > 0).then(|| VolumePoint {
                date: log.local_date(),
                name: log.name.clone(),
                volume,
            })
        })
        .collect()
}

/// Logged-exercise occurrences per muscle group, most frequent first
pub fn muscle_group_distribution(
    logs: &[WorkoutLog],
    lookup: &ExerciseLookup,
) -> Vec<MuscleGroupCount> {
    // First-seen order is kept so the stable sort breaks ties by it
    let mut counts: Vec<MuscleGroupCount> = Vec::new();
    for exercise in logs.iter().flat_map(|log| log.exercises.iter()) {
        let group = attribute(exercise, lookup);
        match counts.iter_mut().find(|c| c.muscle_group == group) {
            Some(entry) => entry.count += 1,
            None => counts.push(MuscleGroupCount {
                muscle_group: group,
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Heaviest completed set per session for one exercise (name match ignores case)
pub fn exercise_progress(logs: &[WorkoutLog], exercise_name: &str) -> Vec<ProgressPoint> {
    let wanted = exercise_name.trim().to_lowercase();
    let mut points = Vec::new();

    for log in chronological(logs) {
        let Some(exercise) = log
            .exercises
            .iter()
            .find(|e| e.exercise_name.to_lowercase() == wanted)
        else {
            continue;
        };

        let max_weight = exercise
            .sets
            .iter()
            .filter(|s| s.completed)
            .map(|s| s.weight)
            .fold(0.0_f64, f64::max);
        if max_weight > 0.0 {
            points.push(ProgressPoint {
                date: log.local_date(),
                max_weight,
                unit: exercise
                    .sets
                    .first()
                    .map(|s| s.weight_unit)
                    .unwrap_or_default(),
            });
        }
    }
    points
}

/// Session durations, skipping sessions with no recorded duration
pub fn duration_trend(logs: &[WorkoutLog]) -> Vec<DurationPoint> {
    chronological(logs)
        .into_iter()
        .filter(|log| log.duration_minutes > 0)
        .map(|log| DurationPoint {
            date: log.local_date(),
            name: log.name.clone(),
            duration: log.duration_minutes,
        })
        .collect()
}

pub fn summary_stats(logs: &[WorkoutLog], lookup: &ExerciseLookup) -> SummaryStats {
    let total_volume: f64 = logs.iter().map(log_volume).sum();
    let total_duration = logs.iter().map(|log| u64::from(log.duration_minutes)).sum();
    let top_muscle = muscle_group_distribution(logs, lookup)
        .first()
        .map(|c| c.muscle_group.to_string())
        .unwrap_or_else(|| NO_TOP_MUSCLE.to_string());

    SummaryStats {
        total_workouts: logs.len(),
        total_volume: total_volume.round() as u64,
        total_duration,
        top_muscle,
    }
}

/// Distinct exercise names across all logs, sorted case-insensitively
pub fn logged_exercise_names(logs: &[WorkoutLog]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut names: Vec<String> = logs
        .iter()
        .flat_map(|log| log.exercises.iter())
        .map(|e| e.exercise_name.trim())
        .filter(|name| !name.is_empty() && seen.insert(name.to_lowercase()))
        .map(str::to_string)
        .collect();
    names.sort_by_key(|name| name.to_lowercase());
    names
}

/// Σ reps × weight over completed sets with positive weight
pub fn log_volume(log: &WorkoutLog) -> f64 {
    log.exercises
        .iter()
        .flat_map(|e| e.sets.iter())
        .filter(|s| s.completed && s.weight > 0.0)
        .map(|s| f64::from(s.reps) * s.weight)
        .sum()
}

/// Library group by id, else the logged group, else `Other`
pub fn attribute(exercise: &LoggedExercise, lookup: &ExerciseLookup) -> MuscleGroup {
    exercise
        .exercise_id
        .and_then(|id| lookup.get(&id))
        .map(|e| e.muscle_group)
        .or(exercise.muscle_group)
        .unwrap_or(MuscleGroup::Other)
}

fn chronological(logs: &[WorkoutLog]) -> Vec<&WorkoutLog> {
    let mut sorted: Vec<&WorkoutLog> = logs.iter().collect();
    sorted.sort_by_key(|log| log.logged_at);
    sorted
}
