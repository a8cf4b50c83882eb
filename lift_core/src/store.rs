//! Document store contract.
//!
//! The store is hierarchical: every collection lives under a user id. Each
//! collection gets its own repository trait so services only depend on what
//! they touch. Two implementations ship with the crate:
//! [`MemoryStore`](crate::memory_store::MemoryStore) and
//! [`FileStore`](crate::file_store::FileStore).
//!
//! Stores never retry. An unreachable backend surfaces as
//! [`Error::Store`](crate::Error::Store) or [`Error::Io`](crate::Error::Io).

use crate::subscription::{Hub, Subscription};
use crate::week::{DayKey, WeekKey};
use crate::{
    Exercise, ExerciseId, ExerciseUpdate, NewExercise, NewWorkoutLog, Result, Template,
    TemplateDraft, TemplateId, UserId, Week, WorkoutInstance, WorkoutLog,
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Direction of an ordered log query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first
    Ascending,
    /// Newest first
    Descending,
}

/// Position after which the next page of logs starts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogCursor {
    pub logged_at: DateTime<Utc>,
    pub id: Uuid,
}

impl From<&WorkoutLog> for LogCursor {
    fn from(log: &WorkoutLog) -> Self {
        Self {
            logged_at: log.logged_at,
            id: log.id,
        }
    }
}

/// Exercise library collection
pub trait ExerciseRepo {
    /// All exercises ordered by name
    fn list_exercises(&self, user: &UserId) -> Result<Vec<Exercise>>;
    fn get_exercise(&self, user: &UserId, id: ExerciseId) -> Result<Option<Exercise>>;
    fn insert_exercise(&self, user: &UserId, exercise: NewExercise) -> Result<Exercise>;
    /// Fails with `NotFound` for an unknown id
    fn update_exercise(
        &self,
        user: &UserId,
        id: ExerciseId,
        update: ExerciseUpdate,
    ) -> Result<Exercise>;
    /// Fails with `NotFound` for an unknown id
    fn delete_exercise(&self, user: &UserId, id: ExerciseId) -> Result<()>;
    /// Receive the full, name-ordered list after every change
    fn watch_exercises(
        &self,
        user: &UserId,
        handler: Box<dyn Fn(&Vec<Exercise>) + Send + Sync>,
    ) -> Result<Subscription>;
}

/// Template collection
pub trait TemplateRepo {
    /// All templates ordered by name
    fn list_templates(&self, user: &UserId) -> Result<Vec<Template>>;
    fn get_template(&self, user: &UserId, id: TemplateId) -> Result<Option<Template>>;
    fn insert_template(&self, user: &UserId, draft: TemplateDraft) -> Result<Template>;
    /// Replace a template's contents; fails with `NotFound` for an unknown id
    fn replace_template(&self, user: &UserId, id: TemplateId, draft: TemplateDraft)
        -> Result<Template>;
    fn delete_template(&self, user: &UserId, id: TemplateId) -> Result<()>;
    fn watch_templates(
        &self,
        user: &UserId,
        handler: Box<dyn Fn(&Vec<Template>) + Send + Sync>,
    ) -> Result<Subscription>;
}

/// Weekly schedule documents keyed by week key
pub trait ScheduleRepo {
    /// Point lookup; `None` when the week was never written
    fn load_week(&self, user: &UserId, week: WeekKey) -> Result<Option<Week>>;
    /// Field-path write of a single day's workout list.
    ///
    /// Creates the week document if it does not exist yet. Other days of an
    /// existing document are left untouched.
    fn write_day(
        &self,
        user: &UserId,
        week: WeekKey,
        day: DayKey,
        workouts: Vec<WorkoutInstance>,
    ) -> Result<Week>;
    /// Receive the week document after every change (absent weeks are
    /// delivered as synthesized empty weeks)
    fn watch_week(
        &self,
        user: &UserId,
        week: WeekKey,
        handler: Box<dyn Fn(&Week) + Send + Sync>,
    ) -> Result<Subscription>;
}

/// Append-only workout log collection
pub trait LogRepo {
    /// Persist a new log, assigning its id and `logged_at`
    fn append_log(&self, user: &UserId, log: NewWorkoutLog) -> Result<WorkoutLog>;
    /// Ordered range query by `logged_at`, starting after `after`, at most `limit` rows
    fn query_logs(
        &self,
        user: &UserId,
        order: SortOrder,
        after: Option<&LogCursor>,
        limit: Option<usize>,
    ) -> Result<Vec<WorkoutLog>>;
    /// Receive each newly appended log
    fn watch_logs(
        &self,
        user: &UserId,
        handler: Box<dyn Fn(&WorkoutLog) + Send + Sync>,
    ) -> Result<Subscription>;
}

/// Change fan-out shared by the store implementations
#[derive(Default)]
pub(crate) struct Watchers {
    pub weeks: Hub<(UserId, WeekKey), Week>,
    pub exercises: Hub<UserId, Vec<Exercise>>,
    pub templates: Hub<UserId, Vec<Template>>,
    pub logs: Hub<UserId, WorkoutLog>,
}

/// Register `handler`, then hand it the current snapshot from `load`
///
/// The handler is registered before the snapshot is read, so a write racing
/// the subscription is either in the snapshot or published to the handler.
/// Once a published value has been delivered the (possibly older) snapshot
/// is skipped.
pub(crate) fn subscribe_with_snapshot<K, T>(
    hub: &Hub<K, T>,
    key: K,
    handler: Box<dyn Fn(&T) + Send + Sync>,
    load: impl FnOnce() -> Result<T>,
) -> Result<Subscription>
where
    K: PartialEq + Send + 'static,
    T: 'static,
{
    let handler: Arc<dyn Fn(&T) + Send + Sync> = Arc::from(handler);
    let seen_update = Arc::new(Mutex::new(false));

    let forward = Arc::clone(&handler);
    let gate = Arc::clone(&seen_update);
    let subscription = hub.subscribe(key, move |value: &T| {
        // Waits for an in-flight snapshot delivery to finish first
        *gate.lock().unwrap_or_else(|e| e.into_inner()) = true;
        forward(value);
    });

    let current = load()?;
    let seen = seen_update.lock().unwrap_or_else(|e| e.into_inner());
    if !*seen {
        handler(&current);
    }
    drop(seen);
    Ok(subscription)
}

/// Order logs by (`logged_at`, `id`) in the requested direction
pub(crate) fn compare_logs(order: SortOrder, a: &WorkoutLog, b: &WorkoutLog) -> Ordering {
    let asc = a
        .logged_at
        .cmp(&b.logged_at)
        .then_with(|| a.id.cmp(&b.id));
    match order {
        SortOrder::Ascending => asc,
        SortOrder::Descending => asc.reverse(),
    }
}

/// Sort, apply the cursor and the limit
pub(crate) fn page_logs(
    mut logs: Vec<WorkoutLog>,
    order: SortOrder,
    after: Option<&LogCursor>,
    limit: Option<usize>,
) -> Vec<WorkoutLog> {
    logs.sort_by(|a, b| compare_logs(order, a, b));

    let start = match after {
        Some(cursor) => logs
            .iter()
            .position(|log| {
                let key = (log.logged_at, log.id);
                let cursor = (cursor.logged_at, cursor.id);
                match order {
                    SortOrder::Ascending => key > cursor,
                    SortOrder::Descending => key < cursor,
                }
            })
            .unwrap_or(logs.len()),
        None => 0,
    };

    logs.into_iter()
        .skip(start)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Sort exercises by name, case-insensitively
pub(crate) fn sort_exercises(exercises: &mut [Exercise]) {
    exercises.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub(crate) fn sort_templates(templates: &mut [Template]) {
    templates.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Apply a partial update in place
pub(crate) fn apply_exercise_update(exercise: &mut Exercise, update: ExerciseUpdate) {
    if let Some(name) = update.name {
        exercise.name = name;
    }
    if let Some(group) = update.muscle_group {
        exercise.muscle_group = group;
    }
    if let Some(description) = update.description {
        exercise.description = description;
    }
    if let Some(sets) = update.default_sets {
        exercise.default_sets = sets;
    }
    if let Some(reps) = update.default_reps {
        exercise.default_reps = reps;
    }
    if let Some(weight) = update.default_weight {
        exercise.default_weight = weight;
    }
    if let Some(unit) = update.weight_unit {
        exercise.weight_unit = unit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn log_at(minute: u32) -> WorkoutLog {
        WorkoutLog {
            id: Uuid::new_v4(),
            name: format!("log {}", minute),
            date: None,
            logged_at: Utc.with_ymd_and_hms(2026, 2, 2, 12, minute, 0).unwrap(),
            template_id: None,
            template_name: None,
            slot: None,
            exercises: vec![],
            duration_minutes: 0,
            notes: String::new(),
        }
    }

    #[test]
    fn test_page_logs_descending_with_cursor() {
        let logs: Vec<WorkoutLog> = (0..5).map(log_at).collect();

        let first = page_logs(logs.clone(), SortOrder::Descending, None, Some(2));
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].name, "log 4");
        assert_eq!(first[1].name, "log 3");

        let cursor = LogCursor::from(&first[1]);
        let second = page_logs(logs.clone(), SortOrder::Descending, Some(&cursor), Some(2));
        assert_eq!(second[0].name, "log 2");
        assert_eq!(second[1].name, "log 1");

        let cursor = LogCursor::from(&second[1]);
        let last = page_logs(logs, SortOrder::Descending, Some(&cursor), Some(2));
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].name, "log 0");
    }

    #[test]
    fn test_page_logs_ascending() {
        let logs: Vec<WorkoutLog> = (0..3).rev().map(log_at).collect();
        let all = page_logs(logs, SortOrder::Ascending, None, None);
        let names: Vec<_> = all.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["log 0", "log 1", "log 2"]);
    }
}
