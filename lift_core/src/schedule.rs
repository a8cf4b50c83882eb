//! Schedule engine: one document per (user, week) with seven day slots.
//!
//! Every mutation re-reads the stored week, edits one day's list and writes
//! that day back. Within a process this means sequential calls observe each
//! other's writes. Two sessions racing on the same day are last-write-wins:
//! a writer holding a stale copy of the list overwrites whatever landed in
//! between.
//!
//! Workouts inside a day are addressed by position. Removing an entry shifts
//! the ones after it, so an index read before a concurrent removal can point
//! at the wrong workout; such stale indices surface as `NotFound` when they
//! run off the end of the list. [`ScheduleEngine::mark_completed`] also
//! carries the workout's stable id and relocates it when its index moved.

use crate::clock::{Clock, SystemClock};
use crate::store::ScheduleRepo;
use crate::subscription::Subscription;
use crate::week::{week_key, DayKey, WeekKey};
use crate::{
    Error, Result, SlotRef, UserId, Week, WorkoutInstance, WorkoutLog, WorkoutPatch,
    WorkoutSource, WorkoutSpec,
};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

/// A scheduled workout together with its address in the schedule
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledWorkout {
    pub slot: SlotRef,
    pub instance: WorkoutInstance,
}

/// Week schedule operations on top of a [`ScheduleRepo`]
pub struct ScheduleEngine<'a, S: ScheduleRepo> {
    store: &'a S,
    clock: Arc<dyn Clock>,
}

impl<'a, S: ScheduleRepo> ScheduleEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: &'a S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Week containing `date`; a never-written week (or no user) is empty, not an error
    pub fn get_week(&self, user: Option<&UserId>, date: NaiveDate) -> Result<Week> {
        self.week(user, week_key(date))
    }

    /// Week by key; a never-written week (or no user) is empty, not an error
    pub fn week(&self, user: Option<&UserId>, key: WeekKey) -> Result<Week> {
        let Some(user) = user else {
            return Ok(Week::empty(key));
        };
        match self.store.load_week(user, key)? {
            Some(week) => Ok(week),
            None => {
                tracing::debug!("No stored schedule for {} {}, synthesizing", user, key);
                Ok(Week::empty(key))
            }
        }
    }

    /// Append a new workout to the end of `day`
    pub fn add_workout(
        &self,
        user: &UserId,
        week: WeekKey,
        day: DayKey,
        spec: WorkoutSpec,
    ) -> Result<WorkoutInstance> {
        let instance = self.instantiate(spec)?;

        let mut workouts = self.current_day(user, week, day)?;
        workouts.push(instance.clone());
        let index = workouts.len() - 1;
        self.store.write_day(user, week, day, workouts)?;

        tracing::info!(
            "Scheduled {:?} on {} {} at index {}",
            instance.display_name(),
            week,
            day,
            index
        );
        Ok(instance)
    }

    /// Merge `patch` into the workout at `index`
    ///
    /// Completion is one-way: re-applying `is_completed = true` succeeds
    /// without change, trying to clear it is rejected.
    pub fn update_workout(
        &self,
        user: &UserId,
        week: WeekKey,
        day: DayKey,
        index: usize,
        patch: WorkoutPatch,
    ) -> Result<WorkoutInstance> {
        let mut workouts = self.current_day(user, week, day)?;
        let len = workouts.len();
        let instance = workouts
            .get_mut(index)
            .ok_or_else(|| stale_index(week, day, index, len))?;

        if !apply_patch(instance, patch)? {
            tracing::debug!("Patch on {} {} #{} changed nothing", week, day, index);
            return Ok(instance.clone());
        }

        let updated = instance.clone();
        self.store.write_day(user, week, day, workouts)?;
        tracing::info!("Updated workout {} {} #{}", week, day, index);
        Ok(updated)
    }

    /// Remove the workout at `index`; later workouts shift down by one
    pub fn remove_workout(
        &self,
        user: &UserId,
        week: WeekKey,
        day: DayKey,
        index: usize,
    ) -> Result<WorkoutInstance> {
        let mut workouts = self.current_day(user, week, day)?;
        if index >= workouts.len() {
            return Err(stale_index(week, day, index, workouts.len()));
        }
        let removed = workouts.remove(index);
        self.store.write_day(user, week, day, workouts)?;

        tracing::info!(
            "Removed {:?} from {} {} (index {})",
            removed.display_name(),
            week,
            day,
            index
        );
        Ok(removed)
    }

    /// Resolve a workout and its stable address, ready to be logged
    pub fn scheduled_workout(
        &self,
        user: &UserId,
        week: WeekKey,
        day: DayKey,
        index: usize,
    ) -> Result<ScheduledWorkout> {
        let workouts = self.current_day(user, week, day)?;
        let instance = workouts
            .get(index)
            .cloned()
            .ok_or_else(|| stale_index(week, day, index, workouts.len()))?;
        Ok(ScheduledWorkout {
            slot: SlotRef {
                week_key: week,
                day,
                index,
                instance_id: instance.id,
            },
            instance,
        })
    }

    /// Mark the workout at `slot` completed.
    ///
    /// Uses the slot's index when the instance id still matches there,
    /// otherwise looks the instance up by id within the same day. Idempotent,
    /// so it doubles as the repair path after a partially applied finish.
    pub fn mark_completed(&self, user: &UserId, slot: &SlotRef) -> Result<WorkoutInstance> {
        let workouts = self.current_day(user, slot.week_key, slot.day)?;
        let index = locate(&workouts, slot.index, slot.instance_id).ok_or_else(|| {
            Error::NotFound(format!(
                "workout {} no longer scheduled on {} {}",
                slot.instance_id, slot.week_key, slot.day
            ))
        })?;

        if index != slot.index {
            tracing::warn!(
                "Workout {} moved from index {} to {} on {} {}",
                slot.instance_id,
                slot.index,
                index,
                slot.week_key,
                slot.day
            );
        }

        self.update_workout(user, slot.week_key, slot.day, index, WorkoutPatch::completed())
    }

    /// Re-apply completion for logged workouts whose slot is still open.
    ///
    /// Returns the slots that were completed. Logs whose workout has since
    /// been removed from the schedule are skipped.
    pub fn repair_completions(&self, user: &UserId, logs: &[WorkoutLog]) -> Result<Vec<SlotRef>> {
        let mut repaired = Vec::new();
        for slot in logs.iter().filter_map(|log| log.slot.as_ref()) {
            let pending = self
                .current_day(user, slot.week_key, slot.day)?
                .iter()
                .any(|w| w.id == slot.instance_id && !w.is_completed);
            if pending {
                self.mark_completed(user, slot)?;
                repaired.push(slot.clone());
            }
        }
        if !repaired.is_empty() {
            tracing::info!("Repaired {} workout completions", repaired.len());
        }
        Ok(repaired)
    }

    /// Receive the week document now and after every change
    pub fn watch_week<F>(&self, user: &UserId, date: NaiveDate, handler: F) -> Result<Subscription>
    where
        F: Fn(&Week) + Send + Sync + 'static,
    {
        self.store
            .watch_week(user, week_key(date), Box::new(handler))
    }

    /// Latest stored list for one day (empty if the week was never written)
    fn current_day(&self, user: &UserId, week: WeekKey, day: DayKey) -> Result<Vec<WorkoutInstance>> {
        Ok(self
            .store
            .load_week(user, week)?
            .map(|mut doc| std::mem::take(&mut doc.days.get_mut(day).workouts))
            .unwrap_or_default())
    }

    fn instantiate(&self, spec: WorkoutSpec) -> Result<WorkoutInstance> {
        let (source, exercises) = match spec {
            WorkoutSpec::Template {
                template_id,
                template_name,
                exercises,
            } => {
                let template_name = required_name(&template_name, "template name")?;
                (
                    WorkoutSource::Template {
                        template_id,
                        template_name,
                    },
                    exercises,
                )
            }
            WorkoutSpec::AdHoc { custom_name } => {
                let custom_name = required_name(&custom_name, "workout name")?;
                (WorkoutSource::AdHoc { custom_name }, Vec::new())
            }
        };

        Ok(WorkoutInstance {
            id: Uuid::new_v4(),
            source,
            exercises,
            is_completed: false,
            scheduled_at: self.clock.now(),
        })
    }
}

/// Apply a patch; returns whether anything changed
fn apply_patch(instance: &mut WorkoutInstance, patch: WorkoutPatch) -> Result<bool> {
    let mut changed = false;

    match patch.is_completed {
        Some(false) if instance.is_completed => {
            return Err(Error::Validation(
                "a completed workout cannot be marked incomplete".into(),
            ));
        }
        Some(true) if !instance.is_completed => {
            instance.is_completed = true;
            changed = true;
        }
        _ => {}
    }

    if let Some(name) = patch.custom_name {
        let name = required_name(&name, "workout name")?;
        match &mut instance.source {
            WorkoutSource::AdHoc { custom_name } => {
                if *custom_name != name {
                    *custom_name = name;
                    changed = true;
                }
            }
            WorkoutSource::Template { .. } => {
                return Err(Error::Validation(
                    "only ad-hoc workouts can be renamed".into(),
                ));
            }
        }
    }

    Ok(changed)
}

/// Index of `id`, preferring `hint` when it still points at it
fn locate(workouts: &[WorkoutInstance], hint: usize, id: Uuid) -> Option<usize> {
    match workouts.get(hint) {
        Some(w) if w.id == id => Some(hint),
        _ => workouts.iter().position(|w| w.id == id),
    }
}

fn required_name(name: &str, what: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

fn stale_index(week: WeekKey, day: DayKey, index: usize, len: usize) -> Error {
    Error::NotFound(format!(
        "no workout at index {} on {} {} (day has {})",
        index, week, day, len
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory_store::MemoryStore;
    use crate::ExercisePrescription;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    fn user() -> UserId {
        UserId::new("tester").unwrap()
    }

    fn key() -> WeekKey {
        "2026-W06".parse().unwrap()
    }

    fn names(week: &Week, day: DayKey) -> Vec<String> {
        week.day(day)
            .iter()
            .map(|w| w.display_name().to_string())
            .collect()
    }

    fn template_spec(name: &str) -> WorkoutSpec {
        WorkoutSpec::Template {
            template_id: Some(Uuid::new_v4()),
            template_name: name.into(),
            exercises: vec![ExercisePrescription {
                exercise_id: None,
                exercise_name: "Squat".into(),
                sets: 3,
                reps: 5,
                weight: 100.0,
                weight_unit: Default::default(),
                order: 0,
            }],
        }
    }

    #[test]
    fn test_get_week_synthesizes_empty() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);
        let date = NaiveDate::from_ymd_opt(2026, 2, 4).unwrap();

        let week = engine.get_week(Some(&user()), date).unwrap();
        assert_eq!(week.week_key, key());
        assert_eq!(week.week_start, NaiveDate::from_ymd_opt(2026, 2, 2).unwrap());
        assert!(week.updated_at.is_none());
        assert!(week.days.iter().all(|(_, d)| d.workouts.is_empty()));

        let anonymous = engine.get_week(None, date).unwrap();
        assert_eq!(anonymous, Week::empty(key()));
    }

    #[test]
    fn test_add_workout_sets_defaults() {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap(),
        ));
        let store = MemoryStore::new();
        let engine = ScheduleEngine::with_clock(&store, clock.clone());

        let added = engine
            .add_workout(&user(), key(), DayKey::Monday, template_spec("Leg Day"))
            .unwrap();
        assert!(!added.is_completed);
        assert_eq!(added.scheduled_at, clock.now());
        assert_eq!(added.exercises.len(), 1);

        let adhoc = engine
            .add_workout(&user(), key(), DayKey::Monday, WorkoutSpec::ad_hoc(" Run "))
            .unwrap();
        assert_eq!(adhoc.display_name(), "Run");
        assert!(adhoc.exercises.is_empty());

        let week = engine.week(Some(&user()), key()).unwrap();
        assert_eq!(names(&week, DayKey::Monday), vec!["Leg Day", "Run"]);
        assert!(week.updated_at.is_some());
    }

    #[test]
    fn test_add_workout_rejects_blank_names() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);

        let err = engine
            .add_workout(&user(), key(), DayKey::Monday, WorkoutSpec::ad_hoc("  "))
            .unwrap_err();
        assert!(err.is_validation());
        // Nothing was written
        assert!(store.load_week(&user(), key()).unwrap().is_none());
    }

    #[test]
    fn test_template_edits_do_not_propagate() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);

        let mut spec = template_spec("Leg Day");
        engine
            .add_workout(&user(), key(), DayKey::Monday, spec.clone())
            .unwrap();
        if let WorkoutSpec::Template { exercises, .. } = &mut spec {
            exercises[0].sets = 10;
        }

        let week = engine.week(Some(&user()), key()).unwrap();
        assert_eq!(week.day(DayKey::Monday)[0].exercises[0].sets, 3);
    }

    #[test]
    fn test_indices_stay_dense_through_adds_and_removes() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);
        let day = DayKey::Wednesday;

        for name in ["a", "b", "c", "d"] {
            engine
                .add_workout(&user(), key(), day, WorkoutSpec::ad_hoc(name))
                .unwrap();
        }
        let removed = engine.remove_workout(&user(), key(), day, 1).unwrap();
        assert_eq!(removed.display_name(), "b");
        engine.remove_workout(&user(), key(), day, 2).unwrap();
        engine
            .add_workout(&user(), key(), day, WorkoutSpec::ad_hoc("e"))
            .unwrap();

        let week = engine.week(Some(&user()), key()).unwrap();
        assert_eq!(names(&week, day), vec!["a", "c", "e"]);

        // Every index 0..n-1 addresses a workout, n does not
        for i in 0..3 {
            assert!(engine.scheduled_workout(&user(), key(), day, i).is_ok());
        }
        assert!(engine
            .remove_workout(&user(), key(), day, 3)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_update_out_of_range_is_not_found() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);

        let err = engine
            .update_workout(&user(), key(), DayKey::Friday, 0, WorkoutPatch::completed())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_completion_is_one_way() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);
        engine
            .add_workout(&user(), key(), DayKey::Monday, WorkoutSpec::ad_hoc("Run"))
            .unwrap();

        let first = engine
            .update_workout(&user(), key(), DayKey::Monday, 0, WorkoutPatch::completed())
            .unwrap();
        assert!(first.is_completed);

        // Second application is a successful no-op
        let second = engine
            .update_workout(&user(), key(), DayKey::Monday, 0, WorkoutPatch::completed())
            .unwrap();
        assert!(second.is_completed);

        let undo = WorkoutPatch {
            is_completed: Some(false),
            ..Default::default()
        };
        assert!(engine
            .update_workout(&user(), key(), DayKey::Monday, 0, undo)
            .unwrap_err()
            .is_validation());

        let week = engine.week(Some(&user()), key()).unwrap();
        assert!(week.day(DayKey::Monday)[0].is_completed);
        assert_eq!(week.completion(), (1, 1));
    }

    #[test]
    fn test_rename_only_for_ad_hoc() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);
        engine
            .add_workout(&user(), key(), DayKey::Monday, WorkoutSpec::ad_hoc("Run"))
            .unwrap();
        engine
            .add_workout(&user(), key(), DayKey::Monday, template_spec("Legs"))
            .unwrap();

        let rename = |name: &str| WorkoutPatch {
            custom_name: Some(name.into()),
            ..Default::default()
        };
        let renamed = engine
            .update_workout(&user(), key(), DayKey::Monday, 0, rename("Long Run"))
            .unwrap();
        assert_eq!(renamed.display_name(), "Long Run");

        assert!(engine
            .update_workout(&user(), key(), DayKey::Monday, 1, rename("Arms"))
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_mark_completed_follows_moved_instance() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);
        let day = DayKey::Thursday;
        engine
            .add_workout(&user(), key(), day, WorkoutSpec::ad_hoc("warmup"))
            .unwrap();
        engine
            .add_workout(&user(), key(), day, WorkoutSpec::ad_hoc("main"))
            .unwrap();

        let target = engine.scheduled_workout(&user(), key(), day, 1).unwrap();
        // Another action removes the entry before it; the cached index is stale
        engine.remove_workout(&user(), key(), day, 0).unwrap();

        let done = engine.mark_completed(&user(), &target.slot).unwrap();
        assert_eq!(done.id, target.instance.id);
        let week = engine.week(Some(&user()), key()).unwrap();
        assert!(week.day(day)[0].is_completed);

        // Idempotent repair
        engine.mark_completed(&user(), &target.slot).unwrap();

        engine.remove_workout(&user(), key(), day, 0).unwrap();
        assert!(engine
            .mark_completed(&user(), &target.slot)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_repair_completes_only_open_slots() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);
        let day = DayKey::Friday;
        for name in ["a", "b", "gone"] {
            engine
                .add_workout(&user(), key(), day, WorkoutSpec::ad_hoc(name))
                .unwrap();
        }
        let slots: Vec<SlotRef> = (0..3)
            .map(|i| engine.scheduled_workout(&user(), key(), day, i).unwrap().slot)
            .collect();
        engine.mark_completed(&user(), &slots[1]).unwrap();
        engine.remove_workout(&user(), key(), day, 2).unwrap();

        let logs: Vec<WorkoutLog> = slots
            .iter()
            .map(|slot| WorkoutLog {
                id: Uuid::new_v4(),
                name: String::new(),
                date: None,
                logged_at: Utc::now(),
                template_id: None,
                template_name: None,
                slot: Some(slot.clone()),
                exercises: vec![],
                duration_minutes: 0,
                notes: String::new(),
            })
            .collect();

        let repaired = engine.repair_completions(&user(), &logs).unwrap();
        assert_eq!(repaired, vec![slots[0].clone()]);
        assert_eq!(engine.week(Some(&user()), key()).unwrap().completion(), (2, 2));
        assert!(engine.repair_completions(&user(), &logs).unwrap().is_empty());
    }

    /// Known race window: two sessions editing the same day are last-write-wins.
    #[test]
    fn test_stale_day_write_loses_concurrent_add() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);
        let day = DayKey::Saturday;
        engine
            .add_workout(&user(), key(), day, WorkoutSpec::ad_hoc("mine"))
            .unwrap();

        // Session A reads the day...
        let stale = engine.week(Some(&user()), key()).unwrap().day(day).to_vec();
        // ...session B adds a workout...
        engine
            .add_workout(&user(), key(), day, WorkoutSpec::ad_hoc("theirs"))
            .unwrap();
        // ...and A writes back its stale copy, dropping B's add.
        store.write_day(&user(), key(), day, stale).unwrap();

        let week = engine.week(Some(&user()), key()).unwrap();
        assert_eq!(names(&week, day), vec!["mine"]);
    }

    #[test]
    fn test_other_days_survive_day_writes() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);
        engine
            .add_workout(&user(), key(), DayKey::Monday, WorkoutSpec::ad_hoc("a"))
            .unwrap();
        engine
            .add_workout(&user(), key(), DayKey::Tuesday, WorkoutSpec::ad_hoc("b"))
            .unwrap();
        engine.remove_workout(&user(), key(), DayKey::Tuesday, 0).unwrap();

        let week = engine.week(Some(&user()), key()).unwrap();
        assert_eq!(names(&week, DayKey::Monday), vec!["a"]);
        assert!(week.day(DayKey::Tuesday).is_empty());
    }

    #[test]
    fn test_watch_week_stops_after_drop() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);
        let date = NaiveDate::from_ymd_opt(2026, 2, 3).unwrap();
        let counts = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&counts);
        let sub = engine
            .watch_week(&user(), date, move |week| {
                sink.lock().unwrap().push(week.completion().0);
            })
            .unwrap();

        engine
            .add_workout(&user(), key(), DayKey::Monday, WorkoutSpec::ad_hoc("a"))
            .unwrap();
        sub.unsubscribe();
        engine
            .add_workout(&user(), key(), DayKey::Monday, WorkoutSpec::ad_hoc("b"))
            .unwrap();

        assert_eq!(*counts.lock().unwrap(), vec![0, 1]);
    }
}
