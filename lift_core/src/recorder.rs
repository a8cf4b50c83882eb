//! Workout logging sessions.
//!
//! A [`LogSession`] is seeded from a scheduled workout (or starts empty),
//! edited set by set and finally consumed by [`LogSession::finish`], which
//! persists an immutable [`WorkoutLog`] and then marks the scheduled slot
//! completed. The two writes are not atomic: when the second one fails the
//! log is already durable and the outcome says so.

use crate::clock::Clock;
use crate::schedule::{ScheduleEngine, ScheduledWorkout};
use crate::store::{LogRepo, ScheduleRepo};
use crate::{
    Error, Exercise, ExerciseLookup, ExercisePrescription, LoggedExercise, NewWorkoutLog, Result,
    SetRecord, UserId, WeightUnit, WorkoutInstance, WorkoutLog,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Name used when neither a template nor a custom name is available
pub const DEFAULT_WORKOUT_NAME: &str = "Workout";

/// Fallback volume for prescriptions (or new sets) that leave fields at zero
#[derive(Clone, Debug, PartialEq)]
pub struct SessionDefaults {
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    pub unit: WeightUnit,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            sets: 3,
            reps: 10,
            weight: 0.0,
            unit: WeightUnit::Kg,
        }
    }
}

/// Lifecycle of a session. Finishing consumes the session, so there is no
/// observable finished state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Seeded, not yet edited
    Initialized,
    /// At least one edit applied
    InProgress,
}

/// Single-field edit of a set record
#[derive(Clone, Debug, PartialEq)]
pub enum SetUpdate {
    Reps(u32),
    Weight(f64),
    Unit(WeightUnit),
    Completed(bool),
}

impl SetUpdate {
    /// Coerce raw text input for `field`.
    ///
    /// Numeric fields treat empty input as 0. Fractional reps are rounded.
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        match field.to_lowercase().as_str() {
            "reps" => Ok(SetUpdate::Reps(parse_number(field, raw)?.round() as u32)),
            "weight" => Ok(SetUpdate::Weight(parse_number(field, raw)?)),
            "unit" | "weight_unit" => Ok(SetUpdate::Unit(raw.parse()?)),
            "completed" | "done" => {
                let value = match raw.to_lowercase().as_str() {
                    "true" | "yes" | "y" | "1" | "x" => true,
                    "false" | "no" | "n" | "0" | "" => false,
                    other => {
                        return Err(Error::Validation(format!(
                            "expected yes/no for completed, got {:?}",
                            other
                        )))
                    }
                };
                Ok(SetUpdate::Completed(value))
            }
            _ => Err(Error::Validation(format!("unknown set field {:?}", field))),
        }
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64> {
    if raw.is_empty() {
        return Ok(0.0);
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| Error::Validation(format!("{} must be a number, got {:?}", field, raw)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Validation(format!(
            "{} must be a non-negative number, got {}",
            field, raw
        )));
    }
    Ok(value)
}

/// Result of a successful log write
#[derive(Debug)]
pub enum FinishOutcome {
    /// Nothing was scheduled; only the log was written
    Standalone(WorkoutLog),
    /// Log written and the scheduled workout marked completed
    Completed {
        log: WorkoutLog,
        instance: WorkoutInstance,
    },
    /// Log written but the completion flag could not be set.
    ///
    /// Retry with [`ScheduleEngine::mark_completed`] on `log.slot`.
    SlotUpdateFailed { log: WorkoutLog, error: Error },
}

impl FinishOutcome {
    pub fn log(&self) -> &WorkoutLog {
        match self {
            FinishOutcome::Standalone(log)
            | FinishOutcome::Completed { log, .. }
            | FinishOutcome::SlotUpdateFailed { log, .. } => log,
        }
    }

    pub fn into_log(self) -> WorkoutLog {
        match self {
            FinishOutcome::Standalone(log)
            | FinishOutcome::Completed { log, .. }
            | FinishOutcome::SlotUpdateFailed { log, .. } => log,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, FinishOutcome::SlotUpdateFailed { .. })
    }
}

/// An open logging session
pub struct LogSession {
    name: String,
    scheduled: Option<ScheduledWorkout>,
    exercises: Vec<LoggedExercise>,
    defaults: SessionDefaults,
    state: SessionState,
    started_at: DateTime<Utc>,
    clock: Arc<dyn Clock>,
}

impl LogSession {
    /// Open a session, prefilled from `scheduled` when given
    pub fn start(
        scheduled: Option<ScheduledWorkout>,
        defaults: &SessionDefaults,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (name, exercises) = match &scheduled {
            Some(workout) => {
                let mut prescriptions: Vec<&ExercisePrescription> =
                    workout.instance.exercises.iter().collect();
                prescriptions.sort_by_key(|p| p.order);
                (
                    workout.instance.display_name().to_string(),
                    prescriptions
                        .into_iter()
                        .map(|p| seed_exercise(p, defaults))
                        .collect(),
                )
            }
            None => (DEFAULT_WORKOUT_NAME.to_string(), Vec::new()),
        };

        let started_at = clock.now();
        tracing::info!(
            "Started logging {:?} with {} exercises",
            name,
            exercises.len()
        );

        Self {
            name,
            scheduled,
            exercises,
            defaults: defaults.clone(),
            state: SessionState::Initialized,
            started_at,
            clock,
        }
    }

    /// Fill in muscle groups for exercises the library still knows
    pub fn with_lookup(mut self, lookup: &ExerciseLookup) -> Self {
        for exercise in &mut self.exercises {
            if exercise.muscle_group.is_none() {
                exercise.muscle_group = exercise
                    .exercise_id
                    .and_then(|id| lookup.get(&id))
                    .map(|e| e.muscle_group);
            }
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename a standalone session; blank names fall back to "Workout"
    pub fn set_name(&mut self, name: &str) {
        let name = name.trim();
        self.name = if name.is_empty() {
            DEFAULT_WORKOUT_NAME.to_string()
        } else {
            name.to_string()
        };
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn scheduled(&self) -> Option<&ScheduledWorkout> {
        self.scheduled.as_ref()
    }

    pub fn exercises(&self) -> &[LoggedExercise] {
        &self.exercises
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole seconds since the session started
    pub fn elapsed_seconds(&self) -> i64 {
        (self.clock.now() - self.started_at).num_seconds().max(0)
    }

    /// Elapsed time rounded to the nearest minute
    pub fn duration_minutes(&self) -> u32 {
        (self.elapsed_seconds() as f64 / 60.0).round() as u32
    }

    /// Append a set copying the previous one's reps, weight and unit
    pub fn add_set(&mut self, exercise: usize) -> Result<&SetRecord> {
        let defaults = self.defaults.clone();
        let entry = self.exercise_mut(exercise)?;
        let template = entry.sets.last();
        let set = SetRecord {
            set_number: entry.sets.len() as u32 + 1,
            reps: template.map_or(defaults.reps, |s| s.reps),
            weight: template.map_or(defaults.weight, |s| s.weight),
            weight_unit: template.map_or(defaults.unit, |s| s.weight_unit),
            completed: false,
        };
        entry.sets.push(set);
        self.touch();
        let sets = &self.exercises[exercise].sets;
        Ok(&sets[sets.len() - 1])
    }

    /// Remove a set; the remaining sets are renumbered from 1
    pub fn remove_set(&mut self, exercise: usize, set: usize) -> Result<SetRecord> {
        let entry = self.exercise_mut(exercise)?;
        check_set(entry, set)?;
        let removed = entry.sets.remove(set);
        renumber(&mut entry.sets);
        self.touch();
        Ok(removed)
    }

    pub fn update_set(&mut self, exercise: usize, set: usize, update: SetUpdate) -> Result<()> {
        let entry = self.exercise_mut(exercise)?;
        check_set(entry, set)?;
        let record = &mut entry.sets[set];
        match update {
            SetUpdate::Reps(reps) => record.reps = reps,
            SetUpdate::Weight(weight) => {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(Error::Validation(format!("invalid weight {}", weight)));
                }
                record.weight = weight;
            }
            SetUpdate::Unit(unit) => record.weight_unit = unit,
            SetUpdate::Completed(done) => record.completed = done,
        }
        self.touch();
        Ok(())
    }

    /// Mark every set of every exercise completed
    pub fn complete_all_sets(&mut self) {
        for set in self.exercises.iter_mut().flat_map(|e| e.sets.iter_mut()) {
            set.completed = true;
        }
        self.touch();
    }

    /// Add an exercise to the session; returns its index.
    ///
    /// With a library exercise the sets are seeded from its defaults,
    /// otherwise from the session defaults.
    pub fn add_exercise(&mut self, name: &str, exercise: Option<&Exercise>) -> Result<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("exercise name must not be empty".into()));
        }

        let prescription = match exercise {
            Some(exercise) => ExercisePrescription {
                exercise_name: name.to_string(),
                ..ExercisePrescription::from_exercise(exercise)
            },
            None => ExercisePrescription {
                exercise_id: None,
                exercise_name: name.to_string(),
                sets: 0,
                reps: 0,
                weight: 0.0,
                weight_unit: self.defaults.unit,
                order: 0,
            },
        };
        let mut logged = seed_exercise(&prescription, &self.defaults);
        logged.muscle_group = exercise.map(|e| e.muscle_group);

        self.exercises.push(logged);
        self.touch();
        Ok(self.exercises.len() - 1)
    }

    pub fn remove_exercise(&mut self, exercise: usize) -> Result<LoggedExercise> {
        self.exercise_mut(exercise)?;
        let removed = self.exercises.remove(exercise);
        self.touch();
        Ok(removed)
    }

    /// Persist the log, then mark the scheduled slot completed.
    ///
    /// An error means nothing was written. Once the log is stored the result
    /// is always `Ok`, with a failed completion reported as
    /// [`FinishOutcome::SlotUpdateFailed`].
    pub fn finish<L, S>(
        self,
        notes: &str,
        logs: &L,
        schedule: &ScheduleEngine<'_, S>,
        user: &UserId,
    ) -> Result<FinishOutcome>
    where
        L: LogRepo,
        S: ScheduleRepo,
    {
        let duration_minutes = self.duration_minutes();
        let (template_id, template_name, slot) = match &self.scheduled {
            Some(workout) => (
                workout.instance.template_id(),
                workout.instance.template_name().map(str::to_string),
                Some(workout.slot.clone()),
            ),
            None => (None, None, None),
        };

        let draft = NewWorkoutLog {
            name: self.name,
            date: self.clock.now(),
            template_id,
            template_name,
            slot,
            exercises: self.exercises,
            duration_minutes,
            notes: notes.trim().to_string(),
        };

        let log = logs.append_log(user, draft)?;
        tracing::info!(
            "Logged {:?} ({} exercises, {} min)",
            log.name,
            log.exercises.len(),
            log.duration_minutes
        );

        let Some(slot) = log.slot.clone() else {
            return Ok(FinishOutcome::Standalone(log));
        };

        match schedule.mark_completed(user, &slot) {
            Ok(instance) => Ok(FinishOutcome::Completed { log, instance }),
            Err(error) => {
                tracing::warn!(
                    "Log {} saved but {} {} #{} could not be marked completed: {}",
                    log.id,
                    slot.week_key,
                    slot.day,
                    slot.index,
                    error
                );
                Ok(FinishOutcome::SlotUpdateFailed { log, error })
            }
        }
    }

    fn exercise_mut(&mut self, index: usize) -> Result<&mut LoggedExercise> {
        let len = self.exercises.len();
        self.exercises.get_mut(index).ok_or_else(|| {
            Error::Validation(format!(
                "exercise index {} out of range (session has {})",
                index, len
            ))
        })
    }

    fn touch(&mut self) {
        if self.state == SessionState::Initialized {
            tracing::debug!("Session {:?} in progress", self.name);
            self.state = SessionState::InProgress;
        }
    }
}

/// Prefilled, not yet completed sets for one prescription
fn seed_exercise(prescription: &ExercisePrescription, defaults: &SessionDefaults) -> LoggedExercise {
    let sets = if prescription.sets > 0 {
        prescription.sets
    } else {
        defaults.sets
    };
    let reps = if prescription.reps > 0 {
        prescription.reps
    } else {
        defaults.reps
    };
    let weight = if prescription.weight > 0.0 {
        prescription.weight
    } else {
        defaults.weight
    };

    LoggedExercise {
        exercise_id: prescription.exercise_id,
        exercise_name: prescription.exercise_name.clone(),
        muscle_group: None,
        sets: (1..=sets)
            .map(|set_number| SetRecord {
                set_number,
                reps,
                weight,
                weight_unit: prescription.weight_unit,
                completed: false,
            })
            .collect(),
    }
}

fn check_set(exercise: &LoggedExercise, set: usize) -> Result<()> {
    if set >= exercise.sets.len() {
        return Err(Error::Validation(format!(
            "set index {} out of range ({} has {} sets)",
            set,
            exercise.exercise_name,
            exercise.sets.len()
        )));
    }
    Ok(())
}

fn renumber(sets: &mut [SetRecord]) {
    for (i, set) in sets.iter_mut().enumerate() {
        set.set_number = i as u32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::memory_store::MemoryStore;
    use crate::store::SortOrder;
    use crate::subscription::Subscription;
    use crate::week::{DayKey, WeekKey};
    use crate::{MuscleGroup, Week, WorkoutSpec};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn user() -> UserId {
        UserId::new("tester").unwrap()
    }

    fn key() -> WeekKey {
        "2026-W06".parse().unwrap()
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 2, 3, 18, 0, 0).unwrap(),
        ))
    }

    fn prescription(name: &str, sets: u32, reps: u32, weight: f64, order: u32) -> ExercisePrescription {
        ExercisePrescription {
            exercise_id: Some(Uuid::new_v4()),
            exercise_name: name.into(),
            sets,
            reps,
            weight,
            weight_unit: WeightUnit::Kg,
            order,
        }
    }

    fn leg_day() -> WorkoutSpec {
        WorkoutSpec::Template {
            template_id: Some(Uuid::new_v4()),
            template_name: "Leg Day".into(),
            exercises: vec![
                prescription("Squat", 3, 5, 100.0, 0),
                prescription("Lunge", 3, 10, 20.0, 1),
                prescription("Calf Raise", 3, 15, 40.0, 2),
            ],
        }
    }

    fn schedule_leg_day(store: &MemoryStore) -> ScheduledWorkout {
        let engine = ScheduleEngine::new(store);
        engine
            .add_workout(&user(), key(), DayKey::Tuesday, leg_day())
            .unwrap();
        engine
            .scheduled_workout(&user(), key(), DayKey::Tuesday, 0)
            .unwrap()
    }

    #[test]
    fn test_start_prefills_sets_from_prescriptions() {
        let store = MemoryStore::new();
        let scheduled = schedule_leg_day(&store);

        let session = LogSession::start(Some(scheduled), &SessionDefaults::default(), clock());
        assert_eq!(session.name(), "Leg Day");
        assert_eq!(session.state(), SessionState::Initialized);
        assert_eq!(session.exercises().len(), 3);
        for exercise in session.exercises() {
            let numbers: Vec<u32> = exercise.sets.iter().map(|s| s.set_number).collect();
            assert_eq!(numbers, vec![1, 2, 3]);
            assert!(exercise.sets.iter().all(|s| !s.completed));
        }
        assert_eq!(session.exercises()[0].sets[0].weight, 100.0);
    }

    #[test]
    fn test_zero_prescription_falls_back_to_defaults() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);
        engine
            .add_workout(
                &user(),
                key(),
                DayKey::Monday,
                WorkoutSpec::Template {
                    template_id: None,
                    template_name: "Sparse".into(),
                    exercises: vec![prescription("Plank", 0, 0, 0.0, 0)],
                },
            )
            .unwrap();
        let scheduled = engine
            .scheduled_workout(&user(), key(), DayKey::Monday, 0)
            .unwrap();

        let session = LogSession::start(Some(scheduled), &SessionDefaults::default(), clock());
        let sets = &session.exercises()[0].sets;
        assert_eq!(sets.len(), 3);
        assert!(sets.iter().all(|s| s.reps == 10 && s.weight == 0.0));
    }

    #[test]
    fn test_standalone_session_naming() {
        let mut session = LogSession::start(None, &SessionDefaults::default(), clock());
        assert_eq!(session.name(), "Workout");
        assert!(session.exercises().is_empty());

        session.set_name("Evening Pump");
        assert_eq!(session.name(), "Evening Pump");
        session.set_name("  ");
        assert_eq!(session.name(), "Workout");
    }

    #[test]
    fn test_set_edits_keep_numbering_dense() {
        let mut session = LogSession::start(None, &SessionDefaults::default(), clock());
        let idx = session.add_exercise("Row", None).unwrap();
        assert_eq!(session.state(), SessionState::InProgress);
        assert_eq!(session.exercises()[idx].sets.len(), 3);

        session
            .update_set(idx, 2, SetUpdate::parse("weight", "42.5").unwrap())
            .unwrap();
        let added = session.add_set(idx).unwrap().clone();
        assert_eq!(added.set_number, 4);
        assert_eq!(added.weight, 42.5);
        assert!(!added.completed);

        session.remove_set(idx, 1).unwrap();
        let numbers: Vec<u32> = session.exercises()[idx]
            .sets
            .iter()
            .map(|s| s.set_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        assert!(session.remove_set(idx, 9).unwrap_err().is_validation());
        assert!(session.add_set(5).unwrap_err().is_validation());
    }

    #[test]
    fn test_add_set_on_empty_exercise_uses_defaults() {
        let mut session = LogSession::start(None, &SessionDefaults::default(), clock());
        let idx = session.add_exercise("Dips", None).unwrap();
        for _ in 0..3 {
            session.remove_set(idx, 0).unwrap();
        }
        let set = session.add_set(idx).unwrap();
        assert_eq!((set.set_number, set.reps, set.weight), (1, 10, 0.0));
        assert_eq!(set.weight_unit, WeightUnit::Kg);
    }

    #[test]
    fn test_set_update_parse() {
        assert_eq!(SetUpdate::parse("reps", "").unwrap(), SetUpdate::Reps(0));
        assert_eq!(SetUpdate::parse("reps", "8").unwrap(), SetUpdate::Reps(8));
        assert_eq!(SetUpdate::parse("weight", " 62.5 ").unwrap(), SetUpdate::Weight(62.5));
        assert_eq!(
            SetUpdate::parse("unit", "lbs").unwrap(),
            SetUpdate::Unit(WeightUnit::Lbs)
        );
        assert_eq!(
            SetUpdate::parse("completed", "yes").unwrap(),
            SetUpdate::Completed(true)
        );
        assert!(SetUpdate::parse("weight", "heavy").unwrap_err().is_validation());
        assert!(SetUpdate::parse("weight", "-5").is_err());
        assert!(SetUpdate::parse("tempo", "3").is_err());
    }

    #[test]
    fn test_add_exercise_from_library() {
        let exercise = Exercise {
            id: Uuid::new_v4(),
            name: "Bench Press".into(),
            muscle_group: MuscleGroup::Chest,
            description: None,
            default_sets: 5,
            default_reps: 5,
            default_weight: 80.0,
            weight_unit: WeightUnit::Kg,
            created_at: None,
        };
        let mut session = LogSession::start(None, &SessionDefaults::default(), clock());
        let idx = session.add_exercise("Bench Press", Some(&exercise)).unwrap();

        let logged = &session.exercises()[idx];
        assert_eq!(logged.exercise_id, Some(exercise.id));
        assert_eq!(logged.muscle_group, Some(MuscleGroup::Chest));
        assert_eq!(logged.sets.len(), 5);
        assert!(session.add_exercise("  ", None).unwrap_err().is_validation());

        let removed = session.remove_exercise(idx).unwrap();
        assert_eq!(removed.exercise_name, "Bench Press");
        assert!(session.exercises().is_empty());
    }

    #[test]
    fn test_finish_logs_and_completes_slot() {
        let store = MemoryStore::new();
        let scheduled = schedule_leg_day(&store);
        let clock = clock();
        let engine = ScheduleEngine::new(&store);

        let mut session = LogSession::start(Some(scheduled), &SessionDefaults::default(), clock.clone());
        session.update_set(0, 0, SetUpdate::Completed(true)).unwrap();
        clock.advance(Duration::seconds(45 * 60 + 31));

        let outcome = session.finish("  felt strong ", &store, &engine, &user()).unwrap();
        let FinishOutcome::Completed { log, instance } = outcome else {
            panic!("expected completed outcome");
        };
        assert!(instance.is_completed);
        assert_eq!(log.duration_minutes, 46);
        assert_eq!(log.notes, "felt strong");
        assert_eq!(log.name, "Leg Day");
        assert_eq!(log.template_name.as_deref(), Some("Leg Day"));
        assert_eq!(log.exercises.len(), 3);
        assert!(log.slot.is_some());

        let week = engine.week(Some(&user()), key()).unwrap();
        assert!(week.day(DayKey::Tuesday)[0].is_completed);
        let stored = store
            .query_logs(&user(), SortOrder::Descending, None, None)
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn test_finish_standalone() {
        let store = MemoryStore::new();
        let engine = ScheduleEngine::new(&store);
        let mut session = LogSession::start(None, &SessionDefaults::default(), clock());
        session.add_exercise("Run", None).unwrap();

        let outcome = session.finish("", &store, &engine, &user()).unwrap();
        assert!(matches!(outcome, FinishOutcome::Standalone(_)));
        assert_eq!(outcome.log().name, "Workout");
        assert_eq!(outcome.log().duration_minutes, 0);
        assert!(outcome.log().template_id.is_none());
    }

    /// Schedule store whose day writes always fail
    struct ReadOnlySchedule<'a>(&'a MemoryStore);

    impl ScheduleRepo for ReadOnlySchedule<'_> {
        fn load_week(&self, user: &UserId, week: WeekKey) -> Result<Option<Week>> {
            self.0.load_week(user, week)
        }

        fn write_day(
            &self,
            _user: &UserId,
            _week: WeekKey,
            _day: DayKey,
            _workouts: Vec<WorkoutInstance>,
        ) -> Result<Week> {
            Err(Error::Store("schedule backend unavailable".into()))
        }

        fn watch_week(
            &self,
            user: &UserId,
            week: WeekKey,
            handler: Box<dyn Fn(&Week) + Send + Sync>,
        ) -> Result<Subscription> {
            self.0.watch_week(user, week, handler)
        }
    }

    #[test]
    fn test_partial_finish_is_surfaced_and_repairable() {
        let store = MemoryStore::new();
        let scheduled = schedule_leg_day(&store);
        let failing = ReadOnlySchedule(&store);
        let broken_engine = ScheduleEngine::new(&failing);

        let session = LogSession::start(Some(scheduled), &SessionDefaults::default(), clock());
        let outcome = session.finish("", &store, &broken_engine, &user()).unwrap();
        assert!(outcome.is_partial());
        let log = outcome.into_log();

        // The log is durable, the slot is still open
        let stored = store
            .query_logs(&user(), SortOrder::Descending, None, None)
            .unwrap();
        assert_eq!(stored[0].id, log.id);
        let engine = ScheduleEngine::new(&store);
        assert!(!engine.week(Some(&user()), key()).unwrap().day(DayKey::Tuesday)[0].is_completed);

        // Repair through the recorded slot
        let slot = log.slot.unwrap();
        engine.mark_completed(&user(), &slot).unwrap();
        assert!(engine.week(Some(&user()), key()).unwrap().day(DayKey::Tuesday)[0].is_completed);
    }

    #[test]
    fn test_with_lookup_denormalizes_muscle_group() {
        let store = MemoryStore::new();
        let scheduled = schedule_leg_day(&store);
        let squat_id = scheduled.instance.exercises[0].exercise_id.unwrap();
        let mut lookup = ExerciseLookup::new();
        lookup.insert(
            squat_id,
            Exercise {
                id: squat_id,
                name: "Squat".into(),
                muscle_group: MuscleGroup::Legs,
                description: None,
                default_sets: 3,
                default_reps: 5,
                default_weight: 100.0,
                weight_unit: WeightUnit::Kg,
                created_at: None,
            },
        );

        let session = LogSession::start(Some(scheduled), &SessionDefaults::default(), clock())
            .with_lookup(&lookup);
        assert_eq!(session.exercises()[0].muscle_group, Some(MuscleGroup::Legs));
        assert_eq!(session.exercises()[1].muscle_group, None);
    }
}
