//! In-process document store.
//!
//! Keeps every collection in memory behind a mutex. Used by tests and by
//! embedders that bring their own persistence.

use crate::clock::{Clock, SystemClock};
use crate::store::{
    apply_exercise_update, page_logs, sort_exercises, sort_templates, subscribe_with_snapshot,
    ExerciseRepo, LogCursor, LogRepo, ScheduleRepo, SortOrder, TemplateRepo, Watchers,
};
use crate::subscription::Subscription;
use crate::week::{DayKey, WeekKey};
use crate::{
    Error, Exercise, ExerciseId, ExerciseUpdate, NewExercise, NewWorkoutLog, Result, Template,
    TemplateDraft, TemplateId, UserId, Week, WorkoutInstance, WorkoutLog,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct UserDocs {
    exercises: Vec<Exercise>,
    templates: Vec<Template>,
    weeks: HashMap<WeekKey, Week>,
    logs: Vec<WorkoutLog>,
}

/// Document store held entirely in memory
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    users: Mutex<HashMap<UserId, UserDocs>>,
    watchers: Watchers,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Use `clock` for store-assigned timestamps
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            users: Mutex::new(HashMap::new()),
            watchers: Watchers::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, UserDocs>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` against the user's documents; an unknown user reads as empty
    fn read_user<R: Default>(&self, user: &UserId, f: impl FnOnce(&UserDocs) -> R) -> R {
        self.lock().get(user).map(f).unwrap_or_default()
    }

    /// Run `f` against the user's documents, creating them on first write
    fn with_user<R>(&self, user: &UserId, f: impl FnOnce(&mut UserDocs) -> R) -> R {
        let mut users = self.lock();
        f(users.entry(user.clone()).or_default())
    }

    fn sorted_exercises(docs: &UserDocs) -> Vec<Exercise> {
        let mut list = docs.exercises.clone();
        sort_exercises(&mut list);
        list
    }

    fn sorted_templates(docs: &UserDocs) -> Vec<Template> {
        let mut list = docs.templates.clone();
        sort_templates(&mut list);
        list
    }
}

impl ExerciseRepo for MemoryStore {
    fn list_exercises(&self, user: &UserId) -> Result<Vec<Exercise>> {
        Ok(self.read_user(user, |docs| Self::sorted_exercises(docs)))
    }

    fn get_exercise(&self, user: &UserId, id: ExerciseId) -> Result<Option<Exercise>> {
        Ok(self.read_user(user, |docs| {
            docs.exercises.iter().find(|e| e.id == id).cloned()
        }))
    }

    fn insert_exercise(&self, user: &UserId, exercise: NewExercise) -> Result<Exercise> {
        let stored = Exercise {
            id: Uuid::new_v4(),
            name: exercise.name,
            muscle_group: exercise.muscle_group,
            description: exercise.description,
            default_sets: exercise.default_sets,
            default_reps: exercise.default_reps,
            default_weight: exercise.default_weight,
            weight_unit: exercise.weight_unit,
            created_at: Some(self.clock.now()),
        };

        let snapshot = self.with_user(user, |docs| {
            docs.exercises.push(stored.clone());
            Self::sorted_exercises(docs)
        });
        self.watchers.exercises.publish(user, &snapshot);
        Ok(stored)
    }

    fn update_exercise(
        &self,
        user: &UserId,
        id: ExerciseId,
        update: ExerciseUpdate,
    ) -> Result<Exercise> {
        let (updated, snapshot) = self.with_user(user, |docs| {
            let exercise = docs
                .exercises
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| Error::NotFound(format!("exercise {}", id)))?;
            apply_exercise_update(exercise, update);
            let updated = exercise.clone();
            Ok::<_, Error>((updated, Self::sorted_exercises(docs)))
        })?;
        self.watchers.exercises.publish(user, &snapshot);
        Ok(updated)
    }

    fn delete_exercise(&self, user: &UserId, id: ExerciseId) -> Result<()> {
        let snapshot = self.with_user(user, |docs| {
            let before = docs.exercises.len();
            docs.exercises.retain(|e| e.id != id);
            if docs.exercises.len() == before {
                return Err(Error::NotFound(format!("exercise {}", id)));
            }
            Ok(Self::sorted_exercises(docs))
        })?;
        self.watchers.exercises.publish(user, &snapshot);
        Ok(())
    }

    fn watch_exercises(
        &self,
        user: &UserId,
        handler: Box<dyn Fn(&Vec<Exercise>) + Send + Sync>,
    ) -> Result<Subscription> {
        subscribe_with_snapshot(
            &self.watchers.exercises,
            user.clone(),
            handler,
            || self.list_exercises(user),
        )
    }
}

impl TemplateRepo for MemoryStore {
    fn list_templates(&self, user: &UserId) -> Result<Vec<Template>> {
        Ok(self.read_user(user, |docs| Self::sorted_templates(docs)))
    }

    fn get_template(&self, user: &UserId, id: TemplateId) -> Result<Option<Template>> {
        Ok(self.read_user(user, |docs| {
            docs.templates.iter().find(|t| t.id == id).cloned()
        }))
    }

    fn insert_template(&self, user: &UserId, draft: TemplateDraft) -> Result<Template> {
        let now = self.clock.now();
        let stored = Template {
            id: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            exercises: draft.exercises,
            created_at: Some(now),
            updated_at: Some(now),
        };

        let snapshot = self.with_user(user, |docs| {
            docs.templates.push(stored.clone());
            Self::sorted_templates(docs)
        });
        self.watchers.templates.publish(user, &snapshot);
        Ok(stored)
    }

    fn replace_template(
        &self,
        user: &UserId,
        id: TemplateId,
        draft: TemplateDraft,
    ) -> Result<Template> {
        let now = self.clock.now();
        let (updated, snapshot) = self.with_user(user, |docs| {
            let template = docs
                .templates
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| Error::NotFound(format!("template {}", id)))?;
            template.name = draft.name;
            template.description = draft.description;
            template.exercises = draft.exercises;
            template.updated_at = Some(now);
            let updated = template.clone();
            Ok::<_, Error>((updated, Self::sorted_templates(docs)))
        })?;
        self.watchers.templates.publish(user, &snapshot);
        Ok(updated)
    }

    fn delete_template(&self, user: &UserId, id: TemplateId) -> Result<()> {
        let snapshot = self.with_user(user, |docs| {
            let before = docs.templates.len();
            docs.templates.retain(|t| t.id != id);
            if docs.templates.len() == before {
                return Err(Error::NotFound(format!("template {}", id)));
            }
            Ok(Self::sorted_templates(docs))
        })?;
        self.watchers.templates.publish(user, &snapshot);
        Ok(())
    }

    fn watch_templates(
        &self,
        user: &UserId,
        handler: Box<dyn Fn(&Vec<Template>) + Send + Sync>,
    ) -> Result<Subscription> {
        subscribe_with_snapshot(
            &self.watchers.templates,
            user.clone(),
            handler,
            || self.list_templates(user),
        )
    }
}

impl ScheduleRepo for MemoryStore {
    fn load_week(&self, user: &UserId, week: WeekKey) -> Result<Option<Week>> {
        Ok(self.read_user(user, |docs| docs.weeks.get(&week).cloned()))
    }

    fn write_day(
        &self,
        user: &UserId,
        week: WeekKey,
        day: DayKey,
        workouts: Vec<WorkoutInstance>,
    ) -> Result<Week> {
        let now = self.clock.now();
        let stored = self.with_user(user, |docs| {
            let doc = docs.weeks.entry(week).or_insert_with(|| Week::empty(week));
            doc.days.get_mut(day).workouts = workouts;
            doc.updated_at = Some(now);
            doc.clone()
        });
        self.watchers.weeks.publish(&(user.clone(), week), &stored);
        Ok(stored)
    }

    fn watch_week(
        &self,
        user: &UserId,
        week: WeekKey,
        handler: Box<dyn Fn(&Week) + Send + Sync>,
    ) -> Result<Subscription> {
        subscribe_with_snapshot(
            &self.watchers.weeks,
            (user.clone(), week),
            handler,
            || Ok(self.load_week(user, week)?.unwrap_or_else(|| Week::empty(week))),
        )
    }
}

impl LogRepo for MemoryStore {
    fn append_log(&self, user: &UserId, log: NewWorkoutLog) -> Result<WorkoutLog> {
        let stored = WorkoutLog::from_new(Uuid::new_v4(), self.clock.now(), log);
        self.with_user(user, |docs| docs.logs.push(stored.clone()));
        self.watchers.logs.publish(user, &stored);
        Ok(stored)
    }

    fn query_logs(
        &self,
        user: &UserId,
        order: SortOrder,
        after: Option<&LogCursor>,
        limit: Option<usize>,
    ) -> Result<Vec<WorkoutLog>> {
        let logs = self.read_user(user, |docs| docs.logs.clone());
        Ok(page_logs(logs, order, after, limit))
    }

    fn watch_logs(
        &self,
        user: &UserId,
        handler: Box<dyn Fn(&WorkoutLog) + Send + Sync>,
    ) -> Result<Subscription> {
        Ok(self.watchers.logs.subscribe(user.clone(), handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MuscleGroup, WorkoutSource};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user() -> UserId {
        UserId::new("tester").unwrap()
    }

    fn instance(name: &str) -> WorkoutInstance {
        WorkoutInstance {
            id: Uuid::new_v4(),
            source: WorkoutSource::AdHoc {
                custom_name: name.into(),
            },
            exercises: vec![],
            is_completed: false,
            scheduled_at: Utc::now(),
        }
    }

    #[test]
    fn test_write_day_creates_week_lazily_and_keeps_other_days() {
        let store = MemoryStore::new();
        let key: WeekKey = "2026-W06".parse().unwrap();

        assert!(store.load_week(&user(), key).unwrap().is_none());

        store
            .write_day(&user(), key, DayKey::Monday, vec![instance("a")])
            .unwrap();
        store
            .write_day(&user(), key, DayKey::Friday, vec![instance("b")])
            .unwrap();

        let week = store.load_week(&user(), key).unwrap().unwrap();
        assert_eq!(week.day(DayKey::Monday).len(), 1);
        assert_eq!(week.day(DayKey::Friday).len(), 1);
        assert!(week.updated_at.is_some());
    }

    #[test]
    fn test_users_are_isolated() {
        let store = MemoryStore::new();
        let other = UserId::new("someone-else").unwrap();
        store
            .insert_exercise(
                &user(),
                NewExercise {
                    name: "Squat".into(),
                    muscle_group: MuscleGroup::Legs,
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(store.list_exercises(&user()).unwrap().len(), 1);
        assert!(store.list_exercises(&other).unwrap().is_empty());
    }

    #[test]
    fn test_watch_week_delivers_snapshot_then_changes() {
        let store = MemoryStore::new();
        let key: WeekKey = "2026-W06".parse().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let sub = store
            .watch_week(
                &user(),
                key,
                Box::new(move |week: &Week| {
                    sink.lock()
                        .unwrap()
                        .push(week.day(DayKey::Tuesday).len());
                }),
            )
            .unwrap();

        store
            .write_day(&user(), key, DayKey::Tuesday, vec![instance("a")])
            .unwrap();
        drop(sub);
        store
            .write_day(&user(), key, DayKey::Tuesday, vec![instance("a"), instance("b")])
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_watch_logs_receives_appends() {
        let store = MemoryStore::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let _sub = store
            .watch_logs(
                &user(),
                Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        store
            .append_log(
                &user(),
                NewWorkoutLog {
                    name: "Run".into(),
                    date: Utc::now(),
                    template_id: None,
                    template_name: None,
                    slot: None,
                    exercises: vec![],
                    duration_minutes: 30,
                    notes: String::new(),
                },
            )
            .unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_update_unknown_exercise_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_exercise(&user(), Uuid::new_v4(), ExerciseUpdate::default())
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store
            .delete_template(&user(), Uuid::new_v4())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_reads_do_not_create_users() {
        let store = MemoryStore::new();
        let key: WeekKey = "2026-W06".parse().unwrap();

        assert!(store.list_exercises(&user()).unwrap().is_empty());
        assert!(store.list_templates(&user()).unwrap().is_empty());
        assert!(store.load_week(&user(), key).unwrap().is_none());
        assert!(store
            .query_logs(&user(), SortOrder::Descending, None, None)
            .unwrap()
            .is_empty());
        assert!(store.lock().is_empty());

        store
            .write_day(&user(), key, DayKey::Monday, vec![instance("a")])
            .unwrap();
        assert_eq!(store.lock().len(), 1);
    }

    #[test]
    fn test_watch_week_racing_a_write_ends_on_latest() {
        let key: WeekKey = "2026-W06".parse().unwrap();

        for round in 0..500 {
            let store = Arc::new(MemoryStore::new());
            let last_seen = Arc::new(Mutex::new(None));

            let writer = {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .write_day(&user(), key, DayKey::Monday, vec![instance("a")])
                        .unwrap();
                })
            };

            let sink = Arc::clone(&last_seen);
            let _sub = store
                .watch_week(
                    &user(),
                    key,
                    Box::new(move |week: &Week| {
                        *sink.lock().unwrap() = Some(week.day(DayKey::Monday).len());
                    }),
                )
                .unwrap();
            writer.join().unwrap();

            assert_eq!(
                *last_seen.lock().unwrap(),
                Some(1),
                "subscriber fell behind the store in round {}",
                round
            );
        }
    }
}
