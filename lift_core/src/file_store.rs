//! JSON-file document store with file locking.
//!
//! Layout under the data directory:
//!
//! ```text
//! users/<user>/exercises.json
//! users/<user>/templates.json
//! users/<user>/schedule/<YYYY-Www>.json
//! users/<user>/workout_logs.jsonl
//! ```
//!
//! Documents are replaced atomically (temp file + rename). Every mutation
//! holds an exclusive lock on `users/<user>/.lock` for its whole
//! read-modify-write, so a day write never clobbers a different day written
//! by another process. Workout logs are appended to a JSONL file.
//!
//! Change notifications reach subscribers in this process only.

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
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use uuid::Uuid;

const EXERCISES_FILE: &str = "exercises.json";
const TEMPLATES_FILE: &str = "templates.json";
const SCHEDULE_DIR: &str = "schedule";
const LOGS_FILE: &str = "workout_logs.jsonl";
const LOCK_FILE: &str = ".lock";

/// Document store persisted under a data directory
pub struct FileStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
    watchers: Watchers,
}

impl FileStore {
    /// Create a store rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_clock(root, Arc::new(SystemClock))
    }

    pub fn with_clock(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            clock,
            watchers: Watchers::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user: &UserId) -> PathBuf {
        self.root.join("users").join(user.as_str())
    }

    fn week_path(&self, user: &UserId, week: WeekKey) -> PathBuf {
        self.user_dir(user)
            .join(SCHEDULE_DIR)
            .join(format!("{}.json", week))
    }

    /// Path of the user's JSONL log file
    pub fn logs_path(&self, user: &UserId) -> PathBuf {
        self.user_dir(user).join(LOGS_FILE)
    }

    /// Hold the user's exclusive lock while `f` runs
    fn locked<R>(&self, user: &UserId, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let dir = self.user_dir(user);
        std::fs::create_dir_all(&dir)?;
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(dir.join(LOCK_FILE))?;
        lock.lock_exclusive()?;
        let result = f();
        lock.unlock()?;
        result
    }

    fn load_exercises(&self, user: &UserId) -> Result<Vec<Exercise>> {
        let mut list: Vec<Exercise> =
            read_doc(&self.user_dir(user).join(EXERCISES_FILE))?.unwrap_or_default();
        sort_exercises(&mut list);
        Ok(list)
    }

    fn save_exercises(&self, user: &UserId, list: &[Exercise]) -> Result<()> {
        write_doc(&self.user_dir(user).join(EXERCISES_FILE), &list)
    }

    fn load_templates(&self, user: &UserId) -> Result<Vec<Template>> {
        let mut list: Vec<Template> =
            read_doc(&self.user_dir(user).join(TEMPLATES_FILE))?.unwrap_or_default();
        sort_templates(&mut list);
        Ok(list)
    }

    fn save_templates(&self, user: &UserId, list: &[Template]) -> Result<()> {
        write_doc(&self.user_dir(user).join(TEMPLATES_FILE), &list)
    }
}

impl ExerciseRepo for FileStore {
    fn list_exercises(&self, user: &UserId) -> Result<Vec<Exercise>> {
        self.load_exercises(user)
    }

    fn get_exercise(&self, user: &UserId, id: ExerciseId) -> Result<Option<Exercise>> {
        Ok(self.load_exercises(user)?.into_iter().find(|e| e.id == id))
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

        let snapshot = self.locked(user, || {
            let mut list = self.load_exercises(user)?;
            list.push(stored.clone());
            sort_exercises(&mut list);
            self.save_exercises(user, &list)?;
            Ok(list)
        })?;

        tracing::debug!("Stored exercise {} for {}", stored.id, user);
        self.watchers.exercises.publish(user, &snapshot);
        Ok(stored)
    }

    fn update_exercise(
        &self,
        user: &UserId,
        id: ExerciseId,
        update: ExerciseUpdate,
    ) -> Result<Exercise> {
        let (updated, snapshot) = self.locked(user, || {
            let mut list = self.load_exercises(user)?;
            let exercise = list
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| Error::NotFound(format!("exercise {}", id)))?;
            apply_exercise_update(exercise, update);
            let updated = exercise.clone();
            sort_exercises(&mut list);
            self.save_exercises(user, &list)?;
            Ok((updated, list))
        })?;

        self.watchers.exercises.publish(user, &snapshot);
        Ok(updated)
    }

    fn delete_exercise(&self, user: &UserId, id: ExerciseId) -> Result<()> {
        let snapshot = self.locked(user, || {
            let mut list = self.load_exercises(user)?;
            let before = list.len();
            list.retain(|e| e.id != id);
            if list.len() == before {
                return Err(Error::NotFound(format!("exercise {}", id)));
            }
            self.save_exercises(user, &list)?;
            Ok(list)
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
            || self.load_exercises(user),
        )
    }
}

impl TemplateRepo for FileStore {
    fn list_templates(&self, user: &UserId) -> Result<Vec<Template>> {
        self.load_templates(user)
    }

    fn get_template(&self, user: &UserId, id: TemplateId) -> Result<Option<Template>> {
        Ok(self.load_templates(user)?.into_iter().find(|t| t.id == id))
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

        let snapshot = self.locked(user, || {
            let mut list = self.load_templates(user)?;
            list.push(stored.clone());
            sort_templates(&mut list);
            self.save_templates(user, &list)?;
            Ok(list)
        })?;

        tracing::debug!("Stored template {} for {}", stored.id, user);
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
        let (updated, snapshot) = self.locked(user, || {
            let mut list = self.load_templates(user)?;
            let template = list
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| Error::NotFound(format!("template {}", id)))?;
            template.name = draft.name;
            template.description = draft.description;
            template.exercises = draft.exercises;
            template.updated_at = Some(now);
            let updated = template.clone();
            sort_templates(&mut list);
            self.save_templates(user, &list)?;
            Ok((updated, list))
        })?;

        self.watchers.templates.publish(user, &snapshot);
        Ok(updated)
    }

    fn delete_template(&self, user: &UserId, id: TemplateId) -> Result<()> {
        let snapshot = self.locked(user, || {
            let mut list = self.load_templates(user)?;
            let before = list.len();
            list.retain(|t| t.id != id);
            if list.len() == before {
                return Err(Error::NotFound(format!("template {}", id)));
            }
            self.save_templates(user, &list)?;
            Ok(list)
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
            || self.load_templates(user),
        )
    }
}

impl ScheduleRepo for FileStore {
    fn load_week(&self, user: &UserId, week: WeekKey) -> Result<Option<Week>> {
        let path = self.week_path(user, week);
        match read_doc::<Week>(&path) {
            Ok(doc) => Ok(doc),
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Failed to parse week document {:?}: {}. Treating as empty.",
                    path,
                    e
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn write_day(
        &self,
        user: &UserId,
        week: WeekKey,
        day: DayKey,
        workouts: Vec<WorkoutInstance>,
    ) -> Result<Week> {
        let now = self.clock.now();
        let stored = self.locked(user, || {
            let mut doc = self
                .load_week(user, week)?
                .unwrap_or_else(|| Week::empty(week));
            doc.days.get_mut(day).workouts = workouts;
            doc.updated_at = Some(now);
            write_doc(&self.week_path(user, week), &doc)?;
            Ok(doc)
        })?;

        tracing::debug!("Wrote {} {} for {}", week, day, user);
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

impl LogRepo for FileStore {
    fn append_log(&self, user: &UserId, log: NewWorkoutLog) -> Result<WorkoutLog> {
        let stored = WorkoutLog::from_new(Uuid::new_v4(), self.clock.now(), log);
        append_line(&self.logs_path(user), &stored)?;
        tracing::debug!("Appended workout log {} for {}", stored.id, user);
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
        let logs = read_logs(&self.logs_path(user))?;
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

/// Read a JSON document under a shared lock; `None` if the file does not exist
fn read_doc<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let read = BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    let doc = serde_json::from_str(&contents)?;
    tracing::debug!("Loaded document {:?}", path);
    Ok(Some(doc))
}

/// Atomically replace a JSON document
///
/// Writes to a temp file in the same directory, syncs it, then renames it
/// over the original.
fn write_doc<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "document path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved document {:?}", path);
    Ok(())
}

/// Append one JSON line under an exclusive lock
fn append_line<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;
    file.lock_exclusive()?;
    let torn = ends_mid_line(&mut file)?;

    let mut writer = std::io::BufWriter::new(&file);
    if torn {
        // Terminate a partial line left by an interrupted write
        tracing::warn!("Found partial last line in {:?}, starting a new line", path);
        writer.write_all(b"\n")?;
    }
    let line = serde_json::to_string(value)?;
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    drop(writer);

    file.sync_all()?;
    file.unlock()?;
    Ok(())
}

fn ends_mid_line(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Read every log from a JSONL file, skipping lines that fail to parse
fn read_logs(path: &Path) -> Result<Vec<WorkoutLog>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut logs = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutLog>(&line) {
            Ok(log) => logs.push(log),
            Err(e) => {
                tracing::warn!("Failed to parse workout log at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} workout logs from {:?}", logs.len(), path);
    Ok(logs)
}
