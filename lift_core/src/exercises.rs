//! Exercise library: validated CRUD over the user's exercise definitions.
//!
//! Deleting an exercise never touches templates or logs; they keep the
//! name and unit they snapshotted when they were authored.

use crate::store::ExerciseRepo;
use crate::subscription::Subscription;
use crate::{
    Error, Exercise, ExerciseId, ExerciseLookup, ExerciseUpdate, NewExercise, Result, UserId,
};

impl NewExercise {
    /// Check the field constraints and normalize the name
    pub fn validate(mut self) -> Result<Self> {
        self.name = validate_name(&self.name)?;
        self.description = normalize_description(self.description);
        validate_defaults(self.default_sets, self.default_reps, self.default_weight)?;
        Ok(self)
    }
}

impl ExerciseUpdate {
    /// Validate only the fields being changed
    pub fn validate(mut self) -> Result<Self> {
        if let Some(name) = &self.name {
            self.name = Some(validate_name(name)?);
        }
        if let Some(description) = self.description.take() {
            self.description = Some(normalize_description(description));
        }
        if self.default_sets == Some(0) {
            return Err(Error::Validation("default sets must be at least 1".into()));
        }
        if self.default_reps == Some(0) {
            return Err(Error::Validation("default reps must be at least 1".into()));
        }
        if let Some(weight) = self.default_weight {
            check_weight(weight)?;
        }
        Ok(self)
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("exercise name must not be empty".into()));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn validate_defaults(sets: u32, reps: u32, weight: f64) -> Result<()> {
    if sets < 1 {
        return Err(Error::Validation("default sets must be at least 1".into()));
    }
    if reps < 1 {
        return Err(Error::Validation("default reps must be at least 1".into()));
    }
    check_weight(weight)
}

fn check_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(Error::Validation(format!(
            "default weight must be a non-negative number, got {}",
            weight
        )));
    }
    Ok(())
}

/// The user's exercise library
pub struct ExerciseLibrary<'a, S: ExerciseRepo> {
    store: &'a S,
}

impl<'a, S: ExerciseRepo> ExerciseLibrary<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All exercises ordered by name; no user means no exercises
    pub fn list(&self, user: Option<&UserId>) -> Result<Vec<Exercise>> {
        match user {
            Some(user) => self.store.list_exercises(user),
            None => Ok(Vec::new()),
        }
    }

    pub fn get(&self, user: &UserId, id: ExerciseId) -> Result<Exercise> {
        self.store
            .get_exercise(user, id)?
            .ok_or_else(|| Error::NotFound(format!("exercise {}", id)))
    }

    pub fn add(&self, user: &UserId, exercise: NewExercise) -> Result<Exercise> {
        let exercise = exercise.validate()?;
        let stored = self.store.insert_exercise(user, exercise)?;
        tracing::info!("Added exercise {:?} ({})", stored.name, stored.id);
        Ok(stored)
    }

    pub fn update(&self, user: &UserId, id: ExerciseId, update: ExerciseUpdate) -> Result<Exercise> {
        let update = update.validate()?;
        let stored = self.store.update_exercise(user, id, update)?;
        tracing::info!("Updated exercise {:?} ({})", stored.name, stored.id);
        Ok(stored)
    }

    pub fn delete(&self, user: &UserId, id: ExerciseId) -> Result<()> {
        self.store.delete_exercise(user, id)?;
        tracing::info!("Deleted exercise {}", id);
        Ok(())
    }

    /// Id-keyed view of the library for analytics and export
    pub fn lookup(&self, user: Option<&UserId>) -> Result<ExerciseLookup> {
        Ok(self
            .list(user)?
            .into_iter()
            .map(|exercise| (exercise.id, exercise))
            .collect())
    }

    /// Case-insensitive lookup by exact name
    pub fn find_by_name(&self, user: &UserId, name: &str) -> Result<Option<Exercise>> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .store
            .list_exercises(user)?
            .into_iter()
            .find(|e| e.name.to_lowercase() == wanted))
    }

    pub fn watch<F>(&self, user: &UserId, handler: F) -> Result<Subscription>
    where
        F: Fn(&Vec<Exercise>) + Send + Sync + 'static,
    {
        self.store.watch_exercises(user, Box::new(handler))
    }
}
