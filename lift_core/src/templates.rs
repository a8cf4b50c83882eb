//! Templates: named, ordered groupings of exercise prescriptions.
//!
//! Prescriptions are snapshots. Editing or deleting the source exercise does
//! not change a stored template. Every draft mutation renumbers `order` so it
//! stays dense `0..n-1`.

use crate::store::TemplateRepo;
use crate::subscription::Subscription;
use crate::{
    Error, Exercise, ExercisePrescription, Result, Template, TemplateDraft, TemplateId, UserId,
    WeightUnit,
};

impl ExercisePrescription {
    /// Prescription seeded from an exercise's defaults
    pub fn from_exercise(exercise: &Exercise) -> Self {
        Self {
            exercise_id: Some(exercise.id),
            exercise_name: exercise.name.clone(),
            sets: exercise.default_sets,
            reps: exercise.default_reps,
            weight: exercise.default_weight,
            weight_unit: exercise.weight_unit,
            order: 0,
        }
    }
}

impl TemplateDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Editable copy of a stored template
    pub fn from_template(template: &Template) -> Self {
        let mut draft = Self {
            name: template.name.clone(),
            description: template.description.clone(),
            exercises: template.exercises.clone(),
        };
        draft.exercises.sort_by_key(|p| p.order);
        draft.renumber();
        draft
    }

    /// Append a prescription for `exercise`.
    ///
    /// Returns false (and changes nothing) when the exercise is already part
    /// of the draft.
    pub fn add_exercise(&mut self, exercise: &Exercise) -> bool {
        if self
            .exercises
            .iter()
            .any(|p| p.exercise_id == Some(exercise.id))
        {
            return false;
        }
        let mut prescription = ExercisePrescription::from_exercise(exercise);
        prescription.order = self.exercises.len() as u32;
        self.exercises.push(prescription);
        true
    }

    pub fn remove(&mut self, index: usize) -> Result<ExercisePrescription> {
        self.check_index(index)?;
        let removed = self.exercises.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Swap with the previous entry; no-op at the top
    pub fn move_up(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if index > 0 {
            self.exercises.swap(index - 1, index);
            self.renumber();
        }
        Ok(())
    }

    /// Swap with the next entry; no-op at the bottom
    pub fn move_down(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        if index + 1 < self.exercises.len() {
            self.exercises.swap(index, index + 1);
            self.renumber();
        }
        Ok(())
    }

    /// Change the planned volume of one entry
    pub fn update_prescription(
        &mut self,
        index: usize,
        sets: u32,
        reps: u32,
        weight: f64,
        weight_unit: WeightUnit,
    ) -> Result<()> {
        self.check_index(index)?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::Validation(format!("invalid weight {}", weight)));
        }
        let entry = &mut self.exercises[index];
        entry.sets = sets;
        entry.reps = reps;
        entry.weight = weight;
        entry.weight_unit = weight_unit;
        Ok(())
    }

    /// Trim and check the draft, renumbering prescriptions by position
    pub fn validate(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(Error::Validation("template name must not be empty".into()));
        }
        self.description = self.description.trim().to_string();
        for prescription in &self.exercises {
            if prescription.exercise_name.trim().is_empty() {
                return Err(Error::Validation(
                    "prescription exercise name must not be empty".into(),
                ));
            }
            if !prescription.weight.is_finite() || prescription.weight < 0.0 {
                return Err(Error::Validation(format!(
                    "invalid weight {} for {}",
                    prescription.weight, prescription.exercise_name
                )));
            }
        }
        self.renumber();
        Ok(self)
    }

    fn renumber(&mut self) {
        for (i, prescription) in self.exercises.iter_mut().enumerate() {
            prescription.order = i as u32;
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.exercises.len() {
            return Err(Error::Validation(format!(
                "prescription index {} out of range (len {})",
                index,
                self.exercises.len()
            )));
        }
        Ok(())
    }
}

/// The user's stored templates
pub struct TemplateLibrary<'a, S: TemplateRepo> {
    store: &'a S,
}

impl<'a, S: TemplateRepo> TemplateLibrary<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn list(&self, user: Option<&UserId>) -> Result<Vec<Template>> {
        match user {
            Some(user) => self.store.list_templates(user),
            None => Ok(Vec::new()),
        }
    }

    pub fn get(&self, user: &UserId, id: TemplateId) -> Result<Template> {
        self.store
            .get_template(user, id)?
            .ok_or_else(|| Error::NotFound(format!("template {}", id)))
    }

    pub fn add(&self, user: &UserId, draft: TemplateDraft) -> Result<Template> {
        let draft = draft.validate()?;
        let stored = self.store.insert_template(user, draft)?;
        tracing::info!(
            "Added template {:?} with {} exercises",
            stored.name,
            stored.exercises.len()
        );
        Ok(stored)
    }

    pub fn update(&self, user: &UserId, id: TemplateId, draft: TemplateDraft) -> Result<Template> {
        let draft = draft.validate()?;
        let stored = self.store.replace_template(user, id, draft)?;
        tracing::info!("Updated template {:?} ({})", stored.name, stored.id);
        Ok(stored)
    }

    pub fn delete(&self, user: &UserId, id: TemplateId) -> Result<()> {
        self.store.delete_template(user, id)?;
        tracing::info!("Deleted template {}", id);
        Ok(())
    }

    pub fn watch<F>(&self, user: &UserId, handler: F) -> Result<Subscription>
    where
        F: Fn(&Vec<Template>) + Send + Sync + 'static,
    {
        self.store.watch_templates(user, Box::new(handler))
    }
}
