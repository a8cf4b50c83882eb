//! Core domain types for the liftweek system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and the prescriptions templates are built from
//! - Schedule weeks, day slots and workout instances
//! - Workout logs with their per-set records

use crate::week::{DayKey, WeekKey};
use crate::{Error, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type ExerciseId = Uuid;
pub type TemplateId = Uuid;
pub type LogId = Uuid;
pub type InstanceId = Uuid;

/// Exercise metadata keyed by id, used to enrich logged exercises
pub type ExerciseLookup = HashMap<ExerciseId, Exercise>;

// ============================================================================
// Identity
// ============================================================================

/// Opaque identity of the signed-in user
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and wrap a user id.
    ///
    /// Ids double as directory names in the file store, so only ASCII
    /// alphanumerics, `-`, `_` and `.` are accepted.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let valid = !id.is_empty()
            && id != "."
            && id != ".."
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(Error::Validation(format!("Invalid user id: {:?}", id)));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

// ============================================================================
// Exercise Types
// ============================================================================

/// Muscle group categories an exercise is filed under
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Legs,
    Glutes,
    Core,
    Cardio,
    FullBody,
    Other,
}

impl MuscleGroup {
    pub const ALL: [MuscleGroup; 11] = [
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Shoulders,
        MuscleGroup::Biceps,
        MuscleGroup::Triceps,
        MuscleGroup::Legs,
        MuscleGroup::Glutes,
        MuscleGroup::Core,
        MuscleGroup::Cardio,
        MuscleGroup::FullBody,
        MuscleGroup::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Biceps => "Biceps",
            MuscleGroup::Triceps => "Triceps",
            MuscleGroup::Legs => "Legs",
            MuscleGroup::Glutes => "Glutes",
            MuscleGroup::Core => "Core",
            MuscleGroup::Cardio => "Cardio",
            MuscleGroup::FullBody => "Full Body",
            MuscleGroup::Other => "Other",
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MuscleGroup {
    type Err = Error;

    /// Strict parse for user input; accepts "full body", "full_body" and "fullbody"
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        MuscleGroup::ALL
            .into_iter()
            .find(|g| g.as_str().replace(' ', "").to_lowercase() == normalized)
            .ok_or_else(|| Error::Validation(format!("Unknown muscle group: {:?}", s)))
    }
}

/// Lenient conversion used when reading stored documents: unknown names become `Other`
impl From<String> for MuscleGroup {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(MuscleGroup::Other)
    }
}

impl From<MuscleGroup> for String {
    fn from(group: MuscleGroup) -> Self {
        group.as_str().to_string()
    }
}

/// Unit a weight is recorded in (no conversion is ever performed)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "kg" | "kgs" => Ok(WeightUnit::Kg),
            "lb" | "lbs" => Ok(WeightUnit::Lbs),
            _ => Err(Error::Validation(format!("Unknown weight unit: {:?}", s))),
        }
    }
}

/// A reusable exercise definition from the user's library
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub muscle_group: MuscleGroup,
    #[serde(default)]
    pub description: Option<String>,
    pub default_sets: u32,
    pub default_reps: u32,
    pub default_weight: f64,
    #[serde(default)]
    pub weight_unit: WeightUnit,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields of an exercise before the store assigns it an id
#[derive(Clone, Debug, PartialEq)]
pub struct NewExercise {
    pub name: String,
    pub muscle_group: MuscleGroup,
    pub description: Option<String>,
    pub default_sets: u32,
    pub default_reps: u32,
    pub default_weight: f64,
    pub weight_unit: WeightUnit,
}

impl Default for NewExercise {
    fn default() -> Self {
        Self {
            name: String::new(),
            muscle_group: MuscleGroup::Chest,
            description: None,
            default_sets: 3,
            default_reps: 10,
            default_weight: 0.0,
            weight_unit: WeightUnit::Kg,
        }
    }
}

/// Partial update of an exercise; `None` leaves a field untouched
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExerciseUpdate {
    pub name: Option<String>,
    pub muscle_group: Option<MuscleGroup>,
    pub description: Option<Option<String>>,
    pub default_sets: Option<u32>,
    pub default_reps: Option<u32>,
    pub default_weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
}

// ============================================================================
// Template Types
// ============================================================================

/// A planned exercise (sets x reps @ weight) inside a template or scheduled workout
///
/// `exercise_name` and `weight_unit` are snapshots taken at authoring time;
/// `exercise_id` is only a weak back-reference and may dangle.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExercisePrescription {
    #[serde(default)]
    pub exercise_id: Option<ExerciseId>,
    pub exercise_name: String,
    #[serde(default)]
    pub sets: u32,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub weight_unit: WeightUnit,
    #[serde(default)]
    pub order: u32,
}

/// A named, ordered grouping of exercise prescriptions
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exercises: Vec<ExercisePrescription>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Editable template contents, before (or instead of) being stored
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateDraft {
    pub name: String,
    pub description: String,
    pub exercises: Vec<ExercisePrescription>,
}

// ============================================================================
// Schedule Types
// ============================================================================

/// Where a scheduled workout came from
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkoutSource {
    Template {
        #[serde(default)]
        template_id: Option<TemplateId>,
        template_name: String,
    },
    AdHoc {
        custom_name: String,
    },
}

/// A scheduled occurrence of a templated or ad-hoc workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutInstance {
    #[serde(default = "Uuid::new_v4")]
    pub id: InstanceId,
    #[serde(flatten)]
    pub source: WorkoutSource,
    #[serde(default)]
    pub exercises: Vec<ExercisePrescription>,
    #[serde(default)]
    pub is_completed: bool,
    pub scheduled_at: DateTime<Utc>,
}

impl WorkoutInstance {
    /// Template name or custom name
    pub fn display_name(&self) -> &str {
        match &self.source {
            WorkoutSource::Template { template_name, .. } => template_name,
            WorkoutSource::AdHoc { custom_name } => custom_name,
        }
    }

    pub fn template_id(&self) -> Option<TemplateId> {
        match &self.source {
            WorkoutSource::Template { template_id, .. } => *template_id,
            WorkoutSource::AdHoc { .. } => None,
        }
    }

    pub fn template_name(&self) -> Option<&str> {
        match &self.source {
            WorkoutSource::Template { template_name, .. } => Some(template_name),
            WorkoutSource::AdHoc { .. } => None,
        }
    }
}

/// What to schedule: a template snapshot or an ad-hoc named workout
#[derive(Clone, Debug, PartialEq)]
pub enum WorkoutSpec {
    Template {
        template_id: Option<TemplateId>,
        template_name: String,
        exercises: Vec<ExercisePrescription>,
    },
    AdHoc {
        custom_name: String,
    },
}

impl WorkoutSpec {
    /// Snapshot a stored template; later template edits do not propagate
    pub fn from_template(template: &Template) -> Self {
        WorkoutSpec::Template {
            template_id: Some(template.id),
            template_name: template.name.clone(),
            exercises: template.exercises.clone(),
        }
    }

    pub fn ad_hoc(name: impl Into<String>) -> Self {
        WorkoutSpec::AdHoc {
            custom_name: name.into(),
        }
    }
}

/// Fields merged into an existing workout instance
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkoutPatch {
    pub is_completed: Option<bool>,
    pub custom_name: Option<String>,
}

impl WorkoutPatch {
    pub fn completed() -> Self {
        Self {
            is_completed: Some(true),
            ..Default::default()
        }
    }
}

/// One day slot of a week
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Day {
    #[serde(default)]
    pub workouts: Vec<WorkoutInstance>,
}

/// The seven fixed day slots; the struct shape rules out extra or missing days
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Days {
    #[serde(default)]
    pub monday: Day,
    #[serde(default)]
    pub tuesday: Day,
    #[serde(default)]
    pub wednesday: Day,
    #[serde(default)]
    pub thursday: Day,
    #[serde(default)]
    pub friday: Day,
    #[serde(default)]
    pub saturday: Day,
    #[serde(default)]
    pub sunday: Day,
}

impl Days {
    pub fn get(&self, day: DayKey) -> &Day {
        match day {
            DayKey::Monday => &self.monday,
            DayKey::Tuesday => &self.tuesday,
            DayKey::Wednesday => &self.wednesday,
            DayKey::Thursday => &self.thursday,
            DayKey::Friday => &self.friday,
            DayKey::Saturday => &self.saturday,
            DayKey::Sunday => &self.sunday,
        }
    }

    pub fn get_mut(&mut self, day: DayKey) -> &mut Day {
        match day {
            DayKey::Monday => &mut self.monday,
            DayKey::Tuesday => &mut self.tuesday,
            DayKey::Wednesday => &mut self.wednesday,
            DayKey::Thursday => &mut self.thursday,
            DayKey::Friday => &mut self.friday,
            DayKey::Saturday => &mut self.saturday,
            DayKey::Sunday => &mut self.sunday,
        }
    }

    /// Day slots in Monday..Sunday order
    pub fn iter(&self) -> impl Iterator<Item = (DayKey, &Day)> {
        DayKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }
}

/// Schedule document for one (user, week)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Week {
    pub week_key: WeekKey,
    pub week_start: NaiveDate,
    #[serde(default)]
    pub days: Days,
    /// `None` for a week synthesized because nothing was stored yet
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Week {
    /// Empty but valid week: seven empty day lists
    pub fn empty(week_key: WeekKey) -> Self {
        Self {
            week_key,
            week_start: week_key.week_start(),
            days: Days::default(),
            updated_at: None,
        }
    }

    pub fn day(&self, day: DayKey) -> &[WorkoutInstance] {
        &self.days.get(day).workouts
    }

    /// Total scheduled and completed workouts across the week
    pub fn completion(&self) -> (usize, usize) {
        self.days.iter().fold((0, 0), |(total, done), (_, day)| {
            (
                total + day.workouts.len(),
                done + day.workouts.iter().filter(|w| w.is_completed).count(),
            )
        })
    }
}

/// Address of a scheduled workout: positional index plus the stable instance id
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotRef {
    pub week_key: WeekKey,
    pub day: DayKey,
    pub index: usize,
    pub instance_id: InstanceId,
}

// ============================================================================
// Log Types
// ============================================================================

/// One performed (or planned-but-skipped) set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetRecord {
    #[serde(default)]
    pub set_number: u32,
    #[serde(default)]
    pub reps: u32,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub weight_unit: WeightUnit,
    #[serde(default)]
    pub completed: bool,
}

/// An exercise as performed within a logged session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LoggedExercise {
    #[serde(default)]
    pub exercise_id: Option<ExerciseId>,
    #[serde(default)]
    pub exercise_name: String,
    /// Denormalized muscle group, used when the library no longer knows the exercise
    #[serde(default)]
    pub muscle_group: Option<MuscleGroup>,
    #[serde(default)]
    pub sets: Vec<SetRecord>,
}

/// A workout log before the store assigns its id and timestamp
#[derive(Clone, Debug, PartialEq)]
pub struct NewWorkoutLog {
    pub name: String,
    pub date: DateTime<Utc>,
    pub template_id: Option<TemplateId>,
    pub template_name: Option<String>,
    pub slot: Option<SlotRef>,
    pub exercises: Vec<LoggedExercise>,
    pub duration_minutes: u32,
    pub notes: String,
}

/// Immutable record of a performed session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutLog {
    pub id: LogId,
    #[serde(default)]
    pub name: String,
    /// Client-side timestamp of the session
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Store-assigned timestamp; logs are ordered by this
    pub logged_at: DateTime<Utc>,
    #[serde(default)]
    pub template_id: Option<TemplateId>,
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub slot: Option<SlotRef>,
    #[serde(default)]
    pub exercises: Vec<LoggedExercise>,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub notes: String,
}

impl WorkoutLog {
    /// Seal a draft with the store-assigned id and timestamp
    pub fn from_new(id: LogId, logged_at: DateTime<Utc>, log: NewWorkoutLog) -> Self {
        Self {
            id,
            name: log.name,
            date: Some(log.date),
            logged_at,
            template_id: log.template_id,
            template_name: log.template_name,
            slot: log.slot,
            exercises: log.exercises,
            duration_minutes: log.duration_minutes,
            notes: log.notes,
        }
    }

    /// Calendar date of the log in the local timezone
    pub fn local_date(&self) -> NaiveDate {
        self.logged_at.with_timezone(&Local).date_naive()
    }
}
