//! Flat tabular export of workout history.
//!
//! Every set becomes one row. Logs without exercises (ad-hoc cardio and the
//! like) still get a single summary row so they show up in the sheet.

use crate::week::week_key;
use crate::{ExerciseLookup, Result, WorkoutLog};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ExportRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Week")]
    pub week: String,
    #[serde(rename = "Workout")]
    pub workout: String,
    #[serde(rename = "Exercise")]
    pub exercise: String,
    #[serde(rename = "Muscle Group")]
    pub muscle_group: String,
    #[serde(rename = "Set #")]
    pub set_number: Option<u32>,
    #[serde(rename = "Reps")]
    pub reps: Option<u32>,
    #[serde(rename = "Weight")]
    pub weight: Option<f64>,
    #[serde(rename = "Unit")]
    pub unit: String,
    #[serde(rename = "Completed")]
    pub completed: &'static str,
    #[serde(rename = "Duration (min)")]
    pub duration_minutes: Option<u32>,
    #[serde(rename = "Notes")]
    pub notes: String,
}

/// Flatten logs into rows, keeping the order of `logs`
pub fn export_rows(logs: &[WorkoutLog], lookup: &ExerciseLookup) -> Vec<ExportRow> {
    let mut rows = Vec::new();

    for log in logs {
        let date = log.local_date();
        let base = ExportRow {
            date: date.format("%m/%d/%Y").to_string(),
            week: week_key(date).to_string(),
            workout: log.name.clone(),
            exercise: String::new(),
            muscle_group: String::new(),
            set_number: None,
            reps: None,
            weight: None,
            unit: String::new(),
            completed: "Yes",
            duration_minutes: (log.duration_minutes > 0).then_some(log.duration_minutes),
            notes: log.notes.clone(),
        };

        if log.exercises.is_empty() {
            rows.push(base);
            continue;
        }

        for exercise in &log.exercises {
            // Unknown groups stay blank here rather than reading as "Other"
            let muscle_group = exercise
                .exercise_id
                .and_then(|id| lookup.get(&id))
                .map(|e| e.muscle_group)
                .or(exercise.muscle_group)
                .map(|g| g.to_string())
                .unwrap_or_default();

            for set in &exercise.sets {
                rows.push(ExportRow {
                    exercise: exercise.exercise_name.clone(),
                    muscle_group: muscle_group.clone(),
                    set_number: Some(set.set_number),
                    reps: Some(set.reps),
                    weight: Some(set.weight),
                    unit: set.weight_unit.to_string(),
                    completed: if set.completed { "Yes" } else { "No" },
                    ..base.clone()
                });
            }
        }
    }

    rows
}

/// Write rows to `path` as CSV with a header line.
///
/// The file is written to a temp file next to `path` and renamed into place.
/// Returns the number of rows written; with no rows nothing is written.
pub fn write_csv(rows: &[ExportRow], path: &Path) -> Result<usize> {
    if rows.is_empty() {
        tracing::info!("No workout data to export");
        return Ok(0);
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let temp = NamedTempFile::new_in(dir)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(temp);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let mut temp = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    std::fs::set_permissions(temp.path(), export_permissions(path)?)?;
    temp.persist(path).map_err(|e| e.error)?;

    tracing::info!("Exported {} rows to {:?}", rows.len(), path);
    Ok(rows.len())
}

/// Temp files are created owner-only; an export gets the mode of the file it
/// replaces, or 0644 when new
fn export_permissions(path: &Path) -> Result<std::fs::Permissions> {
    if let Ok(existing) = std::fs::metadata(path) {
        return Ok(existing.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Ok(std::fs::Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut permissions = std::fs::metadata(dir)?.permissions();
        permissions.set_readonly(false);
        Ok(permissions)
    }
}
