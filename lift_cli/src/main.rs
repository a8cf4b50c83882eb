use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use lift_core::analytics;
use lift_core::week::{days_of_week, format_week_range, week_key};
use lift_core::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "liftweek")]
#[command(about = "Weekly strength training planner and workout log", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// User whose data to read and write (defaults to user.default_user)
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the exercise library
    Exercise {
        #[command(subcommand)]
        action: ExerciseCommand,
    },

    /// Manage workout templates
    Template {
        #[command(subcommand)]
        action: TemplateCommand,
    },

    /// Show the schedule for a week
    Week {
        /// Any date inside the week (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Add, remove or rename scheduled workouts
    Schedule {
        #[command(subcommand)]
        action: ScheduleCommand,
    },

    /// Log a workout, either a scheduled one or a standalone session
    Log(LogArgs),

    /// Mark scheduled workouts completed whose log was saved but not applied
    Repair,

    /// List logged workouts, newest first
    History {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Show training statistics
    Stats {
        /// Show the max-weight progression for one exercise
        #[arg(long)]
        exercise: Option<String>,
    },

    /// Export the full history as CSV, one row per set
    Export {
        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum ExerciseCommand {
    /// Add an exercise to the library
    Add {
        name: String,
        #[command(flatten)]
        fields: ExerciseFields,
    },
    /// List the library
    List,
    /// Change fields of an exercise (by id or name)
    Edit {
        exercise: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: ExerciseFields,
    },
    /// Delete an exercise (by id or name)
    Rm { exercise: String },
}

#[derive(Args)]
struct ExerciseFields {
    /// Muscle group (chest, back, shoulders, biceps, triceps, legs, glutes, core, cardio, full-body, other)
    #[arg(long, value_parser = parse_muscle_group)]
    muscle_group: Option<MuscleGroup>,
    #[arg(long)]
    description: Option<String>,
    /// Default number of sets
    #[arg(long)]
    sets: Option<u32>,
    /// Default reps per set
    #[arg(long)]
    reps: Option<u32>,
    /// Default weight
    #[arg(long)]
    weight: Option<f64>,
    /// Weight unit (kg or lbs)
    #[arg(long)]
    unit: Option<WeightUnit>,
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// Create a template from library exercises, in the order given
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Exercise name or id; repeat for each exercise
        #[arg(long = "exercise", required = true)]
        exercises: Vec<String>,
    },
    /// List templates
    List,
    /// Delete a template (by id or name)
    Rm { template: String },
}

#[derive(Subcommand)]
enum ScheduleCommand {
    /// Schedule a template or a named ad-hoc workout
    Add {
        #[arg(long, value_parser = parse_day)]
        day: DayKey,
        /// Any date inside the target week (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Template name or id
        #[arg(long, required_unless_present = "name", conflicts_with = "name")]
        template: Option<String>,
        /// Name of an ad-hoc workout
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove a scheduled workout
    Rm {
        #[arg(long, value_parser = parse_day)]
        day: DayKey,
        /// Position within the day, starting at 1
        #[arg(long)]
        index: usize,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Rename an ad-hoc workout
    Rename {
        #[arg(long, value_parser = parse_day)]
        day: DayKey,
        #[arg(long)]
        index: usize,
        #[arg(long)]
        name: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Args)]
struct LogArgs {
    /// Day of the scheduled workout to log
    #[arg(long, value_parser = parse_day, requires = "index")]
    day: Option<DayKey>,

    /// Position of the scheduled workout within the day, starting at 1
    #[arg(long, requires = "day")]
    index: Option<usize>,

    /// Any date inside the scheduled workout's week (defaults to today)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Name of a standalone session
    #[arg(long, conflicts_with = "day")]
    name: Option<String>,

    /// Session notes
    #[arg(long, default_value = "")]
    notes: String,

    /// Mark every prefilled set done and finish immediately (non-interactive)
    #[arg(long)]
    auto_complete: bool,
}

struct App {
    store: FileStore,
    user: Option<UserId>,
    config: Config,
}

impl App {
    fn require_user(&self) -> Result<&UserId> {
        self.user.as_ref().ok_or_else(|| {
            Error::Validation(
                "No user selected; pass --user or set user.default_user in the config".into(),
            )
        })
    }
}

fn main() -> Result<()> {
    // Initialize logging
    lift_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let user = match cli.user.as_deref() {
        Some(id) => Some(UserId::new(id)?),
        None => config.default_user()?,
    };
    let app = App {
        store: FileStore::new(data_dir),
        user,
        config,
    };
    tracing::debug!("Using data dir {:?} for user {:?}", app.store.root(), app.user);

    match cli.command {
        Commands::Exercise { action } => cmd_exercise(&app, action),
        Commands::Template { action } => cmd_template(&app, action),
        Commands::Week { date } => cmd_week(&app, date),
        Commands::Schedule { action } => cmd_schedule(&app, action),
        Commands::Log(args) => cmd_log(&app, args),
        Commands::Repair => cmd_repair(&app),
        Commands::History { page } => cmd_history(&app, page),
        Commands::Stats { exercise } => cmd_stats(&app, exercise),
        Commands::Export { out } => cmd_export(&app, out),
    }
}

// ============================================================================
// Library
// ============================================================================

fn cmd_exercise(app: &App, action: ExerciseCommand) -> Result<()> {
    let library = ExerciseLibrary::new(&app.store);

    match action {
        ExerciseCommand::Add { name, fields } => {
            let user = app.require_user()?;
            let defaults = NewExercise::default();
            let exercise = library.add(
                user,
                NewExercise {
                    name,
                    muscle_group: fields.muscle_group.unwrap_or(defaults.muscle_group),
                    description: fields.description,
                    default_sets: fields.sets.unwrap_or(defaults.default_sets),
                    default_reps: fields.reps.unwrap_or(defaults.default_reps),
                    default_weight: fields.weight.unwrap_or(defaults.default_weight),
                    weight_unit: fields.unit.unwrap_or(defaults.weight_unit),
                },
            )?;
            println!("✓ Added exercise {}", exercise.name);
            println!("  id: {}", exercise.id);
        }

        ExerciseCommand::List => {
            let exercises = library.list(app.user.as_ref())?;
            if exercises.is_empty() {
                println!("No exercises yet. Add one with `liftweek exercise add`.");
            }
            for exercise in exercises {
                println!(
                    "{:<24} {:<10} {}x{} @ {} {}   {}",
                    exercise.name,
                    exercise.muscle_group,
                    exercise.default_sets,
                    exercise.default_reps,
                    exercise.default_weight,
                    exercise.weight_unit,
                    exercise.id
                );
                if let Some(description) = &exercise.description {
                    println!("    {}", description);
                }
            }
        }

        ExerciseCommand::Edit {
            exercise,
            name,
            fields,
        } => {
            let user = app.require_user()?;
            let target = resolve_exercise(&library, user, &exercise)?;
            let updated = library.update(
                user,
                target.id,
                ExerciseUpdate {
                    name,
                    muscle_group: fields.muscle_group,
                    description: fields.description.map(Some),
                    default_sets: fields.sets,
                    default_reps: fields.reps,
                    default_weight: fields.weight,
                    weight_unit: fields.unit,
                },
            )?;
            println!("✓ Updated exercise {}", updated.name);
        }

        ExerciseCommand::Rm { exercise } => {
            let user = app.require_user()?;
            let target = resolve_exercise(&library, user, &exercise)?;
            library.delete(user, target.id)?;
            println!("✓ Deleted exercise {}", target.name);
        }
    }

    Ok(())
}

fn cmd_template(app: &App, action: TemplateCommand) -> Result<()> {
    let templates = TemplateLibrary::new(&app.store);

    match action {
        TemplateCommand::Add {
            name,
            description,
            exercises,
        } => {
            let user = app.require_user()?;
            let library = ExerciseLibrary::new(&app.store);
            let mut draft = TemplateDraft::new(name);
            draft.description = description.unwrap_or_default();
            for ident in &exercises {
                let exercise = resolve_exercise(&library, user, ident)?;
                if !draft.add_exercise(&exercise) {
                    println!("  (skipping duplicate {})", exercise.name);
                }
            }
            let template = templates.add(user, draft)?;
            println!(
                "✓ Added template {} with {} exercises",
                template.name,
                template.exercises.len()
            );
            println!("  id: {}", template.id);
        }

        TemplateCommand::List => {
            let list = templates.list(app.user.as_ref())?;
            if list.is_empty() {
                println!("No templates yet. Add one with `liftweek template add`.");
            }
            for template in list {
                println!("{}   {}", template.name, template.id);
                if !template.description.is_empty() {
                    println!("    {}", template.description);
                }
                for p in &template.exercises {
                    println!(
                        "    {}. {} {}x{} @ {} {}",
                        p.order + 1,
                        p.exercise_name,
                        p.sets,
                        p.reps,
                        p.weight,
                        p.weight_unit
                    );
                }
            }
        }

        TemplateCommand::Rm { template } => {
            let user = app.require_user()?;
            let target = resolve_template(&templates, user, &template)?;
            templates.delete(user, target.id)?;
            println!("✓ Deleted template {}", target.name);
        }
    }

    Ok(())
}

/// Look up by id, falling back to a case-insensitive name match
fn resolve_exercise(
    library: &ExerciseLibrary<'_, FileStore>,
    user: &UserId,
    ident: &str,
) -> Result<Exercise> {
    if let Ok(id) = Uuid::parse_str(ident) {
        return library.get(user, id);
    }
    library
        .find_by_name(user, ident)?
        .ok_or_else(|| Error::NotFound(format!("exercise {:?}", ident)))
}

fn resolve_template(
    templates: &TemplateLibrary<'_, FileStore>,
    user: &UserId,
    ident: &str,
) -> Result<Template> {
    if let Ok(id) = Uuid::parse_str(ident) {
        return templates.get(user, id);
    }
    let wanted = ident.trim().to_lowercase();
    templates
        .list(Some(user))?
        .into_iter()
        .find(|t| t.name.to_lowercase() == wanted)
        .ok_or_else(|| Error::NotFound(format!("template {:?}", ident)))
}

// ============================================================================
// Schedule
// ============================================================================

fn cmd_week(app: &App, date: Option<NaiveDate>) -> Result<()> {
    let engine = ScheduleEngine::new(&app.store);
    let week = engine.get_week(app.user.as_ref(), date.unwrap_or_else(today))?;
    print_week(&week);
    Ok(())
}

fn cmd_schedule(app: &App, action: ScheduleCommand) -> Result<()> {
    let user = app.require_user()?;
    let engine = ScheduleEngine::new(&app.store);

    match action {
        ScheduleCommand::Add {
            day,
            date,
            template,
            name,
        } => {
            let week = week_key(date.unwrap_or_else(today));
            let spec = match (template, name) {
                (Some(ident), _) => {
                    let templates = TemplateLibrary::new(&app.store);
                    WorkoutSpec::from_template(&resolve_template(&templates, user, &ident)?)
                }
                (None, Some(name)) => WorkoutSpec::ad_hoc(name),
                (None, None) => {
                    return Err(Error::Validation(
                        "pass --template or --name".into(),
                    ))
                }
            };
            let instance = engine.add_workout(user, week, day, spec)?;
            let position = engine.week(Some(user), week)?.day(day).len();
            println!(
                "✓ Scheduled {} on {} {} (#{})",
                instance.display_name(),
                day.label(),
                week,
                position
            );
        }

        ScheduleCommand::Rm { day, index, date } => {
            let week = week_key(date.unwrap_or_else(today));
            let removed = engine.remove_workout(user, week, day, slot_index(index)?)?;
            println!("✓ Removed {} from {} {}", removed.display_name(), day.label(), week);
        }

        ScheduleCommand::Rename {
            day,
            index,
            name,
            date,
        } => {
            let week = week_key(date.unwrap_or_else(today));
            let patch = WorkoutPatch {
                custom_name: Some(name),
                ..Default::default()
            };
            let updated = engine.update_workout(user, week, day, slot_index(index)?, patch)?;
            println!("✓ Renamed to {}", updated.display_name());
        }
    }

    Ok(())
}

fn print_week(week: &Week) {
    let (total, done) = week.completion();
    println!("{}  {}", week.week_key, format_week_range(week.week_start));
    println!();

    for (date, (day, slot)) in days_of_week(week.week_start).iter().zip(week.days.iter()) {
        println!("{} {}", day.label(), date.format("%b %-d"));
        if slot.workouts.is_empty() {
            println!("    -");
        }
        for (i, workout) in slot.workouts.iter().enumerate() {
            let mark = if workout.is_completed { "✓" } else { " " };
            println!("  {}. [{}] {}", i + 1, mark, workout.display_name());
            for p in &workout.exercises {
                println!(
                    "         {} {}x{} @ {} {}",
                    p.exercise_name, p.sets, p.reps, p.weight, p.weight_unit
                );
            }
        }
    }

    println!();
    println!("{}/{} workouts completed", done, total);
}

// ============================================================================
// Logging
// ============================================================================

fn cmd_log(app: &App, args: LogArgs) -> Result<()> {
    let user = app.require_user()?;
    let engine = ScheduleEngine::new(&app.store);
    let library = ExerciseLibrary::new(&app.store);

    let scheduled = match (args.day, args.index) {
        (Some(day), Some(index)) => {
            let week = week_key(args.date.unwrap_or_else(today));
            let workout = engine.scheduled_workout(user, week, day, slot_index(index)?)?;
            if workout.instance.is_completed {
                println!("Note: {} is already completed.", workout.instance.display_name());
            }
            Some(workout)
        }
        _ => None,
    };

    let lookup = library.lookup(Some(user))?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut session =
        LogSession::start(scheduled, &app.config.session_defaults(), clock).with_lookup(&lookup);
    if let Some(name) = &args.name {
        session.set_name(name);
    }

    if args.auto_complete {
        session.complete_all_sets();
    } else if !run_interactive(&mut session, &library, user, app.config.tick_interval())? {
        println!("Session abandoned - nothing logged.");
        return Ok(());
    }

    let outcome = session.finish(&args.notes, &app.store, &engine, user)?;
    let log = outcome.log();
    println!(
        "\n✓ Logged {} ({} exercises, {} min)",
        log.name,
        log.exercises.len(),
        log.duration_minutes
    );
    match &outcome {
        FinishOutcome::Standalone(_) => {}
        FinishOutcome::Completed { instance, .. } => {
            println!("✓ Marked {} completed", instance.display_name());
        }
        FinishOutcome::SlotUpdateFailed { error, .. } => {
            eprintln!("! The log was saved but the scheduled workout could not be marked completed: {}", error);
            eprintln!("  Run `liftweek repair` to retry.");
        }
    }

    Ok(())
}

/// What the interactive loop should do next
enum Step {
    Continue,
    Finish,
    Abandon,
}

/// Edit the session from stdin; returns whether to finish (false = abandon)
fn run_interactive(
    session: &mut LogSession,
    library: &ExerciseLibrary<'_, FileStore>,
    user: &UserId,
    tick: std::time::Duration,
) -> Result<bool> {
    let elapsed = Arc::new(AtomicU64::new(0));
    let sink = Arc::clone(&elapsed);
    let _ticker = SessionTicker::start(tick, move |e| sink.store(e.as_secs(), Ordering::Relaxed));

    print_session(session);
    print_session_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let secs = elapsed.load(Ordering::Relaxed);
        print!("[{:02}:{:02}] > ", secs / 60, secs % 60);
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Ok(false);
        };
        match session_command(session, library, user, line?.trim()) {
            Ok(Step::Continue) => {}
            Ok(Step::Finish) => return Ok(true),
            Ok(Step::Abandon) => return Ok(false),
            Err(e) if e.is_validation() || e.is_not_found() => println!("  ! {}", e),
            Err(e) => return Err(e),
        }
    }
}

fn session_command(
    session: &mut LogSession,
    library: &ExerciseLibrary<'_, FileStore>,
    user: &UserId,
    line: &str,
) -> Result<Step> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Step::Continue);
    };
    let args: Vec<&str> = words.collect();
    let arg = |i: usize, what: &str| position(args.get(i).copied(), what);

    match command {
        "finish" | "f" => return Ok(Step::Finish),
        "quit" | "q" => return Ok(Step::Abandon),
        "help" | "?" => print_session_help(),
        "show" | "s" => {}
        "done" | "undo" => {
            let value = if command == "done" { "yes" } else { "no" };
            session.update_set(
                arg(0, "exercise")?,
                arg(1, "set")?,
                SetUpdate::parse("completed", value)?,
            )?;
        }
        "reps" | "weight" | "unit" => {
            let raw = args.get(2).copied().unwrap_or("");
            session.update_set(
                arg(0, "exercise")?,
                arg(1, "set")?,
                SetUpdate::parse(command, raw)?,
            )?;
        }
        "all" => session.complete_all_sets(),
        "add-set" => {
            session.add_set(arg(0, "exercise")?)?;
        }
        "rm-set" => {
            session.remove_set(arg(0, "exercise")?, arg(1, "set")?)?;
        }
        "add" => {
            let name = args.join(" ");
            let known = library.find_by_name(user, &name)?;
            session.add_exercise(&name, known.as_ref())?;
        }
        "rm" => {
            session.remove_exercise(arg(0, "exercise")?)?;
        }
        other => {
            println!("  Unknown command {:?}; type `help`", other);
            return Ok(Step::Continue);
        }
    }

    print_session(session);
    Ok(Step::Continue)
}

fn print_session(session: &LogSession) {
    println!();
    match session.scheduled() {
        Some(workout) => println!(
            "{}  ({} {} #{}, started {})",
            session.name(),
            workout.slot.week_key,
            workout.slot.day.label(),
            workout.slot.index + 1,
            session.started_at().with_timezone(&Local).format("%H:%M")
        ),
        None => println!(
            "{}  (started {})",
            session.name(),
            session.started_at().with_timezone(&Local).format("%H:%M")
        ),
    }
    if session.exercises().is_empty() {
        println!("  (no exercises - `add <name>` to add one)");
    }
    for (i, exercise) in session.exercises().iter().enumerate() {
        println!("  {}. {}", i + 1, exercise.exercise_name);
        for set in &exercise.sets {
            let mark = if set.completed { "✓" } else { " " };
            println!(
                "       [{}] set {}: {} x {} {}",
                mark, set.set_number, set.reps, set.weight, set.weight_unit
            );
        }
    }
}

fn print_session_help() {
    println!("─────────────────────────────────────────");
    println!("  done <ex> <set>          mark a set done (undo to clear)");
    println!("  reps|weight|unit <ex> <set> <value>");
    println!("  add-set <ex> / rm-set <ex> <set>");
    println!("  add <name> / rm <ex>     add or remove an exercise");
    println!("  all                      mark every set done");
    println!("  finish                   save the log");
    println!("  quit                     abandon without saving");
}

/// Convert a 1-based position typed by the user
fn position(raw: Option<&str>, what: &str) -> Result<usize> {
    let raw = raw.ok_or_else(|| Error::Validation(format!("missing {} number", what)))?;
    let n: usize = raw
        .parse()
        .map_err(|_| Error::Validation(format!("{} number must be a positive integer, got {:?}", what, raw)))?;
    slot_index(n)
}

fn slot_index(n: usize) -> Result<usize> {
    n.checked_sub(1)
        .ok_or_else(|| Error::Validation("positions start at 1".into()))
}

fn cmd_repair(app: &App) -> Result<()> {
    let user = app.require_user()?;
    let engine = ScheduleEngine::new(&app.store);
    let logs = fetch_all_logs(&app.store, Some(user))?;

    let repaired = engine.repair_completions(user, &logs)?;
    if repaired.is_empty() {
        println!("Nothing to repair.");
    }
    for slot in &repaired {
        println!("✓ Marked {} {} #{} completed", slot.week_key, slot.day.label(), slot.index + 1);
    }
    Ok(())
}

// ============================================================================
// History, stats, export
// ============================================================================

fn cmd_history(app: &App, page: usize) -> Result<()> {
    let page = page.max(1);
    let mut pager = LogPager::new(&app.store, app.user.as_ref(), app.config.history.page_size);

    let mut current = Vec::new();
    for _ in 0..page {
        current = pager.load_more()?.to_vec();
        if current.is_empty() {
            break;
        }
    }

    if current.is_empty() {
        if page == 1 {
            println!("No workouts logged yet.");
        } else {
            println!("No more history.");
        }
        return Ok(());
    }

    for log in &current {
        let duration = if log.duration_minutes > 0 {
            format!("{} min", log.duration_minutes)
        } else {
            "-".to_string()
        };
        println!(
            "{}  {:<24} {:>7}  {} exercises  volume {}",
            log.local_date(),
            log.name,
            duration,
            log.exercises.len(),
            analytics::log_volume(log).round()
        );
        if !log.notes.is_empty() {
            println!("            {}", log.notes);
        }
    }

    if pager.has_more() {
        println!();
        println!("More: liftweek history --page {}", page + 1);
    }
    Ok(())
}

fn cmd_stats(app: &App, exercise: Option<String>) -> Result<()> {
    let logs = fetch_all_logs(&app.store, app.user.as_ref())?;
    let lookup = ExerciseLibrary::new(&app.store).lookup(app.user.as_ref())?;

    if let Some(name) = exercise {
        let points = analytics::exercise_progress(&logs, &name);
        if points.is_empty() {
            println!("No completed weighted sets for {}.", name);
        }
        for point in points {
            println!("{}  {} {}", point.date.format("%b %-d"), point.max_weight, point.unit);
        }
        return Ok(());
    }

    let stats = analytics::summary_stats(&logs, &lookup);
    println!("Workouts:        {}", stats.total_workouts);
    println!("Total volume:    {}", stats.total_volume);
    println!("Total duration:  {} min", stats.total_duration);
    println!("Top muscle:      {}", stats.top_muscle);

    let weeks = analytics::weekly_frequency(&logs);
    if !weeks.is_empty() {
        println!("\nWorkouts per week");
        for entry in weeks {
            println!("  {}  {}", entry.week, entry.count);
        }
    }

    let groups = analytics::muscle_group_distribution(&logs, &lookup);
    if !groups.is_empty() {
        println!("\nMuscle groups");
        for entry in groups {
            println!("  {:<10} {}", entry.muscle_group, entry.count);
        }
    }

    let volume = analytics::volume_over_time(&logs);
    if !volume.is_empty() {
        println!("\nVolume");
        for point in volume {
            println!("  {}  {:<24} {}", point.date.format("%b %-d"), point.name, point.volume);
        }
    }

    let durations = analytics::duration_trend(&logs);
    if !durations.is_empty() {
        println!("\nDuration");
        for point in durations {
            println!("  {}  {:<24} {} min", point.date.format("%b %-d"), point.name, point.duration);
        }
    }

    let names = analytics::logged_exercise_names(&logs);
    if !names.is_empty() {
        println!("\nProgress available for: {}", names.join(", "));
    }
    Ok(())
}

fn cmd_export(app: &App, out: PathBuf) -> Result<()> {
    let logs = fetch_all_logs(&app.store, app.user.as_ref())?;
    let lookup = ExerciseLibrary::new(&app.store).lookup(app.user.as_ref())?;

    let rows = export_rows(&logs, &lookup);
    let written = write_csv(&rows, &out)?;
    if written == 0 {
        println!("No workout data to export yet.");
    } else {
        println!("✓ Exported {} rows", written);
        println!("  CSV: {}", out.display());
    }
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Strict parse; stored documents use the lenient `From<String>` instead
fn parse_muscle_group(raw: &str) -> Result<MuscleGroup> {
    raw.parse()
}

/// Day names are accepted in any case
fn parse_day(raw: &str) -> Result<DayKey> {
    raw.trim().to_lowercase().parse()
}
