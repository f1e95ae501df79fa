use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use uuid::Uuid;
use wodlog_core::*;

#[derive(Parser)]
#[command(name = "wodlog")]
#[command(about = "Log workout results against the daily programming", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Athlete to act for (defaults to the configured athlete)
    #[arg(long, global = true)]
    athlete: Option<String>,

    /// Day treated as today (YYYY-MM-DD)
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's workout and what logging would do (default)
    Today,

    /// Log today's result
    Log {
        #[command(flatten)]
        edit: EditArgs,

        /// Log against this catalog workout instead of today's
        #[arg(long, conflicts_with = "custom")]
        workout: Option<String>,

        /// Log a custom workout instead of the programmed one
        #[arg(long)]
        custom: bool,

        /// Custom workout name
        #[arg(long, requires = "custom")]
        name: Option<String>,

        /// Custom workout type (e.g. "For Time", "AMRAP")
        #[arg(long = "type", requires = "custom")]
        workout_type: Option<String>,

        /// Custom workout movement (repeatable)
        #[arg(long = "movement", requires = "custom")]
        movements: Vec<String>,
    },

    /// Edit a stored result by id
    Edit {
        id: Uuid,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// List logged results, newest first
    History {
        /// Show at most this many results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Delete a stored result by id
    Delete { id: Uuid },

    /// Export all results to CSV
    Export { path: PathBuf },

    /// Show the score category for a workout type
    Classify { label: String },
}

#[derive(Args)]
struct EditArgs {
    /// Whole score as stored text (e.g. 12:34, 8+15, 225)
    #[arg(long)]
    score: Option<String>,

    #[arg(long)]
    minutes: Option<String>,

    #[arg(long)]
    seconds: Option<String>,

    #[arg(long)]
    rounds: Option<String>,

    #[arg(long)]
    reps: Option<String>,

    #[arg(long)]
    amount: Option<String>,

    /// Freeform score text
    #[arg(long)]
    text: Option<String>,

    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    #[arg(long)]
    notes: Option<String>,

    /// Photo reference to attach
    #[arg(long)]
    photo: Option<String>,

    /// Load used for a movement, as N=LOAD with N counting from 1 (repeatable)
    #[arg(long = "load", value_parser = parse_load)]
    loads: Vec<(usize, String)>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Rx,
    Scaled,
}

impl From<ModeArg> for ScoreMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Rx => ScoreMode::Rx,
            ModeArg::Scaled => ScoreMode::Scaled,
        }
    }
}

/// Resolved settings shared by every command
struct Context {
    config: Config,
    athlete: String,
    today: NaiveDate,
}

impl Context {
    fn store(&self) -> JsonlResultStore {
        JsonlResultStore::new(self.config.data.results_path())
    }

    fn catalog(&self) -> JsonCatalog {
        JsonCatalog::new(self.config.data.catalog_path())
    }

    /// Engine loaded with today's state
    fn engine(&self, store: &JsonlResultStore, catalog: &JsonCatalog) -> Result<ReconcileEngine> {
        let mut engine = ReconcileEngine::new(self.athlete.clone(), self.today)
            .with_benchmarks(self.config.benchmarks.names.clone());
        engine.load(store, catalog)?;
        Ok(engine)
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        wodlog_core::logging::init_with_level("debug");
    } else {
        wodlog_core::logging::init();
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(data_dir) = cli.data_dir {
        config.data.data_dir = data_dir;
    }

    let ctx = Context {
        athlete: cli.athlete.unwrap_or_else(|| config.athlete.id.clone()),
        today: cli
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
        config,
    };

    match cli.command {
        Some(Commands::Today) | None => cmd_today(&ctx),
        Some(Commands::Log {
            edit,
            workout,
            custom,
            name,
            workout_type,
            movements,
        }) => cmd_log(&ctx, edit, workout, custom, name, workout_type, movements),
        Some(Commands::Edit { id, edit }) => cmd_edit(&ctx, id, edit),
        Some(Commands::History { limit }) => cmd_history(&ctx, limit),
        Some(Commands::Delete { id }) => cmd_delete(&ctx, id),
        Some(Commands::Export { path }) => cmd_export(&ctx, path),
        Some(Commands::Classify { label }) => {
            println!("{}", classify(&label));
            Ok(())
        }
    }
}

fn cmd_today(ctx: &Context) -> Result<()> {
    let store = ctx.store();
    let catalog = ctx.catalog();
    let engine = ctx.engine(&store, &catalog)?;

    println!("\n{} ({})", ctx.today, ctx.athlete);

    match engine.displayed_workout() {
        Some(workout) => {
            println!("  {} [{}]", workout.title(), workout.workout_type);
            for (i, movement) in workout.movements.iter().enumerate() {
                println!("    {}. {}", i + 1, movement);
            }
        }
        None => println!("  No workout programmed"),
    }

    println!("\n  State: {}", engine.tag());
    if let Some(draft) = engine.draft() {
        display_draft(draft, &ctx.config.display.weight_unit);
    }

    let others = engine
        .day_results()
        .iter()
        .filter(|r| r.payload.athlete_id != ctx.athlete)
        .count();
    if others > 0 {
        println!("\n  {} other athlete(s) logged today", others);
    }
    println!();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_log(
    ctx: &Context,
    edit: EditArgs,
    workout: Option<String>,
    custom: bool,
    name: Option<String>,
    workout_type: Option<String>,
    movements: Vec<String>,
) -> Result<()> {
    let mut store = ctx.store();
    let catalog = ctx.catalog();
    let mut engine = ctx.engine(&store, &catalog)?;

    if let Some(workout) = workout {
        engine.display_workout(Some(&workout))?;
    }

    if custom {
        engine.start_custom_workout();
        let draft = draft_mut(&mut engine)?;
        if let Some(name) = name {
            draft.set_custom_name(name)?;
        }
        if let Some(workout_type) = workout_type {
            draft.set_custom_type(workout_type)?;
        }
        if !movements.is_empty() {
            draft.set_custom_movements(movements)?;
        }
    }

    if engine.tag() == StateTag::Idle {
        return Err(Error::State(format!(
            "no workout programmed for {}; use --custom to log your own",
            ctx.today
        )));
    }

    apply_edits(draft_mut(&mut engine)?, edit)?;
    submit(&mut engine, &mut store, &catalog)
}

fn cmd_edit(ctx: &Context, id: Uuid, edit: EditArgs) -> Result<()> {
    let mut store = ctx.store();
    let catalog = ctx.catalog();
    let mut engine = ctx.engine(&store, &catalog)?;

    engine.start_editing_past(id)?;
    apply_edits(draft_mut(&mut engine)?, edit)?;
    submit(&mut engine, &mut store, &catalog)
}

fn cmd_history(ctx: &Context, limit: Option<usize>) -> Result<()> {
    let store = ctx.store();
    let catalog = ctx.catalog();
    let engine = ctx.engine(&store, &catalog)?;
    let unit = &ctx.config.display.weight_unit;

    if engine.results().is_empty() {
        println!("No results logged yet.");
        return Ok(());
    }

    let limit = limit.unwrap_or(usize::MAX);
    for result in engine.results().iter().take(limit) {
        let title = match result.workout_id() {
            Some(id) => catalog::find_workout(engine.workouts(), id)
                .map(|w| w.title().to_string())
                .unwrap_or_else(|| id.to_string()),
            None => result.payload.custom_name.clone().unwrap_or_default(),
        };
        let score = codec::parse(&result.payload.score, engine.category_of(result))
            .map(|s| s.describe(unit))
            .unwrap_or_else(|| result.payload.score.clone());

        println!(
            "{}  {:<24} {:<20} {:<6} {}",
            result.date(),
            title,
            score,
            result.payload.mode.to_string(),
            result.id
        );
    }
    Ok(())
}

fn cmd_delete(ctx: &Context, id: Uuid) -> Result<()> {
    let mut store = ctx.store();
    let catalog = ctx.catalog();
    let mut engine = ctx.engine(&store, &catalog)?;

    engine.delete_result(id, &mut store, &catalog)?;
    println!("✓ Deleted result {}", id);
    Ok(())
}

fn cmd_export(ctx: &Context, path: PathBuf) -> Result<()> {
    let store = ctx.store();
    let catalog = ctx.catalog();
    let engine = ctx.engine(&store, &catalog)?;

    let count = export::write_results_csv(
        engine.results(),
        engine.workouts(),
        &path,
        &ctx.config.display.weight_unit,
    )?;
    println!("✓ Exported {} results", count);
    println!("  CSV: {}", path.display());
    Ok(())
}

fn draft_mut(engine: &mut ReconcileEngine) -> Result<&mut ResultDraft> {
    engine
        .draft_mut()
        .ok_or_else(|| Error::State("nothing to edit".into()))
}

fn apply_edits(draft: &mut ResultDraft, edit: EditArgs) -> Result<()> {
    if let Some(score) = edit.score {
        draft.score_mut().set_text(&score);
    }

    let fields = [
        ("minutes", edit.minutes),
        ("seconds", edit.seconds),
        ("rounds", edit.rounds),
        ("reps", edit.reps),
        ("amount", edit.amount),
        ("text", edit.text),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            draft.score_mut().set_field(name, value)?;
        }
    }

    if let Some(mode) = edit.mode {
        draft.mode = mode.into();
    }
    if let Some(notes) = edit.notes {
        draft.notes = notes;
    }
    if let Some(photo) = edit.photo {
        draft.photo = Some(photo);
    }

    for (index, value) in edit.loads {
        if !draft.set_load(index, value) {
            return Err(ValidationError::UnknownMovement {
                number: index + 1,
                count: draft.movement_loads().len(),
            }
            .into());
        }
    }
    Ok(())
}

/// `N=LOAD` with N counting from 1
fn parse_load(arg: &str) -> std::result::Result<(usize, String), String> {
    let invalid = || format!("expected N=LOAD with N from 1, got {:?}", arg);
    let (index, value) = arg.split_once('=').ok_or_else(invalid)?;
    let index: usize = index.trim().parse().map_err(|_| invalid())?;
    if index == 0 {
        return Err(invalid());
    }
    Ok((index - 1, value.trim().to_string()))
}

fn submit(
    engine: &mut ReconcileEngine,
    store: &mut JsonlResultStore,
    catalog: &JsonCatalog,
) -> Result<()> {
    let updating = engine.state().target_id().is_some();
    let tag = engine.tag();
    let saved = engine.submit(store, catalog)?;

    if updating {
        println!("✓ Updated result {}", saved.id);
    } else {
        println!("✓ Logged result {}", saved.id);
    }
    if tag == StateTag::EditingCatalogMismatched {
        println!("  (replaced the other result you had logged for {})", saved.date());
    }
    println!("  Score: {}", display_score(&saved.payload.score));
    Ok(())
}

fn display_score(score: &str) -> &str {
    if score.is_empty() {
        "(blank)"
    } else {
        score
    }
}

fn display_draft(draft: &ResultDraft, weight_unit: &str) {
    let editor = draft.score();
    if let Some(custom) = draft.custom() {
        println!("  Custom: {} [{}]", custom.name(), custom.workout_type());
    }
    match editor.encoded() {
        Ok(text) => println!("  Score ({}): {}", editor.category(), display_score(&text)),
        Err(e) => println!("  Score ({}): {}", editor.category(), e),
    }
    if editor.is_fallback() {
        println!("    stored score does not match this workout type; editing as freeform text");
    } else if let Ok(score) = editor.score() {
        let described = score.describe(weight_unit);
        if !described.is_empty() {
            println!("    {}", described);
        }
    }
    for name in editor.fields().names() {
        println!("    {}: {}", name, editor.fields().get(name).unwrap_or_default());
    }
    println!("  Mode: {}", draft.mode);
    if !draft.notes.is_empty() {
        println!("  Notes: {}", draft.notes);
    }
    for (i, load) in draft.movement_loads().iter().enumerate() {
        if !load.is_empty() {
            println!("  Load {}: {}", i + 1, load);
        }
    }
}
