mod api;
mod llm;
mod server;

use chrono::{Datelike, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use post_cockpit::batch::{generate_batch, BatchRequest};
use post_cockpit::calendar::{parse_day, parse_month, Calendar, PostOutcome};
use post_cockpit::compose::DraftOptions;
use post_cockpit::config::CockpitConfig;
use post_cockpit::library::DraftLibrary;
use post_cockpit::metrics::{parse_count, MetricInput, MetricLog, RankedGroup};
use post_cockpit::store::Stores;
use post_cockpit::variation::VariationOrder;
use post_cockpit::{Draft, Platform, SourceContext};

#[derive(Parser)]
#[command(name = "post-cockpit", about = "Draft, schedule and score advocacy posts")]
struct Cli {
    /// Config file (defaults to COCKPIT_CONFIG_PATH or config/cockpit.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a batch of drafts from one source
    Generate(GenerateArgs),
    #[command(subcommand)]
    Library(LibraryCommand),
    /// Schedule a saved draft
    Schedule { draft_id: String, when: String },
    /// Mark a scheduled entry as posted
    Posted { entry_id: String },
    /// Remove a scheduled entry
    Unschedule { entry_id: String },
    /// Move a pending entry to a new time
    Move { entry_id: String, when: String },
    /// Per-day counts of pending posts for a month (YYYY-MM)
    Month { month: Option<String> },
    /// Pending posts for one day (YYYY-MM-DD)
    Agenda { day: Option<String> },
    /// Log engagement for a published post
    Metric(MetricArgs),
    /// Rank hashtags and templates by average score
    Rank {
        #[arg(value_enum)]
        by: Option<RankBy>,
    },
    #[command(subcommand)]
    Config(ConfigCommand),
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
    count: i64,
    #[arg(long, default_value = "")]
    platform: String,
    #[arg(long, default_value = "")]
    template: String,
    #[arg(long, default_value = "")]
    tone: String,
    #[arg(long, default_value = "")]
    link_policy: String,
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    source: String,
    #[arg(long, default_value = "")]
    link: String,
    /// Replaces the source link in every draft that carries one
    #[arg(long)]
    link_override: Option<String>,
    #[arg(long, default_value = "")]
    text: String,
    #[arg(long, default_value = "")]
    notes: String,
    /// Hashtag, repeatable
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Named hashtag pack from config
    #[arg(long)]
    pack: Option<String>,
    /// Shuffle phrase variants with this seed
    #[arg(long)]
    seed: Option<u64>,
    /// Save the generated drafts to the library
    #[arg(long)]
    save: bool,
}

#[derive(Subcommand)]
enum LibraryCommand {
    /// Saved drafts, newest first
    List,
    Show { draft_id: String },
    /// Replace a saved draft's text
    Edit { draft_id: String, text: String },
    Delete { draft_id: String },
}

#[derive(Args, Debug, Clone)]
struct MetricArgs {
    #[arg(long, default_value = "bluesky")]
    platform: String,
    #[arg(long, default_value = "basic")]
    template: String,
    #[arg(long)]
    text: String,
    #[arg(long, default_value = "")]
    likes: String,
    #[arg(long, default_value = "")]
    reposts: String,
    #[arg(long, default_value = "")]
    replies: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RankBy {
    Tag,
    Template,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write the default config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
    /// Static web app to serve at `/`
    #[arg(long)]
    web_root: Option<String>,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();

    if let Command::Config(ConfigCommand::Init { force }) = &cli.command {
        return run_config_init(cli.config.clone(), *force);
    }

    let (config, config_path) = CockpitConfig::load(cli.config).map_err(|err| err.to_string())?;
    if let Some(path) = config_path.as_ref().filter(|path| path.exists()) {
        tracing::debug!(path = %path.display(), "loaded config");
    }

    match cli.command {
        Command::Generate(args) => run_generate(args, &config),
        Command::Library(command) => run_library(command, &config),
        Command::Schedule { draft_id, when } => run_schedule(&draft_id, &when, &config),
        Command::Posted { entry_id } => run_posted(&entry_id, &config),
        Command::Unschedule { entry_id } => run_unschedule(&entry_id, &config),
        Command::Move { entry_id, when } => run_move(&entry_id, &when, &config),
        Command::Month { month } => run_month(month, &config),
        Command::Agenda { day } => run_agenda(day, &config),
        Command::Metric(args) => run_metric(args, &config),
        Command::Rank { by } => run_rank(by, &config),
        Command::Config(_) => Ok(()),
        Command::Serve(args) => server::serve(args, config).await,
    }
}

fn run_generate(args: GenerateArgs, config: &CockpitConfig) -> Result<(), String> {
    let mut tags = Vec::new();
    if let Some(pack) = args.pack.as_deref() {
        let pack_tags = config
            .pack_tags(pack)
            .ok_or_else(|| format!("unknown hashtag pack: {}", pack))?;
        tags.extend(pack_tags.iter().cloned());
    }
    tags.extend(args.tags);

    let request = BatchRequest {
        count: args.count,
        options: DraftOptions {
            platform: args.platform,
            template_id: args.template,
            tone: args.tone,
            link_policy: args.link_policy,
        },
        context: SourceContext {
            title: args.title,
            source: args.source,
            link: args.link,
            base_text: args.text,
            notes: args.notes,
        },
        tags,
        link_override: args.link_override,
        order: args
            .seed
            .map(|seed| VariationOrder::Shuffled { seed })
            .unwrap_or_default(),
    };

    let batch = generate_batch(&request, config, Utc::now());
    for warning in &batch.warnings {
        eprintln!("warning: {}", warning);
    }
    for (index, draft) in batch.drafts.iter().enumerate() {
        if index > 0 {
            println!();
        }
        print_draft(draft, config);
    }

    if args.save {
        let stores = open_stores(config)?;
        stores
            .drafts
            .update(|stored| {
                let mut library = DraftLibrary::new(std::mem::take(stored));
                for draft in &batch.drafts {
                    library.save(draft.clone());
                }
                *stored = library.into_drafts();
                Ok(())
            })
            .map_err(|err| format!("failed to save drafts: {}", err))?;
        println!("\nSaved {} drafts.", batch.drafts.len());
    }
    Ok(())
}

fn run_library(command: LibraryCommand, config: &CockpitConfig) -> Result<(), String> {
    let stores = open_stores(config)?;
    match command {
        LibraryCommand::List => {
            let library = DraftLibrary::new(stores.drafts.load().map_err(|err| err.to_string())?);
            if library.drafts().is_empty() {
                println!("No saved drafts.");
            }
            for draft in library.list() {
                println!(
                    "{}  {}  {:<10} {}",
                    draft.created_at.format("%Y-%m-%d %H:%M"),
                    draft.id,
                    draft.platform.id(),
                    first_line(&draft.text)
                );
            }
        }
        LibraryCommand::Show { draft_id } => {
            let library = DraftLibrary::new(stores.drafts.load().map_err(|err| err.to_string())?);
            let draft = library
                .get(&draft_id)
                .ok_or_else(|| format!("draft not found: {}", draft_id))?;
            print_draft(draft, config);
        }
        LibraryCommand::Edit { draft_id, text } => {
            let max = config.platforms.bluesky_max_chars;
            let draft = stores
                .drafts
                .update(|stored| {
                    let mut library = DraftLibrary::new(std::mem::take(stored));
                    let result = library.update_text(&draft_id, &text, max).cloned();
                    *stored = library.into_drafts();
                    result
                })
                .map_err(|err| err.to_string())?;
            print_draft(&draft, config);
        }
        LibraryCommand::Delete { draft_id } => {
            let draft = stores
                .drafts
                .update(|stored| {
                    let mut library = DraftLibrary::new(std::mem::take(stored));
                    let result = library.delete(&draft_id);
                    *stored = library.into_drafts();
                    result
                })
                .map_err(|err| err.to_string())?;
            println!("Deleted {}.", draft.id);
        }
    }
    Ok(())
}

fn run_schedule(draft_id: &str, when: &str, config: &CockpitConfig) -> Result<(), String> {
    let stores = open_stores(config)?;
    let library = DraftLibrary::new(stores.drafts.load().map_err(|err| err.to_string())?);
    let draft = library
        .get(draft_id)
        .ok_or_else(|| format!("draft not found: {}", draft_id))?;
    let zone = config.calendar.zone();
    let entry = stores
        .schedule
        .update(|entries| {
            let mut calendar = Calendar::new(std::mem::take(entries), zone);
            let result = calendar.schedule(draft, when, Utc::now());
            *entries = calendar.into_entries();
            result
        })
        .map_err(|err| err.to_string())?;
    println!(
        "Scheduled {} for {}.",
        entry.id,
        zone.format(entry.scheduled_for, "%Y-%m-%d %H:%M")
    );
    Ok(())
}

fn run_posted(entry_id: &str, config: &CockpitConfig) -> Result<(), String> {
    let stores = open_stores(config)?;
    let zone = config.calendar.zone();
    let outcome = stores
        .schedule
        .update(|entries| {
            let mut calendar = Calendar::new(std::mem::take(entries), zone);
            let result = calendar.mark_posted(entry_id);
            *entries = calendar.into_entries();
            result
        })
        .map_err(|err| err.to_string())?;
    match outcome {
        PostOutcome::Posted => println!("Marked {} as posted.", entry_id),
        PostOutcome::AlreadyPosted => println!("{} was already posted.", entry_id),
    }
    Ok(())
}

fn run_unschedule(entry_id: &str, config: &CockpitConfig) -> Result<(), String> {
    let stores = open_stores(config)?;
    let zone = config.calendar.zone();
    let entry = stores
        .schedule
        .update(|entries| {
            let mut calendar = Calendar::new(std::mem::take(entries), zone);
            let result = calendar.delete_entry(entry_id);
            *entries = calendar.into_entries();
            result
        })
        .map_err(|err| err.to_string())?;
    println!("Removed {}.", entry.id);
    Ok(())
}

fn run_move(entry_id: &str, when: &str, config: &CockpitConfig) -> Result<(), String> {
    let stores = open_stores(config)?;
    let zone = config.calendar.zone();
    let entry = stores
        .schedule
        .update(|entries| {
            let mut calendar = Calendar::new(std::mem::take(entries), zone);
            let result = calendar.move_entry(entry_id, when);
            *entries = calendar.into_entries();
            result
        })
        .map_err(|err| err.to_string())?;
    println!(
        "Moved {} to {}.",
        entry.id,
        zone.format(entry.scheduled_for, "%Y-%m-%d %H:%M")
    );
    Ok(())
}

fn run_month(month: Option<String>, config: &CockpitConfig) -> Result<(), String> {
    let calendar = load_calendar(config)?;
    let anchor = match month {
        Some(raw) => parse_month(&raw).map_err(|err| err.to_string())?,
        None => {
            let today = calendar.day_key(Utc::now());
            today.with_day(1).unwrap_or(today)
        }
    };
    let occupancy = calendar.month_occupancy(anchor);
    println!("{}", anchor.format("%B %Y"));
    if occupancy.is_empty() {
        println!("Nothing scheduled.");
    }
    for (day, count) in occupancy {
        println!("  {}  {}", day.format("%a %d"), count);
    }
    Ok(())
}

fn run_agenda(day: Option<String>, config: &CockpitConfig) -> Result<(), String> {
    let calendar = load_calendar(config)?;
    let day = match day {
        Some(raw) => parse_day(&raw).map_err(|err| err.to_string())?,
        None => calendar.day_key(Utc::now()),
    };
    let agenda = calendar.agenda_for_day(day);
    println!("{}", day.format("%A %Y-%m-%d"));
    if agenda.is_empty() {
        println!("Nothing scheduled.");
    }
    for entry in agenda {
        println!(
            "  {}  {}  {:<10} {}",
            calendar.zone().format(entry.scheduled_for, "%H:%M"),
            entry.id,
            entry.platform.id(),
            first_line(&entry.text)
        );
    }
    Ok(())
}

fn run_metric(args: MetricArgs, config: &CockpitConfig) -> Result<(), String> {
    let platform = Platform::from_str(&args.platform)
        .ok_or_else(|| format!("invalid platform: {}", args.platform))?;
    let input = MetricInput {
        platform,
        template_id: args.template,
        text: args.text,
        likes: parse_count("likes", &args.likes).map_err(|err| err.to_string())?,
        reposts: parse_count("reposts", &args.reposts).map_err(|err| err.to_string())?,
        replies: parse_count("replies", &args.replies).map_err(|err| err.to_string())?,
    };

    let stores = open_stores(config)?;
    let weights = config.scoring.clone();
    let entry = stores
        .metrics
        .update(|entries| {
            let mut log = MetricLog::new(std::mem::take(entries));
            let result = log.record(input, &weights, Utc::now());
            *entries = log.into_entries();
            result
        })
        .map_err(|err| err.to_string())?;
    println!("Logged {} with score {}.", entry.id, entry.score);
    if !entry.tags.is_empty() {
        println!("Tags: {}", entry.tags.join(", "));
    }
    Ok(())
}

fn run_rank(by: Option<RankBy>, config: &CockpitConfig) -> Result<(), String> {
    let stores = open_stores(config)?;
    let log = MetricLog::new(stores.metrics.load().map_err(|err| err.to_string())?);
    if !matches!(by, Some(RankBy::Template)) {
        print_ranking("Hashtags", &log.rank_by_tag());
    }
    if by.is_none() {
        println!();
    }
    if !matches!(by, Some(RankBy::Tag)) {
        let groups = log.rank_by_template();
        println!("Templates");
        if groups.is_empty() {
            println!("  (no entries)");
        }
        for group in groups {
            println!(
                "  {:<24} avg {:>7.1}  total {:>6}  n {}",
                config.template_name(&group.key),
                group.avg,
                group.total,
                group.count
            );
        }
    }
    Ok(())
}

fn run_config_init(path: Option<PathBuf>, force: bool) -> Result<(), String> {
    let path = path
        .or_else(|| std::env::var("COCKPIT_CONFIG_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config/cockpit.toml"));
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (pass --force to overwrite)",
            path.display()
        ));
    }
    CockpitConfig::default()
        .write(&path)
        .map_err(|err| format!("failed to write config: {}", err))?;
    println!("Wrote {}.", path.display());
    Ok(())
}

fn print_ranking(title: &str, groups: &[RankedGroup]) {
    println!("{}", title);
    if groups.is_empty() {
        println!("  (no entries)");
    }
    for group in groups {
        println!(
            "  #{:<23} avg {:>7.1}  total {:>6}  n {}",
            group.key, group.avg, group.total, group.count
        );
    }
}

fn print_draft(draft: &Draft, config: &CockpitConfig) {
    println!(
        "{} [{} | {} | {}]",
        draft.id,
        draft.platform.label(),
        config.template_name(&draft.template_id),
        draft.tone.id()
    );
    println!("{}", draft.text);
    if let Some(comment) = draft.first_comment.as_ref() {
        println!("First comment: {}", comment);
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

fn open_stores(config: &CockpitConfig) -> Result<Stores, String> {
    Stores::open(&config.storage.data_dir)
        .map_err(|err| format!("failed to open data dir: {}", err))
}

fn load_calendar(config: &CockpitConfig) -> Result<Calendar, String> {
    let stores = open_stores(config)?;
    let entries = stores.schedule.load().map_err(|err| err.to_string())?;
    Ok(Calendar::new(entries, config.calendar.zone()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("post_cockpit=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
