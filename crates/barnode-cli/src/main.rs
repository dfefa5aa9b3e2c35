use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use barnode_analysis::{
    DuplicateGroup, apply_plan, group_duplicates, normalize_name, plan_consolidation,
};
use barnode_core::{AppConfig, Database, ExitCode, note_text, plan_text_import};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "barnode",
    about = "Bar inventory tracker — missing list, article archive, duplicate analysis",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting BARNODE_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// The missing list: what needs restocking.
    Missing {
        #[command(subcommand)]
        action: MissingAction,
    },

    /// The article archive.
    Article {
        #[command(subcommand)]
        action: ArticleAction,
    },

    /// Import article names from a text file, one per line.
    Import {
        file: String,
        /// Plan only; create nothing.
        #[arg(long)]
        dry_run: bool,
    },

    /// The shared shopping note.
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },

    /// Backup and restore the full state.
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Find groups of near-duplicate article names.
    Analyze,

    /// Merge a duplicate group into one article.
    Consolidate {
        /// Group id as printed by `analyze`.
        group_id: String,

        /// The article that survives the merge.
        #[arg(long)]
        master: Uuid,

        /// Final name for the surviving article (normalized before use).
        #[arg(long)]
        name: String,

        /// Restrict the merge to these members (defaults to the whole group).
        #[arg(long = "member", action = clap::ArgAction::Append)]
        members: Vec<Uuid>,
    },

    /// Show inventory statistics.
    Stats,

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ─── Missing Actions ────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum MissingAction {
    /// List missing items.
    List,
    /// Mark an article as missing, creating the article if it doesn't exist.
    Add { name: String },
    /// Remove a missing item (restocked).
    Remove { id: Uuid },
}

// ─── Article Actions ────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ArticleAction {
    /// List all articles.
    List,
    /// Get an article by id.
    Get { id: Uuid },
    /// Add an article.
    Add { name: String },
    /// Rename an article (the new name is normalized).
    Rename { id: Uuid, name: String },
    /// Delete an article and its missing-list entries.
    Delete {
        id: Uuid,
        #[arg(long)]
        confirm: bool,
    },
    /// Search articles by name substring.
    Search { query: String },
}

// ─── Note Actions ───────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum NoteAction {
    /// Print the note, seeding it from the article list on first access.
    Show,
    /// Overwrite the note content.
    Set { content: String },
    /// Rewrite the note from the current article list.
    Generate,
}

// ─── Backup Actions ─────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum BackupAction {
    /// Snapshot the full state into the backup row.
    Save,
    /// Replace the current state with the latest snapshot.
    Restore {
        #[arg(long)]
        confirm: bool,
    },
}

// ─── Config Actions ─────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all config values.
    List,
    /// Print the config file path.
    Path,
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging();

    let start = Instant::now();
    let cli = Cli::parse();

    let json_output = cli.json || std::env::var("BARNODE_JSON").as_deref() == Ok("1");
    let config = AppConfig::load()?;

    match cli.command {
        Commands::Missing { action } => run_missing(action, &config, json_output, start)?,
        Commands::Article { action } => run_article(action, &config, json_output, start)?,
        Commands::Import { file, dry_run } => {
            run_import(&file, dry_run, &config, json_output, start)?
        }
        Commands::Note { action } => run_note(action, &config, json_output)?,
        Commands::Backup { action } => run_backup(action, &config, json_output)?,
        Commands::Analyze => run_analyze(&config, json_output, start)?,
        Commands::Consolidate {
            group_id,
            master,
            name,
            members,
        } => run_consolidate(&group_id, master, &name, &members, &config, json_output)?,
        Commands::Stats => run_stats(&config, json_output)?,
        Commands::Config { action } => run_config(action, &config, json_output)?,
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("BARNODE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_db(config: &AppConfig) -> Result<Database> {
    Ok(Database::open(&config.database_path())?)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ─── Missing ────────────────────────────────────────────────────────────────

fn run_missing(
    action: MissingAction,
    config: &AppConfig,
    json_output: bool,
    start: Instant,
) -> Result<()> {
    let db = open_db(config)?;

    match action {
        MissingAction::List => {
            let items = db.list_missing_items()?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": items, "total": items.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if items.is_empty() {
                println!("Nothing is missing. Use `barnode missing add` to mark articles.");
            } else {
                for item in &items {
                    println!("{}  {}", item.id, item.article_name);
                }
            }
        }

        MissingAction::Add { name } => {
            let article = match db.find_article_by_name(&name)? {
                Some(existing) => existing,
                None => db.create_article(&name)?,
            };
            let item = db.add_missing_item(&article)?;

            if json_output {
                print_json(&serde_json::json!({"status": "ok", "data": item}))?;
            } else {
                println!("Missing: {} ({})", item.article_name, item.id);
            }
        }

        MissingAction::Remove { id } => {
            db.remove_missing_item(&id)?;
            if json_output {
                print_json(&serde_json::json!({"status": "ok", "data": {"removed": id}}))?;
            } else {
                println!("Restocked: {id}");
            }
        }
    }

    Ok(())
}

// ─── Articles ───────────────────────────────────────────────────────────────

fn run_article(
    action: ArticleAction,
    config: &AppConfig,
    json_output: bool,
    start: Instant,
) -> Result<()> {
    let db = open_db(config)?;

    match action {
        ArticleAction::List => {
            let articles = db.list_articles()?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": articles, "total": articles.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if articles.is_empty() {
                println!("No articles yet. Use `barnode article add` or `barnode import`.");
            } else {
                for article in &articles {
                    println!("{}  {}", article.id, article.name);
                }
            }
        }

        ArticleAction::Get { id } => match db.get_article(&id) {
            Ok(article) => {
                if json_output {
                    print_json(&serde_json::json!({"status": "ok", "data": article}))?;
                } else {
                    println!("{}", serde_json::to_string_pretty(&article)?);
                }
            }
            Err(_) => {
                eprintln!("Article not found: {id}");
                std::process::exit(ExitCode::NotFound as i32);
            }
        },

        ArticleAction::Add { name } => {
            let article = db.create_article(&name)?;
            if json_output {
                print_json(&serde_json::json!({"status": "ok", "data": article}))?;
            } else {
                println!("Added: {} ({})", article.name, article.id);
            }
        }

        ArticleAction::Rename { id, name } => {
            let normalized = normalize_name(&name);
            db.rename_article(&id, &normalized)?;
            if json_output {
                print_json(&serde_json::json!({"status": "ok", "data": {"id": id, "name": normalized}}))?;
            } else {
                println!("Renamed to: {normalized}");
            }
        }

        ArticleAction::Delete { id, confirm } => {
            if !confirm {
                eprintln!("Add --confirm to delete without prompt.");
                std::process::exit(ExitCode::ConfirmRequired as i32);
            }
            db.delete_article(&id)?;
            if json_output {
                print_json(&serde_json::json!({"status": "ok", "data": {"deleted": id}}))?;
            } else {
                println!("Deleted article: {id}");
            }
        }

        ArticleAction::Search { query } => {
            let results = db.search_articles(&query)?;
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": results, "total": results.len(), "query": query }
                }))?;
            } else if results.is_empty() {
                println!("No results for: {query}");
            } else {
                for article in &results {
                    println!("{}  {}", article.id, article.name);
                }
            }
        }
    }

    Ok(())
}

// ─── Import ─────────────────────────────────────────────────────────────────

fn run_import(
    file: &str,
    dry_run: bool,
    config: &AppConfig,
    json_output: bool,
    start: Instant,
) -> Result<()> {
    let text = std::fs::read_to_string(file)?;
    let db = open_db(config)?;

    let existing = db.list_articles()?;
    let plan = plan_text_import(&text, &existing);

    let created = if dry_run {
        0
    } else {
        for name in &plan.candidates {
            db.create_article(name)?;
        }
        if !plan.candidates.is_empty() && config.backup.auto_snapshot {
            db.save_snapshot()?;
        }
        plan.candidates.len()
    };
    let dur = start.elapsed().as_millis();

    if json_output {
        print_json(&serde_json::json!({
            "status": "ok",
            "data": {
                "candidates": plan.candidates,
                "created": created,
                "skipped_existing": plan.skipped_existing,
                "skipped_duplicates": plan.skipped_duplicates,
                "dry_run": dry_run
            },
            "meta": { "duration_ms": dur }
        }))?;
    } else {
        if dry_run {
            for name in &plan.candidates {
                println!("{name}");
            }
        }
        println!(
            "{} new, {} already present, {} repeated lines",
            plan.candidates.len(),
            plan.skipped_existing,
            plan.skipped_duplicates
        );
    }

    Ok(())
}

// ─── Note ───────────────────────────────────────────────────────────────────

fn run_note(action: NoteAction, config: &AppConfig, json_output: bool) -> Result<()> {
    let db = open_db(config)?;

    match action {
        NoteAction::Show => {
            let seed = note_text(&db.list_articles()?);
            let note = db.get_or_init_note(&seed)?;
            if json_output {
                print_json(&serde_json::json!({"status": "ok", "data": note}))?;
            } else {
                println!("{}", note.content);
            }
        }

        NoteAction::Set { content } => {
            let note = db.get_or_init_note(&content)?;
            if note.content != content {
                db.save_note(&note.id, &content)?;
            }
            if json_output {
                print_json(&serde_json::json!({"status": "ok", "data": {"id": note.id}}))?;
            } else {
                println!("Note saved.");
            }
        }

        NoteAction::Generate => {
            let text = note_text(&db.list_articles()?);
            let note = db.get_or_init_note(&text)?;
            if note.content != text {
                db.save_note(&note.id, &text)?;
            }
            if json_output {
                print_json(&serde_json::json!({"status": "ok", "data": {"content": text}}))?;
            } else {
                println!("{text}");
            }
        }
    }

    Ok(())
}

// ─── Backup ─────────────────────────────────────────────────────────────────

fn run_backup(action: BackupAction, config: &AppConfig, json_output: bool) -> Result<()> {
    match action {
        BackupAction::Save => {
            let db = open_db(config)?;
            match db.save_snapshot()? {
                Some(snapshot) => {
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": {
                                "articles": snapshot.payload.articles.len(),
                                "missing_items": snapshot.payload.missing_items.len(),
                                "created_at": snapshot.created_at
                            }
                        }))?;
                    } else {
                        println!(
                            "Backed up {} articles and {} missing items.",
                            snapshot.payload.articles.len(),
                            snapshot.payload.missing_items.len()
                        );
                    }
                }
                None => {
                    if json_output {
                        print_json(&serde_json::json!({"status": "ok", "data": {"skipped": "empty state"}}))?;
                    } else {
                        println!("Nothing to back up.");
                    }
                }
            }
        }

        BackupAction::Restore { confirm } => {
            if !confirm {
                eprintln!("Restoring replaces the current data. Add --confirm to proceed.");
                std::process::exit(ExitCode::ConfirmRequired as i32);
            }
            let mut db = open_db(config)?;
            match db.restore_latest() {
                Ok(stats) => {
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": { "articles": stats.articles, "missing_items": stats.missing_items }
                        }))?;
                    } else {
                        println!(
                            "Restored {} articles and {} missing items.",
                            stats.articles, stats.missing_items
                        );
                    }
                }
                Err(barnode_core::BarnodeError::BackupNotFound) => {
                    eprintln!("No backup snapshot available.");
                    std::process::exit(ExitCode::NotFound as i32);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

// ─── Analyze & Consolidate ──────────────────────────────────────────────────

fn run_analyze(config: &AppConfig, json_output: bool, start: Instant) -> Result<()> {
    let db = open_db(config)?;
    let articles = db.list_articles()?;
    let groups = group_duplicates(&articles);
    let dur = start.elapsed().as_millis();

    if json_output {
        print_json(&serde_json::json!({
            "status": "ok",
            "data": { "groups": groups, "total": groups.len() },
            "meta": { "duration_ms": dur }
        }))?;
    } else if groups.is_empty() {
        println!("No duplicate or similar articles found.");
    } else {
        for group in &groups {
            print_group(group);
            println!();
        }
        println!(
            "{} group(s). Merge one with `barnode consolidate <group-id> --master <id> --name <final name>`.",
            groups.len()
        );
    }

    Ok(())
}

fn print_group(group: &DuplicateGroup) {
    println!(
        "{}  ({} members, keywords: {})",
        group.id,
        group.articles.len(),
        group.shared_keywords.join(", ")
    );
    for article in &group.articles {
        println!("    {}  {}", article.id, article.name);
    }
}

fn run_consolidate(
    group_id: &str,
    master: Uuid,
    name: &str,
    members: &[Uuid],
    config: &AppConfig,
    json_output: bool,
) -> Result<()> {
    let db = open_db(config)?;
    let articles = db.list_articles()?;
    let groups = group_duplicates(&articles);

    // Group ids are only stable within one snapshot of the article list; a
    // vanished id means the list changed since `analyze` ran.
    let Some(group) = groups.into_iter().find(|g| g.id == group_id) else {
        eprintln!("Group {group_id} no longer exists — the article list changed. Run `barnode analyze` again.");
        std::process::exit(ExitCode::NotFound as i32);
    };

    let selected: Vec<Uuid> = if members.is_empty() {
        group.articles.iter().map(|a| a.id).collect()
    } else {
        members.to_vec()
    };

    let plan = match plan_consolidation(&group, &selected, name, master) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("Invalid selection: {e}");
            std::process::exit(ExitCode::InvalidArgs as i32);
        }
    };

    apply_plan(&plan, &db)?;
    if config.backup.auto_snapshot {
        db.save_snapshot()?;
    }

    if json_output {
        print_json(&serde_json::json!({"status": "ok", "data": plan}))?;
    } else {
        println!(
            "Merged {} article(s) into {} as \"{}\".",
            plan.delete_ids.len(),
            plan.master_id,
            plan.final_name
        );
    }

    Ok(())
}

// ─── Stats ──────────────────────────────────────────────────────────────────

fn run_stats(config: &AppConfig, json_output: bool) -> Result<()> {
    let db = open_db(config)?;
    let articles = db.count_articles()?;
    let missing = db.count_missing_items()?;
    let groups = group_duplicates(&db.list_articles()?).len();
    let last_backup = db.latest_snapshot()?.map(|s| s.created_at);

    if json_output {
        print_json(&serde_json::json!({
            "status": "ok",
            "data": {
                "articles": articles,
                "missing_items": missing,
                "duplicate_groups": groups,
                "last_backup": last_backup
            }
        }))?;
    } else {
        println!("Articles:          {articles}");
        println!("Missing items:     {missing}");
        println!("Duplicate groups:  {groups}");
        match last_backup {
            Some(at) => println!("Last backup:       {at}"),
            None => println!("Last backup:       never"),
        }
    }

    Ok(())
}

// ─── Config ─────────────────────────────────────────────────────────────────

fn run_config(action: ConfigAction, config: &AppConfig, json_output: bool) -> Result<()> {
    match action {
        ConfigAction::List => {
            if json_output {
                print_json(&serde_json::json!({"status": "ok", "data": config}))?;
            } else {
                print!("{}", toml::to_string_pretty(config)?);
            }
        }
        ConfigAction::Path => {
            println!("{}", AppConfig::config_path().display());
        }
    }
    Ok(())
}
