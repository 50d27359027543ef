use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use trade_journal::{
    app::{view, ImageUpload, JournalApp},
    journal::{
        search::{self, SearchField},
        ChecklistSchema, Direction, MoveDirection, PickListKind, TradeDraft,
    },
    monitoring,
    session::SessionGate,
    types::AppConfig,
    utils::time::{now_local, parse_date, parse_time},
};

fn date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("expected YYYY-MM-DD, got {s}"))
}

fn time_arg(s: &str) -> Result<NaiveTime, String> {
    parse_time(s).ok_or_else(|| format!("expected HH:MM, got {s}"))
}

#[derive(Parser, Debug)]
#[command(name = "trade-journal")]
#[command(about = "Trading journal backed by Google Sheets and Drive", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.toml")]
    config: String,

    /// Shared secret; prompted for when absent
    #[arg(long, env = "JOURNAL_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create missing tables and seed defaults
    Init,
    /// Log a new trade
    Add {
        #[arg(long, value_parser = date_arg)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = time_arg)]
        time: Option<NaiveTime>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        asset: Option<String>,
        #[arg(long, value_enum, default_value_t = Direction::Long)]
        direction: Direction,
        #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
        pnl: f64,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long, default_value = "")]
        tags: String,
        /// Checklist item key answered "yes" (repeatable)
        #[arg(long = "check")]
        checked: Vec<String>,
        /// Screenshot to attach (repeatable)
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },
    /// Show the identifier the next trade would get
    PreviewId {
        #[arg(long)]
        asset: Option<String>,
        #[arg(long, value_parser = date_arg)]
        date: Option<NaiveDate>,
    },
    /// List trades newest first
    List {
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(long, value_enum, default_value_t = SearchField::All)]
        field: SearchField,
        /// Group by calendar week
        #[arg(long)]
        weeks: bool,
    },
    /// Show one trade with checklist and screenshots
    Show { reference: String },
    /// Change fields of an existing trade
    Edit {
        reference: String,
        #[arg(long, value_parser = date_arg)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = time_arg)]
        time: Option<NaiveTime>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        asset: Option<String>,
        #[arg(long, value_enum)]
        direction: Option<Direction>,
        #[arg(long, allow_negative_numbers = true)]
        pnl: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long = "check")]
        checked: Vec<String>,
        #[arg(long = "uncheck")]
        unchecked: Vec<String>,
    },
    /// Toggle the reviewed flag
    Review { reference: String },
    Delete { reference: String },
    Dashboard,
    /// Manage the checklist schema
    Checklist {
        #[command(subcommand)]
        command: ChecklistCommand,
    },
    /// Manage account and asset pick lists
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Add screenshots to an existing trade
    Attach {
        reference: String,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Delete a screenshot by file id
    Detach { file_id: String },
}

#[derive(Subcommand, Debug)]
enum ChecklistCommand {
    List,
    AddCategory {
        name: String,
    },
    DeleteCategory {
        name: String,
    },
    AddItem {
        category: String,
        key: String,
        label: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    DeleteItem {
        category: String,
        key: String,
    },
    Move {
        category: String,
        key: String,
        #[arg(value_enum)]
        direction: MoveDirection,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    List,
    Add {
        #[arg(value_enum)]
        kind: PickListKind,
        value: String,
    },
    Remove {
        #[arg(value_enum)]
        kind: PickListKind,
        value: String,
    },
    Move {
        #[arg(value_enum)]
        kind: PickListKind,
        value: String,
        #[arg(value_enum)]
        direction: MoveDirection,
    },
}

async fn unlock(gate: &mut SessionGate, password: Option<String>) -> anyhow::Result<()> {
    if let Some(password) = password {
        if gate.attempt(&password) {
            return Ok(());
        }
        bail!("wrong password");
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("password: ");
        let Some(line) = lines.next_line().await? else {
            bail!("no password given");
        };
        if gate.attempt(line.trim_end_matches(['\r', '\n'])) {
            return Ok(());
        }
        eprintln!("wrong password");
    }
}

async fn read_images(paths: &[PathBuf]) -> anyhow::Result<Vec<ImageUpload>> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("invalid file name {}", path.display()))?
            .to_string();
        images.push(ImageUpload { file_name, bytes });
    }
    Ok(images)
}

fn checked_keys(schema: &ChecklistSchema, keys: &[String]) -> anyhow::Result<HashSet<String>> {
    for key in keys {
        if !schema.contains_item(key) {
            bail!("unknown checklist item {key}");
        }
    }
    Ok(keys.iter().cloned().collect())
}

fn report_uploads(failed: &[String]) {
    for name in failed {
        eprintln!("warning: screenshot {name} was not uploaded");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "trade_journal=info,journal=info,warn");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    tracing::debug!(target: "journal", config = %cli.config, "loading config");
    let cfg = AppConfig::from_file(&cli.config)?;
    monitoring::logger::log_startup(&cfg);

    let mut gate = SessionGate::from_config(&cfg.auth)?;
    unlock(&mut gate, cli.password).await?;

    let app = JournalApp::from_config(&cfg)?;

    if let Commands::Init = cli.command {
        app.init().await?;
        println!("journal layout ready");
        monitoring::metrics::log_metrics_snapshot(&monitoring::metrics::METRICS.snapshot());
        return Ok(());
    }

    let snapshot = app.bootstrap().await;
    if !snapshot.connection_ok {
        eprintln!("error: could not load the journal; showing empty state");
    }
    let settings = &snapshot.settings;
    let schema = &snapshot.schema;

    match cli.command {
        Commands::Init => {}
        Commands::Add {
            date,
            time,
            account,
            asset,
            direction,
            pnl,
            notes,
            tags,
            checked,
            images,
        } => {
            let now = now_local();
            let checked = checked_keys(schema, &checked)?;
            let draft = TradeDraft {
                date: date.unwrap_or(now.date()),
                time: time.unwrap_or(now.time()),
                account: account
                    .unwrap_or_else(|| settings.sentinel(PickListKind::Accounts).to_string()),
                asset: asset.unwrap_or_else(|| settings.sentinel(PickListKind::Assets).to_string()),
                direction,
                pnl,
                notes,
                tags,
                checklist: schema.snapshot(&checked),
            };
            let images = read_images(&images).await?;
            let created = app.create_trade(draft, images).await?;
            println!("saved {}", created.record.trade_id);
            for a in &created.attachments {
                println!("  {} {}", a.name, a.url);
            }
            report_uploads(&created.failed_uploads);
        }
        Commands::PreviewId { asset, date } => {
            let asset = asset.unwrap_or_else(|| settings.sentinel(PickListKind::Assets).to_string());
            let date = date.unwrap_or_else(|| now_local().date());
            println!("{}", app.preview_trade_id(&asset, date).await?);
        }
        Commands::List {
            query,
            field,
            weeks,
        } => {
            let mut trades = snapshot.trades.clone();
            search::sort_newest_first(&mut trades);
            let hits = search::filter(&trades, &query, field);
            if hits.is_empty() {
                println!("no trades");
            } else if weeks {
                for (label, members) in search::group_by_week(&hits) {
                    println!("{label}");
                    for r in members {
                        println!("  {}", view::summary_line(r));
                    }
                }
            } else {
                for r in hits {
                    println!("{}", view::summary_line(r));
                }
            }
        }
        Commands::Show { reference } => {
            let record = app.find(&reference).await?;
            let attachments = app.attachments(&record.trade_id).await;
            print!("{}", view::details(&record, schema, &attachments));
        }
        Commands::Edit {
            reference,
            date,
            time,
            account,
            asset,
            direction,
            pnl,
            notes,
            tags,
            checked,
            unchecked,
        } => {
            let mut record = app.find(&reference).await?;
            record.date = date.unwrap_or(record.date);
            record.time = time.unwrap_or(record.time);
            record.account = account.unwrap_or(record.account);
            record.asset = asset.unwrap_or(record.asset);
            record.direction = direction.unwrap_or(record.direction);
            record.pnl = pnl.unwrap_or(record.pnl);
            record.notes = notes.unwrap_or(record.notes);
            record.tags = tags.unwrap_or(record.tags);

            checked_keys(schema, &checked)?;
            checked_keys(schema, &unchecked)?;
            let overrides: Vec<(String, bool)> = checked
                .into_iter()
                .map(|k| (k, true))
                .chain(unchecked.into_iter().map(|k| (k, false)))
                .collect();
            record.checklist = schema.resnapshot(&record.checklist, &overrides);

            app.update_trade(&record).await?;
            println!("updated {}", record.trade_id);
        }
        Commands::Review { reference } => {
            let reviewed = app.toggle_reviewed(&reference).await?;
            println!("{}", if reviewed { "marked reviewed" } else { "marked open" });
        }
        Commands::Delete { reference } => {
            let record = app.find(&reference).await?;
            app.delete_trade(&record.id).await?;
            println!("deleted {}", record.trade_id);
        }
        Commands::Dashboard => {
            if snapshot.trades.is_empty() {
                println!("no data");
            } else {
                print!("{}", view::dashboard(&app.dashboard().await?));
            }
        }
        Commands::Checklist { command } => match command {
            ChecklistCommand::List => print!("{}", view::schema(schema)),
            ChecklistCommand::AddCategory { name } => {
                app.update_schema(|s| s.add_category(&name)).await?;
                println!("category {name} created");
            }
            ChecklistCommand::DeleteCategory { name } => {
                app.update_schema(|s| s.delete_category(&name)).await?;
                println!("category {name} deleted");
            }
            ChecklistCommand::AddItem {
                category,
                key,
                label,
                description,
            } => {
                app.update_schema(|s| s.add_item(&category, &key, &label, &description))
                    .await?;
                println!("item {key} added to {category}");
            }
            ChecklistCommand::DeleteItem { category, key } => {
                app.update_schema(|s| s.delete_item(&category, &key)).await?;
                println!("item {key} deleted");
            }
            ChecklistCommand::Move {
                category,
                key,
                direction,
            } => {
                let moved = app
                    .update_schema(|s| s.move_item(&category, &key, direction))
                    .await?;
                if !moved {
                    println!("{key} is already at the edge");
                }
            }
        },
        Commands::Settings { command } => match command {
            SettingsCommand::List => print!("{}", view::settings(settings)),
            SettingsCommand::Add { kind, value } => {
                app.update_settings(|s| s.add(kind, &value)).await?;
                println!("{value} added to {}", kind.key());
            }
            SettingsCommand::Remove { kind, value } => {
                app.update_settings(|s| s.remove(kind, &value)).await?;
                println!("{value} removed from {}", kind.key());
            }
            SettingsCommand::Move {
                kind,
                value,
                direction,
            } => {
                let moved = app
                    .update_settings(|s| s.move_entry(kind, &value, direction))
                    .await?;
                if !moved {
                    println!("{value} is already at the edge");
                }
            }
        },
        Commands::Attach { reference, images } => {
            let images = read_images(&images).await?;
            let (stored, failed) = app.attach(&reference, images).await?;
            for a in &stored {
                println!("{} {}", a.name, a.url);
            }
            report_uploads(&failed);
        }
        Commands::Detach { file_id } => {
            if !app.detach(&file_id).await {
                bail!("could not delete file {file_id}");
            }
            println!("deleted {file_id}");
        }
    }

    monitoring::metrics::log_metrics_snapshot(&monitoring::metrics::METRICS.snapshot());
    Ok(())
}
