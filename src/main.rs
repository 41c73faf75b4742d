use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use waypoint::app::{load_profile, App};
use waypoint::completion::{calculate_completion, CompletionResult, ProfileSnapshot};
use waypoint::config::Config;
use waypoint::logging;
use waypoint::progress::{AutoSaveScheduler, ProgressRestorer, Snapshot};
use waypoint::store::{FileStore, PersistenceStore};

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Resumable onboarding wizard for the retirement planner")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Identity whose progress is saved and resumed (interactive mode)
    #[arg(short, long)]
    identity: Option<String>,

    /// Profile JSON used to seed the wizard and reloaded with `r`
    #[arg(short, long)]
    profile: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show saved progress for an identity
    Status {
        #[arg(short, long)]
        identity: Option<String>,
    },

    /// Score a profile JSON file
    Score {
        /// Path to the profile file
        profile: PathBuf,
    },

    /// Delete saved progress for an identity
    Clear {
        #[arg(short, long)]
        identity: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Also write it to .waypoint/config.toml
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let is_tui_mode = cli.command.is_none();
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    let store: Arc<dyn PersistenceStore> = Arc::new(FileStore::new(config.progress_path()));

    match cli.command {
        Some(Commands::Status { identity }) => cmd_status(&config, store, identity.as_deref())?,
        Some(Commands::Score { profile }) => cmd_score(&profile)?,
        Some(Commands::Clear { identity }) => cmd_clear(&config, store, identity.as_deref())?,
        Some(Commands::Config { write }) => {
            print!("{}", config.to_toml()?);
            if write {
                let path = config.save()?;
                eprintln!("Wrote {}", path.display());
            }
        }
        None => {
            if let Some(ref path) = logging_handle.log_file_path {
                tracing::info!(log_file = %path.display(), "Starting onboarding wizard");
            }
            let mut app = App::new(&config, store, cli.identity, cli.profile)?;
            app.run().await?;
        }
    }

    Ok(())
}

fn cmd_status(
    config: &Config,
    store: Arc<dyn PersistenceStore>,
    identity: Option<&str>,
) -> Result<()> {
    let restorer = ProgressRestorer::from_config(store, &config.autosave);
    let snapshot: Option<Snapshot<ProfileSnapshot>> = restorer.restore(identity, None);

    let Some(snapshot) = snapshot else {
        println!("No saved progress");
        return Ok(());
    };

    let saved = chrono::DateTime::from_timestamp_millis(snapshot.saved_at_epoch_ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| snapshot.saved_at_epoch_ms.to_string());
    println!("Saved at:  {}", saved);
    println!("Step:      {}", snapshot.step_index + 1);
    print_completion(&calculate_completion(&snapshot.payload));
    Ok(())
}

fn cmd_score(path: &Path) -> Result<()> {
    let profile = load_profile(path)?;
    print_completion(&calculate_completion(&profile));
    Ok(())
}

fn cmd_clear(config: &Config, store: Arc<dyn PersistenceStore>, identity: Option<&str>) -> Result<()> {
    let mut autosave = AutoSaveScheduler::from_config(Arc::clone(&store), &config.autosave);
    let key = autosave.key_for(identity, None);
    let existed = store
        .get(&key)
        .with_context(|| format!("Failed to read saved progress '{}'", key))?
        .is_some();
    autosave
        .clear_now(&key)
        .with_context(|| format!("Failed to clear saved progress '{}'", key))?;

    if existed {
        println!("Cleared saved progress ({})", key);
    } else {
        println!("No saved progress ({})", key);
    }
    Ok(())
}

fn print_completion(result: &CompletionResult) {
    println!("Complete:  {}% ({})", result.percentage, result.level());
    println!("{}", "─".repeat(48));
    for section in &result.breakdown {
        let mark = if section.completed { "✓" } else { " " };
        println!("[{}] {:<32} {:>3}%", mark, section.label, section.weight);
    }
    if let Some(next) = result.next_action() {
        println!();
        println!(
            "Next: {}",
            next.suggested_action.as_deref().unwrap_or(&next.title)
        );
    }
}
