use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use listing_wizard::app::App;
use listing_wizard::config::Config;
use listing_wizard::logging;
use listing_wizard::session::{self, Role, Session};
use listing_wizard::store::{FileStore, KeyValueStore};
use listing_wizard::wizard::{DraftPersistence, FormPayload, SimulatedSubmission, WizardController};

#[derive(Parser)]
#[command(name = "listing-wizard")]
#[command(about = "Guided multi-step property listing submission")]
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
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new listing (default)
    New,

    /// Edit an existing listing
    Edit {
        /// Listing id
        #[arg(long)]
        id: String,

        /// JSON file with the listing's current fields
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Inspect or discard the saved draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },

    /// Manage the local sign-in flags
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Write the effective configuration to .listing-wizard/config.toml
    Init,
}

#[derive(Subcommand)]
enum DraftAction {
    /// Print the saved draft
    Show,
    /// Delete the saved draft
    Clear,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Print the current session
    Show,
    /// Sign in
    Set {
        /// Auth token (generated when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Role (admin, user or seeker)
        #[arg(long, default_value = "user")]
        role: String,
    },
    /// Sign out
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let is_interactive = matches!(cli.command, None | Some(Commands::New | Commands::Edit { .. }));

    // Initialize logging (file-based for wizard sessions, stderr otherwise)
    let logging_handle = logging::init_logging(&config, is_interactive, cli.debug)?;

    let store = Arc::new(
        FileStore::open(config.store_path())
            .with_context(|| format!("Failed to open {}", config.store_path().display()))?,
    );

    match cli.command {
        None | Some(Commands::New) => {
            run_wizard(&config, store, None, logging_handle.log_file_path).await?;
        }
        Some(Commands::Edit { id, from }) => {
            let existing = match from {
                Some(path) => read_payload(&path)?,
                None => FormPayload::new(),
            };
            run_wizard(
                &config,
                store,
                Some((id, existing)),
                logging_handle.log_file_path,
            )
            .await?;
        }
        Some(Commands::Draft { action }) => cmd_draft(&config, store, action)?,
        Some(Commands::Session { action }) => cmd_session(store.as_ref(), action)?,
        Some(Commands::Init) => {
            config.save()?;
            println!("Wrote {}", Config::local_config_path().display());
        }
    }

    Ok(())
}

fn read_payload(path: &Path) -> Result<FormPayload> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    FormPayload::from_json(&raw).with_context(|| format!("{} is not a JSON object", path.display()))
}

fn draft_persistence(config: &Config, store: Arc<FileStore>) -> DraftPersistence {
    if config.draft.enabled {
        DraftPersistence::new(store, config.debounce())
    } else {
        DraftPersistence::disabled(store)
    }
}

async fn run_wizard(
    config: &Config,
    store: Arc<FileStore>,
    edit: Option<(String, FormPayload)>,
    log_file_path: Option<PathBuf>,
) -> Result<()> {
    let session = Session::from_store(store.as_ref());
    if !session.is_authenticated() {
        eprintln!("You are not signed in.");
        eprintln!();
        eprintln!("Sign in first:");
        eprintln!("  listing-wizard session set --role user");
        std::process::exit(1);
    }

    let draft = draft_persistence(config, store);
    let submitter = Arc::new(SimulatedSubmission::new(config.submission_latency()));

    let controller = match edit {
        Some((id, existing)) => WizardController::edit(session, id, existing, draft, submitter)?,
        None => WizardController::create(session, draft, submitter)?,
    };
    if !controller.payload().is_empty() && controller.mode().listing_id().is_none() {
        println!("Restored your saved draft");
    }
    println!("Type 'help' for commands");

    let mut app = App::new(controller);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let result = app.run(stdin, &mut stdout).await;

    // Print log file path on exit if logs were written
    if let Some(log_path) = log_file_path {
        if let Ok(metadata) = log_path.metadata() {
            if metadata.len() > 0 {
                eprintln!("Session log: {}", log_path.display());
            }
        }
    }

    result
}

fn cmd_draft(config: &Config, store: Arc<FileStore>, action: DraftAction) -> Result<()> {
    let draft = draft_persistence(config, store);

    match action {
        DraftAction::Show => match draft.load_existing() {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record.payload)?),
            None => println!("No saved draft"),
        },
        DraftAction::Clear => {
            draft.clear();
            println!("Draft cleared");
        }
    }
    Ok(())
}

fn cmd_session(store: &dyn KeyValueStore, action: SessionAction) -> Result<()> {
    match action {
        SessionAction::Show => {
            let session = Session::from_store(store);
            if session.is_authenticated() {
                println!("Signed in as {}", session.role().as_str());
            } else {
                println!("Not signed in");
            }
        }
        SessionAction::Set { token, role } => {
            let role = Role::from_flag(&role);
            session::sign_in(store, token, role)?;
            println!("Signed in as {}", role.as_str());
        }
        SessionAction::Clear => {
            session::sign_out(store)?;
            println!("Signed out");
        }
    }
    Ok(())
}
