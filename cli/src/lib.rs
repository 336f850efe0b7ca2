use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use deckchat_common::Slide;
use deckchat_core::{
    config::Config,
    deck_file,
    export::{JsonWriter, PresentationWriter},
    ConversationManager, HttpSlideService, Outcome, PptxWriter, SessionError, SlideSession,
    WorkerOptions,
};
use deckchat_remote::SlideServiceClient;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "deckchat")]
#[command(about = "Chat-driven slide deck generation and export")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Base URL of the slide service (e.g., http://127.0.0.1:5000)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Log in as this user; the password is read from DECKCHAT_PASSWORD
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat (default)
    Interactive,
    /// Page through a saved deck
    Preview {
        /// Path to a deck JSON file
        file: PathBuf,
    },
    /// Create a deck from a prompt
    Generate {
        prompt: String,
        /// Save the resulting deck here
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Send a prompt against a saved deck
    Edit {
        /// Deck JSON file to start from
        deck: PathBuf,
        prompt: String,
        /// Save the resulting deck here (defaults to overwriting the input)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Fetch a presentation saved on the service
    Load {
        id: u64,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Write the export plan of a saved deck
    Export {
        deck: PathBuf,
        /// Output directory (defaults to the configured export_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = ExportFormat::Pptx)]
        format: ExportFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// PowerPoint presentation
    Pptx,
    /// The laid-out export plan as JSON
    Json,
}

impl ExportFormat {
    fn writer(self) -> Box<dyn PresentationWriter + Send + Sync> {
        match self {
            ExportFormat::Pptx => Box::new(PptxWriter),
            ExportFormat::Json => Box::new(JsonWriter),
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let interactive = matches!(cli.command, None | Some(Commands::Interactive));
    if interactive {
        init_tracing(cli.debug, Some(&config.resolved_log_path()))?;
    } else {
        init_tracing(cli.debug, config.log_path.as_deref())?;
    }
    tracing::debug!(server = %config.server_url, "configuration resolved");

    match cli.command {
        None | Some(Commands::Interactive) => {
            let service = HttpSlideService::connect(&config).await?;
            let session = SlideSession::new(Arc::new(service));
            let manager = ConversationManager::spawn(
                session,
                WorkerOptions {
                    history_limit: config.history_limit,
                    export_dir: config.export_dir.clone(),
                    writer: Box::new(PptxWriter),
                },
            )
            .await?;
            deckchat_tui::run_interactive(manager).await?;
        }
        Some(Commands::Preview { file }) => {
            deckchat_tui::run_preview(&file).await?;
        }
        Some(Commands::Generate { prompt, out }) => {
            let mut session = connect_session(&config, Vec::new()).await?;
            let outcome = report(session.send(&prompt).await)?;
            if let Some(path) = out {
                save(&path, &outcome.deck).await?;
            }
        }
        Some(Commands::Edit { deck, prompt, out }) => {
            let slides = deck_file::read_deck(&deck).await?;
            let mut session = connect_session(&config, slides).await?;
            let outcome = report(session.send(&prompt).await)?;
            save(out.as_deref().unwrap_or(deck.as_path()), &outcome.deck).await?;
        }
        Some(Commands::Load { id, out }) => {
            let mut session = connect_session(&config, Vec::new()).await?;
            let outcome = report(session.load_presentation(id).await)?;
            if let Some(path) = out {
                save(&path, &outcome.deck).await?;
            }
        }
        Some(Commands::Export { deck, dir, format }) => {
            let slides = deck_file::read_deck(&deck).await?;
            // Export never talks to the service; the client only supplies the
            // base URL that image paths resolve against.
            let client = SlideServiceClient::new(&config.server_url)?;
            let session = SlideSession::with_deck(Arc::new(HttpSlideService::new(client)), slides);
            let dir = dir.unwrap_or_else(|| config.export_dir.clone());
            let writer = format.writer();
            let path = session.export(&dir, writer.as_ref())?;
            println!(
                "{} generated successfully! File: {}",
                writer.label(),
                path.display()
            );
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from_file(path)?;
            config.apply_env(|key| std::env::var(key).ok())?;
            config
        }
        None => Config::load()?,
    };
    if let Some(server) = &cli.server {
        config.server_url = server.clone();
    }
    if let Some(user) = &cli.user {
        config.username = Some(user.clone());
    }
    Ok(config)
}

fn init_tracing(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow!(e))
        }
        None => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!(e)),
    }
}

async fn connect_session(config: &Config, slides: Vec<Slide>) -> Result<SlideSession> {
    let service = HttpSlideService::connect(config).await?;
    Ok(SlideSession::with_deck(Arc::new(service), slides))
}

fn report(result: Result<Outcome, SessionError>) -> Result<Outcome> {
    match result {
        Ok(outcome) => {
            println!("{}", outcome.message);
            for (i, slide) in outcome.deck.iter().enumerate() {
                println!("{:>3}. {}", i + 1, slide.display_title());
            }
            Ok(outcome)
        }
        Err(SessionError::EmptyPrompt) => bail!("nothing to send: the prompt is empty"),
        Err(e) => bail!("Sorry, an error occurred: {}", e.failure_message()),
    }
}

async fn save(path: &Path, slides: &[Slide]) -> Result<()> {
    deck_file::write_deck(path, slides).await?;
    println!("Deck saved to: {}", path.display());
    Ok(())
}
