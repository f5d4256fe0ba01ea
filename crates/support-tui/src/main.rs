use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use support_core::{Config, SupportApi, SupportClient};

mod app;
mod commands;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "support-chat")]
#[command(about = "Chat with the customer support assistant from your terminal")]
#[command(version)]
struct Cli {
    /// Support API base URL (defaults to the config file, then http://localhost:8000)
    #[arg(long, env = "SUPPORT_CHAT_API_URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the FAQ catalog, or a single category
    Faqs {
        /// Category to show (e.g. shipping)
        category: Option<String>,
    },
    /// Check that the support backend is up
    Health,
    /// Print the stored transcript of a session
    Transcript {
        /// Session id issued when the chat was started
        session_id: String,
    },
    /// Start a session, ask one question and print the reply
    Ask {
        /// Your name
        #[arg(short, long)]
        name: String,
        /// Your question
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Ignoring unreadable config file: {}", e);
        Config::new()
    });
    let base_url = config.resolve_base_url(cli.base_url.as_deref());
    let client = SupportClient::new(&base_url);

    match cli.command {
        None => {
            let log_path = match config.log_file.clone() {
                Some(path) => path,
                None => logging::default_log_path()?,
            };
            logging::init_file_logging(&log_path)?;
            tracing::info!(base_url = %base_url, "Starting support chat");

            run_tui(Arc::new(client), base_url).await?
        }
        Some(command) => {
            logging::init_stderr_logging()?;
            match command {
                Commands::Faqs { category } => {
                    commands::show_faqs(&client, category.as_deref()).await?
                }
                Commands::Health => commands::show_health(&client).await?,
                Commands::Transcript { session_id } => {
                    commands::show_transcript(&client, &session_id).await?
                }
                Commands::Ask { name, message } => {
                    commands::ask(&client, &name, &message).await?
                }
            }
        }
    }

    Ok(())
}

async fn run_tui(api: Arc<dyn SupportApi>, base_url: String) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    let mut app = App::new(api, events.sender(), base_url);

    // The FAQ catalog is fetched once, alongside whatever the user does first
    handler::load_faqs(&app);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    tracing::info!("Support chat closed");
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
