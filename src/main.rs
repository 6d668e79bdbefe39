mod action;
mod app;
mod config;
mod error;
mod event;
mod forge;
mod github;
mod session;
mod tui;
mod types;
mod ui;

use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::event::Event;
use crate::github::GitHub;
use crate::session::PaginationController;
use crate::tui::EventHandler;

/// Page through the open issues of a GitHub repository
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Repository to load immediately, as owner/repo
    repo: Option<String>,

    /// Override the API base URL (e.g. for GitHub Enterprise)
    #[arg(long)]
    api_base: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load();
    if let Some(api_base) = args.api_base {
        config.api_base = api_base;
    }
    let github = GitHub::new(&config)?;

    // Pre-fill only; the token is never stored
    let token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let result = run(github, args.repo, token).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(
    github: GitHub,
    repo: Option<String>,
    token: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let controller = PaginationController::new(Arc::new(github));
    let mut app = App::new(controller, action_tx.clone(), repo, token);

    let tick_rate = Duration::from_millis(120);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
