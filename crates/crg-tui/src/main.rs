use anyhow::Result;
use crg_core::Config;

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Could not read config ({}), using defaults", e);
        Config::default()
    });

    // Logging is best-effort; the UI still runs without a log file
    match logging::init() {
        Ok(path) => tracing::info!("logging to {}", path.display()),
        Err(e) => eprintln!("Logging disabled: {}", e),
    }

    install_and_run(&config).await
}

async fn install_and_run(config: &Config) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(config);
    let result = run(&mut terminal, &mut app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        app.poll_chat_task().await;
        app.drain_market_events();

        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    tracing::info!("shutting down");
    Ok(())
}
