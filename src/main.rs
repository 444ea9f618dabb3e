//! sekolah-berita: browse the Indonesian school directory and Indonesian
//! news portals from the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//!              Command                 Completion
//! ┌──────────┐ ───────► ┌────────────┐ ─────────► ┌──────────┐  draw()  ┌──────────┐
//! │  app.rs  │          │ effects.rs │ (channel)  │  app.rs  │ ───────► │  ui.rs   │
//! │ (stores) │          │  (tasks)   │            │ (stores) │          │ (render) │
//! └──────────┘          └────────────┘            └──────────┘          └──────────┘
//!      ▲                      │
//!      │ handle_key_event()   │ Upstream
//! ┌──────────┐          ┌──────────┐
//! │ input.rs │          │  api/    │
//! └──────────┘          └──────────┘
//! ```
//!
//! * **`api`**: wire types and the HTTP client for both upstream services.
//! * **`store`**: the school and news stores (state, actions, reducers).
//! * **`view`**: pure derivations (search, grouping, pagination, dates).
//! * **`effects`**: runs the stores' fetch commands on `tokio` tasks.
//! * **`app`**: owns both stores, selection, and the current screen.
//! * **`ui`** / **`input`**: rendering and key bindings.
//! * **`config`** / **`logging`**: TOML configuration and file tracing.

mod api;
mod app;
mod config;
mod effects;
mod input;
mod logging;
mod store;
mod ui;
mod view;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use api::ApiClient;
use app::App;
use config::Config;

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Enters raw mode and the alternate screen; restores both on drop, including
/// during unwinding.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default hook prints the panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = logging::init_tracing();

    let config = Config::load().context("loading configuration")?;
    tracing::info!(
        school = %config.school_endpoint,
        news = %config.news_endpoint,
        per_page = config.per_page,
        log = log_path.as_deref().unwrap_or("-"),
        "starting"
    );

    let client = ApiClient::new(config.school_url()?, config.news_url()?, config.request_timeout())
        .context("building HTTP client")?;
    let (effects, mut rx) = effects::channel(Arc::new(client));

    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(&config);
    app.start();

    // ~10 fps.  Each iteration:
    //   1. Hand new commands to the effect runner.
    //   2. Feed settled commands back into the stores.
    //   3. Render if anything changed.
    //   4. Poll for keyboard input (up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        effects.run(app.take_commands());

        while let Ok(completion) = rx.try_recv() {
            app.apply(completion);
        }
        // Completions may have queued follow-up fetches (category sweeps).
        effects.run(app.take_commands());

        if app.take_redraw() {
            guard.terminal.draw(|f| ui::draw(&mut app, f))?;
        }

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => input::handle_key_event(&mut app, key),
                Event::Resize(..) => app.request_redraw(),
                _ => {}
            }
        }

        if app.quit {
            break;
        }
    }

    tracing::info!("exiting");
    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
