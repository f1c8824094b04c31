pub mod app;
pub mod render;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    ExecutableCommand,
    event::{
        self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
};
use ratatui::DefaultTerminal;

use self::app::App;
use ttodo::{ArchiveScheduler, Config, Schedule, Session, Store, shutdown_runtime};

/// Run the TUI until the user exits
pub fn run(store: Store, config: &Config, refresh_rate_ms: u64) -> Result<()> {
    let session = Session::new(store.clone(), &config.ui).context("Failed to load todo data")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("Failed to start background runtime")?;
    let scheduler = if config.archive.enabled {
        let _guard = runtime.enter();
        Some(ArchiveScheduler::start(
            store,
            Schedule::from_config(&config.archive),
        ))
    } else {
        tracing::info!("archive scheduler disabled");
        None
    };

    // Restore the terminal before the panic message is printed
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = io::stdout().execute(PopKeyboardEnhancementFlags);
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut terminal = ratatui::init();
    let enhanced = match crossterm::terminal::supports_keyboard_enhancement() {
        Ok(true) => io::stdout()
            .execute(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))
            .is_ok(),
        _ => false,
    };
    tracing::debug!(enhanced, "keyboard enhancement");

    let mut app = App::new(session, Duration::from_millis(refresh_rate_ms));
    app.session.set_release_events(enhanced);
    let tick = Duration::from_millis(config.ui.tick_ms);

    let result = run_event_loop(&mut terminal, &mut app, tick);

    // Always restore terminal, even if event loop errored
    if enhanced {
        let _ = io::stdout().execute(PopKeyboardEnhancementFlags);
    }
    ratatui::restore();

    if !shutdown_runtime(runtime, scheduler, config.archive.shutdown_timeout()) {
        tracing::warn!("archive scheduler shut down uncleanly");
    }
    result
}

/// Main event loop: poll for keyboard input and redraw
fn run_event_loop(terminal: &mut DefaultTerminal, app: &mut App, tick: Duration) -> Result<()> {
    loop {
        app.maybe_refresh();

        terminal.draw(|frame| render::draw(frame, &app.session))?;

        if event::poll(tick)? {
            match event::read()? {
                // Releases only arrive with keyboard enhancement; map_key
                // keeps the Space release and drops the rest
                Event::Key(key) => app.handle_key_event(key),
                _ => {}
            }
        }

        if app.should_quit() {
            tracing::info!("exiting");
            return Ok(());
        }
    }
}
