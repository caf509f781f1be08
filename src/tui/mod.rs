//! TUI Module - Terminal User Interface powered by ratatui
//!
//! Renders orchestrator snapshots and the synchronized log list, and turns
//! key presses into orchestrator commands. Redraws happen when state or
//! logs change, on input, and on a short tick for the activity bar.

mod app;
mod prompt;
mod ui;

pub use app::App;
pub use prompt::{expand_path, PromptKind, PromptPicker, PromptRequest};
pub use ui::{shorten_path, EMPTY_LOG_PLACEHOLDER};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cli::TuiArgs;
use crate::config::Config;
use crate::gateway::{BackendGateway, ConversionWorker, LocalGateway, LogStore};
use crate::orchestrator::{Orchestrator, OrchestratorHandle};

/// Run the TUI application
pub async fn run_tui(args: TuiArgs, config: &Config, store: LogStore) -> Result<()> {
    let worker = ConversionWorker::new(config.worker_config());
    let default_folder = config.conversion.default_output_folder.clone();

    #[cfg(feature = "dialogs")]
    if args.native_dialogs {
        let picker = crate::gateway::DialogPicker::new(default_folder);
        let gateway = LocalGateway::new(picker, store, worker);
        return run_session(gateway, None, config).await;
    }
    #[cfg(not(feature = "dialogs"))]
    let _ = args;

    let (picker, prompts) = PromptPicker::channel(default_folder);
    let gateway = LocalGateway::new(picker, store, worker);
    run_session(gateway, Some(prompts), config).await
}

async fn run_session<G: BackendGateway>(
    gateway: G,
    prompts: Option<mpsc::UnboundedReceiver<PromptRequest>>,
    config: &Config,
) -> Result<()> {
    let (handle, task) = Orchestrator::spawn(Arc::new(gateway), config.cadence());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.tui.show_timestamps);
    let tick = Duration::from_millis(config.tui.tick_ms);

    let result = run_event_loop(&mut terminal, &mut app, &handle, prompts, tick).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Already stopped if the loop ended on a closed orchestrator
    let _ = handle.shutdown();
    let _ = task.await;

    result
}

/// Main TUI event loop
async fn run_event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    handle: &OrchestratorHandle,
    mut prompts: Option<mpsc::UnboundedReceiver<PromptRequest>>,
    tick: Duration,
) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let mut keys = spawn_key_reader(Arc::clone(&stop));
    let mut state = handle.subscribe();
    let mut logs = handle.subscribe_logs();
    let mut ticker = tokio::time::interval(tick);

    let result = loop {
        app.update(state.borrow_and_update().clone());
        app.update_logs(Arc::clone(&logs.borrow_and_update()));

        if let Err(e) = terminal.draw(|frame| ui::draw(frame, app)) {
            break Err(e.into());
        }

        tokio::select! {
            Some(key) = keys.recv() => {
                if let Some(command) = app.on_key(key) {
                    if let Err(e) = handle.send(command) {
                        break Err(e.into());
                    }
                }
            }
            Ok(()) = state.changed() => {}
            Ok(()) = logs.changed() => {}
            Some(request) = next_prompt(&mut prompts) => app.open_prompt(request),
            _ = ticker.tick() => app.on_tick(),
        }

        if app.should_quit {
            break Ok(());
        }
    };

    stop.store(true, Ordering::Relaxed);
    debug!("TUI loop finished");
    result
}

async fn next_prompt(
    prompts: &mut Option<mpsc::UnboundedReceiver<PromptRequest>>,
) -> Option<PromptRequest> {
    match prompts {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Terminal input is blocking; read it on a plain thread
fn spawn_key_reader(stop: Arc<AtomicBool>) -> mpsc::UnboundedReceiver<KeyEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => {
                    if let Ok(Event::Key(key)) = event::read() {
                        if key.kind == KeyEventKind::Press && tx.send(key).is_err() {
                            break;
                        }
                    }
                }
                Ok(false) => {}
                Err(_) => break,
            }
        }
    });

    rx
}
