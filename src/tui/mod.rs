//! Terminal User Interface for devpanel.
//!
//! Provides the main TUI loop using ratatui and crossterm. Device calls started from the
//! keyboard run concurrently; the loop keeps reading keys while they are in flight.

pub mod app;
mod events;
mod ui;
pub mod widgets;

pub use app::App;
pub use events::{map_key, Event, EventHandler, KeyAction};

use crate::app::{Begin, Panel};
use crate::commands::{Command, ConnectArgs};
use crate::device::InFlight;
use crate::error::{PanelError, Result};
use app::UiRequest;
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use futures::stream::{FuturesUnordered, StreamExt};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Redraw interval while calls are in flight, so the spinner moves.
const SPINNER_TICK: Duration = Duration::from_millis(100);

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
    /// Stops the event reader thread.
    shutdown_flag: Arc<AtomicBool>,
    /// Whether enhanced key reporting was enabled (needed to see Ctrl+Enter and Cmd).
    keyboard_enhanced: bool,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        let (terminal, keyboard_enhanced) = Self::setup_terminal()?;

        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            keyboard_enhanced,
        })
    }

    /// Signals shutdown to the event reader.
    pub fn signal_shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::SeqCst);
    }

    /// Checks if shutdown has been signaled.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<(Terminal<CrosstermBackend<Stdout>>, bool)> {
        enable_raw_mode()
            .map_err(|e| PanelError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)
            .map_err(|e| PanelError::internal(format!("Failed to enter alternate screen: {e}")))?;

        let keyboard_enhanced = supports_keyboard_enhancement().unwrap_or(false);
        if keyboard_enhanced {
            if let Err(e) = execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            ) {
                warn!("Failed to enable enhanced key reporting: {e}");
            }
        } else {
            debug!("Terminal has no enhanced key reporting; Ctrl+J stands in for Ctrl+Enter");
        }

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)
            .map_err(|e| PanelError::internal(format!("Failed to create terminal: {e}")))?;

        Ok((terminal, keyboard_enhanced))
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        if self.keyboard_enhanced {
            let _ = execute!(self.terminal.backend_mut(), PopKeyboardEnhancementFlags);
            self.keyboard_enhanced = false;
        }

        disable_raw_mode()
            .map_err(|e| PanelError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| PanelError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| PanelError::internal(format!("Failed to show cursor: {e}")))?;

        Ok(())
    }

    /// Runs the TUI until the user quits.
    pub async fn run(&mut self, panel: &mut Panel) -> Result<()> {
        // Set up panic hook to restore terminal on panic
        let original_hook = panic::take_hook();
        let shutdown_flag = Arc::clone(&self.shutdown_flag);
        let keyboard_enhanced = self.keyboard_enhanced;
        panic::set_hook(Box::new(move |panic_info| {
            shutdown_flag.store(true, Ordering::SeqCst);
            if keyboard_enhanced {
                let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
            }
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        let mut app_state = App::new();
        let mut events = self.event_handler.spawn(Arc::clone(&self.shutdown_flag));

        let result = self.run_event_loop(&mut app_state, panel, &mut events).await;

        self.signal_shutdown();

        // Restore panic hook
        let _ = panic::take_hook();

        result
    }

    /// The main event loop, separated for cleaner error handling.
    async fn run_event_loop(
        &mut self,
        app_state: &mut App,
        panel: &mut Panel,
        events: &mut mpsc::UnboundedReceiver<Event>,
    ) -> Result<()> {
        // Dropping this on exit cancels whatever is still in flight.
        let mut in_flight: FuturesUnordered<InFlight> = FuturesUnordered::new();

        loop {
            self.terminal
                .draw(|frame| ui::render(frame, app_state, panel))
                .map_err(|e| PanelError::internal(format!("Failed to draw: {e}")))?;

            if !app_state.running || self.is_shutdown() {
                break;
            }

            tokio::select! {
                event = events.recv() => match event {
                    Some(Event::Key(key)) => {
                        if let Some(request) = app_state.apply(map_key(key)) {
                            Self::handle_request(request, app_state, panel, &mut in_flight);
                        }
                    }
                    Some(Event::Resize(width, height)) => {
                        debug!("Terminal resized to {width}x{height}");
                    }
                    None => {
                        warn!("Terminal event reader stopped");
                        break;
                    }
                },

                Some(done) = in_flight.next(), if !in_flight.is_empty() => {
                    panel.finish(done).await;
                    app_state.request_finished();
                }

                _ = tokio::time::sleep(SPINNER_TICK), if app_state.pending() > 0 => {}
            }
        }

        if !in_flight.is_empty() {
            debug!("Cancelling {} in-flight request(s)", in_flight.len());
        }

        Ok(())
    }

    /// Starts whatever a key press asked of the panel.
    fn handle_request(
        request: UiRequest,
        app_state: &mut App,
        panel: &mut Panel,
        in_flight: &mut FuturesUnordered<InFlight>,
    ) {
        let begin = match request {
            UiRequest::Submit(line) => panel.begin_line(&line),
            UiRequest::Connect => panel.begin(Command::Connect(ConnectArgs::default())),
            UiRequest::ClearLog => {
                panel.clear_log();
                return;
            }
            UiRequest::Quit => return,
        };

        match begin {
            Begin::Pending(call) => {
                in_flight.push(call);
                app_state.request_started();
            }
            Begin::Finished { .. } => {}
            Begin::Quit => app_state.running = false,
        }
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        self.signal_shutdown();
        let _ = self.restore_terminal();
    }
}

/// Runs the TUI against `panel`.
pub async fn run(panel: &mut Panel) -> Result<()> {
    let mut tui = Tui::new()?;
    tui.run(panel).await
}
