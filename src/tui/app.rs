//! TUI application state - Key handling and view data

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::prompt::{PromptKind, PromptRequest};
use crate::orchestrator::{Command, LogSnapshot, Snapshot};

/// Lines moved per PgUp/PgDn
const PAGE: usize = 10;

/// Input modal opened by the prompt picker
#[derive(Debug)]
pub struct PathPrompt {
    pub kind: PromptKind,
    pub title: String,
    pub input: String,
    reply: Option<tokio::sync::oneshot::Sender<Option<String>>>,
}

impl PathPrompt {
    fn answer(mut self, value: Option<String>) {
        if let Some(reply) = self.reply.take() {
            let _ = reply.send(value);
        }
    }
}

/// Main application state
pub struct App {
    /// Latest orchestrator state
    pub snapshot: Snapshot,
    /// Latest log list
    pub logs: LogSnapshot,
    /// Should the app quit
    pub should_quit: bool,
    /// Show help overlay
    pub show_help: bool,
    /// Lines scrolled up from the newest log line (0 = follow)
    pub log_scroll: usize,
    /// Open path prompt, drawn as a modal
    pub prompt: Option<PathPrompt>,
    /// Show timestamps in the log panel
    pub show_timestamps: bool,
    /// Status bar message
    pub status_message: String,
    /// Advances every redraw tick; drives the activity bar
    pub tick: usize,
    quit_armed: bool,
}

impl App {
    pub fn new(show_timestamps: bool) -> Self {
        Self {
            snapshot: Snapshot::default(),
            logs: LogSnapshot::default(),
            should_quit: false,
            show_help: false,
            log_scroll: 0,
            prompt: None,
            show_timestamps,
            status_message: "Press '?' for help".to_string(),
            tick: 0,
            quit_armed: false,
        }
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Take new state from the orchestrator
    pub fn update(&mut self, snapshot: Snapshot) {
        if !snapshot.is_converting {
            self.quit_armed = false;
        }
        self.snapshot = snapshot;
    }

    pub fn update_logs(&mut self, logs: LogSnapshot) {
        self.logs = logs;
        self.log_scroll = self.log_scroll.min(self.max_scroll());
    }

    pub fn open_prompt(&mut self, request: PromptRequest) {
        // A newer request supersedes a stale one
        if let Some(stale) = self.prompt.take() {
            stale.answer(None);
        }
        self.show_help = false;
        self.prompt = Some(PathPrompt {
            kind: request.kind,
            title: request.title,
            input: request.initial,
            reply: Some(request.reply),
        });
    }

    /// Global key handler. Returns the command to forward, if any.
    pub fn on_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return None;
        }

        if self.show_help {
            self.show_help = false;
            return None;
        }

        if self.snapshot.notification.is_some() {
            return self.handle_notification_key(key);
        }

        self.handle_main_key(key)
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    let value = prompt.input.clone();
                    prompt.answer(Some(value));
                }
            }
            KeyCode::Esc => {
                if let Some(prompt) = self.prompt.take() {
                    prompt.answer(None);
                }
            }
            KeyCode::Backspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.input.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_notification_key(&mut self, key: KeyEvent) -> Option<Command> {
        let success = self
            .snapshot
            .notification
            .as_ref()
            .is_some_and(|n| !n.is_error());

        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                Some(Command::DismissNotification)
            }
            KeyCode::Char('f') if success && self.snapshot.last_output_path.is_some() => {
                Some(Command::OpenOutputFolder)
            }
            KeyCode::Char('q') => self.request_quit(),
            _ => None,
        }
    }

    fn handle_main_key(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.request_quit(),

            KeyCode::Char('o') => Some(Command::SelectOutputFolder),
            KeyCode::Char('i') => {
                if self.snapshot.can_select_file() {
                    Some(Command::SelectInputFile)
                } else {
                    self.status_message = "Select an output folder first".to_string();
                    None
                }
            }
            KeyCode::Enter | KeyCode::Char('c') => {
                if self.snapshot.can_convert() {
                    Some(Command::RunConversion)
                } else {
                    None
                }
            }
            KeyCode::Char('x') => {
                self.log_scroll = 0;
                Some(Command::ClearLogs)
            }

            // Log scrolling
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll_up(1);
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.log_scroll = self.log_scroll.saturating_sub(1);
                None
            }
            KeyCode::PageUp => {
                self.scroll_up(PAGE);
                None
            }
            KeyCode::PageDown => {
                self.log_scroll = self.log_scroll.saturating_sub(PAGE);
                None
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.log_scroll = self.max_scroll();
                None
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.log_scroll = 0;
                None
            }

            KeyCode::Char('?') | KeyCode::F(1) => {
                self.show_help = true;
                None
            }

            _ => None,
        }
    }

    /// Quitting mid-conversion needs a second press
    fn request_quit(&mut self) -> Option<Command> {
        if self.snapshot.is_converting && !self.quit_armed {
            self.quit_armed = true;
            self.status_message = "Conversion running. Press q again to quit".to_string();
        } else {
            self.should_quit = true;
        }
        None
    }

    fn scroll_up(&mut self, lines: usize) {
        self.log_scroll = (self.log_scroll + lines).min(self.max_scroll());
    }

    fn max_scroll(&self) -> usize {
        self.logs.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogEntry, LogLevel, Notification};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::oneshot;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ready_snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.selection.set_output_folder(PathBuf::from("/out"));
        snapshot.selection.set_input_file(PathBuf::from("/in/place.rbxl"));
        snapshot
    }

    #[test]
    fn test_keybinding_quit() {
        let mut app = App::new(true);
        assert!(!app.should_quit);

        assert_eq!(app.on_key(key(KeyCode::Char('q'))), None);
        assert!(app.should_quit);
    }

    #[test]
    fn test_quit_while_converting_needs_confirmation() {
        let mut app = App::new(true);
        let mut snapshot = ready_snapshot();
        snapshot.is_converting = true;
        app.update(snapshot);

        app.on_key(key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        app.on_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_file_key_gated_on_folder() {
        let mut app = App::new(true);
        assert_eq!(app.on_key(key(KeyCode::Char('i'))), None);
        assert_eq!(
            app.on_key(key(KeyCode::Char('o'))),
            Some(Command::SelectOutputFolder)
        );

        app.snapshot.selection.set_output_folder(PathBuf::from("/out"));
        assert_eq!(
            app.on_key(key(KeyCode::Char('i'))),
            Some(Command::SelectInputFile)
        );
    }

    #[test]
    fn test_convert_key_follows_readiness() {
        let mut app = App::new(true);
        assert_eq!(app.on_key(key(KeyCode::Enter)), None);

        app.update(ready_snapshot());
        assert_eq!(app.on_key(key(KeyCode::Enter)), Some(Command::RunConversion));
        assert_eq!(
            app.on_key(key(KeyCode::Char('c'))),
            Some(Command::RunConversion)
        );

        app.snapshot.is_converting = true;
        assert_eq!(app.on_key(key(KeyCode::Enter)), None);
    }

    #[test]
    fn test_open_folder_needs_success_notification() {
        let mut app = App::new(true);
        let mut snapshot = ready_snapshot();
        snapshot.last_output_path = Some(PathBuf::from("/out/place"));
        app.update(snapshot);

        // Dismissed popup: the path is still recorded but `f` is inert
        assert_eq!(app.on_key(key(KeyCode::Char('f'))), None);
    }

    #[test]
    fn test_notification_captures_keys() {
        let mut app = App::new(true);
        let mut snapshot = ready_snapshot();
        snapshot.notification = Some(Notification::success("done"));
        snapshot.last_output_path = Some(PathBuf::from("/out/place"));
        app.update(snapshot);

        // Convert is masked while the modal is up
        assert_eq!(
            app.on_key(key(KeyCode::Enter)),
            Some(Command::DismissNotification)
        );
        assert_eq!(
            app.on_key(key(KeyCode::Char('f'))),
            Some(Command::OpenOutputFolder)
        );

        app.snapshot.notification = Some(Notification::error("boom"));
        assert_eq!(app.on_key(key(KeyCode::Char('f'))), None);
        assert_eq!(
            app.on_key(key(KeyCode::Esc)),
            Some(Command::DismissNotification)
        );
    }

    #[test]
    fn test_prompt_typing_and_submit() {
        let mut app = App::new(true);
        let (reply, answer) = oneshot::channel();
        app.open_prompt(PromptRequest {
            kind: PromptKind::Folder,
            title: "Select Output Folder".to_string(),
            initial: "/tm".to_string(),
            reply,
        });

        app.on_key(key(KeyCode::Char('p')));
        app.on_key(key(KeyCode::Char('x')));
        app.on_key(key(KeyCode::Backspace));
        // Keys go to the prompt, not to the main bindings
        assert!(!app.should_quit);
        assert_eq!(app.prompt.as_ref().unwrap().input, "/tmp");

        app.on_key(key(KeyCode::Enter));
        assert!(app.prompt.is_none());
        assert_eq!(answer.blocking_recv().unwrap(), Some("/tmp".to_string()));
    }

    #[test]
    fn test_prompt_escape_cancels() {
        let mut app = App::new(true);
        let (reply, answer) = oneshot::channel();
        app.open_prompt(PromptRequest {
            kind: PromptKind::File,
            title: "Select Input File".to_string(),
            initial: String::new(),
            reply,
        });

        app.on_key(key(KeyCode::Esc));
        assert!(app.prompt.is_none());
        assert_eq!(answer.blocking_recv().unwrap(), None);
    }

    #[test]
    fn test_log_scroll_is_bounded() {
        let mut app = App::new(true);
        let entries: Vec<LogEntry> = (0..5)
            .map(|i| LogEntry::at(i, LogLevel::Info, format!("line {}", i)))
            .collect();
        app.update_logs(Arc::new(entries));

        app.on_key(key(KeyCode::PageUp));
        assert_eq!(app.log_scroll, 4);
        app.on_key(key(KeyCode::Char('j')));
        assert_eq!(app.log_scroll, 3);

        assert_eq!(app.on_key(key(KeyCode::Char('x'))), Some(Command::ClearLogs));
        assert_eq!(app.log_scroll, 0);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = App::new(true);
        app.on_key(key(KeyCode::Char('?')));
        assert!(app.show_help);

        assert_eq!(app.on_key(key(KeyCode::Char('o'))), None);
        assert!(!app.show_help);
    }
}
