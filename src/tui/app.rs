//! TUI application state

use crossterm::event::KeyCode;
use zmk_session::{SessionError, SessionStatus};
use zmk_transport::DeviceInfo;

use crate::config::UiConfig;

/// Large step for PageUp/PageDown
const PAGE_STEP: u8 = 16;

/// 0..=255 slider mirrored with the device value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slider {
    value: u8,
    step: u8,
}

impl Slider {
    pub fn new(value: u8, step: u8) -> Self {
        Self {
            value,
            step: step.max(1),
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn set(&mut self, value: u8) {
        self.value = value;
    }

    /// Move up by `n`, saturating at 255
    pub fn increase_by(&mut self, n: u8) {
        self.value = self.value.saturating_add(n);
    }

    /// Move down by `n`, saturating at 0
    pub fn decrease_by(&mut self, n: u8) {
        self.value = self.value.saturating_sub(n);
    }

    pub fn increase(&mut self) {
        self.increase_by(self.step);
    }

    pub fn decrease(&mut self) {
        self.decrease_by(self.step);
    }

    /// Fill ratio for a gauge
    pub fn ratio(&self) -> f64 {
        self.value as f64 / u8::MAX as f64
    }
}

/// What the run loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    /// Push the value immediately (live mode)
    Send(u8),
    /// Persist the value
    Save(u8),
    /// Ask the device for its value
    Read,
    /// Ask the host for a device
    Request,
    Quit,
}

/// Main application state
pub struct App {
    pub slider: Slider,
    /// Last value reported by the device
    pub device_value: Option<u8>,
    /// Connection state
    pub status: SessionStatus,
    /// Send on every move
    pub live: bool,
    /// Slider differs from what the device last reported
    pub dirty: bool,
    /// Status message (for errors/info)
    pub status_message: Option<String>,
    /// Show help overlay
    pub show_help: bool,
    /// Should quit
    pub should_quit: bool,
}

impl App {
    pub fn new(ui: &UiConfig) -> Self {
        Self {
            slider: Slider::new(0, ui.step),
            device_value: None,
            status: SessionStatus::Unbound,
            live: ui.live,
            dirty: false,
            status_message: None,
            show_help: false,
            should_quit: false,
        }
    }

    /// Device reported a value: the slider follows it
    pub fn on_device_value(&mut self, value: Option<u8>) {
        if let Some(v) = value {
            self.slider.set(v);
            self.dirty = false;
        }
        self.device_value = value;
    }

    pub fn on_status(&mut self, status: SessionStatus) {
        self.status_message = Some(match &status {
            SessionStatus::Bound(info) => format!("Connected to {}", info.display_name()),
            SessionStatus::Unbound => "Device disconnected".to_string(),
        });
        self.status = status;
    }

    /// Outcome of a save started from the slider
    pub fn on_save_result(&mut self, value: u8, result: Result<(), SessionError>) {
        self.status_message = Some(match result {
            Ok(()) => {
                if self.slider.value() == value {
                    self.dirty = false;
                }
                format!("Saved {}", value)
            }
            Err(e) => format!("Save failed: {}", e),
        });
    }

    /// Outcome of a device request started with `c`
    pub fn on_request_result(&mut self, result: Result<Option<DeviceInfo>, SessionError>) {
        self.status_message = Some(match result {
            Ok(Some(info)) => format!("Connected to {}", info.display_name()),
            Ok(None) => "No device selected".to_string(),
            Err(e) => format!("Request failed: {}", e),
        });
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.status, SessionStatus::Bound(_))
    }

    fn moved(&mut self) -> Action {
        self.dirty = self.device_value != Some(self.slider.value());
        if self.live {
            Action::Send(self.slider.value())
        } else {
            Action::None
        }
    }

    /// Map a key press to a state change and an action
    pub fn handle_key(&mut self, code: KeyCode) -> Action {
        if self.show_help && !matches!(code, KeyCode::Char('q')) {
            self.show_help = false;
            return Action::None;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                Action::Quit
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                Action::None
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-') => {
                self.slider.decrease();
                self.moved()
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+') => {
                self.slider.increase();
                self.moved()
            }
            KeyCode::PageDown => {
                self.slider.decrease_by(PAGE_STEP);
                self.moved()
            }
            KeyCode::PageUp => {
                self.slider.increase_by(PAGE_STEP);
                self.moved()
            }
            KeyCode::Home => {
                self.slider.set(u8::MIN);
                self.moved()
            }
            KeyCode::End => {
                self.slider.set(u8::MAX);
                self.moved()
            }
            KeyCode::Char('s') | KeyCode::Enter => Action::Save(self.slider.value()),
            KeyCode::Char('r') => Action::Read,
            KeyCode::Char('c') => {
                self.status_message = Some("Requesting device...".to_string());
                Action::Request
            }
            KeyCode::Char('L') => {
                self.live = !self.live;
                self.status_message = Some(format!(
                    "Live mode {}",
                    if self.live { "on" } else { "off" }
                ));
                Action::None
            }
            _ => Action::None,
        }
    }
}
