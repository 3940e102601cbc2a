//! Terminal slider bound to a running session

pub mod app;
pub mod render;

use std::io::{self, stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures::StreamExt;
use ratatui::prelude::*;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use zmk_session::{SessionCommand, SessionError, SessionHandle, SessionStatus};
use zmk_transport::DeviceInfo;

use crate::config::UiConfig;
use app::{Action, App};

/// Redraw interval when nothing happens
const TICK_RATE: Duration = Duration::from_millis(250);

/// Result of a save, delivered back to the UI loop
type SaveOutcome = (u8, Result<(), SessionError>);

/// What woke the UI loop
enum UiEvent {
    Key(KeyCode),
    Value(Option<u8>),
    Status(SessionStatus),
    Saved(SaveOutcome),
    Tick,
    Closed,
}

/// Run `enter` after `enable`, calling `undo` if `enter` fails
fn enter_guarded(
    enable: impl FnOnce() -> io::Result<()>,
    enter: impl FnOnce() -> io::Result<()>,
    undo: impl FnOnce() -> io::Result<()>,
) -> io::Result<()> {
    enable()?;
    if let Err(e) = enter() {
        let _ = undo();
        return Err(e);
    }
    Ok(())
}

fn enter_terminal() -> io::Result<()> {
    enter_guarded(
        enable_raw_mode,
        || stdout().execute(EnterAlternateScreen).map(|_| ()),
        disable_raw_mode,
    )
}

fn leave_terminal() -> io::Result<()> {
    let raw = disable_raw_mode();
    let screen = stdout().execute(LeaveAlternateScreen).map(|_| ());
    raw.and(screen)
}

/// Run the slider until the user quits.
///
/// With `prompt` set, a device request leaves the alternate screen so the
/// selection prompt is readable.
pub async fn run(handle: SessionHandle, ui: &UiConfig, prompt: bool) -> Result<()> {
    enter_terminal()?;
    let result = run_loop(&handle, ui, prompt).await;
    leave_terminal()?;
    result
}

async fn run_loop(handle: &SessionHandle, ui: &UiConfig, prompt: bool) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut app = App::new(ui);

    let mut values = handle.values();
    let mut status = handle.status();
    app.on_status(status.borrow_and_update().clone());
    app.on_device_value(*values.borrow_and_update());

    let (saved_tx, mut saved_rx) = mpsc::unbounded_channel::<SaveOutcome>();
    let mut events = EventStream::new();

    loop {
        terminal.draw(|f| render::render(f, &app))?;

        let event = tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => UiEvent::Key(key.code),
                Some(Ok(_)) => UiEvent::Tick,
                Some(Err(e)) => return Err(e.into()),
                None => UiEvent::Closed,
            },
            changed = values.changed() => match changed {
                Ok(()) => UiEvent::Value(*values.borrow_and_update()),
                Err(_) => UiEvent::Closed,
            },
            changed = status.changed() => match changed {
                Ok(()) => UiEvent::Status(status.borrow_and_update().clone()),
                Err(_) => UiEvent::Closed,
            },
            Some(outcome) = saved_rx.recv() => UiEvent::Saved(outcome),
            _ = tokio::time::sleep(TICK_RATE) => UiEvent::Tick,
        };

        match event {
            UiEvent::Key(code) => match app.handle_key(code) {
                Action::Request => {
                    // Nothing may read stdin while a selection prompt runs
                    drop(events);
                    let result = request(handle, &mut terminal, prompt).await;
                    events = EventStream::new();
                    app.on_request_result(result?);
                }
                action => dispatch(handle, &mut app, action, &saved_tx),
            },
            UiEvent::Value(value) => app.on_device_value(value),
            UiEvent::Status(s) => app.on_status(s),
            UiEvent::Saved((value, result)) => app.on_save_result(value, result),
            UiEvent::Tick => {}
            UiEvent::Closed => break,
        }

        if app.should_quit {
            break;
        }
    }

    info!("Slider closed");
    Ok(())
}

/// Request a device, releasing the terminal around an interactive prompt
async fn request(
    handle: &SessionHandle,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    prompt: bool,
) -> Result<Result<Option<DeviceInfo>, SessionError>> {
    if !prompt {
        return Ok(handle.request_device().await);
    }
    leave_terminal()?;
    let result = handle.request_device().await;
    enter_terminal()?;
    terminal.clear()?;
    Ok(result)
}

/// Queue the session command for an action without blocking the UI
fn dispatch(
    handle: &SessionHandle,
    app: &mut App,
    action: Action,
    saved_tx: &mpsc::UnboundedSender<SaveOutcome>,
) {
    let command = match action {
        Action::None | Action::Quit | Action::Request => return,
        Action::Send(value) => SessionCommand::Send(value, None),
        Action::Save(value) => {
            let (tx, rx) = oneshot::channel();
            let saved_tx = saved_tx.clone();
            tokio::spawn(async move {
                let result = rx.await.unwrap_or(Err(SessionError::Closed));
                let _ = saved_tx.send((value, result));
            });
            SessionCommand::Save(value, Some(tx))
        }
        Action::Read => SessionCommand::Read(None),
    };
    debug!("Posting {:?}", command);
    if let Err(e) = handle.post(command) {
        app.status_message = Some(format!("Session error: {}", e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_failed_enter_undoes_enable() {
        let calls = RefCell::new(Vec::new());
        let result = enter_guarded(
            || {
                calls.borrow_mut().push("enable");
                Ok(())
            },
            || {
                calls.borrow_mut().push("enter");
                Err(io::Error::other("no tty"))
            },
            || {
                calls.borrow_mut().push("undo");
                Ok(())
            },
        );

        assert!(result.is_err());
        assert_eq!(*calls.borrow(), vec!["enable", "enter", "undo"]);
    }

    #[test]
    fn test_successful_enter_keeps_mode() {
        let calls = RefCell::new(Vec::new());
        let result = enter_guarded(
            || {
                calls.borrow_mut().push("enable");
                Ok(())
            },
            || {
                calls.borrow_mut().push("enter");
                Ok(())
            },
            || {
                calls.borrow_mut().push("undo");
                Ok(())
            },
        );

        assert!(result.is_ok());
        assert_eq!(*calls.borrow(), vec!["enable", "enter"]);
    }
}
