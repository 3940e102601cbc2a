//! Long-running sessions

use tracing::info;
use zmk_session::SessionStatus;

use super::{CommandResult, Session};
use zmk_slider::config::Config;

/// Print every value change and connection change until Ctrl-C
pub async fn watch(config: &Config, prompt: bool) -> CommandResult {
    let session = Session::start(config, prompt)?;
    let result = print_changes(&session).await;
    session.stop().await;
    result
}

async fn print_changes(session: &Session) -> CommandResult {
    let mut values = session.handle.values();
    let mut status = session.handle.status();

    match session.handle.attach().await? {
        SessionStatus::Bound(device) => {
            println!("Watching {} (Ctrl-C to stop)", device.display_name())
        }
        SessionStatus::Unbound => println!("No device bound, waiting (Ctrl-C to stop)"),
    }
    status.borrow_and_update();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            changed = values.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(v) = *values.borrow_and_update() {
                    println!("value {}", v);
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                match &*status.borrow_and_update() {
                    SessionStatus::Bound(info) => println!("connected {}", info.display_name()),
                    SessionStatus::Unbound => println!("disconnected"),
                }
            }
        }
    }
    Ok(())
}

/// Interactive slider
pub async fn tui(config: &Config, prompt: bool) -> CommandResult {
    let session = Session::start(config, prompt)?;
    // Requested before the alternate screen so a prompt stays readable
    let result = match session.handle.attach().await {
        Ok(_) => zmk_slider::tui::run(session.handle.clone(), &config.ui, prompt).await,
        Err(e) => Err(e.into()),
    };
    session.stop().await;
    result
}
