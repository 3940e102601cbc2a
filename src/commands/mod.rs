//! Command handlers for the CLI application.
//!
//! - `device`: one-shot commands (list, read, set)
//! - `interactive`: long-running sessions (watch, tui)

pub mod device;
pub mod interactive;

use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use zmk_session::{SessionController, SessionHandle};
use zmk_transport::{Chooser, HidapiHost};

use zmk_slider::config::Config;

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Initialise hidapi with the configured report framing
pub fn open_host(config: &Config, prompt: bool) -> anyhow::Result<Arc<HidapiHost>> {
    let chooser = if prompt {
        Chooser::Prompt
    } else {
        Chooser::First
    };
    let host = HidapiHost::new(chooser)
        .context("initialising hidapi")?
        .with_numbered_reports(config.protocol.numbered_reports);
    Ok(Arc::new(host))
}

/// A running session: dispatch loop plus optional hot-plug monitor
pub struct Session {
    pub handle: SessionHandle,
    host: Arc<HidapiHost>,
    dispatch: JoinHandle<()>,
    monitor: Option<JoinHandle<()>>,
}

impl Session {
    /// Spawn the dispatch loop and, if enabled, the hot-plug monitor
    pub fn start(config: &Config, prompt: bool) -> anyhow::Result<Self> {
        let host = open_host(config, prompt)?;
        let (controller, handle) = SessionController::new(host.clone(), config.session_config());
        let dispatch = tokio::spawn(controller.run());

        let monitor = if config.hotplug.enabled {
            Some(
                host.start_hotplug_monitor(
                    config.filter.to_filter(),
                    config.hotplug.poll_interval(),
                )
                .context("starting hot-plug monitor")?,
            )
        } else {
            debug!("Hot-plug monitoring disabled");
            None
        };

        Ok(Self {
            handle,
            host,
            dispatch,
            monitor,
        })
    }

    /// Stop the monitor and the dispatch loop, then wait for them
    pub async fn stop(self) {
        self.host.stop_hotplug_monitor();
        self.handle.shutdown().await;
        if let Some(monitor) = self.monitor {
            monitor.abort();
        }
        if let Err(e) = self.dispatch.await {
            debug!("Dispatch task ended abnormally: {}", e);
        }
        info!("Session stopped");
    }
}
