//! Device session controller
//!
//! Owns the device slot and is the only place session state changes. All
//! host notifications, input reports and commands are handled one at a time
//! by `SessionController::run`.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};
use zmk_transport::protocol::{self, OutputReport};
use zmk_transport::{BoxedDevice, DeviceFilter, DeviceInfo, HidHost, HostEvent, InputReport};

use crate::error::SessionError;
use crate::slot::DeviceSlot;

/// Command queue depth
const COMMAND_CAPACITY: usize = 32;

/// Protocol settings for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Filter used for `request_device`
    pub filter: DeviceFilter,
    /// Output report ID for value reports
    pub report_id: u8,
    /// Value sent right after binding to ask for the current state
    pub read_probe: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            filter: DeviceFilter::default(),
            report_id: protocol::report::VALUE,
            read_probe: protocol::READ_PROBE,
        }
    }
}

/// Connection state published to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Unbound,
    Bound(DeviceInfo),
}

/// Completion channel for a command
pub type Reply<T> = Option<oneshot::Sender<Result<T, SessionError>>>;

/// Requests accepted by the dispatch loop
#[derive(Debug)]
pub enum SessionCommand {
    /// Ask the host for a device and bind it
    Request(Reply<Option<DeviceInfo>>),
    /// Send a value (programmatic / live slider)
    Send(u8, Reply<()>),
    /// Persist the UI value on the device
    Save(u8, Reply<()>),
    /// Send the read probe
    Read(Reply<()>),
    /// Stop the dispatch loop
    Shutdown,
}

/// What woke the dispatch loop
enum Wakeup {
    Command(Option<SessionCommand>),
    Host(Result<HostEvent, broadcast::error::RecvError>),
    Input(Result<InputReport, broadcast::error::RecvError>),
}

/// The session controller
pub struct SessionController {
    host: Arc<dyn HidHost>,
    config: SessionConfig,
    slot: DeviceSlot,
    host_events: Option<broadcast::Receiver<HostEvent>>,
    input: Option<broadcast::Receiver<InputReport>>,
    commands: mpsc::Receiver<SessionCommand>,
    value_tx: watch::Sender<Option<u8>>,
    status_tx: watch::Sender<SessionStatus>,
}

impl SessionController {
    /// Create a controller and a handle to drive it.
    ///
    /// Host notifications are subscribed here so none are missed before `run`.
    pub fn new(host: Arc<dyn HidHost>, config: SessionConfig) -> (Self, SessionHandle) {
        let (cmd_tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let (value_tx, value_rx) = watch::channel(None);
        let (status_tx, status_rx) = watch::channel(SessionStatus::Unbound);
        let host_events = Some(host.subscribe_events());

        let controller = Self {
            host,
            config,
            slot: DeviceSlot::new(),
            host_events,
            input: None,
            commands,
            value_tx,
            status_tx,
        };
        let handle = SessionHandle {
            commands: cmd_tx,
            value: value_rx,
            status: status_rx,
        };
        (controller, handle)
    }

    /// Currently bound device
    pub fn current(&self) -> Option<&BoxedDevice> {
        self.slot.current()
    }

    /// Last value reported by the device
    pub fn value(&self) -> Option<u8> {
        *self.value_tx.borrow()
    }

    /// Whether an input subscription is active
    pub fn is_listening(&self) -> bool {
        self.input.is_some()
    }

    fn bind(&mut self, device: BoxedDevice) {
        let info = device.info().clone();
        self.input = Some(device.subscribe_input());
        if let Some(previous) = self.slot.bind(device) {
            debug!("Replacing bound device {}", previous.info().display_name());
        }
        self.status_tx.send_replace(SessionStatus::Bound(info));
    }

    fn unbind(&mut self) {
        self.input = None;
        self.slot.unbind();
        self.status_tx.send_replace(SessionStatus::Unbound);
    }

    /// Request a device under the configured filter, bind it and probe it.
    ///
    /// Returns `Ok(None)` when the host hands back no device. An open failure
    /// is logged and returned; the slot is left as it was.
    pub async fn request_device(&mut self) -> Result<Option<DeviceInfo>, SessionError> {
        let devices = self.host.request_device(&self.config.filter).await?;
        let Some(info) = devices.into_iter().next() else {
            info!("No device selected");
            return Ok(None);
        };

        let device = match self.host.open(&info).await {
            Ok(device) => device,
            Err(e) => {
                error!("Failed to open {}: {}", info.display_name(), e);
                return Err(e.into());
            }
        };
        info!("Opened device: {}", info.display_name());

        self.bind(device);
        self.read_value().await?;
        Ok(Some(info))
    }

    /// A granted device came back: reopen, resubscribe, rebind, probe
    pub async fn on_connect(&mut self, info: DeviceInfo) -> Result<(), SessionError> {
        info!("Device connected: {}", info.display_name());
        let device = self.host.open(&info).await?;
        self.bind(device);
        info!("Re-opened device and re-attached input report listener");
        self.read_value().await
    }

    /// Unbinds the slot if `info` is the bound device
    pub fn on_disconnect(&mut self, info: &DeviceInfo) {
        info!("Device disconnected: {}", info.display_name());
        if self.slot.is_bound_to(info) {
            self.unbind();
        }
    }

    /// Mirror byte 0 of an input report into the control value.
    ///
    /// The report ID is not checked. Empty payloads carry no value and are
    /// dropped.
    pub fn on_input_report(&mut self, report: &InputReport) {
        let name = self
            .slot
            .current()
            .map(|d| d.info().display_name())
            .unwrap_or_default();
        debug!(
            "{}: got input report {} {:02X?}",
            name, report.report_id, report.data
        );

        match report.data.first() {
            Some(&value) => {
                self.value_tx.send_replace(Some(value));
            }
            None => debug!("Empty input report ignored"),
        }
    }

    async fn send_report(&self, report: OutputReport) -> Result<(), SessionError> {
        let device = self.slot.current().ok_or(SessionError::NotBound)?;
        device.send_report(report.report_id, &report.data).await?;
        info!("Sent output report {:?}", report.data);
        Ok(())
    }

    /// Send `value` to the bound device
    pub async fn send_value(&self, value: u8) -> Result<(), SessionError> {
        self.send_report(OutputReport::value(self.config.report_id, value))
            .await
    }

    /// Persist the UI value on the bound device
    pub async fn save(&self, value: u8) -> Result<(), SessionError> {
        debug!("Saving value {}", value);
        self.send_value(value).await
    }

    /// Send the read probe so the device reports its current value
    pub async fn read_value(&self) -> Result<(), SessionError> {
        self.send_value(self.config.read_probe).await
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Request(reply) => {
                let result = self.request_device().await;
                respond(reply, result, "request device");
            }
            SessionCommand::Send(value, reply) => {
                let result = self.send_value(value).await;
                respond(reply, result, "send value");
            }
            SessionCommand::Save(value, reply) => {
                let result = self.save(value).await;
                respond(reply, result, "save value");
            }
            SessionCommand::Read(reply) => {
                let result = self.read_value().await;
                respond(reply, result, "read value");
            }
            SessionCommand::Shutdown => {}
        }
    }

    async fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Connected(info) => {
                let name = info.display_name();
                if let Err(e) = self.on_connect(info).await {
                    error!("Unhandled error re-opening {}: {}", name, e);
                }
            }
            HostEvent::Disconnected(info) => self.on_disconnect(&info),
        }
    }

    /// Dispatch loop.
    ///
    /// Runs until a `Shutdown` command arrives or every handle is dropped.
    pub async fn run(mut self) {
        debug!("Session dispatch loop started");
        loop {
            // Host notifications first, then device input, then commands
            let wakeup = tokio::select! {
                biased;
                event = next_broadcast(&mut self.host_events) => Wakeup::Host(event),
                report = next_broadcast(&mut self.input) => Wakeup::Input(report),
                cmd = self.commands.recv() => Wakeup::Command(cmd),
            };

            match wakeup {
                Wakeup::Command(None) | Wakeup::Command(Some(SessionCommand::Shutdown)) => break,
                Wakeup::Command(Some(cmd)) => self.handle_command(cmd).await,
                Wakeup::Host(Ok(event)) => self.handle_host_event(event).await,
                Wakeup::Host(Err(broadcast::error::RecvError::Lagged(n))) => {
                    warn!("Missed {} host events", n);
                }
                Wakeup::Host(Err(broadcast::error::RecvError::Closed)) => {
                    debug!("Host event channel closed");
                    self.host_events = None;
                }
                Wakeup::Input(Ok(report)) => self.on_input_report(&report),
                Wakeup::Input(Err(broadcast::error::RecvError::Lagged(n))) => {
                    warn!("Dropped {} input reports", n);
                }
                Wakeup::Input(Err(broadcast::error::RecvError::Closed)) => {
                    // The reader stops for good when the device goes away
                    warn!("Input reports from the bound device stopped, unbinding");
                    self.unbind();
                }
            }
        }
        debug!("Session dispatch loop exiting");
    }
}

/// Receive from an optional subscription; pends forever when there is none
async fn next_broadcast<T: Clone>(
    rx: &mut Option<broadcast::Receiver<T>>,
) -> Result<T, broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Deliver a result to the caller, or log the failure if nobody is waiting
fn respond<T>(reply: Reply<T>, result: Result<T, SessionError>, what: &str) {
    match reply {
        Some(tx) => {
            let _ = tx.send(result);
        }
        None => {
            if let Err(e) = result {
                warn!("Failed to {}: {}", what, e);
            }
        }
    }
}

/// Cloneable handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    value: watch::Receiver<Option<u8>>,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    async fn call<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(Some(tx)))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Request and bind a device
    pub async fn request_device(&self) -> Result<Option<DeviceInfo>, SessionError> {
        self.call(SessionCommand::Request).await
    }

    /// Request a device for a long-running consumer.
    ///
    /// Failures are logged and leave the session running: an unopened device
    /// stays unbound, and a failed probe leaves the device bound. Returns the
    /// resulting status. Only a stopped session is an error.
    pub async fn attach(&self) -> Result<SessionStatus, SessionError> {
        match self.request_device().await {
            Ok(Some(device)) => debug!("Attached {}", device.display_name()),
            Ok(None) => info!("No device selected, waiting for one to connect"),
            Err(SessionError::Closed) => return Err(SessionError::Closed),
            Err(e) => error!("Device request failed: {}", e),
        }
        Ok(self.status.borrow().clone())
    }

    /// Send a value to the bound device
    pub async fn send_value(&self, value: u8) -> Result<(), SessionError> {
        self.call(|reply| SessionCommand::Send(value, reply)).await
    }

    /// Persist a value on the bound device
    pub async fn save(&self, value: u8) -> Result<(), SessionError> {
        self.call(|reply| SessionCommand::Save(value, reply)).await
    }

    /// Send the read probe
    pub async fn read_value(&self) -> Result<(), SessionError> {
        self.call(SessionCommand::Read).await
    }

    /// Queue a command without waiting (for UI loops that must not block)
    pub fn post(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .try_send(command)
            .map_err(|_| SessionError::Closed)
    }

    /// Stop the session
    pub async fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown).await;
    }

    /// Value-changed notifications
    pub fn values(&self) -> watch::Receiver<Option<u8>> {
        self.value.clone()
    }

    /// Connection state notifications
    pub fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }
}
