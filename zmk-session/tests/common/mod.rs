//! In-memory host and device used by the session tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use zmk_transport::{
    DeviceFilter, DeviceInfo, HidDevice, HidHost, HostEvent, InputReport, TransportError,
};

pub fn device_info(path: &str) -> DeviceInfo {
    DeviceInfo {
        vid: 0x1d50,
        pid: 0x615e,
        usage_page: 0xff0b,
        usage: 0x01,
        interface_number: 2,
        path: path.into(),
        serial: Some("CAFE0001".into()),
        product_name: Some("Corne".into()),
    }
}

pub struct FakeDevice {
    info: DeviceInfo,
    sent: Mutex<Vec<(u8, Vec<u8>)>>,
    fail_send: AtomicBool,
    /// `None` once the device has gone away
    input_tx: Mutex<Option<broadcast::Sender<InputReport>>>,
}

impl FakeDevice {
    fn new(info: DeviceInfo, fail_send: bool) -> Self {
        let (input_tx, _) = broadcast::channel(16);
        Self {
            info,
            sent: Mutex::new(Vec::new()),
            fail_send: AtomicBool::new(fail_send),
            input_tx: Mutex::new(Some(input_tx)),
        }
    }

    /// Deliver an input report to subscribers
    pub fn push_input(&self, report_id: u8, data: &[u8]) {
        if let Some(tx) = self.input_tx.lock().as_ref() {
            let _ = tx.send(InputReport {
                report_id,
                data: data.to_vec(),
                timestamp: 0.0,
            });
        }
    }

    /// Stop input reports the way a dead reader thread does
    pub fn vanish(&self) {
        self.input_tx.lock().take();
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    pub fn listeners(&self) -> usize {
        self.input_tx
            .lock()
            .as_ref()
            .map_or(0, |tx| tx.receiver_count())
    }

    pub fn sent(&self) -> Vec<(u8, Vec<u8>)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl HidDevice for FakeDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn send_report(&self, report_id: u8, data: &[u8]) -> Result<(), TransportError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(TransportError::Disconnected);
        }
        self.sent.lock().push((report_id, data.to_vec()));
        Ok(())
    }

    fn subscribe_input(&self) -> broadcast::Receiver<InputReport> {
        match self.input_tx.lock().as_ref() {
            Some(tx) => tx.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

pub struct FakeHost {
    /// Devices returned by the next `request_device`
    pub offered: Mutex<Vec<DeviceInfo>>,
    pub fail_open: AtomicBool,
    /// New devices reject every send
    pub fail_send: AtomicBool,
    pub open_calls: Mutex<Vec<String>>,
    opened: Mutex<Vec<Arc<FakeDevice>>>,
    pub requested_filters: Mutex<Vec<DeviceFilter>>,
    event_tx: broadcast::Sender<HostEvent>,
}

impl FakeHost {
    pub fn new(offered: Vec<DeviceInfo>) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(16);
        Arc::new(Self {
            offered: Mutex::new(offered),
            fail_open: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            open_calls: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            requested_filters: Mutex::new(Vec::new()),
            event_tx,
        })
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    pub fn open_count(&self) -> usize {
        self.open_calls.lock().len()
    }

    /// Devices successfully opened so far, oldest first
    pub fn opened(&self) -> Vec<Arc<FakeDevice>> {
        self.opened.lock().clone()
    }

    pub fn last_opened(&self) -> Arc<FakeDevice> {
        self.opened
            .lock()
            .last()
            .cloned()
            .expect("no device opened")
    }

    pub fn emit(&self, event: HostEvent) {
        self.event_tx.send(event).expect("no session subscribed");
    }
}

#[async_trait]
impl HidHost for FakeHost {
    async fn request_device(
        &self,
        filter: &DeviceFilter,
    ) -> Result<Vec<DeviceInfo>, TransportError> {
        self.requested_filters.lock().push(*filter);
        Ok(self.offered.lock().clone())
    }

    async fn open(&self, device: &DeviceInfo) -> Result<Arc<dyn HidDevice>, TransportError> {
        self.open_calls.lock().push(device.path.clone());
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(TransportError::HidPermissionDenied(device.path.clone()));
        }
        let fake = Arc::new(FakeDevice::new(
            device.clone(),
            self.fail_send.load(Ordering::SeqCst),
        ));
        self.opened.lock().push(fake.clone());
        Ok(fake)
    }

    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent> {
        self.event_tx.subscribe()
    }
}
