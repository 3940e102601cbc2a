//! Session operations driven directly, without the dispatch loop.

mod common;

use common::{device_info, FakeHost};
use zmk_session::{SessionConfig, SessionController, SessionError, SessionStatus};
use zmk_transport::{DeviceFilter, InputReport};

fn report(report_id: u8, data: &[u8]) -> InputReport {
    InputReport {
        report_id,
        data: data.to_vec(),
        timestamp: 0.0,
    }
}

#[tokio::test]
async fn request_uses_vendor_usage_page_filter() {
    let host = FakeHost::new(vec![]);
    let (mut session, _handle) = SessionController::new(host.clone(), SessionConfig::default());

    session.request_device().await.unwrap();

    let filters = host.requested_filters.lock().clone();
    assert_eq!(filters, vec![DeviceFilter::usage_page(0xff0b)]);
}

#[tokio::test]
async fn request_with_no_devices_is_a_noop() {
    let host = FakeHost::new(vec![]);
    let (mut session, handle) = SessionController::new(host.clone(), SessionConfig::default());

    let bound = session.request_device().await.unwrap();

    assert!(bound.is_none());
    assert!(session.current().is_none());
    assert_eq!(host.open_count(), 0);
    assert!(host.opened().is_empty());
    assert_eq!(*handle.status().borrow(), SessionStatus::Unbound);
}

#[tokio::test]
async fn request_opens_once_then_sends_read_probe() {
    let host = FakeHost::new(vec![device_info("/dev/hidraw3")]);
    let (mut session, handle) = SessionController::new(host.clone(), SessionConfig::default());

    let bound = session.request_device().await.unwrap();

    assert_eq!(bound.map(|d| d.path), Some("/dev/hidraw3".to_string()));
    assert_eq!(host.open_count(), 1);
    assert_eq!(host.last_opened().sent(), vec![(0x42, vec![64])]);
    assert_eq!(
        *handle.status().borrow(),
        SessionStatus::Bound(device_info("/dev/hidraw3"))
    );
}

#[tokio::test]
async fn request_only_uses_first_match() {
    let host = FakeHost::new(vec![device_info("/dev/hidraw3"), device_info("/dev/hidraw4")]);
    let (mut session, _handle) = SessionController::new(host.clone(), SessionConfig::default());

    session.request_device().await.unwrap();

    assert_eq!(*host.open_calls.lock(), vec!["/dev/hidraw3".to_string()]);
}

#[tokio::test]
async fn open_failure_leaves_slot_unset_and_sends_nothing() {
    let host = FakeHost::new(vec![device_info("/dev/hidraw3")]);
    host.set_fail_open(true);
    let (mut session, _handle) = SessionController::new(host.clone(), SessionConfig::default());

    let result = session.request_device().await;

    assert!(matches!(result, Err(SessionError::Transport(_))));
    assert!(session.current().is_none());
    assert_eq!(host.open_count(), 1);
    assert!(host.opened().is_empty());
}

#[tokio::test]
async fn save_sends_ui_value_to_bound_device() {
    let host = FakeHost::new(vec![device_info("/dev/hidraw3")]);
    let (mut session, _handle) = SessionController::new(host.clone(), SessionConfig::default());
    session.request_device().await.unwrap();

    session.save(173).await.unwrap();

    let sent = host.last_opened().sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1], (0x42, vec![173]));
}

#[tokio::test]
async fn send_without_device_is_not_bound() {
    let host = FakeHost::new(vec![]);
    let (session, _handle) = SessionController::new(host, SessionConfig::default());

    assert!(matches!(
        session.send_value(10).await,
        Err(SessionError::NotBound)
    ));
}

#[tokio::test]
async fn custom_report_id_and_probe_are_used() {
    let host = FakeHost::new(vec![device_info("/dev/hidraw3")]);
    let config = SessionConfig {
        report_id: 0x07,
        read_probe: 0xff,
        ..SessionConfig::default()
    };
    let (mut session, _handle) = SessionController::new(host.clone(), config);

    session.request_device().await.unwrap();
    session.send_value(1).await.unwrap();

    assert_eq!(
        host.last_opened().sent(),
        vec![(0x07, vec![0xff]), (0x07, vec![1])]
    );
}

#[tokio::test]
async fn connect_binds_device_and_attaches_listener() {
    let host = FakeHost::new(vec![]);
    let (mut session, _handle) = SessionController::new(host.clone(), SessionConfig::default());

    session.on_connect(device_info("/dev/hidraw9")).await.unwrap();

    let device = host.last_opened();
    assert_eq!(
        session.current().map(|d| d.info().path.clone()),
        Some("/dev/hidraw9".to_string())
    );
    assert!(session.is_listening());
    assert_eq!(device.listeners(), 1);
    assert_eq!(device.sent(), vec![(0x42, vec![64])]);
}

#[tokio::test]
async fn input_report_first_byte_becomes_value() {
    let host = FakeHost::new(vec![device_info("/dev/hidraw3")]);
    let (mut session, handle) = SessionController::new(host, SessionConfig::default());
    session.request_device().await.unwrap();

    // Report ID is not checked
    session.on_input_report(&report(5, &[200]));
    assert_eq!(session.value(), Some(200));
    assert_eq!(*handle.values().borrow(), Some(200));

    session.on_input_report(&report(0x42, &[7, 99, 99]));
    assert_eq!(session.value(), Some(7));
}

#[tokio::test]
async fn empty_input_report_keeps_previous_value() {
    let host = FakeHost::new(vec![device_info("/dev/hidraw3")]);
    let (mut session, _handle) = SessionController::new(host, SessionConfig::default());
    session.request_device().await.unwrap();

    session.on_input_report(&report(5, &[42]));
    session.on_input_report(&report(5, &[]));

    assert_eq!(session.value(), Some(42));
}

#[tokio::test]
async fn disconnect_of_bound_device_unbinds() {
    let host = FakeHost::new(vec![device_info("/dev/hidraw3")]);
    let (mut session, handle) = SessionController::new(host.clone(), SessionConfig::default());
    session.request_device().await.unwrap();

    session.on_disconnect(&device_info("/dev/hidraw3"));

    assert!(session.current().is_none());
    assert!(!session.is_listening());
    assert_eq!(host.last_opened().listeners(), 0);
    assert_eq!(*handle.status().borrow(), SessionStatus::Unbound);
}

#[tokio::test]
async fn disconnect_of_other_device_is_ignored() {
    let host = FakeHost::new(vec![device_info("/dev/hidraw3")]);
    let (mut session, _handle) = SessionController::new(host, SessionConfig::default());
    session.request_device().await.unwrap();

    session.on_disconnect(&device_info("/dev/hidraw8"));

    assert!(session.current().is_some());
    assert!(session.is_listening());
}

#[tokio::test]
async fn second_request_replaces_bound_device() {
    let host = FakeHost::new(vec![device_info("/dev/hidraw3")]);
    let (mut session, _handle) = SessionController::new(host.clone(), SessionConfig::default());
    session.request_device().await.unwrap();

    *host.offered.lock() = vec![device_info("/dev/hidraw4")];
    session.request_device().await.unwrap();
    session.save(5).await.unwrap();

    let opened = host.opened();
    assert_eq!(opened.len(), 2);
    assert_eq!(opened[0].sent(), vec![(0x42, vec![64])]);
    assert_eq!(opened[1].sent(), vec![(0x42, vec![64]), (0x42, vec![5])]);
    // Old device's subscription was dropped with the rebind
    assert_eq!(opened[0].listeners(), 0);
}

#[tokio::test]
async fn probe_failure_after_open_keeps_device_bound() {
    let host = FakeHost::new(vec![device_info("/dev/hidraw3")]);
    host.set_fail_send(true);
    let (mut session, handle) = SessionController::new(host.clone(), SessionConfig::default());

    let result = session.request_device().await;

    assert!(matches!(result, Err(SessionError::Transport(_))));
    assert_eq!(
        session.current().map(|d| d.info().path.clone()),
        Some("/dev/hidraw3".to_string())
    );
    assert!(session.is_listening());
    assert!(host.last_opened().sent().is_empty());
    assert_eq!(
        *handle.status().borrow(),
        SessionStatus::Bound(device_info("/dev/hidraw3"))
    );
}

#[tokio::test]
async fn send_failure_is_returned_to_caller() {
    let host = FakeHost::new(vec![device_info("/dev/hidraw3")]);
    let (mut session, _handle) = SessionController::new(host.clone(), SessionConfig::default());
    session.request_device().await.unwrap();

    host.last_opened().set_fail_send(true);

    assert!(matches!(
        session.save(9).await,
        Err(SessionError::Transport(_))
    ));
    assert!(session.current().is_some());
}
