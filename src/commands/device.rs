//! One-shot device commands

use std::time::Duration;

use anyhow::{bail, Context};
use tracing::{info, warn};
use zmk_transport::DeviceInfo;

use super::{open_host, CommandResult, Session};
use zmk_slider::config::Config;

fn print_devices(devices: &[DeviceInfo]) {
    for (i, d) in devices.iter().enumerate() {
        println!(
            "  [{}] VID={:04x} PID={:04x} page={:04x} usage={:04x} if={} {} ({})",
            i,
            d.vid,
            d.pid,
            d.usage_page,
            d.usage,
            d.interface_number,
            d.display_name(),
            d.path,
        );
    }
}

/// List HID interfaces
pub fn list(config: &Config, all: bool, json: bool) -> CommandResult {
    let host = open_host(config, false)?;
    let devices = if all {
        host.list_all()?
    } else {
        host.list_devices(&config.filter.to_filter())?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        if all {
            println!("No HID devices found");
        } else {
            println!(
                "No HID interfaces on usage page 0x{:04x}",
                config.filter.usage_page
            );
        }
        return Ok(());
    }

    if all {
        println!("All HID devices:");
    } else {
        println!(
            "HID interfaces on usage page 0x{:04x}:",
            config.filter.usage_page
        );
    }
    print_devices(&devices);
    Ok(())
}

/// Bind a device, probe it and print the first value it reports
pub async fn read(config: &Config, prompt: bool, timeout_ms: u64) -> CommandResult {
    let session = Session::start(config, prompt)?;
    let result = read_first_value(&session, Duration::from_millis(timeout_ms)).await;
    session.stop().await;
    result
}

async fn read_first_value(session: &Session, timeout: Duration) -> CommandResult {
    // Subscribe before requesting so the probe answer cannot be missed
    let mut values = session.handle.values();

    let Some(device) = session.handle.request_device().await? else {
        println!("No device selected");
        return Ok(());
    };
    info!("Reading from {}", device.display_name());

    let result = match tokio::time::timeout(timeout, values.wait_for(|v| v.is_some())).await {
        Ok(Ok(value)) => {
            if let Some(v) = *value {
                println!("{}", v);
            }
            Ok(())
        }
        Ok(Err(_)) => bail!("session closed before the device answered"),
        Err(_) => bail!(
            "no report from {} within {} ms",
            device.display_name(),
            timeout.as_millis()
        ),
    };
    result
}

/// Bind a device and send one value
pub async fn set(config: &Config, prompt: bool, value: u8) -> CommandResult {
    let session = Session::start(config, prompt)?;
    let result = send_once(&session, value).await;
    session.stop().await;
    result
}

async fn send_once(session: &Session, value: u8) -> CommandResult {
    let Some(device) = session.handle.request_device().await? else {
        warn!("No device selected, value not sent");
        println!("No device selected");
        return Ok(());
    };
    session
        .handle
        .send_value(value)
        .await
        .with_context(|| format!("sending {} to {}", value, device.display_name()))?;
    println!("Sent {} to {}", value, device.display_name());
    Ok(())
}
