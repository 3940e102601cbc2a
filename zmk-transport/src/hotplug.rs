//! Hot-plug detection by periodic re-enumeration
//!
//! The monitor keeps the last snapshot of matching interfaces (keyed by path)
//! and emits connect/disconnect events for devices the user has granted.

use std::collections::{HashMap, HashSet};

use crate::types::{DeviceInfo, DeviceKey, HostEvent};

/// Matching interfaces keyed by OS path
pub type Snapshot = HashMap<String, DeviceInfo>;

/// Build a snapshot from an enumeration
pub fn snapshot<I: IntoIterator<Item = DeviceInfo>>(devices: I) -> Snapshot {
    devices.into_iter().map(|d| (d.path.clone(), d)).collect()
}

/// Events between two snapshots, restricted to granted devices.
///
/// Disconnects are reported before connects so a device that replugs onto a
/// new path between polls is seen going away before it comes back.
pub fn diff_snapshots(
    previous: &Snapshot,
    current: &Snapshot,
    granted: &HashSet<DeviceKey>,
) -> Vec<HostEvent> {
    let mut events = Vec::new();

    for (path, info) in previous {
        if !current.contains_key(path) && granted.contains(&info.key()) {
            events.push(HostEvent::Disconnected(info.clone()));
        }
    }

    for (path, info) in current {
        if !previous.contains_key(path) && granted.contains(&info.key()) {
            events.push(HostEvent::Connected(info.clone()));
        }
    }

    events
}
