// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application state management.

use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Reading,
    Closed,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "Not connected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Reading => "Connected",
            ConnectionStatus::Closed => "Disconnected",
        }
    }

    /// Whether a new connection may be started from this status.
    pub fn can_connect(&self) -> bool {
        matches!(self, ConnectionStatus::Idle | ConnectionStatus::Closed)
    }
}

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Current connection status.
    pub connection_status: RwLock<ConnectionStatus>,

    /// Connected device address.
    pub connected_device: RwLock<Option<String>>,

    /// Time of the last chart update.
    pub last_update: RwLock<Option<DateTime<Local>>>,

    /// Closes the active connection. Taken at most once.
    close_handle: Mutex<Option<oneshot::Sender<()>>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            connection_status: RwLock::new(ConnectionStatus::Idle),
            connected_device: RwLock::new(None),
            last_update: RwLock::new(None),
            close_handle: Mutex::new(None),
        }
    }
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim the connection slot.
    ///
    /// Returns the receiving half of a fresh close handle, or `None` when a
    /// connection is already being set up or read.
    pub fn begin_connect(&self) -> Option<oneshot::Receiver<()>> {
        let mut status = self.connection_status.write();
        if !status.can_connect() {
            return None;
        }
        *status = ConnectionStatus::Connecting;

        let (tx, rx) = oneshot::channel();
        *self.close_handle.lock() = Some(tx);
        Some(rx)
    }

    pub fn set_connected(&self, address: String) {
        *self.connection_status.write() = ConnectionStatus::Reading;
        *self.connected_device.write() = Some(address);
    }

    /// Mark the connection closed and forget its close handle.
    pub fn set_closed(&self) {
        *self.connection_status.write() = ConnectionStatus::Closed;
        *self.connected_device.write() = None;
        self.close_handle.lock().take();
    }

    /// Close the active connection, if any.
    ///
    /// Returns `true` if a close signal was sent. Later calls are no-ops.
    pub fn close_connection(&self) -> bool {
        match self.close_handle.lock().take() {
            Some(tx) => {
                info!("Closing active connection");
                let _ = tx.send(());
                true
            }
            None => {
                debug!("No active connection to close");
                false
            }
        }
    }

    pub fn get_status(&self) -> ConnectionStatus {
        *self.connection_status.read()
    }

    pub fn get_device_name(&self) -> Option<String> {
        self.connected_device.read().clone()
    }

    pub fn set_last_update(&self, at: DateTime<Local>) {
        *self.last_update.write() = Some(at);
    }

    pub fn get_last_update(&self) -> Option<DateTime<Local>> {
        *self.last_update.read()
    }
}
