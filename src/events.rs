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

//! Event processing on the UI thread.

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::bluetooth::ConnectionEvent;
use crate::chart::ChartRenderer;
use crate::state::AppState;
use crate::storage::RecordStore;

/// Shows short messages to the user.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Applies connection events to state and chart.
pub struct EventProcessor {
    store: RecordStore,
    state: Arc<AppState>,
    renderer: ChartRenderer,
    notifier: Box<dyn Notifier>,
}

impl EventProcessor {
    /// Create a new event processor.
    pub fn new(
        store: RecordStore,
        state: Arc<AppState>,
        renderer: ChartRenderer,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            state,
            renderer,
            notifier,
        }
    }

    /// Re-read the store and redraw the chart.
    pub fn refresh_chart(&self) {
        match self.store.load() {
            Ok(records) => self.renderer.render(records.as_ref()),
            Err(e) => {
                error!("Failed to load records: {}", e);
                self.renderer.render(None);
            }
        }

        match self.store.last_saved_at() {
            Ok(Some(at)) => self.state.set_last_update(at),
            Ok(None) => {}
            Err(e) => error!("Failed to read save time: {}", e),
        }
    }

    /// Process a single event.
    pub fn process_event(&self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connecting { address } => {
                info!("Connecting to {}", address);
            }
            ConnectionEvent::Connected { address } => {
                info!("Device connected: {}", address);
                self.state.set_connected(address);
            }
            ConnectionEvent::RecordsReceived { records } => {
                debug!("{} records stored, refreshing chart", records);
                self.refresh_chart();
            }
            ConnectionEvent::Disconnected { reason } => {
                info!("Device disconnected: {:?}", reason);
                self.state.set_closed();
            }
            ConnectionEvent::ConnectFailed(e) => {
                error!("Connection failed: {}", e);
                self.state.set_closed();
                self.notifier.notify(&e.user_message());
            }
            ConnectionEvent::ReadFailed(e) => {
                error!("Input stream was disconnected: {}", e);
                self.state.set_closed();
            }
        }
    }
}
