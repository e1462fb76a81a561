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

//! Connection handler: connect, read, persist.

use async_channel::Sender;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;
use tracing::{error, info};

use super::connector::{ConnectError, Connector};
use super::frame_reader::{FrameReader, ReadEnd};
use crate::record::RecordSet;
use crate::storage::RecordStore;

/// Events emitted by a connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// Handshake started.
    Connecting { address: String },
    /// Handshake succeeded; the read loop is running.
    Connected { address: String },
    /// A record set was decoded and saved.
    RecordsReceived { records: usize },
    /// Connection closed without a read error.
    Disconnected { reason: DisconnectReason },
    /// Connection attempt failed.
    ConnectFailed(ConnectError),
    /// Read failed; the connection is closed.
    ReadFailed(String),
}

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The remote closed the stream.
    RemoteClosed,
    /// Closed locally through the close handle.
    LocalClose,
}

/// Runs one connection from handshake to close.
pub struct ConnectionHandler<C: Connector> {
    connector: C,
    address: String,
    store: RecordStore,
    reader: FrameReader,
    event_tx: Sender<ConnectionEvent>,
}

impl<C: Connector> ConnectionHandler<C> {
    /// Create a new connection handler.
    pub fn new(
        connector: C,
        address: impl Into<String>,
        store: RecordStore,
        reader: FrameReader,
        event_tx: Sender<ConnectionEvent>,
    ) -> Self {
        Self {
            connector,
            address: address.into(),
            store,
            reader,
            event_tx,
        }
    }

    /// Run the connection handler.
    ///
    /// Firing (or dropping) `close_rx` closes the stream. Nothing is retried:
    /// when this returns, the connection is gone for good.
    pub async fn run(self, mut close_rx: oneshot::Receiver<()>) {
        let Self {
            connector,
            address,
            store,
            mut reader,
            event_tx,
        } = self;

        emit(&event_tx, ConnectionEvent::Connecting {
            address: address.clone(),
        });

        let stream = tokio::select! {
            result = connector.connect(&address) => match result {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Could not connect to {}: {}", address, e);
                    emit(&event_tx, ConnectionEvent::ConnectFailed(e));
                    return;
                }
            },
            _ = &mut close_rx => {
                info!("Connection attempt to {} cancelled", address);
                emit(&event_tx, ConnectionEvent::Disconnected {
                    reason: DisconnectReason::LocalClose,
                });
                return;
            }
        };

        info!("Connected to {}", address);
        emit(&event_tx, ConnectionEvent::Connected {
            address: address.clone(),
        });

        let records_tx = event_tx.clone();
        let on_record_set = move |records: RecordSet| match save_blocking(&store, &records) {
            Ok(()) => emit(&records_tx, ConnectionEvent::RecordsReceived {
                records: records.len(),
            }),
            Err(e) => error!("Failed to save records: {}", e),
        };

        tokio::select! {
            result = reader.run(stream, on_record_set) => match result {
                Ok(ReadEnd::EndOfStream) => emit(&event_tx, ConnectionEvent::Disconnected {
                    reason: DisconnectReason::RemoteClosed,
                }),
                Err(e) => emit(&event_tx, ConnectionEvent::ReadFailed(e.to_string())),
            },
            _ = close_rx => {
                info!("Closing connection to {}", address);
                emit(&event_tx, ConnectionEvent::Disconnected {
                    reason: DisconnectReason::LocalClose,
                });
            }
        }
    }
}

/// Save on the current worker without stalling the other tasks on it.
fn save_blocking(store: &RecordStore, records: &RecordSet) -> anyhow::Result<()> {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(|| store.save(records)),
        _ => store.save(records),
    }
}

fn emit(tx: &Sender<ConnectionEvent>, event: ConnectionEvent) {
    if tx.try_send(event).is_err() {
        error!("Event receiver closed");
    }
}
