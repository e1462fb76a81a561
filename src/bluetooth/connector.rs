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

//! RFCOMM client connector for the serial port profile.

use bluer::rfcomm::{Profile, ProfileHandle, Role, Stream};
use bluer::{Adapter, Address, ErrorKind, Session};
use futures::StreamExt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, ReadBuf};
use tracing::{debug, info, warn};

use super::constants::SPP_UUID;

/// Reasons a connection attempt can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The caller may not use the Bluetooth adapter.
    #[error("bluetooth permission denied: {0}")]
    PermissionDenied(String),
    /// No Bluetooth adapter on this host.
    #[error("no bluetooth adapter available")]
    AdapterUnavailable,
    /// Adapter present but powered off.
    #[error("bluetooth adapter is powered off")]
    AdapterDisabled,
    /// Device address is not `XX:XX:XX:XX:XX:XX`.
    #[error("invalid device address: {0}")]
    InvalidAddress(String),
    /// The RFCOMM handshake did not complete.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),
}

impl ConnectError {
    /// Short text for the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied(_) => "Bluetooth permission denied".to_string(),
            Self::AdapterUnavailable => "Bluetooth is not supported on this device".to_string(),
            Self::AdapterDisabled => "Please enable Bluetooth".to_string(),
            Self::InvalidAddress(addr) => format!("Invalid device address: {}", addr),
            Self::HandshakeFailed(_) => "Could not connect to device".to_string(),
        }
    }

    fn from_adapter_error(err: bluer::Error) -> Self {
        if is_permission_error(&err) {
            Self::PermissionDenied(err.to_string())
        } else {
            Self::AdapterUnavailable
        }
    }

    fn from_handshake_error(err: bluer::Error) -> Self {
        if is_permission_error(&err) {
            Self::PermissionDenied(err.to_string())
        } else {
            Self::HandshakeFailed(err.to_string())
        }
    }
}

fn is_permission_error(err: &bluer::Error) -> bool {
    matches!(err.kind, ErrorKind::NotAuthorized | ErrorKind::NotPermitted)
        || err.message.contains("AccessDenied")
}

/// Opens byte streams to a remote device.
pub trait Connector {
    type Stream: AsyncRead + Unpin + Send + 'static;

    /// Connect to the device at `address`.
    ///
    /// On success the caller becomes the sole owner of the stream.
    fn connect(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Self::Stream, ConnectError>> + Send;
}

/// An open SPP connection.
///
/// Dropping it closes the socket and unregisters the profile.
pub struct Connection {
    stream: Stream,
    address: Address,
    // Keeps the SPP profile registered while the socket is open.
    _profile: Box<ProfileHandle>,
    _session: Session,
}

impl Connection {
    /// Remote device address.
    pub fn address(&self) -> Address {
        self.address
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

/// Connector backed by BlueZ.
pub struct BluetoothConnector {
    connect_timeout: Duration,
}

impl BluetoothConnector {
    /// Create a connector with the given handshake timeout.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Open the default adapter and check that it is usable.
    async fn open_adapter(&self) -> Result<(Session, Adapter), ConnectError> {
        let session = Session::new()
            .await
            .map_err(ConnectError::from_adapter_error)?;
        debug!("BlueZ session created");

        let adapter = session
            .default_adapter()
            .await
            .map_err(ConnectError::from_adapter_error)?;

        // Reading a property is the first call that requires authorization.
        let powered = adapter
            .is_powered()
            .await
            .map_err(ConnectError::from_adapter_error)?;
        if !powered {
            return Err(ConnectError::AdapterDisabled);
        }

        info!("Using Bluetooth adapter: {}", adapter.name());
        Ok((session, adapter))
    }
}

impl Default for BluetoothConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(
            super::constants::limits::CONNECT_TIMEOUT_SECS,
        ))
    }
}

impl Connector for BluetoothConnector {
    type Stream = Connection;

    async fn connect(&self, address: &str) -> Result<Connection, ConnectError> {
        let addr: Address = address
            .parse()
            .map_err(|_| ConnectError::InvalidAddress(address.to_string()))?;

        let (session, adapter) = self.open_adapter().await?;

        let device = adapter
            .device(addr)
            .map_err(ConnectError::from_handshake_error)?;

        let profile = Profile {
            uuid: SPP_UUID,
            role: Some(Role::Client),
            require_authentication: Some(false),
            require_authorization: Some(false),
            auto_connect: Some(false),
            ..Default::default()
        };
        let mut profile_handle = session
            .register_profile(profile)
            .await
            .map_err(ConnectError::from_handshake_error)?;
        info!("Connecting to {} (SPP {})", addr, SPP_UUID);

        let handshake = async {
            let connect = async {
                device
                    .connect_profile(&SPP_UUID)
                    .await
                    .map_err(ConnectError::from_handshake_error)
            };
            let accept = async {
                let request = profile_handle.next().await.ok_or_else(|| {
                    ConnectError::HandshakeFailed("profile closed before connecting".to_string())
                })?;
                request
                    .accept()
                    .map_err(|e| ConnectError::HandshakeFailed(e.to_string()))
            };
            tokio::try_join!(connect, accept)
        };

        let result = match tokio::time::timeout(self.connect_timeout, handshake).await {
            Ok(result) => result,
            Err(_) => Err(ConnectError::HandshakeFailed(format!(
                "timed out after {}s",
                self.connect_timeout.as_secs()
            ))),
        };

        match result {
            Ok(((), stream)) => {
                info!("Connected to {}", addr);
                Ok(Connection {
                    stream,
                    address: addr,
                    _profile: Box::new(profile_handle),
                    _session: session,
                })
            }
            Err(e) => {
                // Any accepted socket was dropped with the handshake future.
                if let Err(err) = device.disconnect_profile(&SPP_UUID).await {
                    debug!("Profile disconnect after failed handshake: {}", err);
                }
                warn!("Could not connect to {}: {}", addr, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_address_fails_before_bluez() {
        let connector = BluetoothConnector::default();

        let result = connector.connect("not-an-address").await;
        assert_eq!(
            result.err(),
            Some(ConnectError::InvalidAddress("not-an-address".to_string()))
        );
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            ConnectError::AdapterUnavailable.user_message(),
            "Bluetooth is not supported on this device"
        );
        assert_eq!(
            ConnectError::AdapterDisabled.user_message(),
            "Please enable Bluetooth"
        );
        assert_eq!(
            ConnectError::PermissionDenied("x".into()).user_message(),
            "Bluetooth permission denied"
        );
    }
}
