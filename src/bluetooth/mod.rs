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

//! Bluetooth communication module.
//!
//! Connects to the counter device over RFCOMM and turns its stream into
//! record sets.

pub mod constants;
mod connection;
mod connector;
mod frame_reader;
mod reassembler;

pub use connection::{ConnectionEvent, ConnectionHandler, DisconnectReason};
pub use connector::{BluetoothConnector, ConnectError, Connection, Connector};
pub use frame_reader::{FrameMode, FrameReader, ReadEnd};
pub use reassembler::FrameAssembler;
