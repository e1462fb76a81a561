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

//! Serial port profile constants.

use uuid::Uuid;

/// Standard SPP UUID.
pub const SPP_UUID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

/// Address of the counter module.
pub const DEFAULT_DEVICE_ADDRESS: &str = "C8:F0:9E:53:34:26";

/// Read loop limits.
pub mod limits {
    /// Bytes requested per read call.
    pub const READ_CHUNK_SIZE: usize = 1024;

    /// Upper bound on buffered bytes when reassembling frames.
    pub const MAX_FRAME_BYTES: usize = 64 * 1024;

    /// Seconds allowed for the RFCOMM handshake.
    pub const CONNECT_TIMEOUT_SECS: u64 = 20;
}
