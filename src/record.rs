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

//! Count records sent by the remote device.
//!
//! The device writes a JSON array of `{"time": <minutes>, "count": <n>}`
//! objects. One array is one record set.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A single `{time, count}` sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Elapsed time in minutes.
    pub time: i64,
    /// Events counted over `time`.
    pub count: i64,
}

impl Record {
    pub fn new(time: i64, count: i64) -> Self {
        Self { time, count }
    }

    /// Count per minute, or `None` when `time` is zero.
    pub fn rate(&self) -> Option<f32> {
        if self.time == 0 {
            None
        } else {
            Some(self.count as f32 / self.time as f32)
        }
    }
}

/// Ordered records decoded from one frame.
pub type RecordSet = Vec<Record>;

/// A frame that does not start with a JSON array of records.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed record frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("empty record frame")]
    Empty,
}

/// Decode one frame into a record set.
///
/// Only the leading array is decoded. Whatever follows it in the same read
/// (a second frame, or the start of one) is ignored.
pub fn decode(frame: &[u8]) -> Result<RecordSet, DecodeError> {
    let mut values = serde_json::Deserializer::from_slice(frame).into_iter::<RecordSet>();
    let records = values.next().ok_or(DecodeError::Empty)??;

    let rest = &frame[values.byte_offset()..];
    if !rest.iter().all(u8::is_ascii_whitespace) {
        debug!(
            "Ignoring {} bytes after record frame: {}",
            rest.len(),
            String::from_utf8_lossy(rest).trim()
        );
    }

    Ok(records)
}

/// Serialize a record set to the JSON array text stored on disk.
pub fn encode(records: &[Record]) -> Result<String, serde_json::Error> {
    serde_json::to_string(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_record() {
        let records = decode(br#"[{"time":5,"count":20}]"#).unwrap();
        assert_eq!(records, vec![Record::new(5, 20)]);
    }

    #[test]
    fn test_decode_keeps_order_and_ignores_extra_keys() {
        let frame = br#"[{"time":3,"count":1,"id":"a"},{"count":9,"time":1}]"#;
        let records = decode(frame).unwrap();
        assert_eq!(records, vec![Record::new(3, 1), Record::new(1, 9)]);
    }

    #[test]
    fn test_decode_tolerates_line_ending() {
        let records = decode(b"[{\"time\":2,\"count\":4}]\r\n").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_decode_keeps_leading_array() {
        let records = decode(br#"[{"time":1,"count":3}][{"time":2,"count":10}]"#).unwrap();
        assert_eq!(records, vec![Record::new(1, 3)]);

        let records = decode(br#"[{"time":4,"count":8}]
[{"time":5,"#).unwrap();
        assert_eq!(records, vec![Record::new(4, 8)]);
    }

    #[test]
    fn test_decode_empty_array() {
        assert!(decode(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(decode(b""), Err(DecodeError::Empty)));
        assert!(matches!(decode(b" \r\n"), Err(DecodeError::Empty)));
        assert!(decode(br#"[{"time":5,"count":20}"#).is_err());
        assert!(decode(br#"{"time":5,"count":20}"#).is_err());
        assert!(decode(br#"[{"time":5}]"#).is_err());
        assert!(decode(br#"[{"time":"5","count":20}]"#).is_err());
        assert!(decode(br#"[1,2,3]"#).is_err());
    }

    #[test]
    fn test_rate() {
        assert_eq!(Record::new(5, 20).rate(), Some(4.0));
        assert_eq!(Record::new(2, 5).rate(), Some(2.5));
        assert_eq!(Record::new(0, 5).rate(), None);
    }

    #[test]
    fn test_encode_matches_wire_shape() {
        let text = encode(&[Record::new(5, 20)]).unwrap();
        assert_eq!(text, r#"[{"time":5,"count":20}]"#);
    }
}
