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

//! JSON frame reassembly across reads.
//!
//! The device sends arrays without any framing, so a read may end in the
//! middle of one. The assembler keeps the unfinished tail and emits every
//! array that parses completely.

use tracing::{debug, warn};

use crate::record::RecordSet;

/// Buffers raw bytes until they form complete record arrays.
pub struct FrameAssembler {
    buffer: Vec<u8>,
    max_bytes: usize,
}

impl FrameAssembler {
    /// Create a new assembler holding at most `max_bytes` of partial data.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            max_bytes,
        }
    }

    /// Feed one read chunk.
    ///
    /// Returns the record sets completed by this chunk, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RecordSet> {
        self.buffer.extend_from_slice(chunk);

        if self.buffer.len() > self.max_bytes {
            warn!(
                "Frame buffer exceeded {} bytes, discarding {} bytes",
                self.max_bytes,
                self.buffer.len()
            );
            self.reset();
            return Vec::new();
        }

        let mut complete = Vec::new();
        let consumed = {
            let mut consumed = 0;
            let mut frames =
                serde_json::Deserializer::from_slice(&self.buffer).into_iter::<RecordSet>();

            loop {
                match frames.next() {
                    Some(Ok(records)) => {
                        consumed = frames.byte_offset();
                        complete.push(records);
                    }
                    Some(Err(e)) if e.is_eof() => {
                        // Unfinished array; wait for more bytes.
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("Discarding malformed frame data: {}", e);
                        consumed = self.buffer.len();
                        break;
                    }
                    None => {
                        consumed = self.buffer.len();
                        break;
                    }
                }
            }
            consumed
        };

        self.buffer.drain(..consumed);
        if !self.buffer.is_empty() {
            debug!("Holding {} bytes of partial frame", self.buffer.len());
        }

        complete
    }

    /// Drop any buffered bytes.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Get current buffer size.
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn test_whole_frame() {
        let mut assembler = FrameAssembler::new(1024);

        let sets = assembler.push(br#"[{"time":5,"count":20}]"#);
        assert_eq!(sets, vec![vec![Record::new(5, 20)]]);
        assert_eq!(assembler.buffer_size(), 0);
    }

    #[test]
    fn test_split_frame() {
        let mut assembler = FrameAssembler::new(1024);

        assert!(assembler.push(br#"[{"time":5,"#).is_empty());
        assert!(assembler.buffer_size() > 0);

        let sets = assembler.push(br#""count":20}]"#);
        assert_eq!(sets, vec![vec![Record::new(5, 20)]]);
        assert_eq!(assembler.buffer_size(), 0);
    }

    #[test]
    fn test_two_frames_in_one_chunk_with_tail() {
        let mut assembler = FrameAssembler::new(1024);

        let sets =
            assembler.push(b"[{\"time\":1,\"count\":3}]\n[{\"time\":2,\"count\":10}]\n[{\"ti");
        assert_eq!(
            sets,
            vec![vec![Record::new(1, 3)], vec![Record::new(2, 10)]]
        );
        assert!(assembler.buffer_size() > 0);
    }

    #[test]
    fn test_garbage_discards_buffer() {
        let mut assembler = FrameAssembler::new(1024);

        assert!(assembler.push(b"not json").is_empty());
        assert_eq!(assembler.buffer_size(), 0);

        let sets = assembler.push(br#"[{"time":4,"count":8}]"#);
        assert_eq!(sets, vec![vec![Record::new(4, 8)]]);
    }

    #[test]
    fn test_overflow_discards_buffer() {
        let mut assembler = FrameAssembler::new(16);

        assert!(assembler.push(br#"[{"time":5,"count":"#).is_empty());
        assert_eq!(assembler.buffer_size(), 0);
    }
}
