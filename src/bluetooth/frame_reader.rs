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

//! Read loop that turns raw stream bytes into record sets.

use serde::{Deserialize, Serialize};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, info, warn};

use super::reassembler::FrameAssembler;
use crate::record::{self, RecordSet};

/// How read chunks map to frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameMode {
    /// Every read is one complete frame; anything that fails to parse is dropped.
    #[default]
    Chunk,
    /// Bytes are buffered across reads until a complete array parses.
    Reassemble,
}

/// How a read loop ended without an I/O error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEnd {
    /// The remote closed the stream (zero-byte read).
    EndOfStream,
}

/// Reads frames from a byte stream.
pub struct FrameReader {
    chunk_size: usize,
    assembler: Option<FrameAssembler>,
}

impl FrameReader {
    /// Reader that decodes each read chunk on its own.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            assembler: None,
        }
    }

    /// Reader that reassembles frames split across reads.
    pub fn reassembling(chunk_size: usize, max_frame_bytes: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            assembler: Some(FrameAssembler::new(max_frame_bytes)),
        }
    }

    /// Build a reader for the given mode.
    pub fn with_mode(mode: FrameMode, chunk_size: usize, max_frame_bytes: usize) -> Self {
        match mode {
            FrameMode::Chunk => Self::new(chunk_size),
            FrameMode::Reassemble => Self::reassembling(chunk_size, max_frame_bytes),
        }
    }

    /// Run the read loop until the stream ends or fails.
    ///
    /// `on_record_set` runs before the next read. Returns
    /// `Ok(ReadEnd::EndOfStream)` on a clean end of stream; a read error is
    /// returned and ends the loop. The stream is dropped either way.
    pub async fn run<R, F>(&mut self, mut stream: R, mut on_record_set: F) -> io::Result<ReadEnd>
    where
        R: AsyncRead + Unpin,
        F: FnMut(RecordSet),
    {
        info!("Read loop started");
        let mut buf = vec![0u8; self.chunk_size];

        loop {
            match stream.read(&mut buf).await {
                Ok(0) => {
                    info!("Stream closed by remote");
                    return Ok(ReadEnd::EndOfStream);
                }
                Ok(n) => {
                    for records in self.decode_chunk(&buf[..n]) {
                        on_record_set(records);
                    }
                }
                Err(e) => {
                    error!("Input stream was disconnected: {}", e);
                    return Err(e);
                }
            }
        }
    }

    fn decode_chunk(&mut self, chunk: &[u8]) -> Vec<RecordSet> {
        debug!("Received: {}", String::from_utf8_lossy(chunk).trim());

        match self.assembler.as_mut() {
            Some(assembler) => assembler.push(chunk),
            None => match record::decode(chunk) {
                Ok(records) => vec![records],
                Err(e) => {
                    warn!("Failed to parse frame: {}", e);
                    Vec::new()
                }
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::record::Record;
    use std::collections::VecDeque;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// Stream that returns one scripted chunk (or error) per read.
    pub(crate) struct ScriptedStream {
        reads: VecDeque<io::Result<Vec<u8>>>,
    }

    impl ScriptedStream {
        pub(crate) fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                reads: reads.into(),
            }
        }

        pub(crate) fn frames(frames: &[&str]) -> Self {
            Self::new(frames.iter().map(|f| Ok(f.as_bytes().to_vec())).collect())
        }
    }

    impl AsyncRead for ScriptedStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.reads.pop_front() {
                Some(Ok(bytes)) => {
                    let n = bytes.len().min(buf.remaining());
                    buf.put_slice(&bytes[..n]);
                    Poll::Ready(Ok(()))
                }
                Some(Err(e)) => Poll::Ready(Err(e)),
                None => Poll::Ready(Ok(())),
            }
        }
    }

    async fn collect(
        reader: &mut FrameReader,
        stream: ScriptedStream,
    ) -> (io::Result<ReadEnd>, Vec<RecordSet>) {
        let mut sets = Vec::new();
        let result = reader.run(stream, |records| sets.push(records)).await;
        (result, sets)
    }

    #[tokio::test]
    async fn test_single_frame() {
        let mut reader = FrameReader::new(1024);
        let stream = ScriptedStream::frames(&[r#"[{"time":5,"count":20}]"#]);

        let (result, sets) = collect(&mut reader, stream).await;
        assert_eq!(result.unwrap(), ReadEnd::EndOfStream);
        assert_eq!(sets, vec![vec![Record::new(5, 20)]]);
    }

    #[tokio::test]
    async fn test_chunk_mode_keeps_first_of_joined_frames() {
        let mut reader = FrameReader::new(1024);
        let stream = ScriptedStream::frames(&[
            r#"[{"time":1,"count":3}][{"time":2,"count":10}]"#,
            r#"[{"time":4,"count":8}][{"time":5,"#,
        ]);

        let (result, sets) = collect(&mut reader, stream).await;
        assert!(result.is_ok());
        assert_eq!(sets, vec![vec![Record::new(1, 3)], vec![Record::new(4, 8)]]);
    }

    #[tokio::test]
    async fn test_bad_frame_does_not_affect_next() {
        let mut reader = FrameReader::new(1024);
        let stream = ScriptedStream::frames(&[
            r#"[{"time":1,"count":3}"#,
            r#"[{"time":2,"count":10}]"#,
        ]);

        let (result, sets) = collect(&mut reader, stream).await;
        assert!(result.is_ok());
        assert_eq!(sets, vec![vec![Record::new(2, 10)]]);
    }

    #[tokio::test]
    async fn test_chunk_mode_drops_split_frame() {
        let mut reader = FrameReader::new(1024);
        let stream = ScriptedStream::frames(&[r#"[{"time":5,"#, r#""count":20}]"#]);

        let (_, sets) = collect(&mut reader, stream).await;
        assert!(sets.is_empty());
    }

    #[tokio::test]
    async fn test_reassemble_mode_joins_split_frame() {
        let mut reader = FrameReader::reassembling(1024, 64 * 1024);
        let stream = ScriptedStream::frames(&[r#"[{"time":5,"#, r#""count":20}]"#]);

        let (_, sets) = collect(&mut reader, stream).await;
        assert_eq!(sets, vec![vec![Record::new(5, 20)]]);
    }

    #[tokio::test]
    async fn test_read_error_stops_loop() {
        let mut reader = FrameReader::new(1024);
        let stream = ScriptedStream::new(vec![
            Ok(br#"[{"time":1,"count":1}]"#.to_vec()),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
            Ok(br#"[{"time":2,"count":2}]"#.to_vec()),
        ]);

        let (result, sets) = collect(&mut reader, stream).await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(sets, vec![vec![Record::new(1, 1)]]);
    }

    #[tokio::test]
    async fn test_chunk_size_limits_read() {
        let mut reader = FrameReader::new(8);
        let stream = ScriptedStream::frames(&[r#"[{"time":5,"count":20}]"#]);

        // Only the first 8 bytes fit, so the frame cannot parse.
        let (result, sets) = collect(&mut reader, stream).await;
        assert!(result.is_ok());
        assert!(sets.is_empty());
    }
}
