/*
    Iridium SBD Emulator

    Copyright (c) 2026 The Iridium SBD Emulator Authors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the "Software"),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    framing.rs

    Framing Demultiplexer (component B). Splits the inbound byte stream
    into either CRLF-terminated text lines (command mode) or fixed-size
    binary chunks delimited by a short inter-byte idle (binary mode).
    Exactly one framing is active; mode switches are driven by the command
    engine and are atomic, discarding any residual partial frame.
*/

use std::time::{Duration, Instant};

pub const BINARY_IDLE: Duration = Duration::from_millis(30);

/// What the demultiplexer handed back: a decoded text line (terminator
/// stripped) in command mode, or a raw byte chunk in binary mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    Chunk(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingMode {
    Text,
    Binary,
}

pub struct FramingDemux {
    mode: FramingMode,
    text_buf: Vec<u8>,
    binary_buf: Vec<u8>,
    last_byte_at: Option<Instant>,
}

impl FramingDemux {
    pub fn new() -> Self {
        FramingDemux {
            mode: FramingMode::Text,
            text_buf: Vec::new(),
            binary_buf: Vec::new(),
            last_byte_at: None,
        }
    }

    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    /// Atomically switch framing. Any bytes buffered for the framing being
    /// left are discarded, matching real hardware: there is no carryover
    /// between command-mode lines and a binary upload.
    pub fn set_mode(&mut self, mode: FramingMode) {
        self.text_buf.clear();
        self.binary_buf.clear();
        self.last_byte_at = None;
        self.mode = mode;
    }

    /// Feed newly received bytes. In text mode, returns zero or more
    /// complete lines (a single read can span several CRLF boundaries, or
    /// none). In binary mode, bytes are buffered and nothing is returned
    /// here; call [`Self::take_if_idle`] to flush on idle.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        match self.mode {
            FramingMode::Text => {
                self.text_buf.extend_from_slice(bytes);
                let mut lines = Vec::new();
                while let Some(pos) = find_crlf(&self.text_buf) {
                    let line_bytes: Vec<u8> = self.text_buf.drain(..pos + 2).collect();
                    let line = String::from_utf8_lossy(&line_bytes[..line_bytes.len() - 2]).into_owned();
                    lines.push(Frame::Line(line));
                }
                lines
            }
            FramingMode::Binary => {
                self.binary_buf.extend_from_slice(bytes);
                self.last_byte_at = Some(Instant::now());
                Vec::new()
            }
        }
    }

    /// In binary mode, if at least `idle` has elapsed since the last byte
    /// arrived and anything is buffered, take and return it as one chunk.
    pub fn take_if_idle(&mut self, idle: Duration) -> Option<Frame> {
        if self.mode != FramingMode::Binary {
            return None;
        }
        let last = self.last_byte_at?;
        if self.binary_buf.is_empty() || last.elapsed() < idle {
            return None;
        }
        self.last_byte_at = None;
        Some(Frame::Chunk(std::mem::take(&mut self.binary_buf)))
    }

    /// Time until the idle deadline would fire, if bytes are currently
    /// buffered in binary mode. Used by the engine to size its select
    /// timeout instead of busy-polling.
    pub fn idle_deadline(&self, idle: Duration) -> Option<Duration> {
        if self.mode != FramingMode::Binary || self.binary_buf.is_empty() {
            return None;
        }
        let elapsed = self.last_byte_at?.elapsed();
        Some(idle.saturating_sub(elapsed))
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_multiple_lines_in_one_read() {
        let mut demux = FramingDemux::new();
        let frames = demux.feed(b"ATE0\r\nAT&K0\r\n");
        assert_eq!(
            frames,
            vec![Frame::Line("ATE0".to_string()), Frame::Line("AT&K0".to_string())]
        );
    }

    #[test]
    fn empty_line_is_legal() {
        let mut demux = FramingDemux::new();
        let frames = demux.feed(b"\r\n");
        assert_eq!(frames, vec![Frame::Line(String::new())]);
    }

    #[test]
    fn partial_line_waits_for_terminator() {
        let mut demux = FramingDemux::new();
        assert!(demux.feed(b"AT+CSQ").is_empty());
        let frames = demux.feed(b"\r\n");
        assert_eq!(frames, vec![Frame::Line("AT+CSQ".to_string())]);
    }

    #[test]
    fn mode_switch_discards_partial_frame() {
        let mut demux = FramingDemux::new();
        demux.feed(b"AT+SBDWB=5");
        demux.set_mode(FramingMode::Binary);
        demux.feed(&[1, 2, 3]);
        assert!(demux.take_if_idle(Duration::from_secs(0)).is_some());
        demux.set_mode(FramingMode::Text);
        // Switching back to text does not resurrect the earlier partial line.
        let frames = demux.feed(b"\r\n");
        assert_eq!(frames, vec![Frame::Line(String::new())]);
    }

    #[test]
    fn binary_chunk_flushes_after_idle() {
        let mut demux = FramingDemux::new();
        demux.set_mode(FramingMode::Binary);
        demux.feed(&[0xAA, 0xBB]);
        assert!(demux.take_if_idle(Duration::from_millis(30)).is_none());
        assert!(demux.take_if_idle(Duration::from_millis(0)).is_some());
    }
}
