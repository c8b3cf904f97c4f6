//! Incremental Server-Sent Events decoder.
//!
//! Bytes arrive from the HTTP body in arbitrary chunks; frames are only
//! decoded once their terminating blank line has been seen, so multi-byte
//! UTF-8 sequences split across chunks are handled. Lines may end in `\n`,
//! `\r\n` or a bare `\r`.

use crate::error::{ClientError, Result};
use crate::types::SessionEvent;

/// Largest partial frame buffered before the stream is abandoned.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// One dispatched SSE frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

impl SseFrame {
    /// Decode the frame payload into a session event.
    ///
    /// Payloads without a `type` field take the SSE `event:` name instead.
    pub fn into_session_event(self) -> Result<SessionEvent> {
        let mut event: SessionEvent = serde_json::from_str(&self.data)?;
        if event.event_type.is_empty() {
            if let Some(name) = self.event {
                event.event_type = name;
            }
        }
        Ok(event)
    }
}

/// Stateful decoder fed with raw body chunks.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Pending bytes with line endings normalised to `\n`.
    buf: Vec<u8>,
    /// Prefix of `buf` already searched for a frame boundary.
    scanned: usize,
    /// Last byte seen was `\r`; a following `\n` belongs to the same line end.
    after_cr: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every frame it completed.
    ///
    /// Fails once an unterminated frame grows past [`MAX_FRAME_BYTES`].
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseFrame>> {
        self.append(chunk);

        let mut frames = Vec::new();
        while let Some(end) = self.find_boundary() {
            let raw: Vec<u8> = self.buf.drain(..end + 2).collect();
            self.scanned = 0;
            if let Some(frame) = parse_frame(&String::from_utf8_lossy(&raw[..end])) {
                frames.push(frame);
            }
        }
        self.scanned = self.buf.len();

        if self.buf.len() > MAX_FRAME_BYTES {
            self.buf.clear();
            self.scanned = 0;
            return Err(ClientError::Stream(format!(
                "event frame larger than {MAX_FRAME_BYTES} bytes"
            )));
        }
        Ok(frames)
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buf);
        self.scanned = 0;
        self.after_cr = false;
        parse_frame(&String::from_utf8_lossy(&rest))
    }

    fn append(&mut self, chunk: &[u8]) {
        self.buf.reserve(chunk.len());
        for &b in chunk {
            match b {
                b'\n' if self.after_cr => {}
                b'\r' => self.buf.push(b'\n'),
                _ => self.buf.push(b),
            }
            self.after_cr = b == b'\r';
        }
    }

    fn find_boundary(&self) -> Option<usize> {
        let from = self.scanned.saturating_sub(1);
        self.buf[from..]
            .windows(2)
            .position(|w| w == b"\n\n")
            .map(|i| from + i)
    }
}

fn parse_frame(text: &str) -> Option<SseFrame> {
    let mut frame = SseFrame::default();
    let mut has_data = false;

    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => frame.event = Some(value.to_string()),
            "data" => {
                if has_data {
                    frame.data.push('\n');
                }
                frame.data.push_str(value);
                has_data = true;
            }
            _ => {}
        }
    }

    // Empty `data:` lines are keep-alives.
    (!frame.data.trim().is_empty()).then_some(frame)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn single_frame() {
        let mut dec = SseDecoder::new();
        let frames = dec
            .push(b"event: message\ndata: {\"type\":\"session:ready\"}\nid: 7\n\n")
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("message"));
        assert_eq!(frames[0].data, r#"{"type":"session:ready"}"#);
    }

    #[test]
    fn frame_split_across_chunks() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: {\"type\":").unwrap().is_empty());
        assert!(dec.push(b"\"tool:call\"}\n").unwrap().is_empty());
        let frames = dec.push(b"\ndata: {}\n\n").unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, r#"{"type":"tool:call"}"#);
        assert_eq!(frames[1].data, "{}");
    }

    #[test]
    fn utf8_split_inside_code_point() {
        let payload = "data: {\"text\":\"héllo 🔧\"}\n\n".as_bytes();
        let (a, b) = payload.split_at(17);
        let mut dec = SseDecoder::new();
        assert!(dec.push(a).unwrap().is_empty());
        let frames = dec.push(b).unwrap();
        assert_eq!(frames[0].data, "{\"text\":\"héllo 🔧\"}");
    }

    #[test]
    fn crlf_line_endings() {
        let mut dec = SseDecoder::new();
        let frames = dec.push(b"data: a\r\ndata: b\r\n\r\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "a\nb");
    }

    #[test]
    fn bare_cr_line_endings() {
        let mut dec = SseDecoder::new();
        let frames = dec.push(b"data: {\"type\":\"session:ready\"}\r\r").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, r#"{"type":"session:ready"}"#);
    }

    #[test]
    fn crlf_split_across_chunks() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: a\r").unwrap().is_empty());
        assert!(dec.push(b"\ndata: b\r").unwrap().is_empty());
        let frames = dec.push(b"\n\r\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "a\nb");
    }

    #[test]
    fn comments_and_empty_frames_are_dropped() {
        let mut dec = SseDecoder::new();
        let frames = dec
            .push(b": keep-alive\n\nevent: ping\n\ndata: x\n\n")
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn empty_data_frames_are_dropped() {
        let mut dec = SseDecoder::new();
        let frames = dec
            .push(b"data:\n\ndata\n\ndata: {\"type\":\"session:ready\"}\n\n")
            .unwrap();
        assert_eq!(frames.len(), 1);
        let ev = frames[0].clone().into_session_event().unwrap();
        assert_eq!(ev.event_type, "session:ready");
    }

    #[test]
    fn large_frame_in_many_chunks() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: ").unwrap().is_empty());
        for _ in 0..1000 {
            assert!(dec.push(&[b'x'; 100]).unwrap().is_empty());
        }
        let frames = dec.push(b"\n").unwrap();
        assert!(frames.is_empty());
        let frames = dec.push(b"\n").unwrap();
        assert_eq!(frames[0].data.len(), 100_000);
    }

    #[test]
    fn oversized_frame_is_stream_error() {
        let mut dec = SseDecoder::new();
        let chunk = vec![b'x'; 1024 * 1024];
        dec.push(b"data: ").unwrap();
        let mut result = Ok(Vec::new());
        for _ in 0..5 {
            result = dec.push(&chunk);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(ClientError::Stream(_))));
        assert!(dec.finish().is_none());
    }

    #[test]
    fn finish_flushes_unterminated_frame() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: tail").unwrap().is_empty());
        assert_eq!(dec.finish().unwrap().data, "tail");
        assert!(dec.finish().is_none());
    }

    #[test]
    fn event_name_fills_missing_type() {
        let frame = SseFrame {
            event: Some("session:completed".into()),
            data: r#"{"data":{}}"#.into(),
        };
        let ev = frame.into_session_event().unwrap();
        assert_eq!(ev.event_type, "session:completed");
    }

    #[test]
    fn payload_type_wins_over_event_name() {
        let frame = SseFrame {
            event: Some("message".into()),
            data: r#"{"type":"tool:call","data":{"tool_name":"grep"}}"#.into(),
        };
        let ev = frame.into_session_event().unwrap();
        assert_eq!(ev.event_type, "tool:call");
    }

    #[test]
    fn invalid_payload_is_decode_error() {
        let frame = SseFrame {
            data: "not json".into(),
            ..Default::default()
        };
        assert!(matches!(
            frame.into_session_event(),
            Err(ClientError::Decode(_))
        ));
    }
}
