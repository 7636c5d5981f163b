//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; [`SseDecoder::feed`] buffers partial
//! lines and returns every event completed by the chunk.

use thiserror::Error;

/// Default cap on bytes held for one unfinished line or event.
pub const DEFAULT_MAX_EVENT_BYTES: usize = 1 << 20;

/// The stream exceeded the decoder's size limit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("event exceeds {limit} bytes without completing")]
pub struct EventTooLarge {
    pub limit: usize,
}

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Event name from an `event:` field, when present.
    pub event: Option<String>,
    /// Data lines joined with `\n`.
    pub data: String,
    /// Last `id:` value seen on this frame.
    pub id: Option<String>,
}

/// Line-oriented event-stream parser.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    data_len: usize,
    id: Option<String>,
    retry: Option<u64>,
    max_pending: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_EVENT_BYTES)
    }
}

impl SseDecoder {
    /// Create an empty decoder with the default size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty decoder holding at most `max_pending` bytes of an
    /// unfinished line plus the data of the event being assembled.
    pub fn with_limit(max_pending: usize) -> Self {
        Self {
            buffer: Vec::new(),
            event: None,
            data: Vec::new(),
            data_len: 0,
            id: None,
            retry: None,
            max_pending,
        }
    }

    /// Append a chunk and return the events it completes, in order.
    ///
    /// Fails once the pending line or event grows past the limit. The
    /// decoder is unusable afterwards.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseFrame>, EventTooLarge> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(line) = self.next_line() {
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
            self.check_limit(0)?;
        }
        // Only an unfinished line is left in the buffer now.
        self.check_limit(self.buffer.len())?;
        Ok(frames)
    }

    fn check_limit(&self, partial_line: usize) -> Result<(), EventTooLarge> {
        if partial_line + self.data_len > self.max_pending {
            return Err(EventTooLarge {
                limit: self.max_pending,
            });
        }
        Ok(())
    }

    /// Take the most recent `retry:` hint in milliseconds, if one arrived.
    pub fn take_retry(&mut self) -> Option<u64> {
        self.retry.take()
    }

    /// Split one complete line off the buffer, accepting `\n`, `\r\n` or `\r`.
    fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|b| *b == b'\n' || *b == b'\r')?;

        let terminator = if self.buffer[pos] == b'\r' {
            match self.buffer.get(pos + 1) {
                Some(b'\n') => 2,
                Some(_) => 1,
                // A trailing `\r` may be the first half of `\r\n`.
                None => return None,
            }
        } else {
            1
        };

        let line = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
        self.buffer.drain(..pos + terminator);
        Some(line)
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }

        // Comments (keep-alive pings)
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                self.data_len += value.len();
                self.data.push(value.to_string());
            }
            "id" => self.id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(ms);
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        self.data_len = 0;
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event,
            data,
            id: self.id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data: {\"pct\":5}\n\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"pct\":5}");
        assert_eq!(frames[0].event, None);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"pc").unwrap().is_empty());
        assert!(decoder.feed(b"t\":5}\n").unwrap().is_empty());
        let frames = decoder.feed(b"\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"pct\":5}");
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let text = "data: 完成\n\n".as_bytes();
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(&text[..8]).unwrap().is_empty());
        let frames = decoder.feed(&text[8..]).unwrap();
        assert_eq!(frames[0].data, "完成");
    }

    #[test]
    fn test_comments_are_skipped() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b": ping\n\n:\n\ndata: a\n\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "a");
    }

    #[test]
    fn test_named_event_and_multiline_data() {
        let mut decoder = SseDecoder::new();
        let frames = decoder
            .feed(b"event: error\ndata: line one\ndata: line two\nid: 7\n\n")
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("error"));
        assert_eq!(frames[0].data, "line one\nline two");
        assert_eq!(frames[0].id.as_deref(), Some("7"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"data:x\r\n\r\ndata: y\r\n\r").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "x");
        let frames = decoder.feed(b"\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "y");
    }

    #[test]
    fn test_retry_hint() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"retry: 1500\n\nretry: soon\n\n").unwrap().is_empty());
        assert_eq!(decoder.take_retry(), Some(1500));
        assert_eq!(decoder.take_retry(), None);
    }

    #[test]
    fn test_event_name_without_data_is_not_dispatched() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.feed(b"event: noop\n\ndata: z\n\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, None);
    }

    #[test]
    fn test_unterminated_line_over_limit() {
        let mut decoder = SseDecoder::with_limit(16);
        assert!(decoder.feed(b"data: 0123").unwrap().is_empty());
        assert_eq!(
            decoder.feed(b"456789abcdef"),
            Err(EventTooLarge { limit: 16 })
        );
    }

    #[test]
    fn test_accumulated_data_over_limit() {
        let mut decoder = SseDecoder::with_limit(16);
        assert_eq!(
            decoder.feed(b"data: 0123456789\ndata: abcdefgh\n"),
            Err(EventTooLarge { limit: 16 })
        );
    }

    #[test]
    fn test_large_chunk_of_small_events_within_limit() {
        let mut decoder = SseDecoder::with_limit(16);
        let chunk = b"data: a\n\n".repeat(20);
        assert_eq!(decoder.feed(&chunk).unwrap().len(), 20);
    }

    #[test]
    fn test_limit_resets_after_dispatch() {
        let mut decoder = SseDecoder::with_limit(16);
        for _ in 0..4 {
            let frames = decoder.feed(b"data: 0123456789\n\n").unwrap();
            assert_eq!(frames.len(), 1);
        }
    }
}
