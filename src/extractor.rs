//! Incremental JSON fragment extraction from the upstream byte stream.
//!
//! The webhook response body is an unbounded byte stream containing zero or
//! more concatenated top-level JSON objects, possibly surrounded by stray
//! text, and split by the transport at arbitrary byte boundaries - including
//! inside multi-byte characters and inside quoted JSON strings. This module
//! recovers complete fragments from that stream regardless of how it was
//! chunked.
//!
//! Two layers:
//!
//! - [`extract`] is the pure scan: given the unconsumed remainder from the
//!   previous call plus newly arrived text, it returns every complete
//!   fragment found and the new remainder. Brace depth is only tracked
//!   outside string literals, so payload text containing `{` / `}` (HTML,
//!   CSS, prose) can never corrupt framing.
//!
//! - [`ChunkExtractor`] is the per-request state machine used by the
//!   executors. It additionally buffers raw bytes so that a multi-byte
//!   character split across two network chunks is held back until its full
//!   byte sequence has arrived, and it post-processes each fragment: parse
//!   as JSON, drop malformed fragments silently, yield the `content` string
//!   when present and skip metadata-only fragments.
//!
//! One `ChunkExtractor` belongs to exactly one in-flight request. It is
//! created at call start and discarded when the call completes or fails;
//! nothing here is shared across requests.

/// Scan `previous_remainder + new_text` left to right and return all complete
/// top-level JSON object fragments plus the unconsumed remainder.
///
/// - A fragment starts at the first `{` seen at depth 0 outside a string.
/// - Braces inside string literals do not affect nesting depth; escaped
///   quotes (`\"`) do not terminate strings.
/// - Text preceding a fragment start at depth 0 is discarded, not retained.
/// - A partial fragment at end of scan becomes the returned remainder.
///
/// Calling this again on a fully consumed buffer with no new input yields no
/// fragments and an empty remainder.
pub fn extract(previous_remainder: &str, new_text: &str) -> (Vec<String>, String) {
    let combined: String = if previous_remainder.is_empty() {
        new_text.to_string()
    } else {
        let mut buf = String::with_capacity(previous_remainder.len() + new_text.len());
        buf.push_str(previous_remainder);
        buf.push_str(new_text);
        buf
    };

    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;
    let mut start: Option<usize> = None;

    for (i, ch) in combined.char_indices() {
        if depth == 0 {
            // Outside any fragment: stray text is skipped until a '{' opens one.
            if ch == '{' {
                start = Some(i);
                depth = 1;
            }
            continue;
        }

        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        fragments.push(combined[s..i + 1].to_string());
                    }
                    in_string = false;
                    escape = false;
                }
            }
            _ => {}
        }
    }

    let remainder = match start {
        Some(s) => combined[s..].to_string(),
        None => String::new(),
    };

    (fragments, remainder)
}

/// Per-request parser state: byte buffer, text remainder, scan cursor.
#[derive(Debug, Default)]
pub struct ChunkExtractor {
    /// Trailing bytes of an incomplete UTF-8 sequence, held until the rest
    /// of the sequence arrives.
    pending_bytes: Vec<u8>,

    /// Partial fragment text carried between calls.
    remainder: String,
}

impl ChunkExtractor {
    /// Creates an extractor with empty buffers, ready for the first chunk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one raw transport chunk and return the `content` of every
    /// fragment completed by it, in arrival order.
    ///
    /// Bytes that end mid-way through a multi-byte character are buffered at
    /// the byte level and prepended to the next chunk; they are never decoded
    /// early or dropped. Fragments that fail to parse as JSON, and fragments
    /// without a string `content` field, produce nothing.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending_bytes.extend_from_slice(bytes);

        let keep = incomplete_utf8_suffix(&self.pending_bytes);
        let decodable = self.pending_bytes.len() - keep;
        // Lossless for well-formed input; transport corruption inside a
        // fragment surfaces as a malformed fragment and is dropped below.
        let text = String::from_utf8_lossy(&self.pending_bytes[..decodable]).into_owned();
        self.pending_bytes.drain(..decodable);

        self.push_text(&text)
    }

    /// Text-level variant of [`ChunkExtractor::push_bytes`] for transports
    /// that already deliver decoded text.
    pub fn push_text(&mut self, text: &str) -> Vec<String> {
        let previous = std::mem::take(&mut self.remainder);
        let (fragments, remainder) = extract(&previous, text);
        self.remainder = remainder;

        fragments
            .iter()
            .filter_map(|fragment| content_of(fragment))
            .collect()
    }

    /// The partial fragment currently held for the next call.
    pub fn remainder(&self) -> &str {
        &self.remainder
    }
}

/// Parse one raw fragment and pull out its `content` string.
///
/// Malformed JSON and metadata-only fragments (no string `content` field)
/// both return `None`; extraction of subsequent fragments is unaffected.
fn content_of(fragment: &str) -> Option<String> {
    let value: serde_json::Value = match serde_json::from_str(fragment) {
        Ok(v) => v,
        Err(err) => {
            log::debug!("dropping malformed fragment ({} bytes): {}", fragment.len(), err);
            return None;
        }
    };

    value
        .get("content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
}

/// Number of trailing bytes that form the start of an incomplete UTF-8
/// sequence, 0 when the buffer ends on a character boundary.
fn incomplete_utf8_suffix(buf: &[u8]) -> usize {
    for back in 1..=buf.len().min(4) {
        let byte = buf[buf.len() - back];
        if byte & 0b1100_0000 != 0b1000_0000 {
            // Found the leading byte of the last character.
            let width = match byte {
                0x00..=0x7f => 1,
                0xc0..=0xdf => 2,
                0xe0..=0xef => 3,
                0xf0..=0xf7 => 4,
                // Invalid leading byte: let lossy decoding replace it.
                _ => 1,
            };
            return if width > back { back } else { 0 };
        }
    }
    0
}
