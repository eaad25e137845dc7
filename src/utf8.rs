//! Incremental UTF-8 decoding for chunked byte streams.
//!
//! Network reads split multi-byte sequences at arbitrary points. The decoder
//! holds back an incomplete trailing sequence until the next chunk completes
//! it, and replaces genuinely invalid bytes with U+FFFD.

/// Longest possible UTF-8 sequence.
const MAX_SEQUENCE_LEN: usize = 4;

#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, prefixed by any bytes carried over from the previous call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes.
                            self.pending.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }

        debug_assert!(self.pending.len() < MAX_SEQUENCE_LEN);
        out
    }

    /// Number of bytes held back waiting for the rest of a sequence.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop any held-back bytes.
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
