//! Incremental decoder for `chat.completion.chunk` server-sent events.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseItem {
    /// A non-empty piece of answer text.
    Delta(String),
    /// The `[DONE]` marker.
    Done,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Buffers raw bytes and yields items for every complete line.
/// Partial lines (including split UTF-8 sequences) wait for the next push.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseItem> {
        self.buffer.extend_from_slice(bytes);
        let mut items = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(item) = parse_line(line.trim_end_matches(['\n', '\r'])) {
                items.push(item);
            }
        }
        items
    }
}

fn parse_line(line: &str) -> Option<SseItem> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload == "[DONE]" {
        return Some(SseItem::Done);
    }
    match serde_json::from_str::<ChatCompletionChunk>(payload) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|s| !s.is_empty())
            .map(SseItem::Delta),
        Err(e) => {
            tracing::debug!(error = %e, "skipping unparseable stream line");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_split_lines() {
        let mut decoder = SseDecoder::new();
        let first = decoder.push(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel");
        assert!(first.is_empty());
        let rest = decoder.push(b"lo\"}}]}\n\ndata: {\"choices\":[{\"delta\":{}}]}\n\ndata: [DONE]\n\n");
        assert_eq!(rest, vec![SseItem::Delta("Hello".to_string()), SseItem::Done]);
    }

    #[test]
    fn ignores_comments_and_role_only_deltas() {
        let mut decoder = SseDecoder::new();
        let items = decoder.push(b": keep-alive\r\ndata: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\r\n");
        assert!(items.is_empty());
    }
}
