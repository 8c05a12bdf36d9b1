//! Fixed-width character chunking.
//!
//! Boundaries fall every `max_chunk_size` characters (Unicode scalar values),
//! so concatenating the chunks in order always gives back the input.

use crate::types::Chunk;

pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1000;

/// Split `text` into consecutive slices of at most `max_chunk_size` characters.
///
/// Empty input yields no chunks. A `max_chunk_size` of zero is treated as one.
pub fn chunk(text: &str, max_chunk_size: usize) -> Vec<&str> {
    let max = max_chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;
    for (offset, _) in text.char_indices() {
        if count == max {
            chunks.push(&text[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Chunk a document into typed [`Chunk`]s with ids `"{doc_id}:{index}"`.
pub fn chunk_document(text: &str, doc_id: &str, max_chunk_size: usize) -> Vec<Chunk> {
    chunk(text, max_chunk_size)
        .into_iter()
        .enumerate()
        .map(|(sequence_index, piece)| Chunk {
            id: format!("{}:{}", doc_id, sequence_index),
            text: piece.to_string(),
            source_document_id: doc_id.to_string(),
            sequence_index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multibyte_boundaries_stay_on_char_edges() {
        let text = "héllo wörld ☃☃☃";
        let pieces = chunk(text, 4);
        assert_eq!(pieces.concat(), text);
        assert!(pieces.iter().all(|p| p.chars().count() <= 4));
        assert_eq!(pieces.len(), text.chars().count().div_ceil(4));
    }

    #[test]
    fn zero_size_behaves_like_one() {
        assert_eq!(chunk("abc", 0), vec!["a", "b", "c"]);
    }
}
