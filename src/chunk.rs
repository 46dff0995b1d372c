use std::collections::{BTreeMap, HashMap};

use crate::error::ParseError;
use crate::record::Record;

/// One contiguous region of the output image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub base: u32,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn new(base: u32, data: Vec<u8>) -> Self {
        Self { base, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Offset one past the last byte of this chunk.
    pub fn end(&self) -> u64 {
        self.base as u64 + self.data.len() as u64
    }
}

/// Merge parsed records into the minimal set of contiguous chunks.
///
/// A record is appended in place when it starts exactly where an existing
/// chunk ends; any other record opens a new chunk. Merging is forward-only:
/// a record whose end happens to abut an existing chunk's start stays
/// separate. Overlapping records are not reconciled; they end up in
/// separate chunks and the higher-based chunk's bytes win wherever the
/// written file ranges intersect.
///
/// Chunks are returned sorted ascending by base offset. Parser errors
/// propagate immediately and abandon the conversion.
pub fn coalesce<I>(records: I) -> Result<Vec<Chunk>, ParseError>
where
    I: IntoIterator<Item = Result<Record, ParseError>>,
{
    let mut chunks: BTreeMap<u32, Vec<u8>> = BTreeMap::new();
    // next expected offset -> base of the chunk ending there
    let mut tails: HashMap<u64, u32> = HashMap::new();

    for record in records {
        let record = record?;
        if record.is_empty() {
            continue;
        }
        let Record { offset, data } = record;

        if let Some(base) = tails.remove(&(offset as u64))
            && let Some(buf) = chunks.get_mut(&base)
        {
            buf.extend_from_slice(&data);
            tails.insert(base as u64 + buf.len() as u64, base);
            continue;
        }

        let end = offset as u64 + data.len() as u64;
        chunks.insert(offset, data);
        tails.insert(end, offset);
    }

    Ok(chunks
        .into_iter()
        .map(|(base, data)| Chunk::new(base, data))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(pairs: &[(u32, &[u8])]) -> Vec<Result<Record, ParseError>> {
        pairs
            .iter()
            .map(|&(offset, data)| Ok(Record::new(offset, data.to_vec())))
            .collect()
    }

    #[test]
    fn test_adjacent_records_merge() {
        let input = records(&[(0x0000, &[0x01; 16]), (0x0010, &[0x02; 16])]);
        let chunks = coalesce(input).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].base, 0x0000);
        assert_eq!(chunks[0].len(), 32);
        assert_eq!(chunks[0].data[15], 0x01);
        assert_eq!(chunks[0].data[16], 0x02);
    }

    #[test]
    fn test_gap_keeps_chunks_separate() {
        let input = records(&[(0x0000, &[0x01; 16]), (0x0020, &[0x02; 16])]);
        let chunks = coalesce(input).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].base, 0x0000);
        assert_eq!(chunks[1].base, 0x0020);
    }

    #[test]
    fn test_output_sorted_regardless_of_input_order() {
        let input = records(&[(0x2000, &[0x03]), (0x0000, &[0x01]), (0x1000, &[0x02])]);
        let chunks = coalesce(input).unwrap();
        let bases: Vec<u32> = chunks.iter().map(|c| c.base).collect();
        assert_eq!(bases, vec![0x0000, 0x1000, 0x2000]);
    }

    #[test]
    fn test_merge_is_forward_only() {
        // The second record ends exactly where the first begins; that
        // direction is never merged.
        let input = records(&[(0x0010, &[0x02; 16]), (0x0000, &[0x01; 16])]);
        let chunks = coalesce(input).unwrap();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_idempotent_on_coalesced_chunks() {
        let input = records(&[
            (0x0000, &[0x01; 8]),
            (0x0008, &[0x02; 8]),
            (0x0100, &[0x03; 4]),
        ]);
        let first = coalesce(input).unwrap();

        let replay: Vec<_> = first
            .iter()
            .map(|c| Ok(Record::new(c.base, c.data.clone())))
            .collect();
        let second = coalesce(replay).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_records_dropped() {
        let input = records(&[(0x0000, &[]), (0x0010, &[0xAA])]);
        let chunks = coalesce(input).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].base, 0x0010);
    }

    #[test]
    fn test_error_propagates() {
        let input = vec![
            Ok(Record::new(0, vec![0x01])),
            Err(ParseError::ChecksumMismatch {
                line: 2,
                record: ":bad".to_string(),
            }),
        ];
        assert!(coalesce(input).is_err());
    }

    #[test]
    fn test_chunk_at_top_of_address_space() {
        let input = records(&[(0xFFFF_FFF0, &[0xAA; 16])]);
        let chunks = coalesce(input).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].end(), 0x1_0000_0000);
    }
}
