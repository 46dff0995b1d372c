use crate::error::ParseError;

/// One (address, payload) pair emitted by a record parser.
///
/// Records are transient: they are produced lazily by a reader and consumed
/// by the coalescer within a single conversion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub offset: u32,
    pub data: Vec<u8>,
}

impl Record {
    pub fn new(offset: u32, data: Vec<u8>) -> Self {
        Self { offset, data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Decode a run of hex digits into raw bytes.
pub(crate) fn decode_hex(hex_str: &str, line: usize, record: &str) -> Result<Vec<u8>, ParseError> {
    let bytes = hex_str.as_bytes();
    if !bytes.len().is_multiple_of(2) {
        return Err(ParseError::LengthMismatch {
            line,
            record: record.to_string(),
        });
    }

    let mut out = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        let high = hex_digit(pair[0], line)?;
        let low = hex_digit(pair[1], line)?;
        out.push((high << 4) | low);
    }

    Ok(out)
}

fn hex_digit(b: u8, line: usize) -> Result<u8, ParseError> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        _ => Err(ParseError::InvalidHexDigit {
            line,
            char: b as char,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("00FFa5", 1, "").unwrap(), vec![0x00, 0xFF, 0xA5]);
        assert_eq!(decode_hex("", 1, "").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_decode_hex_odd_length() {
        let result = decode_hex("ABC", 3, ":ABC");
        assert!(matches!(
            result,
            Err(ParseError::LengthMismatch { line: 3, .. })
        ));
    }

    #[test]
    fn test_decode_hex_bad_digit() {
        let result = decode_hex("G0", 7, "");
        assert!(matches!(
            result,
            Err(ParseError::InvalidHexDigit { line: 7, char: 'G' })
        ));
    }
}
