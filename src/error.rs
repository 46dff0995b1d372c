use std::path::PathBuf;

use thiserror::Error;

/// Record-level failure while decoding an Intel HEX or S-record file.
///
/// Variants that point at a specific line carry the 1-indexed line number
/// and the raw line text so the offending record can be found in the input.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("checksum mismatch at line {line}: {record}")]
    ChecksumMismatch { line: usize, record: String },

    #[error("unexpected record length at line {line}: {record}")]
    LengthMismatch { line: usize, record: String },

    #[error("invalid record count {actual} at line {line}, expected {expected}: {record}")]
    CountMismatch {
        line: usize,
        expected: u32,
        actual: u32,
        record: String,
    },

    #[error("unexpected address field at line {line}: {message}: {record}")]
    UnexpectedAddress {
        line: usize,
        message: String,
        record: String,
    },

    #[error("invalid hex digit '{char}' at line {line}")]
    InvalidHexDigit { line: usize, char: char },

    #[error("unsupported record type {record_type:02X} at line {line}: {record}")]
    UnsupportedRecordType {
        line: usize,
        record_type: u8,
        record: String,
    },

    #[error("address overflow at line {line}: {record}")]
    AddressOverflow { line: usize, record: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(
        "chunk at {chunk_base:#010X} precedes base address {base:#010X}: seek position would be negative"
    )]
    NegativeSeek { chunk_base: u32, base: u32 },

    #[error("cannot guess file type of {}: most common leading characters: {chars}", path.display())]
    UnknownFileType { path: PathBuf, chars: String },

    #[error("file type '{0}' not supported, must be one of: auto, ihex, srec")]
    UnsupportedFileType(String),
}
