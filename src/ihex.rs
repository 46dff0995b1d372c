use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use tracing::debug;

use crate::error::ParseError;
use crate::record::{Record, decode_hex};

/// Intel HEX record type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IhexCode {
    Data = 0,
    Eof = 1,
    ExtSegmentAddr = 2,
    StartSegmentAddr = 3,
    ExtLinearAddr = 4,
    StartLinearAddr = 5,
}

impl TryFrom<u8> for IhexCode {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        match code {
            0 => Ok(Self::Data),
            1 => Ok(Self::Eof),
            2 => Ok(Self::ExtSegmentAddr),
            3 => Ok(Self::StartSegmentAddr),
            4 => Ok(Self::ExtLinearAddr),
            5 => Ok(Self::StartLinearAddr),
            other => Err(other),
        }
    }
}

/// Lazy Intel HEX reader.
///
/// Yields one `(offset, data)` record per data line, pulling a single line
/// from the underlying reader at a time. Extended segment/linear address
/// records update an internal base offset that is added to every subsequent
/// data record address; start address records are logged and skipped. Lines
/// that do not begin with ':' are treated as comments.
///
/// The sequence is single-pass and ends at the first EOF record, the first
/// error, or the end of the input, whichever comes first.
pub struct IhexReader<R> {
    lines: Lines<R>,
    line_num: usize,
    base: u32,
    done: bool,
}

impl IhexReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> IhexReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
            base: 0,
            done: false,
        }
    }

    fn parse_line(&mut self, line: &str) -> Result<Option<Record>, ParseError> {
        let bytes = decode_hex(&line[1..], self.line_num, line)?;

        let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        if sum != 0 {
            return Err(ParseError::ChecksumMismatch {
                line: self.line_num,
                record: line.to_string(),
            });
        }

        if bytes.len() < 5 {
            return Err(ParseError::LengthMismatch {
                line: self.line_num,
                record: line.to_string(),
            });
        }

        let size = bytes[0] as usize;
        let address = u16::from_be_bytes([bytes[1], bytes[2]]) as u32;
        let code = bytes[3];

        // 4 header bytes plus the trailing checksum
        if bytes.len() != size + 5 {
            return Err(ParseError::LengthMismatch {
                line: self.line_num,
                record: line.to_string(),
            });
        }

        let data = &bytes[4..4 + size];
        let code =
            IhexCode::try_from(code).map_err(|record_type| ParseError::UnsupportedRecordType {
                line: self.line_num,
                record_type,
                record: line.to_string(),
            })?;

        match code {
            IhexCode::Data => {
                let offset = self.base.checked_add(address).ok_or_else(|| {
                    ParseError::AddressOverflow {
                        line: self.line_num,
                        record: line.to_string(),
                    }
                })?;
                if size > 0 {
                    offset
                        .checked_add(size as u32 - 1)
                        .ok_or_else(|| ParseError::AddressOverflow {
                            line: self.line_num,
                            record: line.to_string(),
                        })?;
                }
                Ok(Some(Record::new(offset, data.to_vec())))
            }
            IhexCode::Eof => {
                debug!("EOF record");
                self.done = true;
                Ok(None)
            }
            IhexCode::ExtSegmentAddr => {
                self.require_size(size, 2, "extended segment address", line)?;
                let segment = u16::from_be_bytes([data[0], data[1]]) as u32;
                self.base = segment * 16;
                debug!("extended segment address: {segment:#06X} -> {:#010X}", self.base);
                Ok(None)
            }
            IhexCode::StartSegmentAddr => {
                self.require_size(size, 4, "start segment address", line)?;
                let cs = u16::from_be_bytes([data[0], data[1]]) as u32;
                let ip = u16::from_be_bytes([data[2], data[3]]) as u32;
                let entry = cs * 16 + ip;
                debug!("start segment address: {cs:#06X}, {ip:#06X} -> {entry:#010X}");
                Ok(None)
            }
            IhexCode::ExtLinearAddr => {
                self.require_size(size, 2, "extended linear address", line)?;
                let upper = u16::from_be_bytes([data[0], data[1]]) as u32;
                self.base = upper << 16;
                debug!("extended linear address: {upper:#06X} -> {:#010X}", self.base);
                Ok(None)
            }
            IhexCode::StartLinearAddr => {
                self.require_size(size, 4, "start linear address", line)?;
                let entry = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
                debug!("start linear address: {entry:#010X}");
                Ok(None)
            }
        }
    }

    fn require_size(
        &self,
        size: usize,
        expected: usize,
        what: &str,
        line: &str,
    ) -> Result<(), ParseError> {
        if size != expected {
            return Err(ParseError::UnexpectedAddress {
                line: self.line_num,
                message: format!("{what} must carry {expected} data bytes, got {size}"),
                record: line.to_string(),
            });
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for IhexReader<R> {
    type Item = Result<Record, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(ParseError::Io(e)));
                }
            };
            self.line_num += 1;
            let line = line.trim();

            // Lines that don't start with ':' are comments
            if !line.starts_with(':') {
                continue;
            }

            match self.parse_line(line) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
