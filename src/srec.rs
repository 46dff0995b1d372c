use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use tracing::debug;

use crate::error::ParseError;
use crate::record::{Record, decode_hex};

/// Motorola S-record subtype codes. Subtype 4 is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SrecCode {
    Header = 0,
    Data16 = 1,
    Data24 = 2,
    Data32 = 3,
    Count16 = 5,
    Count24 = 6,
    Start32 = 7,
    Start24 = 8,
    Start16 = 9,
}

impl TryFrom<u8> for SrecCode {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        match code {
            0 => Ok(Self::Header),
            1 => Ok(Self::Data16),
            2 => Ok(Self::Data24),
            3 => Ok(Self::Data32),
            5 => Ok(Self::Count16),
            6 => Ok(Self::Count24),
            7 => Ok(Self::Start32),
            8 => Ok(Self::Start24),
            9 => Ok(Self::Start16),
            other => Err(other),
        }
    }
}

impl SrecCode {
    /// Width in bytes of the address field following the count byte.
    fn addr_len(self) -> usize {
        match self {
            Self::Header | Self::Data16 | Self::Count16 | Self::Start16 => 2,
            Self::Data24 | Self::Count24 | Self::Start24 => 3,
            Self::Data32 | Self::Start32 => 4,
        }
    }
}

/// Lazy Motorola S-record reader.
///
/// Yields one `(offset, data)` record per S1/S2/S3 line. S0 headers and
/// S5/S6 count records are validated but never yielded; the first S7/S8/S9
/// start address record terminates the sequence (there is no dedicated EOF
/// subtype in this format). Lines that do not begin with 'S' are treated
/// as comments.
pub struct SrecReader<R> {
    lines: Lines<R>,
    line_num: usize,
    data_records: u32,
    done: bool,
}

impl SrecReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> SrecReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
            data_records: 0,
            done: false,
        }
    }

    fn parse_line(&mut self, line: &str) -> Result<Option<Record>, ParseError> {
        let digit = line.chars().nth(1).ok_or_else(|| ParseError::LengthMismatch {
            line: self.line_num,
            record: line.to_string(),
        })?;
        let code = digit
            .to_digit(10)
            .and_then(|d| SrecCode::try_from(d as u8).ok())
            .ok_or_else(|| ParseError::UnsupportedRecordType {
                line: self.line_num,
                record_type: digit as u8,
                record: line.to_string(),
            })?;

        let bytes = decode_hex(&line[2..], self.line_num, line)?;
        if bytes.is_empty() {
            return Err(ParseError::LengthMismatch {
                line: self.line_num,
                record: line.to_string(),
            });
        }

        // The checksum byte is the one's complement of the low byte of the
        // running sum, so a valid record sums to 0xFF.
        let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        if sum != 0xFF {
            return Err(ParseError::ChecksumMismatch {
                line: self.line_num,
                record: line.to_string(),
            });
        }

        // The count byte covers address, data and checksum, not itself.
        let count = bytes[0] as usize;
        if bytes.len() != count + 1 {
            return Err(ParseError::LengthMismatch {
                line: self.line_num,
                record: line.to_string(),
            });
        }

        let addr_len = code.addr_len();
        if bytes.len() < 1 + addr_len + 1 {
            return Err(ParseError::LengthMismatch {
                line: self.line_num,
                record: line.to_string(),
            });
        }

        let addr = bytes[1..1 + addr_len]
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | b as u32);
        let payload = &bytes[1 + addr_len..bytes.len() - 1];

        match code {
            SrecCode::Header => {
                if addr != 0 {
                    return Err(ParseError::UnexpectedAddress {
                        line: self.line_num,
                        message: format!("header address must be 0, got {addr:#06X}"),
                        record: line.to_string(),
                    });
                }
                debug!("header: {}", String::from_utf8_lossy(payload));
                Ok(None)
            }
            SrecCode::Data16 | SrecCode::Data24 | SrecCode::Data32 => {
                if !payload.is_empty() {
                    addr.checked_add(payload.len() as u32 - 1).ok_or_else(|| {
                        ParseError::AddressOverflow {
                            line: self.line_num,
                            record: line.to_string(),
                        }
                    })?;
                }
                self.data_records += 1;
                Ok(Some(Record::new(addr, payload.to_vec())))
            }
            SrecCode::Count16 | SrecCode::Count24 => {
                if addr != self.data_records {
                    return Err(ParseError::CountMismatch {
                        line: self.line_num,
                        expected: self.data_records,
                        actual: addr,
                        record: line.to_string(),
                    });
                }
                Ok(None)
            }
            SrecCode::Start32 => {
                debug!("entry point: {addr:#010X}");
                self.done = true;
                Ok(None)
            }
            SrecCode::Start24 => {
                debug!("entry point: {addr:#08X}");
                self.done = true;
                Ok(None)
            }
            SrecCode::Start16 => {
                debug!("entry point: {addr:#06X}");
                self.done = true;
                Ok(None)
            }
        }
    }
}

impl<R: BufRead> Iterator for SrecReader<R> {
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

            // Lines that don't start with 'S' are comments
            if !line.starts_with('S') {
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
