use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::chunk::{Chunk, coalesce};
use crate::error::{Error, ParseError};
use crate::filetype::{FileType, guess_filetype};
use crate::ihex::IhexReader;
use crate::record::Record;
use crate::srec::SrecReader;

/// A lazily parsed record stream from either supported format.
pub enum RecordReader {
    Ihex(IhexReader<BufReader<File>>),
    Srec(SrecReader<BufReader<File>>),
}

impl Iterator for RecordReader {
    type Item = Result<Record, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RecordReader::Ihex(reader) => reader.next(),
            RecordReader::Srec(reader) => reader.next(),
        }
    }
}

/// Open `path` with the parser for `filetype`, sniffing the format first
/// when `Auto` is requested.
pub fn parse(path: impl AsRef<Path>, filetype: FileType) -> Result<RecordReader, Error> {
    let path = path.as_ref();
    let filetype = match filetype {
        FileType::Auto => guess_filetype(path)?,
        other => other,
    };

    Ok(match filetype {
        FileType::Ihex => RecordReader::Ihex(IhexReader::open(path)?),
        FileType::Srec => RecordReader::Srec(SrecReader::open(path)?),
        FileType::Auto => unreachable!(),
    })
}

/// Parse `path` and coalesce its records into sorted contiguous chunks.
pub fn convert(path: impl AsRef<Path>, filetype: FileType) -> Result<Vec<Chunk>, Error> {
    let records = parse(path, filetype)?;
    Ok(coalesce(records)?)
}

pub fn ihex2bin(path: impl AsRef<Path>) -> Result<Vec<Chunk>, Error> {
    convert(path, FileType::Ihex)
}

pub fn srec2bin(path: impl AsRef<Path>) -> Result<Vec<Chunk>, Error> {
    convert(path, FileType::Srec)
}
