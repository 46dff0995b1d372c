use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::chunk::Chunk;
use crate::error::Error;

/// Write chunks into a freshly created (or truncated) output file.
///
/// Each chunk lands at file position `chunk.base - base`. Every seek
/// position is validated before the output is touched.
pub fn write_chunks(path: impl AsRef<Path>, chunks: &[Chunk], base: u32) -> Result<(), Error> {
    check_seek_positions(chunks, base)?;
    let mut file = File::create(path)?;
    write_into(&mut file, chunks, base)
}

/// Copy `existing` over `path`, then write chunks into the copy without
/// truncating it, so bytes the chunks don't cover survive from the
/// existing binary.
pub fn merge_chunks(
    path: impl AsRef<Path>,
    existing: impl AsRef<Path>,
    chunks: &[Chunk],
    base: u32,
) -> Result<(), Error> {
    check_seek_positions(chunks, base)?;
    fs::copy(existing, &path)?;
    let mut file = OpenOptions::new().write(true).open(path)?;
    write_into(&mut file, chunks, base)
}

fn check_seek_positions(chunks: &[Chunk], base: u32) -> Result<(), Error> {
    for chunk in chunks {
        if chunk.base < base {
            return Err(Error::NegativeSeek {
                chunk_base: chunk.base,
                base,
            });
        }
    }
    Ok(())
}

fn write_into<W: Write + Seek>(out: &mut W, chunks: &[Chunk], base: u32) -> Result<(), Error> {
    for chunk in chunks {
        if chunk.is_empty() {
            continue;
        }
        let pos = (chunk.base - base) as u64;
        debug!(
            "writing {} bytes from {:#010X} at file offset {pos:#X}",
            chunk.len(),
            chunk.base
        );
        out.seek(SeekFrom::Start(pos))?;
        out.write_all(&chunk.data)?;
    }
    Ok(())
}
