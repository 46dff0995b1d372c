pub mod chunk;
pub mod convert;
pub mod error;
pub mod filetype;
pub mod ihex;
pub mod record;
pub mod srec;
pub mod writer;

pub use chunk::{Chunk, coalesce};
pub use convert::{RecordReader, convert, ihex2bin, parse, srec2bin};
pub use error::{Error, ParseError};
pub use filetype::{FileType, guess_filetype};
pub use ihex::{IhexCode, IhexReader};
pub use record::Record;
pub use srec::{SrecCode, SrecReader};
pub use writer::{merge_chunks, write_chunks};
