use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::Error;

/// Input record format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FileType {
    /// Guess from the most frequent leading character.
    #[default]
    Auto,
    /// Intel HEX (':'-prefixed records).
    Ihex,
    /// Motorola S-record ('S'-prefixed records).
    Srec,
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "auto" => Ok(Self::Auto),
            "ihex" => Ok(Self::Ihex),
            "srec" => Ok(Self::Srec),
            other => Err(Error::UnsupportedFileType(other.to_string())),
        }
    }
}

/// Guess the record format of a file from its leading characters.
///
/// Counts the first character of every line: if ':' is the most frequent
/// the file is Intel HEX, if 'S' it is an S-record file. Anything else is
/// an error listing the observed characters by descending frequency. This
/// is a heuristic, not a verifier; actual record validation happens in the
/// parsers.
pub fn guess_filetype(path: impl AsRef<Path>) -> Result<FileType, Error> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let mut counts: HashMap<char, usize> = HashMap::new();
    for line in reader.lines() {
        if let Some(first) = line?.chars().next() {
            *counts.entry(first).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(char, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    match ranked.first() {
        Some((':', _)) => Ok(FileType::Ihex),
        Some(('S', _)) => Ok(FileType::Srec),
        _ => Err(Error::UnknownFileType {
            path: path.to_path_buf(),
            chars: ranked
                .iter()
                .map(|(c, _)| c.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let mut path = std::env::temp_dir();
        path.push(format!("txt2bin_sniff_{name}_{}_{id}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_guess_ihex() {
        let path = write_temp("ihex", ":00000001FF\n");
        assert_eq!(guess_filetype(&path).unwrap(), FileType::Ihex);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_guess_srec() {
        let path = write_temp("srec", "S9030000FC\nS9030000FC\n");
        assert_eq!(guess_filetype(&path).unwrap(), FileType::Srec);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_guess_with_minority_comments() {
        let path = write_temp(
            "mixed",
            "# comment\n:00000001FF\n:00000001FF\n:00000001FF\n",
        );
        assert_eq!(guess_filetype(&path).unwrap(), FileType::Ihex);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_guess_ambiguous_fails() {
        let path = write_temp("ambig", "# only\n# comments\n# here\n");
        let result = guess_filetype(&path);
        match result {
            Err(Error::UnknownFileType { chars, .. }) => assert!(chars.contains('#')),
            other => panic!("expected unknown file type, got {other:?}"),
        }
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_filetype_from_str() {
        assert_eq!("auto".parse::<FileType>().unwrap(), FileType::Auto);
        assert_eq!("ihex".parse::<FileType>().unwrap(), FileType::Ihex);
        assert_eq!("srec".parse::<FileType>().unwrap(), FileType::Srec);
        assert!(matches!(
            "elf".parse::<FileType>(),
            Err(Error::UnsupportedFileType(_))
        ));
    }
}
