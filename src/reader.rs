//! Line readers with transparent gzip decompression.
//!
//! Pattern and input files may be gzip-compressed; compression is detected
//! by the `1f 8b` magic bytes, not the file name.

use crate::error::Result;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether the file starts with the gzip magic bytes.
pub fn is_gzip_file(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let n = file.read(&mut magic)?;
    Ok(n == 2 && magic == GZIP_MAGIC)
}

/// Open a file as a buffered line reader, decompressing gzip transparently.
pub fn open_lines(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let n = file.read(&mut magic)?;
    file.seek(SeekFrom::Start(0))?;

    if n == 2 && magic == GZIP_MAGIC {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read every line of a (possibly gzip-compressed) file into memory.
pub fn read_all_lines(path: &Path) -> Result<Vec<String>> {
    let reader = open_lines(path)?;
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn write_plain(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn write_gzip(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
        file
    }

    #[test]
    fn test_plain_file_lines() {
        let file = write_plain("one\ntwo\nthree\n");
        assert!(!is_gzip_file(file.path()).unwrap());

        let lines = read_all_lines(file.path()).unwrap();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_gzip_file_lines() {
        let file = write_gzip("one\ntwo\nthree\n");
        assert!(is_gzip_file(file.path()).unwrap());

        let lines = read_all_lines(file.path()).unwrap();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_empty_file() {
        let file = write_plain("");
        assert!(!is_gzip_file(file.path()).unwrap());
        assert!(read_all_lines(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(open_lines(Path::new("/nonexistent/patterns.txt")).is_err());
    }
}
