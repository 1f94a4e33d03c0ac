//! Dictionary input: plain or bzip2-compressed text, read line by line.

use crate::error::Result;
use bzip2::read::BzDecoder;
use log::info;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

const READ_BUFFER: usize = 256 * 1024;

/// Open `path` for reading; `.bz2` files are decompressed on the fly
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    info!("Reading dictionary text from {}", path.display());
    let reader: Box<dyn BufRead + Send> = if path.to_string_lossy().ends_with(".bz2") {
        Box::new(BufReader::with_capacity(READ_BUFFER, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(READ_BUFFER, file))
    };
    Ok(reader)
}

/// Lines of a reader, lossily decoded and NFC-normalized, terminator removed.
///
/// A read error ends the iteration; it is kept and reported by `finish`.
pub struct DictLines<R> {
    reader: R,
    buf: Vec<u8>,
    error: Option<io::Error>,
}

impl<R: BufRead> DictLines<R> {
    pub fn new(reader: R) -> Self {
        DictLines {
            reader,
            buf: Vec::with_capacity(1024),
            error: None,
        }
    }

    /// Report the read error that ended iteration, if any
    pub fn finish(self) -> Result<()> {
        match self.error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl<R: BufRead> Iterator for DictLines<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.error.is_some() {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                let line = String::from_utf8_lossy(&self.buf);
                let line = line.trim_end_matches(|c| c == '\n' || c == '\r');
                Some(line.nfc().collect())
            }
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }
}
