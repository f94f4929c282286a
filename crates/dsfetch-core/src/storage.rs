//! Download file lifecycle.
//!
//! Bodies are streamed into `<name>.part` and renamed to the final name only
//! after the transfer succeeds. The final name therefore exists only for
//! complete downloads, which is what the skip-if-exists check relies on.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Returns the temp path for a final path: `final_path` + `.part`.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Sequential writer for an in-flight download.
pub struct PartFile {
    writer: BufWriter<File>,
    temp_path: PathBuf,
    written: u64,
}

impl PartFile {
    /// Create (or truncate) the temp file for `final_path`.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::create(&temp_path)?;
        Ok(Self {
            writer: BufWriter::with_capacity(256 * 1024, file),
            temp_path,
            written: 0,
        })
    }

    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush and rename to `final_path`. On failure the temp file is removed.
    pub fn finalize(self, final_path: &Path) -> io::Result<u64> {
        let PartFile {
            writer,
            temp_path,
            written,
        } = self;
        let result = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|file| file.sync_all())
            .and_then(|()| std::fs::rename(&temp_path, final_path));
        if let Err(e) = result {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }
        Ok(written)
    }

    /// Drop the partial download.
    pub fn discard(self) {
        let temp_path = self.temp_path.clone();
        drop(self.writer);
        if let Err(e) = std::fs::remove_file(&temp_path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %temp_path.display(), "could not remove partial download: {}", e);
            }
        }
    }
}
