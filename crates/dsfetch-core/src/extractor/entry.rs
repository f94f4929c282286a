//! Extraction of one archive member.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ExtractEntryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    File(PathBuf),
    Directory(PathBuf),
}

/// Extracts member `index` under `dest_dir`, keeping its recorded relative
/// path. A file that fails mid-copy is removed so no truncated output stays
/// behind.
pub(super) fn extract_entry(
    archive: &mut zip::ZipArchive<File>,
    index: usize,
    dest_dir: &Path,
) -> Result<EntryOutcome, ExtractEntryError> {
    let mut member = archive
        .by_index(index)
        .map_err(|source| ExtractEntryError::Unreadable {
            entry: format!("#{}", index),
            source,
        })?;
    let entry = member.name().to_string();

    let relative = member
        .enclosed_name()
        .ok_or_else(|| ExtractEntryError::UnsafePath {
            entry: entry.clone(),
        })?;
    let out_path = dest_dir.join(relative);
    let io_err = |source: io::Error| ExtractEntryError::Io {
        entry: entry.clone(),
        source,
    };

    if member.is_dir() {
        fs::create_dir_all(&out_path).map_err(io_err)?;
        return Ok(EntryOutcome::Directory(out_path));
    }

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut out = File::create(&out_path).map_err(io_err)?;
    if let Err(e) = io::copy(&mut member, &mut out) {
        drop(out);
        let _ = fs::remove_file(&out_path);
        return Err(io_err(e));
    }
    Ok(EntryOutcome::File(out_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn escaping_member_is_refused_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("evil.zip");
        let mut writer = zip::ZipWriter::new(File::create(&archive_path).unwrap());
        writer
            .start_file("../escaped.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"x").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("out");
        let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let err = extract_entry(&mut archive, 0, &dest).unwrap_err();

        assert!(matches!(err, ExtractEntryError::UnsafePath { .. }), "{:?}", err);
        assert_eq!(err.entry(), "../escaped.txt");
        assert!(!dir.path().join("escaped.txt").exists());
    }

    #[test]
    fn unreadable_member_is_named_by_index() {
        let err = ExtractEntryError::Unreadable {
            entry: "#4".to_string(),
            source: zip::result::ZipError::FileNotFound,
        };
        assert_eq!(err.entry(), "#4");
        assert!(err.to_string().starts_with("entry #4 unreadable"));
    }
}
