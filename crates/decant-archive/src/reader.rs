use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// Forward-only reader over the entries of a staged archive file.
///
/// Entries come back in the archive's internal order, one at a time; each
/// entry's content stream is usable exactly once and must be dropped before
/// the next call. The sequence is not restartable - reading the archive
/// again requires reopening it.
pub struct ArchiveReader {
    archive: zip::ZipArchive<File>,
    next_index: usize,
}

/// One item inside an archive: its raw name, a directory flag, and a
/// one-shot content stream. Directory entries carry no content.
pub struct ArchiveEntry<R> {
    name: String,
    is_dir: bool,
    size: u64,
    content: R,
}

impl<R> std::fmt::Debug for ArchiveEntry<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("name", &self.name)
            .field("is_dir", &self.is_dir)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl<R> ArchiveEntry<R> {
    /// Raw entry name decoded from its stored bytes as UTF-8 (lossy).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Uncompressed size declared by the archive directory.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Consume the entry, yielding its content stream.
    pub fn into_content(self) -> R {
        self.content
    }
}

impl ArchiveReader {
    /// Open a staged archive file.
    ///
    /// The archive directory is located by scanning backwards from the end
    /// of the file, so data prepended before the first entry record is
    /// tolerated. A file that holds no parseable archive at all fails here.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let archive = zip::ZipArchive::new(file).map_err(Error::Open)?;
        Ok(Self {
            archive,
            next_index: 0,
        })
    }

    /// Number of entries the archive directory declares.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Advance to the next entry, or `None` once the sequence is exhausted.
    ///
    /// A corrupted entry record fails the call and ends the iteration; there
    /// is no skip-and-continue.
    pub fn next_entry(&mut self) -> Result<Option<ArchiveEntry<impl Read + '_>>> {
        if self.next_index >= self.archive.len() {
            return Ok(None);
        }
        let index = self.next_index;
        self.next_index += 1;
        let archive_len = self.archive.len();

        let file = match self.archive.by_index(index) {
            Ok(file) => file,
            Err(source) => {
                // A corrupted entry ends the sequence; no skip-and-continue.
                self.next_index = archive_len;
                return Err(Error::Entry { index, source });
            }
        };
        let name = String::from_utf8_lossy(file.name_raw()).into_owned();
        let is_dir = file.is_dir();
        let size = file.size();

        Ok(Some(ArchiveEntry {
            name,
            is_dir,
            size,
            content: file,
        }))
    }
}
