//! Local destinations for downloaded files.
//!
//! A download writes into a [`Sink`] and then either finishes it, which makes
//! the file appear at its final path, or abandons it, which removes whatever
//! was written.  A failed transfer therefore never leaves a truncated file
//! behind under a name that looks complete.
//!
//! [`FsStorage`] implements this with a `<name>.part` file that is renamed
//! over the destination once the transfer completes.  Re-running a download
//! replaces the previous copy in place.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StorageError;

/// Opens sinks for destination paths.
pub trait Storage: Send + Sync {
    fn create(&self, path: &Path) -> Result<Box<dyn Sink>, StorageError>;
}

/// An open, not yet committed destination.
pub trait Sink: Write + Send {
    /// Flush everything and publish the file at its destination.
    fn finish(self: Box<Self>) -> Result<(), StorageError>;

    /// Drop the partial data.
    fn abandon(self: Box<Self>);
}

/// Writes straight to the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn create(&self, path: &Path) -> Result<Box<dyn Sink>, StorageError> {
        let part = part_path(path);
        let file = File::create(&part).map_err(|source| StorageError::Create {
            path: part.clone(),
            source,
        })?;
        debug!(path = %part.display(), "opened sink");
        Ok(Box::new(FileSink {
            file,
            part,
            dest: path.to_path_buf(),
        }))
    }
}

/// The temporary name a download is written under.
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

struct FileSink {
    file: File,
    part: PathBuf,
    dest: PathBuf,
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Sink for FileSink {
    fn finish(self: Box<Self>) -> Result<(), StorageError> {
        let FileSink { file, part, dest } = *self;

        if let Err(source) = file.sync_all() {
            drop(file);
            remove_part(&part);
            return Err(StorageError::Finish { path: part, source });
        }
        drop(file);

        fs::rename(&part, &dest).map_err(|source| {
            remove_part(&part);
            StorageError::Finish { path: dest, source }
        })
    }

    fn abandon(self: Box<Self>) {
        let FileSink { file, part, .. } = *self;
        drop(file);
        remove_part(&part);
    }
}

fn remove_part(part: &Path) {
    if let Err(err) = fs::remove_file(part) {
        debug!(path = %part.display(), error = %err, "could not remove partial file");
    }
}
