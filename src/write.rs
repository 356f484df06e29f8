//! Writes aggregated [`Outputs`] to disk as `posts.json`, `tags.json`, and
//! `authors.json`.

use crate::aggregate::Outputs;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, PersistError};
use tracing::debug;

/// The file names of the three listings, in the order they're written.
pub const POSTS_FILE: &str = "posts.json";
pub const TAGS_FILE: &str = "tags.json";
pub const AUTHORS_FILE: &str = "authors.json";

/// Responsible for serializing [`Outputs`] and writing them to disk.
pub struct Writer<'a> {
    /// The root output directory. The listings are written to
    /// `{output_directory}/api/blog/`.
    pub output_directory: &'a Path,
}

impl Writer<'_> {
    /// The directory that receives the three JSON files.
    pub fn blog_directory(&self) -> PathBuf {
        self.output_directory.join("api").join("blog")
    }

    /// Serializes all three listings, stages each one in a temporary file next
    /// to its destination, and only then moves the staged files into place.
    /// A serialization or staging failure leaves any previous output alone.
    pub fn write_outputs(&self, outputs: &Outputs) -> Result<()> {
        let documents = [
            (POSTS_FILE, to_json(&outputs.posts)?),
            (TAGS_FILE, to_json(&outputs.tags)?),
            (AUTHORS_FILE, to_json(&outputs.authors)?),
        ];

        let dir = self.blog_directory();
        fs::create_dir_all(&dir)?;

        let mut staged = Vec::with_capacity(documents.len());
        for (file_name, contents) in &documents {
            staged.push((stage(&dir, contents)?, dir.join(file_name)));
        }

        for (file, path) in staged {
            file.persist(&path)?;
            debug!(path = %path.display(), "wrote listing");
        }
        Ok(())
    }
}

fn stage(dir: &Path, contents: &[u8]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.flush()?;

    // Temporary files are created owner-only; the listings are public.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    Ok(file)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// The result of a fallible write operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing the listings.
#[derive(Debug)]
pub enum Error {
    /// Returned when a listing can't be serialized.
    Serialize(serde_json::Error),

    /// Returned when a staged file can't be moved into place.
    Persist(PersistError),

    /// Returned for other I/O errors.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Serialize(err)
    }
}

impl From<PersistError> for Error {
    fn from(err: PersistError) -> Error {
        Error::Persist(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Serialize(err) => write!(f, "{}", err),
            Error::Persist(err) => write!(f, "{}", err),
            Error::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Serialize(err) => Some(err),
            Error::Persist(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}
