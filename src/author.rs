//! Defines the author [`Registry`], loaded from the site's authors file, and
//! the [`AuthorSummary`] records written to `authors.json`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// The key under which an author's post count is written.
const POST_COUNT: &str = "postCount";

/// An entry in the authors file. Only `name` is interpreted; every other
/// field is carried through to the output in its original order.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Author {
    pub name: String,

    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

/// The set of known authors. Every post's `author` must name exactly one
/// entry.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    authors: Vec<Author>,
}

impl Registry {
    /// Builds a registry from a list of authors, rejecting duplicate names.
    pub fn new(authors: Vec<Author>) -> Result<Registry> {
        let mut names = HashSet::with_capacity(authors.len());
        for author in &authors {
            if !names.insert(author.name.as_str()) {
                return Err(Error::DuplicateAuthor(author.name.clone()));
            }
        }
        Ok(Registry { authors })
    }

    /// Reads a registry from a JSON array of author objects.
    pub fn from_reader<R: Read>(r: R) -> Result<Registry> {
        Registry::new(serde_json::from_reader(r)?)
    }

    /// Reads a registry from the JSON file at `path`.
    pub fn load(path: &Path) -> Result<Registry> {
        let annotate =
            |err: Error| Error::Annotated(path.to_owned(), Box::new(err));
        let file = File::open(path).map_err(|e| annotate(Error::Io(e)))?;
        Registry::from_reader(BufReader::new(file)).map_err(annotate)
    }

    /// Looks up an author by exact name.
    pub fn find(&self, name: &str) -> Option<&Author> {
        self.authors.iter().find(|author| author.name == name)
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}

/// A registry entry together with the number of posts attributed to it.
/// The registry itself is never modified; summaries are new values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuthorSummary {
    #[serde(flatten)]
    pub author: Author,

    #[serde(rename = "postCount")]
    pub post_count: usize,
}

impl AuthorSummary {
    /// Copies `author`, replacing any `postCount` it already carried.
    pub fn new(author: &Author, post_count: usize) -> AuthorSummary {
        let author = Author {
            name: author.name.clone(),
            profile: author
                .profile
                .iter()
                .filter(|(key, _)| key.as_str() != POST_COUNT)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        };
        AuthorSummary { author, post_count }
    }
}

/// The result of a fallible [`Registry`] operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the author [`Registry`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the authors file can't be read.
    Io(std::io::Error),

    /// Returned when the authors file isn't a JSON array of author objects.
    DeserializeJson(serde_json::Error),

    /// Returned when two entries share a name.
    DuplicateAuthor(String),

    /// An error annotated with the authors file path.
    Annotated(PathBuf, Box<Error>),
}

impl Error {
    /// Returns `true` if the authors file was read but its contents are
    /// unusable.
    pub fn is_validation(&self) -> bool {
        match self {
            Error::Io(_) => false,
            Error::DeserializeJson(_) | Error::DuplicateAuthor(_) => true,
            Error::Annotated(_, err) => err.is_validation(),
        }
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "{}", err),
            Error::DeserializeJson(err) => write!(f, "{}", err),
            Error::DuplicateAuthor(name) => {
                write!(f, "author `{}` is listed more than once", name)
            }
            Error::Annotated(path, err) => {
                write!(f, "loading authors file `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::DeserializeJson(err) => Some(err),
            Error::DuplicateAuthor(_) => None,
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::DeserializeJson(err)
    }
}
