//! Exports the [`build_blog`] function which stitches together the high-level
//! steps of a build: discovering and parsing the posts ([`crate::parser`]),
//! aggregating them against the author registry ([`crate::aggregate`]), and
//! writing the listings ([`crate::write`]).

use crate::aggregate::{Aggregator, Error as AggregateError};
use crate::author::{Error as RegistryError, Registry};
use crate::config::Config;
use crate::date::{DateFormat, Error as DateFormatError};
use crate::parser::{self, Error as ParseError, Parser as PostParser};
use crate::write::{Error as WriteError, Writer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// What a successful build produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildReport {
    /// The number of post files parsed.
    pub parsed: usize,

    /// The number of posts written to `posts.json` (drafts excluded outside
    /// development builds).
    pub posts: usize,

    pub tags: usize,
    pub authors: usize,

    /// The directory the listings were written to.
    pub directory: PathBuf,
}

/// Builds the listings from a [`Config`], reading every `*.md` file in
/// [`Config::posts_directory`].
pub fn build_blog(config: &Config) -> Result<BuildReport> {
    let paths = parser::discover(&config.posts_directory)?;
    info!(
        count = paths.len(),
        directory = %config.posts_directory.display(),
        "discovered posts"
    );
    build_from_paths(config, &paths)
}

/// Builds the listings from an explicit list of post files, ignoring
/// [`Config::posts_directory`]. Nothing is written unless every post parses
/// and every author resolves.
pub fn build_from_paths<P: AsRef<Path> + Sync>(
    config: &Config,
    paths: &[P],
) -> Result<BuildReport> {
    let date_format = DateFormat::new(&config.date_format)?;

    let posts =
        PostParser::new(&date_format, config.threads).parse_posts(paths)?;
    info!(count = posts.len(), "parsed posts");

    let registry = Registry::load(&config.authors_file)?;
    let outputs = Aggregator::new(config.mode, &registry).aggregate(&posts)?;

    let writer = Writer {
        output_directory: &config.output_directory,
    };
    writer.write_outputs(&outputs)?;

    let report = BuildReport {
        parsed: posts.len(),
        posts: outputs.posts.len(),
        tags: outputs.tags.len(),
        authors: outputs.authors.len(),
        directory: writer.blog_directory(),
    };
    info!(
        posts = report.posts,
        tags = report.tags,
        authors = report.authors,
        directory = %report.directory.display(),
        "wrote listings"
    );
    Ok(report)
}

/// The result of a fallible build.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for a build. Errors can come from the date format, parsing,
/// loading the registry, aggregating, or writing.
#[derive(Debug)]
pub enum Error {
    /// Returned when the configured date format is invalid.
    DateFormat(DateFormatError),

    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for errors loading the author registry.
    Registry(RegistryError),

    /// Returned when a post references an unknown author.
    Aggregate(AggregateError),

    /// Returned for errors writing the listings.
    Write(WriteError),
}

impl Error {
    /// Returns `true` for problems with the site's content or configuration
    /// (as opposed to failures reading or writing files).
    pub fn is_validation(&self) -> bool {
        match self {
            Error::DateFormat(_) | Error::Aggregate(_) => true,
            Error::Parse(err) => err.is_validation(),
            Error::Registry(err) => err.is_validation(),
            Error::Write(_) => false,
        }
    }
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DateFormat(err) => {
                write!(f, "Invalid configuration: {}", err)
            }
            Error::Parse(err) => write!(f, "{}", err),
            Error::Registry(err) => write!(f, "{}", err),
            Error::Aggregate(err) => write!(f, "{}", err),
            Error::Write(err) => write!(f, "Writing listings: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DateFormat(err) => Some(err),
            Error::Parse(err) => Some(err),
            Error::Registry(err) => Some(err),
            Error::Aggregate(err) => Some(err),
            Error::Write(err) => Some(err),
        }
    }
}

impl From<DateFormatError> for Error {
    /// Converts [`DateFormatError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: DateFormatError) -> Error {
        Error::DateFormat(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<RegistryError> for Error {
    /// Converts [`RegistryError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: RegistryError) -> Error {
        Error::Registry(err)
    }
}

impl From<AggregateError> for Error {
    /// Converts [`AggregateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: AggregateError) -> Error {
        Error::Aggregate(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aggregate::Mode;
    use crate::write::{AUTHORS_FILE, POSTS_FILE, TAGS_FILE};
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    fn config(posts_directory: &str, output: &Path, mode: Mode) -> Config {
        Config {
            posts_directory: PathBuf::from(posts_directory),
            authors_file: PathBuf::from("./testdata/blog/data/authors.json"),
            output_directory: output.to_owned(),
            date_format: String::from("MM-DD-YYYY"),
            mode,
            threads: 1,
        }
    }

    const BLOG: &str = "./testdata/blog";

    fn read_json(path: &Path) -> Value {
        serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
    }

    fn read_listings(dir: &Path) -> Vec<Vec<u8>> {
        [POSTS_FILE, TAGS_FILE, AUTHORS_FILE]
            .iter()
            .map(|name| fs::read(dir.join(name)).unwrap())
            .collect()
    }

    #[test]
    fn test_build_blog() -> Result<()> {
        let output = TempDir::new().unwrap();
        let report =
            build_blog(&config(BLOG, output.path(), Mode::Production))?;
        assert_eq!(
            BuildReport {
                parsed: 3,
                posts: 2,
                tags: 2,
                authors: 2,
                directory: output.path().join("api/blog"),
            },
            report
        );

        let posts = read_json(&report.directory.join(POSTS_FILE));
        let slugs: Vec<&str> = posts
            .as_array()
            .unwrap()
            .iter()
            .map(|post| post["slug"].as_str().unwrap())
            .collect();
        assert_eq!(vec!["bob-notes", "go-ops"], slugs);
        assert_eq!("2021-04-16", posts[1]["attributes"]["date"]);
        assert_eq!("", posts[0]["attributes"]["tags"]);

        assert_eq!(
            json!([
                {"name": "go", "postCount": 1},
                {"name": "ops", "postCount": 1},
            ]),
            read_json(&report.directory.join(TAGS_FILE))
        );
        assert_eq!(
            json!([
                {"name": "Bob", "bio": "Keeps notes.", "postCount": 1},
                {
                    "name": "Alice",
                    "twitter": "@alice",
                    "bio": "Writes about Go and operations.",
                    "postCount": 1
                },
            ]),
            read_json(&report.directory.join(AUTHORS_FILE))
        );
        Ok(())
    }

    #[test]
    fn test_build_blog_development() -> Result<()> {
        let output = TempDir::new().unwrap();
        let mut config = config(BLOG, output.path(), Mode::Development);
        config.threads = 3;
        let report = build_blog(&config)?;
        assert_eq!(3, report.posts);
        assert_eq!(
            json!([
                {"name": "go", "postCount": 2},
                {"name": "ops", "postCount": 1},
            ]),
            read_json(&report.directory.join(TAGS_FILE))
        );
        Ok(())
    }

    #[test]
    fn test_build_blog_is_idempotent() -> Result<()> {
        let output = TempDir::new().unwrap();
        let config = config(BLOG, output.path(), Mode::Production);
        let dir = build_blog(&config)?.directory;
        let first = read_listings(&dir);

        build_blog(&config)?;
        assert_eq!(first, read_listings(&dir));
        Ok(())
    }

    #[test]
    fn test_failed_build_keeps_previous_output() -> Result<()> {
        let output = TempDir::new().unwrap();
        let mut config = config(BLOG, output.path(), Mode::Production);
        let dir = build_blog(&config)?.directory;
        let first = read_listings(&dir);

        config.posts_directory = PathBuf::from("./testdata/orphaned");
        let err = build_blog(&config).unwrap_err();
        assert!(matches!(err, Error::Aggregate(_)));

        assert_eq!(first, read_listings(&dir));
        assert_eq!(3, fs::read_dir(&dir).unwrap().count());
        Ok(())
    }

    #[test]
    fn test_unknown_author_writes_nothing() {
        let output = TempDir::new().unwrap();
        let config =
            config("./testdata/orphaned", output.path(), Mode::Production);
        let err = build_blog(&config).unwrap_err();

        assert!(matches!(err, Error::Aggregate(_)));
        assert!(err.is_validation());
        assert!(err.to_string().contains("Carol"));
        assert!(!output.path().join("api").exists());
    }

    #[test]
    fn test_invalid_date_format() {
        let output = TempDir::new().unwrap();
        let mut config = config(BLOG, output.path(), Mode::Production);
        config.date_format = String::from("MM-DD-YYYY hh");

        let err = build_blog(&config).unwrap_err();
        assert!(matches!(err, Error::DateFormat(_)));
        assert!(err.is_validation());
        assert!(!output.path().join("api").exists());
    }

    #[test]
    fn test_build_from_paths() -> Result<()> {
        let output = TempDir::new().unwrap();
        let config =
            config("./does-not-exist", output.path(), Mode::Production);
        let report =
            build_from_paths(&config, &["./testdata/blog/go-ops.md"])?;
        assert_eq!(1, report.posts);
        assert_eq!(1, report.authors);
        Ok(())
    }

    #[test]
    fn test_missing_registry() {
        let output = TempDir::new().unwrap();
        let mut config = config(BLOG, output.path(), Mode::Production);
        config.authors_file =
            PathBuf::from("./testdata/blog/data/missing.json");

        let err = build_blog(&config).unwrap_err();
        assert!(matches!(err, Error::Registry(_)));
        assert!(!err.is_validation());
    }
}
