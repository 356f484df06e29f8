//! Defines the [`Parser`] and [`Error`] types. Also defines the logic for
//! reading post source files from the file system into [`Post`] records.

use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use serde::{Deserialize, Deserializer};
use tracing::debug;
use walkdir::WalkDir;

use crate::{
    date::DateFormat,
    markdown,
    post::{Attributes, Post},
};

const MARKDOWN_EXTENSION: &str = "md";

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// `date_format` is the pattern every post's `date` attribute must
    /// match.
    date_format: &'a DateFormat,

    /// `threads` is the number of worker threads used by
    /// [`Parser::parse_posts`]. Fewer than two parses on the calling thread.
    threads: usize,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(date_format: &'a DateFormat, threads: usize) -> Parser<'a> {
        Parser {
            date_format,
            threads,
        }
    }

    /// Parses every file in `paths` into a [`Post`]. The returned posts are in
    /// the same order as `paths`, even when they're parsed in parallel. Each
    /// post source file must be structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `title`, `date`, `author`, and
    ///    optionally `tags` and `published`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 04-16-2021
    /// author: Alice
    /// tags: greet, misc
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    ///
    /// Fails on the first post that can't be parsed, or if two paths share
    /// the same slug.
    pub fn parse_posts<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
    ) -> Result<Vec<Post>> {
        let posts = if self.threads < 2 {
            paths
                .iter()
                .map(|path| self.parse_post(path.as_ref()))
                .collect::<Result<Vec<Post>>>()?
        } else {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build()?
                .install(|| {
                    paths
                        .par_iter()
                        .map(|path| self.parse_post(path.as_ref()))
                        .collect::<Result<Vec<Post>>>()
                })?
        };

        check_unique_slugs(paths, &posts)?;
        Ok(posts)
    }

    /// Parses a single [`Post`] from a source file. The post's slug is the
    /// file name less its extension. Errors are annotated with the path.
    pub fn parse_post(&self, path: &Path) -> Result<Post> {
        match self._parse_post(path) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{}`", path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_post(&self, path: &Path) -> Result<Post> {
        let slug = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| InvalidFileNameError(path.to_owned()))?;
        let contents = fs::read_to_string(path)?;
        self.parse_str(slug, &contents)
    }

    /// Parses a single [`Post`] from its `slug` and the contents of its
    /// source file.
    pub fn parse_str(&self, slug: &str, input: &str) -> Result<Post> {
        let (yaml, body) = split_frontmatter(input)?;
        let frontmatter = if is_blank_yaml(yaml) {
            Frontmatter::default()
        } else {
            serde_yaml::from_str::<Option<Frontmatter>>(yaml)?
                .unwrap_or_default()
        };

        let title =
            frontmatter.title.ok_or(Error::MissingAttribute("title"))?;
        let raw_date =
            frontmatter.date.ok_or(Error::MissingAttribute("date"))?;
        let date = self.date_format.parse(&raw_date).map_err(|err| {
            Error::InvalidDate {
                value: raw_date.clone(),
                format: self.date_format.pattern().to_owned(),
                err,
            }
        })?;
        let author =
            frontmatter.author.ok_or(Error::MissingAttribute("author"))?;

        let mut content = String::new();
        markdown::to_html(&mut content, body);

        debug!(slug, title = %title, "parsed post");
        Ok(Post {
            slug: slug.to_owned(),
            attributes: Attributes {
                title,
                date,
                author,
                tags: frontmatter.tags.unwrap_or_default(),
                published: frontmatter.published.unwrap_or(true),
                extra: frontmatter.extra,
            },
            content,
        })
    }
}

/// Lists the markdown files (extension `.md`) directly inside
/// `source_directory`, sorted by file name. Subdirectories are not searched.
pub fn discover(source_directory: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for result in WalkDir::new(source_directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = result?;
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .map_or(false, |ext| ext == MARKDOWN_EXTENSION)
        {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

/// Splits a source file into its YAML frontmatter and its markdown body. The
/// frontmatter sits between an opening `---` line and the next line that
/// begins with `---`.
fn split_frontmatter(input: &str) -> Result<(&str, &str)> {
    const FENCE: &str = "---";
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }

    let rest = match input.find('\n') {
        Some(i) => &input[i + 1..],
        None => return Err(Error::FrontmatterMissingEndFence),
    };
    let yaml_stop = if rest.starts_with(FENCE) {
        0
    } else {
        match rest.find("\n---") {
            Some(i) => i + 1,
            None => return Err(Error::FrontmatterMissingEndFence),
        }
    };

    let after_fence = &rest[yaml_stop..];
    let body = match after_fence.find('\n') {
        Some(i) => &after_fence[i + 1..],
        None => "",
    };
    Ok((&rest[..yaml_stop], body))
}

/// Returns `true` if `yaml` holds nothing but whitespace and comments.
fn is_blank_yaml(yaml: &str) -> bool {
    yaml.lines()
        .map(str::trim_start)
        .all(|line| line.is_empty() || line.starts_with('#'))
}

fn check_unique_slugs<P: AsRef<Path>>(
    paths: &[P],
    posts: &[Post],
) -> Result<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::with_capacity(posts.len());
    for (path, post) in paths.iter().zip(posts) {
        if let Some(first) = seen.insert(&post.slug, path.as_ref()) {
            return Err(Error::DuplicateSlug {
                slug: post.slug.clone(),
                first: first.to_owned(),
                second: path.as_ref().to_owned(),
            });
        }
    }
    Ok(())
}

#[derive(Deserialize, Default)]
struct Frontmatter {
    /// The title of the post.
    title: Option<String>,

    /// The unparsed date of the post.
    date: Option<String>,

    /// The author's registry name.
    author: Option<String>,

    /// The tags associated with the post, as a comma-separated string.
    #[serde(default, deserialize_with = "deserialize_tags")]
    tags: Option<String>,

    published: Option<bool>,

    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// Tags are normally written as a single string (`tags: go, ops`), but a
/// YAML list is accepted as well and joined back into the string form.
fn deserialize_tags<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTags {
        Text(String),
        List(Vec<String>),
    }

    Ok(Option::<RawTags>::deserialize(deserializer)?.map(|tags| match tags {
        RawTags::Text(text) => text,
        RawTags::List(list) => list.join(", "),
    }))
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {
    /// Implements the [`std::error::Error`] trait for [`InvalidFileNameError`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a required frontmatter attribute is absent.
    MissingAttribute(&'static str),

    /// Returned when the `date` attribute doesn't match the configured
    /// format.
    InvalidDate {
        value: String,
        format: String,
        err: chrono::ParseError,
    },

    /// Returned when two source files produce the same slug.
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// Returned when the worker pool can't be started.
    ThreadPool(rayon::ThreadPoolBuildError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl Error {
    /// Returns `true` if the error is the fault of a post's contents rather
    /// than a failure to read it.
    pub fn is_validation(&self) -> bool {
        match self {
            Error::FrontmatterMissingStartFence
            | Error::FrontmatterMissingEndFence
            | Error::DeserializeYaml(_)
            | Error::MissingAttribute(_)
            | Error::InvalidDate { .. }
            | Error::DuplicateSlug { .. }
            | Error::InvalidFileName(_) => true,
            Error::Io(_) | Error::WalkDir(_) | Error::ThreadPool(_) => false,
            Error::Annotated(_, err) => err.is_validation(),
        }
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => write!(f, "{}", err),
            Error::MissingAttribute(name) => {
                write!(f, "missing required attribute `{}`", name)
            }
            Error::InvalidDate { value, format, err } => write!(
                f,
                "invalid date `{}` (expected format `{}`): {}",
                value, format, err
            ),
            Error::DuplicateSlug {
                slug,
                first,
                second,
            } => write!(
                f,
                "`{}` and `{}` both produce the post slug `{}`",
                first.display(),
                second.display(),
                slug
            ),
            Error::Io(err) => write!(f, "{}", err),
            Error::WalkDir(err) => write!(f, "{}", err),
            Error::InvalidFileName(err) => write!(f, "{}", err),
            Error::ThreadPool(err) => write!(f, "{}", err),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::MissingAttribute(_) => None,
            Error::InvalidDate { err, .. } => Some(err),
            Error::DuplicateSlug { .. } => None,
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::ThreadPool(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible directory walks.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Error {
        Error::ThreadPool(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
