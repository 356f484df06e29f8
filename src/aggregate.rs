//! Derives the three published listings from a set of parsed posts: the posts
//! themselves (minus drafts, outside of development builds), a tag list with
//! per-tag post counts, and an author list with per-author post counts.
//!
//! Every listing is ordered by first occurrence in the post list, so the
//! output is stable as long as the input order is.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::author::{AuthorSummary, Registry};
use crate::post::Post;
use crate::tag::TagSummary;

/// The kind of build being run. Only development builds include drafts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    /// Returns `true` if posts marked `published: false` should be kept.
    pub fn includes_drafts(self) -> bool {
        self == Mode::Development
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Production
    }
}

impl FromStr for Mode {
    type Err = std::convert::Infallible;

    /// `development` selects [`Mode::Development`]; any other environment
    /// name is treated as a production build.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "development" => Mode::Development,
            _ => Mode::Production,
        })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::Development => write!(f, "development"),
            Mode::Production => write!(f, "production"),
        }
    }
}

/// The listings written to `posts.json`, `tags.json`, and `authors.json`.
#[derive(Debug)]
pub struct Outputs<'a> {
    pub posts: Vec<&'a Post>,
    pub tags: Vec<TagSummary>,
    pub authors: Vec<AuthorSummary>,
}

/// Aggregates parsed [`Post`]s into [`Outputs`].
pub struct Aggregator<'a> {
    mode: Mode,
    registry: &'a Registry,
}

impl<'a> Aggregator<'a> {
    pub fn new(mode: Mode, registry: &'a Registry) -> Aggregator<'a> {
        Aggregator { mode, registry }
    }

    /// Filters out drafts (unless this is a development build) and derives the
    /// tag and author listings from the remaining posts. Fails if any of those
    /// posts names an author who isn't in the registry.
    pub fn aggregate<'p>(&self, posts: &'p [Post]) -> Result<Outputs<'p>> {
        let posts: Vec<&Post> = posts
            .iter()
            .filter(|post| self.mode.includes_drafts() || !post.is_draft())
            .collect();

        let tags = summarize_tags(&posts);
        let authors = self.summarize_authors(&posts)?;

        debug!(
            posts = posts.len(),
            tags = tags.len(),
            authors = authors.len(),
            mode = %self.mode,
            "aggregated posts"
        );
        Ok(Outputs {
            posts,
            tags,
            authors,
        })
    }

    fn summarize_authors(&self, posts: &[&Post]) -> Result<Vec<AuthorSummary>> {
        count_in_order(posts.iter().map(|post| post.attributes.author.as_str()))
            .into_iter()
            .map(|(name, count)| match self.registry.find(name) {
                Some(author) => Ok(AuthorSummary::new(author, count)),
                None => Err(Error::UnknownAuthor(name.to_owned())),
            })
            .collect()
    }
}

fn summarize_tags(posts: &[&Post]) -> Vec<TagSummary> {
    count_in_order(posts.iter().flat_map(|post| post.tag_names()))
        .into_iter()
        .map(|(name, post_count)| TagSummary {
            name: name.to_owned(),
            post_count,
        })
        .collect()
}

/// Counts the occurrences of each distinct item, keeping the items in the
/// order they first appear.
fn count_in_order<'a>(
    items: impl Iterator<Item = &'a str>,
) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for item in items {
        match positions.get(item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                positions.insert(item, counts.len());
                counts.push((item, 1));
            }
        }
    }
    counts
}

/// The result of a fallible aggregation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a referential integrity problem in the parsed posts.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned when a post's author has no entry in the registry.
    UnknownAuthor(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownAuthor(name) => write!(
                f,
                "`{}` is an author of a post but is not a known author. \
                 Please add an entry to the authors file for them.",
                name
            ),
        }
    }
}

impl std::error::Error for Error {}
