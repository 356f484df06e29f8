//! The library code for `quire`, which turns a directory of markdown blog
//! posts into the JSON listings a static blog front end reads. The
//! architecture can be broken down into two distinct steps:
//!
//! 1. Parsing posts from source files on disk ([`crate::parser`])
//! 2. Aggregating the posts into listings ([`crate::aggregate`])
//!
//! Parsing splits each file's YAML frontmatter from its markdown body,
//! validates the attributes (title, date, author), and renders the body to
//! HTML. Aggregation drops drafts (except in development builds), counts the
//! posts per tag, and counts the posts per author, checking each author
//! against the registry in `data/authors.json`.
//!
//! The resulting listings are written by [`crate::write`] as `posts.json`,
//! `tags.json`, and `authors.json` under `{output}/api/blog/`. Either all
//! three are written or the build fails without touching the previous
//! output.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod aggregate;
pub mod author;
pub mod build;
pub mod config;
pub mod date;
pub mod markdown;
pub mod parser;
pub mod post;
pub mod tag;
pub mod write;
