//! Defines the [`Post`] record produced by [`crate::parser::Parser`] and
//! serialized into `posts.json`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::tag;

/// A parsed blog post.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Post {
    /// The post's identity, taken from the source file name less its
    /// extension (e.g., `hello-world` for `hello-world.md`).
    pub slug: String,

    /// The post's front matter.
    pub attributes: Attributes,

    /// The rendered HTML body.
    pub content: String,
}

/// The front matter of a [`Post`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attributes {
    pub title: String,

    /// Serialized as `YYYY-MM-DD` regardless of the configured input format.
    pub date: NaiveDate,

    /// The name of the post's author. This must match an entry in the
    /// [`crate::author::Registry`].
    pub author: String,

    /// The raw, comma-separated tag string. Empty when the post has no tags.
    pub tags: String,

    pub published: bool,

    /// Any other front matter keys, passed through untouched and in the
    /// order they were written.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Post {
    /// Returns `true` for posts explicitly marked `published: false`.
    pub fn is_draft(&self) -> bool {
        !self.attributes.published
    }

    /// The post's distinct tag names. See [`tag::split`].
    pub fn tag_names(&self) -> Vec<&str> {
        tag::split(&self.attributes.tags)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize() -> serde_json::Result<()> {
        let mut extra = serde_json::Map::new();
        extra.insert(String::from("summary"), json!("Short"));
        extra.insert(String::from("cover"), json!("hello.png"));
        let post = Post {
            slug: String::from("hello"),
            attributes: Attributes {
                title: String::from("Hello"),
                date: NaiveDate::from_ymd_opt(2021, 4, 16).unwrap(),
                author: String::from("Alice"),
                tags: String::from("go, ops"),
                published: false,
                extra,
            },
            content: String::from("<p>Hi</p>\n"),
        };

        assert!(post.is_draft());
        assert_eq!(vec!["go", "ops"], post.tag_names());
        assert_eq!(
            json!({
                "slug": "hello",
                "attributes": {
                    "title": "Hello",
                    "date": "2021-04-16",
                    "author": "Alice",
                    "tags": "go, ops",
                    "published": false,
                    "summary": "Short",
                    "cover": "hello.png",
                },
                "content": "<p>Hi</p>\n",
            }),
            serde_json::to_value(&post)?
        );
        let ordered =
            r#""published":false,"summary":"Short","cover":"hello.png""#;
        assert!(serde_json::to_string(&post)?.contains(ordered));
        Ok(())
    }
}
