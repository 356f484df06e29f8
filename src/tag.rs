//! Defines the [`TagSummary`] type and the tokenizer for the raw `tags`
//! attribute of a [`crate::post::Post`].

use serde::Serialize;

/// One entry in `tags.json`: a distinct tag and the number of published posts
/// that reference it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagSummary {
    /// The tag exactly as it was written in the post's front matter.
    pub name: String,

    /// The number of posts in the output that carry this tag.
    #[serde(rename = "postCount")]
    pub post_count: usize,
}

/// Splits a raw `tags` attribute on a comma followed by optional whitespace.
/// Whitespace before the first tag or before a comma is left alone. Empty
/// tokens (from an empty string or a stray trailing comma) are dropped, and a
/// tag repeated within the same string is returned only once, so each token
/// corresponds to exactly one post/tag pair.
pub fn split(raw: &str) -> Vec<&str> {
    let mut tags: Vec<&str> = Vec::new();
    for (i, token) in raw.split(',').enumerate() {
        let token = if i > 0 { token.trim_start() } else { token };
        if !token.is_empty() && !tags.contains(&token) {
            tags.push(token);
        }
    }
    tags
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_split() {
        assert_eq!(vec!["go", "ops"], split("go,ops"));
        assert_eq!(vec!["go", "ops", "rust"], split("go, ops,\t rust"));
        assert_eq!(vec!["Go", "go"], split("Go, go"));
        assert_eq!(vec!["go ", "ops"], split("go ,ops"));
        assert_eq!(vec![" go"], split(" go"));
    }

    #[test]
    fn test_split_empty() {
        assert!(split("").is_empty());
        assert_eq!(vec!["go"], split("go,"));
        assert_eq!(vec!["go"], split("go, ,go"));
        assert_eq!(vec!["go", "ops"], split("go,,ops"));
    }
}
