//! Loads the project file (`quire.yaml`) and merges it with command-line
//! settings into a [`Config`].

use crate::aggregate::Mode;
use crate::date::DEFAULT_DATE_FORMAT;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "quire.yaml";

#[derive(Deserialize)]
#[serde(default)]
struct Project {
    /// The directory holding the post sources, relative to the project file.
    blog_directory: PathBuf,

    /// The authors registry, relative to `blog_directory`.
    authors_file: PathBuf,

    #[serde(alias = "dateFormat")]
    date_format: String,
}

impl Default for Project {
    fn default() -> Self {
        Project {
            blog_directory: PathBuf::from("blog"),
            authors_file: PathBuf::from("data/authors.json"),
            date_format: DEFAULT_DATE_FORMAT.to_owned(),
        }
    }
}

/// Everything a build needs to know, resolved once up front.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The directory searched for `*.md` post sources.
    pub posts_directory: PathBuf,

    /// The JSON file listing the known authors.
    pub authors_file: PathBuf,

    /// The root output directory; listings are written beneath
    /// `{output_directory}/api/blog/`.
    pub output_directory: PathBuf,

    /// The pattern post dates are written in (see [`crate::date::DateFormat`]).
    pub date_format: String,

    pub mode: Mode,

    /// The number of threads used to parse posts.
    pub threads: usize,
}

impl Config {
    /// Finds the project file in `dir` or its nearest ancestor and loads it.
    pub fn from_directory(
        dir: &Path,
        output_directory: &Path,
        mode: Mode,
        threads: Option<usize>,
    ) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.is_file() {
            Config::from_project_file(&path, output_directory, mode, threads)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(
                    parent,
                    output_directory,
                    mode,
                    threads,
                ),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads the project file at `path`. Relative paths in the project file
    /// are resolved against the file's directory.
    pub fn from_project_file(
        path: &Path,
        output_directory: &Path,
        mode: Mode,
        threads: Option<usize>,
    ) -> Result<Config> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("Opening project file `{}`", path.display())
        })?;
        let project: Project = if contents.trim().is_empty() {
            Project::default()
        } else {
            serde_yaml::from_str(&contents).with_context(|| {
                format!("Loading configuration `{}`", path.display())
            })?
        };

        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for project file path '{:?}'",
                path
            )
        })?;
        let posts_directory = project_root.join(&project.blog_directory);
        Ok(Config {
            authors_file: posts_directory.join(&project.authors_file),
            posts_directory,
            output_directory: output_directory.to_owned(),
            date_format: project.date_format,
            mode,
            threads: match threads {
                None => default_threads(),
                Some(threads) => threads,
            },
        })
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_directory_searches_ancestors() -> Result<()> {
        let root = TempDir::new()?;
        fs::write(
            root.path().join(PROJECT_FILE),
            "blog_directory: posts\ndateFormat: YYYY-MM-DD\n",
        )?;
        let nested = root.path().join("posts").join("drafts");
        fs::create_dir_all(&nested)?;

        let config = Config::from_directory(
            &nested,
            Path::new("dist"),
            Mode::Development,
            Some(2),
        )?;
        assert_eq!(
            Config {
                posts_directory: root.path().join("posts"),
                authors_file: root.path().join("posts/data/authors.json"),
                output_directory: PathBuf::from("dist"),
                date_format: String::from("YYYY-MM-DD"),
                mode: Mode::Development,
                threads: 2,
            },
            config
        );
        Ok(())
    }

    #[test]
    fn test_empty_project_file_uses_defaults() -> Result<()> {
        let root = TempDir::new()?;
        let path = root.path().join(PROJECT_FILE);
        fs::write(&path, "")?;

        let config = Config::from_project_file(
            &path,
            Path::new("out"),
            Mode::Production,
            None,
        )?;
        assert_eq!(root.path().join("blog"), config.posts_directory);
        assert_eq!(
            root.path().join("blog/data/authors.json"),
            config.authors_file
        );
        assert_eq!(DEFAULT_DATE_FORMAT, config.date_format);
        assert!(config.threads >= 1);
        Ok(())
    }

    #[test]
    fn test_malformed_project_file() -> Result<()> {
        let root = TempDir::new()?;
        let path = root.path().join(PROJECT_FILE);
        fs::write(&path, "date_format: [not, a, string]\n")?;

        let err = Config::from_project_file(
            &path,
            Path::new("out"),
            Mode::Production,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains(PROJECT_FILE));
        Ok(())
    }
}
