use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mdbook::Config as MDBookConfig;
use serde::Deserialize;

const DEFAULT_ORG: &str = "chainer-community";
const DEFAULT_REPO: &str = "chainer-colab-notebook";
const DEFAULT_BRANCH: &str = "master";
const DEFAULT_NOTEBOOK_PREFIX: &str = "notebook/";

/// Configuration for the preprocessor.
///
/// This is deserialized from the `[preprocessor.colab-link]` table in book.toml.
/// Every key is optional.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// GitHub organization hosting the notebooks.
    #[serde(default = "default_org")]
    pub org: String,

    /// Repository holding the published notebooks.
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Branch the links point at.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Leading path removed from source paths before building a link.
    #[serde(default = "default_notebook_prefix")]
    pub notebook_prefix: String,

    /// Replace the source file's extension in published links, e.g. `ipynb`
    /// when chapters mirror notebooks of the same name.
    #[serde(default)]
    pub notebook_extension: Option<String>,

    /// Chapters, relative to the book's `src`, rendered without a link.
    #[serde(default)]
    pub plain_pages: Vec<PathBuf>,

    #[allow(unused)]
    #[serde(default)]
    #[doc(hidden)]
    pub(crate) after: Option<Vec<String>>,

    #[allow(unused)]
    #[serde(default)]
    #[doc(hidden)]
    pub(crate) before: Option<Vec<String>>,

    #[allow(unused)]
    #[serde(default)]
    #[doc(hidden)]
    pub(crate) renderers: Option<Vec<String>>,

    #[allow(unused)]
    #[serde(default)]
    #[doc(hidden)]
    pub(crate) command: Option<String>,
}

fn default_org() -> String {
    DEFAULT_ORG.to_string()
}

fn default_repo() -> String {
    DEFAULT_REPO.to_string()
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_notebook_prefix() -> String {
    DEFAULT_NOTEBOOK_PREFIX.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            org: default_org(),
            repo: default_repo(),
            branch: default_branch(),
            notebook_prefix: default_notebook_prefix(),
            notebook_extension: None,
            plain_pages: Vec::new(),
            after: None,
            before: None,
            renderers: None,
            command: None,
        }
    }
}

impl Config {
    /// Read the table for preprocessor `name` from book.toml, falling back to
    /// defaults when the table is missing.
    pub fn from_book(config: &MDBookConfig, name: &str) -> Result<Self> {
        let key = format!("preprocessor.{name}");
        let config = config
            .get_deserialized_opt::<Config, _>(&key)
            .with_context(|| format!("failed to read `{key}` from book.toml"))?;
        Ok(config.unwrap_or_default())
    }

    /// Whether the chapter at `path` opted out of the link.
    pub fn is_plain_page(&self, path: &Path) -> bool {
        let path = trim_cur_dir(path);
        self.plain_pages
            .iter()
            .any(|page| trim_cur_dir(page) == path)
    }
}

// `./glossary.md` and `glossary.md` name the same chapter
fn trim_cur_dir(path: &Path) -> &Path {
    path.strip_prefix(".").unwrap_or(path)
}
