//! # `mdbook-colab-link`
//!
//! This crate produces a preprocessor for the [rust-lang mdbook](https://github.com/rust-lang/mdBook)
//! project that adds "Show on Colaboratory" links to pages backed by Jupyter notebooks
//! published on GitHub.
//!
//! ## Basic Usage
//!
//! First, install the crate:
//!
//! ```sh
//! cargo install mdbook-colab-link
//! ```
//!
//! Next, and as with all preprocessor extensions, to include `mdbook-colab-link`
//! in your book, add the following to your `book.toml`:
//!
//! ```toml
//! [preprocessor.colab-link]
//! command = "mdbook-colab-link"
//! before = ["links"]
//! ```
//!
//! Then place the link helper wherever the badge should appear:
//!
//! ```markdown
//! <!-- replaced by a "Show on Colaboratory" badge -->
//! {{#colab_link}}
//!
//! <!-- rendered as the literal text `{{#colab_link}}` -->
//! \{{#colab_link}}
//! ```
//!
//! Escapes rely on running before mdBook's `links` preprocessor, hence
//! `before = ["links"]`. A preprocessor added with `MDBook::with_preprocessor`
//! runs after `links`, which strips the backslash first.
//!
//! The link points at the chapter's source file relative to the book's `src`
//! directory, with a leading `notebook/` removed:
//!
//! ```text
//! src/notebook/guides/intro.md
//!   -> https://colab.research.google.com/github/chainer-community/chainer-colab-notebook/blob/master/guides/intro.md
//! ```
//!
//! The repository is configurable:
//!
//! ```toml
//! [preprocessor.colab-link]
//! org = "my-org"
//! repo = "my-notebooks"
//! branch = "main"
//! notebook-prefix = "notebooks/"
//! notebook-extension = "ipynb"
//! plain-pages = ["glossary.md"]
//! ```

pub mod app;
pub mod colab;
pub mod config;
pub mod preprocessor;

pub use app::{Application, DocTree, Event, PageContext};
pub use config::Config;
pub use preprocessor::ColabPreprocessor;
