//! The slice of the build that page hooks see: the source root, the
//! preprocessor's configuration, and the registered `html-page-context`
//! handlers.

use std::path::PathBuf;

use anyhow::Result;
use serde_json::{Map, Value};

use crate::config::Config;

/// Template context of a single page.
pub type PageContext = Map<String, Value>;

/// Signature of a handler for [`Event::HtmlPageContext`].
///
/// Receives the build state, the page name, the template name chosen for the
/// page, the page's mutable context and its document tree.
pub type PageContextHandler =
    fn(&Application, &str, &str, &mut PageContext, &DocTree) -> Result<()>;

/// Build lifecycle events handlers can be connected to.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Event {
    /// A page's context is ready and its template is about to be rendered.
    HtmlPageContext,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::HtmlPageContext => "html-page-context",
        }
    }
}

/// Parsed document behind a page.
#[derive(Debug, Clone, Default)]
pub struct DocTree {
    /// Absolute path of the file the document was read from.
    pub source: Option<PathBuf>,
}

impl DocTree {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        DocTree {
            source: Some(source.into()),
        }
    }
}

pub struct Application {
    /// Absolute path of the book's source directory.
    pub srcdir: PathBuf,
    pub config: Config,
    handlers: Vec<PageContextHandler>,
}

impl Application {
    pub fn new(srcdir: impl Into<PathBuf>, config: Config) -> Self {
        Application {
            srcdir: srcdir.into(),
            config,
            handlers: Vec::new(),
        }
    }

    /// Register `handler` for `event`. Handlers stay connected for the
    /// lifetime of the application.
    pub fn connect(&mut self, event: Event, handler: PageContextHandler) -> &mut Self {
        log::debug!("connecting handler to `{}`", event.name());
        match event {
            Event::HtmlPageContext => self.handlers.push(handler),
        }
        self
    }

    /// Run every `html-page-context` handler, in registration order, for one
    /// page. Stops at the first failing handler and returns its error.
    pub fn emit_html_page_context(
        &self,
        pagename: &str,
        templatename: &str,
        context: &mut PageContext,
        doctree: &DocTree,
    ) -> Result<()> {
        for handler in &self.handlers {
            handler(self, pagename, templatename, context, doctree)?;
        }
        Ok(())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}
