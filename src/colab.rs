//! Publishes a "Show on Colaboratory" URL into the context of every content
//! page.
//!
//! The URL is derived from the page's source file: its path relative to the
//! book's source directory, minus the leading notebook directory, appended to
//! the repository's Colaboratory base.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::app::{Application, DocTree, Event, PageContext};
use crate::config::Config;

/// Template used for ordinary content pages. Only these receive a link.
pub const PAGE_TEMPLATE: &str = "page.html";

/// Template used for pages that opted out of the link.
pub const PLAIN_TEMPLATE: &str = "plain.html";

/// Context key the page template reads the link from.
pub const CONTEXT_KEY: &str = "show_on_colaboratory_url";

pub const COLAB_BASE_URL: &str = "https://colab.research.google.com/github";

/// Connect [`html_page_context`] to the application.
pub fn setup(app: &mut Application) {
    app.connect(Event::HtmlPageContext, html_page_context);
}

/// Colaboratory URL for `path`, a path inside the notebook repository.
pub fn colaboratory_url(config: &Config, path: &str) -> String {
    format!(
        "{COLAB_BASE_URL}/{org}/{repo}/blob/{branch}/{path}",
        org = config.org,
        repo = config.repo,
        branch = config.branch,
    )
}

/// Drop the notebook directory from the front of `relative`.
///
/// Only a literal leading prefix is removed; the same directory name further
/// down the path is kept.
pub fn notebook_path<'a>(config: &Config, relative: &'a str) -> &'a str {
    relative
        .strip_prefix(config.notebook_prefix.as_str())
        .unwrap_or(relative)
}

/// Handler for `html-page-context`.
///
/// Sets [`CONTEXT_KEY`] on pages rendered with [`PAGE_TEMPLATE`] and leaves
/// every other page alone. Fails if the document's source is unknown or lies
/// outside the source directory, in which case `context` is not modified.
pub fn html_page_context(
    app: &Application,
    pagename: &str,
    templatename: &str,
    context: &mut PageContext,
    doctree: &DocTree,
) -> Result<()> {
    if templatename != PAGE_TEMPLATE {
        return Ok(());
    }

    let source = doctree
        .source
        .as_deref()
        .with_context(|| format!("page `{pagename}` has no source file"))?;
    let mut relative = relative_to(source, &app.srcdir)?;
    if let Some(extension) = &app.config.notebook_extension {
        relative.set_extension(extension);
    }

    let relative = to_slash(&relative);
    let url = colaboratory_url(&app.config, notebook_path(&app.config, &relative));
    log::debug!("{pagename}: {url}");

    context.insert(CONTEXT_KEY.to_string(), Value::String(url));
    Ok(())
}

/// `path` relative to `base`, compared lexically after folding `.` and `..`.
fn relative_to(path: &Path, base: &Path) -> Result<PathBuf> {
    let path = normalize(path);
    let base = normalize(base);
    let relative = path.strip_prefix(&base).with_context(|| {
        format!(
            "`{}` is not inside the source directory `{}`",
            path.display(),
            base.display()
        )
    })?;
    Ok(relative.to_path_buf())
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // `..` can only be folded into a preceding name
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(Component::ParentDir),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

// URLs always use forward slashes
fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rstest::*;
    use serde_json::json;

    #[fixture]
    fn app() -> Application {
        let mut app = Application::new("/docs/source", Config::default());
        setup(&mut app);
        app
    }

    #[rstest]
    fn test_setup_registers_one_handler(app: Application) {
        assert_eq!(app.handler_count(), 1);
    }

    #[rstest]
    #[case("notebook/guides/intro.ipynb", "guides/intro.ipynb")]
    #[case("guides/intro.ipynb", "guides/intro.ipynb")]
    #[case("guides/notebook/intro.ipynb", "guides/notebook/intro.ipynb")]
    #[case("notebook/notebook/intro.ipynb", "notebook/intro.ipynb")]
    #[case("notebooks/intro.ipynb", "notebooks/intro.ipynb")]
    fn test_notebook_path(#[case] relative: &str, #[case] expected: &str) {
        assert_eq!(notebook_path(&Config::default(), relative), expected);
    }

    #[rstest]
    fn test_colaboratory_url() {
        assert_eq!(
            colaboratory_url(&Config::default(), "guides/intro.ipynb"),
            "https://colab.research.google.com/github/chainer-community/chainer-colab-notebook/blob/master/guides/intro.ipynb"
        );
    }

    #[rstest]
    fn test_page_template_gets_url(app: Application) -> Result<()> {
        let doctree = DocTree::new("/docs/source/notebook/guides/intro.ipynb");
        let mut context = PageContext::new();
        context.insert("title".to_string(), json!("Intro"));

        app.emit_html_page_context("notebook/guides/intro", "page.html", &mut context, &doctree)?;

        assert_eq!(context.len(), 2);
        assert_eq!(
            context.get(CONTEXT_KEY),
            Some(&json!("https://colab.research.google.com/github/chainer-community/chainer-colab-notebook/blob/master/guides/intro.ipynb"))
        );
        Ok(())
    }

    #[rstest]
    #[case("other.html")]
    #[case("plain.html")]
    #[case("search.html")]
    fn test_other_templates_are_ignored(app: Application, #[case] template: &str) -> Result<()> {
        // no source at all: the handler must not even look at the document
        let doctree = DocTree::default();
        let mut context = PageContext::new();

        app.emit_html_page_context("intro", template, &mut context, &doctree)?;

        assert!(context.is_empty());
        Ok(())
    }

    #[rstest]
    fn test_existing_value_is_overwritten(app: Application) -> Result<()> {
        let doctree = DocTree::new("/docs/source/guides/intro.ipynb");
        let mut context = PageContext::new();
        context.insert(CONTEXT_KEY.to_string(), json!("stale"));

        app.emit_html_page_context("guides/intro", "page.html", &mut context, &doctree)?;
        let first = context.clone();
        app.emit_html_page_context("guides/intro", "page.html", &mut context, &doctree)?;

        assert_eq!(first, context);
        assert_eq!(context.len(), 1);
        assert!(context[CONTEXT_KEY]
            .as_str()
            .is_some_and(|url| url.ends_with("/blob/master/guides/intro.ipynb")));
        Ok(())
    }

    #[rstest]
    #[case("/docs/other/intro.ipynb")]
    #[case("/docs/source/../outside.ipynb")]
    #[case("guides/intro.ipynb")]
    fn test_source_outside_root_fails(app: Application, #[case] source: &str) {
        let doctree = DocTree::new(source);
        let mut context = PageContext::new();

        let res = app.emit_html_page_context("intro", "page.html", &mut context, &doctree);

        assert!(res.is_err());
        assert!(context.is_empty());
    }

    #[rstest]
    #[case("../src/a.md", "src")]
    #[case("../../src/a.md", "../src")]
    #[case("src/../../src/a.md", "src")]
    fn test_relative_source_outside_relative_root_fails(#[case] path: &str, #[case] base: &str) {
        assert!(relative_to(Path::new(path), Path::new(base)).is_err());

        let mut app = Application::new(base, Config::default());
        setup(&mut app);
        let mut context = PageContext::new();
        let res = app.emit_html_page_context("a", "page.html", &mut context, &DocTree::new(path));
        assert!(res.is_err());
        assert!(context.is_empty());
    }

    #[rstest]
    #[case("../a/../b", "../b")]
    #[case("../../a", "../../a")]
    #[case("/../a", "/a")]
    #[case("src/./../src/a.md", "src/a.md")]
    fn test_normalize(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(normalize(Path::new(path)), PathBuf::from(expected));
    }

    #[rstest]
    fn test_relative_root() -> Result<()> {
        let relative = relative_to(Path::new("src/../src/notebook/a.md"), Path::new("./src"))?;
        assert_eq!(relative, PathBuf::from("notebook/a.md"));
        Ok(())
    }

    #[rstest]
    fn test_missing_source_fails(app: Application) {
        let mut context = PageContext::new();
        let res =
            app.emit_html_page_context("intro", "page.html", &mut context, &DocTree::default());
        assert!(res
            .unwrap_err()
            .to_string()
            .contains("page `intro` has no source file"));
        assert!(context.is_empty());
    }

    #[rstest]
    fn test_dot_components_are_folded(app: Application) -> Result<()> {
        let doctree = DocTree::new("/docs/source/./notebook/../notebook/intro.ipynb");
        let mut context = PageContext::new();

        app.emit_html_page_context("intro", "page.html", &mut context, &doctree)?;

        assert!(context[CONTEXT_KEY]
            .as_str()
            .is_some_and(|url| url.ends_with("/blob/master/intro.ipynb")));
        Ok(())
    }

    #[rstest]
    fn test_custom_repository_and_extension() -> Result<()> {
        let config = Config {
            org: "example-org".to_string(),
            repo: "notebooks".to_string(),
            branch: "main".to_string(),
            notebook_extension: Some("ipynb".to_string()),
            ..Config::default()
        };
        let mut app = Application::new("/book/src", config);
        setup(&mut app);

        let doctree = DocTree::new("/book/src/notebook/nlp/lora.md");
        let mut context = PageContext::new();
        app.emit_html_page_context("notebook/nlp/lora", "page.html", &mut context, &doctree)?;

        assert_eq!(
            context.get(CONTEXT_KEY),
            Some(&json!(
                "https://colab.research.google.com/github/example-org/notebooks/blob/main/nlp/lora.ipynb"
            ))
        );
        Ok(())
    }
}
