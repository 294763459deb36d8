use std::path::Path;

use anyhow::{Context, Result};
use handlebars::Handlebars;
use mdbook::book::{Book, BookItem, Chapter};
use mdbook::preprocess::{Preprocessor, PreprocessorContext};
use once_cell::sync::Lazy;
use regex::{CaptureMatches, Captures, Regex};

use crate::app::{Application, DocTree, PageContext};
use crate::colab::{self, PAGE_TEMPLATE, PLAIN_TEMPLATE};
use crate::config::Config;

const BADGE_TEMPLATE_NAME: &str = "colab_badge";

const BADGE_TEMPLATE: &str = r#"{{#if show_on_colaboratory_url}}<a href="{{show_on_colaboratory_url}}" target="_blank" rel="noopener"><img src="https://colab.research.google.com/assets/colab-badge.svg" alt="Show on Colaboratory"/></a>{{/if}}"#;

#[derive(Default)]
pub struct ColabPreprocessor;

impl ColabPreprocessor {
    pub(crate) const NAME: &'static str = "colab-link";

    /// Create a new `ColabPreprocessor`.
    pub fn new() -> Self {
        ColabPreprocessor
    }

    /// Publish a link for every chapter of `book` and render its
    /// `{{#colab_link}}` directives.
    pub fn process(&self, app: &Application, mut book: Book) -> Result<Book> {
        let badge = BadgeTemplate::new()?;
        let mut published = 0;
        let mut result: Result<()> = Ok(());

        book.for_each_mut(|item| {
            if result.is_err() {
                return;
            }
            if let BookItem::Chapter(ch) = item {
                result = process_chapter(app, &badge, ch).map(|linked| {
                    if linked {
                        published += 1;
                    }
                });
            }
        });
        result?;

        log::info!("published {published} Colaboratory link(s)");
        Ok(book)
    }
}

impl Preprocessor for ColabPreprocessor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, ctx: &PreprocessorContext, book: Book) -> anyhow::Result<Book> {
        let config = Config::from_book(&ctx.config, Self::NAME)?;
        let srcdir = ctx.root.join(&ctx.config.book.src);

        let mut app = Application::new(srcdir, config);
        colab::setup(&mut app);

        self.process(&app, book)
    }

    fn supports_renderer(&self, renderer: &str) -> bool {
        renderer == "html"
    }
}

/// Returns whether the chapter's context received a link.
fn process_chapter(app: &Application, badge: &BadgeTemplate, ch: &mut Chapter) -> Result<bool> {
    let Some(path) = ch.source_path.clone() else {
        // draft chapters have no document behind them
        return Ok(false);
    };

    let pagename = page_name(&path);
    let templatename = if app.config.is_plain_page(&path) {
        PLAIN_TEMPLATE
    } else {
        PAGE_TEMPLATE
    };
    let doctree = DocTree::new(app.srcdir.join(&path));

    let mut context = PageContext::new();
    app.emit_html_page_context(&pagename, templatename, &mut context, &doctree)
        .with_context(|| format!("failed to prepare page context for `{}`", path.display()))?;

    ch.content = replace_all(&ch.content, &badge.render(&context)?);
    Ok(context.contains_key(colab::CONTEXT_KEY))
}

fn page_name(path: &Path) -> String {
    path.with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

struct BadgeTemplate(Handlebars<'static>);

impl BadgeTemplate {
    fn new() -> Result<Self> {
        let mut hbs = Handlebars::new();
        hbs.register_template_string(BADGE_TEMPLATE_NAME, BADGE_TEMPLATE)
            .context("failed to register badge template")?;
        Ok(BadgeTemplate(hbs))
    }

    fn render(&self, context: &PageContext) -> Result<String> {
        self.0
            .render(BADGE_TEMPLATE_NAME, context)
            .context("failed to render badge template")
    }
}

/// Substitute `badge` for every `{{#colab_link}}` directive in `s`.
///
/// An escaped `\{{#colab_link}}` loses its backslash and is kept as a literal
/// directive, which mdBook's `links` preprocessor leaves alone.
fn replace_all(s: &str, badge: &str) -> String {
    // When replacing one thing in a string by something with a different length,
    // the indices after that will not correspond,
    // we therefore have to store the difference to correct this
    let mut previous_end_index = 0;
    let mut replaced = String::new();

    for link in find_colab_links(s) {
        replaced.push_str(&s[previous_end_index..link.start_index]);
        match link.link_type {
            ColabLinkType::Escaped => replaced.push_str(&link.link_text[1..]),
            ColabLinkType::Badge => replaced.push_str(badge),
        }
        previous_end_index = link.end_index;
    }

    replaced.push_str(&s[previous_end_index..]);
    replaced
}

#[derive(PartialEq, Debug, Clone)]
enum ColabLinkType {
    Escaped,
    Badge,
}

#[derive(PartialEq, Debug, Clone)]
struct ColabLink<'a> {
    start_index: usize,
    end_index: usize,
    link_type: ColabLinkType,
    link_text: &'a str,
}

impl<'a> ColabLink<'a> {
    fn from_capture(cap: Captures<'a>) -> Option<ColabLink<'a>> {
        let link_type = match (cap.get(1), cap.get(2), cap.get(3)) {
            (Some(_), None, None) => Some(ColabLinkType::Escaped),
            (None, Some(typ), None) if typ.as_str() == "colab_link" => Some(ColabLinkType::Badge),
            _ => None,
        };

        link_type.and_then(|lnk_type| {
            cap.get(0).map(|mat| ColabLink {
                start_index: mat.start(),
                end_index: mat.end(),
                link_type: lnk_type,
                link_text: mat.as_str(),
            })
        })
    }
}

struct ColabLinkIter<'a>(CaptureMatches<'a, 'a>);

impl<'a> Iterator for ColabLinkIter<'a> {
    type Item = ColabLink<'a>;
    fn next(&mut self) -> Option<ColabLink<'a>> {
        for cap in &mut self.0 {
            if let Some(inc) = ColabLink::from_capture(cap) {
                return Some(inc);
            }
        }
        None
    }
}

fn find_colab_links(contents: &str) -> ColabLinkIter<'_> {
    // lazily compute following regex
    // r"\\(\{\{\s*#colab_link\s*\}\})|\{\{\s*#([a-zA-Z0-9_]+)\s*([^}\s][^}]*)?\}\}")?;
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?x)              # insignificant whitespace mode
        \\(\{\{\s*         # match escaped colab_link
        \#colab_link\s*\}\})
        |                   # or
        \{\{\s*             # link opening parens and whitespace
        \#([a-zA-Z0-9_]+)   # link type
        \s*                 # optional whitespace
        ([^}\s][^}]*)?      # arguments, which colab_link does not take
        \}\}                # link closing parens",
        )
        .unwrap()
    });

    ColabLinkIter(RE.captures_iter(contents))
}
