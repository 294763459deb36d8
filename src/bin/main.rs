use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use mdbook::preprocess::{CmdPreprocessor, Preprocessor};
use mdbook_colab_link::ColabPreprocessor;

/// mdbook preprocessor that adds "Show on Colaboratory" links.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
struct Program {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Check whether a renderer is supported by this preprocessor
    Supports { renderer: String },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let preprocessor = ColabPreprocessor::new();

    match Program::parse().command {
        Some(Command::Supports { renderer }) => {
            if preprocessor.supports_renderer(&renderer) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        None => match handle_preprocessing(&preprocessor) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                log::error!("{err:?}");
                ExitCode::FAILURE
            }
        },
    }
}

fn handle_preprocessing(pre: &dyn Preprocessor) -> Result<()> {
    let (ctx, book) =
        CmdPreprocessor::parse_input(io::stdin()).context("failed to parse book content")?;

    if ctx.mdbook_version != mdbook::MDBOOK_VERSION {
        log::warn!(
            "The {} plugin was built against version {} of mdbook, \
             but we're being called from version {}",
            pre.name(),
            mdbook::MDBOOK_VERSION,
            ctx.mdbook_version
        );
    }

    let processed_book = pre.run(&ctx, book)?;
    serde_json::to_writer(io::stdout(), &processed_book)
        .context("failed to write book to stdout")?;

    Ok(())
}
