mod cli;
mod commands;
mod config;
mod edit;
mod error;
mod mcp;
mod page_selection;
mod pdf;
mod preview;
mod session;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::EditorConfig;
use edit::{EditOperation, PageArea};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries command output and MCP frames
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.config.verbose);
    let config = EditorConfig::from(&cli.config);

    match cli.command {
        Commands::Mcp => {
            mcp::run_server(config).await?;
        }
        Commands::Info { path, pages } => {
            commands::info::run(&path, pages)?;
        }
        Commands::Pages {
            selection,
            path,
            total,
        } => {
            commands::pages::run(&selection, path.as_deref(), total)?;
        }
        Commands::Find {
            path,
            text,
            pages,
            ignore_case,
            json,
        } => {
            commands::find::run(&path, &text, pages.as_deref(), ignore_case, json)?;
        }
        Commands::Text { path, pages } => {
            commands::text::run(&path, pages.as_deref())?;
        }
        Commands::Extract {
            path,
            pages,
            output,
        } => {
            let op = EditOperation::Extract { pages };
            commands::edit::run(&path, op, output.as_deref(), &config)?;
        }
        Commands::Remove {
            path,
            pages,
            output,
        } => {
            let op = EditOperation::Remove { pages };
            commands::edit::run(&path, op, output.as_deref(), &config)?;
        }
        Commands::Reorder {
            path,
            order,
            output,
        } => {
            let op = EditOperation::Reorder { order };
            commands::edit::run(&path, op, output.as_deref(), &config)?;
        }
        Commands::Merge { inputs, output } => {
            commands::merge::run(&inputs, output.as_deref())?;
        }
        Commands::Split {
            path,
            points,
            output_dir,
        } => {
            commands::split::run(&path, points.as_deref(), output_dir.as_deref())?;
        }
        Commands::Rotate {
            path,
            degrees,
            pages,
            output,
        } => {
            let op = EditOperation::Rotate { degrees, pages };
            commands::edit::run(&path, op, output.as_deref(), &config)?;
        }
        Commands::Watermark {
            path,
            text,
            pages,
            output,
        } => {
            let op = EditOperation::Watermark { text, pages };
            commands::edit::run(&path, op, output.as_deref(), &config)?;
        }
        Commands::Highlight {
            path,
            text,
            color,
            pages,
            ignore_case,
            output,
        } => {
            let op = EditOperation::Highlight {
                text: Some(text),
                area: None,
                color,
                pages,
                ignore_case,
            };
            commands::edit::run(&path, op, output.as_deref(), &config)?;
        }
        Commands::Replace {
            path,
            old,
            new,
            pages,
            ignore_case,
            output,
        } => {
            let op = EditOperation::Replace {
                old,
                new,
                pages,
                ignore_case,
            };
            commands::edit::run(&path, op, output.as_deref(), &config)?;
        }
        Commands::AddText {
            path,
            text,
            page,
            x,
            y,
            size,
            color,
            output,
        } => {
            let op = EditOperation::AddText {
                page,
                x,
                y,
                text,
                size,
                color,
            };
            commands::edit::run(&path, op, output.as_deref(), &config)?;
        }
        Commands::Redact {
            path,
            page,
            rect: [x0, y0, x1, y1],
            output,
        } => {
            let op = EditOperation::Redact {
                area: PageArea {
                    page,
                    x0,
                    y0,
                    x1,
                    y1,
                },
            };
            commands::edit::run(&path, op, output.as_deref(), &config)?;
        }
        Commands::Render {
            path,
            pages,
            output_dir,
        } => {
            commands::render::run(&path, pages.as_deref(), output_dir.as_deref(), &config)?;
        }
        Commands::Preview {
            path,
            thumbnails,
            output,
        } => {
            commands::preview::run(&path, output.as_deref(), thumbnails, &config)?;
        }
        Commands::Apply {
            path,
            script,
            output,
        } => {
            commands::apply::run(&path, &script, output.as_deref(), &config)?;
        }
    }

    Ok(())
}
