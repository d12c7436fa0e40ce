mod cli;
mod commands;
mod mcp;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, LibraryArgs};
use cloudpdf::library::{Library, Session};
use cloudpdf::placement::ScreenClick;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout belongs to command output and the MCP transport
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path)?;
        }
        Commands::Resolve { pages, path, total } => {
            commands::resolve::run(&pages, total, path)?;
        }
        Commands::Split {
            path,
            pages,
            output,
        } => {
            commands::split::run(&path, &pages, output)?;
        }
        Commands::Merge { inputs, output } => {
            commands::merge::run(&inputs, &output)?;
        }
        Commands::Annotate {
            path,
            page,
            x,
            y,
            container_width,
            container_height,
            text,
            color,
            font_size,
            output,
        } => {
            let options = commands::annotate::AnnotateOptions {
                page,
                click: ScreenClick {
                    x,
                    y,
                    container_width,
                    container_height,
                },
                text,
                color,
                font_size,
            };
            commands::annotate::run(&path, &options, &output)?;
        }
        Commands::Upload { library, path } => {
            let (library, session) = open_library(library)?;
            commands::library::upload(&library, &session, &path).await?;
        }
        Commands::List { library, json } => {
            let (library, session) = open_library(library)?;
            commands::library::list(&library, &session, json).await?;
        }
        Commands::Delete { library, id } => {
            let (library, session) = open_library(library)?;
            commands::library::delete(&library, &session, id).await?;
        }
    }

    Ok(())
}

fn open_library(args: LibraryArgs) -> Result<(Library, Session)> {
    let session = Session::new(args.user)?;
    Ok((Library::new(args.library), session))
}
