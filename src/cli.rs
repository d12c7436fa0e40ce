use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "cloudpdf")]
#[command(about = "Split, merge and annotate PDFs, and keep them in a per-user library")]
#[command(version)]
pub struct Cli {
    /// Log more (-v for info, -vv for debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct LibraryArgs {
    /// Library root directory
    #[arg(long, env = "CLOUDPDF_LIBRARY", default_value = "cloudpdf-library")]
    pub library: PathBuf,

    /// User id that owns the files
    #[arg(long, env = "CLOUDPDF_USER")]
    pub user: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server over stdio
    Mcp,

    /// Display PDF metadata and page sizes
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Show which pages a range expression selects
    Resolve {
        /// Page ranges (e.g., "1-3, 5, 8-10")
        pages: String,

        /// PDF file to take the page count from
        #[arg(required_unless_present = "total")]
        path: Option<PathBuf>,

        /// Page count to resolve against instead of a file
        #[arg(
            short,
            long,
            conflicts_with = "path",
            value_parser = clap::value_parser!(u32).range(1..=100_000)
        )]
        total: Option<u32>,
    },

    /// Extract page ranges to a new PDF
    #[command(alias = "extract")]
    Split {
        /// PDF file to extract from
        path: PathBuf,

        /// Page ranges (e.g., "1-3, 5, 8-10")
        pages: String,

        /// Output file (defaults to <name>_pages_<ranges>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Combine multiple PDFs into one
    Merge {
        /// PDF files to merge, in order
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Place text on a page at a point clicked on a rendered preview
    Annotate {
        /// PDF file to annotate
        path: PathBuf,

        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Click position from the left edge of the preview
        #[arg(short, long)]
        x: f32,

        /// Click position from the top edge of the preview
        #[arg(short, long)]
        y: f32,

        /// Rendered preview width
        #[arg(long)]
        container_width: f32,

        /// Rendered preview height
        #[arg(long)]
        container_height: f32,

        /// Text to draw
        #[arg(short, long)]
        text: String,

        /// Text color as #RRGGBB
        #[arg(long, default_value = "#0000FF")]
        color: String,

        /// Font size in points
        #[arg(long, default_value = "12")]
        font_size: f32,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Upload a PDF into the library
    Upload {
        #[command(flatten)]
        library: LibraryArgs,

        /// PDF file to upload
        path: PathBuf,
    },

    /// List library files, newest first
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        library: LibraryArgs,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a file from the library
    #[command(alias = "rm")]
    Delete {
        #[command(flatten)]
        library: LibraryArgs,

        /// Id of the file to delete
        id: Uuid,
    },
}
