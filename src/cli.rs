use crate::config::ConfigArgs;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfedit")]
#[command(about = "PDF page and text editor with MCP server support")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Display PDF metadata
    Info {
        /// PDF file to inspect
        path: PathBuf,

        /// Also list every page with its size and rotation
        #[arg(long)]
        pages: bool,
    },

    /// Show which pages a selection such as "1-3,7" picks
    Pages {
        /// Page selection (e.g., "1-5,10,12-15")
        selection: String,

        /// PDF file to take the page count from
        path: Option<PathBuf>,

        /// Page count to use instead of a file
        #[arg(short, long)]
        total: Option<u32>,
    },

    /// Locate text on the pages
    Find {
        /// PDF file to search
        path: PathBuf,

        /// Text to look for
        text: String,

        /// Pages to search (default: all)
        #[arg(short, long)]
        pages: Option<String>,

        /// Case insensitive search
        #[arg(short, long)]
        ignore_case: bool,

        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract text from pages
    Text {
        /// PDF file to read
        path: PathBuf,

        /// Pages to read (default: all)
        #[arg(short, long)]
        pages: Option<String>,
    },

    /// Keep only the selected pages
    #[command(alias = "cat")]
    Extract {
        /// PDF file to extract from
        path: PathBuf,

        /// Page selection (e.g., "1-5,10")
        pages: String,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete the selected pages
    Remove {
        /// PDF file to edit
        path: PathBuf,

        /// Page selection (e.g., "2,4-6")
        pages: String,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Put the pages in a new order
    Reorder {
        /// PDF file to edit
        path: PathBuf,

        /// Every page number exactly once (e.g., "3,1,2")
        order: String,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Combine PDFs, or directories of PDFs, into one
    Merge {
        /// PDF files or directories to merge
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split a PDF after the given pages, or into single pages
    #[command(alias = "burst")]
    Split {
        /// PDF file to split
        path: PathBuf,

        /// Pages to split after (e.g., "3,7")
        points: Option<String>,

        /// Output directory
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,
    },

    /// Rotate pages by a multiple of 90 degrees
    Rotate {
        /// PDF file to edit
        path: PathBuf,

        /// Clockwise degrees (negative for counter-clockwise)
        #[arg(allow_negative_numbers = true)]
        degrees: i64,

        /// Pages to rotate (default: all)
        #[arg(short, long)]
        pages: Option<String>,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Stamp centred text near the bottom of pages
    Watermark {
        /// PDF file to edit
        path: PathBuf,

        /// Watermark text
        text: String,

        /// Pages to stamp (default: all)
        #[arg(short, long)]
        pages: Option<String>,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add highlight annotations over every occurrence of a text
    Highlight {
        /// PDF file to edit
        path: PathBuf,

        /// Text to highlight
        text: String,

        /// Highlight color (yellow, green, blue, pink, orange or #RRGGBB)
        #[arg(long, default_value = "yellow")]
        color: String,

        /// Pages to search (default: all)
        #[arg(short, long)]
        pages: Option<String>,

        /// Case insensitive search
        #[arg(short, long)]
        ignore_case: bool,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace every occurrence of a text
    Replace {
        /// PDF file to edit
        path: PathBuf,

        /// Text to remove
        old: String,

        /// Text to write in its place
        new: String,

        /// Pages to edit (default: all)
        #[arg(short, long)]
        pages: Option<String>,

        /// Case insensitive search
        #[arg(short, long)]
        ignore_case: bool,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write text at a position (points from the top-left corner)
    AddText {
        /// PDF file to edit
        path: PathBuf,

        /// Text to write
        text: String,

        /// Page number
        #[arg(long)]
        page: u32,

        /// Distance from the left edge
        #[arg(long)]
        x: f32,

        /// Baseline distance from the top edge
        #[arg(long)]
        y: f32,

        /// Font size
        #[arg(long)]
        size: Option<f32>,

        /// Text color (black, red, blue, green, purple or #RRGGBB)
        #[arg(long, default_value = "black")]
        color: String,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove the text inside an area and paint it white
    Redact {
        /// PDF file to edit
        path: PathBuf,

        /// Page number
        #[arg(long)]
        page: u32,

        /// Area as x0,y0,x1,y1 in points from the top-left corner
        #[arg(long, value_parser = parse_rect, allow_hyphen_values = true)]
        rect: [f32; 4],

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render pages to PNG images
    Render {
        /// PDF file to render
        path: PathBuf,

        /// Pages to render (default: all)
        #[arg(short, long)]
        pages: Option<String>,

        /// Output directory
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,
    },

    /// Write a standalone HTML preview of a PDF
    Preview {
        /// PDF file to preview
        path: PathBuf,

        /// Embed rendered page thumbnails
        #[arg(long)]
        thumbnails: bool,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply a JSON edit script
    Apply {
        /// PDF file to edit
        path: PathBuf,

        /// JSON file with a list of operations
        script: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_rect(value: &str) -> Result<[f32; 4], String> {
    let numbers = value
        .split(',')
        .map(|n| n.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate: {}", e))?;
    numbers
        .try_into()
        .map_err(|numbers: Vec<f32>| format!("expected 4 coordinates, got {}", numbers.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_selection_help_example_parses() {
        let command = Cli::command();
        let help = command
            .find_subcommand("pages")
            .unwrap()
            .get_arguments()
            .find(|arg| arg.get_id() == "selection")
            .and_then(|arg| arg.get_help())
            .unwrap()
            .to_string();
        let example = help.split('"').nth(1).unwrap();
        assert_eq!(example, "1-5,10,12-15");

        let parsed = crate::page_selection::parse_page_selection(example, 20);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(parsed.pages, vec![1, 2, 3, 4, 5, 10, 12, 13, 14, 15]);
    }

    #[test]
    fn test_parse_rect() {
        assert_eq!(parse_rect("10, 20,30.5,40"), Ok([10.0, 20.0, 30.5, 40.0]));
        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_rect("1,2,x,4").is_err());
    }

    #[test]
    fn test_rotate_accepts_negative_degrees() {
        let cli = Cli::try_parse_from(["pdfedit", "rotate", "doc.pdf", "-90", "-p", "1-2"]).unwrap();
        match cli.command {
            Commands::Rotate { degrees, pages, .. } => {
                assert_eq!(degrees, -90);
                assert_eq!(pages.as_deref(), Some("1-2"));
            }
            _ => panic!("expected rotate"),
        }
    }
}
