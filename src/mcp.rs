use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::commands::apply::apply_file;
use crate::commands::edit::apply_to_file;
use crate::commands::find::find_in_file;
use crate::commands::merge::{DEFAULT_OUTPUT, collect_inputs, merge_files};
use crate::commands::pages::total_pages;
use crate::commands::split::split_file;
use crate::config::EditorConfig;
use crate::edit::{EditOperation, PageArea, load_script};
use crate::page_selection::parse_page_selection;
use crate::pdf::PdfDocument;
use crate::pdf::markup::MarkupReport;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ParsePagesRequest {
    #[schemars(description = "Page selection (e.g., '1-5,10,12-15')")]
    pub selection: String,
    #[schemars(description = "PDF file to take the page count from")]
    pub path: Option<String>,
    #[schemars(description = "Page count to use instead of a file")]
    pub total_pages: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FindRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Text to look for")]
    pub text: String,
    #[schemars(description = "Pages to search (default: all)")]
    pub pages: Option<String>,
    #[schemars(description = "Case insensitive search (default: false)")]
    #[serde(default)]
    pub ignore_case: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PagesRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Page selection (e.g., '1-5,10')")]
    pub pages: String,
    #[schemars(description = "Output file path (default: prefixed input name)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReorderRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Every page number exactly once (e.g., '3,1,2')")]
    pub order: String,
    #[schemars(description = "Output file path (default: prefixed input name)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RotateRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Clockwise degrees, a multiple of 90 (negative for counter-clockwise)")]
    pub degrees: i64,
    #[schemars(description = "Pages to rotate (default: all)")]
    pub pages: Option<String>,
    #[schemars(description = "Output file path (default: prefixed input name)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MergeRequest {
    #[schemars(description = "PDF files or directories of PDFs, in order")]
    pub inputs: Vec<String>,
    #[schemars(description = "Output file path (default: merged_document.pdf)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SplitRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Pages to split after (e.g., '3,7'); omit to split into single pages")]
    pub points: Option<String>,
    #[schemars(description = "Output directory (default: next to the input)")]
    pub output_dir: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WatermarkRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Watermark text")]
    pub text: String,
    #[schemars(description = "Pages to stamp (default: all)")]
    pub pages: Option<String>,
    #[schemars(description = "Output file path (default: prefixed input name)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct HighlightRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Text to highlight")]
    pub text: String,
    #[schemars(description = "Color name (yellow, green, blue, pink, orange) or #RRGGBB hex (default: yellow)")]
    pub color: Option<String>,
    #[schemars(description = "Pages to search (default: all)")]
    pub pages: Option<String>,
    #[schemars(description = "Case insensitive search (default: false)")]
    #[serde(default)]
    pub ignore_case: bool,
    #[schemars(description = "Output file path (default: prefixed input name)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReplaceRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Text to remove")]
    pub old: String,
    #[schemars(description = "Text to write in its place")]
    pub new: String,
    #[schemars(description = "Pages to edit (default: all)")]
    pub pages: Option<String>,
    #[schemars(description = "Case insensitive search (default: false)")]
    #[serde(default)]
    pub ignore_case: bool,
    #[schemars(description = "Output file path (default: prefixed input name)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddTextRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Page number (1-based)")]
    pub page: u32,
    #[schemars(description = "Points from the left edge")]
    pub x: f32,
    #[schemars(description = "Baseline in points from the top edge")]
    pub y: f32,
    #[schemars(description = "Text to write")]
    pub text: String,
    #[schemars(description = "Font size (default: 12)")]
    pub size: Option<f32>,
    #[schemars(description = "Color name (black, red, blue, green, purple) or #RRGGBB hex (default: black)")]
    pub color: Option<String>,
    #[schemars(description = "Output file path (default: prefixed input name)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RedactRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Page number (1-based)")]
    pub page: u32,
    #[schemars(description = "Left edge in points")]
    pub x0: f32,
    #[schemars(description = "Top edge in points from the top of the page")]
    pub y0: f32,
    #[schemars(description = "Right edge in points")]
    pub x1: f32,
    #[schemars(description = "Bottom edge in points from the top of the page")]
    pub y1: f32,
    #[schemars(description = "Output file path (default: prefixed input name)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ApplyRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(
        description = "JSON array of operations, each an object with an \"op\" field \
                       (extract, remove, reorder, rotate, append, watermark, highlight, \
                       replace, add_text, redact, undo, reset) and that operation's arguments"
    )]
    pub script: String,
    #[schemars(description = "Output file path (default: edited_ prefix on the input name)")]
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
    config: EditorConfig,
}

impl PdfServer {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            tool_router: Self::tool_router(),
            config,
        }
    }

    fn edit(&self, path: &str, operation: EditOperation, output: Option<String>) -> String {
        let output = output.map(PathBuf::from);
        to_json(
            apply_to_file(Path::new(path), &operation, output.as_deref(), &self.config).map(
                |(output, outcome)| EditedFileResult {
                    output_path: output.display().to_string(),
                    page_count: outcome.version.page_count(),
                    message: outcome.message,
                    report: outcome.report,
                },
            ),
        )
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

fn to_json<T: Serialize>(result: Result<T>) -> String {
    match result {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("Error: {}", e)),
        Err(e) => format!("Error: {:#}", e),
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata including title, author, dates, PDF version, file size and page count")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        to_json(PdfDocument::open(&path).map(|doc| {
            let info = doc.get_info();
            PdfInfoResult {
                path,
                page_count: info.page_count,
                version: info.version,
                file_size: info.file_size,
                title: info.title,
                author: info.author,
                creator: info.creator,
                producer: info.producer,
                creation_date: info.creation_date,
                mod_date: info.mod_date,
                subject: info.subject,
                keywords: info.keywords,
            }
        }))
    }

    #[tool(description = "Parse a page selection such as '1-3,7,10-12' against a page count. Invalid parts are reported and skipped.")]
    fn pdf_parse_pages(&self, Parameters(req): Parameters<ParsePagesRequest>) -> String {
        let path = req.path.map(PathBuf::from);
        to_json(total_pages(path.as_deref(), req.total_pages).map(|total| {
            let parsed = parse_page_selection(&req.selection, total);
            ParsedPagesResult {
                total_pages: total,
                pages: parsed.pages,
                errors: parsed.errors.iter().map(ToString::to_string).collect(),
            }
        }))
    }

    #[tool(description = "Find every occurrence of a text, with its page and bounding boxes (points, top-left origin)")]
    fn pdf_find(&self, Parameters(req): Parameters<FindRequest>) -> String {
        to_json(find_in_file(
            Path::new(&req.path),
            &req.text,
            req.pages.as_deref(),
            req.ignore_case,
        ))
    }

    #[tool(description = "Keep only the selected pages and save them to a new file")]
    fn pdf_extract(&self, Parameters(req): Parameters<PagesRequest>) -> String {
        self.edit(&req.path, EditOperation::Extract { pages: req.pages }, req.output)
    }

    #[tool(description = "Delete the selected pages and save the rest to a new file")]
    fn pdf_remove(&self, Parameters(req): Parameters<PagesRequest>) -> String {
        self.edit(&req.path, EditOperation::Remove { pages: req.pages }, req.output)
    }

    #[tool(description = "Reorder pages; the order must name every page exactly once")]
    fn pdf_reorder(&self, Parameters(req): Parameters<ReorderRequest>) -> String {
        self.edit(&req.path, EditOperation::Reorder { order: req.order }, req.output)
    }

    #[tool(description = "Rotate pages clockwise by a multiple of 90 degrees")]
    fn pdf_rotate(&self, Parameters(req): Parameters<RotateRequest>) -> String {
        let op = EditOperation::Rotate {
            degrees: req.degrees,
            pages: req.pages,
        };
        self.edit(&req.path, op, req.output)
    }

    #[tool(description = "Merge PDFs (or every PDF in a directory) into one file, in the given order")]
    fn pdf_merge(&self, Parameters(req): Parameters<MergeRequest>) -> String {
        let output = PathBuf::from(req.output.as_deref().unwrap_or(DEFAULT_OUTPUT));
        to_json(collect_inputs(&req.inputs).and_then(|files| {
            let page_count = merge_files(&files, &output)?;
            Ok(MergeResult {
                output_path: output.display().to_string(),
                input_count: files.len(),
                page_count,
            })
        }))
    }

    #[tool(description = "Split a PDF after the given pages, or into single pages when none are given")]
    fn pdf_split(&self, Parameters(req): Parameters<SplitRequest>) -> String {
        let path = PathBuf::from(&req.path);
        let output_dir = req
            .output_dir
            .map(PathBuf::from)
            .or_else(|| path.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        to_json(
            split_file(&path, req.points.as_deref(), &output_dir).map(|outputs| {
                outputs
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
            }),
        )
    }

    #[tool(description = "Stamp a centred text watermark near the bottom edge of the selected pages")]
    fn pdf_watermark(&self, Parameters(req): Parameters<WatermarkRequest>) -> String {
        let op = EditOperation::Watermark {
            text: req.text,
            pages: req.pages,
        };
        self.edit(&req.path, op, req.output)
    }

    #[tool(description = "Add highlight annotations over every occurrence of a text")]
    fn pdf_highlight(&self, Parameters(req): Parameters<HighlightRequest>) -> String {
        let op = EditOperation::Highlight {
            text: Some(req.text),
            area: None,
            color: req.color.unwrap_or_else(|| "yellow".to_string()),
            pages: req.pages,
            ignore_case: req.ignore_case,
        };
        self.edit(&req.path, op, req.output)
    }

    #[tool(description = "Replace every occurrence of a text: the old glyphs are removed and the new text is drawn in their place")]
    fn pdf_replace(&self, Parameters(req): Parameters<ReplaceRequest>) -> String {
        let op = EditOperation::Replace {
            old: req.old,
            new: req.new,
            pages: req.pages,
            ignore_case: req.ignore_case,
        };
        self.edit(&req.path, op, req.output)
    }

    #[tool(description = "Write text on a page at a position given in points from the top-left corner")]
    fn pdf_add_text(&self, Parameters(req): Parameters<AddTextRequest>) -> String {
        let op = EditOperation::AddText {
            page: req.page,
            x: req.x,
            y: req.y,
            text: req.text,
            size: req.size,
            color: req.color.unwrap_or_else(|| "black".to_string()),
        };
        self.edit(&req.path, op, req.output)
    }

    #[tool(description = "Remove the text inside an area of a page and paint the area white")]
    fn pdf_redact(&self, Parameters(req): Parameters<RedactRequest>) -> String {
        let op = EditOperation::Redact {
            area: PageArea {
                page: req.page,
                x0: req.x0,
                y0: req.y0,
                x1: req.x1,
                y1: req.y1,
            },
        };
        self.edit(&req.path, op, req.output)
    }

    #[tool(description = "Apply a JSON list of edit operations in order and save the final result")]
    fn pdf_apply(&self, Parameters(req): Parameters<ApplyRequest>) -> String {
        let output = req.output.map(PathBuf::from);
        let result = load_script(&req.script)
            .map_err(anyhow::Error::from)
            .and_then(|operations| {
                apply_file(
                    Path::new(&req.path),
                    &operations,
                    output.as_deref(),
                    &self.config,
                )
            })
            .map(|(output, session, messages)| ApplyResult {
                output_path: output.display().to_string(),
                page_count: session.current().page_count(),
                history: session.history().map(str::to_string).collect(),
                messages,
            });
        to_json(result)
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct PdfInfoResult {
    pub path: String,
    pub page_count: u32,
    pub version: String,
    pub file_size: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ParsedPagesResult {
    pub total_pages: u32,
    pub pages: Vec<u32>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EditedFileResult {
    pub output_path: String,
    pub page_count: u32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<MarkupReport>,
}

#[derive(Debug, Serialize)]
pub struct MergeResult {
    pub output_path: String,
    pub input_count: usize,
    pub page_count: u32,
}

#[derive(Debug, Serialize)]
pub struct ApplyResult {
    pub output_path: String,
    pub page_count: u32,
    pub history: Vec<String>,
    pub messages: Vec<String>,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF editing tools. Pages are numbered from 1 and selected with strings like \
                 '1-3,7,10-12'; use pdf_parse_pages to check a selection. Coordinates are points \
                 measured from the top-left corner of the page. Edits write a new file and \
                 report its path; pdf_apply runs several edits in one go."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(config: EditorConfig) -> Result<()> {
    tracing::info!("starting MCP server on stdio");
    let server = PdfServer::new(config);

    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{build_pdf, page_strings};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_pages_tool() {
        let server = PdfServer::default();
        let json = server.pdf_parse_pages(Parameters(ParsePagesRequest {
            selection: "1-3,x,9".into(),
            path: None,
            total_pages: Some(5),
        }));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["pages"], serde_json::json!([1, 2, 3]));
        assert_eq!(value["errors"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_edit_tools_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.pdf");
        std::fs::write(&input, build_pdf(&["one", "two", "three"])).unwrap();
        let server = PdfServer::default();

        let json = server.pdf_remove(Parameters(PagesRequest {
            path: input.display().to_string(),
            pages: "2".into(),
            output: None,
        }));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["page_count"], 2);
        let output = dir.path().join("edited_doc.pdf");
        assert_eq!(
            page_strings(&std::fs::read(output).unwrap()),
            vec!["one", "three"]
        );
    }

    /// Text between single quotes, where the descriptions put their examples
    fn quoted(text: &str) -> Vec<&str> {
        text.split('\'').skip(1).step_by(2).collect()
    }

    fn tool(name: &str) -> rmcp::model::Tool {
        PdfServer::tool_router()
            .list_all()
            .into_iter()
            .find(|tool| tool.name == name)
            .unwrap()
    }

    #[test]
    fn test_selection_examples_in_descriptions_parse() {
        let parse_tool = tool("pdf_parse_pages");
        let mut examples: Vec<String> = Vec::new();
        let description = parse_tool.description.as_deref().unwrap_or_default();
        examples.extend(quoted(description).into_iter().map(String::from));
        let field = parse_tool.input_schema["properties"]["selection"]["description"]
            .as_str()
            .unwrap()
            .to_string();
        examples.extend(quoted(&field).into_iter().map(String::from));
        let instructions = PdfServer::default().get_info().instructions.unwrap();
        examples.extend(quoted(&instructions).into_iter().map(String::from));
        assert_eq!(examples.len(), 3);

        for example in &examples {
            let parsed = parse_page_selection(example, 20);
            assert!(parsed.errors.is_empty(), "{}: {:?}", example, parsed.errors);
            assert!(!parsed.is_empty());
        }
    }

    #[test]
    fn test_highlight_accepts_listed_colors() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.pdf");
        std::fs::write(&input, build_pdf(&["mark this"])).unwrap();
        let server = PdfServer::default();

        for color in ["yellow", "green", "blue", "pink", "orange", "#FF8800"] {
            let output = dir.path().join(format!("{}.pdf", color.trim_start_matches('#')));
            let json = server.pdf_highlight(Parameters(HighlightRequest {
                path: input.display().to_string(),
                text: "mark".into(),
                color: Some(color.into()),
                pages: None,
                ignore_case: false,
                output: Some(output.display().to_string()),
            }));
            assert!(!json.starts_with("Error"), "{}: {}", color, json);
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["report"]["count"], 1);
        }
    }

    #[test]
    fn test_watermark_description_matches_placement() {
        let description = tool("pdf_watermark").description.unwrap_or_default();
        assert!(description.contains("bottom"));
    }

    #[test]
    fn test_errors_are_reported_as_text() {
        let server = PdfServer::default();
        let result = server.pdf_info(Parameters(PathRequest {
            path: "/nonexistent/file.pdf".into(),
        }));
        assert!(result.starts_with("Error: "));

        let result = server.pdf_apply(Parameters(ApplyRequest {
            path: "/nonexistent/file.pdf".into(),
            script: "not json".into(),
            output: None,
        }));
        assert!(result.starts_with("Error: "));
    }
}
