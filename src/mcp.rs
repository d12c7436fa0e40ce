use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};

use cloudpdf::page_range::resolve;
use cloudpdf::pdf::{merge_documents, PdfDocument, Rgb, TextStyle};
use cloudpdf::placement::{to_native_coordinate, NativeCoordinate, NativePageSize, ScreenClick};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResolvePagesRequest {
    #[schemars(description = "Page ranges, 1-based (e.g., '1-3, 5, 8-10')")]
    pub pages: String,
    #[schemars(description = "Total page count to resolve against")]
    pub total_pages: u32,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SplitRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Page ranges, 1-based (e.g., '1-3, 5, 8-10')")]
    pub pages: String,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MergeRequest {
    #[schemars(description = "PDF files to merge, in order (at least two)")]
    pub inputs: Vec<String>,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnnotateRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
    #[schemars(description = "Page number, 1-based")]
    pub page: u32,
    #[schemars(description = "Click x position from the left of the rendered page")]
    pub x: f32,
    #[schemars(description = "Click y position from the top of the rendered page")]
    pub y: f32,
    #[schemars(description = "Width of the rendered page")]
    pub container_width: f32,
    #[schemars(description = "Height of the rendered page")]
    pub container_height: f32,
    #[schemars(description = "Text to draw")]
    pub text: String,
    #[schemars(description = "Text color as #RRGGBB (default: #0000FF)")]
    #[serde(default = "default_color")]
    pub color: String,
    #[schemars(description = "Font size in points (default: 12)")]
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[schemars(description = "Output file path")]
    pub output: String,
}

/// Largest page count `pdf_resolve_pages` will expand against
const MAX_TOTAL_PAGES: u32 = 100_000;

fn default_color() -> String {
    "#0000FF".to_string()
}

fn default_font_size() -> f32 {
    12.0
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_json<T: Serialize>(result: &T) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|e| format!("Error: {}", e))
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata, page count, and the native size of every page")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        let doc = match PdfDocument::open(&path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };
        let info = doc.get_info();

        let page_sizes = match (0..info.page_count)
            .map(|index| doc.page_size(index))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(sizes) => sizes,
            Err(e) => return format!("Error: {}", e),
        };

        to_json(&PdfInfoResult {
            path,
            page_count: info.page_count,
            title: info.title,
            author: info.author,
            creator: info.creator,
            producer: info.producer,
            creation_date: info.creation_date,
            page_sizes,
        })
    }

    #[tool(description = "Resolve a page range expression like '1-3, 5' into sorted, deduplicated zero-based page indices")]
    fn pdf_resolve_pages(&self, Parameters(req): Parameters<ResolvePagesRequest>) -> String {
        if req.total_pages > MAX_TOTAL_PAGES {
            return format!(
                "Error: total_pages must be at most {}",
                MAX_TOTAL_PAGES
            );
        }
        match resolve(&req.pages, req.total_pages) {
            Ok(indices) => to_json(&ResolveResult {
                pages: indices.to_string(),
                indices: indices.to_vec(),
            }),
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Copy the selected pages of a PDF into a new file. Use page range syntax like '1-3, 5, 8-10'.")]
    fn pdf_split(&self, Parameters(req): Parameters<SplitRequest>) -> String {
        let doc = match PdfDocument::open(&req.path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };

        let indices = match resolve(&req.pages, doc.page_count()) {
            Ok(p) => p,
            Err(e) => return format!("Error: {}", e),
        };

        let mut new_doc = match doc.copy_pages(&indices) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };

        if let Err(e) = new_doc.save(&req.output) {
            return format!("Error: {}", e);
        }

        to_json(&WriteResult {
            output_path: req.output,
            page_count: indices.len() as u32,
        })
    }

    #[tool(description = "Merge two or more PDFs, in order, into a new file")]
    fn pdf_merge(&self, Parameters(req): Parameters<MergeRequest>) -> String {
        if req.inputs.len() < 2 {
            return "Error: Please select at least two PDF files to merge".to_string();
        }

        let documents = match req
            .inputs
            .iter()
            .map(PdfDocument::open)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(docs) => docs,
            Err(e) => return format!("Error: {}", e),
        };

        let mut merged = match merge_documents(documents) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };
        let page_count = merged.page_count();

        if let Err(e) = merged.save(&req.output) {
            return format!("Error: {}", e);
        }

        to_json(&WriteResult {
            output_path: req.output,
            page_count,
        })
    }

    #[tool(description = "Draw text on a PDF page at a point clicked on a rendered preview of that page; the click is mapped into page coordinates")]
    fn pdf_annotate(&self, Parameters(req): Parameters<AnnotateRequest>) -> String {
        let mut doc = match PdfDocument::open(&req.path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };

        let total = doc.page_count();
        if req.page < 1 || req.page > total {
            return format!(
                "Error: Invalid page number: {}. Must be between 1 and {}.",
                req.page, total
            );
        }
        let index = req.page - 1;

        let color = match req.color.parse::<Rgb>() {
            Ok(c) => c,
            Err(e) => return format!("Error: {}", e),
        };
        let page_size = match doc.page_size(index) {
            Ok(s) => s,
            Err(e) => return format!("Error: {}", e),
        };
        let click = ScreenClick {
            x: req.x,
            y: req.y,
            container_width: req.container_width,
            container_height: req.container_height,
        };
        let at = match to_native_coordinate(&click, page_size) {
            Ok(c) => c,
            Err(e) => return format!("Error: {}", e),
        };

        let style = TextStyle {
            font_size: req.font_size,
            color,
        };
        if let Err(e) = doc.draw_text(index, &req.text, at, &style) {
            return format!("Error: {}", e);
        }
        if let Err(e) = doc.save(&req.output) {
            return format!("Error: {}", e);
        }

        to_json(&AnnotateResult {
            output_path: req.output,
            page: req.page,
            position: at,
        })
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct PdfInfoResult {
    pub path: String,
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub page_sizes: Vec<NativePageSize>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResult {
    pub pages: String,
    pub indices: Vec<u32>,
}

#[derive(Debug, Serialize)]
pub struct WriteResult {
    pub output_path: String,
    pub page_count: u32,
}

#[derive(Debug, Serialize)]
pub struct AnnotateResult {
    pub output_path: String,
    pub page: u32,
    pub position: NativeCoordinate,
}

impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF page tools. Use pdf_info for page count and page sizes, \
                 pdf_resolve_pages to check a page range, pdf_split to copy selected pages \
                 into a new PDF, pdf_merge to combine PDFs, and pdf_annotate to place text \
                 where a user clicked on a rendered page."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();
    tracing::info!("starting MCP server on stdio");

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
