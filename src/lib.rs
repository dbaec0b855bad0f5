//! xlsxfin - Excel estimate and financial statement processor
//!
//! This crate reads Excel workbooks (XLSX / XLS), classifies each worksheet as an
//! estimate, a financial statement or neither, extracts structured data from it, and
//! aggregates the results into a [`ProcessingReport`]. Reports can be rendered as PDF
//! or XLSX artifacts and served over HTTP.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxfin::ProcessorBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let processor = ProcessorBuilder::new().build()?;
//!
//!     let report = processor.process(File::open("quote.xlsx")?)?;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Rendering artifacts
//!
//! ```rust,no_run
//! use std::fs::File;
//! use xlsxfin::{ArtifactKind, ProcessorBuilder, SheetSelector};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let processor = ProcessorBuilder::new()
//!         .with_sheet_selector(SheetSelector::Name("Estimate".to_string()))
//!         .build()?;
//!
//!     let report = processor.process(File::open("quote.xlsx")?)?;
//!     let pdf = ArtifactKind::Pdf.render(&report, "quote.xlsx")?;
//!     std::fs::write("quote_processed.pdf", pdf)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # HTTP service
//!
//! ```rust,no_run
//! use xlsxfin::{router, AppState, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = router(AppState::new(ServerConfig::default())?);
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

mod api;
mod builder;
mod classifier;
mod error;
mod extract;
mod grid;
mod output;
mod parser;
mod security;
mod server;
mod store;
mod types;

// 公開API
pub use api::{SheetKind, SheetSelector};
pub use builder::{Processor, ProcessorBuilder, ReportAggregator};
pub use classifier::{classify, classify_blob};
pub use error::XlsxFinError;
pub use extract::{extract_estimate, extract_financial_statement, is_section_header, item_total};
pub use grid::{zip_row, Grid};
pub use output::{financial_line, format_currency, ArtifactKind, ExcelRenderer, PdfRenderer};
pub use security::{
    validate_filename, validate_upload_size, SecurityConfig, ALLOWED_EXTENSIONS,
    DEFAULT_MAX_UPLOAD_SIZE,
};
pub use server::{router, ApiError, AppState, ServerConfig, UploadResponse, DEFAULT_TIMEOUT_SECS};
pub use store::{MemoryStore, ReportStore, StoredReport, DEFAULT_CAPACITY, DEFAULT_TTL_SECS};
pub use types::{
    CellValue, Estimate, EstimateItem, FinancialSection, FinancialStatement, ProcessingReport,
    Record, SheetView, Summary,
};
