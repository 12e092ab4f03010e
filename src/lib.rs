//! # lingo-dl
//!
//! Async client library for DeepL-compatible text and document translation
//! APIs.
//!
//! ## Design Philosophy
//!
//! lingo-dl is designed to be:
//! - **Resilient** - Transient failures are retried with jittered exponential
//!   backoff; permanent failures surface as typed errors
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Streaming-aware** - Document results stream to disk without buffering
//!   the whole file in memory
//! - **Recoverable** - A failed document translation surfaces its job handle
//!   so the caller can resume polling and downloading manually
//!
//! ## Quick Start
//!
//! ```no_run
//! use lingo_dl::{Translator, TranslatorOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let translator = Translator::new("your-auth-key", TranslatorOptions::default())?;
//!
//!     let results = translator
//!         .translate_text(&["Hello, world!"], None, "DE", &Default::default())
//!         .await?;
//!     println!("{}", results[0].text);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Document Translation
//!
//! ```no_run
//! use lingo_dl::{
//!     DocumentInput, DocumentOutput, DocumentTranslateOptions, Translator, TranslatorOptions,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let translator = Translator::new("your-auth-key", TranslatorOptions::default())?;
//!
//!     let status = translator
//!         .translate_document(
//!             DocumentInput::path("report.docx"),
//!             DocumentOutput::path("report-de.docx"),
//!             None,
//!             "DE",
//!             DocumentTranslateOptions {
//!                 enable_minification: true,
//!                 ..Default::default()
//!             },
//!         )
//!         .await?;
//!     println!("billed characters: {:?}", status.billed_characters);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Translator client and endpoint wrappers
pub mod client;
/// Configuration types
pub mod config;
/// Document translation lifecycle
pub mod document;
/// Error types
pub mod error;
/// Glossary entry handling
pub mod glossary;
/// Reversible media stripping for oversized documents
pub mod minify;
/// Core wire and domain types
pub mod types;

mod backoff;
mod transport;

// Re-export commonly used types
pub use client::{TextTranslateOptions, Translator};
pub use config::{
    is_free_account_auth_key, AppInfo, BackoffConfig, TranslatorOptions, SERVER_URL,
    SERVER_URL_FREE,
};
pub use document::{DocumentInput, DocumentOutput, DocumentTranslateOptions};
pub use error::{Error, IsRetryable, MinifyError, Result};
pub use glossary::GlossaryEntries;
pub use minify::DocumentMinifier;
pub use types::{
    DocumentHandle, DocumentState, DocumentStatus, Formality, GlossaryInfo, Language,
    LanguagePair, TextResult, Usage,
};
