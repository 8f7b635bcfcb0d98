#![deny(warnings, rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Safe within realistic value bounds (timestamps, sizes)
    clippy::cast_precision_loss,      // Acceptable for metric values
    clippy::missing_errors_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. FetchError in fetcher module
    clippy::must_use_candidate        // Annotated selectively on critical APIs
)]

pub mod app;
pub mod domain;
pub mod encoder;
pub mod fetcher;
pub mod transport;

// Re-export main types for easy access
pub use app::{Config, RunSummary};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
