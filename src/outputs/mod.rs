//! Presentation of session results, kept apart from extraction.
//!
//! # Submodules
//!
//! - [`stream`]: one JSON object per accepted article, written as it completes
//! - [`json`]: a full [`crate::models::SessionReport`] snapshot on disk
//!
//! # Output Structure
//!
//! ```text
//! stdout:
//! {"title":"...","link":"https://...","age":"2 hours ago",...}
//! {"title":"...","link":"https://...",...}
//!
//! json_output_dir/
//! └── 2023-07-22/
//!     ├── bbc_120000.json
//!     └── sky_120003.json
//! ```

pub mod json;
pub mod stream;
