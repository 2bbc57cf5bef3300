//! Nexus Files Virtual File System Layer
//!
//! Provides the path and naming rules shared by the registry and the view:
//! - VirtualPath: normalized `/`-separated paths rooted at `/`
//! - Entry name validation
//! - Extension-derived file categories and MIME guesses
//! - Natural ("image2" < "image10") name ordering

mod virtual_path;
mod sanitize;
mod category;
mod natural_sort;

pub use virtual_path::{VirtualPath, SEPARATOR};
pub use sanitize::{validate_name, is_valid_name, NAME_MAX_BYTES};
pub use category::{FileCategory, extension, guess_mime};
pub use natural_sort::natural_cmp;

use thiserror::Error;

/// Path and naming errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, FsError>;
