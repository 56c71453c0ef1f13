//! Filesystem module.
//!
//! Provides:
//! - Filename sanitizing
//! - Creator folder, sidecar and asset paths
//! - Sidecar writing

pub mod naming;
pub mod paths;
pub mod sidecar;

pub use naming::{sanitize_filename, sanitize_path_component};
pub use paths::{asset_extension, asset_path, creator_folder, sidecar_path};
pub use sidecar::{append_labels, format_sidecar, write_sidecar};
