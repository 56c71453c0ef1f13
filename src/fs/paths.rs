//! Local layout of mirrored items: `<save_dir>/<creator>/<id>.{txt,<ext>}`.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::naming::{sanitize_filename, sanitize_path_component};

/// Extension used when neither the response nor the URL names one.
const DEFAULT_ASSET_EXTENSION: &str = "jpg";

/// Folder holding one creator's sidecars and assets.
pub fn creator_folder(save_dir: &Path, creator: &str) -> Result<PathBuf> {
    Ok(save_dir.join(sanitize_path_component(creator)?))
}

/// Text sidecar path for an item.
pub fn sidecar_path(creator_dir: &Path, item_id: &str) -> Result<PathBuf> {
    Ok(creator_dir.join(sanitize_filename(&format!("{}.txt", item_id))?))
}

/// Asset path for an item.
pub fn asset_path(creator_dir: &Path, item_id: &str, extension: &str) -> Result<PathBuf> {
    Ok(creator_dir.join(sanitize_filename(&format!("{}.{}", item_id, extension))?))
}

/// Pick the asset file extension from the response content type, then the URL path.
pub fn asset_extension(content_type: Option<&str>, url: &str) -> String {
    if let Some(ext) = content_type.and_then(extension_for_mime) {
        return ext;
    }

    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    mime_guess::from_path(&path)
        .first()
        .filter(|mime| matches!(mime.type_().as_str(), "image" | "video"))
        .and_then(|_| Path::new(&path).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_ASSET_EXTENSION.to_string())
}

fn extension_for_mime(content_type: &str) -> Option<String> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if !(essence.starts_with("image/") || essence.starts_with("video/")) {
        return None;
    }

    // mime_guess lists jpeg extensions alphabetically ("jfif" first)
    if essence == "image/jpeg" {
        return Some("jpg".to_string());
    }

    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| exts.first())
        .map(|ext| ext.to_string())
}
