//! Dataset organizer.
//!
//! Walks a raw, unorganized photo tree, detects folders that hold enough
//! images to count as a class, derives a `{Crop}_{Disease}` label from the
//! path, and copies the images into a flat per-class layout consumable by
//! the loader.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use leaf_core::{Error, Result};

/// Image extensions the organizer considers, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

/// Options for an organize run.
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    /// A folder qualifies as a class only if it holds more than this many
    /// images.
    pub min_image_count: usize,
    /// Accepted image extensions (lowercase, without dot).
    pub allowed_extensions: Vec<String>,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            min_image_count: 10,
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Result of an organize run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizeOutcome {
    /// The destination already existed; nothing was touched.
    SkippedExisting,
    /// The destination was created and populated.
    Organized(OrganizeStats),
}

/// Statistics of a completed organize run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeStats {
    /// Images copied per class label.
    pub class_counts: BTreeMap<String, usize>,
    /// Total images copied.
    pub images_copied: usize,
    /// Leaf folders skipped (unparsable path or crop == disease).
    pub leaves_skipped: usize,
    /// Individual copy failures that were logged and bypassed.
    pub copy_failures: usize,
}

/// A class label derived from a raw path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabel {
    pub crop: String,
    pub disease: String,
}

impl ClassLabel {
    /// Final folder name, `{Crop}_{Disease}`.
    pub fn folder_name(&self) -> String {
        format!("{}_{}", self.crop, self.disease)
    }
}

/// Reasons a leaf folder yields no class label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    /// The path does not contain the source-root segment.
    #[error("path does not contain the source root segment")]
    MissingSourceSegment,
    /// Nothing follows the source-root segment.
    #[error("no crop segment follows the source root")]
    MissingCropSegment,
    /// Crop and disease sanitize to the same name (e.g. a generic
    /// self-referential folder); such leaves are skipped entirely.
    #[error("crop and disease resolve to the same name")]
    SelfReferential,
}

/// Removes special characters and spaces from a path-segment name.
pub fn sanitize_name(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .filter_map(|c| match c {
            ' ' | '-' => Some('_'),
            '(' | ')' => None,
            other => Some(other),
        })
        .collect();

    while cleaned.contains("__") {
        cleaned = cleaned.replace("__", "_");
    }

    cleaned
}

/// Derives a class label from path segments, independent of the filesystem.
///
/// `parts` are the components of the leaf directory's path; `crop` is the
/// sanitized segment immediately after the source-root segment and
/// `disease` is the sanitized leaf name.
pub fn derive_class_label(
    parts: &[&str],
    source_root_name: &str,
) -> std::result::Result<ClassLabel, LabelError> {
    let idx = parts
        .iter()
        .position(|p| *p == source_root_name)
        .ok_or(LabelError::MissingSourceSegment)?;

    if idx + 1 >= parts.len() {
        return Err(LabelError::MissingCropSegment);
    }

    let crop = sanitize_name(parts[idx + 1]);
    let disease = sanitize_name(parts[parts.len() - 1]);

    if crop.eq_ignore_ascii_case(&disease) {
        return Err(LabelError::SelfReferential);
    }

    Ok(ClassLabel { crop, disease })
}

/// Organizes a raw image tree into `dest_root/{Crop}_{Disease}/` folders.
///
/// If `dest_root` already exists the run is a no-op: the destination is
/// treated as final and never merged or refreshed.
pub fn organize(
    source_root: &Path,
    dest_root: &Path,
    options: &OrganizeOptions,
) -> Result<OrganizeOutcome> {
    if !source_root.exists() {
        return Err(Error::NotFound(format!(
            "Source directory does not exist: {}",
            source_root.display()
        )));
    }

    if dest_root.exists() {
        warn!(
            "Destination '{}' already exists. Skipping to avoid duplicates.",
            dest_root.display()
        );
        return Ok(OrganizeOutcome::SkippedExisting);
    }

    let source_root_name = source_root
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::Dataset(format!(
                "Source root has no usable directory name: {}",
                source_root.display()
            ))
        })?
        .to_string();

    info!("Scanning '{}' for image folders...", source_root.display());
    fs::create_dir_all(dest_root)?;

    let mut stats = OrganizeStats::default();

    for entry in WalkDir::new(source_root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        let images = list_images(dir, &options.allowed_extensions)?;
        if images.len() <= options.min_image_count {
            continue;
        }

        let parts: Vec<&str> = dir
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();

        let label = match derive_class_label(&parts, &source_root_name) {
            Ok(label) => label,
            Err(reason) => {
                debug!("Skipping '{}': {}", dir.display(), reason);
                stats.leaves_skipped += 1;
                continue;
            }
        };

        let folder_name = label.folder_name();
        let target_folder = dest_root.join(&folder_name);
        fs::create_dir_all(&target_folder)?;

        info!("Processing: {} ({} images)", folder_name, images.len());

        let mut copied = 0;
        for file_name in &images {
            let src_path = dir.join(file_name);
            let dst_path = target_folder.join(file_name);
            match fs::copy(&src_path, &dst_path) {
                Ok(_) => copied += 1,
                Err(e) => {
                    error!("Error copying {}: {}", src_path.display(), e);
                    stats.copy_failures += 1;
                }
            }
        }

        stats.images_copied += copied;
        *stats.class_counts.entry(folder_name).or_insert(0) += copied;
    }

    info!(
        "Organization complete: {} classes, {} images in '{}'",
        stats.class_counts.len(),
        stats.images_copied,
        dest_root.display()
    );

    Ok(OrganizeOutcome::Organized(stats))
}

/// Lists the file names of allowed-extension images directly inside `dir`.
fn list_images(dir: &Path, allowed_extensions: &[String]) -> Result<Vec<String>> {
    let mut images = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let allowed = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let ext = e.to_lowercase();
                allowed_extensions.iter().any(|a| *a == ext)
            })
            .unwrap_or(false);

        if allowed {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                images.push(name.to_string());
            }
        }
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Corn (maize)"), "Corn_maize");
        assert_eq!(sanitize_name("leaf-blight"), "leaf_blight");
        assert_eq!(sanitize_name("late  blight"), "late_blight");
        assert_eq!(sanitize_name("a - b"), "a_b");
        assert_eq!(sanitize_name("plain"), "plain");
    }

    #[test]
    fn test_derive_label_basic() {
        let parts = ["home", "data", "Mandua", "blast"];
        let label = derive_class_label(&parts, "data").unwrap();
        assert_eq!(label.crop, "Mandua");
        assert_eq!(label.disease, "blast");
        assert_eq!(label.folder_name(), "Mandua_blast");
    }

    #[test]
    fn test_derive_label_nested_leaf() {
        let parts = ["data", "Rice", "field shots", "brown-spot"];
        let label = derive_class_label(&parts, "data").unwrap();
        assert_eq!(label.crop, "Rice");
        assert_eq!(label.disease, "brown_spot");
    }

    #[test]
    fn test_derive_label_self_referential() {
        let parts = ["data", "Mandua", "Mandua"];
        assert_eq!(
            derive_class_label(&parts, "data"),
            Err(LabelError::SelfReferential)
        );

        // Case-insensitive comparison.
        let parts = ["data", "Healthy", "healthy"];
        assert_eq!(
            derive_class_label(&parts, "data"),
            Err(LabelError::SelfReferential)
        );
    }

    #[test]
    fn test_derive_label_depth_one_is_self_referential() {
        // A leaf directly under the root: crop and disease are the same
        // segment.
        let parts = ["data", "Mandua"];
        assert_eq!(
            derive_class_label(&parts, "data"),
            Err(LabelError::SelfReferential)
        );
    }

    #[test]
    fn test_derive_label_missing_root() {
        let parts = ["somewhere", "else", "blast"];
        assert_eq!(
            derive_class_label(&parts, "data"),
            Err(LabelError::MissingSourceSegment)
        );
    }

    #[test]
    fn test_derive_label_root_is_leaf() {
        let parts = ["home", "data"];
        assert_eq!(
            derive_class_label(&parts, "data"),
            Err(LabelError::MissingCropSegment)
        );
    }

    #[test]
    fn test_derive_label_sanitized_equality() {
        // Names that only differ by characters the sanitizer removes still
        // collide.
        let parts = ["data", "leaf blight", "leaf-blight"];
        assert_eq!(
            derive_class_label(&parts, "data"),
            Err(LabelError::SelfReferential)
        );
    }
}
