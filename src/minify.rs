//! Reversible media stripping for zip-based office documents
//!
//! Documents that exceed the service's upload size ceiling can often still be
//! translated: almost all of their bulk is embedded media, which the service
//! never touches. A minifier session extracts the document package, relocates
//! every media file into a private backup tree while leaving a small
//! placeholder in its place, and re-archives the package for upload. After
//! translation the original media is reinserted byte-for-byte.
//!
//! A session owns one private temporary directory and handles exactly one
//! document; translating two documents concurrently requires two sessions.

use crate::error::{Error, MinifyError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;

/// Archive-based document extensions eligible for minification
pub const SUPPORTED_DOCUMENT_EXTENSIONS: &[&str] = &["docx", "pptx"];

/// Media file extensions that are stripped and backed up
const MEDIA_EXTENSIONS: &[&str] = &[
    // Images
    "png", "jpg", "jpeg", "emf", "bmp", "tif", "tiff", "gif", "svg", "wmf", "wdp",
    // Video
    "mp4", "asf", "avi", "m4v", "mpg", "mpeg", "wmv", "mov",
    // Audio
    "mp3", "m4a", "wav", "aiff", "au", "aac", "flac", "ogg", "wma", "mid", "midi",
];

/// Blob written in place of every stripped media file. Only presence and
/// archive validity matter; the service ignores media content.
const MEDIA_PLACEHOLDER: &[u8] = b"placeholder";

/// Soft warning threshold for the minified document size. Exceeding it
/// usually means the document embeds media of an unanticipated type.
const MINIFIED_SIZE_WARNING_BYTES: u64 = 5_000_000;

/// One minify/deminify session for one document
///
/// Owns a private temporary directory holding the extracted package tree and
/// the original-media backup. The directory is removed when the session is
/// dropped, or earlier when `deminify_document` is called with `cleanup`.
pub struct DocumentMinifier {
    temp_dir: TempDir,
}

impl DocumentMinifier {
    /// Create a session with a fresh private temporary directory
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        Ok(Self { temp_dir })
    }

    /// Create a session using a caller-provided temporary directory
    pub fn with_temp_dir(temp_dir: TempDir) -> Self {
        Self { temp_dir }
    }

    /// Path of the session's temporary directory
    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Returns true if the file's extension marks a document type that can be
    /// minified (a zip-based office package)
    pub fn can_minify(path: &Path) -> bool {
        matches!(extension_lowercase(path), Some(ext)
            if SUPPORTED_DOCUMENT_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Strip embedded media from a document, producing a smaller upload.
    ///
    /// Extracts the package into the session directory, moves every
    /// supported-media file into a mirrored backup tree (replacing it with a
    /// fixed placeholder), and re-archives the tree. Returns the path of the
    /// minified document inside the session directory. With `cleanup`, the
    /// extracted tree is removed afterwards (the media backup always stays —
    /// it is needed for deminification).
    pub fn minify_document(&self, input: &Path, cleanup: bool) -> Result<PathBuf> {
        self.minify_inner(input, cleanup).map_err(Error::Minification)
    }

    /// Reinsert the backed-up media into a translated document.
    ///
    /// Extracts `input` (the translated, still-minified document), moves every
    /// backed-up media file over its placeholder at the same relative path,
    /// and re-archives the tree to `output`, replacing any existing file
    /// there. With `cleanup`, the whole session directory content is removed;
    /// this is the terminal cleanup for the session.
    pub fn deminify_document(&self, input: &Path, output: &Path, cleanup: bool) -> Result<()> {
        self.deminify_inner(input, output, cleanup)
            .map_err(Error::Deminification)
    }

    fn minify_inner(
        &self,
        input: &Path,
        cleanup: bool,
    ) -> std::result::Result<PathBuf, MinifyError> {
        let extracted = self.extracted_dir();
        fs::create_dir_all(&extracted).map_err(|e| MinifyError::Extraction {
            archive: input.to_path_buf(),
            reason: format!("failed to create extraction directory: {e}"),
        })?;

        extract_archive(input, &extracted)?;
        let stripped = self.strip_media(&extracted)?;

        let extension = extension_lowercase(input).unwrap_or_else(|| "zip".to_string());
        let minified = self.temp_dir.path().join(format!("minified.{extension}"));
        create_archive(&extracted, &minified)?;

        if cleanup {
            remove_dir_tree(&extracted)?;
        }

        let minified_size = fs::metadata(&minified).map(|m| m.len()).unwrap_or(0);
        if minified_size > MINIFIED_SIZE_WARNING_BYTES {
            warn!(
                ?input,
                minified_size,
                "document is still large after minification, it may contain unsupported media types"
            );
        }

        info!(
            ?input,
            stripped_media = stripped,
            minified_size,
            "document minified"
        );
        Ok(minified)
    }

    fn deminify_inner(
        &self,
        input: &Path,
        output: &Path,
        cleanup: bool,
    ) -> std::result::Result<(), MinifyError> {
        let extracted = self.extracted_dir();

        // Re-extract from scratch so the re-archived tree reflects exactly the
        // document shape the translation step produced
        if extracted.exists() {
            remove_dir_tree(&extracted)?;
        }
        fs::create_dir_all(&extracted).map_err(|e| MinifyError::Extraction {
            archive: input.to_path_buf(),
            reason: format!("failed to create extraction directory: {e}"),
        })?;

        extract_archive(input, &extracted)?;
        let restored = self.restore_media(&extracted)?;
        create_archive(&extracted, output)?;

        if cleanup {
            remove_dir_tree(&extracted)?;
            let media = self.media_dir();
            if media.exists() {
                remove_dir_tree(&media)?;
            }
        }

        info!(?output, restored_media = restored, "document deminified");
        Ok(())
    }

    /// Move every supported-media file into the backup tree and write the
    /// placeholder in its place. Returns the number of files stripped.
    fn strip_media(&self, extracted: &Path) -> std::result::Result<usize, MinifyError> {
        let media_dir = self.media_dir();
        let mut stripped = 0;

        for entry in WalkDir::new(extracted) {
            let entry = entry.map_err(|e| MinifyError::Media {
                path: extracted.to_path_buf(),
                reason: format!("failed to walk extracted tree: {e}"),
            })?;
            if !entry.file_type().is_file() || !is_media_file(entry.path()) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(extracted)
                .map_err(|e| MinifyError::Media {
                    path: entry.path().to_path_buf(),
                    reason: format!("path escapes extracted tree: {e}"),
                })?
                .to_path_buf();
            let backup = media_dir.join(&relative);

            if let Some(parent) = backup.parent() {
                fs::create_dir_all(parent).map_err(|e| MinifyError::Media {
                    path: backup.clone(),
                    reason: format!("failed to create backup directory: {e}"),
                })?;
            }
            fs::rename(entry.path(), &backup).map_err(|e| MinifyError::Media {
                path: entry.path().to_path_buf(),
                reason: format!("failed to move media to backup: {e}"),
            })?;
            fs::write(entry.path(), MEDIA_PLACEHOLDER).map_err(|e| MinifyError::Media {
                path: entry.path().to_path_buf(),
                reason: format!("failed to write placeholder: {e}"),
            })?;

            debug!(media = ?relative, "stripped media file");
            stripped += 1;
        }

        Ok(stripped)
    }

    /// Move every backed-up media file back over its placeholder. Returns the
    /// number of files restored.
    fn restore_media(&self, extracted: &Path) -> std::result::Result<usize, MinifyError> {
        let media_dir = self.media_dir();
        if !media_dir.exists() {
            debug!("no media backup present, nothing to restore");
            return Ok(0);
        }

        let mut restored = 0;
        for entry in WalkDir::new(&media_dir) {
            let entry = entry.map_err(|e| MinifyError::Media {
                path: media_dir.clone(),
                reason: format!("failed to walk media backup: {e}"),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&media_dir)
                .map_err(|e| MinifyError::Media {
                    path: entry.path().to_path_buf(),
                    reason: format!("path escapes media backup: {e}"),
                })?
                .to_path_buf();
            let destination = extracted.join(&relative);

            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).map_err(|e| MinifyError::Media {
                    path: destination.clone(),
                    reason: format!("failed to create destination directory: {e}"),
                })?;
            }
            // rename does not overwrite on all platforms; clear the
            // placeholder first
            if destination.exists() {
                fs::remove_file(&destination).map_err(|e| MinifyError::Media {
                    path: destination.clone(),
                    reason: format!("failed to remove placeholder: {e}"),
                })?;
            }
            fs::rename(entry.path(), &destination).map_err(|e| MinifyError::Media {
                path: entry.path().to_path_buf(),
                reason: format!("failed to restore media: {e}"),
            })?;

            debug!(media = ?relative, "restored media file");
            restored += 1;
        }

        Ok(restored)
    }

    fn extracted_dir(&self) -> PathBuf {
        self.temp_dir.path().join("extracted")
    }

    fn media_dir(&self) -> PathBuf {
        self.temp_dir.path().join("original_media")
    }
}

/// Lowercased extension of a path, if any
fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Returns true if the file's extension is in the media allowlist
fn is_media_file(path: &Path) -> bool {
    matches!(extension_lowercase(path), Some(ext) if MEDIA_EXTENSIONS.contains(&ext.as_str()))
}

/// Extract a zip archive fully into a directory
fn extract_archive(archive_path: &Path, dest: &Path) -> std::result::Result<(), MinifyError> {
    let file = fs::File::open(archive_path).map_err(|e| MinifyError::Extraction {
        archive: archive_path.to_path_buf(),
        reason: format!("failed to open archive: {e}"),
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| MinifyError::Extraction {
        archive: archive_path.to_path_buf(),
        reason: format!("failed to read archive: {e}"),
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| MinifyError::Extraction {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to read archive entry: {e}"),
        })?;

        let out_path = match entry.enclosed_name() {
            Some(path) => dest.join(path),
            None => {
                warn!(entry = entry.name(), "skipping entry with unsafe path");
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| MinifyError::Extraction {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to create directory: {e}"),
            })?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(|e| MinifyError::Extraction {
                    archive: archive_path.to_path_buf(),
                    reason: format!("failed to create parent directories: {e}"),
                })?;
            }
            let mut out_file = fs::File::create(&out_path).map_err(|e| MinifyError::Extraction {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to create output file: {e}"),
            })?;
            std::io::copy(&mut entry, &mut out_file).map_err(|e| MinifyError::Extraction {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to extract entry: {e}"),
            })?;
        }
    }

    Ok(())
}

/// Re-archive a directory tree into a zip file, replacing any existing file
/// at the target path
fn create_archive(src_dir: &Path, archive_path: &Path) -> std::result::Result<(), MinifyError> {
    let file = fs::File::create(archive_path).map_err(|e| MinifyError::Archival {
        archive: archive_path.to_path_buf(),
        reason: format!("failed to create archive file: {e}"),
    })?;
    let mut writer = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for entry in WalkDir::new(src_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| MinifyError::Archival {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to walk source tree: {e}"),
        })?;
        let relative = entry
            .path()
            .strip_prefix(src_dir)
            .map_err(|e| MinifyError::Archival {
                archive: archive_path.to_path_buf(),
                reason: format!("path escapes source tree: {e}"),
            })?;
        let name = relative.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            writer
                .add_directory(name, options)
                .map_err(|e| MinifyError::Archival {
                    archive: archive_path.to_path_buf(),
                    reason: format!("failed to add directory entry: {e}"),
                })?;
        } else {
            writer
                .start_file(name, options)
                .map_err(|e| MinifyError::Archival {
                    archive: archive_path.to_path_buf(),
                    reason: format!("failed to start archive entry: {e}"),
                })?;
            let mut src = fs::File::open(entry.path()).map_err(|e| MinifyError::Archival {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to open source file: {e}"),
            })?;
            std::io::copy(&mut src, &mut writer).map_err(|e| MinifyError::Archival {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to write archive entry: {e}"),
            })?;
        }
    }

    writer.finish().map_err(|e| MinifyError::Archival {
        archive: archive_path.to_path_buf(),
        reason: format!("failed to finalize archive: {e}"),
    })?;
    Ok(())
}

/// Remove a directory tree, mapping failures to a cleanup error
fn remove_dir_tree(dir: &Path) -> std::result::Result<(), MinifyError> {
    fs::remove_dir_all(dir).map_err(|e| MinifyError::Cleanup {
        dir: dir.to_path_buf(),
        reason: e.to_string(),
    })
}
