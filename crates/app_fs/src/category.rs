//! Extension-derived file categories

use serde::{Deserialize, Serialize};

const IMAGE: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "ico"];
const VIDEO: &[&str] = &["mp4", "webm", "mov", "avi", "mkv", "flv", "wmv"];
const AUDIO: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a", "aac"];
const DOCUMENT: &[&str] = &["pdf", "doc", "docx", "txt", "rtf", "odt", "md"];
const SPREADSHEET: &[&str] = &["xls", "xlsx", "csv", "ods"];
const PRESENTATION: &[&str] = &["ppt", "pptx", "odp"];
const ARCHIVE: &[&str] = &["zip", "rar", "7z", "tar", "gz"];
const CODE: &[&str] = &[
    "js", "ts", "jsx", "tsx", "html", "css", "scss", "json", "xml", "py", "java", "cpp", "c",
    "php", "rs",
];

/// Coarse content category of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Document,
    Spreadsheet,
    Presentation,
    Archive,
    Code,
    Other,
}

impl FileCategory {
    /// Classify a file by the extension of its name
    pub fn from_name(name: &str) -> Self {
        match extension(name) {
            Some(ext) => Self::from_extension(&ext),
            None => FileCategory::Other,
        }
    }

    /// Classify a lowercase extension (without the dot)
    pub fn from_extension(ext: &str) -> Self {
        let tables: [(&[&str], FileCategory); 8] = [
            (IMAGE, FileCategory::Image),
            (VIDEO, FileCategory::Video),
            (AUDIO, FileCategory::Audio),
            (DOCUMENT, FileCategory::Document),
            (SPREADSHEET, FileCategory::Spreadsheet),
            (PRESENTATION, FileCategory::Presentation),
            (ARCHIVE, FileCategory::Archive),
            (CODE, FileCategory::Code),
        ];

        tables
            .iter()
            .find(|(exts, _)| exts.contains(&ext))
            .map(|(_, category)| *category)
            .unwrap_or(FileCategory::Other)
    }

    pub fn is_image(self) -> bool {
        self == FileCategory::Image
    }

    /// Text-like office content: documents, spreadsheets, presentations
    pub fn is_document(self) -> bool {
        matches!(
            self,
            FileCategory::Document | FileCategory::Spreadsheet | FileCategory::Presentation
        )
    }

    /// Audio or video
    pub fn is_media(self) -> bool {
        matches!(self, FileCategory::Video | FileCategory::Audio)
    }
}

/// Lowercase extension of a file name, without the dot
///
/// Dotfiles such as `.bashrc` have no extension.
pub fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Best-effort MIME type for a file name
pub fn guess_mime(name: &str) -> Option<&'static str> {
    let mime = match extension(name)?.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "html" => "text/html",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(extension("a.TXT").as_deref(), Some("txt"));
        assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension(".bashrc"), None);
        assert_eq!(extension("README"), None);
        assert_eq!(extension("trailing."), None);
    }

    #[test]
    fn test_categories() {
        assert_eq!(FileCategory::from_name("photo.JPG"), FileCategory::Image);
        assert_eq!(FileCategory::from_name("clip.mov"), FileCategory::Video);
        assert_eq!(FileCategory::from_name("song.flac"), FileCategory::Audio);
        assert_eq!(FileCategory::from_name("notes.md"), FileCategory::Document);
        assert_eq!(FileCategory::from_name("budget.xlsx"), FileCategory::Spreadsheet);
        assert_eq!(FileCategory::from_name("main.rs"), FileCategory::Code);
        assert_eq!(FileCategory::from_name("blob.bin"), FileCategory::Other);
    }

    #[test]
    fn test_filter_groups() {
        assert!(FileCategory::Spreadsheet.is_document());
        assert!(FileCategory::Presentation.is_document());
        assert!(!FileCategory::Image.is_document());
        assert!(FileCategory::Audio.is_media());
        assert!(!FileCategory::Archive.is_media());
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime("a.png"), Some("image/png"));
        assert_eq!(guess_mime("a.unknown"), None);
        assert_eq!(guess_mime("noext"), None);
    }
}
