//! Preview category lookup: MIME table first, then extension table.

use serde::{Deserialize, Serialize};

use super::QuickLookFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Preview renderer category.
pub enum FileType {
    /// Raster or vector image.
    Image,
    /// Video clip.
    Video,
    /// Audio clip.
    Audio,
    /// PDF document.
    Pdf,
    /// Plain text.
    Text,
    /// Source code or structured data.
    Code,
    /// Markdown document.
    Markdown,
    /// Office document, spreadsheet or slides.
    Document,
    /// Compressed archive.
    Archive,
    /// No preview available.
    Unknown,
}

const MIME_TYPES: &[(&str, FileType)] = &[
    ("application/pdf", FileType::Pdf),
    ("text/markdown", FileType::Markdown),
    ("text/x-markdown", FileType::Markdown),
    ("application/json", FileType::Code),
    ("application/javascript", FileType::Code),
    ("application/typescript", FileType::Code),
    ("application/xml", FileType::Code),
    ("text/html", FileType::Code),
    ("text/css", FileType::Code),
    ("text/javascript", FileType::Code),
    ("application/zip", FileType::Archive),
    ("application/gzip", FileType::Archive),
    ("application/x-tar", FileType::Archive),
    ("application/x-7z-compressed", FileType::Archive),
    ("application/msword", FileType::Document),
    ("application/rtf", FileType::Document),
];

const MIME_PREFIXES: &[(&str, FileType)] = &[
    ("image/", FileType::Image),
    ("video/", FileType::Video),
    ("audio/", FileType::Audio),
    ("application/vnd.openxmlformats-officedocument.", FileType::Document),
    ("application/vnd.oasis.opendocument.", FileType::Document),
    ("text/", FileType::Text),
];

const EXTENSIONS: &[(&[&str], FileType)] = &[
    (
        &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "ico", "heic", "avif"],
        FileType::Image,
    ),
    (&["mp4", "webm", "mov", "mkv", "avi", "m4v"], FileType::Video),
    (&["mp3", "wav", "ogg", "flac", "m4a", "aac"], FileType::Audio),
    (&["pdf"], FileType::Pdf),
    (&["md", "markdown"], FileType::Markdown),
    (&["txt", "log", "csv", "ini", "cfg"], FileType::Text),
    (
        &[
            "rs", "js", "jsx", "ts", "tsx", "json", "toml", "yaml", "yml", "html", "css", "py",
            "go", "java", "c", "h", "cpp", "sh", "xml",
        ],
        FileType::Code,
    ),
    (
        &["doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "pages"],
        FileType::Document,
    ),
    (&["zip", "tar", "gz", "tgz", "7z", "rar"], FileType::Archive),
];

/// Classifies `file` for preview.
pub fn file_type(file: &QuickLookFile) -> FileType {
    file.mime_type
        .as_deref()
        .and_then(type_for_mime)
        .or_else(|| type_for_name(&file.name))
        .unwrap_or(FileType::Unknown)
}

fn type_for_mime(mime: &str) -> Option<FileType> {
    let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(candidate, _)| *candidate == essence)
        .or_else(|| {
            MIME_PREFIXES
                .iter()
                .find(|(prefix, _)| essence.starts_with(prefix))
        })
        .map(|(_, kind)| *kind)
}

fn type_for_name(name: &str) -> Option<FileType> {
    let (stem, extension) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let extension = extension.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(extensions, _)| extensions.contains(&extension.as_str()))
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: Option<&str>) -> QuickLookFile {
        let mut file = QuickLookFile::new(name, name, format!("/Users/guest/{name}"));
        file.mime_type = mime.map(str::to_string);
        file
    }

    #[test]
    fn mime_type_wins_over_extension() {
        assert_eq!(file_type(&file("notes.txt", Some("text/markdown"))), FileType::Markdown);
        assert_eq!(file_type(&file("scan", Some("application/pdf"))), FileType::Pdf);
        assert_eq!(
            file_type(&file("photo.bin", Some("image/jpeg; q=0.9"))),
            FileType::Image
        );
        assert_eq!(file_type(&file("readme", Some("text/plain"))), FileType::Text);
    }

    #[test]
    fn unknown_mime_falls_back_to_extension() {
        assert_eq!(
            file_type(&file("clip.MOV", Some("application/octet-stream"))),
            FileType::Video
        );
        assert_eq!(file_type(&file("main.rs", None)), FileType::Code);
        assert_eq!(file_type(&file("report.docx", None)), FileType::Document);
    }

    #[test]
    fn unclassifiable_files_are_unknown() {
        assert_eq!(file_type(&file("Makefile", None)), FileType::Unknown);
        assert_eq!(file_type(&file(".bashrc", None)), FileType::Unknown);
        assert_eq!(file_type(&file("data.xyz", None)), FileType::Unknown);
    }
}
