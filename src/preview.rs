//! File classification by extension and the viewer each class opens.

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "aac", "flac"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "mkv", "webm"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "docx", "doc", "xlsx", "xls", "pptx", "ppt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Image,
    Audio,
    Video,
    Document,
}

impl FileKind {
    pub fn label(self) -> &'static str {
        match self {
            FileKind::Text => "text",
            FileKind::Image => "image",
            FileKind::Audio => "audio",
            FileKind::Video => "video",
            FileKind::Document => "document",
        }
    }
}

/// Lower-cased text after the last dot, empty when the name has none.
pub fn extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// Unrecognized extensions fall back to text.
pub fn classify(name: &str) -> FileKind {
    let ext = extension(name);
    let ext = ext.as_str();
    if IMAGE_EXTENSIONS.contains(&ext) {
        FileKind::Image
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        FileKind::Audio
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        FileKind::Video
    } else if DOCUMENT_EXTENSIONS.contains(&ext) {
        FileKind::Document
    } else {
        FileKind::Text
    }
}

pub fn icon(name: &str, is_dir: bool) -> &'static str {
    if is_dir {
        return "📁";
    }
    match extension(name).as_str() {
        "pdf" => "📋",
        "doc" | "docx" => "📝",
        "xls" | "xlsx" => "📊",
        "ppt" | "pptx" => "📽️",
        "jpg" | "jpeg" | "png" | "gif" | "bmp" => "🖼️",
        "mp3" | "wav" | "ogg" => "🎵",
        "mp4" | "avi" | "mov" => "🎬",
        _ => "📄",
    }
}

/// Text for the listing's type column.
pub fn type_label(name: &str, is_dir: bool) -> String {
    if is_dir {
        return "Directory".to_string();
    }
    let ext = extension(name);
    if ext.is_empty() {
        "File".to_string()
    } else {
        ext.to_uppercase()
    }
}

/// MIME type handed to media viewers.
pub fn content_type(kind: FileKind, ext: &str) -> String {
    match (kind, ext) {
        (FileKind::Image, "jpg") => "image/jpeg".to_string(),
        (FileKind::Image, "svg") => "image/svg+xml".to_string(),
        (FileKind::Image, _) => format!("image/{}", ext),
        (FileKind::Audio, _) => format!("audio/{}", ext),
        (FileKind::Video, _) => format!("video/{}", ext),
        (FileKind::Document, "pdf") => "application/pdf".to_string(),
        _ => "text/plain".to_string(),
    }
}

/// Viewer to open for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Editor { path: String, name: String },
    Pdf { path: String, name: String },
    Unsupported { name: String, ext: String },
    Media {
        path: String,
        name: String,
        kind: FileKind,
        content_type: String,
    },
}

pub fn dispatch(path: &str, name: &str) -> Preview {
    let kind = classify(name);
    let ext = extension(name);
    match kind {
        FileKind::Text => Preview::Editor {
            path: path.to_string(),
            name: name.to_string(),
        },
        FileKind::Document if ext == "pdf" => Preview::Pdf {
            path: path.to_string(),
            name: name.to_string(),
        },
        FileKind::Document => Preview::Unsupported {
            name: name.to_string(),
            ext,
        },
        FileKind::Image | FileKind::Audio | FileKind::Video => Preview::Media {
            path: path.to_string(),
            name: name.to_string(),
            kind,
            content_type: content_type(kind, &ext),
        },
    }
}
