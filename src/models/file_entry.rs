use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeCategory {
    Document,
    Image,
    Video,
    Audio,
    Archive,
    Code,
    Other,
}

const CATEGORY_TABLE: &[(MimeCategory, &[&str])] = &[
    (
        MimeCategory::Document,
        &[
            "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "txt",
            "rtf", "csv", "md",
        ],
    ),
    (
        MimeCategory::Image,
        &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "ico", "tif", "tiff", "heic"],
    ),
    (
        MimeCategory::Video,
        &["mp4", "avi", "mov", "wmv", "flv", "mkv", "webm", "m4v"],
    ),
    (
        MimeCategory::Audio,
        &["mp3", "wav", "ogg", "flac", "aac", "m4a", "wma"],
    ),
    (
        MimeCategory::Archive,
        &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"],
    ),
    (
        MimeCategory::Code,
        &[
            "js", "ts", "jsx", "tsx", "html", "css", "json", "xml", "py", "java", "c", "cpp",
            "rs", "go", "php", "rb", "sh", "sql", "yml", "yaml",
        ],
    ),
];

impl MimeCategory {
    pub const ALL: [MimeCategory; 7] = [
        Self::Document,
        Self::Image,
        Self::Video,
        Self::Audio,
        Self::Archive,
        Self::Code,
        Self::Other,
    ];

    pub fn from_file_name(name: &str) -> Self {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return Self::Other;
        };
        let ext = ext.to_ascii_lowercase();
        if ext.is_empty() {
            return Self::Other;
        }

        CATEGORY_TABLE
            .iter()
            .find(|(_, extensions)| extensions.contains(&ext.as_str()))
            .map(|(category, _)| *category)
            .unwrap_or_else(|| Self::from_guessed_mime(&ext))
    }

    fn from_guessed_mime(ext: &str) -> Self {
        let Some(mime) = mime_guess::from_ext(ext).first() else {
            return Self::Other;
        };
        match mime.type_().as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "text" => Self::Document,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Archive => "archive",
            Self::Code => "code",
            Self::Other => "other",
        }
    }

    pub fn badge_color(self) -> &'static str {
        match self {
            Self::Document => "blue",
            Self::Image => "green",
            Self::Video => "purple",
            Self::Audio => "pink",
            Self::Archive => "yellow",
            Self::Code => "indigo",
            Self::Other => "gray",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Document => "file-text",
            Self::Image => "file-image",
            Self::Video => "file-video",
            Self::Audio => "file-audio",
            Self::Archive => "file-archive",
            Self::Code => "file-code",
            Self::Other => "file",
        }
    }
}

impl std::fmt::Display for MimeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MimeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown file type: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub mime_category: MimeCategory,
}

impl FileEntry {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        size_bytes: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            mime_category: MimeCategory::from_file_name(&name),
            name,
            size_bytes,
            created_at,
        }
    }
}

/// Contents of one location: files plus the folder names inferred below it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub files: Vec<FileEntry>,
    pub folders: Vec<String>,
}
