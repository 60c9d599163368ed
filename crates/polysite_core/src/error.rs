use thiserror::Error;

/// Unified error type for polysite operations
#[derive(Debug, Error)]
pub enum SiteError {
    /// Local file I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// content.json could not be parsed or produced
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A text artifact contained invalid UTF-8
    #[error("Invalid UTF-8 in text artifact: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The artifact set has no content.json manifest
    #[error("No content.json artifact found")]
    MissingContentManifest,

    /// A translation in content.json has no markdown body artifact
    #[error("Markdown body not found for translation: {lang}")]
    MissingTranslationBody {
        /// Language key with no matching `<lang>.md` artifact
        lang: String,
    },

    /// The theme contains no `.html` template file
    #[error("No HTML template file in theme")]
    MissingHtmlTemplate,

    /// The style compiler reported a failure
    #[error("Failed to compile styles. Status: {status}. {message}")]
    TemplateCompile {
        /// Non-zero compiler status
        status: i32,
        /// Compiler output, if any
        message: String,
    },

    /// The template engine rejected the template
    #[error("Template render error: {0}")]
    Render(String),

    /// An edit operation was rejected before any state changed
    #[error("{0}")]
    Validation(String),

    /// A list edit addressed a position that does not exist
    #[error("Index {index} out of range (max {max})")]
    IndexOutOfRange {
        /// The rejected index
        index: usize,
        /// Largest accepted index
        max: usize,
    },

    /// A storage operation failed
    #[error("Storage operation failed: {message}")]
    Storage {
        /// Underlying store error message
        message: String,
    },

    /// The config file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config could not be serialized
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// No platform config directory is available
    #[error("Could not determine config directory")]
    NoConfigDir,

    /// Building or reading a zip archive failed
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl SiteError {
    /// Wrap a store-level failure message.
    pub fn storage(message: impl Into<String>) -> Self {
        SiteError::Storage {
            message: message.into(),
        }
    }

    /// Edit-time validation failure with a user-facing message.
    pub fn validation(message: impl Into<String>) -> Self {
        SiteError::Validation(message.into())
    }
}

/// Result type alias for polysite operations
pub type Result<T> = std::result::Result<T, SiteError>;
