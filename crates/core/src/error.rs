/// Result alias that carries the custom [`HanabiError`] type.
pub type Result<T> = std::result::Result<T, HanabiError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum HanabiError {
    /// Free-form failure that does not fit any other variant.
    #[error("{0}")]
    Message(String),
    /// A configuration value is out of its usable range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The audio backend refused to decode, resume or play.
    #[error("audio: {0}")]
    Audio(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration files that are not valid JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Textures that fail to decode.
    #[error("{0}")]
    Image(#[from] image::ImageError),
}

impl HanabiError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn invalid_config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn audio<T: Into<String>>(msg: T) -> Self {
        Self::Audio(msg.into())
    }
}

impl From<&str> for HanabiError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for HanabiError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
