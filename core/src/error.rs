use thiserror::Error;

/// Failures of a single session round trip.
///
/// `Transport` and `Application` are reported the same way to the user; in
/// both cases the deck is left exactly as it was.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("empty prompt")]
    EmptyPrompt,

    /// The request never produced a usable response.
    #[error("{message}")]
    Transport { message: String },

    /// The service answered but put an error in the body.
    #[error("{message}")]
    Application { message: String },
}

impl SessionError {
    pub fn failure_message(&self) -> String {
        self.to_string()
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, SessionError::Transport { .. })
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No slides to generate. Please create slides first.")]
    EmptyDeck,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write presentation archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse TOML config: {source}")]
    TomlParse {
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },
}

pub type Result<T> = std::result::Result<T, SessionError>;
