//! Error types for twreport

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwreportError>;

#[derive(Error, Debug)]
pub enum TwreportError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

impl TwreportError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TwreportError::Remote(RemoteError::Authentication(_)) => 2,
            TwreportError::Input(InputError::Malformed { .. }) => 3,
            TwreportError::Remote(_) => 1,
            TwreportError::Input(_) => 1,
            TwreportError::Config(_) => 1,
            TwreportError::Output(_) => 1,
            TwreportError::Prompt(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to open input file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record{}: {message}", .line.map(|l| format!(" on line {}", l)).unwrap_or_default())]
    Malformed { line: Option<u64>, message: String },
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to open output file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write row: {0}")]
    Write(#[from] csv::Error),

    #[error("Failed to flush output: {0}")]
    Flush(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Client setup failed: {0}")]
    Client(String),
}

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Confirmation input closed before an answer was given")]
    Closed,

    #[error("Failed to read confirmation: {0}")]
    Io(#[from] std::io::Error),
}
