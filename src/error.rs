//! Error types for Kiln
//!
//! All modules use `KilnResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Kiln operations
pub type KilnResult<T> = Result<T, KilnError>;

/// Broad failure classes, used for reporting and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or an ordering mistake, detected before side effects
    Configuration,
    /// An external tool exited unsuccessfully or could not be spawned
    ExternalTool,
    /// Local filesystem operation failed
    Filesystem,
    /// Build artifacts are on disk but the canonical link is stale
    Inconsistent,
    /// Serialization or other internal failure
    Internal,
}

/// All errors that can occur in Kiln
#[derive(Error, Debug)]
pub enum KilnError {
    // Configuration errors
    #[error("Unrecognised build type: {value}. Must be one of: Debug, Release")]
    UnknownBuildType { value: String },

    #[error("Unrecognised isolation mode: {value}. Must be one of: Disabled, Simulation, Hardware")]
    UnknownIsolationMode { value: String },

    #[error("Unrecognised sanitiser: {value}")]
    UnknownSanitiser { value: String },

    #[error("Isolation mode {isolation} and sanitiser {sanitiser} are incompatible")]
    IncompatibleOptions { isolation: String, sanitiser: String },

    #[error("Expected dependency cache in {}", path.display())]
    DependencyCacheMissing { path: PathBuf },

    #[error("No build directory found in {}", root.display())]
    NoBuildDirectory { root: PathBuf },

    #[error("Invalid configuration at {}: {reason}", path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Unknown configuration key: {0}")]
    ConfigKey(String),

    #[error("Failed to create config directory {}: {source}", path.display())]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // External tool errors
    #[error("Command failed: {command}, exit code: {code}")]
    ToolFailed {
        command: String,
        code: i32,
        output: Option<String>,
    },

    #[error("Command terminated by signal: {command}")]
    ToolSignaled { command: String },

    #[error("Failed to run command: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Filesystem errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Build succeeded but {} could not be pointed at {}", link.display(), target.display())]
    StaleBinaryLink {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML edit error: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KilnError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownBuildType { .. }
            | Self::UnknownIsolationMode { .. }
            | Self::UnknownSanitiser { .. }
            | Self::IncompatibleOptions { .. }
            | Self::DependencyCacheMissing { .. }
            | Self::NoBuildDirectory { .. }
            | Self::ConfigInvalid { .. }
            | Self::ConfigKey(_) => ErrorKind::Configuration,
            Self::ToolFailed { .. } | Self::ToolSignaled { .. } | Self::CommandFailed { .. } => {
                ErrorKind::ExternalTool
            }
            Self::ConfigDirCreate { .. } | Self::Io { .. } => ErrorKind::Filesystem,
            Self::StaleBinaryLink { .. } => ErrorKind::Inconsistent,
            Self::Json(_)
            | Self::TomlParse(_)
            | Self::TomlSerialize(_)
            | Self::TomlEdit(_)
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Process exit code for this error
    ///
    /// A failing tool's own exit code is passed through.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ToolFailed { code, .. } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
            Self::StaleBinaryLink { .. } => 3,
            _ => 1,
        }
    }

    /// Tail of the tool's output captured while streaming, if any
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            Self::ToolFailed { output, .. } => output.as_deref(),
            _ => None,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DependencyCacheMissing { .. } => Some("Run: kiln deps"),
            Self::NoBuildDirectory { .. } => Some("Run: kiln configure"),
            Self::IncompatibleOptions { .. } => {
                Some("Sanitised builds require --isolation Disabled")
            }
            Self::StaleBinaryLink { .. } => {
                Some("Build artifacts are on disk; fix permissions and rerun to republish bin")
            }
            Self::CommandFailed { .. } => Some("Check that the tool is installed and on PATH"),
            _ => None,
        }
    }
}
