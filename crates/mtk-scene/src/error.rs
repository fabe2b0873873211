// error.rs: Error types for the scene and robot model.

use thiserror::Error;

/// Errors that can occur while building or querying a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// The scene or robot description could not be parsed.
    #[error("failed to parse description: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The robot description is structurally invalid.
    #[error("invalid robot model '{model}': {reason}")]
    InvalidModel { model: String, reason: String },

    /// A frame was requested that the scene cannot resolve.
    #[error("unknown frame '{0}'")]
    UnknownFrame(String),

    /// A link name is not part of the robot model.
    #[error("unknown link '{0}'")]
    UnknownLink(String),

    /// A joint name is not part of the robot model.
    #[error("unknown joint '{0}'")]
    UnknownJoint(String),

    /// A variable name is not part of the robot model.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// A joint-state message has mismatched name and value lists.
    #[error("malformed state message: {0}")]
    MalformedState(String),
}
