// error.rs: Error types for stage configuration and computation.

use mtk_scene::SceneError;
use thiserror::Error;

use crate::planner::PlannerError;

/// Errors raised by the typed property store.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// The property was never declared on this stage.
    #[error("property '{0}' is not declared")]
    Undeclared(String),

    /// The property has neither a value nor a default.
    #[error("property '{0}' is undefined")]
    Undefined(String),

    /// The value does not match the property's declared type.
    #[error("property '{name}' expects {expected}: {source}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        source: serde_json::Error,
    },

    /// The value could not be converted to a property value at all.
    #[error("property '{name}' could not be serialized: {source}")]
    Serialization {
        name: String,
        source: serde_json::Error,
    },
}

/// Errors that stop a move-to computation. At the `compute` boundary every
/// one of these becomes the failure comment of the produced solution.
#[derive(Debug, Error)]
pub enum MoveToError {
    #[error("invalid joint model group: {0}")]
    InvalidGroup(String),

    #[error("undefined goal")]
    UndefinedGoal,

    #[error("unknown joint pose '{name}' for group '{group}'")]
    UnknownNamedPose { name: String, group: String },

    #[error("expecting a diff state")]
    NotADiffState,

    #[error("joint '{joint}' is not part of group '{group}'")]
    JointNotInGroup { joint: String, group: String },

    /// The ik_frame property is unset and the group has no unique tip.
    #[error("missing ik_frame: group '{group}' has {tips} end-effector tips")]
    MissingIkFrame { group: String, tips: usize },

    /// The ik_frame property has an empty frame and the group has no unique tip.
    #[error("frame_id of ik_frame is empty and group '{group}' has {tips} end-effector tips")]
    NoUniqueTip { group: String, tips: usize },

    #[error("unknown frame '{0}'")]
    UnknownFrame(String),

    #[error("invalid goal type: {0}")]
    InvalidGoalType(&'static str),

    /// The IK frame is not rigidly attached to any robot link.
    #[error("frame '{0}' is not rigidly attached to a robot link")]
    NoRigidParentLink(String),

    #[error("invalid timeout: {0}")]
    InvalidTimeout(f64),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Scene(SceneError),

    #[error(transparent)]
    Planner(#[from] PlannerError),
}

impl From<SceneError> for MoveToError {
    fn from(err: SceneError) -> Self {
        match err {
            SceneError::UnknownFrame(frame) => MoveToError::UnknownFrame(frame),
            other => MoveToError::Scene(other),
        }
    }
}

/// Errors loading a stage configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse stage config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error(transparent)]
    Stage(#[from] MoveToError),
}
