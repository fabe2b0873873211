//! # mtk-scene
//!
//! Robot model, robot state and planning scene for the MTK motion stages.
//!
//! Stages consume this crate as their view of the world: which frames exist,
//! where they are, which joints make up a kinematic group, and what the
//! robot's current configuration is.
//!
//! ## Key components
//!
//! - [`RobotModel`]: immutable kinematic tree built from a [`RobotDescription`]
//! - [`JointModelGroup`]: named subset of joints planned as one unit
//! - [`RobotState`]: full variable assignment plus attached bodies
//! - [`PlanningScene`]: robot state and world objects; resolves named frames
//! - [`RobotTrajectory`]: time-parameterised waypoints for one group
//! - [`Pose`]: rigid transform, composed right-to-left (child into parent)

pub mod error;
pub mod model;
pub mod pose;
pub mod scene;
pub mod state;
pub mod trajectory;

#[cfg(test)]
pub(crate) mod testing;

pub use error::SceneError;
pub use model::{
    GroupDescription, JointDescription, JointLimits, JointModel, JointModelGroup, JointType,
    LinkModel, RobotDescription, RobotModel,
};
pub use pose::{PointStamped, Pose, PoseMsg, PoseStamped};
pub use scene::{AttachedBodyDescription, PlanningScene, SceneDescription};
pub use state::{AttachedBody, JointStateMsg, MultiDofJointStateMsg, RobotState, RobotStateMsg};
pub use trajectory::RobotTrajectory;
