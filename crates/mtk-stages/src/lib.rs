//! # mtk-stages
//!
//! The move-to stage of an MTK motion pipeline.
//!
//! A [`MoveTo`] stage takes the scene handed over by its neighbour, works
//! out what the goal means (a joint configuration or a Cartesian target for
//! an IK frame), asks a [`Planner`] for a trajectory and packages the result
//! as a [`SubTrajectory`] in the requested [`Direction`].
//!
//! ## Pipeline
//!
//! 1. [`goal::apply_joint_goal`]: named pose, diff state or joint map
//!    applied to the end state
//! 2. [`ik_frame::resolve_ik_frame`]: the frame that must reach a
//!    Cartesian target, defaulting to the group's unique tip
//! 3. [`target::cartesian_target`] and [`target::compose_link_target`]:
//!    goal pose in the planning frame, then re-expressed for the IK frame's
//!    rigid parent link
//! 4. [`Planner::plan_joint`] or [`Planner::plan_cartesian`]
//! 5. [`solution::package_trajectory`]: end state, direction, failures

pub mod config;
pub mod cost;
pub mod error;
pub mod goal;
pub mod ik_frame;
pub mod move_to;
pub mod planner;
pub mod properties;
pub mod solution;
pub mod solvers;
pub mod target;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{PlannerConfig, StageConfig};
pub use cost::{CostTerm, PathLength, TrajectoryDuration};
pub use error::{ConfigError, MoveToError, PropertyError};
pub use goal::GoalSpecification;
pub use ik_frame::ResolvedIkFrame;
pub use move_to::{InterfaceState, MoveTo, StageOutput};
pub use planner::{Constraints, JointConstraint, PlanResult, Planner, PlannerError};
pub use properties::{PropertyMap, PropertySummary};
pub use solution::{Direction, FrameMarker, SubTrajectory};
pub use solvers::JointInterpolationPlanner;
