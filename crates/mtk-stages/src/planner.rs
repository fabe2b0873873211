//! Planner trait and planning result types
//!
//! The stage does not plan motions itself. It prepares a request and hands
//! it to a [`Planner`] using one of two calling conventions: joint-space
//! (reach the configuration of an end scene) or Cartesian (bring a link to
//! a target pose). Success and the presence of a trajectory are independent:
//! a planner may fail with a partial trajectory kept for diagnostics, or
//! time out with nothing at all.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mtk_scene::{JointModelGroup, LinkModel, PlanningScene, Pose, RobotModel, RobotState, RobotTrajectory};

/// Errors a planner can raise while being set up for a robot model.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planner '{planner}' cannot plan for robot '{model}': {reason}")]
    Incompatible {
        planner: String,
        model: String,
        reason: String,
    },

    #[error("invalid planner configuration: {0}")]
    InvalidConfig(String),
}

/// Bound on a single joint variable along the whole path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointConstraint {
    pub joint_name: String,
    pub position: f64,
    #[serde(default)]
    pub tolerance_above: f64,
    #[serde(default)]
    pub tolerance_below: f64,
}

/// Constraints to maintain along a planned path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub joint_constraints: Vec<JointConstraint>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.joint_constraints.is_empty()
    }

    /// Describe the first constraint `state` violates, if any. A constraint
    /// on a variable the model does not have is always violated.
    pub fn violation(&self, state: &RobotState) -> Option<String> {
        self.joint_constraints.iter().find_map(|c| {
            match state.variable_position(&c.joint_name) {
                Ok(value) => {
                    let low = c.position - c.tolerance_below;
                    let high = c.position + c.tolerance_above;
                    (value < low || value > high).then(|| {
                        format!(
                            "joint '{}' at {:.4} outside [{:.4}, {:.4}]",
                            c.joint_name, value, low, high
                        )
                    })
                }
                Err(_) => Some(format!("constraint on unknown joint '{}'", c.joint_name)),
            }
        })
    }
}

/// Outcome of one planning call.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanResult {
    pub trajectory: Option<RobotTrajectory>,
    pub success: bool,
}

impl PlanResult {
    pub fn succeeded(trajectory: RobotTrajectory) -> Self {
        Self {
            trajectory: Some(trajectory),
            success: true,
        }
    }

    pub fn failed(trajectory: Option<RobotTrajectory>) -> Self {
        Self {
            trajectory,
            success: false,
        }
    }
}

/// A motion planner usable by the move-to stage.
///
/// Both calls block until a result is available or `timeout` expires;
/// the planner is trusted to honor the timeout.
pub trait Planner: Send + Sync {
    /// Planner display name (for logs and CLI output)
    fn name(&self) -> &str;

    /// Prepare for planning with `model`. Called once when the stage is
    /// initialised.
    fn init(&self, _model: &RobotModel) -> Result<(), PlannerError> {
        Ok(())
    }

    /// Plan from the current state of `from` to the current state of `to`.
    fn plan_joint(
        &self,
        from: &PlanningScene,
        to: &PlanningScene,
        group: &JointModelGroup,
        timeout: Duration,
        path_constraints: &Constraints,
    ) -> PlanResult;

    /// Plan from the current state of `from` until `link` reaches `target`
    /// (in the planning frame).
    fn plan_cartesian(
        &self,
        from: &PlanningScene,
        link: &LinkModel,
        target: &Pose,
        group: &JointModelGroup,
        timeout: Duration,
        path_constraints: &Constraints,
    ) -> PlanResult;
}
