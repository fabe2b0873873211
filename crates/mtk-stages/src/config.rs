// config.rs: Stage configuration loaded from TOML.
//
// Example:
//
// ```toml
// name = "approach bin"
// group = "arm"
// timeout = 2.0
//
// [goal]
// type = "point"
// frame_id = "bin"
// point = [0.0, 0.0, 0.1]
//
// [planner]
// steps = 20
// ```

use std::path::Path;
use std::sync::Arc;

use mtk_scene::PoseStamped;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MoveToError};
use crate::goal::GoalSpecification;
use crate::move_to::MoveTo;
use crate::planner::{Constraints, Planner};
use crate::solvers::JointInterpolationPlanner;

/// Settings for the built-in joint interpolation planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Number of interpolation segments.
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Seconds per segment.
    #[serde(default = "default_segment_duration")]
    pub segment_duration: f64,
}

fn default_steps() -> usize {
    10
}

fn default_segment_duration() -> f64 {
    0.1
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            segment_duration: default_segment_duration(),
        }
    }
}

/// A move-to stage as described in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub group: String,
    /// Left out, the stage fails every compute with "undefined goal".
    #[serde(default)]
    pub goal: Option<GoalSpecification>,
    #[serde(default)]
    pub ik_frame: Option<PoseStamped>,
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    #[serde(default)]
    pub path_constraints: Constraints,
    #[serde(default)]
    pub store_failures: bool,
    #[serde(default)]
    pub planner: PlannerConfig,
}

fn default_name() -> String {
    "move to".to_string()
}

fn default_timeout() -> f64 {
    1.0
}

impl StageConfig {
    /// Load a stage config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn build_planner(&self) -> JointInterpolationPlanner {
        JointInterpolationPlanner::new(self.planner.steps, self.planner.segment_duration)
    }

    /// Build the stage around `planner`.
    pub fn build(&self, planner: Arc<dyn Planner>) -> Result<MoveTo, ConfigError> {
        let mut stage = MoveTo::new(&self.name, planner);
        stage.set_group(&self.group).map_err(MoveToError::from)?;
        if let Some(goal) = &self.goal {
            stage.set_goal(goal.clone()).map_err(MoveToError::from)?;
        }
        if let Some(frame) = &self.ik_frame {
            stage.set_ik_frame(frame.clone()).map_err(MoveToError::from)?;
        }
        stage.set_timeout(self.timeout).map_err(MoveToError::from)?;
        stage
            .set_path_constraints(self.path_constraints.clone())
            .map_err(MoveToError::from)?;
        stage.set_store_failures(self.store_failures);
        Ok(stage)
    }
}
