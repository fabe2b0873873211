//! Joint-space interpolation planner
//!
//! Produces a straight line in joint space between two configurations.
//! It does no collision checking and has no IK, so Cartesian requests
//! always fail without a trajectory.

use std::time::Duration;

use mtk_scene::{JointModelGroup, LinkModel, PlanningScene, Pose, RobotModel, RobotTrajectory};

use crate::planner::{Constraints, PlanResult, Planner, PlannerError};

/// Linear joint-space interpolation with a fixed number of segments.
#[derive(Debug, Clone)]
pub struct JointInterpolationPlanner {
    steps: usize,
    segment_duration: f64,
}

impl Default for JointInterpolationPlanner {
    fn default() -> Self {
        Self {
            steps: 10,
            segment_duration: 0.1,
        }
    }
}

impl JointInterpolationPlanner {
    pub fn new(steps: usize, segment_duration: f64) -> Self {
        Self {
            steps,
            segment_duration,
        }
    }
}

impl Planner for JointInterpolationPlanner {
    fn name(&self) -> &str {
        "joint_interpolation"
    }

    fn init(&self, model: &RobotModel) -> Result<(), PlannerError> {
        if self.steps == 0 {
            return Err(PlannerError::InvalidConfig("steps must be at least 1".into()));
        }
        if !(self.segment_duration.is_finite() && self.segment_duration > 0.0) {
            return Err(PlannerError::InvalidConfig(format!(
                "segment duration must be positive, got {}",
                self.segment_duration
            )));
        }
        if model.variable_count() == 0 {
            return Err(PlannerError::Incompatible {
                planner: self.name().to_string(),
                model: model.name().to_string(),
                reason: "model has no joint variables to interpolate".into(),
            });
        }
        tracing::debug!(model = model.name(), steps = self.steps, "joint interpolation ready");
        Ok(())
    }

    fn plan_joint(
        &self,
        from: &PlanningScene,
        to: &PlanningScene,
        group: &JointModelGroup,
        _timeout: Duration,
        path_constraints: &Constraints,
    ) -> PlanResult {
        let start = from.current_state();
        let goal = to.current_state();

        let mut trajectory = RobotTrajectory::new(group.name());
        trajectory.add_suffix_waypoint(start.clone(), 0.0);
        for i in 1..self.steps {
            let t = i as f64 / self.steps as f64;
            trajectory.add_suffix_waypoint(start.interpolate(goal, t, group), self.segment_duration);
        }
        // The goal itself, not an interpolated approximation of it.
        trajectory.add_suffix_waypoint(goal.clone(), self.segment_duration);

        let violation = trajectory
            .waypoints()
            .iter()
            .find_map(|w| path_constraints.violation(w));
        match violation {
            Some(reason) => {
                tracing::debug!(group = group.name(), %reason, "path constraint violated");
                PlanResult::failed(Some(trajectory))
            }
            None => PlanResult::succeeded(trajectory),
        }
    }

    fn plan_cartesian(
        &self,
        _from: &PlanningScene,
        link: &LinkModel,
        _target: &Pose,
        group: &JointModelGroup,
        _timeout: Duration,
        _path_constraints: &Constraints,
    ) -> PlanResult {
        tracing::warn!(
            link = link.name(),
            group = group.name(),
            "joint interpolation cannot plan to Cartesian targets"
        );
        PlanResult::failed(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::JointConstraint;
    use crate::testing::workcell_scene;
    use mtk_scene::RobotDescription;

    fn goal_scene(from: &PlanningScene) -> PlanningScene {
        let mut to = from.diff();
        to.current_state_mut().set_variable_position("joint1", 1.0).unwrap();
        to.current_state_mut().set_variable_position("joint3", -0.5).unwrap();
        to
    }

    #[test]
    fn interpolates_between_start_and_goal() {
        let from = workcell_scene();
        let to = goal_scene(&from);
        let group = from.robot_model().group("arm").unwrap();
        let planner = JointInterpolationPlanner::new(4, 0.25);

        let result = planner.plan_joint(&from, &to, group, Duration::from_secs(1), &Constraints::default());
        assert!(result.success);
        let traj = result.trajectory.unwrap();
        assert_eq!(traj.len(), 5);
        assert_eq!(traj.first_waypoint().unwrap(), from.current_state());
        assert_eq!(traj.last_waypoint().unwrap(), to.current_state());
        assert_eq!(traj.waypoint_times(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        let mid = &traj.waypoints()[2];
        assert!((mid.variable_position("joint1").unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn constraint_violation_keeps_trajectory() {
        let from = workcell_scene();
        let to = goal_scene(&from);
        let group = from.robot_model().group("arm").unwrap();
        let constraints = Constraints {
            name: "joint1 near zero".into(),
            joint_constraints: vec![JointConstraint {
                joint_name: "joint1".into(),
                position: 0.0,
                tolerance_above: 0.3,
                tolerance_below: 0.3,
            }],
        };

        let result = JointInterpolationPlanner::default().plan_joint(
            &from,
            &to,
            group,
            Duration::from_secs(1),
            &constraints,
        );
        assert!(!result.success);
        assert_eq!(result.trajectory.unwrap().len(), 11);
    }

    #[test]
    fn cartesian_requests_fail_without_trajectory() {
        let scene = workcell_scene();
        let group = scene.robot_model().group("arm").unwrap();
        let link = scene.robot_model().link("link3").unwrap();
        let result = JointInterpolationPlanner::default().plan_cartesian(
            &scene,
            link,
            &Pose::identity(),
            group,
            Duration::from_secs(1),
            &Constraints::default(),
        );
        assert_eq!(result, PlanResult::failed(None));
    }

    #[test]
    fn init_rejects_zero_steps() {
        let scene = workcell_scene();
        let planner = JointInterpolationPlanner::new(0, 0.1);
        assert!(matches!(
            planner.init(scene.robot_model()),
            Err(PlannerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn init_rejects_model_without_variables() {
        let desc: RobotDescription = toml::from_str(
            r#"
            name = "pedestal"
            root_link = "base"
            links = ["base"]
            "#,
        )
        .unwrap();
        let model = RobotModel::from_description(&desc).unwrap();
        let err = JointInterpolationPlanner::default().init(&model).unwrap_err();
        assert!(matches!(
            err,
            PlannerError::Incompatible { ref planner, ref model, .. }
                if planner == "joint_interpolation" && model == "pedestal"
        ));
    }
}
