// solution.rs: Stage solutions and trajectory packaging.

use std::fmt;

use mtk_scene::{JointModelGroup, PlanningScene, Pose, PoseMsg, RobotState, RobotTrajectory};
use serde::{Deserialize, Serialize};

use crate::planner::PlanResult;

/// Direction a stage was asked to propagate in. Backward solutions are
/// computed from the end state and reversed before hand-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// A coordinate-frame visualisation marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameMarker {
    /// Marker namespace, e.g. "target frame".
    pub ns: String,
    /// Frame the pose is expressed in.
    pub frame_id: String,
    pub pose: PoseMsg,
    /// Axis length.
    pub scale: f64,
}

/// One stage solution: a trajectory (possibly absent), its status and
/// diagnostics.
#[derive(Debug, Clone, Default)]
pub struct SubTrajectory {
    trajectory: Option<RobotTrajectory>,
    failed: bool,
    comment: String,
    cost: f64,
    markers: Vec<FrameMarker>,
}

impl SubTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trajectory(&self) -> Option<&RobotTrajectory> {
        self.trajectory.as_ref()
    }

    pub fn set_trajectory(&mut self, trajectory: RobotTrajectory) {
        self.trajectory = Some(trajectory);
    }

    pub fn is_failure(&self) -> bool {
        self.failed
    }

    /// Mark as failed. An empty comment keeps any comment already set.
    pub fn mark_as_failure(&mut self, comment: impl Into<String>) {
        self.failed = true;
        let comment = comment.into();
        if !comment.is_empty() {
            self.comment = comment;
        }
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn set_cost(&mut self, cost: f64) {
        self.cost = cost;
    }

    pub fn markers(&self) -> &[FrameMarker] {
        &self.markers
    }

    /// Append a frame marker for `pose`, expressed in `frame_id`.
    pub fn add_frame_marker(&mut self, ns: &str, frame_id: &str, pose: &Pose, scale: f64) {
        self.markers.push(FrameMarker {
            ns: ns.to_string(),
            frame_id: frame_id.to_string(),
            pose: PoseMsg::from(*pose),
            scale,
        });
    }
}

/// Two-waypoint trajectory from `start` (t = 0) to `end` (t = 1), kept when
/// planning produced nothing so failures can still be inspected.
fn stall_trajectory(start: &RobotState, end: &RobotState, group: &JointModelGroup) -> RobotTrajectory {
    let mut trajectory = RobotTrajectory::new(group.name());
    trajectory.add_suffix_waypoint(start.clone(), 0.0);
    trajectory.add_suffix_waypoint(end.clone(), 1.0);
    trajectory
}

/// Attach a planning result to `solution` and advance `end_scene`.
///
/// With no trajectory and `store_failures` set, a stall trajectory from
/// `start` to the end scene's current state stands in. The end scene takes
/// the trajectory's last waypoint before any reversal; for
/// [`Direction::Backward`] the attached trajectory is then reversed.
/// An unsuccessful plan marks the solution failed with its trajectory kept.
///
/// Returns whether a trajectory was attached. When none was, the solution
/// is left untouched.
pub fn package_trajectory(
    result: PlanResult,
    start: &RobotState,
    end_scene: &mut PlanningScene,
    group: &JointModelGroup,
    direction: Direction,
    store_failures: bool,
    solution: &mut SubTrajectory,
) -> bool {
    let PlanResult { trajectory, success } = result;
    let trajectory = match trajectory {
        Some(t) => Some(t),
        None if store_failures => Some(stall_trajectory(start, end_scene.current_state(), group)),
        None => None,
    };

    let Some(mut trajectory) = trajectory else {
        return false;
    };

    if let Some(last) = trajectory.last_waypoint() {
        end_scene.set_current_state(last.clone());
    }
    if direction == Direction::Backward {
        trajectory.reverse();
    }
    solution.set_trajectory(trajectory);

    if !success {
        solution.mark_as_failure("");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::workcell_scene;

    fn moved(scene: &PlanningScene, joint1: f64) -> RobotState {
        let mut state = scene.current_state().clone();
        state.set_variable_position("joint1", joint1).unwrap();
        state
    }

    fn three_point(scene: &PlanningScene) -> RobotTrajectory {
        let mut t = RobotTrajectory::new("arm");
        t.add_suffix_waypoint(moved(scene, 0.0), 0.0);
        t.add_suffix_waypoint(moved(scene, 0.4), 0.5);
        t.add_suffix_waypoint(moved(scene, 1.0), 0.5);
        t
    }

    #[test]
    fn forward_success_advances_end_scene() {
        let upstream = workcell_scene();
        let mut end = upstream.diff();
        let group = upstream.robot_model().group("arm").unwrap();
        let traj = three_point(&upstream);
        let mut solution = SubTrajectory::new();

        let attached = package_trajectory(
            PlanResult::succeeded(traj.clone()),
            upstream.current_state(),
            &mut end,
            group,
            Direction::Forward,
            false,
            &mut solution,
        );
        assert!(attached);
        assert!(!solution.is_failure());
        assert_eq!(solution.trajectory(), Some(&traj));
        assert_eq!(end.current_state(), &moved(&upstream, 1.0));
    }

    #[test]
    fn backward_reverses_after_taking_last_waypoint() {
        let upstream = workcell_scene();
        let mut end = upstream.diff();
        let group = upstream.robot_model().group("arm").unwrap();
        let mut solution = SubTrajectory::new();

        package_trajectory(
            PlanResult::succeeded(three_point(&upstream)),
            upstream.current_state(),
            &mut end,
            group,
            Direction::Backward,
            false,
            &mut solution,
        );
        // End scene holds the pre-reversal last waypoint.
        assert_eq!(end.current_state(), &moved(&upstream, 1.0));
        let traj = solution.trajectory().unwrap();
        assert_eq!(traj.first_waypoint().unwrap(), &moved(&upstream, 1.0));
        assert_eq!(traj.last_waypoint().unwrap(), &moved(&upstream, 0.0));
    }

    #[test]
    fn failure_keeps_partial_trajectory() {
        let upstream = workcell_scene();
        let mut end = upstream.diff();
        let group = upstream.robot_model().group("arm").unwrap();
        let mut solution = SubTrajectory::new();
        solution.set_comment("constraint violated");

        let attached = package_trajectory(
            PlanResult::failed(Some(three_point(&upstream))),
            upstream.current_state(),
            &mut end,
            group,
            Direction::Forward,
            false,
            &mut solution,
        );
        assert!(attached);
        assert!(solution.is_failure());
        assert_eq!(solution.comment(), "constraint violated");
        assert_eq!(solution.trajectory().unwrap().len(), 3);
    }

    #[test]
    fn missing_trajectory_stalls_when_storing_failures() {
        let upstream = workcell_scene();
        let mut end = upstream.diff();
        end.set_current_state(moved(&upstream, 0.7));
        let group = upstream.robot_model().group("arm").unwrap();
        let mut solution = SubTrajectory::new();

        let attached = package_trajectory(
            PlanResult::failed(None),
            upstream.current_state(),
            &mut end,
            group,
            Direction::Forward,
            true,
            &mut solution,
        );
        assert!(attached);
        assert!(solution.is_failure());
        let traj = solution.trajectory().unwrap();
        assert_eq!(traj.len(), 2);
        assert_eq!(traj.waypoint_times(), vec![0.0, 1.0]);
        assert_eq!(traj.first_waypoint().unwrap(), upstream.current_state());
        assert_eq!(traj.last_waypoint().unwrap(), &moved(&upstream, 0.7));
    }

    #[test]
    fn missing_trajectory_without_storing_attaches_nothing() {
        let upstream = workcell_scene();
        let mut end = upstream.diff();
        let group = upstream.robot_model().group("arm").unwrap();
        let mut solution = SubTrajectory::new();

        let attached = package_trajectory(
            PlanResult::failed(None),
            upstream.current_state(),
            &mut end,
            group,
            Direction::Forward,
            false,
            &mut solution,
        );
        assert!(!attached);
        assert!(solution.trajectory().is_none());
        assert!(!solution.is_failure());
        assert_eq!(end.current_state(), upstream.current_state());
    }

    #[test]
    fn mark_as_failure_overrides_comment_only_when_given() {
        let mut solution = SubTrajectory::new();
        solution.mark_as_failure("undefined goal");
        solution.mark_as_failure("");
        assert_eq!(solution.comment(), "undefined goal");
    }

    #[test]
    fn direction_parses_from_snake_case() {
        let d: Direction = serde_json::from_str("\"backward\"").unwrap();
        assert_eq!(d, Direction::Backward);
        assert_eq!(Direction::default().to_string(), "forward");
    }
}
