// goal.rs: Goal specification and joint-space goal decoding.
//
// A goal is exactly one of five encodings. The first three describe a
// joint configuration of the active group and are applied directly to the
// end state; the last two describe a Cartesian target for the IK frame.
//
// Joint-space variants are tried in a fixed order (named pose, diff state,
// joint map). Once a variant matches, its validation errors are final: the
// goal is never reinterpreted as a later variant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mtk_scene::{JointModelGroup, PointStamped, PoseStamped, RobotState, RobotStateMsg};

use crate::error::MoveToError;

/// Where the stage should move the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GoalSpecification {
    /// A predefined joint configuration of the group.
    NamedPose { name: String },
    /// A partial robot state; unlisted joints keep their value.
    DiffState(RobotStateMsg),
    /// Direct joint-variable assignment.
    JointMap { positions: BTreeMap<String, f64> },
    /// A Cartesian pose for the IK frame.
    Pose(PoseStamped),
    /// A Cartesian position for the IK frame; orientation is kept.
    Point(PointStamped),
}

impl GoalSpecification {
    pub fn named(name: impl Into<String>) -> Self {
        GoalSpecification::NamedPose { name: name.into() }
    }

    /// Stable name of the variant, as used in configuration files.
    pub fn kind(&self) -> &'static str {
        match self {
            GoalSpecification::NamedPose { .. } => "named_pose",
            GoalSpecification::DiffState(_) => "diff_state",
            GoalSpecification::JointMap { .. } => "joint_map",
            GoalSpecification::Pose(_) => "pose",
            GoalSpecification::Point(_) => "point",
        }
    }

    pub fn is_joint_space(&self) -> bool {
        !matches!(
            self,
            GoalSpecification::Pose(_) | GoalSpecification::Point(_)
        )
    }
}

impl From<BTreeMap<String, f64>> for GoalSpecification {
    fn from(positions: BTreeMap<String, f64>) -> Self {
        GoalSpecification::JointMap { positions }
    }
}

impl From<RobotStateMsg> for GoalSpecification {
    fn from(msg: RobotStateMsg) -> Self {
        GoalSpecification::DiffState(msg)
    }
}

impl From<PoseStamped> for GoalSpecification {
    fn from(pose: PoseStamped) -> Self {
        GoalSpecification::Pose(pose)
    }
}

impl From<PointStamped> for GoalSpecification {
    fn from(point: PointStamped) -> Self {
        GoalSpecification::Point(point)
    }
}

/// Apply a joint-space goal to `state`.
///
/// Returns `Ok(true)` when the goal was a joint-space goal and `state` now
/// holds the goal configuration, `Ok(false)` when the goal is Cartesian (and
/// `state` is untouched). A matched variant that fails validation leaves
/// `state` untouched and returns the error.
pub fn apply_joint_goal(
    goal: &GoalSpecification,
    group: &JointModelGroup,
    state: &mut RobotState,
) -> Result<bool, MoveToError> {
    match goal {
        GoalSpecification::NamedPose { name } => {
            if !state.set_to_named_state(group, name) {
                return Err(MoveToError::UnknownNamedPose {
                    name: name.clone(),
                    group: group.name().to_string(),
                });
            }
            Ok(true)
        }

        GoalSpecification::DiffState(msg) => {
            if !msg.is_diff {
                return Err(MoveToError::NotADiffState);
            }
            for joint in msg.referenced_joints() {
                ensure_in_group(joint, group)?;
            }
            state.apply_msg(msg)?;
            Ok(true)
        }

        GoalSpecification::JointMap { positions } => {
            for joint in positions.keys() {
                ensure_in_group(joint, group)?;
                // Multi-DOF joints have no variable of their own name.
                state.variable_position(joint)?;
            }
            for (joint, value) in positions {
                state.set_variable_position(joint, *value)?;
            }
            Ok(true)
        }

        GoalSpecification::Pose(_) | GoalSpecification::Point(_) => Ok(false),
    }
}

fn ensure_in_group(joint: &str, group: &JointModelGroup) -> Result<(), MoveToError> {
    if group.has_joint(joint) {
        Ok(())
    } else {
        Err(MoveToError::JointNotInGroup {
            joint: joint.to_string(),
            group: group.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::workcell_scene;
    use mtk_scene::{PoseMsg, SceneError};

    fn joints(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn named_pose_sets_group_configuration() {
        let scene = workcell_scene();
        let group = scene.robot_model().group("arm").unwrap().clone();
        let mut state = scene.current_state().clone();

        let handled = apply_joint_goal(&GoalSpecification::named("ready"), &group, &mut state).unwrap();
        assert!(handled);
        assert_eq!(state.variable_position("joint2").unwrap(), 0.5);
        assert_eq!(state.variable_position("joint3").unwrap(), -0.5);
    }

    #[test]
    fn unknown_named_pose_is_an_error() {
        let scene = workcell_scene();
        let group = scene.robot_model().group("arm").unwrap().clone();
        let mut state = scene.current_state().clone();

        let err = apply_joint_goal(&GoalSpecification::named("dance"), &group, &mut state).unwrap_err();
        assert!(matches!(err, MoveToError::UnknownNamedPose { ref name, .. } if name == "dance"));
        assert_eq!(&state, scene.current_state());
    }

    #[test]
    fn diff_state_must_be_marked_diff() {
        let scene = workcell_scene();
        let group = scene.robot_model().group("arm").unwrap().clone();
        let mut state = scene.current_state().clone();

        let mut msg = RobotStateMsg::diff_from_joints(&joints(&[("joint1", 0.2)]));
        msg.is_diff = false;
        let err = apply_joint_goal(&msg.into(), &group, &mut state).unwrap_err();
        assert!(matches!(err, MoveToError::NotADiffState));
    }

    #[test]
    fn diff_state_keeps_unlisted_joints() {
        let scene = workcell_scene();
        let group = scene.robot_model().group("arm").unwrap().clone();
        let mut state = scene.current_state().clone();

        let msg = RobotStateMsg::diff_from_joints(&joints(&[("joint1", 0.2)]));
        assert!(apply_joint_goal(&msg.into(), &group, &mut state).unwrap());
        assert_eq!(state.variable_position("joint1").unwrap(), 0.2);
        assert_eq!(state.variable_position("joint2").unwrap(), 0.3);
    }

    #[test]
    fn diff_state_rejects_foreign_joints() {
        let scene = workcell_scene();
        let group = scene.robot_model().group("torso").unwrap().clone();
        let mut state = scene.current_state().clone();

        let msg = RobotStateMsg::diff_from_joints(&joints(&[("joint1", 0.2), ("joint3", 1.0)]));
        let err = apply_joint_goal(&msg.into(), &group, &mut state).unwrap_err();
        assert!(matches!(
            err,
            MoveToError::JointNotInGroup { ref joint, ref group } if joint == "joint3" && group == "torso"
        ));
        assert_eq!(&state, scene.current_state());
    }

    #[test]
    fn diff_state_checks_multi_dof_joints() {
        let scene = workcell_scene();
        let mut msg = RobotStateMsg {
            is_diff: true,
            ..Default::default()
        };
        msg.multi_dof_joint_state.joint_names.push("base_joint".into());
        msg.multi_dof_joint_state
            .transforms
            .push(PoseMsg::from_position(1.0, 2.0, 0.0));
        let goal = GoalSpecification::from(msg);

        // Not part of the fixed arm group.
        let arm = scene.robot_model().group("arm").unwrap().clone();
        let mut state = scene.current_state().clone();
        let err = apply_joint_goal(&goal, &arm, &mut state).unwrap_err();
        assert!(matches!(err, MoveToError::JointNotInGroup { ref joint, .. } if joint == "base_joint"));

        // Accepted by the mobile group.
        let mobile = scene.robot_model().group("mobile_arm").unwrap().clone();
        assert!(apply_joint_goal(&goal, &mobile, &mut state).unwrap());
        assert_eq!(state.variable_position("base_joint/trans_y").unwrap(), 2.0);
    }

    #[test]
    fn joint_map_writes_variables() {
        let scene = workcell_scene();
        let group = scene.robot_model().group("arm").unwrap().clone();
        let mut state = scene.current_state().clone();

        let goal = GoalSpecification::from(joints(&[("joint1", 1.0), ("joint3", -1.0)]));
        assert!(apply_joint_goal(&goal, &group, &mut state).unwrap());
        assert_eq!(state.variable_position("joint1").unwrap(), 1.0);
        assert_eq!(state.variable_position("joint2").unwrap(), 0.3);
        assert_eq!(state.variable_position("joint3").unwrap(), -1.0);
    }

    #[test]
    fn joint_map_rejects_foreign_joint_without_writing() {
        let scene = workcell_scene();
        let group = scene.robot_model().group("torso").unwrap().clone();
        let mut state = scene.current_state().clone();

        let goal = GoalSpecification::from(joints(&[("joint1", 1.0), ("joint2", 1.0)]));
        let err = apply_joint_goal(&goal, &group, &mut state).unwrap_err();
        assert!(matches!(err, MoveToError::JointNotInGroup { ref joint, .. } if joint == "joint2"));
        assert_eq!(&state, scene.current_state());
    }

    #[test]
    fn joint_map_cannot_address_multi_dof_joint() {
        let scene = workcell_scene();
        let group = scene.robot_model().group("mobile_arm").unwrap().clone();
        let mut state = scene.current_state().clone();

        let goal = GoalSpecification::from(joints(&[("base_joint", 1.0)]));
        let err = apply_joint_goal(&goal, &group, &mut state).unwrap_err();
        assert!(matches!(err, MoveToError::Scene(SceneError::UnknownVariable(_))));
    }

    #[test]
    fn cartesian_goals_are_not_joint_goals() {
        let scene = workcell_scene();
        let group = scene.robot_model().group("arm").unwrap().clone();
        let mut state = scene.current_state().clone();

        let pose = GoalSpecification::from(PoseStamped::default());
        let point = GoalSpecification::from(PointStamped::new("world", 0.5, 0.0, 0.5));
        assert!(!apply_joint_goal(&pose, &group, &mut state).unwrap());
        assert!(!apply_joint_goal(&point, &group, &mut state).unwrap());
        assert_eq!(&state, scene.current_state());
    }

    #[test]
    fn goal_round_trips_through_toml() {
        let goal: GoalSpecification = toml::from_str(
            r#"
            type = "joint_map"
            positions = { joint1 = 0.25 }
            "#,
        )
        .unwrap();
        assert_eq!(goal.kind(), "joint_map");
        assert!(goal.is_joint_space());

        let point: GoalSpecification = toml::from_str(
            r#"
            type = "point"
            frame_id = "table"
            point = [0.0, 0.0, 0.3]
            "#,
        )
        .unwrap();
        assert_eq!(point, PointStamped::new("table", 0.0, 0.0, 0.3).into());
    }
}
