// target.rs: Cartesian target composition.
//
// Frame algebra here composes right-to-left, child into parent. All poses
// named `*_in_world` are expressed in the planning frame.
//
//   target                   = world_T_goalframe * goalframe_T_target
//   link target (for planner) = target * ik_in_world^-1 * parent_in_world
//
// The planner moves a link, not the IK frame. The second line swaps the IK
// frame for its rigid parent link: the link must end up where it sits
// relative to the IK frame today, with the IK frame on the target.

use mtk_scene::{PlanningScene, Pose};
use nalgebra::Translation3;

use crate::error::MoveToError;
use crate::goal::GoalSpecification;

/// Target pose for the IK frame in the planning frame.
///
/// Pose goals are mapped from their frame into the planning frame. Point
/// goals take their position from the goal and their orientation from the
/// IK frame's current orientation. Joint-space goals are rejected.
pub fn cartesian_target(
    goal: &GoalSpecification,
    ik_frame_in_world: &Pose,
    scene: &PlanningScene,
) -> Result<Pose, MoveToError> {
    match goal {
        GoalSpecification::Pose(stamped) => {
            let frame = scene.frame_transform(&stamped.frame_id)?;
            Ok(frame * stamped.pose.to_pose())
        }
        GoalSpecification::Point(stamped) => {
            let frame = scene.frame_transform(&stamped.frame_id)?;
            let point = frame * stamped.to_point();
            Ok(Pose::from_parts(
                Translation3::from(point.coords),
                ik_frame_in_world.rotation,
            ))
        }
        other => Err(MoveToError::InvalidGoalType(other.kind())),
    }
}

/// Re-express an IK-frame target as a target for the IK frame's rigid
/// parent link.
pub fn compose_link_target(target: &Pose, ik_frame_in_world: &Pose, parent_in_world: &Pose) -> Pose {
    target * ik_frame_in_world.inverse() * parent_in_world
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_close, workcell_scene};
    use mtk_scene::{PointStamped, PoseMsg, PoseStamped};
    use std::collections::BTreeMap;

    fn distance(a: &Pose, b: &Pose) -> f64 {
        (a.translation.vector - b.translation.vector).norm() + a.rotation.angle_to(&b.rotation)
    }

    #[test]
    fn pose_goal_is_mapped_from_its_frame() {
        let scene = workcell_scene();
        let goal = GoalSpecification::from(PoseStamped {
            frame_id: "table".into(),
            pose: PoseMsg::from_position(0.0, 0.1, 0.2),
        });
        let target = cartesian_target(&goal, &Pose::identity(), &scene).unwrap();
        // The table sits at (0.8, 0, 0) in the world.
        assert_close(target.translation.vector.x, 0.8);
        assert_close(target.translation.vector.y, 0.1);
        assert_close(target.translation.vector.z, 0.2);
    }

    #[test]
    fn point_goal_keeps_ik_orientation() {
        let scene = workcell_scene();
        let ik = scene.frame_transform("tool").unwrap();
        let goal = GoalSpecification::from(PointStamped::new("bin", 0.0, 0.0, 0.1));

        let target = cartesian_target(&goal, &ik, &scene).unwrap();
        assert_eq!(target.rotation, ik.rotation);
        assert_close(target.translation.vector.x, 0.5);
        assert_close(target.translation.vector.y, -0.5);
        assert_close(target.translation.vector.z, 0.3);
    }

    #[test]
    fn unknown_goal_frame_is_reported() {
        let scene = workcell_scene();
        let goal = GoalSpecification::from(PointStamped::new("shelf", 0.0, 0.0, 0.0));
        let err = cartesian_target(&goal, &Pose::identity(), &scene).unwrap_err();
        assert!(matches!(err, MoveToError::UnknownFrame(ref f) if f == "shelf"));
    }

    #[test]
    fn joint_goal_is_an_invalid_cartesian_goal() {
        let scene = workcell_scene();
        let goal = GoalSpecification::from(BTreeMap::<String, f64>::new());
        let err = cartesian_target(&goal, &Pose::identity(), &scene).unwrap_err();
        assert!(matches!(err, MoveToError::InvalidGoalType("joint_map")));
        assert_eq!(err.to_string(), "invalid goal type: joint_map");
    }

    #[test]
    fn link_target_cancels_ik_offset() {
        let scene = workcell_scene();
        // IK frame: the pen tip, rigidly attached to link3 via tool and flange.
        let ik_in_world = scene.frame_transform("pen").unwrap();
        let parent_in_world = scene.frame_transform("link3").unwrap();

        // Asking the IK frame to stay where it is leaves the link where it is.
        let link_target = compose_link_target(&ik_in_world, &ik_in_world, &parent_in_world);
        assert_close(distance(&link_target, &parent_in_world), 0.0);
    }

    #[test]
    fn point_goal_round_trips_through_ik_offset() {
        let scene = workcell_scene();
        let ik_in_world = scene.frame_transform("pen").unwrap();
        let parent_in_world = scene.frame_transform("link3").unwrap();
        let requested = PointStamped::new("world", 0.6, 0.2, 0.4);

        let target = cartesian_target(&requested.clone().into(), &ik_in_world, &scene).unwrap();
        let link_target = compose_link_target(&target, &ik_in_world, &parent_in_world);

        // Re-apply the link -> IK frame offset: the IK frame lands on the point.
        let link_t_ik = parent_in_world.inverse() * ik_in_world;
        let reached = link_target * link_t_ik;
        let p = reached.translation.vector;
        assert_close(p.x, 0.6);
        assert_close(p.y, 0.2);
        assert_close(p.z, 0.4);
    }
}
