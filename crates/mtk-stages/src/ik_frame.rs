// ik_frame.rs: Resolving the frame that must reach a Cartesian target.
//
// The IK frame is a pose relative to some named frame, usually a link of
// the moving group. It can be given explicitly, given with an empty frame
// (offset relative to the group's tip), or left out entirely (the group's
// tip itself). Deriving the tip requires the group to have exactly one.

use mtk_scene::{JointModelGroup, PlanningScene, Pose, PoseStamped};

use crate::error::MoveToError;

/// An IK frame with its frame id filled in and its pose in the planning frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIkFrame {
    /// The frame specification, with any derived tip filled in.
    pub frame: PoseStamped,
    /// `frame_transform(frame.frame_id) * frame.pose`.
    pub in_world: Pose,
}

fn unique_tip(group: &JointModelGroup) -> Option<&str> {
    match group.end_effector_tips() {
        [tip] => Some(tip.as_str()),
        _ => None,
    }
}

/// Resolve the IK frame for `group` in `scene`.
pub fn resolve_ik_frame(
    spec: Option<&PoseStamped>,
    group: &JointModelGroup,
    scene: &PlanningScene,
) -> Result<ResolvedIkFrame, MoveToError> {
    let tips = group.end_effector_tips().len();
    let frame = match spec {
        None => {
            let tip = unique_tip(group).ok_or_else(|| MoveToError::MissingIkFrame {
                group: group.name().to_string(),
                tips,
            })?;
            PoseStamped {
                frame_id: tip.to_string(),
                ..PoseStamped::default()
            }
        }
        Some(spec) => {
            let mut frame = spec.clone();
            if frame.frame_id.is_empty() {
                let tip = unique_tip(group).ok_or_else(|| MoveToError::NoUniqueTip {
                    group: group.name().to_string(),
                    tips,
                })?;
                frame.frame_id = tip.to_string();
            }
            if !scene.knows_frame_transform(&frame.frame_id) {
                return Err(MoveToError::UnknownFrame(frame.frame_id));
            }
            frame
        }
    };

    let in_world = scene.frame_transform(&frame.frame_id)? * frame.pose.to_pose();
    tracing::debug!(frame = %frame.frame_id, group = group.name(), "resolved ik frame");
    Ok(ResolvedIkFrame { frame, in_world })
}
