// pose.rs: Rigid transforms and their message forms.
//
// All frame algebra uses `Pose` (an nalgebra `Isometry3<f64>`). Composition
// reads right-to-left, child-into-parent:
//
//   world_T_tool = world_T_link * link_T_tool
//
// i.e. `a * b` takes a pose expressed in frame `a` and maps it into the
// frame `a` itself is expressed in. The message types below are the
// serde-friendly forms used in configuration files and goal properties.

use nalgebra::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A rigid transform in 3D space.
pub type Pose = Isometry3<f64>;

/// A pose as it appears in configuration: position plus an `(x, y, z, w)`
/// quaternion. Omitted fields default to the identity transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseMsg {
    #[serde(default)]
    pub position: [f64; 3],
    #[serde(default = "identity_orientation")]
    pub orientation: [f64; 4],
}

fn identity_orientation() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl Default for PoseMsg {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            orientation: identity_orientation(),
        }
    }
}

impl PoseMsg {
    /// A pure translation.
    pub fn from_position(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: [x, y, z],
            ..Self::default()
        }
    }

    /// Convert into an isometry. The quaternion is normalised; an all-zero
    /// quaternion is treated as identity.
    pub fn to_pose(&self) -> Pose {
        let [x, y, z, w] = self.orientation;
        let q = Quaternion::new(w, x, y, z);
        let rotation = if q.norm() > f64::EPSILON {
            UnitQuaternion::from_quaternion(q)
        } else {
            UnitQuaternion::identity()
        };
        let [px, py, pz] = self.position;
        Isometry3::from_parts(Translation3::new(px, py, pz), rotation)
    }
}

impl From<&Pose> for PoseMsg {
    fn from(pose: &Pose) -> Self {
        let t = pose.translation.vector;
        let q = pose.rotation.quaternion();
        Self {
            position: [t.x, t.y, t.z],
            orientation: [q.i, q.j, q.k, q.w],
        }
    }
}

impl From<Pose> for PoseMsg {
    fn from(pose: Pose) -> Self {
        PoseMsg::from(&pose)
    }
}

impl From<PoseMsg> for Pose {
    fn from(msg: PoseMsg) -> Self {
        msg.to_pose()
    }
}

/// A pose expressed relative to a named frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseStamped {
    /// Reference frame; may be empty where the consumer can infer one.
    #[serde(default)]
    pub frame_id: String,
    #[serde(default)]
    pub pose: PoseMsg,
}

impl PoseStamped {
    pub fn new(frame_id: impl Into<String>, pose: &Pose) -> Self {
        Self {
            frame_id: frame_id.into(),
            pose: PoseMsg::from(pose),
        }
    }
}

/// A position expressed relative to a named frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointStamped {
    pub frame_id: String,
    pub point: [f64; 3],
}

impl PointStamped {
    pub fn new(frame_id: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            frame_id: frame_id.into(),
            point: [x, y, z],
        }
    }

    pub fn to_point(&self) -> Point3<f64> {
        let [x, y, z] = self.point;
        Point3::new(x, y, z)
    }
}

/// Rotation about a unit axis, used for revolute joints.
pub(crate) fn axis_angle(axis: &[f64; 3], angle: f64) -> UnitQuaternion<f64> {
    let v = Vector3::new(axis[0], axis[1], axis[2]);
    match nalgebra::Unit::try_new(v, f64::EPSILON) {
        Some(unit) => UnitQuaternion::from_axis_angle(&unit, angle),
        None => UnitQuaternion::identity(),
    }
}
