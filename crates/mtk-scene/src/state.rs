// state.rs: Robot state and robot state messages.
//
// A RobotState is a full assignment of the model's variables plus the set
// of bodies attached to links. It is a plain value: cloning it yields an
// independent copy. Link poses are computed on demand by walking the
// kinematic chain from the root.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::model::{floating_pose, floating_values, JointModel, JointModelGroup, JointType, RobotModel};
use crate::pose::{Pose, PoseMsg};

/// Single-DOF joint values, by joint name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JointStateMsg {
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub position: Vec<f64>,
}

/// Multi-DOF joint values as transforms, by joint name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiDofJointStateMsg {
    #[serde(default)]
    pub joint_names: Vec<String>,
    #[serde(default)]
    pub transforms: Vec<PoseMsg>,
}

/// A (possibly partial) robot state as exchanged in configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RobotStateMsg {
    /// When set, joints not listed keep their current value.
    #[serde(default)]
    pub is_diff: bool,
    #[serde(default)]
    pub joint_state: JointStateMsg,
    #[serde(default)]
    pub multi_dof_joint_state: MultiDofJointStateMsg,
}

impl RobotStateMsg {
    /// Build a diff message from single-DOF joint values.
    pub fn diff_from_joints<'a>(joints: impl IntoIterator<Item = (&'a String, &'a f64)>) -> Self {
        let mut msg = RobotStateMsg {
            is_diff: true,
            ..Default::default()
        };
        for (name, value) in joints {
            msg.joint_state.name.push(name.clone());
            msg.joint_state.position.push(*value);
        }
        msg
    }

    /// Every joint name the message refers to, single- and multi-DOF.
    pub fn referenced_joints(&self) -> impl Iterator<Item = &String> {
        self.joint_state
            .name
            .iter()
            .chain(self.multi_dof_joint_state.joint_names.iter())
    }
}

/// A body rigidly attached to a robot link; its pose is relative to the link.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedBody {
    pub name: String,
    pub link: String,
    pub pose: Pose,
}

/// Full assignment of a robot model's variables.
#[derive(Clone)]
pub struct RobotState {
    model: Arc<RobotModel>,
    positions: Vec<f64>,
    attached_bodies: BTreeMap<String, AttachedBody>,
}

impl fmt::Debug for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in self.model.variable_names().iter().zip(&self.positions) {
            map.entry(name, value);
        }
        map.finish()
    }
}

impl PartialEq for RobotState {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.model, &other.model)
            && self.positions == other.positions
            && self.attached_bodies == other.attached_bodies
    }
}

impl RobotState {
    /// A state with every variable at its default position.
    pub fn new(model: Arc<RobotModel>) -> Self {
        let positions = model.default_positions().to_vec();
        Self {
            model,
            positions,
            attached_bodies: BTreeMap::new(),
        }
    }

    pub fn model(&self) -> &Arc<RobotModel> {
        &self.model
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    pub fn variable_position(&self, name: &str) -> Result<f64, SceneError> {
        let index = self
            .model
            .variable_index(name)
            .ok_or_else(|| SceneError::UnknownVariable(name.to_string()))?;
        Ok(self.positions[index])
    }

    pub fn set_variable_position(&mut self, name: &str, value: f64) -> Result<(), SceneError> {
        let index = self
            .model
            .variable_index(name)
            .ok_or_else(|| SceneError::UnknownVariable(name.to_string()))?;
        self.positions[index] = value;
        Ok(())
    }

    /// Variables of one joint, in storage order.
    pub fn joint_positions(&self, joint: &JointModel) -> &[f64] {
        &self.positions[joint.variable_range()]
    }

    /// Apply a predefined configuration of `group`. Returns false if the
    /// group has no such named state.
    pub fn set_to_named_state(&mut self, group: &JointModelGroup, name: &str) -> bool {
        let Some(values) = group.named_state(name) else {
            return false;
        };
        for (variable, value) in values {
            // Named states are validated against the group when the model is built.
            if let Some(index) = self.model.variable_index(variable) {
                self.positions[index] = *value;
            }
        }
        true
    }

    /// Write every joint listed in `msg` into this state. Joints the message
    /// does not mention keep their value.
    pub fn apply_msg(&mut self, msg: &RobotStateMsg) -> Result<(), SceneError> {
        let js = &msg.joint_state;
        if js.name.len() != js.position.len() {
            return Err(SceneError::MalformedState(format!(
                "{} joint names but {} positions",
                js.name.len(),
                js.position.len()
            )));
        }
        let mdof = &msg.multi_dof_joint_state;
        if mdof.joint_names.len() != mdof.transforms.len() {
            return Err(SceneError::MalformedState(format!(
                "{} multi-DOF joint names but {} transforms",
                mdof.joint_names.len(),
                mdof.transforms.len()
            )));
        }

        // Stage into a copy so a bad entry leaves `self` untouched.
        let mut updated = self.positions.clone();
        for (name, value) in js.name.iter().zip(&js.position) {
            let index = self
                .model
                .variable_index(name)
                .ok_or_else(|| SceneError::UnknownVariable(name.clone()))?;
            updated[index] = *value;
        }
        for (name, transform) in mdof.joint_names.iter().zip(&mdof.transforms) {
            let joint = self
                .model
                .joint(name)
                .ok_or_else(|| SceneError::UnknownJoint(name.clone()))?;
            if joint.joint_type() != JointType::Floating {
                return Err(SceneError::MalformedState(format!(
                    "joint '{}' is not a multi-DOF joint",
                    name
                )));
            }
            updated[joint.variable_range()].copy_from_slice(&floating_values(&transform.to_pose()));
        }
        self.positions = updated;
        Ok(())
    }

    /// Attach a body to a link. Its name must not shadow a robot link.
    pub fn attach_body(
        &mut self,
        name: impl Into<String>,
        link: impl Into<String>,
        pose: Pose,
    ) -> Result<(), SceneError> {
        let name = name.into();
        let link = link.into();
        if self.model.link(&name).is_some() {
            return Err(SceneError::InvalidModel {
                model: self.model.name().to_string(),
                reason: format!("attached body '{}' shadows a robot link", name),
            });
        }
        if self.model.link(&link).is_none() {
            return Err(SceneError::UnknownLink(link));
        }
        self.attached_bodies
            .insert(name.clone(), AttachedBody { name, link, pose });
        Ok(())
    }

    pub fn attached_body(&self, name: &str) -> Option<&AttachedBody> {
        self.attached_bodies.get(name)
    }

    pub fn attached_bodies(&self) -> impl Iterator<Item = &AttachedBody> {
        self.attached_bodies.values()
    }

    /// Pose of a link in the model's root frame.
    pub fn global_link_transform(&self, link_name: &str) -> Result<Pose, SceneError> {
        let link = self
            .model
            .link(link_name)
            .ok_or_else(|| SceneError::UnknownLink(link_name.to_string()))?;

        let mut chain = Vec::new();
        let mut current = link;
        while let Some(joint) = self.model.parent_joint_of(current) {
            chain.push(joint);
            current = &self.model.links()[joint.parent_link()];
        }

        Ok(chain
            .iter()
            .rev()
            .fold(Pose::identity(), |acc, joint| {
                acc * joint.child_transform(self.joint_positions(joint))
            }))
    }

    /// Joint-space distance to `other` over the joints of `group`.
    /// Floating joints contribute translation distance plus rotation angle.
    pub fn distance(&self, other: &RobotState, group: &JointModelGroup) -> f64 {
        self.group_joints(group)
            .map(|joint| {
                let a = self.joint_positions(joint);
                let b = other.joint_positions(joint);
                match joint.joint_type() {
                    JointType::Fixed => 0.0,
                    JointType::Revolute | JointType::Prismatic => (a[0] - b[0]).abs(),
                    JointType::Floating => {
                        let pa = floating_pose(a);
                        let pb = floating_pose(b);
                        (pa.translation.vector - pb.translation.vector).norm()
                            + pa.rotation.angle_to(&pb.rotation)
                    }
                }
            })
            .sum()
    }

    /// State at fraction `t` between `self` (t = 0) and `to` (t = 1).
    /// Only the group's joints move; every other variable is taken from `self`.
    pub fn interpolate(&self, to: &RobotState, t: f64, group: &JointModelGroup) -> RobotState {
        let mut out = self.clone();
        for joint in self.group_joints(group) {
            let range = joint.variable_range();
            let a = self.joint_positions(joint);
            let b = to.joint_positions(joint);
            match joint.joint_type() {
                JointType::Fixed => {}
                JointType::Revolute | JointType::Prismatic => {
                    out.positions[range.start] = a[0] + (b[0] - a[0]) * t;
                }
                JointType::Floating => {
                    let pa = floating_pose(a);
                    let pb = floating_pose(b);
                    let translation = pa.translation.vector.lerp(&pb.translation.vector, t);
                    // Antipodal rotations have no unique great-circle path.
                    let rotation = pa
                        .rotation
                        .try_slerp(&pb.rotation, t, 1e-9)
                        .unwrap_or(if t < 0.5 { pa.rotation } else { pb.rotation });
                    let pose = Pose::from_parts(translation.into(), rotation);
                    out.positions[range].copy_from_slice(&floating_values(&pose));
                }
            }
        }
        out
    }

    fn group_joints<'a>(
        &'a self,
        group: &'a JointModelGroup,
    ) -> impl Iterator<Item = &'a JointModel> + 'a {
        group
            .joint_names()
            .iter()
            .filter_map(move |name| self.model.joint(name))
    }
}
