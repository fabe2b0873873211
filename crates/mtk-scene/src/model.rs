// model.rs: Robot model and kinematic groups.
//
// A RobotModel is an immutable kinematic tree of links connected by joints,
// built once from a RobotDescription and shared (behind `Arc`) by every
// RobotState and PlanningScene derived from it.
//
// Variables: a single-DOF joint owns one variable named after the joint.
// A floating joint owns seven, `<joint>/trans_x .. <joint>/rot_w`, holding
// its translation and (x, y, z, w) quaternion.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use nalgebra::{Quaternion, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::pose::{axis_angle, Pose, PoseMsg};

/// Variable suffixes of a floating joint, in storage order.
pub const FLOATING_VARIABLES: [&str; 7] = [
    "trans_x", "trans_y", "trans_z", "rot_x", "rot_y", "rot_z", "rot_w",
];

/// Kind of articulation between a parent and child link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointType {
    Fixed,
    Revolute,
    Prismatic,
    Floating,
}

impl JointType {
    pub fn variable_count(self) -> usize {
        match self {
            JointType::Fixed => 0,
            JointType::Revolute | JointType::Prismatic => 1,
            JointType::Floating => FLOATING_VARIABLES.len(),
        }
    }

    /// Whether the joint has more than one degree of freedom.
    pub fn is_multi_dof(self) -> bool {
        self.variable_count() > 1
    }
}

/// Position bounds of a single-DOF joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    pub lower: f64,
    pub upper: f64,
}

/// A joint as written in a robot description file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub joint_type: JointType,
    pub parent: String,
    pub child: String,
    /// Pose of the child link relative to the parent at zero position.
    #[serde(default)]
    pub origin: PoseMsg,
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<JointLimits>,
}

fn default_axis() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

/// A kinematic group as written in a robot description file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDescription {
    pub name: String,
    pub joints: Vec<String>,
    /// End-effector tip links of the group.
    #[serde(default)]
    pub tips: Vec<String>,
    /// Predefined joint configurations, by name.
    #[serde(default)]
    pub named_states: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Serializable description of a robot's kinematic structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotDescription {
    pub name: String,
    pub root_link: String,
    pub links: Vec<String>,
    #[serde(default)]
    pub joints: Vec<JointDescription>,
    #[serde(default)]
    pub groups: Vec<GroupDescription>,
}

impl RobotDescription {
    /// Load a description from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path).map_err(|source| SceneError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }
}

/// A link of the robot model.
#[derive(Debug, Clone)]
pub struct LinkModel {
    name: String,
    index: usize,
    parent_joint: Option<usize>,
}

impl LinkModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The joint connecting this link to its parent; `None` for the root.
    pub fn parent_joint(&self) -> Option<usize> {
        self.parent_joint
    }
}

/// A joint of the robot model.
#[derive(Debug, Clone)]
pub struct JointModel {
    name: String,
    joint_type: JointType,
    parent_link: usize,
    child_link: usize,
    origin: Pose,
    axis: [f64; 3],
    limits: Option<JointLimits>,
    first_variable: usize,
}

impl JointModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn joint_type(&self) -> JointType {
        self.joint_type
    }

    pub fn parent_link(&self) -> usize {
        self.parent_link
    }

    pub fn child_link(&self) -> usize {
        self.child_link
    }

    /// Range of this joint's variables in the state vector.
    pub fn variable_range(&self) -> std::ops::Range<usize> {
        self.first_variable..self.first_variable + self.joint_type.variable_count()
    }

    /// Transform of the child link relative to the parent link for the
    /// given joint variables.
    pub fn child_transform(&self, values: &[f64]) -> Pose {
        let motion = match self.joint_type {
            JointType::Fixed => Pose::identity(),
            JointType::Revolute => {
                Pose::from_parts(Translation3::identity(), axis_angle(&self.axis, values[0]))
            }
            JointType::Prismatic => {
                let axis = Vector3::new(self.axis[0], self.axis[1], self.axis[2]);
                let dir = axis.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros);
                Pose::from_parts(Translation3::from(dir * values[0]), UnitQuaternion::identity())
            }
            JointType::Floating => floating_pose(values),
        };
        self.origin * motion
    }

    fn default_values(&self) -> Vec<f64> {
        match self.joint_type {
            JointType::Fixed => Vec::new(),
            JointType::Revolute | JointType::Prismatic => {
                let value = match self.limits {
                    Some(l) => 0.0_f64.clamp(l.lower, l.upper),
                    None => 0.0,
                };
                vec![value]
            }
            JointType::Floating => vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Build a pose from the seven variables of a floating joint.
pub(crate) fn floating_pose(values: &[f64]) -> Pose {
    let q = Quaternion::new(values[6], values[3], values[4], values[5]);
    let rotation = if q.norm() > f64::EPSILON {
        UnitQuaternion::from_quaternion(q)
    } else {
        UnitQuaternion::identity()
    };
    Pose::from_parts(Translation3::new(values[0], values[1], values[2]), rotation)
}

/// Flatten a pose into the seven variables of a floating joint.
pub(crate) fn floating_values(pose: &Pose) -> [f64; 7] {
    let t = pose.translation.vector;
    let q = pose.rotation.quaternion();
    [t.x, t.y, t.z, q.i, q.j, q.k, q.w]
}

/// A named subset of joints planned as one unit.
#[derive(Debug, Clone)]
pub struct JointModelGroup {
    name: String,
    joint_names: Vec<String>,
    variable_names: Vec<String>,
    end_effector_tips: Vec<String>,
    named_states: BTreeMap<String, BTreeMap<String, f64>>,
}

impl JointModelGroup {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the joints accepted by this group.
    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    pub fn has_joint(&self, name: &str) -> bool {
        self.joint_names.iter().any(|j| j == name)
    }

    /// Names of all variables owned by the group's joints.
    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn end_effector_tips(&self) -> &[String] {
        &self.end_effector_tips
    }

    pub fn named_state(&self, name: &str) -> Option<&BTreeMap<String, f64>> {
        self.named_states.get(name)
    }
}

/// Immutable kinematic model of a robot.
#[derive(Debug, Clone)]
pub struct RobotModel {
    name: String,
    root_link: usize,
    links: Vec<LinkModel>,
    joints: Vec<JointModel>,
    groups: BTreeMap<String, JointModelGroup>,
    variable_names: Vec<String>,
    default_positions: Vec<f64>,
    link_index: HashMap<String, usize>,
    joint_index: HashMap<String, usize>,
    variable_index: HashMap<String, usize>,
}

impl RobotModel {
    /// Build and validate a model from its description.
    pub fn from_description(desc: &RobotDescription) -> Result<Self, SceneError> {
        let invalid = |reason: String| SceneError::InvalidModel {
            model: desc.name.clone(),
            reason,
        };

        let mut link_index = HashMap::new();
        let mut links = Vec::with_capacity(desc.links.len());
        for (index, name) in desc.links.iter().enumerate() {
            if link_index.insert(name.clone(), index).is_some() {
                return Err(invalid(format!("duplicate link '{}'", name)));
            }
            links.push(LinkModel {
                name: name.clone(),
                index,
                parent_joint: None,
            });
        }

        let root_link = *link_index
            .get(&desc.root_link)
            .ok_or_else(|| invalid(format!("root link '{}' is not a link", desc.root_link)))?;

        let mut joint_index = HashMap::new();
        let mut joints = Vec::with_capacity(desc.joints.len());
        let mut variable_names = Vec::new();
        let mut default_positions = Vec::new();
        for (index, jd) in desc.joints.iter().enumerate() {
            if joint_index.insert(jd.name.clone(), index).is_some() {
                return Err(invalid(format!("duplicate joint '{}'", jd.name)));
            }
            let parent_link = *link_index.get(&jd.parent).ok_or_else(|| {
                invalid(format!("joint '{}' has unknown parent '{}'", jd.name, jd.parent))
            })?;
            let child_link = *link_index.get(&jd.child).ok_or_else(|| {
                invalid(format!("joint '{}' has unknown child '{}'", jd.name, jd.child))
            })?;
            if child_link == root_link {
                return Err(invalid(format!("joint '{}' moves the root link", jd.name)));
            }
            if links[child_link].parent_joint.is_some() {
                return Err(invalid(format!("link '{}' has two parent joints", jd.child)));
            }
            if let Some(l) = jd.limits {
                if l.lower > l.upper {
                    return Err(invalid(format!("joint '{}' has inverted limits", jd.name)));
                }
            }
            links[child_link].parent_joint = Some(index);

            let joint = JointModel {
                name: jd.name.clone(),
                joint_type: jd.joint_type,
                parent_link,
                child_link,
                origin: jd.origin.to_pose(),
                axis: jd.axis,
                limits: jd.limits,
                first_variable: variable_names.len(),
            };
            match jd.joint_type {
                JointType::Fixed => {}
                JointType::Revolute | JointType::Prismatic => variable_names.push(jd.name.clone()),
                JointType::Floating => variable_names.extend(
                    FLOATING_VARIABLES
                        .iter()
                        .map(|suffix| format!("{}/{}", jd.name, suffix)),
                ),
            }
            default_positions.extend(joint.default_values());
            joints.push(joint);
        }

        // Every non-root link must hang off the root through parent joints.
        for link in &links {
            if link.index == root_link {
                continue;
            }
            let mut current = link.index;
            let mut seen = HashSet::new();
            while let Some(j) = links[current].parent_joint {
                if !seen.insert(current) {
                    return Err(invalid(format!("cycle through link '{}'", link.name)));
                }
                current = joints[j].parent_link;
            }
            if current != root_link {
                return Err(invalid(format!(
                    "link '{}' is not connected to root '{}'",
                    link.name, desc.root_link
                )));
            }
        }

        let variable_index: HashMap<String, usize> = variable_names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();

        let mut groups = BTreeMap::new();
        for gd in &desc.groups {
            let mut group_variables = Vec::new();
            for joint_name in &gd.joints {
                let j = joint_index.get(joint_name).ok_or_else(|| {
                    invalid(format!("group '{}' has unknown joint '{}'", gd.name, joint_name))
                })?;
                let range = joints[*j].variable_range();
                group_variables.extend(variable_names[range].iter().cloned());
            }
            for tip in &gd.tips {
                if !link_index.contains_key(tip) {
                    return Err(invalid(format!("group '{}' has unknown tip '{}'", gd.name, tip)));
                }
            }
            for (state, values) in &gd.named_states {
                if let Some(bad) = values.keys().find(|v| !group_variables.contains(v)) {
                    return Err(invalid(format!(
                        "named state '{}' of group '{}' sets foreign variable '{}'",
                        state, gd.name, bad
                    )));
                }
            }
            let group = JointModelGroup {
                name: gd.name.clone(),
                joint_names: gd.joints.clone(),
                variable_names: group_variables,
                end_effector_tips: gd.tips.clone(),
                named_states: gd.named_states.clone(),
            };
            if groups.insert(gd.name.clone(), group).is_some() {
                return Err(invalid(format!("duplicate group '{}'", gd.name)));
            }
        }

        tracing::debug!(
            model = %desc.name,
            links = links.len(),
            joints = joints.len(),
            variables = variable_names.len(),
            "robot model built"
        );

        Ok(Self {
            name: desc.name.clone(),
            root_link,
            links,
            joints,
            groups,
            variable_names,
            default_positions,
            link_index,
            joint_index,
            variable_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_link(&self) -> &LinkModel {
        &self.links[self.root_link]
    }

    pub fn links(&self) -> &[LinkModel] {
        &self.links
    }

    pub fn joints(&self) -> &[JointModel] {
        &self.joints
    }

    pub fn link(&self, name: &str) -> Option<&LinkModel> {
        self.link_index.get(name).map(|&i| &self.links[i])
    }

    pub fn joint(&self, name: &str) -> Option<&JointModel> {
        self.joint_index.get(name).map(|&i| &self.joints[i])
    }

    pub fn group(&self, name: &str) -> Option<&JointModelGroup> {
        self.groups.get(name)
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn variable_count(&self) -> usize {
        self.variable_names.len()
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variable_index.get(name).copied()
    }

    pub fn default_positions(&self) -> &[f64] {
        &self.default_positions
    }

    /// Parent joint of a link, if it is not the root.
    pub fn parent_joint_of(&self, link: &LinkModel) -> Option<&JointModel> {
        link.parent_joint.map(|j| &self.joints[j])
    }

    /// Walk up from `link` across fixed joints; the result is the nearest
    /// link that `link` is rigidly attached to (possibly `link` itself).
    pub fn rigid_parent_link<'a>(&'a self, link: &'a LinkModel) -> &'a LinkModel {
        let mut current = link;
        while let Some(joint) = self.parent_joint_of(current) {
            if joint.joint_type != JointType::Fixed {
                break;
            }
            current = &self.links[joint.parent_link];
        }
        current
    }
}
