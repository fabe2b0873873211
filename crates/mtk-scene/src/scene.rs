// scene.rs: Planning scene, the world a stage plans in.
//
// A PlanningScene pairs the robot's current state with world objects whose
// poses are given in the planning frame (the robot's root link). Stages
// never mutate an upstream scene: they call `diff()` to get an owned copy
// and work on that.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::model::{LinkModel, RobotDescription, RobotModel};
use crate::pose::{Pose, PoseMsg};
use crate::state::{RobotState, RobotStateMsg};

/// A body attached to a link, as written in a scene file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedBodyDescription {
    pub name: String,
    pub link: String,
    #[serde(default)]
    pub pose: PoseMsg,
}

/// A scene file: the robot, its start state, and the world around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescription {
    pub robot: RobotDescription,
    /// Start state; applied as a diff over the model defaults.
    #[serde(default)]
    pub start_state: Option<RobotStateMsg>,
    /// World objects, posed in the planning frame.
    #[serde(default)]
    pub world_objects: BTreeMap<String, PoseMsg>,
    #[serde(default)]
    pub attached_bodies: Vec<AttachedBodyDescription>,
}

impl SceneDescription {
    /// Load a scene description from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path).map_err(|source| SceneError::IoError {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, SceneError> {
        Ok(toml::from_str(content)?)
    }

    /// Build the model and an initial scene from this description.
    pub fn build(&self) -> Result<PlanningScene, SceneError> {
        let model = Arc::new(RobotModel::from_description(&self.robot)?);
        let mut scene = PlanningScene::new(model);
        if let Some(start) = &self.start_state {
            scene.current_state_mut().apply_msg(start)?;
        }
        for body in &self.attached_bodies {
            scene
                .current_state_mut()
                .attach_body(&body.name, &body.link, body.pose.to_pose())?;
        }
        for (name, pose) in &self.world_objects {
            scene.add_world_object(name, pose.to_pose())?;
        }
        Ok(scene)
    }
}

/// The robot's state plus the world objects around it.
#[derive(Debug, Clone)]
pub struct PlanningScene {
    model: Arc<RobotModel>,
    current_state: RobotState,
    world_objects: BTreeMap<String, Pose>,
}

impl PlanningScene {
    pub fn new(model: Arc<RobotModel>) -> Self {
        let current_state = RobotState::new(Arc::clone(&model));
        Self {
            model,
            current_state,
            world_objects: BTreeMap::new(),
        }
    }

    /// An owned copy that can be modified without affecting `self`.
    pub fn diff(&self) -> PlanningScene {
        self.clone()
    }

    pub fn robot_model(&self) -> &Arc<RobotModel> {
        &self.model
    }

    /// Name of the frame every transform is ultimately expressed in.
    pub fn planning_frame(&self) -> &str {
        self.model.root_link().name()
    }

    pub fn current_state(&self) -> &RobotState {
        &self.current_state
    }

    pub fn current_state_mut(&mut self) -> &mut RobotState {
        &mut self.current_state
    }

    pub fn set_current_state(&mut self, state: RobotState) {
        self.current_state = state;
    }

    /// Add or move a world object. Its name must not shadow a robot link.
    pub fn add_world_object(&mut self, name: impl Into<String>, pose: Pose) -> Result<(), SceneError> {
        let name = name.into();
        if self.model.link(&name).is_some() {
            return Err(SceneError::InvalidModel {
                model: self.model.name().to_string(),
                reason: format!("world object '{}' shadows a robot link", name),
            });
        }
        self.world_objects.insert(name, pose);
        Ok(())
    }

    /// Every frame the scene can resolve: the planning frame, links,
    /// attached bodies and world objects.
    pub fn known_frames(&self) -> Vec<String> {
        let mut frames: Vec<String> = self
            .model
            .links()
            .iter()
            .map(|l| l.name().to_string())
            .collect();
        frames.extend(self.current_state.attached_bodies().map(|b| b.name.clone()));
        frames.extend(self.world_objects.keys().cloned());
        frames
    }

    pub fn knows_frame_transform(&self, frame_id: &str) -> bool {
        self.frame_transform(frame_id).is_ok()
    }

    /// Pose of a named frame in the planning frame.
    pub fn frame_transform(&self, frame_id: &str) -> Result<Pose, SceneError> {
        if frame_id == self.planning_frame() {
            return Ok(Pose::identity());
        }
        if self.model.link(frame_id).is_some() {
            return self.current_state.global_link_transform(frame_id);
        }
        if let Some(body) = self.current_state.attached_body(frame_id) {
            return Ok(self.current_state.global_link_transform(&body.link)? * body.pose);
        }
        if let Some(pose) = self.world_objects.get(frame_id) {
            return Ok(*pose);
        }
        Err(SceneError::UnknownFrame(frame_id.to_string()))
    }

    /// The nearest robot link `frame_id` is rigidly attached to. Attached
    /// bodies resolve through their link; links through fixed joints.
    /// World objects and unknown frames have none.
    pub fn rigidly_connected_parent_link(&self, frame_id: &str) -> Option<&LinkModel> {
        let link = match self.current_state.attached_body(frame_id) {
            Some(body) => self.model.link(&body.link)?,
            None => self.model.link(frame_id)?,
        };
        Some(self.model.rigid_parent_link(link))
    }
}
