// testing.rs: Shared fixtures for unit tests.

use std::sync::Arc;

use crate::model::{RobotDescription, RobotModel};

/// A two-joint arm: revolute shoulder about z, prismatic wrist along x,
/// and a tool rigidly mounted 0.2m above the flange.
pub(crate) fn tiny_description() -> RobotDescription {
    toml::from_str(
        r#"
        name = "tiny"
        root_link = "base"
        links = ["base", "arm", "flange", "tool"]

        [[joints]]
        name = "shoulder"
        type = "revolute"
        parent = "base"
        child = "arm"
        limits = { lower = 0.5, upper = 2.0 }

        [[joints]]
        name = "wrist"
        type = "prismatic"
        parent = "arm"
        child = "flange"
        axis = [1.0, 0.0, 0.0]
        origin = { position = [1.0, 0.0, 0.0] }

        [[joints]]
        name = "tool_mount"
        type = "fixed"
        parent = "flange"
        child = "tool"
        origin = { position = [0.0, 0.0, 0.2] }

        [[groups]]
        name = "arm"
        joints = ["shoulder", "wrist"]
        tips = ["tool"]
        named_states = { home = { shoulder = 1.0, wrist = 0.0 } }
        "#,
    )
    .unwrap()
}

pub(crate) fn tiny_model() -> Arc<RobotModel> {
    Arc::new(RobotModel::from_description(&tiny_description()).unwrap())
}
