// scene_file.rs: Loading scene descriptions from disk.

use std::fs;

use tempfile::tempdir;

use mtk_scene::{RobotDescription, RobotModel, SceneDescription, SceneError};

const WORKCELL: &str = include_str!("../../../demos/workcell.toml");

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
}

#[test]
fn workcell_demo_loads_and_resolves_frames() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("workcell.toml");
    fs::write(&path, WORKCELL).unwrap();

    let scene = SceneDescription::load(&path).unwrap().build().unwrap();
    assert_eq!(scene.planning_frame(), "world");
    assert_eq!(
        scene.current_state().variable_position("joint2").unwrap(),
        0.3
    );

    // Every known frame resolves.
    for frame in scene.known_frames() {
        assert!(scene.knows_frame_transform(&frame), "{}", frame);
    }

    // The pen rides on the tool; its rigid parent is the last moving link.
    assert_eq!(
        scene.rigidly_connected_parent_link("pen").unwrap().name(),
        "link3"
    );
    assert!(scene.rigidly_connected_parent_link("table").is_none());
}

#[test]
fn zero_configuration_tool_pose() {
    let mut scene = SceneDescription::parse(WORKCELL).unwrap().build().unwrap();
    scene
        .current_state_mut()
        .set_variable_position("joint2", 0.0)
        .unwrap();

    // Column 0.3 + 0.4 high, then 0.4 + 0.1 + 0.05 out along x.
    let tool = scene.frame_transform("tool").unwrap();
    assert_close(tool.translation.vector.x, 0.55);
    assert_close(tool.translation.vector.z, 0.7);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = SceneDescription::load(&path).unwrap_err();
    assert!(matches!(err, SceneError::IoError { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn standalone_robot_description_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("slider.toml");
    fs::write(
        &path,
        r#"
        name = "slider"
        root_link = "rail"
        links = ["rail", "carriage"]

        [[joints]]
        name = "slide"
        type = "prismatic"
        parent = "rail"
        child = "carriage"
        axis = [1.0, 0.0, 0.0]
        limits = { lower = 0.0, upper = 1.5 }

        [[groups]]
        name = "carriage"
        joints = ["slide"]
        tips = ["carriage"]
        "#,
    )
    .unwrap();

    let desc = RobotDescription::load(&path).unwrap();
    let model = RobotModel::from_description(&desc).unwrap();
    assert_eq!(model.name(), "slider");
    assert_eq!(model.variable_names(), ["slide".to_string()]);
    assert!(model.group("carriage").is_some());

    let err = RobotDescription::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SceneError::IoError { .. }));
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let err = SceneDescription::parse("robot = 3").unwrap_err();
    assert!(matches!(err, SceneError::ParseError(_)));
}
