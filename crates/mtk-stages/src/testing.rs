// testing.rs: Shared fixtures for unit tests.

use mtk_scene::{PlanningScene, SceneDescription};

pub(crate) const WORKCELL: &str = include_str!("../../../demos/workcell.toml");

/// The demo workcell: arm on a floating base, pen on the tool, a table and a bin.
pub(crate) fn workcell_scene() -> PlanningScene {
    SceneDescription::parse(WORKCELL).unwrap().build().unwrap()
}

pub(crate) fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
}
