// run.rs: `mtk run`, run one move-to stage against a scene file.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use mtk_scene::{RobotState, SceneDescription};
use mtk_stages::{
    Direction, FrameMarker, InterfaceState, MoveTo, PropertySummary, StageConfig, StageOutput,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Forward,
    Backward,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Forward => Direction::Forward,
            DirectionArg::Backward => Direction::Backward,
        }
    }
}

#[derive(Debug, Serialize)]
struct WaypointReport {
    time: f64,
    positions: BTreeMap<String, f64>,
}

/// What `mtk run` prints.
#[derive(Debug, Serialize)]
struct RunReport {
    stage: String,
    planner: String,
    direction: Direction,
    success: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    comment: String,
    /// `None` for failed solutions.
    cost: Option<f64>,
    waypoints: Vec<WaypointReport>,
    end_state: BTreeMap<String, f64>,
    markers: Vec<FrameMarker>,
    properties: Vec<PropertySummary>,
}

fn variables(state: &RobotState, names: &[String]) -> BTreeMap<String, f64> {
    names
        .iter()
        .filter_map(|name| {
            state
                .variable_position(name)
                .ok()
                .map(|value| (name.clone(), value))
        })
        .collect()
}

impl RunReport {
    fn new(stage: &MoveTo, direction: Direction, output: &StageOutput) -> Self {
        let solution = &output.solution;
        let model = output.scene.robot_model();

        let waypoints = solution
            .trajectory()
            .map(|trajectory| {
                let names = model
                    .group(trajectory.group())
                    .map(|g| g.variable_names().to_vec())
                    .unwrap_or_else(|| model.variable_names().to_vec());
                trajectory
                    .waypoints()
                    .iter()
                    .zip(trajectory.waypoint_times())
                    .map(|(state, time)| WaypointReport {
                        time,
                        positions: variables(state, &names),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let cost = solution.cost();
        Self {
            stage: stage.name().to_string(),
            planner: stage.planner().name().to_string(),
            direction,
            success: !solution.is_failure(),
            comment: solution.comment().to_string(),
            cost: cost.is_finite().then_some(cost),
            waypoints,
            end_state: variables(output.scene.current_state(), model.variable_names()),
            markers: solution.markers().to_vec(),
            properties: stage.properties().summary(),
        }
    }

    fn print(&self) {
        let status = if self.success { "succeeded" } else { "FAILED" };
        println!(
            "Stage '{}' ({}, {}) {}",
            self.stage, self.planner, self.direction, status
        );
        if !self.comment.is_empty() {
            println!("  {}", self.comment);
        }
        match self.cost {
            Some(cost) => println!("  cost: {:.4}", cost),
            None => println!("  cost: inf"),
        }

        if self.waypoints.is_empty() {
            println!("  no trajectory");
        } else {
            println!("  trajectory: {} waypoint(s)", self.waypoints.len());
            for waypoint in &self.waypoints {
                let values: Vec<String> = waypoint
                    .positions
                    .iter()
                    .map(|(name, value)| format!("{}={:.4}", name, value))
                    .collect();
                println!("    t={:<7.3} {}", waypoint.time, values.join(" "));
            }
        }

        for marker in &self.markers {
            let [x, y, z] = marker.pose.position;
            println!(
                "  marker '{}' in {}: ({:.4}, {:.4}, {:.4})",
                marker.ns, marker.frame_id, x, y, z
            );
        }
    }
}

pub fn execute(scene_path: &Path, stage_path: &Path, direction: DirectionArg, json: bool) -> anyhow::Result<()> {
    let scene = SceneDescription::load(scene_path)?.build()?;
    let config = StageConfig::load(stage_path)?;
    let stage = config.build(Arc::new(config.build_planner()))?;
    stage.init(scene.robot_model())?;

    let direction = Direction::from(direction);
    tracing::info!(stage = stage.name(), %direction, "running stage");
    let output = stage.compute(&InterfaceState::new(scene), direction);
    let report = RunReport::new(&stage, direction, &output);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }

    if !report.success {
        anyhow::bail!("stage '{}' failed: {}", report.stage, report.comment);
    }
    Ok(())
}
