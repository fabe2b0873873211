// frames.rs: `mtk frames`, list resolvable frames in a scene.

use std::path::Path;

use mtk_scene::{PlanningScene, PoseMsg, SceneDescription};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct FrameReport {
    frame: String,
    /// Robot link the frame is rigidly attached to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    rigid_parent: Option<String>,
    pose: PoseMsg,
}

fn frame_reports(scene: &PlanningScene) -> anyhow::Result<Vec<FrameReport>> {
    scene
        .known_frames()
        .into_iter()
        .map(|frame| {
            let pose = scene.frame_transform(&frame)?;
            Ok(FrameReport {
                rigid_parent: scene
                    .rigidly_connected_parent_link(&frame)
                    .map(|link| link.name().to_string()),
                pose: PoseMsg::from(pose),
                frame,
            })
        })
        .collect()
}

pub fn execute(scene_path: &Path, json: bool) -> anyhow::Result<()> {
    let scene = SceneDescription::load(scene_path)?.build()?;
    let frames = frame_reports(&scene)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&frames)?);
        return Ok(());
    }

    println!(
        "{} frame(s) in planning frame '{}':",
        frames.len(),
        scene.planning_frame()
    );
    for f in &frames {
        let [x, y, z] = f.pose.position;
        let [qx, qy, qz, qw] = f.pose.orientation;
        println!(
            "  {:<12} xyz=({:.4}, {:.4}, {:.4}) q=({:.4}, {:.4}, {:.4}, {:.4}) {}",
            f.frame,
            x,
            y,
            z,
            qx,
            qy,
            qz,
            qw,
            f.rigid_parent.as_deref().map(|p| format!("[{}]", p)).unwrap_or_default()
        );
    }
    Ok(())
}
