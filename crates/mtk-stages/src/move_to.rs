// move_to.rs: The move-to stage.
//
// Given the upstream scene, the stage decides between a joint-space goal
// (applied straight to the end state) and a Cartesian goal (resolved to a
// target pose for the IK frame's rigid parent link), asks the planner for a
// trajectory and packages the result. Every failure ends up on the returned
// solution; `compute` itself never errors.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mtk_scene::{PlanningScene, Pose, PoseStamped, RobotModel, RobotStateMsg};
use serde_json::json;

use crate::cost::{CostTerm, PathLength};
use crate::error::{MoveToError, PropertyError};
use crate::goal::{apply_joint_goal, GoalSpecification};
use crate::ik_frame::resolve_ik_frame;
use crate::planner::{Constraints, Planner};
use crate::properties::PropertyMap;
use crate::solution::{package_trajectory, Direction, SubTrajectory};
use crate::target::{cartesian_target, compose_link_target};

/// Axis length of the target and IK frame markers.
const MARKER_SCALE: f64 = 0.1;

/// The state a stage receives from its neighbour.
#[derive(Debug, Clone)]
pub struct InterfaceState {
    scene: Arc<PlanningScene>,
}

impl InterfaceState {
    pub fn new(scene: impl Into<Arc<PlanningScene>>) -> Self {
        Self {
            scene: scene.into(),
        }
    }

    pub fn scene(&self) -> &Arc<PlanningScene> {
        &self.scene
    }
}

/// Result of one `compute` call.
#[derive(Debug)]
pub struct StageOutput {
    /// End scene: the upstream scene advanced to the end of the trajectory.
    pub scene: PlanningScene,
    pub solution: SubTrajectory,
    /// Whether a trajectory (planned or stall) was attached to the solution.
    pub attached: bool,
}

/// Moves a kinematic group to a joint-space or Cartesian goal.
pub struct MoveTo {
    name: String,
    properties: PropertyMap,
    planner: Arc<dyn Planner>,
    cost_term: Arc<dyn CostTerm>,
    store_failures: bool,
}

impl fmt::Debug for MoveTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoveTo")
            .field("name", &self.name)
            .field("properties", &self.properties)
            .field("planner", &self.planner.name())
            .field("cost_term", &self.cost_term.name())
            .field("store_failures", &self.store_failures)
            .finish()
    }
}

impl MoveTo {
    pub fn new(name: impl Into<String>, planner: Arc<dyn Planner>) -> Self {
        let mut properties = PropertyMap::new();
        properties
            .declare::<String>("group", "name of planning group")
            .declare::<PoseStamped>("ik_frame", "frame to be moved towards goal pose")
            .declare::<GoalSpecification>("goal", "goal specification")
            .declare_with_default::<Constraints>("path_constraints", json!({}), "constraints to maintain during trajectory")
            .declare_with_default::<f64>("timeout", json!(1.0), "planning timeout in seconds");

        Self {
            name: name.into(),
            properties,
            planner,
            cost_term: Arc::new(PathLength),
            store_failures: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn planner(&self) -> &Arc<dyn Planner> {
        &self.planner
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }

    pub fn set_group(&mut self, group: &str) -> Result<(), PropertyError> {
        self.properties.set("group", &group)
    }

    pub fn set_ik_frame(&mut self, frame: PoseStamped) -> Result<(), PropertyError> {
        self.properties.set("ik_frame", &frame)
    }

    /// IK frame at `pose` relative to `link`.
    pub fn set_ik_frame_at(&mut self, pose: &Pose, link: &str) -> Result<(), PropertyError> {
        self.set_ik_frame(PoseStamped::new(link, pose))
    }

    /// IK frame at the origin of `link`.
    pub fn set_ik_frame_link(&mut self, link: &str) -> Result<(), PropertyError> {
        self.set_ik_frame_at(&Pose::identity(), link)
    }

    pub fn set_goal(&mut self, goal: impl Into<GoalSpecification>) -> Result<(), PropertyError> {
        self.properties.set("goal", &goal.into())
    }

    /// Joint goal given as a map, stored as a diff robot state.
    pub fn set_goal_joints(&mut self, joints: &BTreeMap<String, f64>) -> Result<(), PropertyError> {
        self.set_goal(RobotStateMsg::diff_from_joints(joints))
    }

    pub fn set_timeout(&mut self, seconds: f64) -> Result<(), PropertyError> {
        self.properties.set("timeout", &seconds)
    }

    pub fn set_path_constraints(&mut self, constraints: Constraints) -> Result<(), PropertyError> {
        self.properties.set("path_constraints", &constraints)
    }

    /// Keep a stall trajectory when planning yields none.
    pub fn set_store_failures(&mut self, store: bool) {
        self.store_failures = store;
    }

    pub fn store_failures(&self) -> bool {
        self.store_failures
    }

    pub fn set_cost_term(&mut self, cost_term: Arc<dyn CostTerm>) {
        self.cost_term = cost_term;
    }

    fn timeout(&self) -> Result<Duration, MoveToError> {
        let seconds: f64 = self.properties.get("timeout")?;
        Duration::try_from_secs_f64(seconds).map_err(|_| MoveToError::InvalidTimeout(seconds))
    }

    /// Prepare the stage for `model`. Errors here are configuration errors.
    pub fn init(&self, model: &RobotModel) -> Result<(), MoveToError> {
        self.timeout()?;
        self.planner.init(model)?;
        tracing::debug!(stage = %self.name, planner = self.planner.name(), "stage initialised");
        Ok(())
    }

    /// Plan from `state` towards the goal in `direction`.
    pub fn compute(&self, state: &InterfaceState, direction: Direction) -> StageOutput {
        let upstream = state.scene();
        let mut scene = upstream.diff();
        let mut solution = SubTrajectory::new();

        let attached = match self.try_compute(upstream, &mut scene, &mut solution, direction) {
            Ok(true) => true,
            Ok(false) => {
                solution.mark_as_failure("planning produced no trajectory");
                false
            }
            Err(err) => {
                solution.mark_as_failure(err.to_string());
                false
            }
        };

        if solution.is_failure() {
            if solution.comment().is_empty() {
                solution.set_comment("planning failed");
            }
            tracing::warn!(stage = %self.name, %direction, reason = solution.comment(), "move-to failed");
        } else {
            tracing::debug!(stage = %self.name, %direction, "move-to succeeded");
        }
        solution.set_cost(self.cost_term.cost(&solution));

        StageOutput {
            scene,
            solution,
            attached,
        }
    }

    fn try_compute(
        &self,
        upstream: &PlanningScene,
        scene: &mut PlanningScene,
        solution: &mut SubTrajectory,
        direction: Direction,
    ) -> Result<bool, MoveToError> {
        let timeout = self.timeout()?;
        let model = Arc::clone(upstream.robot_model());
        let group_name: String = self.properties.get_opt("group")?.unwrap_or_default();
        let group = model
            .group(&group_name)
            .ok_or_else(|| MoveToError::InvalidGroup(group_name.clone()))?;
        let goal: GoalSpecification = self
            .properties
            .get_opt("goal")?
            .ok_or(MoveToError::UndefinedGoal)?;
        let constraints: Constraints = self.properties.get("path_constraints")?;

        let result = if apply_joint_goal(&goal, group, scene.current_state_mut())? {
            tracing::debug!(group = %group_name, goal = goal.kind(), "planning to joint-space goal");
            self.planner
                .plan_joint(upstream, scene, group, timeout, &constraints)
        } else {
            let ik_spec: Option<PoseStamped> = self.properties.get_opt("ik_frame")?;
            let ik = resolve_ik_frame(ik_spec.as_ref(), group, scene)?;
            let target = cartesian_target(&goal, &ik.in_world, scene)?;

            let planning_frame = scene.planning_frame().to_string();
            solution.add_frame_marker("target frame", &planning_frame, &target, MARKER_SCALE);
            solution.add_frame_marker("ik frame", &planning_frame, &ik.in_world, MARKER_SCALE);

            let parent = scene
                .rigidly_connected_parent_link(&ik.frame.frame_id)
                .ok_or_else(|| {
                    tracing::error!(frame = %ik.frame.frame_id, "ik frame has no rigid parent link");
                    MoveToError::NoRigidParentLink(ik.frame.frame_id.clone())
                })?;
            let parent_in_world = scene.frame_transform(parent.name())?;
            let link_target = compose_link_target(&target, &ik.in_world, &parent_in_world);

            tracing::debug!(
                group = %group_name,
                link = parent.name(),
                ik_frame = %ik.frame.frame_id,
                "planning to Cartesian goal"
            );
            self.planner
                .plan_cartesian(upstream, parent, &link_target, group, timeout, &constraints)
        };

        if !result.success {
            tracing::debug!(planner = self.planner.name(), "planner reported failure");
        }
        Ok(package_trajectory(
            result,
            upstream.current_state(),
            scene,
            group,
            direction,
            self.store_failures,
            solution,
        ))
    }
}
