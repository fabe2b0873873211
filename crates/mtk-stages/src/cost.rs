// cost.rs: Solution cost terms.

use mtk_scene::RobotTrajectory;

use crate::solution::SubTrajectory;

/// Scores a solution; lower is better.
pub trait CostTerm: Send + Sync {
    fn name(&self) -> &str;

    fn trajectory_cost(&self, trajectory: &RobotTrajectory) -> f64;

    /// Failed solutions cost infinity; solutions without a trajectory cost
    /// nothing.
    fn cost(&self, solution: &SubTrajectory) -> f64 {
        if solution.is_failure() {
            return f64::INFINITY;
        }
        solution
            .trajectory()
            .map_or(0.0, |t| self.trajectory_cost(t))
    }
}

/// Joint-space path length of the trajectory over its group.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLength;

impl CostTerm for PathLength {
    fn name(&self) -> &str {
        "path_length"
    }

    fn trajectory_cost(&self, trajectory: &RobotTrajectory) -> f64 {
        let Some(first) = trajectory.first_waypoint() else {
            return 0.0;
        };
        let Some(group) = first.model().group(trajectory.group()) else {
            tracing::warn!(group = trajectory.group(), "trajectory group unknown to its model");
            return f64::INFINITY;
        };
        trajectory
            .waypoints()
            .windows(2)
            .map(|w| w[0].distance(&w[1], group))
            .sum()
    }
}

/// Total trajectory duration in seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrajectoryDuration;

impl CostTerm for TrajectoryDuration {
    fn name(&self) -> &str {
        "trajectory_duration"
    }

    fn trajectory_cost(&self, trajectory: &RobotTrajectory) -> f64 {
        trajectory.duration()
    }
}
