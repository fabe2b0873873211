// trajectory.rs: Time-parameterised sequence of robot states.

use crate::state::RobotState;

/// An ordered sequence of waypoints for one kinematic group. Each waypoint
/// stores the time elapsed since the previous one; the first is always
/// relative to the trajectory start.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotTrajectory {
    group: String,
    waypoints: Vec<RobotState>,
    durations_from_previous: Vec<f64>,
}

impl RobotTrajectory {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            waypoints: Vec::new(),
            durations_from_previous: Vec::new(),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Append a waypoint reached `dt` seconds after the previous one.
    pub fn add_suffix_waypoint(&mut self, state: RobotState, dt: f64) {
        self.waypoints.push(state);
        self.durations_from_previous.push(dt);
    }

    pub fn waypoints(&self) -> &[RobotState] {
        &self.waypoints
    }

    pub fn first_waypoint(&self) -> Option<&RobotState> {
        self.waypoints.first()
    }

    pub fn last_waypoint(&self) -> Option<&RobotState> {
        self.waypoints.last()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn durations_from_previous(&self) -> &[f64] {
        &self.durations_from_previous
    }

    /// Cumulative time of each waypoint from the trajectory start.
    pub fn waypoint_times(&self) -> Vec<f64> {
        self.durations_from_previous
            .iter()
            .scan(0.0, |t, dt| {
                *t += dt;
                Some(*t)
            })
            .collect()
    }

    pub fn duration(&self) -> f64 {
        self.durations_from_previous.iter().sum()
    }

    /// Reverse the waypoint order in place. Segment durations travel with
    /// their segment, so the first waypoint keeps the original first offset
    /// and the total duration is unchanged.
    pub fn reverse(&mut self) {
        if self.waypoints.is_empty() {
            return;
        }
        self.waypoints.reverse();
        // Segment i (between waypoints i-1 and i) becomes segment n-i.
        let first = self.durations_from_previous[0];
        let mut segments: Vec<f64> = self.durations_from_previous[1..].to_vec();
        segments.reverse();
        self.durations_from_previous.clear();
        self.durations_from_previous.push(first);
        self.durations_from_previous.extend(segments);
    }
}
