//! Concrete planners.

mod joint_interpolation;

pub use joint_interpolation::JointInterpolationPlanner;
