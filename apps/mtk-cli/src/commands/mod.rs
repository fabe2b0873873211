pub mod frames;
pub mod run;
