pub mod control;
pub mod frame_cache;
pub mod loop_points;
pub mod matches;
pub mod pairwise;
pub mod reference;
