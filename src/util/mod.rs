pub mod correlation;
pub mod duration;
pub mod task_id;
