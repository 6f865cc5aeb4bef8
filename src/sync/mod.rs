pub mod equality;
pub mod job;
pub mod reconciler;
