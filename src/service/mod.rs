pub mod batch_runner;
pub mod submission;
