//! Test modules for the pipeline

#[cfg(test)]
pub mod framework;




#[cfg(test)]
mod activity_queue_tests;

#[cfg(test)]
mod visit_recorder_tests;
