//! Cohort grading driver: discovers submissions, grades each one with the marker policy,
//! and writes the per-submission reports and cohort tables.

pub mod artifacts;
pub mod cohort_run;
pub mod discovery;
