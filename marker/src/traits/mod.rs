//!
//! Traits Module
//!
//! This module contains the seams between the marker and the external test runner.
//!
//! - [`collector`]: Defines the traits for enumerating tests and collecting verdicts.
//!
//! Implement these traits to drive the marker with a different test runner.

pub mod collector;
