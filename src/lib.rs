//! Photostage - Media staging pipeline for photo library import
//!
//! This library crate exposes the run driver and its stages for
//! integration testing.

pub mod classify;
pub mod convert;
pub mod importer;
pub mod report;
pub mod run;
pub mod scan;
pub mod skiplog;
pub mod staging;
pub mod stats;
