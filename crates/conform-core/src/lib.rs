//! Conform Core - Foundation types for the Autoconform engine
//!
//! This crate provides the fundamental types used throughout Autoconform:
//! - Timecode and frame arithmetic (Timecode, FrameRate)
//! - The error taxonomy shared by all subsystems
//! - Job configuration

pub mod config;
pub mod error;
pub mod timecode;

pub use config::{HandlesLogic, JobConfig, TrackRange};
pub use error::{ConformError, Result};
pub use timecode::{FrameRate, Timecode};
