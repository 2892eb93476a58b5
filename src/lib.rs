//! moai-checkpoint - event-driven git checkpoints for agentic coding hooks

pub mod checkpoint;
pub mod commands;
pub mod config;
pub mod error;
pub mod hooks;
pub mod project;
pub mod repo;
pub mod subprocess;
pub mod telemetry;
