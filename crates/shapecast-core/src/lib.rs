//! Core types, config, and errors for shapecast.

pub mod config;
pub mod error;
pub mod shape;
pub mod slot;
