//! Core types shared by the balloon-gate crates.
//!
//! This crate provides the strongly-typed identifiers used across the
//! workspace.

pub mod id;

pub use id::{ParseIdError, SessionId};
