//! Phage Core - Core types and utilities for the Phage engine
//!
//! This crate provides the foundational types used throughout the engine:
//! - 2D math primitives (re-exported from glam)
//! - `Transform2`, the translate/rotate/scale transform every entity carries
//! - Frame time with a fixed-step cadence

pub mod time;
pub mod types;

pub use glam::{Affine2, Vec2};
pub use time::{GameTime, TimeConfig};
pub use types::Transform2;
