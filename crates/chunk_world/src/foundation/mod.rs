//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Integer coordinate math
//! - Handle-based collections
//! - Content hashing
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod hashing;
pub mod logging;
