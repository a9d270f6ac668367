//! Transparency module for the landing tracker.
//!
//! This module keeps tracking activity auditable: how many page events were
//! handled and what happened to the analytics emissions they produced.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, SharedTransparencyLog, TransparencyLog,
    TransparencyStats,
};
