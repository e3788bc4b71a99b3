//! Command implementations for the leaf CLI

pub mod boot;
pub mod completions;
pub mod resolve;
pub mod scan;
pub mod transform;
pub mod verify_libraries;
pub mod version;
