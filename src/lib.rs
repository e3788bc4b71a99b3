//! Leaf Loader - mod loading core
//!
//! Discovers mod packages, resolves one mutually compatible version of every
//! mod and transforms game classes at load time so mods can extend a closed
//! game binary.
//!
//! Boot runs in a fixed order, driven by [`loader::Loader`]:
//!
//! 1. [`discovery`] scans search locations for candidates
//! 2. [`resolver`] selects a consistent mod set and its dependency order
//! 3. [`libraries`] verifies the installed libraries
//! 4. [`transform`] builds the class pipeline, [`gate`] starts serving classes
//! 5. [`entrypoint`] runs mod entrypoints phase by phase

pub mod cli;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod entrypoint;
pub mod error;
pub mod gate;
pub mod hash;
pub mod launch;
pub mod libraries;
pub mod loader;
pub mod logging;
pub mod metadata;
pub mod resolver;
pub mod transform;

pub use error::{LoaderError, Result};
pub use loader::{Loader, LoaderHandle, LoaderPhase};
