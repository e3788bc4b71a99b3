//! Launch-time inputs handed to the loader by the game launcher

pub mod arguments;

pub use arguments::GameArguments;
