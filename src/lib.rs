//! Kiln - build configuration and invocation engine
//!
//! Turns build options into a collision-free build directory, prepares the
//! Conan dependency cache, drives CMake and keeps a canonical `bin` link
//! pointing at the most recent successful build.

pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod discover;
pub mod error;
pub mod fsops;
pub mod history;
pub mod publish;
pub mod toolchain;
pub mod ui;

pub use error::{KilnError, KilnResult};
