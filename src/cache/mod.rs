//! Dependency cache management
//!
//! Conan packages are installed into one output folder per build type,
//! pinned by a per-build-type lockfile in the project root.
//!
//! # Lifecycle
//!
//! | Step | When | Effect |
//! |------|------|--------|
//! | clean | `--clean` | lockfile and cache folder deleted |
//! | lock | lockfile absent | `conan lock create` |
//! | install | always | `conan install --build=missing` (`*` after clean) |

pub mod lockfile;
pub mod manager;

pub use lockfile::{fingerprint, Profile};
pub use manager::{
    is_populated, BuildPolicy, DependencyCache, DependencyCacheManager, TOOLCHAIN_FILE,
};
