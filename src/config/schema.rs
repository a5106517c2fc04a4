//! Configuration schema for Kiln
//!
//! Global configuration is stored at `~/.config/kiln/config.toml`; a project
//! can override any value in a local `.kiln.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Filesystem layout
    pub paths: PathsConfig,

    /// Compiler and tool selection
    pub toolchain: ToolchainConfig,

    /// CMake flag naming and extra variables
    pub cmake: CmakeConfig,

    /// Build defaults
    pub build: BuildConfig,

    /// Coverage report settings
    pub coverage: CoverageConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Append successful steps to the build history log
    pub history: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            history: true,
        }
    }
}

/// Filesystem layout. Relative paths resolve against the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Source tree handed to CMake and Conan
    pub project_root: Option<PathBuf>,

    /// Holds one directory per build identity plus the `bin` link
    pub build_root: PathBuf,

    /// CMake install prefix, shared by all build identities
    pub install_dir: PathBuf,

    /// Per-build-type Conan output folders live under here
    pub dependency_cache: PathBuf,

    /// Conan profiles (`default.txt`, `asan.txt`, `tsan.txt`)
    pub profiles_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            build_root: PathBuf::from("build"),
            install_dir: PathBuf::from("build/install"),
            dependency_cache: PathBuf::from("build/conan"),
            profiles_dir: PathBuf::from("conan-profiles"),
        }
    }
}

/// Toolchain selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Pinned LLVM major version; picks clang, llvm-profdata and llvm-cov
    pub llvm_major_version: u32,

    /// Directory holding `clang-N` and `clang++-N`
    pub compiler_dir: PathBuf,

    /// CMake generator
    pub generator: String,

    /// CMake executable
    pub cmake: String,

    /// Conan executable
    pub conan: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            llvm_major_version: 17,
            compiler_dir: PathBuf::from("/usr/bin"),
            generator: "Ninja".to_string(),
            cmake: "cmake".to_string(),
            conan: "conan".to_string(),
        }
    }
}

/// CMake flag naming
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmakeConfig {
    /// Prefix of the project's own cache variables
    pub project_prefix: String,

    /// Prefix of the vendored subproject's cache variables
    pub subproject_prefix: String,

    /// Extra `-DKEY=VALUE` variables, emitted in key order
    pub variables: BTreeMap<String, String>,
}

impl Default for CmakeConfig {
    fn default() -> Self {
        Self {
            project_prefix: "FAASM".to_string(),
            subproject_prefix: "FAABRIC".to_string(),
            variables: BTreeMap::new(),
        }
    }
}

/// Build defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Targets built by `kiln tools`
    pub dev_targets: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dev_targets: [
                "codegen_func",
                "codegen_shared_obj",
                "func_runner",
                "func_sym",
                "is_app_migratable",
                "local_pool_runner",
                "planner_server",
                "pool_runner",
                "upload",
                "tests",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Coverage report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Merged profile data, relative to the project root
    pub intermediate: PathBuf,

    /// Sources matching this regex are excluded from the report
    pub exclude_regex: String,

    /// Test binary inside the debug build's `bin` directory
    pub test_binary: String,

    /// Leave the merged profile data behind after rendering
    pub keep_intermediate: bool,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            intermediate: PathBuf::from("tmp_gha.profdata"),
            exclude_regex: "/usr/local/code/faasm/tests/*".to_string(),
            test_binary: "tests".to_string(),
            keep_intermediate: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[toolchain]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.toolchain.llvm_major_version, 17);
        assert_eq!(config.build.dev_targets.len(), 10);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [toolchain]
            llvm_major_version = 18

            [cmake.variables]
            FAASM_WASM_BYTES_PER_PAGE = "65536"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.toolchain.llvm_major_version, 18);
        assert_eq!(config.toolchain.generator, "Ninja"); // default preserved
        assert_eq!(
            config.cmake.variables.get("FAASM_WASM_BYTES_PER_PAGE").map(String::as_str),
            Some("65536")
        );
    }
}
