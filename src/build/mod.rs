//! Build axes and identities
//!
//! A build is described by a handful of closed enumerations. Only
//! [`BuildIdentity`] (build type + isolation mode) decides where the build
//! lives on disk; the remaining toggles only change how it is configured.

pub mod paths;
pub mod validate;

pub use paths::{build_dir, BuildDirectory};
pub use validate::validate;

use crate::error::KilnError;
use std::fmt;
use std::str::FromStr;

/// CMake build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuildType {
    #[default]
    Debug,
    Release,
}

impl BuildType {
    /// All legal build types
    pub fn all() -> &'static [Self] {
        &[Self::Debug, Self::Release]
    }

    /// Name as passed to CMake and Conan
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }

    /// Case-folded name used for directories and lockfiles
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = KilnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Debug" | "debug" => Ok(Self::Debug),
            "Release" | "release" => Ok(Self::Release),
            _ => Err(KilnError::UnknownBuildType {
                value: s.to_string(),
            }),
        }
    }
}

/// Hardware isolation (SGX) mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IsolationMode {
    #[default]
    Disabled,
    Simulation,
    Hardware,
}

impl IsolationMode {
    /// All isolation modes
    pub fn all() -> &'static [Self] {
        &[Self::Disabled, Self::Simulation, Self::Hardware]
    }

    /// Name as passed to CMake
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::Simulation => "Simulation",
            Self::Hardware => "Hardware",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl fmt::Display for IsolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IsolationMode {
    type Err = KilnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Disabled" | "disabled" => Ok(Self::Disabled),
            "Simulation" | "simulation" | "sim" => Ok(Self::Simulation),
            "Hardware" | "hardware" | "hw" => Ok(Self::Hardware),
            _ => Err(KilnError::UnknownIsolationMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Compiler sanitiser instrumentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sanitiser {
    #[default]
    None,
    Address,
    Thread,
    Undefined,
    Leak,
    Memory,
}

impl Sanitiser {
    /// Name as passed to CMake
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Address => "Address",
            Self::Thread => "Thread",
            Self::Undefined => "Undefined",
            Self::Leak => "Leak",
            Self::Memory => "Memory",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Sanitiser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sanitiser {
    type Err = KilnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" | "none" => Ok(Self::None),
            "Address" | "address" => Ok(Self::Address),
            "Thread" | "thread" => Ok(Self::Thread),
            "Undefined" | "undefined" => Ok(Self::Undefined),
            "Leak" | "leak" => Ok(Self::Leak),
            "Memory" | "memory" => Ok(Self::Memory),
            _ => Err(KilnError::UnknownSanitiser {
                value: s.to_string(),
            }),
        }
    }
}

/// The (build type, isolation mode) pair that owns a build directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BuildIdentity {
    pub build_type: BuildType,
    pub isolation: IsolationMode,
}

impl BuildIdentity {
    pub fn new(build_type: BuildType, isolation: IsolationMode) -> Self {
        Self {
            build_type,
            isolation,
        }
    }

    /// Directory name under the build root
    ///
    /// `debug`, `release-sgx-sim`, `debug-sgx-hw`, ...
    pub fn dir_name(&self) -> String {
        let suffix = match self.isolation {
            IsolationMode::Disabled => "",
            IsolationMode::Simulation => "-sgx-sim",
            IsolationMode::Hardware => "-sgx-hw",
        };
        format!("{}{}", self.build_type.dir_name(), suffix)
    }

    /// Inverse of [`dir_name`](Self::dir_name)
    pub fn from_dir_name(name: &str) -> Option<Self> {
        let (build_type, rest) = if let Some(rest) = name.strip_prefix("debug") {
            (BuildType::Debug, rest)
        } else if let Some(rest) = name.strip_prefix("release") {
            (BuildType::Release, rest)
        } else {
            return None;
        };

        let isolation = match rest {
            "" => IsolationMode::Disabled,
            "-sgx-sim" => IsolationMode::Simulation,
            "-sgx-hw" => IsolationMode::Hardware,
            _ => return None,
        };

        Some(Self::new(build_type, isolation))
    }
}

impl fmt::Display for BuildIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.build_type, self.isolation)
    }
}

/// Optional configure-time features
///
/// Anything left at its default is omitted from the generated command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildToggles {
    /// Performance profiling support
    pub perf: bool,
    /// Self-tracing in both the project and the subproject
    pub prof: bool,
    /// Code coverage instrumentation
    pub coverage: bool,
    pub sanitiser: Sanitiser,
    /// Use the alternative to spinlocks in the subproject
    pub disable_spinlock: bool,
    /// Target CPU override
    pub cpu: Option<String>,
}

/// Which targets a compile step builds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileTargets {
    All,
    Named(Vec<String>),
}

impl CompileTargets {
    /// Build from user-supplied names; `all` (or nothing) means everything
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() || names.iter().any(|n| n == "all") {
            Self::All
        } else {
            Self::Named(names)
        }
    }
}
