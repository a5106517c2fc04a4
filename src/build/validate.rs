//! Option validation
//!
//! Runs before any directory is created or any tool is spawned.

use super::{BuildType, IsolationMode, Sanitiser};
use crate::error::{KilnError, KilnResult};

/// Reject incompatible axis combinations
///
/// Sanitised builds and SGX builds cannot coexist in the toolchain. The build
/// type is already a closed enum here; unknown names are rejected when parsed.
pub fn validate(
    build_type: BuildType,
    isolation: IsolationMode,
    sanitiser: Sanitiser,
) -> KilnResult<()> {
    if isolation.is_enabled() && sanitiser.is_enabled() {
        return Err(KilnError::IncompatibleOptions {
            isolation: isolation.to_string(),
            sanitiser: sanitiser.to_string(),
        });
    }

    tracing::debug!(
        "Validated options: build={} isolation={} sanitiser={}",
        build_type,
        isolation,
        sanitiser
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SANITISERS: [Sanitiser; 6] = [
        Sanitiser::None,
        Sanitiser::Address,
        Sanitiser::Thread,
        Sanitiser::Undefined,
        Sanitiser::Leak,
        Sanitiser::Memory,
    ];

    #[test]
    fn rejects_isolation_with_sanitiser() {
        let err = validate(BuildType::Release, IsolationMode::Hardware, Sanitiser::Thread)
            .unwrap_err();
        assert!(matches!(err, KilnError::IncompatibleOptions { .. }));
    }

    #[test]
    fn accepts_isolation_without_sanitiser() {
        assert!(validate(BuildType::Release, IsolationMode::Hardware, Sanitiser::None).is_ok());
    }

    #[test]
    fn exhaustive_matrix() {
        for build_type in BuildType::all() {
            for isolation in IsolationMode::all() {
                for sanitiser in SANITISERS {
                    let result = validate(*build_type, *isolation, sanitiser);
                    let both = isolation.is_enabled() && sanitiser.is_enabled();
                    assert_eq!(result.is_err(), both, "{isolation} + {sanitiser}");
                }
            }
        }
    }
}
