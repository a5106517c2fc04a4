//! External toolchain invocation
//!
//! - `runner`: command model and execution backends
//! - `cmake`: configure and compile steps
//! - `coverage`: profile merge and report rendering

pub mod cmake;
pub mod coverage;
pub mod runner;

pub use cmake::BuildInvoker;
pub use coverage::CoverageReport;
pub use runner::{DryRunRunner, SystemRunner, ToolCommand, ToolRunner};

use crate::error::{KilnError, KilnResult};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Max number of output lines to include in build error messages.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Join the last `BUILD_ERROR_TAIL_LINES` lines of tool output for an error.
pub(crate) fn build_error_output(lines: &[String]) -> String {
    let start = lines.len().saturating_sub(BUILD_ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Hand every stdout and stderr line of `child` to `on_line` as it arrives.
///
/// Both pipes are drained concurrently so neither can fill up and stall the
/// tool. Only the tail is kept, for the error if the tool fails.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_line: &(dyn Fn(String) + Send + Sync),
) -> KilnResult<Vec<String>> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| KilnError::Internal("tool stdout not piped".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| KilnError::Internal("tool stderr not piped".to_string()))?;

    let tail = Mutex::new(VecDeque::with_capacity(BUILD_ERROR_TAIL_LINES));
    let forward = |line: String| {
        on_line(line.clone());
        if let Ok(mut tail) = tail.lock() {
            if tail.len() == BUILD_ERROR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    };

    tokio::join!(pump_lines(stdout, &forward), pump_lines(stderr, &forward));

    Ok(tail
        .into_inner()
        .map(Vec::from)
        .unwrap_or_default())
}

/// Read `reader` line by line until EOF or a read error
async fn pump_lines<R>(reader: R, forward: &(dyn Fn(String) + Send + Sync))
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        forward(line);
    }
}
