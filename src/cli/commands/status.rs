//! Status command - show what is on disk

use super::CommandContext;
use crate::build::{BuildDirectory, BuildIdentity, BuildType};
use crate::cache;
use crate::discover;
use crate::error::KilnResult;
use crate::history::{BuildEvent, HistoryEntry};
use crate::publish;
use crate::ui;
use chrono::{DateTime, Local};
use std::path::PathBuf;

/// Snapshot of the build tree
#[derive(Debug)]
pub struct StatusReport {
    /// Where `bin` points and whether that directory exists
    pub bin: Option<(PathBuf, bool)>,
    /// Newest first
    pub builds: Vec<BuildEntry>,
    pub caches: Vec<CacheEntry>,
    pub last_publish: Option<HistoryEntry>,
}

#[derive(Debug)]
pub struct BuildEntry {
    pub name: String,
    pub identity: Option<BuildIdentity>,
    pub modified: DateTime<Local>,
}

#[derive(Debug)]
pub struct CacheEntry {
    pub build_type: BuildType,
    pub ready: bool,
    /// Lockfile fingerprint, if a lockfile exists
    pub fingerprint: Option<String>,
}

/// Execute the status command
pub async fn execute(ctx: &CommandContext) -> KilnResult<()> {
    let report = collect(ctx).await?;
    render(ctx, &report);
    Ok(())
}

/// Read build directories, caches, the `bin` link and history
pub async fn collect(ctx: &CommandContext) -> KilnResult<StatusReport> {
    let layout = &ctx.layout;

    let bin = match publish::current_target(&layout.bin_link()).await {
        Some(target) => {
            let exists = tokio::fs::metadata(&target)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            Some((target, exists))
        }
        None => None,
    };

    let mut candidates = discover::candidates(&layout.build_root).await?;
    candidates.sort_by(|a, b| b.modified.cmp(&a.modified));
    let builds = candidates
        .into_iter()
        .map(|candidate| BuildEntry {
            name: candidate
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            identity: BuildDirectory::from_path(candidate.path).identity(),
            modified: candidate.modified.into(),
        })
        .collect();

    let mut caches = Vec::new();
    for &build_type in BuildType::all() {
        let lockfile = layout.lockfile(build_type);
        let fingerprint = if lockfile.is_file() {
            Some(cache::fingerprint(&lockfile)?)
        } else {
            None
        };
        caches.push(CacheEntry {
            build_type,
            ready: cache::is_populated(&layout.cache_dir(build_type)),
            fingerprint,
        });
    }

    Ok(StatusReport {
        bin,
        builds,
        caches,
        last_publish: ctx.history.last_published().await,
    })
}

fn render(ctx: &CommandContext, report: &StatusReport) {
    let layout = &ctx.layout;
    ui::intro(&ctx.ui, "Kiln Build Status");

    ui::section(&ctx.ui, "Layout");
    ui::field(&ctx.ui, "project", &layout.project_root.display().to_string());
    ui::field(&ctx.ui, "build root", &layout.build_root.display().to_string());
    ui::field(&ctx.ui, "install", &layout.install_dir.display().to_string());

    ui::section(&ctx.ui, "Current binaries");
    match report.bin {
        Some((ref target, true)) => {
            ui::field_status(&ctx.ui, "bin", &target.display().to_string(), true)
        }
        Some((ref target, false)) => ui::field_status(
            &ctx.ui,
            "bin",
            &format!("{} (missing)", target.display()),
            false,
        ),
        None => ui::warn(&ctx.ui, "No bin link yet", Some("Run: kiln configure")),
    }

    ui::section(&ctx.ui, "Build directories");
    if report.builds.is_empty() {
        ui::remark(&ctx.ui, "none");
    }
    for (i, build) in report.builds.iter().enumerate() {
        let identity = build
            .identity
            .map(|identity| identity.to_string())
            .unwrap_or_else(|| "unrecognised".to_string());
        let marker = if i == 0 { " (current)" } else { "" };
        ui::field(
            &ctx.ui,
            &build.name,
            &format!("{} {}{}", identity, build.modified.format("%Y-%m-%d %H:%M:%S"), marker),
        );
    }

    ui::section(&ctx.ui, "Dependency caches");
    for entry in &report.caches {
        let state = if entry.ready { "ready" } else { "missing" };
        let lock = match entry.fingerprint {
            Some(ref fingerprint) => format!("lock {}", fingerprint),
            None => "no lockfile".to_string(),
        };
        ui::field_status(
            &ctx.ui,
            entry.build_type.as_str(),
            &format!("{}, {}", state, lock),
            entry.ready,
        );
    }

    if let Some(ref entry) = report.last_publish {
        if let BuildEvent::Published { ref target, .. } = entry.event {
            let when: DateTime<Local> = entry.timestamp.into();
            ui::section(&ctx.ui, "Last publish");
            ui::field(&ctx.ui, "when", &when.format("%Y-%m-%d %H:%M:%S").to_string());
            ui::field(&ctx.ui, "target", &target.display().to_string());
        }
    }
}
