//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{KilnError, KilnResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;
use toml_edit::{Array, DocumentMut, Item, Table};

/// How a config value is stored in TOML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    String,
    Integer,
    Boolean,
    List,
}

/// Execute the config command
///
/// `local_path` is the `.kiln.toml` that `set --local` writes to.
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
    local_path: &Path,
) -> KilnResult<()> {
    let ctx = UiContext::detect();

    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(&ctx, manager, force).await?,
        Some(ConfigAction::Set { key, value, local }) => {
            let path = if local { local_path } else { manager.path() };
            set_value(path, &key, &value).await?;
            ui::done(
                &ctx,
                &format!("Set {} = {} in {}", key, value, path.display()),
            );
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> KilnResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(ctx: &UiContext, manager: &ConfigManager, force: bool) -> KilnResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        ui::warn(
            ctx,
            &format!("Config already exists at {}", path.display()),
            Some("Use --force to overwrite"),
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::done_detail(ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

/// Set `key` in the TOML file at `path`, keeping its comments and layout
async fn set_value(path: &Path, key: &str, value: &str) -> KilnResult<()> {
    let content = if path.exists() {
        fs::read_to_string(path)
            .await
            .map_err(|e| KilnError::io(format!("reading {}", path.display()), e))?
    } else {
        String::new()
    };

    let updated = set_in_document(&content, key, value).map_err(|e| match e {
        KilnError::ConfigInvalid { reason, .. } => KilnError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| KilnError::ConfigDirCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }
    fs::write(path, updated)
        .await
        .map_err(|e| KilnError::io(format!("writing {}", path.display()), e))
}

/// Apply one `key = value` edit to a TOML document and return the new text
///
/// The result must still deserialize into [`Config`].
fn set_in_document(content: &str, key: &str, value: &str) -> KilnResult<String> {
    let kind = value_kind(key).ok_or_else(|| KilnError::ConfigKey(key.to_string()))?;
    let mut doc: DocumentMut = content.parse()?;

    let parts: Vec<&str> = key.split('.').collect();
    let (leaf, tables) = parts
        .split_last()
        .ok_or_else(|| KilnError::ConfigKey(key.to_string()))?;

    let mut table: &mut Table = doc.as_table_mut();
    for part in tables {
        table = table
            .entry(part)
            .or_insert(toml_edit::table())
            .as_table_mut()
            .ok_or_else(|| KilnError::ConfigInvalid {
                path: Default::default(),
                reason: format!("{} is not a table", part),
            })?;
    }
    table[*leaf] = typed_value(kind, key, value)?;

    let updated = doc.to_string();
    toml::from_str::<Config>(&updated).map_err(|e| KilnError::ConfigInvalid {
        path: Default::default(),
        reason: e.to_string(),
    })?;
    Ok(updated)
}

fn typed_value(kind: ValueKind, key: &str, value: &str) -> KilnResult<Item> {
    let invalid = |expected: &str| KilnError::ConfigInvalid {
        path: Default::default(),
        reason: format!("{} expects {}, got '{}'", key, expected, value),
    };

    Ok(match kind {
        ValueKind::String => toml_edit::value(value),
        ValueKind::Integer => toml_edit::value(
            value
                .parse::<i64>()
                .map_err(|_| invalid("an integer"))?,
        ),
        ValueKind::Boolean => toml_edit::value(parse_bool(value).ok_or_else(|| invalid("true/false"))?),
        ValueKind::List => toml_edit::value(
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Array>(),
        ),
    })
}

fn value_kind(key: &str) -> Option<ValueKind> {
    let parts: Vec<&str> = key.split('.').collect();
    match parts.as_slice() {
        ["general", "log_format"] => Some(ValueKind::String),
        ["general", "history"] => Some(ValueKind::Boolean),
        ["paths", "project_root" | "build_root" | "install_dir" | "dependency_cache" | "profiles_dir"] => {
            Some(ValueKind::String)
        }
        ["toolchain", "llvm_major_version"] => Some(ValueKind::Integer),
        ["toolchain", "compiler_dir" | "generator" | "cmake" | "conan"] => Some(ValueKind::String),
        ["cmake", "project_prefix" | "subproject_prefix"] => Some(ValueKind::String),
        ["cmake", "variables", name] if !name.is_empty() => Some(ValueKind::String),
        ["build", "dev_targets"] => Some(ValueKind::List),
        ["coverage", "intermediate" | "exclude_regex" | "test_binary"] => Some(ValueKind::String),
        ["coverage", "keep_intermediate"] => Some(ValueKind::Boolean),
        _ => None,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
