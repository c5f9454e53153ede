use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::default_config_toml;

pub const CONFIG_FILENAME: &str = "pocketdex.toml";

#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub project_root: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub project_root: PathBuf,
    pub cache_dir: PathBuf,
    pub sets_cache_dir: PathBuf,
    pub cards_cache_dir: PathBuf,
    pub out_dir: PathBuf,
    pub cards_out_dir: PathBuf,
    pub sets_out_dir: PathBuf,
    pub config_path: PathBuf,
}

impl ResolvedPaths {
    pub fn diagnostics(&self) -> String {
        format!(
            "project_root={}\ncache_dir={}\nsets_cache_dir={}\ncards_cache_dir={}\nout_dir={}\ncards_out_dir={}\nsets_out_dir={}\nconfig_path={}",
            normalize_for_display(&self.project_root),
            normalize_for_display(&self.cache_dir),
            normalize_for_display(&self.sets_cache_dir),
            normalize_for_display(&self.cards_cache_dir),
            normalize_for_display(&self.out_dir),
            normalize_for_display(&self.cards_out_dir),
            normalize_for_display(&self.sets_out_dir),
            normalize_for_display(&self.config_path),
        )
    }
}

/// Resolve the run's directory layout: flag > env > default under the
/// project root.
pub fn resolve_paths(overrides: &PathOverrides) -> Result<ResolvedPaths> {
    let cwd = env::current_dir().context("failed to read current directory")?;
    let project_root = match overrides.project_root.as_deref() {
        Some(path) => absolutize(path, &cwd),
        None => match env_path("POCKETDEX_PROJECT_ROOT") {
            Some(path) => absolutize(&path, &cwd),
            None => cwd.clone(),
        },
    };

    let cache_dir = resolve_dir(
        overrides.cache_dir.as_deref(),
        "POCKETDEX_CACHE_DIR",
        &project_root,
        ".cache",
    );
    let out_dir = resolve_dir(
        overrides.out_dir.as_deref(),
        "POCKETDEX_OUT_DIR",
        &project_root,
        "out",
    );
    let config_path = resolve_dir(
        overrides.config.as_deref(),
        "POCKETDEX_CONFIG",
        &project_root,
        CONFIG_FILENAME,
    );

    Ok(ResolvedPaths {
        sets_cache_dir: cache_dir.join("sets"),
        cards_cache_dir: cache_dir.join("cards"),
        cards_out_dir: out_dir.join("cards").join("en"),
        sets_out_dir: out_dir.join("sets"),
        project_root,
        cache_dir,
        out_dir,
        config_path,
    })
}

fn resolve_dir(
    override_path: Option<&Path>,
    env_key: &str,
    project_root: &Path,
    default_name: &str,
) -> PathBuf {
    if let Some(path) = override_path {
        return absolutize(path, project_root);
    }
    if let Some(path) = env_path(env_key) {
        return absolutize(&path, project_root);
    }
    project_root.join(default_name)
}

fn env_path(key: &str) -> Option<PathBuf> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(trimmed))
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn normalize_for_display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[derive(Debug, Clone, Default)]
pub struct InitReport {
    pub created_dirs: Vec<PathBuf>,
    pub wrote_config: bool,
}

/// Create the cache and output directories and, unless one already exists,
/// a starter config file.
pub fn init_layout(paths: &ResolvedPaths, force: bool) -> Result<InitReport> {
    let mut report = InitReport::default();
    for dir in [
        &paths.sets_cache_dir,
        &paths.cards_cache_dir,
        &paths.cards_out_dir,
        &paths.sets_out_dir,
    ] {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            report.created_dirs.push(dir.clone());
        }
    }
    if force || !paths.config_path.exists() {
        if let Some(parent) = paths.config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&paths.config_path, default_config_toml())
            .with_context(|| format!("failed to write {}", paths.config_path.display()))?;
        report.wrote_config = true;
    }
    Ok(report)
}

/// Create the cache and output directories without touching the config.
pub fn ensure_layout(paths: &ResolvedPaths) -> Result<()> {
    for dir in [
        &paths.sets_cache_dir,
        &paths.cards_cache_dir,
        &paths.cards_out_dir,
        &paths.sets_out_dir,
    ] {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    Ok(())
}
