use crate::model::PersistedState;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const APP_DIR: &str = "reelqueue";
const STATE_FILE: &str = "state.json";
const CONFIG_DIR_ENV: &str = "REELQUEUE_CONFIG_DIR";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn state_path() -> Result<PathBuf> {
    Ok(config_root()?.join(STATE_FILE))
}

pub fn load_state() -> Result<PersistedState> {
    load_state_from(&state_path()?)
}

/// Writes under [`config_root`], creating it on first save.
pub fn save_state(state: &PersistedState) -> Result<()> {
    save_state_to(&state_path()?, state)
}

/// A missing file is a first run, not an error.
pub fn load_state_from(path: &Path) -> Result<PersistedState> {
    if !path.exists() {
        return Ok(PersistedState::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read state file {}", path.display()))?;
    let state: PersistedState = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse state file {}", path.display()))?;
    info!(path = %path.display(), queue_len = state.queue.len(), "loaded queue state");
    Ok(state)
}

pub fn save_state_to(path: &Path, state: &PersistedState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), queue_len = state.queue.len(), "saved queue state");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MediaItem, RepeatMode};
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().join("fresh");
        unsafe {
            env::set_var(CONFIG_DIR_ENV, root.to_string_lossy().as_ref());
        }

        let state = PersistedState {
            queue: vec![MediaItem::new("a", "A").with_file_size(2048)],
            cursor: Some(0),
            repeat_mode: RepeatMode::All,
            ..PersistedState::default()
        };
        save_state(&state).expect("save");
        assert!(root.join(STATE_FILE).exists());

        let loaded = load_state().expect("load");
        assert_eq!(loaded, state);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().expect("tempdir");
        let loaded = load_state_from(&dir.path().join("absent.json")).expect("load");
        assert_eq!(loaded, PersistedState::default());
    }

    #[test]
    fn corrupt_file_names_the_path() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(STATE_FILE);
        fs::write(&path, "{ not json").expect("write");

        let err = load_state_from(&path).expect_err("parse should fail");
        assert!(format!("{err:#}").contains("failed to parse state file"));
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("deeper").join(STATE_FILE);
        save_state_to(&path, &PersistedState::default()).expect("save");
        assert!(path.exists());
    }
}
