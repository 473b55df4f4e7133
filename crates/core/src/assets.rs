use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};

static DEFAULT_DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    dirs::data_local_dir()
        .map(|p| p.join("aichat"))
        .unwrap_or_else(|| PathBuf::from("~/.local/share/aichat"))
});

// Fallback only, get_config_dir checks XDG_CONFIG_HOME first
static DEFAULT_CONFIG_DIR: Lazy<PathBuf> = Lazy::new(|| {
    dirs::config_dir()
        .map(|p| p.join("aichat"))
        .unwrap_or_else(|| PathBuf::from("~/.config/aichat"))
});

pub fn get_config_dir() -> PathBuf {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config_home).join("aichat")
    } else {
        DEFAULT_CONFIG_DIR.clone()
    }
}

pub fn get_data_dir() -> std::io::Result<PathBuf> {
    let path = if let Ok(xdg_data_home) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data_home).join("aichat")
    } else {
        DEFAULT_DATA_DIR.clone()
    };
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

pub fn get_default_config() -> String {
    include_str!("../data/config.yml").to_string()
}

/// Directories searched for system message files, in lookup order.
pub fn system_message_dirs(config_dir: &Path) -> Vec<PathBuf> {
    vec![config_dir.join("system_messages"), config_dir.to_path_buf()]
}

/// Locates a system message file.
///
/// The name is tried as a path first (with `~` expanded), then inside each of
/// `dirs`. Names without a `.txt` extension are retried with one appended.
pub fn find_system_message_file(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let direct = PathBuf::from(shellexpand::tilde(name).into_owned());
    if direct.is_file() {
        return Some(direct);
    }

    if let Some(found) = dirs.iter().map(|d| d.join(name)).find(|p| p.is_file()) {
        return Some(found);
    }

    if name.to_lowercase().ends_with(".txt") {
        return None;
    }
    find_system_message_file(&format!("{name}.txt"), dirs)
}
