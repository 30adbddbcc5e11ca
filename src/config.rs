use std::path::PathBuf;

pub trait ConfigManager: Sized + Clone + Send + Sync {
    fn get_log_path(&self) -> eyre::Result<PathBuf>;
}

#[derive(Default, Clone, Debug)]
pub struct LocalConfigManager {}

impl LocalConfigManager {
    pub fn new() -> Self {
        Self {}
    }
}

// NOTE: This requires HOME to be set when XDG_DATA_HOME isn't. Falling back to getpwuid would
// pull in libc for very little gain.
#[cfg(not(target_os = "windows"))]
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(target_os = "windows")]
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

pub fn data_dir() -> Option<PathBuf> {
    let data_dir = match std::env::var_os("XDG_DATA_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home_dir()?.join(".local").join("share"),
    };

    Some(data_dir.join("logpipe"))
}

impl ConfigManager for LocalConfigManager {
    fn get_log_path(&self) -> eyre::Result<PathBuf> {
        let mut log_path =
            data_dir().ok_or_else(|| eyre::eyre!("Can't find a data dir, is $HOME set?"))?;
        log_path.push("logpipe.log");

        Ok(log_path)
    }
}
