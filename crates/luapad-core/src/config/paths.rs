use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Platform directories for the application.
///
/// Config lives in the platform config dir (`~/.config/luapad` on Linux), logs
/// and other runtime data in the data dir (`~/.local/share/luapad`).
pub struct ProjectPaths {
    dirs: ProjectDirs,
}

impl ProjectPaths {
    /// `None` when no home directory can be determined
    pub fn new(name: &str) -> Option<Self> {
        ProjectDirs::from("", "", name).map(|dirs| Self { dirs })
    }

    pub fn config_dir(&self) -> &Path {
        self.dirs.config_dir()
    }

    pub fn data_dir(&self) -> &Path {
        self.dirs.data_dir()
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }
}
