use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where the high score and timer preferences live
    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "tabelline")
            .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
    }

    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("tabelline");
            Some(state_dir.join("tabelline.log"))
        } else {
            ProjectDirs::from("", "", "tabelline")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("tabelline.log"))
        }
    }
}
