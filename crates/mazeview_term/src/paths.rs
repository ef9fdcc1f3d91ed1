//! Cross-platform application paths

use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self, String> {
        let config_dir = dirs::config_dir()
            .ok_or("Could not determine config directory")?
            .join("mazeview");
        let data_dir = dirs::data_dir()
            .ok_or("Could not determine data directory")?
            .join("mazeview");

        // The log file is opened before anything else runs.
        fs::create_dir_all(&data_dir)
            .map_err(|e| format!("Failed to create data directory: {}", e))?;

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("mazeview.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_their_dirs() {
        let p = AppPaths {
            config_dir: PathBuf::from("/tmp/mz/config"),
            data_dir: PathBuf::from("/tmp/mz/data"),
        };
        assert_eq!(p.config_file(), PathBuf::from("/tmp/mz/config/config.json"));
        assert_eq!(p.log_file(), PathBuf::from("/tmp/mz/data/mazeview.log"));
    }
}
