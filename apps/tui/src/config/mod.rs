use color_eyre::eyre::eyre;
use dotenv::dotenv;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_NAME: &str = "aoi_mapper.db";
pub const DEFAULT_SUBMIT_HOST: &str = "localhost";
pub const DEFAULT_LOG_FILE: &str = "aoi_mapper.log";

/// Settings resolved from `.env`, the environment and CLI overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub submit_host: String,
    pub log_file: PathBuf,
}

/// Loads `.env` into the process environment. Variables already set win.
/// Must run before anything reads the environment.
pub fn load_env() {
    dotenv().ok();
}

/// Loads a specific env file, as [`load_env`] does for `.env`
pub fn load_env_from(path: &Path) -> color_eyre::eyre::Result<()> {
    dotenv::from_path(path).map_err(|e| eyre!("Failed to load {}: {e}", path.display()))
}

/// Initializes the application configuration
pub fn init_app_config() -> color_eyre::eyre::Result<AppConfig> {
    load_env();

    let base_dir: PathBuf = env::current_dir()?;

    let db_name = env::var("DATABASE_NAME").unwrap_or_else(|_| DEFAULT_DATABASE_NAME.to_string());
    let database_path = base_dir.join(&db_name);

    if let Some(parent) = database_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Ok(AppConfig {
        database_url: database_url_for(&database_path)?,
        submit_host: get_submit_host(),
        log_file: get_log_file(),
    })
}

/// Formats a SQLx SQLite URL: `sqlite:///abs/path` or `sqlite://rel/path`.
pub fn database_url_for(path: &Path) -> color_eyre::eyre::Result<String> {
    // We don't use canonicalize() because the file might not exist yet
    let path_str = path
        .to_str()
        .ok_or_else(|| eyre!("Invalid database path"))?;

    let clean_path = path_str.trim_start_matches('/');
    if path.is_absolute() {
        Ok(format!("sqlite:///{clean_path}"))
    } else {
        Ok(format!("sqlite://{clean_path}"))
    }
}

/// Host of the collection server that receives submissions
pub fn get_submit_host() -> String {
    env::var("SUBMIT_HOST")
        .ok()
        .map(|host| host.trim().to_string())
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| DEFAULT_SUBMIT_HOST.to_string())
}

/// Log file path; the TUI owns the terminal so logs never go to stderr
pub fn get_log_file() -> PathBuf {
    env::var("LOG_FILE").map_or_else(|_| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_get_three_slashes() {
        let url = database_url_for(Path::new("/var/lib/aoi/panel.db")).unwrap();
        assert_eq!(url, "sqlite:///var/lib/aoi/panel.db");
    }

    #[test]
    fn relative_paths_get_two_slashes() {
        let url = database_url_for(Path::new("data/panel.db")).unwrap();
        assert_eq!(url, "sqlite://data/panel.db");
    }

    #[test]
    fn log_file_comes_from_loaded_env_file() {
        let path = env::temp_dir().join(format!("aoi_mapper_{}.env", std::process::id()));
        std::fs::write(&path, "LOG_FILE=from_env_file.log\n").unwrap();
        env::remove_var("LOG_FILE");

        load_env_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(get_log_file(), PathBuf::from("from_env_file.log"));
    }
}
