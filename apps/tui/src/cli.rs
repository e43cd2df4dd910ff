use clap::{CommandFactory, Parser};

#[derive(Debug, Parser)]
#[command(
    name = "aoi_mapper",
    version,
    about = "Place and label access points and areas of interest on a map"
)]
pub struct CliArgs {
    /// Print a summary of the saved features and exit
    #[arg(long)]
    pub headless: bool,

    /// Print the saved FeatureCollection as JSON (headless)
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Override database path
    #[arg(long, value_name = "PATH")]
    pub db: Option<String>,

    /// Override the submission server host
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Override the log file path
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,
}

impl CliArgs {
    pub fn apply_env_overrides(&self) {
        if let Some(db) = &self.db {
            std::env::set_var("DATABASE_NAME", db);
        }
        if let Some(host) = &self.host {
            std::env::set_var("SUBMIT_HOST", host);
        }
        if let Some(path) = &self.log_file {
            std::env::set_var("LOG_FILE", path);
        }
        if self.debug {
            std::env::set_var("RUST_LOG", "debug");
        }
    }

    pub fn help_text() -> String {
        let mut command = Self::command();
        let mut buffer = Vec::new();
        command.write_help(&mut buffer).ok();
        String::from_utf8_lossy(&buffer).to_string()
    }
}
