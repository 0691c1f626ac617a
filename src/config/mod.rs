mod file_config;

pub use file_config::FileConfig;

use anyhow::Result;
use std::path::PathBuf;

/// CLI arguments that participate in config resolution. Mirrors the CLI
/// arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub probe_command: Option<String>,
    pub logging_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub probe_command: String,
    pub logging_level: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        let probe_command = file
            .probe_command
            .or_else(|| cli.probe_command.clone())
            .unwrap_or_else(|| "ffprobe".to_string());

        let logging_level = file.logging_level.or_else(|| cli.logging_level.clone());

        Ok(Self {
            db_path,
            probe_command,
            logging_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn resolve_cli_only() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/var/lib/warbler/catalogue.db")),
            probe_command: None,
            logging_level: Some("debug".to_string()),
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/warbler/catalogue.db"));
        assert_eq!(config.probe_command, "ffprobe");
        assert_eq!(config.logging_level.as_deref(), Some("debug"));
    }

    #[test]
    fn resolve_toml_overrides_cli() {
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/cli/db")),
            probe_command: Some("cli-probe".to_string()),
            ..Default::default()
        };
        let file = FileConfig {
            db_path: Some("/toml/db".to_string()),
            probe_command: Some("/usr/bin/ffprobe".to_string()),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, Some(file)).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/toml/db"));
        assert_eq!(config.probe_command, "/usr/bin/ffprobe");
    }

    #[test]
    fn resolve_missing_db_path_is_error() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_path must be specified"));
    }

    #[test]
    fn file_config_loads_partial_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "db_path = \"/data/catalogue.db\"").unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.db_path.as_deref(), Some("/data/catalogue.db"));
        assert!(config.probe_command.is_none());
    }

    #[test]
    fn file_config_rejects_malformed_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "db_path = [not toml").unwrap();
        assert!(FileConfig::load(file.path()).is_err());
    }
}
