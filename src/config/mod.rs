use anyhow::Result;
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides, e.g. `DBBROWSE_DATABASES__SAKILA=/data/sakila.db`.
const ENV_PREFIX: &str = "DBBROWSE";

/// Saved database files, keyed by a short name.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    databases: BTreeMap<String, PathBuf>,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Loads `~/.dbbrowse-cli/config.json` with environment overrides
    /// applied on top. A missing file reads as an empty config and is not
    /// created; [`Config::save`] writes it.
    pub fn load() -> Result<Self> {
        Config::load_from(&Config::get_config_file_path())
    }

    /// Loads only what is stored in the file, for commands that save it back.
    pub fn load_saved() -> Result<Self> {
        Config::load_saved_from(&Config::get_config_file_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        Config::build(config_path, true)
    }

    pub fn load_saved_from(config_path: &Path) -> Result<Self> {
        Config::build(config_path, false)
    }

    fn build(config_path: &Path, with_env: bool) -> Result<Self> {
        let mut builder = ::config::Config::builder().add_source(
            ::config::File::from(config_path)
                .format(::config::FileFormat::Json)
                .required(false),
        );
        if with_env {
            builder = builder.add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Config::get_config_file_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure the config directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_str = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_str)?;
        Ok(())
    }

    pub fn add_database(&mut self, name: &str, path: impl Into<PathBuf>) {
        self.databases.insert(name.to_string(), path.into());
    }

    pub fn get_database(&self, name: &str) -> Option<&Path> {
        self.databases.get(name).map(PathBuf::as_path)
    }

    pub fn list_databases(&self) -> Vec<(&str, &Path)> {
        self.databases
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
            .collect()
    }

    pub fn remove_database(&mut self, name: &str) -> bool {
        self.databases.remove(name).is_some()
    }

    /// A saved name wins; anything else is taken as a file path.
    pub fn resolve(&self, name_or_path: &str) -> PathBuf {
        self.get_database(name_or_path)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(name_or_path))
    }

    /// Resolves `--db` when given, else the saved `default_name`, else the
    /// `default_file` in the working directory.
    pub fn resolve_or(
        &self,
        requested: Option<&str>,
        default_name: &str,
        default_file: &str,
    ) -> PathBuf {
        match requested {
            Some(value) => self.resolve(value),
            None => self
                .get_database(default_name)
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(default_file)),
        }
    }

    fn get_config_file_path() -> PathBuf {
        let mut config_dir = Self::get_home_dir();
        config_dir.push(".dbbrowse-cli");
        config_dir.push("config.json");
        config_dir
    }

    fn get_home_dir() -> PathBuf {
        home_dir().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_path(dir: &TempDir) -> PathBuf {
        dir.path().join(".dbbrowse-cli").join("config.json")
    }

    #[test]
    fn test_new_config() {
        let config = Config::new();
        assert!(config.list_databases().is_empty());
    }

    #[test]
    fn test_missing_config_loads_empty_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let path = config_path(&temp_dir);

        let config = Config::load_saved_from(&path).unwrap();
        assert!(!path.exists());
        assert!(config.list_databases().is_empty());
    }

    #[test]
    fn test_load_under_unwritable_parent() {
        // A regular file as the parent directory makes any write fail
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let path = blocker.path().join(".dbbrowse-cli").join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert!(config.get_database("unlikely-test-name").is_none());
        assert!(Config::new().save_to(&path).is_err());
    }

    #[test]
    fn test_save_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = config_path(&temp_dir);

        let mut config = Config::load_saved_from(&path).unwrap();
        config.add_database("films", "sakila.db");
        config.save_to(&path).unwrap();

        assert!(path.exists());
        let reloaded = Config::load_saved_from(&path).unwrap();
        assert_eq!(reloaded.get_database("films"), Some(Path::new("sakila.db")));
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = config_path(&temp_dir);

        let mut config = Config::new();
        config.add_database("rentals", "/data/sakila.db");
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(
            loaded.get_database("rentals"),
            Some(Path::new("/data/sakila.db"))
        );
    }

    #[test]
    fn test_add_and_remove_database() {
        let mut config = Config::new();
        config.add_database("music", "chinook.db");
        config.add_database("music", "other.db");
        config.add_database("films", "sakila.db");

        let names: Vec<&str> = config.list_databases().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["films", "music"]);
        assert_eq!(config.get_database("music"), Some(Path::new("other.db")));

        assert!(config.remove_database("music"));
        assert!(!config.remove_database("music"));
        assert_eq!(config.list_databases().len(), 1);
    }

    #[test]
    fn test_resolve_prefers_saved_name() {
        let mut config = Config::new();
        config.add_database("sakila", "/srv/sakila.db");

        assert_eq!(config.resolve("sakila"), PathBuf::from("/srv/sakila.db"));
        assert_eq!(config.resolve("./local.db"), PathBuf::from("./local.db"));
        assert_eq!(
            config.resolve_or(None, "sakila", "sakila.db"),
            PathBuf::from("/srv/sakila.db")
        );
        assert_eq!(
            config.resolve_or(None, "chinook", "chinook.db"),
            PathBuf::from("chinook.db")
        );
        assert_eq!(
            config.resolve_or(Some("x.db"), "sakila", "sakila.db"),
            PathBuf::from("x.db")
        );
    }

    #[test]
    fn test_environment_override() {
        let temp_dir = TempDir::new().unwrap();
        let path = config_path(&temp_dir);
        unsafe {
            std::env::set_var("DBBROWSE_DATABASES__ENVTEST", "/env/override.db");
        }

        let config = Config::load_from(&path).unwrap();
        unsafe {
            std::env::remove_var("DBBROWSE_DATABASES__ENVTEST");
        }
        assert_eq!(
            config.get_database("envtest"),
            Some(Path::new("/env/override.db"))
        );
    }

    #[test]
    fn test_saved_load_ignores_environment() {
        let temp_dir = TempDir::new().unwrap();
        let path = config_path(&temp_dir);
        unsafe {
            std::env::set_var("DBBROWSE_DATABASES__SAVEDONLY", "/env/ignored.db");
        }

        let config = Config::load_saved_from(&path).unwrap();
        unsafe {
            std::env::remove_var("DBBROWSE_DATABASES__SAVEDONLY");
        }
        assert!(config.get_database("savedonly").is_none());
    }
}
