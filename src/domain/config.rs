use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What to do with a persisted row that cannot become a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRows {
    /// Log the row, record it in the load report and keep loading.
    #[default]
    Skip,
    /// Fail the whole load at the first malformed row.
    Abort,
}

/// Configuration for a route ledger.
///
/// Lives in `.routes/config.toml` under the ledger root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The CSV file routes are persisted to, relative to the ledger root.
    data_file: PathBuf,

    /// How rows that fail to parse or validate are handled on load.
    pub malformed_rows: MalformedRows,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            malformed_rows: MalformedRows::default(),
        }
    }
}

impl Config {
    /// Directory under the ledger root holding the configuration.
    pub const DIR: &'static str = ".routes";

    /// Path of the configuration file for a ledger rooted at `root`.
    #[must_use]
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(Self::DIR).join("config.toml")
    }

    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// The data file, relative to the ledger root.
    #[must_use]
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Points the ledger at a different data file.
    pub fn set_data_file(&mut self, path: PathBuf) {
        self.data_file = path;
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("routes.csv")
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_data_file")]
        data_file: PathBuf,

        #[serde(default)]
        malformed_rows: MalformedRows,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                data_file,
                malformed_rows,
            } => Self {
                data_file,
                malformed_rows,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            data_file: config.data_file,
            malformed_rows: config.malformed_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\ndata_file = \"data/rutas.csv\"\nmalformed_rows = \"abort\"\n")
            .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.data_file(), Path::new("data/rutas.csv"));
        assert_eq!(config.malformed_rows, MalformedRows::Abort);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nmalformed_rows = \"sometimes\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        let mut config = Config::default();
        config.malformed_rows = MalformedRows::Abort;

        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
