//! Layered configuration.
//!
//! Uses Figment to merge built-in defaults, `corpus-search.toml` (or the file
//! given with `--config`) and `CORPUS_SEARCH_*` environment variables, in that
//! order of precedence. Nested keys in the environment are split on `__`,
//! e.g. `CORPUS_SEARCH_GAZETTEER__USERNAME`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "corpus-search.toml";
pub const ENV_PREFIX: &str = "CORPUS_SEARCH_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub artifact: ArtifactConfig,
    pub search: SearchConfig,
    pub gazetteer: GazetteerConfig,
    /// Entity strings that are never sent to the gazetteer.
    pub exclusions: Exclusions,
    pub map: MapConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: PathBuf,
    pub text_column: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("corpus.jsonl"),
            text_column: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub path: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("serialized_data/spacy_model_output"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub entries: usize,
    pub context_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            entries: 5,
            context_size: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GazetteerConfig {
    pub endpoint: String,
    pub username: String,
    pub continent_code: String,
    pub max_rows: usize,
    /// No timeout unless set: a hung lookup blocks the session.
    pub timeout_secs: Option<u64>,
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://api.geonames.org/search".to_string(),
            username: "demo".to_string(),
            continent_code: "EU".to_string(),
            max_rows: 10,
            timeout_secs: None,
        }
    }
}

/// Known non-place tokens: character names and recognizer noise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Exclusions(Vec<String>);

impl Exclusions {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn to_set(&self) -> HashSet<String> {
        self.0.iter().cloned().collect()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl Default for Exclusions {
    fn default() -> Self {
        Self::new([
            "Athos",
            "Porthos",
            "Aramis",
            "Grimaud",
            "Felton",
            "Louise",
            "Montalais",
            "Mazarin",
            "one",
            "four",
            "first",
            "Roman",
            "Le roi",
        ])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// GeoJSON FeatureCollection with country boundaries.
    pub boundaries: PathBuf,
    pub regions: Vec<String>,
    /// Feature property holding the region identifier.
    pub region_property: String,
    pub output_dir: PathBuf,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            boundaries: PathBuf::from("europe.geojson"),
            regions: ["FR", "ES", "GB", "BE", "NL", "IE", "PT", "AD", "CH"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            region_property: "id".to_string(),
            output_dir: PathBuf::from("maps"),
        }
    }
}

impl Config {
    /// Load defaults + config file + environment.
    ///
    /// An explicitly given file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let figment = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(Error::Config(format!(
                        "config file not found: {}",
                        p.display()
                    )));
                }
                Self::figment(p)
            }
            None => Self::figment(Path::new(DEFAULT_CONFIG_FILE)),
        };

        let config: Config = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.entries == 0 {
            return Err(Error::Config("search.entries must be at least 1".into()));
        }
        if self.gazetteer.max_rows == 0 {
            return Err(Error::Config("gazetteer.max_rows must be at least 1".into()));
        }
        if self.gazetteer.endpoint.trim().is_empty() {
            return Err(Error::Config("gazetteer.endpoint is empty".into()));
        }
        if self.corpus.text_column.trim().is_empty() {
            return Err(Error::Config("corpus.text_column is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.entries, 5);
        assert_eq!(config.search.context_size, 2);
        assert_eq!(config.map.regions.len(), 9);
        assert!(config.exclusions.to_set().contains("Le roi"));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        // Inside a jail so environment set by other tests cannot leak in.
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
exclusions = ["Dantes"]

[search]
entries = 3

[gazetteer]
username = "researcher"
continent_code = "AS"
"#,
            )?;

            let config = Config::load(Some(Path::new("custom.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.search.entries, 3);
            assert_eq!(config.search.context_size, 2);
            assert_eq!(config.gazetteer.username, "researcher");
            assert_eq!(config.gazetteer.continent_code, "AS");
            assert_eq!(config.exclusions.names(), ["Dantes".to_string()]);
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
[search]
entries = 3
context_size = 4

[gazetteer]
username = "from-file"
"#,
            )?;
            jail.set_env("CORPUS_SEARCH_GAZETTEER__USERNAME", "from-env");
            jail.set_env("CORPUS_SEARCH_SEARCH__ENTRIES", "9");

            let config =
                Config::load(Some(Path::new(DEFAULT_CONFIG_FILE))).map_err(|e| e.to_string())?;
            assert_eq!(config.gazetteer.username, "from-env");
            assert_eq!(config.search.entries, 9);
            assert_eq!(config.search.context_size, 4);

            // The default file is picked up from the working directory.
            let config = Config::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.gazetteer.username, "from-env");
            assert_eq!(config.search.context_size, 4);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/corpus-search.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_entries_rejected() {
        let mut config = Config::default();
        config.search.entries = 0;
        assert!(config.validate().is_err());
    }
}
