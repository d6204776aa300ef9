//! Sweep configuration loading and resolution.
//!
//! Sweep parameters and input paths can come from a config file as well as
//! CLI flags. Resolution order for the file (highest to lowest priority):
//! 1. Explicit `--config` path
//! 2. `HT_CONFIG` environment variable
//! 3. XDG config home (`~/.config/hypotest/sweep.toml`), if present
//! 4. No file: CLI flags only
//!
//! CLI flags then override file values field by field.

use std::path::{Path, PathBuf};

use ht_common::Error;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::sweep::SweepParams;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "HT_CONFIG";

/// Default XDG config directory name.
const CONFIG_DIR_NAME: &str = "hypotest";

/// Default config file name inside the config directory.
const CONFIG_FILE_NAME: &str = "sweep.toml";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid TOML in config file {path}: {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported config file extension for {path} (expected .toml or .json)")]
    UnsupportedExtension { path: PathBuf },
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Sweep settings as written in a config file or collected from CLI flags.
///
/// Every field is optional so partial sources can be layered with
/// [`SweepConfig::merge`]. Integers stay signed until [`SweepConfig::resolve`]
/// so that negative values are reported as invalid instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpe: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h0: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h1: Option<PathBuf>,
}

/// Fully validated sweep inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSweep {
    pub params: SweepParams,
    pub h0: PathBuf,
    pub h1: PathBuf,
}

impl SweepConfig {
    /// Layer `overrides` on top of `self`; set fields in `overrides` win.
    pub fn merge(self, overrides: SweepConfig) -> SweepConfig {
        SweepConfig {
            n_exp: overrides.n_exp.or(self.n_exp),
            mpe: overrides.mpe.or(self.mpe),
            step: overrides.step.or(self.step),
            jobs: overrides.jobs.or(self.jobs),
            h0: overrides.h0.or(self.h0),
            h1: overrides.h1.or(self.h1),
        }
    }

    /// Validate into sweep parameters. `step` and `jobs` default to 1.
    pub fn resolve(&self) -> ht_common::Result<ResolvedSweep> {
        let n_exp = positive("n_exp", required("n_exp", "--n-exp", self.n_exp)?)?;
        let mpe = positive("mpe", required("mpe", "--mpe", self.mpe)?)?;
        let step = positive("step", self.step.unwrap_or(1))?;
        let jobs = positive("jobs", self.jobs.unwrap_or(1))?;
        let h0 = required("h0", "--h0", self.h0.clone())?;
        let h1 = required("h1", "--h1", self.h1.clone())?;

        let params = SweepParams::new(n_exp, mpe, step)?.with_jobs(jobs)?;
        Ok(ResolvedSweep { params, h0, h1 })
    }

    /// Resolve relative input paths against `base` (the config file's directory).
    fn rebase_paths(mut self, base: &Path) -> Self {
        for path in [&mut self.h0, &mut self.h1].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

fn required<T>(name: &str, flag: &str, value: Option<T>) -> ht_common::Result<T> {
    value.ok_or_else(|| {
        Error::invalid_parameter(
            name,
            "<unset>",
            format!("required; pass {} or set {} in the config file", flag, name),
        )
    })
}

fn positive(name: &str, value: i64) -> ht_common::Result<usize> {
    if value <= 0 {
        return Err(Error::invalid_parameter(
            name,
            value,
            "must be a positive integer",
        ));
    }
    usize::try_from(value).map_err(|_| Error::invalid_parameter(name, value, "too large"))
}

/// A config file as loaded from disk, with provenance.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: SweepConfig,
    /// Path of the file used (None when no file was found).
    pub path: Option<PathBuf>,
    /// SHA-256 of the file content (None when no file was found).
    pub sha256: Option<String>,
}

/// Find and load the sweep config file using the standard resolution order.
pub fn load_sweep_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let path = resolve_config_path(explicit, |key| std::env::var(key).ok())?;
    match path {
        Some(path) => {
            let (config, hash) = load_config_file(&path)?;
            Ok(LoadedConfig {
                config,
                path: Some(path),
                sha256: Some(hash),
            })
        }
        None => Ok(LoadedConfig::default()),
    }
}

/// Resolve which config file to use, if any.
///
/// Explicit and environment paths must exist; the XDG default is optional.
pub fn resolve_config_path<F>(
    explicit: Option<&Path>,
    lookup: F,
) -> Result<Option<PathBuf>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // 1. Explicit option
    if let Some(path) = explicit {
        return existing(path.to_path_buf()).map(Some);
    }

    // 2. Environment variable
    if let Some(path) = lookup(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return existing(PathBuf::from(path)).map(Some);
    }

    // 3. XDG config home
    let xdg_config = lookup("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")));
    let default_path = xdg_config.map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    Ok(default_path.filter(|path| path.is_file()))
}

fn existing(path: PathBuf) -> Result<PathBuf, ConfigError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ConfigError::NotFound { path })
    }
}

/// Load a config file, choosing TOML or JSON by extension.
///
/// Returns the parsed config (relative input paths resolved against the
/// file's directory) and the SHA-256 of its content.
pub fn load_config_file(path: &Path) -> Result<(SweepConfig, String), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let hash = hex::encode(Sha256::digest(content.as_bytes()));

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    let config: SweepConfig = match extension.as_deref() {
        Some("toml") => toml::from_str(&content).map_err(|e| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source: e,
        })?,
        Some("json") => serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
            path: path.to_path_buf(),
            source: e,
        })?,
        _ => {
            return Err(ConfigError::UnsupportedExtension {
                path: path.to_path_buf(),
            })
        }
    };

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok((config.rebase_paths(base), hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn merge_prefers_overrides() {
        let file = SweepConfig {
            n_exp: Some(100),
            mpe: Some(50),
            step: Some(5),
            h0: Some(PathBuf::from("a.txt")),
            ..Default::default()
        };
        let cli = SweepConfig {
            mpe: Some(20),
            h0: Some(PathBuf::from("b.txt")),
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.n_exp, Some(100));
        assert_eq!(merged.mpe, Some(20));
        assert_eq!(merged.step, Some(5));
        assert_eq!(merged.h0, Some(PathBuf::from("b.txt")));
        assert_eq!(merged.jobs, None);
    }

    #[test]
    fn resolve_applies_defaults_and_validates() {
        let config = SweepConfig {
            n_exp: Some(10),
            mpe: Some(8),
            h0: Some(PathBuf::from("h0.txt")),
            h1: Some(PathBuf::from("h1.txt")),
            ..Default::default()
        };
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.params.step, 1);
        assert_eq!(resolved.params.jobs, 1);
        assert_eq!(resolved.params.required_measurements().unwrap(), 80);

        let bad = SweepConfig {
            step: Some(-1),
            ..config.clone()
        };
        match bad.resolve() {
            Err(Error::InvalidParameter { name, value, .. }) => {
                assert_eq!(name, "step");
                assert_eq!(value, "-1");
            }
            other => panic!("expected InvalidParameter, got {:?}", other),
        }

        let missing = SweepConfig {
            h1: None,
            ..config
        };
        assert!(matches!(
            missing.resolve(),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn loads_toml_and_rebases_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.toml");
        fs::write(
            &path,
            "n_exp = 200\nmpe = 40\nstep = 4\nh0 = \"data/h0.txt\"\nh1 = \"/abs/h1.txt\"\n",
        )
        .unwrap();

        let (config, hash) = load_config_file(&path).unwrap();
        assert_eq!(config.n_exp, Some(200));
        assert_eq!(config.step, Some(4));
        assert_eq!(config.h0, Some(dir.path().join("data/h0.txt")));
        assert_eq!(config.h1, Some(PathBuf::from("/abs/h1.txt")));
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn loads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.json");
        fs::write(&path, r#"{"n_exp": 5, "mpe": 3, "jobs": 2}"#).unwrap();
        let (config, _) = load_config_file(&path).unwrap();
        assert_eq!(config.jobs, Some(2));
        assert_eq!(config.h0, None);
    }

    #[test]
    fn rejects_unknown_fields_and_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("bad.toml");
        fs::write(&toml_path, "nexp = 5\n").unwrap();
        assert!(matches!(
            load_config_file(&toml_path),
            Err(ConfigError::ParseToml { .. })
        ));

        let yaml_path = dir.path().join("sweep.yaml");
        fs::write(&yaml_path, "n_exp: 5\n").unwrap();
        let err = load_config_file(&yaml_path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedExtension { .. }));
        assert_eq!(Error::from(err).code(), 11);
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            resolve_config_path(Some(&missing), no_env),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn env_path_used_when_no_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.toml");
        fs::write(&path, "mpe = 3\n").unwrap();
        let env_value = path.display().to_string();
        let resolved = resolve_config_path(None, |key| {
            (key == CONFIG_ENV).then(|| env_value.clone())
        })
        .unwrap();
        assert_eq!(resolved, Some(path));
    }

    #[test]
    fn xdg_default_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().display().to_string();
        let lookup = |key: &str| (key == "XDG_CONFIG_HOME").then(|| home.clone());

        assert_eq!(resolve_config_path(None, lookup).unwrap(), None);

        let config_dir = dir.path().join(CONFIG_DIR_NAME);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(CONFIG_FILE_NAME), "n_exp = 1\n").unwrap();
        assert_eq!(
            resolve_config_path(None, lookup).unwrap(),
            Some(config_dir.join(CONFIG_FILE_NAME))
        );
    }
}
