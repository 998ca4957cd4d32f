use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Config, SummaryParams};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub neural: Option<NeuralConfig>,
    pub summary: Option<SummaryConfig>,
    pub pdf: Option<PdfConfig>,
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeuralConfig {
    pub inference_url: Option<String>,
    pub model: Option<String>,
    pub api_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub wait_for_model: Option<bool>,
    pub max_input_chars: Option<usize>,
    pub min_length: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub max_length: Option<usize>,
    pub ratio: Option<f64>,
    pub language: Option<String>,
    pub additional_stopwords: Option<Vec<String>>,
    pub unwrap_lines: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfConfig {
    pub footer_exclusion: Option<f32>,
    pub header_exclusion: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub max_upload_mb: Option<usize>,
    pub session_ttl_secs: Option<u64>,
}

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Platform config directory path: `<config_dir>/novelsum/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("novelsum").join("config.toml"))
}

/// Load config by cascading CWD `.novelsum.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".novelsum.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            Some(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Field-wise `overlay.or(base)` for one section.
fn pick<S, T>(overlay: &Option<S>, base: &Option<S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bn, on) = (&base.neural, &overlay.neural);
    let (bs, os) = (&base.summary, &overlay.summary);
    let (bp, op) = (&base.pdf, &overlay.pdf);
    let (bv, ov) = (&base.server, &overlay.server);

    ConfigFile {
        neural: Some(NeuralConfig {
            inference_url: pick(on, bn, |n| n.inference_url.clone()),
            model: pick(on, bn, |n| n.model.clone()),
            api_token: pick(on, bn, |n| n.api_token.clone()),
            request_timeout_secs: pick(on, bn, |n| n.request_timeout_secs),
            wait_for_model: pick(on, bn, |n| n.wait_for_model),
            max_input_chars: pick(on, bn, |n| n.max_input_chars),
            min_length: pick(on, bn, |n| n.min_length),
        }),
        summary: Some(SummaryConfig {
            max_length: pick(os, bs, |s| s.max_length),
            ratio: pick(os, bs, |s| s.ratio),
            language: pick(os, bs, |s| s.language.clone()),
            additional_stopwords: pick(os, bs, |s| s.additional_stopwords.clone()),
            unwrap_lines: pick(os, bs, |s| s.unwrap_lines),
        }),
        pdf: Some(PdfConfig {
            footer_exclusion: pick(op, bp, |p| p.footer_exclusion),
            header_exclusion: pick(op, bp, |p| p.header_exclusion),
        }),
        server: Some(ServerConfig {
            bind: pick(ov, bv, |s| s.bind.clone()),
            max_upload_mb: pick(ov, bv, |s| s.max_upload_mb),
            session_ttl_secs: pick(ov, bv, |s| s.session_ttl_secs),
        }),
    }
}

/// Fill a [`Config`] from file values, falling back to defaults.
///
/// Environment and command-line overrides are applied by the caller.
pub fn resolve(file: &ConfigFile) -> Config {
    let mut config = Config::default();

    if let Some(n) = &file.neural {
        if let Some(v) = &n.inference_url {
            config.inference_url = v.clone();
        }
        if let Some(v) = &n.model {
            config.model = v.clone();
        }
        config.api_token = n.api_token.clone().filter(|t| !t.is_empty());
        if let Some(v) = n.request_timeout_secs {
            config.request_timeout_secs = v;
        }
        if let Some(v) = n.wait_for_model {
            config.wait_for_model = v;
        }
        if let Some(v) = n.max_input_chars.filter(|&v| v > 0) {
            config.max_input_chars = v;
        }
        if let Some(v) = n.min_length {
            config.min_length = v;
        }
    }

    if let Some(s) = &file.summary {
        let defaults = SummaryParams::default();
        let max_length = s.max_length.unwrap_or(defaults.max_length);
        let ratio = s.ratio.unwrap_or(defaults.ratio);
        match SummaryParams::new(max_length, ratio) {
            Ok(params) => config.default_params = params,
            Err(e) => tracing::warn!(error = %e, "ignoring configured summary defaults"),
        }
        if let Some(v) = &s.language {
            config.language = v.clone();
        }
        if let Some(v) = &s.additional_stopwords {
            config.additional_stopwords = v.clone();
        }
        if let Some(v) = s.unwrap_lines {
            config.unwrap_lines = v;
        }
    }

    if let Some(p) = &file.pdf {
        config.footer_exclusion = p.footer_exclusion;
        config.header_exclusion = p.header_exclusion;
    }

    if let Some(v) = &file.server {
        if let Some(bind) = &v.bind {
            config.bind = bind.clone();
        }
        if let Some(mb) = v.max_upload_mb {
            config.max_upload_mb = mb;
        }
        if let Some(ttl) = v.session_ttl_secs {
            config.session_ttl_secs = ttl;
        }
    }

    config
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, ConfigFileError> {
    let path = config_path().ok_or(ConfigFileError::NoConfigDir)?;
    save_to_path(config, &path)?;
    Ok(path)
}

pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), ConfigFileError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_parses() {
        let toml_str = "[neural]\nmodel = \"sshleifer/distilbart-cnn-12-6\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let neural = parsed.neural.unwrap();
        assert_eq!(neural.model.unwrap(), "sshleifer/distilbart-cnn-12-6");
        assert!(neural.api_token.is_none());
        assert!(parsed.server.is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            server: Some(ServerConfig {
                bind: Some("0.0.0.0:5001".to_string()),
                max_upload_mb: Some(50),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            server: Some(ServerConfig {
                bind: Some("127.0.0.1:8080".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).server.unwrap();
        assert_eq!(merged.bind.unwrap(), "127.0.0.1:8080");
        assert_eq!(merged.max_upload_mb, Some(50));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            summary: Some(SummaryConfig {
                ratio: Some(0.3),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.summary.unwrap().ratio, Some(0.3));
    }

    #[test]
    fn resolve_empty_is_default() {
        let config = resolve(&ConfigFile::default());
        assert_eq!(config.model, crate::neural::hf::DEFAULT_MODEL);
        assert_eq!(config.max_input_chars, 1024);
        assert_eq!(config.bind, "0.0.0.0:5001");
        assert_eq!(config.default_params, SummaryParams::default());
        assert!(config.footer_exclusion.is_none());
    }

    #[test]
    fn resolve_applies_sections() {
        let toml_str = r#"
[neural]
api_token = "hf_x"
max_input_chars = 4096

[summary]
max_length = 200
ratio = 0.35
additional_stopwords = ["chapter"]

[pdf]
footer_exclusion = 0.05

[server]
session_ttl_secs = 60
"#;
        let file: ConfigFile = toml::from_str(toml_str).unwrap();
        let config = resolve(&file);
        assert_eq!(config.api_token.as_deref(), Some("hf_x"));
        assert_eq!(config.max_input_chars, 4096);
        assert_eq!(config.default_params.max_length, 200);
        assert!((config.default_params.ratio - 0.35).abs() < 1e-12);
        assert_eq!(config.additional_stopwords, vec!["chapter".to_string()]);
        assert_eq!(config.footer_exclusion, Some(0.05));
        assert_eq!(config.session_ttl_secs, 60);
    }

    #[test]
    fn resolve_rejects_out_of_range_defaults() {
        let file = ConfigFile {
            summary: Some(SummaryConfig {
                max_length: Some(1000),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(resolve(&file).default_params, SummaryParams::default());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ConfigFile {
            neural: Some(NeuralConfig {
                model: Some("google/pegasus-xsum".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        save_to_path(&config, &path).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(loaded.neural.unwrap().model.unwrap(), "google/pegasus-xsum");
    }

    #[test]
    fn unparseable_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert!(load_from_path(&path).is_none());
    }
}
