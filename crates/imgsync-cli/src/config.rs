//! Configuration management for the imgsync CLI
//!
//! Layers, highest first: command-line flags and `IMGSYNC_*` environment
//! variables (both parsed by clap), the TOML config file, built-in defaults.

use crate::error::{CliError, Result};
use crate::SettingsArgs;
use imgsync_core::{
    config::RunMode,
    http::DEFAULT_HTTP_TIMEOUT_SECS,
    reference::{ReferenceFields, DEFAULT_PRIMARY_FIELD},
    storage::{config::DEFAULT_REGION, StorageConfig},
    KeyDeriver,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Suffix appended to the input file stem for the default output path.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_processed";

/// Contents of the TOML config file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub input_csv: Option<PathBuf>,
    pub output_csv: Option<PathBuf>,
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub path_style: Option<bool>,
    pub public_base_url: Option<String>,
    pub public_read: Option<bool>,
    pub key_prefix: Option<String>,
    pub reference_field: Option<String>,
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    pub dry_run: Option<bool>,
    pub test_mode: Option<bool>,
    pub test_rows: Option<usize>,
    pub debug_save: Option<bool>,
    pub debug_dir: Option<PathBuf>,
    pub http_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("cannot read config file '{}': {}", path.display(), e))
        })?;
        toml::from_str(&text).map_err(|e| {
            CliError::config(format!("invalid config file '{}': {}", path.display(), e))
        })
    }

    /// Load `path` if given, otherwise an empty layer
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map(Self::load).transpose().map(Option::unwrap_or_default)
    }
}

/// Fully resolved settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub input_csv: Option<PathBuf>,
    pub output_csv: Option<PathBuf>,
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub path_style: bool,
    pub public_base_url: Option<String>,
    pub public_read: bool,
    pub key_prefix: Option<String>,
    pub reference_field: String,
    pub http_timeout_secs: u64,
    pub mode: RunMode,
}

impl Settings {
    pub fn resolve(args: &SettingsArgs, file: FileConfig) -> Self {
        let defaults = RunMode::default();

        let input_csv = args.input.clone().or(file.input_csv);
        let output_csv = args
            .output
            .clone()
            .or(file.output_csv)
            .or_else(|| input_csv.as_deref().map(default_output_path));
        let endpoint = args.endpoint.clone().or(file.endpoint);

        let mode = RunMode {
            dry_run: args.dry_run().or(file.dry_run).unwrap_or(defaults.dry_run),
            test_mode: args.test_mode().or(file.test_mode).unwrap_or(defaults.test_mode),
            test_row_limit: args.test_rows.or(file.test_rows).unwrap_or(defaults.test_row_limit),
            target_width: args.target_width.or(file.target_width).unwrap_or(defaults.target_width),
            target_height: args
                .target_height
                .or(file.target_height)
                .unwrap_or(defaults.target_height),
            debug_save: args.debug_save().or(file.debug_save).unwrap_or(defaults.debug_save),
            debug_dir: args.debug_dir.clone().or(file.debug_dir).unwrap_or(defaults.debug_dir),
        };

        Self {
            input_csv,
            output_csv,
            bucket: args.bucket.clone().or(file.bucket).unwrap_or_default(),
            region: args
                .region
                .clone()
                .or(file.region)
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            path_style: file.path_style.unwrap_or(endpoint.is_some()),
            endpoint,
            public_base_url: args.public_base_url.clone().or(file.public_base_url),
            public_read: !args.no_public_acl && file.public_read.unwrap_or(true),
            key_prefix: args.key_prefix.clone().or(file.key_prefix),
            reference_field: args
                .reference_field
                .clone()
                .or(file.reference_field)
                .unwrap_or_else(|| DEFAULT_PRIMARY_FIELD.to_string()),
            http_timeout_secs: args
                .http_timeout_secs
                .or(file.http_timeout_secs)
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            mode,
        }
    }

    /// Everything a run needs; the only fatal check before rows are processed
    pub fn validate(&self) -> Result<()> {
        let mut problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else if problems.len() == 1 {
            Err(CliError::config(problems.remove(0)))
        } else {
            Err(CliError::config(problems.join("; ")))
        }
    }

    /// Human-readable list of what `validate` would reject
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        match &self.input_csv {
            None => problems.push("input CSV is required (--input or IMGSYNC_INPUT_CSV)".to_string()),
            Some(path) if path.as_os_str().is_empty() => {
                problems.push("input CSV path must not be empty".to_string())
            },
            Some(_) => {},
        }
        if self
            .output_csv
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            problems.push("output CSV path must not be empty".to_string());
        }
        if let (Some(input), Some(output)) = (&self.input_csv, &self.output_csv) {
            if same_file(input, output) {
                problems.push("output CSV must differ from the input CSV".to_string());
            }
        }
        if self.bucket.trim().is_empty() {
            problems.push("bucket name is required (--bucket or IMGSYNC_BUCKET)".to_string());
        }
        if self.reference_field.trim().is_empty() {
            problems.push("reference field must not be empty".to_string());
        }
        if self.http_timeout_secs == 0 {
            problems.push("HTTP timeout must be positive".to_string());
        }
        if let Err(e) = self.mode.validate() {
            problems.push(e.to_string());
        }

        problems
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            path_style: self.path_style,
            access_key: None,
            secret_key: None,
            public_base_url: self.public_base_url.clone(),
            public_read: self.public_read,
        }
        .with_env_credentials()
    }

    pub fn key_deriver(&self) -> KeyDeriver {
        KeyDeriver::new(self.key_prefix.as_deref())
    }

    pub fn reference_fields(&self) -> ReferenceFields {
        ReferenceFields::with_primary(self.reference_field.clone())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("cannot render configuration: {}", e)))
    }
}

/// `dir/products.csv` -> `dir/products_processed.csv`
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}{}.csv", stem, DEFAULT_OUTPUT_SUFFIX))
}

/// Whether two paths name the same file, however they are spelled
fn same_file(a: &Path, b: &Path) -> bool {
    a == b || matches!((resolve(a), resolve(b)), (Some(a), Some(b)) if a == b)
}

/// Absolute form with symlinks resolved as far as the file system allows
fn resolve(path: &Path) -> Option<PathBuf> {
    if let Ok(real) = path.canonicalize() {
        return Some(real);
    }
    let absolute = std::path::absolute(path).ok()?;
    let (parent, name) = (absolute.parent()?, absolute.file_name()?);
    Some(
        parent
            .canonicalize()
            .unwrap_or_else(|_| parent.to_path_buf())
            .join(name),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn args() -> SettingsArgs {
        SettingsArgs {
            input: Some(PathBuf::from("data/products.csv")),
            bucket: Some("shop-images".to_string()),
            ..SettingsArgs::default()
        }
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(&args(), FileConfig::default());

        assert_eq!(settings.region, "ap-south-1");
        assert_eq!(settings.reference_field, "WOO IMAGE");
        assert_eq!(settings.http_timeout_secs, 10);
        assert_eq!(settings.output_csv, Some(PathBuf::from("data/products_processed.csv")));
        assert!(settings.mode.dry_run);
        assert!(!settings.mode.test_mode);
        assert!(settings.public_read);
        assert!(!settings.path_style);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig {
            bucket: Some("from-file".to_string()),
            region: Some("eu-west-1".to_string()),
            dry_run: Some(true),
            target_width: Some(800),
            ..FileConfig::default()
        };
        let args = SettingsArgs {
            no_dry_run: true,
            ..args()
        };

        let settings = Settings::resolve(&args, file);

        assert_eq!(settings.bucket, "shop-images");
        assert_eq!(settings.region, "eu-west-1");
        assert!(!settings.mode.dry_run);
        assert_eq!(settings.mode.target_width, 800);
        assert_eq!(settings.mode.target_height, 800);
    }

    #[test]
    fn test_endpoint_implies_path_style() {
        let args = SettingsArgs {
            endpoint: Some("http://localhost:9000".to_string()),
            ..args()
        };
        let settings = Settings::resolve(&args, FileConfig::default());
        assert!(settings.path_style);
        assert_eq!(settings.storage_config().public_base(), "http://localhost:9000/shop-images");
    }

    #[test]
    #[serial]
    fn test_storage_credentials_from_env() {
        std::env::set_var("AWS_ACCESS_KEY_ID", "cli_key");
        std::env::set_var("AWS_SECRET_ACCESS_KEY", "cli_secret");
        let storage = Settings::resolve(&args(), FileConfig::default()).storage_config();
        std::env::remove_var("AWS_ACCESS_KEY_ID");
        std::env::remove_var("AWS_SECRET_ACCESS_KEY");

        assert_eq!(storage.access_key.as_deref(), Some("cli_key"));
        assert_eq!(storage.secret_key.as_deref(), Some("cli_secret"));
        assert_eq!(storage.bucket, "shop-images");
        assert!(storage.validate().is_ok());
    }

    #[test]
    fn test_validation_collects_problems() {
        let settings = Settings::resolve(&SettingsArgs::default(), FileConfig::default());
        let problems = settings.problems();

        assert!(problems.iter().any(|p| p.contains("input CSV is required")));
        assert!(problems.iter().any(|p| p.contains("bucket name is required")));

        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("bucket name is required"));
    }

    #[test]
    fn test_output_spelled_differently_from_input_rejected() {
        let args = SettingsArgs {
            input: Some(PathBuf::from("products.csv")),
            output: Some(PathBuf::from("./products.csv")),
            ..args()
        };
        let problems = Settings::resolve(&args, FileConfig::default()).problems();
        assert!(problems.iter().any(|p| p.contains("must differ from the input")));

        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.csv"), "url\n").unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        let args = SettingsArgs {
            input: Some(temp.path().join("a.csv")),
            output: Some(temp.path().join("sub/../a.csv")),
            ..self::args()
        };
        let problems = Settings::resolve(&args, FileConfig::default()).problems();
        assert!(problems.iter().any(|p| p.contains("must differ from the input")));

        let args = SettingsArgs {
            input: Some(temp.path().join("a.csv")),
            output: Some(temp.path().join("b.csv")),
            ..self::args()
        };
        assert!(Settings::resolve(&args, FileConfig::default()).validate().is_ok());
    }

    #[test]
    fn test_zero_test_rows_rejected_in_test_mode() {
        let args = SettingsArgs {
            test_mode: Some(true),
            test_rows: Some(0),
            ..args()
        };
        assert!(Settings::resolve(&args, FileConfig::default()).validate().is_err());
    }

    #[test]
    fn test_load_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("imgsync.toml");
        std::fs::write(
            &path,
            r#"
bucket = "shop-images"
region = "ap-south-1"
key_prefix = "products"
test_mode = true
test_rows = 3
"#,
        )
        .unwrap();

        let file = FileConfig::load(&path).unwrap();
        assert_eq!(file.bucket.as_deref(), Some("shop-images"));
        assert_eq!(file.test_rows, Some(3));

        let settings = Settings::resolve(&SettingsArgs::default(), file);
        assert_eq!(settings.mode.row_limit(), Some(3));
        assert_eq!(settings.key_deriver().prefix().as_deref(), Some("products"));
    }

    #[test]
    fn test_unknown_file_keys_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("imgsync.toml");
        std::fs::write(&path, "bukcet = \"typo\"\n").unwrap();

        let err = FileConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid config file"));
    }

    #[test]
    fn test_missing_optional_file_is_empty() {
        assert_eq!(FileConfig::load_optional(None).unwrap(), FileConfig::default());
    }

    #[test]
    fn test_renders_as_toml() {
        let rendered = Settings::resolve(&args(), FileConfig::default()).to_toml().unwrap();
        assert!(rendered.contains("bucket = \"shop-images\""));
        assert!(rendered.contains("[mode]"));
    }
}
