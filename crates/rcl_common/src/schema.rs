//! Configuration schema and validator.
//!
//! The persisted configuration is a YAML mapping under a single `CONTAINER`
//! key. Static fields ship with the tool and must match exactly; configurable
//! fields are site specific and only need to be present here.

use crate::error::{RclError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Top-level key of the persisted document
pub const TOP_LEVEL_KEY: &str = "CONTAINER";

/// Host name the container is created with
pub const CONTAINER_NAME: &str = "utilityBareMetal-rcl-official";

/// Fields whose values are fixed by the tool
pub const STATIC_FIELDS: &[(&str, &str)] = &[
    ("CONTAINER_HOSTNAME", CONTAINER_NAME),
    ("CAMPUS_INTERFACE", "campus"),
    ("RAS_INTERFACE", "virbr1"),
    ("RAS_INTERFACE_IP", "10.23.16.1"),
    ("IMAGE_NAME", "cp.icr.io/cp/scalesystem/sss_rcl"),
    ("SSH_PORT", "10022"),
    ("LOG", "/home/rcladmin/log"),
    ("BKUP", "/home/rcladmin/backup"),
];

/// Fields that must be present but whose values are site specific
pub const CONFIGURABLE_FIELDS: &[&str] = &[
    "CONTAINER_DOMAIN_NAME",
    "UTILITY_HOSTNAME",
    "CAMPUS_INTERFACE_IP",
    "IMAGE_VERSION",
];

pub const SUPPORTED_IMAGE_VERSION: &str = "6.2.3.0";

/// Management names are derived from this fixed utility host name
pub const UTILITY_HOSTNAME: &str = "utilityBareMetal";

pub const CONTAINER_HOSTNAME: &str = "CONTAINER_HOSTNAME";
pub const CAMPUS_INTERFACE: &str = "CAMPUS_INTERFACE";
pub const RAS_INTERFACE: &str = "RAS_INTERFACE";
pub const RAS_INTERFACE_IP: &str = "RAS_INTERFACE_IP";
pub const CONTAINER_DOMAIN_NAME: &str = "CONTAINER_DOMAIN_NAME";
pub const UTILITY_HOSTNAME_KEY: &str = "UTILITY_HOSTNAME";
pub const CAMPUS_INTERFACE_IP: &str = "CAMPUS_INTERFACE_IP";
pub const IMAGE_VERSION: &str = "IMAGE_VERSION";

/// Look up the shipped value of a static field
pub fn static_value(key: &str) -> Option<&'static str> {
    STATIC_FIELDS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// Field name to string value mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Configuration {
    fields: BTreeMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a persisted document.
    ///
    /// Scalars are kept in their string form so `SSH_PORT: 10022` and
    /// `SSH_PORT: "10022"` compare equal.
    pub fn from_yaml(text: &str) -> std::result::Result<Self, String> {
        let doc: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
        let container = doc
            .get(TOP_LEVEL_KEY)
            .ok_or_else(|| format!("missing top-level {} key", TOP_LEVEL_KEY))?;
        let mapping = container
            .as_mapping()
            .ok_or_else(|| format!("{} is not a mapping", TOP_LEVEL_KEY))?;

        let mut cfg = Configuration::new();
        for (key, value) in mapping {
            let key = scalar_to_string(key).ok_or_else(|| "non-scalar key".to_string())?;
            cfg.insert(key, value_to_string(value));
        }
        Ok(cfg)
    }

    /// Serialize as a persisted document
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        let mut doc = BTreeMap::new();
        doc.insert(TOP_LEVEL_KEY, self);
        serde_yaml::to_string(&doc)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut cfg = Configuration::new();
        for (k, v) in iter {
            cfg.insert(k, v);
        }
        cfg
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Any value counts as present. A blank value reads as an empty string and
/// nested values keep their flow text, so neither can equal a static value.
fn value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        other => scalar_to_string(other).unwrap_or_else(|| {
            serde_yaml::to_string(other)
                .map(|text| text.trim_end().to_string())
                .unwrap_or_default()
        }),
    }
}

/// Outcome of the static field check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaCheck {
    pub ok: bool,
    pub error_count: u32,
}

/// Loads the persisted configuration and enforces the schema
pub struct ConfigValidator {
    path: PathBuf,
}

impl ConfigValidator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Configuration> {
        debug!("Going to check if YML file {} exists", self.path.display());
        if !self.path.is_file() {
            error!("Completed check for {} and does not exist", self.path.display());
            return Err(RclError::ConfigNotFound(self.path.clone()));
        }

        debug!("Starting YML load of {}", self.path.display());
        let text = fs::read_to_string(&self.path)?;
        let cfg = Configuration::from_yaml(&text).map_err(|reason| {
            error!("Failed to load as YML from {}: {}", self.path.display(), reason);
            RclError::ConfigParse {
                path: self.path.clone(),
                reason,
            }
        })?;
        debug!("Successful load as YML from {}", self.path.display());
        Ok(cfg)
    }

    /// Check every static field.
    ///
    /// A missing key stops the scan; value mismatches are all reported.
    pub fn check_static(&self, cfg: &Configuration) -> SchemaCheck {
        debug!(
            "Going to check if static keys exist on {} and values are the expected ones",
            self.path.display()
        );
        let mut error_count = 0;
        for (key, expected) in STATIC_FIELDS {
            match cfg.get(key) {
                None => {
                    error_count += 1;
                    error!(
                        "Key {} does not exist on {}. We stop the checks here",
                        key,
                        self.path.display()
                    );
                    break;
                }
                Some(value) if value != *expected => {
                    error_count += 1;
                    error!(
                        "Key {} exists on {} but value {} is not the expected one of {}",
                        key,
                        self.path.display(),
                        value,
                        expected
                    );
                }
                Some(value) => {
                    debug!("Key {} has the expected value {}", key, value);
                }
            }
        }

        if error_count > 0 {
            error!(
                "Static keys on {} are missing or do not have the expected values",
                self.path.display()
            );
        }
        SchemaCheck {
            ok: error_count == 0,
            error_count,
        }
    }

    /// Every configurable key must be present; values are not checked here
    pub fn check_configurable(&self, cfg: &Configuration) -> bool {
        debug!(
            "Going to check if configurable keys exist on {}",
            self.path.display()
        );
        let mut ok = true;
        for key in CONFIGURABLE_FIELDS {
            if cfg.contains(key) {
                debug!("Key {} exists on {}", key, self.path.display());
            } else {
                ok = false;
                error!("Key {} does not exist on {}", key, self.path.display());
            }
        }
        ok
    }

    /// Load and run both schema checks, failing on either
    pub fn validate(&self) -> Result<Configuration> {
        let cfg = self.load()?;
        let statics = self.check_static(&cfg);
        let configurable = self.check_configurable(&cfg);
        if !statics.ok || !configurable {
            let err = RclError::Schema(self.path.clone());
            error!("{}", err);
            return Err(err);
        }
        debug!("The file {} has all the required entries", self.path.display());
        Ok(cfg)
    }
}

/// Reject image versions this release cannot install
pub fn check_image_version(version: &str) -> Result<()> {
    if version == SUPPORTED_IMAGE_VERSION {
        Ok(())
    } else {
        Err(RclError::UnsupportedImageVersion {
            given: version.to_string(),
            expected: SUPPORTED_IMAGE_VERSION.to_string(),
        })
    }
}
