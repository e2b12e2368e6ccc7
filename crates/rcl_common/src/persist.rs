//! Final configuration merge, write with backup, and closed-loop reload.
//!
//! The written file is never trusted: it is read back and put through the
//! schema checks plus a semantic pass against the detected topology.

use crate::error::{RclError, Result};
use crate::network::{check_ipv4_format, is_valid_fqdn, NetworkTopology};
use crate::schema::{self, ConfigValidator, Configuration, CONFIGURABLE_FIELDS};
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Values derived on this host during the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedValues {
    pub domain: String,
    pub utility_hostname: String,
    pub campus_ip: Ipv4Addr,
    pub image_version: String,
}

/// Outcome of reading back the written configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revalidation {
    pub config: Configuration,
    pub errors: u32,
}

impl Revalidation {
    pub fn passed(&self) -> bool {
        self.errors == 0
    }
}

pub struct ConfigPersister {
    path: PathBuf,
    backup_dir: PathBuf,
    stamp: String,
}

impl ConfigPersister {
    /// `stamp` names the backup and should match the run's log file
    pub fn new(path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>, stamp: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            backup_dir: backup_dir.into(),
            stamp: stamp.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Layer derived values and static constants over the configurable
    /// fields. Static values always win.
    pub fn merge(
        validated: &Configuration,
        derived: &DerivedValues,
        statics: &[(&str, &str)],
    ) -> Configuration {
        let mut merged: Configuration = validated
            .iter()
            .filter(|(key, _)| CONFIGURABLE_FIELDS.contains(key))
            .collect();

        merged.insert(schema::CONTAINER_DOMAIN_NAME, derived.domain.as_str());
        merged.insert(schema::UTILITY_HOSTNAME_KEY, derived.utility_hostname.as_str());
        merged.insert(schema::CAMPUS_INTERFACE_IP, derived.campus_ip.to_string());
        merged.insert(schema::IMAGE_VERSION, derived.image_version.as_str());

        for (key, value) in statics {
            merged.insert(*key, *value);
        }
        merged
    }

    pub fn backup_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string());
        self.backup_dir.join(format!("{}_{}", name, self.stamp))
    }

    /// Move the current file aside and write `cfg` in its place.
    ///
    /// `cfg` is serialized before anything on disk changes.
    ///
    /// Returns the backup path when a previous file existed.
    pub fn write(&self, cfg: &Configuration) -> Result<Option<PathBuf>> {
        let persist_err = |source: io::Error| RclError::Persist {
            path: self.path.clone(),
            source,
        };

        let text = cfg
            .to_yaml()
            .map_err(|e| persist_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let backup = if self.path.exists() {
            fs::create_dir_all(&self.backup_dir).map_err(persist_err)?;
            let backup = self.backup_path();
            debug!("Going to move {} as {}", self.path.display(), backup.display());
            fs::rename(&self.path, &backup).map_err(persist_err)?;
            debug!("Moved {} as {}", self.path.display(), backup.display());
            Some(backup)
        } else {
            None
        };

        debug!("Going to write information into YML file {}", self.path.display());
        fs::write(&self.path, text).map_err(|e| {
            error!("Cannot write information into YML file {}", self.path.display());
            persist_err(e)
        })?;
        debug!("YML file {} has successfully been written", self.path.display());
        Ok(backup)
    }

    /// Reload the written file and count every failed check
    pub fn reload_and_revalidate(&self, detected: &NetworkTopology) -> Result<Revalidation> {
        debug!("Going to reload with freshly created file");
        let validator = ConfigValidator::new(&self.path);
        let config = validator.load()?;

        let statics = validator.check_static(&config);
        let mut errors = statics.error_count;
        if !statics.ok {
            error!("Static keys did not pass the test. Did you manually edit the file?");
            return Ok(Revalidation { config, errors });
        }

        if !validator.check_configurable(&config) {
            warn!("The file {} does not have all the required entries", self.path.display());
            errors += 1;
            return Ok(Revalidation { config, errors });
        }

        // Both key sets are present past this point.
        let field = |key: &str| config.get(key).unwrap_or_default();
        let domain = field(schema::CONTAINER_DOMAIN_NAME);
        let container = field(schema::CONTAINER_HOSTNAME);
        let campus_ip = field(schema::CAMPUS_INTERFACE_IP);
        let ras_ip = field(schema::RAS_INTERFACE_IP);

        let mut tally = |ok: bool, what: String| {
            if ok {
                debug!("{} passes the check", what);
            } else {
                errors += 1;
                warn!("{} does not pass the check", what);
            }
        };

        tally(is_valid_fqdn("anyhost", domain), format!("The domain {}", domain));
        tally(
            is_valid_fqdn(container, domain),
            format!("The container FQDN {}.{}", container, domain),
        );
        tally(check_ipv4_format(campus_ip), format!("The CAMPUS IP {}", campus_ip));
        tally(
            campus_ip == detected.campus.to_string(),
            format!("The CAMPUS IP {} as detected on this system", campus_ip),
        );
        tally(check_ipv4_format(ras_ip), format!("The RAS IP {}", ras_ip));
        tally(
            ras_ip == detected.ras.to_string(),
            format!("The RAS IP {} as detected on this system", ras_ip),
        );

        if errors == 0 {
            info!("All configurable variables checked passed");
        } else {
            error!(
                "Not all entries on the file checks passed. Please review the ERROR message[s] above this one"
            );
        }
        Ok(Revalidation { config, errors })
    }
}
