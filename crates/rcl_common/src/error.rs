//! Error taxonomy for the bring-up pipeline.
//!
//! Every fatal condition is one variant; `exit_code()` is the operational
//! contract with automation.

use crate::exit_codes::*;
use crate::network::Role;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RclError {
    #[error("configuration file {0} does not exist")]
    ConfigNotFound(PathBuf),

    #[error("configuration file {path} could not be parsed: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error(
        "the file {0} does not have all the required entries or does not match valid values. \
         Please do not modify the file manually"
    )]
    Schema(PathBuf),

    #[error("the interface {interface} on network {role} does not exist")]
    InterfaceMissing { interface: String, role: Role },

    #[error("no IPv4 address configured on {interface} ({role})")]
    InterfaceUnbound { interface: String, role: Role },

    #[error("there is no domain name configured in the system")]
    DomainNotConfigured,

    #[error(
        "container name {0} can be resolved. Do not add the container to /etc/hosts nor DNS, and try again"
    )]
    NamingCollision(String),

    #[error("configured RAS IP {found} is not {expected}")]
    RasAddressMismatch { found: String, expected: String },

    #[error("only {resolved} of {total} endpoint DNS names could be resolved")]
    Resolution { resolved: usize, total: usize },

    #[error("none of {total} endpoints can be reached on port {port}")]
    Unreachable { total: usize, port: u16 },

    #[error("image version input cancelled")]
    InputCancelled,

    #[error("image version {given} is not supported, expected {expected}")]
    UnsupportedImageVersion { given: String, expected: String },

    #[error("container matching {0} is already running")]
    LifecycleConflict(String),

    #[error("could not delete container images matching {0}")]
    ImageCleanup(String),

    #[error("image installation did not complete")]
    InstallIncomplete,

    #[error("sibling tool unavailable: {0}")]
    SiblingUnavailable(String),

    #[error("sibling tool could not read the configuration: {0}")]
    SiblingReadConfig(String),

    #[error("the container run returned a non zero exit: {0}")]
    Run(String),

    #[error("cannot write configuration file {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("the just written configuration failed {errors} check(s) and cannot be used")]
    Revalidation { errors: u32 },

    #[error("this tool must be run as {expected}, not {found}")]
    Privilege { expected: String, found: String },

    #[error("container runtime binary {0} does not exist")]
    RuntimeMissing(PathBuf),

    #[error("network manager binary {0} does not exist")]
    NetworkManagerMissing(PathBuf),

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("container runtime query failed: {0}")]
    Runtime(String),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RclError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RclError::ConfigNotFound(_) => EXIT_GENERAL_ERROR,
            RclError::ConfigParse { .. } => EXIT_GENERAL_ERROR,
            RclError::Schema(_) => EXIT_SCHEMA,
            RclError::InterfaceMissing { .. } => EXIT_INTERFACE_MISSING,
            RclError::InterfaceUnbound { .. } => EXIT_INTERFACE_UNBOUND,
            RclError::DomainNotConfigured => EXIT_NO_DOMAIN,
            RclError::NamingCollision(_) => EXIT_CONTAINER_RESOLVABLE,
            RclError::RasAddressMismatch { .. } => EXIT_RAS_ADDRESS,
            RclError::Resolution { .. } => EXIT_ENDPOINT_RESOLUTION,
            RclError::Unreachable { .. } => EXIT_UNREACHABLE,
            RclError::InputCancelled => EXIT_UNREACHABLE,
            RclError::UnsupportedImageVersion { .. } => EXIT_GENERAL_ERROR,
            RclError::LifecycleConflict(_) => EXIT_ALREADY_RUNNING,
            RclError::ImageCleanup(_) => EXIT_IMAGE_DELETE,
            RclError::InstallIncomplete => EXIT_GENERAL_ERROR,
            RclError::SiblingUnavailable(_) => EXIT_SIBLING_UNAVAILABLE,
            RclError::SiblingReadConfig(_) => EXIT_SIBLING_READCONF,
            RclError::Run(_) => EXIT_RUN_FAILED,
            RclError::Persist { .. } => EXIT_WRITE_FAILURE,
            RclError::Revalidation { .. } => EXIT_GENERAL_ERROR,
            RclError::Privilege { .. } => EXIT_NOT_OPERATOR,
            RclError::RuntimeMissing(_) => EXIT_NO_RUNTIME,
            RclError::NetworkManagerMissing(_) => EXIT_NO_NETWORK_MANAGER,
            RclError::OutputDir { .. } => EXIT_OUTPUT_DIR,
            RclError::Runtime(_) => EXIT_GENERAL_ERROR,
            RclError::Settings(_) => EXIT_GENERAL_ERROR,
            RclError::Io(_) => EXIT_GENERAL_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, RclError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_stable() {
        assert_eq!(RclError::Schema(PathBuf::from("rclmgr.yml")).exit_code(), 13);
        assert_eq!(RclError::DomainNotConfigured.exit_code(), 8);
        assert_eq!(RclError::NamingCollision("c".into()).exit_code(), 51);
        assert_eq!(RclError::Resolution { resolved: 3, total: 4 }.exit_code(), 3);
        assert_eq!(RclError::Unreachable { total: 4, port: 22 }.exit_code(), 6);
        assert_eq!(RclError::LifecycleConflict("rcl".into()).exit_code(), 9);
        assert_eq!(RclError::ImageCleanup("rcl".into()).exit_code(), 10);
        assert_eq!(RclError::Run("boom".into()).exit_code(), 24);
        assert_eq!(
            RclError::Privilege { expected: "rcladmin".into(), found: "root".into() }.exit_code(),
            15
        );
        assert_eq!(RclError::RuntimeMissing(PathBuf::from("/bin/podman")).exit_code(), 26);
        assert_eq!(RclError::NetworkManagerMissing(PathBuf::from("/bin/nmcli")).exit_code(), 28);
    }

    #[test]
    fn test_interface_errors_are_distinct() {
        let missing = RclError::InterfaceMissing { interface: "campus".into(), role: Role::Campus };
        let unbound = RclError::InterfaceUnbound { interface: "campus".into(), role: Role::Campus };
        assert_ne!(missing.exit_code(), unbound.exit_code());
    }
}
