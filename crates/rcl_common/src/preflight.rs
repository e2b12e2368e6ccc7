//! Host pre-flight gates: required binaries, operator identity, DNS domain.

use crate::error::{RclError, Result};
use std::path::Path;
use tracing::{debug, error};

/// The container runtime CLI must be installed
pub fn check_runtime_binary(path: &Path) -> Result<()> {
    debug!("Going to check if {} exists", path.display());
    if path.is_file() {
        debug!("{} exists", path.display());
        Ok(())
    } else {
        error!("{} does not exist. We cannot continue", path.display());
        Err(RclError::RuntimeMissing(path.to_path_buf()))
    }
}

/// The network manager CLI must be installed
pub fn check_network_manager_binary(path: &Path) -> Result<()> {
    debug!("Going to check if {} exists", path.display());
    if path.is_file() {
        debug!("{} exists", path.display());
        Ok(())
    } else {
        error!("{} does not exist. We cannot continue", path.display());
        Err(RclError::NetworkManagerMissing(path.to_path_buf()))
    }
}

/// Name of the invoking user, from the environment or the passwd entry
pub fn current_username() -> Option<String> {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .or_else(|| {
            nix::unistd::User::from_uid(nix::unistd::getuid())
                .ok()
                .flatten()
                .map(|user| user.name)
        })
}

/// Only the operator identity may run the bring-up
pub fn check_operator(current: Option<&str>, expected: &str) -> Result<()> {
    debug!("Going to check if this tool is being run with the {} user", expected);
    match current {
        Some(user) if user == expected => {
            debug!("This tool is being run with {} privileges", expected);
            Ok(())
        }
        other => {
            let found = other.unwrap_or("unknown").to_string();
            error!("This tool must be run with the {} user, not {}", expected, found);
            Err(RclError::Privilege {
                expected: expected.to_string(),
                found,
            })
        }
    }
}

/// Domain part of a host name: everything after the first dot
pub fn domain_from_hostname(hostname: &str) -> Option<&str> {
    hostname
        .split_once('.')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
}

/// Host name as reported by the kernel
pub fn system_hostname() -> Result<String> {
    let hostname = nix::unistd::gethostname().map_err(|e| RclError::Io(e.into()))?;
    Ok(hostname.to_string_lossy().into_owned())
}

/// DNS domain of `hostname`; a bare host name is fatal
pub fn host_domain(hostname: &str) -> Result<String> {
    debug!("Going to check for domain name in the system");
    match domain_from_hostname(hostname) {
        Some(domain) => {
            debug!("Domain name in the system is {}", domain);
            Ok(domain.to_string())
        }
        None => {
            error!("There is no domain name configured in the system");
            Err(RclError::DomainNotConfigured)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_from_hostname() {
        assert_eq!(domain_from_hostname("utility.gpfs.local"), Some("gpfs.local"));
        assert_eq!(domain_from_hostname("utility"), None);
        assert_eq!(domain_from_hostname("utility."), None);
        assert_eq!(host_domain("utility").unwrap_err().exit_code(), 8);
    }

    #[test]
    fn test_operator_check() {
        assert!(check_operator(Some("rcladmin"), "rcladmin").is_ok());
        let err = check_operator(Some("root"), "rcladmin").unwrap_err();
        assert_eq!(err.exit_code(), 15);
        assert!(check_operator(None, "rcladmin").is_err());
    }

    #[test]
    fn test_missing_binaries() {
        let missing = Path::new("/nonexistent/bin/podman");
        assert_eq!(check_runtime_binary(missing).unwrap_err().exit_code(), 26);
        assert_eq!(check_network_manager_binary(missing).unwrap_err().exit_code(), 28);
    }
}
