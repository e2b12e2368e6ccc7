//! Host fakes shared by the integration tests
#![allow(dead_code)]

use rcl_common::dns::{Connector, Resolver};
use rcl_common::error::{RclError, Result};
use rcl_common::network::InterfaceSource;
use rcl_common::runtime::ContainerRuntime;
use rcl_common::sibling::{InstallTool, ToolArgs, ToolError};
use std::collections::{HashMap, HashSet};
use std::io;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

pub const DOMAIN: &str = "example.com";
pub const CAMPUS_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 100, 10);
pub const RAS_IP: Ipv4Addr = Ipv4Addr::new(10, 23, 16, 1);

/// Interfaces keyed by name, `None` meaning no IPv4 address
#[derive(Default)]
pub struct FakeInterfaces {
    pub interfaces: HashMap<String, Option<Ipv4Addr>>,
}

impl FakeInterfaces {
    pub fn with(mut self, name: &str, addr: Option<Ipv4Addr>) -> Self {
        self.interfaces.insert(name.to_string(), addr);
        self
    }

    /// `campus` and `virbr1` bound to the usual addresses
    pub fn healthy() -> Self {
        Self::default()
            .with("campus", Some(CAMPUS_IP))
            .with("virbr1", Some(RAS_IP))
    }
}

impl InterfaceSource for FakeInterfaces {
    fn interface_names(&self) -> io::Result<Vec<String>> {
        Ok(self.interfaces.keys().cloned().collect())
    }

    fn ipv4_address(&self, name: &str) -> io::Result<Option<Ipv4Addr>> {
        Ok(self.interfaces.get(name).copied().flatten())
    }
}

/// Names that resolve; everything else fails
#[derive(Default)]
pub struct FakeResolver {
    pub names: HashMap<String, Ipv4Addr>,
}

impl FakeResolver {
    pub fn with(mut self, name: &str, addr: Ipv4Addr) -> Self {
        self.names.insert(name.to_string(), addr);
        self
    }

    pub fn with_endpoints(self, endpoints: &[&str]) -> Self {
        endpoints
            .iter()
            .enumerate()
            .fold(self, |r, (i, e)| r.with(e, Ipv4Addr::new(203, 0, 113, i as u8 + 1)))
    }
}

impl Resolver for FakeResolver {
    fn resolve_ipv4(&self, name: &str) -> io::Result<Vec<Ipv4Addr>> {
        self.names
            .get(name)
            .map(|addr| vec![*addr])
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{} not found", name)))
    }
}

/// Hosts that accept connections
#[derive(Default)]
pub struct FakeConnector {
    pub reachable: HashSet<String>,
}

impl FakeConnector {
    pub fn reaching(hosts: &[&str]) -> Self {
        Self {
            reachable: hosts.iter().map(|h| h.to_string()).collect(),
        }
    }
}

impl Connector for FakeConnector {
    fn connect(&self, host: &str, _port: u16, _timeout: Duration) -> io::Result<()> {
        if self.reachable.contains(host) {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
        }
    }
}

/// Runtime returning canned listings and recording removals
#[derive(Default)]
pub struct FakeRuntime {
    pub instances_json: String,
    pub images_json: String,
    pub failing_ids: HashSet<String>,
    pub removed: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn new(instances_json: &str, images_json: &str) -> Self {
        Self {
            instances_json: instances_json.to_string(),
            images_json: images_json.to_string(),
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::new("[]", "[]")
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

impl ContainerRuntime for FakeRuntime {
    fn list_instances_json(&self) -> Result<String> {
        Ok(self.instances_json.clone())
    }

    fn list_images_json(&self) -> Result<String> {
        Ok(self.images_json.clone())
    }

    fn remove_image(&self, id: &str) -> Result<()> {
        self.removed.lock().unwrap().push(id.to_string());
        if self.failing_ids.contains(id) {
            Err(RclError::Runtime(format!("cannot remove {}", id)))
        } else {
            Ok(())
        }
    }
}

/// Sibling tool recording every call
#[derive(Default)]
pub struct FakeTool {
    pub unavailable: bool,
    pub fail_read_configuration: bool,
    pub fail_install: bool,
    pub fail_run: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeTool {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl InstallTool for FakeTool {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    fn read_configuration(&self, args: &ToolArgs) -> std::result::Result<(), ToolError> {
        self.record(format!("read_configuration {}", args.config_file.display()));
        if self.fail_read_configuration {
            return Err(ToolError::Configuration {
                path: args.config_file.clone(),
                reason: "bad yaml".to_string(),
            });
        }
        Ok(())
    }

    fn install_from_file(&self, args: &ToolArgs, path: &Path) -> std::result::Result<(), ToolError> {
        self.record(format!("install_from_file {} {}", path.display(), args.force));
        self.install_outcome()
    }

    fn install_from_repository(&self, args: &ToolArgs) -> std::result::Result<(), ToolError> {
        self.record(format!("install_from_repository {}", args.force));
        self.install_outcome()
    }

    fn run_container(&self, args: &ToolArgs, foreground: bool) -> std::result::Result<(), ToolError> {
        self.record(format!("run_container {} {}", args.config_file.display(), foreground));
        if self.fail_run {
            return Err(ToolError::Exit {
                program: PathBuf::from("rclmgr"),
                code: Some(1),
            });
        }
        Ok(())
    }
}

impl FakeTool {
    fn install_outcome(&self) -> std::result::Result<(), ToolError> {
        if self.fail_install {
            return Err(ToolError::Exit {
                program: PathBuf::from("rclmgr"),
                code: Some(2),
            });
        }
        Ok(())
    }
}

/// A configuration document that passes every schema check
pub fn valid_yaml() -> String {
    String::from(
        r#"CONTAINER:
  CONTAINER_HOSTNAME: utilityBareMetal-rcl-official
  CAMPUS_INTERFACE: campus
  RAS_INTERFACE: virbr1
  RAS_INTERFACE_IP: 10.23.16.1
  IMAGE_NAME: cp.icr.io/cp/scalesystem/sss_rcl
  SSH_PORT: 10022
  LOG: /home/rcladmin/log
  BKUP: /home/rcladmin/backup
  CONTAINER_DOMAIN_NAME: example.com
  UTILITY_HOSTNAME: utilityBareMetal
  CAMPUS_INTERFACE_IP: 192.168.100.10
  IMAGE_VERSION: 6.2.3.0
"#,
    )
}

/// Write `contents` as `rclmgr.yml` under `dir`
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("rclmgr.yml");
    std::fs::write(&path, contents).unwrap();
    path
}

/// `valid_yaml` with the line for `key` removed
pub fn yaml_without(key: &str) -> String {
    valid_yaml()
        .lines()
        .filter(|line| !line.trim_start().starts_with(&format!("{}:", key)))
        .map(|line| format!("{}\n", line))
        .collect()
}

/// `valid_yaml` with `key` set to `value`
pub fn yaml_with(key: &str, value: &str) -> String {
    valid_yaml()
        .lines()
        .map(|line| {
            if line.trim_start().starts_with(&format!("{}:", key)) {
                format!("  {}: {}\n", key, value)
            } else {
                format!("{}\n", line)
            }
        })
        .collect()
}
