//! Container runtime CLI access.
//!
//! Only three runtime calls are made: list every instance, list installed
//! images and force-remove an image by ID. Output is JSON; parsing is kept
//! separate so callers decide how to degrade.

use crate::error::{RclError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Instance state as reported by the runtime.
///
/// Older runtimes report a numeric code where 3 means running.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InstanceState {
    Code(i64),
    Name(String),
}

impl InstanceState {
    pub fn is_running(&self) -> bool {
        match self {
            InstanceState::Code(code) => *code == 3,
            InstanceState::Name(name) => name == "running",
        }
    }
}

impl Default for InstanceState {
    fn default() -> Self {
        InstanceState::Name(String::new())
    }
}

/// Snapshot of one runtime-reported container instance
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerInstance {
    #[serde(rename = "Id", alias = "ID", default)]
    pub id: String,
    #[serde(rename = "Image", default)]
    pub image: String,
    #[serde(rename = "State", default)]
    pub state: InstanceState,
}

/// Installed image; names may be absent for dangling images
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerImage {
    #[serde(rename = "Id", alias = "ID")]
    pub id: String,
    #[serde(rename = "Names", default)]
    pub names: Option<Vec<String>>,
}

pub fn parse_instances(json: &str) -> std::result::Result<Vec<ContainerInstance>, serde_json::Error> {
    serde_json::from_str(json)
}

pub fn parse_images(json: &str) -> std::result::Result<Vec<ContainerImage>, serde_json::Error> {
    serde_json::from_str(json)
}

/// The external container runtime
pub trait ContainerRuntime {
    /// JSON listing of every instance, running or not
    fn list_instances_json(&self) -> Result<String>;

    /// JSON listing of installed images
    fn list_images_json(&self) -> Result<String>;

    /// Force-remove one image by exact ID
    fn remove_image(&self, id: &str) -> Result<()>;
}

/// Runtime driven through the podman CLI
#[derive(Debug, Clone)]
pub struct PodmanCli {
    bin: PathBuf,
}

impl PodmanCli {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        debug!("Running {} {}", self.bin.display(), args.join(" "));
        let output = Command::new(&self.bin).args(args).output().map_err(|e| {
            RclError::Runtime(format!("cannot execute {}: {}", self.bin.display(), e))
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(RclError::Runtime(format!(
                "{} {} exited with {}: {}",
                self.bin.display(),
                args.join(" "),
                output.status,
                if stderr.is_empty() { &stdout } else { &stderr }
            )));
        }
        Ok(stdout)
    }
}

impl ContainerRuntime for PodmanCli {
    fn list_instances_json(&self) -> Result<String> {
        self.run(&["ps", "--all", "--format", "json"])
    }

    fn list_images_json(&self) -> Result<String> {
        self.run(&["images", "--format", "json"])
    }

    fn remove_image(&self, id: &str) -> Result<()> {
        self.run(&["image", "rm", "--force", id]).map(|_| ())
    }
}
