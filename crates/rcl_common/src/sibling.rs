//! Boundary to the sibling install/run tool (`rclmgr`).
//!
//! The bring-up only needs four operations from it. `RclmgrCli` drives the
//! tool's command-line entry point; tests substitute their own implementation.
//! Every request carries its configuration path in `ToolArgs`.

use crate::schema::{self, Configuration};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Keys the tool reads to install and start the container
pub const TOOL_KEYS: &[&str] = &[
    schema::CONTAINER_HOSTNAME,
    "IMAGE_NAME",
    schema::IMAGE_VERSION,
    "SSH_PORT",
];

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{0} does not exist")]
    Missing(PathBuf),

    #[error("cannot read configuration {path}: {reason}")]
    Configuration { path: PathBuf, reason: String },

    #[error("cannot execute {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code:?}")]
    Exit { program: PathBuf, code: Option<i32> },
}

/// Arguments handed to the sibling tool for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolArgs {
    pub config_file: PathBuf,
    pub force: bool,
    pub image_file: Option<PathBuf>,
}

impl ToolArgs {
    /// Request to install the image, optionally from a tarball
    pub fn install(config_file: &Path, image_file: Option<&Path>) -> Self {
        Self {
            config_file: config_file.to_path_buf(),
            force: true,
            image_file: image_file.map(Path::to_path_buf),
        }
    }

    /// Request to run the installed image
    pub fn run(config_file: &Path) -> Self {
        Self {
            config_file: config_file.to_path_buf(),
            force: false,
            image_file: None,
        }
    }
}

/// The four operations consumed from the sibling tool
pub trait InstallTool {
    /// Whether the tool can be invoked at all
    fn is_available(&self) -> bool;

    /// Load the configuration the way the tool will consume it
    fn read_configuration(&self, args: &ToolArgs) -> Result<(), ToolError>;

    fn install_from_file(&self, args: &ToolArgs, path: &Path) -> Result<(), ToolError>;

    fn install_from_repository(&self, args: &ToolArgs) -> Result<(), ToolError>;

    fn run_container(&self, args: &ToolArgs, foreground: bool) -> Result<(), ToolError>;
}

/// Sibling tool invoked through its command-line entry point
#[derive(Debug, Clone)]
pub struct RclmgrCli {
    program: PathBuf,
}

impl RclmgrCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn base_command(&self, args: &ToolArgs) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-c").arg(&args.config_file);
        if args.force {
            cmd.arg("--force");
        }
        cmd
    }

    /// `-c <cfg> [--force] [-f <tarball>] -i`
    pub fn install_command(&self, args: &ToolArgs, image_file: Option<&Path>) -> Command {
        let mut cmd = self.base_command(args);
        if let Some(path) = image_file {
            cmd.arg("-f").arg(path);
        }
        cmd.arg("-i");
        cmd
    }

    /// `-c <cfg> [--force] -r`
    pub fn run_command(&self, args: &ToolArgs) -> Command {
        let mut cmd = self.base_command(args);
        cmd.arg("-r");
        cmd
    }

    /// Run with inherited stdio so pull and start progress stay visible
    fn execute(&self, mut cmd: Command) -> Result<(), ToolError> {
        debug!("Running {:?}", cmd);
        let status = cmd
            .stdin(Stdio::null())
            .status()
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(ToolError::Exit {
                program: self.program.clone(),
                code: status.code(),
            })
        }
    }
}

impl InstallTool for RclmgrCli {
    fn is_available(&self) -> bool {
        self.program.is_file()
    }

    fn read_configuration(&self, args: &ToolArgs) -> Result<(), ToolError> {
        if !self.is_available() {
            return Err(ToolError::Missing(self.program.clone()));
        }
        let rejected = |reason: String| ToolError::Configuration {
            path: args.config_file.clone(),
            reason,
        };

        let text = std::fs::read_to_string(&args.config_file).map_err(|e| rejected(e.to_string()))?;
        let cfg = Configuration::from_yaml(&text).map_err(rejected)?;
        if let Some(key) = TOOL_KEYS.iter().find(|key| !cfg.contains(key)) {
            return Err(rejected(format!("missing {}", key)));
        }
        debug!("{} carries every key the tool reads", args.config_file.display());
        Ok(())
    }

    fn install_from_file(&self, args: &ToolArgs, path: &Path) -> Result<(), ToolError> {
        self.execute(self.install_command(args, Some(path)))
    }

    fn install_from_repository(&self, args: &ToolArgs) -> Result<(), ToolError> {
        self.execute(self.install_command(args, None))
    }

    fn run_container(&self, args: &ToolArgs, foreground: bool) -> Result<(), ToolError> {
        let mut cmd = self.run_command(args);
        if !foreground {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        self.execute(cmd)
    }
}
