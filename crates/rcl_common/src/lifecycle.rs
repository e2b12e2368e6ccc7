//! Container lifecycle: observe, clean up, install, run.
//!
//! The manager never tracks container state. Every decision starts from a
//! fresh runtime listing, and the imperative work is delegated to the runtime
//! CLI (image removal) and the sibling tool (install, run).

use crate::error::{RclError, Result};
use crate::runtime::{self, ContainerInstance, ContainerRuntime};
use crate::sibling::{InstallTool, ToolArgs};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub struct ContainerLifecycleManager<'a> {
    runtime: &'a dyn ContainerRuntime,
    tool: &'a dyn InstallTool,
    image_match: String,
    config_file: PathBuf,
}

impl<'a> ContainerLifecycleManager<'a> {
    pub fn new(
        runtime: &'a dyn ContainerRuntime,
        tool: &'a dyn InstallTool,
        image_match: impl Into<String>,
        config_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            tool,
            image_match: image_match.into(),
            config_file: config_file.into(),
        }
    }

    pub fn image_match(&self) -> &str {
        &self.image_match
    }

    /// All instances known to the runtime.
    ///
    /// Unparseable output counts as no instances.
    pub fn list_instances(&self) -> Result<Vec<ContainerInstance>> {
        debug!("Going to query the containers with the runtime ps command");
        let json = self.runtime.list_instances_json()?;
        match runtime::parse_instances(&json) {
            Ok(instances) => Ok(instances),
            Err(e) => {
                debug!(
                    "Load of containers JSON returned an error ({}), we consider no containers installed",
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    /// True iff a running instance's image reference contains `image_match`
    pub fn is_running(&self, image_match: &str) -> Result<bool> {
        let mut running = false;
        for instance in self.list_instances()? {
            if !instance.state.is_running() {
                debug!(
                    "Found installed container in state {:?} with image {}",
                    instance.state, instance.image
                );
                continue;
            }
            debug!(
                "Found a running container with image {} and ID {}",
                instance.image, instance.id
            );
            if instance.image.contains(image_match) {
                debug!("Found the container image we are looking for running");
                running = true;
            } else {
                debug!("Although the container is running, it is not the one we are looking for");
            }
        }
        Ok(running)
    }

    /// Delete every image with an alias containing `image_match`.
    ///
    /// Returns false iff at least one deletion failed. Listing problems are
    /// logged and treated as nothing to delete.
    pub fn delete_matching_images(&self, image_match: &str) -> bool {
        let images = match self
            .runtime
            .list_images_json()
            .map(|json| runtime::parse_images(&json))
        {
            Ok(Ok(images)) => images,
            Ok(Err(e)) => {
                debug!("Cannot parse image listing ({}), nothing to clean up", e);
                return true;
            }
            Err(e) => {
                warn!("Cannot list images ({}), nothing to clean up", e);
                return true;
            }
        };

        if images.is_empty() {
            info!("There are no images installed, none to be cleaned up");
            return true;
        }

        let mut to_delete = BTreeSet::new();
        for image in &images {
            let Some(names) = &image.names else {
                debug!("Detected image with no name, we are not going to clean this one");
                continue;
            };
            for name in names {
                if name.contains(image_match) {
                    info!(
                        "Found image {} with ID {} that we will try to delete",
                        name, image.id
                    );
                    to_delete.insert(image.id.as_str());
                } else {
                    debug!("Found image {} that we won't delete", name);
                }
            }
        }

        if to_delete.is_empty() {
            info!("There are no images related to {} to be deleted", image_match);
            return true;
        }

        let mut failures = 0;
        for id in to_delete {
            info!("Going to delete image with ID {}", id);
            match self.runtime.remove_image(id) {
                Ok(()) => info!("Image with ID {} deleted", id),
                Err(e) => {
                    warn!("Could not delete image with ID {}: {}", id, e);
                    failures += 1;
                }
            }
        }
        failures == 0
    }

    /// Clean up and install the image.
    ///
    /// A running container or a failed cleanup is fatal. A failed install is
    /// returned as `Ok(false)` for the caller to act on.
    pub fn prepare(&self, image_file: Option<&Path>) -> Result<bool> {
        if self.is_running(&self.image_match)? {
            let err = RclError::LifecycleConflict(self.image_match.clone());
            error!("We cannot start the container as it seems it is already up");
            return Err(err);
        }

        debug!("Container is not up, we will delete the image before start");
        if !self.delete_matching_images(&self.image_match) {
            error!("Could not delete container image");
            return Err(RclError::ImageCleanup(self.image_match.clone()));
        }
        debug!("Image cleanup done, we continue");

        if !self.tool.is_available() {
            error!("The sibling install tool is not available");
            return Ok(false);
        }

        if let Some(file) = image_file {
            if !file.is_file() {
                error!("The image file {} does not exist", file.display());
                return Ok(false);
            }
            info!("Going to install {}", file.display());
        }

        let args = ToolArgs::install(&self.config_file, image_file);
        self.tool.read_configuration(&args).map_err(|e| {
            error!("Could not read configuration with the sibling tool: {}", e);
            RclError::SiblingReadConfig(e.to_string())
        })?;

        info!("Going to install the image. It does no changes if already installed");
        let outcome = match &args.image_file {
            Some(file) => self.tool.install_from_file(&args, file),
            None => self.tool.install_from_repository(&args),
        };
        match outcome {
            Ok(()) => {
                info!("Image has been installed successfully");
                Ok(true)
            }
            Err(e) => {
                warn!("Image installation has failed: {}", e);
                Ok(false)
            }
        }
    }

    /// Start the container through the sibling tool; any failure is fatal
    pub fn run(&self) -> Result<()> {
        if !self.tool.is_available() {
            return Err(RclError::SiblingUnavailable(
                "sibling install tool is not available".to_string(),
            ));
        }

        let args = ToolArgs::run(&self.config_file);
        self.tool.read_configuration(&args).map_err(|e| {
            error!("Could not read configuration with the sibling tool: {}", e);
            RclError::SiblingReadConfig(e.to_string())
        })?;

        info!("Going to start the container");
        self.tool.run_container(&args, true).map_err(|e| {
            error!(
                "The container run returned a non zero exit. Please check the messages above"
            );
            RclError::Run(e.to_string())
        })?;
        debug!("Back from the container run");
        Ok(())
    }
}
