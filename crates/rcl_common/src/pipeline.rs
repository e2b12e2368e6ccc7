//! The bring-up pipeline.
//!
//! Stages are composed top to bottom; each returns the input of the next or
//! the error that ends the run:
//!
//! schema → topology → host domain → pre-flight → container naming → RAS
//! address → endpoint resolution → reachability → merge/write → reload and
//! revalidate → prepare → run
//!
//! The configuration is persisted before the lifecycle stage because the
//! sibling tool reads it back.

use crate::dns::{Connector, Resolver};
use crate::endpoints::{EndpointReachabilityProbe, ReachabilityTier, ENDPOINTS};
use crate::error::{RclError, Result};
use crate::lifecycle::ContainerLifecycleManager;
use crate::network::{InterfaceSource, NetworkTopology, NetworkTopologyResolver};
use crate::persist::{ConfigPersister, DerivedValues};
use crate::preflight;
use crate::runtime::ContainerRuntime;
use crate::schema::{self, ConfigValidator, Configuration, STATIC_FIELDS, UTILITY_HOSTNAME};
use crate::settings::Settings;
use crate::sibling::InstallTool;
use std::path::PathBuf;
use tracing::{debug, error, info, info_span, Span};
use uuid::Uuid;

/// Host facilities and identity the pipeline runs against
pub struct Host<'a> {
    pub interfaces: &'a dyn InterfaceSource,
    pub resolver: &'a dyn Resolver,
    pub connector: &'a dyn Connector,
    pub runtime: &'a dyn ContainerRuntime,
    pub tool: &'a dyn InstallTool,
    pub hostname: String,
    pub username: Option<String>,
}

/// Operator input for a full bring-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    /// Install from this tarball instead of the registry
    pub image_file: Option<PathBuf>,
    pub image_version: String,
}

/// Facts established by the validation gates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateReport {
    pub config: Configuration,
    pub topology: NetworkTopology,
    pub domain: String,
    pub reachability: ReachabilityTier,
}

/// Outcome of a completed bring-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BringUp {
    pub written: Configuration,
    pub backup: Option<PathBuf>,
    pub reachability: ReachabilityTier,
}

pub struct Pipeline<'a> {
    settings: &'a Settings,
    host: Host<'a>,
    stamp: String,
    run_id: Uuid,
}

impl<'a> Pipeline<'a> {
    /// `stamp` is the run timestamp shared with the log file name
    pub fn new(settings: &'a Settings, host: Host<'a>, stamp: impl Into<String>) -> Self {
        Self {
            settings,
            host,
            stamp: stamp.into(),
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    fn span(&self, command: &'static str) -> Span {
        info_span!("bringup", run_id = %self.run_id, command)
    }

    fn topology_resolver(&self) -> NetworkTopologyResolver<'_> {
        NetworkTopologyResolver::new(self.host.interfaces, self.host.resolver)
    }

    fn lifecycle(&self) -> ContainerLifecycleManager<'_> {
        ContainerLifecycleManager::new(
            self.host.runtime,
            self.host.tool,
            self.settings.image_match.as_str(),
            self.settings.config_file.as_path(),
        )
    }

    /// Every gate short of touching the file or the container
    pub fn check(&self) -> Result<GateReport> {
        let span = self.span("check");
        let _guard = span.enter();
        self.run_gates(false)
    }

    /// Validate, persist, and bring the container up
    pub fn start(&self, request: &StartRequest) -> Result<BringUp> {
        let span = self.span("start");
        let _guard = span.enter();

        schema::check_image_version(&request.image_version)?;
        let gates = self.run_gates(true)?;

        debug!("Going to merge configurable parameters to be written");
        let derived = DerivedValues {
            domain: gates.domain.clone(),
            utility_hostname: UTILITY_HOSTNAME.to_string(),
            campus_ip: gates.topology.campus,
            image_version: request.image_version.clone(),
        };
        let merged = ConfigPersister::merge(&gates.config, &derived, STATIC_FIELDS);

        let persister = ConfigPersister::new(
            &self.settings.config_file,
            &self.settings.backup_dir,
            self.stamp.as_str(),
        );
        let backup = persister.write(&merged)?;
        if let Some(backup) = &backup {
            info!("Previous configuration kept as {}", backup.display());
        }

        let revalidation = persister.reload_and_revalidate(&gates.topology)?;
        if !revalidation.passed() {
            error!("This just created YML file CANNOT be used");
            return Err(RclError::Revalidation {
                errors: revalidation.errors,
            });
        }
        debug!("This just created YML file can be used");

        let lifecycle = self.lifecycle();
        if !lifecycle.prepare(request.image_file.as_deref())? {
            error!("The image could not be installed, the container will not be started");
            return Err(RclError::InstallIncomplete);
        }
        lifecycle.run()?;
        info!("Container is up");

        Ok(BringUp {
            written: revalidation.config,
            backup,
            reachability: gates.reachability,
        })
    }

    /// Whether a matching container instance is running
    pub fn status(&self) -> Result<bool> {
        let span = self.span("status");
        let _guard = span.enter();
        let lifecycle = self.lifecycle();
        lifecycle.is_running(lifecycle.image_match())
    }

    fn run_gates(&self, preflight_checks: bool) -> Result<GateReport> {
        let validator = ConfigValidator::new(&self.settings.config_file);
        let config = validator.validate()?;

        let topology_resolver = self.topology_resolver();
        let topology = topology_resolver.resolve_topology(&config)?;
        debug!("Detected CAMPUS {} and RAS {}", topology.campus, topology.ras);

        let domain = preflight::host_domain(&self.host.hostname)?;

        if preflight_checks {
            preflight::check_runtime_binary(&self.settings.runtime_bin)?;
            preflight::check_network_manager_binary(&self.settings.network_manager_bin)?;
            preflight::check_operator(
                self.host.username.as_deref(),
                &self.settings.operator_user,
            )?;
        }

        topology_resolver.check_container_not_resolvable(schema::CONTAINER_NAME, &domain)?;
        topology_resolver.check_ras_address(&topology.ras.to_string())?;

        let probe = EndpointReachabilityProbe::new(self.host.resolver, self.host.connector);
        probe.require_all_resolvable(ENDPOINTS)?;
        let reachability = probe.check_reachability(
            ENDPOINTS,
            self.settings.probe_port,
            self.settings.probe_timeout(),
        )?;

        Ok(GateReport {
            config,
            topology,
            domain,
            reachability,
        })
    }
}
