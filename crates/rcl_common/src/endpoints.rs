//! Remote endpoint resolution and reachability probes.
//!
//! Every endpoint must resolve. Reachability is tiered: all reachable is
//! healthy, some reachable is a warning kept for HA awareness, none reachable
//! means the host has no outbound path and is fatal.
//!
//! Probes run one thread per endpoint and are joined before the verdict, so
//! the counts are identical to a sequential pass.

use crate::dns::{Connector, Resolver};
use crate::error::{RclError, Result};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn, Span};

/// Service front-end endpoints the container talks to
pub const ENDPOINTS: &[&str] = &[
    "xrsc-front-srv-1.southdata.ibm.com",
    "xrsc-front-srv-2.southdata.ibm.com",
    "xrsc-front-srv-3.eastdata.ibm.com",
    "xrsc-front-srv-4.eastdata.ibm.com",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReachabilityTier {
    /// Every endpoint accepted a connection
    All,
    /// At least one, but not every, endpoint accepted a connection
    Partial,
    /// No endpoint accepted a connection
    None,
}

impl ReachabilityTier {
    pub fn from_counts(reached: usize, total: usize) -> Self {
        if reached == total {
            ReachabilityTier::All
        } else if reached > 0 {
            ReachabilityTier::Partial
        } else {
            ReachabilityTier::None
        }
    }
}

pub struct EndpointReachabilityProbe<'a> {
    resolver: &'a dyn Resolver,
    connector: &'a dyn Connector,
}

impl<'a> EndpointReachabilityProbe<'a> {
    pub fn new(resolver: &'a dyn Resolver, connector: &'a dyn Connector) -> Self {
        Self {
            resolver,
            connector,
        }
    }

    /// Number of endpoints that resolve; failures are logged and tolerated
    pub fn resolve_all(&self, endpoints: &[&str]) -> usize {
        debug!("Going to try to name resolve the {} endpoints", endpoints.len());
        fan_out(endpoints, |endpoint| match self.resolver.resolve_ipv4(endpoint) {
            Ok(addrs) => {
                debug!("The endpoint {} resolves to {:?}", endpoint, addrs);
                true
            }
            Err(e) => {
                error!("Could not resolve endpoint {}: {}", endpoint, e);
                false
            }
        })
    }

    /// Resolve every endpoint or fail; there is no partial tolerance
    pub fn require_all_resolvable(&self, endpoints: &[&str]) -> Result<usize> {
        let resolved = self.resolve_all(endpoints);
        if resolved < endpoints.len() {
            let err = RclError::Resolution {
                resolved,
                total: endpoints.len(),
            };
            error!("{}, we cannot continue", err);
            return Err(err);
        }
        info!("All {} endpoint DNS names could be resolved", endpoints.len());
        Ok(resolved)
    }

    /// Number of endpoints accepting a TCP connection on `port` within `timeout`
    pub fn probe_all(&self, endpoints: &[&str], port: u16, timeout: Duration) -> usize {
        debug!("Going to try to reach the {} endpoints", endpoints.len());
        fan_out(endpoints, |endpoint| {
            match self.connector.connect(endpoint, port, timeout) {
                Ok(()) => {
                    debug!("Connected to port {} at endpoint {}", port, endpoint);
                    true
                }
                Err(e) => {
                    warn!("Could not reach port {} at endpoint {}: {}", port, endpoint, e);
                    false
                }
            }
        })
    }

    /// Probe and apply the tier policy
    pub fn check_reachability(
        &self,
        endpoints: &[&str],
        port: u16,
        timeout: Duration,
    ) -> Result<ReachabilityTier> {
        let total = endpoints.len();
        let reached = self.probe_all(endpoints, port, timeout);
        let tier = ReachabilityTier::from_counts(reached, total);
        match tier {
            ReachabilityTier::All => {
                info!("All {} endpoints can be reached on port {}", total, port);
            }
            ReachabilityTier::Partial => {
                warn!("Total {} endpoints can be reached on port {}", reached, port);
                warn!(
                    "Ideally all {} should be reachable for HA purpose on port {}. Continuing...",
                    total, port
                );
            }
            ReachabilityTier::None => {
                error!("Not any of {} endpoints can be reached on port {}", total, port);
                error!("Looks like this host does not reach the public network");
                error!("Public network connectivity (direct or proxy) is required for remote code load");
                return Err(RclError::Unreachable { total, port });
            }
        }
        Ok(tier)
    }
}

/// Run `check` for every endpoint on its own thread and count successes.
///
/// The caller's span and subscriber are carried into each thread.
fn fan_out<F>(endpoints: &[&str], check: F) -> usize
where
    F: Fn(&str) -> bool + Sync,
{
    let dispatch = tracing::dispatcher::get_default(|d| d.clone());
    let span = Span::current();
    thread::scope(|s| {
        let handles: Vec<_> = endpoints
            .iter()
            .map(|&endpoint| {
                let check = &check;
                let dispatch = &dispatch;
                let span = &span;
                s.spawn(move || {
                    tracing::dispatcher::with_default(dispatch, || {
                        span.in_scope(|| check(endpoint))
                    })
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or(false))
            .filter(|ok| *ok)
            .count()
    })
}
