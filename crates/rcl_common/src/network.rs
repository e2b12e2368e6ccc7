//! Network topology resolution and address classification.
//!
//! Resolves the IPv4 address behind each role's interface, classifies
//! addresses against the fixed netblocks and guards the container name
//! against pre-existing DNS/hosts entries.

use crate::dns::Resolver;
use crate::error::{RclError, Result};
use crate::schema::{self, Configuration};
use ipnet::Ipv4Net;
use regex::Regex;
use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::OnceLock;
use tracing::{debug, error, warn};

/// Address the RAS bridge must carry
pub const RAS_IP: Ipv4Addr = Ipv4Addr::new(10, 23, 16, 1);

/// Fixed address blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Netblock {
    /// Service network of the appliance
    Service,
    /// Container network created by the runtime's default bridge
    ContainerNetwork,
    /// RAS management bridge
    Management,
}

impl Netblock {
    pub fn cidr(&self) -> &'static str {
        match self {
            Netblock::Service => "10.111.222.100/30",
            Netblock::ContainerNetwork => "10.88.0.0/16",
            Netblock::Management => "10.23.16.0/29",
        }
    }
}

impl fmt::Display for Netblock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cidr())
    }
}

/// Logical network role of an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Campus,
    Ras,
}

impl Role {
    /// Configuration field naming the interface for this role
    pub fn interface_key(&self) -> &'static str {
        match self {
            Role::Campus => schema::CAMPUS_INTERFACE,
            Role::Ras => schema::RAS_INTERFACE,
        }
    }

    /// Configuration field carrying the address for this role
    pub fn address_key(&self) -> &'static str {
        match self {
            Role::Campus => schema::CAMPUS_INTERFACE_IP,
            Role::Ras => schema::RAS_INTERFACE_IP,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Campus => f.write_str("CAMPUS"),
            Role::Ras => f.write_str("RAS"),
        }
    }
}

/// CIDR containment; anything that is not an IPv4 address is not a member
pub fn check_netblock(ip: &str, block: &str) -> bool {
    let Ok(net) = block.parse::<Ipv4Net>() else {
        warn!("Netblock {} is not a valid IPv4 CIDR", block);
        return false;
    };
    match ip.parse::<Ipv4Addr>() {
        Ok(addr) => {
            let is_in = net.contains(&addr);
            debug!(
                "IP {} {} to netblock {}",
                ip,
                if is_in { "belongs" } else { "does not belong" },
                block
            );
            is_in
        }
        Err(_) => {
            warn!("IP {} does not seem to have a correct IPv4 format", ip);
            false
        }
    }
}

/// True when `ip` is a well-formed IPv4 address
pub fn check_ipv4_format(ip: &str) -> bool {
    ip.parse::<Ipv4Addr>().is_ok()
}

fn fqdn_grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    // RFC 1035 labels with the RFC 3696 preferred top-level forms.
    GRAMMAR.get_or_init(|| {
        Regex::new(concat!(
            r"^(([a-zA-Z])|([a-zA-Z][a-zA-Z])|([a-zA-Z][0-9])|([0-9][a-zA-Z])|",
            r"([a-zA-Z0-9][-.a-zA-Z0-9]{0,61}[a-zA-Z0-9]))\.",
            r"([a-zA-Z]{2,13}|[a-zA-Z0-9-]{2,30}.[a-zA-Z]{2,3})$",
        ))
        .expect("FQDN grammar is a valid regex")
    })
}

/// Check `host.domain` against the preferred host name grammar
pub fn is_valid_fqdn(host: &str, domain: &str) -> bool {
    let fqdn = format!("{}.{}", host, domain);
    let ok = fqdn_grammar().is_match(&fqdn);
    if ok {
        debug!("FQDN {} aligns with the RFC1035/RFC3696 preferred format", fqdn);
    } else {
        error!("FQDN {} does not align with the RFC1035/RFC3696 preferred format", fqdn);
    }
    ok
}

/// Read-only view of the host's network interfaces
pub trait InterfaceSource {
    fn interface_names(&self) -> io::Result<Vec<String>>;

    /// First IPv4 address on `name`, if any
    fn ipv4_address(&self, name: &str) -> io::Result<Option<Ipv4Addr>>;
}

/// Interfaces as reported by getifaddrs(3)
#[derive(Debug, Default, Clone, Copy)]
pub struct HostInterfaces;

impl InterfaceSource for HostInterfaces {
    fn interface_names(&self) -> io::Result<Vec<String>> {
        let mut names: Vec<String> = nix::ifaddrs::getifaddrs()
            .map_err(io::Error::from)?
            .map(|ifaddr| ifaddr.interface_name)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn ipv4_address(&self, name: &str) -> io::Result<Option<Ipv4Addr>> {
        let addr = nix::ifaddrs::getifaddrs()
            .map_err(io::Error::from)?
            .filter(|ifaddr| ifaddr.interface_name == name)
            .find_map(|ifaddr| {
                let storage = ifaddr.address?;
                let sin = storage.as_sockaddr_in()?;
                Some(*SocketAddrV4::from(*sin).ip())
            });
        Ok(addr)
    }
}

/// Result of resolving one role's interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Address(Ipv4Addr),
    /// Interface exists but has no IPv4 address yet
    Unbound,
}

/// Addresses detected for both roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkTopology {
    pub campus: Ipv4Addr,
    pub ras: Ipv4Addr,
}

pub struct NetworkTopologyResolver<'a> {
    interfaces: &'a dyn InterfaceSource,
    resolver: &'a dyn Resolver,
}

impl<'a> NetworkTopologyResolver<'a> {
    pub fn new(interfaces: &'a dyn InterfaceSource, resolver: &'a dyn Resolver) -> Self {
        Self {
            interfaces,
            resolver,
        }
    }

    pub fn interface_exists(&self, name: &str) -> bool {
        debug!("Going to check if {} exists in this system", name);
        match self.interfaces.interface_names() {
            Ok(names) => {
                let exists = names.iter().any(|n| n == name);
                debug!(
                    "{} {} in this system",
                    name,
                    if exists { "exists" } else { "does not exist" }
                );
                exists
            }
            Err(e) => {
                warn!("Cannot enumerate interfaces: {}", e);
                false
            }
        }
    }

    /// Resolve the address for `role`.
    ///
    /// A literal IPv4 value passes through without a host lookup. A missing
    /// interface is fatal here; an interface without IPv4 is `Unbound`.
    pub fn resolve_binding(&self, interface_or_ip: &str, role: Role) -> Result<Binding> {
        if let Ok(literal) = interface_or_ip.parse::<Ipv4Addr>() {
            debug!("Using literal address {} for {}", literal, role);
            return Ok(Binding::Address(literal));
        }

        if !self.interface_exists(interface_or_ip) {
            let err = RclError::InterfaceMissing {
                interface: interface_or_ip.to_string(),
                role,
            };
            error!("{}", err);
            return Err(err);
        }

        debug!("Going to query for IP address of {}", interface_or_ip);
        match self.interfaces.ipv4_address(interface_or_ip) {
            Ok(Some(addr)) => {
                debug!("Main IP address of {} is {}", interface_or_ip, addr);
                Ok(Binding::Address(addr))
            }
            Ok(None) => {
                debug!("{} does not have any IPv4 address configured", interface_or_ip);
                Ok(Binding::Unbound)
            }
            Err(e) => {
                debug!("Cannot read addresses of {}: {}", interface_or_ip, e);
                Ok(Binding::Unbound)
            }
        }
    }

    /// Resolve the address for `role` or fail with a topology error
    pub fn require_address(&self, interface_or_ip: &str, role: Role) -> Result<Ipv4Addr> {
        match self.resolve_binding(interface_or_ip, role)? {
            Binding::Address(addr) => Ok(addr),
            Binding::Unbound => {
                // resolve_binding has already ruled out a missing interface
                debug!(
                    "{} interface exists but has no IPv4, likely a partially completed previous run",
                    role
                );
                let err = RclError::InterfaceUnbound {
                    interface: interface_or_ip.to_string(),
                    role,
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Resolve both roles from a validated configuration
    pub fn resolve_topology(&self, cfg: &Configuration) -> Result<NetworkTopology> {
        let campus = self.require_address(binding_source(cfg, Role::Campus)?, Role::Campus)?;
        let ras = self.require_address(binding_source(cfg, Role::Ras)?, Role::Ras)?;
        Ok(NetworkTopology { campus, ras })
    }

    /// The RAS address must sit in the management netblock and be exactly
    /// the expected bridge address
    pub fn check_ras_address(&self, ip: &str) -> Result<()> {
        debug!("Going to check if IP address of RAS interface is the expected one");
        let mismatch = || RclError::RasAddressMismatch {
            found: ip.to_string(),
            expected: RAS_IP.to_string(),
        };

        if !check_netblock(ip, Netblock::Management.cidr()) {
            error!(
                "Configured RAS IP {} does not belong to RAS netblock {}",
                ip,
                Netblock::Management
            );
            return Err(mismatch());
        }
        if ip != RAS_IP.to_string() {
            error!("Configured RAS IP {} is not {}", ip, RAS_IP);
            return Err(mismatch());
        }
        debug!("RAS IP is the expected one {}", RAS_IP);
        Ok(())
    }

    /// Neither the short nor the fully qualified container name may resolve,
    /// except into the container network created by the auto-bridge setup
    pub fn check_container_not_resolvable(&self, short_name: &str, domain: &str) -> Result<()> {
        let long_name = format!("{}.{}", short_name, domain);
        debug!(
            "Need to check that neither {} nor {} can be resolved on this auto bridge setup",
            short_name, long_name
        );

        let short_collides = self.name_collides(short_name);
        let long_collides = self.name_collides(&long_name);
        if short_collides || long_collides {
            let err = RclError::NamingCollision(short_name.to_string());
            error!("{}", err);
            return Err(err);
        }
        debug!("Container name cannot be resolved in this autobridge setup");
        Ok(())
    }

    fn name_collides(&self, name: &str) -> bool {
        let addr = match self.resolver.resolve_ipv4(name) {
            Ok(addrs) => match addrs.first() {
                Some(addr) => *addr,
                None => return false,
            },
            Err(_) => {
                debug!("The container name {} does not resolve any IP address", name);
                return false;
            }
        };

        debug!("The container name {} resolves to IP address {}", name, addr);
        if check_netblock(&addr.to_string(), Netblock::ContainerNetwork.cidr()) {
            debug!(
                "Although it resolves, {} is in the container netblock {} which is allowed",
                addr,
                Netblock::ContainerNetwork
            );
            false
        } else {
            error!("The container name {} resolves to IP address {}", name, addr);
            true
        }
    }
}

/// Interface name (or literal address) configured for `role`
fn binding_source(cfg: &Configuration, role: Role) -> Result<&str> {
    cfg.get(role.interface_key())
        .or_else(|| cfg.get(role.address_key()))
        .ok_or_else(|| RclError::InterfaceMissing {
            interface: role.interface_key().to_string(),
            role,
        })
}
