//! Topology, netblock and naming gate tests

mod common;

use common::{FakeInterfaces, FakeResolver, CAMPUS_IP, RAS_IP};
use rcl_common::network::{
    check_netblock, is_valid_fqdn, Binding, InterfaceSource, Netblock, NetworkTopology,
    NetworkTopologyResolver, Role,
};
use rcl_common::schema::{Configuration, CONTAINER_NAME};
use rcl_common::RclError;
use std::cell::Cell;
use std::io;
use std::net::Ipv4Addr;

/// One interface whose addresses cannot be read; counts enumerations
#[derive(Default)]
struct UnreadableInterface {
    enumerations: Cell<usize>,
}

impl InterfaceSource for UnreadableInterface {
    fn interface_names(&self) -> io::Result<Vec<String>> {
        self.enumerations.set(self.enumerations.get() + 1);
        Ok(vec!["virbr1".to_string()])
    }

    fn ipv4_address(&self, _name: &str) -> io::Result<Option<Ipv4Addr>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
    }
}

#[test]
fn test_netblock_membership() {
    assert!(check_netblock("10.23.16.1", Netblock::Management.cidr()));
    assert!(check_netblock("10.23.16.7", "10.23.16.0/29"));
    assert!(!check_netblock("10.23.16.8", "10.23.16.0/29"));
    assert!(check_netblock("10.88.3.4", Netblock::ContainerNetwork.cidr()));
    assert!(check_netblock("10.111.222.101", Netblock::Service.cidr()));
}

#[test]
fn test_netblock_never_raises_on_bad_input() {
    assert!(!check_netblock("not-an-ip", "10.23.16.0/29"));
    assert!(!check_netblock("10.23.16.1", "10.23.16.0/33"));
    assert!(!check_netblock("", ""));
}

#[test]
fn test_fqdn_grammar() {
    assert!(is_valid_fqdn("host", "example.com"));
    assert!(is_valid_fqdn(CONTAINER_NAME, "gpfs.local"));
    assert!(is_valid_fqdn("anyhost", "com"));
    assert!(!is_valid_fqdn("host.", "com"));
    assert!(!is_valid_fqdn("-host", "com"));
    assert!(!is_valid_fqdn("host", "c"));
}

#[test]
fn test_literal_address_passes_through() {
    let interfaces = FakeInterfaces::default();
    let resolver = FakeResolver::default();
    let topology = NetworkTopologyResolver::new(&interfaces, &resolver);

    let binding = topology.resolve_binding("10.23.16.1", Role::Ras).unwrap();
    assert_eq!(binding, Binding::Address(RAS_IP));
}

#[test]
fn test_missing_interface() {
    let interfaces = FakeInterfaces::healthy();
    let resolver = FakeResolver::default();
    let topology = NetworkTopologyResolver::new(&interfaces, &resolver);

    let err = topology.require_address("eth9", Role::Campus).unwrap_err();
    assert!(matches!(err, RclError::InterfaceMissing { role: Role::Campus, .. }));
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn test_unbound_interface() {
    let interfaces = FakeInterfaces::healthy().with("virbr1", None);
    let resolver = FakeResolver::default();
    let topology = NetworkTopologyResolver::new(&interfaces, &resolver);

    assert_eq!(
        topology.resolve_binding("virbr1", Role::Ras).unwrap(),
        Binding::Unbound
    );
    let err = topology.require_address("virbr1", Role::Ras).unwrap_err();
    assert!(matches!(err, RclError::InterfaceUnbound { role: Role::Ras, .. }));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn test_resolve_topology() {
    let interfaces = FakeInterfaces::healthy();
    let resolver = FakeResolver::default();
    let topology = NetworkTopologyResolver::new(&interfaces, &resolver);

    let cfg: Configuration = [("CAMPUS_INTERFACE", "campus"), ("RAS_INTERFACE", "virbr1")]
        .into_iter()
        .collect();
    assert_eq!(
        topology.resolve_topology(&cfg).unwrap(),
        NetworkTopology {
            campus: CAMPUS_IP,
            ras: RAS_IP
        }
    );
}

#[test]
fn test_topology_without_interface_keys() {
    let interfaces = FakeInterfaces::healthy();
    let resolver = FakeResolver::default();
    let topology = NetworkTopologyResolver::new(&interfaces, &resolver);

    let cfg: Configuration = [("RAS_INTERFACE", "virbr1")].into_iter().collect();
    let err = topology.resolve_topology(&cfg).unwrap_err();
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn test_ras_address() {
    let interfaces = FakeInterfaces::default();
    let resolver = FakeResolver::default();
    let topology = NetworkTopologyResolver::new(&interfaces, &resolver);

    assert!(topology.check_ras_address("10.23.16.1").is_ok());
    // In the netblock but not the bridge address
    assert_eq!(topology.check_ras_address("10.23.16.2").unwrap_err().exit_code(), 7);
    assert_eq!(topology.check_ras_address("192.168.1.1").unwrap_err().exit_code(), 7);
    assert_eq!(topology.check_ras_address("garbage").unwrap_err().exit_code(), 7);
}

#[test]
fn test_unresolvable_container_name() {
    let interfaces = FakeInterfaces::default();
    let resolver = FakeResolver::default();
    let topology = NetworkTopologyResolver::new(&interfaces, &resolver);

    assert!(topology
        .check_container_not_resolvable(CONTAINER_NAME, "example.com")
        .is_ok());
}

#[test]
fn test_container_name_in_container_network_is_tolerated() {
    let interfaces = FakeInterfaces::default();
    let resolver = FakeResolver::default().with(CONTAINER_NAME, Ipv4Addr::new(10, 88, 0, 5));
    let topology = NetworkTopologyResolver::new(&interfaces, &resolver);

    assert!(topology
        .check_container_not_resolvable(CONTAINER_NAME, "example.com")
        .is_ok());
}

#[test]
fn test_container_name_collision() {
    let interfaces = FakeInterfaces::default();
    let long_name = format!("{}.example.com", CONTAINER_NAME);
    let resolver = FakeResolver::default().with(&long_name, Ipv4Addr::new(192, 168, 100, 50));
    let topology = NetworkTopologyResolver::new(&interfaces, &resolver);

    let err = topology
        .check_container_not_resolvable(CONTAINER_NAME, "example.com")
        .unwrap_err();
    assert!(matches!(err, RclError::NamingCollision(_)));
    assert_eq!(err.exit_code(), 51);
}

#[test]
fn test_unreadable_interface_is_unbound() {
    let interfaces = UnreadableInterface::default();
    let resolver = FakeResolver::default();
    let topology = NetworkTopologyResolver::new(&interfaces, &resolver);

    let err = topology.require_address("virbr1", Role::Ras).unwrap_err();
    assert!(matches!(err, RclError::InterfaceUnbound { role: Role::Ras, .. }));
    assert_eq!(err.exit_code(), 4);
    // Existence is decided once, while resolving the binding
    assert_eq!(interfaces.enumerations.get(), 1);
}
