//! Host name resolution and TCP connect facilities.
//!
//! Both are traits so the gates can be exercised without a network.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// IPv4 name lookup, the equivalent of `gethostbyname`
pub trait Resolver: Sync {
    /// Resolve `name` to its IPv4 addresses. An empty answer is an error.
    fn resolve_ipv4(&self, name: &str) -> io::Result<Vec<Ipv4Addr>>;
}

/// Bounded TCP connect to `host:port`
pub trait Connector: Sync {
    fn connect(&self, host: &str, port: u16, timeout: Duration) -> io::Result<()>;
}

/// Resolver backed by the system's name service (hosts file and DNS)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve_ipv4(&self, name: &str) -> io::Result<Vec<Ipv4Addr>> {
        let v4: Vec<Ipv4Addr> = (name, 0u16)
            .to_socket_addrs()?
            .filter_map(|addr| match addr {
                SocketAddr::V4(v4) => Some(*v4.ip()),
                SocketAddr::V6(_) => None,
            })
            .collect();

        if v4.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} has no IPv4 address", name),
            ));
        }
        Ok(v4)
    }
}

/// Plain IPv4 TCP connector
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&self, host: &str, port: u16, timeout: Duration) -> io::Result<()> {
        let addr = (host, port)
            .to_socket_addrs()?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} has no IPv4 address", host),
                )
            })?;

        // Dropping the stream closes it; we only care that the handshake completed.
        TcpStream::connect_timeout(&addr, timeout).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_literal_address_resolves_to_itself() {
        let addrs = SystemResolver.resolve_ipv4("127.0.0.1").unwrap();
        assert_eq!(addrs, vec![Ipv4Addr::LOCALHOST]);
    }

    #[test]
    fn test_connect_to_listening_port() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(TcpConnector
            .connect("127.0.0.1", port, Duration::from_secs(3))
            .is_ok());
    }

    #[test]
    fn test_connect_to_closed_port_fails() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        assert!(TcpConnector
            .connect("127.0.0.1", port, Duration::from_secs(3))
            .is_err());
    }
}
