//! Connection establishment and the connected-stream handle.
//!
//! A `Handle` is either a direct TCP stream to the target or a proxy handle
//! holding a stream to the configured local proxy. The proxy never tunnels:
//! it only connects to the proxy address and remembers the requested target.
//!
//! All transport calls go through `Handle::stream_mut`, which unwraps either
//! variant to the underlying stream.

use socket2::{Domain, Protocol, Socket, Type};
use std::fmt;
use std::io::{self, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use tracing::{debug, warn};

use crate::config::ProxyConfig;
use crate::response::{self, FrameError};
use crate::transport::{self, TransportError};

/// Port used when a target does not name one.
pub const DEFAULT_PORT: u16 = 80;

/// A (host, port) endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    /// Target on the default HTTP port.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Opens connections, directly or through the local proxy.
#[derive(Debug, Clone, Default)]
pub struct Connector {
    proxy: ProxyConfig,
}

impl Connector {
    pub fn new(proxy: ProxyConfig) -> Self {
        Self { proxy }
    }

    /// Proxy endpoint this connector uses.
    pub fn proxy(&self) -> &ProxyConfig {
        &self.proxy
    }

    /// Connect to `target`, or to the proxy when `via_proxy` is set.
    ///
    /// A failed direct connection is logged and yields `None`. The proxy path
    /// always yields a handle; if the proxy connection failed, that handle
    /// has no stream and every transport call on it returns
    /// `TransportError::NotConnected`.
    pub fn connect(&self, target: &Target, via_proxy: bool) -> Option<Handle> {
        if via_proxy {
            return Some(Handle::Proxy(self.connect_proxy(target)));
        }

        match open_stream(&target.host, target.port) {
            Ok(stream) => {
                debug!(target = %target, "Connected");
                Some(Handle::Direct(stream))
            }
            Err(e) => {
                warn!(target = %target, error = %e, "Error connecting");
                None
            }
        }
    }

    fn connect_proxy(&self, target: &Target) -> ProxyHandle {
        let stream = match open_stream(&self.proxy.host, self.proxy.port) {
            Ok(stream) => {
                debug!(
                    proxy_host = %self.proxy.host,
                    proxy_port = self.proxy.port,
                    target = %target,
                    "Connected to proxy"
                );
                Some(stream)
            }
            Err(e) => {
                debug!(
                    proxy_host = %self.proxy.host,
                    proxy_port = self.proxy.port,
                    error = %e,
                    "Proxy connection failed"
                );
                None
            }
        };

        ProxyHandle {
            stream,
            target: target.clone(),
        }
    }
}

/// Connection to the local proxy.
#[derive(Debug)]
pub struct ProxyHandle {
    /// `None` when the proxy connection failed.
    stream: Option<TcpStream>,
    /// Requested endpoint. Recorded only, never used for routing.
    target: Target,
}

impl ProxyHandle {
    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// An owned, connected byte stream.
#[derive(Debug)]
pub enum Handle {
    Direct(TcpStream),
    Proxy(ProxyHandle),
}

impl Handle {
    /// Underlying stream of either variant.
    pub fn stream_mut(&mut self) -> Result<&mut TcpStream, TransportError> {
        match self {
            Handle::Direct(stream) => Ok(stream),
            Handle::Proxy(proxy) => proxy.stream.as_mut().ok_or(TransportError::NotConnected),
        }
    }

    pub fn is_connected(&self) -> bool {
        match self {
            Handle::Direct(_) => true,
            Handle::Proxy(proxy) => proxy.is_connected(),
        }
    }

    /// Address of the connected peer, if any.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match self {
            Handle::Direct(stream) => stream.peer_addr().ok(),
            Handle::Proxy(proxy) => proxy.stream.as_ref().and_then(|s| s.peer_addr().ok()),
        }
    }

    pub fn send_raw(&mut self, text: &str) -> Result<(), TransportError> {
        transport::send_raw(self.stream_mut()?, text)
    }

    pub fn send_normalized(&mut self, text: &str) -> Result<(), TransportError> {
        transport::send_normalized(self.stream_mut()?, text)
    }

    pub fn send_crlf(&mut self) -> Result<(), TransportError> {
        transport::send_crlf(self.stream_mut()?)
    }

    pub fn read_line(&mut self, strip_eol: bool) -> Result<String, TransportError> {
        transport::read_line(self.stream_mut()?, strip_eol)
    }

    pub fn read_sized(&mut self, size: usize, normalize_eol: bool) -> Result<String, TransportError> {
        transport::read_sized(self.stream_mut()?, size, normalize_eol)
    }

    pub fn read_until_close(&mut self, normalize_eol: bool) -> Result<String, TransportError> {
        transport::read_until_close(self.stream_mut()?, normalize_eol)
    }

    /// Read a full response: status line, headers, then the body.
    pub fn read_response(&mut self, normalize_eol: bool) -> Result<String, FrameError> {
        response::read_response(self.stream_mut()?, normalize_eol)
    }

    /// Shut down and release the stream.
    ///
    /// Closing a proxy handle that never connected is a no-op.
    pub fn close(mut self) -> io::Result<()> {
        let stream = match self.stream_mut() {
            Ok(stream) => stream,
            Err(_) => return Ok(()),
        };

        match stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != ErrorKind::NotConnected => Err(e),
            _ => {
                debug!("Connection closed");
                Ok(())
            }
        }
    }
}

/// Resolve `host` and connect to the first address that accepts.
fn open_stream(host: &str, port: u16) -> io::Result<TcpStream> {
    let mut last_err = None;

    for addr in (host, port).to_socket_addrs()? {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        match socket.connect(&addr.into()) {
            Ok(()) => {
                socket.set_nodelay(true)?;
                return Ok(socket.into());
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(ErrorKind::InvalidInput, "could not resolve to any address")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    /// Reserve a loopback port with nothing listening on it.
    fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_target_defaults() {
        let target = Target::new("example.com");
        assert_eq!(target.port, 80);
        assert_eq!(target.to_string(), "example.com:80");
        assert_eq!(target.with_port(8080).port, 8080);
    }

    #[test]
    fn test_default_connector_uses_fixed_proxy() {
        let connector = Connector::default();
        assert_eq!(connector.proxy().host, "127.0.0.1");
        assert_eq!(connector.proxy().port, 9999);
    }

    #[test]
    fn test_direct_connect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let connector = Connector::default();
        let handle = connector
            .connect(&Target::new("127.0.0.1").with_port(port), false)
            .unwrap();
        assert!(handle.is_connected());
        assert!(matches!(handle, Handle::Direct(_)));
        assert_eq!(handle.peer_addr().unwrap().port(), port);
        handle.close().unwrap();
    }

    #[test]
    fn test_direct_connect_failure() {
        let connector = Connector::default();
        let target = Target::new("127.0.0.1").with_port(closed_port());
        assert!(connector.connect(&target, false).is_none());
    }

    #[test]
    fn test_proxy_connects_to_proxy_not_target() {
        let proxy = TcpListener::bind("127.0.0.1:0").unwrap();
        let proxy_port = proxy.local_addr().unwrap().port();

        let connector = Connector::new(ProxyConfig {
            host: "127.0.0.1".to_string(),
            port: proxy_port,
        });
        // The target is unreachable; only the proxy is dialed.
        let target = Target::new("unreachable.invalid").with_port(1);
        let handle = connector.connect(&target, true).unwrap();

        assert!(handle.is_connected());
        assert_eq!(handle.peer_addr().unwrap().port(), proxy_port);
        match &handle {
            Handle::Proxy(proxy) => assert_eq!(proxy.target(), &target),
            other => panic!("unexpected: {:?}", other),
        }
        handle.close().unwrap();
    }

    #[test]
    fn test_proxy_failure_is_silent() {
        let connector = Connector::new(ProxyConfig {
            host: "127.0.0.1".to_string(),
            port: closed_port(),
        });
        let mut handle = connector
            .connect(&Target::new("example.com"), true)
            .unwrap();

        assert!(!handle.is_connected());
        assert!(handle.peer_addr().is_none());
        assert!(matches!(
            handle.send_raw("GET / HTTP/1.1\r\n"),
            Err(TransportError::NotConnected)
        ));
        assert!(matches!(
            handle.read_response(true),
            Err(FrameError::Transport(TransportError::NotConnected))
        ));
        handle.close().unwrap();
    }
}
