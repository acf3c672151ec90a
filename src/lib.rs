//! raw-http: a minimal HTTP/1.x client over raw TCP sockets
//!
//! - `connection`: connect directly or through the local proxy
//! - `transport`: line and byte primitives over the stream
//! - `response`: status line, headers, and body framing by
//!   Content-Length or connection close
//!
//! Supporting modules:
//! - `config`: CLI arguments and TOML configuration
//! - `display`: text and JSON formatting for printing responses
//! - `url`: URL string construction
//! - `creds`: JSON credential file access
//!
//! ```no_run
//! use raw_http::connection::{Connector, Target};
//!
//! let connector = Connector::default();
//! let mut handle = connector
//!     .connect(&Target::new("example.com"), false)
//!     .expect("connect failed");
//! handle.send_normalized("GET / HTTP/1.1\nHost: example.com\nConnection: close\n")?;
//! handle.send_crlf()?;
//! let response = handle.read_response(true)?;
//! handle.close()?;
//! print!("{}", response);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod connection;
pub mod creds;
pub mod display;
pub mod response;
pub mod transport;
pub mod url;

pub use connection::{Connector, Handle, Target};
pub use response::{read_response, FrameError, Header};
pub use transport::TransportError;
