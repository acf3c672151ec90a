//! URL string construction.

/// Builds `protocol://host[:port]/path[.extension]` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    pub host: String,
    pub protocol: String,
    pub extension: Option<String>,
    pub port: Option<u16>,
}

impl Default for UrlBuilder {
    fn default() -> Self {
        Self {
            host: "httpbin.org".to_string(),
            protocol: "https".to_string(),
            extension: None,
            port: None,
        }
    }
}

impl UrlBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// URL for `resource_path`; a leading `/` is added when missing.
    pub fn build(&self, resource_path: &str) -> String {
        let mut path = String::with_capacity(resource_path.len() + 1);
        if !resource_path.starts_with('/') {
            path.push('/');
        }
        path.push_str(resource_path);

        if let Some(ref extension) = self.extension {
            path.push('.');
            path.push_str(extension);
        }

        match self.port {
            Some(port) => format!("{}://{}:{}{}", self.protocol, self.host, port, path),
            None => format!("{}://{}{}", self.protocol, self.host, path),
        }
    }
}
