//! Transport-neutral channel endpoints for the ack and timing channels.

use std::fmt;

/// Where an outbound message channel (ack or timing) is connected to.
/// Deliberately transport-neutral: the core only needs to know how to
/// name the destination, not how to speak to it; the actual transport is
/// wired up by the host binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp { host: String, port: u16 },
    UnixSocket { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointParseError(pub String);

impl fmt::Display for EndpointParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid endpoint URI: {}", self.0)
    }
}

impl std::error::Error for EndpointParseError {}

impl Endpoint {
    /// Parse a `tcp://host:port` or `unix:///path/to/socket` URI.
    pub fn parse(uri: &str) -> Result<Self, EndpointParseError> {
        if let Some(rest) = uri.strip_prefix("tcp://") {
            let (host, port) = rest
                .rsplit_once(':')
                .ok_or_else(|| EndpointParseError(format!("missing port in '{}'", uri)))?;
            let port: u16 = port
                .parse()
                .map_err(|_| EndpointParseError(format!("invalid port in '{}'", uri)))?;
            Ok(Endpoint::Tcp { host: host.to_string(), port })
        } else if let Some(path) = uri.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(EndpointParseError(format!("empty unix socket path in '{}'", uri)));
            }
            Ok(Endpoint::UnixSocket { path: path.to_string() })
        } else {
            Err(EndpointParseError(format!("unrecognized scheme in '{}'", uri)))
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp { host, port } => write!(f, "tcp://{}:{}", host, port),
            Endpoint::UnixSocket { path } => write!(f, "unix://{}", path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tcp_endpoint() {
        assert_eq!(
            Endpoint::parse("tcp://127.0.0.1:9001").unwrap(),
            Endpoint::Tcp { host: "127.0.0.1".to_string(), port: 9001 }
        );
    }

    #[test]
    fn parses_unix_endpoint() {
        assert_eq!(
            Endpoint::parse("unix:///tmp/radar-ack.sock").unwrap(),
            Endpoint::UnixSocket { path: "/tmp/radar-ack.sock".to_string() }
        );
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(Endpoint::parse("http://example.com").is_err());
    }

    #[test]
    fn display_roundtrips_tcp() {
        let ep = Endpoint::Tcp { host: "10.0.0.5".to_string(), port: 4242 };
        assert_eq!(Endpoint::parse(&ep.to_string()).unwrap(), ep);
    }
}
