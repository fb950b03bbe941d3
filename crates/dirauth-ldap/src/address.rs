//! Directory server addresses

use dirauth_core::DEFAULT_LDAP_PORT;
use std::fmt;
use std::str::FromStr;

/// A `host[:port]` directory endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `ldap://host:port` form used to open connections
    pub fn url(&self) -> String {
        format!("ldap://{}:{}", self.host, self.port)
    }
}

impl FromStr for ServerAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = match s.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|e| format!("invalid port in server address '{}': {}", s, e))?;
                (host, port)
            }
            None => (s, DEFAULT_LDAP_PORT),
        };

        if host.is_empty() {
            return Err(format!("missing host in server address '{}'", s));
        }

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        let addr: ServerAddress = "dc1.corp.example".parse().unwrap();
        assert_eq!(addr, ServerAddress::new("dc1.corp.example", 389));
        assert_eq!(addr.url(), "ldap://dc1.corp.example:389");
    }

    #[test]
    fn test_explicit_port() {
        let addr: ServerAddress = "dc2.corp.example:3268".parse().unwrap();
        assert_eq!(addr.host, "dc2.corp.example");
        assert_eq!(addr.port, 3268);
        assert_eq!(addr.to_string(), "dc2.corp.example:3268");
    }

    #[test]
    fn test_invalid_addresses() {
        assert!("dc1:notaport".parse::<ServerAddress>().is_err());
        assert!("dc1:70000".parse::<ServerAddress>().is_err());
        assert!(":389".parse::<ServerAddress>().is_err());
    }
}
