//! TCP listen address used by the NETCONF listener.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Host and port the listener binds to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ListenAddress {
    host: String,
    port: u16,
}

impl ListenAddress {
    /// Builds a listen address from its parts.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or IP literal to bind.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port to bind; `0` requests an ephemeral port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ListenAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(formatter, "[{}]:{}", self.host, self.port)
        } else {
            write!(formatter, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for ListenAddress {
    type Err = ListenAddressParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let Some((host, port)) = trimmed.rsplit_once(':') else {
            return Err(ListenAddressParseError::MissingPort(trimmed.to_owned()));
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(ListenAddressParseError::MissingHost(trimmed.to_owned()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|source| ListenAddressParseError::InvalidPort {
                input: trimmed.to_owned(),
                source,
            })?;
        Ok(Self::new(host, port))
    }
}

impl TryFrom<String> for ListenAddress {
    type Error = ListenAddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ListenAddress> for String {
    fn from(value: ListenAddress) -> Self {
        value.to_string()
    }
}

/// Errors encountered while parsing a [`ListenAddress`] from text.
#[derive(Debug, Error)]
pub enum ListenAddressParseError {
    /// No `:port` suffix was present.
    #[error("missing port in listen address '{0}'")]
    MissingPort(String),
    /// The host component was empty.
    #[error("missing host in listen address '{0}'")]
    MissingHost(String),
    /// The port component was not a valid TCP port.
    #[error("invalid port in listen address '{input}': {source}")]
    InvalidPort {
        /// Address that failed to parse.
        input: String,
        /// Underlying integer parse failure.
        #[source]
        source: std::num::ParseIntError,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("0.0.0.0:2052", "0.0.0.0", 2052)]
    #[case("localhost:830", "localhost", 830)]
    #[case("[::1]:2052", "::1", 2052)]
    fn parses_host_and_port(#[case] input: &str, #[case] host: &str, #[case] port: u16) {
        let address: ListenAddress = input.parse().expect("address should parse");
        assert_eq!(address.host(), host);
        assert_eq!(address.port(), port);
    }

    #[test]
    fn displays_ipv6_hosts_in_brackets() {
        let address = ListenAddress::new("::1", 830);
        assert_eq!(address.to_string(), "[::1]:830");
    }

    #[rstest]
    #[case("localhost")]
    #[case(":2052")]
    #[case("localhost:netconf")]
    #[case("localhost:70000")]
    fn rejects_malformed_addresses(#[case] input: &str) {
        assert!(input.parse::<ListenAddress>().is_err(), "{input} should fail");
    }
}
