// ── MAC addresses ──

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MAC address, normalized to lowercase colon-separated format (aa:bb:cc:dd:ee:ff).
///
/// Accepts colon-, dash- or dot-separated input as well as bare hex. Input
/// that does not contain exactly twelve hex digits is kept lower-cased but
/// otherwise verbatim, so odd source data still compares stably.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let lowered = raw.as_ref().trim().to_lowercase();
        let digits: String = lowered
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .collect();

        if digits.len() == 12 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            let octets: Vec<&str> = (0..6).filter_map(|i| digits.get(i * 2..i * 2 + 2)).collect();
            Self(octets.join(":"))
        } else {
            Self(lowered)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dashes() {
        assert_eq!(MacAddress::new("AA-BB-CC-DD-EE-FF").as_str(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn normalizes_cisco_dotted() {
        assert_eq!(MacAddress::new("0011.2233.4455").as_str(), "00:11:22:33:44:55");
    }

    #[test]
    fn normalizes_bare_hex() {
        assert_eq!(MacAddress::new("001122AABBCC").as_str(), "00:11:22:aa:bb:cc");
    }

    #[test]
    fn keeps_unparseable_input_lowercased() {
        assert_eq!(MacAddress::new(" NOT-A-MAC ").as_str(), "not-a-mac");
    }
}
