use crate::utils::error::{Result, ScanError};
use serde::Serialize;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Ports the legacy scanner probed when none are configured.
pub const DEFAULT_PORTS: [u16; 4] = [8888, 8889, 8890, 30000];

/// Filename used when every match shares one artifact.
pub const SHARED_ARTIFACT_NAME: &str = "jupyter_lab_banner.ico";

/// Inclusive IPv4 range, always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    start: Ipv4Addr,
    end: Ipv4Addr,
}

impl AddressRange {
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Result<Self> {
        if start > end {
            return Err(ScanError::parse(
                format!("{}-{}", start, end),
                "start address is greater than end address",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn single(address: Ipv4Addr) -> Self {
        Self {
            start: address,
            end: address,
        }
    }

    /// Parses `"<ipv4>-<ipv4>"`; whitespace around either side is ignored.
    pub fn parse(text: &str) -> Result<Self> {
        let (start, end) = text
            .split_once('-')
            .ok_or_else(|| ScanError::parse(text, "expected the form start_ip-end_ip"))?;

        let start = parse_ipv4(text, start.trim(), "start")?;
        let end = parse_ipv4(text, end.trim(), "end")?;

        if start > end {
            return Err(ScanError::parse(
                text,
                "start address is greater than end address",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Ipv4Addr {
        self.start
    }

    pub fn end(&self) -> Ipv4Addr {
        self.end
    }

    /// Number of addresses in the range. The full IPv4 space holds 2^32
    /// addresses, which is why this is a `u64`.
    pub fn len(&self) -> u64 {
        u64::from(u32::from(self.end)) - u64::from(u32::from(self.start)) + 1
    }

    /// Always false, a range holds at least one address.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Ascending walk from `start` to `end`. `RangeInclusive` stops at the
    /// last element without computing its successor, so `255.255.255.255`
    /// does not overflow. Each call starts over.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Ipv4Addr> + Clone {
        let start = u32::from(self.start);
        let end = u32::from(self.end);
        (start..=end).map(Ipv4Addr::from)
    }

    /// Address-major cross product of the range with `ports`.
    pub fn probe_targets<'a>(&self, ports: &'a [u16]) -> impl Iterator<Item = ProbeTarget> + 'a {
        self.iter().flat_map(move |address| {
            ports
                .iter()
                .map(move |&port| ProbeTarget::new(address, port))
        })
    }
}

fn parse_ipv4(input: &str, side: &str, label: &str) -> Result<Ipv4Addr> {
    side.parse::<Ipv4Addr>().map_err(|e| {
        ScanError::parse(input, format!("invalid {} address '{}': {}", label, side, e))
    })
}

impl FromStr for AddressRange {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProbeTarget {
    pub address: Ipv4Addr,
    pub port: u16,
}

impl ProbeTarget {
    pub fn new(address: Ipv4Addr, port: u16) -> Self {
        Self { address, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.address, self.port))
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Result of probing one target. `ArtifactSaved` implies the service was
/// detected as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeOutcome {
    NoService,
    ServiceDetected {
        address: Ipv4Addr,
        port: u16,
    },
    ArtifactSaved {
        address: Ipv4Addr,
        port: u16,
        path: PathBuf,
    },
}

impl ProbeOutcome {
    pub fn detected(target: ProbeTarget) -> Self {
        Self::ServiceDetected {
            address: target.address,
            port: target.port,
        }
    }

    pub fn saved(target: ProbeTarget, path: PathBuf) -> Self {
        Self::ArtifactSaved {
            address: target.address,
            port: target.port,
            path,
        }
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, ProbeOutcome::NoService)
    }

    pub fn artifact_path(&self) -> Option<&PathBuf> {
        match self {
            ProbeOutcome::ArtifactSaved { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub scanned: u64,
    pub matched: u64,
    pub artifacts_saved: u64,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

impl ScanSummary {
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        self.scanned += 1;
        if outcome.is_match() {
            self.matched += 1;
        }
        if outcome.artifact_path().is_some() {
            self.artifacts_saved += 1;
        }
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}

/// Where favicon artifacts land.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactMode {
    /// One `jupyter_lab_banner.ico`, overwritten by every match.
    Shared,
    /// One file per matching target.
    #[default]
    PerTarget,
}

impl ArtifactMode {
    pub fn file_name(&self, target: &ProbeTarget) -> String {
        match self {
            ArtifactMode::Shared => SHARED_ARTIFACT_NAME.to_string(),
            ArtifactMode::PerTarget => {
                format!("jupyter_lab_banner_{}_{}.ico", target.address, target.port)
            }
        }
    }
}
