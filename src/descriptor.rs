//! Connection descriptor
//!
//! Normalized, immutable description of one AWS site-to-site VPN connection:
//! exactly two redundant IPSec tunnels, each with its outside endpoints,
//! pre-shared key, optional inside (/30) addressing, and optional BGP
//! peering parameters. Constructed once per invocation, handed to exactly
//! one renderer, then discarded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

use crate::error::{ConfgenError, ConfgenResult};
use crate::validation;

/// Name used when the source data carries no usable name tag
pub const DEFAULT_CONNECTION_NAME: &str = "aws-vpn";

fn default_hold_time() -> u16 {
    30
}

/// IKE (phase 1) proposal parameters for one tunnel
///
/// Values are pre-normalized to the form the IPSec daemons expect
/// (e.g. "aes128", not AWS's "aes-128-cbc"); defaults match what AWS
/// provisions for a new connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IkeSpec {
    pub encryption: String,
    pub authentication: String,
    pub lifetime_secs: u32,
    pub pfs_group: String,
    pub mode: String,
}

impl Default for IkeSpec {
    fn default() -> Self {
        Self {
            encryption: "aes128".to_string(),
            authentication: "sha1".to_string(),
            lifetime_secs: 28800,
            pfs_group: "2".to_string(),
            mode: "main".to_string(),
        }
    }
}

/// IPSec (phase 2) proposal parameters for one tunnel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IpsecSpec {
    pub encryption: String,
    pub authentication: String,
    pub lifetime_secs: u32,
    pub pfs_group: String,
}

impl Default for IpsecSpec {
    fn default() -> Self {
        Self {
            encryption: "aes128".to_string(),
            authentication: "hmac_sha1".to_string(),
            lifetime_secs: 3600,
            pfs_group: "2".to_string(),
        }
    }
}

/// BGP peering parameters for one tunnel
///
/// Either fully populated or absent from the tunnel; a partially filled
/// record never reaches a renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BgpConfig {
    /// Customer gateway ASN (`router bgp` / `local as`)
    pub local_asn: u32,
    /// VPN gateway ASN (`remote-as` / `neighbor ... as`)
    pub peer_asn: u32,
    /// Customer-side inside address the session binds to
    pub local_ip: String,
    /// AWS-side inside address of the neighbor
    pub peer_ip: String,
    #[serde(default = "default_hold_time")]
    pub hold_time: u16,
}

/// Inside (/30) addressing of a route-based tunnel interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsideCidr {
    /// Customer gateway inside address (becomes the VTI interface address)
    pub customer_address: String,
    /// VPN gateway inside address (the far end of the /30)
    pub vpn_address: String,
    pub prefix_len: u8,
}

impl InsideCidr {
    /// Derive both inside addresses from the tunnel-interior network.
    ///
    /// AWS numbers every inside /30 the same way: the VPN gateway takes the
    /// first host address, the customer gateway the second.
    pub fn from_network(cidr: &str) -> ConfgenResult<Self> {
        validation::validate_cidr(cidr)?;

        let (ip, prefix) = cidr.split_once('/').ok_or_else(|| {
            ConfgenError::MalformedDescriptor(format!("invalid inside CIDR: {}", cidr))
        })?;
        let prefix_len: u8 = prefix.parse().map_err(|_| {
            ConfgenError::MalformedDescriptor(format!("invalid inside CIDR: {}", cidr))
        })?;
        if prefix_len > 30 {
            return Err(ConfgenError::MalformedDescriptor(format!(
                "inside CIDR {} leaves no room for two host addresses",
                cidr
            )));
        }

        let network: Ipv4Addr = ip.parse().map_err(|_| {
            ConfgenError::MalformedDescriptor(format!("invalid inside CIDR: {}", cidr))
        })?;
        let base = u32::from(network);
        let customer = base.checked_add(2).ok_or_else(|| {
            ConfgenError::MalformedDescriptor(format!(
                "inside CIDR {} leaves no room for two host addresses",
                cidr
            ))
        })?;

        Ok(Self {
            vpn_address: Ipv4Addr::from(base + 1).to_string(),
            customer_address: Ipv4Addr::from(customer).to_string(),
            prefix_len,
        })
    }

    /// Customer-side interface address in prefix notation
    pub fn customer_cidr(&self) -> String {
        format!("{}/{}", self.customer_address, self.prefix_len)
    }

    /// AWS-side address in prefix notation
    pub fn vpn_cidr(&self) -> String {
        format!("{}/{}", self.vpn_address, self.prefix_len)
    }
}

/// One of the two redundant IPSec tunnels of a connection
#[derive(Clone, Serialize, Deserialize)]
pub struct Tunnel {
    /// Customer gateway outside address
    pub customer_gateway_ip: String,
    /// VPN gateway outside address
    pub vpn_gateway_ip: String,
    /// Opaque secret, rendered byte-for-byte, never logged
    pub pre_shared_key: String,
    /// Tunnel-interior addressing; absent for policy-based rendering
    pub inside_cidr: Option<InsideCidr>,
    /// BGP peering parameters; absent on statically routed connections
    pub bgp: Option<BgpConfig>,
    #[serde(default)]
    pub ike: IkeSpec,
    #[serde(default)]
    pub ipsec: IpsecSpec,
}

// Manual Debug: the pre-shared key must never reach log output
impl fmt::Debug for Tunnel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tunnel")
            .field("customer_gateway_ip", &self.customer_gateway_ip)
            .field("vpn_gateway_ip", &self.vpn_gateway_ip)
            .field("pre_shared_key", &"<redacted>")
            .field("inside_cidr", &self.inside_cidr)
            .field("bgp", &self.bgp)
            .finish()
    }
}

/// Normalized description of one AWS site-to-site VPN connection
///
/// Invariants enforced at construction:
/// - exactly two tunnels, in AWS tunnel order
/// - BGP parameters present on both tunnels or on neither
/// - endpoint addresses parse as IPv4, pre-shared keys are non-empty
#[derive(Debug, Clone, Serialize)]
pub struct VpnConnection {
    name: String,
    tunnels: Vec<Tunnel>,
    bgp_enabled: bool,
    vpc_cidr: Option<String>,
    local_cidr: Option<String>,
}

// Prefix a validation failure with the tunnel it came from
fn check(label: &str, result: ConfgenResult<()>) -> ConfgenResult<()> {
    result.map_err(|e| match e {
        ConfgenError::MalformedDescriptor(msg) => {
            ConfgenError::MalformedDescriptor(format!("{}: {}", label, msg))
        }
        other => other,
    })
}

impl VpnConnection {
    pub fn new(
        name: &str,
        tunnels: Vec<Tunnel>,
        vpc_cidr: Option<String>,
        local_cidr: Option<String>,
    ) -> ConfgenResult<Self> {
        if tunnels.len() != 2 {
            return Err(ConfgenError::MalformedDescriptor(format!(
                "a VPN connection has exactly two tunnels, got {}",
                tunnels.len()
            )));
        }

        for (i, tunnel) in tunnels.iter().enumerate() {
            let label = format!("tunnel {}", i + 1);

            check(&label, validation::validate_endpoint_ip(&tunnel.customer_gateway_ip))?;
            check(&label, validation::validate_endpoint_ip(&tunnel.vpn_gateway_ip))?;

            if tunnel.pre_shared_key.is_empty() {
                return Err(ConfgenError::MalformedDescriptor(format!(
                    "{}: pre-shared key cannot be empty",
                    label
                )));
            }

            if let Some(bgp) = &tunnel.bgp {
                check(&label, validation::validate_asn(bgp.local_asn))?;
                check(&label, validation::validate_asn(bgp.peer_asn))?;
                check(&label, validation::validate_endpoint_ip(&bgp.local_ip))?;
                check(&label, validation::validate_endpoint_ip(&bgp.peer_ip))?;
            }
        }

        // BGP is a property of the whole connection: both tunnels peer or neither does
        let bgp_count = tunnels.iter().filter(|t| t.bgp.is_some()).count();
        let bgp_enabled = match bgp_count {
            0 => false,
            2 => true,
            _ => {
                return Err(ConfgenError::MalformedDescriptor(
                    "BGP parameters present on one tunnel but not the other".to_string(),
                ))
            }
        };

        if let Some(cidr) = &vpc_cidr {
            validation::validate_cidr(cidr)?;
        }
        if let Some(cidr) = &local_cidr {
            validation::validate_cidr(cidr)?;
        }

        let mut name = validation::sanitize_name(name);
        if name.is_empty() {
            name = DEFAULT_CONNECTION_NAME.to_string();
        }

        Ok(Self {
            name,
            tunnels,
            bgp_enabled,
            vpc_cidr,
            local_cidr,
        })
    }

    /// Sanitized connection name, safe for daemon section names
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Both tunnels, always in AWS tunnel order (tunnel 1 first)
    pub fn tunnels(&self) -> &[Tunnel] {
        &self.tunnels
    }

    pub fn bgp_enabled(&self) -> bool {
        self.bgp_enabled
    }

    /// VPC CIDR block behind the VPN gateway, when known
    pub fn vpc_cidr(&self) -> Option<&str> {
        self.vpc_cidr.as_deref()
    }

    /// On-premises network, when known
    pub fn local_cidr(&self) -> Option<&str> {
        self.local_cidr.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tunnel(cgw: &str, vgw: &str, psk: &str) -> Tunnel {
        Tunnel {
            customer_gateway_ip: cgw.to_string(),
            vpn_gateway_ip: vgw.to_string(),
            pre_shared_key: psk.to_string(),
            inside_cidr: None,
            bgp: None,
            ike: IkeSpec::default(),
            ipsec: IpsecSpec::default(),
        }
    }

    fn bgp(local_asn: u32, peer_asn: u32, local_ip: &str, peer_ip: &str) -> BgpConfig {
        BgpConfig {
            local_asn,
            peer_asn,
            local_ip: local_ip.to_string(),
            peer_ip: peer_ip.to_string(),
            hold_time: 30,
        }
    }

    #[test]
    fn test_exactly_two_tunnels() {
        let t = tunnel("203.0.113.1", "203.0.113.2", "abc123");

        assert!(VpnConnection::new("vpn", vec![t.clone(), t.clone()], None, None).is_ok());
        assert!(VpnConnection::new("vpn", vec![], None, None).is_err());
        assert!(VpnConnection::new("vpn", vec![t.clone()], None, None).is_err());
        assert!(VpnConnection::new("vpn", vec![t.clone(), t.clone(), t], None, None).is_err());
    }

    #[test]
    fn test_rejects_bad_fields() {
        let good = tunnel("203.0.113.1", "203.0.113.2", "abc123");

        let mut bad_ip = good.clone();
        bad_ip.vpn_gateway_ip = "not-an-ip".to_string();
        assert!(VpnConnection::new("vpn", vec![good.clone(), bad_ip], None, None).is_err());

        let mut empty_psk = good.clone();
        empty_psk.pre_shared_key = String::new();
        assert!(VpnConnection::new("vpn", vec![good.clone(), empty_psk], None, None).is_err());

        assert!(VpnConnection::new(
            "vpn",
            vec![good.clone(), good.clone()],
            Some("300.0.0.0/16".to_string()),
            None
        )
        .is_err());
    }

    #[test]
    fn test_bgp_all_or_nothing() {
        let plain = tunnel("203.0.113.1", "203.0.113.2", "abc123");
        let mut peered = tunnel("203.0.113.5", "203.0.113.6", "def456");
        peered.bgp = Some(bgp(65000, 7224, "169.254.10.2", "169.254.10.1"));

        // One tunnel with BGP, one without: structural violation
        let err = VpnConnection::new("vpn", vec![plain.clone(), peered.clone()], None, None);
        assert!(matches!(err, Err(ConfgenError::MalformedDescriptor(_))));

        let mut peered2 = plain.clone();
        peered2.bgp = Some(bgp(65000, 7224, "169.254.20.2", "169.254.20.1"));
        let conn = VpnConnection::new("vpn", vec![peered, peered2], None, None).unwrap();
        assert!(conn.bgp_enabled());

        let conn = VpnConnection::new("vpn", vec![plain.clone(), plain], None, None).unwrap();
        assert!(!conn.bgp_enabled());
    }

    #[test]
    fn test_inside_cidr_from_network() {
        let inside = InsideCidr::from_network("169.254.10.0/30").unwrap();
        assert_eq!(inside.vpn_address, "169.254.10.1");
        assert_eq!(inside.customer_address, "169.254.10.2");
        assert_eq!(inside.customer_cidr(), "169.254.10.2/30");
        assert_eq!(inside.vpn_cidr(), "169.254.10.1/30");

        assert!(InsideCidr::from_network("169.254.10.0/31").is_err());
        assert!(InsideCidr::from_network("169.254.10.0").is_err());
    }

    #[test]
    fn test_name_defaulting() {
        let t = tunnel("203.0.113.1", "203.0.113.2", "abc123");
        let conn =
            VpnConnection::new("  ", vec![t.clone(), t.clone()], None, None).unwrap();
        assert_eq!(conn.name(), DEFAULT_CONNECTION_NAME);

        let conn =
            VpnConnection::new("Corp VPN #1", vec![t.clone(), t], None, None).unwrap();
        assert_eq!(conn.name(), "Corp-VPN-1");
    }

    #[test]
    fn test_psk_not_in_debug_output() {
        let t = tunnel("203.0.113.1", "203.0.113.2", "s3cr3t-psk");
        let debug = format!("{:?}", t);
        assert!(!debug.contains("s3cr3t-psk"));
        assert!(debug.contains("<redacted>"));
    }
}
