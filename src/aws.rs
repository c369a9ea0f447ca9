//! AWS VPN connection source parsing
//!
//! Turns the `CustomerGatewayConfiguration` XML document AWS attaches to
//! every site-to-site VPN connection (the same XML the console offers as a
//! download) into a connection descriptor. The `aws ec2
//! describe-vpn-connections` JSON envelope is accepted too; the XML is
//! embedded in it as a string. Fetching from the AWS API is the caller's
//! job, none of that happens here.

use serde::Deserialize;

use crate::descriptor::{
    BgpConfig, IkeSpec, InsideCidr, IpsecSpec, Tunnel, VpnConnection,
};
use crate::error::{ConfgenError, ConfgenResult};
use crate::validation;

/// Knobs the source document cannot provide itself
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Connection name override; wins over the name tag
    pub name: Option<String>,
    /// Region used in the derived connection name
    pub region: String,
    /// Tag key the connection name is derived from (JSON input only)
    pub name_tag: String,
    /// VPC CIDR block behind the VPN gateway
    pub vpc_cidr: Option<String>,
    /// On-premises network
    pub local_cidr: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            name: None,
            region: "us-east-1".to_string(),
            name_tag: "Name".to_string(),
            vpc_cidr: None,
            local_cidr: None,
        }
    }
}

// XML deserialization structures for CustomerGatewayConfiguration
#[derive(Debug, Deserialize)]
#[serde(rename = "vpn_connection")]
struct VpnConnectionXml {
    #[serde(rename = "ipsec_tunnel", default)]
    ipsec_tunnels: Vec<IpsecTunnelXml>,
}

#[derive(Debug, Deserialize)]
struct IpsecTunnelXml {
    customer_gateway: EndpointXml,
    vpn_gateway: EndpointXml,
    ike: IkeXml,
    #[serde(default)]
    ipsec: Option<IpsecXml>,
}

#[derive(Debug, Deserialize)]
struct EndpointXml {
    tunnel_outside_address: AddressXml,
    #[serde(default)]
    tunnel_inside_address: Option<InsideAddressXml>,
    #[serde(default)]
    bgp: Option<BgpXml>,
}

#[derive(Debug, Deserialize)]
struct AddressXml {
    ip_address: String,
}

#[derive(Debug, Deserialize)]
struct InsideAddressXml {
    ip_address: String,
    #[serde(default)]
    network_cidr: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct BgpXml {
    asn: u32,
    #[serde(default)]
    hold_time: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct IkeXml {
    pre_shared_key: String,
    #[serde(default)]
    encryption_protocol: Option<String>,
    #[serde(default)]
    authentication_protocol: Option<String>,
    #[serde(default)]
    lifetime: Option<u32>,
    #[serde(default)]
    perfect_forward_secrecy: Option<String>,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpsecXml {
    #[serde(default)]
    encryption_protocol: Option<String>,
    #[serde(default)]
    authentication_protocol: Option<String>,
    #[serde(default)]
    lifetime: Option<u32>,
    #[serde(default)]
    perfect_forward_secrecy: Option<String>,
}

// JSON envelope of `aws ec2 describe-vpn-connections`
#[derive(Debug, Deserialize)]
struct DescribeVpnConnections {
    #[serde(rename = "VpnConnections")]
    vpn_connections: Vec<VpnConnectionJson>,
}

#[derive(Debug, Deserialize)]
struct VpnConnectionJson {
    #[serde(rename = "CustomerGatewayConfiguration")]
    customer_gateway_configuration: String,
    #[serde(rename = "Tags", default)]
    tags: Vec<TagJson>,
}

#[derive(Debug, Deserialize)]
struct TagJson {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Value")]
    value: String,
}

/// AWS reports "aes-128-cbc"; the daemons want "aes128"
fn normalize_encryption(proto: &str) -> String {
    proto.splitn(3, '-').take(2).collect::<Vec<_>>().join("")
}

/// AWS reports "hmac-sha1-96"; racoon wants "hmac_sha1"
fn normalize_ipsec_auth(proto: &str) -> String {
    proto.splitn(3, '-').take(2).collect::<Vec<_>>().join("_")
}

/// AWS reports "group2"; the daemons want the bare group number
fn normalize_pfs_group(pfs: &str) -> String {
    pfs.strip_prefix("group").unwrap_or(pfs).to_string()
}

fn ike_spec(ike: &IkeXml) -> IkeSpec {
    let defaults = IkeSpec::default();
    IkeSpec {
        encryption: ike
            .encryption_protocol
            .as_deref()
            .map(normalize_encryption)
            .unwrap_or(defaults.encryption),
        authentication: ike
            .authentication_protocol
            .clone()
            .unwrap_or(defaults.authentication),
        lifetime_secs: ike.lifetime.unwrap_or(defaults.lifetime_secs),
        pfs_group: ike
            .perfect_forward_secrecy
            .as_deref()
            .map(normalize_pfs_group)
            .unwrap_or(defaults.pfs_group),
        mode: ike.mode.clone().unwrap_or(defaults.mode),
    }
}

fn ipsec_spec(ipsec: Option<&IpsecXml>) -> IpsecSpec {
    let defaults = IpsecSpec::default();
    let Some(ipsec) = ipsec else {
        return defaults;
    };

    IpsecSpec {
        encryption: ipsec
            .encryption_protocol
            .as_deref()
            .map(normalize_encryption)
            .unwrap_or(defaults.encryption),
        authentication: ipsec
            .authentication_protocol
            .as_deref()
            .map(normalize_ipsec_auth)
            .unwrap_or(defaults.authentication),
        lifetime_secs: ipsec.lifetime.unwrap_or(defaults.lifetime_secs),
        pfs_group: ipsec
            .perfect_forward_secrecy
            .as_deref()
            .map(normalize_pfs_group)
            .unwrap_or(defaults.pfs_group),
    }
}

fn tunnel_from_xml(xml: &IpsecTunnelXml) -> Tunnel {
    let inside_cidr = match (
        &xml.customer_gateway.tunnel_inside_address,
        &xml.vpn_gateway.tunnel_inside_address,
    ) {
        (Some(cgw), Some(vgw)) => Some(InsideCidr {
            customer_address: cgw.ip_address.clone(),
            vpn_address: vgw.ip_address.clone(),
            prefix_len: cgw.network_cidr.unwrap_or(30),
        }),
        _ => None,
    };

    // BGP needs both ends: the customer ASN and the AWS peer
    let bgp = match (&xml.customer_gateway.bgp, &xml.vpn_gateway.bgp, &inside_cidr) {
        (Some(cgw_bgp), Some(vgw_bgp), Some(inside)) => Some(BgpConfig {
            local_asn: cgw_bgp.asn,
            peer_asn: vgw_bgp.asn,
            local_ip: inside.customer_address.clone(),
            peer_ip: inside.vpn_address.clone(),
            hold_time: vgw_bgp.hold_time.or(cgw_bgp.hold_time).unwrap_or(30),
        }),
        _ => None,
    };

    Tunnel {
        customer_gateway_ip: xml.customer_gateway.tunnel_outside_address.ip_address.clone(),
        vpn_gateway_ip: xml.vpn_gateway.tunnel_outside_address.ip_address.clone(),
        pre_shared_key: xml.ike.pre_shared_key.clone(),
        inside_cidr,
        bgp,
        ike: ike_spec(&xml.ike),
        ipsec: ipsec_spec(xml.ipsec.as_ref()),
    }
}

fn connection_name(opts: &ImportOptions, tag_value: Option<&str>) -> String {
    if let Some(name) = &opts.name {
        return name.clone();
    }

    let extension = tag_value
        .map(validation::sanitize_name)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    format!("aws-{}-{}", opts.region, extension)
}

/// Parse a CustomerGatewayConfiguration XML document
pub fn from_xml_str(xml: &str, opts: &ImportOptions) -> ConfgenResult<VpnConnection> {
    let parsed: VpnConnectionXml = quick_xml::de::from_str(xml)?;

    let tunnels: Vec<Tunnel> = parsed.ipsec_tunnels.iter().map(tunnel_from_xml).collect();

    VpnConnection::new(
        &connection_name(opts, None),
        tunnels,
        opts.vpc_cidr.clone(),
        opts.local_cidr.clone(),
    )
}

/// Parse an `aws ec2 describe-vpn-connections` JSON envelope
///
/// Uses the first connection in the response and derives the name from its
/// tags (key `opts.name_tag`), matching how the connection would be labeled
/// in the console.
pub fn from_describe_json(json: &str, opts: &ImportOptions) -> ConfgenResult<VpnConnection> {
    let envelope: DescribeVpnConnections = serde_json::from_str(json)?;

    let conn = envelope.vpn_connections.first().ok_or_else(|| {
        ConfgenError::ParseError("response contains no VPN connections".to_string())
    })?;

    let tag_value = conn
        .tags
        .iter()
        .find(|t| t.key == opts.name_tag)
        .map(|t| t.value.as_str());

    let parsed: VpnConnectionXml =
        quick_xml::de::from_str(&conn.customer_gateway_configuration)?;
    let tunnels: Vec<Tunnel> = parsed.ipsec_tunnels.iter().map(tunnel_from_xml).collect();

    VpnConnection::new(
        &connection_name(opts, tag_value),
        tunnels,
        opts.vpc_cidr.clone(),
        opts.local_cidr.clone(),
    )
}

/// Parse either supported source document, sniffing the syntax
pub fn parse_source(content: &str, opts: &ImportOptions) -> ConfgenResult<VpnConnection> {
    if content.trim_start().starts_with('{') {
        from_describe_json(content, opts)
    } else {
        from_xml_str(content, opts)
    }
}
