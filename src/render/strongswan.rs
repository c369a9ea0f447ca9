//! Route-based IPSec renderer (strongSwan)
//!
//! Emits an ipsec.conf-style main config with one VTI interface block and
//! one connection block per tunnel, plus a separate ipsec.secrets artifact.
//! Each tunnel's inside /30 becomes the address of its tunnel interface;
//! traffic is steered by routes over vti1/vti2, so both traffic selectors
//! stay 0.0.0.0/0.

use super::renderer::{ConfigFormat, Rendered, Renderer};
use crate::descriptor::{InsideCidr, Tunnel, VpnConnection};
use crate::error::{ConfgenError, ConfgenResult};

/// MTU leaving room for ESP and IP overhead on a 1500-byte path
const VTI_MTU: u32 = 1436;

pub struct StrongswanRenderer;

impl StrongswanRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Map an IKE/PFS group number to the strongSwan modp keyword
    fn modp_group(group: &str) -> String {
        match group {
            "1" => "modp768".to_string(),
            "2" => "modp1024".to_string(),
            "5" => "modp1536".to_string(),
            "14" => "modp2048".to_string(),
            "15" => "modp3072".to_string(),
            "16" => "modp4096".to_string(),
            other => format!("modp{}", other),
        }
    }

    /// Phase 2 integrity keyword: racoon-style "hmac_sha1" becomes "sha1"
    fn esp_auth(auth: &str) -> &str {
        auth.strip_prefix("hmac_").unwrap_or(auth)
    }

    fn inside(tunnel: &Tunnel, index: usize) -> ConfgenResult<&InsideCidr> {
        tunnel.inside_cidr.as_ref().ok_or_else(|| {
            ConfgenError::MissingParameter(format!(
                "tunnel {} inside_cidr (route-based strongswan rendering needs tunnel inside addressing)",
                index + 1
            ))
        })
    }

    /// Interface block: the commands that create the VTI this conn attaches to
    fn build_interface_block(tunnel: &Tunnel, inside: &InsideCidr, index: usize) -> String {
        let n = index + 1;
        let mark = (n as u32) * 100;
        let mut conf = String::new();

        conf.push_str(&format!(
            "# Virtual tunnel interface for tunnel {} (inside {})\n",
            n,
            inside.customer_cidr()
        ));
        conf.push_str(&format!(
            "#   ip link add vti{} type vti local {} remote {} key {}\n",
            n, tunnel.customer_gateway_ip, tunnel.vpn_gateway_ip, mark
        ));
        conf.push_str(&format!(
            "#   ip addr add {} remote {}/32 dev vti{}\n",
            inside.customer_cidr(),
            inside.vpn_address,
            n
        ));
        conf.push_str(&format!("#   ip link set vti{} up mtu {}\n", n, VTI_MTU));

        conf
    }

    /// Connection block for one tunnel, ipsec.conf syntax
    fn build_conn_block(conn_name: &str, tunnel: &Tunnel, index: usize) -> String {
        let n = index + 1;
        let mark = (n as u32) * 100;
        let mut conf = String::new();

        conf.push_str(&format!("conn {}-tunnel{}\n", conn_name, n));
        conf.push_str("\tleft=%defaultroute\n");
        conf.push_str(&format!("\tleftid={}\n", tunnel.customer_gateway_ip));
        conf.push_str(&format!("\tright={}\n", tunnel.vpn_gateway_ip));

        // Route-based: selectors wide open, routing decides what enters the VTI
        conf.push_str("\tleftsubnet=0.0.0.0/0\n");
        conf.push_str("\trightsubnet=0.0.0.0/0\n");

        conf.push_str(&format!(
            "\tike={}-{}-{}!\n",
            tunnel.ike.encryption,
            tunnel.ike.authentication,
            Self::modp_group(&tunnel.ike.pfs_group)
        ));
        conf.push_str(&format!(
            "\tesp={}-{}-{}!\n",
            tunnel.ipsec.encryption,
            Self::esp_auth(&tunnel.ipsec.authentication),
            Self::modp_group(&tunnel.ipsec.pfs_group)
        ));
        conf.push_str(&format!("\tikelifetime={}s\n", tunnel.ike.lifetime_secs));
        conf.push_str(&format!("\tlifetime={}s\n", tunnel.ipsec.lifetime_secs));

        // Ties the SA to the matching vti interface
        conf.push_str(&format!("\tmark={}\n", mark));

        conf
    }
}

impl Default for StrongswanRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for StrongswanRenderer {
    fn format(&self) -> ConfigFormat {
        ConfigFormat::Strongswan
    }

    fn render(&self, conn: &VpnConnection) -> ConfgenResult<Rendered> {
        // All-or-nothing: check both tunnels before emitting anything
        for (i, tunnel) in conn.tunnels().iter().enumerate() {
            Self::inside(tunnel, i)?;
        }

        let mut main = String::new();
        main.push_str(&format!(
            "# strongSwan route-based IPSec configuration for {}\n",
            conn.name()
        ));
        main.push_str("# Generated from an AWS site-to-site VPN connection\n\n");

        main.push_str("config setup\n");
        main.push_str("\tuniqueids=no\n\n");

        main.push_str("conn %default\n");
        main.push_str("\tkeyexchange=ikev1\n");
        main.push_str("\tauthby=secret\n");
        main.push_str("\ttype=tunnel\n");
        main.push_str("\tauto=start\n");
        main.push_str("\tdpdaction=restart\n");
        main.push_str("\tdpddelay=10s\n");
        main.push_str("\tdpdtimeout=30s\n");

        for (i, tunnel) in conn.tunnels().iter().enumerate() {
            let inside = Self::inside(tunnel, i)?;

            main.push('\n');
            main.push_str(&format!(
                "# tunnel {}: {} <-> {}\n",
                i + 1,
                tunnel.customer_gateway_ip,
                tunnel.vpn_gateway_ip
            ));
            main.push_str(&Self::build_interface_block(tunnel, inside, i));
            main.push_str(&Self::build_conn_block(conn.name(), tunnel, i));
        }

        // Secrets live in their own artifact, mirroring ipsec.secrets
        let mut secrets = String::new();
        secrets.push_str(&format!("# ipsec.secrets for {}\n", conn.name()));
        for tunnel in conn.tunnels() {
            secrets.push_str(&format!(
                "{} {} : PSK \"{}\"\n",
                tunnel.customer_gateway_ip, tunnel.vpn_gateway_ip, tunnel.pre_shared_key
            ));
        }

        Ok(Rendered::with_secrets(main, secrets))
    }
}

/// Factory function to create a strongSwan renderer
pub fn create_renderer() -> Box<dyn Renderer> {
    Box::new(StrongswanRenderer::new())
}
