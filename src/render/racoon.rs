//! Policy-based IPSec renderer (racoon)
//!
//! Emits a racoon.conf-style main config with one `remote` block and one
//! `sainfo` traffic-selector block per tunnel, plus a psk.txt secrets
//! artifact. No tunnel interfaces and no inside addressing: traffic
//! selection pairs the on-premises network against the VPC network
//! directly.

use super::renderer::{ConfigFormat, Rendered, Renderer};
use crate::descriptor::{Tunnel, VpnConnection};
use crate::error::ConfgenResult;

/// Selector used when a side's network is not known
const ANY_NETWORK: &str = "0.0.0.0/0";

pub struct RacoonRenderer;

impl RacoonRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Phase 1 peer block for one tunnel
    fn build_remote_block(tunnel: &Tunnel) -> String {
        let mut conf = String::new();

        conf.push_str(&format!("remote {} {{\n", tunnel.vpn_gateway_ip));
        conf.push_str(&format!("\texchange_mode {};\n", tunnel.ike.mode));
        conf.push_str(&format!("\tlifetime time {} sec;\n", tunnel.ike.lifetime_secs));
        conf.push_str("\tnat_traversal on;\n");
        conf.push_str("\tdpd_delay 10;\n");
        conf.push_str("\tproposal {\n");
        conf.push_str(&format!("\t\tencryption_algorithm {};\n", tunnel.ike.encryption));
        conf.push_str(&format!("\t\thash_algorithm {};\n", tunnel.ike.authentication));
        conf.push_str("\t\tauthentication_method pre_shared_key;\n");
        conf.push_str(&format!("\t\tdh_group {};\n", tunnel.ike.pfs_group));
        conf.push_str("\t}\n");
        conf.push_str("}\n");

        conf
    }

    /// Phase 2 traffic-selector block pairing the two endpoint networks
    fn build_sainfo_block(tunnel: &Tunnel, local: &str, remote: &str) -> String {
        let mut conf = String::new();

        conf.push_str(&format!(
            "sainfo address {} any address {} any {{\n",
            local, remote
        ));
        conf.push_str(&format!("\tpfs_group {};\n", tunnel.ipsec.pfs_group));
        conf.push_str(&format!("\tlifetime time {} sec;\n", tunnel.ipsec.lifetime_secs));
        conf.push_str(&format!("\tencryption_algorithm {};\n", tunnel.ipsec.encryption));
        conf.push_str(&format!(
            "\tauthentication_algorithm {};\n",
            tunnel.ipsec.authentication
        ));
        conf.push_str("\tcompression_algorithm deflate;\n");
        conf.push_str("}\n");

        conf
    }
}

impl Default for RacoonRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for RacoonRenderer {
    fn format(&self) -> ConfigFormat {
        ConfigFormat::Racoon
    }

    fn render(&self, conn: &VpnConnection) -> ConfgenResult<Rendered> {
        let local = conn.local_cidr().unwrap_or(ANY_NETWORK);
        let remote = conn.vpc_cidr().unwrap_or(ANY_NETWORK);

        let mut main = String::new();
        main.push_str(&format!(
            "# racoon policy-based IPSec configuration for {}\n",
            conn.name()
        ));
        main.push_str("# Generated from an AWS site-to-site VPN connection\n\n");
        main.push_str("path pre_shared_key \"/etc/racoon/psk.txt\";\n");

        for (i, tunnel) in conn.tunnels().iter().enumerate() {
            main.push('\n');
            main.push_str(&format!(
                "# tunnel {}: {} <-> {}\n",
                i + 1,
                tunnel.customer_gateway_ip,
                tunnel.vpn_gateway_ip
            ));
            main.push_str(&Self::build_remote_block(tunnel));
            main.push('\n');
            main.push_str(&Self::build_sainfo_block(tunnel, local, remote));
        }

        // psk.txt is keyed by the peer's outside address
        let mut secrets = String::new();
        secrets.push_str(&format!("# psk.txt for {}\n", conn.name()));
        for tunnel in conn.tunnels() {
            secrets.push_str(&format!(
                "{} {}\n",
                tunnel.vpn_gateway_ip, tunnel.pre_shared_key
            ));
        }

        Ok(Rendered::with_secrets(main, secrets))
    }
}

/// Factory function to create a racoon renderer
pub fn create_renderer() -> Box<dyn Renderer> {
    Box::new(RacoonRenderer::new())
}
