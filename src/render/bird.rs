//! BGP renderer, BIRD dialect
//!
//! Emits a BIRD 1.x bird.conf: nested block syntax, one
//! `protocol bgp { local ... as; neighbor ... as; }` block per tunnel.
//! Network advertisement goes through a static protocol exported into the
//! sessions, instead of Quagga's `network` statement.

use super::renderer::{ConfigFormat, Rendered, Renderer};
use crate::descriptor::{BgpConfig, Tunnel, VpnConnection};
use crate::error::{ConfgenError, ConfgenResult};

pub struct BirdRenderer;

impl BirdRenderer {
    pub fn new() -> Self {
        Self
    }

    fn bgp(tunnel: &Tunnel, index: usize) -> ConfgenResult<&BgpConfig> {
        tunnel.bgp.as_ref().ok_or_else(|| {
            ConfgenError::MissingParameter(format!(
                "tunnel {} bgp (format 'bird' needs a BGP-enabled connection)",
                index + 1
            ))
        })
    }

    /// BIRD symbol names only allow word characters
    fn protocol_ident(name: &str) -> String {
        name.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect()
    }

    /// Peering block for one tunnel
    fn build_bgp_block(conn_name: &str, bgp: &BgpConfig, index: usize, advertise: bool) -> String {
        let n = index + 1;
        let mut conf = String::new();

        conf.push_str(&format!("# tunnel {}: neighbor {}\n", n, bgp.peer_ip));
        conf.push_str(&format!(
            "protocol bgp {}_tunnel{} {{\n",
            Self::protocol_ident(conn_name),
            n
        ));
        conf.push_str(&format!("\tlocal {} as {};\n", bgp.local_ip, bgp.local_asn));
        conf.push_str(&format!("\tneighbor {} as {};\n", bgp.peer_ip, bgp.peer_asn));
        conf.push_str(&format!("\thold time {};\n", bgp.hold_time));
        conf.push_str("\timport all;\n");
        if advertise {
            conf.push_str("\texport where source = RTS_STATIC;\n");
        } else {
            conf.push_str("\texport all;\n");
        }
        conf.push_str("}\n");

        conf
    }
}

impl Default for BirdRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for BirdRenderer {
    fn format(&self) -> ConfigFormat {
        ConfigFormat::Bird
    }

    fn render(&self, conn: &VpnConnection) -> ConfgenResult<Rendered> {
        if !conn.bgp_enabled() {
            return Err(ConfgenError::MissingParameter(
                "bgp (format 'bird' needs a BGP-enabled connection)".to_string(),
            ));
        }

        let first = Self::bgp(&conn.tunnels()[0], 0)?;
        let advertise = conn.local_cidr().is_some();

        let mut main = String::new();
        main.push_str(&format!("# BIRD BGP configuration for {}\n\n", conn.name()));
        main.push_str(&format!("router id {};\n\n", first.local_ip));

        main.push_str("protocol kernel {\n");
        main.push_str("\tpersist;\n");
        main.push_str("\tscan time 20;\n");
        main.push_str("\timport none;\n");
        main.push_str("\texport all;\n");
        main.push_str("}\n\n");

        main.push_str("protocol device {\n");
        main.push_str("\tscan time 10;\n");
        main.push_str("}\n");

        if let Some(network) = conn.local_cidr() {
            main.push('\n');
            main.push_str("# On-premises network announced to AWS\n");
            main.push_str("protocol static advertised_routes {\n");
            main.push_str(&format!("\troute {} reject;\n", network));
            main.push_str("}\n");
        }

        for (i, tunnel) in conn.tunnels().iter().enumerate() {
            let bgp = Self::bgp(tunnel, i)?;
            main.push('\n');
            main.push_str(&Self::build_bgp_block(conn.name(), bgp, i, advertise));
        }

        Ok(Rendered::main_only(main))
    }
}

/// Factory function to create a BIRD renderer
pub fn create_renderer() -> Box<dyn Renderer> {
    Box::new(BirdRenderer::new())
}
