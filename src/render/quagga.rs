//! BGP renderer, Quagga dialect
//!
//! Emits a Zebra/Quagga bgpd.conf: flat statement syntax, one
//! `neighbor <ip> remote-as <asn>` group per tunnel under a single
//! `router bgp` section.

use super::renderer::{ConfigFormat, Rendered, Renderer};
use crate::descriptor::{BgpConfig, Tunnel, VpnConnection};
use crate::error::{ConfgenError, ConfgenResult};

pub struct QuaggaRenderer;

impl QuaggaRenderer {
    pub fn new() -> Self {
        Self
    }

    fn bgp(tunnel: &Tunnel, index: usize) -> ConfgenResult<&BgpConfig> {
        tunnel.bgp.as_ref().ok_or_else(|| {
            ConfgenError::MissingParameter(format!(
                "tunnel {} bgp (format 'quagga' needs a BGP-enabled connection)",
                index + 1
            ))
        })
    }

    /// Neighbor statement group for one tunnel
    fn build_neighbor_block(conn_name: &str, bgp: &BgpConfig, index: usize) -> String {
        let n = index + 1;
        let keepalive = bgp.hold_time / 3;
        let mut conf = String::new();

        conf.push_str(&format!(" ! tunnel {} neighbor\n", n));
        conf.push_str(&format!(
            " neighbor {} remote-as {}\n",
            bgp.peer_ip, bgp.peer_asn
        ));
        conf.push_str(&format!(
            " neighbor {} description {}-tunnel{}\n",
            bgp.peer_ip, conn_name, n
        ));
        conf.push_str(&format!(
            " neighbor {} timers {} {}\n",
            bgp.peer_ip, keepalive, bgp.hold_time
        ));
        conf.push_str(&format!(
            " neighbor {} soft-reconfiguration inbound\n",
            bgp.peer_ip
        ));

        conf
    }
}

impl Default for QuaggaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for QuaggaRenderer {
    fn format(&self) -> ConfigFormat {
        ConfigFormat::Quagga
    }

    fn render(&self, conn: &VpnConnection) -> ConfgenResult<Rendered> {
        if !conn.bgp_enabled() {
            return Err(ConfgenError::MissingParameter(
                "bgp (format 'quagga' needs a BGP-enabled connection)".to_string(),
            ));
        }

        let first = Self::bgp(&conn.tunnels()[0], 0)?;

        let mut main = String::new();
        main.push_str(&format!("! Quagga bgpd configuration for {}\n", conn.name()));
        main.push_str("!\n");
        main.push_str("hostname bgpd\n");
        main.push_str("password zebra\n");
        main.push_str("log stdout\n");
        main.push_str("!\n");

        main.push_str(&format!("router bgp {}\n", first.local_asn));
        main.push_str(&format!(" bgp router-id {}\n", first.local_ip));
        if let Some(network) = conn.local_cidr() {
            main.push_str(&format!(" network {}\n", network));
        }

        for (i, tunnel) in conn.tunnels().iter().enumerate() {
            let bgp = Self::bgp(tunnel, i)?;
            main.push_str(" !\n");
            main.push_str(&Self::build_neighbor_block(conn.name(), bgp, i));
        }

        main.push_str("!\n");
        main.push_str("line vty\n");
        main.push_str("!\n");

        Ok(Rendered::main_only(main))
    }
}

/// Factory function to create a Quagga renderer
pub fn create_renderer() -> Box<dyn Renderer> {
    Box::new(QuaggaRenderer::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{IkeSpec, IpsecSpec};

    fn tunnel(vgw: &str, bgp: Option<BgpConfig>) -> Tunnel {
        Tunnel {
            customer_gateway_ip: "203.0.113.1".to_string(),
            vpn_gateway_ip: vgw.to_string(),
            pre_shared_key: "abc123".to_string(),
            inside_cidr: None,
            bgp,
            ike: IkeSpec::default(),
            ipsec: IpsecSpec::default(),
        }
    }

    fn bgp(local_ip: &str, peer_ip: &str) -> BgpConfig {
        BgpConfig {
            local_asn: 65000,
            peer_asn: 7224,
            local_ip: local_ip.to_string(),
            peer_ip: peer_ip.to_string(),
            hold_time: 30,
        }
    }

    fn peered_connection() -> VpnConnection {
        VpnConnection::new(
            "corp",
            vec![
                tunnel("203.0.113.2", Some(bgp("169.254.10.2", "169.254.10.1"))),
                tunnel("203.0.113.6", Some(bgp("169.254.20.2", "169.254.20.1"))),
            ],
            Some("10.0.0.0/16".to_string()),
            Some("10.1.0.0/16".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_two_neighbor_blocks_with_peer_asn() {
        let rendered = QuaggaRenderer::new().render(&peered_connection()).unwrap();

        assert!(rendered.main.contains("router bgp 65000"));
        assert!(rendered.main.contains("neighbor 169.254.10.1 remote-as 7224"));
        assert!(rendered.main.contains("neighbor 169.254.20.1 remote-as 7224"));
        assert_eq!(rendered.main.matches("remote-as").count(), 2);

        let t1 = rendered.main.find("neighbor 169.254.10.1").unwrap();
        let t2 = rendered.main.find("neighbor 169.254.20.1").unwrap();
        assert!(t1 < t2, "tunnel 1 must be rendered before tunnel 2");
    }

    #[test]
    fn test_advertises_local_network() {
        let rendered = QuaggaRenderer::new().render(&peered_connection()).unwrap();
        assert!(rendered.main.contains(" network 10.1.0.0/16\n"));
    }

    #[test]
    fn test_timers_derive_from_hold_time() {
        let rendered = QuaggaRenderer::new().render(&peered_connection()).unwrap();
        assert!(rendered.main.contains("neighbor 169.254.10.1 timers 10 30"));
    }

    #[test]
    fn test_static_connection_fails_with_no_output() {
        let conn = VpnConnection::new(
            "corp",
            vec![tunnel("203.0.113.2", None), tunnel("203.0.113.6", None)],
            None,
            None,
        )
        .unwrap();

        let err = QuaggaRenderer::new().render(&conn).unwrap_err();
        assert!(matches!(err, ConfgenError::MissingParameter(_)));
    }

    #[test]
    fn test_no_secrets_artifact() {
        let rendered = QuaggaRenderer::new().render(&peered_connection()).unwrap();
        assert!(rendered.secrets.is_none());
    }
}
