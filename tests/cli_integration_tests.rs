//! Integration tests for the vpnconfgen CLI
//!
//! These tests drive the binary end-to-end over fixture documents

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a test vpnconfgen command
fn vpnconfgen() -> Command {
    Command::cargo_bin("vpnconfgen").unwrap()
}

/// One ipsec_tunnel element of a CustomerGatewayConfiguration document
fn tunnel_xml(cgw_ip: &str, vgw_ip: &str, inside_octet: u8, psk: &str, bgp: bool) -> String {
    let cgw_bgp = if bgp {
        "<bgp><asn>65000</asn><hold_time>30</hold_time></bgp>"
    } else {
        ""
    };
    let vgw_bgp = if bgp {
        "<bgp><asn>7224</asn><hold_time>30</hold_time></bgp>"
    } else {
        ""
    };

    format!(
        r#"<ipsec_tunnel>
  <customer_gateway>
    <tunnel_outside_address><ip_address>{cgw_ip}</ip_address></tunnel_outside_address>
    <tunnel_inside_address>
      <ip_address>169.254.{inside_octet}.2</ip_address>
      <network_mask>255.255.255.252</network_mask>
      <network_cidr>30</network_cidr>
    </tunnel_inside_address>
    {cgw_bgp}
  </customer_gateway>
  <vpn_gateway>
    <tunnel_outside_address><ip_address>{vgw_ip}</ip_address></tunnel_outside_address>
    <tunnel_inside_address>
      <ip_address>169.254.{inside_octet}.1</ip_address>
      <network_mask>255.255.255.252</network_mask>
      <network_cidr>30</network_cidr>
    </tunnel_inside_address>
    {vgw_bgp}
  </vpn_gateway>
  <ike>
    <authentication_protocol>sha1</authentication_protocol>
    <encryption_protocol>aes-128-cbc</encryption_protocol>
    <lifetime>28800</lifetime>
    <perfect_forward_secrecy>group2</perfect_forward_secrecy>
    <mode>main</mode>
    <pre_shared_key>{psk}</pre_shared_key>
  </ike>
  <ipsec>
    <authentication_protocol>hmac-sha1-96</authentication_protocol>
    <encryption_protocol>aes-128-cbc</encryption_protocol>
    <lifetime>3600</lifetime>
    <perfect_forward_secrecy>group2</perfect_forward_secrecy>
  </ipsec>
</ipsec_tunnel>"#
    )
}

fn fixture_xml(bgp: bool) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<vpn_connection id=\"vpn-0badc0ffee\">\n{}\n{}\n</vpn_connection>\n",
        tunnel_xml("203.0.113.1", "203.0.113.2", 10, "tunnel1secret", bgp),
        tunnel_xml("203.0.113.1", "203.0.113.6", 20, "tunnel2secret", bgp),
    )
}

fn write_fixture(dir: &TempDir, bgp: bool) -> std::path::PathBuf {
    let path = dir.path().join("vpn.xml");
    fs::write(&path, fixture_xml(bgp)).unwrap();
    path
}

#[test]
fn test_help_command() {
    vpnconfgen()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("AWS site-to-site VPN"));
}

#[test]
fn test_list_formats() {
    vpnconfgen()
        .arg("--list-formats")
        .assert()
        .success()
        .stdout(predicate::str::contains("strongswan"))
        .stdout(predicate::str::contains("racoon"))
        .stdout(predicate::str::contains("quagga"))
        .stdout(predicate::str::contains("bird"));
}

#[test]
fn test_unknown_format_lists_valid_identifiers() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, true);

    vpnconfgen()
        .arg("-i")
        .arg(&input)
        .arg("-f")
        .arg("openswan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format 'openswan'"))
        .stderr(predicate::str::contains("strongswan"))
        .stderr(predicate::str::contains("bird"));
}

#[test]
fn test_default_format_renders_ipsec_and_bgp() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, true);

    vpnconfgen()
        .arg("-i")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("conn aws-us-east-1-unknown-tunnel1"))
        .stdout(predicate::str::contains("conn aws-us-east-1-unknown-tunnel2"))
        .stdout(predicate::str::contains("router bgp 65000"))
        .stdout(predicate::str::contains("neighbor 169.254.10.1 remote-as 7224"));
}

#[test]
fn test_stdin_input() {
    vpnconfgen()
        .arg("-i")
        .arg("-")
        .arg("-f")
        .arg("racoon")
        .write_stdin(fixture_xml(false))
        .assert()
        .success()
        .stdout(predicate::str::contains("remote 203.0.113.2"))
        .stdout(predicate::str::contains("sainfo address"));
}

#[test]
fn test_output_directory_writes_split_artifacts() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, false);
    let out = dir.path().join("generated");

    vpnconfgen()
        .arg("-i")
        .arg(&input)
        .arg("-f")
        .arg("strongswan")
        .arg("--name")
        .arg("corp")
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let conf = fs::read_to_string(out.join("corp.strongswan.conf")).unwrap();
    assert!(conf.contains("conn corp-tunnel1"));
    assert!(!conf.contains("tunnel1secret"), "main config must not carry PSKs");

    let secrets = fs::read_to_string(out.join("corp.strongswan.secrets")).unwrap();
    let p1 = secrets.find("tunnel1secret").unwrap();
    let p2 = secrets.find("tunnel2secret").unwrap();
    assert!(p1 < p2, "secrets listed in tunnel order");
}

#[test]
fn test_secrets_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, false);
    let out = dir.path().join("generated");

    vpnconfgen()
        .arg("-i")
        .arg(&input)
        .arg("-f")
        .arg("strongswan")
        .arg("--name")
        .arg("corp")
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let mode = fs::metadata(out.join("corp.strongswan.secrets"))
        .unwrap()
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(mode, 0o600);
}

#[test]
fn test_bgp_format_on_static_connection_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, false);

    vpnconfgen()
        .arg("-i")
        .arg(&input)
        .arg("-f")
        .arg("quagga")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing parameter"));
}

#[test]
fn test_vpc_cidr_flows_into_policy_selectors() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(&dir, false);

    vpnconfgen()
        .arg("-i")
        .arg(&input)
        .arg("-f")
        .arg("racoon")
        .arg("--vpc-cidr")
        .arg("10.0.0.0/16")
        .arg("--local-cidr")
        .arg("10.1.0.0/16")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "sainfo address 10.1.0.0/16 any address 10.0.0.0/16 any",
        ));
}

#[test]
fn test_garbage_input_fails_cleanly() {
    vpnconfgen()
        .arg("-i")
        .arg("-")
        .write_stdin("this is not a vpn connection document")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"));
}
