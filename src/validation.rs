//! Input validation and sanitization
//!
//! Field-level checks applied when a connection descriptor is constructed,
//! so malformed values never reach a renderer

use crate::error::{ConfgenError, ConfgenResult};
use std::net::Ipv4Addr;

/// Maximum length for connection names embedded in daemon configs
const MAX_CONNECTION_NAME_LEN: usize = 64;

/// Validate a tunnel endpoint address (dotted-quad IPv4)
pub fn validate_endpoint_ip(addr: &str) -> ConfgenResult<()> {
    if addr.is_empty() {
        return Err(ConfgenError::MalformedDescriptor(
            "tunnel endpoint address cannot be empty".to_string()
        ));
    }

    addr.parse::<Ipv4Addr>()
        .map(|_| ())
        .map_err(|_| ConfgenError::MalformedDescriptor(
            format!("invalid tunnel endpoint address: {}", addr)
        ))
}

/// Validate a CIDR in prefix notation (e.g. "169.254.10.0/30")
pub fn validate_cidr(cidr: &str) -> ConfgenResult<()> {
    if let Some((ip, prefix)) = cidr.split_once('/') {
        if let Ok(prefix_len) = prefix.parse::<u8>() {
            if ip.parse::<Ipv4Addr>().is_ok() && prefix_len <= 32 {
                return Ok(());
            }
        }
    }

    Err(ConfgenError::MalformedDescriptor(
        format!("invalid CIDR: {}", cidr)
    ))
}

/// Validate a BGP autonomous system number
///
/// ASN 0 is reserved (RFC 7607) and never valid for a peering session
pub fn validate_asn(asn: u32) -> ConfgenResult<()> {
    if asn == 0 {
        return Err(ConfgenError::MalformedDescriptor(
            "BGP ASN 0 is reserved".to_string()
        ));
    }
    Ok(())
}

/// Sanitize a connection name for embedding in daemon configs
///
/// Collapses every run of non-alphanumeric characters to a single dash,
/// trims leading/trailing dashes, and truncates to a safe length. Daemon
/// section names (ipsec.conf conn names, BIRD protocol names) only accept
/// a restricted character set.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }

    while out.ends_with('-') {
        out.pop();
    }

    out.truncate(MAX_CONNECTION_NAME_LEN);
    out
}
