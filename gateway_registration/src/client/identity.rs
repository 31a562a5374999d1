use std::net::IpAddr;

use super::{RegistrationError, Result};

/// Only these two literals count as loopback. Other `127.0.0.0/8` addresses
/// and link-local addresses are returned as routable.
static LOOPBACK_LITERALS: [&str; 2] = ["127.0.0.1", "::1"];

/// Resolves the address this instance registers as a gateway target.
pub trait ServiceIpResolver: Send + Sync {
    fn resolve(&self) -> Result<IpAddr>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub name: String,
    /// OS interface index, when the platform reports one.
    pub index: Option<u32>,
    pub addrs: Vec<IpAddr>,
}

/// Scans the host's network interfaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterfaceIpResolver;

impl ServiceIpResolver for InterfaceIpResolver {
    fn resolve(&self) -> Result<IpAddr> {
        get_service_ip()
    }
}

/// Always answers with the same address, used when the address is pinned
/// through configuration.
#[derive(Debug, Clone, Copy)]
pub struct FixedIpResolver(pub IpAddr);

impl ServiceIpResolver for FixedIpResolver {
    fn resolve(&self) -> Result<IpAddr> {
        Ok(self.0)
    }
}

/// Returns the first non-loopback address bound to a local interface.
pub fn get_service_ip() -> Result<IpAddr> {
    let interfaces = list_interfaces().map_err(RegistrationError::InterfaceEnumeration)?;
    let ip = first_non_loopback(&interfaces).ok_or(RegistrationError::NoAddressFound)?;
    log::debug!("resolved service ip:{}", ip);
    Ok(ip)
}

/// Interfaces in OS index order, each with its addresses in reported order.
pub fn list_interfaces() -> std::io::Result<Vec<NetworkInterface>> {
    let addrs = if_addrs::get_if_addrs()?;
    Ok(group_by_interface(addrs.into_iter().map(|iface| {
        let ip = iface.ip();
        (iface.name, iface.index, ip)
    })))
}

// getifaddrs lists addresses family by family, so an interface's first
// address says nothing about its position.
fn group_by_interface(
    addrs: impl IntoIterator<Item = (String, Option<u32>, IpAddr)>,
) -> Vec<NetworkInterface> {
    let mut interfaces: Vec<NetworkInterface> = Vec::new();
    for (name, index, ip) in addrs {
        match interfaces.iter_mut().find(|v| v.name == name) {
            Some(known) => known.addrs.push(ip),
            None => interfaces.push(NetworkInterface {
                name,
                index,
                addrs: vec![ip],
            }),
        }
    }
    // stable, unindexed interfaces stay in reported order after the rest
    interfaces.sort_by_key(|v| v.index.unwrap_or(u32::MAX));
    interfaces
}

pub fn first_non_loopback(interfaces: &[NetworkInterface]) -> Option<IpAddr> {
    interfaces
        .iter()
        .flat_map(|iface| iface.addrs.iter())
        .find(|ip| !is_loopback_literal(ip))
        .copied()
}

fn is_loopback_literal(ip: &IpAddr) -> bool {
    let text = ip.to_string();
    LOOPBACK_LITERALS.contains(&text.as_str())
}
