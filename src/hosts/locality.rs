//! Local machine identity.
//!
//! The IP address here is what the OS resolver (DNS, `/etc/hosts`, ...) returns
//! for the short hostname. It is NOT read from network interfaces. On hosts
//! with several names or addresses, a source naming another interface's
//! address is treated as remote.

use std::ffi::{CStr, CString, OsString};
use std::net::{IpAddr, ToSocketAddrs};

use tracing::{debug, info, warn};

/// Names under which this machine may appear in a test's `source` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    hostname: String,
    fqdn: String,
    ip: Option<IpAddr>,
}

impl LocalIdentity {
    /// Build an identity from known values. Names are lowercased.
    pub fn new(hostname: &str, fqdn: &str, ip: Option<IpAddr>) -> Self {
        Self {
            hostname: hostname.to_ascii_lowercase(),
            fqdn: fqdn.to_ascii_lowercase(),
            ip,
        }
    }

    /// Query the OS for this machine's hostname, canonical name and the
    /// address its hostname resolves to.
    pub fn detect() -> Self {
        let raw = gethostname().to_string_lossy().into_owned();
        let hostname = raw
            .split('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        let fqdn = canonical_name(&raw).unwrap_or_else(|| {
            debug!(hostname = %raw, "no canonical name from resolver, using hostname");
            raw.clone()
        });

        let ip = resolve(&hostname);
        let identity = Self::new(&hostname, &fqdn, ip);

        match identity.ip {
            Some(ip) => info!(
                "My hostname: {}. My FQDN: {}. DNS resolves {} to {}.",
                identity.hostname, identity.fqdn, identity.hostname, ip
            ),
            None => warn!(
                "My hostname: {}. My FQDN: {}. DNS could not resolve {}; only names will match.",
                identity.hostname, identity.fqdn, identity.hostname
            ),
        }
        identity
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    /// Whether `source` names this machine (case-insensitive).
    pub fn is_local(&self, source: &str) -> bool {
        let source = source.trim().to_ascii_lowercase();
        if source == "localhost" || source == "127.0.0.1" {
            return true;
        }
        if source == self.hostname || source == self.fqdn {
            return true;
        }
        self.ip.is_some_and(|ip| source == ip.to_string())
    }
}

/// Get the system hostname as an OsString.
fn gethostname() -> OsString {
    let mut buf = vec![0u8; 256];
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if ret != 0 {
        return OsString::from("localhost");
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    OsString::from(String::from_utf8_lossy(&buf[..len]).into_owned())
}

/// Canonical name for `host` as reported by `getaddrinfo(AI_CANONNAME)`.
fn canonical_name(host: &str) -> Option<String> {
    let c_host = CString::new(host).ok()?;
    let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
    hints.ai_family = libc::AF_UNSPEC;
    hints.ai_flags = libc::AI_CANONNAME;

    let mut res: *mut libc::addrinfo = std::ptr::null_mut();
    let ret = unsafe { libc::getaddrinfo(c_host.as_ptr(), std::ptr::null(), &hints, &mut res) };
    if ret != 0 || res.is_null() {
        return None;
    }

    let name = unsafe {
        let canon = (*res).ai_canonname;
        if canon.is_null() {
            None
        } else {
            Some(CStr::from_ptr(canon).to_string_lossy().into_owned())
        }
    };
    unsafe { libc::freeaddrinfo(res) };
    name.filter(|n| !n.is_empty())
}

/// First address the resolver returns for `host`, preferring IPv4.
fn resolve(host: &str) -> Option<IpAddr> {
    let addrs: Vec<IpAddr> = (host, 0u16)
        .to_socket_addrs()
        .ok()?
        .map(|a| a.ip())
        .collect();
    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}
