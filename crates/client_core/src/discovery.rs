//! Finds remote-control servers on the local /24 by probing `GET /identify`.

use std::{
    net::{IpAddr, Ipv4Addr, UdpSocket},
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use anyhow::Result;
use futures::future::join_all;
use reqwest::Client;
use shared::protocol::IdentifyResponse;
use tracing::{debug, info, trace};

use crate::settings::SERVER_PORT;

pub const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DiscoveredDevice {
    pub ip: Ipv4Addr,
    pub hostname: String,
}

/// First three octets of this machine's private IPv4 address, or `None` when
/// not on a private network.
pub fn local_subnet_prefix() -> Option<[u8; 3]> {
    // Connecting a UDP socket sends nothing; it only selects the outbound interface.
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    if let Err(error) = socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)) {
        debug!(%error, "no route for subnet detection");
        return None;
    }
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if ip.is_private() => {
            let [a, b, c, _] = ip.octets();
            Some([a, b, c])
        }
        other => {
            debug!(address = %other, "local address is not a private IPv4 address");
            None
        }
    }
}

/// Hosts `.1` through `.254` of the /24 named by `prefix`.
pub fn subnet_hosts(prefix: [u8; 3]) -> impl Iterator<Item = Ipv4Addr> {
    let [a, b, c] = prefix;
    (1..=254).map(move |host| Ipv4Addr::new(a, b, c, host))
}

pub struct DeviceScanner {
    http: Client,
    port: u16,
    scanning: AtomicBool,
}

impl DeviceScanner {
    pub fn new() -> Result<Self> {
        Self::with_port(SERVER_PORT)
    }

    pub fn with_port(port: u16) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(PROBE_CONNECT_TIMEOUT)
            .timeout(PROBE_TIMEOUT)
            .no_proxy()
            .build()?;
        Ok(Self {
            http,
            port,
            scanning: AtomicBool::new(false),
        })
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    pub async fn scan(&self, prefix: [u8; 3]) -> Option<Vec<DiscoveredDevice>> {
        self.scan_hosts(subnet_hosts(prefix)).await
    }

    /// Probes every host concurrently and returns the responders sorted by
    /// address. Returns `None` without probing if a scan is already running.
    pub async fn scan_hosts(
        &self,
        hosts: impl IntoIterator<Item = Ipv4Addr>,
    ) -> Option<Vec<DiscoveredDevice>> {
        if self.scanning.swap(true, Ordering::SeqCst) {
            debug!("scan already in progress");
            return None;
        }
        let _guard = ScanGuard(&self.scanning);

        let probes = hosts.into_iter().map(|host| {
            let http = self.http.clone();
            let port = self.port;
            tokio::spawn(async move { probe(&http, host, port).await })
        });
        let mut devices: Vec<DiscoveredDevice> = join_all(probes)
            .await
            .into_iter()
            .filter_map(|joined| joined.ok().flatten())
            .collect();
        devices.sort();

        info!(found = devices.len(), "device scan finished");
        Some(devices)
    }

    pub async fn probe(&self, host: Ipv4Addr) -> Option<DiscoveredDevice> {
        probe(&self.http, host, self.port).await
    }
}

struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

async fn probe(http: &Client, host: Ipv4Addr, port: u16) -> Option<DiscoveredDevice> {
    let response = match http
        .get(format!("http://{host}:{port}/identify"))
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            trace!(%host, status = %response.status(), "identify rejected");
            return None;
        }
        Err(error) => {
            trace!(%host, %error, "no answer");
            return None;
        }
    };

    let identity: IdentifyResponse = match response.json().await {
        Ok(identity) => identity,
        Err(error) => {
            trace!(%host, %error, "identify returned unexpected body");
            return None;
        }
    };
    if !identity.is_remote_control_server() {
        trace!(%host, app = %identity.app, "not a remote-control server");
        return None;
    }

    debug!(%host, hostname = %identity.hostname, "found server");
    Some(DiscoveredDevice {
        ip: host,
        hostname: identity.hostname,
    })
}

#[cfg(test)]
#[path = "tests/discovery_tests.rs"]
mod tests;
