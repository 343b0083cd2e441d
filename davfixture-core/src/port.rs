//! Free TCP port discovery.

use std::io::ErrorKind;
use std::net::Ipv4Addr;

use tokio::net::TcpListener;

use crate::error::{FixtureError, FixtureResult};

/// Find the first port at or above `start` that can be bound on localhost.
///
/// Ports that are in use (or reserved for another user) are skipped; any
/// other bind failure aborts the scan, as does running out of ports.
/// Port 0 means "any port" to the OS, so the scan never starts below 1.
pub async fn find_free_port(start: u16) -> FixtureResult<u16> {
    let start = start.max(1);
    for port in start..=u16::MAX {
        match TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await {
            Ok(listener) => {
                drop(listener);
                tracing::debug!(port, "found free port");
                return Ok(port);
            }
            Err(e) if is_port_taken(e.kind()) => continue,
            Err(e) => {
                return Err(FixtureError::PortAllocation(format!(
                    "probing port {port} failed: {e}"
                )));
            }
        }
    }

    Err(FixtureError::PortAllocation(format!(
        "no free port in range {start}..={}",
        u16::MAX
    )))
}

fn is_port_taken(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::AddrInUse | ErrorKind::PermissionDenied)
}
