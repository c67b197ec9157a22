//! SNTP synchronisation over embassy-net UDP

use embassy_net::dns::{self, DnsQueryType};
use embassy_net::udp::{self, PacketMetadata, UdpSocket};
use embassy_net::{IpEndpoint, Stack};
use embassy_time::{Delay, Duration, Timer, WithTimeout};
use hearth_core::AppError;
use hearth_core::network::RetryPolicy;
use hearth_core::sntp::{self, NTP_PORT, PACKET_LEN, SntpError, SntpReply};
use log::{info, warn};
use thiserror_no_std::Error;

use crate::shared;

/// Wait for one reply before counting the attempt as failed
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Re-anchor the clock this often to bound drift
const RESYNC_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Pause after a whole retry round failed
const ROUND_PAUSE: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("DNS lookup failed: {0:?}")]
    Dns(dns::Error),
    #[error("no address for NTP server")]
    NoAddress,
    #[error("socket bind failed: {0:?}")]
    Bind(udp::BindError),
    #[error("send failed: {0:?}")]
    Send(udp::SendError),
    #[error("receive failed: {0:?}")]
    Recv(udp::RecvError),
    #[error("no reply within {}s", REPLY_TIMEOUT.as_secs())]
    Timeout,
    #[error("{0}")]
    Sntp(#[from] SntpError),
}

/// Query one server once.
pub async fn query(stack: Stack<'_>, server: &str) -> Result<SntpReply, SyncError> {
    let addresses = stack
        .dns_query(server, DnsQueryType::A)
        .await
        .map_err(SyncError::Dns)?;
    let address = addresses.first().copied().ok_or(SyncError::NoAddress)?;

    let mut rx_meta = [PacketMetadata::EMPTY; 1];
    let mut tx_meta = [PacketMetadata::EMPTY; 1];
    let mut rx_buffer = [0u8; 128];
    let mut tx_buffer = [0u8; 128];
    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );
    socket.bind(0).map_err(SyncError::Bind)?;

    socket
        .send_to(&sntp::request(), IpEndpoint::new(address, NTP_PORT))
        .await
        .map_err(SyncError::Send)?;

    let mut reply = [0u8; PACKET_LEN];
    let (len, _) = socket
        .recv_from(&mut reply)
        .with_timeout(REPLY_TIMEOUT)
        .await
        .map_err(|_| SyncError::Timeout)?
        .map_err(SyncError::Recv)?;

    Ok(sntp::parse(&reply[..len])?)
}

/// Run one retry round, alternating between the configured servers.
pub async fn sync_once(stack: Stack<'_>, servers: [&str; 2]) -> Result<SntpReply, AppError> {
    RetryPolicy::SNTP
        .retry(&mut Delay, |attempt| {
            let server = servers[attempt as usize % servers.len()];
            query(stack, server)
        })
        .await
}

#[embassy_executor::task]
pub async fn time_sync_task(stack: Stack<'static>, servers: [&'static str; 2]) {
    loop {
        stack.wait_config_up().await;

        match sync_once(stack, servers).await {
            Ok(reply) => {
                shared::record_sync(reply.unix_secs, shared::uptime_ms());
                info!(
                    " Clock synchronised (stratum {}, unix {})",
                    reply.stratum, reply.unix_secs
                );
                Timer::after(RESYNC_INTERVAL).await;
            }
            Err(err) => {
                warn!(" Time sync failed: {}", err);
                Timer::after(ROUND_PAUSE).await;
            }
        }
    }
}
