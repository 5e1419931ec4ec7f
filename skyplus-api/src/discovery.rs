//! Finding a box on the local network
//!
//! Sky+ boxes announce themselves over SSDP with a `SERVER` header naming
//! their `redsonic` UPnP stack. Detection listens on the SSDP port for the
//! first such announcement and reports who sent it.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;

use crate::error::{ApiError, Result};

/// SSDP port announcements are sent to
pub const SSDP_PORT: u16 = 1900;

const SSDP_MULTICAST: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);
const ANNOUNCEMENT_TOKEN: &str = "redsonic";

/// A box that announced itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedDevice {
    pub address: IpAddr,
}

/// Whether an SSDP datagram comes from a Sky+ box
pub fn is_sky_announcement(message: &str) -> bool {
    message
        .find(ANNOUNCEMENT_TOKEN)
        .map_or(false, |index| index > 1)
}

/// Wait up to `timeout` for a box to announce itself on the SSDP port.
pub async fn detect(timeout: Duration) -> Result<DetectedDevice> {
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), SSDP_PORT);
    detect_on(addr, timeout).await
}

/// [`detect`] on an arbitrary local address
pub async fn detect_on(addr: SocketAddr, timeout: Duration) -> Result<DetectedDevice> {
    let socket = UdpSocket::bind(addr)
        .await
        .map_err(|e| ApiError::NetworkError(format!("Failed to bind {}: {}", addr, e)))?;

    if addr.port() == SSDP_PORT {
        if let Err(e) = socket.join_multicast_v4(SSDP_MULTICAST, Ipv4Addr::UNSPECIFIED) {
            tracing::warn!("Could not join SSDP multicast group: {}", e);
        }
    }

    tracing::debug!("Listening for box announcements on {}", addr);

    tokio::time::timeout(timeout, listen(&socket))
        .await
        .map_err(|_| ApiError::Timeout(format!("No box announced itself within {:?}", timeout)))?
}

async fn listen(socket: &UdpSocket) -> Result<DetectedDevice> {
    let mut buffer = [0u8; 2048];

    loop {
        let (len, from) = socket
            .recv_from(&mut buffer)
            .await
            .map_err(|e| ApiError::NetworkError(format!("Failed to read datagram: {}", e)))?;

        if is_sky_announcement(&String::from_utf8_lossy(&buffer[..len])) {
            tracing::info!("Found box at {}", from.ip());
            return Ok(DetectedDevice { address: from.ip() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANNOUNCEMENT: &str = "NOTIFY * HTTP/1.1\r\n\
        HOST: 239.255.255.250:1900\r\n\
        SERVER: Linux/2.6.18.5 UPnP/1.0 redsonic/1.0\r\n\
        NT: urn:schemas-nds-com:service:SkyPlay:2\r\n\r\n";

    #[test]
    fn test_is_sky_announcement() {
        assert!(is_sky_announcement(ANNOUNCEMENT));
        assert!(!is_sky_announcement("NOTIFY * HTTP/1.1\r\nSERVER: Sonos/70.1\r\n"));
        // the token has to follow at least two characters
        assert!(!is_sky_announcement("redsonic"));
        assert!(!is_sky_announcement("Xredsonic"));
        assert!(is_sky_announcement("XYredsonic"));
    }

    #[tokio::test]
    async fn test_detect_on_picks_the_announcing_sender() {
        let probe = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let listen_addr = probe.local_addr().unwrap();
        drop(probe);

        let detection = tokio::spawn(detect_on(listen_addr, Duration::from_secs(5)));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(b"M-SEARCH * HTTP/1.1\r\n", listen_addr).await.unwrap();
        sender.send_to(ANNOUNCEMENT.as_bytes(), listen_addr).await.unwrap();

        let device = detection.await.unwrap().unwrap();
        assert_eq!(device.address, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_detect_on_times_out() {
        let result = detect_on("127.0.0.1:0".parse().unwrap(), Duration::from_millis(50)).await;
        assert!(matches!(result, Err(ApiError::Timeout(_))));
    }
}
