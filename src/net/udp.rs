//! UDP endpoint (C2): bind, apply TOS/TTL/DF, send/receive with peer
//! address. Built on a std socket via `socket2` so options can be set
//! before `bind`, then promoted to a `tokio::net::UdpSocket`.

use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket as TokioUdpSocket;
use tokio::sync::Notify;
use tokio::time::timeout;

use crate::error::TwampError;

/// Datagrams up to this size are guaranteed to round-trip whole
/// (jumbo-frame safe).
pub const MAX_DATAGRAM: usize = 9216;

pub struct Endpoint {
    socket: TokioUdpSocket,
    closed: Notify,
    /// Sticky flag checked up front so a `recv`/`poll` call made after
    /// `close()` already returned never has to wait on the `Notify` at all
    /// (and can't race a `notify_one` permit that an earlier call consumed).
    is_closed: AtomicBool,
}

/// Socket options applied at bind time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointConfig {
    pub tos: Option<u8>,
    pub ttl: Option<u32>,
    pub do_not_fragment: bool,
}

impl Endpoint {
    /// Bind a UDP socket at `addr`, applying `config`'s socket options.
    /// IPv6 is selected automatically from `addr`'s family.
    pub fn bind(addr: SocketAddr, config: EndpointConfig) -> Result<Self, TwampError> {
        let domain = Domain::for_address(addr);
        let socket =
            Socket::new(domain, Type::DGRAM, Some(Protocol::UDP)).map_err(TwampError::BindFailure)?;

        socket
            .set_reuse_address(true)
            .map_err(TwampError::BindFailure)?;

        if let Some(tos) = config.tos {
            let result = if addr.is_ipv6() {
                socket.set_tclass_v6(tos as u32)
            } else {
                socket.set_tos(tos as u32)
            };
            if let Err(e) = result {
                log::warn!("failed to set TOS/traffic-class: {e}");
            }
        }

        if let Some(ttl) = config.ttl {
            let result = if addr.is_ipv6() {
                socket.set_unicast_hops_v6(ttl)
            } else {
                socket.set_ttl(ttl)
            };
            if let Err(e) = result {
                log::warn!("failed to set TTL/hop-limit: {e}");
            }
        }

        if config.do_not_fragment {
            if let Err(e) = set_do_not_fragment(&socket, addr.is_ipv6()) {
                let err = TwampError::PlatformUnsupported("do-not-fragment");
                log::warn!("{err}: {e}");
            }
        }

        socket.bind(&addr.into()).map_err(TwampError::BindFailure)?;
        socket.set_nonblocking(true).map_err(TwampError::BindFailure)?;

        let std_socket: std::net::UdpSocket = socket.into();
        let socket = TokioUdpSocket::from_std(std_socket).map_err(TwampError::BindFailure)?;

        Ok(Self {
            socket,
            closed: Notify::new(),
            is_closed: AtomicBool::new(false),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub async fn send(&self, bytes: &[u8], peer: SocketAddr) -> std::io::Result<usize> {
        self.socket.send_to(bytes, peer).await
    }

    /// Receives one datagram, blocking until one arrives or [`Endpoint::close`]
    /// is called, in which case this returns a closed-socket error.
    pub async fn recv(&self) -> std::io::Result<(Vec<u8>, SocketAddr)> {
        if self.is_closed.load(Ordering::Acquire) {
            return Err(closed_error());
        }
        tokio::select! {
            result = self.recv_inner() => result,
            _ = self.closed.notified() => Err(closed_error()),
        }
    }

    async fn recv_inner(&self) -> std::io::Result<(Vec<u8>, SocketAddr)> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (len, peer) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(len);
        Ok((buf, peer))
    }

    /// Non-blocking readiness probe: resolves immediately either way. Also
    /// resolves promptly when [`Endpoint::close`] is called.
    pub async fn poll(&self, wait: Duration) -> bool {
        if self.is_closed.load(Ordering::Acquire) {
            return false;
        }
        tokio::select! {
            result = timeout(wait, self.socket.readable()) => result.is_ok(),
            _ = self.closed.notified() => false,
        }
    }

    /// Shuts the endpoint down: any task currently parked in [`Endpoint::recv`]
    /// or [`Endpoint::poll`] wakes immediately, and every call made after this
    /// returns fails the same way, per the cancellation model in the design
    /// notes (an idle blocking recv returns a closed-socket error rather than
    /// hanging past a shutdown signal).
    pub fn close(&self) {
        self.is_closed.store(true, Ordering::Release);
        self.closed.notify_one();
    }
}

fn closed_error() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotConnected, "endpoint closed")
}

#[cfg(target_os = "linux")]
fn set_do_not_fragment(socket: &Socket, is_v6: bool) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    let fd = socket.as_raw_fd();
    let (level, name) = if is_v6 {
        (libc::IPPROTO_IPV6, libc::IPV6_MTU_DISCOVER)
    } else {
        (libc::IPPROTO_IP, libc::IP_MTU_DISCOVER)
    };
    let value: libc::c_int = libc::IP_PMTUDISC_DO;

    let ret = unsafe {
        libc::setsockopt(
            fd,
            level,
            name,
            &value as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };

    if ret == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(target_os = "linux"))]
fn set_do_not_fragment(_socket: &Socket, _is_v6: bool) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "do-not-fragment has no equivalent on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_and_loopback_round_trip() {
        let a = Endpoint::bind("127.0.0.1:0".parse().unwrap(), EndpointConfig::default()).unwrap();
        let b = Endpoint::bind("127.0.0.1:0".parse().unwrap(), EndpointConfig::default()).unwrap();

        let b_addr = b.local_addr().unwrap();
        a.send(b"hello", b_addr).await.unwrap();

        let (bytes, _peer) = b.recv().await.unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn poll_false_when_nothing_pending() {
        let a = Endpoint::bind("127.0.0.1:0".parse().unwrap(), EndpointConfig::default()).unwrap();
        assert!(!a.poll(Duration::from_millis(5)).await);
    }

    #[tokio::test]
    async fn close_wakes_an_idle_recv() {
        use std::sync::Arc;

        let endpoint =
            Arc::new(Endpoint::bind("127.0.0.1:0".parse().unwrap(), EndpointConfig::default()).unwrap());

        let waiting = endpoint.clone();
        let handle = tokio::spawn(async move { waiting.recv().await });

        // give the spawned task a chance to actually park in recv().await
        tokio::time::sleep(Duration::from_millis(20)).await;
        endpoint.close();

        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("recv() must return promptly after close(), not hang")
            .unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn recv_after_close_fails_immediately() {
        let a = Endpoint::bind("127.0.0.1:0".parse().unwrap(), EndpointConfig::default()).unwrap();
        a.close();
        assert!(a.recv().await.is_err());
    }
}
