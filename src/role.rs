//! Role Drivers (C8): compose the lower components into one of the four
//! roles named in `Cli`, and install the SIGINT-driven shutdown flag.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::addr::{effective_family, parse_addr, wildcard_host, Family};
use crate::cli::EndpointArgs;
use crate::control::{ControlChannel, DEFAULT_CONTROL_PORT};
use crate::dscp;
use crate::error::TwampError;
use crate::net::udp::{Endpoint, EndpointConfig};
use crate::padding::Policy;
use crate::reflector::{self, PeerMap};
use crate::report::print_report;
use crate::sender::{self, SenderConfig};

/// Grace period a Controller waits after its sender exits before issuing
/// Stop-Sessions, for in-flight replies.
const CONTROLLER_STOP_GRACE: Duration = Duration::from_secs(5);

/// Resolves the shared endpoint options, failing closed on an unknown DSCP
/// name so the process exits non-zero rather than silently using TOS=0.
fn resolve_endpoint_config(args: &EndpointArgs) -> anyhow::Result<EndpointConfig> {
    let tos = if let Some(name) = &args.dscp {
        let codepoint = dscp::lookup(name)
            .ok_or_else(|| anyhow::anyhow!("unknown DSCP name: {name}"))?;
        Some(dscp::tos_byte(codepoint))
    } else if let Some(hex) = &args.tos {
        let hex = hex.trim_start_matches("0x").trim_start_matches("0X");
        Some(u8::from_str_radix(hex, 16)?)
    } else {
        None
    };

    Ok(EndpointConfig {
        tos,
        ttl: args.ttl,
        do_not_fragment: args.do_not_fragment,
    })
}

fn install_signal_flag() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("received interrupt, shutting down");
            flag.store(false, Ordering::Relaxed);
        }
    });
    running
}

/// Same as [`install_signal_flag`], but also closes `endpoint` on SIGINT so
/// a task parked in a blocking `recv()` (idle, with no in-flight traffic to
/// shake it loose) wakes immediately instead of waiting for a signal check
/// it has no way to observe while parked inside the `.await`.
fn install_signal_shutdown(endpoint: Arc<Endpoint>) -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("received interrupt, shutting down");
            flag.store(false, Ordering::Relaxed);
            endpoint.close();
        }
    });
    running
}

fn bind_addr(local: &str, default_port: u16, peer: Option<&str>) -> anyhow::Result<SocketAddr> {
    let parsed = parse_addr(local, default_port);
    let family = match peer {
        Some(peer) => effective_family(&parsed, &parse_addr(peer, default_port)),
        None if parsed.family == Family::Unspecified => Family::V4,
        None => parsed.family,
    };

    let host = if parsed.host.is_empty() {
        wildcard_host(family).to_string()
    } else {
        parsed.host
    };

    let addr = if matches!(family, Family::V6) && !host.starts_with('[') {
        format!("[{host}]:{}", parsed.port)
    } else {
        format!("{host}:{}", parsed.port)
    };

    Ok(addr.parse()?)
}

/// Session-Reflector role: bind, reflect, run until signalled.
pub async fn run_responder(local: &str, endpoint_args: &EndpointArgs) -> anyhow::Result<()> {
    let config = resolve_endpoint_config(endpoint_args)?;
    let addr = bind_addr(local, 20001, None)?;
    let endpoint = Arc::new(Endpoint::bind(addr, config)?);
    log::info!("responder listening on {}", endpoint.local_addr()?);

    let padding = Policy::from_cli(endpoint_args.padding.unwrap_or(-1));
    let peers = PeerMap::default();
    let running = install_signal_shutdown(endpoint.clone());

    reflector::run(&endpoint, &peers, padding, addr.is_ipv6(), running.clone()).await;
    if !running.load(Ordering::Relaxed) {
        log::info!("{}", TwampError::Signalled);
    }
    Ok(())
}

/// Session-Sender role: paced send/receive, then print the report.
pub async fn run_sender(remote: &str, local: &str, interval_ms: u64, count: u32, endpoint_args: &EndpointArgs) -> anyhow::Result<()> {
    let config = resolve_endpoint_config(endpoint_args)?;
    let local_addr = bind_addr(local, 20000, Some(remote))?;
    let remote_parsed = parse_addr(remote, 20001);
    let remote_host = if remote_parsed.host.is_empty() {
        "127.0.0.1".to_string()
    } else {
        remote_parsed.host
    };
    let remote_addr: SocketAddr = format!("{remote_host}:{}", remote_parsed.port).parse()?;

    let endpoint = Arc::new(Endpoint::bind(local_addr, config)?);
    log::info!("sender bound to {}, target {remote_addr}", endpoint.local_addr()?);

    let padding = Policy::from_cli(endpoint_args.padding.unwrap_or(-1));
    let running = install_signal_shutdown(endpoint.clone());

    let sender_config = SenderConfig {
        interval_ms,
        count,
        padding,
        remote: remote_addr,
        is_v6: remote_addr.is_ipv6(),
    };

    let stats = sender::run(&endpoint, sender_config, running.clone()).await;
    if !running.load(Ordering::Relaxed) {
        log::info!("{}", TwampError::Signalled);
    }
    let report = stats.finalize(count as u64);
    print_report(&report);
    Ok(())
}

/// Controller role: Control-Client setup, then Session-Sender, then a
/// grace period before Stop-Sessions.
pub async fn run_controller(remote: &str, local: &str, interval_ms: u64, count: u32, endpoint_args: &EndpointArgs) -> anyhow::Result<()> {
    let remote_parsed = parse_addr(remote, DEFAULT_CONTROL_PORT);
    let server_host = if remote_parsed.host.is_empty() {
        "127.0.0.1".to_string()
    } else {
        remote_parsed.host.clone()
    };
    let server_addr: SocketAddr = format!("{server_host}:{}", remote_parsed.port).parse()?;

    let mut control = ControlChannel::connect(server_addr).await?;

    let dscp_codepoint = endpoint_args
        .dscp
        .as_deref()
        .and_then(dscp::lookup)
        .unwrap_or(0);

    // Wildcard addresses: let the server infer endpoints from the control
    // peer, preserved for compatibility with servers that expect it.
    control
        .request_session(None::<IpAddr>, 0, None::<IpAddr>, 0, 0, 60, dscp_codepoint)
        .await?;
    control.start_sessions().await?;

    run_sender(remote, local, interval_ms, count, endpoint_args).await?;

    tokio::time::sleep(CONTROLLER_STOP_GRACE).await;
    control.stop_sessions(1).await?;

    Ok(())
}

/// Control-Client role: negotiate and start/stop a session, then block
/// on the signal.
pub async fn run_control_client(sender: &str, server: &str, count: u32, endpoint_args: &EndpointArgs) -> anyhow::Result<()> {
    let server_parsed = parse_addr(server, DEFAULT_CONTROL_PORT);
    let host = if server_parsed.host.is_empty() {
        "127.0.0.1".to_string()
    } else {
        server_parsed.host
    };
    let server_addr: SocketAddr = format!("{host}:{}", server_parsed.port).parse()?;

    let mut control = ControlChannel::connect(server_addr).await?;

    let sender_parsed = parse_addr(sender, 20000);
    let sender_ip: Option<IpAddr> = sender_parsed.host.parse().ok();

    let dscp_codepoint = endpoint_args
        .dscp
        .as_deref()
        .and_then(dscp::lookup)
        .unwrap_or(0);

    control
        .request_session(sender_ip, sender_parsed.port, None, 0, 0, 60, dscp_codepoint)
        .await
        .map_err(|e| {
            if let TwampError::ServerRejected(code) = e {
                anyhow::anyhow!("{}", TwampError::ServerRejected(code))
            } else {
                anyhow::anyhow!("{e}")
            }
        })?;

    control.start_sessions().await?;
    log::info!("session started, count={count}");

    let running = install_signal_flag();
    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    log::info!("{}", TwampError::Signalled);

    control.stop_sessions(1).await.ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_defaults_unspecified_to_v4_wildcard() {
        let addr = bind_addr("", 20001, None).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:20001");
    }

    #[test]
    fn bind_addr_with_explicit_port_form() {
        let addr = bind_addr(":20001", 0, None).unwrap();
        assert_eq!(addr.port(), 20001);
    }

    #[test]
    fn bind_addr_picks_v6_when_peer_is_v6() {
        let addr = bind_addr("", 20000, Some("[::1]:40862")).unwrap();
        assert_eq!(addr.to_string(), "[::]:20000");
    }
}
