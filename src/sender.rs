//! Session-Sender loop (C5): absolute-deadline-accumulation pacing,
//! interleaved with a non-blocking receive drain, feeding matched replies
//! into `Statistics`.

use codec::packet::{decode_reply, encode_request, REPLY_MIN_LEN_FOR_SENDER};
use codec::timestamp::now;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::net::udp::Endpoint;
use crate::padding::Policy;
use crate::stats::Statistics;

/// Grace period after the last scheduled send, to let lingering replies in.
const END_GRACE_SECS: f64 = 5.0;

pub struct SenderConfig {
    pub interval_ms: u64,
    pub count: u32,
    pub padding: Policy,
    pub remote: SocketAddr,
    pub is_v6: bool,
}

/// Drives the paced send/receive loop to completion (or until `running` is
/// cleared) and returns the filled-in statistics accumulator.
pub async fn run(endpoint: &Endpoint, config: SenderConfig, running: Arc<AtomicBool>) -> Statistics {
    let mut stats = Statistics::new();
    let interval = config.interval_ms as f64 / 1000.0;

    let mut idx: u32 = 0;
    let mut schedule_time = now();
    let end_time = schedule_time + config.count as f64 * interval + END_GRACE_SECS;
    let mut done_signalled = false;

    while running.load(Ordering::Relaxed) {
        // 1. Drain receive queue non-blocking.
        while endpoint.poll(Duration::from_secs(0)).await {
            let (bytes, _peer) = match endpoint.recv().await {
                Ok(v) => v,
                Err(_) => break,
            };

            if bytes.len() < REPLY_MIN_LEN_FOR_SENDER {
                log::debug!("short reply ({} bytes), dropped", bytes.len());
                continue;
            }

            let view = match decode_reply(&bytes) {
                Ok(v) => v,
                Err(e) => {
                    log::info!("malformed reply: {e}");
                    continue;
                }
            };

            let t4 = now();
            let t1 = view.send_timestamp_echoed;
            let t2 = view.receiver_timestamp;
            let t3 = view.send_timestamp;

            let delay_ob = (t2 - t1).max(0.0) * 1000.0;
            let delay_ib = (t4 - t3).max(0.0) * 1000.0;
            let delay_rt = ((t4 - t1) - (t3 - t2)).max(0.0) * 1000.0;

            stats.add(delay_rt, delay_ob, delay_ib, view.receiver_seq, view.sender_seq_echoed);

            if view.sender_seq_echoed + 1 == config.count {
                done_signalled = true;
            }
        }

        // 2. Send if due.
        let t = now();
        if t >= schedule_time && idx < config.count {
            let pad_len = config.padding.pick(config.is_v6);
            let request = encode_request(idx, t, pad_len);
            if let Err(e) = endpoint.send(&request, config.remote).await {
                log::debug!("send to {} failed: {e}", config.remote);
            }
            schedule_time += interval;
            idx += 1;
        }

        if idx == config.count && (done_signalled || now() > end_time) {
            break;
        }

        // 3. Sleep interruptibly until the next deadline.
        let wait_until = schedule_time.min(end_time);
        let remaining = (wait_until - now()).max(0.0);
        endpoint.poll(Duration::from_secs_f64(remaining)).await;

        if now() > end_time {
            break;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::udp::EndpointConfig;

    #[tokio::test]
    async fn loopback_100_packets_zero_loss() {
        let reflector_peers = Arc::new(crate::reflector::PeerMap::default());
        let reflector_endpoint = Arc::new(
            Endpoint::bind("127.0.0.1:0".parse().unwrap(), EndpointConfig::default()).unwrap(),
        );
        let reflector_addr = reflector_endpoint.local_addr().unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let (r_ep, r_peers, r_running) = (
            reflector_endpoint.clone(),
            reflector_peers.clone(),
            running.clone(),
        );
        let reflector_task = tokio::spawn(async move {
            crate::reflector::run(&r_ep, &r_peers, Policy::Fixed(0), false, r_running).await;
        });

        let sender_endpoint =
            Endpoint::bind("127.0.0.1:0".parse().unwrap(), EndpointConfig::default()).unwrap();

        let config = SenderConfig {
            interval_ms: 1,
            count: 100,
            padding: Policy::Fixed(0),
            remote: reflector_addr,
            is_v6: false,
        };

        let stats = run(&sender_endpoint, config, running.clone()).await;
        let report = stats.finalize(100);

        assert_eq!(report.received, 100);
        assert_eq!(report.roundtrip.unwrap().loss_pct, 0.0);

        running.store(false, Ordering::Relaxed);
        reflector_task.abort();
    }
}
