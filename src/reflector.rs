//! Session-Reflector (C4): per-peer sequence-number state machine, replies
//! to every well-formed request until told to stop.

use ahash::AHashMap;
use codec::packet::{decode_request, encode_reply, REQUEST_HEADER_LEN};
use codec::timestamp::now;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::net::udp::Endpoint;
use crate::padding::Policy;

/// Peer-Session reset window: a peer idle this long starts over at rseq 0.
const PEER_TIMEOUT_SECS: f64 = 30.0;

#[derive(Debug, Clone, Copy)]
struct PeerSession {
    next_rseq: u32,
    expiry_deadline: f64,
}

/// Per-peer reflector state, exposed read-only for a status/debug hook.
#[derive(Default)]
pub struct PeerMap(Mutex<AHashMap<SocketAddr, PeerSession>>);

impl PeerMap {
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }
}

/// Runs the reflector loop until `running` is cleared or the socket closes.
/// `padding` picks the reply's trailing pad length per datagram. Takes the
/// endpoint and peer map by reference so a caller holding an `Arc` of each
/// can keep a status/debug hook alive alongside the loop.
pub async fn run(
    endpoint: &Endpoint,
    peers: &PeerMap,
    padding: Policy,
    is_v6: bool,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Relaxed) {
        let (bytes, peer) = match endpoint.recv().await {
            Ok(v) => v,
            Err(e) => {
                log::debug!("reflector recv ended: {e}");
                break;
            }
        };

        if bytes.len() < REQUEST_HEADER_LEN {
            log::debug!("short datagram from {peer} ({} bytes), dropped", bytes.len());
            continue;
        }

        let request = match decode_request(&bytes) {
            Ok(r) => r,
            Err(e) => {
                log::info!("malformed frame from {peer}: {e}");
                continue;
            }
        };

        let t2 = now();
        let rseq = {
            let mut map = peers.0.lock();
            let session = map.entry(peer).or_insert(PeerSession {
                next_rseq: 0,
                expiry_deadline: t2 + PEER_TIMEOUT_SECS,
            });

            if session.expiry_deadline < t2 || request.sender_seq == 0 {
                session.next_rseq = 0;
            }

            let rseq = session.next_rseq;
            session.next_rseq = rseq + 1;
            session.expiry_deadline = t2 + PEER_TIMEOUT_SECS;
            rseq
        };

        let pad_len = padding.pick(is_v6);
        let reply = match encode_reply(rseq, t2, t2, &bytes, pad_len) {
            Ok(r) => r,
            Err(e) => {
                log::info!("failed to build reply for {peer}: {e}");
                continue;
            }
        };

        if let Err(e) = endpoint.send(&reply, peer).await {
            log::debug!("reflector send to {peer} failed: {e}");
        }
    }
}
