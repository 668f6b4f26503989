//! Control-Client side of the TCP control channel (C6): connects, reads
//! the greeting, negotiates unauthenticated mode, requests a session,
//! starts and stops it. One TCP stream per call, consumed sequentially —
//! the state machine in §4.6 never needs more than one frame in flight.

use codec::control::{self, MODE_UNAUTHENTICATED};
use std::net::{IpAddr, SocketAddr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::TwampError;

/// TWAMP control channel's default TCP port.
pub const DEFAULT_CONTROL_PORT: u16 = 862;

pub struct ControlChannel {
    stream: TcpStream,
}

impl ControlChannel {
    /// Connects and consumes the Server-Greeting, failing with
    /// `UnsupportedMode` unless the server advertises unauthenticated mode.
    pub async fn connect(server: SocketAddr) -> Result<Self, TwampError> {
        let stream = TcpStream::connect(server)
            .await
            .map_err(|_| TwampError::ControlLinkBroken)?;
        let mut channel = Self { stream };

        let mut greeting = [0u8; control::SERVER_GREETING_LEN];
        channel
            .stream
            .read_exact(&mut greeting)
            .await
            .map_err(|_| TwampError::ControlLinkBroken)?;

        let modes = control::decode_server_greeting(&greeting).map_err(|_| TwampError::ControlLinkBroken)?;
        if modes & MODE_UNAUTHENTICATED == 0 {
            return Err(TwampError::UnsupportedMode);
        }

        let setup = control::encode_setup_response();
        channel
            .stream
            .write_all(&setup)
            .await
            .map_err(|_| TwampError::ControlLinkBroken)?;

        let mut server_start = [0u8; control::SERVER_START_LEN];
        channel
            .stream
            .read_exact(&mut server_start)
            .await
            .map_err(|_| TwampError::ControlLinkBroken)?;

        let accept = control::decode_server_start(&server_start).map_err(|_| TwampError::ControlLinkBroken)?;
        if accept != 0 {
            return Err(TwampError::ServerRejected(accept));
        }

        Ok(channel)
    }

    /// Sends Request-TW-Session and waits for Accept-Session.
    pub async fn request_session(
        &mut self,
        sender_addr: Option<IpAddr>,
        sender_port: u16,
        receiver_addr: Option<IpAddr>,
        receiver_port: u16,
        padding_length: u32,
        timeout_secs: u32,
        dscp: u8,
    ) -> Result<(), TwampError> {
        let request = control::encode_request_session(
            sender_addr,
            sender_port,
            receiver_addr,
            receiver_port,
            padding_length,
            0, // start_time: 0 means "immediately"
            timeout_secs,
            dscp,
        );
        self.stream
            .write_all(&request)
            .await
            .map_err(|_| TwampError::ControlLinkBroken)?;

        let mut accept_session = [0u8; control::ACCEPT_SESSION_LEN];
        self.stream
            .read_exact(&mut accept_session)
            .await
            .map_err(|_| TwampError::ControlLinkBroken)?;

        let accept =
            control::decode_accept_session(&accept_session).map_err(|_| TwampError::ControlLinkBroken)?;
        if accept != 0 {
            return Err(TwampError::ServerRejected(accept));
        }

        Ok(())
    }

    /// Sends Start-Sessions and waits for Start-Ack.
    pub async fn start_sessions(&mut self) -> Result<(), TwampError> {
        let frame = control::encode_start_sessions();
        self.stream
            .write_all(&frame)
            .await
            .map_err(|_| TwampError::ControlLinkBroken)?;

        let mut ack = [0u8; control::START_ACK_LEN];
        self.stream
            .read_exact(&mut ack)
            .await
            .map_err(|_| TwampError::ControlLinkBroken)?;

        Ok(())
    }

    /// Sends Stop-Sessions. No reply is expected.
    pub async fn stop_sessions(&mut self, number_of_sessions: u32) -> Result<(), TwampError> {
        let frame = control::encode_stop_sessions(number_of_sessions);
        self.stream
            .write_all(&frame)
            .await
            .map_err(|_| TwampError::ControlLinkBroken)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn rejects_server_without_unauthenticated_mode() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut greeting = [0u8; control::SERVER_GREETING_LEN];
            greeting[12..16].copy_from_slice(&0u32.to_be_bytes());
            stream.write_all(&greeting).await.unwrap();
        });

        let result = ControlChannel::connect(addr).await;
        assert!(matches!(result, Err(TwampError::UnsupportedMode)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn accepts_and_negotiates_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut greeting = [0u8; control::SERVER_GREETING_LEN];
            greeting[12..16].copy_from_slice(&MODE_UNAUTHENTICATED.to_be_bytes());
            stream.write_all(&greeting).await.unwrap();

            let mut setup = [0u8; control::SETUP_RESPONSE_LEN];
            stream.read_exact(&mut setup).await.unwrap();

            // accept code at byte 15 stays 0.
            let server_start = [0u8; control::SERVER_START_LEN];
            stream.write_all(&server_start).await.unwrap();

            let mut request = [0u8; control::REQUEST_SESSION_LEN];
            stream.read_exact(&mut request).await.unwrap();

            let accept_session = [0u8; control::ACCEPT_SESSION_LEN];
            stream.write_all(&accept_session).await.unwrap();
        });

        let mut channel = ControlChannel::connect(addr).await.unwrap();
        channel
            .request_session(None, 20000, None, 20001, 0, 60, 46)
            .await
            .unwrap();
        server.await.unwrap();
    }
}
