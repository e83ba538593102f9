// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request transport: dispatch contract plus the UDP implementation.
//!
//! The transport owns delivery policy end to end: retransmission of
//! confirmable requests, response correlation by token, and the decision
//! to give up. The engine above only ever sees one terminal
//! [`TransportEvent`] per request.

use super::message::{Message, MessageType};
use super::CODE_EMPTY;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::thread;
use std::time::{Duration, Instant};

/// Completion callback handed to [`Transport::send`]. Invoked exactly once
/// from the transport's execution context; it must not block.
pub type Completion = Box<dyn FnOnce(TransportEvent) + Send + 'static>;

/// Terminal outcome of one request as seen by the transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// A response correlated to the request arrived.
    Response(Message),
    /// The transport gave up waiting (retransmissions exhausted, reset
    /// received, or the socket failed mid-exchange).
    Timeout,
}

/// Request dispatch contract consumed by the exchange coordinator.
pub trait Transport: Send + Sync {
    /// Hand one serialized request to the transport for delivery to `dest`.
    ///
    /// A successful return means the request was accepted and `on_complete`
    /// will be invoked exactly once. An error return means nothing was
    /// dispatched and the callback will never fire.
    fn send(&self, request: &[u8], dest: SocketAddr, on_complete: Completion) -> io::Result<()>;
}

/// UDP transport tuning.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Initial retransmission window for confirmable requests; doubles on
    /// every retransmission.
    pub ack_timeout: Duration,

    /// Retransmissions after the initial send (confirmable requests only).
    pub max_retransmit: u32,

    /// How long to wait for a separate response after an empty ACK, and the
    /// full wait for non-confirmable requests.
    pub response_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        // ACK_TIMEOUT / MAX_RETRANSMIT per RFC 7252 section 4.8
        Self {
            ack_timeout: Duration::from_secs(2),
            max_retransmit: 4,
            response_timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Builder: set the initial retransmission window.
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Builder: set the retransmission count.
    pub fn with_max_retransmit(mut self, count: u32) -> Self {
        self.max_retransmit = count;
        self
    }

    /// Builder: set the separate-response wait.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.ack_timeout.is_zero() {
            return Err("ack_timeout must be > 0");
        }
        if self.response_timeout.is_zero() {
            return Err("response_timeout must be > 0");
        }
        Ok(())
    }
}

/// UDP transport with one worker thread per outstanding request.
///
/// The engine serializes exchanges, so at most one worker exists per
/// coordinator at any time; a fresh ephemeral socket per request keeps
/// stale datagrams from earlier exchanges out of the correlation window.
pub struct UdpTransport {
    config: TransportConfig,
}

impl UdpTransport {
    /// Create a transport with the given tuning.
    pub fn new(config: TransportConfig) -> io::Result<Self> {
        config
            .validate()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        Ok(Self { config })
    }
}

impl Transport for UdpTransport {
    fn send(&self, request: &[u8], dest: SocketAddr, on_complete: Completion) -> io::Result<()> {
        // the request's own header drives correlation and retransmission
        let req = Message::parse(request)?;
        let socket = bind_for(dest)?;
        socket.send_to(request, dest)?;
        log::debug!(
            "[COAP] sent {} bytes to {} mid={:#06x}",
            request.len(),
            dest,
            req.message_id
        );

        let config = self.config.clone();
        let request = request.to_vec();
        let _worker = thread::Builder::new()
            .name("cord-coap-rx".into())
            .spawn(move || {
                let event = wait_for_response(&socket, &request, &req, &config, dest);
                on_complete(event);
            })?;
        Ok(())
    }
}

fn bind_for(dest: SocketAddr) -> io::Result<UdpSocket> {
    let domain = if dest.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    let bind_addr: SocketAddr = if dest.is_ipv6() {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    };
    socket.bind(&bind_addr.into())?;
    Ok(socket.into())
}

/// Receive loop for one exchange: retransmit while unacknowledged, match
/// responses by token, acknowledge separate confirmable responses.
fn wait_for_response(
    socket: &UdpSocket,
    request: &[u8],
    req: &Message,
    config: &TransportConfig,
    dest: SocketAddr,
) -> TransportEvent {
    let confirmable = req.mtype == MessageType::Confirmable;
    let mut attempt = 0u32;
    let mut window = config.ack_timeout;
    let mut deadline = Instant::now()
        + if confirmable {
            window
        } else {
            config.response_timeout
        };
    let mut acked = false;
    let mut buf = [0u8; 2048];

    loop {
        let now = Instant::now();
        if now >= deadline {
            if confirmable && !acked && attempt < config.max_retransmit {
                attempt += 1;
                window *= 2;
                deadline = now + window;
                if let Err(err) = socket.send_to(request, dest) {
                    log::warn!("[COAP] retransmit to {} failed: {}", dest, err);
                    return TransportEvent::Timeout;
                }
                log::debug!(
                    "[COAP] retransmit {}/{} mid={:#06x}",
                    attempt,
                    config.max_retransmit,
                    req.message_id
                );
                continue;
            }
            return TransportEvent::Timeout;
        }

        if socket.set_read_timeout(Some(deadline - now)).is_err() {
            return TransportEvent::Timeout;
        }
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                continue;
            }
            Err(e) => {
                log::warn!("[COAP] recv failed: {}", e);
                return TransportEvent::Timeout;
            }
        };
        if from != dest {
            log::debug!("[COAP] ignoring datagram from {}", from);
            continue;
        }
        let msg = match Message::parse(&buf[..len]) {
            Ok(msg) => msg,
            Err(e) => {
                log::debug!("[COAP] unparseable datagram from {}: {}", from, e);
                continue;
            }
        };

        match msg.mtype {
            MessageType::Acknowledgement if msg.message_id == req.message_id => {
                if msg.code == CODE_EMPTY {
                    // separate response pending
                    acked = true;
                    deadline = Instant::now() + config.response_timeout;
                    continue;
                }
                if msg.token == req.token {
                    return TransportEvent::Response(msg);
                }
            }
            MessageType::Reset if msg.message_id == req.message_id => {
                log::debug!("[COAP] reset from {} mid={:#06x}", from, req.message_id);
                return TransportEvent::Timeout;
            }
            MessageType::Confirmable | MessageType::NonConfirmable
                if msg.token == req.token && msg.code != CODE_EMPTY =>
            {
                if msg.mtype == MessageType::Confirmable {
                    let ack = Message {
                        mtype: MessageType::Acknowledgement,
                        code: CODE_EMPTY,
                        message_id: msg.message_id,
                        token: Vec::new(),
                        options: Vec::new(),
                        payload: Vec::new(),
                    };
                    if let Err(err) = socket.send_to(&ack.encode(), dest) {
                        log::debug!("[COAP] ack to {} failed: {}", dest, err);
                    }
                }
                return TransportEvent::Response(msg);
            }
            _ => {}
        }
    }
}
