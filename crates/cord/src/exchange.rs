// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Exchange coordination: one lookup in flight, blocking hand-off.
//!
//! A coordinator turns the transport's callback-style completion into a
//! synchronous call. [`ExchangeCoordinator::begin`] takes the single
//! in-flight slot (a mutex held for the whole exchange, so concurrent
//! callers queue in arrival order); `submit_and_wait` then dispatches the
//! request and blocks on a bounded one-slot channel until the transport
//! signals the one terminal outcome. The channel send/receive pair is the
//! hand-off: the outcome is fully written before the waiter resumes, and
//! each exchange owns its own channel, so there is no shared mutable state
//! between exchanges.

use crate::coap::transport::{Transport, TransportEvent};
use crate::error::{Error, Result};
use crossbeam::channel;
use parking_lot::{Mutex, MutexGuard};
use std::net::SocketAddr;

/// Serializes lookups and performs the request/response hand-off.
#[derive(Debug, Default)]
pub struct ExchangeCoordinator {
    lock: Mutex<()>,
}

/// Exclusive ownership of the in-flight slot for one exchange.
///
/// Dropping the guard releases the slot.
pub struct Exchange<'a> {
    _slot: MutexGuard<'a, ()>,
}

/// Outcome classified by the completion path and carried over the channel.
enum Outcome {
    Payload(Vec<u8>),
    NoResource,
    Timeout,
}

impl ExchangeCoordinator {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
        }
    }

    /// Acquire the in-flight slot, blocking while another exchange is
    /// active on this coordinator.
    pub fn begin(&self) -> Exchange<'_> {
        Exchange {
            _slot: self.lock.lock(),
        }
    }
}

impl Exchange<'_> {
    /// Send `request` to `dest` and block until the transport signals the
    /// single terminal outcome.
    ///
    /// On success the response body is copied into `out`, bytes past the
    /// body are zeroed, and the body length is returned. A body at least as
    /// large as `out` is discarded and reported as [`Error::Overflow`]. A
    /// response whose content format differs from `expect_format`, or with
    /// an empty body, is [`Error::NoResource`]. On every outcome other than
    /// success `out` is fully zeroed, so stale bytes from an earlier
    /// exchange can never be read.
    pub fn submit_and_wait(
        &mut self,
        transport: &dyn Transport,
        request: &[u8],
        dest: SocketAddr,
        expect_format: u16,
        out: &mut [u8],
    ) -> Result<usize> {
        let (tx, rx) = channel::bounded(1);
        let on_complete = Box::new(move |event: TransportEvent| {
            let outcome = match event {
                TransportEvent::Response(msg) => {
                    if msg.content_format() != Some(expect_format) {
                        log::debug!(
                            "[EXCHANGE] media type {:?} from {}, want {}",
                            msg.content_format(),
                            dest,
                            expect_format
                        );
                        Outcome::NoResource
                    } else if msg.payload.is_empty() {
                        Outcome::NoResource
                    } else {
                        Outcome::Payload(msg.payload)
                    }
                }
                TransportEvent::Timeout => Outcome::Timeout,
            };
            // a dropped receiver only means the exchange already failed out
            let _ = tx.send(outcome);
        });

        if let Err(err) = transport.send(request, dest, on_complete) {
            out.fill(0);
            return Err(Error::Io(err));
        }

        match rx.recv() {
            Ok(Outcome::Payload(payload)) => {
                if payload.len() >= out.len() {
                    out.fill(0);
                    Err(Error::Overflow)
                } else {
                    out[..payload.len()].copy_from_slice(&payload);
                    out[payload.len()..].fill(0);
                    Ok(payload.len())
                }
            }
            Ok(Outcome::NoResource) => {
                out.fill(0);
                Err(Error::NoResource)
            }
            Ok(Outcome::Timeout) => {
                out.fill(0);
                Err(Error::Timeout)
            }
            Err(_) => {
                out.fill(0);
                Err(Error::Internal(
                    "transport dropped the completion without signaling".into(),
                ))
            }
        }
    }
}
