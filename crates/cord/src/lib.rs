// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # cord - CoRE Resource Directory lookup client
//!
//! A pure Rust client for looking up resources and endpoints in a CoRE
//! Resource Directory (RFC 9176) over CoAP. The asynchronous
//! request/response exchange is wrapped into synchronous calls, so
//! straight-line application code can bootstrap a directory handle and
//! page through lookup results without dealing with callbacks.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cord::{FilterChain, LinkParam, RdClient, Result, TransportConfig, UdpTransport};
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let transport = Arc::new(UdpTransport::new(TransportConfig::default())?);
//!     let mut rd = RdClient::new("[2001:db8::1]:5683".parse().unwrap(), transport);
//!
//!     // Discover the directory's lookup interfaces
//!     let mut buf = [0u8; 1024];
//!     rd.bootstrap(&mut buf)?;
//!
//!     // Fetch result links one page at a time
//!     let mut params = [LinkParam::default(); 5];
//!     let link = rd.lookup_resource(&FilterChain::default(), &mut params, &mut buf)?;
//!     println!("found {}", link.target);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +------------------------------------------------------------------+
//! |                     Application / cordctl                        |
//! +------------------------------------------------------------------+
//! |  RdClient: bootstrap | raw lookup | paginated typed lookup       |
//! +------------------------------------------------------------------+
//! |  ExchangeCoordinator: one in-flight exchange, blocking hand-off  |
//! +------------------------------------------------------------------+
//! |  Transport (UDP/CoAP): retransmission, correlation, timeout      |
//! +------------------------------------------------------------------+
//! ```
//!
//! Only one exchange is ever in flight per coordinator; concurrent
//! callers queue on the coordinator's lock in arrival order.

/// Resource directory handle and lookup operations.
pub mod client;
/// Minimal CoAP codec and the UDP request transport.
pub mod coap;
/// Error types.
pub mod error;
/// Single-in-flight exchange coordination.
pub mod exchange;
/// Lookup filter model.
pub mod filter;
/// Link-format (RFC 6690) decoding.
pub mod link;

pub use client::{LookupKind, RdClient, WELL_KNOWN_CORE};
pub use coap::{
    Transport, TransportConfig, TransportEvent, UdpTransport, DEFAULT_PORT, FORMAT_LINK,
};
pub use error::{Error, Result};
pub use exchange::ExchangeCoordinator;
pub use filter::{Filter, FilterChain, MAX_FILTER_COMPONENT};
pub use link::{decode_link, Link, LinkError, LinkParam};
