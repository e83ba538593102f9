// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Minimal CoAP client support (RFC 7252 subset).
//!
//! Just enough of the protocol for a lookup client: confirmable GET
//! requests with Uri-Path/Uri-Query/Accept options, response correlation by
//! token, and a UDP transport with retransmission.

pub mod message;
pub mod transport;

pub use message::{Message, MessageType, RequestBuilder};
pub use transport::{Completion, Transport, TransportConfig, TransportEvent, UdpTransport};

/// Default CoAP UDP port.
pub const DEFAULT_PORT: u16 = 5683;

/// application/link-format content format (RFC 6690).
pub const FORMAT_LINK: u16 = 40;

/// Method code GET (0.01).
pub const METHOD_GET: u8 = 0x01;

/// Response code 2.05 Content.
pub const CODE_CONTENT: u8 = 0x45;

/// Empty message code (bare ACK/RST).
pub const CODE_EMPTY: u8 = 0x00;

// Option numbers used by the lookup client.
pub const OPT_URI_PATH: u16 = 11;
pub const OPT_CONTENT_FORMAT: u16 = 12;
pub const OPT_URI_QUERY: u16 = 15;
pub const OPT_ACCEPT: u16 = 17;
