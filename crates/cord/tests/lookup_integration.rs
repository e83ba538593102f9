// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end lookup tests against a scripted UDP resource directory.
//!
//! A background thread plays the directory on a loopback socket; the
//! client side runs through the real UDP transport, so these tests cover
//! request encoding, correlation, and the full bootstrap/lookup flow.

use cord::coap::{
    Message, MessageType, CODE_CONTENT, CODE_EMPTY, OPT_CONTENT_FORMAT, OPT_URI_QUERY,
};
use cord::{
    decode_link, Error, Filter, FilterChain, LinkParam, LookupKind, RdClient, TransportConfig,
    UdpTransport, FORMAT_LINK,
};
use std::net::{SocketAddr, UdpSocket};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const BOOTSTRAP_PAYLOAD: &[u8] =
    b"</rd-lookup/res>;rt=\"core.rd-lookup-res\",</rd-lookup/ep>;rt=\"core.rd-lookup-ep\"";

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn default_transport() -> Arc<UdpTransport> {
    Arc::new(UdpTransport::new(TransportConfig::default()).unwrap())
}

/// Spawn a directory that answers every request with a piggybacked
/// link-format response.
fn spawn_directory() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(20)))
        .unwrap();

    thread::spawn(move || {
        let mut buf = [0u8; 2048];
        while let Ok((len, from)) = socket.recv_from(&mut buf) {
            let req = match Message::parse(&buf[..len]) {
                Ok(req) => req,
                Err(_) => continue,
            };
            let response = Message {
                mtype: MessageType::Acknowledgement,
                code: CODE_CONTENT,
                message_id: req.message_id,
                token: req.token.clone(),
                options: vec![(OPT_CONTENT_FORMAT, vec![40])],
                payload: directory_payload(&req),
            };
            let _ = socket.send_to(&response.encode(), from);
        }
    });
    addr
}

fn directory_payload(req: &Message) -> Vec<u8> {
    let queries: Vec<String> = req
        .option_values(OPT_URI_QUERY)
        .map(|q| String::from_utf8_lossy(q).into_owned())
        .collect();
    let page = queries
        .iter()
        .find_map(|q| q.strip_prefix("page="))
        .unwrap_or("0");

    match req.uri_path().as_str() {
        "/.well-known/core" => BOOTSTRAP_PAYLOAD.to_vec(),
        "/rd-lookup/res" => match page {
            "0" => b"</sensors/temp>;rt=\"temperature\";ct=40".to_vec(),
            "1" => b"</sensors/hum>;rt=\"humidity\"".to_vec(),
            _ => Vec::new(), // pages exhausted
        },
        "/rd-lookup/ep" => match page {
            "0" => b"</ep/node-1>;ep=\"node-1\"".to_vec(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[test]
fn test_bootstrap_discovers_interfaces_over_udp() {
    init_logs();
    let addr = spawn_directory();
    let mut rd = RdClient::new(addr, default_transport());

    let mut buf = [0u8; 1024];
    let consumed = rd.bootstrap(&mut buf).unwrap();
    assert_eq!(consumed, BOOTSTRAP_PAYLOAD.len());
    assert_eq!(rd.resource_interface(), Some("/rd-lookup/res"));
    assert_eq!(rd.endpoint_interface(), Some("/rd-lookup/ep"));
}

#[test]
fn test_raw_lookup_end_to_end() {
    init_logs();
    let addr = spawn_directory();
    let mut rd = RdClient::new(addr, default_transport());

    let mut buf = [0u8; 1024];
    rd.bootstrap(&mut buf).unwrap();

    let filters = [Filter::new("count", "1"), Filter::new("page", "0")];
    let chain = FilterChain::new(&filters);
    let len = rd
        .lookup_raw(FORMAT_LINK, LookupKind::Resource, &chain, &mut buf)
        .unwrap();
    assert!(len > 0);

    let mut params = [LinkParam::default(); 4];
    let (link, _) = decode_link(&buf[..len], &mut params).unwrap();
    assert_eq!(link.target, "/sensors/temp");
    assert_eq!(params[0].value, Some("temperature"));
}

#[test]
fn test_paginated_lookup_walks_and_resets() {
    init_logs();
    let addr = spawn_directory();
    let mut rd = RdClient::new(addr, default_transport());

    let mut buf = [0u8; 1024];
    rd.bootstrap(&mut buf).unwrap();

    let chain = FilterChain::default();

    let mut params = [LinkParam::default(); 4];
    let mut buf = [0u8; 1024];
    let first = rd.lookup_resource(&chain, &mut params, &mut buf).unwrap();
    assert_eq!(first.target, "/sensors/temp");

    let mut params = [LinkParam::default(); 4];
    let mut buf = [0u8; 1024];
    let second = rd.lookup_resource(&chain, &mut params, &mut buf).unwrap();
    assert_eq!(second.target, "/sensors/hum");

    let mut params = [LinkParam::default(); 4];
    let mut buf = [0u8; 1024];
    let err = rd.lookup_resource(&chain, &mut params, &mut buf).unwrap_err();
    assert!(matches!(err, Error::NoResource));

    // cursor reset: the walk starts over
    let mut params = [LinkParam::default(); 4];
    let mut buf = [0u8; 1024];
    let again = rd.lookup_resource(&chain, &mut params, &mut buf).unwrap();
    assert_eq!(again.target, "/sensors/temp");

    // the endpoint cursor was never touched
    let mut params = [LinkParam::default(); 4];
    let mut buf = [0u8; 1024];
    let ep = rd.lookup_endpoint(&chain, &mut params, &mut buf).unwrap();
    assert_eq!(ep.target, "/ep/node-1");
}

#[test]
fn test_silent_directory_times_out() {
    init_logs();
    // bound socket that never answers
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();

    let config = TransportConfig::default()
        .with_ack_timeout(Duration::from_millis(50))
        .with_max_retransmit(1);
    let transport = Arc::new(UdpTransport::new(config).unwrap());
    let mut rd = RdClient::new(addr, transport);

    let mut buf = [0u8; 256];
    let err = rd.bootstrap(&mut buf).unwrap_err();
    assert!(matches!(err, Error::Timeout));
    drop(socket);
}

#[test]
fn test_separate_response_is_acknowledged() {
    init_logs();
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let mut buf = [0u8; 2048];
        let (len, from) = socket.recv_from(&mut buf).unwrap();
        let req = Message::parse(&buf[..len]).unwrap();

        // defer: empty ACK now, response in its own confirmable message
        let ack = Message {
            mtype: MessageType::Acknowledgement,
            code: CODE_EMPTY,
            message_id: req.message_id,
            token: Vec::new(),
            options: Vec::new(),
            payload: Vec::new(),
        };
        socket.send_to(&ack.encode(), from).unwrap();
        thread::sleep(Duration::from_millis(50));

        let response_mid = req.message_id.wrapping_add(111);
        let response = Message {
            mtype: MessageType::Confirmable,
            code: CODE_CONTENT,
            message_id: response_mid,
            token: req.token.clone(),
            options: vec![(OPT_CONTENT_FORMAT, vec![40])],
            payload: BOOTSTRAP_PAYLOAD.to_vec(),
        };
        socket.send_to(&response.encode(), from).unwrap();

        socket
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let (len, _) = socket.recv_from(&mut buf).unwrap();
        let client_ack = Message::parse(&buf[..len]).unwrap();
        tx.send((client_ack, response_mid)).unwrap();
    });

    let mut rd = RdClient::new(addr, default_transport());
    let mut buf = [0u8; 1024];
    rd.bootstrap(&mut buf).unwrap();
    assert_eq!(rd.resource_interface(), Some("/rd-lookup/res"));

    let (client_ack, response_mid) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(client_ack.mtype, MessageType::Acknowledgement);
    assert_eq!(client_ack.code, CODE_EMPTY);
    assert_eq!(client_ack.message_id, response_mid);
}
