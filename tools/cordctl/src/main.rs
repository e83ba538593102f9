// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! cordctl: resource directory lookup from the command line.
//!
//! Bootstraps against the given directory, then runs one lookup:
//! a decoded resource/endpoint lookup or a raw filtered query.

use cord::{
    Filter, FilterChain, Link, LinkParam, LookupKind, RdClient, TransportConfig, UdpTransport,
    DEFAULT_PORT, FORMAT_LINK,
};
use std::net::{IpAddr, SocketAddr};
use std::process;
use std::sync::Arc;

const RESULT_BUF_SIZE: usize = 1024;
const MAX_RESULT_PARAMS: usize = 5;

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        print_usage();
        process::exit(1);
    }

    let remote = match parse_endpoint(&args[1]) {
        Some(addr) => addr,
        None => {
            eprintln!("error: unable to parse address '{}'", args[1]);
            process::exit(1);
        }
    };

    let transport = match UdpTransport::new(TransportConfig::default()) {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            eprintln!("error: transport setup failed: {}", e);
            process::exit(1);
        }
    };
    let mut rd = RdClient::new(remote, transport);

    println!("Performing lookup now, this may take a short while...");
    let mut rdbuf = [0u8; 2 * RESULT_BUF_SIZE];
    if let Err(e) = rd.bootstrap(&mut rdbuf) {
        eprintln!("error: bootstrap against {} failed: {}", remote, e);
        process::exit(1);
    }

    let (kind, filter_start) = match args[2].as_str() {
        "raw" if args.len() > 3 => match parse_kind(&args[3]) {
            Some(kind) => (kind, 4),
            None => {
                print_usage();
                process::exit(1);
            }
        },
        command => match parse_kind(command) {
            Some(kind) => (kind, 3),
            None => {
                print_usage();
                process::exit(1);
            }
        },
    };

    let pairs: Vec<(String, String)> = args[filter_start..].iter().map(|a| split_filter(a)).collect();
    let filters: Vec<Filter<'_>> = pairs
        .iter()
        .map(|(key, value)| Filter::new(key, value))
        .collect();
    let chain = FilterChain::new(&filters);

    let mut buf = [0u8; RESULT_BUF_SIZE];
    if args[2] == "raw" {
        match rd.lookup_raw(FORMAT_LINK, kind, &chain, &mut buf) {
            Ok(len) => {
                println!("Lookup result:");
                println!("{}", String::from_utf8_lossy(&buf[..len]));
            }
            Err(e) => {
                eprintln!("Error during lookup: {}", e);
                process::exit(1);
            }
        }
    } else {
        let mut params = [LinkParam::default(); MAX_RESULT_PARAMS];
        let result = match kind {
            LookupKind::Resource => rd.lookup_resource(&chain, &mut params, &mut buf),
            LookupKind::Endpoint => rd.lookup_endpoint(&chain, &mut params, &mut buf),
        };
        match result {
            Ok(link) => print_link(&link, &params),
            Err(e) => {
                eprintln!("Error during lookup: {}", e);
                process::exit(1);
            }
        }
    }
}

fn print_link(link: &Link<'_>, params: &[LinkParam<'_>]) {
    println!("Found resource/endpoint");
    println!("Target: {}", link.target);
    for param in &params[..link.param_count] {
        println!("Key: {}", param.key);
        println!("Value: {}", param.value.unwrap_or(""));
    }
}

fn parse_kind(arg: &str) -> Option<LookupKind> {
    match arg {
        "resource" => Some(LookupKind::Resource),
        "endpoint" => Some(LookupKind::Endpoint),
        _ => None,
    }
}

/// Parse `host:port`, falling back to the default CoAP port when the
/// argument is a bare (possibly bracketed) IP address.
fn parse_endpoint(input: &str) -> Option<SocketAddr> {
    if let Ok(addr) = input.parse::<SocketAddr>() {
        return Some(addr);
    }
    let bare = input
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(input);
    bare.parse::<IpAddr>()
        .ok()
        .map(|ip| SocketAddr::new(ip, DEFAULT_PORT))
}

/// Split a `key=value` argument; a bare `key` gets an empty value.
fn split_filter(arg: &str) -> (String, String) {
    match arg.split_once('=') {
        Some((key, value)) => (key.to_string(), value.to_string()),
        None => (arg.to_string(), String::new()),
    }
}

fn print_usage() {
    println!(
        "usage: cordctl <server-addr> {{ resource | endpoint | raw {{ resource | endpoint }} }} [key=value ...]"
    );
    println!("example: cordctl [2001:db8:3::dead:beef]:5683 raw resource count=1 page=2");
}
