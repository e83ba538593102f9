// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Resource directory lookup client.
//!
//! One [`RdClient`] represents one directory association. `bootstrap`
//! discovers the directory's lookup interfaces from `/.well-known/core`;
//! after that, `lookup_raw` runs filtered queries and
//! `lookup_resource`/`lookup_endpoint` page through the result set one
//! link per call.

use crate::coap::{RequestBuilder, Transport, FORMAT_LINK};
use crate::error::{Error, Result};
use crate::exchange::ExchangeCoordinator;
use crate::filter::{Filter, FilterChain};
use crate::link::{decode_link, Link, LinkParam};
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

/// Well-known discovery path queried during bootstrap.
pub const WELL_KNOWN_CORE: &str = "/.well-known/core";

const RT_LOOKUP_WILDCARD: &str = "core.rd-lookup-*";
const RT_LOOKUP_RES: &str = "core.rd-lookup-res";
const RT_LOOKUP_EP: &str = "core.rd-lookup-ep";

/// Parameter slots available while decoding the bootstrap payload.
const BOOTSTRAP_PARAMS: usize = 8;

/// Which lookup interface a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Resource,
    Endpoint,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resource => "resource",
            Self::Endpoint => "endpoint",
        })
    }
}

/// One resource directory association.
///
/// Holds the remote address, the interface paths discovered by
/// [`RdClient::bootstrap`], and one page cursor per lookup kind. A cursor
/// advances only after a lookup decoded a link and resets to the first
/// page only when the directory reports the pages exhausted, so a caller
/// can simply loop a typed lookup until [`Error::NoResource`].
///
/// The handle itself is not meant to be shared between threads without
/// external synchronization; exchanges issued through the same coordinator
/// are serialized regardless.
pub struct RdClient {
    remote: SocketAddr,
    transport: Arc<dyn Transport>,
    coordinator: Arc<ExchangeCoordinator>,
    res_lookif: Option<String>,
    ep_lookif: Option<String>,
    res_page: u32,
    ep_page: u32,
}

impl RdClient {
    /// Create a handle for the directory at `remote` with its own
    /// exchange coordinator.
    pub fn new(remote: SocketAddr, transport: Arc<dyn Transport>) -> Self {
        Self::with_coordinator(remote, transport, Arc::new(ExchangeCoordinator::new()))
    }

    /// Create a handle sharing an exchange coordinator, so lookups against
    /// several directories serialize on one in-flight slot.
    pub fn with_coordinator(
        remote: SocketAddr,
        transport: Arc<dyn Transport>,
        coordinator: Arc<ExchangeCoordinator>,
    ) -> Self {
        Self {
            remote,
            transport,
            coordinator,
            res_lookif: None,
            ep_lookif: None,
            res_page: 0,
            ep_page: 0,
        }
    }

    /// Remote directory address.
    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Resource lookup interface path, once bootstrap discovered one.
    pub fn resource_interface(&self) -> Option<&str> {
        self.res_lookif.as_deref()
    }

    /// Endpoint lookup interface path, once bootstrap discovered one.
    pub fn endpoint_interface(&self) -> Option<&str> {
        self.ep_lookif.as_deref()
    }

    /// Discover the directory's lookup interfaces.
    ///
    /// Queries `/.well-known/core?rt=core.rd-lookup-*` and walks the
    /// returned records until a resource-lookup and an endpoint-lookup
    /// interface were both seen or the payload is exhausted. Finding only
    /// one of the two is a success; finding neither is
    /// [`Error::NoResource`]. Returns the number of payload bytes
    /// consumed. `buf` is scratch space for the response and must outlast
    /// nothing; the discovered paths are stored in the handle.
    pub fn bootstrap(&mut self, buf: &mut [u8]) -> Result<usize> {
        let request = RequestBuilder::get(WELL_KNOWN_CORE)
            .confirmable()
            .query("rt", RT_LOOKUP_WILDCARD)
            .finish();

        let mut exchange = self.coordinator.begin();
        let len =
            exchange.submit_and_wait(&*self.transport, &request, self.remote, FORMAT_LINK, buf)?;
        drop(exchange);

        let payload = &buf[..len];
        let mut params = [LinkParam::default(); BOOTSTRAP_PARAMS];
        let mut params_used = 0;
        let mut parsed = 0;
        let mut res_lookif = None;
        let mut ep_lookif = None;
        while (res_lookif.is_none() || ep_lookif.is_none()) && parsed < len {
            let (link, consumed) = decode_link(&payload[parsed..], &mut params[params_used..])?;
            if consumed == 0 {
                break;
            }
            for param in &params[params_used..params_used + link.param_count] {
                match param.value {
                    Some(RT_LOOKUP_RES) => res_lookif = Some(link.target.to_string()),
                    Some(RT_LOOKUP_EP) => ep_lookif = Some(link.target.to_string()),
                    _ => {}
                }
            }
            params_used += link.param_count;
            parsed += consumed;
        }

        if res_lookif.is_none() && ep_lookif.is_none() {
            log::debug!(
                "[RD] no lookup interfaces in {} payload bytes from {}",
                len,
                self.remote
            );
            return Err(Error::NoResource);
        }
        log::debug!(
            "[RD] bootstrap done res={:?} ep={:?}",
            res_lookif,
            ep_lookif
        );
        self.res_lookif = res_lookif;
        self.ep_lookif = ep_lookif;
        Ok(parsed)
    }

    /// Raw filtered lookup against a discovered interface.
    ///
    /// Emits one query parameter per filter in chain order, requests
    /// `content_format` via the Accept option, and returns the number of
    /// response bytes written to `buf`. Outcomes from the exchange are
    /// forwarded unchanged.
    pub fn lookup_raw(
        &mut self,
        content_format: u16,
        kind: LookupKind,
        filters: &FilterChain<'_>,
        buf: &mut [u8],
    ) -> Result<usize> {
        self.lookup_raw_with(content_format, kind, filters.iter(), buf)
    }

    /// Look up one resource link, paging through the directory.
    ///
    /// Appends `count=1`,`page=<cursor>` behind the caller's filters (the
    /// caller chain is never modified), decodes exactly one record into
    /// `params`, and advances the resource page cursor. When the directory
    /// reports the pages exhausted the cursor resets to the first page and
    /// [`Error::NoResource`] is returned.
    pub fn lookup_resource<'buf>(
        &mut self,
        filters: &FilterChain<'_>,
        params: &mut [LinkParam<'buf>],
        buf: &'buf mut [u8],
    ) -> Result<Link<'buf>> {
        self.lookup_one(LookupKind::Resource, filters, params, buf)
    }

    /// Look up one endpoint link, paging through the directory.
    ///
    /// Same pagination contract as [`RdClient::lookup_resource`], against
    /// the endpoint lookup interface and its own page cursor.
    pub fn lookup_endpoint<'buf>(
        &mut self,
        filters: &FilterChain<'_>,
        params: &mut [LinkParam<'buf>],
        buf: &'buf mut [u8],
    ) -> Result<Link<'buf>> {
        self.lookup_one(LookupKind::Endpoint, filters, params, buf)
    }

    fn lookup_raw_with<'f>(
        &mut self,
        content_format: u16,
        kind: LookupKind,
        filters: impl Iterator<Item = Filter<'f>>,
        buf: &mut [u8],
    ) -> Result<usize> {
        let lookif = match kind {
            LookupKind::Resource => self.res_lookif.as_deref(),
            LookupKind::Endpoint => self.ep_lookif.as_deref(),
        }
        .ok_or(Error::InterfaceNotDiscovered(kind))?;

        let mut request = RequestBuilder::get(lookif).confirmable();
        for filter in filters {
            filter.validate()?;
            request = request.query(filter.key, filter.value);
        }
        let request = request.accept(content_format).finish();

        let mut exchange = self.coordinator.begin();
        let len = exchange.submit_and_wait(
            &*self.transport,
            &request,
            self.remote,
            content_format,
            buf,
        )?;
        log::debug!("[RD] {} lookup returned {} bytes", kind, len);
        Ok(len)
    }

    fn lookup_one<'buf>(
        &mut self,
        kind: LookupKind,
        filters: &FilterChain<'_>,
        params: &mut [LinkParam<'buf>],
        buf: &'buf mut [u8],
    ) -> Result<Link<'buf>> {
        let page = self.page_cursor(kind).to_string();
        let page_filters = [Filter::new("count", "1"), Filter::new("page", &page)];

        let chained = filters.iter().chain(page_filters.iter().copied());
        let len = match self.lookup_raw_with(FORMAT_LINK, kind, chained, &mut *buf) {
            Ok(len) => len,
            Err(Error::NoResource) => {
                self.reset_page(kind);
                return Err(Error::NoResource);
            }
            Err(err) => return Err(err),
        };

        let payload: &'buf [u8] = buf;
        let (link, _consumed) = decode_link(&payload[..len], params)?;
        self.advance_page(kind);
        Ok(link)
    }

    fn page_cursor(&self, kind: LookupKind) -> u32 {
        match kind {
            LookupKind::Resource => self.res_page,
            LookupKind::Endpoint => self.ep_page,
        }
    }

    fn advance_page(&mut self, kind: LookupKind) {
        match kind {
            LookupKind::Resource => self.res_page += 1,
            LookupKind::Endpoint => self.ep_page += 1,
        }
    }

    fn reset_page(&mut self, kind: LookupKind) {
        match kind {
            LookupKind::Resource => self.res_page = 0,
            LookupKind::Endpoint => self.ep_page = 0,
        }
        log::debug!("[RD] {} pages exhausted, cursor reset", kind);
    }
}
