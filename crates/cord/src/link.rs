// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Link-format (RFC 6690) decoding.
//!
//! Minimal decoder for the payloads a resource directory returns: one
//! record per call, parameters written into caller-provided storage. A
//! multi-record payload is consumed by calling [`decode_link`] repeatedly
//! with an advancing input offset and the unused tail of the parameter
//! storage, so parameters from earlier records stay valid.
//!
//! Values may be quoted (`rt="core.rd-lookup-res"`) or bare tokens
//! (`ct=40`); quotes are stripped, no escape processing is done.

use std::fmt;
use std::str;

/// One key/value parameter of a decoded link.
///
/// Slices borrow from the decoded input buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkParam<'a> {
    pub key: &'a str,
    /// `None` for a value-less parameter such as `;obs`.
    pub value: Option<&'a str>,
}

/// One decoded link record.
///
/// `param_count` says how many entries of the caller's parameter storage
/// this record filled, starting at the slice the caller passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<'a> {
    pub target: &'a str,
    pub param_count: usize,
}

/// Link-format decode errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Input does not start with a `<target>` anchor
    MissingTarget,
    /// Record ended before its closing delimiter
    Truncated,
    /// Record carries more parameters than the caller provided storage for
    TooManyParams,
    /// Target, key, or value bytes are not valid UTF-8
    InvalidUtf8,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTarget => write!(f, "missing <target> anchor"),
            Self::Truncated => write!(f, "truncated link record"),
            Self::TooManyParams => write!(f, "parameter storage exhausted"),
            Self::InvalidUtf8 => write!(f, "link record is not valid UTF-8"),
        }
    }
}

impl std::error::Error for LinkError {}

/// Decode the first link record in `input`, filling `params` from the front.
///
/// Returns the record and the number of input bytes consumed (including any
/// leading record separator). Decoding a record with more parameters than
/// `params` can hold is an error, never a truncation.
pub fn decode_link<'a>(
    input: &'a [u8],
    params: &mut [LinkParam<'a>],
) -> Result<(Link<'a>, usize), LinkError> {
    let mut pos = 0;

    // records after the first are preceded by a separator
    while pos < input.len() && (input[pos] == b',' || input[pos].is_ascii_whitespace()) {
        pos += 1;
    }
    if pos >= input.len() || input[pos] != b'<' {
        return Err(LinkError::MissingTarget);
    }
    pos += 1;

    let target_start = pos;
    while pos < input.len() && input[pos] != b'>' {
        pos += 1;
    }
    if pos >= input.len() {
        return Err(LinkError::Truncated);
    }
    let target = as_str(&input[target_start..pos])?;
    pos += 1;

    let mut count = 0;
    while pos < input.len() && input[pos] == b';' {
        pos += 1;
        let key_start = pos;
        while pos < input.len() && !matches!(input[pos], b'=' | b';' | b',') {
            pos += 1;
        }
        let key = as_str(&input[key_start..pos])?;

        let mut value = None;
        if pos < input.len() && input[pos] == b'=' {
            pos += 1;
            if pos < input.len() && input[pos] == b'"' {
                pos += 1;
                let value_start = pos;
                while pos < input.len() && input[pos] != b'"' {
                    pos += 1;
                }
                if pos >= input.len() {
                    return Err(LinkError::Truncated);
                }
                value = Some(as_str(&input[value_start..pos])?);
                pos += 1;
            } else {
                let value_start = pos;
                while pos < input.len() && !matches!(input[pos], b';' | b',') {
                    pos += 1;
                }
                value = Some(as_str(&input[value_start..pos])?);
            }
        }

        if count >= params.len() {
            return Err(LinkError::TooManyParams);
        }
        params[count] = LinkParam { key, value };
        count += 1;
    }

    Ok((
        Link {
            target,
            param_count: count,
        },
        pos,
    ))
}

fn as_str(bytes: &[u8]) -> Result<&str, LinkError> {
    str::from_utf8(bytes).map_err(|_| LinkError::InvalidUtf8)
}
