//! URL path codec for router panes
//!
//! Grammar of the panes path segment:
//!
//! ```text
//! panes   = group *( ";" group )
//! group   = sibling *( "|" sibling )
//! sibling = id *( "," key "=" value ) [ "," payload-ref ]
//! ```
//!
//! Every id, key, value and payload reference is written as an encoded URI
//! component, so the delimiters above never appear inside them. Siblings after
//! the group root may leave their id empty (same as the root) and only carry
//! the params that differ from the root's.

use crate::error::RouterError;
use crate::params::{is_exclusive_param, PaneParams};
use crate::sibling::{RouterPaneGroup, RouterPaneSibling, RouterPanes};
use std::fmt::Write;

/// Separates pane groups
pub const GROUP_DELIMITER: char = ';';
/// Separates siblings within a group
pub const SIBLING_DELIMITER: char = '|';
/// Separates chunks within a sibling
pub const CHUNK_DELIMITER: char = ',';
/// Separates a param key from its value
pub const PARAM_DELIMITER: char = '=';

/// Parse a panes path segment into router panes
///
/// A leading `/` is ignored, empty groups are dropped and an empty path yields
/// no groups at all.
///
/// # Errors
/// - `RouterError::InvalidPercentEncoding` / `InvalidUtf8` for bad escapes
/// - `RouterError::EmptyPaneId` if a group root has no id
pub fn parse_panes_segment(path: &str) -> Result<RouterPanes, RouterError> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let mut panes = RouterPanes::new();

    for raw_group in path.split(GROUP_DELIMITER) {
        if raw_group.is_empty() {
            continue;
        }
        let group = parse_group(raw_group, panes.len())?;
        panes.push(group);
    }

    Ok(panes)
}

/// Encode router panes into a panes path segment (without leading `/`)
///
/// Transient payloads are never written. A later sibling's param is left out
/// when the sibling carries exactly the root's values for that key, so the
/// parser restores it through inheritance.
#[must_use]
pub fn encode_panes_segment(panes: &RouterPanes) -> String {
    panes
        .iter()
        .filter(|group| !group.is_empty())
        .map(|group| encode_group(group))
        .collect::<Vec<_>>()
        .join(&GROUP_DELIMITER.to_string())
}

/// Encode router panes as an absolute path
#[inline]
#[must_use]
pub fn to_path(panes: &RouterPanes) -> String {
    format!("/{}", encode_panes_segment(panes))
}

/// Canonical form of router panes: what survives a trip through the URL
///
/// # Errors
/// Propagates parse errors, which only occur for panes whose group root has
/// an empty id.
pub fn canonicalize(panes: &RouterPanes) -> Result<RouterPanes, RouterError> {
    parse_panes_segment(&encode_panes_segment(panes))
}

fn parse_group(raw: &str, group_index: usize) -> Result<RouterPaneGroup, RouterError> {
    let mut raw_siblings = raw.split(SIBLING_DELIMITER);
    let root = parse_sibling(raw_siblings.next().unwrap_or_default())?;
    if root.id.is_empty() {
        return Err(RouterError::EmptyPaneId { group_index });
    }

    let mut group = vec![root];
    for raw_sibling in raw_siblings {
        let own = parse_sibling(raw_sibling)?;
        let root = &group[0];
        let sibling = RouterPaneSibling {
            id: if own.id.is_empty() {
                root.id.clone()
            } else {
                own.id
            },
            params: own.params.inherit_from(&root.params),
            payload: root.payload.clone(),
            payload_ref: own.payload_ref.or_else(|| root.payload_ref.clone()),
        };
        group.push(sibling);
    }

    Ok(group)
}

fn parse_sibling(raw: &str) -> Result<RouterPaneSibling, RouterError> {
    let mut chunks = raw.split(CHUNK_DELIMITER);
    let id = decode_component(chunks.next().unwrap_or_default())?;
    let mut params = PaneParams::new();
    let mut payload_ref = None;

    for chunk in chunks {
        if chunk.is_empty() {
            continue;
        }
        match chunk.split_once(PARAM_DELIMITER) {
            Some((key, value)) => params.push(decode_component(key)?, decode_component(value)?),
            None => payload_ref = Some(decode_component(chunk)?),
        }
    }

    Ok(RouterPaneSibling {
        id,
        params,
        payload: None,
        payload_ref,
    })
}

fn encode_group(group: &[RouterPaneSibling]) -> String {
    let root = &group[0];
    group
        .iter()
        .enumerate()
        .map(|(idx, sibling)| encode_sibling(sibling, (idx > 0).then_some(root)))
        .collect::<Vec<_>>()
        .join(&SIBLING_DELIMITER.to_string())
}

fn encode_sibling(sibling: &RouterPaneSibling, root: Option<&RouterPaneSibling>) -> String {
    let same_as_root = root.is_some_and(|r| r.id == sibling.id);
    let mut chunks = vec![if same_as_root {
        String::new()
    } else {
        encode_component(&sibling.id)
    }];

    for (key, value) in sibling.params.iter() {
        let inherited = root.is_some_and(|r| {
            !is_exclusive_param(key) && r.params.get_all(key).eq(sibling.params.get_all(key))
        });
        if inherited {
            continue;
        }
        chunks.push(format!(
            "{}{PARAM_DELIMITER}{}",
            encode_component(key),
            encode_component(value)
        ));
    }

    if let Some(payload_ref) = sibling.payload_ref.as_ref().filter(|r| !r.is_empty()) {
        let inherited = root.is_some_and(|r| r.payload_ref.as_ref() == Some(payload_ref));
        if !inherited {
            chunks.push(encode_component(payload_ref));
        }
    }

    chunks.join(&CHUNK_DELIMITER.to_string())
}

#[inline]
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(byte, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

/// Percent-encode a URI component
#[must_use]
pub fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &byte in input.as_bytes() {
        if is_unreserved(byte) {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

/// Decode a percent-encoded URI component
///
/// # Errors
/// Returns an error on truncated or non-hex escapes and on escapes that do
/// not form valid UTF-8.
pub fn decode_component(input: &str) -> Result<String, RouterError> {
    if !input.contains('%') {
        return Ok(input.to_string());
    }

    let invalid = || RouterError::InvalidPercentEncoding {
        input: input.to_string(),
    };

    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let hex = bytes.get(idx + 1..idx + 3).ok_or_else(invalid)?;
            let hi = hex_value(hex[0]).ok_or_else(invalid)?;
            let lo = hex_value(hex[1]).ok_or_else(invalid)?;
            out.push((hi << 4) | lo);
            idx += 3;
        } else {
            out.push(bytes[idx]);
            idx += 1;
        }
    }

    String::from_utf8(out).map_err(|_| RouterError::InvalidUtf8 {
        input: input.to_string(),
    })
}

#[inline]
fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
