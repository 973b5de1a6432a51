//! Address resolution — maps any host string to its canonical form.
//!
//! Precedence, first match wins:
//!   1. `<name>.a` / `a`      alias, substituted from the alias table, then resolved on
//!   2. loopback literal       returned as is
//!   3. `home` / `*.home`      returned as is
//!   4. `*.<peer id>`          final label replaced by the canonical ID, or `home` for self
//!   5. anything else          ordinary internet address, returned as is

use std::collections::BTreeMap;

use crate::peer_id::PeerIdCodec;

pub const HOME: &str = "home";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AliasError {
    #[error("not an alias: {0}")]
    InvalidAliasForm(String),
}

/// Alias key of an address ending in the `.a` label.
///
/// `proj.a` → `proj`, `x.proj.a` → `x.proj`, and the bare `a` is its own key.
pub fn alias_name(address: &str) -> Result<&str, AliasError> {
    if address == "a" {
        return Ok(address);
    }
    address
        .strip_suffix(".a")
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AliasError::InvalidAliasForm(address.to_string()))
}

/// Alias target for `address`, if it has the alias form and a table entry.
pub fn lookup_alias<'t>(address: &str, aliases: &'t BTreeMap<String, String>) -> Option<&'t str> {
    alias_name(address)
        .ok()
        .and_then(|name| aliases.get(name))
        .map(String::as_str)
}

/// Explicit loopback: `::1`, `0:0:0:0:0:0:0:1`, `127.0.0.<n>`, `localhost`.
pub fn is_local_host(host: &str) -> bool {
    if matches!(host, "::1" | "0:0:0:0:0:0:0:1" | "localhost") {
        return true;
    }
    host.strip_prefix("127.0.0.")
        .is_some_and(|last| !last.is_empty() && last.bytes().all(|b| b.is_ascii_digit()))
}

/// Explicit home node: `home` or any name whose last label is `home`.
pub fn is_home(host: &str) -> bool {
    host == HOME || host.ends_with(".home")
}

/// Does the final label of `host` decode as a peer identifier?
pub fn is_peer(host: &str, codec: &dyn PeerIdCodec) -> bool {
    let last = host.rsplit('.').next().unwrap_or(host);
    codec.decode(last).is_some()
}

/// Resolve `address` into canonical form. Pure and deterministic.
pub fn resolve(
    address: &str,
    self_id: &str,
    aliases: &BTreeMap<String, String>,
    codec: &dyn PeerIdCodec,
) -> String {
    let address = lookup_alias(address, aliases).unwrap_or(address);

    if is_local_host(address) || is_home(address) {
        return address.to_string();
    }

    let (prefix, last) = match address.rsplit_once('.') {
        Some((prefix, last)) => (Some(prefix), last),
        None => (None, address),
    };

    match codec.decode(last) {
        Some(id) => {
            let label = if id == self_id { HOME.to_string() } else { id };
            match prefix {
                Some(prefix) => format!("{prefix}.{label}"),
                None => label,
            }
        }
        None => address.to_string(),
    }
}
