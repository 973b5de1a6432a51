//! Peer-identifier codec.
//!
//! A swarm peer ID is a multihash. It travels in two textual forms:
//! - base58 (bitcoin alphabet) — the canonical identifier, e.g. `Qm…`, `12D3Koo…`
//! - Crockford base32, lowercase — the host-label form, safe inside DNS names
//!
//! Both decode to the same bytes; either is accepted wherever a label is parsed.

use libp2p_identity::PeerId;

/// Crockford base32 alphabet (no I, L, O, U).
const CROCKFORD: &[u8; 32] = b"0123456789abcdefghjkmnpqrstvwxyz";

/// Decode/encode peer identifiers found in host labels.
pub trait PeerIdCodec: Send + Sync {
    /// Decode a label in either supported encoding. Returns the canonical ID.
    fn decode(&self, label: &str) -> Option<String>;

    /// Host-label form of a peer ID given in either encoding.
    fn canonical_form(&self, id: &str) -> Option<String>;
}

/// Default codec: base58 first, Crockford base32 second.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultihashCodec;

impl MultihashCodec {
    fn peer_id(label: &str) -> Option<PeerId> {
        bs58::decode(label)
            .into_vec()
            .ok()
            .and_then(|bytes| peer_id_from_bytes(&bytes))
            .or_else(|| crockford_decode(label).and_then(|bytes| peer_id_from_bytes(&bytes)))
    }
}

impl PeerIdCodec for MultihashCodec {
    fn decode(&self, label: &str) -> Option<String> {
        Self::peer_id(label).map(|id| id.to_base58())
    }

    fn canonical_form(&self, id: &str) -> Option<String> {
        Self::peer_id(id).map(|id| crockford_encode(&id.to_bytes()))
    }
}

/// A sha2-256 or inline-key multihash with a non-empty digest.
///
/// Both accepted codes and any digest length up to 127 encode as one-byte
/// varints, so an empty digest is exactly a two-byte input.
fn peer_id_from_bytes(bytes: &[u8]) -> Option<PeerId> {
    if bytes.len() <= 2 {
        return None;
    }
    PeerId::from_bytes(bytes).ok()
}

// ── Crockford base32 ──────────────────────────────────────────────────────────

fn crockford_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for &b in bytes {
        buffer = (buffer << 8) | u32::from(b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(CROCKFORD[((buffer >> bits) & 0x1f) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(CROCKFORD[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

fn crockford_value(c: char) -> Option<u8> {
    match c.to_ascii_lowercase() {
        'o' => Some(0),
        'i' | 'l' => Some(1),
        c => CROCKFORD.iter().position(|&a| a as char == c).map(|p| p as u8),
    }
}

/// Case-insensitive; hyphens are ignored. Rejects lengths no byte string
/// encodes to.
fn crockford_decode(s: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    let mut count = 0usize;
    for c in s.chars() {
        if c == '-' {
            continue;
        }
        buffer = (buffer << 5) | u32::from(crockford_value(c)?);
        bits += 5;
        count += 1;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }
    if count == 0 || matches!(count % 8, 1 | 3 | 6) {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha256_id(fill: u8) -> Vec<u8> {
        let mut mh = vec![0x12, 0x20];
        mh.extend_from_slice(&[fill; 32]);
        mh
    }

    #[test]
    fn decodes_base58_peer_id() {
        let b58 = bs58::encode(sha256_id(7)).into_string();
        assert!(b58.starts_with("Qm"));
        assert_eq!(MultihashCodec.decode(&b58), Some(b58.clone()));
    }

    #[test]
    fn decodes_base32_label_to_base58_id() {
        let bytes = sha256_id(42);
        let b58 = bs58::encode(&bytes).into_string();
        let b32 = crockford_encode(&bytes);
        assert_eq!(MultihashCodec.decode(&b32), Some(b58.clone()));
        assert_eq!(MultihashCodec.decode(&b32.to_uppercase()), Some(b58));
    }

    #[test]
    fn canonical_form_is_lowercase_base32() {
        let bytes = sha256_id(3);
        let b58 = bs58::encode(&bytes).into_string();
        let label = MultihashCodec.canonical_form(&b58).unwrap();
        assert_eq!(label, crockford_encode(&bytes));
        assert_eq!(label, label.to_lowercase());
        assert_eq!(MultihashCodec.canonical_form(&label), Some(label.clone()));
    }

    #[test]
    fn identity_multihash_is_accepted() {
        let mut mh = vec![0x00, 0x24];
        mh.extend_from_slice(&[9u8; 36]);
        let b58 = bs58::encode(mh).into_string();
        assert_eq!(MultihashCodec.decode(&b58), Some(b58.clone()));
    }

    #[test]
    fn ordinary_labels_do_not_decode() {
        for label in ["com", "xyz", "example", "www", "home", "localhost", ""] {
            assert_eq!(MultihashCodec.decode(label), None, "label {label:?}");
        }
    }

    #[test]
    fn truncated_digest_is_rejected() {
        let mut bytes = sha256_id(1);
        bytes.pop();
        assert_eq!(MultihashCodec.decode(&bs58::encode(bytes).into_string()), None);
    }

    #[test]
    fn non_peer_multihashes_are_rejected() {
        // sha1 is a valid multihash but not a peer ID
        let mut sha1 = vec![0x11, 0x14];
        sha1.extend_from_slice(&[5u8; 20]);
        assert_eq!(MultihashCodec.decode(&bs58::encode(&sha1).into_string()), None);
        assert_eq!(MultihashCodec.decode(&crockford_encode(&sha1)), None);

        // empty inline key: "11" is base58 for [0x00, 0x00]
        assert_eq!(MultihashCodec.decode("11"), None);
    }

    #[test]
    fn crockford_accepts_confusable_letters() {
        assert_eq!(crockford_decode("o0"), crockford_decode("00"));
        assert_eq!(crockford_decode("il"), crockford_decode("11"));
        assert_eq!(crockford_decode("u0"), None);
        assert_eq!(crockford_decode("0"), None);
    }

    #[test]
    fn crockford_encode_decode_agree() {
        let bytes = [0xde, 0xad, 0xbe, 0xef, 0x01];
        let s = crockford_encode(&bytes);
        assert_eq!(crockford_decode(&s).unwrap(), bytes.to_vec());
    }
}
