//! Reversible mapping between identity labels and storage entry names.
//!
//! Entry name = escaped label + [`VECTOR_SUFFIX`]. ASCII bytes outside
//! `[A-Za-z0-9_-]` are written as `%XX` (uppercase hex), which removes every
//! `.` from the escaped part. Non-ASCII UTF-8 passes through unchanged so
//! names stay close to the label's own length. The suffix therefore only
//! ever appears once, at the end, and `decode(encode(l)) == Some(l)` for
//! every label `l`.
//!
//! ```text
//! "alice"          -> "alice.fvec"
//! "bob.fvec"       -> "bob%2Efvec.fvec"
//! "Zoë/2024 01"    -> "Zoë%2F2024%2001.fvec"
//! ```

use std::fmt::Write;

/// Suffix shared by every vector-bearing entry.
pub const VECTOR_SUFFIX: &str = ".fvec";

/// Longest entry name in bytes; common filesystems cap file names at 255.
pub const MAX_ENTRY_LEN: usize = 255;

fn is_plain(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || !b.is_ascii()
}

/// Returns the entry name under which `label`'s vector is stored.
pub fn encode(label: &str) -> String {
    let mut out = String::with_capacity(label.len() + VECTOR_SUFFIX.len());
    for c in label.chars() {
        if c.is_ascii() && !is_plain(c as u8) {
            let _ = write!(out, "%{:02X}", c as u8);
        } else {
            out.push(c);
        }
    }
    out.push_str(VECTOR_SUFFIX);
    out
}

/// Recovers the label from an entry name produced by [`encode`].
///
/// Returns `None` for names that are not vector entries or that no label
/// encodes to (stray `.`, malformed or lowercase escapes, escaped plain
/// bytes).
pub fn decode(name: &str) -> Option<String> {
    let stem = name.strip_suffix(VECTOR_SUFFIX)?;
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if is_plain(b) {
            out.push(b);
            i += 1;
            continue;
        }
        if b != b'%' || i + 3 > bytes.len() {
            return None;
        }
        let hex = &bytes[i + 1..i + 3];
        if !hex.iter().all(|h| h.is_ascii_digit() || (b'A'..=b'F').contains(h)) {
            return None;
        }
        let v = u8::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?;
        if is_plain(v) {
            return None;
        }
        out.push(v);
        i += 3;
    }
    String::from_utf8(out).ok()
}

/// Reports whether `name` is a vector-bearing entry.
pub fn is_vector_entry(name: &str) -> bool {
    decode(name).is_some()
}
