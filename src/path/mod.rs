//! Path normalization and segment rules.
//!
//! Engine paths are rooted, slash-separated strings ("/notes/0001_a.md").
//! Normalization is idempotent and purely lexical; traversal segments are
//! rejected outright rather than resolved.

pub mod resolve;

use crate::error::EngineError;

/// Prefix for staging entries created mid-mutation. Staged entries carry a
/// hidden name so in-flight state is never observable in a listing.
pub const STAGE_PREFIX: &str = ".folio-stage-";

/// A staging name unique within a directory: hidden prefix plus a short
/// nonce derived from the seed and the current time.
pub fn staging_name(seed: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let digest = blake3::hash(format!("{}:{}", seed, nanos).as_bytes());
    format!("{}{}", STAGE_PREFIX, &hex::encode(digest.as_bytes())[..12])
}

/// Canonicalize a user-supplied path.
///
/// Always returns a value starting with `/`, collapses duplicate separators,
/// resolves `.` segments, and strips any trailing slash except for the root
/// itself. Idempotent: `normalize(normalize(p)) == normalize(p)`.
pub fn normalize(path: &str) -> String {
    let mut out = String::from("/");
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if out.len() > 1 {
            out.push('/');
        }
        out.push_str(segment);
    }
    out
}

/// Reject traversal and absolute-override segments before any lookup.
///
/// `..` anywhere in the path is a `Boundary` failure; resolution must never
/// escape the configured root.
pub fn validate_segments(path: &str) -> Result<(), EngineError> {
    for segment in path.split('/') {
        if segment == ".." {
            return Err(EngineError::Boundary(path.to_string()));
        }
    }
    Ok(())
}

/// Parent of a normalized path; the root is its own parent.
pub fn parent_of(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

/// Final segment of a normalized path; empty for the root.
pub fn leaf_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Join a normalized parent path and a child name.
pub fn join(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Hidden/system entries are excluded from every listing and resolution.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
