//! User icons and their content hashes.

use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use sha2::{Digest, Sha256};

/// SHA-256 digest of an icon image.
pub type ContentHash = [u8; 32];

/// Image bytes together with their content hash, computed once on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    image: Bytes,
    hash: ContentHash,
}

impl Icon {
    pub fn new(image: impl Into<Bytes>) -> Self {
        let image = image.into();
        let hash = content_hash(&image);
        Self { image, hash }
    }

    pub fn image(&self) -> &Bytes {
        &self.image
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Lowercase hex form of the hash, used as the HTTP entity tag.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Whether an `If-None-Match` value names this icon.
    ///
    /// Accepts the bare hex digest as well as quoted and weak tags, and
    /// comma-separated lists of them.
    pub fn matches_etag(&self, header: &str) -> bool {
        let expected = self.hash_hex();
        header.split(',').map(str::trim).any(|candidate| {
            let candidate = candidate.strip_prefix("W/").unwrap_or(candidate);
            let candidate = candidate.trim_matches('"');
            candidate == "*" || candidate.eq_ignore_ascii_case(&expected)
        })
    }
}

pub fn content_hash(data: &[u8]) -> ContentHash {
    let digest = Sha256::digest(data);
    let mut hash = [0_u8; 32];
    hash.copy_from_slice(&digest);
    hash
}

/// Interns icons by content hash for the duration of one load pass, so rows
/// carrying identical images share one allocation.
#[derive(Default)]
pub(crate) struct IconInterner {
    seen: HashMap<ContentHash, Arc<Icon>>,
}

impl IconInterner {
    pub(crate) fn intern(&mut self, image: Vec<u8>) -> Arc<Icon> {
        let hash = content_hash(&image);
        Arc::clone(self.seen.entry(hash).or_insert_with(|| {
            Arc::new(Icon {
                image: Bytes::from(image),
                hash,
            })
        }))
    }

    pub(crate) fn distinct(&self) -> usize {
        self.seen.len()
    }
}
