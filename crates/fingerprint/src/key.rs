use crate::target::Target;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// A content-addressed identity for a target's current state.
///
/// Two keys are equal iff their `hash`es are equal — `id` and `payloads`
/// are metadata carried for debugging and combination, not part of
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheKey {
    /// Stable string naming the target (or `synthetic:<digest>` for a
    /// combined key).
    pub id: String,
    /// Hex-encoded digest over `payloads` plus, for transitive keys, the
    /// dependency hashes and any opaque extra data.
    pub hash: String,
    /// The files (and, for combined keys, the child keys') content
    /// digests this key depends on, in the order they were combined.
    pub payloads: Vec<(PathBuf, String)>,
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for CacheKey {}

fn sha256_hex(chunks: impl IntoIterator<Item = impl AsRef<[u8]>>) -> String {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update(chunk.as_ref());
    }
    hex::encode(hasher.finalize())
}

/// Produce a stable content hash for `target`.
///
/// `dependency_hashes` must already be in the topological order the Cache
/// Manager processed `target`'s direct dependencies in (they're the
/// `hash` of each dependency's own [`CacheKey`], not its full key); pass
/// an empty slice when `transitive` is `false`, or always — callers that
/// don't care about transitivity can simply not compute them.
#[must_use]
pub fn key_for_target<T: Target + ?Sized>(
    target: &T,
    transitive: bool,
    dependency_hashes: &[String],
    extra_data: &[u8],
) -> CacheKey {
    let mut payloads: Vec<(PathBuf, String)> = target.source_digests().into_iter().collect();
    payloads.sort_by(|a, b| a.0.cmp(&b.0));

    let mut chunks: Vec<Vec<u8>> = payloads
        .iter()
        .flat_map(|(path, digest)| {
            [
                path.to_string_lossy().into_owned().into_bytes(),
                digest.clone().into_bytes(),
            ]
        })
        .collect();

    if transitive {
        for dep_hash in dependency_hashes {
            chunks.push(dep_hash.clone().into_bytes());
        }
    }
    chunks.push(extra_data.to_vec());

    let hash = sha256_hex(&chunks);

    CacheKey {
        id: target.id().to_string(),
        hash,
        payloads,
    }
}

/// Combine several cache keys into one whose hash is order-independent
/// over the child hashes, but whose payloads preserve input order.
///
/// Cache keys compose: this is how a [`VersionedTargetSet`][vts] derives
/// its single combined key from the keys of the versioned targets it
/// groups.
///
/// [vts]: https://docs.rs/kiln-cache-manager (see `VersionedTargetSet`)
///
/// # Errors
///
/// Returns [`Error::EmptyCombineInput`] if `keys` is empty.
pub fn combine_cache_keys(keys: &[CacheKey]) -> Result<CacheKey> {
    if keys.is_empty() {
        return Err(Error::EmptyCombineInput);
    }

    let mut sorted_hashes: Vec<&str> = keys.iter().map(|k| k.hash.as_str()).collect();
    sorted_hashes.sort_unstable();
    let hash = sha256_hex(sorted_hashes.iter().map(|h| h.as_bytes()));

    let id = format!("synthetic:{hash}");
    let payloads = keys.iter().flat_map(|k| k.payloads.clone()).collect();

    Ok(CacheKey { id, hash, payloads })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct FakeTarget {
        id: String,
        sources: BTreeMap<PathBuf, String>,
    }

    impl Target for FakeTarget {
        fn id(&self) -> &str {
            &self.id
        }

        fn source_digests(&self) -> BTreeMap<PathBuf, String> {
            self.sources.clone()
        }
    }

    fn target(id: &str, files: &[(&str, &str)]) -> FakeTarget {
        FakeTarget {
            id: id.to_string(),
            sources: files
                .iter()
                .map(|(p, d)| (PathBuf::from(p), (*d).to_string()))
                .collect(),
        }
    }

    #[test]
    fn same_sources_same_hash() {
        let a = target("a", &[("a.rs", "h1"), ("b.rs", "h2")]);
        let b = target("a", &[("b.rs", "h2"), ("a.rs", "h1")]);
        let ka = key_for_target(&a, false, &[], &[]);
        let kb = key_for_target(&b, false, &[], &[]);
        assert_eq!(ka.hash, kb.hash);
        assert_eq!(ka.payloads, kb.payloads);
    }

    #[test]
    fn different_sources_different_hash() {
        let a = target("a", &[("a.rs", "h1")]);
        let b = target("a", &[("a.rs", "h2")]);
        let ka = key_for_target(&a, false, &[], &[]);
        let kb = key_for_target(&b, false, &[], &[]);
        assert_ne!(ka.hash, kb.hash);
    }

    #[test]
    fn transitive_includes_dependency_hashes() {
        let a = target("a", &[("a.rs", "h1")]);
        let non_transitive = key_for_target(&a, false, &["dep-hash".to_string()], &[]);
        let transitive = key_for_target(&a, true, &["dep-hash".to_string()], &[]);
        assert_ne!(non_transitive.hash, transitive.hash);
    }

    #[test]
    fn transitive_dependency_order_matters() {
        let a = target("a", &[("a.rs", "h1")]);
        let k1 = key_for_target(&a, true, &["x".to_string(), "y".to_string()], &[]);
        let k2 = key_for_target(&a, true, &["y".to_string(), "x".to_string()], &[]);
        assert_ne!(k1.hash, k2.hash, "dependency order is significant for key_for_target");
    }

    #[test]
    fn extra_data_affects_hash() {
        let a = target("a", &[("a.rs", "h1")]);
        let k1 = key_for_target(&a, false, &[], b"v1");
        let k2 = key_for_target(&a, false, &[], b"v2");
        assert_ne!(k1.hash, k2.hash);
    }

    #[test]
    fn combine_is_order_independent_at_hash_level() {
        let a = target("a", &[("a.rs", "h1")]);
        let b = target("b", &[("b.rs", "h2")]);
        let ka = key_for_target(&a, false, &[], &[]);
        let kb = key_for_target(&b, false, &[], &[]);

        let combined_ab = combine_cache_keys(&[ka.clone(), kb.clone()]).unwrap();
        let combined_ba = combine_cache_keys(&[kb.clone(), ka.clone()]).unwrap();
        assert_eq!(combined_ab.hash, combined_ba.hash);

        // But payload order follows input order.
        let expected_ab: Vec<_> = ka.payloads.iter().chain(kb.payloads.iter()).cloned().collect();
        assert_eq!(combined_ab.payloads, expected_ab);
        assert_ne!(combined_ab.payloads, combined_ba.payloads);
    }

    #[test]
    fn combine_empty_is_error() {
        assert!(matches!(combine_cache_keys(&[]), Err(Error::EmptyCombineInput)));
    }

    #[test]
    fn equality_is_hash_only() {
        let a = target("a", &[("a.rs", "h1")]);
        let mut k1 = key_for_target(&a, false, &[], &[]);
        let mut k2 = k1.clone();
        k2.id = "different-id".to_string();
        assert_eq!(k1, k2);
        k1.hash.push('x');
        assert_ne!(k1, k2);
    }
}
