//! Cache key generation.

use std::fmt;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

/// The kinds of entity kept in the cache, one directory or file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Shop,
    ProductList,
    Product,
    Pattern,
    Reviews,
}

impl EntityKind {
    /// Directory holding per-id entries, or `None` for singleton entries.
    pub fn dir(self) -> Option<&'static str> {
        match self {
            EntityKind::Shop | EntityKind::ProductList => None,
            EntityKind::Product => Some("products"),
            EntityKind::Pattern => Some("patterns"),
            EntityKind::Reviews => Some("reviews"),
        }
    }
}

/// Identifies one cache entry. At most one file exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: EntityKind,
    id: Option<String>,
}

impl CacheKey {
    pub fn shop() -> Self {
        Self { kind: EntityKind::Shop, id: None }
    }

    pub fn product_list() -> Self {
        Self { kind: EntityKind::ProductList, id: None }
    }

    pub fn product(id: impl Into<String>) -> Self {
        Self { kind: EntityKind::Product, id: Some(id.into()) }
    }

    pub fn pattern(id: impl Into<String>) -> Self {
        Self { kind: EntityKind::Pattern, id: Some(id.into()) }
    }

    pub fn reviews(listing_id: impl Into<String>) -> Self {
        Self { kind: EntityKind::Reviews, id: Some(listing_id.into()) }
    }

    /// Key for a per-id entity of the given kind.
    ///
    /// Singleton kinds ignore the id.
    pub fn for_kind(kind: EntityKind, id: impl Into<String>) -> Self {
        match kind {
            EntityKind::Shop => Self::shop(),
            EntityKind::ProductList => Self::product_list(),
            _ => Self { kind, id: Some(id.into()) },
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Path of the entry relative to the data directory.
    pub fn relative_path(&self) -> PathBuf {
        match (self.kind.dir(), &self.id) {
            (Some(dir), Some(id)) => PathBuf::from(dir).join(format!("{}.json", file_stem(id))),
            _ if self.kind == EntityKind::Shop => PathBuf::from("shop.json"),
            _ => PathBuf::from("products.json"),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_path().display())
    }
}

/// Ids that could leave the data directory are replaced by their SHA-256 digest.
fn file_stem(id: &str) -> String {
    let safe = !id.is_empty()
        && !id.starts_with('.')
        && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if safe { id.to_string() } else { hash_id(id) }
}

fn hash_id(id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        assert_eq!(CacheKey::shop().relative_path(), PathBuf::from("shop.json"));
        assert_eq!(CacheKey::product_list().relative_path(), PathBuf::from("products.json"));
        assert_eq!(CacheKey::product("123").relative_path(), PathBuf::from("products/123.json"));
        assert_eq!(CacheKey::pattern("456").relative_path(), PathBuf::from("patterns/456.json"));
        assert_eq!(CacheKey::reviews("789").relative_path(), PathBuf::from("reviews/789.json"));
    }

    #[test]
    fn test_handles_are_kept() {
        let key = CacheKey::product("blue-wool_hat.v2");
        assert_eq!(key.relative_path(), PathBuf::from("products/blue-wool_hat.v2.json"));
    }

    #[test]
    fn test_unsafe_ids_are_hashed() {
        for id in ["../../etc/passwd", "gid://shopify/Product/1", ".hidden", "", "a b"] {
            let path = CacheKey::product(id).relative_path();
            let stem = path.file_stem().unwrap().to_str().unwrap().to_string();
            assert_eq!(stem.len(), 64, "id {id:?} should hash");
            assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(path.starts_with("products"));
        }
    }

    #[test]
    fn test_hash_stability() {
        let a = CacheKey::product("gid://shopify/Product/1").relative_path();
        let b = CacheKey::product("gid://shopify/Product/1").relative_path();
        let c = CacheKey::product("gid://shopify/Product/2").relative_path();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_for_kind_singletons_ignore_id() {
        assert_eq!(CacheKey::for_kind(EntityKind::Shop, "x"), CacheKey::shop());
        assert_eq!(CacheKey::for_kind(EntityKind::Pattern, "7"), CacheKey::pattern("7"));
    }
}
