/// Cache key prefixes for the resource inventory
pub mod keys {
    /// Everything this service writes lives under this prefix.
    /// `FlushAll` removes `ociaction:*` and nothing else.
    pub const NAMESPACE: &str = "ociaction";

    /// VM records
    /// Format: ociaction:vm:{normalized display name}
    /// Value: JSON-serialized Resource
    /// TTL: None (replaced wholesale by the next scan cycle)
    pub const RESOURCE: &str = "ociaction:vm";
}

/// Longest display name accepted by the provider.
pub const MAX_NAME_LEN: usize = 255;

/// Display names are matched case-insensitively.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn resource_key(name: &str) -> String {
    format!("{}:{}", keys::RESOURCE, normalize_name(name))
}

/// Glob matching every key owned by this service.
pub fn namespace_pattern() -> String {
    format!("{}:*", keys::NAMESPACE)
}

/// Validate a display name taken from an untrusted request before it is
/// turned into a cache key.
pub fn validate_resource_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("name must not be empty");
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err("name must be at most 255 bytes");
    }
    if trimmed.chars().any(char::is_control) {
        return Err("name must not contain control characters");
    }
    Ok(())
}
