//! Deterministic record identifiers.

use uuid::Uuid;

/// UUIDv5 of `(index, ordinal, text)`.
///
/// Re-ingesting the same chunk into the same index yields the same id, so
/// repeated upserts overwrite instead of duplicating.
pub fn stable_uuid(index: &str, ordinal: usize, text: &str) -> Uuid {
    let name = format!("{index}\u{1f}{ordinal}\u{1f}{text}");
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_same_id() {
        assert_eq!(stable_uuid("i", 0, "t"), stable_uuid("i", 0, "t"));
        assert_ne!(stable_uuid("i", 0, "t"), stable_uuid("i", 1, "t"));
        assert_ne!(stable_uuid("i", 0, "t"), stable_uuid("j", 0, "t"));
        assert_eq!(stable_uuid("i", 0, "t").get_version_num(), 5);
    }
}
