/// Glob match with `*` wildcards, used for cache-key pattern deletion.
///
/// Runs in O(pattern * value) worst case with no allocation. Callers deleting
/// by pattern pay O(keys scanned) on top of this, so structured namespaces
/// with exact deletes are preferred wherever the scope is known.
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    let (mut p_idx, mut v_idx) = (0usize, 0usize);
    let (mut star_idx, mut match_idx) = (None, 0usize);
    let pattern_bytes = pattern.as_bytes();
    let value_bytes = value.as_bytes();

    while v_idx < value_bytes.len() {
        if p_idx < pattern_bytes.len() && pattern_bytes[p_idx] == b'*' {
            star_idx = Some(p_idx);
            match_idx = v_idx;
            p_idx += 1;
            continue;
        }

        if p_idx < pattern_bytes.len() && pattern_bytes[p_idx] == value_bytes[v_idx] {
            p_idx += 1;
            v_idx += 1;
            continue;
        }

        if let Some(star) = star_idx {
            p_idx = star + 1;
            match_idx += 1;
            v_idx = match_idx;
            continue;
        }

        return false;
    }

    while p_idx < pattern_bytes.len() && pattern_bytes[p_idx] == b'*' {
        p_idx += 1;
    }

    p_idx == pattern_bytes.len()
}

#[cfg(test)]
mod tests {
    use super::wildcard_match;

    #[test]
    fn exact_keys() {
        assert!(wildcard_match("permissions:user:42", "permissions:user:42"));
        assert!(!wildcard_match("permissions:user:42", "permissions:user:421"));
    }

    #[test]
    fn listing_family_glob() {
        assert!(wildcard_match(
            "permissions:*:*:*:*",
            "permissions:invoices:view:1:25"
        ));
        assert!(wildcard_match(
            "permissions:invoices:*:*:*",
            "permissions:invoices:delete:3:50"
        ));
        assert!(!wildcard_match(
            "permissions:invoices:*:*:*",
            "permissions:products:view:1:25"
        ));
    }

    #[test]
    fn listing_glob_spares_scoped_keys() {
        // Role, user, and version keys have fewer segments than the listing
        // family and must never be swept up by the catalog-wide glob.
        for key in [
            "permissions:role:reseller",
            "permissions:role:reseller:simplified",
            "permissions:user:42",
            "permissions:version:support",
            "permissions:all",
        ] {
            assert!(!wildcard_match("permissions:*:*:*:*", key), "{key}");
        }
    }

    #[test]
    fn star_matches_everything() {
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("*", ""));
    }

    #[test]
    fn backtracking_across_segments() {
        assert!(wildcard_match("permissions:*:view", "permissions:a:b:view"));
        assert!(!wildcard_match("permissions:*:view", "permissions:a:b:edit"));
    }
}
