//! Stable identifiers for analyses and projects

/// Hex characters kept from the digest
const ID_LEN: usize = 32;

/// Id of one analysis: stable for the same user, project, branch and timestamp
#[must_use]
pub fn derive_project_id(user_id: &str, project_name: &str, branch: &str, timestamp_ms: u64) -> String {
    digest(&[user_id, project_name, branch, &timestamp_ms.to_string()])
}

/// Id shared by every analysis of the same project location for one user
#[must_use]
pub fn derive_persistent_project_id(user_id: &str, project_location: &str) -> String {
    digest(&["project", user_id, project_location])
}

fn digest(parts: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        // Length prefix keeps ("ab", "c") and ("a", "bc") apart.
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    let mut hex = hasher.finalize().to_hex().to_string();
    hex.truncate(ID_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_ids_are_deterministic() {
        let a = derive_project_id("u1", "shop", "main", 1_700_000_000_000);
        let b = derive_project_id("u1", "shop", "main", 1_700_000_000_000);
        assert_eq!(a, b);
        assert_eq!(a.len(), ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn every_component_changes_the_id() {
        let base = derive_project_id("u1", "shop", "main", 1);
        assert_ne!(base, derive_project_id("u2", "shop", "main", 1));
        assert_ne!(base, derive_project_id("u1", "shop2", "main", 1));
        assert_ne!(base, derive_project_id("u1", "shop", "dev", 1));
        assert_ne!(base, derive_project_id("u1", "shop", "main", 2));
        assert_ne!(
            derive_project_id("ab", "c", "main", 1),
            derive_project_id("a", "bc", "main", 1)
        );
    }

    #[test]
    fn persistent_id_ignores_time() {
        assert_eq!(
            derive_persistent_project_id("u1", "/work/shop"),
            derive_persistent_project_id("u1", "/work/shop")
        );
        assert_ne!(
            derive_persistent_project_id("u1", "/work/shop"),
            derive_persistent_project_id("u2", "/work/shop")
        );
    }
}
