use std::collections::HashSet;

/// Starred turn signatures for the current session. Not persisted.
#[derive(Debug, Default, Clone)]
pub struct StarStore {
    signatures: HashSet<String>,
}

impl StarStore {
    pub fn contains(&self, signature: &str) -> bool {
        self.signatures.contains(signature)
    }

    /// Flip membership; returns the new starred state.
    pub fn toggle(&mut self, signature: &str) -> bool {
        if self.signatures.remove(signature) {
            false
        } else {
            self.signatures.insert(signature.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_membership() {
        let mut stars = StarStore::default();
        assert!(stars.toggle("user:hello"));
        assert!(stars.contains("user:hello"));
        assert_eq!(stars.len(), 1);
        assert!(!stars.toggle("user:hello"));
        assert!(!stars.contains("user:hello"));
        assert_eq!(stars.len(), 0);
    }
}
