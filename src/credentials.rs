use log::warn;
use std::collections::HashMap;
use std::path::Path;

/// Immutable username/password map, loaded once before the server starts
/// accepting. Shared read-only behind an `Arc`, so no synchronization.
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    /// Loads `<username> <password>` records, one per line, whitespace
    /// separated. Lines with any other field count are skipped. A missing or
    /// unreadable file leaves the store empty so every later verification
    /// fails closed; the server keeps accepting either way.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(error) => {
                warn!(
                    "Could not read credentials file {}: {error}",
                    path.display()
                );

                CredentialStore {
                    users: HashMap::new(),
                }
            }
        }
    }

    pub fn parse(contents: &str) -> Self {
        let mut users = HashMap::new();
        for line in contents.lines() {
            let mut fields = line.split_whitespace();
            if let (Some(username), Some(password), None) =
                (fields.next(), fields.next(), fields.next())
            {
                users.insert(username.to_string(), password.to_string());
            }
        }

        CredentialStore { users }
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|stored| stored == password)
    }
}

#[cfg(test)]
mod tests {
    use super::CredentialStore;

    #[test]
    fn verifies_exact_pairs_only() {
        let store = CredentialStore::parse("alice secret\nbob hunter2\n");

        assert!(store.verify("alice", "secret"));
        assert!(store.verify("bob", "hunter2"));
        assert!(!store.verify("alice", "hunter2"));
        assert!(!store.verify("carol", "secret"));
    }

    #[test]
    fn skips_malformed_lines() {
        let store = CredentialStore::parse("alice secret\njustaname\n\na b c\nbob hunter2");

        assert!(store.verify("alice", "secret"));
        assert!(store.verify("bob", "hunter2"));
        assert!(!store.verify("justaname", ""));
        assert!(!store.verify("a", "b"));
    }

    #[test]
    fn missing_file_fails_closed() {
        let store = CredentialStore::load("does_not_exist_users_credentials.txt");

        assert!(!store.verify("alice", "secret"));
    }
}
