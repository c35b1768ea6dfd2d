use std::fmt;

/// Addresses one object in the store: a container plus an object key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlobLocator {
    pub container: String,
    pub key: String,
}

impl BlobLocator {
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }

    /// Final component of the key, used when the object is staged as a
    /// plain local file.
    pub fn blob_name(&self) -> &str {
        self.key
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.key.as_str())
    }
}

impl fmt::Display for BlobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_name_of_flat_key() {
        assert_eq!(BlobLocator::new("c", "archive.zip").blob_name(), "archive.zip");
    }

    #[test]
    fn blob_name_of_nested_key() {
        assert_eq!(BlobLocator::new("c", "a/b/archive.zip").blob_name(), "archive.zip");
        assert_eq!(BlobLocator::new("c", "a\\archive.zip").blob_name(), "archive.zip");
    }

    #[test]
    fn display_joins_container_and_key() {
        let locator = BlobLocator::new("incoming", "archive.zip");
        assert_eq!(locator.to_string(), "incoming/archive.zip");
    }
}
