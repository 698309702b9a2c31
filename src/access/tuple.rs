use bytes::Bytes;

/// One byte-serialized value of a column tuple.
pub type Column = Bytes;

/// Represents a row in the key-value store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPair {
    pub key: Bytes,
    pub value: Bytes,
}

impl KvPair {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kv_pair_creation() {
        let row = KvPair::new("user:1", "alice");
        assert_eq!(row.key, Bytes::from_static(b"user:1"));
        assert_eq!(row.value, Bytes::from_static(b"alice"));
    }

    #[test]
    fn test_kv_pair_equality() {
        let row1 = KvPair::new("a", "1");
        let row2 = KvPair::new(b"a".to_vec(), b"1".to_vec());
        let row3 = KvPair::new("a", "2");

        assert_eq!(row1, row2);
        assert_ne!(row1, row3);
    }
}
