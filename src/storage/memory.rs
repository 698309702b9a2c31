//! In-memory key-value store with snapshot transactions.

use crate::access::KvPair;
use crate::storage::{Cursor, StorageError, StorageResult, Txn};
use anyhow::Result;
use bytes::Bytes;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::btree_map::Range;
use std::collections::BTreeMap;
use std::io::BufRead;
use std::ops::Bound;
use std::sync::Arc;

type Snapshot = Arc<BTreeMap<Bytes, Bytes>>;

/// Shared ordered map. Every `begin()` observes a frozen snapshot.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Snapshot>,
}

/// One line of a JSON-lines data file.
#[derive(Debug, Deserialize)]
struct Record {
    key: String,
    value: serde_json::Value,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) {
        let mut guard = self.data.write();
        Arc::make_mut(&mut guard).insert(key.into(), value.into());
    }

    pub fn delete(&self, key: &[u8]) -> bool {
        let mut guard = self.data.write();
        Arc::make_mut(&mut guard).remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Start a read transaction over the current contents
    pub fn begin(&self) -> MemoryTxn {
        MemoryTxn {
            snapshot: self.data.read().clone(),
        }
    }

    /// Load `{"key": ..., "value": ...}` records, one per line.
    ///
    /// String values are stored as raw bytes; any other JSON value is stored
    /// in its serialized form. Blank lines are skipped. Returns the number of
    /// records loaded.
    pub fn load_json_lines<R: BufRead>(&self, reader: R) -> StorageResult<usize> {
        let mut loaded = 0;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(&line)
                .map_err(|source| StorageError::InvalidRecord {
                    line: idx + 1,
                    source,
                })?;
            let value = match record.value {
                serde_json::Value::String(s) => Bytes::from(s),
                other => Bytes::from(other.to_string()),
            };
            self.put(record.key, value);
            loaded += 1;
        }
        log::debug!("loaded {} records into memory store", loaded);
        Ok(loaded)
    }
}

/// Read-only snapshot transaction
#[derive(Clone)]
pub struct MemoryTxn {
    snapshot: Snapshot,
}

impl Txn for MemoryTxn {
    fn cursor(&self) -> Result<Box<dyn Cursor + '_>> {
        Ok(Box::new(MemoryCursor::new(&self.snapshot)))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        Ok(self.snapshot.get(key).cloned())
    }
}

/// Cursor over a snapshot; starts before the first key
pub struct MemoryCursor<'a> {
    map: &'a BTreeMap<Bytes, Bytes>,
    range: Range<'a, Bytes, Bytes>,
}

impl<'a> MemoryCursor<'a> {
    pub fn new(map: &'a BTreeMap<Bytes, Bytes>) -> Self {
        Self {
            map,
            range: map.range::<[u8], _>((Bound::Unbounded, Bound::Unbounded)),
        }
    }
}

impl Cursor for MemoryCursor<'_> {
    fn seek(&mut self, key: &[u8]) -> Result<()> {
        self.range = self
            .map
            .range::<[u8], _>((Bound::Included(key), Bound::Unbounded));
        Ok(())
    }

    fn next(&mut self) -> Result<Option<KvPair>> {
        Ok(self
            .range
            .next()
            .map(|(k, v)| KvPair::new(k.clone(), v.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn drain(cursor: &mut dyn Cursor) -> Result<Vec<Bytes>> {
        let mut keys = Vec::new();
        while let Some(row) = cursor.next()? {
            keys.push(row.key);
        }
        Ok(keys)
    }

    #[test]
    fn test_cursor_iterates_in_key_order() -> Result<()> {
        let store = MemoryStore::new();
        store.put("c", "3");
        store.put("a", "1");
        store.put("b", "2");

        let txn = store.begin();
        let mut cursor = txn.cursor()?;
        assert_eq!(drain(cursor.as_mut())?, vec!["a", "b", "c"]);

        // Exhausted cursor stays exhausted
        assert!(cursor.next()?.is_none());
        Ok(())
    }

    #[test]
    fn test_cursor_seek() -> Result<()> {
        let store = MemoryStore::new();
        for key in ["a1", "a2", "b1", "c1"] {
            store.put(key, "x");
        }

        let txn = store.begin();
        let mut cursor = txn.cursor()?;
        cursor.seek(b"b")?;
        assert_eq!(drain(cursor.as_mut())?, vec!["b1", "c1"]);

        cursor.seek(b"")?;
        assert_eq!(drain(cursor.as_mut())?.len(), 4);

        cursor.seek(b"z")?;
        assert!(cursor.next()?.is_none());
        Ok(())
    }

    #[test]
    fn test_snapshot_isolation() -> Result<()> {
        let store = MemoryStore::new();
        store.put("a", "1");
        let txn = store.begin();

        store.put("b", "2");
        assert!(store.delete(b"a"));

        assert_eq!(txn.get(b"a")?, Some(Bytes::from_static(b"1")));
        assert_eq!(txn.get(b"b")?, None);
        assert_eq!(store.begin().get(b"b")?, Some(Bytes::from_static(b"2")));
        Ok(())
    }

    #[test]
    fn test_load_json_lines() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, r#"{{"key": "user:1", "value": "alice"}}"#)?;
        writeln!(file)?;
        writeln!(file, r#"{{"key": "user:2", "value": {{"age": 30}}}}"#)?;
        file.flush()?;

        let store = MemoryStore::new();
        let reader = std::io::BufReader::new(std::fs::File::open(file.path())?);
        assert_eq!(store.load_json_lines(reader)?, 2);

        let txn = store.begin();
        assert_eq!(txn.get(b"user:1")?, Some(Bytes::from_static(b"alice")));
        assert_eq!(
            txn.get(b"user:2")?,
            Some(Bytes::from_static(br#"{"age":30}"#))
        );
        Ok(())
    }

    #[test]
    fn test_load_json_lines_reports_bad_line() {
        let store = MemoryStore::new();
        let input = "{\"key\": \"a\", \"value\": 1}\nnot json\n";
        let err = store.load_json_lines(input.as_bytes()).unwrap_err();
        assert!(matches!(err, StorageError::InvalidRecord { line: 2, .. }));
    }
}
