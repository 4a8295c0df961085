//! Document store boundary.
//!
//! The world persists through an abstract keyed-collection store. Records
//! are MessagePack-encoded (via `rmp-serde`) and addressed by collection
//! name and 64-bit id. [`MemoryStore`] is the bundled implementation.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;

use moorhen_foundation::{Error, ErrorKind, Result};

use crate::records::{Class, Function, Instance, Verb};

/// Predicate over encoded records, used by [`DocumentStore::find_all`].
pub type RawPredicate<'a> = &'a dyn Fn(&[u8]) -> bool;

/// Abstract keyed-collection store.
///
/// Implementations must be safe to share between actor workers.
pub trait DocumentStore: Send + Sync {
    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the id is taken.
    fn insert(&self, collection: &str, id: u64, record: Vec<u8>) -> Result<()>;

    /// Replaces an existing record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is unknown.
    fn update(&self, collection: &str, id: u64, record: Vec<u8>) -> Result<()>;

    /// Looks up one record.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    fn find_by_id(&self, collection: &str, id: u64) -> Result<Option<Vec<u8>>>;

    /// Lists every record in a collection, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    fn find_all(
        &self,
        collection: &str,
        predicate: Option<RawPredicate<'_>>,
    ) -> Result<Vec<(u64, Vec<u8>)>>;

    /// Deletes a record. Returns false if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    fn delete(&self, collection: &str, id: u64) -> Result<bool>;

    /// Inserts or replaces a record.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    fn upsert(&self, collection: &str, id: u64, record: Vec<u8>) -> Result<()> {
        if self.find_by_id(collection, id)?.is_some() {
            self.update(collection, id, record)
        } else {
            self.insert(collection, id, record)
        }
    }
}

/// A record type stored in its own collection.
pub trait Document: Serialize + DeserializeOwned {
    /// Collection name.
    const COLLECTION: &'static str;

    /// Record id within the collection.
    fn key(&self) -> u64;
}

impl Document for Class {
    const COLLECTION: &'static str = "classes";
    fn key(&self) -> u64 {
        self.id.raw()
    }
}

impl Document for Instance {
    const COLLECTION: &'static str = "instances";
    fn key(&self) -> u64 {
        self.id.raw()
    }
}

impl Document for Verb {
    const COLLECTION: &'static str = "verbs";
    fn key(&self) -> u64 {
        self.id.raw()
    }
}

impl Document for Function {
    const COLLECTION: &'static str = "functions";
    fn key(&self) -> u64 {
        self.id.raw()
    }
}

/// Encodes a record as MessagePack.
///
/// # Errors
///
/// Returns `Serialization` if encoding fails.
pub fn encode<D: Document>(doc: &D) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(doc)
        .map_err(|e| Error::new(ErrorKind::Serialization(format!("{}: {e}", D::COLLECTION))))
}

/// Decodes a MessagePack record.
///
/// # Errors
///
/// Returns `Serialization` if decoding fails.
pub fn decode<D: Document>(bytes: &[u8]) -> Result<D> {
    rmp_serde::from_slice(bytes)
        .map_err(|e| Error::new(ErrorKind::Serialization(format!("{}: {e}", D::COLLECTION))))
}

/// Typed helpers over any [`DocumentStore`].
pub trait DocumentStoreExt: DocumentStore {
    /// Inserts or replaces a typed record.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the backend fails.
    fn put<D: Document>(&self, doc: &D) -> Result<()> {
        self.upsert(D::COLLECTION, doc.key(), encode(doc)?)
    }

    /// Looks up a typed record.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding or the backend fails.
    fn get<D: Document>(&self, id: u64) -> Result<Option<D>> {
        self.find_by_id(D::COLLECTION, id)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    /// Lists typed records, optionally filtered after decoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding or the backend fails.
    fn all<D: Document>(&self, predicate: Option<&dyn Fn(&D) -> bool>) -> Result<Vec<D>> {
        let mut out = Vec::new();
        for (_, bytes) in self.find_all(D::COLLECTION, None)? {
            let doc: D = decode(&bytes)?;
            if predicate.is_none_or(|p| p(&doc)) {
                out.push(doc);
            }
        }
        Ok(out)
    }

    /// Deletes a typed record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn remove<D: Document>(&self, id: u64) -> Result<bool> {
        self.delete(D::COLLECTION, id)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

type Collections = BTreeMap<String, BTreeMap<u64, Vec<u8>>>;

/// In-process [`DocumentStore`] with optional file snapshots.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records in a collection.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Returns true if no collection holds any record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.read().values().all(BTreeMap::is_empty)
    }

    /// Writes every collection to a MessagePack file.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Serialization` on failure.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| io_error(path, &e))?;
        let mut writer = BufWriter::new(file);
        let collections = self.collections.read();
        rmp_serde::encode::write_named(&mut writer, &*collections)
            .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))?;
        writer.flush().map_err(|e| io_error(path, &e))?;
        tracing::debug!(path = %path.display(), "saved document snapshot");
        Ok(())
    }

    /// Reads a store previously written by [`MemoryStore::save_to_file`].
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Serialization` on failure.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| io_error(path, &e))?;
        let collections: Collections = rmp_serde::from_read(BufReader::new(file))
            .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))?;
        Ok(Self {
            collections: RwLock::new(collections),
        })
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> Error {
    Error::new(ErrorKind::Io(format!("{}: {err}", path.display())))
}

impl DocumentStore for MemoryStore {
    fn insert(&self, collection: &str, id: u64, record: Vec<u8>) -> Result<()> {
        let mut collections = self.collections.write();
        let records = collections.entry(collection.to_string()).or_default();
        if records.contains_key(&id) {
            return Err(Error::new(ErrorKind::AlreadyExists(format!(
                "{collection}/{id:016x}"
            ))));
        }
        records.insert(id, record);
        Ok(())
    }

    fn update(&self, collection: &str, id: u64, record: Vec<u8>) -> Result<()> {
        let mut collections = self.collections.write();
        match collections.get_mut(collection).and_then(|c| c.get_mut(&id)) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(Error::not_found(format!("{collection}/{id:016x}"))),
        }
    }

    fn find_by_id(&self, collection: &str, id: u64) -> Result<Option<Vec<u8>>> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .and_then(|c| c.get(&id))
            .cloned())
    }

    fn find_all(
        &self,
        collection: &str,
        predicate: Option<RawPredicate<'_>>,
    ) -> Result<Vec<(u64, Vec<u8>)>> {
        let collections = self.collections.read();
        let Some(records) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(records
            .iter()
            .filter(|(_, bytes)| predicate.is_none_or(|p| p(bytes)))
            .map(|(id, bytes)| (*id, bytes.clone()))
            .collect())
    }

    fn delete(&self, collection: &str, id: u64) -> Result<bool> {
        Ok(self
            .collections
            .write()
            .get_mut(collection)
            .is_some_and(|c| c.remove(&id).is_some()))
    }
}
