//! Record persistence.
//!
//! Every record type lives in its own sled tree, keyed by its bech32 id and CBOR encoded. The
//! sha256 digest of the stored bytes is the record's etag. Writers pass back the etag they read
//! and the write is applied with a compare-and-swap, so two users acting on the same stale copy
//! cannot silently overwrite each other.
use std::marker::PhantomData;

use tracing::debug;

use crate::error::{BackendError, ConflictError, LedgerError, LedgerResult};
use crate::utils::{new_uuid_to_bech32, normalise_key};

/// A storable record type.
pub trait Record: minicbor::Encode<()> + for<'b> minicbor::Decode<'b, ()> + Clone {
    /// sled tree holding this record type.
    const TREE: &'static str;
    /// bech32 human readable prefix of generated ids.
    const ID_PREFIX: &'static str;
    const ENTITY: &'static str;

    fn key(&self) -> &str;
    fn assign_key(&mut self, id: String);

    /// Unique constraint name and value, compared case insensitively across the tree.
    fn unique_key(&self) -> Option<(&'static str, String)> {
        None
    }
}

/// A record as read from storage together with the etag of that exact version.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub record: T,
    pub etag: String,
}

/// Data access for one record type.
pub trait Repository<T: Record> {
    fn get_all(&self) -> Result<Vec<Versioned<T>>, BackendError>;

    fn get(&self, id: &str) -> Result<Versioned<T>, BackendError>;

    /// Stores a new record under a freshly generated id, ignoring any id it carries.
    fn create(&self, record: T) -> Result<Versioned<T>, BackendError>;

    /// Applies `apply` to the version identified by `etag`. Fails with a conflict when the stored
    /// record changed since that version was read. Nothing is written if `apply` fails.
    fn update<F>(&self, id: &str, etag: &str, apply: F) -> LedgerResult<Versioned<T>>
    where
        F: FnOnce(&mut T) -> LedgerResult<()>;

    /// Removes the record if `check` accepts its current version.
    fn delete<F>(&self, id: &str, check: F) -> LedgerResult<()>
    where
        F: FnOnce(&T) -> LedgerResult<()>;
}

pub struct SledStore<T: Record> {
    tree: sled::Tree,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Clone for SledStore<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            _record: PhantomData,
        }
    }
}

fn encode<T: Record>(record: &T) -> Result<Vec<u8>, BackendError> {
    minicbor::to_vec(record).map_err(|e| BackendError::Codec(e.to_string()))
}

fn etag_of(bytes: &[u8]) -> String {
    sha256::digest(bytes)
}

impl<T: Record> SledStore<T> {
    pub fn open(db: &sled::Db) -> Result<Self, BackendError> {
        Ok(Self {
            tree: db.open_tree(T::TREE)?,
            _record: PhantomData,
        })
    }

    fn decode(bytes: &[u8]) -> Result<Versioned<T>, BackendError> {
        let record: T = minicbor::decode(bytes)?;
        Ok(Versioned {
            record,
            etag: etag_of(bytes),
        })
    }

    fn not_found(id: &str) -> BackendError {
        BackendError::NotFound {
            entity: T::ENTITY,
            id: id.to_string(),
        }
    }

    fn conflict(id: &str) -> LedgerError {
        ConflictError::StaleRecord {
            entity: T::ENTITY,
            id: id.to_string(),
        }
        .into()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Records matching `predicate`, in storage order.
    pub fn find<P>(&self, predicate: P) -> Result<Vec<Versioned<T>>, BackendError>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|v| predicate(&v.record))
            .collect())
    }

    fn ensure_unique(&self, record: &T, exclude_id: Option<&str>) -> Result<(), BackendError> {
        let Some((constraint, value)) = record.unique_key() else {
            return Ok(());
        };
        let value = normalise_key(&value);

        for existing in self.get_all()? {
            if Some(existing.record.key()) == exclude_id {
                continue;
            }
            if let Some((_, other)) = existing.record.unique_key()
                && normalise_key(&other) == value
            {
                return Err(BackendError::from_constraint(
                    constraint,
                    &format!("duplicate key value violates unique constraint {constraint}"),
                ));
            }
        }
        Ok(())
    }
}

impl<T: Record> Repository<T> for SledStore<T> {
    fn get_all(&self) -> Result<Vec<Versioned<T>>, BackendError> {
        let mut records = Vec::with_capacity(self.tree.len());
        for entry in self.tree.iter() {
            let (_, bytes) = entry?;
            records.push(Self::decode(&bytes)?);
        }
        debug!(tree = T::TREE, count = records.len(), "loaded records");
        Ok(records)
    }

    fn get(&self, id: &str) -> Result<Versioned<T>, BackendError> {
        let bytes = self
            .tree
            .get(id.as_bytes())?
            .ok_or_else(|| Self::not_found(id))?;
        Self::decode(&bytes)
    }

    fn create(&self, mut record: T) -> Result<Versioned<T>, BackendError> {
        let id = new_uuid_to_bech32(T::ID_PREFIX).map_err(|e| BackendError::Storage(e.to_string()))?;
        record.assign_key(id.clone());
        self.ensure_unique(&record, None)?;

        let bytes = encode(&record)?;
        let etag = etag_of(&bytes);
        self.tree
            .compare_and_swap(id.as_bytes(), None::<&[u8]>, Some(bytes))?
            .map_err(|_| BackendError::Storage(format!("id collision on {id}")))?;

        debug!(tree = T::TREE, id = %id, "record created");
        Ok(Versioned { record, etag })
    }

    fn update<F>(&self, id: &str, etag: &str, apply: F) -> LedgerResult<Versioned<T>>
    where
        F: FnOnce(&mut T) -> LedgerResult<()>,
    {
        let current = self
            .tree
            .get(id.as_bytes())?
            .ok_or_else(|| Self::not_found(id))?;
        if etag_of(&current) != etag {
            return Err(Self::conflict(id));
        }

        let mut record: T = minicbor::decode(&current).map_err(BackendError::from)?;
        apply(&mut record)?;
        record.assign_key(id.to_string());
        self.ensure_unique(&record, Some(id))?;

        let bytes = encode(&record)?;
        let new_etag = etag_of(&bytes);
        self.tree
            .compare_and_swap(id.as_bytes(), Some(&*current), Some(bytes))?
            .map_err(|_| Self::conflict(id))?;

        Ok(Versioned {
            record,
            etag: new_etag,
        })
    }

    fn delete<F>(&self, id: &str, check: F) -> LedgerResult<()>
    where
        F: FnOnce(&T) -> LedgerResult<()>,
    {
        let current = self
            .tree
            .get(id.as_bytes())?
            .ok_or_else(|| Self::not_found(id))?;
        let record: T = minicbor::decode(&current).map_err(BackendError::from)?;
        check(&record)?;

        self.tree
            .compare_and_swap(id.as_bytes(), Some(&*current), None::<Vec<u8>>)?
            .map_err(|_| Self::conflict(id))?;

        debug!(tree = T::TREE, id = %id, "record deleted");
        Ok(())
    }
}
