//! Record layout inside the FeOxDB store.
//!
//! FeOxDB is a flat key-value store, so namespaces are kept as records:
//!
//! - `haven:namespaces`: set of namespace names
//! - `haven:keys:{namespace}`: set of cache keys written to the namespace
//! - `haven:entry:{bincode(namespace, key)}`: the serialized entry
//!
//! All functions here are blocking and must run on a blocking thread. The
//! index records are read-modify-write, so callers hold the backend's index
//! lock while calling anything that mutates them.

use std::collections::BTreeSet;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use feoxdb::{FeoxError, FeoxStore};
use haven_core::CacheKey;
use serde::{Serialize, de::DeserializeOwned};

use crate::FeOxDbError;

const NAMESPACES_RECORD: &[u8] = b"haven:namespaces";
const KEYS_PREFIX: &[u8] = b"haven:keys:";
const ENTRY_PREFIX: &[u8] = b"haven:entry:";

pub(crate) fn entry_record(namespace: &str, key: &CacheKey) -> Result<Vec<u8>, FeOxDbError> {
    let mut record = ENTRY_PREFIX.to_vec();
    record.extend(encode_to_vec((namespace, key), standard())?);
    Ok(record)
}

fn keys_record(namespace: &str) -> Vec<u8> {
    let mut record = KEYS_PREFIX.to_vec();
    record.extend_from_slice(namespace.as_bytes());
    record
}

fn load<T>(store: &FeoxStore, record: &[u8]) -> Result<BTreeSet<T>, FeOxDbError>
where
    T: DeserializeOwned + Ord,
{
    match store.get(record) {
        Ok(bytes) => {
            let (items, _): (Vec<T>, _) = decode_from_slice(&bytes, standard())?;
            Ok(items.into_iter().collect())
        }
        Err(FeoxError::KeyNotFound) => Ok(BTreeSet::new()),
        Err(e) => Err(e.into()),
    }
}

fn save<T>(store: &FeoxStore, record: &[u8], items: &BTreeSet<T>) -> Result<(), FeOxDbError>
where
    T: Serialize,
{
    if items.is_empty() {
        if store.contains_key(record) {
            store.delete(record)?;
        }
        return Ok(());
    }
    let items: Vec<&T> = items.iter().collect();
    store.insert(record, &encode_to_vec(&items, standard())?)?;
    Ok(())
}

pub(crate) fn namespaces(store: &FeoxStore) -> Result<BTreeSet<String>, FeOxDbError> {
    load(store, NAMESPACES_RECORD)
}

pub(crate) fn keys(store: &FeoxStore, namespace: &str) -> Result<BTreeSet<CacheKey>, FeOxDbError> {
    load(store, &keys_record(namespace))
}

pub(crate) fn open(store: &FeoxStore, namespace: &str) -> Result<(), FeOxDbError> {
    let mut names = namespaces(store)?;
    if names.insert(namespace.to_owned()) {
        save(store, NAMESPACES_RECORD, &names)?;
    }
    Ok(())
}

pub(crate) fn register(store: &FeoxStore, namespace: &str, key: &CacheKey) -> Result<(), FeOxDbError> {
    open(store, namespace)?;
    let record = keys_record(namespace);
    let mut keys = load::<CacheKey>(store, &record)?;
    if keys.insert(key.clone()) {
        save(store, &record, &keys)?;
    }
    Ok(())
}

pub(crate) fn unregister(store: &FeoxStore, namespace: &str, key: &CacheKey) -> Result<(), FeOxDbError> {
    let record = keys_record(namespace);
    let mut keys = load::<CacheKey>(store, &record)?;
    if keys.remove(key) {
        save(store, &record, &keys)?;
    }
    Ok(())
}

/// Deletes a namespace and its entries, returning the number of removed
/// entries or `None` when the namespace did not exist.
pub(crate) fn drop_namespace(store: &FeoxStore, namespace: &str) -> Result<Option<u32>, FeOxDbError> {
    let mut names = namespaces(store)?;
    if !names.remove(namespace) {
        return Ok(None);
    }

    let record = keys_record(namespace);
    let keys = load::<CacheKey>(store, &record)?;
    let mut removed = 0u32;
    for key in &keys {
        let entry = entry_record(namespace, key)?;
        if store.contains_key(&entry) {
            store.delete(&entry)?;
            removed += 1;
        }
    }
    save(store, &record, &BTreeSet::<CacheKey>::new())?;
    save(store, NAMESPACES_RECORD, &names)?;
    Ok(Some(removed))
}
