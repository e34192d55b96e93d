//! sled glue: typed CBOR reads and writes over the default tree.
//!
//! Services encode records with minicbor and key them by entity id (or a
//! composite slash key, see [`crate::ids`]). Multi-row creations go through
//! `sled::Batch`; check-then-write transitions go through tree transactions,
//! whose abort channel carries the domain [`Error`].

use crate::error::{Error, Result};
use sled::Db;
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionResult};

pub(crate) fn to_cbor<T: minicbor::Encode<()>>(key: &str, value: &T) -> Result<Vec<u8>> {
    minicbor::to_vec(value).map_err(|e| Error::Corrupt {
        key: key.to_string(),
        detail: e.to_string(),
    })
}

pub(crate) fn from_cbor<T>(key: &str, raw: &[u8]) -> Result<T>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    minicbor::decode(raw).map_err(|e| Error::Corrupt {
        key: key.to_string(),
        detail: e.to_string(),
    })
}

/// Point lookup, decoding on hit.
pub(crate) fn fetch<T>(db: &Db, key: &str) -> Result<Option<T>>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    match db.get(key.as_bytes())? {
        Some(raw) => Ok(Some(from_cbor(key, &raw)?)),
        None => Ok(None),
    }
}

/// Point lookup that promotes a miss to `NotFound`.
pub(crate) fn fetch_or<T>(db: &Db, kind: &'static str, key: &str) -> Result<T>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    fetch(db, key)?.ok_or_else(|| Error::not_found(kind, key))
}

pub(crate) fn put<T: minicbor::Encode<()>>(db: &Db, key: &str, value: &T) -> Result<()> {
    db.insert(key.as_bytes(), to_cbor(key, value)?)?;
    Ok(())
}

/// Decode every value under a key prefix.
pub(crate) fn scan<T>(db: &Db, prefix: &str) -> Result<Vec<T>>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    let mut out = Vec::new();
    for entry in db.scan_prefix(prefix.as_bytes()) {
        let (key, raw) = entry?;
        out.push(from_cbor(&String::from_utf8_lossy(&key), &raw)?);
    }
    Ok(out)
}

/// Collect every key under a prefix (for batch deletes).
pub(crate) fn scan_keys(db: &Db, prefix: &str) -> Result<Vec<sled::IVec>> {
    let mut out = Vec::new();
    for entry in db.scan_prefix(prefix.as_bytes()) {
        let (key, _) = entry?;
        out.push(key);
    }
    Ok(out)
}

type TxResult<T> = std::result::Result<T, ConflictableTransactionError<Error>>;

/// Abort the surrounding transaction with a domain error.
pub(crate) fn abort<T>(err: Error) -> TxResult<T> {
    Err(ConflictableTransactionError::Abort(err))
}

pub(crate) fn decode_tx<T>(key: &str, raw: &[u8]) -> TxResult<T>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    match from_cbor(key, raw) {
        Ok(value) => Ok(value),
        Err(e) => abort(e),
    }
}

pub(crate) fn encode_tx<T: minicbor::Encode<()>>(key: &str, value: &T) -> TxResult<Vec<u8>> {
    match to_cbor(key, value) {
        Ok(raw) => Ok(raw),
        Err(e) => abort(e),
    }
}

/// Collapse a transaction outcome back into the domain result.
pub(crate) fn unwrap_tx<T>(outcome: TransactionResult<T, Error>) -> Result<T> {
    match outcome {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(e)) => Err(e),
        Err(TransactionError::Storage(e)) => Err(Error::Store(e)),
    }
}
