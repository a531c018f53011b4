//! Bulk transcoding of a whole record set
//!
//! Both passes are all-or-nothing: the first value that fails aborts the pass
//! and names the record, and the input set is never touched.

use crate::cipher;
use crate::error::{Error, Result};
use crate::key::Key;
use crate::record::{Record, RecordSet};

/// Encrypt every value, keeping names and order
pub fn encrypt_all(plaintext: &RecordSet, key: &Key) -> Result<RecordSet> {
    transcode(plaintext, |value| cipher::encrypt(value, key))
}

/// Decrypt every value, keeping names and order
pub fn decrypt_all(encrypted: &RecordSet, key: &Key) -> Result<RecordSet> {
    transcode(encrypted, |value| cipher::decrypt(value, key))
}

fn transcode<F>(records: &RecordSet, mut transform: F) -> Result<RecordSet>
where
    F: FnMut(&str) -> Result<String>,
{
    records
        .iter()
        .map(|record| {
            transform(&record.value)
                .map(|value| Record::new(record.name.clone(), value))
                .map_err(|e| Error::Transcode {
                    name: record.name.clone(),
                    source: Box::new(e),
                })
        })
        .collect()
}
