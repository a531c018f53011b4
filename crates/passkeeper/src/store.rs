//! Store - per-service credential files on disk
//!
//! Each service has one store file of `name:<ciphertext>` lines and, while a
//! bulk edit is in progress, a plaintext scratch mirror next to it. Every write
//! replaces the whole file through a temporary sibling and a rename, so a failed
//! operation never leaves a half-written store behind.
//!
//! There is no locking: two processes editing the same service at once can
//! race, and the last writer wins.

use crate::cipher;
use crate::error::{Error, Result};
use crate::key::{create_private, Key};
use crate::record::{self, MalformedLine, RecordSet};
use crate::transcode;
use passkeeper_core::Paths;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// The credential store
pub struct Store {
    paths: Paths,
    key: Key,
}

impl Store {
    /// Create a store over resolved paths and an already loaded key
    pub fn new(paths: Paths, key: Key) -> Self {
        Self { paths, key }
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Create the store directory and the service's store file if missing
    pub fn init_storage(&self, service: &str) -> Result<()> {
        init_storage(&self.paths, service)
    }

    /// Names stored for a service, in file order
    pub fn list_keys(&self, service: &str) -> Result<Vec<String>> {
        let records = self.load(service)?;
        Ok(records.names().map(str::to_string).collect())
    }

    /// Decrypt and return the value stored under `name`
    pub fn get_value(&self, service: &str, name: &str) -> Result<String> {
        let records = self.load(service)?;
        let encrypted = records
            .lookup(name)
            .ok_or_else(|| Error::ValueNotFound {
                service: service.to_string(),
                name: name.to_string(),
            })?;

        cipher::decrypt(encrypted, &self.key)
    }

    /// Encrypt and store a value, replacing any previous value for `name`
    pub fn set_value(&self, service: &str, name: &str, plaintext: &str) -> Result<()> {
        record::validate_name(name)?;
        if plaintext.is_empty() {
            return Err(Error::EmptyValue);
        }
        record::validate_value(plaintext)?;

        let encrypted = cipher::encrypt(plaintext, &self.key)?;
        let (mut records, malformed) = self.load_or_empty(service)?;
        records.upsert(name, encrypted);

        self.rewrite(service, &records, malformed)?;
        tracing::debug!(service, name, "stored value");
        Ok(())
    }

    /// Remove `name` from a service; returns whether it was present
    pub fn delete_value(&self, service: &str, name: &str) -> Result<bool> {
        let (mut records, malformed) = self.load_for_rewrite(service)?;
        if !records.remove(name) {
            tracing::debug!(service, name, "nothing to remove");
            return Ok(false);
        }

        self.rewrite(service, &records, malformed)?;
        tracing::debug!(service, name, "removed value");
        Ok(true)
    }

    /// Decrypt the whole store into the plaintext scratch file
    pub fn export_plaintext(&self, service: &str) -> Result<usize> {
        let encrypted = self.load(service)?;
        let plain = transcode::decrypt_all(&encrypted, &self.key)?;

        // A line break would split the value into extra records on import
        for record in plain.iter() {
            record::validate_value(&record.value).map_err(|e| Error::Transcode {
                name: record.name.clone(),
                source: Box::new(e),
            })?;
        }

        let scratch = self.paths.scratch_file(service);
        write_atomic(&scratch, &plain.serialize())?;
        tracing::debug!(service, path = %scratch.display(), count = plain.len(), "exported plaintext");
        Ok(plain.len())
    }

    /// Re-encrypt the plaintext scratch file, replacing the store
    pub fn import_plaintext(&self, service: &str) -> Result<usize> {
        self.validate_service(service)?;
        let scratch = self.paths.scratch_file(service);
        let parsed = read_records(&scratch)?;

        for name in parsed.names() {
            record::validate_name(name)?;
        }

        let plain = parsed.deduplicated();
        if plain.len() != parsed.len() {
            tracing::warn!(
                path = %scratch.display(),
                dropped = parsed.len() - plain.len(),
                "repeated names in scratch file, keeping the last value of each"
            );
        }

        let encrypted = transcode::encrypt_all(&plain, &self.key)?;
        write_atomic(&self.paths.store_file(service), &encrypted.serialize())?;
        tracing::debug!(service, count = encrypted.len(), "imported plaintext");
        Ok(encrypted.len())
    }

    /// Delete the plaintext scratch file if it exists
    pub fn purge_plaintext(&self, service: &str) -> Result<bool> {
        self.validate_service(service)?;
        let scratch = self.paths.scratch_file(service);
        match fs::remove_file(&scratch) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(scratch, e)),
        }
    }

    fn validate_service(&self, service: &str) -> Result<()> {
        validate_service(&self.paths, service)
    }

    fn load(&self, service: &str) -> Result<RecordSet> {
        self.validate_service(service)?;
        read_records(&self.paths.store_file(service))
    }

    /// Load a store that may be rewritten, with its malformed lines
    fn load_for_rewrite(&self, service: &str) -> Result<(RecordSet, Vec<MalformedLine>)> {
        self.validate_service(service)?;
        read_records_lenient(&self.paths.store_file(service))
    }

    fn load_or_empty(&self, service: &str) -> Result<(RecordSet, Vec<MalformedLine>)> {
        match self.load_for_rewrite(service) {
            Err(Error::Storage { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Ok((RecordSet::new(), Vec::new()))
            }
            other => other,
        }
    }

    /// Replace a store file; malformed lines cannot survive the rewrite
    fn rewrite(
        &self,
        service: &str,
        records: &RecordSet,
        malformed: Vec<MalformedLine>,
    ) -> Result<()> {
        let path = self.paths.store_file(service);
        for line in &malformed {
            tracing::warn!(path = %path.display(), "rewrite discards malformed {}", line);
        }
        write_atomic(&path, &records.serialize())
    }
}

/// Create the store directory and an empty store file for `service`
pub fn init_storage(paths: &Paths, service: &str) -> Result<()> {
    validate_service(paths, service)?;

    fs::create_dir_all(&paths.store_dir).map_err(|e| Error::storage(&paths.store_dir, e))?;

    let store_file = paths.store_file(service);
    match create_private(&store_file) {
        Ok(_) => {
            tracing::debug!(path = %store_file.display(), "created store file");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(Error::storage(store_file, e)),
    }
}

/// Check that a service name maps to its own file inside the store directory
pub fn validate_service(paths: &Paths, service: &str) -> Result<()> {
    if service.trim().is_empty() {
        return Err(Error::InvalidService("Service cannot be empty".to_string()));
    }

    if service == "." || service == ".." {
        return Err(Error::InvalidService(format!(
            "Invalid service name: {}",
            service
        )));
    }

    if let Some(c) = service
        .chars()
        .find(|c| matches!(c, '/' | '\\' | '\0' | '\n' | '\r'))
    {
        return Err(Error::InvalidService(format!(
            "Invalid character {:?} in service",
            c
        )));
    }

    if paths.collides_with_scratch(service) {
        return Err(Error::InvalidService(format!(
            "{} would share a file with another service's plaintext copy",
            service
        )));
    }

    Ok(())
}

fn read_records_lenient(path: &Path) -> Result<(RecordSet, Vec<MalformedLine>)> {
    let content = fs::read_to_string(path).map_err(|e| Error::storage(path, e))?;
    Ok(RecordSet::parse_lenient(&content))
}

fn read_records(path: &Path) -> Result<RecordSet> {
    let (records, malformed) = read_records_lenient(path)?;

    for line in &malformed {
        tracing::warn!(path = %path.display(), "skipping malformed {}", line);
    }

    Ok(records)
}

/// Replace `path` with `content` via a temporary sibling file and a rename
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::storage(parent, e))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    // Leftover from an interrupted run
    match fs::remove_file(tmp_path) {
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(Error::storage(tmp_path, e)),
        _ => {}
    }

    let replace = || -> std::io::Result<()> {
        let mut file = create_private(tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(tmp_path, path)
    };

    replace().map_err(|e| {
        let _ = fs::remove_file(tmp_path);
        Error::storage(path, e)
    })
}
