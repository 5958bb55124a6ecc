//! Object store: typed, content-addressed blobs and commits in one flat directory.

use crate::error::{Error, Result};
use crate::hash::{Algorithm, Hash};
use crate::object::{HEADER_SIZE, ObjectHeader, ObjectType};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Shortest abbreviated id accepted by [`ObjectStore::resolve`].
pub const MIN_PREFIX_LEN: usize = 4;

/// Result of a [`ObjectStore::put`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stored {
    /// Id of the object.
    pub hash: Hash,
    /// False when an object with this id already existed and nothing was written.
    pub written: bool,
}

/// A content-addressed object store rooted at a single `objects` directory.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    dir: PathBuf,
    algorithm: Algorithm,
}

impl ObjectStore {
    /// Open an object store over an existing directory.
    pub fn new<P: AsRef<Path>>(dir: P, algorithm: Algorithm) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            algorithm,
        }
    }

    /// The directory holding every object file.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path to an object file given its hash.
    ///
    /// Returns: `objects/{hex}`
    pub fn object_path(&self, hash: &Hash) -> PathBuf {
        self.dir.join(hash.to_hex())
    }

    /// Whether an object with this id is present.
    pub fn exists(&self, hash: &Hash) -> bool {
        self.object_path(hash).is_file()
    }

    /// Store `payload` under its content id.
    ///
    /// An existing object is never rewritten, so storing the same content
    /// twice is a successful no-op.
    pub fn put(&self, object_type: ObjectType, payload: &[u8]) -> Result<Stored> {
        let hash = Hash::hash_bytes(payload);

        if self.exists(&hash) {
            debug!(%hash, kind = %object_type, "object already present");
            return Ok(Stored {
                hash,
                written: false,
            });
        }

        let header = ObjectHeader::new(object_type, self.algorithm, payload.len() as u64);
        self.write_object_atomic(&hash, &header, payload)?;
        debug!(%hash, kind = %object_type, bytes = payload.len(), "object written");

        Ok(Stored {
            hash,
            written: true,
        })
    }

    /// Store file content as a blob.
    pub fn put_blob(&self, payload: &[u8]) -> Result<Stored> {
        self.put(ObjectType::Blob, payload)
    }

    /// Read an object, returning its type and payload.
    ///
    /// The payload is re-hashed and compared against `hash`; a mismatch is
    /// reported as corruption instead of returning the wrong content.
    pub fn get(&self, hash: &Hash) -> Result<(ObjectType, Vec<u8>)> {
        let obj_path = self.object_path(hash);

        let mut raw = Vec::new();
        match fs::File::open(&obj_path) {
            Ok(mut file) => {
                file.read_to_end(&mut raw)?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::object_not_found(hash.to_hex()));
            }
            Err(e) => return Err(e.into()),
        }

        let header = ObjectHeader::decode(&raw, &obj_path)?;
        let payload = raw.split_off(HEADER_SIZE);

        if payload.len() as u64 != header.payload_len {
            return Err(Error::corrupted_object(
                &obj_path,
                format!(
                    "Payload length mismatch: expected {}, got {}",
                    header.payload_len,
                    payload.len()
                ),
            ));
        }

        let computed = Hash::hash_bytes(&payload);
        if computed != *hash {
            return Err(Error::corrupted_object(
                &obj_path,
                format!("Hash mismatch: expected {}, got {}", hash, computed),
            ));
        }

        Ok((header.object_type, payload))
    }

    /// Read an object that must be of `expected` type.
    pub fn get_typed(&self, hash: &Hash, expected: ObjectType) -> Result<Vec<u8>> {
        let (object_type, payload) = self.get(hash)?;
        if object_type != expected {
            return Err(Error::invalid_object_type(
                expected.as_str(),
                object_type.as_str(),
            ));
        }
        Ok(payload)
    }

    /// Retrieve a blob by hash.
    pub fn get_blob(&self, hash: &Hash) -> Result<Vec<u8>> {
        self.get_typed(hash, ObjectType::Blob)
    }

    /// Read only the header of an object to learn its type.
    pub fn object_type(&self, hash: &Hash) -> Result<ObjectType> {
        let obj_path = self.object_path(hash);
        let mut file = match fs::File::open(&obj_path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::object_not_found(hash.to_hex()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut header_buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_buf).map_err(|_| {
            Error::corrupted_object(&obj_path, "File shorter than object header")
        })?;
        Ok(ObjectHeader::decode(&header_buf, &obj_path)?.object_type)
    }

    /// List every object id in the store, sorted.
    ///
    /// Files whose names are not object ids (such as in-flight temp files)
    /// are skipped.
    pub fn list(&self) -> Result<Vec<Hash>> {
        let mut hashes = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && let Ok(hash) = Hash::from_hex(name)
            {
                hashes.push(hash);
            }
        }

        hashes.sort();
        Ok(hashes)
    }

    /// Resolve a full or abbreviated hex id to the object it names.
    pub fn resolve(&self, id: &str) -> Result<Hash> {
        let id = id.trim();

        if id.len() == crate::hash::HASH_SIZE * 2 {
            let hash = Hash::from_hex(id)?;
            if !self.exists(&hash) {
                return Err(Error::object_not_found(hash.to_hex()));
            }
            return Ok(hash);
        }

        if id.len() < MIN_PREFIX_LEN {
            return Err(Error::invalid_hash(format!(
                "Abbreviated id must be at least {} characters, got {:?}",
                MIN_PREFIX_LEN, id
            )));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::invalid_hash(format!("Invalid hex: {:?}", id)));
        }

        let candidates: Vec<Hash> = self
            .list()?
            .into_iter()
            .filter(|h| h.matches_prefix(id))
            .collect();

        match candidates.as_slice() {
            [] => Err(Error::object_not_found(id)),
            [hash] => Ok(*hash),
            _ => Err(Error::ambiguous_id(id, candidates.len())),
        }
    }

    /// Delete an object file, returning the number of bytes freed.
    pub(crate) fn remove(&self, hash: &Hash) -> Result<u64> {
        let obj_path = self.object_path(hash);
        let len = fs::metadata(&obj_path)?.len();
        fs::remove_file(&obj_path)?;
        debug!(%hash, bytes = len, "object removed");
        Ok(len)
    }

    /// Write an object atomically using tempfile.
    fn write_object_atomic(&self, hash: &Hash, header: &ObjectHeader, payload: &[u8]) -> Result<()> {
        let obj_path = self.object_path(hash);

        let mut temp_file = tempfile::NamedTempFile::new_in(&self.dir)?;
        temp_file.write_all(&header.encode())?;
        temp_file.write_all(payload)?;
        temp_file.flush()?;
        temp_file.persist(&obj_path)?;

        Ok(())
    }
}
