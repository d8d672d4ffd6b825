use std::{
    fs::{self, File},
    io::{self, Write},
    path::PathBuf,
};

use rand::distributions::{Alphanumeric, DistString};
use tracing::debug;

use crate::error::{Error, Result};
use crate::oid::{Oid, OID_HEX_SIZE};
use crate::zlib;

use super::object::Object;
use super::paths::{ensure_dir, ensure_file};

/// Shortest abbreviated object name accepted by [`Db::resolve`].
pub const MIN_PREFIX_LEN: usize = 4;

/// Loose object storage under `.git/objects/<2 hex>/<38 hex>`.
pub struct Db {
    root: PathBuf,
}

impl Db {
    pub fn new(git_dir: PathBuf) -> Self {
        Self {
            root: git_dir.join("objects"),
        }
    }

    pub fn init(&self) -> Result<()> {
        ensure_dir(&self.root, true)?;
        Ok(())
    }

    pub fn object_path(&self, oid: &Oid) -> PathBuf {
        let (group, rest) = oid.split();
        self.root.join(group).join(rest)
    }

    pub fn read_object(&self, oid: &Oid) -> Result<Object> {
        let path = self.object_path(oid);
        let compressed = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ObjectNotFound(oid.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let framed = zlib::decompress(&compressed)?;
        let object = Object::decode_from_storage(&framed)?;
        debug!(%oid, kind = %object.kind(), size = framed.len(), "read object");
        Ok(object)
    }

    /// Frames and hashes `object`; stores it when `persist` is set.
    pub fn store_object(&self, object: &Object, persist: bool) -> Result<Oid> {
        let framed = object.encode_for_storage();
        let oid = *framed.oid();

        if persist {
            self.write_object(&oid, framed.data())?;
        }

        Ok(oid)
    }

    fn write_object(&self, oid: &Oid, content: &[u8]) -> Result<()> {
        let object_path = self.object_path(oid);
        if object_path.is_file() {
            debug!(%oid, "object already stored");
            return Ok(());
        }

        let compressed = zlib::compress(content)?;

        ensure_file(&object_path, true)?;
        let temp_path = object_path.with_file_name(generate_temp_name());

        let mut file = File::create_new(&temp_path)?;
        let written = file
            .write_all(&compressed)
            .and_then(|()| file.sync_all())
            .and_then(|()| fs::rename(&temp_path, &object_path));

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(%oid, size = content.len(), "wrote object");
        Ok(())
    }

    /// Resolves a full or abbreviated (at least 4 hex digits) object name.
    pub fn resolve(&self, name: &str) -> Result<Oid> {
        if name.len() == OID_HEX_SIZE {
            return name.parse();
        }

        let prefix = name.to_ascii_lowercase();
        if prefix.len() < MIN_PREFIX_LEN
            || prefix.len() > OID_HEX_SIZE
            || !prefix.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(Error::InvalidOid(name.to_owned()));
        }

        let (group, rest) = prefix.split_at(2);
        let group_path = self.root.join(group);
        if !group_path.is_dir() {
            return Err(Error::ObjectNotFound(name.to_owned()));
        }

        let mut found: Option<Oid> = None;
        for entry in fs::read_dir(&group_path)? {
            let file_name = entry?.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if !file_name.starts_with(rest) {
                continue;
            }
            let Ok(oid) = format!("{group}{file_name}").parse::<Oid>() else {
                continue;
            };
            if found.replace(oid).is_some() {
                return Err(Error::AmbiguousOid(name.to_owned()));
            }
        }

        found.ok_or_else(|| Error::ObjectNotFound(name.to_owned()))
    }
}

fn generate_temp_name() -> String {
    let suffix = Alphanumeric.sample_string(&mut rand::thread_rng(), 6);
    format!("tmp_obj_{suffix}")
}
