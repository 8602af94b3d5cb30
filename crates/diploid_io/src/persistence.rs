//! Low-level artifact writers and readers.
//!
//! Every writer goes through [`write_atomic`], so a reader never observes a
//! half-written file under its final name.

use crate::error::{IoError, Result};
use crate::serialization::{from_json_slice, write_json};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rkyv::de::deserializers::SharedDeserializeMap;
use rkyv::ser::serializers::AllocSerializer;
use rkyv::ser::Serializer;
use rkyv::{AlignedVec, Archive, Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes through `write` into a sibling temp file, then renames it over `path`.
pub fn write_atomic<P, F>(path: P, write: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let path = path.as_ref();
    let tmp = temp_path(path);
    let result = (|| -> Result<()> {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        write(&mut writer)?;
        let file = writer
            .into_inner()
            .map_err(|e| IoError::FileSystem(e.into_error()))?;
        file.sync_all()?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result.map_err(|e| e.with_context(format!("writing {}", path.display())))
}

pub fn save_rkyv<T, P>(data: &T, path: P) -> Result<()>
where
    T: Serialize<AllocSerializer<4096>>,
    T: Archive,
    P: AsRef<Path>,
{
    let mut serializer = AllocSerializer::<4096>::default();
    serializer
        .serialize_value(data)
        .map_err(|e| IoError::rkyv(format!("serialization failed: {:?}", e)))?;
    let bytes = serializer.into_serializer().into_inner();
    write_atomic(path, |w| {
        w.write_all(&bytes)?;
        Ok(())
    })
}

pub fn load_rkyv<T, P>(path: P) -> Result<T>
where
    T: Archive,
    T::Archived: Deserialize<T, SharedDeserializeMap>
        + for<'a> rkyv::CheckBytes<rkyv::validation::validators::DefaultValidator<'a>>,
    P: AsRef<Path>,
{
    let raw = std::fs::read(path)?;
    // Archives must be read from aligned storage.
    let mut bytes = AlignedVec::with_capacity(raw.len());
    bytes.extend_from_slice(&raw);
    let archived = rkyv::check_archived_root::<T>(&bytes)
        .map_err(|e| IoError::rkyv(format!("validation failed: {:?}", e)))?;
    let mut deserializer = SharedDeserializeMap::default();
    let deserialized: T = archived
        .deserialize(&mut deserializer)
        .map_err(|e| IoError::rkyv(format!("deserialization failed: {:?}", e)))?;
    Ok(deserialized)
}

/// Writes `data` as gzip-compressed JSON.
pub fn save_json_gz<T, P>(data: &T, path: P) -> Result<()>
where
    T: serde::Serialize,
    P: AsRef<Path>,
{
    write_atomic(path, |w| {
        let mut encoder = GzEncoder::new(w, Compression::default());
        write_json(&mut encoder, data)?;
        encoder
            .finish()
            .map_err(|e| IoError::compression(e.to_string()))?;
        Ok(())
    })
}

pub fn load_json_gz<T, P>(path: P) -> Result<T>
where
    T: for<'de> serde::Deserialize<'de>,
    P: AsRef<Path>,
{
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let mut json = Vec::new();
    decoder
        .read_to_end(&mut json)
        .map_err(|e| IoError::compression(e.to_string()))?;
    from_json_slice(&json)
}
