//! Record codec: canonical JSON, optional gzip, optional AEAD seal.
//!
//! Write order is serialize → compress → seal; reads invert it. The file
//! suffix records whether compression is present (`.json.gz` vs `.json`);
//! encryption wraps the payload without changing the suffix.

use crate::error::StoreError;
use crate::model::Memory;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use mnemon_rs_config::StorageConfig;
use mnemon_rs_crypto::Cipher;
use std::io::{Read, Write};

/// Suffix for gzipped record files.
pub(crate) const COMPRESSED_SUFFIX: &str = ".json.gz";
/// Suffix for plain record files.
pub(crate) const PLAIN_SUFFIX: &str = ".json";

/// Transforms records between in-memory form and on-disk bytes.
pub(crate) struct Codec {
    compression: Option<u32>,
    cipher: Option<Cipher>,
}

impl Codec {
    /// Build the codec for a storage configuration, initializing the at-rest
    /// cipher (and its key file) when encryption is enabled.
    pub(crate) fn new(config: &StorageConfig) -> Result<Self, StoreError> {
        let cipher = if config.enable_encryption {
            Some(Cipher::open_or_init(&config.encryption_key_path)?)
        } else {
            None
        };
        let compression = config
            .enable_compression
            .then_some(config.compression_level);
        Ok(Codec {
            compression,
            cipher,
        })
    }

    /// File suffix produced by this codec.
    pub(crate) fn suffix(&self) -> &'static str {
        if self.compression.is_some() {
            COMPRESSED_SUFFIX
        } else {
            PLAIN_SUFFIX
        }
    }

    /// Encode a record to its on-disk byte form.
    pub(crate) fn encode(&self, record: &Memory) -> Result<Vec<u8>, StoreError> {
        let mut payload = serde_json::to_vec(record)?;

        if let Some(level) = self.compression {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
            encoder
                .write_all(&payload)
                .map_err(|err| StoreError::Codec(format!("gzip write failed: {err}")))?;
            payload = encoder
                .finish()
                .map_err(|err| StoreError::Codec(format!("gzip finish failed: {err}")))?;
        }

        if let Some(cipher) = &self.cipher {
            payload = cipher.seal(&payload)?;
        }

        Ok(payload)
    }

    /// Decode on-disk bytes back into a record.
    ///
    /// `compressed` reflects the file suffix, not the live configuration, so
    /// records written under a different compression setting still load.
    pub(crate) fn decode(&self, bytes: &[u8], compressed: bool) -> Result<Memory, StoreError> {
        let mut payload = match &self.cipher {
            Some(cipher) => cipher.open(bytes)?,
            None => bytes.to_vec(),
        };

        if compressed {
            let mut decoder = GzDecoder::new(payload.as_slice());
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|err| StoreError::Codec(format!("gzip read failed: {err}")))?;
            payload = decompressed;
        }

        Ok(serde_json::from_slice(&payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::Codec;
    use crate::model::Memory;
    use chrono::Utc;
    use mnemon_rs_config::StorageConfig;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn sample_record() -> Memory {
        Memory {
            id: "abc123-v1".to_string(),
            content: "A record with enough text that gzip has something to chew on. \
                      A record with enough text that gzip has something to chew on."
                .to_string(),
            summary: "round trip sample".to_string(),
            tags: vec!["codec".to_string()],
            category: "test".to_string(),
            metadata: HashMap::from([("origin".to_string(), "unit".to_string())]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            access_count: 3,
            last_access: Utc::now(),
            version: 1,
            previous_version_id: String::new(),
            is_current_version: true,
            keywords: vec!["gzip".to_string()],
        }
    }

    fn config(compression: bool, encryption: bool, key_dir: &std::path::Path) -> StorageConfig {
        StorageConfig {
            enable_compression: compression,
            compression_level: 6,
            enable_encryption: encryption,
            encryption_key_path: key_dir.join("codec.key"),
            ..StorageConfig::default()
        }
    }

    #[test]
    fn round_trips_all_pipeline_combinations() {
        let temp = tempdir().expect("tempdir");
        let record = sample_record();

        for compression in [false, true] {
            for encryption in [false, true] {
                let codec =
                    Codec::new(&config(compression, encryption, temp.path())).expect("codec");
                let bytes = codec.encode(&record).expect("encode");
                let decoded = codec.decode(&bytes, compression).expect("decode");
                assert_eq!(decoded, record, "compression={compression} encryption={encryption}");
            }
        }
    }

    #[test]
    fn compression_shrinks_repetitive_payloads() {
        let temp = tempdir().expect("tempdir");
        let record = sample_record();

        let plain = Codec::new(&config(false, false, temp.path())).expect("codec");
        let gzipped = Codec::new(&config(true, false, temp.path())).expect("codec");

        let plain_bytes = plain.encode(&record).expect("encode");
        let gzipped_bytes = gzipped.encode(&record).expect("encode");
        assert!(gzipped_bytes.len() < plain_bytes.len());
    }

    #[test]
    fn suffix_tracks_compression_setting() {
        let temp = tempdir().expect("tempdir");
        assert_eq!(
            Codec::new(&config(false, false, temp.path())).expect("codec").suffix(),
            ".json"
        );
        assert_eq!(
            Codec::new(&config(true, false, temp.path())).expect("codec").suffix(),
            ".json.gz"
        );
    }

    #[test]
    fn sealed_payloads_fail_without_the_cipher() {
        let temp = tempdir().expect("tempdir");
        let record = sample_record();

        let sealing = Codec::new(&config(false, true, temp.path())).expect("codec");
        let bytes = sealing.encode(&record).expect("encode");

        let plain = Codec::new(&config(false, false, temp.path())).expect("codec");
        assert!(plain.decode(&bytes, false).is_err());
    }
}
