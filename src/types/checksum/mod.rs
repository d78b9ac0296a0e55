#![forbid(unsafe_code)]

/// Incremental checksum over byte streams.
pub trait Checksum {
    fn update(&mut self, bytes: &[u8]);
    fn finalize(&self) -> u32;
}

/// [`Checksum`] backed by `crc32fast`.
#[derive(Clone)]
pub struct Crc32Fast {
    inner: crc32fast::Hasher,
}

impl Default for Crc32Fast {
    fn default() -> Self {
        Self {
            inner: crc32fast::Hasher::new(),
        }
    }
}

impl Checksum for Crc32Fast {
    fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    fn finalize(&self) -> u32 {
        self.inner.clone().finalize()
    }
}

/// CRC32 of an array payload as recorded in store metadata.
pub fn payload_crc32(payload: &[u8]) -> u32 {
    let mut hasher = Crc32Fast::default();
    hasher.update(payload);
    hasher.finalize()
}
