use crate::hash::error::{HashError, HashResult};
use crate::hash::types::{ByteRange, Digest, DigestAlgorithm};
use crate::source::ByteSource;
use sha2::Digest as _;

/// Default internal read window (256 KiB)
pub const DEFAULT_READ_WINDOW: usize = 256 * 1024;

/// Streaming digest over a source, read in bounded windows.
///
/// The window size is independent of the outer chunk size, so memory held by a
/// digest is capped at one window no matter how large the source is.
#[derive(Debug, Clone)]
pub struct HashComputer {
    algorithm: DigestAlgorithm,
    read_window: usize,
}

enum StreamHasher {
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl StreamHasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha256 => StreamHasher::Sha256(sha2::Sha256::new()),
            DigestAlgorithm::Blake3 => StreamHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            StreamHasher::Sha256(h) => h.update(data),
            StreamHasher::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self, algorithm: DigestAlgorithm) -> Digest {
        let bytes: [u8; 32] = match self {
            StreamHasher::Sha256(h) => h.finalize().into(),
            StreamHasher::Blake3(h) => *h.finalize().as_bytes(),
        };
        Digest { algorithm, bytes }
    }
}

impl Default for HashComputer {
    fn default() -> Self {
        Self {
            algorithm: DigestAlgorithm::default(),
            read_window: DEFAULT_READ_WINDOW,
        }
    }
}

impl HashComputer {
    pub fn new(algorithm: DigestAlgorithm, read_window: usize) -> HashResult<Self> {
        if read_window == 0 {
            return Err(HashError::InvalidReadWindow);
        }
        Ok(Self {
            algorithm,
            read_window,
        })
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn read_window(&self) -> usize {
        self.read_window
    }

    /// Digest the whole source, or only `range` when given.
    ///
    /// A failed read aborts the digest; no partial result is returned.
    pub async fn digest<S>(&self, source: &S, range: Option<ByteRange>) -> HashResult<Digest>
    where
        S: ByteSource + ?Sized,
    {
        let size = source.size();
        let range = range.unwrap_or(ByteRange::new(0, size));
        if range.start > range.end || range.end > size {
            return Err(HashError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                size,
            });
        }

        let mut hasher = StreamHasher::new(self.algorithm);
        let mut offset = range.start;

        while offset < range.end {
            let want = (range.end - offset).min(self.read_window as u64) as usize;
            let buf = source.read_range(offset, want).await?;
            if buf.len() != want {
                return Err(HashError::ShortRead {
                    offset,
                    expected: want,
                    actual: buf.len(),
                });
            }
            hasher.update(&buf);
            offset += want as u64;
        }

        Ok(hasher.finalize(self.algorithm))
    }

    /// Digest bytes that are already in memory (a chunk about to be sent).
    pub fn digest_bytes(&self, data: &[u8]) -> Digest {
        let mut hasher = StreamHasher::new(self.algorithm);
        for window in data.chunks(self.read_window) {
            hasher.update(window);
        }
        hasher.finalize(self.algorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[tokio::test]
    async fn test_sha256_known_vector() {
        let computer = HashComputer::default();
        let source = MemorySource::new(&b"abc"[..]);
        let digest = computer.digest(&source, None).await.unwrap();
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_blake3_matches_reference() {
        let data = sample(10_000);
        let computer = HashComputer::new(DigestAlgorithm::Blake3, 1024).unwrap();
        let source = MemorySource::new(data.clone());
        let digest = computer.digest(&source, None).await.unwrap();
        assert_eq!(digest.bytes, *blake3::hash(&data).as_bytes());
    }

    #[tokio::test]
    async fn test_window_size_does_not_change_result() {
        let data = sample(100_003);
        let source = MemorySource::new(data);

        let small = HashComputer::new(DigestAlgorithm::Sha256, 7).unwrap();
        let large = HashComputer::new(DigestAlgorithm::Sha256, 1 << 20).unwrap();

        assert_eq!(
            small.digest(&source, None).await.unwrap(),
            large.digest(&source, None).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_range_digest_matches_bytes_digest() {
        let data = sample(4096);
        let source = MemorySource::new(data.clone());
        let computer = HashComputer::new(DigestAlgorithm::Sha256, 100).unwrap();

        let ranged = computer
            .digest(&source, Some(ByteRange::new(1000, 3000)))
            .await
            .unwrap();
        assert_eq!(ranged, computer.digest_bytes(&data[1000..3000]));

        let whole = computer.digest(&source, None).await.unwrap();
        assert_ne!(ranged, whole);
    }

    #[tokio::test]
    async fn test_range_out_of_bounds() {
        let source = MemorySource::new(sample(10));
        let computer = HashComputer::default();
        let result = computer.digest(&source, Some(ByteRange::new(5, 11))).await;
        assert!(matches!(
            result.unwrap_err(),
            HashError::RangeOutOfBounds { size: 10, .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_range() {
        let source = MemorySource::new(Vec::new());
        let computer = HashComputer::default();
        let digest = computer.digest(&source, None).await.unwrap();
        assert_eq!(
            digest.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_zero_read_window_rejected() {
        assert!(matches!(
            HashComputer::new(DigestAlgorithm::Sha256, 0),
            Err(HashError::InvalidReadWindow)
        ));
    }
}
