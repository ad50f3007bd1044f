use std::io::{Read, SeekFrom};
use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::TransferError;
use crate::types::{Chunk, ChunkSpan};

// ---------------------------------------------------------------------------
// Checksum helpers
// ---------------------------------------------------------------------------

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Chunk planning
// ---------------------------------------------------------------------------

/// Number of chunks needed to cover `total_size` bytes: `ceil(size / chunk)`.
pub fn chunk_count(total_size: u64, chunk_size: u64) -> Result<u32, TransferError> {
    if chunk_size == 0 {
        return Err(TransferError::InvalidChunkSize(chunk_size));
    }
    let count = total_size.div_ceil(chunk_size);
    u32::try_from(count).map_err(|_| TransferError::TooManyChunks(count))
}

/// Partitions `[0, total_size)` into consecutive spans of `chunk_size` bytes.
///
/// The last span is truncated to the remainder. A zero-byte file has no spans.
pub fn plan_chunks(total_size: u64, chunk_size: u64) -> Result<Vec<ChunkSpan>, TransferError> {
    let count = chunk_count(total_size, chunk_size)?;
    let spans = (0..count)
        .map(|index| {
            let start = u64::from(index) * chunk_size;
            let end = start.saturating_add(chunk_size).min(total_size);
            ChunkSpan { index, start, end }
        })
        .collect();
    Ok(spans)
}

/// Reads the bytes of one planned span from `path`.
///
/// Fails with `UnexpectedEof` if the file no longer covers the span.
pub async fn read_chunk(path: &Path, span: &ChunkSpan) -> Result<Chunk, TransferError> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(span.start)).await?;

    let mut buf = vec![0u8; span.len() as usize];
    file.read_exact(&mut buf).await?;

    Ok(Chunk {
        index: span.index,
        start: span.start,
        end: span.end,
        data: buf.into(),
    })
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Reads a file front to back in fixed-size, indexed chunks.
pub struct ChunkReader {
    file: std::fs::File,
    chunk_size: u64,
    offset: u64,
    next_index: u32,
    file_size: u64,
    total_chunks: u32,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    pub fn new(path: &Path, chunk_size: u64) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        let total_chunks = chunk_count(file_size, chunk_size)?;
        Ok(Self {
            file,
            chunk_size,
            offset: 0,
            next_index: 0,
            file_size,
            total_chunks,
        })
    }

    /// Reads the next chunk. Returns `None` once `file_size` bytes were read.
    ///
    /// A file that shrinks while being read fails with `UnexpectedEof`
    /// instead of producing a short chunk.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(None);
        }

        let read_size = remaining.min(self.chunk_size);
        let mut buf = vec![0u8; read_size as usize];
        self.file.read_exact(&mut buf)?;

        let chunk = Chunk {
            index: self.next_index,
            start: self.offset,
            end: self.offset + read_size,
            data: buf.into(),
        };
        self.offset += read_size;
        self.next_index += 1;
        Ok(Some(chunk))
    }

    /// Current byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Total file size in bytes, as seen when the reader was opened.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Bytes remaining to read.
    pub fn remaining(&self) -> u64 {
        self.file_size - self.offset
    }

    /// Number of chunks the file splits into.
    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    #[test]
    fn checksums_are_hex_sha256() {
        assert_eq!(
            checksum_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(checksum_bytes(b"abc"), checksum_bytes(b"abc"));
        assert_ne!(checksum_bytes(b"abc"), checksum_bytes(b"abd"));
    }

    #[test]
    fn chunk_count_is_ceiling() {
        assert_eq!(chunk_count(0, 4).unwrap(), 0);
        assert_eq!(chunk_count(1, 4).unwrap(), 1);
        assert_eq!(chunk_count(4, 4).unwrap(), 1);
        assert_eq!(chunk_count(5, 4).unwrap(), 2);
        assert_eq!(chunk_count(5_000_000, 2_097_152).unwrap(), 3);
    }

    #[test]
    fn chunk_count_rejects_zero_chunk_size() {
        assert!(matches!(
            chunk_count(10, 0),
            Err(TransferError::InvalidChunkSize(0))
        ));
    }

    #[test]
    fn chunk_count_rejects_overflowing_plan() {
        assert!(matches!(
            chunk_count(u64::MAX, 1),
            Err(TransferError::TooManyChunks(_))
        ));
    }

    #[test]
    fn plan_five_megabytes_in_two_mib_chunks() {
        let spans = plan_chunks(5_000_000, 2_097_152).unwrap();
        let sizes: Vec<u64> = spans.iter().map(ChunkSpan::len).collect();
        assert_eq!(sizes, vec![2_097_152, 2_097_152, 805_696]);
    }

    #[test]
    fn plan_covers_range_without_gaps_or_overlaps() {
        for size in [0u64, 1, 7, 8, 9, 63, 64, 65, 1000] {
            for chunk in [1u64, 3, 8, 64, 4096] {
                let spans = plan_chunks(size, chunk).unwrap();
                assert_eq!(spans.len() as u64, size.div_ceil(chunk));

                let mut expected_start = 0;
                for (i, span) in spans.iter().enumerate() {
                    assert_eq!(span.index as usize, i);
                    assert_eq!(span.start, expected_start);
                    assert!(span.end > span.start);
                    assert!(span.len() <= chunk);
                    expected_start = span.end;
                }
                assert_eq!(expected_start, size);
            }
        }
    }

    #[test]
    fn plan_near_u64_max_does_not_overflow() {
        let total = (1u64 << 63) | 1;
        let spans = plan_chunks(total, 1 << 63).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].end), (0, 1 << 63));
        assert_eq!((spans[1].start, spans[1].end), (1 << 63, total));
        assert_eq!(spans[1].len(), 1);

        let spans = plan_chunks(u64::MAX, u64::MAX - 1).unwrap();
        assert_eq!(spans.last().unwrap().end, u64::MAX);
    }

    #[tokio::test]
    async fn read_chunk_returns_span_bytes() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"AABBCCDDEE");

        let span = ChunkSpan { index: 2, start: 8, end: 10 };
        let chunk = read_chunk(&path, &span).await.unwrap();
        assert_eq!(chunk.span(), span);
        assert_eq!(&chunk.data[..], b"EE");
    }

    #[tokio::test]
    async fn read_chunk_past_end_of_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "short.bin", b"AABB");

        let span = ChunkSpan { index: 1, start: 4, end: 8 };
        let err = read_chunk(&path, &span).await.unwrap_err();
        match err {
            TransferError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn chunk_reader_reads_all() {
        let dir = TempDir::new().unwrap();
        let data = b"AABBCCDDEE"; // 10 bytes.
        let path = create_test_file(dir.path(), "test.bin", data);

        let mut reader = ChunkReader::new(&path, 4).unwrap();
        assert_eq!(reader.file_size(), 10);
        assert_eq!(reader.remaining(), 10);
        assert_eq!(reader.total_chunks(), 3);

        let c1 = reader.next_chunk().unwrap().unwrap();
        assert_eq!((c1.index, c1.start, c1.end), (0, 0, 4));
        assert_eq!(&c1.data[..], b"AABB");
        assert_eq!(reader.remaining(), 6);

        let c2 = reader.next_chunk().unwrap().unwrap();
        assert_eq!((c2.index, c2.start, c2.end), (1, 4, 8));
        assert_eq!(&c2.data[..], b"CCDD");

        let c3 = reader.next_chunk().unwrap().unwrap();
        assert_eq!((c3.index, c3.start, c3.end), (2, 8, 10));
        assert_eq!(&c3.data[..], b"EE");

        assert!(reader.next_chunk().unwrap().is_none());
        assert_eq!(reader.offset(), 10);
    }

    #[test]
    fn chunk_reader_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "empty.bin", b"");
        let mut reader = ChunkReader::new(&path, 4).unwrap();
        assert_eq!(reader.total_chunks(), 0);
        assert!(reader.next_chunk().unwrap().is_none());
    }

    #[test]
    fn chunk_reader_rejects_zero_chunk_size() {
        let dir = TempDir::new().unwrap();
        let path = create_test_file(dir.path(), "test.bin", b"x");
        assert!(matches!(
            ChunkReader::new(&path, 0),
            Err(TransferError::InvalidChunkSize(0))
        ));
    }

    #[test]
    fn chunk_reader_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = ChunkReader::new(&dir.path().join("nope.bin"), 4);
        assert!(matches!(result, Err(TransferError::Io(_))));
    }

    #[test]
    fn chunks_reassemble_original() {
        let dir = TempDir::new().unwrap();
        let original = b"The quick brown fox jumps over the lazy dog";
        let path = create_test_file(dir.path(), "fox.txt", original);

        let mut reader = ChunkReader::new(&path, 10).unwrap();
        let mut rebuilt = Vec::new();
        while let Some(chunk) = reader.next_chunk().unwrap() {
            assert_eq!(chunk.start as usize, rebuilt.len());
            rebuilt.extend_from_slice(&chunk.data);
        }
        assert_eq!(&rebuilt, original);
    }
}
