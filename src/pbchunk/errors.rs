use std::path::PathBuf;

#[derive(Debug, Fail)]
pub enum ChunkError {
    #[fail(display = "no PacBio index {:?} for {:?}", index, bam)]
    MissingIndex { bam: PathBuf, index: PathBuf },
    #[fail(display = "malformed PacBio index {:?}: {}", index, reason)]
    MalformedIndex { index: PathBuf, reason: String },
    #[fail(display = "number of chunks must be at least 1")]
    InvalidChunkCount,
    #[fail(
        display = "bad chunk range: {} bytes at {} after a {} byte header",
        len, start, header_len
    )]
    InvalidRange { header_len: u64, start: u64, len: u64 },
    #[fail(display = "output {:?} already exists", _0)]
    OutputExists(PathBuf),
    #[fail(
        display = "source {:?} ended after {} of {} bytes",
        path, copied, expected
    )]
    TruncatedSource {
        path: PathBuf,
        expected: u64,
        copied: u64,
    },
    #[fail(display = "no hole number in read {:?}", _0)]
    BadZmwName(String),
}

impl ChunkError {
    pub fn malformed<P: Into<PathBuf>, S: ToString>(index: P, reason: S) -> Self {
        ChunkError::MalformedIndex {
            index: index.into(),
            reason: reason.to_string(),
        }
    }
}
