use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use failure;
use tempfile::NamedTempFile;

use errors::ChunkError;

/// Empty BGZF block that terminates every well-formed BGZF file.
pub const BGZF_EOF: [u8; 28] = [
    0x1f, 0x8b, 0x08, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x06, 0x00, 0x42, 0x43, 0x02, 0x00,
    0x1b, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Writes a stand-alone BAM file made of the first `header_byte_length`
/// bytes of `source_path`, the `byte_length` bytes starting at
/// `start_offset`, and a BGZF end-of-file block.
///
/// Both ranges must lie on compressed block boundaries; nothing is
/// decompressed. The chunk is written to a temporary file next to
/// `output_path` and moved into place only once complete, and an
/// existing `output_path` is never replaced.
pub fn extract_chunk<P: AsRef<Path>, Q: AsRef<Path>>(
    source_path: P,
    output_path: Q,
    header_byte_length: u64,
    start_offset: u64,
    byte_length: u64,
) -> Result<(), failure::Error> {
    let source_path = source_path.as_ref();
    let output_path = output_path.as_ref();

    if byte_length == 0 || start_offset < header_byte_length {
        return Err(ChunkError::InvalidRange {
            header_len: header_byte_length,
            start: start_offset,
            len: byte_length,
        }.into());
    }
    if output_path.exists() {
        return Err(ChunkError::OutputExists(output_path.to_path_buf()).into());
    }

    let mut source = File::open(source_path)?;
    let permissions = source.metadata()?.permissions();

    let out_dir = output_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut chunk = NamedTempFile::new_in(out_dir)?;

    copy_range(&mut source, source_path, 0, header_byte_length, &mut chunk)?;
    copy_range(&mut source, source_path, start_offset, byte_length, &mut chunk)?;
    chunk.write_all(&BGZF_EOF)?;
    chunk.flush()?;
    chunk.as_file().set_permissions(permissions)?;

    chunk.persist_noclobber(output_path).map_err(|e| -> failure::Error {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            ChunkError::OutputExists(output_path.to_path_buf()).into()
        } else {
            e.error.into()
        }
    })?;

    debug!("Wrote {:?}: {} header bytes + {} bytes from {}",
           output_path, header_byte_length, byte_length, start_offset);

    Ok(())
}

fn copy_range<W: Write>(
    source: &mut File,
    source_path: &Path,
    start: u64,
    len: u64,
    out: &mut W,
) -> Result<(), failure::Error> {
    source.seek(SeekFrom::Start(start))?;
    let copied = io::copy(&mut (&mut *source).take(len), out)?;
    if copied != len {
        return Err(ChunkError::TruncatedSource {
            path: source_path.to_path_buf(),
            expected: len,
            copied: copied,
        }.into());
    }
    Ok(())
}

/// Returns the offset where the data blocks of a BGZF file end: the file
/// size, less the trailing end-of-file block when one is present.
pub fn bgzf_body_end<P: AsRef<Path>>(path: P) -> Result<u64, failure::Error> {
    let mut file = File::open(path.as_ref())?;
    let size = file.metadata()?.len();
    let eof_len = BGZF_EOF.len() as u64;

    if size < eof_len {
        return Ok(size);
    }

    let mut tail = [0u8; 28];
    file.seek(SeekFrom::Start(size - eof_len))?;
    file.read_exact(&mut tail)?;
    if tail == BGZF_EOF {
        Ok(size - eof_len)
    } else {
        warn!("{:?} lacks a BGZF end-of-file block", path.as_ref());
        Ok(size)
    }
}
