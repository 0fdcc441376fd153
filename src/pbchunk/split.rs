use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use failure;

use boundary::{select_chunk_boundaries, ZmwBoundary};
use errors::ChunkError;
use extract::{bgzf_body_end, extract_chunk};
use pbi::{index_path_for, require_index, PbIndex};
use report::{write_chunk_report, ChunkSummary};

pub struct CLI {
    pub input_bam: String,
    pub nchunks: String,
    pub output_prefix: String,
    pub report: Option<String>,
    pub dry_run: bool,
}

impl CLI {
    pub fn run(&self) -> Result<(), failure::Error> {
        let options = SplitOptions {
            source_path: PathBuf::from(&self.input_bam),
            requested_chunks: usize::from_str(&self.nchunks)
                .map_err(|e| format_err!("Bad number of chunks {:?}: {}", self.nchunks, e))?,
            output_prefix: PathBuf::from(&self.output_prefix),
            dry_run: self.dry_run,
        };

        let outcome = split_bam_with(&options)?;

        if let Some(ref report) = self.report {
            write_chunk_report(report, &outcome.chunks)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub source_path: PathBuf,
    pub requested_chunks: usize,
    pub output_prefix: PathBuf,
    /// Plan the chunks without writing any files.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub chunks: Vec<ChunkSummary>,
}

impl SplitOutcome {
    pub fn nchunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.chunks.iter().map(|c| c.path.clone()).collect()
    }
}

/// Returns `PREFIX.chunkN.bam`.
pub fn chunk_path<P: AsRef<Path>>(output_prefix: P, chunk: usize) -> PathBuf {
    let mut name = output_prefix.as_ref().as_os_str().to_os_string();
    name.push(format!(".chunk{}.bam", chunk));
    PathBuf::from(name)
}

/// Splits `source_path` into at most `requested_chunks` BAM files named
/// `OUTPUT_PREFIX.chunkN.bam`, cutting only where a new ZMW begins a new
/// compressed block according to the companion `.pbi` index. Returns the
/// number of chunks written.
pub fn split_bam<P: AsRef<Path>, Q: AsRef<Path>>(
    source_path: P,
    requested_chunks: usize,
    output_prefix: Q,
) -> Result<usize, failure::Error> {
    let options = SplitOptions {
        source_path: source_path.as_ref().to_path_buf(),
        requested_chunks: requested_chunks,
        output_prefix: output_prefix.as_ref().to_path_buf(),
        dry_run: false,
    };
    Ok(split_bam_with(&options)?.nchunks())
}

pub fn split_bam_with(options: &SplitOptions) -> Result<SplitOutcome, failure::Error> {
    if options.requested_chunks == 0 {
        return Err(ChunkError::InvalidChunkCount.into());
    }

    let source = options.source_path.as_path();
    let index_path = index_path_for(source);
    require_index(source, &index_path)?;
    let index = PbIndex::from_path(&index_path)?;

    let boundaries: Vec<ZmwBoundary> = index.zmw_boundaries().collect();
    let chosen = select_chunk_boundaries(&boundaries, options.requested_chunks);
    debug!("{} ZMW boundaries in {} reads of {:?}", boundaries.len(), index.len(), source);

    let header_len = match chosen.first() {
        None => {
            warn!("No reads indexed for {:?}, nothing to split", source);
            return Ok(SplitOutcome { chunks: Vec::new() });
        }
        Some(first) => first.byte_offset,
    };
    if index.virtual_offsets()[0].within_block() != 0 {
        return Err(ChunkError::malformed(&index_path, "first read does not begin a compressed block").into());
    }

    let body_end = bgzf_body_end(source)?;
    if let Some(last) = chosen.last() {
        if last.byte_offset >= body_end {
            return Err(ChunkError::malformed(
                &index_path,
                format!("offset {} is past the end of {:?} at {}", last.byte_offset, source, body_end),
            ).into());
        }
    }

    let mut chunks = Vec::with_capacity(chosen.len());
    for (chunk, start) in chosen.iter().enumerate() {
        // the last chunk stops short of the source's own EOF block
        let (end_offset, end_record) = chosen
            .get(chunk + 1)
            .map_or((body_end, index.len()), |next| (next.byte_offset, next.record_index));
        chunks.push(ChunkSummary::new(
            chunk,
            chunk_path(&options.output_prefix, chunk),
            start.byte_offset,
            end_offset - start.byte_offset,
            start.record_index,
            &index.hole_numbers()[start.record_index..end_record],
        ));
    }

    if options.dry_run {
        for c in chunks.iter() {
            info!("Chunk {}: {} bytes at {}, {} reads in {} ZMWs",
                  c.chunk, c.byte_length, c.start_offset, c.n_records, c.n_zmws);
        }
        return Ok(SplitOutcome { chunks: chunks });
    }

    for c in chunks.iter() {
        if c.path.exists() {
            return Err(ChunkError::OutputExists(c.path.clone()).into());
        }
    }

    let mut written: Vec<&Path> = Vec::new();
    for c in chunks.iter() {
        if let Err(e) = extract_chunk(source, &c.path, header_len, c.start_offset, c.byte_length) {
            remove_partial_output(&written);
            return Err(e);
        }
        debug!("Chunk {} with {} reads in {} ZMWs", c.chunk, c.n_records, c.n_zmws);
        written.push(&c.path);
    }

    info!("Split {:?} into {} chunks ({} requested)",
          source, chunks.len(), options.requested_chunks);

    Ok(SplitOutcome { chunks: chunks })
}

fn remove_partial_output(written: &[&Path]) {
    for path in written.iter() {
        if let Err(e) = fs::remove_file(path) {
            warn!("Could not remove partial chunk {:?}: {}", path, e);
        }
    }
}
