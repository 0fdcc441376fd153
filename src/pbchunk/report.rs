use std::io::Write;
use std::path::{Path, PathBuf};

use csv;
use failure;
use serde::Serialize;

use boundary::ZmwBoundary;
use pbi::PbIndex;

/// Where one chunk came from and what it holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkSummary {
    pub chunk: usize,
    pub path: PathBuf,
    pub start_offset: u64,
    pub byte_length: u64,
    pub first_record: usize,
    pub n_records: usize,
    pub n_zmws: usize,
    pub first_hole_number: Option<i32>,
    pub last_hole_number: Option<i32>,
}

impl ChunkSummary {
    /// `hole_numbers` are those of the reads inside the chunk, in file
    /// order.
    pub fn new(
        chunk: usize,
        path: PathBuf,
        start_offset: u64,
        byte_length: u64,
        first_record: usize,
        hole_numbers: &[i32],
    ) -> Self {
        ChunkSummary {
            chunk: chunk,
            path: path,
            start_offset: start_offset,
            byte_length: byte_length,
            first_record: first_record,
            n_records: hole_numbers.len(),
            n_zmws: count_zmws(hole_numbers),
            first_hole_number: hole_numbers.first().cloned(),
            last_hole_number: hole_numbers.last().cloned(),
        }
    }
}

/// Counts runs of identical hole numbers.
pub fn count_zmws(hole_numbers: &[i32]) -> usize {
    match hole_numbers.first() {
        None => 0,
        Some(_) => 1 + hole_numbers.windows(2).filter(|w| w[0] != w[1]).count(),
    }
}

pub fn write_chunk_report<P: AsRef<Path>>(path: P, summaries: &[ChunkSummary]) -> Result<(), failure::Error> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_path(path.as_ref())?;
    for summary in summaries.iter() {
        wtr.serialize(summary)?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct IndexDumpRow {
    record: usize,
    hole_number: i32,
    rg_id: String,
    q_start: i32,
    q_end: i32,
    read_qual: f32,
    ctxt_flag: u8,
    block_offset: u64,
    within_block: u16,
}

/// Writes one tab-separated line per index entry.
pub fn write_index_dump<W: Write>(out: W, index: &PbIndex) -> Result<(), failure::Error> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
    for (idx, rec) in index.records().enumerate() {
        wtr.serialize(IndexDumpRow {
            record: idx,
            hole_number: rec.hole_number,
            rg_id: format!("{:08x}", rec.rg_id as u32),
            q_start: rec.q_start,
            q_end: rec.q_end,
            read_qual: rec.read_qual,
            ctxt_flag: rec.ctxt_flag,
            block_offset: rec.file_offset.block_offset(),
            within_block: rec.file_offset.within_block(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes one tab-separated line per ZMW boundary.
pub fn write_boundary_dump<W: Write, I: IntoIterator<Item = ZmwBoundary>>(out: W, boundaries: I) -> Result<(), failure::Error> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
    for boundary in boundaries {
        wtr.serialize(boundary)?;
    }
    wtr.flush()?;
    Ok(())
}

pub struct CLI {
    pub input_index: String,
    pub boundaries: bool,
}

impl CLI {
    pub fn run(&self) -> Result<(), failure::Error> {
        let index = PbIndex::from_path(&self.input_index)?;
        let stdout = std::io::stdout();
        if self.boundaries {
            write_boundary_dump(stdout.lock(), index.zmw_boundaries())
        } else {
            write_index_dump(stdout.lock(), &index)
        }
    }
}
