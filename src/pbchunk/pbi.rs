//! PacBio BAM index (`.pbi`) files.
//!
//! The index is a BGZF-compressed, little-endian file holding a fixed
//! header and then parallel per-read arrays. Only the basic section is
//! read; mapped, reference and barcode sections that may follow it are
//! skipped.

use std::cmp::min;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use failure;
use rust_htslib::bgzf;

use boundary::{locate_zmw_boundaries, ZmwBoundaries};
use errors::ChunkError;
use virtual_offset::VirtualOffset;

pub const PBI_MAGIC: &[u8; 4] = b"PBI\x01";
pub const PBI_VERSION_3_0_0: u32 = 0x0003_0000;
pub const PBI_VERSION_3_0_1: u32 = 0x0003_0001;
const PBI_VERSION_LIMIT: u32 = 0x0005_0000;
const PBI_RESERVED_LEN: usize = 18;
const READ_BATCH: usize = 1 << 16;

pub const PBI_FLAG_MAPPED: u16 = 0x0001;
pub const PBI_FLAG_REFERENCE: u16 = 0x0002;
pub const PBI_FLAG_BARCODE: u16 = 0x0004;

/// Returns the companion index path, `INPUT.bam.pbi`, for a BAM file.
pub fn index_path_for<P: AsRef<Path>>(bam_path: P) -> PathBuf {
    let mut index_name: OsString = bam_path.as_ref().as_os_str().to_os_string();
    index_name.push(".pbi");
    PathBuf::from(index_name)
}

/// One read's entry in the basic section of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct PbiRecord {
    pub rg_id: i32,
    pub q_start: i32,
    pub q_end: i32,
    pub hole_number: i32,
    pub read_qual: f32,
    pub ctxt_flag: u8,
    pub file_offset: VirtualOffset,
}

/// Basic section of a PacBio index, held as parallel arrays in file
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct PbIndex {
    version: u32,
    flags: u16,
    rg_id: Vec<i32>,
    q_start: Vec<i32>,
    q_end: Vec<i32>,
    hole_number: Vec<i32>,
    read_qual: Vec<f32>,
    ctxt_flag: Vec<u8>,
    file_offset: Vec<VirtualOffset>,
}

impl PbIndex {
    pub fn new() -> Self {
        PbIndex {
            version: PBI_VERSION_3_0_1,
            flags: 0,
            rg_id: Vec::new(),
            q_start: Vec::new(),
            q_end: Vec::new(),
            hole_number: Vec::new(),
            read_qual: Vec::new(),
            ctxt_flag: Vec::new(),
            file_offset: Vec::new(),
        }
    }

    pub fn push(&mut self, record: PbiRecord) {
        self.rg_id.push(record.rg_id);
        self.q_start.push(record.q_start);
        self.q_end.push(record.q_end);
        self.hole_number.push(record.hole_number);
        self.read_qual.push(record.read_qual);
        self.ctxt_flag.push(record.ctxt_flag);
        self.file_offset.push(record.file_offset);
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn len(&self) -> usize {
        self.hole_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hole_number.is_empty()
    }

    pub fn hole_numbers(&self) -> &[i32] {
        &self.hole_number
    }

    pub fn virtual_offsets(&self) -> &[VirtualOffset] {
        &self.file_offset
    }

    pub fn record(&self, idx: usize) -> Option<PbiRecord> {
        if idx >= self.len() {
            return None;
        }
        Some(PbiRecord {
            rg_id: self.rg_id[idx],
            q_start: self.q_start[idx],
            q_end: self.q_end[idx],
            hole_number: self.hole_number[idx],
            read_qual: self.read_qual[idx],
            ctxt_flag: self.ctxt_flag[idx],
            file_offset: self.file_offset[idx],
        })
    }

    pub fn records<'a>(&'a self) -> impl Iterator<Item = PbiRecord> + 'a {
        (0..self.len()).filter_map(move |idx| self.record(idx))
    }

    pub fn zmw_boundaries(&self) -> ZmwBoundaries {
        locate_zmw_boundaries(&self.hole_number, &self.file_offset)
    }

    /// Reads a BGZF-compressed index file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, failure::Error> {
        let reader = bgzf::Reader::from_path(path.as_ref())?;
        Self::parse(reader, path.as_ref())
    }

    /// Reads an index from an already-decompressed stream.
    pub fn read<R: Read>(input: R) -> Result<Self, failure::Error> {
        Self::parse(input, Path::new("-"))
    }

    fn parse<R: Read>(mut input: R, path: &Path) -> Result<Self, failure::Error> {
        match Self::parse_sections(&mut input, path) {
            Err(ref e) if is_eof(e) => Err(ChunkError::malformed(path, "truncated index").into()),
            res => res,
        }
    }

    fn parse_sections<R: Read>(input: &mut R, path: &Path) -> Result<Self, failure::Error> {
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic)?;
        if &magic != PBI_MAGIC {
            return Err(ChunkError::malformed(path, format!("bad magic {:?}", magic)).into());
        }

        let version = input.read_u32::<LittleEndian>()?;
        if version < PBI_VERSION_3_0_0 || version >= PBI_VERSION_LIMIT {
            return Err(ChunkError::malformed(path, format!("unsupported version {:#08x}", version)).into());
        }
        let flags = input.read_u16::<LittleEndian>()?;
        let n_reads = input.read_u32::<LittleEndian>()? as usize;
        let mut reserved = [0u8; PBI_RESERVED_LEN];
        input.read_exact(&mut reserved)?;

        // n_reads is untrusted until the arrays actually arrive
        let rg_id = read_array(input, n_reads, |r, buf| r.read_i32_into::<LittleEndian>(buf))?;
        let q_start = read_array(input, n_reads, |r, buf| r.read_i32_into::<LittleEndian>(buf))?;
        let q_end = read_array(input, n_reads, |r, buf| r.read_i32_into::<LittleEndian>(buf))?;
        let hole_number = read_array(input, n_reads, |r, buf| r.read_i32_into::<LittleEndian>(buf))?;
        let read_qual = read_array(input, n_reads, |r, buf| r.read_f32_into::<LittleEndian>(buf))?;

        // ctxtFlag arrived with 3.0.1
        let ctxt_flag = if version >= PBI_VERSION_3_0_1 {
            read_array(input, n_reads, |r, buf| r.read_exact(buf))?
        } else {
            vec![0u8; rg_id.len()]
        };

        let raw_offset = read_array(input, n_reads, |r, buf| r.read_i64_into::<LittleEndian>(buf))?;
        let mut file_offset = Vec::with_capacity(raw_offset.len());
        for (idx, raw) in raw_offset.into_iter().enumerate() {
            if raw < 0 {
                return Err(ChunkError::malformed(path, format!("negative file offset {} for read {}", raw, idx)).into());
            }
            file_offset.push(VirtualOffset::new(raw as u64));
        }

        debug!("Read {} index entries from {:?} (version {:#08x}, flags {:#06x})",
               n_reads, path, version, flags);

        Ok(PbIndex {
            version: version,
            flags: flags,
            rg_id: rg_id,
            q_start: q_start,
            q_end: q_end,
            hole_number: hole_number,
            read_qual: read_qual,
            ctxt_flag: ctxt_flag,
            file_offset: file_offset,
        })
    }

    /// Writes the header and basic section, uncompressed, as version
    /// 3.0.1 with no optional sections.
    pub fn write<W: Write>(&self, mut out: W) -> Result<(), failure::Error> {
        let n_reads = self.len();
        if n_reads > u32::max_value() as usize {
            bail!("Too many reads for a PacBio index: {}", n_reads);
        }

        out.write_all(PBI_MAGIC)?;
        out.write_u32::<LittleEndian>(PBI_VERSION_3_0_1)?;
        out.write_u16::<LittleEndian>(0)?;
        out.write_u32::<LittleEndian>(n_reads as u32)?;
        out.write_all(&[0u8; PBI_RESERVED_LEN])?;

        for x in self.rg_id.iter() {
            out.write_i32::<LittleEndian>(*x)?;
        }
        for x in self.q_start.iter() {
            out.write_i32::<LittleEndian>(*x)?;
        }
        for x in self.q_end.iter() {
            out.write_i32::<LittleEndian>(*x)?;
        }
        for x in self.hole_number.iter() {
            out.write_i32::<LittleEndian>(*x)?;
        }
        for x in self.read_qual.iter() {
            out.write_f32::<LittleEndian>(*x)?;
        }
        out.write_all(&self.ctxt_flag)?;
        for x in self.file_offset.iter() {
            out.write_i64::<LittleEndian>(x.raw() as i64)?;
        }

        out.flush()?;
        Ok(())
    }

    /// Writes a BGZF-compressed index file.
    pub fn write_path<P: AsRef<Path>>(&self, path: P) -> Result<(), failure::Error> {
        let mut writer = bgzf::Writer::from_path(path.as_ref())?;
        self.write(&mut writer)?;
        Ok(())
    }
}

/// Checks that an index can be opened, reporting `MissingIndex` when it
/// cannot.
pub fn require_index<P: AsRef<Path>, Q: AsRef<Path>>(bam_path: P, index_path: Q) -> Result<(), failure::Error> {
    match File::open(index_path.as_ref()) {
        Ok(_) => Ok(()),
        Err(e) => {
            debug!("Cannot open {:?}: {}", index_path.as_ref(), e);
            Err(ChunkError::MissingIndex {
                bam: bam_path.as_ref().to_path_buf(),
                index: index_path.as_ref().to_path_buf(),
            }.into())
        }
    }
}

/// Reads `n` values in batches, so the vector only grows as far as the
/// data really goes.
fn read_array<R, T, F>(input: &mut R, n: usize, mut read_into: F) -> io::Result<Vec<T>>
where
    R: Read,
    T: Clone + Default,
    F: FnMut(&mut R, &mut [T]) -> io::Result<()>,
{
    let mut values = Vec::with_capacity(min(n, READ_BATCH));
    let mut buf = vec![T::default(); min(n, READ_BATCH)];
    while values.len() < n {
        let batch = min(n - values.len(), READ_BATCH);
        read_into(input, &mut buf[..batch])?;
        values.extend_from_slice(&buf[..batch]);
    }
    Ok(values)
}

fn is_eof(err: &failure::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .map_or(false, |e| e.kind() == io::ErrorKind::UnexpectedEof)
}
