use std::convert::TryFrom;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use failure;
use rust_htslib::bam;
use rust_htslib::bam::record::Aux;
use rust_htslib::bam::Read as BamRead;

use errors::ChunkError;
use pbi::{index_path_for, PbIndex, PbiRecord};
use virtual_offset::VirtualOffset;

pub struct CLI {
    pub input_bam: String,
    pub output_index: Option<String>,
}

impl CLI {
    pub fn run(&self) -> Result<(), failure::Error> {
        let index_path = self
            .output_index
            .as_ref()
            .map_or_else(|| index_path_for(&self.input_bam), PathBuf::from);
        let index = build_index(&self.input_bam)?;
        index.write_path(&index_path)?;
        info!("Indexed {} reads from {:?} in {:?}", index.len(), self.input_bam, index_path);
        Ok(())
    }
}

/// Builds the basic section of a PacBio index by reading every record
/// of `bam_path`, noting the virtual offset where each one starts.
pub fn build_index<P: AsRef<Path>>(bam_path: P) -> Result<PbIndex, failure::Error> {
    let mut input = bam::Reader::from_path(bam_path.as_ref())?;
    let mut index = PbIndex::new();
    let mut record = bam::Record::new();

    loop {
        let offset = input.tell();
        match input.read(&mut record) {
            None => break,
            Some(res) => res?,
        }
        if offset < 0 {
            bail!("Bad virtual offset {} in {:?}", offset, bam_path.as_ref());
        }
        index.push(index_record(&record, VirtualOffset::new(offset as u64))?);
    }

    Ok(index)
}

fn index_record(record: &bam::Record, file_offset: VirtualOffset) -> Result<PbiRecord, failure::Error> {
    let hole_number = match aux_int(record, b"zm") {
        Some(zm) => tag_hole_number(zm, record.qname())?,
        None => qname_hole_number(record.qname())?,
    };
    let ctxt_flag = match aux_int(record, b"cx") {
        Some(cx) => tag_context_flag(cx)?,
        None => 0,
    };

    Ok(PbiRecord {
        rg_id: read_group_id(record),
        q_start: aux_int(record, b"qs").unwrap_or(0) as i32,
        q_end: aux_int(record, b"qe").unwrap_or(record.seq_len() as i64) as i32,
        hole_number: hole_number,
        read_qual: aux_float(record, b"rq").unwrap_or(0.0),
        ctxt_flag: ctxt_flag,
        file_offset: file_offset,
    })
}

/// Parses the hole number from a PacBio read name, `movie/hole/...`.
pub fn qname_hole_number(qname: &[u8]) -> Result<i32, failure::Error> {
    let bad_name = || ChunkError::BadZmwName(String::from_utf8_lossy(qname).into_owned());

    let mut fields = qname.split(|ch| *ch == b'/');
    let _movie = fields.next().ok_or_else(bad_name)?;
    let hole = fields.next().ok_or_else(bad_name)?;
    let hole_str = std::str::from_utf8(hole).map_err(|_| bad_name())?;
    Ok(i32::from_str(hole_str).map_err(|_| bad_name())?)
}

/// Hole number from a `zm` tag, which must fit the index's signed 32-bit
/// field.
fn tag_hole_number(zm: i64, qname: &[u8]) -> Result<i32, failure::Error> {
    i32::try_from(zm).map_err(|_| {
        ChunkError::BadZmwName(format!("{} (zm:{})", String::from_utf8_lossy(qname), zm)).into()
    })
}

fn tag_context_flag(cx: i64) -> Result<u8, failure::Error> {
    match u8::try_from(cx) {
        Ok(flag) => Ok(flag),
        Err(_) => bail!("Local context flag cx:{} does not fit in 8 bits", cx),
    }
}

/// PacBio read group IDs are 8 hex digits; the index stores them as a
/// signed 32-bit integer.
fn read_group_id(record: &bam::Record) -> i32 {
    match record.aux(b"RG") {
        Ok(Aux::String(rg)) if rg.len() == 8 => u32::from_str_radix(rg, 16).map(|id| id as i32).unwrap_or(0),
        _ => 0,
    }
}

fn aux_int(record: &bam::Record, tag: &[u8]) -> Option<i64> {
    match record.aux(tag) {
        Ok(Aux::I8(x)) => Some(i64::from(x)),
        Ok(Aux::U8(x)) => Some(i64::from(x)),
        Ok(Aux::I16(x)) => Some(i64::from(x)),
        Ok(Aux::U16(x)) => Some(i64::from(x)),
        Ok(Aux::I32(x)) => Some(i64::from(x)),
        Ok(Aux::U32(x)) => Some(i64::from(x)),
        _ => None,
    }
}

fn aux_float(record: &bam::Record, tag: &[u8]) -> Option<f32> {
    match record.aux(tag) {
        Ok(Aux::Float(x)) => Some(x),
        Ok(Aux::Double(x)) => Some(x as f32),
        _ => None,
    }
}
