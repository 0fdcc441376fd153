#![allow(dead_code)]

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_htslib::bam;
use rust_htslib::bam::Read;

/// Query name, sequence and quality of one read.
pub type ReadData = (Vec<u8>, Vec<u8>, Vec<u8>);

pub const MOVIE: &str = "m54006_170101_000000";

pub fn hole_number(zmw: usize) -> i32 {
    1000 + 7 * zmw as i32
}

/// Writes unaligned subreads for `nzmws` ZMWs, one to four subreads each,
/// and returns the reads in file order.
pub fn write_subreads(path: &Path, nzmws: usize, seed: u64) -> Vec<ReadData> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut header = bam::Header::new();
    header.push_record(
        bam::header::HeaderRecord::new(b"HD")
            .push_tag(b"VN", &"1.6")
            .push_tag(b"pb", &"3.0.7"),
    );
    header.push_record(
        bam::header::HeaderRecord::new(b"RG")
            .push_tag(b"ID", &"5d2b7d9c")
            .push_tag(b"PL", &"PACBIO"),
    );

    let mut writer = bam::Writer::from_path(path, &header, bam::Format::Bam).unwrap();
    let mut reads = Vec::new();

    for zmw in 0..nzmws {
        let nsubreads = rng.gen_range(1..5);
        let mut q_start = 0;
        for _ in 0..nsubreads {
            let len: usize = rng.gen_range(200..1200);
            let seq: Vec<u8> = (0..len).map(|_| b"ACGT"[rng.gen_range(0..4usize)]).collect();
            let qual: Vec<u8> = (0..len).map(|_| rng.gen_range(0..60)).collect();
            let qname = format!("{}/{}/{}_{}", MOVIE, hole_number(zmw), q_start, q_start + len).into_bytes();
            q_start += len + 50;

            let mut record = bam::Record::new();
            record.set(&qname, None, &seq, &qual);
            record.set_tid(-1);
            record.set_pos(-1);
            record.set_mtid(-1);
            record.set_mpos(-1);
            record.set_mapq(255);
            record.set_flags(4);
            writer.write(&record).unwrap();

            reads.push((qname, seq, qual));
        }
    }

    reads
}

pub fn read_records(path: &Path) -> Vec<ReadData> {
    let mut reader = bam::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|res| {
            let r = res.unwrap();
            (r.qname().to_vec(), r.seq().as_bytes(), r.qual().to_vec())
        })
        .collect()
}

pub fn header_bytes(path: &Path) -> Vec<u8> {
    let reader = bam::Reader::from_path(path).unwrap();
    reader.header().as_bytes().to_vec()
}

pub fn qname_hole(qname: &[u8]) -> Vec<u8> {
    qname.split(|ch| *ch == b'/').nth(1).unwrap().to_vec()
}
