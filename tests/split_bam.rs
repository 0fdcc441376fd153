extern crate failure;
extern crate pbchunk;
extern crate rand;
extern crate rust_htslib;
extern crate tempfile;

mod common;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use pbchunk::boundary::select_chunk_offsets;
use pbchunk::index_build::build_index;
use pbchunk::pbi::index_path_for;
use pbchunk::split::chunk_path;
use pbchunk::{split_bam, split_bam_with, ChunkError, SplitOptions, ZmwBoundary, BGZF_EOF};

use common::*;

fn indexed_bam(dir: &Path, nzmws: usize, seed: u64) -> (PathBuf, Vec<ReadData>) {
    let bam = dir.join("movie.subreads.bam");
    let reads = write_subreads(&bam, nzmws, seed);
    build_index(&bam).unwrap().write_path(index_path_for(&bam)).unwrap();
    (bam, reads)
}

fn chunk_records(prefix: &Path, nchunks: usize) -> Vec<Vec<ReadData>> {
    (0..nchunks).map(|i| read_records(&chunk_path(prefix, i))).collect()
}

fn expect_chunk_error<T: std::fmt::Debug>(res: Result<T, failure::Error>) -> ChunkError {
    let err = res.unwrap_err();
    match err.downcast::<ChunkError>() {
        Ok(chunk_err) => chunk_err,
        Err(other) => panic!("Unexpected error {:?}", other),
    }
}

#[test]
fn split_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (bam, reads) = indexed_bam(dir.path(), 600, 17);
    let prefix = dir.path().join("out");

    let index = pbchunk::PbIndex::from_path(index_path_for(&bam)).unwrap();
    let boundaries: Vec<ZmwBoundary> = index.zmw_boundaries().collect();
    assert!(boundaries.len() >= 4, "only {} boundaries", boundaries.len());

    let nchunks = split_bam(&bam, 4, &prefix).unwrap();
    assert!(nchunks >= 1 && nchunks <= 4);
    assert_eq!(nchunks, select_chunk_offsets(&boundaries, 4).len());
    assert!(!chunk_path(&prefix, nchunks).exists());

    let chunks = chunk_records(&prefix, nchunks);
    let rejoined: Vec<ReadData> = chunks.iter().flat_map(|c| c.iter().cloned()).collect();
    assert_eq!(rejoined.len(), reads.len());
    assert_eq!(rejoined, reads);

    let mut seen_holes = HashSet::new();
    for chunk in chunks.iter() {
        assert!(!chunk.is_empty());
        let holes: HashSet<Vec<u8>> = chunk.iter().map(|r| qname_hole(&r.0)).collect();
        for hole in holes {
            assert!(seen_holes.insert(hole), "ZMW split across chunks");
        }
    }

    let source_header = header_bytes(&bam);
    for i in 0..nchunks {
        let path = chunk_path(&prefix, i);
        assert_eq!(header_bytes(&path), source_header);

        let bytes = fs::read(&path).unwrap();
        let eof_len = BGZF_EOF.len();
        assert_eq!(&bytes[bytes.len() - eof_len..], &BGZF_EOF[..]);
        assert!(&bytes[bytes.len() - 2 * eof_len..bytes.len() - eof_len] != &BGZF_EOF[..]);
    }
}

#[test]
fn single_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let (bam, reads) = indexed_bam(dir.path(), 150, 3);
    let prefix = dir.path().join("whole");

    assert_eq!(split_bam(&bam, 1, &prefix).unwrap(), 1);
    assert_eq!(read_records(&chunk_path(&prefix, 0)), reads);
    assert_eq!(fs::read(chunk_path(&prefix, 0)).unwrap(), fs::read(&bam).unwrap());
}

#[test]
fn clamp_to_boundaries() {
    let dir = tempfile::tempdir().unwrap();
    let (bam, reads) = indexed_bam(dir.path(), 300, 5);
    let prefix = dir.path().join("many");

    let index = pbchunk::PbIndex::from_path(index_path_for(&bam)).unwrap();
    let nboundaries = index.zmw_boundaries().count();

    let nchunks = split_bam(&bam, 100_000, &prefix).unwrap();
    assert_eq!(nchunks, nboundaries);

    let rejoined: Vec<ReadData> = chunk_records(&prefix, nchunks).into_iter().flat_map(|c| c.into_iter()).collect();
    assert_eq!(rejoined, reads);
}

#[test]
fn missing_index() {
    let dir = tempfile::tempdir().unwrap();
    let bam = dir.path().join("unindexed.bam");
    write_subreads(&bam, 20, 11);

    match expect_chunk_error(split_bam(&bam, 2, dir.path().join("out"))) {
        ChunkError::MissingIndex { .. } => (),
        other => panic!("Unexpected error {:?}", other),
    }

    let names: Vec<PathBuf> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(names, vec![bam]);
}

#[test]
fn existing_chunk_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let (bam, _reads) = indexed_bam(dir.path(), 400, 23);
    let prefix = dir.path().join("out");
    fs::write(chunk_path(&prefix, 1), b"earlier run").unwrap();

    match expect_chunk_error(split_bam(&bam, 3, &prefix)) {
        ChunkError::OutputExists(path) => assert_eq!(path, chunk_path(&prefix, 1)),
        other => panic!("Unexpected error {:?}", other),
    }
    assert!(!chunk_path(&prefix, 0).exists());
    assert!(!chunk_path(&prefix, 2).exists());
    assert_eq!(fs::read(chunk_path(&prefix, 1)).unwrap(), b"earlier run");
}

#[test]
fn dry_run_plans_only() {
    let dir = tempfile::tempdir().unwrap();
    let (bam, reads) = indexed_bam(dir.path(), 400, 29);
    let prefix = dir.path().join("plan");

    let outcome = split_bam_with(&SplitOptions {
        source_path: bam.clone(),
        requested_chunks: 3,
        output_prefix: prefix.clone(),
        dry_run: true,
    }).unwrap();

    assert!(outcome.nchunks() >= 1 && outcome.nchunks() <= 3);
    assert!(outcome.paths().iter().all(|p| !p.exists()));

    let total_reads: usize = outcome.chunks.iter().map(|c| c.n_records).sum();
    assert_eq!(total_reads, reads.len());
    let total_zmws: usize = outcome.chunks.iter().map(|c| c.n_zmws).sum();
    assert_eq!(total_zmws, 400);

    let first = &outcome.chunks[0];
    assert_eq!(first.first_record, 0);
    assert_eq!(first.first_hole_number, Some(hole_number(0)));
    for pair in outcome.chunks.windows(2) {
        assert_eq!(pair[0].start_offset + pair[0].byte_length, pair[1].start_offset);
        assert_eq!(pair[0].first_record + pair[0].n_records, pair[1].first_record);
    }
    let last = outcome.chunks.last().unwrap();
    let bam_len = fs::metadata(&bam).unwrap().len();
    assert_eq!(last.start_offset + last.byte_length + BGZF_EOF.len() as u64, bam_len);
    assert_eq!(last.last_hole_number, Some(hole_number(399)));
}
