//! # Index Round-Trip Tests
//!
//! End-to-end coverage of the engine's contract: every key the parser
//! extracts during a successful build is discoverable at its original offset,
//! rebuilds are bit-identical, the on-disk format invariants hold, and the
//! capacity policies behave as documented.
//!
//! If any test here fails after making changes, it indicates a regression in
//! the build/query/verify contract. Do NOT adjust expected values to make
//! tests pass - fix the underlying issue.

use std::sync::Arc;

use tempfile::tempdir;

use edictidx::hash::{bucket_hash, slot_checksum};
use edictidx::{Backing, Dictionary, Index, IndexParams, KeyStrategy, RegionKind};

const SLOT_SIZE: usize = 8;

fn backends() -> [RegionKind; 2] {
    [RegionKind::Mmap, RegionKind::Heap]
}

/// A plausible EDICT-style dictionary with some duplicate headwords.
fn sample_dictionary() -> Vec<u8> {
    let mut text = String::new();
    for i in 0..500 {
        text.push_str(&format!("word{:04} [reading{:04}] /gloss {}/\n", i, i, i));
    }
    text.push_str("word0007 [alt] /second sense/\n");
    text.push_str("word0007 [alt2] /third sense/\n");
    text.into_bytes()
}

fn small_params() -> IndexParams {
    let mut params = IndexParams::default();
    params.set_min_table_size(16).unwrap();
    params
}

mod round_trip {
    use super::*;

    #[test]
    fn every_built_key_is_discoverable_at_its_offset() {
        for kind in backends() {
            let dict = Dictionary::from_bytes(sample_dictionary());
            let mut index =
                Index::create_with(kind, dict, &Backing::Anon, small_params()).unwrap();

            let build = index.build(KeyStrategy::Headword).unwrap();
            let verify = index.verify(KeyStrategy::Headword).unwrap();

            assert_eq!(build.entries as u64, verify.keys);
            assert_eq!(verify.max_list, 3, "word0007 appears three times");
        }
    }

    #[test]
    fn reading_strategy_round_trips_too() {
        let dict = Dictionary::from_bytes(sample_dictionary());
        let mut index = Index::create(dict, &Backing::Anon, small_params()).unwrap();

        index.build(KeyStrategy::Reading).unwrap();
        let stats = index.verify(KeyStrategy::Reading).unwrap();

        assert_eq!(stats.keys, 502);
    }

    #[test]
    fn built_index_survives_reopen_from_disk() {
        for kind in backends() {
            let dir = tempdir().unwrap();
            let dict_path = dir.path().join("edict.txt");
            let index_path = dir.path().join("edict.hdw");
            std::fs::write(&dict_path, sample_dictionary()).unwrap();

            let dict = Dictionary::open_with(kind, &dict_path).unwrap();
            {
                let mut index = Index::create_with(
                    kind,
                    Arc::clone(&dict),
                    &Backing::file(&index_path),
                    small_params(),
                )
                .unwrap();
                index.build(KeyStrategy::Headword).unwrap();
            }

            let reopened = Index::open_with(kind, dict, &index_path).unwrap();
            reopened.verify(KeyStrategy::Headword).unwrap();

            let hits: Vec<_> = reopened.find(b"word0123").unwrap().collect();
            assert_eq!(hits.len(), 1);
            assert!(hits[0].bytes.starts_with(b"word0123 [reading0123]"));
        }
    }
}

mod idempotence {
    use super::*;

    #[test]
    fn rebuilding_produces_bit_identical_tables() {
        let dict = Dictionary::from_bytes(sample_dictionary());
        let mut index =
            Index::create(Arc::clone(&dict), &Backing::Anon, small_params()).unwrap();

        index.build(KeyStrategy::Headword).unwrap();
        let first = index.table_bytes().to_vec();

        index.build(KeyStrategy::Headword).unwrap();
        assert_eq!(index.table_bytes(), &first[..]);

        let mut other = Index::create(dict, &Backing::Anon, small_params()).unwrap();
        other.build(KeyStrategy::Headword).unwrap();
        assert_eq!(other.table_bytes(), &first[..]);
    }

    #[test]
    fn both_backends_write_identical_index_files() {
        let dir = tempdir().unwrap();
        let dict = Dictionary::from_bytes(sample_dictionary());

        let mut files = Vec::new();
        for (i, kind) in backends().into_iter().enumerate() {
            let path = dir.path().join(format!("edict{}.hdw", i));
            let mut index = Index::create_with(
                kind,
                Arc::clone(&dict),
                &Backing::file(&path),
                small_params(),
            )
            .unwrap();
            index.build(KeyStrategy::Headword).unwrap();
            files.push(std::fs::read(&path).unwrap());
        }

        assert_eq!(files[0], files[1]);
    }
}

mod format_invariants {
    use super::*;

    #[test]
    fn table_size_stays_a_power_of_two_through_growth() {
        let dict = Dictionary::from_bytes(sample_dictionary());
        let mut params = IndexParams::default();
        params.set_min_table_size(4).unwrap();
        let mut index = Index::create(dict, &Backing::Anon, params).unwrap();

        let stats = index.build(KeyStrategy::Headword).unwrap();

        assert!(stats.table_size.is_power_of_two());
        assert!(stats.table_size > 4, "500+ keys cannot fit 4 slots");
    }

    #[test]
    fn non_power_of_two_index_file_is_rejected_cleanly() {
        for kind in backends() {
            for slots in [3usize, 5, 6, 7, 12] {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bad.idx");
                std::fs::write(&path, vec![0u8; slots * SLOT_SIZE]).unwrap();

                let dict = Dictionary::from_bytes(b"a b\n".to_vec());
                let result = Index::open_with(kind, dict, &path);

                let err = result.err().expect("corrupt file must not open");
                assert!(err.to_string().contains("not a power of two"));
            }
        }
    }

    #[test]
    fn index_file_length_matches_table_size_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("edict.hdw");

        let dict = Dictionary::from_bytes(sample_dictionary());
        let mut index =
            Index::create(dict, &Backing::file(&path), small_params()).unwrap();
        let stats = index.build(KeyStrategy::Headword).unwrap();

        let file_len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(file_len, stats.table_size as u64 * SLOT_SIZE as u64);
    }
}

mod collision_handling {
    use super::*;

    /// Finds two distinct generated keys that land in the same bucket of a
    /// 16-slot table but carry different checksums.
    fn same_bucket_pair(mask: u32) -> (String, String) {
        let first = "colkey0000".to_string();
        let bucket = bucket_hash(first.as_bytes()) & mask;

        for i in 1..10_000 {
            let candidate = format!("colkey{:04}", i);
            if bucket_hash(candidate.as_bytes()) & mask == bucket
                && slot_checksum(candidate.as_bytes()) != slot_checksum(first.as_bytes())
            {
                return (first, candidate);
            }
        }
        unreachable!("no bucket collision among 10000 candidate keys");
    }

    #[test]
    fn same_bucket_keys_with_different_checksums_stay_distinct() {
        let (a, b) = same_bucket_pair(15);
        let text = format!("{} /first/\n{} /second/\n", a, b);

        let dict = Dictionary::from_bytes(text.into_bytes());
        let mut params = IndexParams::default();
        params.set_min_table_size(16).unwrap();
        params.set_max_table_size(16).unwrap();
        let mut index = Index::create(dict, &Backing::Anon, params).unwrap();
        index.build(KeyStrategy::Headword).unwrap();

        let hits_a: Vec<_> = index.find(a.as_bytes()).unwrap().collect();
        let hits_b: Vec<_> = index.find(b.as_bytes()).unwrap().collect();

        assert_eq!(hits_a.len(), 1);
        assert_eq!(hits_b.len(), 1);
        assert!(hits_a[0].bytes.ends_with(b"/first/"));
        assert!(hits_b[0].bytes.ends_with(b"/second/"));
    }
}

mod capacity_policy {
    use super::*;

    #[test]
    fn max_list_bounds_discoverable_records() {
        for limit in [1u32, 2, 3] {
            let dict = Dictionary::from_bytes(
                b"same a\nsame b\nsame c\nsame d\nsame e\n".to_vec(),
            );
            let mut params = small_params();
            params.set_max_list(limit).unwrap();
            let mut index = Index::create(dict, &Backing::Anon, params).unwrap();
            index.build(KeyStrategy::Headword).unwrap();

            let hits = index.find(b"same").unwrap().count();
            assert_eq!(hits as u32, limit);
        }
    }

    #[test]
    fn growth_past_max_table_size_is_a_typed_failure() {
        for kind in backends() {
            let mut text = String::new();
            for i in 0..200 {
                text.push_str(&format!("key{:04} gloss\n", i));
            }

            let dict = Dictionary::from_bytes(text.into_bytes());
            let mut params = IndexParams::default();
            params.set_min_table_size(4).unwrap();
            params.set_max_table_size(64).unwrap();
            let mut index = Index::create_with(kind, dict, &Backing::Anon, params).unwrap();

            let err = index.build(KeyStrategy::Headword).unwrap_err();
            assert!(err.to_string().contains("exceeds maximum table size"));
        }
    }
}

mod example_scenarios {
    use super::*;

    #[test]
    fn kanji_lookup_on_the_two_line_dictionary() {
        let text = "犬 [いぬ] /dog/\n猫 [ねこ] /cat/\n";
        let dict = Dictionary::from_bytes(text.as_bytes().to_vec());
        let mut index = Index::create(dict, &Backing::Anon, small_params()).unwrap();
        index.build(KeyStrategy::Headword).unwrap();

        let hits: Vec<_> = index.find("犬".as_bytes()).unwrap().collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].offset, 0);
        assert_eq!(hits[0].bytes, "犬 [いぬ] /dog/".as_bytes());

        let second_offset = "犬 [いぬ] /dog/\n".len() as u32;
        let hits: Vec<_> = index.find("猫".as_bytes()).unwrap().collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].offset, second_offset);

        assert!(index.find("魚".as_bytes()).is_none());
    }

    #[test]
    fn max_list_one_verifies_only_with_matching_parameter() {
        let dict = Dictionary::from_bytes(b"same a\nsame b\nsame c\n".to_vec());
        let mut params = small_params();
        params.set_max_list(1).unwrap();
        let mut index = Index::create(dict, &Backing::Anon, params).unwrap();
        index.build(KeyStrategy::Headword).unwrap();

        assert_eq!(index.find(b"same").unwrap().count(), 1);
        index.verify(KeyStrategy::Headword).unwrap();

        index.params_mut().set_max_list(3).unwrap();
        assert!(index.verify(KeyStrategy::Headword).is_err());
    }
}

mod sharing {
    use super::*;

    #[test]
    fn shared_indexes_serve_different_key_strategies() {
        let dict = Dictionary::from_bytes(
            "犬 [いぬ] /dog/\n猫 [ねこ] /cat/\n".as_bytes().to_vec(),
        );
        let mut by_headword = Index::create(dict, &Backing::Anon, small_params()).unwrap();
        by_headword.build(KeyStrategy::Headword).unwrap();

        let mut by_reading = by_headword.share(&Backing::Anon).unwrap();
        by_reading.build(KeyStrategy::Reading).unwrap();

        assert!(by_headword.find("犬".as_bytes()).is_some());
        assert!(by_headword.find("いぬ".as_bytes()).is_none());

        assert!(by_reading.find("いぬ".as_bytes()).is_some());
        assert!(by_reading.find("犬".as_bytes()).is_none());

        let kanji = by_headword.find("犬".as_bytes()).unwrap().next().unwrap();
        let kana = by_reading.find("いぬ".as_bytes()).unwrap().next().unwrap();
        assert_eq!(kanji.offset, kana.offset);
    }

    #[test]
    fn concurrent_queries_over_one_index() {
        let dict = Dictionary::from_bytes(sample_dictionary());
        let mut index = Index::create(dict, &Backing::Anon, small_params()).unwrap();
        index.build(KeyStrategy::Headword).unwrap();

        std::thread::scope(|scope| {
            for t in 0..4 {
                let index = &index;
                scope.spawn(move || {
                    for i in (t..500).step_by(4) {
                        let key = format!("word{:04}", i);
                        let hits = index.find(key.as_bytes()).unwrap().count();
                        let expected = if i == 7 { 3 } else { 1 };
                        assert_eq!(hits, expected, "key {}", key);
                    }
                });
            }
        });
    }
}
