use ngram_core::discover::{discover, has_marker_file, DiscoveryError, DiscoveryOptions};
use ngram_core::persist::{load_index_bundle, save_decoder, save_index_bundle, IndexPaths, MetaFile};
use ngram_core::query::candidates;
use ngram_core::{build, ngram_range, ngrams, query, GramRange, NgramError, SearchContext};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    if let Some(parent) = p.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&p, body).unwrap();
    p
}

#[test]
fn ngrams_cover_every_offset() {
    let text = "the quick brown fox";
    let len = text.chars().count();
    for n in 1..=len {
        let grams = ngrams(text, n);
        assert_eq!(grams.len(), len - n + 1);
        for (i, g) in grams.iter().enumerate() {
            assert_eq!(g.chars().count(), n);
            assert_eq!(*g, &text[i..i + n]);
        }
    }
    assert!(ngrams(text, len + 1).is_empty());
}

#[test]
fn ngram_range_length_matches_sum() {
    let text = "abcdef";
    let grams = ngram_range(text, 2, 8).unwrap();
    let expected: usize = (2..=8).map(|n| 6usize.saturating_sub(n - 1)).sum();
    assert_eq!(grams.len(), expected);
    assert_eq!(ngram_range(text, 4, 3), Err(NgramError::InvalidRange { min: 4, max: 3 }));
}

#[test]
fn built_index_invariants_hold() {
    let dir = tempdir().unwrap();
    let paths = vec![
        write(dir.path(), "a.txt", "fn main() { println!(\"hi\"); }"),
        dir.path().join("gone.txt"),
        write(dir.path(), "b.md", "# Title\n\nSome words here"),
    ];
    let built = build(&paths, GramRange::default());
    assert_eq!(built.decoder.len(), 3);
    for (_, set) in built.index.iter() {
        assert!(!set.is_empty());
        for id in set {
            assert!(built.decoder.contains(*id));
        }
    }
}

#[test]
fn hello_world_scenario() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "A.txt", "hello world");
    let b = write(dir.path(), "B.txt", "goodbye world");
    let built = build(&[&a, &b], GramRange::new(4, 5).unwrap());

    let mut world = query("world", &built.decoder, &built.index, 4);
    world.sort();
    assert_eq!(world, vec![a.clone(), b.clone()]);
    assert_eq!(query("hello", &built.decoder, &built.index, 4), vec![a]);
}

#[test]
fn unknown_grams_give_no_results() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "A.txt", "hello world");
    let built = build(&[&a], GramRange::new(4, 5).unwrap());
    let ctx = SearchContext::new(built.decoder, built.index, 4);
    let outcome = ctx.search("zzzzzz");
    assert!(outcome.candidates.is_empty());
    assert!(outcome.matches.is_empty());
}

#[test]
fn gram_len_outside_range_never_matches() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "A.txt", "hello world");
    let built = build(&[&a], GramRange::new(4, 10).unwrap());
    // Trigram lookups against a 4..10 index cannot hit a key.
    assert!(query("hello", &built.decoder, &built.index, 3).is_empty());
    let ctx = SearchContext::for_range(built.decoder, built.index, GramRange::new(4, 10).unwrap(), None);
    assert_eq!(ctx.gram_len(), 4);
    assert_eq!(ctx.search("hello").matches, vec![a]);
}

#[test]
fn intersection_is_exact_before_verification() {
    let dir = tempdir().unwrap();
    let docs = [
        write(dir.path(), "0.txt", "abcd xyz"),
        write(dir.path(), "1.txt", "bcde abcd"),
        write(dir.path(), "2.txt", "bcde only"),
        write(dir.path(), "3.txt", "nothing"),
    ];
    let built = build(&docs, GramRange::new(4, 4).unwrap());
    let found = candidates("abcde", &built.index, 4);
    assert_eq!(found.matched_grams, 2);
    assert_eq!(found.ids, BTreeSet::from([1]));

    // "abcd" and "bcde" both occur in doc 1, yet "abcde" does not.
    let ctx = SearchContext::new(built.decoder, built.index, 4);
    let outcome = ctx.search("abcde");
    assert_eq!(outcome.candidates, vec![1]);
    assert!(outcome.matches.is_empty());
}

#[test]
fn verification_uses_current_content() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", "needle in a haystack");
    let b = write(dir.path(), "b.txt", "another needle here");
    let built = build(&[&a, &b], GramRange::new(4, 6).unwrap());
    fs::write(&b, "rewritten without it").unwrap();

    let ctx = SearchContext::new(built.decoder, built.index, 4);
    let outcome = ctx.search("needle");
    assert_eq!(outcome.candidates, vec![0, 1]);
    assert_eq!(outcome.matches, vec![a]);
}

#[test]
fn vanished_candidate_is_excluded_not_fatal() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", "shared phrase");
    let b = write(dir.path(), "b.txt", "shared phrase");
    let built = build(&[&a, &b], GramRange::new(4, 4).unwrap());
    fs::remove_file(&a).unwrap();

    let ctx = SearchContext::new(built.decoder, built.index, 4);
    let outcome = ctx.search("shared");
    assert_eq!(outcome.matches, vec![b]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].path, a);
}

#[test]
fn unreadable_document_never_appears_in_results() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", "common text");
    let missing = dir.path().join("missing.txt");
    let built = build(&[&missing, &a], GramRange::new(4, 4).unwrap());
    assert_eq!(built.decoder.get(0), Some(missing.as_path()));
    assert_eq!(built.report.skipped.len(), 1);

    // Creating the file afterwards must not make it searchable.
    fs::write(&missing, "common text").unwrap();
    assert_eq!(query("common", &built.decoder, &built.index, 4), vec![a]);
}

#[test]
fn lenient_decoding_drops_bad_bytes() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("bin.txt");
    fs::write(&p, b"abc\xffdef").unwrap();
    let built = build(&[&p], GramRange::new(6, 6).unwrap());
    assert!(built.report.skipped.is_empty());
    assert!(built.index.postings("abcdef").is_some());
    assert_eq!(query("abcdef", &built.decoder, &built.index, 6), vec![p]);
}

#[test]
fn persisted_bundle_round_trips() {
    let src = tempdir().unwrap();
    let out = tempdir().unwrap();
    let files = vec![
        write(src.path(), "one.txt", "round trip me"),
        src.path().join("missing.txt"),
        write(src.path(), "two.txt", "and me too"),
    ];
    let range = GramRange::new(4, 6).unwrap();
    let built = build(&files, range);
    let meta = MetaFile::new(src.path(), &built.decoder, &built.index, range);
    let paths = IndexPaths::for_source(out.path(), src.path());
    save_index_bundle(&paths, &built.decoder, &built.index, &meta).unwrap();

    let (decoder, index, loaded_meta) = load_index_bundle(&paths).unwrap();
    assert_eq!(decoder, built.decoder);
    assert_eq!(index, built.index);
    assert_eq!(loaded_meta, meta);
    assert_eq!(loaded_meta.range().unwrap(), range);
}

#[test]
fn failed_rebuild_leaves_no_loadable_bundle() {
    let src = tempdir().unwrap();
    let out = tempdir().unwrap();
    let a = write(src.path(), "a.txt", "first generation");
    let range = GramRange::new(4, 5).unwrap();
    let paths = IndexPaths::for_source(out.path(), src.path());

    let first = build(&[&a], range);
    let meta = MetaFile::new(src.path(), &first.decoder, &first.index, range);
    save_index_bundle(&paths, &first.decoder, &first.index, &meta).unwrap();

    // A directory in the way of the index temp file makes the second save fail
    // after the new decoder is already in place.
    let b = write(src.path(), "b.txt", "second generation");
    let second = build(&[&b, &a], range);
    let meta = MetaFile::new(src.path(), &second.decoder, &second.index, range);
    fs::create_dir(paths.index().with_extension("tmp")).unwrap();
    assert!(save_index_bundle(&paths, &second.decoder, &second.index, &meta).is_err());

    assert!(!paths.meta().exists());
    assert!(load_index_bundle(&paths).is_err());
}

#[test]
fn mismatched_blobs_are_rejected_on_load() {
    let src = tempdir().unwrap();
    let out = tempdir().unwrap();
    let a = write(src.path(), "a.txt", "first generation");
    let b = write(src.path(), "b.txt", "second generation");
    let range = GramRange::new(4, 5).unwrap();
    let paths = IndexPaths::for_source(out.path(), src.path());

    let first = build(&[&a], range);
    let meta = MetaFile::new(src.path(), &first.decoder, &first.index, range);
    save_index_bundle(&paths, &first.decoder, &first.index, &meta).unwrap();

    let second = build(&[&b, &a], range);
    save_decoder(&paths, &second.decoder).unwrap();
    let err = load_index_bundle(&paths).unwrap_err();
    assert!(err.to_string().contains("inconsistent"));
}

#[test]
fn loading_missing_bundle_fails() {
    let out = tempdir().unwrap();
    let paths = IndexPaths::for_source(out.path(), "/nowhere");
    assert!(load_index_bundle(&paths).is_err());
}

#[test]
fn discovery_filters_and_prunes() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let keep = write(root, "docs/readme.md", "keep");
    let upper = write(root, "NOTES.TXT", "keep too");
    write(root, "src/main.rs", "wrong extension");
    write(root, "node_modules/pkg/index.json", "{}");
    write(root, "foo.egg-info/PKG-INFO.txt", "ignored");
    write(root, "myenv/pyvenv.cfg", "home = /usr");
    write(root, "myenv/site.txt", "pruned by marker");
    write(root, "big.txt", &"x".repeat(64));

    let opts = DiscoveryOptions {
        max_file_size: 32,
        prune: Some(has_marker_file("pyvenv.cfg")),
        ..DiscoveryOptions::default()
    };
    let mut expected = vec![keep, upper];
    expected.sort();
    assert_eq!(discover(root, &opts).unwrap(), expected);
}

#[test]
fn discovery_allows_all_with_empty_extensions() {
    let dir = tempdir().unwrap();
    let rs = write(dir.path(), "main.rs", "fn main() {}");
    let opts = DiscoveryOptions { extensions: Default::default(), ..DiscoveryOptions::default() };
    assert_eq!(discover(dir.path(), &opts).unwrap(), vec![rs]);
}

#[cfg(unix)]
#[test]
fn discovery_skips_symlinks() {
    let dir = tempdir().unwrap();
    let real = write(dir.path(), "real.txt", "content");
    std::os::unix::fs::symlink(&real, dir.path().join("link.txt")).unwrap();
    assert_eq!(discover(dir.path(), &DiscoveryOptions::default()).unwrap(), vec![real]);
}

#[test]
fn discovery_missing_root_is_fatal() {
    let dir = tempdir().unwrap();
    let err = discover(&dir.path().join("nope"), &DiscoveryOptions::default()).unwrap_err();
    assert!(matches!(err, DiscoveryError::RootNotFound(_)));
}
