mod common;

use std::fs;
use std::path::PathBuf;

use common::{quiet, write, FakeFaces, FakeMetadata};
use photolib_core::{organize, verify, Error, OrganizeOptions, VerifyOptions};
use tempfile::tempdir;

#[test]
fn test_everything_organized_is_verified() {
    let dir = tempdir().unwrap();
    let (src, dest) = (dir.path().join("src"), dir.path().join("dest"));
    write(&src.join("a.jpg"), b"a");
    write(&src.join("trip/a.jpg"), b"another a");
    write(&src.join("trip/clip.mp4"), b"video");
    fs::create_dir(&dest).unwrap();

    let metadata = FakeMetadata::new()
        .embedded("a.jpg", "2021:05:03 10:11:12")
        .embedded("clip.mp4", "2021:06:01 09:00:00");
    let organized = organize(
        &OrganizeOptions::new(&src, &dest).with_recurse(true),
        &metadata,
        &quiet,
    )
    .unwrap();
    assert_eq!(organized.files_transferred, 3);

    let report = verify(&VerifyOptions::new(&src, &dest), None, &quiet).unwrap();
    assert_eq!(report.source_unique, 3);
    assert_eq!(report.verified, 3);
    assert!(report.is_complete());

    // losing one placed file makes it show up as unmatched
    fs::remove_file(dest.join("2021/06/clip.mp4")).unwrap();
    let report = verify(&VerifyOptions::new(&src, &dest), None, &quiet).unwrap();
    assert_eq!(report.verified, 2);
    assert_eq!(report.unmatched_paths(), vec![src.join("trip/clip.mp4").as_path()]);
    assert!(!report.is_complete());
}

#[test]
fn test_layout_does_not_matter() {
    let dir = tempdir().unwrap();
    let (src, dest) = (dir.path().join("src"), dir.path().join("dest"));
    write(&src.join("one/x.jpg"), b"x");
    write(&src.join("two/y.png"), b"y");
    write(&dest.join("somewhere/deep/renamed.jpg"), b"y");
    write(&dest.join("x_copy.jpg"), b"x");
    write(&dest.join("unrelated.jpg"), b"z");

    let report = verify(&VerifyOptions::new(&src, &dest), None, &quiet).unwrap();
    assert_eq!(report.verified, 2);
    assert_eq!(report.dest_unique, 3);
    assert!(report.unmatched.is_empty());
}

#[test]
fn test_ignore_pattern_matches_anywhere_in_path() {
    let dir = tempdir().unwrap();
    let (src, dest) = (dir.path().join("src"), dir.path().join("dest"));
    write(&src.join("a.jpg"), b"a");
    write(&src.join("a_thumb.jpg"), b"small a");
    write(&src.join("thumbnails/b.jpg"), b"small b");
    write(&dest.join("a.jpg"), b"a");

    let options = VerifyOptions::new(&src, &dest).with_ignore(Some(".*thumb.*".to_string()));
    let report = verify(&options, None, &quiet).unwrap();

    assert_eq!(report.ignored, 2);
    assert_eq!(report.verified, 1);
    assert!(report.is_complete());
}

#[test]
fn test_unmatched_file_gets_same_name_hint() {
    let dir = tempdir().unwrap();
    let (src, dest) = (dir.path().join("src"), dir.path().join("dest"));
    write(&src.join("a.jpg"), b"edited a");
    write(&src.join("b.jpg"), b"b");
    write(&dest.join("2021/05/a.jpg"), b"original a");

    let report = verify(&VerifyOptions::new(&src, &dest), None, &quiet).unwrap();

    assert_eq!(report.unmatched.len(), 2);
    let a = &report.unmatched[0];
    assert_eq!(a.path, src.join("a.jpg"));
    assert_eq!(a.same_name_hint, Some(dest.join("2021/05/a.jpg")));
    let b = &report.unmatched[1];
    assert_eq!(b.path, src.join("b.jpg"));
    assert_eq!(b.same_name_hint, None);
}

#[test]
fn test_extension_filter() {
    let dir = tempdir().unwrap();
    let (src, dest) = (dir.path().join("src"), dir.path().join("dest"));
    write(&src.join("a.jpg"), b"a");
    write(&src.join("notes.txt"), b"notes");
    write(&dest.join("a.jpg"), b"a");

    let report = verify(&VerifyOptions::new(&src, &dest), None, &quiet).unwrap();
    assert_eq!(report.not_media, 1);
    assert!(report.is_complete());

    // with the filter off the text file must be found too
    let options = VerifyOptions::new(&src, &dest).with_extension_filter(false);
    let report = verify(&options, None, &quiet).unwrap();
    assert_eq!(report.not_media, 0);
    assert_eq!(report.unmatched_paths(), vec![src.join("notes.txt").as_path()]);
}

#[test]
fn test_hidden_source_entries_are_skipped() {
    let dir = tempdir().unwrap();
    let (src, dest) = (dir.path().join("src"), dir.path().join("dest"));
    write(&src.join(".cache/a.jpg"), b"cached");
    write(&src.join(".b.jpg"), b"hidden");
    write(&src.join("c.jpg"), b"c");
    // hidden files in the destination still count as copies
    write(&dest.join(".stash/c.jpg"), b"c");

    let report = verify(&VerifyOptions::new(&src, &dest), None, &quiet).unwrap();
    assert_eq!(report.source_unique, 1);
    assert_eq!(report.verified, 1);
}

#[test]
fn test_faces_only() {
    let dir = tempdir().unwrap();
    let (src, dest) = (dir.path().join("src"), dir.path().join("dest"));
    write(&src.join("people.jpg"), b"people");
    write(&src.join("landscape.jpg"), b"landscape");
    write(&src.join("clip.mp4"), b"clip");
    write(&src.join("broken.jpg"), b"broken");
    write(&src.join("readme.txt"), b"text");
    fs::create_dir(&dest).unwrap();

    let faces = FakeFaces::new().face("people.jpg").broken("broken.jpg");
    let options = VerifyOptions::new(&src, &dest)
        .with_faces_only(true)
        .with_extension_filter(false);
    let report = verify(&options, Some(&faces), &quiet).unwrap();

    // the extension filter is forced on for face checks
    assert_eq!(report.not_media, 1);
    assert_eq!(report.no_face, 1);
    assert_eq!(report.source_unique, 1);
    assert_eq!(report.unmatched_paths(), vec![src.join("people.jpg").as_path()]);

    let skipped: Vec<&PathBuf> = report.skipped.iter().map(|s| &s.path).collect();
    assert!(skipped.contains(&&src.join("clip.mp4")));
    assert!(skipped.contains(&&src.join("broken.jpg")));

    let called = faces.calls.borrow();
    assert_eq!(called.len(), 3);
    assert!(!called.contains(&src.join("clip.mp4")));
    assert!(!called.contains(&src.join("readme.txt")));
}

#[test]
fn test_ignored_files_never_reach_the_detector() {
    let dir = tempdir().unwrap();
    let (src, dest) = (dir.path().join("src"), dir.path().join("dest"));
    write(&src.join("face_thumb.jpg"), b"thumb");
    fs::create_dir(&dest).unwrap();

    let faces = FakeFaces::new().face("face_thumb.jpg");
    let options = VerifyOptions::new(&src, &dest)
        .with_faces_only(true)
        .with_ignore(Some("thumb".to_string()));
    let report = verify(&options, Some(&faces), &quiet).unwrap();

    assert_eq!(report.ignored, 1);
    assert!(faces.calls.borrow().is_empty());
}

#[test]
fn test_faces_only_without_detector_is_a_configuration_error() {
    let dir = tempdir().unwrap();
    let options = VerifyOptions::new(dir.path(), dir.path()).with_faces_only(true);
    let err = verify(&options, None, &quiet).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_invalid_ignore_pattern() {
    let dir = tempdir().unwrap();
    let options = VerifyOptions::new(dir.path(), dir.path()).with_ignore(Some("(".to_string()));
    let err = verify(&options, None, &quiet).unwrap_err();
    assert!(matches!(err, Error::InvalidPattern(_)));
}

#[test]
fn test_missing_root() {
    let dir = tempdir().unwrap();
    let err = verify(&VerifyOptions::new(dir.path().join("nope"), dir.path()), None, &quiet)
        .unwrap_err();
    assert!(matches!(err, Error::RootNotFound(_)));
}

#[test]
fn test_duplicate_source_content_counts_once() {
    let dir = tempdir().unwrap();
    let (src, dest) = (dir.path().join("src"), dir.path().join("dest"));
    write(&src.join("a.jpg"), b"same");
    write(&src.join("copy/a.jpg"), b"same");
    write(&src.join("b.jpg"), b"same");
    fs::create_dir(&dest).unwrap();

    let report = verify(&VerifyOptions::new(&src, &dest), None, &quiet).unwrap();
    assert_eq!(report.source_unique, 1);
    assert_eq!(report.unmatched.len(), 1);
}

#[test]
fn test_renamed_collision_is_discoverable() {
    let dir = tempdir().unwrap();
    let (src, dest) = (dir.path().join("src"), dir.path().join("dest"));
    write(&src.join("a.jpg"), b"second camera");
    write(&dest.join("2021/05/a.jpg"), b"first camera");

    let metadata = FakeMetadata::new().embedded("a.jpg", "2021:05:03 10:11:12");
    let organized = organize(&OrganizeOptions::new(&src, &dest), &metadata, &quiet).unwrap();
    assert_eq!(organized.files_renamed, 1);

    let report = verify(&VerifyOptions::new(&src, &dest), None, &quiet).unwrap();
    assert!(report.is_complete());
    assert_eq!(report.dest_unique, 2);
}

#[cfg(unix)]
#[test]
fn test_symlinked_source_files_are_verified() {
    let dir = tempdir().unwrap();
    let (src, dest) = (dir.path().join("src"), dir.path().join("dest"));
    write(&dir.path().join("real/a.jpg"), b"linked photo");
    fs::create_dir(&src).unwrap();
    fs::create_dir(&dest).unwrap();
    std::os::unix::fs::symlink(dir.path().join("real/a.jpg"), src.join("a.jpg")).unwrap();

    let metadata = FakeMetadata::new().embedded("a.jpg", "2021:05:03 10:11:12");
    let organized = organize(&OrganizeOptions::new(&src, &dest), &metadata, &quiet).unwrap();
    assert_eq!(organized.files_transferred, 1);

    let report = verify(&VerifyOptions::new(&src, &dest), None, &quiet).unwrap();
    assert_eq!(report.source_unique, 1);
    assert_eq!(report.verified, 1);
    assert!(report.is_complete());
}

#[test]
fn test_classification_does_not_depend_on_walk_order() {
    let contents: [&[u8]; 4] = [b"first", b"second", b"third", b"missing"];

    // same contents, names chosen so the two layouts sort in opposite orders
    let layouts = [
        (["a.jpg", "b.jpg", "c.jpg", "d.jpg"], ["x/1.jpg", "y/2.jpg", "z/3.jpg"]),
        (["d.jpg", "c.jpg", "b.jpg", "a.jpg"], ["z/1.jpg", "y/2.jpg", "x/3.jpg"]),
    ];

    let mut outcomes = Vec::new();
    for (source_names, dest_names) in layouts {
        let dir = tempdir().unwrap();
        let (src, dest) = (dir.path().join("src"), dir.path().join("dest"));
        for (name, bytes) in source_names.iter().zip(contents) {
            write(&src.join(name), bytes);
        }
        for (name, bytes) in dest_names.iter().zip(contents) {
            write(&dest.join(name), bytes);
        }

        let report = verify(&VerifyOptions::new(&src, &dest), None, &quiet).unwrap();
        let unmatched: Vec<_> = report.unmatched.iter().map(|u| u.digest).collect();
        outcomes.push((report.source_unique, report.dest_unique, report.verified, unmatched));
    }

    assert_eq!(outcomes[0].2, 3);
    assert_eq!(outcomes[0].3.len(), 1);
    assert_eq!(outcomes[0], outcomes[1]);
}
