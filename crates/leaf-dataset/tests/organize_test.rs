//! End-to-end tests for the dataset organizer against a real directory tree.

use std::fs;
use std::path::Path;

use image::{ImageBuffer, Rgb};
use tempfile::TempDir;

use leaf_dataset::{organize, OrganizeOptions, OrganizeOutcome};

fn write_images(dir: &Path, count: usize, ext: &str) {
    fs::create_dir_all(dir).unwrap();
    for i in 0..count {
        let img = ImageBuffer::from_pixel(8, 8, Rgb([i as u8, 10u8, 20u8]));
        img.save(dir.join(format!("img_{i}.{ext}"))).unwrap();
    }
}

fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

#[test]
fn organizes_mandua_tree() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("data");
    let dest = tmp.path().join("data_processed");

    // 15 qualifying images under data/Mandua/blast, and a self-referential
    // data/Mandua/Mandua folder with 20 images.
    write_images(&source.join("Mandua").join("blast"), 15, "jpg");
    write_images(&source.join("Mandua").join("Mandua"), 20, "jpg");

    let outcome = organize(&source, &dest, &OrganizeOptions::default()).unwrap();

    let stats = match outcome {
        OrganizeOutcome::Organized(stats) => stats,
        other => panic!("expected an organized run, got {other:?}"),
    };

    // Exactly one class folder, nothing from the self-referential leaf.
    let class_dirs: Vec<_> = fs::read_dir(&dest)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(class_dirs, vec!["Mandua_blast"]);
    assert_eq!(count_files(&dest.join("Mandua_blast")), 15);

    assert_eq!(stats.images_copied, 15);
    assert_eq!(stats.leaves_skipped, 1);
    assert_eq!(stats.copy_failures, 0);
}

#[test]
fn threshold_excludes_small_folders() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("data");
    let dest = tmp.path().join("out");

    // Exactly at the threshold: not included ("more than", not "at least").
    write_images(&source.join("Rice").join("blast"), 10, "jpg");
    write_images(&source.join("Rice").join("smut"), 11, "jpg");

    let outcome = organize(&source, &dest, &OrganizeOptions::default()).unwrap();
    let stats = match outcome {
        OrganizeOutcome::Organized(stats) => stats,
        other => panic!("expected an organized run, got {other:?}"),
    };

    assert!(!dest.join("Rice_blast").exists());
    assert_eq!(count_files(&dest.join("Rice_smut")), 11);
    assert_eq!(stats.images_copied, 11);
}

#[test]
fn existing_destination_is_untouched() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("data");
    let dest = tmp.path().join("out");

    write_images(&source.join("Rice").join("smut"), 12, "jpg");

    // Pre-existing destination with unrelated content.
    fs::create_dir_all(&dest).unwrap();
    fs::write(dest.join("sentinel.txt"), "keep me").unwrap();

    let outcome = organize(&source, &dest, &OrganizeOptions::default()).unwrap();
    assert_eq!(outcome, OrganizeOutcome::SkippedExisting);

    // Nothing was created or removed.
    assert_eq!(count_files(&dest), 1);
    assert_eq!(
        fs::read_to_string(dest.join("sentinel.txt")).unwrap(),
        "keep me"
    );
}

#[test]
fn mixed_extensions_and_case() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("data");
    let dest = tmp.path().join("out");

    let leaf = source.join("Tomato").join("early blight");
    write_images(&leaf, 6, "jpg");
    write_images(&source.join("Tomato").join("tmp_early"), 0, "jpg");
    // PNG with uppercase extension still counts.
    for i in 0..6 {
        let img = ImageBuffer::from_pixel(8, 8, Rgb([i as u8, 0u8, 0u8]));
        img.save(leaf.join(format!("upper_{i}.PNG"))).unwrap();
    }
    // Non-image noise does not count toward the threshold.
    fs::write(leaf.join("readme.txt"), "noise").unwrap();

    let outcome = organize(&source, &dest, &OrganizeOptions::default()).unwrap();
    let stats = match outcome {
        OrganizeOutcome::Organized(stats) => stats,
        other => panic!("expected an organized run, got {other:?}"),
    };

    // 12 images > 10 threshold; folder name is sanitized.
    assert_eq!(count_files(&dest.join("Tomato_early_blight")), 12);
    assert_eq!(stats.class_counts.get("Tomato_early_blight"), Some(&12));
}

#[test]
fn missing_source_errors() {
    let tmp = TempDir::new().unwrap();
    let result = organize(
        &tmp.path().join("nope"),
        &tmp.path().join("out"),
        &OrganizeOptions::default(),
    );
    assert!(result.is_err());
}
