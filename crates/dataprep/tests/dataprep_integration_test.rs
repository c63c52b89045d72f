use dataprep::{
    Annotation, CleanStats, clean_annotations, default_mapping, make_fullbox_csv,
    read_annotations, relabel_quality,
};
use image::{Rgb, RgbImage};
use std::path::Path;
use tempfile::tempdir;

fn write_image(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbImage::from_pixel(width, height, Rgb([200, 180, 60]))
        .save(path)
        .unwrap();
}

/// Missing images, clamping, degenerate boxes and garbage numbers
#[test]
fn test_clean_annotations_statistics() {
    let dir = tempdir().unwrap();
    let images = dir.path().join("images");
    write_image(&images.join("a.png"), 100, 50);
    write_image(&images.join("b.png"), 20, 20);
    std::fs::write(images.join("broken.png"), b"not an image").unwrap();

    let input = dir.path().join("annotations.csv");
    std::fs::write(
        &input,
        "filename,xmin,ymin,xmax,ymax,label\n\
         a.png,10,5,90.7,40,healthy\n\
         a.png,-20,-5,500,500, defective \n\
         b.png,15,15,15,18,healthy\n\
         missing.png,0,0,10,10,healthy\n\
         b.png,abc,0,10,10,healthy\n\
         broken.png,0,0,10,10,healthy\n\
         b.png,25,25,30,30,healthy\n",
    )
    .unwrap();
    let output = dir.path().join("out").join("clean.csv");

    let stats = clean_annotations(&images, &input, &output).unwrap();

    assert_eq!(
        stats,
        CleanStats {
            kept: 2,
            dropped_missing: 1,
            dropped_invalid: 4,
            total: 7,
        }
    );

    let rows = read_annotations(&output).unwrap();
    assert_eq!(
        rows,
        vec![
            Annotation {
                filename: "a.png".into(),
                xmin: 10,
                ymin: 5,
                xmax: 90,
                ymax: 40,
                label: "healthy".into(),
            },
            Annotation {
                filename: "a.png".into(),
                xmin: 0,
                ymin: 0,
                xmax: 99,
                ymax: 49,
                label: "defective".into(),
            },
        ]
    );

    let json = serde_json::to_value(stats).unwrap();
    assert_eq!(json["kept"], 2);
    assert_eq!(json["total"], 7);
}

/// Class folders are flattened with label prefixes and collision suffixes
#[test]
fn test_fullbox_copies_and_names() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("dataset");
    write_image(&root.join("healthy").join("leaf.png"), 30, 20);
    write_image(&root.join("healthy").join("more").join("leaf.png"), 1, 1);
    write_image(&root.join("blight").join("spot.jpg"), 64, 48);
    std::fs::write(root.join("blight").join("notes.txt"), b"field notes").unwrap();

    let images_out = dir.path().join("flat");
    let out_csv = dir.path().join("annotations.csv");

    let count = make_fullbox_csv(&root, &images_out, &out_csv).unwrap();

    assert_eq!(count, 3);
    let rows = read_annotations(&out_csv).unwrap();
    let summary: Vec<(&str, i64, i64, &str)> = rows
        .iter()
        .map(|r| (r.filename.as_str(), r.xmax, r.ymax, r.label.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("blight_spot.jpg", 63, 47, "blight"),
            ("healthy_leaf.png", 29, 19, "healthy"),
            // 1x1 image still gets a one-pixel box
            ("healthy_leaf_1.png", 1, 1, "healthy"),
        ]
    );

    for row in &rows {
        assert!(images_out.join(&row.filename).is_file());
    }
    assert!(!images_out.join("blight_notes.txt").exists());
}

/// Folder names map to quality classes, unknown folders to `Unknown`
#[test]
fn test_relabel_quality_distribution() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("soybeans");
    write_image(&root.join("Intact soybeans").join("i1.jpg"), 40, 30);
    write_image(&root.join("Intact soybeans").join("i2.png"), 40, 30);
    write_image(&root.join("Broken soybeans").join("b1.jpg"), 10, 10);
    write_image(&root.join("Spotted soybeans").join("s1.JPG"), 10, 10);
    write_image(&root.join("Mystery").join("m1.png"), 5, 8);
    write_image(&root.join("Mystery").join("m2.bmp"), 5, 8);

    let output = dir.path().join("quality.csv");
    let summary = relabel_quality(&root, &output, &default_mapping()).unwrap();

    assert_eq!(summary.rows, 5);
    assert_eq!(summary.distribution["Healthy"], 2);
    assert_eq!(summary.distribution["Defective"], 2);
    assert_eq!(summary.distribution["Unknown"], 1);

    let rows = read_annotations(&output).unwrap();
    let mystery = rows.iter().find(|r| r.filename == "m1.png").unwrap();
    assert_eq!((mystery.xmin, mystery.ymin, mystery.xmax, mystery.ymax), (0, 0, 4, 7));
    assert_eq!(mystery.label, "Unknown");
}
