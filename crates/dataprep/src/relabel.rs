use crate::{
    annotations::{Annotation, write_annotations},
    dataset::{class_dirs, file_name, files_with_extension},
};
use anyhow::Context;
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::path::Path;

pub const UNKNOWN_CLASS: &str = "Unknown";
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Class folder name to quality class.
pub type QualityMapping = BTreeMap<String, String>;

/// Soybean grading: intact beans are healthy, every damage class is defective.
pub fn default_mapping() -> QualityMapping {
    [
        ("Intact soybeans", "Healthy"),
        ("Broken soybeans", "Defective"),
        ("Immature soybeans", "Defective"),
        ("Skin-damaged soybeans", "Defective"),
        ("Spotted soybeans", "Defective"),
    ]
    .into_iter()
    .map(|(folder, class)| (folder.to_string(), class.to_string()))
    .collect()
}

/// Read a `{"folder": "class", ...}` JSON object.
pub fn load_mapping(path: &Path) -> anyhow::Result<QualityMapping> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mapping = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(mapping)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelabelSummary {
    pub rows: usize,
    /// Row count per quality class
    pub distribution: BTreeMap<String, usize>,
}

/// Turn a classification tree into quality-labelled full-image boxes.
pub fn relabel_quality(
    input_dir: &Path,
    output_csv: &Path,
    mapping: &QualityMapping,
) -> anyhow::Result<RelabelSummary> {
    let mut rows = Vec::new();

    for class_dir in class_dirs(input_dir)? {
        let folder = file_name(&class_dir);
        let quality = mapping
            .get(&folder)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_CLASS);
        tracing::info!(folder = %folder, quality, "Relabeling class folder");

        let files: Vec<_> = files_with_extension(&class_dir)?
            .into_iter()
            .filter(|path| has_image_extension(path))
            .collect();
        let progress = ProgressBar::new(files.len() as u64);

        for path in files {
            progress.inc(1);
            match image::image_dimensions(&path) {
                Ok((width, height)) => {
                    rows.push(Annotation::full_image(file_name(&path), width, height, quality));
                }
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Skipping unreadable image");
                }
            }
        }
        progress.finish_and_clear();
    }

    write_annotations(output_csv, &rows)?;

    let mut distribution = BTreeMap::new();
    for row in &rows {
        *distribution.entry(row.label.clone()).or_insert(0) += 1;
    }

    Ok(RelabelSummary {
        rows: rows.len(),
        distribution,
    })
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}
