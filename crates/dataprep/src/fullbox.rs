use crate::{
    annotations::{Annotation, write_annotations},
    dataset::{class_dirs, file_name, files_with_extension},
};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

/// Flatten a classification tree (`root/<class>/**/*.*`) into `images_out`
/// and write one full-image box per copied file.
///
/// Files are copied as `<label>_<name>`. Returns the number of rows written.
pub fn make_fullbox_csv(root_dir: &Path, images_out: &Path, out_csv: &Path) -> anyhow::Result<usize> {
    std::fs::create_dir_all(images_out)?;

    let mut rows = Vec::new();
    for class_dir in class_dirs(root_dir)? {
        let label = file_name(&class_dir);
        let files = files_with_extension(&class_dir)?;
        let progress = ProgressBar::new(files.len() as u64);
        progress.set_message(label.clone());

        for source in files {
            progress.inc(1);

            let (width, height) = match image::image_dimensions(&source) {
                Ok(dims) => dims,
                Err(e) => {
                    tracing::warn!(error = %e, path = %source.display(), "Skipping unreadable image");
                    continue;
                }
            };

            let destination = unique_destination(images_out, &label, &source);
            if let Err(e) = std::fs::copy(&source, &destination) {
                tracing::warn!(error = %e, path = %source.display(), "Copy failed");
                continue;
            }

            rows.push(Annotation {
                filename: file_name(&destination),
                xmin: 0,
                ymin: 0,
                xmax: (width as i64 - 1).max(1),
                ymax: (height as i64 - 1).max(1),
                label: label.clone(),
            });
        }
        progress.finish_and_clear();
    }

    write_annotations(out_csv, &rows)?;
    Ok(rows.len())
}

/// `<label>_<name>`, or `<label>_<stem>_<i><.ext>` with the first free `i >= 1`.
fn unique_destination(dir: &Path, label: &str, source: &Path) -> PathBuf {
    let candidate = dir.join(format!("{}_{}", label, file_name(source)));
    if !candidate.exists() {
        return candidate;
    }

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|i| dir.join(format!("{}_{}_{}{}", label, stem, i, ext)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
