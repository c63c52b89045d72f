use crate::annotations::{Annotation, write_annotations};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    pub kept: usize,
    pub dropped_missing: usize,
    pub dropped_invalid: usize,
    pub total: usize,
}

/// Row as found in the input, before any number is trusted.
#[derive(Debug, Deserialize)]
struct RawAnnotation {
    filename: String,
    xmin: String,
    ymin: String,
    xmax: String,
    ymax: String,
    label: String,
}

enum RowOutcome {
    Kept(Annotation),
    Missing,
    Invalid,
}

/// Drop rows whose image is missing, clamp boxes into the image and drop
/// rows left without area. Writes the surviving rows to `out_csv`.
pub fn clean_annotations(
    images_dir: &Path,
    annotations_csv: &Path,
    out_csv: &Path,
) -> anyhow::Result<CleanStats> {
    let mut reader = csv::Reader::from_path(annotations_csv)?;
    let mut stats = CleanStats::default();
    let mut kept = Vec::new();

    for record in reader.deserialize::<RawAnnotation>() {
        stats.total += 1;

        let outcome = match record {
            Ok(raw) => check_row(images_dir, raw),
            Err(e) => {
                tracing::debug!(error = %e, "Malformed annotation row");
                RowOutcome::Invalid
            }
        };

        match outcome {
            RowOutcome::Kept(row) => kept.push(row),
            RowOutcome::Missing => stats.dropped_missing += 1,
            RowOutcome::Invalid => stats.dropped_invalid += 1,
        }
    }

    stats.kept = kept.len();
    write_annotations(out_csv, &kept)?;

    tracing::info!(
        kept = stats.kept,
        dropped_missing = stats.dropped_missing,
        dropped_invalid = stats.dropped_invalid,
        "Annotations cleaned"
    );
    Ok(stats)
}

fn check_row(images_dir: &Path, raw: RawAnnotation) -> RowOutcome {
    let filename = raw.filename.trim().to_string();
    let image_path = images_dir.join(&filename);
    if filename.is_empty() || !image_path.exists() {
        return RowOutcome::Missing;
    }

    let (width, height) = match image::image_dimensions(&image_path) {
        Ok(dims) => dims,
        Err(e) => {
            tracing::debug!(error = %e, path = %image_path.display(), "Unreadable image");
            return RowOutcome::Invalid;
        }
    };

    let coords = [&raw.xmin, &raw.ymin, &raw.xmax, &raw.ymax].map(|v| parse_coordinate(v));
    let [Some(xmin), Some(ymin), Some(xmax), Some(ymax)] = coords else {
        return RowOutcome::Invalid;
    };

    let max_x = (width as i64 - 1).max(0);
    let max_y = (height as i64 - 1).max(0);
    let xmin = xmin.clamp(0, max_x);
    let xmax = xmax.clamp(0, max_x);
    let ymin = ymin.clamp(0, max_y);
    let ymax = ymax.clamp(0, max_y);

    if xmax <= xmin || ymax <= ymin {
        return RowOutcome::Invalid;
    }

    RowOutcome::Kept(Annotation {
        filename,
        xmin,
        ymin,
        xmax,
        ymax,
        label: raw.label.trim().to_string(),
    })
}

/// Accepts integers and decimals, truncating toward zero.
fn parse_coordinate(value: &str) -> Option<i64> {
    let parsed: f64 = value.trim().parse().ok()?;
    parsed.is_finite().then(|| parsed.trunc() as i64)
}
