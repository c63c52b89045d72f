use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row of a detection annotation CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub filename: String,
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
    pub label: String,
}

impl Annotation {
    /// Box covering the whole image, `0,0,w-1,h-1`.
    pub fn full_image(filename: impl Into<String>, width: u32, height: u32, label: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            xmin: 0,
            ymin: 0,
            xmax: width.saturating_sub(1) as i64,
            ymax: height.saturating_sub(1) as i64,
            label: label.into(),
        }
    }
}

/// Write rows with the standard `filename,xmin,ymin,xmax,ymax,label` header,
/// creating the parent directory.
pub fn write_annotations(path: &Path, rows: &[Annotation]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record(["filename", "xmin", "ymin", "xmax", "ymax", "label"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_annotations(path: &Path) -> anyhow::Result<Vec<Annotation>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<Annotation>, _>>()?;
    Ok(rows)
}
