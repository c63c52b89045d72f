pub mod annotations;
pub mod clean;
pub mod dataset;
pub mod fullbox;
pub mod relabel;

pub use annotations::{Annotation, read_annotations, write_annotations};
pub use clean::{CleanStats, clean_annotations};
pub use fullbox::make_fullbox_csv;
pub use relabel::{RelabelSummary, default_mapping, load_mapping, relabel_quality};
