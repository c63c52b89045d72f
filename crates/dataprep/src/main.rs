use clap::{Parser, Subcommand};
use common::{Environment, LogLevel, setup_logging};
use dataprep::{clean_annotations, default_mapping, load_mapping, make_fullbox_csv, relabel_quality};
use std::path::PathBuf;

/// Dataset preparation for the detection model
#[derive(Parser)]
#[command(name = "dataprep", version)]
struct Cli {
    #[arg(long, default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drop missing or degenerate boxes and clamp the rest into the image
    Clean {
        #[arg(long)]
        images_dir: PathBuf,
        #[arg(long)]
        annotations_csv: PathBuf,
        #[arg(long, default_value = "data/raw/annotations_clean.csv")]
        out_csv: PathBuf,
    },
    /// Full-image boxes from a classification folder tree
    Fullbox {
        #[arg(long)]
        root_dir: PathBuf,
        #[arg(long, default_value = "data/raw/images")]
        images_out: PathBuf,
        #[arg(long, default_value = "data/raw/annotations.csv")]
        out_csv: PathBuf,
    },
    /// Map class folders to quality classes with full-image boxes
    Relabel {
        #[arg(long)]
        input_dir: PathBuf,
        #[arg(long, default_value = "data/raw/quality_annotations.csv")]
        output_csv: PathBuf,
        /// JSON object of folder name to quality class
        #[arg(long)]
        mapping: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level, Environment::from_env());

    match cli.command {
        Command::Clean {
            images_dir,
            annotations_csv,
            out_csv,
        } => {
            let stats = clean_annotations(&images_dir, &annotations_csv, &out_csv)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Fullbox {
            root_dir,
            images_out,
            out_csv,
        } => {
            let rows = make_fullbox_csv(&root_dir, &images_out, &out_csv)?;
            println!("wrote {rows} rows to {}", out_csv.display());
        }
        Command::Relabel {
            input_dir,
            output_csv,
            mapping,
        } => {
            let mapping = match mapping {
                Some(path) => load_mapping(&path)?,
                None => default_mapping(),
            };
            let summary = relabel_quality(&input_dir, &output_csv, &mapping)?;

            println!("Created {} annotations in {}", summary.rows, output_csv.display());
            println!("\nClass distribution:");
            for (class, count) in &summary.distribution {
                println!("  {class}: {count}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_flag_is_validated() {
        let cli = Cli::try_parse_from(["dataprep", "--log-level", "debug", "fullbox", "--root-dir", "d"])
            .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);

        let defaulted = Cli::try_parse_from(["dataprep", "fullbox", "--root-dir", "d"]).unwrap();
        assert_eq!(defaulted.log_level, LogLevel::Info);

        assert!(
            Cli::try_parse_from(["dataprep", "--log-level", "verbos", "fullbox", "--root-dir", "d"])
                .is_err()
        );
    }
}
