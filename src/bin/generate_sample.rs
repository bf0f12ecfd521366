use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use holdout_splitter::data::labels::{sidecar_path, ValueLabels};
use holdout_splitter::data::loader::FileFormat;
use holdout_splitter::data::model::{CellValue, Dataset, Row};
use holdout_splitter::data::writer::write_view;

/// Write a synthetic survey dataset to try the splitter on.
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
struct Args {
    /// Number of respondents
    #[arg(long, default_value_t = 1000)]
    rows: usize,

    /// Output file; the extension picks the format
    #[arg(long, default_value = "sample_data.csv")]
    out: PathBuf,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const REGIONS: [&str; 4] = ["north", "south", "east", "west"];
const AGE_GROUPS: [&str; 4] = ["18-30", "31-45", "46-60", "61+"];

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let format = FileFormat::from_path(&args.out)?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    let rows: Vec<Row> = (0..args.rows)
        .map(|i| {
            let region = REGIONS.choose(&mut rng).copied().unwrap_or("north");
            let age = AGE_GROUPS.choose(&mut rng).copied().unwrap_or("18-30");
            let gender: i64 = rng.gen_range(1..=2);
            // a few unanswered scores
            let score = if rng.gen_bool(0.03) {
                CellValue::Null
            } else {
                CellValue::Float((rng.gen_range(0.0..10.0_f64) * 100.0).round() / 100.0)
            };
            Row::new(vec![
                CellValue::Integer(i as i64 + 1),
                CellValue::String(region.to_string()),
                CellValue::String(age.to_string()),
                CellValue::Integer(gender),
                score,
            ])
        })
        .collect();

    let dataset = Dataset::from_rows(
        ["respondent_id", "region", "age_group", "gender", "score"]
            .map(String::from)
            .to_vec(),
        rows,
    );
    let all = dataset.row_ids();
    write_view(&args.out, format, dataset.view(&all))?;

    let labels = ValueLabels {
        column_labels: BTreeMap::from([
            ("gender".to_string(), "Gender of respondent".to_string()),
            ("score".to_string(), "Satisfaction score (0-10)".to_string()),
        ]),
        value_labels: BTreeMap::from([(
            "gender".to_string(),
            BTreeMap::from([
                ("1".to_string(), "Male".to_string()),
                ("2".to_string(), "Female".to_string()),
            ]),
        )]),
    };
    labels.save(&sidecar_path(&args.out))?;

    println!("Wrote {} respondents to {}", dataset.len(), args.out.display());
    Ok(())
}
