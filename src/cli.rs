use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use holdout_splitter::data::filter::{FilterSet, FilterSpec};
use holdout_splitter::data::labels::ValueLabels;
use holdout_splitter::data::loader::{column_choices, load_file, FileFormat};
use holdout_splitter::data::model::{CellValue, Dataset};
use holdout_splitter::data::writer::{publish, FileSink};
use holdout_splitter::split::{
    bootstrap, draw_seeds, random_partition, targeted_partition, BootstrapBatch,
    PartitionPolicy, PartitionRequest, SplitPreview,
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "holdout-splitter",
    version,
    about = "Split a tabular dataset into train / holdout / baseline files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split a dataset, whole or restricted to a filtered segment
    Split(SplitArgs),
    /// List every column with its distinct values
    Columns(ColumnsArgs),
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Input file (.csv, .json, .parquet)
    pub input: PathBuf,

    /// Percentage of the pool used for training
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub train_percent: u8,

    /// Do not draw a baseline block
    #[arg(long)]
    pub no_baseline: bool,

    /// Only exclude the train rows from holdout, not the whole baseline
    #[arg(long)]
    pub keep_baseline_in_holdout: bool,

    /// Seed for a single split
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of independent draws (0 = single split)
    #[arg(long, default_value_t = 0)]
    pub bootstrap: usize,

    /// Master seed the bootstrap seeds are drawn from (random if absent)
    #[arg(long)]
    pub bootstrap_seed: Option<u64>,

    /// Segment filter `column=value1,value2`; repeat to narrow further
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<FilterSpec>,

    /// JSON request file; replaces the policy flags, `--filter` adds to its filters
    #[arg(long)]
    pub request: Option<PathBuf>,

    /// Output directory
    #[arg(long, default_value = "outputs")]
    pub out: PathBuf,

    /// Output format (defaults to the input's)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Empty the output directory first
    #[arg(long)]
    pub clean: bool,

    /// Label metadata (defaults to `<input>.labels.json` when present)
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Only print the expected sizes
    #[arg(long)]
    pub preview: bool,
}

#[derive(Args, Debug)]
pub struct ColumnsArgs {
    /// Input file (.csv, .json, .parquet)
    pub input: PathBuf,

    /// Label metadata (defaults to `<input>.labels.json` when present)
    #[arg(long)]
    pub labels: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Csv,
    Json,
    Parquet,
}

impl From<OutputFormat> for FileFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Csv => FileFormat::Csv,
            OutputFormat::Json => FileFormat::Json,
            OutputFormat::Parquet => FileFormat::Parquet,
        }
    }
}

/// `region=north,east` → `{ region: {north, east} }`, values typed like CSV cells.
fn parse_filter(arg: &str) -> std::result::Result<FilterSpec, String> {
    let (column, values) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected column=value[,value...], got '{arg}'"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column name in '{arg}'"));
    }
    let mut spec = FilterSpec::new();
    spec.insert(
        column.to_string(),
        values.split(',').map(|v| CellValue::infer(v.trim())).collect(),
    );
    Ok(spec)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Command::Split(args) => run_split(args),
            Command::Columns(args) => run_columns(args),
        }
    }
}

fn load_labels(explicit: Option<&PathBuf>, input: &Path) -> Result<Option<ValueLabels>> {
    match explicit {
        Some(path) => ValueLabels::load(path).map(Some),
        None => ValueLabels::load_sidecar(input),
    }
}

fn run_columns(args: ColumnsArgs) -> Result<()> {
    let dataset = load_file(&args.input)?;
    let labels = load_labels(args.labels.as_ref(), &args.input)?.unwrap_or_default();

    let choices = column_choices(&dataset);
    for column in &dataset.columns {
        let values = choices.get(column).map(Vec::as_slice).unwrap_or_default();
        println!("{} [{} values]", labels.display_column(column), values.len());
        for value in values {
            println!("  {}", labels.display_value(column, value));
        }
    }
    Ok(())
}

/// Resolve flags (and the optional request file) into a policy and filters.
fn resolve_request(args: &SplitArgs) -> Result<(PartitionPolicy, Option<FilterSet>)> {
    let (mut policy, mut filters) = match &args.request {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading request {}", path.display()))?;
            let request = PartitionRequest::from_json(&text)
                .with_context(|| format!("parsing request {}", path.display()))?;
            let filters = request.filter_set();
            (request.policy, filters)
        }
        None => {
            let mut policy = PartitionPolicy::new(f64::from(args.train_percent) / 100.0)
                .with_seeds(vec![args.seed]);
            if !args.no_baseline {
                policy = policy.with_baseline(!args.keep_baseline_in_holdout);
            }
            (policy, FilterSet::new())
        }
    };

    filters.extend(args.filters.iter().cloned());
    if args.bootstrap > 0 {
        policy.seeds = draw_seeds(args.bootstrap, args.bootstrap_seed);
    }

    let filters = (!filters.is_empty()).then_some(filters);
    Ok((policy, filters))
}

fn run_split(args: SplitArgs) -> Result<()> {
    let dataset: Dataset = load_file(&args.input)?;
    dataset.ensure_non_empty()?;
    let labels = load_labels(args.labels.as_ref(), &args.input)?;

    let (policy, filters) = resolve_request(&args)?;
    let preview = SplitPreview::compute(&dataset, filters.as_ref(), &policy)?;
    println!("{preview}");
    if args.preview {
        return Ok(());
    }

    let numbered = args.bootstrap > 0 || policy.seeds.len() > 1;
    let batch = match (policy.seeds.as_slice(), filters.as_ref()) {
        ([seed], None) => BootstrapBatch {
            results: vec![random_partition(&dataset, &policy, *seed)?],
        },
        ([seed], Some(filters)) => BootstrapBatch {
            results: vec![targeted_partition(&dataset, filters, &policy, *seed)?],
        },
        _ => bootstrap(&dataset, filters.as_ref(), &policy)?,
    };

    if batch.results.iter().any(|r| !r.has_holdout()) {
        log::warn!("Holdout is empty: the filters or train fraction withhold no rows");
    }

    let format = match args.format {
        Some(f) => f.into(),
        None => FileFormat::from_path(&args.input)?,
    };
    let mut sink = FileSink::new(&args.out, format).with_labels(labels);
    if args.clean {
        sink.clean()?;
    }
    let written = publish(&mut sink, &dataset, &batch, numbered)?;
    println!(
        "Data has been successfully split: {written} files in {}",
        args.out.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_argument_is_typed() {
        let spec = parse_filter("age=30, 31").unwrap();
        let allowed = &spec["age"];
        assert!(allowed.contains(&CellValue::Integer(30)));
        assert!(allowed.contains(&CellValue::Integer(31)));
        assert!(parse_filter("age").is_err());
        assert!(parse_filter("=1").is_err());
    }

    #[test]
    fn flags_build_the_policy() {
        let cli = Cli::parse_from([
            "holdout-splitter",
            "split",
            "data.csv",
            "--train-percent",
            "20",
            "--keep-baseline-in-holdout",
            "--filter",
            "region=north",
            "--bootstrap",
            "3",
            "--bootstrap-seed",
            "5",
        ]);
        let Command::Split(args) = cli.command else {
            panic!("expected split");
        };
        let (policy, filters) = resolve_request(&args).unwrap();
        assert_eq!(policy.train_fraction, 0.2);
        assert!(policy.with_baseline);
        assert!(!policy.remove_baseline_from_holdout);
        assert_eq!(policy.seeds, draw_seeds(3, Some(5)));
        assert_eq!(filters.map(|f| f.len()), Some(1));
    }

    #[test]
    fn no_filters_means_whole_dataset() {
        let cli = Cli::parse_from(["holdout-splitter", "split", "data.csv", "--no-baseline"]);
        let Command::Split(args) = cli.command else {
            panic!("expected split");
        };
        let (policy, filters) = resolve_request(&args).unwrap();
        assert!(!policy.with_baseline);
        assert_eq!(policy.seeds, vec![42]);
        assert!(filters.is_none());
    }
}
