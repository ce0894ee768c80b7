use anyhow::{Context, Result};
use autoviz::csv_reader;
use autoviz::page::{self, PageRequest, DEFAULT_PAGE_SIZE};
use autoviz::{graph, summary, Dataset, Engine, EngineConfig, OutputFormat, RenderOptions};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "autoviz")]
#[command(about = "Suggest charts for tabular data without any configuration", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log classification and rule decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print visualization descriptors for a page of the data as JSON
    Recommend(InputArgs),
    /// Print the role assigned to each column
    Roles(InputArgs),
    /// Print row count, columns, observed types, roles and sample rows
    Summary(InputArgs),
    /// Draw every recommended chart into a directory
    Render {
        #[command(flatten)]
        input: InputArgs,
        /// Directory receiving one image per chart
        #[arg(long)]
        out_dir: PathBuf,
        /// Write SVG instead of PNG
        #[arg(long)]
        svg: bool,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 600)]
        height: u32,
    },
}

#[derive(clap::Args, Debug)]
struct InputArgs {
    /// Input file; reads stdin when omitted or "-"
    input: Option<PathBuf>,

    /// Input format (defaults to the file extension, else csv)
    #[arg(long, value_enum)]
    format: Option<InputFormat>,

    /// 1-based page of rows to classify
    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Sort rows by this column before paging
    #[arg(long)]
    sort_by: Option<String>,

    #[arg(long)]
    sort_desc: bool,

    /// JSON file overriding engine thresholds
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum InputFormat {
    Csv,
    Json,
}

impl InputArgs {
    fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            page_size: self.page_size,
            sort_by: self.sort_by.clone(),
            sort_desc: self.sort_desc,
        }
    }

    fn engine(&self) -> Result<Engine> {
        let config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        Ok(Engine::new(config))
    }

    fn input_path(&self) -> Option<&Path> {
        self.input.as_deref().filter(|p| p.as_os_str() != "-")
    }

    fn input_format(&self) -> InputFormat {
        self.format.unwrap_or_else(|| match self.input_path().and_then(|p| p.extension()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Csv,
        })
    }

    fn load(&self) -> Result<Dataset> {
        let text = match self.input_path() {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            None => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read input from stdin")?;
                buf
            }
        };

        let mut dataset = match self.input_format() {
            InputFormat::Json => Dataset::from_json_str(&text).context("Failed to parse JSON input")?,
            InputFormat::Csv => csv_reader::read_csv_str(&text)
                .context("Failed to read CSV input")?
                .into_dataset(),
        };

        let dropped = dataset.drop_empty_rows();
        if dropped > 0 {
            info!(dropped, "removed rows with no values");
        }
        if let Some(name) = self.input_path().and_then(|p| p.file_name()) {
            dataset = dataset.with_source(name.to_string_lossy());
        }
        Ok(dataset)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).context("Failed to write JSON to stdout")?;
    writeln!(handle).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "autoviz=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Recommend(input) => {
            let dataset = input.load()?;
            let batch = page::paginate(&dataset, &input.page_request())?;
            let rec = input.engine()?.recommend(&batch.data)?;
            if rec.is_empty() {
                eprintln!("No suitable visualization for this data");
            }
            print_json(&rec.visualizations)?;
        }
        Command::Roles(input) => {
            let dataset = input.load()?;
            let batch = page::paginate(&dataset, &input.page_request())?;
            let roles = input.engine()?.classify(&batch.data)?;
            print_json(&roles)?;
        }
        Command::Summary(input) => {
            let dataset = input.load()?;
            let roles = input.engine()?.classify(&dataset.rows)?;
            print_json(&summary::summarize(&dataset, roles))?;
        }
        Command::Render { input, out_dir, svg, width, height } => {
            let dataset = input.load()?;
            let batch = page::paginate(&dataset, &input.page_request())?;
            let rec = input.engine()?.recommend(&batch.data)?;
            if rec.is_empty() {
                eprintln!("No suitable visualization for this data");
                return Ok(());
            }

            let options = RenderOptions {
                width,
                height,
                format: if svg { OutputFormat::Svg } else { OutputFormat::Png },
            };
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;

            for (idx, desc) in rec.visualizations.iter().enumerate() {
                let bytes = graph::render_descriptor(desc, &options)
                    .with_context(|| format!("Failed to render chart '{}'", desc.caption))?;
                let path = out_dir.join(graph::output_file_name(idx, desc, &options.format));
                fs::write(&path, bytes)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
