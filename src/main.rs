// Entry point and high-level CLI flow.
//
// - `list` prints the report catalogue.
// - `generate` loads rows, runs one report, prints a preview and writes the
//   exports plus a JSON summary.
// - `raw` dumps the loaded rows back out as CSV.
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use fellowship_reports::config::Config;
use fellowship_reports::error::{ReportError, Result};
use fellowship_reports::reports::{generate_report, ReportContext, ReportKind};
use fellowship_reports::{html, loader, output, util};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "fellowship-reports")]
#[command(about = "Pivot registration and attendance rows into summary reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available reports
    List,
    /// Generate one report from a CSV or JSON export
    Generate {
        /// Report slug (see `list`)
        #[arg(value_parser = parse_report)]
        report: ReportKind,

        /// Rows to aggregate (.csv or .json)
        #[arg(long)]
        input: PathBuf,

        /// File with one expected row key per line (regions, clusters, ...)
        #[arg(long)]
        rows: Option<PathBuf>,

        /// First congress day (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Last congress day (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Retreat day dates (YYYY-MM-DD)
        #[arg(long)]
        day1: Option<String>,
        #[arg(long)]
        day2: Option<String>,
        #[arg(long)]
        day3: Option<String>,
        #[arg(long)]
        day4: Option<String>,

        /// Count each row once instead of reading `total`
        #[arg(long)]
        count_rows: bool,

        /// Count unrecognized genders under this label instead of dropping them
        #[arg(long)]
        other_gender: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "all")]
        format: OutputFormat,

        /// Output directory (overrides REPORT_OUTPUT_DIR)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Sheet name (overrides REPORT_SHEET_NAME and the report default)
        #[arg(long)]
        sheet_name: Option<String>,

        /// Data rows shown in the console preview
        #[arg(long)]
        preview: Option<usize>,

        /// GCK report month
        #[arg(long)]
        month: Option<String>,

        /// GCK group coordinator
        #[arg(long)]
        coordinator: Option<String>,
    },
    /// Write the loaded rows back out as CSV
    Raw {
        /// Rows to read (.csv or .json)
        #[arg(long)]
        input: PathBuf,

        /// Destination CSV
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Xlsx,
    Html,
    All,
}

impl OutputFormat {
    fn includes(self, other: OutputFormat) -> bool {
        self == other || self == OutputFormat::All
    }
}

fn parse_report(value: &str) -> std::result::Result<ReportKind, String> {
    value.parse().map_err(|e: ReportError| e.to_string())
}

fn parse_date(flag: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value {
        None => Ok(None),
        Some(v) => util::parse_date_safe(Some(v))
            .map(Some)
            .ok_or_else(|| ReportError::InvalidDate(format!("--{flag} {v}"))),
    }
}

fn handle_list() {
    println!("Available reports:\n");
    for kind in ReportKind::ALL {
        println!("  {:<40} {}", kind.slug(), kind.title());
    }
    println!();
}

fn load(path: &Path) -> Result<Vec<fellowship_reports::RawRow>> {
    let (rows, load_report) = loader::load_rows(path)?;
    println!(
        "Processing dataset... ({} rows read, {} loaded)",
        util::format_int(load_report.total_rows),
        util::format_int(load_report.loaded_rows)
    );
    if load_report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            util::format_int(load_report.parse_errors)
        );
    }
    println!();
    Ok(rows)
}

#[allow(clippy::too_many_arguments)]
fn handle_generate(
    config: &Config,
    kind: ReportKind,
    input: &Path,
    ctx: ReportContext,
    format: OutputFormat,
    output_dir: Option<PathBuf>,
    sheet_name: Option<String>,
    preview: Option<usize>,
) -> Result<()> {
    let rows = load(input)?;
    let report = generate_report(kind, &ctx, &rows);

    println!("{}", kind.title());
    if let (Some(start), Some(end)) = (ctx.start_label(), ctx.end_label()) {
        println!("({} to {})", start, end);
    }
    println!(
        "{} rows, grand total {}\n",
        util::format_int(report.matrix.rows().len()),
        util::format_int(report.totals.grand_total())
    );
    output::preview_report(&report.rendered, preview.unwrap_or(config.preview_rows));

    let dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&dir)?;
    let start = ctx.start_label();
    let end = ctx.end_label();
    let file = |ext: &str| {
        dir.join(output::export_file_name(
            kind.slug(),
            start.as_deref(),
            end.as_deref(),
            ext,
        ))
    };

    let export = report.rendered.export_rows();
    if format.includes(OutputFormat::Csv) {
        let path = file("csv");
        output::write_csv(&path, &export)?;
        println!("(Full table exported to {})", path.display());
    }
    if format.includes(OutputFormat::Xlsx) {
        let path = file("xlsx");
        // An explicit sheet name wins; otherwise a report-specific name beats the env default.
        let sheet = sheet_name.unwrap_or_else(|| match kind.sheet_name() {
            "Report" => config.sheet_name.clone(),
            specific => specific.to_string(),
        });
        output::write_xlsx(&path, &sheet, &export)?;
        println!("(Full table exported to {})", path.display());
    }
    if format.includes(OutputFormat::Html) {
        let path = file("html");
        output::write_html(&path, &html::to_html(&report.rendered, kind.title()))?;
        println!("(HTML table written to {})", path.display());
    }

    let summary_path = file("json");
    output::write_json(&summary_path, &report.summary())?;
    println!("Summary Stats ({}):", summary_path.display());
    println!(
        "{{\"grand_total\": {}, \"rows\": {}}}\n",
        report.totals.grand_total(),
        report.matrix.rows().len()
    );
    info!(report = kind.slug(), "report complete");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    match cli.command {
        Commands::List => handle_list(),
        Commands::Raw { input, output } => {
            let rows = load(&input)?;
            output::write_raw_csv(&output, &rows)?;
            println!("(Raw rows exported to {})\n", output.display());
        }
        Commands::Generate {
            report,
            input,
            rows,
            start,
            end,
            day1,
            day2,
            day3,
            day4,
            count_rows,
            other_gender,
            format,
            output_dir,
            sheet_name,
            preview,
            month,
            coordinator,
        } => {
            let expected_rows = match rows {
                Some(path) => loader::load_row_keys(&path)?,
                None => Vec::new(),
            };
            let ctx = ReportContext {
                expected_rows,
                start: parse_date("start", start.as_deref())?,
                end: parse_date("end", end.as_deref())?,
                retreat_days: [
                    parse_date("day1", day1.as_deref())?,
                    parse_date("day2", day2.as_deref())?,
                    parse_date("day3", day3.as_deref())?,
                    parse_date("day4", day4.as_deref())?,
                ],
                count_rows,
                other_gender,
                group_name: Some(config.group_name.clone()),
                coordinator,
                month,
            };
            handle_generate(
                &config,
                report,
                &input,
                ctx,
                format,
                output_dir,
                sheet_name,
                preview,
            )?;
        }
    }
    Ok(())
}

fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
