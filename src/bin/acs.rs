use anyhow::{Context, Result};
use acs_rs::credentials::{self, EnvOrFileCredentials};
use acs_rs::models::{QueryRequest, ResultTable, SortSpec};
use acs_rs::{QueryEngine, stats, storage};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "acs",
    version,
    about = "Query Census ACS 5-year data for Michigan counties (CSV output)"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query ACS data for Michigan counties. Output is CSV to stdout or a file via --output.
    Query(QueryArgs),
    /// List available topics and their Census variables (CSV).
    Topics,
    /// Full profile for a single county: all topics, long-form CSV.
    Info(InfoArgs),
    /// Save your Census API key. Get one at https://api.census.gov/data/key_signup.html
    Login(LoginArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Topic names (e.g. population income) or 'all'
    topics: Vec<String>,
    /// Raw Census variable codes (repeatable or comma-separated)
    #[arg(short = 'v', long = "variable", value_delimiter = ',')]
    variables: Vec<String>,
    /// Single ACS vintage year
    #[arg(short, long)]
    year: Option<i32>,
    /// Comma-separated years, e.g. 2019,2020,2023 (overrides --year)
    #[arg(long, value_delimiter = ',')]
    years: Vec<i32>,
    /// Restrict to these counties (repeatable or comma-separated)
    #[arg(short = 'c', long = "county", value_delimiter = ',')]
    counties: Vec<String>,
    /// Sort by column label (descending unless --ascending)
    #[arg(short, long)]
    sort: Option<String>,
    /// Sort ascending instead of descending
    #[arg(long, default_value_t = false, requires = "sort")]
    ascending: bool,
    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --output extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Print per-column statistics to stderr.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// County name, e.g. Washtenaw or "St. Clair"
    county: String,
    /// ACS vintage year
    #[arg(short, long)]
    year: Option<i32>,
}

#[derive(Args, Debug)]
struct LoginArgs {
    /// Your Census API key
    #[arg(long)]
    api_key: String,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            // Format up to 4 decimals, then trim trailing zeros and trailing dot.
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Query(args) => cmd_query(args),
        Command::Topics => cmd_topics(),
        Command::Info(args) => cmd_info(args),
        Command::Login(args) => cmd_login(args),
    }
}

fn cmd_query(args: QueryArgs) -> Result<()> {
    let engine = QueryEngine::default();
    let years = if args.years.is_empty() {
        args.year.into_iter().collect()
    } else {
        args.years
    };
    let request = QueryRequest {
        topics: args.topics,
        raw_codes: args.variables,
        counties: args.counties,
        years,
        sort: args.sort.map(|col| {
            if args.ascending {
                SortSpec::ascending(col)
            } else {
                SortSpec::descending(col)
            }
        }),
    };

    let table = engine.run(&request, &EnvOrFileCredentials::default())?;
    if table.rows.is_empty() {
        eprintln!("No matching rows found.");
    }

    write_table(&table, args.output.as_ref(), args.format.as_ref())?;

    if args.stats {
        for s in stats::column_summary(&table) {
            let year = s.key.year.map(|y| format!(" ({y})")).unwrap_or_default();
            eprintln!(
                "{}{}  count={} missing={}  min={} max={} mean={} median={}",
                s.key.column,
                year,
                s.count,
                s.missing,
                fmt_opt(s.min),
                fmt_opt(s.max),
                fmt_opt(s.mean),
                fmt_opt(s.median)
            );
        }
    }
    Ok(())
}

fn write_table(table: &ResultTable, out: Option<&PathBuf>, format: Option<&OutFormat>) -> Result<()> {
    let Some(path) = out else {
        return match format {
            Some(OutFormat::Json) => storage::write_json(table, std::io::stdout().lock()),
            _ => storage::write_csv(table, std::io::stdout().lock()),
        };
    };
    let fmt = match format {
        Some(OutFormat::Csv) => "csv",
        Some(OutFormat::Json) => "json",
        None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
    }
    .to_ascii_lowercase();
    match fmt.as_str() {
        "json" => storage::save_json(table, path),
        _ => storage::save_csv(table, path),
    }
    .with_context(|| format!("write {}", path.display()))?;
    eprintln!("Wrote {} rows to {}", table.rows.len(), path.display());
    Ok(())
}

fn cmd_topics() -> Result<()> {
    let engine = QueryEngine::default();
    storage::write_topics_csv(engine.registry(), std::io::stdout().lock())
}

fn cmd_info(args: InfoArgs) -> Result<()> {
    let engine = QueryEngine::default();
    let request = QueryRequest {
        topics: vec![acs_rs::topics::ALL_TOPICS.into()],
        counties: vec![args.county],
        years: args.year.into_iter().collect(),
        ..Default::default()
    };
    let table = engine.run(&request, &EnvOrFileCredentials::default())?;
    storage::write_profile_csv(&table, std::io::stdout().lock())
}

fn cmd_login(args: LoginArgs) -> Result<()> {
    let path = credentials::default_config_file()
        .context("cannot determine a config directory for this platform")?;
    let path = credentials::save_api_key(path, &args.api_key)?;
    eprintln!("API key saved to {}", path.display());
    Ok(())
}
