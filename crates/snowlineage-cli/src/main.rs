use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use anyhow::{Context, Result};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use snowlineage_core::{
    BatchResult, BatchSummary, Config, Direction, LineageReport, LineageResult, LineageSummary,
    ObjectType, WarehouseConfig,
};
use snowlineage_catalog::{CatalogBrowser, CurrentDatabaseProvider, SnowflakeWarehouse};
use snowlineage_engine::{analyze_multiple_with, analyze_single, BatchProgress};
use snowlineage_export::{
    batch_csv, batch_xlsx, edges_csv, lineage_file_name, parse_object_list, parse_objects_csv,
    parse_objects_xlsx,
    template_csv, template_xlsx,
};

/// SnowLineage - Snowflake object lineage explorer
#[derive(Parser)]
#[command(name = "snowlineage")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: snowlineage.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show upstream and downstream lineage for one object
    Single {
        /// Object name (SCHEMA.OBJECT or DATABASE.SCHEMA.OBJECT)
        object: String,

        /// Maximum lineage distance (1-5, default from config)
        #[arg(short, long)]
        distance: Option<u32>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write upstream/downstream CSV files into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },

    /// Analyze lineage for several objects at once
    Batch {
        /// Object names (SCHEMA.OBJECT or DATABASE.SCHEMA.OBJECT)
        objects: Vec<String>,

        /// Text file with one object name per line
        #[arg(long)]
        list: Option<PathBuf>,

        /// CSV or Excel file with DATABASE_NAME, SCHEMA_NAME and OBJECT_NAME columns
        #[arg(long)]
        file: Option<PathBuf>,

        /// Maximum lineage distance (1-5, default from config)
        #[arg(short, long)]
        distance: Option<u32>,

        /// Output file for the JSON report
        #[arg(short, long, default_value = "lineage-report.json")]
        output: PathBuf,

        /// Also write the consolidated records as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Also write the consolidated records as an Excel workbook
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },

    /// Write an upload template (.xlsx or .csv, by extension)
    Template {
        /// Template file to create
        #[arg(short, long, default_value = "lineage_template.xlsx")]
        output: PathBuf,
    },

    /// Browse databases, schemas, tables and views
    List {
        /// Database whose schemas to list (all databases when omitted)
        database: Option<String>,

        /// Schema whose tables and views to list
        schema: Option<String>,

        /// Only list tables or only views
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Check that the configured Snowflake account is reachable
    TestConnection,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Table,
    View,
}

impl From<KindArg> for ObjectType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Table => ObjectType::Table,
            KindArg::View => ObjectType::View,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("snowlineage.toml").exists() {
        Config::from_file(Path::new("snowlineage.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    if !config.analysis.is_valid() {
        eprintln!(
            "{} analysis.max_distance = {} is outside 1-5 and will be rejected",
            "⚠ Warning:".yellow(),
            config.analysis.max_distance
        );
    }

    match cli.command {
        Commands::Single { object, distance, format, export_dir } => {
            let distance = distance.unwrap_or(config.analysis.max_distance);
            single_command(&config, &object, distance, format, export_dir.as_deref(), cli.verbose).await
        }
        Commands::Batch { objects, list, file, distance, output, csv, xlsx } => {
            let distance = distance.unwrap_or(config.analysis.max_distance);
            let objects = collect_objects(objects, list.as_deref(), file.as_deref())?;
            let exports = BatchExports { output, csv, xlsx };
            batch_command(&config, &objects, distance, &exports, cli.verbose).await
        }
        Commands::Template { output } => template_command(&output),
        Commands::List { database, schema, kind } => {
            let warehouse = connect(&config)?;
            let kind = kind.map(ObjectType::from);
            let entries = list_entries(&warehouse, database.as_deref(), schema.as_deref(), kind).await?;
            for entry in entries {
                println!("{}", entry);
            }
            Ok(())
        }
        Commands::TestConnection => test_connection_command(&config).await,
    }
}

/// Log to stderr; `RUST_LOG` overrides the verbosity flag
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Connect to Snowflake using config settings with environment fallbacks
fn connect(config: &Config) -> Result<SnowflakeWarehouse> {
    let warehouse_config = config.warehouse.clone().unwrap_or_default();

    if !warehouse_config.warehouse_type.eq_ignore_ascii_case("snowflake") {
        return Err(anyhow::anyhow!(
            "Unsupported warehouse type '{}'. Supported: snowflake",
            warehouse_config.warehouse_type
        ));
    }

    let account = warehouse_config
        .setting_or_env("account", "SNOWFLAKE_ACCOUNT")
        .ok_or_else(|| anyhow::anyhow!("Snowflake requires 'account' in warehouse settings or SNOWFLAKE_ACCOUNT"))?;
    let username = warehouse_config
        .setting_or_env("username", "SNOWFLAKE_USER")
        .ok_or_else(|| anyhow::anyhow!("Snowflake requires 'username' in warehouse settings or SNOWFLAKE_USER"))?;

    let mut builder = if let Some(password) = warehouse_config.setting_or_env("password", "SNOWFLAKE_PASSWORD") {
        SnowflakeWarehouse::with_password(account, username, password)
    } else if let Some(key_path) = warehouse_config.setting_or_env("private_key_path", "SNOWFLAKE_PRIVATE_KEY_PATH") {
        let pem = std::fs::read_to_string(&key_path)
            .with_context(|| format!("Failed to read private key from {}", key_path))?;
        SnowflakeWarehouse::with_key_pair(account, username, pem)
    } else {
        return Err(anyhow::anyhow!(
            "Snowflake requires a password (SNOWFLAKE_PASSWORD) or a private key (SNOWFLAKE_PRIVATE_KEY_PATH)"
        ));
    };

    builder = apply_session_settings(builder, &warehouse_config);

    tracing::info!(account = builder.account(), "Connecting to Snowflake");
    builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to connect to warehouse: {}", e))
}

fn apply_session_settings(
    mut builder: snowlineage_catalog::SnowflakeWarehouseBuilder,
    warehouse_config: &WarehouseConfig,
) -> snowlineage_catalog::SnowflakeWarehouseBuilder {
    if let Some(warehouse) = warehouse_config.settings.get("warehouse") {
        builder = builder.with_warehouse(warehouse);
    }
    if let Some(role) = warehouse_config.settings.get("role") {
        builder = builder.with_role(role);
    }
    if let Some(database) = warehouse_config.settings.get("database") {
        builder = builder.with_database(database);
    }
    builder
}

/// Single command - lineage of one object in both directions
async fn single_command(
    config: &Config,
    object: &str,
    distance: u32,
    format: OutputFormat,
    export_dir: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let warehouse = connect(config)?;

    if verbose {
        eprintln!("{} {} (distance {})...", "Analyzing".cyan(), object, distance);
    }

    let result = match analyze_single(object, distance, &warehouse, &warehouse, &warehouse).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("{} [{}] {}", "✗".red(), e.code(), e);
            std::process::exit(1);
        }
    };

    if let Some(dir) = export_dir {
        export_directions(&result, dir, verbose)?;
    }

    match format {
        OutputFormat::Table => print_single_summary(&result, distance),
        OutputFormat::Json => {
            let report = LineageReport::from_single(result, distance);
            println!("{}", report.to_json()?);
        }
    }

    Ok(())
}

/// Write one CSV per direction that has rows
fn export_directions(result: &LineageResult, dir: &Path, verbose: bool) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    for direction in Direction::ALL {
        let edges = result.edges(direction);
        if edges.is_empty() {
            continue;
        }

        let path = dir.join(lineage_file_name(direction, &result.object));
        std::fs::write(&path, edges_csv(edges)?)?;

        if verbose {
            eprintln!("{} {}", "Saved:".green(), path.display());
        }
    }

    Ok(())
}

/// Object names for a batch; an uploaded file wins over a list file over arguments
fn collect_objects(objects: Vec<String>, list: Option<&Path>, file: Option<&Path>) -> Result<Vec<String>> {
    if let Some(file) = file {
        return read_upload(file)
            .with_context(|| format!("Failed to read objects from {}", file.display()));
    }

    if let Some(list) = list {
        let text = std::fs::read_to_string(list)
            .with_context(|| format!("Failed to read {}", list.display()))?;
        return Ok(parse_object_list(&text));
    }

    if objects.is_empty() {
        return Err(anyhow::anyhow!(
            "No objects given. Pass object names, --list FILE or --file CSV"
        ));
    }

    Ok(objects.iter().map(|o| o.trim().to_string()).filter(|o| !o.is_empty()).collect())
}

/// Parse an uploaded object file, Excel for `.xlsx`/`.xls`, CSV otherwise
fn read_upload(file: &Path) -> Result<Vec<String>> {
    let is_excel = file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xls"))
        .unwrap_or(false);

    if is_excel {
        let bytes = std::fs::read(file)
            .with_context(|| format!("Failed to open {}", file.display()))?;
        Ok(parse_objects_xlsx(&bytes)?)
    } else {
        let reader = std::fs::File::open(file)
            .with_context(|| format!("Failed to open {}", file.display()))?;
        Ok(parse_objects_csv(reader)?)
    }
}

/// Lines printed by the list command
///
/// No database lists databases, a database lists its schemas and a schema
/// lists its tables and views as `NAME<TAB>TYPE`.
async fn list_entries(
    browser: &dyn CatalogBrowser,
    database: Option<&str>,
    schema: Option<&str>,
    kind: Option<ObjectType>,
) -> Result<Vec<String>> {
    let database = database.map(|db| db.trim().to_uppercase());
    let schema = schema.map(|s| s.trim().to_uppercase());

    let entries = match (database, schema) {
        (None, _) => browser.list_databases().await?,
        (Some(database), None) => browser.list_schemas(&database).await?,
        (Some(database), Some(schema)) => browser
            .list_objects(&database, &schema, kind)
            .await?
            .into_iter()
            .map(|object| format!("{}\t{}", object.name, object.object_type))
            .collect(),
    };

    Ok(entries)
}

struct BatchExports {
    output: PathBuf,
    csv: Option<PathBuf>,
    xlsx: Option<PathBuf>,
}

/// Batch command - consolidated lineage for many objects
async fn batch_command(
    config: &Config,
    objects: &[String],
    distance: u32,
    exports: &BatchExports,
    verbose: bool,
) -> Result<()> {
    let warehouse = connect(config)?;

    if verbose {
        eprintln!("{} {} objects (distance {})...", "Analyzing".cyan(), objects.len(), distance);
    }

    let batch = analyze_multiple_with(
        objects,
        distance,
        &warehouse,
        &warehouse,
        &warehouse,
        |progress: BatchProgress<'_>| {
            if verbose {
                eprintln!("  [{}/{}] {}", progress.index + 1, progress.total, progress.object);
            }
            ControlFlow::Continue(())
        },
    )
    .await?;

    if let Some(path) = &exports.csv {
        std::fs::write(path, batch_csv(&batch)?)?;
        if verbose {
            eprintln!("{} {}", "CSV saved to:".green(), path.display());
        }
    }
    if let Some(path) = &exports.xlsx {
        std::fs::write(path, batch_xlsx(&batch)?)?;
        if verbose {
            eprintln!("{} {}", "Excel workbook saved to:".green(), path.display());
        }
    }

    let all_failed = batch.success_count() == 0;
    print_batch_summary(&batch, objects.len());

    let report = LineageReport::from_batch(batch, objects.len(), distance);
    report.save_to_file(&exports.output)?;

    if verbose {
        eprintln!("{} {}", "Report saved to:".green(), exports.output.display());
    }

    if all_failed {
        std::process::exit(1);
    }

    Ok(())
}

/// Template command - write a sample upload file
fn template_command(output: &Path) -> Result<()> {
    let is_csv = output
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let bytes = if is_csv { template_csv()? } else { template_xlsx()? };
    std::fs::write(output, bytes)?;

    println!("{} {}", "Template written to:".green(), output.display());
    Ok(())
}

/// Test-connection command
async fn test_connection_command(config: &Config) -> Result<()> {
    eprintln!("{}", "Testing warehouse connection...".cyan());

    let warehouse = connect(config)?;
    warehouse
        .test_connection()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to warehouse: {}", e))?;

    println!("{} {}", "✓ Connected to".green(), warehouse.account());

    match warehouse.current_database().await {
        Ok(Some(database)) => println!("  Current database: {}", database),
        Ok(None) => println!(
            "  {}",
            "No current database: use DATABASE.SCHEMA.OBJECT names".yellow()
        ),
        Err(e) => println!("  {} {}", "⚠ Could not read current database:".yellow(), e),
    }

    Ok(())
}

/// Print single-object lineage to terminal
fn print_single_summary(result: &LineageResult, distance: u32) {
    let summary = LineageSummary::from_result(result);

    println!("\n{}", "=".repeat(60).bright_blue());
    println!(
        "{}",
        format!("Lineage: {} ({})", result.object, result.object_type).bold().bright_blue()
    );
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Max distance: {}", distance);
    println!();

    println!("{}", "Summary:".bold());
    println!(
        "  Upstream objects:   {} (max distance {})",
        summary.upstream_objects, summary.max_upstream_distance
    );
    println!(
        "  Downstream objects: {} (max distance {})",
        summary.downstream_objects, summary.max_downstream_distance
    );
    println!();

    for direction in Direction::ALL {
        let edges = result.edges(direction);
        let title = match direction {
            Direction::Upstream => "Upstream Lineage:",
            Direction::Downstream => "Downstream Lineage:",
        };
        println!("{}", title.bold());

        if edges.is_empty() {
            println!("  {}", format!("No {} lineage found", direction.as_str().to_lowercase()).yellow());
        }
        for edge in edges {
            println!(
                "  [{}] {} {} {} {} {}",
                edge.distance,
                edge.source_domain.dimmed(),
                edge.source_fqn(),
                "→".cyan(),
                edge.target_domain.dimmed(),
                edge.target_fqn()
            );
        }
        println!();
    }

    println!("{}", "=".repeat(60).bright_blue());
}

/// Print batch results to terminal
fn print_batch_summary(batch: &BatchResult, requested: usize) {
    let summary = BatchSummary::from_batch(batch, requested);

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Multi-Object Lineage Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("{}", "Summary:".bold());
    println!("  Objects requested: {}", summary.requested);
    println!("  Successful:        {}", format!("{}", summary.successful).green());
    if summary.failed > 0 {
        println!("  Failed:            {}", format!("{}", summary.failed).red().bold());
    } else {
        println!("  Failed:            {}", format!("{}", summary.failed).green());
    }
    println!("  Total records:     {}", summary.total_records);
    println!("  Upstream records:  {}", summary.upstream_records);
    println!("  Downstream records: {}", summary.downstream_records);
    println!("  Unique sources:    {}", summary.unique_sources);
    println!("  Unique targets:    {}", summary.unique_targets);
    println!();

    if summary.per_object.is_empty() {
        println!("{}", "No lineage data found for the analyzed objects".yellow());
    } else {
        println!("{}", "Per-Object Summary:".bold());
        println!("  {:<48} {:>8} {:>10} {:>6}", "QUERIED_OBJECT", "UPSTREAM", "DOWNSTREAM", "TOTAL");
        for row in &summary.per_object {
            println!(
                "  {:<48} {:>8} {:>10} {:>6}",
                row.queried_object, row.upstream, row.downstream, row.total
            );
        }
    }

    if !batch.failed.is_empty() {
        println!();
        println!("{}", "Failed Objects:".bold());
        for failure in &batch.failed {
            println!("  {} {} [{}] {}", "✗".red(), failure.object, failure.error.code(), failure.error);
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}
