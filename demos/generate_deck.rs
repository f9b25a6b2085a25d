/// Example: Generate a presentation from the rows of a workbook.
///
/// Every data row of the worksheet becomes one slide. Without `--template`
/// the slides are blank with one image and a text block; with it, the
/// template's first slide is cloned for every row.
///
/// Usage:
///   cargo run --example generate_deck -- products.xlsx -o products.pptx
///   cargo run --example generate_deck -- products.xlsx -t brand.pptx -c layout.yaml -o out.pptx
///
/// Set `RUST_LOG=rowdeck=debug` for per-slide logging.
use clap::Parser;
use rowdeck::deck::{SlideLayoutConfig, TemplateMode, run_files};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "generate_deck", version)]
struct Args {
    /// Input workbook (.xlsx)
    workbook: PathBuf,

    /// Output presentation (.pptx)
    #[arg(short, long, default_value = "output.pptx")]
    output: PathBuf,

    /// Template presentation (.pptx or .potx); implies template mode unless
    /// the configuration says otherwise
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Layout configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Worksheet name; the active sheet when omitted
    #[arg(long)]
    sheet: Option<String>,

    /// Compose rows in parallel
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rowdeck=info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SlideLayoutConfig::from_yaml_str(&std::fs::read_to_string(path)?)?,
        None => {
            let mut config = SlideLayoutConfig::default();
            if args.template.is_some() {
                config.template_mode = TemplateMode::Template;
            }
            config
        },
    };
    if args.sheet.is_some() {
        config.sheet = args.sheet.clone();
    }
    config.parallel_rows |= args.parallel;

    println!("Generating {} from {}", args.output.display(), args.workbook.display());
    println!("{}", "=".repeat(60));

    let report = run_files(&args.workbook, args.template.as_deref(), &args.output, &config)?;

    print!("{}", report);
    for slide in report.slides.iter().filter(|s| s.has_warnings()) {
        println!("  row {} (sheet row {}): {} warning(s)", slide.row_index + 1, slide.sheet_row, slide.warnings.len());
    }
    Ok(())
}
