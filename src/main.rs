use archdoc::render::{PlantUmlRenderer, Renderer};
use archdoc::{config, demo, generator, metadata, output, site};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shared flags for commands that export diagrams.
#[derive(clap::Args, Clone)]
struct ExportArgs {
    /// Disable the render cache — force re-rendering of all diagrams
    #[arg(long)]
    no_cache: bool,

    /// Render diagram images through the external PlantUML tool
    #[arg(long)]
    render: bool,

    /// PlantUML executable to invoke when rendering
    #[arg(long, default_value = "plantuml")]
    plantuml: String,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "archdoc")]
#[command(about = "Architecture-as-code documentation site generator")]
#[command(long_about = "\
Architecture-as-code documentation site generator

Diagrams are authored as code against the archdoc library, exported to
structured JSON and PlantUML, and assembled into a static HTML site. The
two stages communicate only through metadata records on disk, so they can
run in separate processes or CI steps.

Export output (stage 1):

  docs/
  ├── workspace.json                     # Structured workspace export
  ├── SystemContext-Shop.puml            # Diagram description per view
  ├── SystemContext-Shop.png             # Rendered image (with --render)
  └── SystemContext-Shop.metadata.json   # Metadata record per view

Site output (stage 2):

  dist/
  ├── index.html                         # Home page
  ├── sitemap.xml                        # When site.base_url is set
  ├── diagrams/                          # Listing + per-diagram pages
  └── assets/                            # Copied rendered images

Rendering requires a PlantUML installation; without --render, diagram
pages show a placeholder and embed the diagram source instead.

Run 'archdoc gen-config' to generate a documented archdoc.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory for exported artifacts and metadata records
    #[arg(long, default_value = "docs", global = true)]
    output: PathBuf,

    /// Directory for the generated HTML site
    #[arg(long, default_value = "dist", global = true)]
    site_dir: PathBuf,

    /// Configuration file
    #[arg(long, default_value = "archdoc.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export the built-in example workspace
    Demo(ExportArgs),
    /// Generate the HTML site from exported metadata
    Site,
    /// Run the full pipeline: example export → site
    Build(ExportArgs),
    /// Load and validate metadata records without writing output
    Check,
    /// Print a stock archdoc.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Demo(args) => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);
            run_export(config, &cli.output, &args)?;
        }
        Command::Site => {
            let config = config::load_config(&cli.config)?;
            let records = metadata::load_dir(&cli.output)?;
            let report = site::generate_site(&records, &config.site, &cli.output, &cli.site_dir)?;
            output::print_site_report(&report);
            println!("Site generated at {}", cli.site_dir.display());
        }
        Command::Build(args) => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);

            println!("==> Stage 1: Exporting diagrams to {}", cli.output.display());
            let site_config = config.site.clone();
            run_export(config, &cli.output, &args)?;

            println!("==> Stage 2: Generating HTML → {}", cli.site_dir.display());
            let records = metadata::load_dir(&cli.output)?;
            let report = site::generate_site(&records, &site_config, &cli.output, &cli.site_dir)?;
            output::print_site_report(&report);

            println!("==> Build complete: {}", cli.site_dir.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.output.display());
            let records = metadata::load_dir(&cli.output)?;
            output::print_check_output(&records);
            println!("==> Metadata is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Export the example workspace with the configured formats.
fn run_export(
    mut config: config::Config,
    output_dir: &std::path::Path,
    args: &ExportArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.render && !config.workspace.wants("png") {
        config.workspace.output_formats.push("png".to_string());
    }

    let mut diagram_generator = demo::generator(config.workspace)?;
    let renderer = PlantUmlRenderer {
        executable: args.plantuml.clone(),
    };
    let renderer_ref: Option<&dyn Renderer> = args.render.then_some(&renderer as &dyn Renderer);
    let options = generator::ExportOptions {
        use_cache: !args.no_cache,
        renderer: renderer_ref,
    };
    let report = diagram_generator.export_all(output_dir, &options)?;
    output::print_export_report(&report);
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
