//! linetrace - CLI entry point

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use linetrace::{
    exit_codes, BatchProgress, Cli, Commands, Config, ConfigError, Inkscape, OutputMode, Pipeline,
    PipelineConfig, Potrace, ProcessArgs, Workspace,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Process(args) => match run_process(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                exit_codes::GENERAL_ERROR
            }
        },
        Commands::Info => run_info(),
    };

    std::process::exit(code);
}

// ============ Process Command ============

fn run_process(args: &ProcessArgs) -> anyhow::Result<i32> {
    // Resolve configuration: file (explicit path or default locations)
    // merged with CLI flags, then validated once up front.
    let file_config = match &args.config {
        Some(path) => match Config::load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                return Ok(exit_codes::CONFIG_ERROR);
            }
        },
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: failed to load config file: {}", e);
            Config::default()
        }),
    };
    let config = file_config.merge_with_cli(&args.overrides());
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let workspace = Workspace::new(&args.root);
    if !workspace.root.exists() {
        eprintln!("Error: workspace root does not exist: {}", workspace.root.display());
        return Ok(exit_codes::INPUT_NOT_FOUND);
    }
    workspace.scaffold()?;
    let moved = workspace.intake()?;
    if moved > 0 {
        info!(moved, "moved dropped images into input/");
    }

    if args.dry_run {
        print_execution_plan(&workspace, &config)?;
        return Ok(exit_codes::SUCCESS);
    }

    // Both collaborators must exist before any file is touched.
    let tracer = match Potrace::discover() {
        Ok(t) => t,
        Err(e) => return Ok(report_missing_tool(e)),
    };
    let exporter = match Inkscape::discover() {
        Ok(e) => e,
        Err(e) => return Ok(report_missing_tool(e)),
    };

    let mut progress = BatchProgress::new(OutputMode::from_flags(args.verbose, args.quiet));
    let pipeline = Pipeline::new(config, &tracer, &exporter);
    let summary = pipeline.run(&workspace, &mut progress)?;
    progress.print_summary(&summary);

    if summary.failures.is_empty() {
        Ok(exit_codes::SUCCESS)
    } else {
        Ok(exit_codes::GENERAL_ERROR)
    }
}

fn report_missing_tool(error: ConfigError) -> i32 {
    eprintln!("Error: {}", error);
    eprintln!("Please ensure the tool is installed and on your PATH.");
    exit_codes::CONFIG_ERROR
}

fn print_execution_plan(workspace: &Workspace, config: &PipelineConfig) -> std::io::Result<()> {
    let sources = workspace.discover()?;

    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Workspace: {}", workspace.root.display());
    println!("Files to process: {}", sources.len());
    println!();
    println!("Pipeline Configuration:");
    println!("  Mode:             {:?}", config.mode);
    println!(
        "  Levels:           {}%,{}%",
        config.levels.low, config.levels.high
    );
    println!("  Invert:           {}", if config.invert { "on" } else { "off" });
    println!("  Threshold:        {}%", config.threshold_percent);
    println!("  Posterize colors: {}", config.posterize_colors);
    println!("  Turd size:        {}", config.turd_size);
    println!("  Opt tolerance:    {}", config.opt_tolerance);
    println!("  Export width:     {} px", config.export_width);
    println!("  Overwrite:        {}", if config.overwrite { "YES" } else { "NO" });
    println!();
    println!("Files:");
    for (i, source) in sources.iter().enumerate() {
        println!("  {}. {}", i + 1, source.display());
    }
    Ok(())
}

// ============ Info Command ============

fn run_info() -> i32 {
    println!("linetrace v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);

    println!();
    println!("External Tools:");
    linetrace::trace::report_tool("potrace", "Potrace", &["--version"]);
    linetrace::trace::report_tool("inkscape", "Inkscape", &["--version"]);

    println!();
    println!("Config File Locations:");
    println!("  Local: ./linetrace.toml");
    if let Some(config_dir) = dirs::config_dir() {
        println!(
            "  User:  {}",
            config_dir.join("linetrace/config.toml").display()
        );
    }

    exit_codes::SUCCESS
}
