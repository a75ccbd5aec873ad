mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::time::Duration;

use photostage::run;
use ps_av::{BinwalkDetector, FileDetector, StreamProber, ToolRegistry};
use ps_core::config::Config;
use ps_detect::{consensus, SignatureCollector};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "photostage=trace,ps_detect=debug,ps_av=debug,ps_rules=debug".to_string()
        } else {
            "photostage=info,ps_detect=info,ps_av=info,ps_rules=info".to_string()
        }
    });

    // Logs go to stderr; stdout stays clean for --json output.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { scan_root, dry_run } => {
            let rt = runtime()?;
            rt.block_on(run_scan(scan_root, cli.config.as_deref(), dry_run))
        }
        Commands::Detect { file, json } => {
            let rt = runtime()?;
            rt.block_on(detect_file(&file, cli.config.as_deref(), json))
        }
        Commands::Probe { file, json } => {
            let rt = runtime()?;
            rt.block_on(probe_media(&file, cli.config.as_deref(), json))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("photostage {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Subprocess calls are awaited one at a time; a single-threaded runtime
/// is all the pipeline needs.
fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

async fn run_scan(scan_root: PathBuf, config_path: Option<&Path>, dry_run: bool) -> Result<()> {
    if !scan_root.exists() {
        anyhow::bail!("Scan root does not exist: {:?}", scan_root);
    }

    let config = Config::load_or_default(config_path);
    for warning in config.validate() {
        tracing::warn!("Config: {}", warning);
    }

    let stats = run::execute(
        &config,
        run::RunOptions {
            scan_root,
            dry_run,
        },
    )
    .await?;

    if stats.total_files_scanned == 0 {
        println!("No files found to examine.");
    }
    Ok(())
}

async fn detect_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = Config::load_or_default(config_path);
    let tools = ToolRegistry::discover(&config.tools);
    let timeout = Duration::from_secs(config.timeouts.detect_secs);

    let mut collector = SignatureCollector::builtin();
    if let Some(detector) = FileDetector::from_registry(&tools, timeout) {
        collector.push(Box::new(detector));
    }
    if let Some(detector) = BinwalkDetector::from_registry(&tools, timeout) {
        collector.push(Box::new(detector));
    }

    let votes = collector.collect(file).await;
    let resolved = consensus::resolve(&votes);

    if json {
        let consensus_json = match &resolved {
            Ok(c) => serde_json::json!({
                "format": c.format_name(),
                "kind": c.kind,
                "extension": c.extension(),
                "mime": c.mime(),
            }),
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        let out = serde_json::json!({
            "file": file,
            "votes": votes,
            "consensus": consensus_json,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("\nDetector votes: {}", votes.len());
    for vote in &votes {
        if let Some(ref error) = vote.error {
            println!("  [{}] unavailable: {}", vote.detector, error);
        } else if vote.is_usable() {
            println!(
                "  [{}] {} {}",
                vote.detector,
                vote.mime.as_deref().unwrap_or("-"),
                vote.extension.as_deref().unwrap_or("-")
            );
        } else {
            println!("  [{}] no match", vote.detector);
        }
    }

    match resolved {
        Ok(c) => {
            println!("\nConsensus: {}", c.format_name());
            println!("Kind: {}", c.kind);
            if let Some(ext) = c.extension() {
                println!("Extension: {}", ext);
            }
            if let Some(mime) = c.mime() {
                println!("MIME: {}", mime);
            }
        }
        Err(e) => println!("\nNo consensus: {}", e),
    }

    Ok(())
}

async fn probe_media(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = Config::load_or_default(config_path);
    let tools = ToolRegistry::discover(&config.tools);
    let prober =
        StreamProber::from_registry(&tools, Duration::from_secs(config.timeouts.probe_secs))?;
    let info = prober.probe(file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!(
        "Container: {}",
        info.container.as_deref().unwrap_or("unknown")
    );
    if let Some(ref codec) = info.video_codec {
        println!("Video: {}", codec);
    }
    if let Some(ref codec) = info.audio_codec {
        print!("Audio: {}", codec);
        if let Some(channels) = info.audio_channels {
            print!(" {}ch", channels);
        }
        if let Some(ref layout) = info.audio_layout {
            print!(" ({})", layout);
        }
        println!();
    }
    if let Some(duration) = info.duration_secs {
        let secs = duration as u64;
        let mins = secs / 60;
        let hours = mins / 60;
        println!("Duration: {:02}:{:02}:{:02}", hours, mins % 60, secs % 60);
    }
    println!("Streams: {}", info.stream_count);

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = Config::load_or_default(config_path);
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let contents = std::fs::read_to_string(p)?;
            let config = Config::from_json(&contents)?;
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("✓ Configuration is valid");
            } else {
                for warning in &warnings {
                    println!("✗ {}", warning);
                }
            }
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!(
        "  Timeouts: detect {}s, probe {}s, convert {}s",
        config.timeouts.detect_secs, config.timeouts.probe_secs, config.timeouts.convert_secs
    );
    println!("  Staging prefix: {}", config.staging.dir_prefix);
    println!("  Archive originals: {}", config.staging.archive_originals);
    match &config.rules.rules_file {
        Some(rules) => println!("  Rules file: {}", rules.display()),
        None => println!("  Rules: built-in table"),
    }
    println!("  Import enabled: {}", config.import.enabled);

    Ok(())
}
