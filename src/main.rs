//! snapcode - export highlighted code to HTML, RTF and PNG
//!
//! With no arguments, reads one export request from stdin and writes one
//! response to stdout.

use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use snapcode::clipboard::SystemClipboard;
use snapcode::config::Config;
use snapcode::export::Exporter;
use snapcode::model::{FontSettings, Theme};
use snapcode::protocol::{Request, RequestType};
use snapcode::render::CommandRasterizer;
use snapcode::segment::{ModelBuilder, DEFAULT_SLICE_BUDGET};
use snapcode::source::Snapshot;
use snapcode::{logging, transport, ExportError, Result};

/// Grace period on top of the renderer timeout when driving a child exporter
const INVOKE_GRACE: Duration = Duration::from_secs(5);

fn main() {
    logging::init();
    let args: Vec<String> = env::args().collect();

    // Handle --help and --version
    if args.len() > 1 {
        match args[1].as_str() {
            "--help" | "-h" => {
                print_usage();
                return;
            }
            "--version" | "-V" => {
                print_version();
                return;
            }
            _ => {}
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let code = match args.get(1).map(String::as_str) {
        None => runtime.block_on(serve_stdin()),
        Some("--export") => match runtime.block_on(export_file(&args[2..])) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Some(other) => {
            eprintln!("Error: unknown argument {other:?}; see --help");
            1
        }
    };
    process::exit(code);
}

/// Answer one request from stdin
async fn serve_stdin() -> i32 {
    let config = Config::load();
    let rasterizer = CommandRasterizer::from_config(&config.renderer);
    let mut clipboard = SystemClipboard;
    let mut exporter = Exporter::new(&config, &rasterizer, &mut clipboard);

    let response = transport::serve(tokio::io::stdin(), &mut exporter).await;
    match serde_json::to_string(&response) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    }
    transport::exit_code(&response)
}

/// Export an unannotated file through a child exporter process
async fn export_file(args: &[String]) -> Result<()> {
    let [kind, file, rest @ ..] = args else {
        return Err(ExportError::MalformedInput(
            "usage: snapcode --export <image|html|rtf> <file> [dir]".to_string(),
        ));
    };
    let kind: RequestType = kind.parse()?;

    let snapshot = Snapshot::from_file(Path::new(file))?;
    let model = ModelBuilder::from_snapshot(&snapshot, Theme::default(), FontSettings::default())
        .build_cooperative(DEFAULT_SLICE_BUDGET)
        .await;

    let mut request = Request::new(kind, model);
    request.output_dir = rest.first().map(PathBuf::from);

    let config = Config::load();
    let exe = env::current_exe()?;
    let data = transport::invoke(&exe, &[], &request, config.renderer.timeout() + INVOKE_GRACE).await?;

    println!("{}", data.filepath.display());
    if let Some(err) = data.clipboard_error {
        eprintln!("clipboard: {}", err);
    }
    Ok(())
}

fn print_usage() {
    println!("snapcode {} - export highlighted code to HTML, RTF and PNG", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: snapcode [OPTIONS]");
    println!("       snapcode --export <image|html|rtf> <FILE> [DIR]");
    println!();
    println!("Without options, reads one JSON export request from stdin and");
    println!("prints one JSON response. Exit status is 0 on success, 1 otherwise.");
    println!();
    println!("Options:");
    println!("  -h, --help     Show this help message");
    println!("  -V, --version  Show version information");
    println!("  --export       Export FILE with default colors via a child exporter");
    println!();
    println!("Environment:");
    println!("  SNAPCODE_CONFIG  Config file (default ~/.snapcode.toml)");
    println!("  SNAPCODE_LOG     Log filter, e.g. debug (logs go to stderr)");
}

fn print_version() {
    println!("snapcode {}", env!("CARGO_PKG_VERSION"));
}
