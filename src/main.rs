//! Life Stream CLI - Stream Game of Life video to an ingest endpoint.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use life_stream::{
    capture::{CaptureRecorder, CompressionType},
    compute::StreamScheduler,
    schema::{Destination, StreamConfig},
    sink::{FfmpegSink, FrameSink},
};

fn print_usage(program: &str) {
    eprintln!("Usage: {} [config.json] [--capture <file>]", program);
    eprintln!();
    eprintln!("Stream a Game of Life board as live video.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  config.json       Stream configuration (default: built-in settings)");
    eprintln!("  --capture <file>  Record frames to a capture file instead of streaming");
    eprintln!("  --example         Print the default configuration and exit");
    eprintln!();
    eprintln!("The ingest endpoint is read from the first line of the destination");
    eprintln!("file ('stream_url.txt' unless the configuration says otherwise).");
}

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut capture_path: Option<PathBuf> = None;
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--example" => {
                print_example_config();
                return;
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                return;
            }
            "--capture" => match rest.next() {
                Some(path) => capture_path = Some(PathBuf::from(path)),
                None => {
                    print_usage(&args[0]);
                    std::process::exit(1);
                }
            },
            path if config_path.is_none() && !path.starts_with('-') => {
                config_path = Some(PathBuf::from(path));
            }
            _ => {
                print_usage(&args[0]);
                std::process::exit(1);
            }
        }
    }

    // Load configuration
    let config: StreamConfig = match &config_path {
        Some(path) => {
            let config_str = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading config file: {}", e);
                std::process::exit(1);
            });
            serde_json::from_str(&config_str).unwrap_or_else(|e| {
                eprintln!("Error parsing config: {}", e);
                std::process::exit(1);
            })
        }
        None => StreamConfig::default(),
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let (sink, target): (Box<dyn FrameSink>, String) = match &capture_path {
        Some(path) => {
            (
                Box::new(CaptureRecorder::new(path, CompressionType::Lz4)) as Box<dyn FrameSink>,
                path.display().to_string(),
            )
        }
        None => {
            let destination =
                Destination::from_file(&config.destination_file).unwrap_or_else(|e| {
                    eprintln!("{}", e);
                    std::process::exit(1);
                });
            let target = destination.to_string();
            (
                Box::new(FfmpegSink::new(config.encoder.clone(), destination)) as Box<dyn FrameSink>,
                target,
            )
        }
    };

    println!("Life Stream");
    println!("===========");
    println!(
        "Frame: {}x{} @ {} fps",
        config.width, config.height, config.frame_rate
    );
    println!(
        "Board: {}x{} cells ({} px each)",
        config.grid_width(),
        config.grid_height(),
        config.cell_size
    );
    println!(
        "Generation: {} frames, perturbation every {} generations",
        config.generation_duration, config.perturb_interval
    );
    println!("Output: {}", target);
    println!();

    let scheduler = StreamScheduler::new(config, sink).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let mut scheduler = scheduler.with_progress(Box::new(|_| {
        print!(".");
        let _ = std::io::stdout().flush();
    }));

    let cancel = scheduler.cancel_handle();
    if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed)) {
        eprintln!("Error installing shutdown handler: {}", e);
        std::process::exit(1);
    }

    let result = scheduler.run();

    println!();
    println!("Exiting...");

    match result {
        Ok(summary) => println!("{}", summary),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_example_config() {
    let config = StreamConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
