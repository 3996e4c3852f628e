use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};

use facelens_core::annotation::infrastructure::rgb_canvas::RgbCanvas;
use facelens_core::capture::infrastructure::ffmpeg_camera::FfmpegCameraProvider;
use facelens_core::pipeline::annotator_logger::StdoutAnnotatorLogger;
use facelens_core::pipeline::known_faces_use_case::KnownFacesUseCase;
use facelens_core::pipeline::live_frame_annotator::{
    AnnotatorConfig, LiveFrameAnnotator, TickOutcome,
};
use facelens_core::pipeline::recognize_image_use_case::RecognizeImageUseCase;
use facelens_core::pipeline::request_dispatcher::ThreadRequestDispatcher;
use facelens_core::recognition::infrastructure::http_face_service::HttpFaceServiceClient;
use facelens_core::shared::client_config::ClientConfig;
use facelens_core::ui::notifications::{Notice, Severity};

/// Client for a face recognition service: still images, the known-faces
/// registry, and live webcam annotation.
#[derive(Parser)]
#[command(name = "facelens")]
struct Cli {
    /// Recognition service base URL (overrides config and FACELENS_SERVER_URL).
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recognize faces in an image file.
    Recognize {
        /// Image to upload (png, jpg, jpeg, gif, bmp).
        image: PathBuf,
    },
    /// Register a person's face from an image file.
    Add {
        /// Person name.
        #[arg(long)]
        name: String,
        /// Image containing the person's face.
        image: PathBuf,
    },
    /// List registered people.
    List,
    /// Remove a registered person.
    Delete {
        /// Person name.
        name: String,
    },
    /// Check that the service is reachable.
    Health,
    /// Annotate the live webcam feed with recognized faces.
    Webcam(WebcamArgs),
    /// Show the effective configuration, optionally saving it.
    Config {
        /// Persist the effective settings (including overrides) to the config file.
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args)]
struct WebcamArgs {
    /// Stop after this many frames (0 = until the camera stops).
    #[arg(long, default_value = "0")]
    frames: u64,

    /// Submit every Nth frame for recognition.
    #[arg(long)]
    sample_interval: Option<usize>,

    /// Camera device (e.g. /dev/video0, "0" on macOS, "video=..." on Windows).
    #[arg(long)]
    device: Option<String>,

    /// Write annotated frames as PNG files to this directory.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Save a snapshot every Nth frame.
    #[arg(long, default_value = "30")]
    snapshot_every: u64,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Recognize { image } => run_recognize(&config, &image),
        Command::Add { name, image } => run_add(&config, &name, &image),
        Command::List => run_list(&config),
        Command::Delete { name } => run_delete(&config, &name),
        Command::Health => run_health(&config),
        Command::Webcam(args) => run_webcam(config, &args),
        Command::Config { save } => run_config(&config, save),
    }
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = ClientConfig::load()?;
    if let Some(url) = &cli.server_url {
        config.apply_server_url(url);
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = timeout;
    }
    if let Command::Webcam(args) = &cli.command {
        validate_webcam(args)?;
        if let Some(k) = args.sample_interval {
            config.sample_interval = k;
        }
        if let Some(device) = &args.device {
            config.camera_device = Some(device.clone());
        }
    }
    config.validate()?;
    Ok(config)
}

fn validate_webcam(args: &WebcamArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.sample_interval == Some(0) {
        return Err("Sample interval must be at least 1".into());
    }
    if args.snapshot_dir.is_some() && args.snapshot_every == 0 {
        return Err("Snapshot interval must be at least 1".into());
    }
    Ok(())
}

fn client(config: &ClientConfig) -> Result<Arc<HttpFaceServiceClient>, Box<dyn std::error::Error>> {
    Ok(Arc::new(HttpFaceServiceClient::from_config(config)?))
}

fn run_recognize(config: &ClientConfig, image: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let use_case = RecognizeImageUseCase::new(client(config)?);
    println!("Recognizing faces in: {}", image.display());
    let summary = use_case.execute(Some(image))?;

    println!("{}", summary.message());
    for (i, face) in summary.faces.iter().enumerate() {
        let loc = &face.location;
        println!("\nFace {}:", i + 1);
        println!("  Name: {}", face.name);
        println!("  Confidence: {:.4}", face.confidence);
        println!(
            "  Location: ({}, {}, {}, {})",
            loc.left, loc.top, loc.right, loc.bottom
        );
    }
    Ok(())
}

fn run_add(config: &ClientConfig, name: &str, image: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let use_case = KnownFacesUseCase::new(client(config)?);
    let notice = use_case.add(name, Some(image))?;
    report(&notice)
}

fn run_delete(config: &ClientConfig, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let use_case = KnownFacesUseCase::new(client(config)?);
    let notice = use_case.delete(name)?;
    report(&notice)
}

fn run_list(config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let use_case = KnownFacesUseCase::new(client(config)?);
    let list = use_case.refresh()?;

    if let Some(empty) = list.empty_message() {
        println!("{empty}");
        return Ok(());
    }
    println!("Known Faces:");
    println!("{}", "-".repeat(50));
    for row in list.rows() {
        println!("  {}", row.name);
    }
    println!("{}", "-".repeat(50));
    println!("Total: {} person(s)", list.len());
    Ok(())
}

fn run_health(config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = client(config)?;
    let status = client.health()?;
    println!("{}: {status}", client.base_url());
    if status != "ok" {
        return Err(format!("Service reported status '{status}'").into());
    }
    Ok(())
}

fn run_config(config: &ClientConfig, save: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("server_url           = {}", config.server_url);
    println!("sample_interval      = {}", config.sample_interval);
    println!(
        "capture              = {}x{} @ {} fps",
        config.capture_width, config.capture_height, config.frame_rate
    );
    println!("request_timeout_secs = {}", config.request_timeout_secs);
    println!(
        "camera_device        = {}",
        config.camera_device.as_deref().unwrap_or("(default)")
    );
    if save {
        let path = config.save()?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn run_webcam(config: ClientConfig, args: &WebcamArgs) -> Result<(), Box<dyn std::error::Error>> {
    let canvas = Arc::new(Mutex::new(RgbCanvas::new()));
    let mut annotator = LiveFrameAnnotator::new(
        AnnotatorConfig::from_client_config(&config),
        Box::new(FfmpegCameraProvider::new()),
        client(&config)?,
        Box::new(ThreadRequestDispatcher::new()),
        &canvas,
    )?
    .with_logger(Box::new(StdoutAnnotatorLogger::new()));

    annotator.start()?;
    println!("Webcam started (Ctrl+C to quit)");

    let interval = config.frame_interval();
    let mut rendered = 0u64;
    let mut last_labels: Vec<String> = Vec::new();

    loop {
        let tick_start = Instant::now();
        match annotator.tick() {
            TickOutcome::Rendered { failed, .. } => {
                rendered += 1;
                if let Some(e) = failed {
                    eprintln!("Warning: {e}");
                }
            }
            TickOutcome::Warming => {
                thread::sleep(interval);
                continue;
            }
            TickOutcome::Ended(e) => return Err(e.into()),
            TickOutcome::Idle => break,
        }

        let surface = canvas.lock().map_err(|_| "canvas lock poisoned")?;
        let labels: Vec<String> = surface.labels().iter().map(|l| l.text.clone()).collect();
        if labels != last_labels {
            if labels.is_empty() {
                println!("[frame {rendered}] no faces");
            } else {
                println!("[frame {rendered}] {}", labels.join(", "));
            }
            last_labels = labels;
        }
        if let Some(dir) = &args.snapshot_dir {
            if rendered % args.snapshot_every == 0 {
                let path = dir.join(format!("frame_{rendered:06}.png"));
                surface.save(&path)?;
                log::info!("Snapshot written to {}", path.display());
            }
        }
        drop(surface);

        if args.frames > 0 && rendered >= args.frames {
            break;
        }
        thread::sleep(interval.saturating_sub(tick_start.elapsed()));
    }

    settle(&mut annotator, Duration::from_secs(config.request_timeout_secs));
    annotator.stop();
    println!("Webcam stopped after {rendered} frame(s)");
    Ok(())
}

/// Waits briefly for outstanding submissions so the summary counts them.
fn settle(annotator: &mut LiveFrameAnnotator, limit: Duration) {
    let deadline = Instant::now() + limit;
    while annotator.in_flight() > 0 && Instant::now() < deadline {
        if let Some(e) = annotator.poll_responses() {
            eprintln!("Warning: {e}");
        }
        thread::sleep(Duration::from_millis(20));
    }
}

fn report(notice: &Notice) -> Result<(), Box<dyn std::error::Error>> {
    match notice.severity {
        // `main` adds its own "Error: " prefix.
        Severity::Error => {
            let message = notice.message.as_str();
            Err(message.strip_prefix("Error: ").unwrap_or(message).into())
        }
        Severity::Success => {
            println!("✓ {}", notice.message);
            Ok(())
        }
        Severity::Info => {
            println!("{}", notice.message);
            Ok(())
        }
    }
}
