use anyhow::{Context, Result, anyhow, bail};
use arboard::Clipboard;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use oversolve_core::{
    AnswerResult, CaptureProvider, Config, DisplayCapture, FileCapture, OverSolve,
    ScreenCapturer, SelectionRect, SessionOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use termimad::MadSkin;
use termimad::crossterm::style::Color;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Override the model defined in .env
    #[arg(short, long)]
    model: Option<String>,

    /// Select which monitor to capture (defaults to the primary one)
    #[arg(long)]
    monitor: Option<usize>,

    /// List available monitors and exit
    #[arg(long)]
    list_monitors: bool,

    /// Scale from selection coordinates to capture pixels
    #[arg(long)]
    scale: Option<f32>,

    /// Solve this region without opening the overlay, as X,Y,WIDTH,HEIGHT
    #[arg(long, value_parser = parse_region)]
    region: Option<SelectionRect>,

    /// Use a saved screenshot instead of capturing the screen
    #[arg(long, requires = "region")]
    image: Option<PathBuf>,

    /// Copy the answer to the clipboard (with --region)
    #[arg(short, long, default_value_t = false)]
    copy: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    let args = Args::parse();
    let mut config = Config::load().context("Failed to load configuration")?;
    init_logging(config.dev_mode);

    if !config.has_api_key() {
        log::warn!("GEMINI_API_KEY is not set; solving will fail until it is provided");
    }

    if let Some(m) = args.model {
        config.model_name = m;
    }
    if let Some(scale) = args.scale {
        config = Config::builder()
            .with_api_key(config.gemini_api_key)
            .with_model(config.model_name)
            .with_display_scale(scale)
            .with_dev_mode(config.dev_mode)
            .build()
            .context("Invalid --scale")?;
    }

    // Handle --list-monitors
    if args.list_monitors {
        let capturer = ScreenCapturer::new().context("Failed to initialize screen capturer")?;
        println!("Available monitors:");
        for info in capturer.list_screen() {
            println!("{}", info);
        }
        return Ok(());
    }

    let provider: Arc<dyn CaptureProvider> = match (&args.image, args.monitor) {
        (Some(path), _) => Arc::new(FileCapture::new(path)),
        (None, Some(index)) => Arc::new(DisplayCapture::monitor(index)),
        (None, None) => Arc::new(DisplayCapture::primary()),
    };

    let app = OverSolve::with_config(config).with_provider(provider);

    let Some(region) = args.region else {
        log::info!("Starting overlay with model {}", app.config().model_name);
        app.run_interactive().context("Overlay exited with an error")?;
        return Ok(());
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")?,
    );
    spinner.set_message(format!("Analyzing with {}...", app.config().model_name));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = app.solve_region(region).await;

    spinner.finish_and_clear();
    let outcome = outcome.context("Failed to run solving session")?;

    match outcome {
        SessionOutcome::Answered(answer) => {
            print_answer(&answer);
            if args.copy {
                copy_answer(&answer);
            }
            Ok(())
        }
        SessionOutcome::Cancelled => bail!(
            "Selection cancelled: region must be at least 10x10, got {}x{}",
            region.width,
            region.height
        ),
        SessionOutcome::CaptureFailed => {
            Err(anyhow!("Failed to capture screen. Try using --list-monitors to check indices"))
        }
        SessionOutcome::Failed(message) => bail!(message),
    }
}

fn init_logging(dev_mode: bool) {
    let default_level = if dev_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn parse_region(raw: &str) -> std::result::Result<SelectionRect, String> {
    let parts = raw
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number in region: {e}"))?;

    match parts.as_slice() {
        [x, y, w, h] if *w >= 0.0 && *h >= 0.0 => Ok(SelectionRect::new(*x, *y, *w, *h)),
        [_, _, _, _] => Err("region width and height must not be negative".to_string()),
        _ => Err(format!("expected X,Y,WIDTH,HEIGHT, got {} values", parts.len())),
    }
}

fn print_answer(answer: &AnswerResult) {
    println!();
    print_markdown(&answer_markdown(answer));
}

/// Lays out the answer as markdown, with the correct option in bold.
fn answer_markdown(answer: &AnswerResult) -> String {
    let mut text = format!("## {}\n\n", answer.question);
    for option in &answer.options {
        if answer.is_correct(option) {
            text.push_str(&format!("* **{}. {}**\n", option.label, option.text));
        } else {
            text.push_str(&format!("* {}. {}\n", option.label, option.text));
        }
    }
    text.push_str(&format!("\n*Explanation:* {}\n", answer.explanation));
    text
}

/// Helper to print markdown
fn print_markdown(text: &str) {
    let mut skin = MadSkin::default();
    skin.bold.set_fg(Color::Yellow);
    skin.italic.set_fg(Color::Magenta);
    skin.code_block.set_bg(Color::Rgb { r: 40, g: 40, b: 40 });

    skin.print_text(text);
}

fn copy_answer(answer: &AnswerResult) {
    let Some(option) = answer.correct_option() else {
        return;
    };
    match Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(e) = clipboard.set_text(format!("{}. {}", option.label, option.text)) {
                eprintln!("Warning: Failed to copy to clipboard: {}", e);
            } else {
                println!("(Copied to clipboard)");
            }
        }
        Err(e) => eprintln!("Warning: Could not access clipboard: {}", e),
    }
}
