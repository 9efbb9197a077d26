mod banner;
mod config;
mod downloader;
mod error;
mod extractor;
mod pacing;
mod queue;
mod sanitize;
mod scheduler;
mod state;

use std::path::PathBuf;

use clap::Parser;
use console::style;

use config::{CookieSource, Settings, DEFAULT_OUTPUT_DIR};
use downloader::YtDlp;
use error::Result;

#[derive(Parser, Debug, Clone)]
#[command(name = "ytqueue")]
#[command(version = "0.1.0")]
#[command(about = "Resumable round-robin downloader for per-channel video lists", long_about = None)]
struct Args {
    /// Base directory; each channel gets its own subdirectory
    #[arg(short = 'O', long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        if e.is_fatal() {
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::from_env();

    banner::print_banner();

    match &settings.cookies {
        CookieSource::Browser(name) => println!(
            "{} Using live cookies from browser: {}",
            style("[ytqueue]").cyan().bold(),
            style(name.to_uppercase()).yellow()
        ),
        CookieSource::File(path) => println!(
            "{} Using cookie file: {}",
            style("[ytqueue]").cyan().bold(),
            style(path.display()).yellow()
        ),
        CookieSource::None => eprintln!(
            "{} No cookies configured; YouTube will likely block requests",
            style("[ytqueue]").yellow().bold()
        ),
    }

    let lists = scheduler::discover_lists(&settings.lists_dir)?;

    println!("{} Initializing...", style("[ytqueue]").cyan().bold());
    if lists.is_empty() {
        println!(
            "{} No lists found in {}",
            style("[ytqueue]").cyan().bold(),
            settings.lists_dir.display()
        );
        return Ok(());
    }

    let tool = YtDlp::new(settings.program.clone(), settings.cookies.clone());
    downloader::check_tool(&tool);

    let queues = scheduler::open_queues(&lists, &args.output_dir);

    println!();
    println!("{} Starting", style("[ytqueue]").cyan().bold());
    println!("   Lists:  {}", settings.lists_dir.display());
    println!("   Output: {}", args.output_dir.display());

    let summary = scheduler::run(queues, &tool, &settings.pacing).await?;

    println!();
    println!(
        "{} Done: {} downloaded in {} rounds, {} cooldowns",
        style("[ytqueue]").green().bold(),
        style(summary.downloaded).green(),
        style(summary.rounds).yellow(),
        if summary.cooldowns > 0 {
            style(summary.cooldowns).red()
        } else {
            style(summary.cooldowns).dim()
        }
    );

    Ok(())
}
