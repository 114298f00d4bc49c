//! Command-line interface definitions for the LA Times scraper.
//!
//! All arguments can be provided via command-line flags; the WebDriver URL
//! can also come from the environment.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Command-line arguments for the scraper.
///
/// # Examples
///
/// ```sh
/// # Process the workitems in work.json against a local chromedriver
/// latimes_scraper -i work.json
///
/// # With a visible browser window, tuned selectors and timeouts
/// latimes_scraper -i work.json -o ./out -c scraper.yaml --headed
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// JSON file holding an array of workitem payloads
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory for reports, images, screenshots and outcomes
    #[arg(short, long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Optional path to a YAML scraper configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// URL of the running WebDriver server
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    pub webdriver_url: String,

    /// Show the browser window instead of running headless
    #[arg(long = "headed", action = ArgAction::SetFalse)]
    pub headless: bool,
}
