use std::{fs::OpenOptions, io, path::PathBuf, process::ExitCode, sync::Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use keysource_tui::FormOptions;
use keysource_types::{InputMode, KeySource, KeySourceSelection};
use keysource_util::{UserPreferences, key_material, redact_key_text};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod output;

/// Exit status when the form is closed without choosing a key.
const EXIT_CLOSED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "keysource", version, about = "Select a key from a file or pasted text")]
struct Cli {
    /// Mode the interactive form opens in (file or manual)
    #[arg(long, value_name = "MODE", conflicts_with_all = ["file", "manual", "stdin"])]
    mode: Option<InputMode>,

    /// Use the key file at PATH without opening the form
    #[arg(long, value_name = "PATH", conflicts_with_all = ["manual", "stdin"])]
    file: Option<String>,

    /// Use TEXT as the key without opening the form
    #[arg(long, value_name = "TEXT", conflicts_with = "stdin")]
    manual: Option<String>,

    /// Read the key text from standard input
    #[arg(long)]
    stdin: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Only print the key source; skip reading and inspecting the key
    #[arg(long)]
    no_inspect: bool,
}

impl Cli {
    fn is_interactive(&self) -> bool {
        self.file.is_none() && self.manual.is_none() && !self.stdin
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.is_interactive());

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_CLOSED),
        Err(err) => {
            error!(error = %redact_key_text(&format!("{err:#}")), "keysource failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// In the form, logs go to a file so they do not corrupt the alternate screen.
fn init_tracing(interactive: bool) {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if interactive {
        if let Some(file) = log_file_path().and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok()) {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
        }
        return;
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(io::stderr)
        .try_init();
}

fn log_file_path() -> Option<PathBuf> {
    let dir = dirs_next::config_dir()?.join("keysource");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir.join("keysource.log"))
}

/// Returns `Ok(false)` when the form was closed without a key source.
async fn run(cli: Cli) -> Result<bool> {
    let preferences = UserPreferences::load_or_ephemeral();

    let source = match selection_from_args(&cli)? {
        Some(source) => source,
        None => {
            let options = FormOptions {
                initial_mode: cli.mode.or_else(|| preferences.last_mode()).unwrap_or_default(),
                browse_dir: preferences.last_directory(),
                preferred_theme: preferences.preferred_theme(),
            };
            match keysource_tui::run(options).await? {
                Some(source) => source,
                None => {
                    info!("form closed without a key source");
                    return Ok(false);
                }
            }
        }
    };

    if let Err(err) = preferences.record_selection(&source) {
        warn!(error = %err, "failed to save preferences");
    }

    let material = if cli.no_inspect {
        None
    } else {
        let to_load = source.clone();
        let material = tokio::task::spawn_blocking(move || key_material::load(&to_load))
            .await
            .context("key inspection task failed")??;
        Some(material)
    };

    let rendered = if cli.json {
        output::render_json(&source, material.as_ref())?
    } else {
        output::render_human(&source, material.as_ref())
    };
    println!("{rendered}");
    Ok(true)
}

/// Drives the form model from flags. `None` means no key flag was given and
/// the interactive form should open.
fn selection_from_args(cli: &Cli) -> Result<Option<KeySource>> {
    let selection = if let Some(path) = &cli.file {
        let mut selection = KeySourceSelection::with_mode(InputMode::FromFile);
        selection.set_file_path(path.as_str());
        selection
    } else if let Some(text) = &cli.manual {
        let mut selection = KeySourceSelection::with_mode(InputMode::Manual);
        selection.set_manual_text(text.as_str());
        selection
    } else if cli.stdin {
        let text = io::read_to_string(io::stdin()).context("failed to read key text from stdin")?;
        let mut selection = KeySourceSelection::with_mode(InputMode::Manual);
        selection.set_manual_text(text);
        selection
    } else {
        return Ok(None);
    };

    let source = selection.handle_next()?;
    debug!(mode = %source.mode(), "key source taken from arguments");
    Ok(Some(source))
}
