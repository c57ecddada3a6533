use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use shapecast_core::config::Config;
use shapecast_gateway::AppState;
use shapecast_media::relay::collect_to_file;
use shapecast_media::{ElevenLabsSynthesizer, SpeechRelay};
use shapecast_providers::{ChatProvider, GroqProvider, ShapeGenerator, TextGenerator};

mod presenter;

use presenter::{Outcome, Presenter};

#[derive(Parser)]
#[command(
    name = "shapecast",
    about = "Generate 3D shapes and spoken narration from a prompt",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (JSON5)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (default: 3000)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,

        /// Do not serve the browser page
        #[arg(long)]
        no_ui: bool,
    },

    /// Generate a narration paragraph
    Text { prompt: String },

    /// Generate a shape descriptor
    Shape { prompt: String },

    /// Synthesize speech into an MP3 file
    Speak {
        text: String,

        /// Output file
        #[arg(short, long, default_value = "generated_audio.mp3")]
        out: PathBuf,
    },

    /// Interactive loop: one live shape, replaced on every concept
    Play {
        /// Also narrate each concept into this directory
        #[arg(long)]
        narrate: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Report missing keys and invalid settings
    Check,
}

fn init_logging(cli: &Cli, config: &Config) {
    let logging = config.logging.as_ref();
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        logging
            .and_then(|l| l.level.clone())
            .unwrap_or_else(|| "info".to_string())
    };
    let mut directives = vec![level];
    if let Some(l) = logging {
        directives.extend(l.filters.iter().cloned());
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directives.join(",")));

    let json = cli.log_json || logging.is_some_and(|l| l.format == "json");
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;

    init_logging(&cli, &config);
    tracing::debug!(path = %config_path.display(), "Configuration loaded");

    match cli.command {
        Commands::Serve { port, bind, no_ui } => {
            let server = config.server.get_or_insert_with(Default::default);
            if let Some(port) = port {
                server.port = port;
            }
            if bind.is_some() {
                server.bind = bind;
            }
            if no_ui {
                server.ui = false;
            }

            let (warnings, errors) = config.validate();
            for w in &warnings {
                tracing::warn!("{w}");
            }
            if !errors.is_empty() {
                anyhow::bail!("invalid configuration: {}", errors.join("; "));
            }

            let state = Arc::new(AppState::from_config(Arc::new(config))?);
            shapecast_gateway::start_server(state).await?;
        }
        Commands::Text { prompt } => {
            let text = TextGenerator::new(chat_provider(&config)?, config.llm().model());
            println!("{}", text.generate(&prompt).await?);
        }
        Commands::Shape { prompt } => {
            let shapes = ShapeGenerator::new(chat_provider(&config)?, config.llm().model());
            let shape = shapes.generate(&prompt).await?;
            println!("{}", serde_json::to_string_pretty(&shape)?);
            if let Err(e) = shape.geometry() {
                tracing::warn!("Shape will not render: {e}");
            }
        }
        Commands::Speak { text, out } => {
            let tts = config.tts();
            let synthesizer = Arc::new(ElevenLabsSynthesizer::from_config(&tts)?);
            let stream = SpeechRelay::new(synthesizer, &tts).stream(&text).await?;
            let bytes = collect_to_file(stream, &out).await?;
            println!("Wrote {bytes} bytes to {}", out.display());
        }
        Commands::Play { narrate } => {
            let state = AppState::from_config(Arc::new(config))?;
            run_play(state, narrate).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::Check => {
                let (warnings, errors) = config.validate();
                for w in &warnings {
                    println!("warning: {w}");
                }
                for e in &errors {
                    println!("error: {e}");
                }
                if warnings.is_empty() && errors.is_empty() {
                    println!("Configuration OK");
                }
                if !errors.is_empty() {
                    std::process::exit(1);
                }
            }
        },
    }

    Ok(())
}

fn chat_provider(config: &Config) -> anyhow::Result<Arc<dyn ChatProvider>> {
    Ok(Arc::new(GroqProvider::from_config(&config.llm())?))
}

async fn run_play(state: AppState, narrate: Option<PathBuf>) -> anyhow::Result<()> {
    let mut presenter = Presenter::new(state.shapes, state.text, state.speech, narrate);

    loop {
        let concept: String = dialoguer::Input::new()
            .with_prompt("Concept (empty to quit)")
            .allow_empty(true)
            .interact_text()?;
        let concept = concept.trim();
        if concept.is_empty() {
            break;
        }

        match presenter.show(concept).await {
            Ok(Outcome::Shown(desc)) => println!("  live: {desc}"),
            Ok(Outcome::FormatFailed(e)) => println!("  formatting error: {e}"),
            Ok(Outcome::RenderFailed(e)) => println!("  render error: {e}"),
            Err(e) => {
                println!("  generation error: {e}");
                continue;
            }
        }

        match presenter.narrate(concept).await {
            Ok(Some((text, path))) => println!("  narration: {text}\n  audio: {}", path.display()),
            Ok(None) => {}
            Err(e) => println!("  narration error: {e}"),
        }
    }

    if let Some(mesh) = presenter.current() {
        println!("Last shape: {}", mesh.describe());
    }
    Ok(())
}
