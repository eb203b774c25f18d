use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use screenguide_core::config::AppConfig;
use screenguide_core::types::{PriorContext, ScreenRepresentation, UiTree};
use screenguide_engine::engine::AssistRequest;
use screenguide_engine::traits::AudioUpload;
use screenguide_runtime::config_store::ConfigStore;
use screenguide_runtime::defaults::default_config_path;
use screenguide_runtime::prior::load_prior_context;
use screenguide_runtime::secrets::{Secrets, load_dotenv};
use screenguide_runtime::{build_engine_from_config, prior_context_from_config};

/// Run one assist request locally and print the verdict as JSON.
#[derive(Debug, Parser)]
#[command(name = "screenguide-cli")]
struct Args {
    /// Voice recording (wav, m4a, 3gp, ogg, ...).
    #[arg(long, required_unless_present = "write_default_config")]
    audio: Option<PathBuf>,

    /// Screenshot of the phone.
    #[arg(
        long,
        conflicts_with = "ui_tree",
        required_unless_present_any = ["ui_tree", "write_default_config"]
    )]
    image: Option<PathBuf>,

    /// Accessibility UI-tree JSON captured on the phone.
    #[arg(long)]
    ui_tree: Option<PathBuf>,

    /// Reference UI-structure JSON (overrides the configured one).
    #[arg(long)]
    prior: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the synthesized advice audio here.
    #[arg(long)]
    speech_out: Option<PathBuf>,

    /// Write a config file with every default filled in, then exit.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["audio", "image", "ui_tree"])]
    write_default_config: Option<PathBuf>,
}

fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

fn write_default_config(path: &Path) -> anyhow::Result<()> {
    let store = ConfigStore::at_path(path);
    if store.path().exists() {
        return Err(anyhow!("refusing to overwrite {}", path.display()));
    }
    store.save(&AppConfig::default())
}

fn read(path: &Path, what: &str) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read {what}: {}", path.display()))
}

fn load_screen(args: &Args) -> anyhow::Result<ScreenRepresentation> {
    match (&args.image, &args.ui_tree) {
        (Some(img), _) => Ok(ScreenRepresentation::image(
            image_mime(img),
            read(img, "image")?,
        )),
        (None, Some(tree)) => {
            let raw = String::from_utf8(read(tree, "ui tree")?).context("ui tree is not UTF-8")?;
            let tree = UiTree::from_json(&raw).context("decode ui tree JSON")?;
            Ok(ScreenRepresentation::UiTree(tree))
        }
        (None, None) => Err(anyhow!("either --image or --ui-tree is required")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        write_default_config(path)?;
        eprintln!("default config written to {}", path.display());
        return Ok(());
    }

    let store = ConfigStore::at_path(args.config.clone().unwrap_or_else(default_config_path));
    let cfg = store.load_with_env()?;
    let engine = build_engine_from_config(&cfg, &Secrets::from_env());

    let prior_context: Option<PriorContext> = match &args.prior {
        Some(path) => load_prior_context(path)?,
        None => prior_context_from_config(&cfg)?,
    };

    let audio_path = args
        .audio
        .as_deref()
        .ok_or_else(|| anyhow!("--audio is required"))?;
    let mut audio = AudioUpload::new(read(audio_path, "audio")?);
    audio.file_name = audio_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());

    let request = AssistRequest {
        audio,
        screen: load_screen(&args)?,
        prior_context,
    };

    let outcome = engine
        .run_with_hook(request, |stage| async move {
            eprintln!("[{stage}]");
        })
        .await?;

    if let Some(out) = &args.speech_out {
        std::fs::write(out, &outcome.speech.bytes)
            .with_context(|| format!("write speech: {}", out.display()))?;
        eprintln!("speech ({}) written to {}", outcome.speech.mime_type, out.display());
    }

    let report = serde_json::json!({
        "transcript": outcome.transcript.text,
        "mission_achieved": outcome.verdict.mission_achieved,
        "ai_response": outcome.verdict.advice_text,
        "selected_ui_element": outcome.verdict.selected_element,
        "timings": outcome.timings,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
