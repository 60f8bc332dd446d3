use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    rc::Rc,
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    settings::{load_client_settings, ClientSettings},
    HttpProcessor, MemoryUrlStore, ObjectUrl, PresentationSurface, UploadController,
};
use shared::{
    domain::{format_file_label, SelectedFile},
    protocol::PROCESSING_STATUS,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Parser, Debug)]
#[command(name = "uploader", about = "Send an image to a processing endpoint and save the result")]
struct Args {
    /// Processing endpoint; a bare origin gets `/remove` appended.
    #[arg(long)]
    endpoint: Option<String>,
    /// Override the media type guessed from the file extension.
    #[arg(long)]
    media_type: Option<String>,
    /// Output path, defaults to `<stem>_no_bg.png` next to the input.
    #[arg(long, short)]
    out: Option<PathBuf>,
    file: PathBuf,
}

/// Prints the status area to the terminal; preview and busy state have no terminal equivalent.
struct TerminalSurface;

impl PresentationSurface for TerminalSurface {
    fn reset(&self) {}

    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }

    fn show_file_info(&self, label: &str) {
        println!("{label}");
    }

    fn show_preview(&self, url: &ObjectUrl) {
        debug!(%url, "preview ready");
    }

    fn show_processing(&self) {
        println!("{PROCESSING_STATUS}");
    }

    fn set_busy(&self, busy: bool) {
        debug!(busy, "input busy state changed");
    }

    fn show_result(&self, url: &ObjectUrl) {
        debug!(%url, "result ready");
    }

    fn show_error(&self, status: &str) {
        eprintln!("{status}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = match args.endpoint.as_deref() {
        Some(raw) => ClientSettings::with_endpoint(raw)?,
        None => load_client_settings()?,
    };
    info!(endpoint = %settings.endpoint_url, "using processing endpoint");

    let file = read_selected_file(&args.file, args.media_type.as_deref()).await?;
    let urls = Rc::new(MemoryUrlStore::new());
    let controller = UploadController::new(
        Rc::new(HttpProcessor::from_settings(&settings)),
        Rc::new(TerminalSurface),
        urls.clone(),
    );

    let outcome = match controller.submit(file).await {
        Ok(outcome) => outcome,
        Err(error) => {
            debug!(%error, "submission failed");
            return Ok(ExitCode::FAILURE);
        }
    };

    let stored = urls
        .resolve(&outcome.result_url)
        .context("processed image was released before it could be saved")?;
    let out = args.out.unwrap_or_else(|| default_output_path(&args.file));
    tokio::fs::write(&out, &stored.bytes)
        .await
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!(
        "Saved {} [{}]",
        format_file_label(&out.display().to_string(), outcome.size_bytes),
        outcome.content_type
    );
    Ok(ExitCode::SUCCESS)
}

async fn read_selected_file(path: &Path, media_type: Option<&str>) -> Result<SelectedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SelectedFile::new(name, guess_media_type(path, media_type), bytes))
}

fn guess_media_type(path: &Path, explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| mime_guess::from_path(path).first_raw().map(str::to_string))
        .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string())
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}_no_bg.png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_comes_from_extension_unless_overridden() {
        assert_eq!(guess_media_type(Path::new("cat.png"), None), "image/png");
        assert_eq!(guess_media_type(Path::new("photo.JPG"), None), "image/jpeg");
        assert_eq!(
            guess_media_type(Path::new("doc.pdf"), None),
            "application/pdf"
        );
        assert_eq!(
            guess_media_type(Path::new("no_extension"), None),
            FALLBACK_MEDIA_TYPE
        );
        assert_eq!(
            guess_media_type(Path::new("blob.bin"), Some("image/webp")),
            "image/webp"
        );
    }

    #[test]
    fn output_defaults_next_to_input() {
        assert_eq!(
            default_output_path(Path::new("/tmp/pics/cat.jpeg")),
            PathBuf::from("/tmp/pics/cat_no_bg.png")
        );
        assert_eq!(
            default_output_path(Path::new("photo.png")),
            PathBuf::from("photo_no_bg.png")
        );
    }

    #[test]
    fn args_parse_flags_and_positional_file() {
        let args = Args::try_parse_from([
            "uploader",
            "--endpoint",
            "http://localhost:5000",
            "-o",
            "out.png",
            "cat.png",
        ])
        .expect("args");
        assert_eq!(args.endpoint.as_deref(), Some("http://localhost:5000"));
        assert_eq!(args.out, Some(PathBuf::from("out.png")));
        assert_eq!(args.file, PathBuf::from("cat.png"));
    }

    #[tokio::test]
    async fn reads_file_with_name_and_guessed_type() {
        let dir = std::env::temp_dir().join(format!("uploader_cli_test_{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.expect("dir");
        let path = dir.join("tiny.webp");
        tokio::fs::write(&path, b"RIFF").await.expect("write");

        let file = read_selected_file(&path, None).await.expect("read");
        assert_eq!(file.name, "tiny.webp");
        assert_eq!(file.media_type, "image/webp");
        assert_eq!(file.size(), 4);

        tokio::fs::remove_dir_all(dir).await.expect("cleanup");
    }
}
