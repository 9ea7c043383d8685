//! `tractatus` binary: run the server, or drive a running one from the terminal.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tx_core::types::DEFAULT_MODEL_VALUE;
use tx_core::{ChatTranscript, GeneratorForm, Language, ReturnType, TractatusConfig};
use tx_llm::StreamPart;
use tx_server::client::TractatusClient;

#[derive(Parser)]
#[command(name = "tractatus", version, about = "Tractatus generator server and client")]
struct Cli {
    /// Config file (TOML). Defaults to the user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate a tractatus from a document and/or text.
    Generate(GenerateArgs),
    /// Chat about a generated tractatus.
    Chat(ChatArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Document to upload (.pdf, .docx or .txt).
    file: Option<PathBuf>,
    /// Text to send, appended after the document's text.
    #[arg(long)]
    text: Option<String>,
    #[arg(long, default_value = "text")]
    format: ReturnType,
    #[arg(long, default_value = DEFAULT_MODEL_VALUE)]
    model: String,
    #[arg(long, default_value = "same")]
    language: Language,
    /// Server base URL. Defaults to the configured local port.
    #[arg(long)]
    server: Option<String>,
    /// Also write the finished tractatus to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ChatArgs {
    /// File holding a generated tractatus.
    #[arg(long)]
    tractatus: PathBuf,
    #[arg(long)]
    server: Option<String>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn server_url(config: &TractatusConfig, server: Option<String>) -> String {
    server.unwrap_or_else(|| format!("http://127.0.0.1:{}", config.server.port))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = TractatusConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Generate(args) => {
            let client = TractatusClient::new(server_url(&config, args.server.clone()));
            generate(&client, args).await
        }
        Command::Chat(args) => {
            let client = TractatusClient::new(server_url(&config, args.server.clone()));
            chat(&client, args).await
        }
    }
}

async fn serve(mut config: TractatusConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    let addr = config.bind_addr();
    if config.providers.openai.api_key.is_none() && config.providers.google.api_key.is_none() {
        tracing::warn!("no provider API key configured; generation requests will fail");
    }

    let app = tx_server::app(config).context("building model provider")?;
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("tractatus server listening on {addr}");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn generate(client: &TractatusClient, args: GenerateArgs) -> Result<()> {
    let mut form = GeneratorForm::new();
    form.return_type = args.format;
    form.language = args.language;
    form.set_model(args.model);

    if let Some(path) = &args.file {
        form.set_uploading(true);
        let text = client.upload(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        eprintln!("Extracted {} characters from {name}", text.chars().count());
        form.attach_upload(name, text);
    }
    if let Some(text) = args.text {
        form.input = text;
    }

    let request = form
        .begin_submit()
        .context("nothing to generate: pass a file or --text")?;
    let mut parts = client.generate(&request).await?;

    let mut stdout = std::io::stdout();
    let mut ticker = tokio::time::interval(form.ticker().interval);
    ticker.tick().await;
    eprintln!("{}", form.ticker().current());

    let mut started = false;
    let mut stream_error = None;
    loop {
        tokio::select! {
            part = parts.next() => match part {
                None => break,
                Some(Ok(StreamPart::Text(text))) => {
                    started = true;
                    write!(stdout, "{text}")?;
                    stdout.flush()?;
                    form.push_delta(&text);
                }
                Some(Ok(StreamPart::Error(message))) => stream_error = Some(message),
                Some(Ok(StreamPart::FinishStep { finish_reason, is_continued, .. })) => {
                    tracing::debug!(?finish_reason, is_continued, "step finished");
                }
                Some(Ok(StreamPart::FinishMessage { finish_reason, usage })) => {
                    tracing::debug!(
                        ?finish_reason,
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "generation finished"
                    );
                }
                Some(Ok(StreamPart::StartStep { .. })) => {}
                Some(Err(e)) => {
                    form.finish();
                    return Err(e);
                }
            },
            _ = ticker.tick(), if !started => {
                eprintln!("{}", form.ticker_mut().tick());
            }
        }
    }
    form.finish();
    writeln!(stdout)?;

    if let Some(message) = stream_error {
        bail!("generation failed: {message}");
    }
    if let Some(path) = args.output {
        let text = form.chat_handoff().context("the model returned no text")?;
        tokio::fs::write(&path, text)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        eprintln!("Saved to {}", path.display());
    }
    Ok(())
}

async fn chat(client: &TractatusClient, args: ChatArgs) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.tractatus)
        .await
        .with_context(|| format!("reading {}", args.tractatus.display()))?;
    let mut transcript = ChatTranscript::new(text)?;
    if let Some(greeting) = transcript.messages().first() {
        println!("{}", greeting.content);
    }

    let mut stdout = std::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        std::io::stderr().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if matches!(line, "exit" | "quit") {
            break;
        }
        if !transcript.can_send(line) {
            continue;
        }

        let body = transcript.send(line)?;
        match client.chat(&body).await {
            Ok(mut parts) => {
                while let Some(part) = parts.next().await {
                    match part {
                        Ok(StreamPart::Text(delta)) => {
                            write!(stdout, "{delta}")?;
                            stdout.flush()?;
                            transcript.push_delta(&delta);
                        }
                        Ok(StreamPart::Error(message)) => eprintln!("error: {message}"),
                        Ok(_) => {}
                        Err(e) => {
                            eprintln!("error: {e:#}");
                            break;
                        }
                    }
                }
                writeln!(stdout)?;
            }
            Err(e) => eprintln!("error: {e:#}"),
        }
        transcript.finish();
    }
    Ok(())
}
