use chat_warden::bot;
use chat_warden::config::Settings;
use dotenvy::dotenv;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Redacts bot tokens from anything that reaches the log output.
struct TokenRedactor {
    patterns: Vec<(Regex, &'static str)>,
}

impl TokenRedactor {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            patterns: vec![
                (
                    Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
                    "$1[TELEGRAM_TOKEN]$3",
                ),
                (
                    Regex::new(r"[0-9]{8,10}:[A-Za-z0-9_-]{35}")?,
                    "[TELEGRAM_TOKEN]",
                ),
            ],
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        for (pattern, replacement) in &self.patterns {
            output = pattern.replace_all(&output, *replacement).to_string();
        }
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    redactor: Arc<TokenRedactor>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        self.inner.write_all(self.redactor.redact(&text).as_bytes())?;
        // Report the original length even though the redacted text may
        // differ in size.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter {
    redactor: Arc<TokenRedactor>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter {
    type Writer = RedactingWriter<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: io::stderr(),
            redactor: self.redactor.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let redactor = Arc::new(TokenRedactor::new().map_err(|e| {
        eprintln!("Failed to compile redaction patterns: {e}");
        e
    })?);
    init_logging(redactor);

    info!("Starting chat-warden...");

    let settings = init_settings();
    if settings.trusted_operators().is_empty() {
        error!("No trusted operators configured; the bot would leave every chat it sees.");
        std::process::exit(1);
    }

    let bot = Bot::new(settings.telegram_token.clone());
    let app = bot::App::build(bot.clone(), &settings);

    info!(
        operators = app.operators.len(),
        stages = app.dispatcher.len(),
        "Pipeline wired; bot is running..."
    );

    Dispatcher::builder(bot, bot::schema())
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_logging(redactor: Arc<TokenRedactor>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(RedactingMakeWriter { redactor }))
        .init();
}

fn init_settings() -> Settings {
    match Settings::new() {
        Ok(settings) => {
            info!("Configuration loaded successfully.");
            settings
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}
