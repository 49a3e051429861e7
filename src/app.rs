use std::path::PathBuf;
use std::pin::pin;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio::signal;
use tracing::{Level, warn};

use crate::cipher::Mode;
use crate::config::{DEFAULT_ITERATIONS, DEFAULT_KEY_BITS, PASSWORD_MIN_LENGTH};
use crate::file::File;
use crate::secret::Secret;
use crate::session::{Operation, Session};
use crate::types::{CipherConfiguration, OperationResult, Processing};
use crate::ui::display;
use crate::ui::progress::Bar;
use crate::ui::prompt::Prompt;

#[derive(Args)]
pub struct CipherArgs {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long)]
    password: Option<String>,

    /// cbc, gcm or ctr
    #[arg(short, long, default_value = "gcm")]
    mode: Mode,

    /// 128, 192 or 256
    #[arg(short, long, default_value_t = DEFAULT_KEY_BITS)]
    key_size: u32,

    /// PBKDF2 iteration count; must match between encryption and decryption
    #[arg(short = 'n', long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: u32,

    /// Overwrite the output file if it exists
    #[arg(short, long)]
    force: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    Encrypt(CipherArgs),

    Decrypt(CipherArgs),

    /// Show a one-iteration salted hash of a password
    Preview {
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Parser)]
#[command(name = "passcrypt", version = "26.1.0", about = "Streaming password-based file encryption with AES-CBC, AES-GCM and AES-CTR.")]
pub struct App {
    #[command(subcommand)]
    command: Commands,

    /// Log stage transitions
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl App {
    pub fn init() -> Result<Self> {
        let app = Self::parse();

        let level = if app.verbose { Level::DEBUG } else { Level::INFO };
        let subscriber = tracing_subscriber::fmt().with_max_level(level).with_file(true).with_line_number(true).with_writer(std::io::stderr).finish();
        tracing::subscriber::set_global_default(subscriber)?;

        Ok(app)
    }

    pub async fn execute(self) -> Result<()> {
        let prompt = Prompt::new(PASSWORD_MIN_LENGTH);
        match self.command {
            Commands::Encrypt(args) => Self::run(args, Processing::Encryption, &prompt).await,
            Commands::Decrypt(args) => Self::run(args, Processing::Decryption, &prompt).await,
            Commands::Preview { password } => Self::preview(password, &prompt),
        }
    }

    async fn run(args: CipherArgs, processing: Processing, prompt: &Prompt) -> Result<()> {
        let config = CipherConfiguration::new(args.key_size, args.iterations, args.mode).context("invalid cipher configuration")?;

        let input = File::new(args.input);
        input.validate_input().await?;

        let output = File::new(args.output.unwrap_or_else(|| input.output_path(processing)));
        if !args.force && output.validate_output().is_err() && !prompt.confirm(&format!("{} exists. Overwrite?", output.path().display()))? {
            bail!("output file already exists: {}", output.path().display());
        }

        if processing == Processing::Decryption {
            display::show_mode_warning(config.mode());
        }

        let password = match args.password {
            Some(password) => Secret::from_string(password),
            None => match processing {
                Processing::Encryption => prompt.encryption_password()?,
                Processing::Decryption => prompt.decryption_password()?,
            },
        };

        display::show_configuration(&config);
        let size = input.size().await?;
        let session = Session::new(config);
        let reader = input.open().await?;
        let writer = output.create().await?;

        let operation = match processing {
            Processing::Encryption => session.begin_encrypt(reader, writer, password, Some(size)),
            Processing::Decryption => session.begin_decrypt(reader, writer, password, Some(size)),
        }?;

        match Self::follow(&session, operation).await {
            OperationResult::Success => {
                display::show_success(processing, output.path(), output.size().await?);
                Ok(())
            }
            OperationResult::Cancelled => {
                Self::discard(&output).await;
                display::show_cancelled(output.path());
                bail!("{processing} cancelled")
            }
            OperationResult::Failure { message, .. } => {
                Self::discard(&output).await;
                display::show_failure(&message);
                bail!("{processing} failed")
            }
        }
    }

    /// Drives the progress bar until the operation ends. Ctrl-C requests cancellation.
    async fn follow(session: &Session, operation: Operation) -> OperationResult {
        let processing = operation.processing();
        let canceller = operation.canceller();
        let mut progress = operation.progress();
        let mut bar = Bar::new(processing.label());
        let mut shown_artifacts = false;

        let mut done = pin!(operation.wait());
        let result = loop {
            tokio::select! {
                result = &mut done => break result,
                changed = progress.changed() => {
                    if changed.is_err() {
                        break (&mut done).await;
                    }
                    bar.update(*progress.borrow_and_update());

                    if !shown_artifacts {
                        if let (Some(salt), Some(fingerprint)) = (session.current_salt(), session.current_key_fingerprint()) {
                            bar.println(display::artifacts_line(&salt, &fingerprint));
                            shown_artifacts = true;
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    canceller.cancel();
                    bar.set_message("Cancelling...");
                }
            }
        };

        if result.is_success() {
            bar.finish("Done");
        } else {
            bar.abandon("Stopped");
        }
        result
    }

    /// Partial output is never usable, so it is removed on any unsuccessful run.
    async fn discard(output: &File) {
        if !output.exists() {
            return;
        }
        if let Err(e) = output.delete().await {
            warn!("failed to remove partial output: {e:#}");
        }
    }

    fn preview(password: Option<String>, prompt: &Prompt) -> Result<()> {
        let password = match password {
            Some(password) => Secret::from_string(password),
            None => prompt.decryption_password()?,
        };

        let preview = Session::preview(&password)?;
        display::show_preview(&preview);
        Ok(())
    }
}
