//! tvault-core: Trust Vault command-line interface
//!
//! Commands:
//!   seal            - seal a folder into an encrypted container
//!   unseal          - extract a container back into a folder
//!   reseal          - re-encrypt a container in place or to a new path
//!   container info  - inspect header and metadata without a key
//!   version         - print tool and format versions
//!   info            - print the project card

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use tracing::debug;

use tvault_core::error::{Category, VaultError, VaultResult};
use tvault_core::io::{Format, Sink, SinkTarget, Source, SourceTarget};
use tvault_core::{CompressionType, IntegrityType, TokenType};
use tvault_ops::options::TokenSink;
use tvault_ops::{InfoOptions, ResealOptions, SealOptions, UnsealOptions};

const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "tvault-core",
    version,
    about = "Trust Vault Core: seal a folder into an authenticated, encrypted container",
    long_about = "tvault-core seals a directory tree into a single encrypted container file \
                  gated by a passphrase, a master token, or a Shamir threshold split"
)]
struct Cli {
    /// Log level for diagnostics on stderr (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seal a folder into a new container
    Seal(SealArgs),

    /// Extract a container into a folder
    Unseal(UnsealArgs),

    /// Re-encrypt an existing container with new content, metadata, or
    /// token passphrase
    Reseal(ResealArgs),

    /// Container introspection
    Container {
        #[command(subcommand)]
        action: ContainerAction,
    },

    /// Print tool, container, and token format versions
    Version,

    /// Print the project card
    Info,
}

#[derive(Subcommand, Debug)]
enum ContainerAction {
    /// Read header and metadata without decrypting anything
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct SealArgs {
    /// Folder to seal
    #[arg(long)]
    folder_path: Option<PathBuf>,
    /// Path of the container file to create
    #[arg(long)]
    new_path: Option<PathBuf>,
    /// Container passphrase (prompted when omitted on a terminal)
    #[arg(long)]
    passphrase: Option<String>,

    /// Token scheme gating the data-encryption-key
    #[arg(long, value_enum, default_value = "share")]
    token_type: TokenTypeArg,
    /// Compression backend
    #[arg(long, value_enum, default_value = "zip")]
    compression_type: CompressionArg,

    /// Integrity provider signing the Shamir shares
    #[arg(long, value_enum, default_value = "hmac")]
    integrity_type: IntegrityArg,
    /// Passphrase protecting the issued tokens (required for hmac)
    #[arg(long)]
    integrity_new_passphrase: Option<String>,

    /// Number of Shamir shares
    #[arg(long, default_value_t = 5)]
    shares: u8,
    /// Shares required to reconstruct the key
    #[arg(long, default_value_t = 3)]
    threshold: u8,

    #[command(flatten)]
    token_writer: TokenWriterArgs,
    #[command(flatten)]
    log_writer: LogWriterArgs,
}

#[derive(Args, Debug)]
struct UnsealArgs {
    /// Path of the existing container
    #[arg(long)]
    current_path: Option<PathBuf>,
    /// Folder to extract into
    #[arg(long)]
    folder_path: Option<PathBuf>,
    /// Container passphrase (only for containers sealed with token type
    /// none; prompted when omitted on a terminal)
    #[arg(long)]
    passphrase: Option<String>,

    /// Current integrity passphrase protecting the tokens
    #[arg(long)]
    integrity_current_passphrase: Option<String>,

    #[command(flatten)]
    token_reader: TokenReaderArgs,
    #[command(flatten)]
    log_writer: LogWriterArgs,
}

#[derive(Args, Debug)]
struct ResealArgs {
    /// Path of the existing container
    #[arg(long)]
    current_path: Option<PathBuf>,
    /// New container path (defaults to resealing in place)
    #[arg(long)]
    new_path: Option<PathBuf>,
    /// Folder whose current content replaces the sealed one
    #[arg(long)]
    folder_path: Option<PathBuf>,
    /// Container passphrase (only for containers sealed with token type
    /// none; prompted when omitted on a terminal)
    #[arg(long)]
    passphrase: Option<String>,

    /// Replace the container name
    #[arg(long)]
    name: Option<String>,
    /// Replace the container comment
    #[arg(long)]
    comment: Option<String>,
    /// Replace the container tags (comma-separated)
    #[arg(long)]
    tags: Option<String>,

    /// Current integrity passphrase protecting the tokens
    #[arg(long)]
    integrity_current_passphrase: Option<String>,
    /// New integrity passphrase for the reissued tokens
    #[arg(long)]
    integrity_new_passphrase: Option<String>,

    #[command(flatten)]
    token_reader: TokenReaderArgs,
    #[command(flatten)]
    token_writer: TokenWriterArgs,
    #[command(flatten)]
    log_writer: LogWriterArgs,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Path of the container to inspect
    #[arg(long)]
    path: Option<PathBuf>,

    #[arg(long = "info-writer-type", value_enum, default_value = "stdout")]
    info_writer_type: WriterTypeArg,
    #[arg(long = "info-writer-path")]
    info_writer_path: Option<PathBuf>,
    #[arg(long = "info-writer-format", value_enum, default_value = "plaintext")]
    info_writer_format: FormatArg,

    #[command(flatten)]
    log_writer: LogWriterArgs,
}

#[derive(Args, Debug)]
struct TokenWriterArgs {
    /// Where the issued tokens go
    #[arg(long = "token-writer-type", value_enum, default_value = "stdout")]
    token_writer_type: WriterTypeArg,
    /// Token file path (required for the file writer)
    #[arg(long = "token-writer-path")]
    token_writer_path: Option<PathBuf>,
    /// Token output format
    #[arg(long = "token-writer-format", value_enum, default_value = "json")]
    token_writer_format: FormatArg,
}

#[derive(Args, Debug)]
struct TokenReaderArgs {
    /// Where the tokens come from
    #[arg(long = "token-reader-type", value_enum, default_value = "flag")]
    token_reader_type: ReaderTypeArg,
    /// Token file path (required for the file reader)
    #[arg(long = "token-reader-path")]
    token_reader_path: Option<PathBuf>,
    /// Token material passed directly (required for the flag reader)
    #[arg(long = "token-reader-flag")]
    token_reader_flag: Option<String>,
    /// Token input format
    #[arg(long = "token-reader-format", value_enum, default_value = "json")]
    token_reader_format: FormatArg,
}

#[derive(Args, Debug)]
struct LogWriterArgs {
    /// Where error reports go
    #[arg(long = "log-writer-type", value_enum, default_value = "stdout")]
    log_writer_type: WriterTypeArg,
    /// Log file path (required for the file writer)
    #[arg(long = "log-writer-path")]
    log_writer_path: Option<PathBuf>,
    /// Error report format
    #[arg(long = "log-writer-format", value_enum, default_value = "json")]
    log_writer_format: FormatArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TokenTypeArg {
    None,
    Share,
    Master,
}

impl From<TokenTypeArg> for TokenType {
    fn from(arg: TokenTypeArg) -> Self {
        match arg {
            TokenTypeArg::None => Self::None,
            TokenTypeArg::Share => Self::Share,
            TokenTypeArg::Master => Self::Master,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompressionArg {
    Zip,
}

impl From<CompressionArg> for CompressionType {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Zip => Self::Zip,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum IntegrityArg {
    None,
    Hmac,
}

impl From<IntegrityArg> for IntegrityType {
    fn from(arg: IntegrityArg) -> Self {
        match arg {
            IntegrityArg::None => Self::None,
            IntegrityArg::Hmac => Self::Hmac,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WriterTypeArg {
    Stdout,
    File,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReaderTypeArg {
    File,
    Stdin,
    Flag,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Plaintext,
    Json,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Plaintext => Self::Plaintext,
            FormatArg::Json => Self::Json,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let code = match cli.command {
        Commands::Seal(args) => run_seal(args),
        Commands::Unseal(args) => run_unseal(args),
        Commands::Reseal(args) => run_reseal(args),
        Commands::Container {
            action: ContainerAction::Info(args),
        } => run_info(args),
        Commands::Version => {
            println!(
                "tvault-core:\n- cli = v{}\n- container = v{}\n- token = v{}",
                CLI_VERSION,
                tvault_container::VERSION,
                tvault_ops::TOKEN_VERSION,
            );
            0
        }
        Commands::Info => {
            println!(
                "Trust Vault\n\n\
                 application info:\n\
                 - encryption: AES-256-GCM with PBKDF2-HMAC-SHA256\n\
                 - secret sharing: Shamir's Secret Sharing over GF(2^8)\n\
                 - integrity provider: HMAC-SHA256\n\
                 - compression type: ZIP"
            );
            0
        }
    };

    std::process::exit(code);
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ── Command runners ───────────────────────────────────────────────────────────

fn run_seal(args: SealArgs) -> i32 {
    let log_sink = args.log_writer.to_sink();

    let passphrase = match resolve_passphrase(args.passphrase, true, Category::Seal) {
        Ok(p) => p,
        Err(err) => return report_error("seal", &log_sink, &err),
    };

    let opts = SealOptions {
        folder_path: args.folder_path,
        new_path: args.new_path,
        passphrase,
        token_type: args.token_type.into(),
        compression_type: args.compression_type.into(),
        integrity_type: args.integrity_type.into(),
        integrity_passphrase: args.integrity_new_passphrase.map(SecretString::from),
        shares: args.shares,
        threshold: args.threshold,
        token_sink: args.token_writer.to_sink(),
    };

    finish("seal", &log_sink, tvault_ops::seal(&opts).map(|_| ()))
}

fn run_unseal(args: UnsealArgs) -> i32 {
    let log_sink = args.log_writer.to_sink();

    let passphrase = match passphrase_for_existing(
        args.passphrase,
        args.current_path.as_deref(),
        Category::Unseal,
    ) {
        Ok(p) => p,
        Err(err) => return report_error("unseal", &log_sink, &err),
    };

    let opts = UnsealOptions {
        current_path: args.current_path,
        folder_path: args.folder_path,
        passphrase,
        integrity_passphrase: args.integrity_current_passphrase.map(SecretString::from),
        token_source: args.token_reader.to_source(),
    };

    finish("unseal", &log_sink, tvault_ops::unseal(&opts))
}

fn run_reseal(args: ResealArgs) -> i32 {
    let log_sink = args.log_writer.to_sink();

    let passphrase = match passphrase_for_existing(
        args.passphrase,
        args.current_path.as_deref(),
        Category::Reseal,
    ) {
        Ok(p) => p,
        Err(err) => return report_error("reseal", &log_sink, &err),
    };

    let opts = ResealOptions {
        current_path: args.current_path,
        new_path: args.new_path,
        folder_path: args.folder_path,
        passphrase,
        name: args.name,
        comment: args.comment,
        tags: args.tags.as_deref().map(parse_tags),
        integrity_current_passphrase: args.integrity_current_passphrase.map(SecretString::from),
        integrity_new_passphrase: args.integrity_new_passphrase.map(SecretString::from),
        token_source: args.token_reader.to_source(),
        token_sink: args.token_writer.to_sink(),
    };

    finish("reseal", &log_sink, tvault_ops::reseal(&opts).map(|_| ()))
}

fn run_info(args: InfoArgs) -> i32 {
    let log_sink = args.log_writer.to_sink();

    let opts = InfoOptions {
        path: args.path,
        info_sink: TokenSink {
            target: sink_target(args.info_writer_type, args.info_writer_path),
            format: args.info_writer_format.into(),
        },
    };

    finish("container info", &log_sink, tvault_ops::info(&opts))
}

fn finish(operation: &str, log_sink: &TokenSink, result: VaultResult<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => report_error(operation, log_sink, &err),
    }
}

// ── Passphrase prompts ────────────────────────────────────────────────────────

/// Uses the flag value, or prompts on a terminal. Seal confirms the
/// passphrase; other operations take it as-is.
fn resolve_passphrase(
    flag: Option<String>,
    confirm: bool,
    category: Category,
) -> Result<Option<SecretString>, VaultError> {
    if let Some(p) = flag {
        return Ok(Some(SecretString::from(p)));
    }
    if !std::io::stdin().is_terminal() {
        return Ok(None);
    }

    let prompt_err = |e: std::io::Error| {
        VaultError::io(
            category,
            tvault_core::codes::READER_READ,
            "failed to read passphrase from terminal",
        )
        .wrap(e)
    };

    let passphrase = rpassword::prompt_password("Container passphrase: ").map_err(prompt_err)?;
    if confirm {
        let again = rpassword::prompt_password("Confirm passphrase: ").map_err(prompt_err)?;
        if passphrase != again {
            return Err(VaultError::validation(
                category,
                tvault_core::codes::PASSPHRASE_REQUIRED,
                "passphrases do not match",
                "enter the same passphrase twice",
            ));
        }
    }

    Ok(Some(SecretString::from(passphrase)))
}

/// For unseal/reseal the passphrase is only needed when the container was
/// sealed with token type none; peek at the header before prompting.
fn passphrase_for_existing(
    flag: Option<String>,
    container_path: Option<&std::path::Path>,
    category: Category,
) -> Result<Option<SecretString>, VaultError> {
    if flag.is_some() {
        return resolve_passphrase(flag, false, category);
    }

    let Some(path) = container_path else {
        return Ok(None);
    };
    match tvault_container::Container::read_info(path) {
        Ok((header, _)) if header.token_type == TokenType::None => {
            resolve_passphrase(None, false, category)
        }
        // unreadable containers fail later with a proper error
        _ => Ok(None),
    }
}

// ── Writer/reader wiring ──────────────────────────────────────────────────────

fn sink_target(ty: WriterTypeArg, path: Option<PathBuf>) -> SinkTarget {
    match ty {
        WriterTypeArg::Stdout => SinkTarget::Stdout,
        WriterTypeArg::File => SinkTarget::File(path.unwrap_or_default()),
    }
}

impl TokenWriterArgs {
    fn to_sink(&self) -> TokenSink {
        TokenSink {
            target: sink_target(self.token_writer_type, self.token_writer_path.clone()),
            format: self.token_writer_format.into(),
        }
    }
}

impl LogWriterArgs {
    fn to_sink(&self) -> TokenSink {
        TokenSink {
            target: sink_target(self.log_writer_type, self.log_writer_path.clone()),
            format: self.log_writer_format.into(),
        }
    }
}

impl TokenReaderArgs {
    fn to_source(&self) -> Option<Source> {
        let format = self.token_reader_format.into();
        match self.token_reader_type {
            ReaderTypeArg::Stdin => Some(Source::new(SourceTarget::Stdin, format)),
            ReaderTypeArg::File => self
                .token_reader_path
                .clone()
                .map(|path| Source::new(SourceTarget::File(path), format)),
            ReaderTypeArg::Flag => self
                .token_reader_flag
                .clone()
                .map(|flag| Source::new(SourceTarget::Flag(flag), format)),
        }
    }
}

/// Comma-separated tags, trimmed, empties dropped.
fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

// ── Error reporting ───────────────────────────────────────────────────────────

/// Writes the formatted error through the log-writer and returns the
/// process exit code.
fn report_error(operation: &str, log_sink: &TokenSink, err: &VaultError) -> i32 {
    debug!(operation, error = %err, "operation failed");

    let written = Sink::open(&log_sink.target, log_sink.format, err.category).and_then(|mut sink| {
        match log_sink.format {
            Format::Plaintext => sink.write_text(err.category, &err.render_plaintext(operation)),
            Format::Json => sink.write_json(err.category, err),
        }
    });
    if written.is_err() {
        eprintln!("{}", err.render_plaintext(operation));
    }

    if cfg!(debug_assertions) {
        eprintln!("{}", std::backtrace::Backtrace::force_capture());
    }

    1
}
