//! ghostvault: one-time secret sharing client
//!
//! Commands:
//!   create [<message>]   - encrypt a message (and attachments) and print its share link
//!   open <url>           - fetch, decrypt, and burn a shared secret
//!   keygen               - print a freshly generated link key
//!   config show          - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use gv_core::config::GvConfig;
use gv_core::limits::{MAX_ATTACHMENTS, MIN_PASSWORD_CHARS};
use gv_core::{Locator, PlainFile, PlainSecret};
use gv_crypto::{
    generate_key, FieldCipher, KdfParams, SecretAssembler, SymmetricKey, DEFAULT_KEY_LENGTH,
};
use gv_session::{ErrorKind, RetrievalSession, SessionState};
use gv_storage::{build_from_core_config, SecretStore};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "ghostvault",
    version,
    about = "Zero-knowledge, burn-on-read secret sharing",
    long_about = "ghostvault: encrypt secrets locally, share them as one-time links"
)]
struct Cli {
    /// Path to ghostvault.toml configuration file
    #[arg(long, short = 'c', env = "GV_CONFIG", default_value = "ghostvault.toml")]
    config: PathBuf,

    /// Secrets API credential (overrides api.api_key)
    #[arg(long, env = "GV_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Log level (trace, debug, info, warn, error); defaults to log.level
    #[arg(long, env = "GV_LOG", global = true)]
    log: Option<String>,

    /// Log format; defaults to log.format
    #[arg(long, env = "GV_LOG_FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a secret, store it, and print the share link
    ///
    /// The message is read from stdin when not given on the command line.
    Create {
        /// Message text (up to 1000 characters)
        message: Option<String>,
        /// Attach a file (repeatable, at most 3)
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,
        /// Hours until the secret expires (1-168, default: share.default_ttl_hours)
        #[arg(long)]
        ttl: Option<u32>,
        /// Protect with a password instead of a key in the link
        #[arg(long, short = 'p')]
        password: bool,
    },

    /// Fetch and decrypt a secret. The secret is destroyed on the server.
    Open {
        /// Share link (https://…/s/<id>#<key>)
        url: String,
        /// Directory to write attachments into
        #[arg(long, short = 'o', default_value = ".")]
        out: PathBuf,
    },

    /// Print a random link key
    Keygen {
        #[arg(long, short = 'l', default_value_t = DEFAULT_KEY_LENGTH)]
        length: usize,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Read before logging is up (the file picks the log level); the
    // missing-file warning is emitted once the subscriber exists.
    let loaded = read_config(&cli.config)?;
    let config_found = loaded.is_some();
    let mut config = loaded.unwrap_or_default();
    if let Some(key) = cli.api_key {
        config.api.api_key = key;
    }

    let level = cli.log.as_deref().unwrap_or(&config.log.level);
    let format = match cli.log_format {
        Some(format) => format,
        None => LogFormat::from_str(&config.log.format, true)
            .map_err(|e| anyhow::anyhow!("log.format: {e}"))?,
    };
    init_logging(level, &format);
    if !config_found {
        tracing::warn!(
            "config file not found: {}  (using defaults)",
            cli.config.display()
        );
    }
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        api = %config.api.base_url,
        "ghostvault starting"
    );

    match cli.command {
        Commands::Create { message, files, ttl, password } => {
            cmd_create(&config, message, &files, ttl, password).await
        }
        Commands::Open { url, out } => cmd_open(&config, &url, &out).await,
        Commands::Keygen { length } => cmd_keygen(length),
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
    }
}

fn read_config(path: &Path) -> Result<Option<GvConfig>> {
    GvConfig::read(path).with_context(|| format!("loading config {}", path.display()))
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries links and plaintext; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── `ghostvault create` ───────────────────────────────────────────────────────

async fn cmd_create(
    config: &GvConfig,
    message: Option<String>,
    files: &[PathBuf],
    ttl: Option<u32>,
    password: bool,
) -> Result<()> {
    if files.len() > MAX_ATTACHMENTS {
        anyhow::bail!("at most {MAX_ATTACHMENTS} files can be attached");
    }

    let message = match message {
        Some(m) => m,
        None if files.is_empty() => read_stdin()?,
        None => String::new(),
    };

    let mut secret = PlainSecret::new(message);
    for path in files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime_for(path);
        secret = secret.with_attachment(PlainFile::new(name, mime, bytes));
    }

    let key = if password {
        prompt_new_password()?
    } else {
        generate_key(DEFAULT_KEY_LENGTH)
    };
    let ttl_hours = ttl.unwrap_or(config.share.default_ttl_hours);

    let cipher = FieldCipher::new(KdfParams::from_config(&config.crypto))
        .context("invalid [crypto] parameters")?;
    let payload =
        SecretAssembler::new(cipher).build(&secret, &key, key.requires_password(), ttl_hours)?;

    let store = build_from_core_config(&config.api)?;
    let handle = store.create(&payload).await.context("storing secret")?;

    let url = Locator::share_url(&config.share.public_url, &handle, key.expose());
    println!("{url}");
    eprintln!("  expires: {}", handle.expires_at.format("%Y-%m-%d %H:%M UTC"));
    if handle.requires_password {
        eprintln!("  password protected: share the password through another channel");
    }
    eprintln!("  the link works once, then the secret is destroyed");
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut message = String::new();
    std::io::stdin()
        .read_to_string(&mut message)
        .context("reading message from stdin")?;
    let trimmed = message.trim_end_matches(['\r', '\n']).len();
    message.truncate(trimmed);
    Ok(message)
}

fn prompt_new_password() -> Result<SymmetricKey> {
    let password = rpassword::prompt_password("Password: ").context("reading password")?;
    let confirm = rpassword::prompt_password("Confirm password: ").context("reading password")?;
    if password != confirm {
        anyhow::bail!("passwords do not match");
    }
    SymmetricKey::password(password)
        .with_context(|| format!("password must be at least {MIN_PASSWORD_CHARS} characters"))
}

/// Best-effort MIME type from the file extension; empty means unknown.
fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("txt" | "log" | "env") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("pem" | "crt" | "cer") => "application/x-pem-file",
        _ => "",
    }
}

// ── `ghostvault open` ─────────────────────────────────────────────────────────

async fn cmd_open(config: &GvConfig, url: &str, out: &Path) -> Result<()> {
    let store = build_from_core_config(&config.api)?;
    let mut session = RetrievalSession::from_url(url);
    session.start(&store).await;

    loop {
        match session.state() {
            SessionState::PasswordRequired { error } => {
                if let Some(e) = error {
                    eprintln!("{}", e.user_message());
                }
                let password = rpassword::prompt_password("Password: ").context("reading password")?;
                session.submit_password(&password);
            }
            SessionState::Revealed(secret) => {
                if !secret.message().is_empty() {
                    println!("{}", secret.message());
                }
                let files = secret.files();
                let results = save_attachments(out, files.iter().map(|f| (f.name(), f.bytes())));
                let mut failed = 0usize;
                for (file, result) in files.iter().zip(results) {
                    match result {
                        Ok(path) => {
                            eprintln!("  saved: {} ({})", path.display(), file.display_size())
                        }
                        Err(e) => {
                            failed += 1;
                            eprintln!("  not saved: {:?}: {e:#}", file.name());
                        }
                    }
                }
                eprintln!("This secret has been destroyed on the server.");
                if failed > 0 {
                    anyhow::bail!("{failed} of {} attachments could not be saved", files.len());
                }
                return Ok(());
            }
            SessionState::Failed(kind) => {
                if matches!(kind, ErrorKind::Transport | ErrorKind::Server) {
                    eprintln!("The secret may still exist; retry with the same link.");
                }
                anyhow::bail!("{}", kind.user_message());
            }
            SessionState::Loading => anyhow::bail!("secret fetch did not complete"),
        }
    }
}

/// Highest ` (n)` suffix tried before a name collision is given up on.
const MAX_NAME_SUFFIX: usize = 99;

/// Write every revealed attachment under `dir`. Each failure is reported
/// on its own; the server copy is already gone, so one bad file must not
/// cost the others.
fn save_attachments<'a, I>(dir: &Path, files: I) -> Vec<Result<PathBuf>>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    files
        .into_iter()
        .enumerate()
        .map(|(index, (name, bytes))| write_attachment(dir, index, name, bytes))
        .collect()
}

/// Write one attachment under `dir`, never outside it and never over an
/// existing file. A name with no usable file name becomes
/// `attachment-<n>`; a taken name gets a ` (n)` suffix.
fn write_attachment(dir: &Path, index: usize, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let base = safe_file_name(name).unwrap_or_else(|| format!("attachment-{}", index + 1));

    for n in 0..=MAX_NAME_SUFFIX {
        let path = match n {
            0 => dir.join(&base),
            n => dir.join(numbered(&base, n)),
        };
        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e).with_context(|| format!("creating {}", path.display())),
        };
        file.write_all(bytes)
            .with_context(|| format!("writing {}", path.display()))?;
        return Ok(path);
    }
    anyhow::bail!("no free file name for {base:?} in {}", dir.display())
}

fn safe_file_name(name: &str) -> Option<String> {
    let base = Path::new(name).file_name()?.to_str()?;
    Some(base.to_string())
}

/// `report.pdf` → `report (2).pdf`; dotfiles and extensionless names get
/// the suffix at the end.
fn numbered(base: &str, n: usize) -> String {
    match base.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({n}){}", &base[..dot], &base[dot..]),
        _ => format!("{base} ({n})"),
    }
}

// ── `ghostvault keygen` ───────────────────────────────────────────────────────

fn cmd_keygen(length: usize) -> Result<()> {
    if length == 0 {
        anyhow::bail!("key length must be positive");
    }
    println!("{}", generate_key(length).expose());
    Ok(())
}

// ── `ghostvault config show` ──────────────────────────────────────────────────

fn cmd_config_show(config: &GvConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();

    let mut shown = config.clone();
    if !shown.api.api_key.is_empty() {
        shown.api.api_key = "<redacted>".into();
    }
    let rendered = toml::to_string_pretty(&shown).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_create_args() {
        let cli = Cli::try_parse_from([
            "ghostvault", "create", "hi", "-f", "a.txt", "--file", "b.png", "--ttl", "2", "-p",
        ])
        .unwrap();
        match cli.command {
            Commands::Create { message, files, ttl, password } => {
                assert_eq!(message.as_deref(), Some("hi"));
                assert_eq!(files.len(), 2);
                assert_eq!(ttl, Some(2));
                assert!(password);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_missing_config_is_reported_not_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_config(&dir.path().join("ghostvault.toml")).unwrap().is_none());
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for(Path::new("notes.TXT")), "text/plain");
        assert_eq!(mime_for(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("id_ed25519")), "");
    }

    #[test]
    fn test_write_attachment_stays_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_attachment(dir.path(), 0, "../../etc/passwd", b"x").unwrap();
        assert_eq!(path, dir.path().join("passwd"));
        assert_eq!(std::fs::read(&path).unwrap(), b"x");
    }

    #[test]
    fn test_write_attachment_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        write_attachment(dir.path(), 0, "a.txt", b"first").unwrap();
        let second = write_attachment(dir.path(), 1, "a.txt", b"second").unwrap();

        assert_eq!(second, dir.path().join("a (1).txt"));
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"first");
        assert_eq!(std::fs::read(second).unwrap(), b"second");
    }

    #[test]
    fn test_unsafe_names_get_generated_names() {
        let dir = tempfile::tempdir().unwrap();
        for (index, name) in ["..", ".", "", "/"].into_iter().enumerate() {
            let path = write_attachment(dir.path(), index, name, b"x").unwrap();
            assert_eq!(path, dir.path().join(format!("attachment-{}", index + 1)));
        }
    }

    #[test]
    fn test_unsafe_first_attachment_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let files: [(&str, &[u8]); 3] = [(".", b"one"), ("two.txt", b"two"), ("two.txt", b"three")];

        let results = save_attachments(dir.path(), files);
        let paths: Vec<PathBuf> = results.into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(
            paths,
            [
                dir.path().join("attachment-1"),
                dir.path().join("two.txt"),
                dir.path().join("two (1).txt"),
            ]
        );
        assert_eq!(std::fs::read(&paths[2]).unwrap(), b"three");
    }

    #[test]
    fn test_save_attachments_reports_each_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let files: [(&str, &[u8]); 2] = [("a.txt", b"a"), ("b.txt", b"b")];

        let results = save_attachments(&missing, files);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_err()));
    }

    #[test]
    fn test_numbered() {
        assert_eq!(numbered("report.pdf", 2), "report (2).pdf");
        assert_eq!(numbered("archive.tar.gz", 1), "archive.tar (1).gz");
        assert_eq!(numbered(".env", 1), ".env (1)");
        assert_eq!(numbered("README", 3), "README (3)");
    }
}
