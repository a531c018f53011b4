//! passkeeper - Local credential store
//!
//! Per-service secrets, each value encrypted on its own.
//!
//! Commands:
//! - list: List key names for a service (default)
//! - show <KEY>: Print a decrypted value
//! - add <KEY> [VALUE]: Store a value (prompts if no value)
//! - remove <KEY>: Delete a value
//! - decrypt: Export the service to a plaintext scratch file
//! - encrypt: Re-import the scratch file into the store

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use passkeeper::{ensure_key, init_storage, Store};
use passkeeper_core::{Config, Paths};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "passkeeper")]
#[command(about = "Local credential store - per-service secrets encrypted value by value")]
#[command(version)]
#[command(after_help = r#"FILES (relative to --root, default: current directory):
    secret.key                      Encryption key, created on first run
    passwords/<service>.txt         Encrypted store, one name:value per line
    passwords/<service>-decrypt.txt Plaintext scratch copy (decrypt/encrypt)

BULK EDITING:
    passkeeper -s github decrypt    Write the plaintext scratch copy
    $EDITOR passwords/github-decrypt.txt
    passkeeper -s github encrypt --purge

SECURITY:
    - Values are encrypted with XChaCha20-Poly1305, one random nonce each
    - The key file is not password protected; guard it like the secrets
    - Do not run two commands against the same service at once"#)]
struct Cli {
    /// Service name (e.g., github)
    #[arg(short, long)]
    service: String,

    /// Directory holding the key file and the passwords directory
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored key names (values hidden)
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Decrypt and print a value
    Show {
        /// Don't print trailing newline (useful for piping)
        #[arg(short = 'n')]
        no_newline: bool,
        /// Key name (e.g., username, password)
        key: String,
    },

    /// Store a value, replacing any previous one (prompts if value not provided)
    Add {
        /// Key name (e.g., username, password)
        key: String,
        /// Value (omit for secure hidden prompt)
        value: Option<String>,
    },

    /// Delete a value
    Remove {
        /// Key name to delete
        key: String,
    },

    /// Export the service to its plaintext scratch file for editing
    Decrypt,

    /// Re-encrypt the plaintext scratch file into the store
    Encrypt {
        /// Delete the plaintext scratch file afterwards
        #[arg(long)]
        purge: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// One-line report: `error: <context>: <cause>: ...`
fn error_message(err: &anyhow::Error) -> String {
    format!("error: {:#}", err)
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?.with_root(cli.root);
    let paths = Paths::from_config(&config);

    init_storage(&paths, &cli.service)
        .with_context(|| format!("Failed to initialize storage for '{}'", cli.service))?;
    let key = ensure_key(&paths.key_file).context("Failed to load encryption key")?;
    let store = Store::new(paths, key);

    let service = cli.service.as_str();
    match cli.command {
        Some(Commands::List { json }) => cmd_list(&store, service, json),
        Some(Commands::Show { no_newline, key }) => cmd_show(&store, service, &key, no_newline),
        Some(Commands::Add { key, value }) => cmd_add(&store, service, &key, value),
        Some(Commands::Remove { key }) => cmd_remove(&store, service, &key),
        Some(Commands::Decrypt) => cmd_decrypt(&store, service),
        Some(Commands::Encrypt { purge }) => cmd_encrypt(&store, service, purge),
        None => {
            // Default to listing keys
            cmd_list(&store, service, false)
        }
    }
}

/// List key names
fn cmd_list(store: &Store, service: &str, json: bool) -> Result<()> {
    let names = store.list_keys(service)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    for name in &names {
        println!("{}", name);
    }

    Ok(())
}

/// Print a decrypted value
fn cmd_show(store: &Store, service: &str, key: &str, no_newline: bool) -> Result<()> {
    let value = store.get_value(service, key)?;

    if no_newline {
        print!("{}", value);
    } else {
        println!("{}", value);
    }

    Ok(())
}

/// Store a value
fn cmd_add(store: &Store, service: &str, key: &str, value: Option<String>) -> Result<()> {
    if key.is_empty() {
        bail!("Key name required");
    }

    let secret_value = match value {
        Some(v) => v,
        None => rpassword::prompt_password(format!("Value for {}: ", key))
            .context("Failed to read value")?,
    };

    if secret_value.is_empty() {
        bail!("Empty value not allowed");
    }

    store.set_value(service, key, &secret_value)?;
    println!("success: Stored {} in {}", key, service);

    Ok(())
}

/// Delete a value
fn cmd_remove(store: &Store, service: &str, key: &str) -> Result<()> {
    if store.delete_value(service, key)? {
        println!("success: Removed {} from {}", key, service);
    } else {
        println!("warning: {} not found in {}", key, service);
    }
    Ok(())
}

/// Export to the plaintext scratch file
fn cmd_decrypt(store: &Store, service: &str) -> Result<()> {
    let count = store
        .export_plaintext(service)
        .context("Decryption aborted, nothing was written")?;

    println!(
        "success: Decrypted {} entries to {}",
        count,
        store.paths().scratch_file(service).display()
    );
    println!("Edit the file, then run: passkeeper -s {} encrypt --purge", service);

    Ok(())
}

/// Import from the plaintext scratch file
fn cmd_encrypt(store: &Store, service: &str, purge: bool) -> Result<()> {
    let count = store
        .import_plaintext(service)
        .context("Encryption aborted, store left unchanged")?;

    println!("success: Encrypted {} entries into {}", count, service);

    if purge && store.purge_plaintext(service)? {
        println!("Removed {}", store.paths().scratch_file(service).display());
    }

    Ok(())
}
