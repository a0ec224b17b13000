use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::LevelFilter;
use plank::archive::{self, CipherSpec, PackOptions, UnpackOptions};
use plank::crypto::{generate_key, parse_key_hex};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plank", about = "Pack files into a flat .plank container and back")]
struct Cli {
    /// Log offsets and per-file progress (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack one or more files into a .plank container
    Pack {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        #[command(flatten)]
        cipher: CipherArgs,
        /// Encrypt under a fresh random key and print it
        #[arg(long, conflicts_with_all = ["password", "key"])]
        generate_key: bool,
        /// Do not write the <output>.json manifest
        #[arg(long)]
        no_manifest: bool,
    },
    /// Unpack a .plank container
    Unpack {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
        #[command(flatten)]
        cipher: CipherArgs,
        /// Check every blob against the manifest before writing
        #[arg(long)]
        verify: bool,
        /// Name unnamed blobs by index only, without a sniffed extension
        #[arg(long)]
        no_sniff: bool,
    },
    /// List container records
    List {
        input: PathBuf,
        #[command(flatten)]
        cipher: CipherArgs,
    },
}

#[derive(Args)]
struct CipherArgs {
    /// Encrypt/decrypt the whole container with an Argon2id-derived key
    #[arg(short, long, conflicts_with = "key")]
    password: Option<String>,
    /// Encrypt/decrypt with a raw AES-256 key (64 hex characters)
    #[arg(short, long)]
    key: Option<String>,
}

impl CipherArgs {
    fn spec(&self) -> Result<Option<CipherSpec>, Box<dyn std::error::Error>> {
        Ok(match (&self.password, &self.key) {
            (Some(pwd), _)    => Some(CipherSpec::Password(pwd.clone())),
            (None, Some(key)) => Some(CipherSpec::Key(parse_key_hex(key)?)),
            (None, None)      => None,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {

        // ── Pack ─────────────────────────────────────────────────────────────
        Commands::Pack { output, input, cipher, generate_key: fresh, no_manifest } => {
            let cipher = if fresh {
                let key = generate_key();
                println!("Key:\t{}", hex::encode(key));
                Some(CipherSpec::Key(key))
            } else {
                cipher.spec()?
            };
            let opts = PackOptions { cipher, write_manifest: !no_manifest };
            let report = archive::pack_paths(&input, &output, &opts)?;
            for path in &input {
                println!("  packed  {}", path.display());
            }
            println!("Created: {} ({} blobs, {} bytes)",
                     report.container.display(), report.blobs, report.bytes);
            if let Some(m) = report.manifest {
                println!("Manifest: {}", m.display());
            }
        }

        // ── Unpack ───────────────────────────────────────────────────────────
        Commands::Unpack { input, output_dir, cipher, verify, no_sniff } => {
            let opts = UnpackOptions {
                cipher: cipher.spec()?,
                verify,
                sniff_extensions: !no_sniff,
            };
            for path in archive::unpack_path(&input, &output_dir, &opts)? {
                println!("  wrote   {}", path.display());
            }
            println!("Unpacked to: {}", output_dir.display());
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input, cipher } => {
            let entries = archive::inspect_path(&input, cipher.spec()?.as_ref())?;
            println!("Container: {}", input.display());
            println!("{:>5} {:>12} {:>12} {:>12} {:>6}  Name", "#", "Start", "End", "Size", "Type");
            for e in &entries {
                println!("{:>5} {:>#12x} {:>#12x} {:>12} {:>6}  {}",
                    e.index, e.start, e.end, e.size,
                    e.kind.unwrap_or("—"),
                    e.name.as_deref().unwrap_or("—"));
            }
            println!("{} record(s)", entries.len());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: bool) {
    let default_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}
