//! Packwright - Minecraft modpack installer

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use packwright::installer::{self, InstallRequest, ModpackInstaller, ModpackUpdater};
use packwright::process::{detect_running_minecraft, McProcessRunning};
use packwright::profiles::types::format_time;
use packwright::{paths, Keeplist, ProfileRecord, ProgressCallback};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "packwright")]
#[command(version)]
#[command(about = "Install and update Minecraft modpacks as launcher profiles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The .minecraft directory (defaults to the launcher's own)
    #[arg(long, global = true, env = "PACKWRIGHT_MINECRAFT_DIR")]
    minecraft_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a modpack as a new launcher profile
    Install {
        /// Path to the modpack zip
        modpack: PathBuf,

        /// Profile name (random if not given)
        #[arg(long)]
        name: Option<String>,

        /// Profile icon (random block if not given)
        #[arg(long)]
        icon: Option<String>,

        /// Profile id (random if not given)
        #[arg(long)]
        id: Option<String>,

        /// Directory to install into (must be empty or missing)
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Update an installed profile from a newer modpack
    #[command(alias = "upgrade")]
    Update {
        /// Id of the profile to update
        profile_id: String,

        /// Path to the modpack zip
        modpack: PathBuf,

        /// Extra keep pattern (regex on the relative path), on top of the defaults
        #[arg(long = "keep", value_name = "PATTERN")]
        keep: Vec<String>,
    },

    /// List installed modpack profiles
    List {
        /// Print CSV instead of YAML, optionally with a custom delimiter
        #[arg(long, value_name = "DELIM", num_args = 0..=1, default_missing_value = ",")]
        csv: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging only if verbose or RUST_LOG is set
    if cli.verbose || std::env::var("RUST_LOG").is_ok() {
        let directive = if cli.verbose {
            "packwright=debug"
        } else {
            "packwright=warn"
        };
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
            .init();
    }

    let dot_minecraft = paths::resolve_dot_minecraft(cli.minecraft_dir.as_deref())?;
    debug!("Using .minecraft at {}", dot_minecraft.display());

    match cli.command {
        Commands::Install {
            modpack,
            name,
            icon,
            id,
            dest,
        } => {
            warn_if_running();
            let bar = progress_bar();
            let mut installer = ModpackInstaller::new(&modpack, &dot_minecraft)?
                .with_progress(progress_callback(&bar));
            let request = InstallRequest {
                id,
                name,
                icon,
                destination: dest,
            };
            let result = installer.install(&request);
            bar.finish_and_clear();
            let profile = result.with_context(|| format!("Failed to install {}", modpack.display()))?;

            println!("Installed {}", modpack.display());
            print_yaml(&[profile]);
        }

        Commands::Update {
            profile_id,
            modpack,
            keep,
        } => {
            let keeplist = Keeplist::default().with_patterns(&keep)?;
            warn_if_running();
            let bar = progress_bar();
            let mut updater = ModpackUpdater::new(&profile_id, &modpack, &dot_minecraft)?
                .with_keeplist(keeplist)
                .with_progress(progress_callback(&bar));
            let result = updater.update();
            bar.finish_and_clear();
            let summary = result.with_context(|| format!("Failed to update profile {profile_id}"))?;

            println!("Updated profile {profile_id}");
            println!("Replaced:  {} files", summary.replaced);
            println!("Extracted: {} files", summary.extracted);
            println!("Backup:    {}", summary.backup_path.display());
        }

        Commands::List { csv } => {
            let profiles = installer::installed_profiles(&dot_minecraft)?;
            match csv {
                Some(delimiter) => print_csv(&profiles, &delimiter),
                None => print_yaml(&profiles),
            }
        }
    }

    Ok(())
}

fn warn_if_running() {
    let running = detect_running_minecraft();
    let what = match running {
        McProcessRunning::None => return,
        McProcessRunning::Launcher => "the Minecraft launcher is",
        McProcessRunning::Game => "Minecraft is",
        McProcessRunning::LauncherAndGame => "Minecraft and its launcher are",
    };
    warn!("Detected {:?}", running);
    eprintln!("WARNING: {what} running. Close it first or your changes may be overwritten.");
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% | {msg}")
    {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}

fn progress_callback(bar: &ProgressBar) -> ProgressCallback {
    let bar = bar.clone();
    Arc::new(move |update| {
        bar.set_position(u64::from(update.percent));
        bar.set_message(update.stage.label());
    })
}

fn path_text(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.display().to_string())
}

/// Profile fields in display order, without the id.
fn fields(profile: &ProfileRecord) -> [(&'static str, Option<String>); 8] {
    [
        ("name", profile.name.clone()),
        ("type", profile.profile_type.clone()),
        ("icon", profile.icon.clone()),
        ("version", profile.version.clone()),
        ("game_path", path_text(profile.game_path.as_deref())),
        ("java_path", path_text(profile.java_path.as_deref())),
        ("created_time", profile.created_time.map(format_time)),
        ("last_used_time", profile.last_used_time.map(format_time)),
    ]
}

fn yaml_scalar(value: Option<&str>) -> String {
    match value {
        // JSON strings are valid YAML double-quoted scalars
        Some(text) => serde_json::Value::from(text).to_string(),
        None => "null".to_string(),
    }
}

fn print_yaml(profiles: &[ProfileRecord]) {
    for profile in profiles {
        println!("{}:", yaml_scalar(Some(&profile.id)));
        for (key, value) in fields(profile) {
            println!("  {key}: {}", yaml_scalar(value.as_deref()));
        }
    }
}

fn csv_cell(value: &str, delimiter: &str) -> String {
    let has_delimiter = !delimiter.is_empty() && value.contains(delimiter);
    if has_delimiter || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn print_csv(profiles: &[ProfileRecord], delimiter: &str) {
    let header = [
        "ID",
        "Name",
        "Type",
        "Icon",
        "Version",
        "Game Path",
        "Java Path",
        "Created",
        "Last Used",
    ];
    println!("{}", header.join(delimiter));
    for profile in profiles {
        let mut row = vec![csv_cell(&profile.id, delimiter)];
        row.extend(
            fields(profile)
                .into_iter()
                .map(|(_, value)| csv_cell(value.as_deref().unwrap_or_default(), delimiter)),
        );
        println!("{}", row.join(delimiter));
    }
}
