use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use playforge::{Network, Project, TimeMs, export_bundle};

#[derive(Parser, Debug)]
#[command(name = "playforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a project document.
    Validate(ValidateArgs),
    /// Export a self-contained playable-ad bundle.
    Export(ExportArgs),
    /// List the modifications active at a given playback time.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output archive path.
    #[arg(long)]
    out: PathBuf,

    /// Ad network to target.
    #[arg(long, value_enum, default_value_t = NetworkChoice::Web)]
    network: NetworkChoice,

    /// Directory asset sources resolve against (defaults to the project
    /// file's directory).
    #[arg(long)]
    assets_root: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Playback time in milliseconds.
    #[arg(long)]
    at: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NetworkChoice {
    Web,
    Mintegral,
}

impl From<NetworkChoice> for Network {
    fn from(choice: NetworkChoice) -> Self {
        match choice {
            NetworkChoice::Web => Self::Web,
            NetworkChoice::Mintegral => Self::Mintegral,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Export(args) => cmd_export(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn read_project(path: &Path) -> anyhow::Result<Project> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("open project '{}'", path.display()))?;
    let project = Project::from_json_str(&text).with_context(|| "parse project JSON")?;
    Ok(project)
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let project = read_project(&args.in_path)?;
    project.validate()?;
    println!(
        "ok: '{}' with {} modification(s)",
        project.general.ad_name,
        project.modifications.len()
    );
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let project = read_project(&args.in_path)?;
    let assets_root = match &args.assets_root {
        Some(dir) => dir.clone(),
        None => args
            .in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
    };

    let bundle = export_bundle(&project, &assets_root, args.network.into())?;
    bundle.write_zip(&args.out)?;

    println!(
        "exported '{}' for {} -> {}",
        project.general.ad_name,
        bundle.network,
        args.out.display()
    );
    for file in &bundle.files {
        println!("  {} ({} bytes)", file.path, file.bytes.len());
    }
    println!("fingerprint: {}", bundle.fingerprint);
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let project = read_project(&args.in_path)?;
    project.validate()?;

    let t = TimeMs(args.at);
    let mut any = false;
    for m in &project.modifications {
        let active = match m.kind {
            playforge::ModificationKind::Break { time, .. } => {
                time.abs_diff(t) <= playforge::BREAK_TOLERANCE_MS
            }
            playforge::ModificationKind::Overlay { .. } => {
                m.overlay_range().is_some_and(|r| r.contains(t))
            }
            playforge::ModificationKind::EndScreen { time } => time.0 <= t.0,
        };
        if active {
            any = true;
            println!("{} ({:?})", m.id, m.kind);
        }
    }
    if !any {
        println!("no modification active at {}ms", args.at);
    }
    Ok(())
}
