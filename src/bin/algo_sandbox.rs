//! Local node management and inspection.
//!
//! `make-node` lays out a private network from an embedded template via
//! `goal network create`; `run-node` starts or stops its daemons; `status`
//! queries a running daemon through its data directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use algo_transport::config;

const NETWORK_PRIVATE: &str = include_str!("../data/network_private.json");
const NETWORK_PRIVATE_DEV: &str = include_str!("../data/network_private_dev.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Network {
    /// A private network running the production consensus cadence.
    Private,
    /// A private network in dev mode: one wallet, a block per transaction,
    /// and the developer API enabled.
    PrivateDev,
}

impl Network {
    fn name(self) -> &'static str {
        match self {
            Network::Private => "private",
            Network::PrivateDev => "private_dev",
        }
    }

    fn template(self) -> &'static str {
        match self {
            Network::Private => NETWORK_PRIVATE,
            Network::PrivateDev => NETWORK_PRIVATE_DEV,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum NodeAction {
    Start,
    Stop,
}

impl NodeAction {
    fn name(self) -> &'static str {
        match self {
            NodeAction::Start => "start",
            NodeAction::Stop => "stop",
        }
    }
}

#[derive(Parser)]
#[command(name = "algo-sandbox", about = "Manage local Algorand networks for development")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a private network's data directories.
    MakeNode {
        network: Network,
        /// Directory the network is created under.
        #[arg(long, default_value = "/var/lib/algorand/nets")]
        path: PathBuf,
        /// Replace an existing network without prompting.
        #[arg(short, long)]
        force: bool,
    },
    /// Start or stop a private network's node and wallet daemons.
    RunNode {
        /// The network directory created by make-node.
        path: PathBuf,
        action: NodeAction,
    },
    /// Print the status of the daemon at a node data directory.
    Status {
        /// Defaults to the ALGORAND_DATA environment variable.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn run(program: &str, args: &[&str]) -> Result<()> {
    info!(program, ?args, "running");
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("running {}", program))?;
    if !status.success() {
        bail!("{} exited with {}", program, status);
    }
    Ok(())
}

fn confirm_overwrite() -> Result<bool> {
    print!("Overwrite [y/n]? ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim() == "y")
}

fn make_node(network: Network, path: &Path, force: bool) -> Result<()> {
    let root = path.join(network.name());

    if root.is_dir() {
        if !force && !confirm_overwrite()? {
            println!("Aborting");
            return Ok(());
        }
        fs::remove_dir_all(&root)
            .with_context(|| format!("removing {}", root.display()))?;
    }

    let template_dir = tempfile::tempdir().context("creating template directory")?;
    let template = template_dir.path().join(format!("network_{}.json", network.name()));
    fs::write(&template, network.template())
        .with_context(|| format!("writing {}", template.display()))?;

    run(
        "goal",
        &[
            "network",
            "create",
            "--rootdir",
            &root.to_string_lossy(),
            "--network",
            network.name(),
            "--template",
            &template.to_string_lossy(),
        ],
    )?;

    if network == Network::PrivateDev {
        // dry runs and TEAL compilation need the developer API
        let primary = root.join("Primary");
        run(
            "algocfg",
            &[
                "-d",
                &primary.to_string_lossy(),
                "set",
                "-p",
                "EnableDeveloperAPI",
                "-v",
                "true",
            ],
        )?;
    }
    Ok(())
}

fn run_node(path: &Path, action: NodeAction) -> Result<()> {
    let network = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if !matches!(network, "private" | "private_dev") {
        bail!("network path must end in private or private_dev, got: {}", path.display());
    }
    let primary = path.join("Primary");
    run("goal", &["-d", &primary.to_string_lossy(), "node", action.name()])?;
    run("goal", &["-d", &primary.to_string_lossy(), "kmd", action.name()])?;
    Ok(())
}

fn status(data_dir: Option<PathBuf>) -> Result<()> {
    let data_dir = data_dir
        .or_else(config::data_dir_from_env)
        .context("no data directory given and ALGORAND_DATA is not set")?;
    let client = config::algod_from_data_dir(&data_dir)?;
    let status = client.status()?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Commands::MakeNode { network, path, force } => make_node(network, &path, force),
        Commands::RunNode { path, action } => run_node(&path, action),
        Commands::Status { data_dir } => status(data_dir),
    }
}
