use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use nodectl::model::DeploymentCollection;
use nodectl::poll::ThreadSleeper;
use nodectl::{
    reconcile, DeletePollPolicy, DesiredState, HttpManagerClient, ManagerClient, ManagerConfig,
    ReconcileOptions,
};
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "nodectl")]
#[command(about = "Reconcile cluster-node VMs against a remote manager API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a desired-state file (deploy or delete cluster-node VMs)
    Apply {
        /// Desired-state JSON file (deployment_requests, clustering_config, state, node_id)
        #[arg(long, short = 'f')]
        file: PathBuf,
        #[command(flatten)]
        connection: ConnectionArgs,
        /// Report the would-be request without issuing mutating calls
        #[arg(long)]
        dry_run: bool,
        /// How deletion polling decides it is done
        #[arg(long, value_enum, default_value_t = DeletePollArg::UntilError)]
        delete_poll: DeletePollArg,
        /// Overall polling budget in seconds (default: poll until terminal)
        #[arg(long)]
        timeout: Option<u64>,
        /// Print the structured outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// List deployments currently known to the manager
    List {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[derive(clap::Args)]
struct ConnectionArgs {
    /// Manager hostname (falls back to NODECTL_HOST)
    #[arg(long)]
    host: Option<String>,
    /// Manager username (falls back to NODECTL_USERNAME)
    #[arg(long, short = 'u')]
    username: Option<String>,
    /// Manager password (falls back to NODECTL_PASSWORD)
    #[arg(long, short = 'p')]
    password: Option<String>,
    /// Skip TLS certificate validation
    #[arg(long)]
    insecure: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeletePollArg {
    /// Poll until the status endpoint errors (manager-compatible default)
    UntilError,
    /// Classify delete statuses like the create poller
    Strict,
}

impl From<DeletePollArg> for DeletePollPolicy {
    fn from(arg: DeletePollArg) -> Self {
        match arg {
            DeletePollArg::UntilError => DeletePollPolicy::UntilError,
            DeletePollArg::Strict => DeletePollPolicy::StrictStatus,
        }
    }
}

fn client_for(connection: ConnectionArgs) -> Result<HttpManagerClient> {
    let config = ManagerConfig::resolve(
        connection.host,
        connection.username,
        connection.password,
        !connection.insecure,
    )?;
    Ok(HttpManagerClient::new(&config)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            file,
            connection,
            dry_run,
            delete_poll,
            timeout,
            json,
        } => {
            let reader = File::open(&file)
                .with_context(|| format!("Failed to open state file: {}", file.display()))?;
            let state: DesiredState = serde_json::from_reader(reader)
                .with_context(|| format!("Invalid state file: {}", file.display()))?;

            let client = client_for(connection)?;
            let options = ReconcileOptions {
                dry_run,
                delete_policy: delete_poll.into(),
                deadline: timeout.map(Duration::from_secs),
            };

            let outcome = reconcile(&client, &ThreadSleeper, state, &options)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                let marker = if outcome.changed { "✓" } else { "-" };
                println!("{} {} (changed: {})", marker, outcome.message, outcome.changed);
            }
        }
        Commands::List { connection } => {
            let client = client_for(connection)?;
            let response = client.get(nodectl::reconcile::DEPLOYMENTS)?;
            let collection: DeploymentCollection =
                serde_json::from_value(response).context("Invalid deployments response")?;

            if collection.results.is_empty() {
                println!("No deployments found");
            } else {
                for deployment in &collection.results {
                    let hostname = deployment
                        .deployment_config
                        .as_ref()
                        .map(|c| c.hostname.as_str())
                        .unwrap_or("<unknown>");
                    let vm_id = deployment.vm_id.as_deref().unwrap_or("<no vm_id>");
                    println!("{}  {}", vm_id, hostname);
                }
            }
        }
    }

    Ok(())
}
