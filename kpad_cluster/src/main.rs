//! cluster_probe: list and scale cluster resources from the shell.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use kpad_cluster::marathon::task_hosts;
use kpad_cluster::{KubernetesClient, MarathonClient};

#[derive(Parser, Debug)]
#[command(name = "cluster_probe", about = "Poke the Kubernetes or Marathon REST API")]
struct Cli {
    /// Kubernetes API server (or `kubectl proxy`).
    #[arg(long, default_value = "http://127.0.0.1:8001", env = "KUBEPAD_KUBERNETES__MASTER_URL")]
    master_url: String,

    /// Bearer token file for Kubernetes.
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Marathon API endpoint.
    #[arg(long, default_value = "http://localhost:8080", env = "KUBEPAD_MARATHON__API_ENDPOINT")]
    marathon: String,

    /// DC/OS access token file for Marathon.
    #[arg(long)]
    access_token_file: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List pods.
    Pods {
        #[arg(short, long, default_value = "default")]
        namespace: String,
    },
    /// List replication controllers.
    Controllers {
        #[arg(short, long, default_value = "default")]
        namespace: String,
    },
    /// List deployments.
    Deployments {
        #[arg(short, long, default_value = "default")]
        namespace: String,
    },
    /// Scale a deployment or replication controller.
    Scale {
        kind: Kind,
        name: String,
        replicas: u32,
        #[arg(short, long, default_value = "default")]
        namespace: String,
    },
    /// List Launchpad-enabled Marathon apps and running deployments.
    Apps,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Deployment,
    Rc,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.timeout);

    if let Command::Apps = cli.command {
        let client = MarathonClient::new(&cli.marathon, cli.access_token_file.as_deref(), timeout)?;
        for app in client.list_apps()? {
            println!("{:<32} instances={:<3} deploying={}", app.short_id(), app.instances, !app.deployments.is_empty());
            let tasks = client.list_app_tasks(&app.id)?;
            println!("  {} task(s) on {:?}", tasks.len(), task_hosts(&tasks));
        }
        for d in client.list_deployments()? {
            println!("deployment {} affects {:?}", d.id, d.affected_apps);
        }
        return Ok(());
    }

    let client = KubernetesClient::new(&cli.master_url, cli.token_file.as_deref(), timeout)?;
    match cli.command {
        Command::Pods { namespace } => {
            let pods = client.list_pods(&namespace)?;
            println!("{} pod(s) in {}", pods.len(), namespace);
            for p in pods {
                println!("  {:<48} {}", p.metadata.name, p.status.phase.as_deref().unwrap_or("?"));
            }
        }
        Command::Controllers { namespace } => {
            for rc in client.list_replication_controllers(&namespace)? {
                println!("  {:<32} {}/{}", rc.metadata.name, rc.ready(), rc.desired());
            }
        }
        Command::Deployments { namespace } => {
            for d in client.list_deployments(&namespace)? {
                println!("  {:<32} {}/{} {:?}", d.metadata.name, d.ready(), d.desired(), d.metadata.labels);
            }
        }
        Command::Scale { kind: Kind::Deployment, name, replicas, namespace } => {
            client.scale_deployment(&namespace, &name, replicas)?;
            println!("deployment {} scaled to {}", name, replicas);
        }
        Command::Scale { kind: Kind::Rc, name, replicas, namespace } => {
            client.scale_replication_controller(&namespace, &name, replicas)?;
            println!("replication controller {} scaled to {}", name, replicas);
        }
        Command::Apps => {}
    }
    Ok(())
}
