use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use kube::api::{Api, ListParams};
use meridian_installer::charts::HelmBinary;
use meridian_installer::crd::legacy;
use meridian_installer::migration::{self, preflight, shutdown, MigrationOptions};
use meridian_installer::{clusters, Error};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify every cluster is reachable and the platform is quiescent
    Preflight(ClusterArgs),
    /// Scale platform controllers to zero and remove admission webhooks
    Shutdown(ClusterArgs),
    /// Run the full schema migration pipeline
    Migrate(MigrateArgs),
    /// Show version and build information
    Version,
}

#[derive(Args, Debug)]
struct ClusterArgs {
    /// Namespace the platform is installed into
    #[arg(long, env = "MERIDIAN_NAMESPACE", default_value = "meridian")]
    namespace: String,

    /// Path to the master cluster kubeconfig
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use for the master cluster
    #[arg(long)]
    context: Option<String>,
}

#[derive(Args, Debug)]
struct MigrateArgs {
    #[command(flatten)]
    cluster: ClusterArgs,

    /// Directory backup archives are written into
    #[arg(long, default_value = "./backups")]
    backup_directory: PathBuf,

    /// Directory containing the platform charts
    #[arg(long, default_value = "./charts")]
    charts_directory: PathBuf,

    /// Helm executable used to apply the CRD chart
    #[arg(long, env = "HELM_BINARY", default_value = "helm")]
    helm_binary: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("Meridian Installer v{}", env!("CARGO_PKG_VERSION"));
            println!("Build Date: {}", env!("BUILD_DATE"));
            println!("Git SHA: {}", env!("GIT_SHA"));
            println!("Rust Version: {}", env!("RUST_VERSION"));
            Ok(())
        }
        Commands::Preflight(args) => {
            init_tracing();
            run_preflight(args).await
        }
        Commands::Shutdown(args) => {
            init_tracing();
            run_shutdown(args).await
        }
        Commands::Migrate(args) => {
            init_tracing();
            run_migrate(args).await
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

/// Resolve clients and the platform configuration into run options.
async fn build_options(args: &ClusterArgs) -> Result<MigrationOptions, Error> {
    let master =
        clusters::master_client(args.kubeconfig.as_deref(), args.context.as_deref()).await?;

    let configs: Api<legacy::MeridianConfiguration> =
        Api::namespaced(master.clone(), &args.namespace);
    let config = configs
        .list(&ListParams::default())
        .await
        .map_err(Error::KubeError)?
        .items
        .into_iter()
        .next()
        .ok_or_else(|| {
            Error::ConfigError(format!(
                "no MeridianConfiguration found in namespace {}",
                args.namespace
            ))
        })?;

    let seeds = clusters::seed_clients(&master, &args.namespace).await?;
    info!(seeds = seeds.len(), "resolved cluster clients");

    Ok(MigrationOptions {
        namespace: args.namespace.clone(),
        config,
        master,
        seeds,
        backup_directory: PathBuf::from("./backups"),
        charts_directory: PathBuf::from("./charts"),
    })
}

async fn run_preflight(args: ClusterArgs) -> Result<(), Error> {
    let opts = build_options(&args).await?;
    let problems = preflight::check(&opts).await;

    if problems.is_empty() {
        println!(
            "Preflight checks passed on {} cluster(s).",
            opts.clusters().len()
        );
        return Ok(());
    }

    eprintln!("Preflight checks failed:");
    for problem in &problems {
        eprintln!("  - {problem}");
    }
    std::process::exit(1);
}

async fn run_shutdown(args: ClusterArgs) -> Result<(), Error> {
    let opts = build_options(&args).await?;
    shutdown::run(&opts).await?;

    println!(
        "Platform controllers stopped on {} cluster(s).",
        opts.clusters().len()
    );
    Ok(())
}

async fn run_migrate(args: MigrateArgs) -> Result<(), Error> {
    let mut opts = build_options(&args.cluster).await?;
    opts.backup_directory = args.backup_directory;
    opts.charts_directory = args.charts_directory;

    let helm = HelmBinary::new(
        args.helm_binary,
        args.cluster.kubeconfig.clone(),
        args.cluster.context.clone(),
    );

    let summary = migration::run(&opts, &helm).await?;

    println!("Migration complete.");
    for (kind, count) in &summary.migrated {
        println!("  {count} {kind} object(s) migrated");
    }
    Ok(())
}
