//! function-tenant-rbac - Crossplane composition function for tenant provider RBAC

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kube::Client;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use function_tenant_rbac::function::FunctionService;
use function_tenant_rbac::observed::{
    KubeRevisionLister, RevisionLister, UnavailableRevisionLister,
};
use function_tenant_rbac::tls::ServerTls;

/// function-tenant-rbac - grants tenant service accounts edit access to installed providers
#[derive(Parser, Debug)]
#[command(name = "function-tenant-rbac", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the function runner gRPC server (default mode)
    Serve(ServeArgs),
}

/// Serve mode arguments
#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address for the gRPC server to listen on
    #[arg(long, default_value = "0.0.0.0:9443")]
    address: SocketAddr,

    /// Directory containing the server's tls.crt and tls.key
    #[arg(long, env = "TLS_SERVER_CERTS_DIR")]
    tls_certs_dir: Option<PathBuf>,

    /// Serve without TLS (for local testing only)
    #[arg(long)]
    insecure: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install crypto provider - FIPS-validated aws-lc-rs
    // This MUST succeed for the application to operate securely.
    // Failure here indicates a serious system configuration issue.
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        eprintln!(
            "CRITICAL: Failed to install FIPS-validated crypto provider: {:?}. \
             The application cannot operate securely without a working TLS implementation. \
             This may indicate aws-lc-rs was not compiled correctly or there is a \
             conflict with another crypto provider.",
            e
        );
        std::process::exit(1);
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => run_serve(args).await,
        // No subcommand: serve with defaults and environment-provided args
        None => run_serve(ServeArgs::parse_from(["function-tenant-rbac"])).await,
    }
}

/// Run the function runner server
async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    // The cluster connection is established once and shared across runs. A
    // cluster we cannot reach at startup is not fatal: the function still
    // serves, and every run takes the degraded zero-revision path.
    let lister: Arc<dyn RevisionLister> = match Client::try_default().await {
        Ok(client) => Arc::new(KubeRevisionLister::new(client)),
        Err(e) => {
            warn!(
                error = %e,
                "no cluster connection; runs will synthesize zero resources"
            );
            Arc::new(UnavailableRevisionLister::new(e.to_string()))
        }
    };

    if args.insecure {
        return FunctionService::serve_insecure(lister, args.address)
            .await
            .map_err(|e| anyhow::anyhow!("server error: {e}"));
    }

    let certs_dir = args.tls_certs_dir.ok_or_else(|| {
        anyhow::anyhow!("--tls-certs-dir (or TLS_SERVER_CERTS_DIR) is required unless --insecure is set")
    })?;
    let tls = ServerTls::from_dir(&certs_dir)?;

    FunctionService::serve_with_tls(lister, args.address, tls)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))
}
