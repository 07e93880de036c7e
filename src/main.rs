// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use informer_demos::config::{ClientArgs, Config};
use informer_demos::demos::{self, informer_index::IndexArgs, poll_pods::PollArgs, Session};

/// Informer, indexer, lister and informer factory programs
#[derive(Parser, Debug)]
#[command(name = "informer-demos")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    client: ClientArgs,

    #[command(subcommand)]
    program: Program,
}

#[derive(Subcommand, Debug)]
enum Program {
    /// List the pods of the default namespace
    Starter,
    /// Create the nginx deployment
    CreateDeployment,
    /// Poll pod phases without an informer
    PollPods(PollArgs),
    /// Print pod events from a shared informer
    InformerEvents,
    /// Query a pod informer through its indexes
    InformerIndex(IndexArgs),
    /// Several handlers on the informers of one factory
    FactoryEvents,
    /// Query pods and deployments through listers
    FactoryLister,
    /// Node and phase indexes on a factory informer
    FactoryCustomIndex,
    /// Indexers, handlers and listers together
    FactoryComplete,
    /// Describe the ways a factory can be scoped
    FactoryOptions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_args(&args.client)
        .inspect_err(|e| error!("Failed to resolve configuration: {}", e))?;
    info!("Using kubeconfig {}", config.kubeconfig.display());

    let session = Session::connect(&config)
        .await
        .inspect_err(|e| error!("Failed to create client: {}", e))?;

    let stop = CancellationToken::new();
    tokio::spawn({
        let stop = stop.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received interrupt, stopping");
                stop.cancel();
            }
        }
    });

    let result = match args.program {
        Program::Starter => demos::starter::run(&session).await,
        Program::CreateDeployment => demos::create_deployment::run(&session).await.map(|_| ()),
        Program::PollPods(poll) => demos::poll_pods::run(&session, &poll, &stop).await.map(|_| ()),
        Program::InformerEvents => demos::informer_events::run(&session, stop).await,
        Program::InformerIndex(index) => demos::informer_index::run(&session, &index, stop).await,
        Program::FactoryEvents => demos::factory_events::run(&session, stop).await,
        Program::FactoryLister => demos::factory_lister::run(&session, stop).await,
        Program::FactoryCustomIndex => demos::factory_custom_index::run(&session, stop).await,
        Program::FactoryComplete => demos::factory_complete::run(&session, stop).await,
        Program::FactoryOptions => demos::factory_options::run(&session).await,
    };

    if let Err(e) = &result {
        error!("{}", e);
    }
    Ok(result?)
}
