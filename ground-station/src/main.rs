use anyhow::Context;
use antenna_controller::{RotatorLink, serial::SerialConnector};
use clap::{Parser, Subcommand};
use ground_station::{
    api::{self, AppState},
    config::Config,
    driver::ContinuousDriver,
    pipeline::{Pipeline, PipelineError},
    time::SystemClock,
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::net::TcpListener;
use tracking::{Sgp4Propagator, catalog::Catalog};

/// Satellite tracker for an antenna rotator
#[derive(Parser, Debug)]
#[command(version, about = "Ground station satellite tracker", long_about = None)]
struct Args {
    /// Configuration file, without extension
    #[arg(short, long, default_value = "ground-station/config")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Follow one satellite, sending the rotator a new position on every update
    Track {
        /// Catalog name of the satellite (defaults to the configured one)
        #[arg(short, long)]
        satellite: Option<String>,
        /// Serial port of the rotator (defaults to the configured one)
        #[arg(short, long)]
        port: Option<String>,
    },

    /// Serve pointing angles and rotator control over HTTP
    Serve {
        /// Serial port to open at startup (defaults to the configured one)
        #[arg(short, long)]
        port: Option<String>,
        /// Only compute angles, never drive a rotator
        #[arg(long)]
        no_rotator: bool,
    },

    /// List the satellites in the catalog
    Satellites,
}

#[tokio::main]
async fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();

    let config = Config::load(&args.config).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {}", err);
        eprintln!("Please create a config.toml file (see ground-station/config.toml).");
        std::process::exit(1);
    });

    let result = match args.command {
        Commands::Track { satellite, port } => track(config, satellite, port).await,
        Commands::Serve { port, no_rotator } => serve(config, port, no_rotator).await,
        Commands::Satellites => satellites(&config),
    };

    if let Err(err) = result {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}

fn satellites(config: &Config) -> anyhow::Result<()> {
    let catalog = Catalog::load(&config.catalog)?;

    for name in catalog.names() {
        println!("{}", name);
    }

    Ok(())
}

async fn track(
    config: Config,
    satellite: Option<String>,
    port: Option<String>,
) -> anyhow::Result<()> {
    let catalog = Catalog::load(&config.catalog)?;
    let name = satellite.unwrap_or(config.tracking.satellite.clone());
    let elements = catalog.find(&name)?.clone();

    let port = port
        .or(config.rotator.port.clone())
        .context("no serial port given; pass --port or set rotator.port")?;
    let settings = config.rotator.port_settings(&port);

    let link = Arc::new(RotatorLink::with_settle_delay(
        SerialConnector,
        config.rotator.settle_delay(),
    ));

    let pipeline = Pipeline::new(Sgp4Propagator::new(config.ground_station)).with_link(link.clone());

    log::info!(
        "Ground station: Lat={}, Lon={}, Elev={}m",
        config.ground_station.latitude(),
        config.ground_station.longitude(),
        config.ground_station.altitude()
    );

    let driver = ContinuousDriver::new(
        Arc::new(pipeline),
        Arc::new(SystemClock),
        elements,
        config.tracking.interval(),
    );

    let stop = Arc::new(AtomicBool::new(false));

    let mut handle = tokio::task::spawn_blocking({
        let link = link.clone();
        let stop = stop.clone();
        move || -> Result<(), PipelineError> {
            link.open(&settings).inspect_err(|_| {
                log::error!(
                    "Please check if the rotator is connected and the correct port is selected."
                )
            })?;
            driver.run(&stop)
        }
    });

    let result = tokio::select! {
        result = &mut handle => result,
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted, finishing the current update...");
            stop.store(true, Ordering::Relaxed);
            handle.await
        }
    };

    link.close();

    result?.map_err(Into::into)
}

async fn serve(config: Config, port: Option<String>, no_rotator: bool) -> anyhow::Result<()> {
    let catalog = Catalog::load(&config.catalog)?;

    log::info!(
        "Ground station: Lat={}, Lon={}, Elev={}m",
        config.ground_station.latitude(),
        config.ground_station.longitude(),
        config.ground_station.altitude()
    );

    let mut pipeline = Pipeline::new(Sgp4Propagator::new(config.ground_station));

    let link = (!no_rotator).then(|| {
        Arc::new(RotatorLink::with_settle_delay(
            SerialConnector,
            config.rotator.settle_delay(),
        ))
    });

    if let Some(link) = &link {
        pipeline = pipeline.with_link(link.clone());

        if let Some(port) = port.or(config.rotator.port.clone()) {
            let settings = config.rotator.port_settings(&port);
            let link = link.clone();

            // Not fatal: a port can still be picked later through /connect.
            if let Err(err) = tokio::task::spawn_blocking(move || link.open(&settings)).await? {
                log::warn!("{}", err);
            }
        }
    }

    let state = Arc::new(AppState {
        pipeline: Arc::new(pipeline),
        catalog: Arc::new(catalog),
        clock: Arc::new(SystemClock),
        rotator: config.rotator.clone(),
    });

    let api_addr = config.api.address();
    let listener = TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind {}", api_addr))?;

    log::info!("Swagger UI available at http://{}/docs", api_addr);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutting down");
        })
        .await?;

    if let Some(link) = link {
        link.close();
    }

    Ok(())
}
