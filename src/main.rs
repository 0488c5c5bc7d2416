use clap::Parser;
use did_provisioner::core::manifest::parse_manifest;
use did_provisioner::core::{ConfigProvider, RegionCode, Storage};
use did_provisioner::utils::error::ErrorSeverity;
use did_provisioner::utils::{logger, validation::Validate};
use did_provisioner::{
    AppConfig, CliConfig, LocalStorage, ProvisionEngine, ProvisionError, ProvisionLimits,
    Provisioner, StopSignal,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting did-provisioner");

    let config = match cli.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            tracing::error!("Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    tracing::debug!("Resolved config: {:?}", config);

    let storage = LocalStorage::default();

    if cli.dry_run {
        tracing::info!("DRY RUN - no numbers will be searched or purchased");
        if let Err(e) = dry_run(&storage, &config).await {
            fail(e);
        }
        return Ok(());
    }

    let client = match config.twilio_client() {
        Ok(client) => client,
        Err(e) => fail(e),
    };

    let stop = StopSignal::new();
    let provisioner = Provisioner::new(
        client.clone(),
        client,
        ProvisionLimits::from_config(&config),
    )
    .with_stop_signal(stop.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current round");
            stop.stop();
        }
    });

    let engine = ProvisionEngine::new(provisioner, storage, config);

    match engine.run().await {
        Ok(summary) => {
            println!(
                "✅ Provisioned {} of {} requested phone numbers across {} requests",
                summary.total_provisioned, summary.total_requested, summary.requests
            );
            for (region, shortfall) in &summary.shortfalls {
                println!("   {} short by {}", region, shortfall);
            }
            println!("📁 Results written to: {}", summary.output_path);
        }
        Err(e) => fail(e),
    }

    Ok(())
}

async fn dry_run(storage: &LocalStorage, config: &AppConfig) -> did_provisioner::Result<()> {
    let manifest = storage.read_file(config.manifest_path()).await?;
    let requests = parse_manifest(&manifest)?;

    for request in &requests {
        match RegionCode::parse(&request.region) {
            Ok(region) => println!(
                "{}: {} numbers by {}",
                request.region, request.quantity_requested, region
            ),
            Err(e) => println!("{}: skipped ({})", request.region, e),
        }
    }
    println!(
        "{} requests, results would be written to {}",
        requests.len(),
        config.output_path()
    );
    Ok(())
}

fn fail(e: ProvisionError) -> ! {
    tracing::error!(
        "Provisioning failed: {} (Severity: {:?})",
        e,
        e.severity()
    );
    tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
