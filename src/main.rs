use clap::Parser;
use cloudview_baseline::core::{ConfigProvider, PageSource};
use cloudview_baseline::utils::error::{ErrorSeverity, Result};
use cloudview_baseline::utils::{logger, validation::Validate};
use cloudview_baseline::{
    AppConfig, BundleSink, CliConfig, CloudViewClient, DriftDetector, EtlEngine, JsonStdoutSink,
    LocalStorage, SamplePageSource,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting cloudview-baseline");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: &CliConfig) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.validate()?;
    tracing::debug!("Effective config: {:?}", config);

    if cli.live {
        config.require_credentials()?;
        let client = CloudViewClient::from_config(&config)?;
        tracing::info!("Connecting to: {}", client.url());
        execute(cli, &config, client).await
    } else {
        tracing::info!("Using the bundled sample page; pass --live to query the API");
        execute(cli, &config, SamplePageSource::demo()?).await
    }
}

async fn execute<P: PageSource>(cli: &CliConfig, config: &AppConfig, source: P) -> Result<()> {
    if cli.raw || cli.drift {
        let raw = source.fetch_page(cli.page, config.page_size()).await?;
        if cli.drift {
            let report = DriftDetector::default().inspect_page(&raw)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&raw)?);
        }
        return Ok(());
    }

    let engine = EtlEngine::new(source)
        .with_page_size(config.page_size())
        .with_start_page(cli.page)
        .with_max_pages(cli.max_pages(config));

    let summary = if cli.output_path.is_some() {
        let storage = LocalStorage::new(config.output_path());
        engine
            .run(&BundleSink::new(storage, config.output_path()))
            .await?
    } else {
        engine.run(&JsonStdoutSink).await?
    };

    tracing::info!(
        "✅ Retrieved {} connector(s) across {} page(s), {} reported in total",
        summary.records,
        summary.pages,
        summary.total_count
    );
    if cli.output_path.is_some() {
        tracing::info!("📁 Output saved to: {}", summary.output_path);
        println!("📁 Output saved to: {}", summary.output_path);
    }

    Ok(())
}
