use std::sync::Arc;

use anyhow::Context;

use loan_triage::classifier::create_classifier;
use loan_triage::config::AppConfig;
use loan_triage::error::Result;
use loan_triage::inbox::read_eml_dir;
use loan_triage::pipeline::{BatchReport, PipelineOrchestrator};
use loan_triage::sink::{DecisionSink, JsonFileSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()
        .context("invalid configuration")?
        .with_args(std::env::args().skip(1));

    let taxonomy = Arc::new(config.load_taxonomy().context("failed to load taxonomy")?);
    let classifier =
        create_classifier(&config.classifier).context("failed to create classifier")?;

    eprintln!("📨 Loan Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Classifier: {}", classifier.name());
    eprintln!("   Request types: {}", taxonomy.request_types.len());
    eprintln!("   Inbox: {}", config.input_dir.display());
    eprintln!("   Output: {}", config.output_path.display());
    match config.history_limit {
        Some(limit) => eprintln!("   History limit: {}\n", limit),
        None => eprintln!("   History limit: none\n"),
    }

    let orchestrator = PipelineOrchestrator::new(Arc::clone(&taxonomy), classifier)
        .with_history(config.new_history());

    let sink = JsonFileSink::new(&config.output_path);
    let report = run(&orchestrator, &config, &sink)
        .await
        .with_context(|| format!("batch run failed for {}", config.input_dir.display()))?;

    println!(
        "Processed {} requests. Output saved to {}",
        report.decisions.len(),
        sink.path().display()
    );
    if !report.failures.is_empty() {
        eprintln!("   {} email(s) failed:", report.failures.len());
        for failure in &report.failures {
            eprintln!("   - {}: {}", failure.id, failure.error);
        }
    }

    Ok(())
}

/// Read the inbox, process every email and write the decisions.
async fn run(
    orchestrator: &PipelineOrchestrator,
    config: &AppConfig,
    sink: &JsonFileSink,
) -> Result<BatchReport> {
    let emails = read_eml_dir(&config.input_dir).await?;
    let report = orchestrator.process_batch(emails).await;
    sink.write(&report).await?;
    Ok(report)
}
