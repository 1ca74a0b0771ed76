use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result};
use chatguard::Config;
use chatguard::arbiter::Query;
use chatguard::audit::{AuditTrail, create_audit_sink};
use chatguard::gateway;
use chatguard::session::Orchestrator;
use tracing::info;

/// One-shot pipeline run; prints the caller-facing JSON.
async fn run_ask(config: &Config, message: String, lang: String) -> Result<()> {
    let audit = AuditTrail::new(create_audit_sink(config));
    let orchestrator = Orchestrator::from_config(config, audit)?;
    let response = orchestrator.handle(&Query::new(message).with_lang(lang)).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("serialize response")?
    );
    Ok(())
}

async fn run_audit(config: &Config, limit: usize) -> Result<()> {
    let audit = AuditTrail::new(create_audit_sink(config));
    let events = audit.recent(limit).await;
    if events.is_empty() {
        info!(sink = audit.sink_name(), "no audit records");
    }
    for event in events {
        println!(
            "{}",
            serde_json::to_string(&event).context("serialize audit record")?
        );
    }
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            info!("Starting chatguard gateway on {host}:{port}");
            gateway::run_gateway(&host, port, config).await
        }
        Commands::Ask { message, lang } => run_ask(&config, message, lang).await,
        Commands::Audit { limit } => run_audit(&config, limit).await,
    }
}
