use anyhow::Context;
use llm_router::cli::{Args, Commands, ConfigDiscovery};
use llm_router::env;
use llm_router::{ProviderId, Router};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays machine-readable
    let default_filter = if args.verbose {
        "llm_router=debug"
    } else {
        env::DEFAULT_LOG_FILTER
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::ShowConfig { init } = args.command {
        if init {
            let path = ConfigDiscovery::create_default_user_config()?;
            println!("Configuration file: {:?}", path);
            println!();
        }
        ConfigDiscovery::show_discovery_info();
        return Ok(());
    }

    let config = ConfigDiscovery::load(args.config.as_deref())?;
    let router = Router::new(config).context("Failed to initialize router")?;
    info!(
        "Router ready with {} provider(s)",
        router.get_available_providers().len()
    );

    match &args.command {
        Commands::Route { .. } => {
            let request = args
                .command
                .to_request()
                .context("route command carries no request")?;
            let response = router.route(&request).await?;
            if args.json {
                print_json(&response)?;
            } else {
                println!("{}", response.content);
                eprintln!(
                    "[{} / {} · {} tokens · {:?}]",
                    response.provider, response.model, response.usage.total_tokens, response.latency
                );
            }
        }
        Commands::Embed { texts, model } => {
            let vectors = router.embed(texts, model.as_deref()).await?;
            if args.json {
                print_json(&vectors)?;
            } else {
                for (text, vector) in texts.iter().zip(&vectors) {
                    println!("{} dims  {}", vector.len(), text);
                }
            }
        }
        Commands::Report { .. } => {
            let params = args
                .command
                .to_report_params()
                .map_err(anyhow::Error::msg)?
                .context("report command carries no parameters")?;
            let result = router.generate_report(&params).await?;
            if args.json {
                print_json(&result)?;
            } else {
                println!("Report {}: {}", result.id, result.status);
                if let Some(url) = &result.url {
                    println!("  {}", url);
                }
            }
        }
        Commands::Health => {
            let health = router.health_check().await;
            if args.json {
                print_json(&health)?;
            } else if health.is_empty() {
                println!("No providers registered");
            } else {
                for (id, healthy) in &health {
                    let status = if *healthy { "✓ HEALTHY" } else { "✗ UNHEALTHY" };
                    println!("  {:<16} {}", id.as_str(), status);
                }
            }
        }
        Commands::Providers => {
            let configs = router.config().provider_configs();
            let available = router.get_available_providers();
            if args.json {
                print_json(&available)?;
            } else {
                for id in ProviderId::ALL {
                    let marker = if available.contains(&id) { "✓" } else { "✗" };
                    let config = &configs[&id];
                    println!(
                        "  {} {:<16} model={} retries={} timeout={:?}",
                        marker,
                        id.as_str(),
                        config.model,
                        config.max_retries,
                        config.timeout()
                    );
                }
            }
        }
        Commands::Metrics => {
            let metrics = router.get_metrics();
            let circuits = router.circuit_states();
            if args.json {
                print_json(&serde_json::json!({
                    "metrics": metrics,
                    "circuits": circuits,
                }))?;
            } else {
                for m in &metrics {
                    println!(
                        "  {:<16} total={} ok={} failed={} tokens={}/{} avg={:.1}ms cost=${:.4}{}",
                        m.provider.as_str(),
                        m.total_requests,
                        m.successful_requests,
                        m.failed_requests,
                        m.input_tokens,
                        m.output_tokens,
                        m.average_latency_ms,
                        m.estimated_cost_usd,
                        if m.circuit_open { " [circuit open]" } else { "" }
                    );
                }
                for c in &circuits {
                    println!(
                        "  circuit {:<16} {:?} failures={}",
                        c.provider.as_str(),
                        c.status,
                        c.consecutive_failures
                    );
                }
            }
        }
        Commands::Routes => {
            let table = router.routing_table().await;
            if args.json {
                print_json(&table)?;
            } else {
                for (task, rule) in table.rules() {
                    println!(
                        "  {:<14} {}",
                        task.as_str(),
                        rule.chain()
                            .iter()
                            .map(|id| id.as_str())
                            .collect::<Vec<_>>()
                            .join(" → ")
                    );
                }
            }
        }
        // Printed before the router is built
        Commands::ShowConfig { .. } => {}
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
