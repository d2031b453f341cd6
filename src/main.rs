//! Churn Prediction Service - Main Entry Point
//!
//! Loads the classifier once, then answers prediction requests arriving
//! over NATS with a churn label and probability.

use anyhow::{Context, Result};
use churn_prediction::{
    config::{AppConfig, LoggingConfig},
    consumer::RequestConsumer,
    metrics::{MetricsReporter, ServiceMetrics},
    producer::ReplyPublisher,
    service::PredictionService,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset: the library and this binary.
fn default_directives(level: &str) -> String {
    format!("churn_prediction={level},{}={level}", module_path!())
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&config.level)))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/config.toml".to_string());
    let config = AppConfig::load_from_path(&config_path)?;

    init_logging(&config.logging)?;
    info!(config = %config_path, "Starting Churn Prediction Service");

    let metrics = Arc::new(ServiceMetrics::new());

    // Load the classifier; without it no request can be served.
    let service = match PredictionService::from_config(&config, metrics.clone()) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!(error = %e, "Classifier could not be loaded, refusing to start");
            return Err(e.into());
        }
    };
    info!(
        model = %service.engine().classifier_name(),
        schema = %service.engine().schema().version,
        threshold = service.engine().threshold(),
        range_policy = ?config.validation.range_policy,
        "Prediction service ready"
    );

    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let publisher = ReplyPublisher::new(client.clone());

    let semaphore = Arc::new(Semaphore::new(config.service.workers));
    info!(
        workers = config.service.workers,
        subject = %consumer.subject(),
        "Handling prediction requests"
    );

    let reporter_metrics = metrics.clone();
    tokio::spawn(async move {
        MetricsReporter::new(reporter_metrics, 60).start().await;
    });

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let service = service.clone();
        let publisher = publisher.clone();

        tokio::spawn(async move {
            let reply = service.handle_payload(&message.payload);

            match message.reply {
                Some(reply_to) => {
                    if let Err(e) = publisher.publish(reply_to, &reply).await {
                        error!(error = %e, "Failed to publish reply");
                    }
                }
                None => warn!(
                    subject = %message.subject,
                    "Request without reply subject, result dropped"
                ),
            }

            drop(permit);
        });
    }

    info!("Subscription closed, shutting down");
    metrics.print_summary();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_binary_target() {
        let directives = default_directives("info");
        assert_eq!(directives, "churn_prediction=info,churn_service=info");
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
