//! Test Request Generator
//!
//! Generates synthetic customer records and sends them to the churn
//! prediction service as NATS requests, logging the rendered replies.

use churn_prediction::{CustomerRecord, ServiceReply};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Synthetic customer generator for testing
struct CustomerGenerator {
    rng: rand::rngs::ThreadRng,
    generated: u64,
}

impl CustomerGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            generated: 0,
        }
    }

    /// Long-tenure customer on a long contract
    fn generate_low_risk(&mut self) -> CustomerRecord {
        self.generated += 1;
        let tenure = self.rng.gen_range(24..=72);
        let has_internet = self.rng.gen_bool(0.5);
        let monthly: f64 = if has_internet {
            self.rng.gen_range(45.0..80.0)
        } else {
            self.rng.gen_range(18.0..26.0)
        };

        let mut record = CustomerRecord {
            gender: self.random_choice(&["Male", "Female"]).to_string(),
            senior_citizen: 0,
            partner: "Yes".to_string(),
            dependents: self.random_choice(&["Yes", "No"]).to_string(),
            contract: self.random_choice(&["One year", "Two year"]).to_string(),
            paperless_billing: "No".to_string(),
            payment_method: self
                .random_choice(&["Bank transfer (automatic)", "Credit card (automatic)", "Mailed check"])
                .to_string(),
            ..CustomerRecord::new(tenure, round2(monthly), round2(monthly * tenure as f64))
        };
        self.fill_services(&mut record, true, has_internet.then_some("DSL"));
        record
    }

    /// New month-to-month fiber customer paying by electronic check
    fn generate_high_risk(&mut self) -> CustomerRecord {
        self.generated += 1;
        let tenure = self.rng.gen_range(0..=12);
        let monthly: f64 = self.rng.gen_range(70.0..110.0);

        let mut record = CustomerRecord {
            gender: self.random_choice(&["Male", "Female"]).to_string(),
            senior_citizen: i64::from(self.rng.gen_bool(0.3)),
            partner: "No".to_string(),
            dependents: "No".to_string(),
            contract: "Month-to-month".to_string(),
            paperless_billing: "Yes".to_string(),
            payment_method: "Electronic check".to_string(),
            ..CustomerRecord::new(tenure, round2(monthly), round2(monthly * tenure.max(1) as f64))
        };
        let phone = self.rng.gen_bool(0.9);
        self.fill_services(&mut record, phone, Some("Fiber optic"));
        record.online_security = "No".to_string();
        record.tech_support = "No".to_string();
        record
    }

    /// Keep service columns consistent with phone and internet subscriptions
    fn fill_services(&mut self, record: &mut CustomerRecord, phone: bool, internet: Option<&str>) {
        record.phone_service = if phone { "Yes" } else { "No" }.to_string();
        record.multiple_lines = if phone {
            self.random_choice(&["Yes", "No"]).to_string()
        } else {
            "No phone service".to_string()
        };

        match internet {
            Some(kind) => {
                record.internet_service = kind.to_string();
                for field in [
                    &mut record.online_security,
                    &mut record.online_backup,
                    &mut record.device_protection,
                    &mut record.tech_support,
                    &mut record.streaming_tv,
                    &mut record.streaming_movies,
                ] {
                    *field = self.random_choice(&["Yes", "No"]).to_string();
                }
            }
            None => {
                record.internet_service = "No".to_string();
                for field in [
                    &mut record.online_security,
                    &mut record.online_backup,
                    &mut record.device_protection,
                    &mut record.tech_support,
                    &mut record.streaming_tv,
                    &mut record.streaming_movies,
                ] {
                    *field = "No internet service".to_string();
                }
            }
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_requester=info".parse()?),
        )
        .init();

    info!("Starting Test Request Generator");

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("churn.predict");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(20);
    let high_risk_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.3);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(200);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        high_risk_rate = high_risk_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, high_risk_rate, delay_ms).await;
        }
    };

    let mut generator = CustomerGenerator::new();
    let mut rng = rand::thread_rng();
    let (mut accepted, mut rejected, mut churn) = (0u64, 0u64, 0u64);

    for i in 0..count {
        let record = if rng.gen_bool(high_risk_rate) {
            generator.generate_high_risk()
        } else {
            generator.generate_low_risk()
        };

        let payload = serde_json::to_vec(&record)?;
        let message = client.request(subject.to_string(), payload.into()).await?;
        let reply: ServiceReply = serde_json::from_slice(&message.payload)?;

        match &reply {
            ServiceReply::Accepted(response) => {
                accepted += 1;
                churn += u64::from(response.label);
            }
            ServiceReply::Rejected { .. } => rejected += 1,
        }
        info!(
            "Request {}/{} (tenure {}, {}):\n{}",
            i + 1,
            count,
            record.tenure,
            record.contract,
            reply.render()
        );

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} requests ({} accepted, {} predicted churn, {} rejected); generated {}",
        count, accepted, churn, rejected, generator.generated
    );

    Ok(())
}

async fn run_dry_mode(count: u64, high_risk_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = CustomerGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let record = if rng.gen_bool(high_risk_rate) {
            generator.generate_high_risk()
        } else {
            generator.generate_low_risk()
        };

        let json = serde_json::to_string_pretty(&record)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
