//! Send command for publishing one payload to a cohort topic.

use std::io::Read;

use anyhow::{Context, Result, bail};
use clap::Args;
use cohortwatch_bus::{CohortName, IggyTopicSource};
use tracing::info;

use crate::config::CohortwatchConfig;

/// Arguments for the `send` command
#[derive(Debug, Args)]
pub struct SendArgs {
    /// Cohort whose topic receives the payload
    #[arg(short, long)]
    pub cohort: String,

    /// Payload as JSON (reads from stdin if omitted)
    #[arg(short, long)]
    pub data: Option<String>,

    /// Send the payload as-is, even if it is not a JSON object
    #[arg(long)]
    pub raw: bool,

    /// Iggy server address (host:port)
    #[arg(long)]
    pub bus_address: Option<String>,
}

/// Run the send command
pub async fn run(args: SendArgs, mut config: CohortwatchConfig) -> Result<()> {
    let cohort = CohortName::new(args.cohort).context("Invalid cohort")?;
    if let Some(address) = args.bus_address {
        config.bus.address = address;
    }

    let payload = match args.data {
        Some(data) => data,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
    };
    if !args.raw {
        check_payload(&payload)?;
    }

    let topic = config.bus.topics.topic_for(&cohort);
    let source = IggyTopicSource::new(config.bus);
    source
        .publish(&topic, payload.into_bytes())
        .await
        .with_context(|| format!("Failed to publish to {}", topic))?;

    info!(%cohort, %topic, "Payload sent");
    println!("Sent to {}", topic);
    Ok(())
}

/// Viewers only receive JSON objects; refuse anything else unless `--raw`.
fn check_payload(payload: &str) -> Result<()> {
    let value: serde_json::Value =
        serde_json::from_str(payload).context("Payload is not valid JSON (use --raw to send anyway)")?;
    if !value.is_object() {
        bail!("Payload must be a JSON object (use --raw to send anyway)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_payload_accepts_object() {
        assert!(check_payload(r#"{"eventCategory":"Registry"}"#).is_ok());
    }

    #[test]
    fn test_check_payload_rejects_non_objects() {
        assert!(check_payload("not json").is_err());
        let err = check_payload("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[tokio::test]
    async fn test_invalid_cohort_is_rejected() {
        let args = SendArgs {
            cohort: "a/b".to_string(),
            data: Some("{}".to_string()),
            raw: false,
            bus_address: None,
        };

        let err = run(args, CohortwatchConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid cohort"));
    }
}
