//! Minimal embedding example for squatwatch-core
//!
//! Runs the monitor twice against an in-process "zone" instead of real DNS.
//! The first run reports every registered look-alike; the second run is
//! quiet because the shared in-memory history already knows them.

use squatwatch_core::config::MonitorConfig;
use squatwatch_core::traits::Prober;
use squatwatch_core::{
    DomainVariant, Invocation, LogNotifier, MemoryHistoryStore, Monitor, ProbeRecords, Result,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Level;

/// Prober that answers from a fixed table
struct ZoneProber {
    zone: HashMap<&'static str, &'static str>,
}

impl ZoneProber {
    fn new() -> Self {
        Self {
            zone: HashMap::from([
                ("examp1e.com", "198.51.100.7"),
                ("example.co", "203.0.113.20"),
                ("exmaple.com", "198.51.100.99"),
            ]),
        }
    }
}

#[async_trait::async_trait]
impl Prober for ZoneProber {
    async fn probe(&self, variant: &DomainVariant) -> Result<ProbeRecords> {
        Ok(match self.zone.get(variant.domain_name.as_str()) {
            Some(ip) => ProbeRecords {
                dns_a: vec![ip.to_string()],
                ..ProbeRecords::default()
            },
            None => ProbeRecords::default(),
        })
    }

    fn prober_name(&self) -> &'static str {
        "zone"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    println!("=== Embedded squatwatch-core Example ===\n");

    let prober: Arc<dyn Prober> = Arc::new(ZoneProber::new());
    let history = MemoryHistoryStore::new();
    let config = MonitorConfig::default();
    let invocation = Invocation::new("example.com", "DEMO");

    for pass in 1..=2 {
        let (monitor, mut events) = Monitor::new(
            prober.clone(),
            Box::new(history.clone()),
            Box::new(LogNotifier::new()),
            config.clone(),
        )?;

        let listener = tokio::spawn(async move {
            let mut count = 0;
            while events.recv().await.is_some() {
                count += 1;
            }
            count
        });

        let report = monitor.run(&invocation).await?;
        drop(monitor);
        let events_seen = listener.await.unwrap_or(0);

        println!(
            "Run {}: {} candidates, {} hits, {} new, {} events",
            pass,
            report.candidates,
            report.hits,
            report.findings.len(),
            events_seen
        );
        for finding in &report.findings {
            println!("   new: {} ({})", finding.domain_name, finding.fuzzer);
        }
    }

    println!("\nHistory for DEMO holds {} domain(s)", history.len("DEMO").await);
    Ok(())
}
