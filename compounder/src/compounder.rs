use std::{io::Write, time::Duration};

use anyhow::Result;
use common::log::{debug, error, warn};
use grape::{client::GrapeClientTrait, format_ether, B256, U256};

use crate::{config::Settings, reporter::Reporter};

/// Pause after a reverted compound before the tick ends. The next tick is
/// still scheduled a full interval later.
pub const FAILED_COMPOUND_PAUSE: Duration = Duration::from_millis(120);

/// Where a single tick ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    FetchFailed,
    Insufficient { rewards: f64 },
    Compounded { nodes: u64 },
    Rejected { transaction_hash: B256, status: u64 },
    Errored,
}

pub struct Compounder<T: GrapeClientTrait, W: Write> {
    grape: T,
    settings: Settings,
    reporter: Reporter<W>,
    threshold: f64,
}

impl<T: GrapeClientTrait, W: Write> Compounder<T, W> {
    pub fn new(grape: T, settings: Settings, reporter: Reporter<W>) -> Self {
        let threshold = settings.threshold();
        Self { grape, settings, reporter, threshold }
    }

    pub fn reporter(&self) -> &Reporter<W> {
        &self.reporter
    }

    /// Ticks forever. The interval is measured from the end of one tick to the
    /// start of the next.
    pub async fn run(&mut self) {
        let interval = self.settings.interval();
        loop {
            let outcome = self.tick().await;
            debug!("Tick finished: {:?}", outcome);
            tokio::time::sleep(interval).await;
        }
    }

    pub async fn tick(&mut self) -> TickOutcome {
        let rewards = match self.fetch_rewards().await {
            Ok(rewards) => rewards,
            Err(e) => {
                warn!("Failed to fetch rewards: {:#}", e);
                self.reporter.status("Crashed while fetching rewards");
                return TickOutcome::FetchFailed;
            }
        };

        if rewards < self.threshold {
            self.reporter.status(&format!(
                "Not enough to compound: {:.6}, needed: {}",
                rewards, self.threshold
            ));
            return TickOutcome::Insufficient { rewards };
        }

        self.reporter.event(&format!("Have enough for compound, let's go ({}).", rewards));

        let receipt = match self.grape.compound().await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!("Compound failed: {:#}", e);
                self.reporter.event(&format!("ERROR {:#}", e));
                return TickOutcome::Errored;
            }
        };

        if !receipt.is_success() {
            self.reporter.event(&format!(
                "Compound transaction {} failed with status {}",
                receipt.transaction_hash, receipt.status
            ));
            tokio::time::sleep(FAILED_COMPOUND_PAUSE).await;
            return TickOutcome::Rejected {
                transaction_hash: receipt.transaction_hash,
                status: receipt.status,
            };
        }

        let nodes = (rewards / self.settings.node_cost).floor() as u64;
        self.reporter.event(&format!(
            "Successfully compounded {} grape node{}",
            nodes,
            if nodes > 1 { "s" } else { "" }
        ));
        TickOutcome::Compounded { nodes }
    }

    async fn fetch_rewards(&self) -> Result<f64> {
        let raw = self.grape.get_total_rewards(self.settings.wallet).await?;
        to_grapes(raw)
    }
}

/// Converts a wei amount into whole-token units.
pub fn to_grapes(raw: U256) -> Result<f64> {
    Ok(format_ether(raw).parse::<f64>()?)
}
