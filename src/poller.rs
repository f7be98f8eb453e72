//! The polling loop: one cycle fetches the aggregate endpoint, then the
//! address list, publishes updates downstream, and sleeps a fixed interval.
//! Failures never terminate the loop; only the stop signal (or the receiver
//! going away) does.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::change::has_changed;
use crate::client::BalanceApi;
use crate::model::{AddressRecord, BalanceSnapshot};

/// What a poll cycle hands downstream. Aggregate updates are suppressed
/// while the data is unchanged; address lists are forwarded every cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Aggregate(BalanceSnapshot),
    Addresses(Vec<AddressRecord>),
}

pub struct Poller<A> {
    api: A,
    interval: Duration,
    updates: mpsc::UnboundedSender<Update>,
    stop: watch::Receiver<bool>,
    last_aggregate: Option<BalanceSnapshot>,
}

impl<A: BalanceApi> Poller<A> {
    pub fn new(
        api: A,
        interval: Duration,
        updates: mpsc::UnboundedSender<Update>,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Poller {
            api,
            interval,
            updates,
            stop,
            last_aggregate: None,
        }
    }

    /// Runs until the stop signal flips or the update receiver is dropped.
    /// Cycles never overlap: the next fetch starts only after the previous
    /// cycle fully resolved and the interval elapsed.
    pub async fn run(mut self) {
        loop {
            if *self.stop.borrow() {
                debug!("stop signal received, poller exiting");
                return;
            }
            if !self.cycle().await {
                debug!("update channel closed, poller exiting");
                return;
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One poll cycle. Aggregate data is always fetched and processed
    /// before the address list. Returns false once the receiver is gone.
    async fn cycle(&mut self) -> bool {
        match self.api.fetch_balance().await {
            Ok(snapshot) => {
                if has_changed(self.last_aggregate.as_ref(), &snapshot) {
                    if self.updates.send(Update::Aggregate(snapshot.clone())).is_err() {
                        return false;
                    }
                    self.last_aggregate = Some(snapshot);
                } else {
                    debug!("aggregate data unchanged, skipping chart update");
                }
            }
            Err(err) if err.is_malformed() => {
                warn!(%err, "skipping aggregate update for this cycle");
            }
            Err(err) => {
                warn!(%err, "balance fetch failed");
            }
        }

        match self.api.fetch_addresses().await {
            Ok(addresses) => {
                if self.updates.send(Update::Addresses(addresses)).is_err() {
                    return false;
                }
            }
            Err(err) => {
                warn!(%err, "address fetch failed");
            }
        }

        true
    }
}
