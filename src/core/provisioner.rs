use crate::core::{
    CandidateNumber, Completion, ConfigProvider, NumberDirectory, NumberRegistry,
    ProvisionRequest, ProvisionResult, PurchaseOutcome,
};
use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const DEFAULT_MAX_ROUNDS: u32 = 1000;
pub const DEFAULT_MAX_IDLE_ROUNDS: u32 = 3;

/// Bounds on one request's search/purchase loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionLimits {
    pub max_rounds: u32,
    /// Consecutive rounds without a single purchase before giving up.
    pub max_idle_rounds: u32,
    pub concurrent_purchases: usize,
}

impl Default for ProvisionLimits {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            max_idle_rounds: DEFAULT_MAX_IDLE_ROUNDS,
            concurrent_purchases: 1,
        }
    }
}

impl ProvisionLimits {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            max_rounds: config.max_rounds(),
            max_idle_rounds: config.max_idle_rounds(),
            concurrent_purchases: config.concurrent_purchases(),
        }
    }
}

/// Cooperative stop request. Observed between rounds; a round in flight always finishes.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

pub struct Provisioner<D: NumberDirectory, R: NumberRegistry> {
    directory: D,
    registry: R,
    limits: ProvisionLimits,
    stop: StopSignal,
}

impl<D: NumberDirectory, R: NumberRegistry> Provisioner<D, R> {
    pub fn new(directory: D, registry: R, limits: ProvisionLimits) -> Self {
        Self {
            directory,
            registry,
            limits,
            stop: StopSignal::new(),
        }
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn limits(&self) -> &ProvisionLimits {
        &self.limits
    }

    /// Run search/purchase rounds until the request is met, the region runs dry, or a
    /// limit or stop is hit. Never fails: transport errors end the request as `Aborted`
    /// and keep whatever was already bought.
    pub async fn provision(&self, request: &ProvisionRequest) -> ProvisionResult {
        let region = match request.region_code() {
            Ok(region) => region,
            Err(e) => {
                tracing::warn!("Skipping '{}': {}", request.region, e);
                return ProvisionResult::empty(request, Completion::UnsupportedRegion);
            }
        };

        if request.quantity_requested == 0 {
            tracing::info!("Nothing requested for {}, skipping search", region);
            return ProvisionResult::empty(request, Completion::NothingRequested);
        }

        tracing::info!(
            "Searching for {} phone numbers in {}",
            request.quantity_requested,
            region
        );

        let mut remaining = request.quantity_requested as usize;
        let mut provisioned: Vec<String> = Vec::new();
        let mut attempted: HashSet<String> = HashSet::new();
        let mut rounds = 0u32;
        let mut rejected = 0u32;
        let mut idle_rounds = 0u32;

        let completion = loop {
            if remaining == 0 {
                break Completion::Fulfilled;
            }
            if self.stop.is_stopped() {
                tracing::warn!("Stop requested, ending {} after {} rounds", region, rounds);
                break Completion::Cancelled;
            }
            if rounds >= self.limits.max_rounds {
                tracing::warn!("Round limit of {} reached for {}", self.limits.max_rounds, region);
                break Completion::RoundLimit;
            }
            rounds += 1;

            let page = match self.directory.search(&region).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("Search failed for {} in round {}: {}", region, rounds, e);
                    break Completion::Aborted {
                        reason: e.to_string(),
                    };
                }
            };

            if page.is_empty() {
                tracing::info!("No more available phone numbers in {}", region);
                break Completion::Exhausted;
            }

            let batch = select_candidates(page, &attempted, remaining);
            attempted.extend(batch.iter().cloned());
            tracing::info!(
                "Round {}: purchasing {} phone numbers in {}",
                rounds,
                batch.len(),
                region
            );

            let mut purchased_this_round = 0usize;
            for outcome in self.purchase_round(&batch).await {
                match outcome {
                    PurchaseOutcome::Purchased { phone_number } => {
                        provisioned.push(phone_number);
                        purchased_this_round += 1;
                    }
                    PurchaseOutcome::Rejected {
                        phone_number,
                        reason,
                    } => {
                        tracing::warn!("{} is invalid or unavailable: {}", phone_number, reason);
                        rejected += 1;
                    }
                }
            }

            remaining = remaining.saturating_sub(purchased_this_round);

            if purchased_this_round == 0 {
                idle_rounds += 1;
                if idle_rounds >= self.limits.max_idle_rounds {
                    tracing::warn!(
                        "{} rounds in a row bought nothing in {}, giving up",
                        idle_rounds,
                        region
                    );
                    break Completion::Stalled;
                }
            } else {
                idle_rounds = 0;
            }
        };

        tracing::info!(
            "Completed provisioning {} of {} phone numbers in {} ({})",
            provisioned.len(),
            request.quantity_requested,
            region,
            completion
        );

        ProvisionResult {
            region: request.region.clone(),
            quantity_requested: request.quantity_requested,
            provisioned_numbers: provisioned,
            rounds,
            rejected_purchases: rejected,
            completion,
        }
    }

    /// Outcomes come back in candidate order regardless of how many purchases overlap.
    async fn purchase_round(&self, batch: &[String]) -> Vec<PurchaseOutcome> {
        let in_flight = self.limits.concurrent_purchases.max(1);
        stream::iter(batch)
            .map(move |phone_number| self.attempt_purchase(phone_number))
            .buffered(in_flight)
            .collect()
            .await
    }

    async fn attempt_purchase(&self, phone_number: &str) -> PurchaseOutcome {
        match self.registry.purchase(phone_number).await {
            Ok(purchased) => {
                tracing::debug!("Purchased {} (sid {:?})", phone_number, purchased.sid);
                PurchaseOutcome::Purchased {
                    phone_number: phone_number.to_string(),
                }
            }
            Err(e) => PurchaseOutcome::Rejected {
                phone_number: phone_number.to_string(),
                reason: e.to_string(),
            },
        }
    }
}

/// Drop numbers already attempted for this request (and repeats within the page), then
/// keep at most `remaining` from the head of the page.
fn select_candidates(
    page: Vec<CandidateNumber>,
    attempted: &HashSet<String>,
    remaining: usize,
) -> Vec<String> {
    let offered = page.len();
    let mut seen = HashSet::new();
    let fresh: Vec<String> = page
        .into_iter()
        .map(|candidate| candidate.phone_number)
        .filter(|number| !attempted.contains(number) && seen.insert(number.clone()))
        .collect();

    if fresh.len() < offered {
        tracing::debug!("Ignoring {} already attempted candidates", offered - fresh.len());
    }

    let mut batch = fresh;
    if batch.len() > remaining {
        tracing::debug!("Truncating {} candidates to {}", batch.len(), remaining);
        batch.truncate(remaining);
    }
    batch
}
