//! Pipeline controller: runs source → resolver → ranker and publishes the
//! result through a `watch` channel. Runs are tagged with a generation; a
//! run that is no longer the newest when it completes is discarded, so a
//! fresh run supersedes an in-flight one instead of interleaving with it.

use crate::ranker::{rank, RankedEntry};
use crate::records::RecordSource;
use crate::resolver::{ResolveError, ScoreResolver};
use common::types::HelpRecord;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// The latest observed pipeline output. `Loading` until the first
/// successful run; a failed run never replaces a previous `Ready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Loading,
    Ready {
        generation: u64,
        records: Vec<HelpRecord>,
        entries: Vec<RankedEntry>,
    },
}

/// The three mutually exclusive presentation states, derived purely from
/// the snapshot — no separate UI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Empty,
    Ready,
}

impl Snapshot {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Loading => Phase::Loading,
            Self::Ready { entries, .. } if entries.is_empty() => Phase::Empty,
            Self::Ready { .. } => Phase::Ready,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Published,
    /// Fetched records match the current snapshot; resolving skipped.
    Unchanged,
    /// A newer run started while this one was in flight; result discarded.
    Superseded,
}

pub struct PipelineController<S, R> {
    source: S,
    resolver: R,
    generation: AtomicU64,
    tx: watch::Sender<Snapshot>,
}

impl<S, R> PipelineController<S, R>
where
    S: RecordSource + Sync,
    R: ScoreResolver + Sync,
{
    pub fn new(source: S, resolver: R) -> Self {
        let (tx, _) = watch::channel(Snapshot::Loading);
        Self {
            source,
            resolver,
            generation: AtomicU64::new(0),
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// One full derivation from the latest observed inputs. Holds no lock
    /// across awaits and shares no mutable state with other runs.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ResolveError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::counter!("pipeline_runs_total").increment(1);

        let records = match self.source.fetch_records().await {
            Ok(records) => records,
            Err(e) => {
                metrics::counter!("pipeline_failed_runs_total").increment(1);
                return Err(ResolveError::Unavailable(e));
            }
        };

        let unchanged = matches!(
            &*self.tx.borrow(),
            Snapshot::Ready { records: prev, .. } if *prev == records
        );
        if unchanged {
            metrics::counter!("pipeline_unchanged_total").increment(1);
            return Ok(RefreshOutcome::Unchanged);
        }

        let entries = match self.resolver.resolve(&records).await {
            Ok(entries) => rank(entries),
            Err(e) => {
                metrics::counter!("pipeline_failed_runs_total").increment(1);
                return Err(e);
            }
        };

        // The generation check and the write happen under the watch lock,
        // so a superseded run can never clobber a newer snapshot.
        let published = self.tx.send_if_modified(|snapshot| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *snapshot = Snapshot::Ready {
                generation,
                records,
                entries,
            };
            true
        });

        if published {
            Ok(RefreshOutcome::Published)
        } else {
            metrics::counter!("pipeline_superseded_total").increment(1);
            Ok(RefreshOutcome::Superseded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::types::{Address, HelpRecord, LeaderboardEntry};
    use rust_decimal::Decimal;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn addr(n: u8) -> Address {
        format!("0x{:040x}", u128::from(n)).parse().unwrap()
    }

    fn record(helper: u8, message: &str) -> HelpRecord {
        HelpRecord {
            helper: addr(helper),
            recipient: addr(200),
            message: message.to_string(),
            timestamp: None,
        }
    }

    /// Pops one scripted batch per fetch.
    struct ScriptedSource {
        batches: Mutex<VecDeque<anyhow::Result<Vec<HelpRecord>>>>,
    }

    impl ScriptedSource {
        fn new(batches: Vec<anyhow::Result<Vec<HelpRecord>>>) -> Self {
            Self {
                batches: Mutex::new(batches.into()),
            }
        }
    }

    impl RecordSource for ScriptedSource {
        async fn fetch_records(&self) -> anyhow::Result<Vec<HelpRecord>> {
            self.batches
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted source exhausted")
        }
    }

    /// Scores from a fixed map; optional per-call delay to simulate a slow
    /// resolver. Counts calls so unchanged-skip is observable.
    struct MapResolver {
        scores: HashMap<Address, Decimal>,
        delays: Mutex<VecDeque<Duration>>,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl MapResolver {
        fn new(scores: HashMap<Address, Decimal>) -> Self {
            Self {
                scores,
                delays: Mutex::new(VecDeque::new()),
                calls: std::sync::atomic::AtomicUsize::new(0),
            }
        }

        fn with_delays(mut self, delays: Vec<Duration>) -> Self {
            self.delays = Mutex::new(delays.into());
            self
        }
    }

    impl ScoreResolver for &MapResolver {
        async fn resolve(
            &self,
            records: &[HelpRecord],
        ) -> Result<Vec<LeaderboardEntry>, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delays.lock().unwrap().pop_front();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(crate::records::distinct_helpers(records)
                .into_iter()
                .map(|address| {
                    let score = self.scores.get(&address).copied().unwrap_or(Decimal::ZERO);
                    LeaderboardEntry { address, score }
                })
                .collect())
        }
    }

    impl ScoreResolver for Arc<MapResolver> {
        async fn resolve(
            &self,
            records: &[HelpRecord],
        ) -> Result<Vec<LeaderboardEntry>, ResolveError> {
            (&**self).resolve(records).await
        }
    }

    #[tokio::test]
    async fn test_refresh_publishes_ready_snapshot() {
        let source = ScriptedSource::new(vec![Ok(vec![record(1, "m1"), record(2, "m2")])]);
        let resolver = Arc::new(MapResolver::new(HashMap::from([
            (addr(1), Decimal::from(10)),
            (addr(2), Decimal::from(90)),
        ])));
        let controller = PipelineController::new(source, resolver);
        let rx = controller.subscribe();

        assert_eq!(rx.borrow().phase(), Phase::Loading);
        let outcome = controller.refresh().await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Published);

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.phase(), Phase::Ready);
        let Snapshot::Ready { entries, .. } = snapshot else {
            panic!("expected ready snapshot");
        };
        assert_eq!(entries[0].address, addr(2));
    }

    #[tokio::test]
    async fn test_zero_records_is_empty_not_loading() {
        let source = ScriptedSource::new(vec![Ok(Vec::new())]);
        let resolver = Arc::new(MapResolver::new(HashMap::new()));
        let controller = PipelineController::new(source, resolver);
        let rx = controller.subscribe();

        controller.refresh().await.unwrap();
        assert_eq!(rx.borrow().phase(), Phase::Empty);
    }

    #[tokio::test]
    async fn test_source_failure_keeps_loading_snapshot() {
        let source = ScriptedSource::new(vec![Err(anyhow::anyhow!("gateway down"))]);
        let resolver = Arc::new(MapResolver::new(HashMap::new()));
        let controller = PipelineController::new(source, resolver);
        let rx = controller.subscribe();

        let err = controller.refresh().await.unwrap_err();
        assert!(matches!(err, ResolveError::Unavailable(_)));
        assert_eq!(rx.borrow().phase(), Phase::Loading);
    }

    #[tokio::test]
    async fn test_source_failure_keeps_previous_ready_snapshot() {
        let source = ScriptedSource::new(vec![
            Ok(vec![record(1, "m1")]),
            Err(anyhow::anyhow!("gateway down")),
        ]);
        let resolver = Arc::new(MapResolver::new(HashMap::from([(
            addr(1),
            Decimal::from(7),
        )])));
        let controller = PipelineController::new(source, resolver);
        let rx = controller.subscribe();

        controller.refresh().await.unwrap();
        assert!(controller.refresh().await.is_err());
        assert_eq!(rx.borrow().phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_unchanged_records_skip_resolving() {
        let batch = vec![record(1, "m1")];
        let source = ScriptedSource::new(vec![Ok(batch.clone()), Ok(batch)]);
        let resolver = Arc::new(MapResolver::new(HashMap::new()));
        let controller = PipelineController::new(source, resolver.clone());

        assert_eq!(
            controller.refresh().await.unwrap(),
            RefreshOutcome::Published
        );
        assert_eq!(
            controller.refresh().await.unwrap(),
            RefreshOutcome::Unchanged
        );
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_run_is_superseded_by_a_newer_one() {
        let source = ScriptedSource::new(vec![
            Ok(vec![record(1, "old")]),
            Ok(vec![record(2, "new")]),
        ]);
        let resolver = Arc::new(
            MapResolver::new(HashMap::from([
                (addr(1), Decimal::from(10)),
                (addr(2), Decimal::from(99)),
            ]))
            // First run stalls in the resolver; second completes at once.
            .with_delays(vec![Duration::from_secs(10), Duration::ZERO]),
        );
        let controller = Arc::new(PipelineController::new(source, resolver));
        let rx = controller.subscribe();

        let slow = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        // Let the slow run fetch its records and park in the resolver.
        tokio::task::yield_now().await;

        let fast = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(fast.await.unwrap().unwrap(), RefreshOutcome::Published);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(slow.await.unwrap().unwrap(), RefreshOutcome::Superseded);

        // The stale run's entries never reached the snapshot.
        let Snapshot::Ready { entries, .. } = rx.borrow().clone() else {
            panic!("expected ready snapshot");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].address, addr(2));
    }
}
