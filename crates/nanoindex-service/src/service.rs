use crate::types::{AddOutcome, SearchHit, SearchOutcome, TrainOutcome};
use nanoindex_agent::{AdaptiveAgent, ARMS};
use nanoindex_core::distance::l2_sq_batch;
use nanoindex_core::{NanoIndexConfig, NanoIndexError, Result};
use nanoindex_index::{IVFIndex, TrainParams};
use nanoindex_store::DataStore;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

const IVF_SNAPSHOT_FILE: &str = "ivf.bin";

struct State {
    store: DataStore,
    index: Option<IVFIndex>,
}

/// Glue between the core components (spec.md "SearchService"). Holds a
/// single reader-writer lock over `DataStore` + `IVFIndex` together, since
/// IVF's row indices are only meaningful against a particular store
/// layout, plus an `AdaptiveAgent` with its own independent lock.
pub struct SearchService {
    data_dir: PathBuf,
    config: NanoIndexConfig,
    state: RwLock<State>,
    agent: AdaptiveAgent,
}

impl SearchService {
    pub fn open(config: NanoIndexConfig) -> Result<Self> {
        let data_dir = PathBuf::from(&config.data_dir);
        let store = DataStore::open(&data_dir, config.dim, config.initial_capacity)?;

        let index = Self::load_persisted_index(&data_dir, config.dim);

        let agent = AdaptiveAgent::new(
            &data_dir,
            config.agent_algorithm,
            config.agent_epsilon,
            config.checkpoint_every,
        );

        Ok(Self {
            data_dir,
            config,
            state: RwLock::new(State { store, index }),
            agent,
        })
    }

    pub fn config(&self) -> &NanoIndexConfig {
        &self.config
    }

    fn load_persisted_index(data_dir: &std::path::Path, dim: usize) -> Option<IVFIndex> {
        let path = data_dir.join(IVF_SNAPSHOT_FILE);
        if !path.exists() {
            return None;
        }
        let k = match IVFIndex::peek_k(&path) {
            Ok(k) => k,
            Err(e) => {
                warn!(error = %e, "could not read ivf snapshot trailer, starting untrained");
                return None;
            }
        };
        match IVFIndex::load(&path, dim, k) {
            Ok(index) => Some(index),
            Err(e) => {
                warn!(error = %e, "could not load ivf snapshot, starting untrained");
                None
            }
        }
    }

    pub fn add(&self, vectors: &[f32], ids: &[i64]) -> Result<AddOutcome> {
        let mut state = self.state.write();
        let inserted_rows = state.store.add(vectors, ids)?;
        let total = state.store.len();
        Ok(AddOutcome {
            inserted: inserted_rows.len(),
            total,
        })
    }

    /// Trains a new IVF index off-band (under a shared read lock, so
    /// concurrent readers keep seeing the previous index or none at all),
    /// then swaps it in under a brief exclusive lock.
    pub fn train(&self, k: usize, seed: u64) -> Result<TrainOutcome> {
        let new_index = {
            let state = self.state.read();
            IVFIndex::train(&state.store, k, TrainParams::new(seed))?
        };
        let n_trained = new_index.n_trained();

        let path = self.data_dir.join(IVF_SNAPSHOT_FILE);
        if let Err(e) = new_index.save(&path) {
            warn!(error = %e, "failed to persist ivf snapshot, index stays in-memory only");
        }

        {
            let mut state = self.state.write();
            state.index = Some(new_index);
        }

        info!(k, n_trained, "ivf training complete");
        Ok(TrainOutcome { k, n_trained })
    }

    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        use_index: bool,
        use_agent: bool,
    ) -> Result<SearchOutcome> {
        let start = Instant::now();

        let (strategy, hits) = if use_agent {
            let arm_name = self.agent.select();
            let hits = self.run_arm(arm_name, query, top_k)?;
            (arm_name.to_string(), hits)
        } else {
            let state = self.state.read();
            if use_index {
                if let Some(index) = &state.index {
                    let rows = index.search(
                        &state.store,
                        query,
                        top_k,
                        self.config.default_nprobe(),
                        self.config.default_max_codes(),
                        None,
                    )?;
                    (
                        "ivf_balanced".to_string(),
                        Self::resolve_rows(&state.store, &rows)?,
                    )
                } else {
                    ("flat".to_string(), Self::flat_search(&state.store, query, top_k)?)
                }
            } else {
                ("flat".to_string(), Self::flat_search(&state.store, query, top_k)?)
            }
        };

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        if use_agent {
            self.agent.update(&strategy, latency_ms);
        }

        Ok(SearchOutcome {
            results: hits,
            latency_ms,
            strategy,
        })
    }

    fn run_arm(&self, arm_name: &str, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let spec = ARMS.iter().find(|a| a.name == arm_name);
        let state = self.state.read();

        match spec.and_then(|s| s.nprobe.zip(s.max_codes)) {
            Some((nprobe, max_codes)) => match &state.index {
                Some(index) => {
                    let rows = index.search(&state.store, query, top_k, nprobe, max_codes, None)?;
                    Self::resolve_rows(&state.store, &rows)
                }
                // IVF arm chosen but nothing has ever been trained: matches
                // spec.md's "untrained IVF search returns empty" contract.
                None => Ok(Vec::new()),
            },
            None => Self::flat_search(&state.store, query, top_k),
        }
    }

    fn flat_search(store: &DataStore, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != store.dim() {
            return Err(NanoIndexError::InvalidInput(format!(
                "query dim {} does not match store dim {}",
                query.len(),
                store.dim()
            )));
        }
        if store.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let norms = store.norms_sq();
        let dists = l2_sq_batch(query, store.all_vectors(), Some(&norms));

        let mut rows: Vec<usize> = (0..dists.len()).collect();
        let bound = top_k.min(rows.len());
        rows.select_nth_unstable_by(bound.saturating_sub(1).min(rows.len() - 1), |&a, &b| {
            dists[a]
                .partial_cmp(&dists[b])
                .unwrap()
                .then_with(|| a.cmp(&b))
        });
        rows.truncate(bound);
        rows.sort_by(|&a, &b| {
            dists[a]
                .partial_cmp(&dists[b])
                .unwrap()
                .then_with(|| a.cmp(&b))
        });

        rows.into_iter()
            .map(|row| {
                Ok(SearchHit {
                    id: store.external_id(row)?,
                    distance: dists[row],
                })
            })
            .collect()
    }

    fn resolve_rows(store: &DataStore, rows: &[nanoindex_index::ScoredRow]) -> Result<Vec<SearchHit>> {
        rows.iter()
            .map(|r| {
                Ok(SearchHit {
                    id: store.external_id(r.row)?,
                    distance: r.distance,
                })
            })
            .collect()
    }

    /// Clears `DataStore` and drops the `IVFIndex` (which holds row
    /// indices into the now-reset store and would otherwise be silently
    /// stale). Agent state is untouched — use `agent_reset` separately.
    pub fn reset(&self) -> Result<()> {
        let mut state = self.state.write();
        state.store.reset()?;
        state.index = None;
        let _ = std::fs::remove_file(self.data_dir.join(IVF_SNAPSHOT_FILE));
        Ok(())
    }

    pub fn agent_stats(&self) -> Vec<(&'static str, nanoindex_agent::ArmStats)> {
        self.agent.stats()
    }

    pub fn agent_reset(&self) {
        self.agent.reset();
    }
}
