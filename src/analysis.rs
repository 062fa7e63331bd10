use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use log::warn;
use rayon::prelude::*;
use serde_json::Value;

use crate::prepare::PreparationGate;

pub const DEFAULT_ANALYSIS_TTL: Duration = Duration::from_secs(600);

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Rich,
    Light,
}

#[derive(Debug)]
pub struct RichResponse {
    pub status: u16,
    pub payload: Option<Value>,
}

pub trait AnalysisSource: Send + Sync {
    fn fetch_rich(&self, match_id: &str) -> Result<RichResponse>;
    fn fetch_light(&self, match_id: &str) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Rich { payload: Value },
    Light { payload: Value, warning: String },
    Unavailable { error: String },
}

impl AnalysisOutcome {
    pub fn tier(&self) -> Option<Tier> {
        match self {
            AnalysisOutcome::Rich { .. } => Some(Tier::Rich),
            AnalysisOutcome::Light { .. } => Some(Tier::Light),
            AnalysisOutcome::Unavailable { .. } => None,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            AnalysisOutcome::Rich { payload } | AnalysisOutcome::Light { payload, .. } => {
                Some(payload)
            }
            AnalysisOutcome::Unavailable { .. } => None,
        }
    }
}

type CacheKey = (Tier, String);

struct CacheSlot {
    payload: Value,
    stored_at: Instant,
}

pub struct AnalysisCache<S> {
    source: S,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheSlot>>,
    inflight: Mutex<HashSet<CacheKey>>,
    inflight_done: Condvar,
    gate: Option<PreparationGate>,
}

impl<S: AnalysisSource> AnalysisCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_ANALYSIS_TTL,
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashSet::new()),
            inflight_done: Condvar::new(),
            gate: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_gate(mut self, gate: PreparationGate) -> Self {
        self.gate = Some(gate);
        self
    }

    // Rich first, light on any rich failure, unavailable only when both
    // tiers come up empty. Intermediate failures are absorbed here and
    // logged; they never reach the caller as errors.
    pub fn get_analysis(&self, match_id: &str) -> AnalysisOutcome {
        match self.fetch_once(Tier::Rich, match_id) {
            Ok(payload) => AnalysisOutcome::Rich { payload },
            Err(err) => {
                let warning = format!("rich analysis unavailable for {match_id}: {err:#}");
                warn!("{warning}");
                match self.fetch_once(Tier::Light, match_id) {
                    Ok(payload) => AnalysisOutcome::Light { payload, warning },
                    Err(light_err) => AnalysisOutcome::Unavailable {
                        error: format!("{light_err:#}"),
                    },
                }
            }
        }
    }

    // Warm the cache for many identifiers; per-id failures are counted,
    // never propagated.
    pub fn prefetch(&self, match_ids: &[String]) {
        let unavailable = match_ids
            .par_iter()
            .filter(|id| matches!(self.get_analysis(id), AnalysisOutcome::Unavailable { .. }))
            .count();
        if unavailable > 0 {
            warn!(
                "analysis prefetch: {unavailable} of {} ids unavailable",
                match_ids.len()
            );
        }
    }

    pub fn evict_expired(&self) {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("analysis cache lock poisoned");
        entries.retain(|_, slot| now.saturating_duration_since(slot.stored_at) < self.ttl);
    }

    fn fetch_once(&self, tier: Tier, match_id: &str) -> Result<Value> {
        let key = (tier, match_id.to_string());
        if let Some(hit) = self.claim(&key) {
            return Ok(hit);
        }
        let result = match tier {
            Tier::Rich => self.fetch_rich(match_id),
            Tier::Light => self.fetch_light(match_id),
        };
        self.release(&key, result.as_ref().ok());
        result
    }

    fn fetch_rich(&self, match_id: &str) -> Result<Value> {
        if let Some(gate) = &self.gate {
            gate.ensure_ready();
        }
        let response = self.source.fetch_rich(match_id)?;
        if !(200..300).contains(&response.status) {
            bail!("analysis endpoint returned status {}", response.status);
        }
        match response.payload {
            Some(payload @ Value::Object(_)) => Ok(payload),
            Some(_) => bail!("analysis endpoint returned a non-object payload"),
            None => bail!("analysis endpoint returned no payload"),
        }
    }

    fn fetch_light(&self, match_id: &str) -> Result<Value> {
        if let Some(gate) = &self.gate {
            gate.ensure_ready();
        }
        let payload = self.source.fetch_light(match_id)?;
        let Value::Object(fields) = &payload else {
            bail!("light preview returned a non-object payload");
        };
        if fields.is_empty() {
            bail!("light preview returned no data");
        }
        if let Some(detail) = fields.get("error") {
            bail!("light preview reported: {}", error_text(detail));
        }
        Ok(payload)
    }

    // Returns a fresh cached payload, or claims the (tier, id) slot for
    // this caller. Later callers for the same slot wait here until the
    // first fetch settles, then re-read the cache.
    fn claim(&self, key: &CacheKey) -> Option<Value> {
        let mut inflight = self.inflight.lock().expect("inflight set lock poisoned");
        loop {
            if let Some(hit) = self.cached(key) {
                return Some(hit);
            }
            if !inflight.contains(key) {
                inflight.insert(key.clone());
                return None;
            }
            inflight = self
                .inflight_done
                .wait(inflight)
                .expect("inflight set lock poisoned");
        }
    }

    fn release(&self, key: &CacheKey, payload: Option<&Value>) {
        if let Some(payload) = payload {
            let slot = CacheSlot {
                payload: payload.clone(),
                stored_at: self.clock.now(),
            };
            self.entries
                .lock()
                .expect("analysis cache lock poisoned")
                .insert(key.clone(), slot);
        }
        let mut inflight = self.inflight.lock().expect("inflight set lock poisoned");
        inflight.remove(key);
        self.inflight_done.notify_all();
    }

    fn cached(&self, key: &CacheKey) -> Option<Value> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("analysis cache lock poisoned");
        let stale = match entries.get(key) {
            Some(slot) if now.saturating_duration_since(slot.stored_at) < self.ttl => {
                return Some(slot.payload.clone());
            }
            Some(_) => true,
            None => false,
        };
        if stale {
            entries.remove(key);
        }
        None
    }
}

fn error_text(detail: &Value) -> String {
    match detail {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
