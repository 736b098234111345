//! Long-term career challenges.
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeKind {
    Miles,
    Jobs,
    CleanJobs,
    Earnings,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Challenge {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: ChallengeKind,
    pub target: f64,
    pub reward: i64,
}

pub const CHALLENGES: [Challenge; 4] = [
    Challenge {
        id: "miles_5000",
        name: "Drive 5000 miles",
        kind: ChallengeKind::Miles,
        target: 5000.0,
        reward: 500,
    },
    Challenge {
        id: "jobs_20",
        name: "Complete 20 jobs",
        kind: ChallengeKind::Jobs,
        target: 20.0,
        reward: 750,
    },
    Challenge {
        id: "clean_10",
        name: "Avoid DOT violations for 10 jobs",
        kind: ChallengeKind::CleanJobs,
        target: 10.0,
        reward: 1000,
    },
    Challenge {
        id: "cash_50000",
        name: "Earn $50,000 total",
        kind: ChallengeKind::Earnings,
        target: 50_000.0,
        reward: 1500,
    },
];

fn challenge(kind: ChallengeKind) -> &'static Challenge {
    CHALLENGES
        .iter()
        .find(|c| c.kind == kind)
        .unwrap_or(&CHALLENGES[0])
}

/// Progress snapshot. Keys are challenge ids so that saves written by other
/// builds with extra challenges still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeState {
    #[serde(default)]
    pub progress: BTreeMap<String, f64>,
    #[serde(default)]
    pub completed: BTreeMap<String, bool>,
}

impl Default for ChallengeState {
    fn default() -> Self {
        Self {
            progress: CHALLENGES.iter().map(|c| (c.id.to_string(), 0.0)).collect(),
            completed: BTreeMap::new(),
        }
    }
}

/// Tracks challenge progress and reports newly completed ones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Challenges {
    state: ChallengeState,
    last_money: Option<i64>,
}

impl Challenges {
    #[must_use]
    pub const fn state(&self) -> &ChallengeState {
        &self.state
    }

    #[must_use]
    pub fn progress(&self, id: &str) -> f64 {
        self.state.progress.get(id).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn is_completed(&self, id: &str) -> bool {
        self.state.completed.get(id).copied().unwrap_or(false)
    }

    /// Replace progress from a save, keeping defaults for missing ids.
    pub fn import(&mut self, saved: ChallengeState) {
        let mut state = ChallengeState::default();
        for c in &CHALLENGES {
            if let Some(value) = saved.progress.get(c.id) {
                let value = if value.is_finite() { *value } else { 0.0 };
                state.progress.insert(c.id.to_string(), value.clamp(0.0, c.target));
            }
        }
        state.completed = saved.completed;
        self.state = state;
        self.last_money = None;
    }

    #[must_use]
    pub fn export(&self) -> ChallengeState {
        self.state.clone()
    }

    fn add(&mut self, kind: ChallengeKind, delta: f64) -> Option<&'static Challenge> {
        let c = challenge(kind);
        let entry = self.state.progress.entry(c.id.to_string()).or_insert(0.0);
        *entry = (*entry + delta).min(c.target);
        self.maybe_complete(c)
    }

    fn maybe_complete(&mut self, c: &'static Challenge) -> Option<&'static Challenge> {
        if self.is_completed(c.id) || self.progress(c.id) < c.target {
            return None;
        }
        self.state.completed.insert(c.id.to_string(), true);
        info!("challenge complete: {} (reward ${})", c.name, c.reward);
        Some(c)
    }

    pub fn record_miles(&mut self, miles: f64) -> Option<&'static Challenge> {
        if miles <= 0.0 {
            return None;
        }
        self.add(ChallengeKind::Miles, miles)
    }

    /// Count a delivery; a job carrying a DOT violation resets the clean streak.
    pub fn record_job_complete(&mut self, clean: bool) -> Vec<&'static Challenge> {
        let mut done = Vec::new();
        done.extend(self.add(ChallengeKind::Jobs, 1.0));
        if clean {
            done.extend(self.add(ChallengeKind::CleanJobs, 1.0));
        } else {
            self.record_violation();
        }
        done
    }

    pub fn record_violation(&mut self) {
        let c = challenge(ChallengeKind::CleanJobs);
        self.state.progress.insert(c.id.to_string(), 0.0);
    }

    /// Observe the current balance; positive changes since the last
    /// observation count toward the earnings challenge.
    pub fn track_money(&mut self, money: i64) -> Option<&'static Challenge> {
        let last = self.last_money.replace(money)?;
        let delta = money - last;
        if delta <= 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let earned = delta as f64;
        self.add(ChallengeKind::Earnings, earned)
    }
}
