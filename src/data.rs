use crate::error::MatchError;
use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type Score = i64;
pub type MentorId = usize;
pub type MenteeId = usize;

/// Number of ranked mentor choices a mentee may give.
pub const PREFERENCE_SLOTS: usize = 3;

pub const DEFAULT_RANKS: [Score; 4] = [0, 2, 5, 20];
pub const DEFAULT_TRIALS: usize = 100_000;
pub const DEFAULT_SEED: u64 = 42;

/// Program category. Selects which capacity pool a mentee is matched against first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String")]
pub enum Program {
    #[serde(rename = "MS")]
    Ms,
    #[serde(rename = "PhD")]
    Phd,
}

impl Program {
    /// Pool processing order. Leftovers of one pool cascade into the next.
    pub const ORDER: [Program; 2] = [Program::Ms, Program::Phd];
}

impl TryFrom<String> for Program {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim() {
            "MS" => Ok(Program::Ms),
            "PhD" => Ok(Program::Phd),
            other => Err(format!("unknown program `{other}`, expected `MS` or `PhD`")),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Program::Ms => write!(f, "MS"),
            Program::Phd => write!(f, "PhD"),
        }
    }
}

/// A mentee as received from the loader.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MenteeRecord {
    pub name: String,
    pub program: Program,
    #[serde(default)]
    pub preferences: Vec<Option<String>>,
}

/// A validated mentee with exactly three preference slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mentee {
    pub name: String,
    pub program: Program,
    pub preferences: [Option<String>; PREFERENCE_SLOTS],
}

impl Mentee {
    pub fn from_record(record: &MenteeRecord) -> Result<Self, MatchError> {
        let name = record.name.trim().to_string();
        if name.is_empty() {
            return Err(MatchError::InvalidMentee {
                name,
                detail: "name must not be empty".to_string(),
            });
        }
        if record.preferences.len() > PREFERENCE_SLOTS {
            return Err(MatchError::InvalidMentee {
                name,
                detail: format!(
                    "{} preferences given, at most {PREFERENCE_SLOTS} allowed",
                    record.preferences.len()
                ),
            });
        }

        let mut preferences: [Option<String>; PREFERENCE_SLOTS] = Default::default();
        for (slot, pref) in preferences.iter_mut().zip(&record.preferences) {
            *slot = pref
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string);
        }

        Ok(Mentee {
            name,
            program: record.program,
            preferences,
        })
    }

    pub fn has_preference(&self) -> bool {
        self.preferences.iter().any(Option::is_some)
    }
}

/// A mentor and how many mentees they can still take.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MentorRecord {
    pub name: String,
    pub program: Program,
    pub capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingConfig {
    #[serde(default = "default_ranks")]
    pub ranks: Vec<Score>,
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_ranks() -> Vec<Score> {
    DEFAULT_RANKS.to_vec()
}

fn default_trials() -> usize {
    DEFAULT_TRIALS
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            ranks: default_ranks(),
            trials: default_trials(),
            seed: default_seed(),
        }
    }
}

/// The four admissible rank values, ascending. Slots 0..=2 are the
/// preference ranks, the last one is the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranks([Score; 4]);

impl Ranks {
    pub const LABELS: [&'static str; 4] =
        ["First Choice", "Second Choice", "Third Choice", "Unranked"];

    pub fn new(values: &[Score]) -> Result<Self, MatchError> {
        let mut ranks: [Score; 4] = values.try_into().map_err(|_| {
            MatchError::config(
                "ranks",
                format!("expected exactly 4 values, got {}", values.len()),
            )
        })?;
        ranks.sort_unstable();
        if ranks.windows(2).any(|w| w[0] == w[1]) {
            return Err(MatchError::config(
                "ranks",
                format!("values must be distinct, got {values:?}"),
            ));
        }
        Ok(Ranks(ranks))
    }

    /// Rejects rank values whose sum over `mentees` matches could leave the `Score` range.
    pub fn check_total(&self, mentees: usize) -> Result<(), MatchError> {
        let largest = self.0.iter().map(|r| r.unsigned_abs()).max().unwrap_or(0);
        let bound = u128::from(largest) * mentees as u128;
        if bound > Score::MAX as u128 {
            return Err(MatchError::config(
                "ranks",
                format!("values {:?} overflow the score total for {mentees} mentees", self.0),
            ));
        }
        Ok(())
    }

    pub fn for_slot(&self, slot: usize) -> Score {
        debug_assert!(slot < PREFERENCE_SLOTS);
        self.0[slot]
    }

    pub fn fallback(&self) -> Score {
        self.0[3]
    }

    pub fn values(&self) -> &[Score; 4] {
        &self.0
    }
}

/// The complete input for one matching run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingInput {
    pub mentees: Vec<MenteeRecord>,
    pub mentors: Vec<MentorRecord>,
    #[serde(default)]
    pub config: MatchingConfig,
}

/// One mentee assigned to one mentor, with the rank that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Match {
    pub mentee: String,
    pub mentor: String,
    pub rank: Score,
}

/// A mentee left without a mentor because capacity ran out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedMentee {
    pub name: String,
    pub program: Program,
}

/// How many matches of the best trial used one rank value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankTally {
    pub label: String,
    pub rank: Score,
    pub count: usize,
}

impl fmt::Display for RankTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.label, self.rank, self.count)
    }
}

/// The final output of the matcher.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingOutput {
    pub matches: Vec<Match>,
    pub unmatched: Vec<UnmatchedMentee>,
    pub score: Score,
    pub best_trial: usize,
    pub trials: usize,
    pub summary: Vec<RankTally>,
}
