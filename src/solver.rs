use crate::capacity::CapacityPool;
use crate::data::{
    Match, MatchingInput, MatchingOutput, Mentee, MenteeId, MentorId, PREFERENCE_SLOTS, Program,
    Ranks, Score, UnmatchedMentee,
};
use crate::error::MatchError;
use crate::summary;
use itertools::Itertools;
use log::{info, trace};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;

/// Runs the configured number of randomized trials and returns the lowest-scoring one.
pub fn solve(input: &MatchingInput) -> Result<MatchingOutput, MatchError> {
    let start_time = Instant::now();
    let trials = input.config.trials;
    if trials == 0 {
        return Err(MatchError::config("trials", "at least one trial is required"));
    }
    let problem = Problem::build(input)?;

    info!(
        "Finding approximate best matching over {} trials (seed {})...",
        trials, problem.seed
    );
    let best = problem
        .best_trial(trials)
        .ok_or_else(|| MatchError::config("trials", "no trial was run"))?;
    info!(
        "Best matching found in trial {} with score {} ({:.2?})",
        best.index,
        best.score,
        start_time.elapsed()
    );

    let output = problem.report(&best, trials);
    summary::log_summary(&output.summary, &output.unmatched);
    Ok(output)
}

/// One commitment of a mentee to a mentor inside a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub mentee: MenteeId,
    pub mentor: MentorId,
    pub rank: Score,
}

/// The result of one complete pass over every pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trial {
    pub index: usize,
    pub score: Score,
    pub assignments: Vec<Assignment>,
    pub unmatched: Vec<MenteeId>,
}

impl Trial {
    fn new(index: usize) -> Self {
        Trial {
            index,
            score: 0,
            assignments: Vec::new(),
            unmatched: Vec::new(),
        }
    }

    fn commit(&mut self, pool: &mut CapacityPool, mentee: MenteeId, mentor: MentorId, rank: Score) {
        pool.consume(mentor);
        self.assignments.push(Assignment {
            mentee,
            mentor,
            rank,
        });
        self.score += rank;
    }

    /// Lower score wins; on a tie the earlier trial is kept.
    fn better(self, other: Trial) -> Trial {
        if (other.score, other.index) < (self.score, self.index) {
            other
        } else {
            self
        }
    }
}

#[derive(Debug, Clone)]
struct Stage {
    program: Program,
    mentees: Vec<MenteeId>,
    capacity: CapacityPool,
}

/// Interned, validated form of a matching request. Read-only during trials.
#[derive(Debug)]
pub struct Problem {
    mentees: Vec<Mentee>,
    mentor_names: Vec<String>,
    preferences: Vec<[Option<MentorId>; PREFERENCE_SLOTS]>,
    stages: Vec<Stage>,
    ranks: Ranks,
    seed: u64,
}

impl Problem {
    pub fn build(input: &MatchingInput) -> Result<Self, MatchError> {
        let ranks = Ranks::new(&input.config.ranks)?;

        let mentees: Vec<Mentee> = input
            .mentees
            .iter()
            .map(Mentee::from_record)
            .collect::<Result<_, _>>()?;
        if let Some(name) = mentees.iter().map(|m| &m.name).duplicates().next() {
            return Err(MatchError::InvalidMentee {
                name: name.clone(),
                detail: "duplicate mentee name".to_string(),
            });
        }
        ranks.check_total(mentees.len())?;

        let mut mentor_ids: HashMap<String, MentorId> = HashMap::new();
        let mut mentor_names: Vec<String> = Vec::new();
        let mut intern = |name: &str| -> MentorId {
            *mentor_ids.entry(name.to_string()).or_insert_with(|| {
                mentor_names.push(name.to_string());
                mentor_names.len() - 1
            })
        };

        let mut mentor_entries: Vec<(Program, MentorId, u32)> = Vec::new();
        for mentor in &input.mentors {
            let name = mentor.name.trim();
            if name.is_empty() {
                return Err(MatchError::InvalidMentor {
                    name: name.to_string(),
                    detail: "name must not be empty".to_string(),
                });
            }
            let id = intern(name);
            if mentor_entries
                .iter()
                .any(|&(program, other, _)| program == mentor.program && other == id)
            {
                return Err(MatchError::InvalidMentor {
                    name: name.to_string(),
                    detail: format!("listed more than once for program {}", mentor.program),
                });
            }
            mentor_entries.push((mentor.program, id, mentor.capacity));
        }

        // Names nobody offers still get an id; they never have capacity in any pool.
        let preferences: Vec<[Option<MentorId>; PREFERENCE_SLOTS]> = mentees
            .iter()
            .map(|mentee| {
                let mut slots = [None; PREFERENCE_SLOTS];
                for (slot, pref) in slots.iter_mut().zip(&mentee.preferences) {
                    *slot = pref.as_deref().map(&mut intern);
                }
                slots
            })
            .collect();

        let mentor_count = mentor_names.len();
        let stages: Vec<Stage> = Program::ORDER
            .iter()
            .map(|&program| Stage {
                program,
                mentees: mentees
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| m.program == program)
                    .map(|(id, _)| id)
                    .collect(),
                capacity: CapacityPool::new(
                    mentor_count,
                    mentor_entries
                        .iter()
                        .filter(|(p, _, _)| *p == program)
                        .map(|&(_, id, capacity)| (id, capacity)),
                ),
            })
            .collect();

        info!(
            "{} of {} mentees gave no preferences",
            mentees.iter().filter(|m| !m.has_preference()).count(),
            mentees.len()
        );
        for stage in &stages {
            info!(
                "{} pool: {} mentees, {} mentors, total capacity {}",
                stage.program,
                stage.mentees.len(),
                stage.capacity.mentor_count(),
                stage.capacity.total_capacity()
            );
        }

        Ok(Problem {
            mentees,
            mentor_names,
            preferences,
            stages,
            ranks,
            seed: input.config.seed,
        })
    }

    /// Runs trials `0..trials` in parallel and keeps the best one.
    pub fn best_trial(&self, trials: usize) -> Option<Trial> {
        (0..trials)
            .into_par_iter()
            .map(|index| self.run_trial(index))
            .reduce_with(Trial::better)
    }

    /// One full trial. Its randomness depends only on the seed and `index`.
    pub fn run_trial(&self, index: usize) -> Trial {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(index as u64);

        let mut trial = Trial::new(index);
        let mut carried: Vec<MenteeId> = Vec::new();
        for stage in &self.stages {
            let mut capacity = stage.capacity.clone();
            carried.extend_from_slice(&stage.mentees);
            carried = self.match_pass(carried, &mut capacity, &mut rng, &mut trial);
        }
        trial.unmatched = carried;

        trace!("trial {} scored {}", index, trial.score);
        trial
    }

    /// Splits mentees into those with at least one preference and those with
    /// none, keeping input order within each group.
    pub fn partition_by_preference(&self, mentees: Vec<MenteeId>) -> (Vec<MenteeId>, Vec<MenteeId>) {
        mentees
            .into_iter()
            .partition(|&m| self.preferences[m].iter().any(Option::is_some))
    }

    /// Matches `mentees` against one pool, consuming its capacity. Returns the
    /// mentees that could not be placed: leftover preferred ones first.
    pub fn match_pass<R: Rng + ?Sized>(
        &self,
        mentees: Vec<MenteeId>,
        pool: &mut CapacityPool,
        rng: &mut R,
        trial: &mut Trial,
    ) -> Vec<MenteeId> {
        let (mut preferred, unpreferred) = self.partition_by_preference(mentees);
        preferred.shuffle(rng);

        let mut placed_preferred = 0;
        for &mentee in &preferred {
            if pool.is_exhausted() {
                break;
            }
            let (slot, wanted) = self.pick_preference(mentee, rng);
            if pool.has_capacity(wanted) {
                trial.commit(pool, mentee, wanted, self.ranks.for_slot(slot));
            } else {
                let mentor = pool.random_mentor(rng);
                trial.commit(pool, mentee, mentor, self.ranks.fallback());
            }
            placed_preferred += 1;
        }

        let mut placed_unpreferred = 0;
        for &mentee in &unpreferred {
            if pool.is_exhausted() {
                break;
            }
            let mentor = pool.random_mentor(rng);
            trial.commit(pool, mentee, mentor, self.ranks.fallback());
            placed_unpreferred += 1;
        }

        preferred
            .into_iter()
            .skip(placed_preferred)
            .chain(unpreferred.into_iter().skip(placed_unpreferred))
            .collect()
    }

    /// Uniform choice among the mentee's filled slots.
    fn pick_preference<R: Rng + ?Sized>(&self, mentee: MenteeId, rng: &mut R) -> (usize, MentorId) {
        let filled = || {
            self.preferences[mentee]
                .iter()
                .enumerate()
                .filter_map(|(slot, pref)| pref.map(|m| (slot, m)))
        };
        let pick = rng.random_range(0..filled().count());
        match filled().nth(pick) {
            Some(choice) => choice,
            None => unreachable!("mentee {mentee} has no preference at index {pick}"),
        }
    }

    pub fn report(&self, trial: &Trial, trials: usize) -> MatchingOutput {
        let matches: Vec<Match> = trial
            .assignments
            .iter()
            .map(|a| Match {
                mentee: self.mentees[a.mentee].name.clone(),
                mentor: self.mentor_names[a.mentor].clone(),
                rank: a.rank,
            })
            .collect();
        let unmatched = trial
            .unmatched
            .iter()
            .map(|&m| UnmatchedMentee {
                name: self.mentees[m].name.clone(),
                program: self.mentees[m].program,
            })
            .collect();
        let summary = summary::tally(&matches, &self.ranks);

        MatchingOutput {
            matches,
            unmatched,
            score: trial.score,
            best_trial: trial.index,
            trials,
            summary,
        }
    }
}
