use crate::data::MentorId;
use rand::Rng;

/// Remaining mentor capacity for one program pool.
///
/// Mentors with capacity left are kept in `available` so a uniform draw is a
/// single index. A mentor whose capacity reaches zero is swap-removed, which
/// keeps draws deterministic for a given sequence of commits.
#[derive(Debug, Clone)]
pub struct CapacityPool {
    remaining: Vec<u32>,
    available: Vec<MentorId>,
    position: Vec<Option<usize>>,
}

impl CapacityPool {
    /// `mentor_count` is the size of the global mentor id space. Entries with
    /// zero capacity never become available.
    pub fn new(mentor_count: usize, entries: impl IntoIterator<Item = (MentorId, u32)>) -> Self {
        let mut pool = CapacityPool {
            remaining: vec![0; mentor_count],
            available: Vec::new(),
            position: vec![None; mentor_count],
        };
        for (mentor, capacity) in entries {
            if capacity == 0 {
                continue;
            }
            pool.remaining[mentor] = capacity;
            pool.position[mentor] = Some(pool.available.len());
            pool.available.push(mentor);
        }
        pool
    }

    pub fn is_exhausted(&self) -> bool {
        self.available.is_empty()
    }

    pub fn has_capacity(&self, mentor: MentorId) -> bool {
        self.remaining[mentor] > 0
    }

    pub fn mentor_count(&self) -> usize {
        self.available.len()
    }

    pub fn total_capacity(&self) -> u64 {
        self.available
            .iter()
            .map(|&m| u64::from(self.remaining[m]))
            .sum()
    }

    /// Uniform draw among mentors with capacity left. The pool must not be exhausted.
    pub fn random_mentor<R: Rng + ?Sized>(&self, rng: &mut R) -> MentorId {
        self.available[rng.random_range(0..self.available.len())]
    }

    /// Takes one seat from `mentor`.
    pub fn consume(&mut self, mentor: MentorId) {
        assert!(
            self.remaining[mentor] > 0,
            "mentor {mentor} assigned past its capacity"
        );
        self.remaining[mentor] -= 1;
        if self.remaining[mentor] > 0 {
            return;
        }

        let Some(idx) = self.position[mentor].take() else {
            unreachable!("mentor {mentor} had capacity but was not available");
        };
        self.available.swap_remove(idx);
        if let Some(&moved) = self.available.get(idx) {
            self.position[moved] = Some(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn zero_capacity_mentors_are_never_available() {
        let pool = CapacityPool::new(3, [(0, 0), (1, 2), (2, 0)]);
        assert_eq!(pool.mentor_count(), 1);
        assert!(!pool.has_capacity(0));
        assert!(pool.has_capacity(1));
        assert_eq!(pool.total_capacity(), 2);
    }

    #[test]
    fn consume_removes_exhausted_mentors() {
        let mut pool = CapacityPool::new(3, [(0, 1), (1, 2), (2, 1)]);
        pool.consume(0);
        assert!(!pool.has_capacity(0));
        assert_eq!(pool.mentor_count(), 2);

        pool.consume(1);
        assert!(pool.has_capacity(1));
        pool.consume(1);
        pool.consume(2);
        assert!(pool.is_exhausted());
        assert_eq!(pool.total_capacity(), 0);
    }

    #[test]
    fn random_mentor_only_draws_available_mentors() {
        let mut pool = CapacityPool::new(4, [(0, 1), (1, 1), (2, 1), (3, 1)]);
        pool.consume(1);
        pool.consume(3);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let m = pool.random_mentor(&mut rng);
            assert!(m == 0 || m == 2);
        }
    }

    #[test]
    #[should_panic(expected = "past its capacity")]
    fn consuming_an_exhausted_mentor_panics() {
        let mut pool = CapacityPool::new(1, [(0, 1)]);
        pool.consume(0);
        pool.consume(0);
    }
}
