use std::collections::HashSet;
use std::fmt;

use rand::{seq::SliceRandom, Rng};

use crate::difficulty::Difficulty;

/// Identifies a grid cell by its operands; renders as `3x4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub a: u32,
    pub b: u32,
}

impl Cell {
    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.a, self.b)
    }
}

/// A single multiplication question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub a: u32,
    pub b: u32,
    pub result: u32,
}

impl Question {
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            a,
            b,
            result: a * b,
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.a, self.b)
    }
}

/// Every `(a, b)` pair in `1..=max_range`, row-major, shuffled
pub fn generate_pool<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Vec<Question> {
    let max = difficulty.max_range();
    let mut pool: Vec<Question> = (1..=max)
        .flat_map(|a| (1..=max).map(move |b| Question::new(a, b)))
        .collect();
    pool.shuffle(rng);
    pool
}

/// Same as [`generate_pool`] minus cells the player has already solved
pub fn generate_pool_excluding<R: Rng + ?Sized>(
    difficulty: Difficulty,
    solved: &HashSet<Cell>,
    rng: &mut R,
) -> Vec<Question> {
    let mut pool = generate_pool(difficulty, rng);
    pool.retain(|q| !solved.contains(&q.cell()));
    pool
}

/// Working set of not-yet-asked questions for the current pass
#[derive(Debug, Clone, Default)]
pub struct QuestionPool {
    questions: Vec<Question>,
}

impl QuestionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regenerate<R: Rng + ?Sized>(&mut self, difficulty: Difficulty, rng: &mut R) {
        self.questions = generate_pool(difficulty, rng);
    }

    pub fn regenerate_excluding<R: Rng + ?Sized>(
        &mut self,
        difficulty: Difficulty,
        solved: &HashSet<Cell>,
        rng: &mut R,
    ) {
        self.questions = generate_pool_excluding(difficulty, solved, rng);
    }

    pub fn pop(&mut self) -> Option<Question> {
        self.questions.pop()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[cfg(test)]
    fn contains(&self, cell: Cell) -> bool {
        self.questions.iter().any(|q| q.cell() == cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_pool_is_permutation_of_full_product() {
        let mut rng = StdRng::seed_from_u64(7);
        for difficulty in Difficulty::ALL {
            let pool = generate_pool(difficulty, &mut rng);
            let max = difficulty.max_range();
            assert_eq!(pool.len(), difficulty.total_cells());

            let cells: HashSet<Cell> = pool.iter().map(Question::cell).collect();
            assert_eq!(cells.len(), pool.len(), "no duplicates for {difficulty}");
            for a in 1..=max {
                for b in 1..=max {
                    assert!(cells.contains(&Cell::new(a, b)), "{a}x{b} missing");
                }
            }
        }
    }

    #[test]
    fn test_every_result_is_the_product() {
        let mut rng = StdRng::seed_from_u64(1);
        for q in generate_pool(Difficulty::Hard, &mut rng) {
            assert_eq!(q.result, q.a * q.b);
            assert!((1..=12).contains(&q.a));
            assert!((1..=12).contains(&q.b));
        }
    }

    #[test]
    fn test_same_seed_same_order() {
        let first = generate_pool(Difficulty::Medium, &mut StdRng::seed_from_u64(42));
        let second = generate_pool(Difficulty::Medium, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_pool_is_shuffled() {
        let mut rng = StdRng::seed_from_u64(3);
        let pool = generate_pool(Difficulty::Hard, &mut rng);
        let row_major: Vec<Question> = (1..=12)
            .flat_map(|a| (1..=12).map(move |b| Question::new(a, b)))
            .collect();
        assert_ne!(pool, row_major);
    }

    #[test]
    fn test_excluding_solved_cells() {
        let mut rng = StdRng::seed_from_u64(9);
        let solved: HashSet<Cell> = [Cell::new(3, 4), Cell::new(1, 1)].into_iter().collect();
        let pool = generate_pool_excluding(Difficulty::Easy, &solved, &mut rng);
        assert_eq!(pool.len(), 23);
        assert!(pool.iter().all(|q| !solved.contains(&q.cell())));
    }

    #[test]
    fn test_excluding_everything_yields_empty_pool() {
        let mut rng = StdRng::seed_from_u64(9);
        let solved: HashSet<Cell> = generate_pool(Difficulty::Easy, &mut rng)
            .iter()
            .map(Question::cell)
            .collect();
        let pool = generate_pool_excluding(Difficulty::Easy, &solved, &mut rng);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_question_pool_pop_drains_each_once() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut pool = QuestionPool::new();
        assert!(pool.is_empty());
        pool.regenerate(Difficulty::Easy, &mut rng);
        assert_eq!(pool.len(), 25);

        let mut seen = HashSet::new();
        while let Some(q) = pool.pop() {
            assert!(seen.insert(q.cell()), "{} drawn twice", q.cell());
            assert!(!pool.contains(q.cell()));
        }
        assert_eq!(seen.len(), 25);
        assert!(pool.pop().is_none());
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::new(3, 4).to_string(), "3x4");
        assert_eq!(Question::new(7, 8).cell().to_string(), "7x8");
        assert_eq!(Question::new(7, 8).result, 56);
    }
}
