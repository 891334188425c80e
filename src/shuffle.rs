use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform permutation source shared by every place that reorders questions
/// or answer options. Seed it to make a run reproducible.
#[derive(Debug, Clone)]
pub struct Shuffler {
    rng: ChaCha8Rng,
}

impl Shuffler {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Fisher-Yates in place; every permutation is equally likely.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// Shuffles `options` and returns them with the new position of the
    /// option that was at `correct_index`.
    ///
    /// Positions are tracked rather than searched for, so duplicate option
    /// text cannot move the answer.
    pub fn shuffle_options(
        &mut self,
        options: Vec<String>,
        correct_index: usize,
    ) -> (Vec<String>, usize) {
        let mut tagged: Vec<(usize, String)> = options.into_iter().enumerate().collect();
        self.shuffle(&mut tagged);

        let new_index = tagged
            .iter()
            .position(|(original, _)| *original == correct_index)
            .unwrap_or(0);

        (tagged.into_iter().map(|(_, option)| option).collect(), new_index)
    }
}

impl Default for Shuffler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        ["red", "green", "blue", "yellow"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn same_seed_same_permutation() {
        let mut a = Shuffler::seeded(42);
        let mut b = Shuffler::seeded(42);
        let mut xs: Vec<u32> = (0..20).collect();
        let mut ys = xs.clone();
        a.shuffle(&mut xs);
        b.shuffle(&mut ys);
        assert_eq!(xs, ys);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut shuffler = Shuffler::seeded(7);
        let mut xs: Vec<u32> = (0..50).collect();
        shuffler.shuffle(&mut xs);
        let mut sorted = xs.clone();
        sorted.sort();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn correct_option_is_tracked() {
        let mut shuffler = Shuffler::seeded(3);
        for _ in 0..100 {
            let (shuffled, idx) = shuffler.shuffle_options(options(), 2);
            assert_eq!(shuffled.len(), 4);
            assert_eq!(shuffled[idx], "blue");
        }
    }

    #[test]
    fn duplicate_text_keeps_the_right_slot() {
        // a same-seeded index shuffle gives the permutation that was applied
        let mut shuffler = Shuffler::seeded(11);
        let mut reference = Shuffler::seeded(11);
        let dupes = vec!["same".to_string(), "same".to_string(), "other".to_string()];
        for _ in 0..50 {
            let (shuffled, idx) = shuffler.shuffle_options(dupes.clone(), 1);

            let mut order: Vec<usize> = (0..dupes.len()).collect();
            reference.shuffle(&mut order);
            let expected: Vec<String> = order.iter().map(|&i| dupes[i].clone()).collect();

            assert_eq!(shuffled, expected);
            assert_eq!(order[idx], 1);
        }
    }

    #[test]
    fn correct_position_has_no_bias() {
        let mut shuffler = Shuffler::seeded(2024);
        let trials = 8000;
        let mut counts = [0usize; 4];
        for _ in 0..trials {
            let (_, idx) = shuffler.shuffle_options(options(), 3);
            counts[idx] += 1;
        }
        // expected 2000 each; 4 standard deviations is ~155
        for count in counts {
            assert!((1800..=2200).contains(&count), "counts = {counts:?}");
        }
    }
}
