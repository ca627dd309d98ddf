#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreRule {
    pub points: u32,
    pub min_correct: u32,
}

impl ScoreRule {
    pub const fn new(points: u32, min_correct: u32) -> Self {
        Self {
            points,
            min_correct,
        }
    }
}

pub const DEFAULT_SCORE_RULES: [ScoreRule; 6] = [
    ScoreRule::new(10, 35),
    ScoreRule::new(9, 33),
    ScoreRule::new(8, 31),
    ScoreRule::new(7, 29),
    ScoreRule::new(6, 27),
    ScoreRule::new(5, 25),
];

/// Step function from correct answers to points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreTable {
    // highest requirement first
    rules: Vec<ScoreRule>,
}

impl ScoreTable {
    pub fn new(mut rules: Vec<ScoreRule>) -> Self {
        rules.sort_by(|a, b| b.min_correct.cmp(&a.min_correct));
        Self { rules }
    }

    pub fn rules(&self) -> &[ScoreRule] {
        &self.rules
    }

    pub fn score(&self, correct: u32) -> u32 {
        self.rules
            .iter()
            .find(|rule| correct >= rule.min_correct)
            .map_or(0, |rule| rule.points)
    }
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self::new(DEFAULT_SCORE_RULES.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_steps() {
        let table = ScoreTable::default();
        assert_eq!(table.score(40), 10);
        assert_eq!(table.score(35), 10);
        assert_eq!(table.score(34), 9);
        assert_eq!(table.score(33), 9);
        assert_eq!(table.score(26), 5);
        assert_eq!(table.score(25), 5);
        assert_eq!(table.score(24), 0);
        assert_eq!(table.score(23), 0);
        assert_eq!(table.score(0), 0);
    }

    #[test]
    fn test_unsorted_rules_are_ordered() {
        let table = ScoreTable::new(vec![ScoreRule::new(1, 1), ScoreRule::new(3, 10)]);
        assert_eq!(table.rules()[0], ScoreRule::new(3, 10));
        assert_eq!(table.score(12), 3);
        assert_eq!(table.score(5), 1);
    }

    #[test]
    fn test_score_is_monotone() {
        let table = ScoreTable::default();
        let scores: Vec<u32> = (0..50).map(|c| table.score(c)).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_empty_table_scores_zero() {
        assert_eq!(ScoreTable::new(vec![]).score(100), 0);
    }
}
