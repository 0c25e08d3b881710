use dashmap::DashMap;
use indexmap::IndexMap;

/// Result of applying one score update to a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The player was not on the board before; lists any entries evicted to
    /// stay within the cap.
    Inserted { evicted: Vec<String> },
    /// The player was already on the board with a different score.
    Updated { previous: i64 },
    /// The player was already on the board with this exact score. Reapplying
    /// an event (bus redelivery) lands here and changes nothing.
    Unchanged,
}

/// Bounded in-memory ranking for a single game type.
///
/// Maps `display_name` to the player's most recently applied score —
/// last-write-wins, not best-score-wins: a later, lower submission replaces
/// a higher one. That matches the system this cache fronts and is kept on
/// purpose.
///
/// Ordering: score descending, ties broken by first-insertion order (the
/// map keeps a key's position across overwrites). Eviction removes from the
/// tail of that same order, so the entry ranked last goes first.
#[derive(Debug, Clone)]
pub struct Leaderboard {
    entries: IndexMap<String, i64>,
    cap: usize,
}

impl Leaderboard {
    /// Empty board retaining at most `cap` entries (`cap` ≥ 1).
    pub fn new(cap: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            cap: cap.max(1),
        }
    }

    /// Insert or overwrite a player's score, evicting beyond the cap.
    ///
    /// Idempotent: applying the same `(display_name, score)` twice leaves
    /// the board identical to applying it once.
    pub fn apply(&mut self, display_name: &str, score: i64) -> UpdateOutcome {
        match self.entries.insert(display_name.to_owned(), score) {
            Some(previous) if previous == score => UpdateOutcome::Unchanged,
            Some(previous) => UpdateOutcome::Updated { previous },
            None => UpdateOutcome::Inserted {
                evicted: self.evict_over_cap(),
            },
        }
    }

    /// The `limit` best entries in rank order as `(display_name, score)`.
    pub fn top(&self, limit: usize) -> Vec<(String, i64)> {
        let mut ranked: Vec<(&String, i64)> = self
            .entries
            .iter()
            .map(|(name, score)| (name, *score))
            .collect();
        // Stable sort on an insertion-ordered map: ties stay in
        // first-insertion order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(limit)
            .map(|(name, score)| (name.clone(), score))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove worst-ranked entries until the board is back at the cap.
    fn evict_over_cap(&mut self) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.cap {
            let Some(index) = self.worst_index() else {
                break;
            };
            if let Some((name, _)) = self.entries.shift_remove_index(index) {
                evicted.push(name);
            }
        }
        evicted
    }

    /// Index of the entry ranked last: lowest score, and among equal lowest
    /// scores the most recently inserted one.
    fn worst_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .min_by(|(index_a, (_, score_a)), (index_b, (_, score_b))| {
                score_a.cmp(score_b).then(index_b.cmp(index_a))
            })
            .map(|(index, _)| index)
    }
}

/// Registry of per-game-type leaderboards, owned by the application state
/// and handed to the submission, updater, and query paths.
///
/// Boards are created lazily on first write and never torn down. Each
/// update (overwrite plus any eviction) runs under the map shard's write
/// guard, so it is atomic with respect to concurrent updates; boards for
/// different game types are independent.
///
/// Concurrent submissions for the same player resolve to "the last update
/// applied wins", which under true concurrency is not necessarily the
/// temporally last submission.
pub struct RankingCache {
    boards: DashMap<String, Leaderboard>,
    cap: usize,
}

impl RankingCache {
    /// Empty registry whose boards each retain at most `cap` entries.
    pub fn new(cap: usize) -> Self {
        Self {
            boards: DashMap::new(),
            cap,
        }
    }

    /// Apply one score update to the board for `game_type`, creating the
    /// board on first use.
    pub fn apply(&self, game_type: &str, display_name: &str, score: i64) -> UpdateOutcome {
        let mut board = self
            .boards
            .entry(game_type.to_owned())
            .or_insert_with(|| Leaderboard::new(self.cap));
        board.apply(display_name, score)
    }

    /// Top `limit` entries for `game_type`; `None` when no board exists yet.
    pub fn top(&self, game_type: &str, limit: usize) -> Option<Vec<(String, i64)>> {
        self.boards.get(game_type).map(|board| board.top(limit))
    }

    /// Number of entries on the board for `game_type` (0 when absent).
    pub fn board_len(&self, game_type: &str) -> usize {
        self.boards
            .get(game_type)
            .map(|board| board.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_orders_by_score_descending() {
        let mut board = Leaderboard::new(10);
        board.apply("Alice", 100);
        board.apply("Bob", 200);
        board.apply("Cara", 150);

        assert_eq!(
            board.top(3),
            vec![
                ("Bob".to_owned(), 200),
                ("Cara".to_owned(), 150),
                ("Alice".to_owned(), 100),
            ]
        );
    }

    #[test]
    fn ties_keep_first_insertion_order() {
        let mut board = Leaderboard::new(10);
        board.apply("First", 50);
        board.apply("Second", 50);
        board.apply("Third", 50);

        let names: Vec<String> = board.top(3).into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn overwrite_keeps_original_tie_position() {
        let mut board = Leaderboard::new(10);
        board.apply("First", 50);
        board.apply("Second", 50);
        // Re-submitting First must not move it behind Second.
        board.apply("First", 50);
        board.apply("First", 60);
        board.apply("First", 50);

        let names: Vec<String> = board.top(2).into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn last_write_wins_even_when_lower() {
        let mut board = Leaderboard::new(10);
        board.apply("Alice", 100);
        let outcome = board.apply("Alice", 50);

        assert_eq!(outcome, UpdateOutcome::Updated { previous: 100 });
        assert_eq!(board.top(1), vec![("Alice".to_owned(), 50)]);
    }

    #[test]
    fn reapplying_same_event_is_a_no_op() {
        let mut board = Leaderboard::new(10);
        board.apply("Alice", 100);
        board.apply("Bob", 100);

        let before = board.top(10);
        let outcome = board.apply("Alice", 100);
        assert_eq!(outcome, UpdateOutcome::Unchanged);
        assert_eq!(board.top(10), before);
    }

    #[test]
    fn cap_evicts_lowest_scores() {
        let mut board = Leaderboard::new(2);
        board.apply("Low", 10);
        board.apply("Mid", 20);
        let outcome = board.apply("High", 30);

        assert_eq!(
            outcome,
            UpdateOutcome::Inserted {
                evicted: vec!["Low".to_owned()]
            }
        );
        assert_eq!(board.len(), 2);
        assert_eq!(
            board.top(2),
            vec![("High".to_owned(), 30), ("Mid".to_owned(), 20)]
        );
    }

    #[test]
    fn eviction_among_tied_lowest_removes_most_recent() {
        let mut board = Leaderboard::new(2);
        board.apply("OldTied", 10);
        board.apply("NewTied", 10);
        let outcome = board.apply("Top", 30);

        assert_eq!(
            outcome,
            UpdateOutcome::Inserted {
                evicted: vec!["NewTied".to_owned()]
            }
        );
        let names: Vec<String> = board.top(2).into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Top", "OldTied"]);
    }

    #[test]
    fn size_never_exceeds_cap() {
        let mut board = Leaderboard::new(5);
        for i in 0..100 {
            board.apply(&format!("player-{i}"), i);
            assert!(board.len() <= 5);
        }
        // Highest five survive.
        let scores: Vec<i64> = board.top(5).into_iter().map(|(_, score)| score).collect();
        assert_eq!(scores, vec![99, 98, 97, 96, 95]);
    }

    #[test]
    fn top_with_limit_beyond_len_returns_everything() {
        let mut board = Leaderboard::new(10);
        board.apply("Alice", 1);
        assert_eq!(board.top(50).len(), 1);
    }

    #[test]
    fn cache_creates_boards_lazily() {
        let cache = RankingCache::new(100);
        assert_eq!(cache.top("snake", 5), None);

        cache.apply("snake", "Alice", 10);
        assert_eq!(cache.top("snake", 5), Some(vec![("Alice".to_owned(), 10)]));
        assert_eq!(cache.top("tetris", 5), None);
    }

    #[test]
    fn cache_boards_are_independent() {
        let cache = RankingCache::new(100);
        cache.apply("snake", "Alice", 10);
        cache.apply("tetris", "Alice", 99);

        assert_eq!(cache.top("snake", 5), Some(vec![("Alice".to_owned(), 10)]));
        assert_eq!(cache.top("tetris", 5), Some(vec![("Alice".to_owned(), 99)]));
        assert_eq!(cache.board_len("snake"), 1);
        assert_eq!(cache.board_len("pong"), 0);
    }
}
