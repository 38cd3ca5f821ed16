use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::settings::{MemorySettings, ScoreBand};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MemoryError {
    #[error("a memory game needs at least one pair of cards")]
    Empty,

    #[error("card count must be even, got {len}")]
    OddCount { len: usize },

    #[error("pair key {key} appears {count} time(s), expected exactly 2")]
    UnpairedKey { key: u32, count: usize },

    #[error("too many pairs: {pairs}")]
    TooManyPairs { pairs: usize },
}

//
// ─── CARDS ─────────────────────────────────────────────────────────────────────
//

/// Input definition of one card. Both cards of a pair share `pair_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDef {
    #[serde(rename = "content")]
    pub label: String,
    #[serde(rename = "pair")]
    pub pair_key: u32,
}

impl CardDef {
    #[must_use]
    pub fn new(label: impl Into<String>, pair_key: u32) -> Self {
        Self {
            label: label.into(),
            pair_key,
        }
    }

    /// Build a paired deck from unique labels: two cards per label.
    #[must_use]
    pub fn pairs<I, S>(labels: I) -> Vec<CardDef>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut defs = Vec::new();
        for (key, label) in (0_u32..).zip(labels) {
            let label = label.into();
            defs.push(CardDef::new(label.clone(), key));
            defs.push(CardDef::new(label, key));
        }
        defs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardFace {
    Hidden,
    Revealed,
    Matched,
}

/// A card on the table. `id` is its position in the shuffled deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryCard {
    id: usize,
    pair_key: u32,
    label: String,
    flipped: bool,
    matched: bool,
}

impl MemoryCard {
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn pair_key(&self) -> u32 {
        self.pair_key
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.matched
    }

    #[must_use]
    pub fn face(&self) -> CardFace {
        if self.matched {
            CardFace::Matched
        } else if self.flipped {
            CardFace::Revealed
        } else {
            CardFace::Hidden
        }
    }
}

//
// ─── OUTCOME / EVENTS ──────────────────────────────────────────────────────────
//

/// Final result of a memory game, produced exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryOutcome {
    pub score: u32,
    pub elapsed_secs: u32,
    pub moves: u32,
}

impl MemoryOutcome {
    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::for_score(self.score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryState {
    NotStarted,
    InProgress,
    Complete,
}

/// What a `flip_card` did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlipOutcome {
    /// Out of range, already face up or matched, or a pair is still pending.
    Rejected,
    /// First card of a move is now face up.
    Revealed { index: usize },
    Matched {
        indices: [usize; 2],
        completed: Option<MemoryOutcome>,
    },
    /// Both cards stay face up until `resolve_mismatch(epoch)` is called after
    /// the mismatch delay.
    Mismatched { indices: [usize; 2], epoch: u64 },
}

/// Immutable view of a memory game the host renders from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemorySnapshot {
    pub state: MemoryState,
    pub cards: Vec<MemoryCard>,
    pub pending: Vec<usize>,
    pub matched_pairs: u32,
    pub total_pairs: u32,
    pub moves: u32,
    pub elapsed_secs: u32,
    pub outcome: Option<MemoryOutcome>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Memory matching game over a shuffled deck of paired cards.
///
/// Two face-up cards are resolved synchronously inside `flip_card`. A matching
/// pair is locked in right away; a mismatch keeps both cards face up until the
/// host calls `resolve_mismatch` with the epoch it was handed, which lets a
/// reset invalidate any resolution still scheduled for the previous deal.
#[derive(Debug, Clone)]
pub struct MemorySession {
    defs: Vec<CardDef>,
    settings: MemorySettings,
    cards: Vec<MemoryCard>,
    pending: Vec<usize>,
    total_pairs: u32,
    matched_pairs: u32,
    moves: u32,
    elapsed_secs: u32,
    started: bool,
    epoch: u64,
    outcome: Option<MemoryOutcome>,
}

impl MemorySession {
    /// # Errors
    ///
    /// Returns `MemoryError` when the definitions are empty, odd in number, or
    /// a pair key does not occur exactly twice.
    pub fn new<R: Rng + ?Sized>(defs: Vec<CardDef>, rng: &mut R) -> Result<Self, MemoryError> {
        Self::with_settings(defs, MemorySettings::default(), rng)
    }

    /// # Errors
    ///
    /// See [`MemorySession::new`].
    pub fn with_settings<R: Rng + ?Sized>(
        defs: Vec<CardDef>,
        settings: MemorySettings,
        rng: &mut R,
    ) -> Result<Self, MemoryError> {
        let total_pairs = validate_deck(&defs)?;
        let mut session = Self {
            defs,
            settings,
            cards: Vec::new(),
            pending: Vec::with_capacity(2),
            total_pairs,
            matched_pairs: 0,
            moves: 0,
            elapsed_secs: 0,
            started: false,
            epoch: 0,
            outcome: None,
        };
        session.deal(rng);
        Ok(session)
    }

    fn deal<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut deck = self.defs.clone();
        deck.shuffle(rng);
        self.cards = deck
            .into_iter()
            .enumerate()
            .map(|(id, def)| MemoryCard {
                id,
                pair_key: def.pair_key,
                label: def.label,
                flipped: false,
                matched: false,
            })
            .collect();
    }

    #[must_use]
    pub fn settings(&self) -> MemorySettings {
        self.settings
    }

    #[must_use]
    pub fn cards(&self) -> &[MemoryCard] {
        &self.cards
    }

    #[must_use]
    pub fn pending(&self) -> &[usize] {
        &self.pending
    }

    #[must_use]
    pub fn total_pairs(&self) -> u32 {
        self.total_pairs
    }

    #[must_use]
    pub fn matched_pairs(&self) -> u32 {
        self.matched_pairs
    }

    #[must_use]
    pub fn moves(&self) -> u32 {
        self.moves
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    /// Generation counter, bumped on every reset.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn outcome(&self) -> Option<MemoryOutcome> {
        self.outcome
    }

    #[must_use]
    pub fn state(&self) -> MemoryState {
        if self.is_complete() {
            MemoryState::Complete
        } else if self.started {
            MemoryState::InProgress
        } else {
            MemoryState::NotStarted
        }
    }

    /// Whether the stopwatch should be running.
    #[must_use]
    pub fn is_timing(&self) -> bool {
        self.started && !self.is_complete()
    }

    /// Add one second to the stopwatch. Returns `false` when not timing.
    pub fn tick(&mut self) -> bool {
        if !self.is_timing() {
            return false;
        }
        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        true
    }

    pub fn flip_card(&mut self, index: usize) -> FlipOutcome {
        if self.is_complete() || self.pending.len() >= 2 {
            return FlipOutcome::Rejected;
        }
        let Some(card) = self.cards.get_mut(index) else {
            return FlipOutcome::Rejected;
        };
        if card.flipped || card.matched {
            return FlipOutcome::Rejected;
        }

        card.flipped = true;
        self.started = true;
        self.pending.push(index);

        if self.pending.len() == 2 {
            self.resolve_pair()
        } else {
            FlipOutcome::Revealed { index }
        }
    }

    fn resolve_pair(&mut self) -> FlipOutcome {
        let indices = [self.pending[0], self.pending[1]];
        self.moves = self.moves.saturating_add(1);

        if self.cards[indices[0]].pair_key != self.cards[indices[1]].pair_key {
            return FlipOutcome::Mismatched {
                indices,
                epoch: self.epoch,
            };
        }

        for i in indices {
            self.cards[i].matched = true;
        }
        self.matched_pairs += 1;
        self.pending.clear();

        FlipOutcome::Matched {
            indices,
            completed: self.check_complete(),
        }
    }

    fn check_complete(&mut self) -> Option<MemoryOutcome> {
        if self.outcome.is_some() || !self.started || self.matched_pairs != self.total_pairs {
            return None;
        }
        let outcome = MemoryOutcome {
            score: final_score(self.moves, self.elapsed_secs),
            elapsed_secs: self.elapsed_secs,
            moves: self.moves,
        };
        self.outcome = Some(outcome);
        Some(outcome)
    }

    /// Turn a mismatched pair face down again once the delay has elapsed.
    ///
    /// Returns `false` when `epoch` belongs to an earlier deal or there is no
    /// unresolved mismatch.
    pub fn resolve_mismatch(&mut self, epoch: u64) -> bool {
        if epoch != self.epoch || self.pending.len() != 2 {
            return false;
        }
        for i in self.pending.drain(..) {
            self.cards[i].flipped = false;
        }
        true
    }

    /// Reshuffle the same card definitions and start over.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.epoch = self.epoch.wrapping_add(1);
        self.pending.clear();
        self.matched_pairs = 0;
        self.moves = 0;
        self.elapsed_secs = 0;
        self.started = false;
        self.outcome = None;
        self.deal(rng);
    }

    #[must_use]
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            state: self.state(),
            cards: self.cards.clone(),
            pending: self.pending.clone(),
            matched_pairs: self.matched_pairs,
            total_pairs: self.total_pairs,
            moves: self.moves,
            elapsed_secs: self.elapsed_secs,
            outcome: self.outcome,
        }
    }
}

/// Check a deck definition and return its number of pairs.
///
/// # Errors
///
/// See [`MemorySession::new`].
pub fn validate_deck(defs: &[CardDef]) -> Result<u32, MemoryError> {
    if defs.is_empty() {
        return Err(MemoryError::Empty);
    }
    if defs.len() % 2 != 0 {
        return Err(MemoryError::OddCount { len: defs.len() });
    }
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for def in defs {
        *counts.entry(def.pair_key).or_default() += 1;
    }
    if let Some((&key, &count)) = counts.iter().find(|(_, count)| **count != 2) {
        return Err(MemoryError::UnpairedKey { key, count });
    }
    u32::try_from(counts.len()).map_err(|_| MemoryError::TooManyPairs {
        pairs: counts.len(),
    })
}

/// `max(0, 100 - moves - floor(elapsed / 10))`
fn final_score(moves: u32, elapsed_secs: u32) -> u32 {
    100_u32.saturating_sub(moves).saturating_sub(elapsed_secs / 10)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn three_pairs() -> Vec<CardDef> {
        CardDef::pairs(["Variable", "Fonction", "Boucle"])
    }

    fn positions_of(session: &MemorySession, key: u32) -> [usize; 2] {
        let found: Vec<usize> = session
            .cards()
            .iter()
            .filter(|c| c.pair_key() == key)
            .map(MemoryCard::id)
            .collect();
        [found[0], found[1]]
    }

    fn mismatched_pair(session: &MemorySession) -> [usize; 2] {
        let first = &session.cards()[0];
        let other = session
            .cards()
            .iter()
            .find(|c| c.pair_key() != first.pair_key())
            .unwrap();
        [first.id(), other.id()]
    }

    #[test]
    fn rejects_malformed_decks() {
        assert_eq!(
            MemorySession::new(Vec::new(), &mut rng()).unwrap_err(),
            MemoryError::Empty
        );
        let odd = vec![CardDef::new("a", 1), CardDef::new("a", 1), CardDef::new("b", 2)];
        assert_eq!(
            MemorySession::new(odd, &mut rng()).unwrap_err(),
            MemoryError::OddCount { len: 3 }
        );
        let triple = vec![
            CardDef::new("a", 1),
            CardDef::new("a", 1),
            CardDef::new("a", 1),
            CardDef::new("b", 2),
        ];
        assert_eq!(
            MemorySession::new(triple, &mut rng()).unwrap_err(),
            MemoryError::UnpairedKey { key: 1, count: 3 }
        );
    }

    #[test]
    fn deck_validation_counts_pairs() {
        assert_eq!(validate_deck(&three_pairs()), Ok(3));
        let err = MemoryError::TooManyPairs { pairs: 70_000 };
        assert_eq!(err.to_string(), "too many pairs: 70000");
        assert_ne!(err.to_string(), MemoryError::OddCount { len: 3 }.to_string());
    }

    #[test]
    fn deal_assigns_positions_as_ids() {
        let session = MemorySession::new(three_pairs(), &mut rng()).unwrap();
        assert_eq!(session.cards().len(), 6);
        assert_eq!(session.total_pairs(), 3);
        for (i, card) in session.cards().iter().enumerate() {
            assert_eq!(card.id(), i);
            assert_eq!(card.face(), CardFace::Hidden);
        }
        assert_eq!(session.state(), MemoryState::NotStarted);
    }

    #[test]
    fn same_seed_deals_same_layout() {
        let a = MemorySession::new(three_pairs(), &mut StdRng::seed_from_u64(99)).unwrap();
        let b = MemorySession::new(three_pairs(), &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a.cards(), b.cards());
    }

    #[test]
    fn three_clean_matches_in_twenty_seconds_score_95() {
        let mut session = MemorySession::new(three_pairs(), &mut rng()).unwrap();
        let mut completed = None;
        for key in 0..3 {
            let [a, b] = positions_of(&session, key);
            assert_eq!(session.flip_card(a), FlipOutcome::Revealed { index: a });
            if key == 0 {
                for _ in 0..20 {
                    session.tick();
                }
            }
            match session.flip_card(b) {
                FlipOutcome::Matched { completed: c, .. } => completed = c,
                other => panic!("expected a match, got {other:?}"),
            }
        }

        let outcome = completed.unwrap();
        assert_eq!(outcome.moves, 3);
        assert_eq!(outcome.elapsed_secs, 20);
        assert_eq!(outcome.score, 95);
        assert_eq!(session.state(), MemoryState::Complete);
        assert_eq!(session.matched_pairs(), 3);
    }

    #[test]
    fn mismatch_flips_back_only_after_resolution() {
        let mut session = MemorySession::new(three_pairs(), &mut rng()).unwrap();
        let [a, b] = mismatched_pair(&session);
        session.flip_card(a);
        let FlipOutcome::Mismatched { epoch, indices } = session.flip_card(b) else {
            panic!("expected mismatch");
        };
        assert_eq!(indices, [a, b]);
        assert_eq!(session.moves(), 1);
        assert!(session.cards()[a].is_flipped() && session.cards()[b].is_flipped());

        // a third card cannot be flipped while the pair is pending
        let third = (0..6).find(|i| *i != a && *i != b).unwrap();
        assert_eq!(session.flip_card(third), FlipOutcome::Rejected);

        assert!(session.resolve_mismatch(epoch));
        assert!(session.pending().is_empty());
        for i in [a, b] {
            assert_eq!(session.cards()[i].face(), CardFace::Hidden);
        }
        assert_eq!(session.matched_pairs(), 0);
        assert!(!session.resolve_mismatch(epoch));
    }

    #[test]
    fn flipping_face_up_or_matched_cards_is_rejected() {
        let mut session = MemorySession::new(three_pairs(), &mut rng()).unwrap();
        let [a, b] = positions_of(&session, 1);
        session.flip_card(a);
        assert_eq!(session.flip_card(a), FlipOutcome::Rejected);
        session.flip_card(b);
        assert_eq!(session.flip_card(a), FlipOutcome::Rejected);
        assert_eq!(session.flip_card(42), FlipOutcome::Rejected);
        assert_eq!(session.moves(), 1);
    }

    #[test]
    fn stopwatch_runs_only_while_in_progress() {
        let mut session = MemorySession::new(CardDef::pairs(["x"]), &mut rng()).unwrap();
        assert!(!session.tick());
        session.flip_card(0);
        assert!(session.tick());
        session.flip_card(1);
        assert!(session.is_complete());
        assert!(!session.tick());
        assert_eq!(session.elapsed_secs(), 1);
    }

    #[test]
    fn score_never_goes_negative() {
        assert_eq!(final_score(3, 20), 95);
        assert_eq!(final_score(90, 200), 0);
        assert_eq!(final_score(0, 9), 100);
        assert_eq!(final_score(100, 0), 0);
    }

    #[test]
    fn reset_reshuffles_and_invalidates_pending_mismatch() {
        let mut session = MemorySession::new(three_pairs(), &mut rng()).unwrap();
        let [a, b] = mismatched_pair(&session);
        session.flip_card(a);
        let FlipOutcome::Mismatched { epoch, .. } = session.flip_card(b) else {
            panic!("expected mismatch");
        };
        session.tick();

        session.reset(&mut rng());
        assert_eq!(session.moves(), 0);
        assert_eq!(session.elapsed_secs(), 0);
        assert_eq!(session.matched_pairs(), 0);
        assert!(session.pending().is_empty());
        assert_eq!(session.state(), MemoryState::NotStarted);
        assert!(session.cards().iter().all(|c| c.face() == CardFace::Hidden));

        // the stale resolution from before the reset must not touch the new deal
        let first = session.cards()[0].id();
        session.flip_card(first);
        assert!(!session.resolve_mismatch(epoch));
        assert!(session.cards()[first].is_flipped());
    }

    #[test]
    fn reset_after_completion_starts_fresh() {
        let mut session = MemorySession::new(CardDef::pairs(["x"]), &mut rng()).unwrap();
        session.flip_card(0);
        session.flip_card(1);
        assert!(session.outcome().is_some());

        session.reset(&mut rng());
        assert!(session.outcome().is_none());
        assert_eq!(session.moves(), 0);
        assert!(!session.is_started());
    }

    #[test]
    fn card_defs_read_stored_field_names() {
        let defs: Vec<CardDef> = serde_json::from_str(
            r#"[{"id":1,"content":"Variable","pair":1},{"id":2,"content":"Variable","pair":1}]"#,
        )
        .unwrap();
        assert_eq!(defs[0], CardDef::new("Variable", 1));
        assert!(MemorySession::new(defs, &mut rng()).is_ok());
    }
}
