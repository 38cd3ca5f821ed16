use learn_core::games::{FlipOutcome, MemoryOutcome, MemorySession, MemorySnapshot};
use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use super::{COMMAND_BUFFER, DriverError, ticker};

enum Command {
    Flip(usize, oneshot::Sender<FlipOutcome>),
    Reset(oneshot::Sender<()>),
    Snapshot(oneshot::Sender<MemorySnapshot>),
}

/// Handle to a memory game running on its own task.
///
/// The task runs the stopwatch from the first flip and turns mismatched pairs
/// back over after the session's mismatch delay.
pub struct MemoryDriver {
    commands: mpsc::Sender<Command>,
    outcomes: mpsc::UnboundedReceiver<MemoryOutcome>,
    task: JoinHandle<()>,
}

impl MemoryDriver {
    /// Move `session` onto a new task; `rng` reshuffles the deck on reset.
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn<R>(session: MemorySession, rng: R) -> Self
    where
        R: Rng + Send + 'static,
    {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let (done, outcomes) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(session, rng, rx, done));
        Self {
            commands,
            outcomes,
            task,
        }
    }

    /// # Errors
    ///
    /// Returns `DriverError::Closed` if the task has stopped.
    pub async fn flip_card(&self, index: usize) -> Result<FlipOutcome, DriverError> {
        self.request(|reply| Command::Flip(index, reply)).await
    }

    /// Reshuffle and start over. A mismatch waiting to flip back is dropped.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Closed` if the task has stopped.
    pub async fn reset(&self) -> Result<(), DriverError> {
        self.request(Command::Reset).await
    }

    /// # Errors
    ///
    /// Returns `DriverError::Closed` if the task has stopped.
    pub async fn snapshot(&self) -> Result<MemorySnapshot, DriverError> {
        self.request(Command::Snapshot).await
    }

    /// Wait for the next completed play-through.
    pub async fn next_outcome(&mut self) -> Option<MemoryOutcome> {
        self.outcomes.recv().await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, DriverError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| DriverError::Closed)?;
        response.await.map_err(|_| DriverError::Closed)
    }
}

impl Drop for MemoryDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<R: Rng>(
    mut session: MemorySession,
    mut rng: R,
    mut commands: mpsc::Receiver<Command>,
    outcomes: mpsc::UnboundedSender<MemoryOutcome>,
) {
    let delay = session.settings().mismatch_delay();
    let mut stopwatch = ticker();
    let flip_back = time::sleep(delay);
    tokio::pin!(flip_back);
    // Epoch of the mismatch waiting on `flip_back`, if any.
    let mut pending: Option<u64> = None;

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Flip(index, reply) => {
                        let was_timing = session.is_timing();
                        let outcome = session.flip_card(index);
                        if !was_timing && session.is_timing() {
                            stopwatch.reset();
                        }
                        match &outcome {
                            FlipOutcome::Mismatched { epoch, .. } => {
                                pending = Some(*epoch);
                                flip_back.as_mut().reset(Instant::now() + delay);
                            }
                            FlipOutcome::Matched { completed: Some(done), .. } => {
                                tracing::info!(
                                    score = done.score,
                                    moves = done.moves,
                                    elapsed_secs = done.elapsed_secs,
                                    "memory game completed"
                                );
                                let _ = outcomes.send(*done);
                            }
                            _ => {}
                        }
                        let _ = reply.send(outcome);
                    }
                    Command::Reset(reply) => {
                        session.reset(&mut rng);
                        pending = None;
                        stopwatch.reset();
                        let _ = reply.send(());
                    }
                    Command::Snapshot(reply) => {
                        let _ = reply.send(session.snapshot());
                    }
                }
            }
            _ = stopwatch.tick(), if session.is_timing() => {
                session.tick();
            }
            () = &mut flip_back, if pending.is_some() => {
                if let Some(epoch) = pending.take() {
                    session.resolve_mismatch(epoch);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learn_core::games::{CardDef, CardFace, MemorySettings, MemoryState};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn spawn(labels: &[&str]) -> MemoryDriver {
        let mut rng = StdRng::seed_from_u64(7);
        let session = MemorySession::new(CardDef::pairs(labels.iter().copied()), &mut rng).unwrap();
        MemoryDriver::spawn(session, rng)
    }

    /// Indices of a matching pair and of a card from a different pair.
    fn layout(snapshot: &MemorySnapshot) -> ([usize; 2], usize) {
        let first = &snapshot.cards[0];
        let twin = snapshot
            .cards
            .iter()
            .position(|c| c.id() != first.id() && c.pair_key() == first.pair_key())
            .unwrap();
        let other = snapshot
            .cards
            .iter()
            .position(|c| c.pair_key() != first.pair_key())
            .unwrap();
        ([0, twin], other)
    }

    #[tokio::test(start_paused = true)]
    async fn mismatched_cards_flip_back_after_the_delay() {
        let driver = spawn(&["Variable", "Fonction"]);
        let (_, other) = layout(&driver.snapshot().await.unwrap());

        driver.flip_card(0).await.unwrap();
        let outcome = driver.flip_card(other).await.unwrap();
        assert!(matches!(outcome, FlipOutcome::Mismatched { .. }));
        assert_eq!(driver.flip_card(1).await.unwrap(), FlipOutcome::Rejected);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let snap = driver.snapshot().await.unwrap();
        assert_eq!(snap.pending.len(), 2);
        assert_eq!(snap.cards[0].face(), CardFace::Revealed);

        tokio::time::sleep(Duration::from_millis(600)).await;
        let snap = driver.snapshot().await.unwrap();
        assert!(snap.pending.is_empty());
        assert!(snap.cards.iter().all(|c| c.face() == CardFace::Hidden));
        assert_eq!(snap.moves, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_drops_the_pending_flip_back() {
        let driver = spawn(&["Variable", "Fonction"]);
        let (_, other) = layout(&driver.snapshot().await.unwrap());
        driver.flip_card(0).await.unwrap();
        driver.flip_card(other).await.unwrap();

        driver.reset().await.unwrap();
        let (pair, _) = layout(&driver.snapshot().await.unwrap());
        driver.flip_card(pair[0]).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let snap = driver.snapshot().await.unwrap();
        assert_eq!(snap.moves, 0);
        assert_eq!(snap.pending, vec![pair[0]]);
        assert_eq!(snap.state, MemoryState::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn stopwatch_runs_from_first_flip_until_completion() {
        let mut driver = spawn(&["Boucle"]);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(driver.snapshot().await.unwrap().elapsed_secs, 0);

        driver.flip_card(0).await.unwrap();
        tokio::time::sleep(Duration::from_millis(12_500)).await;
        assert_eq!(driver.snapshot().await.unwrap().elapsed_secs, 12);

        driver.flip_card(1).await.unwrap();
        let done = driver.next_outcome().await.unwrap();
        assert_eq!(done.moves, 1);
        assert_eq!(done.elapsed_secs, 12);
        assert_eq!(done.score, 100 - 1 - 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(driver.snapshot().await.unwrap().elapsed_secs, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_mismatch_delay_is_honoured() {
        let mut rng = StdRng::seed_from_u64(3);
        let settings = MemorySettings::new(Duration::from_millis(200)).unwrap();
        let session =
            MemorySession::with_settings(CardDef::pairs(["a", "b"]), settings, &mut rng).unwrap();
        let driver = MemoryDriver::spawn(session, rng);
        let (_, other) = layout(&driver.snapshot().await.unwrap());

        driver.flip_card(0).await.unwrap();
        driver.flip_card(other).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(driver.snapshot().await.unwrap().pending.is_empty());
    }
}
