use learn_core::games::{Advance, QuizOutcome, QuizSession, QuizSnapshot, QuizTick};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::{COMMAND_BUFFER, DriverError, ticker};

enum Command {
    Select(usize, oneshot::Sender<bool>),
    Advance(oneshot::Sender<Advance>),
    Reset(oneshot::Sender<()>),
    Snapshot(oneshot::Sender<QuizSnapshot>),
}

/// Handle to a quiz running on its own task with a one-second countdown.
///
/// Every play-through publishes exactly one `QuizOutcome`, whether the last
/// question was submitted or timed out.
pub struct QuizDriver {
    commands: mpsc::Sender<Command>,
    outcomes: mpsc::UnboundedReceiver<QuizOutcome>,
    task: JoinHandle<()>,
}

impl QuizDriver {
    /// Move `session` onto a new task. Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(session: QuizSession) -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let (done, outcomes) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(session, rx, done));
        Self {
            commands,
            outcomes,
            task,
        }
    }

    /// # Errors
    ///
    /// Returns `DriverError::Closed` if the task has stopped.
    pub async fn select_answer(&self, option: usize) -> Result<bool, DriverError> {
        self.request(|reply| Command::Select(option, reply)).await
    }

    /// # Errors
    ///
    /// Returns `DriverError::Closed` if the task has stopped.
    pub async fn advance(&self) -> Result<Advance, DriverError> {
        self.request(Command::Advance).await
    }

    /// Restart with the same questions and a fresh countdown.
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
    pub async fn snapshot(&self) -> Result<QuizSnapshot, DriverError> {
        self.request(Command::Snapshot).await
    }

    /// Wait for the next completed play-through.
    pub async fn next_outcome(&mut self) -> Option<QuizOutcome> {
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

impl Drop for QuizDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut session: QuizSession,
    mut commands: mpsc::Receiver<Command>,
    outcomes: mpsc::UnboundedSender<QuizOutcome>,
) {
    let mut countdown = ticker();

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Select(option, reply) => {
                        let _ = reply.send(session.select_answer(option));
                    }
                    Command::Advance(reply) => {
                        let advance = session.advance();
                        if matches!(advance, Advance::Next { .. }) {
                            countdown.reset();
                        }
                        publish(&advance, &outcomes);
                        let _ = reply.send(advance);
                    }
                    Command::Reset(reply) => {
                        session.reset();
                        countdown.reset();
                        let _ = reply.send(());
                    }
                    Command::Snapshot(reply) => {
                        let _ = reply.send(session.snapshot());
                    }
                }
            }
            _ = countdown.tick(), if !session.is_complete() => {
                if let QuizTick::TimedOut(advance) = session.tick() {
                    tracing::debug!(index = session.current_index(), "quiz question timed out");
                    publish(&advance, &outcomes);
                }
            }
        }
    }
}

fn publish(advance: &Advance, outcomes: &mpsc::UnboundedSender<QuizOutcome>) {
    if let Advance::Completed(outcome) = advance {
        tracing::info!(
            score = outcome.score,
            correct = outcome.correct,
            total = outcome.total,
            "quiz completed"
        );
        let _ = outcomes.send(outcome.clone());
    }
}
