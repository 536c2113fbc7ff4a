//! Interactive terminal player.
//!
//! Reads answers line by line from any async reader and writes prompts and
//! table updates to any async writer, so the same code drives stdin/stdout
//! in the binary and in-memory buffers in tests.

use std::io;

use async_trait::async_trait;
use blackjack::{
    Decider, Tally,
    client::{ClientRound, RoundView},
    messages::{Decision, RoundResult},
};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout,
};

use crate::commands::{ParseError, parse_choice, parse_rounds};

/// A human at a terminal.
pub struct Prompt<R, W> {
    input: R,
    output: W,
    line: String,
    rounds: u8,
    /// Round summaries waiting for the next write.
    pending: String,
}

/// A prompt wired to the process's stdin and stdout.
pub fn stdio() -> Prompt<BufReader<Stdin>, Stdout> {
    Prompt::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
}

impl<R, W> Prompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            line: String::new(),
            rounds: 0,
            pending: String::new(),
        }
    }

    async fn flush_pending(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            self.output.write_all(self.pending.as_bytes()).await?;
            self.pending.clear();
        }
        Ok(())
    }

    pub async fn say(&mut self, text: &str) -> io::Result<()> {
        self.flush_pending().await?;
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }

    /// Asks `question` until `parse` accepts the answer.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` once the input is exhausted.
    async fn ask<T, F>(&mut self, question: &str, parse: F) -> io::Result<T>
    where
        F: Fn(&str) -> Result<T, ParseError>,
    {
        loop {
            self.flush_pending().await?;
            self.output.write_all(question.as_bytes()).await?;
            self.output.flush().await?;

            self.line.clear();
            if self.input.read_line(&mut self.line).await? == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
            }
            match parse(&self.line) {
                Ok(value) => return Ok(value),
                Err(error) => self.say(&error.to_string()).await?,
            }
        }
    }

    /// Asks how many rounds to play, re-prompting on invalid input.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedEof` once the input is exhausted.
    pub async fn ask_rounds(&mut self) -> io::Result<u8> {
        let rounds = self
            .ask("How many rounds do you want to play? (1-255): ", parse_rounds)
            .await?;
        self.rounds = rounds;
        Ok(rounds)
    }

    /// Prints the summary line for a finished session.
    pub async fn report_session(&mut self, tally: &Tally) -> io::Result<()> {
        self.say(&format!(
            "\nFinished playing {} rounds, win rate: {:.2}%",
            tally.played(),
            tally.win_rate() * 100.0
        ))
        .await?;
        self.say(&format!("Stats: {tally}")).await
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

fn describe(view: &RoundView<'_>) -> String {
    format!(
        "Your hand: {} | total={}\nDealer shows: {} | visible_total={}",
        view.player,
        view.player.value(),
        view.dealer,
        view.dealer.value()
    )
}

#[async_trait]
impl<R, W> Decider for Prompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn decide(&mut self, view: &RoundView<'_>) -> io::Result<Decision> {
        let table = describe(view);
        self.say(&table).await?;
        self.ask("Hit or Stand? [h/s]: ", parse_choice).await
    }

    fn round_finished(&mut self, number: u8, round: &ClientRound) {
        let heading = if round.ended_early {
            "Round ended unexpectedly"
        } else {
            "Round finished"
        };
        self.pending.push_str(&format!(
            "\n=== Round {number}/{} ===\nYour hand: {} | total={}\nDealer: {} | total={}\n",
            self.rounds,
            round.player,
            round.player.value(),
            round.dealer,
            round.dealer.value(),
        ));
        if round.player.is_bust() {
            self.pending.push_str("Player BUST\n");
        }
        self.pending.push_str(&format!(
            "{heading}: {}\n",
            RoundResult::from(round.outcome)
        ));
    }
}
