//! The `vocatest quiz` command.
//!
//! Runs one interactive session on the terminal: questions on stdout,
//! answers on stdin, timeout notices pushed in by the engine's event sink.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use vocatest_core::engine::{
    AnswerOutcome, AssessmentEngine, SessionEventSink, SessionProgress, TimeoutNotice,
};
use vocatest_core::model::{AnswerLetter, OwnerId, SessionSummary, VocabularyEntry, WordPair};
use vocatest_core::parser::parse_question_list;
use vocatest_core::scheduler::PriorityScheduler;
use vocatest_store::MemoryVocabularyStore;

use crate::config::load_config_from;

/// Forwards timeout notices into the interactive loop.
struct ChannelSink(mpsc::UnboundedSender<TimeoutNotice>);

impl SessionEventSink for ChannelSink {
    fn on_question_timeout(&self, _owner: OwnerId, notice: &TimeoutNotice) {
        let _ = self.0.send(notice.clone());
    }
}

pub async fn execute(
    transcript: PathBuf,
    timed_flag: bool,
    owner: Option<i64>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let owner = owner.unwrap_or(config.default_owner);
    let timed = timed_flag || config.timed;

    let raw = std::fs::read_to_string(&transcript)
        .with_context(|| format!("failed to read transcript: {}", transcript.display()))?;
    let questions = parse_question_list(&raw);
    anyhow::ensure!(
        !questions.is_empty(),
        "could not recognize the test: no usable questions in {}",
        transcript.display()
    );

    let store = Arc::new(MemoryVocabularyStore::new());
    let scheduler = PriorityScheduler::new(store.clone());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = AssessmentEngine::new(Arc::new(ChannelSink(tx)));

    let first = engine.start_session(owner, questions, timed).await?;
    println!("{first}");
    if timed {
        println!("\n(Answer before the deadline: 1 point = 5s, 2 points = 10s, 3 points = 20s.)");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    engine.cancel_session(owner).await;
                    anyhow::bail!("input ended before the quiz finished");
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let Ok(letter) = trimmed.parse::<AnswerLetter>() else {
                    println!("Please answer with A, B, C, or D.");
                    continue;
                };
                match engine.submit_answer(owner, letter).await {
                    Ok(AnswerOutcome::Scored(feedback)) => {
                        if feedback.correct {
                            println!("Correct! +{} point(s).", feedback.points_awarded);
                        } else {
                            println!(
                                "Incorrect. The correct answer was {}.",
                                feedback.correct_answer
                            );
                        }
                    }
                    Ok(AnswerOutcome::TimeExpired {
                        correct_answer,
                        point_value,
                    }) => {
                        println!(
                            "Too late, time already expired. The correct answer was {correct_answer} ({point_value} point(s))."
                        );
                    }
                    Err(e) if e.is_recoverable() => {
                        println!("{e}");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Some(notice) = rx.recv() => {
                println!(
                    "\nTime is up! The correct answer was {} ({} point(s)).",
                    notice.correct_answer, notice.point_value
                );
            }
        }

        match engine.advance(owner).await? {
            SessionProgress::Next(text) => println!("\n{text}"),
            SessionProgress::Finished(summary) => {
                print_summary(&summary);

                let tally = scheduler.apply_outcomes(owner, &summary.buckets).await;
                if tally.failed > 0 {
                    println!(
                        "\nUpdated priorities for {} word(s), {} update(s) failed.",
                        tally.applied, tally.failed
                    );
                } else {
                    println!("\nUpdated priorities for {} word(s).", tally.applied);
                }

                let review = scheduler
                    .select_top_priority_words(owner, config.review_list_size)
                    .await?;
                print_review_table(&review);
                return Ok(());
            }
        }
    }
}

fn print_summary(summary: &SessionSummary) {
    println!("\nQuiz complete!");
    println!("Result: {}/{} points", summary.score, summary.total_points);
    println!(
        "Correct answers: {}/{} ({}%)",
        summary.correct, summary.total, summary.percentage
    );
    println!("{}", summary.tier.message());

    let mut table = Table::new();
    table.set_header(vec!["Word", "Translation", "Type", "Result"]);
    let rows: [(&[WordPair], &str, &str); 4] = [
        (&summary.buckets.priority_correct, "priority", "correct"),
        (&summary.buckets.priority_wrong, "priority", "wrong"),
        (&summary.buckets.new_correct, "new", "correct"),
        (&summary.buckets.new_wrong, "new", "wrong"),
    ];
    for (pairs, kind, result) in rows {
        for pair in pairs {
            table.add_row(vec![
                Cell::new(&pair.word),
                Cell::new(&pair.translation),
                Cell::new(kind),
                Cell::new(result),
            ]);
        }
    }
    println!("\n{table}");
}

fn print_review_table(words: &[VocabularyEntry]) {
    if words.is_empty() {
        return;
    }
    println!("\nWords to review next (highest priority first):");
    let mut table = Table::new();
    table.set_header(vec!["Word", "Translation", "Priority"]);
    for entry in words {
        table.add_row(vec![
            Cell::new(&entry.word),
            Cell::new(&entry.translation),
            Cell::new(entry.priority),
        ]);
    }
    println!("{table}");
}
