//! The `vocatest parse` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use vocatest_core::model::QuestionRecord;
use vocatest_core::parser::{parse_question_list, parse_single_question};

pub fn execute(
    transcript: PathBuf,
    json: bool,
    word: Option<String>,
    translation: Option<String>,
) -> Result<()> {
    let raw = std::fs::read_to_string(&transcript)
        .with_context(|| format!("failed to read transcript: {}", transcript.display()))?;

    let questions = match (word, translation) {
        (Some(word), Some(translation)) => {
            let record = parse_single_question(&raw, &word, &translation)
                .with_context(|| format!("strict parse failed for {word:?}"))?;
            vec![record]
        }
        _ => {
            let questions = parse_question_list(&raw);
            anyhow::ensure!(
                !questions.is_empty(),
                "could not recognize the test: no usable questions in {}",
                transcript.display()
            );
            questions
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&questions)?);
    } else {
        print_question_table(&questions);
        println!("\nParsed {} question(s).", questions.len());
    }
    Ok(())
}

fn print_question_table(questions: &[QuestionRecord]) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Word", "Translation", "Answer", "Points", "Type"]);

    for (i, q) in questions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&q.word),
            Cell::new(&q.translation),
            Cell::new(q.correct_answer),
            Cell::new(q.point_value),
            Cell::new(q.word_kind),
        ]);
    }

    println!("{table}");
}
