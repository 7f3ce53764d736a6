//! Question text parser.
//!
//! Converts the loosely structured text returned by the generator into
//! [`QuestionRecord`]s. The generator is prompted to emit blocks like:
//!
//! ```text
//! Вопрос:
//! Как переводится слово "cat"?
//!
//! A) кот
//! B) пёс
//! C) дом
//! D) стол
//!
//! Ответ: A
//! Тип: НОВОЕ
//! Слово: cat - кот
//! ```
//!
//! but nothing about that structure is guaranteed, so there are two modes:
//!
//! - **best-effort** ([`parse_question_list`]): malformed blocks are skipped
//!   and logged; one bad question never invalidates the batch.
//! - **strict** ([`parse_single_question`]): used when exactly one question
//!   for a known word is expected; a missing answer marker is a hard error
//!   because a record with a guessed answer is unusable.
//!
//! English marker spellings are accepted alongside the Russian ones, since
//! the markers are a contract with the prompt, not with a language.

use crate::error::ParseError;
use crate::model::{AnswerLetter, QuestionRecord, WordKind};

/// Blocks shorter than this (in characters, trimmed) cannot hold a stem plus
/// four options and are discarded without inspection.
const MIN_BLOCK_CHARS: usize = 20;

const ANSWER_MARKERS: &[&str] = &["ответ", "answer"];
const WORD_MARKERS: &[&str] = &["слово", "word"];
const KIND_MARKERS: &[&str] = &["тип", "type"];
const POINTS_MARKERS: &[&str] = &["баллы", "points"];

/// Line prefixes that start a new question block.
const BOUNDARY_MARKERS: &[&str] = &["вопрос", "question"];

/// First-line prefixes of conversational filler the generator likes to emit
/// before the actual questions.
const PREAMBLE_PREFIXES: &[&str] = &[
    "вот",
    "конечно",
    "хорошо",
    "here",
    "sure",
    "of course",
    "certainly",
];

/// Values that mean the generator echoed the template instead of filling it.
const PLACEHOLDERS: &[&str] = &[
    "слово",
    "word",
    "перевод",
    "translation",
    "...",
    "…",
    "?",
    "-",
];

/// Parse generator output into an ordered list of question records,
/// best-effort.
///
/// Returns records for every block that yields a usable answer letter and a
/// non-placeholder word pair, in source order. Never fails: unusable input
/// produces an empty list.
pub fn parse_question_list(raw: &str) -> Vec<QuestionRecord> {
    let mut records = Vec::new();

    for block in split_blocks(raw) {
        if block.trim().chars().count() < MIN_BLOCK_CHARS {
            tracing::debug!("skipping block: too short to be a question");
            continue;
        }
        if is_preamble(&block) {
            tracing::debug!("skipping block: non-question preamble");
            continue;
        }
        match parse_block(&block) {
            Some(record) => records.push(record),
            None => tracing::debug!("skipping block: no usable question"),
        }
    }

    records
}

/// Parse generator output that is expected to hold exactly one question for
/// a known word, strictly.
///
/// The question body is everything up to the answer marker. A missing marker
/// is a hard [`ParseError::MissingAnswerMarker`]; a marker followed by
/// something other than A-D is [`ParseError::InvalidAnswerLetter`].
pub fn parse_single_question(
    raw: &str,
    word: &str,
    translation: &str,
) -> Result<QuestionRecord, ParseError> {
    let mut body_lines: Vec<&str> = Vec::new();
    let mut answer_value: Option<&str> = None;
    let mut kind = WordKind::default();
    let mut points = 1u32;

    for line in raw.lines() {
        if answer_value.is_none() {
            if let Some(value) = marker_value(line, ANSWER_MARKERS) {
                answer_value = Some(value);
                continue;
            }
            if body_lines.is_empty() && is_boundary(line) {
                push_boundary_remainder(line, &mut body_lines);
                continue;
            }
            body_lines.push(line);
            continue;
        }
        // Past the answer marker only metadata lines matter.
        if let Some(value) = marker_value(line, KIND_MARKERS) {
            kind = value.parse().unwrap_or_default();
        } else if let Some(value) = marker_value(line, POINTS_MARKERS) {
            points = parse_points(value);
        }
    }

    let value = answer_value.ok_or(ParseError::MissingAnswerMarker)?;
    let correct_answer = value
        .parse::<AnswerLetter>()
        .map_err(|_| ParseError::InvalidAnswerLetter(value.to_string()))?;

    Ok(QuestionRecord {
        question_text: body_lines.join("\n").trim().to_string(),
        correct_answer,
        point_value: points,
        word_kind: kind,
        word: word.trim().to_string(),
        translation: translation.trim().to_string(),
    })
}

/// Split raw text into candidate blocks at question-boundary lines.
///
/// Text before the first boundary becomes a block of its own so that output
/// without boundary markers still gets one parsing attempt.
fn split_blocks(raw: &str) -> Vec<String> {
    let mut blocks: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if is_boundary(line) && !current.is_empty() {
            blocks.push(current.join("\n"));
            current.clear();
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }

    blocks
}

fn is_boundary(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    BOUNDARY_MARKERS.iter().any(|m| lower.starts_with(m))
}

/// Keep any stem text a boundary line carries after its colon.
fn push_boundary_remainder<'a>(line: &'a str, body_lines: &mut Vec<&'a str>) {
    if let Some((_, rest)) = line.split_once(':') {
        let rest = rest.trim();
        if !rest.is_empty() {
            body_lines.push(rest);
        }
    }
}

fn is_preamble(block: &str) -> bool {
    let Some(first_line) = block.lines().find(|l| !l.trim().is_empty()) else {
        return true;
    };
    let lower = first_line.trim().to_lowercase();
    let looks_conversational = PREAMBLE_PREFIXES.iter().any(|p| lower.starts_with(p));
    // A greeting followed by a real question is still a question block.
    looks_conversational && !block.lines().any(|l| marker_value(l, ANSWER_MARKERS).is_some())
}

/// Extract one record from a block, or `None` if the block is unusable.
fn parse_block(block: &str) -> Option<QuestionRecord> {
    let mut body_lines: Vec<&str> = Vec::new();
    let mut answer: Option<AnswerLetter> = None;
    let mut word_pair: Option<(String, String)> = None;
    let mut kind = WordKind::default();
    let mut points = 1u32;

    for line in block.lines() {
        if let Some(value) = marker_value(line, ANSWER_MARKERS) {
            answer = value.parse().ok();
        } else if let Some(value) = marker_value(line, WORD_MARKERS) {
            word_pair = split_word_pair(value);
        } else if let Some(value) = marker_value(line, KIND_MARKERS) {
            kind = value.parse().unwrap_or_default();
        } else if let Some(value) = marker_value(line, POINTS_MARKERS) {
            points = parse_points(value);
        } else if answer.is_none() {
            if body_lines.is_empty() && is_boundary(line) {
                // "Вопрос 3:" style headers are block structure, not stem text,
                // but anything after the colon is.
                push_boundary_remainder(line, &mut body_lines);
            } else {
                body_lines.push(line);
            }
        }
    }

    let correct_answer = answer?;
    let (word, translation) = word_pair?;

    Some(QuestionRecord {
        question_text: body_lines.join("\n").trim().to_string(),
        correct_answer,
        point_value: points,
        word_kind: kind,
        word,
        translation,
    })
}

/// If `line` is `"<name>: <value>"` with `<name>` among `names`
/// (case-insensitive), return the value.
fn marker_value<'a>(line: &'a str, names: &[&str]) -> Option<&'a str> {
    let (head, value) = line.trim().split_once(':')?;
    let head = head.trim().to_lowercase();
    names.contains(&head.as_str()).then(|| value.trim())
}

/// Split a `Слово:` value into (word, translation).
///
/// Primary pattern is `word - translation`; the fallback accepts any dash
/// variant without surrounding spaces, since the generator is not consistent
/// about either.
fn split_word_pair(value: &str) -> Option<(String, String)> {
    let (word, translation) = match value.split_once(" - ") {
        Some(pair) => pair,
        None => {
            let idx = value.find(['-', '–', '—'])?;
            let (w, t) = value.split_at(idx);
            let t = t.trim_start_matches(['-', '–', '—']);
            (w, t)
        }
    };

    let word = word.trim();
    let translation = translation.trim();
    if usable_term(word) && usable_term(translation) {
        Some((word.to_string(), translation.to_string()))
    } else {
        None
    }
}

fn usable_term(term: &str) -> bool {
    !term.is_empty() && !PLACEHOLDERS.contains(&term.to_lowercase().as_str())
}

fn parse_points(value: &str) -> u32 {
    value.parse::<u32>().ok().filter(|&p| p >= 1).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE_BLOCK: &str =
        "Вопрос:\nQ?\n\nA) x\nB) y\nC) z\nD) w\n\nОтвет: B\nТип: НОВОЕ\nСлово: cat - кот";

    #[test]
    fn parse_single_russian_block() {
        let records = parse_question_list(SINGLE_BLOCK);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.correct_answer, AnswerLetter::B);
        assert_eq!(record.word_kind, WordKind::New);
        assert_eq!(record.word, "cat");
        assert_eq!(record.translation, "кот");
        assert_eq!(record.point_value, 1);
        assert!(record.question_text.contains("A) x"));
        assert!(!record.question_text.contains("Ответ"));
    }

    #[test]
    fn parse_preserves_source_order() {
        let raw = "\
Вопрос 1:
Перевод слова dog?

A) кот
B) собака
C) дом
D) стол

Ответ: B
Тип: ПРИОРИТЕТНОЕ
Слово: dog - собака

Вопрос 2:
Перевод слова sun?

A) солнце
B) луна
C) море
D) небо

Ответ: A
Слово: sun - солнце";
        let records = parse_question_list(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].word, "dog");
        assert_eq!(records[0].word_kind, WordKind::Priority);
        assert_eq!(records[1].word, "sun");
        assert_eq!(records[1].word_kind, WordKind::New);
    }

    #[test]
    fn malformed_block_does_not_abort_the_batch() {
        let raw = "\
Вопрос 1:
Перевод слова dog?
A) кот
B) собака
C) дом
D) стол
Ответ: B
Слово: dog - собака

Вопрос 2:
Этот блок сломан, нет ни ответа, ни слова.
Просто текст достаточной длины.

Вопрос 3:
Перевод слова sun?
A) солнце
B) луна
C) море
D) небо
Ответ: A
Слово: sun - солнце";
        let records = parse_question_list(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].word, "dog");
        assert_eq!(records[1].word, "sun");
    }

    #[test]
    fn placeholder_word_rejects_block() {
        let raw = "\
Вопрос:
Перевод слова?
A) a
B) b
C) c
D) d
Ответ: A
Слово: слово - перевод";
        assert!(parse_question_list(raw).is_empty());
    }

    #[test]
    fn missing_answer_rejects_block_silently() {
        let raw = "\
Вопрос:
Перевод слова dog?
A) кот
B) собака
C) дом
D) стол
Слово: dog - собака";
        assert!(parse_question_list(raw).is_empty());
    }

    #[test]
    fn preamble_is_discarded() {
        let raw = "\
Вот тест по вашим словам, удачи!

Вопрос:
Перевод слова dog?
A) кот
B) собака
C) дом
D) стол
Ответ: B
Слово: dog - собака";
        let records = parse_question_list(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].word, "dog");
    }

    #[test]
    fn english_markers_and_points() {
        let raw = "\
Question:
What does \"cat\" mean?
A) dog
B) cat
C) sun
D) moon
Answer: b
Type: new
Points: 3
Word: cat - кот";
        let records = parse_question_list(raw);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].correct_answer, AnswerLetter::B);
        assert_eq!(records[0].point_value, 3);
    }

    #[test]
    fn alternate_dash_pattern_fallback() {
        assert_eq!(
            split_word_pair("cat-кот"),
            Some(("cat".to_string(), "кот".to_string()))
        );
        assert_eq!(
            split_word_pair("cat — кот"),
            Some(("cat".to_string(), "кот".to_string()))
        );
        assert_eq!(split_word_pair("просто текст"), None);
    }

    #[test]
    fn empty_and_garbage_input_yield_empty_list() {
        assert!(parse_question_list("").is_empty());
        assert!(parse_question_list("короткий текст").is_empty());
        assert!(parse_question_list("Конечно! Вот ваш тест.").is_empty());
    }

    #[test]
    fn strict_parse_extracts_body_up_to_marker() {
        let raw = "Как переводится cat?\n\nA) кот\nB) пёс\nC) дом\nD) стол\n\nОтвет: A";
        let record = parse_single_question(raw, "cat", "кот").unwrap();
        assert_eq!(record.correct_answer, AnswerLetter::A);
        assert_eq!(record.word, "cat");
        assert_eq!(record.translation, "кот");
        assert!(record.question_text.ends_with("D) стол"));
        assert!(!record.question_text.contains("Ответ"));
    }

    #[test]
    fn strict_parse_requires_answer_marker() {
        let raw = "Как переводится cat?\n\nA) кот\nB) пёс\nC) дом\nD) стол";
        let err = parse_single_question(raw, "cat", "кот").unwrap_err();
        assert!(matches!(err, ParseError::MissingAnswerMarker));
    }

    #[test]
    fn strict_parse_rejects_unusable_letter() {
        let raw = "Как переводится cat?\n\nОтвет: никак";
        let err = parse_single_question(raw, "cat", "кот").unwrap_err();
        assert!(matches!(err, ParseError::InvalidAnswerLetter(_)));
    }

    #[test]
    fn strict_parse_reads_metadata_after_marker() {
        let raw = "Q?\n\nA) a\nB) b\nC) c\nD) d\n\nОтвет: C\nТип: ПРИОРИТЕТНОЕ\nБаллы: 2";
        let record = parse_single_question(raw, "cat", "кот").unwrap();
        assert_eq!(record.correct_answer, AnswerLetter::C);
        assert_eq!(record.word_kind, WordKind::Priority);
        assert_eq!(record.point_value, 2);
    }
}
