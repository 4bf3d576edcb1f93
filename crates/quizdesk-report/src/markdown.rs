//! Markdown report generation.
//!
//! [`MarkdownGenerator`] renders a [`WorkReport`] as the Stats Viewer lays it
//! out: student, summary table, answer breakdown, then one section per
//! question. [`HistoryMarkdown`] renders a student's work list as a table.

use std::fmt::Write;

use chrono::Utc;
use quizdesk_core::Outcome;

use crate::{HistoryReport, QuestionRow, WorkReport};

/// Generates Markdown for one completed work.
pub struct MarkdownGenerator<'a> {
    report: &'a WorkReport,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a generator for the given report.
    #[must_use]
    pub const fn new(report: &'a WorkReport) -> Self {
        Self { report }
    }

    /// Generates the complete document.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        self.write_title(&mut output);
        self.write_summary(&mut output);
        self.write_breakdown(&mut output);
        self.write_questions(&mut output);
        write_footer(&mut output);

        output
    }

    fn write_title(&self, output: &mut String) {
        let _ = writeln!(output, "# {}\n", escape_markdown(&self.report.title));
        if let Some(student) = &self.report.student {
            let _ = writeln!(output, "**Ученик:** {}\n", escape_markdown(student));
        }
        if let Some(avatar) = &self.report.avatar {
            let _ = writeln!(output, "![Аватар]({avatar})\n");
        }
    }

    fn write_summary(&self, output: &mut String) {
        let score = &self.report.score;

        let _ = writeln!(output, "## Итог\n");
        let _ = writeln!(output, "| Показатель | Значение |");
        let _ = writeln!(output, "|------------|----------|");
        let _ = writeln!(
            output,
            "| Баллы | {}/{} |",
            score.final_mark, score.max_mark
        );
        let _ = writeln!(
            output,
            "| Вопросы | {} верно, {} частично, {} неверно |",
            score.fully, score.semi, score.zero
        );
        let _ = writeln!(output, "| Время выполнения | {} |", self.report.duration);
        let _ = writeln!(output, "| Начало | {} |", self.report.started_at);
        let _ = writeln!(output, "| Окончание | {} |", self.report.finished_at);
        let _ = writeln!(output);
    }

    /// Text stand-in for the stacked progress bar.
    fn write_breakdown(&self, output: &mut String) {
        let score = &self.report.score;
        if score.answered() == 0 {
            return;
        }
        let (fully, semi, zero) = score.shares();
        let _ = writeln!(
            output,
            "Верно {fully}% · Частично {semi}% · Неверно {zero}%\n"
        );
    }

    fn write_questions(&self, output: &mut String) {
        let _ = writeln!(output, "## Вопросы\n");

        if self.report.questions.is_empty() {
            let _ = writeln!(output, "*Нет вопросов.*\n");
            return;
        }

        for row in &self.report.questions {
            write_question(output, row);
        }
    }
}

fn write_question(output: &mut String, row: &QuestionRow) {
    let _ = writeln!(
        output,
        "### {}. {} ({}/{})\n",
        row.index,
        badge(row.outcome),
        row.user_mark,
        row.full_mark
    );
    let _ = writeln!(output, "{}\n", escape_markdown(&row.text));
    if let Some(url) = &row.question_image {
        let _ = writeln!(output, "![Вопрос {}]({url})\n", row.index);
    }
    let _ = writeln!(
        output,
        "- **Ответ ученика:** {}",
        escape_markdown(&row.user_answer)
    );
    let _ = writeln!(
        output,
        "- **Правильный ответ:** {}",
        escape_markdown(&row.answer)
    );
    let _ = writeln!(output);
    if let Some(url) = &row.answer_image {
        let _ = writeln!(output, "![Ответ {}]({url})\n", row.index);
    }
}

/// Generates Markdown for a student's work history.
pub struct HistoryMarkdown<'a> {
    report: &'a HistoryReport,
}

impl<'a> HistoryMarkdown<'a> {
    /// Creates a generator for the given history.
    #[must_use]
    pub const fn new(report: &'a HistoryReport) -> Self {
        Self { report }
    }

    /// Generates the complete document.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        match &self.report.student {
            Some(student) => {
                let _ = writeln!(output, "# Работы: {}\n", escape_markdown(student));
            }
            None => {
                let _ = writeln!(output, "# Работы\n");
            }
        }

        if self.report.is_empty() {
            let _ = writeln!(output, "*Ученик ещё не выполнил ни одной работы.*\n");
        } else {
            let _ = writeln!(
                output,
                "| # | Название | Тип | Начало | Время | Баллы | ✓ / ½ / ✗ |"
            );
            let _ = writeln!(
                output,
                "|---|----------|-----|--------|-------|-------|-----------|"
            );
            for work in &self.report.works {
                let _ = writeln!(
                    output,
                    "| {} | {} | {} | {} | {} | {}/{} | {} / {} / {} |",
                    work.work_id,
                    escape_markdown(&work.name),
                    work.kind,
                    work.started_at,
                    work.duration,
                    work.score.final_mark,
                    work.score.max_mark,
                    work.score.fully,
                    work.score.semi,
                    work.score.zero,
                );
            }
            let _ = writeln!(output);
        }

        write_footer(&mut output);
        output
    }
}

fn write_footer(output: &mut String) {
    let _ = writeln!(output, "---");
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let _ = writeln!(output, "*Сформировано quizdesk {timestamp}*");
}

const fn badge(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Full => "✅ Верно",
        Outcome::Partial => "🟡 Частично",
        Outcome::Zero => "❌ Неверно",
    }
}

/// Escapes characters with special meaning in Markdown.
///
/// Newlines become `<br>` so multi-line answers stay inside table cells.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '(' | ')' | '!' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::{question, sample_detail};
    use crate::WorkReport;

    fn sample_report() -> WorkReport {
        WorkReport::from_detail(&sample_detail(), "http://h/api", 3).unwrap()
    }

    #[test]
    fn test_sections_in_order() {
        let markdown = MarkdownGenerator::new(&sample_report()).generate();
        let title = markdown.find("# Соли и оксиды").unwrap();
        let summary = markdown.find("## Итог").unwrap();
        let questions = markdown.find("## Вопросы").unwrap();
        let footer = markdown.find("*Сформировано quizdesk").unwrap();
        assert!(title < summary && summary < questions && questions < footer);
        assert!(markdown.contains("**Ученик:** Анна"));
        assert!(markdown.contains("| Баллы | 3/5 |"));
        assert!(markdown.contains("| Время выполнения | 12м 30с |"));
    }

    #[test]
    fn test_question_badges_and_images() {
        let markdown = MarkdownGenerator::new(&sample_report()).generate();
        assert!(markdown.contains("### 1. ✅ Верно (2/2)"));
        assert!(markdown.contains("### 2. 🟡 Частично (1/2)"));
        assert!(markdown.contains("### 3. ❌ Неверно (0/1)"));
        assert!(markdown.contains("![Вопрос 1](http://h/api/images/question/10)"));
        assert!(markdown.contains("![Ответ 2](http://h/api/images/answer/11)"));
        assert!(!markdown.contains("![Ответ 1]"));
        assert!(!markdown.contains("![Вопрос 3]"));
    }

    #[test]
    fn test_breakdown_skipped_without_answers() {
        let mut detail = sample_detail();
        detail.general.fully = 0;
        detail.general.semi = 0;
        detail.general.zero = 0;
        detail.questions.clear();
        let report = WorkReport::builder(&detail).build().unwrap();
        let markdown = MarkdownGenerator::new(&report).generate();
        assert!(!markdown.contains("Верно 0%"));
        assert!(markdown.contains("*Нет вопросов.*"));
    }

    #[test]
    fn test_answers_are_escaped() {
        let mut detail = sample_detail();
        let mut q = question(4, 20, 1, 1, false, false);
        q.user_answer = "a*b\nc|d".to_string();
        detail.questions.push(q);
        let report = WorkReport::builder(&detail).build().unwrap();
        let markdown = MarkdownGenerator::new(&report).generate();
        assert!(markdown.contains(r"a\*b<br>c\|d"));
    }

    #[test]
    fn test_history_table() {
        let history = HistoryReport {
            student: Some("Анна".to_string()),
            works: vec![crate::HistoryRow {
                work_id: 9,
                name: "Вариант_1".to_string(),
                kind: "ЕГЭ".to_string(),
                started_at: "01.05.2024, 13:00".to_string(),
                duration: "1ч 0м 0с".to_string(),
                score: crate::ScoreSummary {
                    final_mark: 40,
                    max_mark: 60,
                    fully: 10,
                    semi: 2,
                    zero: 3,
                },
                share_token: None,
            }],
        };
        let markdown = HistoryMarkdown::new(&history).generate();
        assert!(markdown.starts_with("# Работы: Анна"));
        assert!(markdown.contains(
            "| 9 | Вариант\\_1 | ЕГЭ | 01.05.2024, 13:00 | 1ч 0м 0с | 40/60 | 10 / 2 / 3 |"
        ));
    }

    #[test]
    fn test_empty_history() {
        let history = HistoryReport::from_stats(None, &[], 0);
        let markdown = HistoryMarkdown::new(&history).generate();
        assert!(markdown.starts_with("# Работы\n"));
        assert!(markdown.contains("ни одной работы"));
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("[x](y)"), r"\[x\]\(y\)");
        assert_eq!(escape_markdown("plain"), "plain");
    }
}
