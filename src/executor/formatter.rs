use super::error::ScriptError;
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::path::Path;

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait FaultFormatter {
    fn format(&self, error: &ScriptError) -> String;
}

/// One line per fault, in `(row) message [Ecode]` shape.
pub struct BasicFormatter;

impl FaultFormatter for BasicFormatter {
    fn format(&self, error: &ScriptError) -> String {
        format!(
            "({}) {} [E{}]",
            error.token.span.start_row, error.message, error.code
        )
    }
}

/// Full ariadne report over the original source text.
pub struct PrettyFormatter<'src> {
    text: &'src str,
    path: &'src Path,
    line_starts: Vec<usize>,
}

impl<'src> PrettyFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self {
            text,
            path,
            line_starts,
        }
    }

    /// Byte offset of a 1-based row/column pair, clamped to the text.
    fn offset(&self, row: u32, col: u32) -> usize {
        let line = self
            .line_starts
            .get(row.saturating_sub(1) as usize)
            .copied()
            .unwrap_or(self.text.len());
        (line + col.saturating_sub(1) as usize).min(self.text.len())
    }
}

impl<'src> FaultFormatter for PrettyFormatter<'src> {
    fn format(&self, error: &ScriptError) -> String {
        let path = self
            .path
            .to_str()
            .expect("Non-UTF8 paths are not supported!");
        let span = error.token.span;
        let start = self.offset(span.start_row, span.start_col);
        let end = self.offset(span.end_row, span.end_col).max(start);
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, (path, start..end))
            .with_code(format!("E{}", error.code))
            .with_message(&error.message)
            .with_label(
                Label::new((path, start..end))
                    .with_message(format!("this {} raised the fault", error.token.look))
                    .with_color(Color::BrightRed),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }
}
