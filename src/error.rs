use miette::{miette, LabeledSpan, Report, Severity};

use crate::image::DATA_SIZE;
use crate::span::Span;

// Load errors. Any of these rejects the whole source.

pub fn load_data_syntax(span: Span, src: &str, line: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::data_syntax",
        help = "data lines look like `NAME = 12.5`",
        labels = vec![LabeledSpan::at(span, "missing `=`")],
        "Invalid data line: {line}",
    )
    .with_source_code(src.to_string())
}

pub fn load_data_literal(span: Span, src: &str, line: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::data_literal",
        help = "the value must be a decimal or scientific literal like `-3`, `0.25` or `1e3`, or one of `NaN`, `Infinity`",
        labels = vec![LabeledSpan::at(span, "incorrect literal")],
        "Invalid number in data line: {line}",
    )
    .with_source_code(src.to_string())
}

pub fn load_data_full(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "load::data_full",
        help = format!("at most {DATA_SIZE} values fit in the data segment, and the stack shares it"),
        labels = vec![LabeledSpan::at(span, "no room for this value")],
        "Data segment is full",
    )
    .with_source_code(src.to_string())
}
