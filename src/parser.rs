use miette::Result;

use crate::{
    diag,
    error::{load_data_full, load_data_literal, load_data_syntax},
    image::Program,
    ops::parse_literal,
    span::Span,
};

/// Placeholder stored for a line that only holds a label, so the label has a steppable address.
pub const LABEL_ONLY_INSTR: &str = "NOP";

/// Segment the parser is currently filling.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Segment {
    /// Before any `[CODE]` or `[DATA]` switch.
    Outside,
    Code,
    Data,
}

/// Transforms source text into a [`Program`] image.
pub struct AsmParser<'a> {
    /// Reference to the source file
    src: &'a str,
    segment: Segment,
    program: Program,
    /// Tracker for current line, 1-based
    line: usize,
}

impl<'a> AsmParser<'a> {
    pub fn new(src: &'a str) -> Self {
        AsmParser {
            src,
            segment: Segment::Outside,
            program: Program::default(),
            line: 0,
        }
    }

    /// Create the program image, line by line. Fails without exposing a partial program.
    pub fn parse(mut self) -> Result<Program> {
        let src = self.src;
        for raw in src.lines() {
            self.line += 1;
            // Strip comment
            let content = match raw.find(';') {
                Some(idx) => &raw[..idx],
                None => raw,
            };
            let content = content.trim();
            if content.is_empty() {
                continue;
            }

            if content.eq_ignore_ascii_case("[CODE]") {
                self.segment = Segment::Code;
                continue;
            }
            if content.eq_ignore_ascii_case("[DATA]") {
                self.segment = Segment::Data;
                continue;
            }

            match self.segment {
                Segment::Code => self.parse_code(content),
                Segment::Data => self.parse_data(content)?,
                Segment::Outside => diag!(
                    self.program.diagnostics,
                    Warn,
                    "Line {} is outside of any segment, ignored: {}",
                    self.line,
                    content
                ),
            }
        }

        diag!(
            self.program.diagnostics,
            Info,
            "Loaded {} instructions into the code segment",
            self.program.code.len()
        );
        diag!(
            self.program.diagnostics,
            Info,
            "Loaded {} values into the data segment",
            self.program.data_count
        );
        // Consume self to return the image
        Ok(self.program)
    }

    /// `LABEL:`, `LABEL: instr` or `instr`.
    fn parse_code(&mut self, content: &str) {
        let Some((label, rest)) = content.split_once(':') else {
            self.program.add_instr(content);
            return;
        };
        // Label points at whatever is appended next
        let addr = self.program.code.len();
        self.program.labels.insert(label, addr);

        let rest = rest.trim();
        if rest.is_empty() {
            self.program.add_instr(LABEL_ONLY_INSTR);
        } else {
            self.program.add_instr(rest);
        }
    }

    /// `NAME = number`. The name is not kept; data is addressed by position only.
    fn parse_data(&mut self, content: &str) -> Result<()> {
        let span = Span::of(self.src, content);
        let Some((_name, value)) = content.split_once('=') else {
            return Err(load_data_syntax(span, self.src, content));
        };
        let Some(val) = parse_literal(value.trim()) else {
            return Err(load_data_literal(span, self.src, content));
        };
        if !self.program.add_data(val) {
            return Err(load_data_full(span, self.src));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::Level;

    fn code_of(src: &str) -> Vec<String> {
        AsmParser::new(src).parse().unwrap().code().to_vec()
    }

    fn error_code(src: &str) -> String {
        let err = AsmParser::new(src).parse().unwrap_err();
        let code = err.code().expect("load errors carry a code").to_string();
        code
    }

    #[test]
    fn strips_comments_and_blanks() {
        let code = code_of(
            r#"
            ; heading
            [CODE]
              MOVI R0, 10   ; ten

              HLT
            "#,
        );
        assert_eq!(code, vec!["MOVI R0, 10", "HLT"]);
    }

    #[test]
    fn segment_switch_is_case_insensitive() {
        let program = AsmParser::new("[code]\nNOP\n[data]\nX = 4\n[Code]\nHLT")
            .parse()
            .unwrap();
        assert_eq!(program.code(), &["NOP", "HLT"]);
        assert_eq!(program.data_count(), 1);
        assert_eq!(program.data()[0], 4.0);
    }

    #[test]
    fn label_only_line_becomes_nop() {
        let program = AsmParser::new("[CODE]\nstart:\nMOVI R0, 1\nend: HLT")
            .parse()
            .unwrap();
        assert_eq!(program.code(), &["NOP", "MOVI R0, 1", "HLT"]);
        assert_eq!(program.labels().get("START"), Some(0));
        assert_eq!(program.labels().get("end"), Some(2));
    }

    #[test]
    fn label_splits_at_first_colon() {
        let program = AsmParser::new("[CODE]\n a : GOTO b:c").parse().unwrap();
        assert_eq!(program.code(), &["GOTO b:c"]);
        assert_eq!(program.labels().get("A"), Some(0));
    }

    #[test]
    fn label_redefinition_keeps_last() {
        let program = AsmParser::new("[CODE]\nX: NOP\nX: HLT").parse().unwrap();
        assert_eq!(program.labels().get("X"), Some(1));
        assert_eq!(program.labels().len(), 1);
    }

    #[test]
    fn data_values_in_order() {
        let program = AsmParser::new("[DATA]\nX = 5\nY=2.5\nZ = -1e2").parse().unwrap();
        assert_eq!(program.data_count(), 3);
        assert_eq!(&program.data().as_slice()[..4], &[5.0, 2.5, -100.0, 0.0]);
    }

    #[test]
    fn lines_outside_segments_are_noted() {
        let program = AsmParser::new("MOVI R0, 1\n[CODE]\nHLT").parse().unwrap();
        assert_eq!(program.code(), &["HLT"]);
        let warning = &program.diagnostics()[0];
        assert_eq!(warning.level, Level::Warn);
        assert!(warning.message.contains("MOVI R0, 1"));
    }

    #[test]
    fn load_summary() {
        let program = AsmParser::new("[CODE]\nNOP\nHLT\n[DATA]\nA = 1").parse().unwrap();
        let messages: Vec<_> = program
            .diagnostics()
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec![
                "Loaded 2 instructions into the code segment",
                "Loaded 1 values into the data segment"
            ]
        );
    }

    #[test]
    fn bad_data_syntax() {
        assert_eq!(error_code("[DATA]\nX 5"), "load::data_syntax");
    }

    #[test]
    fn bad_data_literal() {
        assert_eq!(error_code("[DATA]\nX = five"), "load::data_literal");
        let err = AsmParser::new("[DATA]\nX = five").parse().unwrap_err();
        assert!(err.to_string().contains("X = five"));
    }

    #[test]
    fn data_special_values_need_full_spelling() {
        assert_eq!(error_code("[DATA]\nX = inf"), "load::data_literal");
        assert_eq!(error_code("[DATA]\nX = nan"), "load::data_literal");
        let program = AsmParser::new("[DATA]\nX = -Infinity\nY = NaN").parse().unwrap();
        assert_eq!(program.data()[0], f64::NEG_INFINITY);
        assert!(program.data()[1].is_nan());
    }

    #[test]
    fn data_segment_full() {
        let mut src = String::from("[DATA]\n");
        for i in 0..256 {
            src.push_str(&format!("V{i} = {i}\n"));
        }
        assert_eq!(AsmParser::new(&src).parse().unwrap().data_count(), 256);
        src.push_str("OVER = 1\n");
        assert_eq!(error_code(&src), "load::data_full");
    }
}
