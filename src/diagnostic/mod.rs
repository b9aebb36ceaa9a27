pub mod ansi;
pub mod json;
pub mod registry;

use crate::ast::Span;

#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

/// An error ready for rendering. The first label is the one shown under the snippet.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<&'static str>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span, label: impl Into<String>) -> Self {
        self.labels.push(Label { span, message: label.into() });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

// ---- From impls for the error types ----

impl From<&crate::lexer::LexError> for Diagnostic {
    fn from(e: &crate::lexer::LexError) -> Self {
        let span = Span {
            start: e.position,
            end: e.position + e.snippet.len().max(1),
        };
        let mut d = Diagnostic::error(format!("unexpected character '{}'", e.snippet))
            .with_code("CALC-L001")
            .with_span(span, "here");
        if !e.suggestion.is_empty() {
            d = d.with_suggestion(e.suggestion.clone());
        }
        d
    }
}

impl From<&crate::parser::ParseError> for Diagnostic {
    fn from(e: &crate::parser::ParseError) -> Self {
        Diagnostic::error(&e.message).with_code(e.code).with_span(e.span, "here")
    }
}

impl From<&crate::vm::CompileError> for Diagnostic {
    fn from(e: &crate::vm::CompileError) -> Self {
        use crate::vm::CompileError;

        let d = Diagnostic::error(e.to_string()).with_code(e.code());
        match e {
            CompileError::MalformedLiteral { span, .. } => d
                .with_span(*span, "not a number")
                .with_suggestion("write numbers like 12, 0.5, 1_000 or 2e3"),
            CompileError::RegistersExhausted => d
                .with_note(format!("at most {} operands can be pending at once", crate::vm::REGISTER_COUNT - 1))
                .with_suggestion("reorder the expression so the deepest parentheses come first, or use --engine tree"),
            CompileError::DoubleFree { .. } | CompileError::LeakedRegisters { .. } => {
                d.with_note("this is a compiler bug, not an error in the input")
            }
            CompileError::TooManyConstants => d,
        }
    }
}

impl From<&crate::vm::VmError> for Diagnostic {
    fn from(e: &crate::vm::VmError) -> Self {
        Diagnostic::error(e.to_string())
            .with_code(e.code())
            .with_note("the bytecode does not match this VM; this is a compiler bug, not an error in the input")
    }
}

impl From<&crate::interpreter::RuntimeError> for Diagnostic {
    fn from(e: &crate::interpreter::RuntimeError) -> Self {
        Diagnostic::error(&e.message).with_code("CALC-E001").with_span(e.span, "not a number")
    }
}

impl From<&crate::Error> for Diagnostic {
    fn from(e: &crate::Error) -> Self {
        match e {
            crate::Error::Lex(e) => e.into(),
            crate::Error::Parse(e) => e.into(),
            crate::Error::Compile(e) => e.into(),
            crate::Error::Vm(e) => e.into(),
            crate::Error::Runtime(e) => e.into(),
            crate::Error::Emit(_) => Diagnostic::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    #[test]
    fn diagnostic_error_builder() {
        let d = Diagnostic::error("something went wrong");
        assert_eq!(d.message, "something went wrong");
        assert!(d.code.is_none());
        assert!(d.labels.is_empty());
        assert!(d.notes.is_empty());
        assert!(d.suggestion.is_none());
    }

    #[test]
    fn diagnostic_with_code_and_span() {
        let d = Diagnostic::error("bad token")
            .with_code("CALC-P001")
            .with_span(Span { start: 5, end: 8 }, "here");
        assert_eq!(d.code, Some("CALC-P001"));
        assert_eq!(d.labels.len(), 1);
        assert_eq!(d.labels[0].span, Span::new(5, 8));
        assert_eq!(d.labels[0].message, "here");
    }

    #[test]
    fn from_lex_error() {
        let e = crate::lexer::LexError {
            position: 3,
            snippet: "$".to_string(),
            suggestion: "Expected a number".to_string(),
        };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("CALC-L001"));
        assert!(d.message.contains('$'));
        assert_eq!(d.labels[0].span, Span { start: 3, end: 4 });
        assert!(d.suggestion.is_some());
    }

    #[test]
    fn from_parse_error() {
        let e = crate::parser::ParseError {
            code: "CALC-P002",
            position: 2,
            span: Span { start: 0, end: 4 },
            message: "expected ')'".to_string(),
        };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("CALC-P002"));
        assert_eq!(d.labels[0].span, Span { start: 0, end: 4 });
    }

    #[test]
    fn from_compile_error_malformed_literal() {
        let e = crate::vm::CompileError::MalformedLiteral { raw: "1.2.3".into(), span: Span::new(4, 9) };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("CALC-C001"));
        assert!(d.message.contains("1.2.3"));
        assert_eq!(d.labels[0].span, Span::new(4, 9));
    }

    #[test]
    fn from_compile_error_exhausted() {
        let d = Diagnostic::from(&crate::vm::CompileError::RegistersExhausted);
        assert_eq!(d.code, Some("CALC-C002"));
        assert!(d.labels.is_empty());
        assert!(d.suggestion.is_some());
    }

    #[test]
    fn from_vm_error() {
        let e = crate::vm::VmError::UnknownOpcode { op: 99, ip: 3 };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("CALC-R002"));
        assert!(d.message.contains("99"));
        assert!(d.notes.iter().any(|n| n.contains("compiler bug")));
    }

    #[test]
    fn from_runtime_error() {
        let e = crate::interpreter::RuntimeError { message: "malformed number literal '1..2'".into(), span: Span::new(0, 4) };
        let d = Diagnostic::from(&e);
        assert_eq!(d.code, Some("CALC-E001"));
        assert_eq!(d.labels[0].span, Span::new(0, 4));
    }

    #[test]
    fn from_emit_error() {
        let e = crate::Error::Emit(serde_json::from_str::<u8>("x").unwrap_err());
        let d = Diagnostic::from(&e);
        assert!(d.message.starts_with("cannot serialize program"), "got: {}", d.message);
        assert!(d.code.is_none());
    }

    #[test]
    fn every_code_is_registered() {
        let errors = [
            crate::eval("2 $ 2").unwrap_err(),
            crate::eval("(1").unwrap_err(),
            crate::eval("1 +").unwrap_err(),
            crate::eval("1.2.3").unwrap_err(),
            crate::eval(&"-".repeat(1000)).unwrap_err(),
        ];
        for e in &errors {
            let code = Diagnostic::from(e).code.expect("diagnostic has a code");
            assert!(registry::lookup(code).is_some(), "{code} missing from registry");
        }
    }
}
