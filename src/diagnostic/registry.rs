/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str,  // one-line description
    pub long: &'static str,   // full explanation for --explain
}

/// All stable error codes.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Lexer ────────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "CALC-L001",
        short: "unexpected character",
        long: r#"## CALC-L001: unexpected character

The input contains a character that is not part of an arithmetic
expression. Only digits, `.`, `_`, `e`, the operators `+ - * /`,
parentheses, whitespace and `#` comments are accepted.

**Example:**

    2 x 3

Write `2 * 3` instead.
"#,
    },

    // ── Parser ───────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "CALC-P001",
        short: "expected a number or '('",
        long: r#"## CALC-P001: expected a number or '('

An operand was expected but the parser found an operator, a closing
parenthesis or the end of the input.

**Examples:**

    1 +        -- missing right operand
    * 2        -- missing left operand
    1 + 2)     -- stray closing parenthesis
"#,
    },
    ErrorEntry {
        code: "CALC-P002",
        short: "unclosed parenthesis",
        long: r#"## CALC-P002: unclosed parenthesis

A `(` was opened but the matching `)` never came.

**Example:**

    (1 + 2 * 3

**Fix:**

    (1 + 2) * 3
"#,
    },
    ErrorEntry {
        code: "CALC-P003",
        short: "expression too long or nested too deeply",
        long: r#"## CALC-P003: expression nests too deeply

The parser stops at 512 levels of nesting. Each operator in a chain adds
a level, as does each `(` group and each unary `-`. So a sum of more
than 512 terms is rejected, and so is a run of more than 512 nested
parentheses.

**Examples:**

    1+1+1+ ... +1        -- 600 terms
    ---- ... ----1       -- 600 minus signs

Split a long sum across several statements, or drop redundant
parentheses and sign flips.
"#,
    },

    // ── Compiler ─────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "CALC-C001",
        short: "malformed number literal",
        long: r#"## CALC-C001: malformed number literal

A token that looked like a number could not be read as one. Numbers are
digits with at most one `.`, optional `_` separators and an optional
`e` exponent.

**Examples that trigger this:**

    1.2.3
    1e
    .

**Valid forms:**

    12   0.5   .5   10_000   2e3
"#,
    },
    ErrorEntry {
        code: "CALC-C002",
        short: "expression nests too deeply",
        long: r#"## CALC-C002: expression nests too deeply

Each operator whose right-hand side is still being computed holds one
scratch register. The VM has 15 scratch registers, so at most 15
operators can be pending at the same time.

**Example:**

    1+(1+(1+(1+(1+(1+(1+(1+(1+(1+(1+(1+(1+(1+(1+(1+1)))))))))))))))

Left-leaning chains such as `1+1+1+...` need only one register, so
rewriting the expression to evaluate the deepest group first helps.
The tree engine (`--engine tree`) has no such limit.
"#,
    },
    ErrorEntry {
        code: "CALC-C003",
        short: "register released twice (internal)",
        long: r#"## CALC-C003: register released twice

The compiler released a scratch register it did not hold. No input can
cause this; it indicates a compiler bug.
"#,
    },
    ErrorEntry {
        code: "CALC-C004",
        short: "registers leaked (internal)",
        long: r#"## CALC-C004: registers leaked

Scratch registers were still held when compilation finished. No input
can cause this; it indicates a compiler bug.
"#,
    },
    ErrorEntry {
        code: "CALC-C005",
        short: "too many distinct literals",
        long: r#"## CALC-C005: too many distinct literals

A chunk's constant pool is indexed by 16 bits, so one program can use at
most 65536 distinct number literals. Repeated literals share a slot.
"#,
    },

    // ── VM ───────────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "CALC-R001",
        short: "register out of bounds",
        long: r#"## CALC-R001: register out of bounds

An instruction named a register outside the VM's register file. Code
produced by the compiler never does this; the bytecode was built by hand
or for a different VM.
"#,
    },
    ErrorEntry {
        code: "CALC-R002",
        short: "unknown opcode",
        long: r#"## CALC-R002: unknown opcode

The VM read an instruction whose opcode it does not recognise. This
indicates a mismatch between the compiler and the VM, not a user error.
"#,
    },
    ErrorEntry {
        code: "CALC-R003",
        short: "constant index out of range",
        long: r#"## CALC-R003: constant index out of range

A `LOAD` referenced a constant pool slot that does not exist. This
indicates corrupted or hand-built bytecode.
"#,
    },

    // ── Tree engine ──────────────────────────────────────────────────────────
    ErrorEntry {
        code: "CALC-E001",
        short: "malformed number literal (tree engine)",
        long: r#"## CALC-E001: malformed number literal

The tree engine could not read a literal as a number. See CALC-C001 for
the accepted forms.
"#,
    },
];

/// Look up an error entry by code (e.g. `"CALC-P001"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_code() {
        let e = lookup("CALC-C002").expect("CALC-C002 should be in registry");
        assert_eq!(e.code, "CALC-C002");
        assert!(!e.short.is_empty());
        assert!(e.long.contains("CALC-C002"));
    }

    #[test]
    fn lookup_unknown_returns_none() {
        assert!(lookup("CALC-XXXX").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn all_codes_unique() {
        let mut codes: Vec<&str> = REGISTRY.iter().map(|e| e.code).collect();
        codes.sort_unstable();
        let len_before = codes.len();
        codes.dedup();
        assert_eq!(codes.len(), len_before, "duplicate codes in registry");
    }

    #[test]
    fn long_text_names_its_code() {
        for entry in REGISTRY {
            assert!(!entry.short.is_empty(), "{} missing short description", entry.code);
            assert!(entry.long.contains(entry.code), "{} long text does not mention its code", entry.code);
        }
    }

    #[test]
    fn parse_codes_are_registered() {
        for code in ["CALC-P001", "CALC-P002", "CALC-P003"] {
            assert!(lookup(code).is_some(), "{code} missing from registry");
        }
    }

    #[test]
    fn compile_and_vm_codes_are_registered() {
        use crate::vm::{CompileError, VmError};
        let codes = [
            CompileError::RegistersExhausted.code(),
            CompileError::DoubleFree { register: 1 }.code(),
            CompileError::LeakedRegisters { registers: vec![1] }.code(),
            CompileError::TooManyConstants.code(),
            VmError::RegisterOutOfBounds { register: 99, ip: 0 }.code(),
            VmError::UnknownOpcode { op: 99, ip: 0 }.code(),
            VmError::BadConstant { index: 9, ip: 0 }.code(),
        ];
        for code in codes {
            assert!(lookup(code).is_some(), "{code} missing from registry");
        }
    }
}
