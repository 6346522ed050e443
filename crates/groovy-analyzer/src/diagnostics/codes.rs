//! Stable diagnostic codes derived from compiler message text.
//!
//! Messages are matched case-insensitively against an ordered rule table per
//! kind; the first matching rule wins. Unmatched messages fall back to the
//! kind's general code. Codes are part of the external contract and never
//! renumbered.

use super::DiagnosticKind;

struct Rule {
    needles: &'static [&'static str],
    code: &'static str,
}

const SYNTAX_RULES: &[Rule] = &[
    Rule {
        needles: &["unexpected token"],
        code: "groovy-1001",
    },
    Rule {
        needles: &[
            "missing ')'",
            "missing '('",
            "expecting ')'",
            "expecting '('",
            "unbalanced paren",
        ],
        code: "groovy-1002",
    },
    Rule {
        needles: &["invalid identifier", "illegal identifier"],
        code: "groovy-1003",
    },
    Rule {
        needles: &[
            "unclosed string",
            "unterminated string",
            "string literal is not terminated",
        ],
        code: "groovy-1004",
    },
    Rule {
        needles: &["unexpected eof", "unexpected end of file", "reached end of file"],
        code: "groovy-1005",
    },
];

const SEMANTIC_RULES: &[Rule] = &[
    Rule {
        needles: &["undefined variable", "undeclared variable"],
        code: "groovy-2001",
    },
    Rule {
        needles: &["duplicate method", "repetitive method"],
        code: "groovy-2002",
    },
    Rule {
        needles: &["missing return", "not all code paths return"],
        code: "groovy-2003",
    },
    Rule {
        needles: &["unable to resolve import", "invalid import"],
        code: "groovy-2004",
    },
    Rule {
        needles: &["unreachable"],
        code: "groovy-2005",
    },
];

const TYPE_RULES: &[Rule] = &[
    Rule {
        needles: &["type mismatch", "cannot convert"],
        code: "groovy-3001",
    },
    Rule {
        needles: &["unable to resolve class", "cannot resolve class"],
        code: "groovy-3002",
    },
    Rule {
        needles: &["incompatible cast", "cannot cast"],
        code: "groovy-3003",
    },
    Rule {
        needles: &["invalid assignment", "cannot assign"],
        code: "groovy-3004",
    },
    Rule {
        needles: &["undefined method", "no signature of method"],
        code: "groovy-3005",
    },
];

const WARNING_RULES: &[Rule] = &[
    Rule {
        needles: &["unused variable"],
        code: "groovy-4001",
    },
    Rule {
        needles: &["deprecated"],
        code: "groovy-4002",
    },
    Rule {
        needles: &["dead code"],
        code: "groovy-4003",
    },
    Rule {
        needles: &["unnecessary cast", "redundant cast"],
        code: "groovy-4004",
    },
];

/// Map a compiler message to its stable diagnostic code.
pub fn diagnostic_code(kind: DiagnosticKind, message: &str) -> &'static str {
    let (rules, fallback) = match kind {
        DiagnosticKind::Syntax => (SYNTAX_RULES, "groovy-1000"),
        DiagnosticKind::Semantic => (SEMANTIC_RULES, "groovy-2000"),
        DiagnosticKind::Type => (TYPE_RULES, "groovy-3000"),
        DiagnosticKind::Warning => (WARNING_RULES, "groovy-4000"),
    };

    let lowered = message.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.needles.iter().any(|needle| lowered.contains(needle)))
        .map(|rule| rule.code)
        .unwrap_or(fallback)
}
