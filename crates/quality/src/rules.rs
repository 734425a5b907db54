//! Declarative rule tables for the scoring engine. Every check the engine
//! performs is driven by an entry here, so adding a rule never touches the
//! fold in `engine.rs`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{IssueCategory, Severity};

/// A single pattern-driven rule: where it counts, how hard it hits, and what
/// to tell the author.
pub struct PatternRule {
    pub pattern: Regex,
    pub category: IssueCategory,
    pub severity: Severity,
    pub penalty: u32,
    pub description: &'static str,
    pub suggestion: &'static str,
}

// ── Structural markers ──────────────────────────────────────────────

/// Leading front-matter block: `---` fence, key/value lines, `---` fence.
pub static FRONT_MATTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A\s*---\s*\n(.*?)\n---").unwrap());

pub const REQUIRED_HEADER_KEYS: &[&str] = &["title", "date", "topic"];

/// A markdown pipe table: header row followed by a separator row.
pub static SUMMARY_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\|.+\|\s*\n\|[\s:|\-]+\|").unwrap());

pub static REFERENCES_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^(#{1,6}\s*references\b|\*\*references\*\*)").unwrap());

pub const MISSING_HEADER_PENALTY: u32 = 25;
pub const MISSING_HEADER_KEY_PENALTY: u32 = 10;
pub const MISSING_SUMMARY_TABLE_PENALTY: u32 = 15;
pub const MISSING_REFERENCES_STRUCTURE_PENALTY: u32 = 15;
pub const MISSING_REFERENCES_ATTRIBUTION_PENALTY: u32 = 30;

// ── Factual density ─────────────────────────────────────────────────

/// Placeholder tokens; each occurrence costs its rule's penalty.
pub static PLACEHOLDER_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule {
            pattern: Regex::new(r"(?i)\bTBD\b").unwrap(),
            category: IssueCategory::FactualDensity,
            severity: Severity::Major,
            penalty: 10,
            description: "placeholder token 'TBD'",
            suggestion: "Replace 'TBD' with the actual value or remove the line.",
        },
        PatternRule {
            pattern: Regex::new(r"(?i)\bTODO\b").unwrap(),
            category: IssueCategory::FactualDensity,
            severity: Severity::Major,
            penalty: 10,
            description: "placeholder token 'TODO'",
            suggestion: "Resolve the TODO before publishing.",
        },
        PatternRule {
            pattern: Regex::new(r"(?i)\bXXX+\b").unwrap(),
            category: IssueCategory::FactualDensity,
            severity: Severity::Major,
            penalty: 10,
            description: "placeholder token 'XXX'",
            suggestion: "Fill in the marked gap.",
        },
        PatternRule {
            pattern: Regex::new(r"(?i)\[(?:insert|placeholder|your)[^\]]*\]").unwrap(),
            category: IssueCategory::FactualDensity,
            severity: Severity::Major,
            penalty: 10,
            description: "bracketed stand-in text",
            suggestion: "Replace the bracketed stand-in with concrete content.",
        },
        PatternRule {
            pattern: Regex::new(r"(?i)lorem ipsum").unwrap(),
            category: IssueCategory::FactualDensity,
            severity: Severity::Major,
            penalty: 10,
            description: "lorem ipsum filler text",
            suggestion: "Remove the dummy text.",
        },
    ]
});

/// Concrete data tokens: percentages, currency figures, grouped numbers.
pub static DATA_TOKEN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\d+(?:\.\d+)?\s?%").unwrap(),
        Regex::new(r"[$€£¥]\s?\d[\d,]*(?:\.\d+)?[kKmMbB]?").unwrap(),
        Regex::new(r"\b\d[\d,]*(?:\.\d+)?\s?(?:USD|EUR|GBP|CNY|JPY)\b").unwrap(),
        Regex::new(r"\b\d{1,3}(?:,\d{3})+\b").unwrap(),
    ]
});

pub const MIN_DATA_TOKENS: usize = 5;
pub const LOW_DATA_PENALTY: u32 = 20;

// ── Attribution ─────────────────────────────────────────────────────

pub const ATTRIBUTION_PHRASES: &[&str] = &[
    "according to",
    "reported by",
    "as stated by",
    "sources say",
    "data from",
    "per a report",
    "cited by",
    "in an interview",
    "told reporters",
];

pub static BRACKET_CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());

pub const MIN_ATTRIBUTION_PHRASES: usize = 2;
pub const LOW_ATTRIBUTION_PENALTY: u32 = 15;
pub const MAX_BRACKET_CITATIONS: usize = 8;
pub const BRACKET_OVERUSE_PENALTY: u32 = 10;

// ── Formatting ──────────────────────────────────────────────────────

/// Malformed-markup patterns; each rule that matches at all costs its penalty
/// once, regardless of occurrence count.
pub static FORMAT_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule {
            pattern: Regex::new(r"\*\*\s*\*\*").unwrap(),
            category: IssueCategory::Formatting,
            severity: Severity::Minor,
            penalty: 10,
            description: "empty bold span",
            suggestion: "Remove the empty '**' pair or put text inside it.",
        },
        PatternRule {
            pattern: Regex::new(r"\[\s*\]\([^)]*\)").unwrap(),
            category: IssueCategory::Formatting,
            severity: Severity::Minor,
            penalty: 10,
            description: "link with empty text",
            suggestion: "Give the link a visible label.",
        },
        PatternRule {
            pattern: Regex::new(r"\\n").unwrap(),
            category: IssueCategory::Formatting,
            severity: Severity::Minor,
            penalty: 10,
            description: "literal escaped newline in output",
            suggestion: "Replace literal '\\n' sequences with real line breaks.",
        },
        PatternRule {
            pattern: Regex::new(r"\\t").unwrap(),
            category: IssueCategory::Formatting,
            severity: Severity::Minor,
            penalty: 10,
            description: "literal escaped tab in output",
            suggestion: "Replace literal '\\t' sequences with spacing or a table.",
        },
    ]
});

pub const HOLLOW_HEADING_PENALTY: u32 = 10;
pub const UNBALANCED_FENCE_PENALTY: u32 = 10;

// ── Analytical depth ────────────────────────────────────────────────

pub const FILLER_PHRASES: &[&str] = &[
    "it is important to note",
    "it's important to note",
    "in today's fast-paced world",
    "at the end of the day",
    "needless to say",
    "it goes without saying",
    "generally speaking",
    "in the grand scheme of things",
    "as we all know",
];

pub const CONNECTIVE_PHRASES: &[&str] = &[
    "however",
    "therefore",
    "because",
    "as a result",
    "in contrast",
    "consequently",
    "whereas",
    "despite",
    "due to",
    "on the other hand",
    "driven by",
];

pub const FILLER_TOLERANCE: usize = 2;
pub const FILLER_PENALTY_STEP: u32 = 8;
/// Below this word count the connective-density check is skipped; a two-line
/// answer is not an essay.
pub const MIN_WORDS_FOR_DENSITY: usize = 50;
/// Required connectives per 100 words.
pub const MIN_CONNECTIVES_PER_100_WORDS: f64 = 1.0;
pub const LOW_CONNECTIVE_PENALTY: u32 = 15;

// ── Register ────────────────────────────────────────────────────────

pub struct TermPair {
    pub disfavored: &'static str,
    pub preferred: &'static str,
}

/// House spelling: American forms.
pub const SPELLING_PAIRS: &[TermPair] = &[
    TermPair { disfavored: "utilise", preferred: "utilize" },
    TermPair { disfavored: "organisation", preferred: "organization" },
    TermPair { disfavored: "colour", preferred: "color" },
    TermPair { disfavored: "analyse", preferred: "analyze" },
    TermPair { disfavored: "behaviour", preferred: "behavior" },
    TermPair { disfavored: "optimise", preferred: "optimize" },
    TermPair { disfavored: "centre", preferred: "center" },
];

/// House terminology.
pub const TERMINOLOGY_PAIRS: &[TermPair] = &[
    TermPair { disfavored: "crypto currency", preferred: "cryptocurrency" },
    TermPair { disfavored: "block chain", preferred: "blockchain" },
    TermPair { disfavored: "e-mail", preferred: "email" },
    TermPair { disfavored: "web site", preferred: "website" },
    TermPair { disfavored: "smart-contract", preferred: "smart contract" },
    TermPair { disfavored: "de-fi", preferred: "DeFi" },
];

pub const REGISTER_PENALTY: u32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_matter_matches_leading_block() {
        let text = "---\ntitle: Report\ndate: 2025-01-01\n---\n\nBody";
        let caps = FRONT_MATTER.captures(text).unwrap();
        assert!(caps.get(1).unwrap().as_str().contains("title: Report"));
    }

    #[test]
    fn test_front_matter_requires_leading_position() {
        let text = "Body first\n---\ntitle: Report\n---";
        assert!(FRONT_MATTER.captures(text).is_none());
    }

    #[test]
    fn test_summary_table_detection() {
        let text = "| Metric | Value |\n|--------|-------|\n| Price | $10 |";
        assert!(SUMMARY_TABLE.is_match(text));
        assert!(!SUMMARY_TABLE.is_match("no tables here"));
    }

    #[test]
    fn test_references_heading_forms() {
        assert!(REFERENCES_SECTION.is_match("## References\n- [1]"));
        assert!(REFERENCES_SECTION.is_match("**References**\n- a"));
        assert!(REFERENCES_SECTION.is_match("### references\n"));
        assert!(!REFERENCES_SECTION.is_match("these references are inline"));
    }

    #[test]
    fn test_placeholder_rules_count_occurrences() {
        let text = "Revenue: TBD. Margin: TBD. Outlook: TBD.";
        let tbd = &PLACEHOLDER_RULES[0];
        assert_eq!(tbd.pattern.find_iter(text).count(), 3);
    }

    #[test]
    fn test_data_token_patterns() {
        let text = "Revenue grew 12.5% to $4,200, or 3,100,000 EUR total.";
        let total: usize = DATA_TOKEN_PATTERNS
            .iter()
            .map(|p| p.find_iter(text).count())
            .sum();
        assert!(total >= 3, "expected at least 3 data tokens, got {}", total);
    }
}
