//! The scoring fold: six dimensions, each starting at 100 and decremented by
//! rule violations, combined into a fixed weighted overall score.

use crate::rules::*;
use crate::{DimensionScores, Issue, IssueCategory, QualityReview, Severity};

pub const STRUCTURE_WEIGHT: f64 = 0.15;
pub const FACTUAL_DENSITY_WEIGHT: f64 = 0.25;
pub const ATTRIBUTION_WEIGHT: f64 = 0.20;
pub const FORMATTING_WEIGHT: f64 = 0.15;
pub const DEPTH_WEIGHT: f64 = 0.20;
pub const REGISTER_WEIGHT: f64 = 0.10;

pub const DEFAULT_PASS_THRESHOLD: f64 = 70.0;

pub fn score(text: &str) -> QualityReview {
    score_with_threshold(text, DEFAULT_PASS_THRESHOLD)
}

/// Pure scoring function: no I/O, no side effects, identical input yields an
/// identical review.
pub fn score_with_threshold(text: &str, pass_threshold: f64) -> QualityReview {
    let lower = text.to_lowercase();
    let has_references = REFERENCES_SECTION.is_match(text);

    let mut issues = Vec::new();
    let structure = check_structure(text, has_references, &mut issues);
    let factual_density = check_factual_density(text, &mut issues);
    let attribution = check_attribution(&lower, has_references, &mut issues);
    let formatting = check_formatting(text, &mut issues);
    let depth = check_depth(&lower, &mut issues);
    let register = check_register(&lower, &mut issues);

    issues.sort_by_key(|i| i.severity);

    let dimensions = DimensionScores {
        structure,
        factual_density,
        attribution,
        formatting,
        depth,
        register,
    };
    let overall = weighted_overall(&dimensions);

    QualityReview {
        dimensions,
        overall,
        passed: overall >= pass_threshold,
        issues,
    }
}

fn weighted_overall(d: &DimensionScores) -> f64 {
    let raw = f64::from(d.structure) * STRUCTURE_WEIGHT
        + f64::from(d.factual_density) * FACTUAL_DENSITY_WEIGHT
        + f64::from(d.attribution) * ATTRIBUTION_WEIGHT
        + f64::from(d.formatting) * FORMATTING_WEIGHT
        + f64::from(d.depth) * DEPTH_WEIGHT
        + f64::from(d.register) * REGISTER_WEIGHT;
    (raw * 10.0).round() / 10.0
}

fn finish(penalty: u32) -> u8 {
    100u32.saturating_sub(penalty) as u8
}

fn count_phrase(lower: &str, phrase: &str) -> usize {
    lower.match_indices(phrase).count()
}

fn check_structure(text: &str, has_references: bool, issues: &mut Vec<Issue>) -> u8 {
    let mut penalty = 0;

    match FRONT_MATTER.captures(text) {
        None => {
            penalty += MISSING_HEADER_PENALTY;
            issues.push(Issue {
                severity: Severity::Major,
                category: IssueCategory::Structure,
                description: "missing metadata header block".to_string(),
                suggestion: "Open the document with a '---' front-matter block carrying title, date and topic.".to_string(),
            });
        }
        Some(caps) => {
            let block = caps.get(1).map(|m| m.as_str()).unwrap_or_default().to_lowercase();
            for key in REQUIRED_HEADER_KEYS {
                let present = block
                    .lines()
                    .any(|line| line.trim_start().starts_with(&format!("{}:", key)));
                if !present {
                    penalty += MISSING_HEADER_KEY_PENALTY;
                    issues.push(Issue {
                        severity: Severity::Minor,
                        category: IssueCategory::Structure,
                        description: format!("metadata header is missing the '{}' key", key),
                        suggestion: format!("Add a '{}: ...' line to the front-matter block.", key),
                    });
                }
            }
        }
    }

    if !SUMMARY_TABLE.is_match(text) {
        penalty += MISSING_SUMMARY_TABLE_PENALTY;
        issues.push(Issue {
            severity: Severity::Major,
            category: IssueCategory::Structure,
            description: "missing summary table".to_string(),
            suggestion: "Add a markdown table summarizing the key figures.".to_string(),
        });
    }

    // References absence is penalized here and in attribution; the issue
    // itself is recorded once, by the attribution check.
    if !has_references {
        penalty += MISSING_REFERENCES_STRUCTURE_PENALTY;
    }

    finish(penalty)
}

fn check_factual_density(text: &str, issues: &mut Vec<Issue>) -> u8 {
    let mut penalty = 0;

    for rule in PLACEHOLDER_RULES.iter() {
        let count = rule.pattern.find_iter(text).count();
        if count > 0 {
            penalty += rule.penalty * count as u32;
            issues.push(Issue {
                severity: rule.severity,
                category: rule.category,
                description: format!("{} ({} occurrence{})", rule.description, count, if count == 1 { "" } else { "s" }),
                suggestion: rule.suggestion.to_string(),
            });
        }
    }

    let data_tokens: usize = DATA_TOKEN_PATTERNS
        .iter()
        .map(|pattern| pattern.find_iter(text).count())
        .sum();
    if data_tokens < MIN_DATA_TOKENS {
        penalty += LOW_DATA_PENALTY;
        issues.push(Issue {
            severity: Severity::Major,
            category: IssueCategory::FactualDensity,
            description: format!(
                "only {} concrete data points (minimum {})",
                data_tokens, MIN_DATA_TOKENS
            ),
            suggestion: "Back the narrative with specific figures: percentages, amounts, dated totals.".to_string(),
        });
    }

    finish(penalty)
}

fn check_attribution(lower: &str, has_references: bool, issues: &mut Vec<Issue>) -> u8 {
    let mut penalty = 0;

    let natural: usize = ATTRIBUTION_PHRASES
        .iter()
        .map(|phrase| count_phrase(lower, phrase))
        .sum();
    let brackets = BRACKET_CITATION.find_iter(lower).count();

    if natural < MIN_ATTRIBUTION_PHRASES {
        penalty += LOW_ATTRIBUTION_PENALTY;
        issues.push(Issue {
            severity: Severity::Major,
            category: IssueCategory::Attribution,
            description: format!(
                "only {} natural attribution phrase{} (minimum {})",
                natural,
                if natural == 1 { "" } else { "s" },
                MIN_ATTRIBUTION_PHRASES
            ),
            suggestion: "Name sources in prose ('according to ...') instead of leaning on bare citations.".to_string(),
        });
    }

    if brackets > MAX_BRACKET_CITATIONS {
        penalty += BRACKET_OVERUSE_PENALTY;
        issues.push(Issue {
            severity: Severity::Minor,
            category: IssueCategory::Attribution,
            description: format!("{} bracket citations (cap {})", brackets, MAX_BRACKET_CITATIONS),
            suggestion: "Fold some numeric citations into natural attribution.".to_string(),
        });
    }

    if !has_references {
        penalty += MISSING_REFERENCES_ATTRIBUTION_PENALTY;
        issues.push(Issue {
            severity: Severity::Critical,
            category: IssueCategory::Attribution,
            description: "missing references section".to_string(),
            suggestion: "Close the document with a '## References' section listing every source.".to_string(),
        });
    }

    finish(penalty)
}

fn check_formatting(text: &str, issues: &mut Vec<Issue>) -> u8 {
    let mut penalty = 0;

    for rule in FORMAT_RULES.iter() {
        if rule.pattern.is_match(text) {
            penalty += rule.penalty;
            issues.push(Issue {
                severity: rule.severity,
                category: rule.category,
                description: rule.description.to_string(),
                suggestion: rule.suggestion.to_string(),
            });
        }
    }

    if has_hollow_heading(text) {
        penalty += HOLLOW_HEADING_PENALTY;
        issues.push(Issue {
            severity: Severity::Minor,
            category: IssueCategory::Formatting,
            description: "heading with no following content".to_string(),
            suggestion: "Write body text under every heading or drop the heading.".to_string(),
        });
    }

    let fences = text.lines().filter(|line| line.trim_start().starts_with("```")).count();
    if fences % 2 != 0 {
        penalty += UNBALANCED_FENCE_PENALTY;
        issues.push(Issue {
            severity: Severity::Minor,
            category: IssueCategory::Formatting,
            description: "unclosed code fence".to_string(),
            suggestion: "Balance every '```' opener with a closer.".to_string(),
        });
    }

    finish(penalty)
}

/// A heading directly followed by another heading (or the end of the
/// document), with only blank lines between.
fn has_hollow_heading(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if !line.trim_start().starts_with('#') {
            continue;
        }
        let mut next_content = None;
        for following in &lines[i + 1..] {
            if !following.trim().is_empty() {
                next_content = Some(*following);
                break;
            }
        }
        match next_content {
            None => return true,
            Some(following) if following.trim_start().starts_with('#') => return true,
            Some(_) => {}
        }
    }
    false
}

fn check_depth(lower: &str, issues: &mut Vec<Issue>) -> u8 {
    let mut penalty = 0;

    let filler: usize = FILLER_PHRASES
        .iter()
        .map(|phrase| count_phrase(lower, phrase))
        .sum();
    let connectives: usize = CONNECTIVE_PHRASES
        .iter()
        .map(|phrase| count_phrase(lower, phrase))
        .sum();
    let words = lower.split_whitespace().count();

    if filler > FILLER_TOLERANCE {
        let excess = (filler - FILLER_TOLERANCE) as u32;
        penalty += excess * FILLER_PENALTY_STEP;
        issues.push(Issue {
            severity: Severity::Major,
            category: IssueCategory::Depth,
            description: format!("{} filler phrases (tolerance {})", filler, FILLER_TOLERANCE),
            suggestion: "Cut hedging boilerplate; state the finding directly.".to_string(),
        });
    }

    if words >= MIN_WORDS_FOR_DENSITY {
        let density = connectives as f64 * 100.0 / words as f64;
        if density < MIN_CONNECTIVES_PER_100_WORDS {
            penalty += LOW_CONNECTIVE_PENALTY;
            issues.push(Issue {
                severity: Severity::Minor,
                category: IssueCategory::Depth,
                description: format!(
                    "{} analytical connectives across {} words",
                    connectives, words
                ),
                suggestion: "Link claims with contrast and causation ('however', 'as a result', 'because').".to_string(),
            });
        }
    }

    finish(penalty)
}

fn check_register(lower: &str, issues: &mut Vec<Issue>) -> u8 {
    let mut penalty = 0;

    for table in [SPELLING_PAIRS, TERMINOLOGY_PAIRS] {
        for pair in table {
            let count = count_phrase(lower, pair.disfavored);
            if count > 0 {
                penalty += REGISTER_PENALTY * count as u32;
                issues.push(Issue {
                    severity: Severity::Minor,
                    category: IssueCategory::Register,
                    description: format!(
                        "disfavored form '{}' ({} occurrence{})",
                        pair.disfavored,
                        count,
                        if count == 1 { "" } else { "s" }
                    ),
                    suggestion: format!("Use '{}' instead of '{}'.", pair.preferred, pair.disfavored),
                });
            }
        }
    }

    finish(penalty)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN_REPORT: &str = "---\n\
title: Quarterly Market Review\n\
date: 2025-06-30\n\
topic: markets\n\
---\n\
\n\
## Overview\n\
\n\
According to the exchange's filings, spot volume rose 18% quarter over\n\
quarter to $1,400,000, driven by institutional inflows. However, reported by\n\
two independent desks, derivatives open interest fell 6% because funding\n\
rates stayed negative. As a result, net revenue landed at $3,200,000, up 9%.\n\
\n\
| Metric | Value |\n\
|--------|-------|\n\
| Spot volume | $1,400,000 |\n\
| Net revenue | $3,200,000 |\n\
\n\
Margins compressed to 41% despite the volume growth, whereas custody fees\n\
held at 12 USD per account.\n\
\n\
## References\n\
\n\
- Exchange quarterly filing, 2025-06-30\n\
- Desk commentary, according to the trading team\n";

    #[test]
    fn test_weights_sum_to_one() {
        let sum = STRUCTURE_WEIGHT
            + FACTUAL_DENSITY_WEIGHT
            + ATTRIBUTION_WEIGHT
            + FORMATTING_WEIGHT
            + DEPTH_WEIGHT
            + REGISTER_WEIGHT;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_clean_report_passes() {
        let review = score(CLEAN_REPORT);
        assert_eq!(review.dimensions.structure, 100, "{:?}", review.issues);
        assert_eq!(review.dimensions.factual_density, 100, "{:?}", review.issues);
        assert_eq!(review.dimensions.attribution, 100, "{:?}", review.issues);
        assert_eq!(review.dimensions.formatting, 100, "{:?}", review.issues);
        assert_eq!(review.dimensions.register, 100, "{:?}", review.issues);
        assert!(review.passed);
        assert!(review.overall >= 95.0);
    }

    #[test]
    fn test_idempotent() {
        let text = "Draft with TBD numbers and colour commentary.";
        assert_eq!(score(text), score(text));
    }

    #[test]
    fn test_placeholders_and_missing_references() {
        // Three placeholder tokens, no references section
        let text = "Revenue: TBD. Margin: TBD. Guidance: TBD.";
        let review = score(text);

        assert!(review.dimensions.factual_density < 100);
        assert!(review
            .issues
            .iter()
            .any(|i| i.severity == Severity::Critical
                && i.description.contains("references")));
        // 3 x 10 placeholder penalty + 20 low-data penalty
        assert_eq!(review.dimensions.factual_density, 50);
    }

    #[test]
    fn test_issues_sorted_by_severity() {
        let text = "Revenue: TBD, colour commentary only.";
        let review = score(text);
        let severities: Vec<Severity> = review.issues.iter().map(|i| i.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort();
        assert_eq!(severities, sorted);
        assert_eq!(severities.first(), Some(&Severity::Critical));
    }

    #[test]
    fn test_register_pairs_recorded() {
        let text = "The organisation tracks crypto currency flows by e-mail.";
        let review = score(text);
        assert!(review.dimensions.register < 100);
        let register_issues: Vec<&Issue> = review
            .issues
            .iter()
            .filter(|i| i.category == IssueCategory::Register)
            .collect();
        assert_eq!(register_issues.len(), 3);
        assert!(register_issues
            .iter()
            .any(|i| i.suggestion.contains("cryptocurrency")));
    }

    #[test]
    fn test_formatting_penalties() {
        let text = "## Empty Section\n\n## Next\n\ntext with ** ** and a literal \\n escape";
        let review = score(text);
        assert!(review.dimensions.formatting <= 70);
        assert!(review
            .issues
            .iter()
            .any(|i| i.description.contains("heading with no following content")));
    }

    #[test]
    fn test_filler_penalty_scales() {
        let text = "It is important to note this. Needless to say, more. \
            Generally speaking, fine. At the end of the day, done.";
        let review = score(text);
        // 4 fillers, tolerance 2 -> 2 * 8 = 16
        assert_eq!(review.dimensions.depth, 84);
    }

    #[test]
    fn test_dimension_clamped_at_zero() {
        let many_placeholders = "TBD ".repeat(20);
        let review = score(&many_placeholders);
        assert_eq!(review.dimensions.factual_density, 0);
    }

    #[test]
    fn test_overall_weighted_mix() {
        let d = DimensionScores {
            structure: 100,
            factual_density: 0,
            attribution: 100,
            formatting: 100,
            depth: 100,
            register: 100,
        };
        assert!((weighted_overall(&d) - 75.0).abs() < 1e-9);
    }
}
