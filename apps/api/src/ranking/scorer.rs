//! Resume Scorer: scores one resume against the criteria set via the model service.
//!
//! The model answers in a loose line format:
//!
//! ```text
//! Name: Jane Doe
//! C1: 4 - strong Go background
//! C2: 0 - no certification found
//! ```
//!
//! Entries may also be separated by semicolons. Parsing is per criterion: a missing or
//! malformed entry becomes a zero score with a fallback explanation instead of failing
//! the candidate. Only a completion with no criterion entries at all is an error.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::llm_client::prompts::LINE_FORMAT_SYSTEM;
use crate::llm_client::{strip_json_fences, CompletionOptions, CompletionService};
use crate::ranking::models::{CandidateScore, CriteriaSet, CriterionScore, UNKNOWN_CANDIDATE};
use crate::ranking::prompts::{SCORING_PROMPT_TEMPLATE, SCORING_SYSTEM};
use crate::ranking::RankingError;

pub const MAX_SCORE: u8 = 5;
pub const FALLBACK_EXPLANATION: &str = "could not parse model output for this criterion";
const MISSING_EXPLANATION: &str = "No explanation provided";

/// Start of a `Name:` (or `Candidate Name:`) or `C<n>:` field.
/// Fields begin the completion or follow a newline or `;`.
static FIELD_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[\n;])[ \t*#>\-]*(?:((?:candidate[ \t]+)?name)|(?:criterion|c)[ \t]*([0-9]+))[ \t*]*:")
        .expect("valid regex")
});

/// `<score>[/5] [separator] <justification>`, markdown emphasis around the score allowed.
static CRITERION_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([0-9]+)(\.[0-9]+)?[*_]*(?:[ \t]*/[ \t]*5)?[*_]*[ \t]*[-–—:|,)]?\s*(.*)$")
        .expect("valid regex")
});

/// Per-criterion parse result.
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionOutcome {
    Scored { score: u8, explanation: String },
    Fallback { reason: String },
}

impl CriterionOutcome {
    fn fallback(reason: &str) -> Self {
        CriterionOutcome::Fallback {
            reason: reason.to_string(),
        }
    }
}

/// Raw fields located in a completion, before per-criterion parsing.
#[derive(Debug, Default)]
struct ScoreSheet<'a> {
    name: Option<&'a str>,
    /// 1-based criterion index → raw entry text. First occurrence wins.
    entries: BTreeMap<usize, &'a str>,
}

/// Scores one resume. Requires a non-empty criteria set; makes exactly one model call.
pub async fn score_resume(
    llm: &dyn CompletionService,
    resume_text: &str,
    criteria: &CriteriaSet,
) -> Result<CandidateScore, RankingError> {
    if criteria.is_empty() {
        return Err(RankingError::NoCriteria);
    }

    let prompt = build_scoring_prompt(resume_text, criteria);
    let options = CompletionOptions::deterministic(&format!("{SCORING_SYSTEM} {LINE_FORMAT_SYSTEM}"));
    let completion = llm.complete(&prompt, &options).await?;

    parse_score_completion(&completion, criteria)
}

fn build_scoring_prompt(resume_text: &str, criteria: &CriteriaSet) -> String {
    let criteria_list = criteria
        .iter()
        .enumerate()
        .map(|(i, c)| format!("C{}: {}", i + 1, c))
        .collect::<Vec<_>>()
        .join("\n");

    // Resume text goes in last so its content is never treated as a placeholder.
    SCORING_PROMPT_TEMPLATE
        .replace("{criteria_count}", &criteria.len().to_string())
        .replace("{criteria_list}", &criteria_list)
        .replace("{resume_text}", resume_text)
}

/// Turns a scoring completion into a `CandidateScore` aligned 1:1 with `criteria`.
pub fn parse_score_completion(
    completion: &str,
    criteria: &CriteriaSet,
) -> Result<CandidateScore, RankingError> {
    let sheet = split_score_sheet(strip_json_fences(completion));

    if sheet.entries.is_empty() {
        return Err(RankingError::ScoreParse(
            "no per-criterion entries found".to_string(),
        ));
    }

    if let Some(extra) = sheet.entries.keys().find(|&&i| i > criteria.len()) {
        debug!(
            "Ignoring score entries from C{} beyond {} criteria",
            extra,
            criteria.len()
        );
    }

    let scores = criteria
        .iter()
        .enumerate()
        .map(|(i, criterion)| {
            let outcome = match sheet.entries.get(&(i + 1)) {
                Some(raw) => parse_criterion_entry(raw),
                None => CriterionOutcome::fallback("no entry for this criterion"),
            };
            match outcome {
                CriterionOutcome::Scored { score, explanation } => CriterionScore {
                    criterion: criterion.clone(),
                    score,
                    explanation,
                },
                CriterionOutcome::Fallback { reason } => {
                    warn!("Criterion C{} fell back to score 0: {}", i + 1, reason);
                    CriterionScore {
                        criterion: criterion.clone(),
                        score: 0,
                        explanation: FALLBACK_EXPLANATION.to_string(),
                    }
                }
            }
        })
        .collect();

    let name = sheet
        .name
        .map(clean_name)
        .unwrap_or_else(|| UNKNOWN_CANDIDATE.to_string());

    Ok(CandidateScore::new(name, scores))
}

fn split_score_sheet(completion: &str) -> ScoreSheet<'_> {
    let markers: Vec<_> = FIELD_MARKER.captures_iter(completion).collect();
    let mut sheet = ScoreSheet::default();

    for (i, caps) in markers.iter().enumerate() {
        let Some(whole) = caps.get(0) else { continue };
        let value_end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(completion.len());
        let value = &completion[whole.end()..value_end];

        if caps.get(1).is_some() {
            sheet.name.get_or_insert(value);
        } else if let Some(index) = caps.get(2).and_then(|m| m.as_str().parse::<usize>().ok()) {
            if index >= 1 {
                sheet.entries.entry(index).or_insert(value);
            }
        }
    }

    sheet
}

/// Parses one `C<n>:` entry body into a score and justification.
pub fn parse_criterion_entry(raw: &str) -> CriterionOutcome {
    let raw = raw.trim_start_matches(|c: char| c == '*' || c == '_' || c.is_whitespace());
    let Some(caps) = CRITERION_ENTRY.captures(raw) else {
        return CriterionOutcome::fallback("entry does not start with a score");
    };

    if caps.get(2).is_some() {
        return CriterionOutcome::fallback("score is not a whole number");
    }

    let score = match caps[1].parse::<u8>() {
        Ok(score) if score <= MAX_SCORE => score,
        _ => return CriterionOutcome::fallback("score is outside 0-5"),
    };

    let explanation = clean_explanation(caps.get(3).map(|m| m.as_str()).unwrap_or(""));

    CriterionOutcome::Scored { score, explanation }
}

fn clean_explanation(raw: &str) -> String {
    let flattened = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let cleaned = flattened.trim_end_matches(';').trim();
    if cleaned.is_empty() {
        MISSING_EXPLANATION.to_string()
    } else {
        cleaned.to_string()
    }
}

fn clean_name(raw: &str) -> String {
    let name = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let name = name
        .trim_end_matches(';')
        .trim_matches(|c: char| c == '*' || c == '"' || c == '\'' || c.is_whitespace());
    if name.is_empty() || name.eq_ignore_ascii_case(UNKNOWN_CANDIDATE) {
        UNKNOWN_CANDIDATE.to_string()
    } else {
        name.to_string()
    }
}
