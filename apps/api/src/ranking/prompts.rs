// All LLM prompt constants for the ranking pipeline.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for criteria extraction. Combine with `JSON_ONLY_SYSTEM`.
pub const CRITERIA_SYSTEM: &str = "You are an expert technical recruiter. \
    Analyze job descriptions and extract only the essential criteria that directly \
    help evaluate candidate qualifications.";

/// Criteria extraction prompt template. Replace `{jd_text}` before sending.
pub const CRITERIA_PROMPT_TEMPLATE: &str = r#"Extract the ranking criteria from the job description below.

Focus on:
1. Required and preferred qualifications:
   - Educational requirements
   - Years of experience
   - Technical skills and proficiencies
   - Certifications and licenses
   - Domain expertise
   - Required languages (programming or spoken)
2. Measurable competencies:
   - Specific tools or technologies
   - Performance metrics
   - Leadership experience (number of direct reports, budget size)
   - Project scale indicators

Ignore:
- Generic soft skills (unless specifically quantified)
- Company culture statements
- Basic job responsibilities
- Benefits and perks
- Location requirements (unless specialized)

Each criterion must be distinct and atomic: one requirement per item, phrased as a clear,
actionable statement such as "5+ years of experience in Python development".

Return a JSON object with this EXACT schema (no extra fields):
{"criteria": ["criterion one", "criterion two"]}

JOB DESCRIPTION:
{jd_text}"#;

/// System prompt for resume scoring. Combine with `LINE_FORMAT_SYSTEM`.
pub const SCORING_SYSTEM: &str = "You are an expert resume evaluator. \
    You score resumes strictly against the criteria you are given.";

/// Resume scoring prompt template.
/// Replace: {criteria_count}, {criteria_list}, {resume_text}
pub const SCORING_PROMPT_TEMPLATE: &str = r#"Evaluate the resume below against each of the {criteria_count} numbered criteria.

For each criterion assign an integer score from 0 to 5:
  0: No relevant experience or qualification
  1: Minimal match
  3: Meets expectations
  5: Exceeds expectations
Consider both explicit mentions and clearly implied experience.
Also extract the candidate's full name from the resume ("Unknown" if it is not present).

CRITERIA:
{criteria_list}

Respond with exactly one line for the name followed by one line per criterion, in order:
Name: <candidate full name>
C1: <score> - <one-line justification>
C2: <score> - <one-line justification>
...

HARD RULES:
1. Output a line for EVERY criterion, C1 through C{criteria_count}
2. Scores are whole numbers between 0 and 5
3. Justifications fit on one line

RESUME:
{resume_text}"#;
