// LLM prompts for mock interviews. Placeholders are replaced before sending.

pub const INTERVIEW_SYSTEM: &str = "You are an experienced technical interviewer for campus placements. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences.";

/// Replace `{role}`, `{difficulty}`, `{count}` and `{skills}`.
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Write {count} interview questions for a student applying for the role "{role}".
Difficulty: {difficulty}.
The student lists these skills: {skills}.

Mix conceptual, practical and behavioural questions. Each question must be answerable in a few paragraphs.

Return a JSON array of exactly {count} objects with this schema:
[{"question": "...", "topic": "..."}]"#;

/// Replace `{role}`, `{difficulty}` and `{transcript}`.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Evaluate this mock interview for the role "{role}" at {difficulty} difficulty.

{transcript}

Score the candidate from 0 to 100 overall. Be strict but fair: blank or off-topic answers earn nothing.

Return a JSON object with this schema:
{"score": 0, "feedback": "two or three short paragraphs of actionable feedback"}"#;
