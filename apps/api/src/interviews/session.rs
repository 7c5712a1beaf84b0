//! Mock interview sessions: question generation, answer validation and scoring.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::interviews::prompts::{
    EVALUATION_PROMPT_TEMPLATE, INTERVIEW_SYSTEM, QUESTIONS_PROMPT_TEMPLATE,
};
use crate::llm_client::{LlmClient, LlmError};

pub const QUESTION_COUNT: usize = 5;
pub const DIFFICULTIES: &[&str] = &["easy", "medium", "hard"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub question: String,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: u32,
    pub feedback: String,
}

/// Evaluation as the model writes it; the score may be fractional or out of range.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvaluation {
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInterviewRequest {
    pub role: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

fn default_difficulty() -> String {
    "medium".to_string()
}

impl CreateInterviewRequest {
    /// Trimmed role and lowercased difficulty, or the validation message.
    pub fn normalized(&self) -> Result<(String, String), String> {
        let role = self.role.trim();
        if role.is_empty() {
            return Err("role is required".to_string());
        }
        if role.chars().count() > 120 {
            return Err("role must be at most 120 characters".to_string());
        }
        let difficulty = self.difficulty.trim().to_lowercase();
        if !DIFFICULTIES.contains(&difficulty.as_str()) {
            return Err(format!(
                "difficulty must be one of {}",
                DIFFICULTIES.join(", ")
            ));
        }
        Ok((role.to_string(), difficulty))
    }
}

pub fn validate_answers(questions: &[InterviewQuestion], answers: &[String]) -> Result<(), String> {
    if answers.len() != questions.len() {
        return Err(format!(
            "expected {} answers, got {}",
            questions.len(),
            answers.len()
        ));
    }
    Ok(())
}

/// Drops blank questions and keeps exactly `QUESTION_COUNT`; fewer is an error.
pub fn sanitize_questions(raw: Vec<InterviewQuestion>) -> Result<Vec<InterviewQuestion>, LlmError> {
    let questions: Vec<InterviewQuestion> = raw
        .into_iter()
        .filter(|q| !q.question.trim().is_empty())
        .map(|q| InterviewQuestion {
            question: q.question.trim().to_string(),
            topic: q.topic,
        })
        .take(QUESTION_COUNT)
        .collect();
    if questions.len() < QUESTION_COUNT {
        return Err(LlmError::Incomplete(format!(
            "expected {QUESTION_COUNT} questions, got {}",
            questions.len()
        )));
    }
    Ok(questions)
}

/// Rounds the score into 0..=100. A non-finite score becomes 0.
pub fn clamp_evaluation(raw: RawEvaluation) -> Evaluation {
    let score = if raw.score.is_finite() {
        raw.score.clamp(0.0, 100.0).round() as u32
    } else {
        0
    };
    Evaluation {
        score,
        feedback: raw.feedback.trim().to_string(),
    }
}

pub fn build_questions_prompt(role: &str, difficulty: &str, skills: &[String]) -> String {
    let skills = if skills.is_empty() {
        "none listed".to_string()
    } else {
        skills.join(", ")
    };
    QUESTIONS_PROMPT_TEMPLATE
        .replace("{count}", &QUESTION_COUNT.to_string())
        .replace("{role}", role)
        .replace("{difficulty}", difficulty)
        .replace("{skills}", &skills)
}

pub fn build_evaluation_prompt(
    role: &str,
    difficulty: &str,
    questions: &[InterviewQuestion],
    answers: &[String],
) -> String {
    let transcript = questions
        .iter()
        .zip(answers)
        .enumerate()
        .map(|(i, (q, a))| {
            let answer = if a.trim().is_empty() { "(no answer)" } else { a.trim() };
            format!("Q{}: {}\nA{}: {}", i + 1, q.question, i + 1, answer)
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    EVALUATION_PROMPT_TEMPLATE
        .replace("{role}", role)
        .replace("{difficulty}", difficulty)
        .replace("{transcript}", &transcript)
}

pub async fn generate_questions(
    llm: &LlmClient,
    role: &str,
    difficulty: &str,
    skills: &[String],
) -> Result<Vec<InterviewQuestion>, LlmError> {
    let prompt = build_questions_prompt(role, difficulty, skills);
    let raw: Vec<InterviewQuestion> = llm.call_json(&prompt, INTERVIEW_SYSTEM).await?;
    let questions = sanitize_questions(raw)?;
    info!("Generated {} interview questions for role '{role}'", questions.len());
    Ok(questions)
}

pub async fn evaluate_answers(
    llm: &LlmClient,
    role: &str,
    difficulty: &str,
    questions: &[InterviewQuestion],
    answers: &[String],
) -> Result<Evaluation, LlmError> {
    let prompt = build_evaluation_prompt(role, difficulty, questions, answers);
    let eval: RawEvaluation = llm.call_json(&prompt, INTERVIEW_SYSTEM).await?;
    Ok(clamp_evaluation(eval))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str) -> InterviewQuestion {
        InterviewQuestion {
            question: text.to_string(),
            topic: None,
        }
    }

    #[test]
    fn test_request_normalization() {
        let req = CreateInterviewRequest {
            role: "  Backend Engineer ".to_string(),
            difficulty: "HARD".to_string(),
        };
        assert_eq!(
            req.normalized().unwrap(),
            ("Backend Engineer".to_string(), "hard".to_string())
        );

        let bad = CreateInterviewRequest {
            role: "SDE".to_string(),
            difficulty: "insane".to_string(),
        };
        assert!(bad.normalized().unwrap_err().contains("difficulty"));

        let blank = CreateInterviewRequest {
            role: " ".to_string(),
            difficulty: default_difficulty(),
        };
        assert!(blank.normalized().is_err());
    }

    #[test]
    fn test_answer_count_must_match() {
        let questions = vec![q("a"), q("b")];
        assert!(validate_answers(&questions, &["x".to_string(), "y".to_string()]).is_ok());
        let err = validate_answers(&questions, &["x".to_string()]).unwrap_err();
        assert_eq!(err, "expected 2 answers, got 1");
    }

    #[test]
    fn test_sanitize_questions_drops_blanks_and_caps() {
        let raw = vec![q(" one "), q(""), q("two"), q("three"), q("four"), q("five"), q("six")];
        let cleaned = sanitize_questions(raw).unwrap();
        assert_eq!(cleaned.len(), QUESTION_COUNT);
        assert_eq!(cleaned[0].question, "one");
        assert_eq!(cleaned[4].question, "five");
    }

    #[test]
    fn test_short_question_set_is_rejected() {
        let raw = vec![q("one"), q("two"), q("  "), q("three"), q("four")];
        let err = sanitize_questions(raw).unwrap_err();
        assert!(matches!(err, LlmError::Incomplete(_)));
        assert!(err.to_string().contains("got 4"));
    }

    #[test]
    fn test_clamp_evaluation_caps_score() {
        let eval = clamp_evaluation(RawEvaluation {
            score: 140.0,
            feedback: " good ".to_string(),
        });
        assert_eq!(eval.score, 100);
        assert_eq!(eval.feedback, "good");
    }

    #[test]
    fn test_fractional_and_negative_scores_decode_and_clamp() {
        let raw: RawEvaluation =
            serde_json::from_str(r#"{"score": 72.6, "feedback": "ok"}"#).unwrap();
        assert_eq!(clamp_evaluation(raw).score, 73);
        let raw: RawEvaluation = serde_json::from_str(r#"{"score": -5, "feedback": ""}"#).unwrap();
        assert_eq!(clamp_evaluation(raw).score, 0);
        let nan = RawEvaluation {
            score: f64::NAN,
            feedback: String::new(),
        };
        assert_eq!(clamp_evaluation(nan).score, 0);
    }

    #[test]
    fn test_evaluation_prompt_marks_blank_answers() {
        let prompt = build_evaluation_prompt(
            "SDE",
            "easy",
            &[q("What is ownership?"), q("Explain a hash map.")],
            &["Each value has one owner.".to_string(), "   ".to_string()],
        );
        assert!(prompt.contains("Q1: What is ownership?\nA1: Each value has one owner."));
        assert!(prompt.contains("A2: (no answer)"));
    }

    #[test]
    fn test_questions_prompt_fills_placeholders() {
        let prompt = build_questions_prompt("Data Analyst", "medium", &[]);
        assert!(prompt.contains("\"Data Analyst\""));
        assert!(prompt.contains("none listed"));
        assert!(!prompt.contains("{count}"));
    }
}
