//! Skill name normalisation shared by matching, GitHub extraction and resume parsing.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Canonical skill → accepted spellings. Lookups go through `ALIAS_TO_CANONICAL`.
const SKILL_ALIASES: &[(&str, &[&str])] = &[
    ("javascript", &["js", "javascript", "ecmascript", "es6"]),
    ("typescript", &["ts", "typescript"]),
    ("nodejs", &["node.js", "node js", "nodejs", "node"]),
    ("react", &["reactjs", "react.js", "react js", "react"]),
    ("nextjs", &["next.js", "nextjs", "next js"]),
    ("vue", &["vue.js", "vuejs", "vue"]),
    ("angular", &["angularjs", "angular.js", "angular"]),
    ("express", &["express.js", "expressjs", "express"]),
    ("html", &["html", "html5"]),
    ("css", &["css", "css3"]),
    ("tailwind", &["tailwindcss", "tailwind css", "tailwind"]),
    ("python", &["python", "python3", "py"]),
    ("django", &["django", "drf", "django rest framework"]),
    ("flask", &["flask"]),
    ("fastapi", &["fastapi", "fast api"]),
    ("java", &["java"]),
    ("spring", &["spring", "spring boot", "springboot"]),
    ("kotlin", &["kotlin"]),
    ("cpp", &["c++", "cpp"]),
    ("c", &["c"]),
    ("csharp", &["c#", "csharp", "c sharp"]),
    ("go", &["go", "golang"]),
    ("rust", &["rust"]),
    ("ruby", &["ruby"]),
    ("php", &["php"]),
    ("swift", &["swift"]),
    ("dart", &["dart"]),
    ("flutter", &["flutter"]),
    ("sql", &["sql"]),
    ("postgresql", &["postgres", "postgresql"]),
    ("mysql", &["mysql"]),
    ("mongodb", &["mongo", "mongodb", "mongoose"]),
    ("redis", &["redis"]),
    ("docker", &["docker", "dockerfile"]),
    ("kubernetes", &["kubernetes", "k8s"]),
    ("aws", &["aws", "amazon web services"]),
    ("gcp", &["gcp", "google cloud"]),
    ("azure", &["azure"]),
    ("firebase", &["firebase"]),
    ("git", &["git"]),
    ("graphql", &["graphql"]),
    ("machine-learning", &["machine learning", "machine-learning", "ml"]),
    ("deep-learning", &["deep learning", "deep-learning"]),
    ("tensorflow", &["tensorflow"]),
    ("pytorch", &["pytorch", "torch"]),
    ("jupyter", &["jupyter", "jupyter notebook"]),
    ("shell", &["shell", "bash"]),
];

static ALIAS_TO_CANONICAL: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    SKILL_ALIASES
        .iter()
        .flat_map(|(canonical, aliases)| aliases.iter().map(move |a| (*a, *canonical)))
        .collect()
});

/// Lowercases, trims, collapses whitespace and maps known aliases to the canonical name.
/// Unknown skills pass through in their cleaned form.
pub fn normalize_skill(raw: &str) -> String {
    let cleaned = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    match ALIAS_TO_CANONICAL.get(cleaned.as_str()) {
        Some(canonical) => canonical.to_string(),
        None => cleaned,
    }
}

pub fn normalize_skill_set<S: AsRef<str>>(skills: &[S]) -> HashSet<String> {
    skills
        .iter()
        .map(|s| normalize_skill(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Returns the canonical name for a known skill, `None` for anything outside the table.
pub fn canonical_skill(raw: &str) -> Option<&'static str> {
    let cleaned = raw.trim().to_lowercase();
    ALIAS_TO_CANONICAL.get(cleaned.as_str()).copied()
}

/// Single-token aliases that are also everyday words ("go the extra mile",
/// "ml of water"). In free text they only count next to an unambiguous skill.
const AMBIGUOUS_ALIASES: &[&str] = &[
    "go", "express", "ml", "node", "spring", "swift", "rust", "py", "react", "angular", "shell",
    "torch", "dart", "ruby", "flask", "git", "azure",
];

/// Tokens either side of an ambiguous alias searched for an unambiguous skill.
const CONTEXT_WINDOW: usize = 2;

/// Finds known skills mentioned in free text (resume bodies, descriptions).
///
/// Matching is token based: single-token aliases must appear as a whole token,
/// two-token aliases as adjacent tokens. Single-letter aliases are ignored.
/// Ambiguous aliases need an unambiguous skill within `CONTEXT_WINDOW` tokens.
pub fn detect_skills_in_text(text: &str) -> Vec<String> {
    let tokens: Vec<String> = text
        .split(|c: char| {
            c.is_whitespace() || matches!(c, ',' | ';' | '(' | ')' | '|' | '/' | ':')
        })
        .map(|t| {
            t.trim_matches(|c: char| matches!(c, '.' | '-' | '"' | '\''))
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .collect();

    let mut found = HashSet::new();
    let mut anchored = vec![false; tokens.len()];
    let mut ambiguous = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if token.len() > 1 {
            if let Some(canonical) = ALIAS_TO_CANONICAL.get(token.as_str()) {
                if AMBIGUOUS_ALIASES.contains(&token.as_str()) {
                    ambiguous.push((i, *canonical));
                } else {
                    found.insert(*canonical);
                    anchored[i] = true;
                }
            }
        }
        if let Some(next) = tokens.get(i + 1) {
            let pair = format!("{token} {next}");
            if let Some(canonical) = ALIAS_TO_CANONICAL.get(pair.as_str()) {
                found.insert(*canonical);
                anchored[i] = true;
                anchored[i + 1] = true;
            }
        }
    }

    for (i, canonical) in ambiguous {
        let start = i.saturating_sub(CONTEXT_WINDOW);
        let end = (i + CONTEXT_WINDOW + 1).min(tokens.len());
        if anchored[start..end].iter().any(|a| *a) {
            found.insert(canonical);
        }
    }

    let mut skills: Vec<String> = found.into_iter().map(str::to_string).collect();
    skills.sort();
    skills
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_maps_to_canonical() {
        assert_eq!(normalize_skill("React.js"), "react");
        assert_eq!(normalize_skill("  Node.JS "), "nodejs");
        assert_eq!(normalize_skill("K8s"), "kubernetes");
        assert_eq!(normalize_skill("C++"), "cpp");
    }

    #[test]
    fn test_unknown_skill_is_cleaned_only() {
        assert_eq!(normalize_skill("  Solid   Works "), "solid works");
    }

    #[test]
    fn test_normalize_skill_set_drops_empty_and_dedupes() {
        let set = normalize_skill_set(&["JS", "javascript", "  ", "Rust"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("javascript"));
        assert!(set.contains("rust"));
    }

    #[test]
    fn test_detect_skills_in_text_finds_tokens_and_pairs() {
        let text = "Built a REST API with Node.js, Express and MongoDB. \
                    Exposure to machine learning (PyTorch).";
        let skills = detect_skills_in_text(text);
        assert!(skills.contains(&"nodejs".to_string()));
        assert!(skills.contains(&"express".to_string()));
        assert!(skills.contains(&"mongodb".to_string()));
        assert!(skills.contains(&"machine-learning".to_string()));
        assert!(skills.contains(&"pytorch".to_string()));
    }

    #[test]
    fn test_detect_skills_ignores_single_letters() {
        let skills = detect_skills_in_text("Grade C in a course");
        assert!(!skills.contains(&"c".to_string()));
    }

    #[test]
    fn test_everyday_words_are_not_skills() {
        let text = "I am ready to go the extra mile and express my ideas; ml of water";
        let skills = detect_skills_in_text(text);
        assert!(skills.is_empty(), "unexpected skills: {skills:?}");
        let text = "Spring internship. Swift turnaround on every Rust-free task.";
        let skills = detect_skills_in_text(text);
        assert!(skills.is_empty(), "unexpected skills: {skills:?}");
    }

    #[test]
    fn test_ambiguous_alias_counts_in_a_skills_list() {
        let skills = detect_skills_in_text("Languages: Rust, Go, Python, TypeScript");
        assert_eq!(skills, vec!["go", "python", "rust", "typescript"]);
        let skills = detect_skills_in_text("Backend in Golang with Docker; frontend in React");
        assert!(skills.contains(&"go".to_string()));
        assert!(!skills.contains(&"react".to_string()));
    }

    #[test]
    fn test_canonical_skill_unknown_is_none() {
        assert_eq!(canonical_skill("TypeScript"), Some("typescript"));
        assert_eq!(canonical_skill("underwater basket weaving"), None);
    }
}
