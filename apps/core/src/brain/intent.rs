//! Intent Classification using regex patterns.
//!
//! Ordered, first-match-wins detection over lowercased Russian input.
//! No ML model required - pure Rust regex matching.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Detected intent type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Job search (вакансии, работа, трудоустройство)
    JobSearch,
    /// Application / onboarding steps (заявка, анкета, резюме)
    Application,
    /// Questions about the community itself
    CommunityInfo,
    /// Greeting (привет, здравствуйте, hello)
    Greeting,
    /// Salary and compensation
    Salary,
    /// Shift schedule
    Schedule,
    /// Hiring requirements
    Requirements,
    /// Jokes
    Humor,
    /// VK Donut and other support options
    Monetization,
    /// Weather in a city
    Weather,
    /// Current time
    Time,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Intent {
    /// Returns a stable label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Intent::JobSearch => "job_search",
            Intent::Application => "application",
            Intent::CommunityInfo => "community_info",
            Intent::Greeting => "greeting",
            Intent::Salary => "salary",
            Intent::Schedule => "schedule",
            Intent::Requirements => "requirements",
            Intent::Humor => "humor",
            Intent::Monetization => "monetization",
            Intent::Weather => "weather",
            Intent::Time => "time",
        }
    }
}

/// Result of a successful classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMatch {
    /// Detected intent
    pub intent: Intent,
    /// Fragment of the normalized question that triggered the match
    pub matched: String,
}

/// One row of the ordered rule table.
///
/// The rule matches when any of its patterns matches the normalized question.
#[derive(Debug, Clone)]
pub struct IntentRule {
    intent: Intent,
    patterns: Vec<Regex>,
}

impl IntentRule {
    /// Builds a rule from pattern sources. Patterns are applied to lowercased text.
    pub fn new(intent: Intent, sources: &[&str]) -> Result<Self, regex::Error> {
        let patterns = sources
            .iter()
            .map(|s| Regex::new(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { intent, patterns })
    }

    fn from_compiled(intent: Intent, patterns: &[Regex]) -> Self {
        Self {
            intent,
            patterns: patterns.to_vec(),
        }
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    fn find(&self, normalized: &str) -> Option<String> {
        self.patterns
            .iter()
            .find_map(|p| p.find(normalized))
            .map(|m| m.as_str().to_string())
    }
}

/// Intent classifier over an ordered rule table
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

// Compile patterns once at startup
static JOB_SEARCH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"ваканс|трудоустройств").expect("Invalid regex: job nouns"),
        Regex::new(r"ищу работу|работа|работу|работы").expect("Invalid regex: job search phrases"),
    ]
});

static APPLICATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"заявк|анкет|отклик|резюме").expect("Invalid regex: application words")]
});

static COMMUNITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"сообществ|групп|подписчик").expect("Invalid regex: community words")]
});

static GREETING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"привет|здравств|добр(ый|ое|ого) (день|утро|вечер)|доброго времени")
            .expect("Invalid regex: Russian greetings"),
        Regex::new(r"\b(hello|hi|hey)\b").expect("Invalid regex: English greetings"),
    ]
});

static SALARY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"зарплат|оплат|доход|заработ").expect("Invalid regex: salary words")]
});

static SCHEDULE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"график|смен|вахт|отдых").expect("Invalid regex: schedule words")]
});

static REQUIREMENTS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"требован|нужн|необходим|услови").expect("Invalid regex: requirement words")]
});

static HUMOR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"юмор|шутк|пошути|прикол|смешн|анекдот").expect("Invalid regex: humor words")]
});

static MONETIZATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"donut|донат|подписк|премиум").expect("Invalid regex: monetization words")]
});

static WEATHER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"погод|температур|прогноз|дожд|мороз|weather")
        .expect("Invalid regex: weather words")]
});

static TIME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"который час|сколько времени|\bвремя\b").expect("Invalid regex: time phrases"),
        Regex::new(r"\bwhat time\b").expect("Invalid regex: English time phrase"),
    ]
});

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Create a classifier with the default priority order
    pub fn new() -> Self {
        let rules = vec![
            IntentRule::from_compiled(Intent::JobSearch, &JOB_SEARCH_PATTERNS),
            IntentRule::from_compiled(Intent::Application, &APPLICATION_PATTERNS),
            IntentRule::from_compiled(Intent::CommunityInfo, &COMMUNITY_PATTERNS),
            IntentRule::from_compiled(Intent::Greeting, &GREETING_PATTERNS),
            IntentRule::from_compiled(Intent::Salary, &SALARY_PATTERNS),
            IntentRule::from_compiled(Intent::Schedule, &SCHEDULE_PATTERNS),
            IntentRule::from_compiled(Intent::Requirements, &REQUIREMENTS_PATTERNS),
            IntentRule::from_compiled(Intent::Humor, &HUMOR_PATTERNS),
            IntentRule::from_compiled(Intent::Monetization, &MONETIZATION_PATTERNS),
            IntentRule::from_compiled(Intent::Weather, &WEATHER_PATTERNS),
            IntentRule::from_compiled(Intent::Time, &TIME_PATTERNS),
        ];

        Self { rules }
    }

    /// Create a classifier over a caller-supplied ordered rule table
    pub fn with_rules(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// Intents in evaluation order
    pub fn priority(&self) -> Vec<Intent> {
        self.rules.iter().map(IntentRule::intent).collect()
    }

    /// Classify the intent of a text. The first matching rule wins.
    pub fn classify(&self, text: &str) -> Option<IntentMatch> {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        self.rules.iter().find_map(|rule| {
            rule.find(&normalized).map(|matched| IntentMatch {
                intent: rule.intent,
                matched,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent_of(text: &str) -> Option<Intent> {
        IntentClassifier::new().classify(text).map(|m| m.intent)
    }

    #[test]
    fn test_job_search_detection() {
        assert_eq!(intent_of("Какие есть вакансии?"), Some(Intent::JobSearch));
        assert_eq!(intent_of("Ищу работу водителем"), Some(Intent::JobSearch));
        assert_eq!(intent_of("Помогите с трудоустройством"), Some(Intent::JobSearch));
    }

    #[test]
    fn test_greeting_detection() {
        assert_eq!(intent_of("Привет!"), Some(Intent::Greeting));
        assert_eq!(intent_of("Здравствуйте"), Some(Intent::Greeting));
        assert_eq!(intent_of("Добрый день"), Some(Intent::Greeting));
        assert_eq!(intent_of("Hello there"), Some(Intent::Greeting));
    }

    #[test]
    fn test_greeting_needs_whole_phrase() {
        assert_eq!(intent_of("Расскажите подробнее"), None);
        assert_eq!(intent_of("What is this?"), None);
        assert_eq!(intent_of("Доброе утро"), Some(Intent::Greeting));
        assert_eq!(intent_of("hi"), Some(Intent::Greeting));
    }

    #[test]
    fn test_uppercase_input_is_normalized() {
        assert_eq!(intent_of("ВАКАНСИИ"), Some(Intent::JobSearch));
        assert_eq!(intent_of("ЗАРПЛАТА"), Some(Intent::Salary));
    }

    #[test]
    fn test_job_search_beats_greeting() {
        assert_eq!(intent_of("Привет, какие вакансии есть?"), Some(Intent::JobSearch));
    }

    #[test]
    fn test_greeting_beats_salary() {
        assert_eq!(intent_of("Привет, какая зарплата?"), Some(Intent::Greeting));
    }

    #[test]
    fn test_matched_fragment_is_reported() {
        let m = IntentClassifier::new().classify("Расскажи анекдот").unwrap();
        assert_eq!(m.intent, Intent::Humor);
        assert_eq!(m.matched, "анекдот");
    }

    #[test]
    fn test_unknown_detection() {
        assert_eq!(intent_of(""), None);
        assert_eq!(intent_of("   "), None);
        assert_eq!(intent_of("Расскажи про квантовую физику"), None);
    }

    #[test]
    fn test_custom_rule_table() {
        let classifier = IntentClassifier::with_rules(vec![
            IntentRule::new(Intent::Salary, &["зарплат"]).unwrap(),
            IntentRule::new(Intent::Greeting, &["привет"]).unwrap(),
        ]);
        let m = classifier.classify("Привет, какая зарплата?").unwrap();
        assert_eq!(m.intent, Intent::Salary);
        assert_eq!(classifier.priority(), vec![Intent::Salary, Intent::Greeting]);
    }

    #[test]
    fn test_invalid_custom_pattern_is_rejected() {
        assert!(IntentRule::new(Intent::Humor, &["(unclosed"]).is_err());
    }
}
