//! Responder - classifies a question and produces the local reply.
//!
//! Stateless: the same inputs always go through the same rule, and only the
//! template pick (and the clock, for time questions) can vary between calls.

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::entities::{format_clock, City, CityExtractor, Clock, SystemClock};
use super::intent::{Intent, IntentClassifier};
use super::jobs::{JobBoard, JobListing, JobSearch};
use super::templates::{pool_for, render, PoolPicker, TemplateVars, ThreadRngPicker, GENERIC};
use crate::models::{AnswerKind, CommunityContext};

const DEFAULT_HOME_CITY: &str = "Уфа и Башкирия";
const DEFAULT_PHONE: &str = "напишите в сообщения сообщества";

/// Locally generated answer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Text(String),
    Jobs(Vec<JobListing>),
}

impl Reply {
    pub fn kind(&self) -> AnswerKind {
        match self {
            Reply::Text(_) => AnswerKind::Text,
            Reply::Jobs(_) => AnswerKind::Jobs,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(body) => Some(body),
            Reply::Jobs(_) => None,
        }
    }
}

/// A matched intent together with its reply
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: Intent,
    pub reply: Reply,
}

/// Intent classifier and template responder
pub struct Responder {
    classifier: IntentClassifier,
    jobs: JobSearch,
    cities: CityExtractor,
    picker: Arc<dyn PoolPicker>,
    clock: Arc<dyn Clock>,
}

impl Responder {
    pub fn new(job_result_cap: usize, picker: Arc<dyn PoolPicker>, clock: Arc<dyn Clock>) -> Self {
        Self {
            classifier: IntentClassifier::new(),
            jobs: JobSearch::new(job_result_cap),
            cities: CityExtractor::new(),
            picker,
            clock,
        }
    }

    /// Replace the intent rule table
    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the job category rules
    pub fn with_job_search(mut self, jobs: JobSearch) -> Self {
        self.jobs = jobs;
        self
    }

    /// Classify the question. `None` means no local intent applies.
    pub fn classify(
        &self,
        question: &str,
        community: &CommunityContext,
        jobs: &JobBoard,
    ) -> Option<Classification> {
        let matched = self.classifier.classify(question)?;
        debug!(intent = %matched.intent, fragment = %matched.matched, "Local intent matched");

        let reply = match matched.intent {
            Intent::JobSearch => Reply::Jobs(self.jobs.search(question, jobs)),
            intent => {
                let pool = pool_for(intent)?;
                let vars = self.vars_for(intent, question, community);
                Reply::Text(render(pool.choose(self.picker.as_ref()), &vars))
            }
        };

        Some(Classification {
            intent: matched.intent,
            reply,
        })
    }

    /// Generic contextual template, the last resort when nothing else answered.
    pub fn fallback(&self, question: &str, community: &CommunityContext) -> String {
        let vars = base_vars(question, community);
        render(GENERIC.choose(self.picker.as_ref()), &vars)
    }

    fn vars_for(&self, intent: Intent, question: &str, community: &CommunityContext) -> TemplateVars {
        let mut vars = base_vars(question, community);
        match intent {
            Intent::Weather => {
                vars.city = self.cities.extract(question).display().to_string();
            }
            Intent::Time => {
                vars.city = self.cities.extract(question).display().to_string();
                vars.time = format_clock(&self.clock.now());
            }
            _ => {
                vars.city = City::Unknown.display().to_string();
            }
        }
        vars
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new(5, Arc::new(ThreadRngPicker), Arc::new(SystemClock::default()))
    }
}

fn base_vars(question: &str, community: &CommunityContext) -> TemplateVars {
    TemplateVars {
        community: community.name.clone(),
        subscribers: community.subscribers.to_string(),
        response_time: community.response_time.clone(),
        home_city: community
            .city
            .clone()
            .unwrap_or_else(|| DEFAULT_HOME_CITY.to_string()),
        phone: community
            .phone
            .clone()
            .unwrap_or_else(|| DEFAULT_PHONE.to_string()),
        question: question.trim().to_string(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::entities::FixedClock;
    use crate::brain::templates::SequencePicker;
    use chrono::DateTime;

    fn responder(indices: Vec<usize>) -> Responder {
        let at = DateTime::parse_from_rfc3339("2024-05-01T14:30:00+05:00").unwrap();
        Responder::new(5, Arc::new(SequencePicker::new(indices)), Arc::new(FixedClock(at)))
    }

    #[test]
    fn test_time_reply_uses_clock() {
        let r = responder(vec![0]);
        let c = r
            .classify("Который час?", &CommunityContext::default(), &JobBoard::new())
            .unwrap();
        assert_eq!(c.intent, Intent::Time);
        assert!(c.reply.as_text().unwrap().contains("14:30"));
    }

    #[test]
    fn test_weather_reply_names_city() {
        let r = responder(vec![0]);
        let c = r
            .classify("Какая погода в Москве?", &CommunityContext::default(), &JobBoard::new())
            .unwrap();
        assert_eq!(c.intent, Intent::Weather);
        assert!(c.reply.as_text().unwrap().contains("Москва"));
    }

    #[test]
    fn test_fallback_echoes_trimmed_question() {
        let r = responder(vec![1]);
        let text = r.fallback("  что-то странное  ", &CommunityContext::default());
        assert!(text.contains("«что-то странное»"));
    }

    #[test]
    fn test_missing_phone_uses_placeholder() {
        let r = responder(vec![0]);
        let c = r
            .classify("Как подать заявку?", &CommunityContext::default(), &JobBoard::new())
            .unwrap();
        assert_eq!(c.intent, Intent::Application);
        assert!(c.reply.as_text().unwrap().contains(DEFAULT_PHONE));
    }
}
