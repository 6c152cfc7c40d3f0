//! # Brain Module
//!
//! Fast, non-LLM answering for the community widget.
//! Classifies user input BEFORE the completion gateway is called.
//!
//! ## Components
//! - `intent`: Ordered regex rule table, first match wins
//! - `jobs`: Job board and keyword search over it
//! - `entities`: City and time-of-day extraction
//! - `templates`: Response pools and injectable randomness
//! - `responder`: Facade producing the local reply

pub mod entities;
pub mod intent;
pub mod jobs;
pub mod responder;
pub mod templates;

pub use entities::{FixedClock, SystemClock};
pub use intent::{Intent, IntentClassifier};
pub use jobs::{JobBoard, JobListing};
pub use responder::{Reply, Responder};
pub use templates::{SequencePicker, ThreadRngPicker};
