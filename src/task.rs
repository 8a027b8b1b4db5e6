//! Task detection over the inbound message sequence.
//!
//! Detectors are polymorphic functions over a closed [`TaskType`] enum,
//! evaluated in registration order with first match wins. A detector that
//! fails must not prevent later detectors from running: its error is logged
//! and evaluation continues. The service always produces a [`TaskDecision`],
//! defaulting to not-a-task when nothing matches or detection is disabled.

use crate::types::{Message, MessageRole};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Closed set of task categories the bridge recognizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Search,
    Code,
    Summarize,
}

/// Outcome of running the detector registry over a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDecision {
    pub is_task: bool,
    pub task_type: Option<TaskType>,
}

impl TaskDecision {
    /// The default decision: not a task.
    pub fn none() -> Self {
        Self {
            is_task: false,
            task_type: None,
        }
    }

    fn matched(task_type: TaskType) -> Self {
        Self {
            is_task: true,
            task_type: Some(task_type),
        }
    }
}

/// A single detector. Returns `Ok(Some(_))` on a match, `Ok(None)` to pass,
/// and `Err(_)` on an internal failure (which is skipped, not fatal).
pub trait TaskDetector: Send + Sync {
    fn detect(&self, messages: &[Message]) -> Result<Option<TaskType>>;
}

struct FnDetector<F>(F);

impl<F> TaskDetector for FnDetector<F>
where
    F: Fn(&[Message]) -> Result<Option<TaskType>> + Send + Sync,
{
    fn detect(&self, messages: &[Message]) -> Result<Option<TaskType>> {
        (self.0)(messages)
    }
}

/// Wrap a plain function or closure as a boxed detector.
pub fn detector_fn<F>(f: F) -> Box<dyn TaskDetector>
where
    F: Fn(&[Message]) -> Result<Option<TaskType>> + Send + Sync + 'static,
{
    Box::new(FnDetector(f))
}

/// Keyword detector: matches when the last user message contains any of the
/// configured phrases, case-insensitively.
struct KeywordDetector {
    task_type: TaskType,
    keywords: &'static [&'static str],
}

impl TaskDetector for KeywordDetector {
    fn detect(&self, messages: &[Message]) -> Result<Option<TaskType>> {
        let Some(text) = last_user_text(messages) else {
            return Ok(None);
        };
        let lowered = text.to_lowercase();
        if self.keywords.iter().any(|kw| lowered.contains(kw)) {
            Ok(Some(self.task_type))
        } else {
            Ok(None)
        }
    }
}

fn last_user_text(messages: &[Message]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.to_text())
}

/// Ordered registry of detectors.
pub struct TaskDetectorService {
    detectors: Vec<Box<dyn TaskDetector>>,
}

impl Default for TaskDetectorService {
    fn default() -> Self {
        Self {
            detectors: vec![
                Box::new(KeywordDetector {
                    task_type: TaskType::Search,
                    keywords: &["search for", "look up", "find information"],
                }),
                Box::new(KeywordDetector {
                    task_type: TaskType::Code,
                    keywords: &["write a function", "write code", "implement", "fix this bug"],
                }),
                Box::new(KeywordDetector {
                    task_type: TaskType::Summarize,
                    keywords: &["summarize", "tl;dr", "give me a summary"],
                }),
            ],
        }
    }
}

impl TaskDetectorService {
    /// Registry with the built-in keyword detectors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a caller-supplied ordered detector set.
    pub fn with_detectors(detectors: Vec<Box<dyn TaskDetector>>) -> Self {
        Self { detectors }
    }

    /// Run detectors in registration order; first match wins. Detector
    /// failures are logged and skipped.
    pub fn detect_task(&self, messages: &[Message]) -> TaskDecision {
        for detector in &self.detectors {
            match detector.detect(messages) {
                Ok(Some(task_type)) => return TaskDecision::matched(task_type),
                Ok(None) => {}
                Err(err) => {
                    log::warn!("task detector failed, continuing with next: {}", err);
                }
            }
        }
        TaskDecision::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_no_match_yields_default_decision() {
        let service = TaskDetectorService::new();
        let messages = vec![Message::user("hello there")];
        let decision = service.detect_task(&messages);
        assert!(!decision.is_task);
        assert!(decision.task_type.is_none());
    }

    #[test]
    fn test_keyword_match() {
        let service = TaskDetectorService::new();
        let messages = vec![Message::user("Please summarize this article for me")];
        let decision = service.detect_task(&messages);
        assert!(decision.is_task);
        assert_eq!(decision.task_type, Some(TaskType::Summarize));
    }

    #[test]
    fn test_first_match_wins_in_registration_order() {
        fn code_detector(_: &[Message]) -> Result<Option<TaskType>> {
            Ok(Some(TaskType::Code))
        }
        fn search_detector(_: &[Message]) -> Result<Option<TaskType>> {
            Ok(Some(TaskType::Search))
        }
        let service = TaskDetectorService::with_detectors(vec![
            detector_fn(code_detector),
            detector_fn(search_detector),
        ]);
        let decision = service.detect_task(&[Message::user("anything")]);
        assert_eq!(decision.task_type, Some(TaskType::Code));
    }

    #[test]
    fn test_failing_detector_does_not_stop_evaluation() {
        fn failing_detector(_: &[Message]) -> Result<Option<TaskType>> {
            Err(Error::stream("detector exploded"))
        }
        fn search_detector(_: &[Message]) -> Result<Option<TaskType>> {
            Ok(Some(TaskType::Search))
        }
        let service = TaskDetectorService::with_detectors(vec![
            detector_fn(failing_detector),
            detector_fn(search_detector),
        ]);
        let decision = service.detect_task(&[Message::user("anything")]);
        assert!(decision.is_task);
        assert_eq!(decision.task_type, Some(TaskType::Search));
    }

    #[test]
    fn test_detects_on_last_user_message_only() {
        let service = TaskDetectorService::new();
        let messages = vec![
            Message::user("summarize everything"),
            Message::assistant("done"),
            Message::user("thanks, that is all"),
        ];
        let decision = service.detect_task(&messages);
        assert!(!decision.is_task);
    }

    #[test]
    fn test_task_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskType::Search).unwrap(),
            "\"search\""
        );
    }
}
