//! Execution messages and the bus they are reported through.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use theoria_core::TheoryError;

use crate::aggregator::RunSummary;

/// One executed test: a test case plus the display name it ran under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Test {
    pub test_case_id: String,
    pub display_name: String,
}

/// Progress reported while running test cases.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    TestCaseStarting {
        test_case_id: String,
        display_name: String,
    },
    TestStarting {
        test: Test,
    },
    TestPassed {
        test: Test,
        time: Duration,
    },
    TestFailed {
        test: Test,
        time: Duration,
        error: TheoryError,
    },
    TestSkipped {
        test: Test,
        reason: String,
    },
    TestFinished {
        test: Test,
        time: Duration,
    },
    /// Errors raised while cleaning up after a test case.
    TestCaseCleanupFailure {
        test_case_id: String,
        error: TheoryError,
    },
    TestCaseFinished {
        test_case_id: String,
        summary: RunSummary,
    },
}

impl Message {
    /// The sub-test this message is about, if any.
    pub fn test(&self) -> Option<&Test> {
        match self {
            Message::TestStarting { test }
            | Message::TestPassed { test, .. }
            | Message::TestFailed { test, .. }
            | Message::TestSkipped { test, .. }
            | Message::TestFinished { test, .. } => Some(test),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Message::TestCaseStarting { .. } => "TestCaseStarting",
            Message::TestStarting { .. } => "TestStarting",
            Message::TestPassed { .. } => "TestPassed",
            Message::TestFailed { .. } => "TestFailed",
            Message::TestSkipped { .. } => "TestSkipped",
            Message::TestFinished { .. } => "TestFinished",
            Message::TestCaseCleanupFailure { .. } => "TestCaseCleanupFailure",
            Message::TestCaseFinished { .. } => "TestCaseFinished",
        }
    }
}

/// Receives execution messages.
///
/// Returning `false` asks the run to stop; the runner cancels and emits
/// nothing further for the current test.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn queue_message(&self, message: Message) -> bool;
}

// ──────────────────────────────────────────────
// CollectingMessageBus
// ──────────────────────────────────────────────

/// A bus that records every message it accepts.
///
/// Optionally rejects messages once `accept_limit` messages were accepted,
/// to exercise cancellation.
#[derive(Debug, Clone, Default)]
pub struct CollectingMessageBus {
    messages: Arc<Mutex<Vec<Message>>>,
    accept_limit: Option<usize>,
}

impl CollectingMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `limit` messages, then reject everything.
    pub fn accepting(limit: usize) -> Self {
        CollectingMessageBus {
            messages: Arc::default(),
            accept_limit: Some(limit),
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Message kinds in arrival order, for sequence assertions.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.messages().iter().map(Message::kind).collect()
    }

    /// Display names of finished sub-tests, in order.
    pub fn finished_tests(&self) -> Vec<String> {
        self.messages()
            .iter()
            .filter_map(|m| match m {
                Message::TestFinished { test, .. } => Some(test.display_name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<(String, TheoryError)> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::TestFailed { test, error, .. } => Some((test.display_name, error)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl MessageBus for CollectingMessageBus {
    async fn queue_message(&self, message: Message) -> bool {
        let mut messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(limit) = self.accept_limit {
            if messages.len() >= limit {
                return false;
            }
        }
        messages.push(message);
        true
    }
}
