//! TransactionStatus - what the UI renders

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Idle,
    Connecting,
    AwaitingConfirmation,
    Sending,
    Success,
    Error,
}

impl FlowState {
    pub const ALL: [FlowState; 6] = [
        FlowState::Idle,
        FlowState::Connecting,
        FlowState::AwaitingConfirmation,
        FlowState::Sending,
        FlowState::Success,
        FlowState::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::Connecting => "connecting",
            FlowState::AwaitingConfirmation => "awaiting_confirmation",
            FlowState::Sending => "sending",
            FlowState::Success => "success",
            FlowState::Error => "error",
        }
    }

    /// A provider call is outstanding; the trigger must not fire again.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, FlowState::Connecting | FlowState::AwaitingConfirmation | FlowState::Sending)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowState {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlowState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("unknown state '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub state: FlowState,
    pub message: String,
}

impl TransactionStatus {
    pub fn new(state: FlowState, message: impl Into<String>) -> Self {
        Self { state, message: message.into() }
    }
}
