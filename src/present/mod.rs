//! Status Presentation Adapter - TransactionStatus → what the user sees
//!
//! Pure and stateless. An unset status renders exactly like `Idle`.

use serde::Serialize;

use crate::flow::{FlowState, TransactionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    None,
    Spinner,
    Check,
    Alert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Muted,
    Primary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub icon: Icon,
    pub title: &'static str,
    pub message: String,
    pub tone: Tone,
}

pub fn present(status: Option<&TransactionStatus>) -> StatusView {
    let (state, message) = match status {
        Some(s) => (s.state, s.message.clone()),
        None => (FlowState::Idle, String::new()),
    };
    let (icon, title, tone) = match state {
        FlowState::Idle => (Icon::None, "Ready to pay", Tone::Muted),
        FlowState::Connecting => (Icon::Spinner, "Connecting wallet", Tone::Primary),
        FlowState::AwaitingConfirmation => (Icon::Spinner, "Awaiting confirmation", Tone::Primary),
        FlowState::Sending => (Icon::Spinner, "Processing transaction", Tone::Primary),
        FlowState::Success => (Icon::Check, "Payment submitted", Tone::Success),
        FlowState::Error => (Icon::Alert, "Payment failed", Tone::Danger),
    };
    StatusView { icon, title, message, tone }
}
