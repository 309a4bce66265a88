//! Effects produced by state transitions

use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Subscribe to the speech recognizer, stamping its events
    StartSpeech { generation: u64 },

    /// Ask the recognizer to finish the current utterance
    FinishSpeech,

    /// Drop the speech subscription and stop the recognizer
    ReleaseSpeech,

    /// Send text to the agent (spawns as background task)
    SendToAgent { text: String, generation: u64 },

    /// Abort the in-flight agent request
    AbortRequest,

    /// Arm an auto-dismiss timer for the given generation
    ScheduleTimeout { delay: Duration, generation: u64 },

    /// Disarm every pending timer
    CancelTimeouts,

    /// Publish the new session to observers
    PublishState,

    /// Tell observers the microphone permission is missing
    NotifyPermissionRequired,
}
