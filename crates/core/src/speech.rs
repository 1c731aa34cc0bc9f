//! The voice input adapter.
//!
//! Wraps a platform speech-recognition capability behind a start/stop
//! toggle. The capability reports its lifecycle asynchronously; this
//! module keeps the recording state machine explicit and decoupled from
//! any particular event-dispatch mechanism, so the front end decides how
//! events actually arrive.

/// A lifecycle event reported by the platform capability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Recognition has actually started.
    Started,
    /// A recognized transcript.
    Result(String),
    /// Recognition failed.
    Error(SpeechErrorCode),
    /// Recognition has ended, with or without a result.
    Ended,
}

/// The failure code carried by [`SpeechEvent::Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpeechErrorCode {
    /// Microphone permission was denied.
    NotAllowed,
    /// Any other recognition failure.
    Other,
}

/// A platform speech-recognition capability.
///
/// Implementations are single-shot and non-continuous: one `start`
/// produces at most one result event, followed by an end event.
/// Availability is feature-detected once at startup; when the platform
/// offers no recognizer, the voice affordance is simply not offered.
pub trait SpeechRecognizer {
    /// Begins a recognition attempt.
    fn start(&mut self);

    /// Stops the current recognition attempt.
    fn stop(&mut self);
}

/// An update the widget should apply in response to a recognizer event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoiceUpdate {
    /// Recognized text to append to the pending input. Never auto-sent.
    Transcript(String),
    /// The user denied microphone access.
    PermissionDenied,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum VoiceState {
    #[default]
    Idle,
    Recording,
}

/// Wraps a speech recognizer behind a start/stop toggle.
pub struct VoiceInput<R> {
    recognizer: R,
    state: VoiceState,
}

impl<R: SpeechRecognizer> VoiceInput<R> {
    /// Creates an idle adapter around a detected recognizer.
    #[inline]
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            state: VoiceState::default(),
        }
    }

    /// Returns whether the adapter is currently recording.
    #[inline]
    pub fn is_recording(&self) -> bool {
        self.state == VoiceState::Recording
    }

    /// Starts recognition when idle, stops it when recording.
    pub fn toggle(&mut self) {
        match self.state {
            VoiceState::Idle => {
                self.state = VoiceState::Recording;
                self.recognizer.start();
            }
            VoiceState::Recording => {
                // The state resets when the capability reports the end
                // of the attempt, not when we ask it to stop.
                self.recognizer.stop();
            }
        }
    }

    /// Applies a recognizer lifecycle event and returns the update the
    /// widget should apply, if any.
    ///
    /// Every error forces the state back to idle; only a permission
    /// denial is surfaced to the user.
    pub fn handle_event(&mut self, event: SpeechEvent) -> Option<VoiceUpdate> {
        match event {
            SpeechEvent::Started => {
                self.state = VoiceState::Recording;
                None
            }
            SpeechEvent::Result(transcript) => {
                Some(VoiceUpdate::Transcript(transcript))
            }
            SpeechEvent::Error(code) => {
                self.state = VoiceState::Idle;
                match code {
                    SpeechErrorCode::NotAllowed => {
                        Some(VoiceUpdate::PermissionDenied)
                    }
                    SpeechErrorCode::Other => {
                        debug!("speech recognition failed: {code:?}");
                        None
                    }
                }
            }
            SpeechEvent::Ended => {
                self.state = VoiceState::Idle;
                None
            }
        }
    }
}
