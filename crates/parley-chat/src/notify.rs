//! User-visible error notifications.

use std::sync::Arc;

use tracing::debug;

use crate::error::ErrorKind;
use crate::surface::{ErrorSink, Localizer};

/// Where a notification is displayed. Showing a message replaces the
/// previous one.
pub trait NotificationSurface: Send + Sync {
    fn show(&self, message: &str);
}

/// [`ErrorSink`] that localizes the error kind and shows it as a toast.
pub struct ToastNotifier {
    localizer: Arc<dyn Localizer>,
    surface: Arc<dyn NotificationSurface>,
}

impl ToastNotifier {
    pub fn new(localizer: Arc<dyn Localizer>, surface: Arc<dyn NotificationSurface>) -> Self {
        Self { localizer, surface }
    }

    /// Notification text for `kind`: the localized message, then the detail.
    pub fn format(&self, kind: ErrorKind, detail: Option<&str>) -> String {
        let message = self.localizer.get_string(kind.resource_key());
        match detail {
            Some(detail) if !detail.is_empty() => format!("{}: {}", message, detail),
            _ => message,
        }
    }
}

impl ErrorSink for ToastNotifier {
    fn report_error(&self, kind: ErrorKind, detail: Option<String>) {
        let text = self.format(kind, detail.as_deref());
        debug!(?kind, "Showing error notification");
        self.surface.show(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Capability, ChatError};
    use crate::test_support::KeyLocalizer;
    use std::sync::Mutex;

    #[derive(Default)]
    struct LastToast(Mutex<Vec<String>>);

    impl NotificationSurface for LastToast {
        fn show(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn notifier() -> (ToastNotifier, Arc<LastToast>) {
        let surface = Arc::new(LastToast::default());
        (
            ToastNotifier::new(Arc::new(KeyLocalizer), surface.clone()),
            surface,
        )
    }

    #[test]
    fn test_detail_is_appended() {
        let (notifier, surface) = notifier();
        notifier.report(&ChatError::Transport("connection refused".to_string()));
        assert_eq!(
            surface.0.lock().unwrap().as_slice(),
            ["errorSendingMessage: connection refused"]
        );
    }

    #[test]
    fn test_message_without_detail() {
        let (notifier, surface) = notifier();
        notifier.report_error(ErrorKind::PlaybackError, None);
        notifier.report_error(ErrorKind::CaptureError, Some(String::new()));
        assert_eq!(
            surface.0.lock().unwrap().as_slice(),
            ["errorPlayAudio", "errorVoiceRecording"]
        );
    }

    #[test]
    fn test_silent_errors_show_nothing() {
        let (notifier, surface) = notifier();
        notifier.report(&ChatError::EmptyInput);
        notifier.report(&ChatError::DispatchPending);
        assert!(surface.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsupported_capability_has_no_detail() {
        let (notifier, _) = notifier();
        let err = ChatError::UnsupportedCapability(Capability::VoiceCapture);
        assert_eq!(
            notifier.format(err.kind(), err.detail().as_deref()),
            "errorVoiceNotSupported"
        );
    }
}
