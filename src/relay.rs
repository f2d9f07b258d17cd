//! Deep-Link Relay
//!
//! Forwards URLs delivered by the OS (view intents, URL-open events) to the
//! UI runtime over a named bridge channel. Delivery is fire-and-forget: no
//! acknowledgment, no retry, and an event arriving before a bridge is
//! attached is dropped.

use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

/// Bridge channel carrying deep links
pub const URL_CHANNEL: &str = "rgbw_controller/url";

/// Method invoked on the UI runtime for each deep link
pub const HANDLE_URL_METHOD: &str = "handleURL";

/// Intent action carrying a URL to view
pub const ACTION_VIEW: &str = "android.intent.action.VIEW";

// == Bridge Messenger ==
/// One-way method invocation into the UI runtime.
pub trait BridgeMessenger: Send + Sync {
    fn invoke_method(&self, channel: &str, method: &str, argument: &str);
}

// == Link Event ==
/// An OS event that may carry a deep link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Android intent with its action and data URI
    Intent {
        action: Option<String>,
        data: Option<String>,
    },
    /// iOS open-URL callback
    OpenUrl(String),
}

impl LinkEvent {
    /// The URL this event asks to open, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            LinkEvent::Intent {
                action: Some(action),
                data: Some(data),
            } if action == ACTION_VIEW => Some(data.as_str()),
            LinkEvent::Intent { .. } => None,
            LinkEvent::OpenUrl(url) => Some(url.as_str()),
        }
    }
}

// == Relay Outcome ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Handed to the bridge
    Forwarded(String),
    /// Event carried no URL
    Ignored,
    /// No bridge attached yet
    Dropped(String),
}

/// Reply to a method call arriving from the UI runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodReply {
    NotImplemented,
}

// == Deep Link Relay ==
/// Holds the bridge, once attached, and forwards deep links to it.
#[derive(Default)]
pub struct DeepLinkRelay {
    messenger: RwLock<Option<Arc<dyn BridgeMessenger>>>,
}

impl DeepLinkRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the bridge once the UI runtime is up.
    pub fn attach(&self, messenger: Arc<dyn BridgeMessenger>) {
        if let Ok(mut slot) = self.messenger.write() {
            *slot = Some(messenger);
            info!("Bridge attached on {}", URL_CHANNEL);
        }
    }

    pub fn detach(&self) {
        if let Ok(mut slot) = self.messenger.write() {
            *slot = None;
        }
    }

    pub fn is_attached(&self) -> bool {
        self.messenger
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Relays the event's URL, if it has one.
    pub fn handle(&self, event: &LinkEvent) -> RelayOutcome {
        let Some(url) = event.url() else {
            debug!("Ignoring link event without a view URL: {:?}", event);
            return RelayOutcome::Ignored;
        };

        let messenger = self.messenger.read().ok().and_then(|slot| slot.clone());
        match messenger {
            Some(messenger) => {
                messenger.invoke_method(URL_CHANNEL, HANDLE_URL_METHOD, url);
                debug!("Forwarded deep link {}", url);
                RelayOutcome::Forwarded(url.to_string())
            }
            None => {
                warn!("Bridge not attached, dropping deep link {}", url);
                RelayOutcome::Dropped(url.to_string())
            }
        }
    }

    /// The UI runtime exposes no callable methods on this channel.
    pub fn handle_method_call(&self, method: &str) -> MethodReply {
        debug!("Unhandled bridge call {} on {}", method, URL_CHANNEL);
        MethodReply::NotImplemented
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMessenger {
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl BridgeMessenger for RecordingMessenger {
        fn invoke_method(&self, channel: &str, method: &str, argument: &str) {
            self.calls.lock().unwrap().push((
                channel.to_string(),
                method.to_string(),
                argument.to_string(),
            ));
        }
    }

    fn view_intent(url: &str) -> LinkEvent {
        LinkEvent::Intent {
            action: Some(ACTION_VIEW.to_string()),
            data: Some(url.to_string()),
        }
    }

    #[test]
    fn test_view_intent_is_forwarded() {
        let relay = DeepLinkRelay::new();
        let messenger = Arc::new(RecordingMessenger::default());
        relay.attach(messenger.clone());

        let outcome = relay.handle(&view_intent("rgbw://light?color=ff0000"));

        assert_eq!(
            outcome,
            RelayOutcome::Forwarded("rgbw://light?color=ff0000".to_string())
        );
        assert_eq!(
            messenger.calls.lock().unwrap().as_slice(),
            &[(
                "rgbw_controller/url".to_string(),
                "handleURL".to_string(),
                "rgbw://light?color=ff0000".to_string()
            )]
        );
    }

    #[test]
    fn test_open_url_is_forwarded() {
        let relay = DeepLinkRelay::new();
        let messenger = Arc::new(RecordingMessenger::default());
        relay.attach(messenger.clone());

        relay.handle(&LinkEvent::OpenUrl("rgbw://scene/1".to_string()));
        assert_eq!(messenger.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_non_view_intents_are_ignored() {
        let relay = DeepLinkRelay::new();
        let messenger = Arc::new(RecordingMessenger::default());
        relay.attach(messenger.clone());

        let main = LinkEvent::Intent {
            action: Some("android.intent.action.MAIN".to_string()),
            data: Some("rgbw://x".to_string()),
        };
        let no_data = LinkEvent::Intent {
            action: Some(ACTION_VIEW.to_string()),
            data: None,
        };

        assert_eq!(relay.handle(&main), RelayOutcome::Ignored);
        assert_eq!(relay.handle(&no_data), RelayOutcome::Ignored);
        assert!(messenger.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dropped_without_bridge() {
        let relay = DeepLinkRelay::new();
        assert!(!relay.is_attached());

        let outcome = relay.handle(&view_intent("rgbw://light"));
        assert_eq!(outcome, RelayOutcome::Dropped("rgbw://light".to_string()));
    }

    #[test]
    fn test_detach_drops_later_links() {
        let relay = DeepLinkRelay::new();
        let messenger = Arc::new(RecordingMessenger::default());
        relay.attach(messenger.clone());
        relay.detach();

        assert!(matches!(
            relay.handle(&view_intent("rgbw://light")),
            RelayOutcome::Dropped(_)
        ));
        assert!(messenger.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_incoming_calls_not_implemented() {
        let relay = DeepLinkRelay::new();
        assert_eq!(relay.handle_method_call("anything"), MethodReply::NotImplemented);
    }
}
