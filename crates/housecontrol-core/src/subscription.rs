// ── Subscription bookkeeping ──
//
// Every listener the keypad installs (stream event handlers, the quick
// action listener) is recorded here and removed exactly once on teardown.

use housecontrol_api::Registration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

enum Inner {
    Stream(Registration),
    Task {
        cancel: CancellationToken,
        handle: JoinHandle<()>,
    },
}

/// One cancelable registration.
pub struct Subscription {
    label: String,
    inner: Option<Inner>,
}

impl Subscription {
    /// A background listener task stopped through `cancel`.
    pub fn task(label: impl Into<String>, cancel: CancellationToken, handle: JoinHandle<()>) -> Self {
        Self {
            label: label.into(),
            inner: Some(Inner::Task { cancel, handle }),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_live(&self) -> bool {
        self.inner.is_some()
    }

    /// Cancel the registration. Later calls do nothing.
    pub fn remove(&mut self) {
        match self.inner.take() {
            Some(Inner::Stream(mut registration)) => registration.remove(),
            Some(Inner::Task { cancel, handle }) => {
                cancel.cancel();
                handle.abort();
            }
            None => {}
        }
    }
}

impl From<Registration> for Subscription {
    fn from(registration: Registration) -> Self {
        Self {
            label: format!("stream:{}", registration.event()),
            inner: Some(Inner::Stream(registration)),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Ordered collection of live subscriptions.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    entries: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: impl Into<Subscription>) {
        self.entries.push(subscription.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels of the live entries, in registration order.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(Subscription::label).collect()
    }

    /// Remove every entry, in registration order. Idempotent.
    pub fn remove_all(&mut self) -> usize {
        let removed = self.entries.len();
        for mut entry in self.entries.drain(..) {
            entry.remove();
        }
        removed
    }
}

impl<S: Into<Subscription>> Extend<S> for SubscriptionSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.entries.extend(iter.into_iter().map(Into::into));
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.remove_all();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use housecontrol_api::{HouseClient, ReconnectConfig, StreamHandle, TransportConfig};
    use url::Url;

    use super::*;

    fn stream() -> StreamHandle {
        HouseClient::new(
            Url::parse("http://127.0.0.1:9").expect("url"),
            &TransportConfig::default(),
        )
        .expect("client")
        .open_stream(ReconnectConfig::default(), CancellationToken::new())
        .expect("stream")
    }

    #[test]
    fn remove_all_twice_leaves_nothing() {
        let handle = stream();
        let mut set = SubscriptionSet::new();
        set.push(handle.add_listener("status", |_| {}));
        set.push(handle.add_listener("open", |_| {}));
        assert_eq!(set.labels(), vec!["stream:status", "stream:open"]);

        assert_eq!(set.remove_all(), 2);
        assert_eq!(set.remove_all(), 0);
        assert!(set.is_empty());
        assert_eq!(handle.listener_count(), 0);
    }

    #[test]
    fn single_subscription_remove_is_idempotent() {
        let handle = stream();
        let mut sub = Subscription::from(handle.add_listener("error", |_| {}));
        sub.remove();
        sub.remove();
        assert!(!sub.is_live());
        assert_eq!(handle.listener_count(), 0);
    }

    #[tokio::test]
    async fn task_subscription_cancels_its_token() {
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        let handle = tokio::spawn(async move { child.cancelled().await });

        let mut set = SubscriptionSet::new();
        set.push(Subscription::task("quick_actions", cancel.clone(), handle));
        set.remove_all();

        tokio::time::timeout(Duration::from_secs(1), cancel.cancelled())
            .await
            .expect("token cancelled");
    }

    #[test]
    fn dropping_the_set_removes_entries() {
        let handle = stream();
        {
            let mut set = SubscriptionSet::new();
            set.extend([handle.add_listener("status", |_| {})]);
        }
        assert_eq!(handle.listener_count(), 0);
    }
}
