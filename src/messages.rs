use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::rule::ValidationMessage;

pub type ChangeListener = Arc<dyn Fn(&str, &[ValidationMessage]) + Send + Sync>;

/// Owns the current per-property message sets.
///
/// Each property maps to an immutable `Arc<[ValidationMessage]>` snapshot
/// that is swapped wholesale on every pass: readers either see the old set
/// or the new one, never a partially-built one. Listeners run after the
/// swap, outside the lock.
#[derive(Default)]
pub struct MessageAggregator {
    state: RwLock<BTreeMap<String, Arc<[ValidationMessage]>>>,
    listeners: Mutex<Vec<ChangeListener>>,
}

impl MessageAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Arc<[ValidationMessage]>>> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Current messages for one property (empty if never evaluated).
    pub fn messages(&self, property: &str) -> Arc<[ValidationMessage]> {
        self.read_state()
            .get(property)
            .cloned()
            .unwrap_or_else(|| Arc::from([]))
    }

    /// Snapshot of every property's current message set.
    pub fn all_messages(&self) -> BTreeMap<String, Arc<[ValidationMessage]>> {
        self.read_state().clone()
    }

    /// True iff no property currently has an Error-severity message.
    /// Warnings never affect validity.
    pub fn is_valid(&self) -> bool {
        !self
            .read_state()
            .values()
            .any(|set| set.iter().any(ValidationMessage::is_error))
    }

    /// True iff the named property currently has an Error-severity message.
    pub fn has_error(&self, property: &str) -> bool {
        self.read_state()
            .get(property)
            .is_some_and(|set| set.iter().any(ValidationMessage::is_error))
    }

    /// Register a per-property change listener: called with the property
    /// name and its new message set whenever a pass changes that set.
    pub fn subscribe(
        &self,
        listener: impl Fn(&str, &[ValidationMessage]) + Send + Sync + 'static,
    ) {
        let mut listeners = match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        listeners.push(Arc::new(listener));
    }

    /// Atomically replace one property's set. Returns true (and notifies
    /// listeners) only when the new set differs from the old.
    pub(crate) fn replace(&self, property: &str, messages: Vec<ValidationMessage>) -> bool {
        let next: Arc<[ValidationMessage]> = Arc::from(messages);
        let changed = {
            let mut state = match self.state.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let previous = state.get(property).map(Arc::as_ref);
            if previous == Some(next.as_ref()) {
                false
            } else {
                state.insert(property.to_string(), Arc::clone(&next));
                true
            }
        };

        if changed {
            // Clone the list out of the lock so a listener may subscribe or
            // trigger another replacement without deadlocking.
            let listeners: Vec<ChangeListener> = {
                let guard = match self.listeners.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                guard.clone()
            };
            for listener in &listeners {
                listener(property, &next);
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Severity;

    fn msg(severity: Severity, text: &str) -> ValidationMessage {
        ValidationMessage::new(severity, text, "P#0:has_value")
    }

    #[test]
    fn replace_detects_change_and_idempotence() {
        let agg = MessageAggregator::new();
        assert!(agg.replace("P", vec![msg(Severity::Error, "a")]));
        assert!(!agg.replace("P", vec![msg(Severity::Error, "a")]));
        assert!(agg.replace("P", vec![]));
        assert!(!agg.replace("P", vec![]));
    }

    #[test]
    fn warnings_do_not_affect_validity() {
        let agg = MessageAggregator::new();
        agg.replace("A", vec![msg(Severity::Warning, "w")]);
        assert!(agg.is_valid());
        assert!(!agg.has_error("A"));

        agg.replace("B", vec![msg(Severity::Error, "e")]);
        assert!(!agg.is_valid());
        assert!(agg.has_error("B"));

        agg.replace("B", vec![]);
        assert!(agg.is_valid());
    }

    #[test]
    fn listeners_fire_only_on_change() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let agg = MessageAggregator::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&fired);
        agg.subscribe(move |property, set| {
            assert_eq!(property, "P");
            assert_eq!(set.len(), 1);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        agg.replace("P", vec![msg(Severity::Error, "a")]);
        agg.replace("P", vec![msg(Severity::Error, "a")]);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_may_reenter_the_aggregator() {
        let agg = Arc::new(MessageAggregator::new());
        let inner = Arc::clone(&agg);
        agg.subscribe(move |property, _| {
            if property == "A" {
                inner.subscribe(|_, _| {});
                inner.replace("B", vec![msg(Severity::Warning, "cascade")]);
            }
        });

        assert!(agg.replace("A", vec![msg(Severity::Error, "a")]));
        assert_eq!(agg.messages("B").len(), 1);
    }

    #[test]
    fn unevaluated_property_reads_as_empty() {
        let agg = MessageAggregator::new();
        assert!(agg.messages("Never").is_empty());
        assert!(agg.is_valid());
    }
}
