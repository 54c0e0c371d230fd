use std::sync::{PoisonError, RwLock};

use arbor_types::{Key, Value};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::command::{Command, CommandKind};
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::reducer::{reduce, reduce_slice};

/// Notification sent to subscribers after a command was applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoreEvent {
    /// Revision reached by applying the command (the first command yields 1).
    pub revision: u64,
    pub kind: CommandKind,
    /// Whether the new state is a different node from the previous one.
    pub changed: bool,
}

/// Filter for subscribing to a subset of store events.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// If set, only events for these command kinds are delivered.
    pub kinds: Option<Vec<CommandKind>>,
    /// If `true`, only events that changed the state are delivered.
    pub changed_only: bool,
}

impl EventFilter {
    /// Returns `true` if the given event matches this filter.
    pub fn matches(&self, event: &StoreEvent) -> bool {
        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&event.kind) {
                return false;
            }
        }
        !(self.changed_only && !event.changed)
    }
}

/// A broadcast channel receiver for store events.
pub type StoreEvents = broadcast::Receiver<StoreEvent>;

struct Subscriber {
    filter: EventFilter,
    sender: broadcast::Sender<StoreEvent>,
}

/// The store's subscriber list.
///
/// [`Store::dispatch_with`] publishes while it still holds the state writer
/// lock, so each receiver sees events in strictly increasing revision order.
/// A receiver that falls more than `channel_capacity` events behind loses
/// the oldest ones and gets `RecvError::Lagged` from its channel.
struct Subscribers {
    list: RwLock<Vec<Subscriber>>,
}

impl Subscribers {
    fn new() -> Self {
        Self {
            list: RwLock::new(Vec::new()),
        }
    }

    fn add(&self, filter: EventFilter, capacity: usize) -> StoreEvents {
        let (sender, receiver) = broadcast::channel(capacity);
        self.list
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber { filter, sender });
        receiver
    }

    /// Send `event` to every subscriber whose filter accepts it, after
    /// dropping subscribers whose receiver is gone.
    fn publish(&self, event: &StoreEvent) {
        let mut list = self.list.write().unwrap_or_else(PoisonError::into_inner);
        list.retain(|sub| sub.sender.receiver_count() > 0);
        for sub in list.iter().filter(|sub| sub.filter.matches(event)) {
            // Fails only if the receiver was dropped after the retain; it is
            // pruned on the next publish.
            let _ = sub.sender.send(event.clone());
        }
    }

    fn len(&self) -> usize {
        self.list.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

struct Snapshot {
    value: Value,
    revision: u64,
}

/// Thread-safe holder of the current state snapshot.
///
/// Readers get an `Arc`-backed handle to the snapshot and never observe a
/// partially applied command. Writers are serialised; each [`dispatch`]
/// runs the reducer, swaps the snapshot and notifies subscribers before
/// releasing the writer lock, so events arrive in revision order.
///
/// [`dispatch`]: Store::dispatch
pub struct Store {
    config: StoreConfig,
    initial: Value,
    state: RwLock<Snapshot>,
    subscribers: Subscribers,
}

impl Store {
    /// Create a store holding the configured initial state.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let initial = config.initial_value();
        let state = match &config.slice {
            Some(slice) => Value::map([(slice.clone(), initial.clone())]),
            None => initial.clone(),
        };
        Ok(Self::build(config, initial, state))
    }

    /// Create a store whose current state is `state`; `Reset` still
    /// reinstalls the configured initial state.
    pub fn with_state(config: StoreConfig, state: Value) -> StoreResult<Self> {
        config.validate()?;
        let initial = config.initial_value();
        Ok(Self::build(config, initial, state))
    }

    fn build(config: StoreConfig, initial: Value, state: Value) -> Self {
        info!(
            slice = config.slice.as_deref().unwrap_or("-"),
            channel_capacity = config.channel_capacity,
            "store created"
        );
        Self {
            config,
            initial,
            state: RwLock::new(Snapshot { value: state, revision: 0 }),
            subscribers: Subscribers::new(),
        }
    }

    /// The current root snapshot.
    pub fn state(&self) -> Value {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .value
            .clone()
    }

    /// The current state of the configured slice, or of the root when no
    /// slice is configured. `None` if the slice entry is missing.
    pub fn slice_state(&self) -> Option<Value> {
        let root = self.state();
        match &self.config.slice {
            Some(slice) => root.get(&Key::from(slice.as_str())).cloned(),
            None => Some(root),
        }
    }

    /// Number of commands applied so far.
    pub fn revision(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .revision
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Apply `command` and notify subscribers.
    ///
    /// The reducer runs under the write lock, so concurrent dispatches are
    /// applied one after the other. A failing command leaves the state and
    /// revision untouched.
    pub fn dispatch(&self, command: Command) -> StoreResult<StoreEvent> {
        self.dispatch_with(|_| Ok(command))
    }

    /// Build a command from the current slice state and apply it, both under
    /// the writer lock.
    ///
    /// `build` sees what [`slice_state`](Store::slice_state) would return.
    /// An error from `build` is returned as-is and nothing is applied.
    pub fn dispatch_with<F>(&self, build: F) -> StoreResult<StoreEvent>
    where
        F: FnOnce(Option<&Value>) -> StoreResult<Command>,
    {
        let mut snapshot = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let current = match &self.config.slice {
            Some(slice) => snapshot.value.get(&Key::from(slice.as_str())),
            None => Some(&snapshot.value),
        };
        let command = build(current)?;
        let next = match &self.config.slice {
            Some(slice) => reduce_slice(&snapshot.value, slice, &self.initial, &command)?,
            None => reduce(&snapshot.value, &self.initial, &command),
        };
        let changed = !next.same(&snapshot.value);
        snapshot.value = next;
        snapshot.revision += 1;
        let event = StoreEvent {
            revision: snapshot.revision,
            kind: command.kind(),
            changed,
        };

        debug!(
            revision = event.revision,
            kind = %event.kind,
            changed = event.changed,
            "command applied"
        );

        // Still under the writer lock: the next revision cannot be published
        // before this one.
        if event.changed || self.config.notify_unchanged {
            self.subscribers.publish(&event);
        }
        drop(snapshot);
        Ok(event)
    }

    /// Apply a batch of commands in order, stopping at the first failure.
    pub fn dispatch_all(
        &self,
        commands: impl IntoIterator<Item = Command>,
    ) -> StoreResult<Vec<StoreEvent>> {
        commands.into_iter().map(|c| self.dispatch(c)).collect()
    }

    /// Subscribe to every event.
    pub fn subscribe(&self) -> StoreEvents {
        self.subscribe_filtered(EventFilter::default())
    }

    /// Subscribe to events matching `filter`.
    pub fn subscribe_filtered(&self, filter: EventFilter) -> StoreEvents {
        self.subscribers.add(filter, self.config.channel_capacity)
    }

    /// Current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("slice", &self.config.slice)
            .field("revision", &self.revision())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use serde_json::json;

    use super::*;
    use crate::error::StoreError;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn store() -> Store {
        Store::new(StoreConfig::default()).unwrap()
    }

    #[test]
    fn starts_from_initial_state() {
        let s = store();
        assert_eq!(s.state(), Value::empty_map());
        assert_eq!(s.revision(), 0);
    }

    #[test]
    fn write_then_overwrite_then_reset() {
        let s = store();

        let e = s.dispatch(Command::Write(v(json!({"a": {"x": 1}})))).unwrap();
        assert_eq!(e.revision, 1);
        assert!(e.changed);
        assert_eq!(s.state(), v(json!({"a": {"x": 1}})));

        let payload = v(json!({"b": 2}));
        s.dispatch(Command::Overwrite(payload.clone())).unwrap();
        assert!(s.state().same(&payload));

        let e = s.dispatch(Command::Reset).unwrap();
        assert_eq!(e.revision, 3);
        assert_eq!(s.state(), Value::empty_map());
    }

    #[test]
    fn redundant_write_keeps_snapshot() {
        let s = store();
        s.dispatch(Command::Write(v(json!({"a": {"x": 1}})))).unwrap();
        let before = s.state();

        let e = s.dispatch(Command::Write(v(json!({"a": {"x": 1}})))).unwrap();
        assert!(!e.changed);
        assert!(s.state().same(&before));
        assert_eq!(s.revision(), 2);
    }

    #[test]
    fn subscribers_receive_events() {
        let s = store();
        let mut events = s.subscribe();
        assert_eq!(s.subscriber_count(), 1);

        s.dispatch(Command::Write(v(json!({"a": 1})))).unwrap();
        s.dispatch(Command::Reset).unwrap();

        let first = events.try_recv().unwrap();
        assert_eq!(first.kind, CommandKind::Write);
        assert_eq!(first.revision, 1);
        let second = events.try_recv().unwrap();
        assert_eq!(second.kind, CommandKind::Reset);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn filtered_subscription() {
        let s = store();
        let mut resets = s.subscribe_filtered(EventFilter {
            kinds: Some(vec![CommandKind::Reset]),
            ..Default::default()
        });
        let mut changes = s.subscribe_filtered(EventFilter {
            changed_only: true,
            ..Default::default()
        });

        s.dispatch(Command::Write(v(json!({"a": 1})))).unwrap();
        s.dispatch(Command::Write(v(json!({"a": 1})))).unwrap();
        s.dispatch(Command::Reset).unwrap();

        assert_eq!(resets.try_recv().unwrap().kind, CommandKind::Reset);
        assert!(resets.try_recv().is_err());

        assert_eq!(changes.try_recv().unwrap().revision, 1);
        assert_eq!(changes.try_recv().unwrap().revision, 3);
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn unchanged_events_suppressed_by_config() {
        let config = StoreConfig {
            notify_unchanged: false,
            ..Default::default()
        };
        let s = Store::new(config).unwrap();
        let mut events = s.subscribe();

        s.dispatch(Command::Write(Value::empty_map())).unwrap();
        assert!(events.try_recv().is_err());
        assert_eq!(s.revision(), 1);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let s = store();
        let events = s.subscribe();
        drop(events);
        s.dispatch(Command::Reset).unwrap();
        assert_eq!(s.subscriber_count(), 0);
    }

    #[test]
    fn slice_mode_routes_commands() {
        let config = StoreConfig {
            slice: Some("cache".into()),
            initial_state: json!({"seed": 1}),
            ..Default::default()
        };
        let s = Store::new(config).unwrap();
        assert_eq!(s.state(), v(json!({"cache": {"seed": 1}})));

        s.dispatch(Command::Write(v(json!({"a": 1})))).unwrap();
        assert_eq!(s.slice_state(), Some(v(json!({"seed": 1, "a": 1}))));

        s.dispatch(Command::Reset).unwrap();
        assert_eq!(s.state(), v(json!({"cache": {"seed": 1}})));
    }

    #[test]
    fn slice_mode_keeps_other_slices() {
        let config = StoreConfig {
            slice: Some("cache".into()),
            ..Default::default()
        };
        let root = v(json!({"cache": {}, "ui": {"theme": "dark"}}));
        let ui = root.get(&Key::from("ui")).unwrap().clone();
        let s = Store::with_state(config, root).unwrap();

        s.dispatch(Command::Overwrite(v(json!({"x": 1})))).unwrap();
        assert!(s.state().get(&Key::from("ui")).unwrap().same(&ui));
    }

    #[test]
    fn failing_command_leaves_state() {
        let config = StoreConfig {
            slice: Some("cache".into()),
            ..Default::default()
        };
        let s = Store::with_state(config, Value::from(7)).unwrap();
        let err = s.dispatch(Command::Reset).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoot { .. }));
        assert_eq!(s.revision(), 0);
        assert_eq!(s.state(), Value::from(7));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = StoreConfig {
            channel_capacity: 0,
            ..Default::default()
        };
        assert!(Store::new(config).is_err());
    }

    #[test]
    fn dispatch_with_sees_current_slice() {
        let config = StoreConfig {
            slice: Some("cache".into()),
            ..Default::default()
        };
        let s = Store::new(config).unwrap();
        s.dispatch(Command::Write(v(json!({"n": 1})))).unwrap();

        s.dispatch_with(|current| {
            let n = current.and_then(|c| c.get(&Key::from("n"))).and_then(Value::as_i64);
            Ok(Command::Write(Value::map([("n", n.unwrap_or(0) + 1)])))
        })
        .unwrap();
        assert_eq!(s.slice_state(), Some(v(json!({"n": 2}))));
    }

    #[test]
    fn dispatch_with_error_applies_nothing() {
        let s = store();
        let err = s
            .dispatch_with(|_| Err(StoreError::Config("refused".into())))
            .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
        assert_eq!(s.revision(), 0);
    }

    #[test]
    fn dispatch_all_applies_in_order() {
        let s = store();
        let events = s
            .dispatch_all(vec![
                Command::Write(v(json!({"a": 1}))),
                Command::Write(v(json!({"b": 2}))),
            ])
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(s.state(), v(json!({"a": 1, "b": 2})));
    }

    #[test]
    fn concurrent_dispatch_delivers_events_in_revision_order() {
        let s = Arc::new(store());
        let mut all = s.subscribe();
        let mut changes = s.subscribe_filtered(EventFilter {
            changed_only: true,
            ..Default::default()
        });

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let s = Arc::clone(&s);
                thread::spawn(move || {
                    for j in 0..50 {
                        let key = format!("t{i}_{j}");
                        s.dispatch(Command::Write(Value::map([(key, j)]))).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for events in [&mut all, &mut changes] {
            let mut last = 0;
            let mut seen = 0;
            while let Ok(event) = events.try_recv() {
                assert!(
                    event.revision > last,
                    "revision {} delivered after {last}",
                    event.revision
                );
                last = event.revision;
                seen += 1;
            }
            assert_eq!(seen, 400);
        }
    }

    #[test]
    fn concurrent_dispatch_is_serialised() {
        let s = Arc::new(store());
        let mut handles = Vec::new();
        for i in 0..4 {
            let s = Arc::clone(&s);
            handles.push(thread::spawn(move || {
                for j in 0..25 {
                    let key = format!("k{i}_{j}");
                    s.dispatch(Command::Write(Value::map([(key, j)]))).unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(s.revision(), 100);
        assert_eq!(s.state().len(), Some(100));
    }
}
