use super::actuator::{property_or_warn, read_property, PropertySelector};
use super::options::StoreOptions;
use super::selector::{ModelSelector, Root};
use crate::error::{kind_of, Result, StoreError};
use crate::observable::{select, Observable, Subscription};
use crate::structural::{deep_copy, Frozen};
use crate::subject::StoreSubject;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Bounds every state type must satisfy: serializable, thread-safe, owned.
pub trait StoreState: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> StoreState for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// State whose shape is only known at runtime.
pub type DynamicState = Map<String, Value>;

/// A store over [`DynamicState`], starting out as an empty object.
pub type DynamicStore = Store<DynamicState>;

/// A reactive store holding one immutable state snapshot.
///
/// Every write publishes a brand-new frozen snapshot through the store's
/// emission channel; snapshots already handed out never change. Writes whose
/// result is structurally equal to the current state are dropped without
/// notifying anyone.
///
/// Cloning a store gives another handle to the same state, which is how a
/// store is shared between the components of one logical state slice.
pub struct Store<T> {
    subject: StoreSubject<T>,
    options: Arc<StoreOptions>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            subject: self.subject.clone(),
            options: Arc::clone(&self.options),
        }
    }
}

impl<T: StoreState> Store<T> {
    /// Create a new store with the given initial state.
    pub fn new(initial: T) -> Self {
        Self::with_options(initial, StoreOptions::default())
    }

    /// Create a new store with explicit options.
    pub fn with_options(initial: T, options: StoreOptions) -> Self {
        Self {
            subject: StoreSubject::named(initial, options.name.as_str()),
            options: Arc::new(options),
        }
    }

    /// The options this store was built with.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub(crate) fn name(&self) -> Arc<str> {
        Arc::from(self.options.name.as_str())
    }

    /// The most recently published snapshot.
    pub fn state(&self) -> Frozen<T> {
        self.subject.value()
    }

    /// Read the current state through a closure.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&*self.subject.value())
    }

    /// Number of distinct states published since construction.
    pub fn version(&self) -> u64 {
        self.subject.version()
    }

    /// Replace the whole state.
    ///
    /// Returns whether a new snapshot was published.
    pub fn set(&self, next: T) -> Result<bool> {
        self.subject.publish(next)
    }

    /// Shallow-merge `partial` into the root of the state.
    ///
    /// Only the top-level keys present in `partial` are overwritten, and each
    /// is replaced wholesale: nested objects are not merged, so given
    /// `{a: 1, b: {c: 2}}`, merging `{b: {d: 3}}` yields `{a: 1, b: {d: 3}}`.
    /// Both the state and `partial` must serialize to objects.
    pub fn set_state<P: Serialize>(&self, partial: P) -> Result<bool> {
        let updates = serde_json::to_value(partial)?;
        self.exclusive(|| {
            let mut root = serde_json::to_value(&*self.state())?;
            match (&mut root, updates) {
                (Value::Object(fields), Value::Object(updates)) => fields.extend(updates),
                (Value::Object(_), other) => {
                    return Err(StoreError::NotAnObject {
                        context: "partial state",
                        found: kind_of(&other),
                    })
                }
                (other, _) => {
                    return Err(StoreError::NotAnObject {
                        context: "state",
                        found: kind_of(other),
                    })
                }
            }

            self.set(serde_json::from_value(root)?)
        })
    }

    /// Apply `f` to a deep copy of the state and publish the result.
    ///
    /// The whole read-modify-publish runs exclusively, so concurrent updates
    /// from other threads are never lost.
    pub fn update<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(&mut T),
    {
        self.exclusive(|| {
            let mut next = deep_copy(&*self.state())?;
            f(&mut next);
            self.set(next)
        })
    }

    /// Hold off other writers while `f` reads and republishes the state.
    pub(crate) fn exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        self.subject.exclusive(f)
    }

    /// Read one top-level property of the current state.
    pub fn get_partial_state<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>> {
        read_property(&serde_json::to_value(&*self.state())?, key)
    }

    /// Stream of whole-state snapshots, starting with the current one.
    pub fn state_stream(&self) -> Observable<Frozen<T>> {
        self.subject.as_observable()
    }

    /// Subscribe to state changes.
    ///
    /// The callback is called with the current state right away, then with
    /// every distinct state published afterwards.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Frozen<T>) + Send + Sync + 'static,
    {
        self.subject.subscribe(callback)
    }

    /// Select a sub-model whose properties can then be read, written and
    /// observed through a [`PropertyActuator`](super::PropertyActuator).
    pub fn select_by_fn<M: ModelSelector<T>>(&self, selector: M) -> PropertySelector<T, M> {
        PropertySelector::new(self.clone(), selector)
    }

    /// Stream of one top-level property.
    pub fn select_by_key<V>(&self, key: impl Into<String>) -> Observable<Option<V>>
    where
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let key = key.into();
        let name = self.name();
        select(&self.state_stream(), move |root: &Frozen<T>| {
            property_or_warn(&name, &**root, &key)
        })
    }

    /// Select the whole state as the sub-model.
    pub fn select_root(&self) -> PropertySelector<T, Root> {
        self.select_by_fn(Root)
    }

    /// Read one top-level property through the root selector.
    pub fn select_current<V>(&self, key: &str) -> Result<Option<V>>
    where
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.select_root().property::<V>(key).get_current()
    }
}

impl<T: StoreState + Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct AppState {
        count: usize,
        name: String,
    }

    fn app() -> Store<AppState> {
        Store::new(AppState {
            count: 0,
            name: "test".to_string(),
        })
    }

    #[test]
    fn store_get_set() {
        let store = app();
        assert_eq!(store.state().count, 0);

        store
            .set(AppState {
                count: 42,
                name: "updated".to_string(),
            })
            .unwrap();

        assert_eq!(store.state().count, 42);
        assert_eq!(store.state().name, "updated");
    }

    #[test]
    fn store_update() {
        let store = app();
        let before = store.state();

        store.update(|state| state.count += 10).unwrap();

        assert_eq!(store.state().count, 10);
        assert_eq!(before.count, 0);
    }

    #[test]
    fn store_subscribe() {
        let store = app();
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let _subscription = store.subscribe(move |_state| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        store.update(|state| state.count += 1).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 2);

        store.update(|_| {}).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn set_state_merges_only_the_root() {
        let store = Store::new(json!({ "a": 1, "b": { "c": 2 } }));
        store.set_state(json!({ "b": { "d": 3 } })).unwrap();
        assert_eq!(*store.state(), json!({ "a": 1, "b": { "d": 3 } }));
    }

    #[test]
    fn set_state_on_a_typed_store() {
        let store = app();
        store.set_state(json!({ "count": 7 })).unwrap();
        assert_eq!(
            *store.state(),
            AppState {
                count: 7,
                name: "test".to_string()
            }
        );
    }

    #[test]
    fn set_state_rejects_non_objects() {
        let store = app();
        assert!(matches!(
            store.set_state(json!([1])),
            Err(StoreError::NotAnObject { context: "partial state", .. })
        ));

        let scalar = Store::new(5u32);
        assert!(matches!(
            scalar.set_state(json!({ "a": 1 })),
            Err(StoreError::NotAnObject { context: "state", found: "number" })
        ));
    }

    #[test]
    fn set_state_with_the_wrong_type_leaves_state_alone() {
        let store = app();
        assert!(store.set_state(json!({ "count": "many" })).is_err());
        assert_eq!(store.state().count, 0);
    }

    #[test]
    fn partial_reads() {
        let store = app();
        assert_eq!(store.get_partial_state::<usize>("count").unwrap(), Some(0));
        assert_eq!(store.get_partial_state::<usize>("missing").unwrap(), None);
        assert_eq!(
            store.select_current::<String>("name").unwrap().as_deref(),
            Some("test")
        );
    }

    #[test]
    fn dynamic_store_starts_empty() {
        let store = DynamicStore::default();
        assert!(store.state().is_empty());

        store.set_state(json!({ "title": "Walker Bay" })).unwrap();
        assert_eq!(
            store.select_current::<String>("title").unwrap().as_deref(),
            Some("Walker Bay")
        );
    }

    #[test]
    fn options_name_the_store() {
        let store = Store::with_options(0u8, StoreOptions::named("counter"));
        assert_eq!(store.options().name, "counter");
        assert_eq!(&*store.name(), "counter");
    }
}
