use super::selector::ModelSelector;
use super::store::{Store, StoreState};
use crate::error::{kind_of, Result, StoreError};
use crate::observable::{select, Observable};
use crate::structural::{deep_copy, Frozen};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::sync::Arc;

/// A sub-model of a store, ready to have one of its properties picked.
///
/// Obtained from [`Store::select_by_fn`] or [`Store::select_root`].
pub struct PropertySelector<S, M> {
    store: Store<S>,
    selector: Arc<M>,
}

impl<S, M> Clone for PropertySelector<S, M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            selector: Arc::clone(&self.selector),
        }
    }
}

impl<S: StoreState, M: ModelSelector<S>> PropertySelector<S, M> {
    pub(crate) fn new(store: Store<S>, selector: M) -> Self {
        Self {
            store,
            selector: Arc::new(selector),
        }
    }

    /// Bind the property `key` of the selected sub-model, read as `V`.
    ///
    /// Keys name object fields. When the sub-model serializes to an array,
    /// a numeric key names an element.
    pub fn property<V>(&self, key: impl Into<String>) -> PropertyActuator<S, M, V> {
        PropertyActuator {
            store: self.store.clone(),
            selector: Arc::clone(&self.selector),
            key: key.into().into(),
            _value: PhantomData,
        }
    }
}

/// Get, set and observe one property of a selected sub-model.
///
/// An actuator holds no state of its own. Every call re-resolves the
/// sub-model against the store's current snapshot, so an actuator never goes
/// stale no matter how long ago it was created. If the sub-model is absent,
/// reads yield `None` and writes do nothing.
pub struct PropertyActuator<S, M, V> {
    store: Store<S>,
    selector: Arc<M>,
    key: Arc<str>,
    _value: PhantomData<fn() -> V>,
}

impl<S, M, V> Clone for PropertyActuator<S, M, V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            selector: Arc::clone(&self.selector),
            key: Arc::clone(&self.key),
            _value: PhantomData,
        }
    }
}

impl<S, M, V> PropertyActuator<S, M, V>
where
    S: StoreState,
    M: ModelSelector<S>,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// The bound property key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the property from the current state.
    ///
    /// `Ok(None)` when the sub-model is absent, or the property is missing or
    /// `null`.
    pub fn get_current(&self) -> Result<Option<V>> {
        let root = self.store.state();
        match self.selector.select(&*root) {
            Some(model) => read_property(&serde_json::to_value(model)?, &self.key),
            None => Ok(None),
        }
    }

    /// Read the property and pass a present value through `modifier`.
    pub fn get_current_with<F>(&self, modifier: F) -> Result<Option<V>>
    where
        F: FnOnce(V) -> V,
    {
        Ok(self.get_current()?.map(modifier))
    }

    /// Stream of the property's value across state changes.
    ///
    /// Consecutive structurally-equal values are dropped and the latest value
    /// is replayed to late subscribers. A value that no longer deserializes
    /// as `V` is logged and emitted as `None`.
    pub fn observable(&self) -> Observable<Option<V>> {
        let selector = Arc::clone(&self.selector);
        let key = Arc::clone(&self.key);
        let name = self.store.name();
        select(&self.store.state_stream(), move |root: &Frozen<S>| {
            let model = selector.select(&**root)?;
            property_or_warn(&name, model, &key)
        })
    }

    /// Like [`observable`](Self::observable), with `modifier` applied to each
    /// present value after deduplication.
    pub fn observable_with<F>(&self, modifier: F) -> Observable<Option<V>>
    where
        V: Clone,
        F: Fn(V) -> V + Send + Sync + 'static,
    {
        self.observable()
            .map(move |value: &Option<V>| value.clone().map(&modifier))
    }

    /// Replace the property with `setter(current)`.
    ///
    /// The whole root is deep-copied first and the sub-model re-resolved in
    /// the copy, so snapshots already handed out never change. The mutated
    /// copy is published as the new state. Returns whether a new snapshot was
    /// published; an absent sub-model is a no-op returning `Ok(false)`.
    pub fn set<F>(&self, setter: F) -> Result<bool>
    where
        F: FnOnce(Option<V>) -> V,
    {
        self.write(|current| {
            let current = current.map(serde_json::from_value).transpose()?;
            Ok(serde_json::to_value(setter(current))?)
        })
    }

    /// Replace the property with `value`.
    pub fn set_value(&self, value: V) -> Result<bool> {
        self.set(|_| value)
    }

    /// Shallow-merge the fields of `updates` into the property value.
    ///
    /// A missing property merges as an empty object. The merged value must
    /// still deserialize as `V`.
    pub fn set_partial<P: Serialize>(&self, updates: P) -> Result<bool> {
        let updates = match serde_json::to_value(updates)? {
            Value::Object(updates) => updates,
            other => {
                return Err(StoreError::NotAnObject {
                    context: "partial update",
                    found: kind_of(&other),
                })
            }
        };

        self.write(move |current| {
            let mut merged = match current {
                None => Map::new(),
                Some(Value::Object(fields)) => fields,
                Some(other) => {
                    return Err(StoreError::NotAnObject {
                        context: "property value",
                        found: kind_of(&other),
                    })
                }
            };
            merged.extend(updates);
            let value: V = serde_json::from_value(Value::Object(merged))?;
            Ok(serde_json::to_value(value)?)
        })
    }

    fn write<F>(&self, compute: F) -> Result<bool>
    where
        F: FnOnce(Option<Value>) -> Result<Value>,
    {
        self.store.exclusive(|| {
            let mut root = deep_copy(&*self.store.state())?;
            let Some(model) = self.selector.select_mut(&mut root) else {
                tracing::debug!(
                    store = %self.store.name(),
                    key = %self.key,
                    "write skipped: sub-model absent"
                );
                return Ok(false);
            };

            let mut tree = serde_json::to_value(&*model)?;
            let known = has_field(&tree, &self.key);
            let current = read_raw(&tree, &self.key).cloned();
            let next = compute(current)?;
            let clearing = next.is_null();
            write_raw(&mut tree, &self.key, next)?;
            *model = serde_json::from_value(tree)?;

            // A field the model does not have is dropped by the round-trip.
            if !known && !clearing && !has_field(&serde_json::to_value(&*model)?, &self.key) {
                return Err(StoreError::UnknownProperty {
                    key: self.key.to_string(),
                });
            }

            self.store.set(root)
        })
    }
}

/// True when `tree` is an object carrying `key`. Arrays and scalars never
/// lose keys in a round-trip, so they always count as having it.
fn has_field(tree: &Value, key: &str) -> bool {
    match tree {
        Value::Object(fields) => fields.contains_key(key),
        _ => true,
    }
}

/// Look up `key` in a serialized model. `null` counts as absent.
fn read_raw<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    let value = match tree {
        Value::Object(fields) => fields.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }?;
    (!value.is_null()).then_some(value)
}

fn write_raw(tree: &mut Value, key: &str, value: Value) -> Result<()> {
    match tree {
        Value::Object(fields) => {
            fields.insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = key.parse::<usize>().map_err(|_| StoreError::InvalidIndex {
                key: key.to_string(),
            })?;
            match index.cmp(&items.len()) {
                std::cmp::Ordering::Less => items[index] = value,
                std::cmp::Ordering::Equal => items.push(value),
                std::cmp::Ordering::Greater => {
                    return Err(StoreError::IndexOutOfBounds {
                        index,
                        len: items.len(),
                    })
                }
            }
            Ok(())
        }
        other => Err(StoreError::NotAnObject {
            context: "sub-model",
            found: kind_of(other),
        }),
    }
}

/// Deserialize the property `key` of a serialized model.
pub(crate) fn read_property<V: DeserializeOwned>(tree: &Value, key: &str) -> Result<Option<V>> {
    read_raw(tree, key)
        .map(|value| serde_json::from_value(value.clone()))
        .transpose()
        .map_err(StoreError::from)
}

/// Stream-side property read: failures have no caller, so they are logged.
pub(crate) fn property_or_warn<T, V>(store: &str, model: &T, key: &str) -> Option<V>
where
    T: Serialize + ?Sized,
    V: DeserializeOwned,
{
    let result = serde_json::to_value(model)
        .map_err(StoreError::from)
        .and_then(|tree| read_property(&tree, key));
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(store, key, error = %err, "property read failed; emitting None");
            None
        }
    }
}
