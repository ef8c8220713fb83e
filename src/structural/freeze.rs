use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// An immutable, shared snapshot of a value.
///
/// A `Frozen<T>` only ever hands out `&T`, so every value reachable from it
/// is read-only for as long as any holder keeps it alive. Cloning shares the
/// same allocation.
pub struct Frozen<T> {
    value: Arc<T>,
}

impl<T> Frozen<T> {
    /// Returns true when both handles point at the same snapshot.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.value, &other.value)
    }

    /// Freeze again. Already frozen values are shared, not re-wrapped.
    pub fn freeze(&self) -> Self {
        self.clone()
    }

    /// Get an owned, mutable copy of the snapshot.
    pub fn thaw(&self) -> T
    where
        T: Clone,
    {
        T::clone(&self.value)
    }
}

impl<T> Clone for Frozen<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> Deref for Frozen<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> AsRef<T> for Frozen<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Frozen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Frozen").field(&*self.value).finish()
    }
}

impl<T: PartialEq> PartialEq for Frozen<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || *self.value == *other.value
    }
}

impl<T: Eq> Eq for Frozen<T> {}

impl<T: Serialize> Serialize for Frozen<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

/// Freeze a value and everything reachable from it.
///
/// Ownership moves into the snapshot, so no mutable path to the value or its
/// nested fields survives the call.
pub fn deep_freeze<T>(value: T) -> Frozen<T> {
    Frozen {
        value: Arc::new(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Profile {
        name: String,
        tags: Vec<String>,
    }

    #[test]
    fn refreezing_shares_the_snapshot() {
        let frozen = deep_freeze(Profile {
            name: "x".to_string(),
            tags: vec!["a".to_string()],
        });
        let again = frozen.freeze();
        assert!(Frozen::ptr_eq(&frozen, &again));
    }

    #[test]
    fn thawed_copies_are_independent() {
        let frozen = deep_freeze(Profile {
            name: "x".to_string(),
            tags: vec![],
        });
        let mut thawed = frozen.thaw();
        thawed.name.push('y');
        thawed.tags.push("new".to_string());

        assert_eq!(frozen.name, "x");
        assert!(frozen.tags.is_empty());
    }

    #[test]
    fn serializes_transparently() {
        let frozen = deep_freeze(vec![1, 2, 3]);
        assert_eq!(serde_json::to_string(&frozen).unwrap(), "[1,2,3]");
    }
}
