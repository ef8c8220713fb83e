use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Compare two values by their serialized shape.
///
/// Both sides are converted to a `serde_json::Value` tree and compared there,
/// so object key order never matters. This is deliberately naive: fields the
/// serializer drops (`#[serde(skip)]`, skipped `None`s) and values it
/// normalizes (`NaN` becomes `null`) are invisible, and two values differing
/// only in those compare equal.
///
/// Fails when either side cannot be serialized, e.g. a map with non-string
/// keys.
pub fn naive_object_comparison<A, B>(a: &A, b: &B) -> Result<bool>
where
    A: Serialize + ?Sized,
    B: Serialize + ?Sized,
{
    Ok(serde_json::to_value(a)? == serde_json::to_value(b)?)
}

/// Infallible structural equality used to deduplicate emissions.
///
/// A value that fails to serialize is never considered equal to anything, so
/// a broken comparison errs on the side of notifying subscribers.
pub fn structurally_equal<T: Serialize + ?Sized>(a: &T, b: &T) -> bool {
    match naive_object_comparison(a, b) {
        Ok(equal) => equal,
        Err(err) => {
            tracing::warn!(error = %err, "structural comparison failed; treating values as different");
            false
        }
    }
}

/// Clone a value through a serialize/deserialize round-trip.
///
/// The copy shares nothing with the input. It carries the same caveats as
/// [`naive_object_comparison`]: anything the serializer skips comes back as
/// its deserialization default, or fails to deserialize at all.
pub fn deep_copy<T>(value: &T) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let tree = serde_json::to_value(value)?;
    Ok(serde_json::from_value(tree)?)
}
