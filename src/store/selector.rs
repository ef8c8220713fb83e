use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Names a sub-model `Model` reachable from a root state `S`.
///
/// Both methods must be pure and agree with each other: they are re-run on
/// every access, against whatever the current root is. Returning `None`
/// means the sub-model is absent, which readers see as `None` and writers as
/// a no-op.
pub trait ModelSelector<S>: Send + Sync + 'static {
    type Model: Serialize + DeserializeOwned;

    fn select<'a>(&self, root: &'a S) -> Option<&'a Self::Model>;

    fn select_mut<'a>(&self, root: &'a mut S) -> Option<&'a mut Self::Model>;
}

/// The identity selector: the sub-model is the whole state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Root;

impl<S> ModelSelector<S> for Root
where
    S: Serialize + DeserializeOwned + 'static,
{
    type Model = S;

    fn select<'a>(&self, root: &'a S) -> Option<&'a S> {
        Some(root)
    }

    fn select_mut<'a>(&self, root: &'a mut S) -> Option<&'a mut S> {
        Some(root)
    }
}

type Getter<S, R> = Arc<dyn for<'a> Fn(&'a S) -> Option<&'a R> + Send + Sync>;
type GetterMut<S, R> = Arc<dyn for<'a> Fn(&'a mut S) -> Option<&'a mut R> + Send + Sync>;

/// A selector built from a pair of accessor closures.
///
/// ```
/// use frozen_store::Lens;
///
/// struct App {
///     user: Option<User>,
/// }
/// struct User {
///     name: String,
/// }
///
/// let user = Lens::new(|app: &App| app.user.as_ref(), |app: &mut App| app.user.as_mut());
/// # let _ = user;
/// ```
pub struct Lens<S, R> {
    get: Getter<S, R>,
    get_mut: GetterMut<S, R>,
}

impl<S, R> Clone for Lens<S, R> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            get_mut: Arc::clone(&self.get_mut),
        }
    }
}

impl<S: 'static, R: 'static> Lens<S, R> {
    /// A lens onto a sub-model that may be absent.
    pub fn new<G, M>(get: G, get_mut: M) -> Self
    where
        G: for<'a> Fn(&'a S) -> Option<&'a R> + Send + Sync + 'static,
        M: for<'a> Fn(&'a mut S) -> Option<&'a mut R> + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            get_mut: Arc::new(get_mut),
        }
    }

    /// A lens onto a sub-model that always exists.
    pub fn required<G, M>(get: G, get_mut: M) -> Self
    where
        G: for<'a> Fn(&'a S) -> &'a R + Send + Sync + 'static,
        M: for<'a> Fn(&'a mut S) -> &'a mut R + Send + Sync + 'static,
    {
        Self::new(
            move |root: &S| Some(get(root)),
            move |root: &mut S| Some(get_mut(root)),
        )
    }

    /// Focus further into the selected sub-model.
    pub fn then<Q: 'static>(self, next: Lens<R, Q>) -> Lens<S, Q> {
        let (outer, outer_mut) = (self.get, self.get_mut);
        let (inner, inner_mut) = (next.get, next.get_mut);
        Lens::new(
            move |root: &S| outer(root).and_then(|model| inner(model)),
            move |root: &mut S| outer_mut(root).and_then(|model| inner_mut(model)),
        )
    }
}

impl<S, R> ModelSelector<S> for Lens<S, R>
where
    S: 'static,
    R: Serialize + DeserializeOwned + 'static,
{
    type Model = R;

    fn select<'a>(&self, root: &'a S) -> Option<&'a R> {
        (self.get)(root)
    }

    fn select_mut<'a>(&self, root: &'a mut S) -> Option<&'a mut R> {
        (self.get_mut)(root)
    }
}
