use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

/// A single-threaded, reference-counted handle with interior mutability.
///
/// `StResource` is how the world shares its generation parameters and its
/// change overlay with every chunk it creates. All mutation happens on the
/// frame thread, so a `RefCell` is enough; no locking is involved.
///
/// # Type Parameters
/// - `T`: The type of the contained resource
///
/// # Examples
///
/// ```
/// use voxel_sandbox::core::StResource;
///
/// let counter = StResource::new(0);
/// let alias = counter.clone();
///
/// *alias.get_mut() += 1;
/// assert_eq!(*counter.get(), 1);
/// ```
///
/// # Panics
/// - Panics if `get_mut` is called while any other borrow of the same resource is alive
/// - Panics if `get` is called while a mutable borrow is alive
#[derive(Debug, Default)]
pub struct StResource<T> {
    resource: Rc<RefCell<T>>,
}

impl<T> StResource<T> {
    /// Creates a new `StResource` containing the given value.
    ///
    /// # Arguments
    /// * `resource` - The value to be stored in the resource
    pub fn new(resource: T) -> Self {
        Self {
            resource: Rc::new(RefCell::new(resource)),
        }
    }

    /// Borrows the contained value immutably.
    pub fn get(&self) -> Ref<'_, T> {
        self.resource.borrow()
    }

    /// Borrows the contained value mutably.
    pub fn get_mut(&self) -> RefMut<'_, T> {
        self.resource.borrow_mut()
    }

    /// Replaces the contained value, returning the previous one.
    ///
    /// Every clone of this handle observes the new value.
    pub fn replace(&self, resource: T) -> T {
        self.resource.replace(resource)
    }

    /// Returns `true` if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.resource, &other.resource)
    }
}

impl<T> Clone for StResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_value() {
        let params = StResource::new(vec![1, 2, 3]);
        let alias = params.clone();

        alias.get_mut().push(4);

        assert_eq!(params.get().len(), 4);
        assert!(params.ptr_eq(&alias));
    }

    #[test]
    fn replace_is_visible_through_every_clone() {
        let seed = StResource::new(7u32);
        let alias = seed.clone();

        let old = seed.replace(42);

        assert_eq!(old, 7);
        assert_eq!(*alias.get(), 42);
    }
}
