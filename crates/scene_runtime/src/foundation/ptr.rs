//! Reference-counted object handles
//!
//! Shared ownership with weak observation, driven by an explicit strong/weak
//! count pair instead of an ambient garbage collector. Every object lives in
//! one heap cell together with its [`RefCount`]; [`SharedPtr`] handles keep
//! the object alive, [`WeakPtr`] handles observe it without extending its
//! lifetime. When the strong count reaches zero the object is dropped in
//! place and the cell's `expired` flag is raised; the cell itself stays
//! allocated until the last weak handle lets go, which is how an outstanding
//! `WeakPtr` learns the object is gone.
//!
//! Cloning a handle is the only way to add a reference and dropping it the
//! only way to release one, so the count invariants cannot be broken from
//! outside this module. Counts are plain (non-atomic) integers; an object
//! graph must stay confined to a single thread.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Reference count structure shared by every handle to one object.
#[derive(Debug, Default)]
pub struct RefCount {
    /// Number of strong references. These keep the object alive.
    refs: Cell<u32>,
    /// Number of weak references.
    weak_refs: Cell<u32>,
    /// Expired flag. The object is no longer accessible after this is set.
    expired: Cell<bool>,
}

impl RefCount {
    /// Construct with zero counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of strong references.
    pub fn refs(&self) -> u32 {
        self.refs.get()
    }

    /// Number of weak references.
    pub fn weak_refs(&self) -> u32 {
        self.weak_refs.get()
    }

    /// Whether the owned object has been destroyed.
    pub fn is_expired(&self) -> bool {
        self.expired.get()
    }

    pub(crate) fn add_ref(&self) {
        self.refs.set(self.refs.get() + 1);
    }

    /// Release one strong reference. Returns true when the count reached
    /// zero and the object must be destroyed.
    pub(crate) fn release_ref(&self) -> bool {
        let refs = self.refs.get();
        debug_assert!(refs > 0, "released a strong reference that was not held");
        if refs == 0 {
            return false;
        }
        self.refs.set(refs - 1);
        refs == 1
    }

    pub(crate) fn add_weak(&self) {
        self.weak_refs.set(self.weak_refs.get() + 1);
    }

    pub(crate) fn release_weak(&self) {
        let weak = self.weak_refs.get();
        debug_assert!(weak > 0, "released a weak reference that was not held");
        if weak > 0 {
            self.weak_refs.set(weak - 1);
        }
    }

    pub(crate) fn expire(&self) {
        self.expired.set(true);
    }
}

/// Heap cell holding one object and its reference counts.
pub(crate) struct PtrInner<T> {
    pub(crate) count: RefCount,
    pub(crate) target: RefCell<Option<T>>,
}

impl<T> PtrInner<T> {
    /// Drop the contained object and mark the cell expired. The cell itself
    /// lives on until the last handle releases it.
    pub(crate) fn destroy(&self) {
        let object = self.target.borrow_mut().take();
        self.count.expire();
        drop(object);
    }
}

/// Handle which holds a strong reference and allows shared ownership.
///
/// Cloning adds a strong reference, dropping releases it; the object is
/// destroyed exactly once, when the last strong handle goes away. Two
/// handles compare equal iff they reference the same underlying object.
pub struct SharedPtr<T> {
    inner: Option<Rc<PtrInner<T>>>,
}

impl<T> SharedPtr<T> {
    /// Move a value into a fresh reference-counted cell. The returned handle
    /// holds the first strong reference.
    pub fn new(value: T) -> Self {
        let inner = Rc::new(PtrInner {
            count: RefCount::new(),
            target: RefCell::new(Some(value)),
        });
        inner.count.add_ref();
        Self { inner: Some(inner) }
    }

    /// Construct a null handle.
    pub fn null() -> Self {
        Self { inner: None }
    }

    /// Whether this is a null handle.
    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// Release the reference and reset to null. Destroys the object if this
    /// was the last strong reference.
    pub fn reset(&mut self) {
        if let Some(inner) = self.inner.take() {
            if inner.count.release_ref() {
                inner.destroy();
            }
        }
    }

    /// Borrow the object immutably.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null, or if the object is mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, T> {
        match self.try_borrow() {
            Some(r) => r,
            None => panic!("dereferenced a null SharedPtr"),
        }
    }

    /// Borrow the object mutably.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null, or if the object is already borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        match self.try_borrow_mut() {
            Some(r) => r,
            None => panic!("dereferenced a null SharedPtr"),
        }
    }

    /// Borrow the object immutably, or `None` for a null handle.
    pub fn try_borrow(&self) -> Option<Ref<'_, T>> {
        let inner = self.inner.as_ref()?;
        Ref::filter_map(inner.target.borrow(), Option::as_ref).ok()
    }

    /// Borrow the object mutably, or `None` for a null handle.
    pub fn try_borrow_mut(&self) -> Option<RefMut<'_, T>> {
        let inner = self.inner.as_ref()?;
        RefMut::filter_map(inner.target.borrow_mut(), Option::as_mut).ok()
    }

    /// Number of strong references, or 0 for a null handle.
    pub fn refs(&self) -> u32 {
        self.inner.as_ref().map_or(0, |i| i.count.refs())
    }

    /// Number of weak references, or 0 for a null handle.
    pub fn weak_refs(&self) -> u32 {
        self.inner.as_ref().map_or(0, |i| i.count.weak_refs())
    }

    /// Create a weak handle observing the same object.
    pub fn downgrade(&self) -> WeakPtr<T> {
        match &self.inner {
            Some(inner) => {
                inner.count.add_weak();
                WeakPtr {
                    inner: Some(Rc::clone(inner)),
                }
            }
            None => WeakPtr::null(),
        }
    }

    /// Wrap an existing cell in a new strong handle.
    pub(crate) fn from_inner(inner: Rc<PtrInner<T>>) -> Self {
        inner.count.add_ref();
        Self { inner: Some(inner) }
    }

    pub(crate) fn inner(&self) -> Option<&Rc<PtrInner<T>>> {
        self.inner.as_ref()
    }
}

impl<T> Clone for SharedPtr<T> {
    fn clone(&self) -> Self {
        if let Some(inner) = &self.inner {
            inner.count.add_ref();
        }
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Drop for SharedPtr<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> Default for SharedPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> PartialEq for SharedPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> Eq for SharedPtr<T> {}

impl<T> fmt::Debug for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(inner) => write!(f, "SharedPtr(refs={})", inner.count.refs()),
            None => write!(f, "SharedPtr(null)"),
        }
    }
}

/// Handle which observes an object without keeping it alive.
///
/// Accessing the object is always checked against the cell's expired flag;
/// once the last strong reference is gone every outstanding `WeakPtr`
/// resolves to nothing. Two weak handles compare equal iff they share the
/// same cell, so a handle taken before an object died can never be confused
/// with one observing an unrelated object that happens to reuse the storage.
pub struct WeakPtr<T> {
    inner: Option<Rc<PtrInner<T>>>,
}

impl<T> WeakPtr<T> {
    /// Construct a null handle.
    pub fn null() -> Self {
        Self { inner: None }
    }

    /// Whether this is a null handle. A handle to an expired object is not
    /// null.
    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// Whether the observed object has been destroyed. False for a null
    /// handle.
    pub fn is_expired(&self) -> bool {
        self.inner.as_ref().is_some_and(|i| i.count.is_expired())
    }

    /// Acquire a strong handle to the object, or `None` if it has been
    /// destroyed or this handle is null.
    pub fn upgrade(&self) -> Option<SharedPtr<T>> {
        let inner = self.inner.as_ref()?;
        if inner.count.is_expired() {
            return None;
        }
        Some(SharedPtr::from_inner(Rc::clone(inner)))
    }

    /// Release the weak reference and reset to null.
    pub fn reset(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.count.release_weak();
        }
    }

    /// Number of strong references on the observed object.
    pub fn refs(&self) -> u32 {
        self.inner.as_ref().map_or(0, |i| i.count.refs())
    }

    /// Number of weak references on the observed object.
    pub fn weak_refs(&self) -> u32 {
        self.inner.as_ref().map_or(0, |i| i.count.weak_refs())
    }
}

impl<T> Clone for WeakPtr<T> {
    fn clone(&self) -> Self {
        if let Some(inner) = &self.inner {
            inner.count.add_weak();
        }
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Drop for WeakPtr<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> Default for WeakPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> PartialEq for WeakPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> Eq for WeakPtr<T> {}

impl<T> PartialEq<SharedPtr<T>> for WeakPtr<T> {
    fn eq(&self, other: &SharedPtr<T>) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> fmt::Debug for WeakPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(inner) => write!(
                f,
                "WeakPtr(refs={}, expired={})",
                inner.count.refs(),
                inner.count.is_expired()
            ),
            None => write!(f, "WeakPtr(null)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        drops: Rc<Cell<u32>>,
    }

    impl Drop for Probe {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn probe() -> (Rc<Cell<u32>>, SharedPtr<Probe>) {
        let drops = Rc::new(Cell::new(0));
        let ptr = SharedPtr::new(Probe {
            drops: Rc::clone(&drops),
        });
        (drops, ptr)
    }

    #[test]
    fn test_destroyed_exactly_once() {
        let (drops, ptr) = probe();
        let a = ptr.clone();
        let b = a.clone();
        assert_eq!(ptr.refs(), 3);

        drop(a);
        drop(b);
        assert_eq!(drops.get(), 0);
        assert_eq!(ptr.refs(), 1);

        drop(ptr);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_reset_releases() {
        let (drops, mut ptr) = probe();
        ptr.reset();
        assert!(ptr.is_null());
        assert_eq!(drops.get(), 1);

        // Resetting a null handle is a no-op.
        ptr.reset();
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_assignment_swaps_counts() {
        let (drops_a, mut a) = probe();
        let (drops_b, b) = probe();
        assert_eq!(a.refs(), 1);

        a = b.clone();
        assert_eq!(drops_a.get(), 1);
        assert_eq!(drops_b.get(), 0);
        assert_eq!(b.refs(), 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_weak_does_not_keep_alive() {
        let (drops, ptr) = probe();
        let weak = ptr.downgrade();
        assert_eq!(ptr.refs(), 1);
        assert_eq!(ptr.weak_refs(), 1);
        assert!(!weak.is_expired());

        drop(ptr);
        assert_eq!(drops.get(), 1);
        assert!(weak.is_expired());
        assert!(weak.upgrade().is_none());
        // The count cell survives until the weak handle releases it.
        assert_eq!(weak.weak_refs(), 1);
        assert_eq!(weak.refs(), 0);
    }

    #[test]
    fn test_all_weak_handles_expire() {
        let (_, ptr) = probe();
        let w1 = ptr.downgrade();
        let w2 = w1.clone();
        assert_eq!(ptr.weak_refs(), 2);

        drop(ptr);
        assert!(w1.is_expired());
        assert!(w2.is_expired());
        assert!(w1.upgrade().is_none());
        assert!(w2.upgrade().is_none());
    }

    #[test]
    fn test_weak_upgrade_extends_lifetime() {
        let (drops, ptr) = probe();
        let weak = ptr.downgrade();

        let strong = weak.upgrade().unwrap();
        assert_eq!(strong.refs(), 2);

        drop(ptr);
        assert_eq!(drops.get(), 0);

        drop(strong);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_equality_is_object_identity() {
        let a = SharedPtr::new(5);
        let b = SharedPtr::new(5);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let wa = a.downgrade();
        let wb = b.downgrade();
        assert_ne!(wa, wb);
        assert_eq!(wa, wa.clone());
        assert!(wa == a);
        assert!(wa != b);

        assert_eq!(SharedPtr::<i32>::null(), SharedPtr::<i32>::null());
        assert_ne!(SharedPtr::<i32>::null(), a);
    }

    #[test]
    fn test_borrow_and_mutate() {
        let ptr = SharedPtr::new(String::from("hello"));
        ptr.borrow_mut().push_str(" world");
        assert_eq!(*ptr.borrow(), "hello world");

        let null = SharedPtr::<String>::null();
        assert!(null.try_borrow().is_none());
    }

    #[test]
    fn test_null_weak() {
        let weak = WeakPtr::<i32>::null();
        assert!(weak.is_null());
        assert!(!weak.is_expired());
        assert!(weak.upgrade().is_none());
    }
}
