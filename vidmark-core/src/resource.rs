// ============================================================================
// vidmark-core/src/resource.rs
// ============================================================================
//
// RESOURCE LIFECYCLE: Scoped release of job handles
//
// The job driver owns three handles: the input stream, the output stream and
// the annotator. Each is wrapped in a `Scoped` guard which releases it exactly
// once, either explicitly (so the caller sees the release result) or when the
// guard is dropped on an early return. A released guard refuses access.

use crate::error::{CoreError, CoreResult};

/// A handle holding an external resource that must be released.
pub trait Release {
    fn release(&mut self) -> CoreResult<()>;
}

impl<T: Release + ?Sized> Release for Box<T> {
    fn release(&mut self) -> CoreResult<()> {
        (**self).release()
    }
}

/// Owns a handle and guarantees a single release on every exit path.
pub struct Scoped<T: Release> {
    name: &'static str,
    handle: Option<T>,
}

impl<T: Release> Scoped<T> {
    pub fn new(name: &'static str, handle: T) -> Self {
        log::debug!("Acquired {name}");
        Self {
            name,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_released(&self) -> bool {
        self.handle.is_none()
    }

    pub fn get(&self) -> CoreResult<&T> {
        self.handle
            .as_ref()
            .ok_or_else(|| CoreError::StreamClosed(self.name.to_string()))
    }

    pub fn get_mut(&mut self) -> CoreResult<&mut T> {
        self.handle
            .as_mut()
            .ok_or_else(|| CoreError::StreamClosed(self.name.to_string()))
    }

    /// Releases the handle now. Later calls are no-ops returning `Ok`.
    pub fn release(&mut self) -> CoreResult<()> {
        match self.handle.take() {
            Some(mut handle) => {
                log::debug!("Releasing {}", self.name);
                handle.release()
            }
            None => Ok(()),
        }
    }
}

impl<T: Release> Drop for Scoped<T> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Failed to release {}: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counted {
        releases: Rc<Cell<u32>>,
        fail: bool,
    }

    impl Release for Counted {
        fn release(&mut self) -> CoreResult<()> {
            self.releases.set(self.releases.get() + 1);
            if self.fail {
                Err(CoreError::OperationFailed("release failed".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn counted(fail: bool) -> (Counted, Rc<Cell<u32>>) {
        let releases = Rc::new(Cell::new(0));
        (
            Counted {
                releases: releases.clone(),
                fail,
            },
            releases,
        )
    }

    #[test]
    fn drop_releases_once() {
        let (handle, releases) = counted(false);
        {
            let _scoped = Scoped::new("input stream", handle);
        }
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn explicit_release_is_not_repeated_on_drop() {
        let (handle, releases) = counted(false);
        let mut scoped = Scoped::new("output stream", handle);
        scoped.release().unwrap();
        scoped.release().unwrap();
        drop(scoped);
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn released_guard_refuses_access() {
        let (handle, _releases) = counted(false);
        let mut scoped = Scoped::new("input stream", handle);
        assert!(scoped.get().is_ok());
        scoped.release().unwrap();
        assert!(scoped.is_released());
        match scoped.get_mut() {
            Err(CoreError::StreamClosed(name)) => assert_eq!(name, "input stream"),
            _ => panic!("expected StreamClosed"),
        }
    }

    #[test]
    fn release_error_is_reported_once() {
        let (handle, releases) = counted(true);
        let mut scoped = Scoped::new("output stream", handle);
        assert!(scoped.release().is_err());
        assert!(scoped.release().is_ok());
        drop(scoped);
        assert_eq!(releases.get(), 1);
    }

    fn early_return(handle: Counted) -> CoreResult<()> {
        let mut scoped = Scoped::new("input stream", handle);
        scoped.get_mut()?;
        Err(CoreError::OperationFailed("mid-run failure".to_string()))
    }

    #[test]
    fn early_return_still_releases() {
        let (handle, releases) = counted(false);
        assert!(early_return(handle).is_err());
        assert_eq!(releases.get(), 1);
    }
}
