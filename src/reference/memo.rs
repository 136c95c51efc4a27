use std::sync::{Mutex, OnceLock, PoisonError};

/// Write-once cell whose initialisation runs at most once.
///
/// Readers of an initialised value never lock. Concurrent initialisers serialise on an
/// internal mutex; the first one to succeed stores the value and late arrivals read it.
/// A failed initialisation leaves the cell empty so the next caller retries.
#[derive(Debug)]
pub struct Memo<T> {
    value: OnceLock<T>,
    init: Mutex<()>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            value: OnceLock::new(),
            init: Mutex::new(()),
        }
    }
}

impl<T> Memo<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Returns the stored value, computing it with `f` if the cell is empty.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`; nothing is stored in that case.
    pub fn get_or_try_init<E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<&T, E> {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }
        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = self.value.get() {
            return Ok(value);
        }
        let value = f()?;
        Ok(self.value.get_or_init(|| value))
    }

    pub fn get_or_init(&self, f: impl FnOnce() -> T) -> &T {
        match self.get_or_try_init(|| Ok::<T, std::convert::Infallible>(f())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_failed_init_is_retried() {
        let memo = Memo::new();
        let first: Result<&u32, &str> = memo.get_or_try_init(|| Err("boom"));
        assert!(first.is_err());
        assert!(memo.get().is_none());
        assert_eq!(memo.get_or_try_init(|| Ok::<_, &str>(7)), Ok(&7));
        assert_eq!(memo.get_or_try_init(|| Ok::<_, &str>(9)), Ok(&7));
    }

    #[test]
    fn test_concurrent_init_runs_once() {
        let memo = Arc::new(Memo::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let memo = Arc::clone(&memo);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    *memo.get_or_init(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(10));
                        42
                    })
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
