use std::collections::TryReserveError;
use std::fmt;

/// Why a [`GrowableBuffer`] could not take more elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrowError {
    /// The configured element limit would be exceeded.
    LimitExceeded { required: usize, limit: usize },
    /// The allocator refused the request.
    Alloc { required: usize, source: TryReserveError },
}

impl fmt::Display for GrowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrowError::LimitExceeded { required, limit } => {
                write!(f, "buffer limit exceeded ({required} > {limit} elements)")
            }
            GrowError::Alloc { required, source } => {
                write!(f, "failed to grow buffer to {required} elements: {source}")
            }
        }
    }
}

impl std::error::Error for GrowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GrowError::Alloc { source, .. } => Some(source),
            GrowError::LimitExceeded { .. } => None,
        }
    }
}

/// Vec-backed buffer with explicit geometric growth.
///
/// Capacity doubles from its current value until it covers the request
/// (starting at the request itself when empty) and is never released, so a
/// buffer reused every frame settles at its high-water mark. Growth failures
/// are reported instead of aborting.
#[derive(Debug, Clone)]
pub struct GrowableBuffer<T> {
    items: Vec<T>,
    limit: Option<usize>,
}

impl<T> GrowableBuffer<T> {
    pub const fn new() -> Self {
        Self { items: Vec::new(), limit: None }
    }

    /// Buffer that refuses to hold more than `limit` elements.
    pub const fn with_limit(limit: usize) -> Self {
        Self { items: Vec::new(), limit: Some(limit) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Drops the contents and keeps the capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Ensures room for `required` elements in total.
    pub fn reserve_total(&mut self, required: usize) -> Result<(), GrowError> {
        if let Some(limit) = self.limit {
            if required > limit {
                return Err(GrowError::LimitExceeded { required, limit });
            }
        }

        let cap = self.items.capacity();
        if required <= cap {
            return Ok(());
        }

        let mut new_cap = if cap == 0 { required } else { cap };
        while new_cap < required {
            new_cap = new_cap.saturating_mul(2);
        }
        if let Some(limit) = self.limit {
            new_cap = new_cap.min(limit);
        }

        self.items
            .try_reserve_exact(new_cap - self.items.len())
            .map_err(|source| GrowError::Alloc { required, source })
    }

    pub fn push(&mut self, value: T) -> Result<(), GrowError> {
        self.reserve_total(self.items.len() + 1)?;
        self.items.push(value);
        Ok(())
    }
}

impl<T: Copy> GrowableBuffer<T> {
    pub fn extend_from_slice(&mut self, values: &[T]) -> Result<(), GrowError> {
        self.reserve_total(self.items.len() + values.len())?;
        self.items.extend_from_slice(values);
        Ok(())
    }
}

impl<T> Default for GrowableBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}
