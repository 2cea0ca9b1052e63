//! Utility functions and types.

use std::fmt::Debug;
use std::ops::{Deref, Index};

pub(crate) trait IntoRust {
    type RsType;
    fn rs(self) -> Self::RsType;
}

pub(crate) trait IntoCpp {
    type CppType;
    fn cpp(self) -> Self::CppType;
}

/// Number of elements of a tensor with the given shape.
///
/// An empty shape describes a scalar with a single element.
pub(crate) fn element_count(shape: &[i64]) -> i64 {
    shape.iter().product()
}

/// Represents a constant reference to an array (0 or more elements consecutively in memory), i.e. a start pointer
/// and a length.
///
/// The span does not own the underlying data, it is a view into a buffer owned by the host runtime that stays valid
/// for the duration of one kernel invocation. Obtained from [`Tensor::as_span`](crate::tensor::Tensor::as_span) or
/// directly as an operator parameter.
///
/// This is intended to be trivially copyable, so it should be passed by value.
#[derive(Clone, Copy)]
pub struct Span<'a, T> {
    data: &'a [T],
}
impl<'a, T> Span<'a, T> {
    /// Create a span over a slice.
    pub fn from_slice(data: &'a [T]) -> Self {
        Self { data }
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Pointer to the first element.
    pub fn data(&self) -> *const T {
        self.data.as_ptr()
    }

    /// Get the underlying slice.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }
}
impl<T> Deref for Span<'_, T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        self.data
    }
}
impl<T> Index<usize> for Span<'_, T> {
    type Output = T;
    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}
impl<T: Debug> Debug for Span<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.data.fmt(f)
    }
}
