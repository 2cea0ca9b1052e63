//! Typed views over the tensors of one kernel invocation.
//!
//! Three tensor views exist:
//! - [`Tensor<T>`] for numeric elements, `T` is one of the [`Element`] types.
//! - [`StringTensor`] for string tensors, decoding the strings into owned `String`s.
//! - [`StrTensor`] for string inputs, keeping the raw character buffer and handing out `&str` views into it.
//!
//! A view is bound to an input or output index of the invocation. Input views read their element type and shape
//! eagerly, output views know their shape only after they are allocated. Views are created by the binding layer at
//! the start of each invocation, passed to the user compute function and dropped when it returns.
//!
//! [`Span`](crate::util::Span) and scalar parameters are adapters over input tensors, available on the CPU
//! execution provider only.

mod element;
mod fmt;
mod string;

#[cfg(feature = "ndarray")]
mod array;

use std::marker::PhantomData;
use std::ptr::NonNull;

pub use element::{Element, ElementType};
pub use string::{StrTensor, StringTensor};

use crate::host::KernelContext;
use crate::util::{element_count, Span};
use crate::{Error, Result};

pub(crate) fn not_initialized() -> Error {
    Error::runtime("tensor shape is not yet initialized")
}

pub(crate) fn check_dims(dims: &[i64]) -> Result<()> {
    match dims.iter().find(|d| **d < 0) {
        Some(d) => Err(Error::invalid_argument(format!(
            "invalid dimension {d} in output shape {dims:?}"
        ))),
        None => Ok(()),
    }
}

/// A numeric tensor, an input or an output of the invocation.
///
/// Passed to user code as `&Tensor<T>` (input) or `&mut Tensor<T>` (output).
pub struct Tensor<T: Element> {
    ctx: KernelContext,
    index: usize,
    is_input: bool,
    shape: Option<Vec<i64>>,
    data: *mut T,
    _marker: PhantomData<T>,
}
impl<T: Element> Tensor<T> {
    pub(crate) fn new_input(ctx: &KernelContext, index: usize) -> Result<Self> {
        let value = ctx.input(index)?;
        // Safety: the value handle was returned by the host for this invocation.
        let (elem, shape) = unsafe { ctx.host().tensor_type_and_shape(value.as_ptr()) }?;
        if elem != T::TYPE {
            return Err(Error::invalid_argument(format!(
                "input {index} holds {elem:?} elements, expected {:?}",
                T::TYPE
            )));
        }
        // Safety: the value handle was returned by the host for this invocation.
        let data = unsafe { ctx.host().tensor_data(value.as_ptr()) }?;
        Ok(Self {
            ctx: ctx.reborrow(),
            index,
            is_input: true,
            shape: Some(shape),
            data: data.cast_mut().cast(),
            _marker: PhantomData,
        })
    }

    pub(crate) fn new_output(ctx: &KernelContext, index: usize) -> Self {
        Self {
            ctx: ctx.reborrow(),
            index,
            is_input: false,
            shape: None,
            data: std::ptr::null_mut(),
            _marker: PhantomData,
        }
    }

    /// The input or output index this tensor is bound to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether this tensor is an input of the invocation.
    pub fn is_input(&self) -> bool {
        self.is_input
    }

    /// Whether the shape is known, always true for inputs and true for outputs after [`allocate`](Self::allocate).
    pub fn is_initialized(&self) -> bool {
        self.shape.is_some()
    }

    /// The shape of the tensor.
    ///
    /// Fails for an output that was not allocated yet.
    pub fn shape(&self) -> Result<&[i64]> {
        self.shape.as_deref().ok_or_else(not_initialized)
    }

    /// Product of the dimensions, 0 while the shape is unknown.
    pub fn number_of_element(&self) -> i64 {
        self.shape.as_deref().map(element_count).unwrap_or(0)
    }

    fn len(&self) -> usize {
        usize::try_from(self.number_of_element()).unwrap_or(0)
    }

    /// Pointer to the host buffer, null for an output that was not allocated yet.
    pub fn as_ptr(&self) -> *const T {
        self.data
    }

    /// The elements of the tensor in row major order.
    ///
    /// Empty for an output that was not allocated yet.
    pub fn data(&self) -> &[T] {
        if self.data.is_null() {
            return &[];
        }
        // Safety: the host guarantees the buffer holds `len` elements for the duration of the invocation.
        unsafe { std::slice::from_raw_parts(self.data, self.len()) }
    }

    /// Mutable elements of an allocated output.
    pub fn data_mut(&mut self) -> Result<&mut [T]> {
        if self.is_input {
            return Err(Error::invalid_argument(format!(
                "input {} is read only",
                self.index
            )));
        }
        if self.data.is_null() {
            return Err(not_initialized());
        }
        // Safety: the host allocated the buffer for this output with `len` elements, and we hold `&mut self`.
        Ok(unsafe { std::slice::from_raw_parts_mut(self.data, self.len()) })
    }

    /// Allocate the output with the given shape and return its buffer.
    ///
    /// Allocation happens once, later calls return the buffer of the first call regardless of `shape`, and the
    /// shape stays the first one.
    pub fn allocate(&mut self, shape: &[i64]) -> Result<&mut [T]> {
        if self.is_input {
            return Err(Error::invalid_argument(format!(
                "cannot allocate input {}",
                self.index
            )));
        }
        if self.data.is_null() {
            check_dims(shape)?;
            let value = self.ctx.output(self.index, shape)?;
            // Safety: the value was just allocated by the host for this invocation.
            let data = unsafe { self.ctx.host().tensor_mutable_data(value.as_ptr()) }?;
            self.shape = Some(shape.to_vec());
            self.data = data.cast();
            if self.data.is_null() {
                // empty tensors may come without a buffer
                self.data = NonNull::dangling().as_ptr();
            }
        }
        self.data_mut()
    }

    /// A span over a one dimensional tensor.
    pub fn as_span(&self) -> Result<Span<'_, T>> {
        match self.shape.as_deref() {
            Some([_]) => Ok(Span::from_slice(self.data())),
            _ => Err(Error::runtime(
                "invalid shape while trying to get a span out of a tensor",
            )),
        }
    }

    /// The single element of a tensor of shape `[1]`.
    pub fn as_scalar(&self) -> Result<T> {
        match (self.shape.as_deref(), self.data()) {
            (Some([1]), [value]) => Ok(*value),
            _ => Err(Error::runtime(
                "invalid shape while trying to get a scalar from a tensor",
            )),
        }
    }
}
