use std::ffi::{c_char, CString};
use std::ptr::NonNull;

use ort_lite_op_sys as sys;

use super::{check_dims, not_initialized, ElementType};
use crate::host::KernelContext;
use crate::util::element_count;
use crate::{Error, Result};

fn span_not_implemented() -> Error {
    Error::runtime("span for a string tensor is not implemented")
}

fn scalar_shape_error() -> Error {
    Error::runtime(
        "invalid shape while trying to get a scalar string from a tensor",
    )
}

/// Packed content of a string tensor: all characters and the start offset of every string.
struct StringContent {
    shape: Vec<i64>,
    chars: Vec<u8>,
    offsets: Vec<usize>,
}
impl StringContent {
    fn read(ctx: &KernelContext, index: usize) -> Result<Self> {
        let value = ctx.input(index)?;
        let host = ctx.host();
        // Safety: the value handle was returned by the host for this invocation.
        let (elem, shape) = unsafe { host.tensor_type_and_shape(value.as_ptr()) }?;
        if elem != ElementType::String {
            return Err(Error::invalid_argument(format!(
                "input {index} holds {elem:?} elements, expected String"
            )));
        }
        let count = usize::try_from(element_count(&shape)).unwrap_or(0);
        // Safety: as above.
        let num_chars = unsafe { host.string_tensor_data_length(value.as_ptr()) }?;
        let mut chars = vec![0_u8; num_chars];
        let mut offsets = vec![0_usize; count];
        if count > 0 {
            // Safety: as above, the buffers are sized by the host's own lengths.
            unsafe { host.string_tensor_content(value.as_ptr(), &mut chars, &mut offsets) }?;
        }
        Ok(Self {
            shape,
            chars,
            offsets,
        })
    }

    /// Byte range of every string; the end of the last one is the total character count.
    fn ranges(&self) -> Result<Vec<(usize, usize)>> {
        let num_chars = self.chars.len();
        let ends = self.offsets.iter().skip(1).copied().chain([num_chars]);
        self.offsets
            .iter()
            .copied()
            .zip(ends)
            .map(|(start, end)| {
                if start <= end && end <= num_chars {
                    Ok((start, end))
                } else {
                    Err(Error::invalid_argument(format!(
                        "string offsets [{start}, {end}) out of the {num_chars} characters of the tensor"
                    )))
                }
            })
            .collect()
    }
}

/// A string tensor with its strings decoded into owned `String`s.
///
/// Passed to user code as `&StringTensor` (input) or `&mut StringTensor` (output).
pub struct StringTensor {
    ctx: KernelContext,
    index: usize,
    is_input: bool,
    shape: Option<Vec<i64>>,
    strings: Vec<String>,
}
impl StringTensor {
    pub(crate) fn new_input(ctx: &KernelContext, index: usize) -> Result<Self> {
        let content = StringContent::read(ctx, index)?;
        let strings = content
            .ranges()?
            .into_iter()
            .map(|(start, end)| -> Result<String> {
                let s = std::str::from_utf8(&content.chars[start..end])?;
                Ok(s.to_owned())
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            ctx: ctx.reborrow(),
            index,
            is_input: true,
            shape: Some(content.shape),
            strings,
        })
    }

    pub(crate) fn new_output(ctx: &KernelContext, index: usize) -> Self {
        Self {
            ctx: ctx.reborrow(),
            index,
            is_input: false,
            shape: None,
            strings: Vec::new(),
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

    /// Whether the shape is known.
    pub fn is_initialized(&self) -> bool {
        self.shape.is_some()
    }

    /// The shape of the tensor, fails for an output that was not written yet.
    pub fn shape(&self) -> Result<&[i64]> {
        self.shape.as_deref().ok_or_else(not_initialized)
    }

    /// Product of the dimensions, 0 while the shape is unknown.
    pub fn number_of_element(&self) -> i64 {
        self.shape.as_deref().map(element_count).unwrap_or(0)
    }

    /// The strings, in row major order.
    ///
    /// For an output these are the strings last written with [`set_string_output`](Self::set_string_output).
    pub fn data(&self) -> &[String] {
        &self.strings
    }

    /// Allocate the output with shape `dims` and write `strings` into it with a single host call.
    ///
    /// The number of strings must match the product of `dims`, otherwise nothing is allocated.
    pub fn set_string_output<S: AsRef<str>>(&mut self, strings: &[S], dims: &[i64]) -> Result<()> {
        if self.is_input {
            return Err(Error::invalid_argument(format!(
                "cannot write strings into input {}",
                self.index
            )));
        }
        check_dims(dims)?;
        if i64::try_from(strings.len()).ok() != Some(element_count(dims)) {
            return Err(Error::invalid_argument(format!(
                "{} strings do not fill output shape {dims:?}",
                strings.len()
            )));
        }
        let c_strings = strings
            .iter()
            .map(|s| CString::new(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let ptrs = c_strings
            .iter()
            .map(|s| s.as_ptr())
            .collect::<Vec<*const c_char>>();

        let value: NonNull<sys::OrtValue> = self.ctx.output(self.index, dims)?;
        // Safety: the value was just allocated by the host and every pointer is a NUL terminated string that
        // outlives the call.
        unsafe { self.ctx.host().fill_string_tensor(value.as_ptr(), &ptrs) }?;

        self.shape = Some(dims.to_vec());
        self.strings = strings.iter().map(|s| s.as_ref().to_owned()).collect();
        Ok(())
    }

    /// Spans over string tensors are not supported.
    pub fn as_span(&self) -> Result<&[String]> {
        Err(span_not_implemented())
    }

    /// The single string of a tensor holding one element.
    pub fn as_scalar(&self) -> Result<&str> {
        match self.strings.as_slice() {
            [s] => Ok(s),
            _ => Err(scalar_shape_error()),
        }
    }
}

/// A string input tensor handing out `&str` views into a character buffer it owns.
///
/// Passed to user code as `&StrTensor`. There is no output form.
pub struct StrTensor {
    index: usize,
    shape: Vec<i64>,
    chars: Vec<u8>,
    ranges: Vec<(usize, usize)>,
}
impl StrTensor {
    pub(crate) fn new_input(ctx: &KernelContext, index: usize) -> Result<Self> {
        let content = StringContent::read(ctx, index)?;
        let ranges = content.ranges()?;
        for &(start, end) in &ranges {
            std::str::from_utf8(&content.chars[start..end])?;
        }
        Ok(Self {
            index,
            shape: content.shape,
            chars: content.chars,
            ranges,
        })
    }

    /// The input index this tensor is bound to.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The shape of the tensor.
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    /// Product of the dimensions.
    pub fn number_of_element(&self) -> i64 {
        element_count(&self.shape)
    }

    /// Number of strings.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether the tensor holds no strings.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The string at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        let &(start, end) = self.ranges.get(index)?;
        // Safety: every range was validated as UTF-8 at construction.
        Some(unsafe { std::str::from_utf8_unchecked(&self.chars[start..end]) })
    }

    /// Iterate over the strings in row major order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        // Safety: every range was validated as UTF-8 at construction.
        self.ranges
            .iter()
            .map(|&(start, end)| unsafe { std::str::from_utf8_unchecked(&self.chars[start..end]) })
    }

    /// All the strings, borrowing the tensor's buffer.
    pub fn data(&self) -> Vec<&str> {
        self.iter().collect()
    }

    /// Spans over string tensors are not supported.
    pub fn as_span(&self) -> Result<&[&str]> {
        Err(span_not_implemented())
    }

    /// The single string of a tensor holding one element.
    pub fn as_scalar(&self) -> Result<&str> {
        if self.len() != 1 {
            return Err(scalar_shape_error());
        }
        self.get(0).ok_or_else(scalar_shape_error)
    }
}
