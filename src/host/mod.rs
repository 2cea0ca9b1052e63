//! The capabilities the binding layer consumes from the host runtime.
//!
//! The host passes opaque handles (kernel context, kernel info, values) to the operator callbacks. Everything the
//! binding layer does with these handles goes through the [`HostApi`] trait. [`OrtHost`] implements it on top of the
//! `OrtApi` function table of a running ONNX Runtime. The host object is stored inside the operator descriptor and
//! is reachable from every kernel created from it.
//!
//! [`KernelContext`] and [`KernelInfo`] are the safe wrappers handed to user code.

mod ort;

use std::ffi::{c_char, c_void, CStr};
use std::ptr::NonNull;

use ort_lite_op_sys as sys;

pub use ort::OrtHost;

use crate::tensor::ElementType;
use crate::{Error, ErrorCode, Result};

/// Host runtime capabilities used by the binding layer.
///
/// Each method corresponds to one entry of the host's C API. Errors reported by the host should be returned as
/// [`Error::Status`] with the host's code and message, they are passed through to the caller unchanged.
///
/// # Safety
///
/// The binding layer trusts the values returned by an implementation. In particular:
/// - pointers returned by [`tensor_data`](HostApi::tensor_data) and
///     [`tensor_mutable_data`](HostApi::tensor_mutable_data) must point to a buffer of
///     [`tensor_type_and_shape`](HostApi::tensor_type_and_shape) element type holding as many elements as the
///     product of the shape, valid until the kernel invocation returns (null is allowed for empty tensors).
/// - value handles returned by [`kernel_context_input`](HostApi::kernel_context_input) and
///     [`kernel_context_output`](HostApi::kernel_context_output) must be valid until the invocation returns.
pub unsafe trait HostApi: Send + Sync {
    /// Number of inputs of the invocation.
    ///
    /// # Safety
    ///
    /// `context` must be a kernel context handle received from the host for an ongoing invocation.
    unsafe fn kernel_context_input_count(&self, context: *const sys::OrtKernelContext)
        -> Result<usize>;

    /// Number of outputs of the invocation.
    ///
    /// # Safety
    ///
    /// Same as [`kernel_context_input_count`](HostApi::kernel_context_input_count).
    unsafe fn kernel_context_output_count(
        &self,
        context: *const sys::OrtKernelContext,
    ) -> Result<usize>;

    /// The value bound to input `index`.
    ///
    /// # Safety
    ///
    /// `context` must be a kernel context handle of an ongoing invocation and `index` must be smaller than the input
    /// count.
    unsafe fn kernel_context_input(
        &self,
        context: *const sys::OrtKernelContext,
        index: usize,
    ) -> Result<*const sys::OrtValue>;

    /// Allocate output `index` with the given shape and return its value.
    ///
    /// # Safety
    ///
    /// `context` must be a kernel context handle of an ongoing invocation.
    unsafe fn kernel_context_output(
        &self,
        context: *mut sys::OrtKernelContext,
        index: usize,
        dims: &[i64],
    ) -> Result<*mut sys::OrtValue>;

    /// Element type and shape of a tensor value.
    ///
    /// # Safety
    ///
    /// `value` must be a value handle obtained from this host during an ongoing invocation.
    unsafe fn tensor_type_and_shape(
        &self,
        value: *const sys::OrtValue,
    ) -> Result<(ElementType, Vec<i64>)>;

    /// Read-only data buffer of a numeric tensor.
    ///
    /// # Safety
    ///
    /// Same as [`tensor_type_and_shape`](HostApi::tensor_type_and_shape).
    unsafe fn tensor_data(&self, value: *const sys::OrtValue) -> Result<*const c_void>;

    /// Writable data buffer of a numeric tensor.
    ///
    /// # Safety
    ///
    /// Same as [`tensor_type_and_shape`](HostApi::tensor_type_and_shape).
    unsafe fn tensor_mutable_data(&self, value: *mut sys::OrtValue) -> Result<*mut c_void>;

    /// Total number of characters of all the strings of a string tensor.
    ///
    /// # Safety
    ///
    /// Same as [`tensor_type_and_shape`](HostApi::tensor_type_and_shape).
    unsafe fn string_tensor_data_length(&self, value: *const sys::OrtValue) -> Result<usize>;

    /// Copy the packed characters of a string tensor into `buf` and the start offset of every string into
    /// `offsets`.
    ///
    /// # Safety
    ///
    /// Same as [`tensor_type_and_shape`](HostApi::tensor_type_and_shape).
    unsafe fn string_tensor_content(
        &self,
        value: *const sys::OrtValue,
        buf: &mut [u8],
        offsets: &mut [usize],
    ) -> Result<()>;

    /// Write NUL terminated strings into a string tensor.
    ///
    /// # Safety
    ///
    /// `value` must be an output value of an ongoing invocation and every pointer of `strings` must point to a NUL
    /// terminated string.
    unsafe fn fill_string_tensor(
        &self,
        value: *mut sys::OrtValue,
        strings: &[*const c_char],
    ) -> Result<()>;

    /// Number of inputs known at kernel creation.
    ///
    /// # Safety
    ///
    /// `info` must be a kernel info handle received from the host during kernel creation.
    unsafe fn kernel_info_input_count(&self, info: *const sys::OrtKernelInfo) -> Result<usize>;

    /// Number of outputs known at kernel creation.
    ///
    /// # Safety
    ///
    /// Same as [`kernel_info_input_count`](HostApi::kernel_info_input_count).
    unsafe fn kernel_info_output_count(&self, info: *const sys::OrtKernelInfo) -> Result<usize>;

    /// Allocate a host status reporting an error.
    ///
    /// The returned status is handed over to the host, which takes ownership of it.
    fn create_status(&self, code: ErrorCode, message: &CStr) -> sys::OrtStatusPtr;

    /// An execution provider specific resource of the invocation, such as a device stream.
    ///
    /// # Safety
    ///
    /// `context` must be a kernel context handle of an ongoing invocation.
    #[cfg(any(feature = "cuda", feature = "dml"))]
    unsafe fn kernel_context_resource(
        &self,
        context: *const sys::OrtKernelContext,
        resource_version: i32,
        resource_id: i32,
    ) -> Result<*mut c_void>;
}

/// The per invocation kernel context.
///
/// Passed to user code as `&KernelContext` when an operator declares it as a parameter. It only exists for the
/// duration of one invocation.
pub struct KernelContext {
    ptr: NonNull<sys::OrtKernelContext>,
    host: NonNull<dyn HostApi>,
}
impl KernelContext {
    /// # Safety
    ///
    /// `ptr` must be a kernel context handle of an ongoing invocation of a kernel created by `host`, and both must
    /// outlive the returned object.
    pub(crate) unsafe fn new(
        ptr: *mut sys::OrtKernelContext,
        host: &(dyn HostApi + 'static),
    ) -> Result<Self> {
        let ptr =
            NonNull::new(ptr).ok_or_else(|| Error::invalid_argument("null kernel context"))?;
        Ok(Self {
            ptr,
            host: NonNull::from(host),
        })
    }

    /// A second handle to the same invocation, used by the tensor views.
    pub(crate) fn reborrow(&self) -> Self {
        Self {
            ptr: self.ptr,
            host: self.host,
        }
    }

    /// The raw kernel context handle.
    pub fn as_ptr(&self) -> *mut sys::OrtKernelContext {
        self.ptr.as_ptr()
    }

    /// The host the kernel runs in.
    pub fn host(&self) -> &dyn HostApi {
        // Safety: the host object lives in the operator descriptor, which outlives every invocation.
        unsafe { self.host.as_ref() }
    }

    /// Number of inputs actually passed to this invocation.
    pub fn input_count(&self) -> Result<usize> {
        // Safety: the context is valid for the duration of the invocation.
        unsafe { self.host().kernel_context_input_count(self.ptr.as_ptr()) }
    }

    /// Number of outputs of this invocation.
    pub fn output_count(&self) -> Result<usize> {
        // Safety: the context is valid for the duration of the invocation.
        unsafe { self.host().kernel_context_output_count(self.ptr.as_ptr()) }
    }

    pub(crate) fn input(&self, index: usize) -> Result<NonNull<sys::OrtValue>> {
        if index >= self.input_count()? {
            return Err(Error::invalid_argument("invalid index for tensor"));
        }
        // Safety: the context is valid and the index is in range.
        let value = unsafe { self.host().kernel_context_input(self.ptr.as_ptr(), index)? };
        NonNull::new(value.cast_mut())
            .ok_or_else(|| Error::invalid_argument(format!("input {index} is not bound")))
    }

    pub(crate) fn output(&self, index: usize, dims: &[i64]) -> Result<NonNull<sys::OrtValue>> {
        // Safety: the context is valid for the duration of the invocation.
        let value = unsafe { self.host().kernel_context_output(self.ptr.as_ptr(), index, dims)? };
        NonNull::new(value).ok_or_else(|| {
            Error::new(
                ErrorCode::Fail,
                format!("host returned no value for output {index}"),
            )
        })
    }

    #[cfg(any(feature = "cuda", feature = "dml"))]
    pub(crate) fn resource(&self, resource_version: i32, resource_id: i32) -> Result<*mut c_void> {
        // Safety: the context is valid for the duration of the invocation.
        unsafe {
            self.host()
                .kernel_context_resource(self.ptr.as_ptr(), resource_version, resource_id)
        }
    }
}
impl std::fmt::Debug for KernelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("KernelContext")
            .field("ptr", &self.ptr)
            .finish_non_exhaustive()
    }
}

/// Kernel creation information, passed to [`CustomOp::new`](crate::CustomOp::new).
pub struct KernelInfo<'a> {
    api: *const sys::OrtApi,
    ptr: NonNull<sys::OrtKernelInfo>,
    host: &'a dyn HostApi,
}
impl<'a> KernelInfo<'a> {
    /// # Safety
    ///
    /// `ptr` must be a kernel info handle received from the host during kernel creation.
    pub(crate) unsafe fn new(
        api: *const sys::OrtApi,
        ptr: *const sys::OrtKernelInfo,
        host: &'a dyn HostApi,
    ) -> Result<Self> {
        let ptr = NonNull::new(ptr.cast_mut())
            .ok_or_else(|| Error::invalid_argument("null kernel info"))?;
        Ok(Self { api, ptr, host })
    }

    /// The host API function table passed to kernel creation.
    pub fn api(&self) -> *const sys::OrtApi {
        self.api
    }

    /// The raw kernel info handle.
    pub fn as_ptr(&self) -> *const sys::OrtKernelInfo {
        self.ptr.as_ptr()
    }

    /// The host the kernel is created in.
    pub fn host(&self) -> &'a dyn HostApi {
        self.host
    }

    /// Number of inputs of the node the kernel is created for.
    pub fn input_count(&self) -> Result<usize> {
        // Safety: the info handle is valid during kernel creation.
        unsafe { self.host.kernel_info_input_count(self.ptr.as_ptr()) }
    }

    /// Number of outputs of the node the kernel is created for.
    pub fn output_count(&self) -> Result<usize> {
        // Safety: the info handle is valid during kernel creation.
        unsafe { self.host.kernel_info_output_count(self.ptr.as_ptr()) }
    }
}
