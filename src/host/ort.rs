//! [`HostApi`] over the `OrtApi` function table of a running ONNX Runtime.
//!
//! A custom op library receives the api base in its `RegisterCustomOps` entry point and builds its descriptors
//! from it:
//! ```rust,ignore
//! unsafe fn filter_op(api_base: *const sys::OrtApiBase) -> Result<LiteCustomOp> {
//!     let host = OrtHost::from_api_base(api_base)?;
//!     create_lite_custom_op(host, "Filter", CPU_EXECUTION_PROVIDER, filter)
//! }
//! ```
//! The descriptor is then added to a custom op domain with `CustomOpDomain_Add(domain, op.as_mut_ptr())` and must
//! outlive every session using it.

use std::ffi::{c_char, c_void, CStr};
use std::ptr::{self, NonNull};

use ort_lite_op_sys as sys;

use super::HostApi;
use crate::tensor::ElementType;
use crate::util::{IntoCpp, IntoRust};
use crate::{Error, ErrorCode, Result};

/// Call an `OrtApi` entry and turn the returned status into a `Result`.
macro_rules! ortcall {
    ($host:ident.$entry:ident($($arg:expr),* $(,)?)) => {{
        let f = OrtHost::entry($host.api().$entry, stringify!($entry))?;
        // Safety: the caller upholds the contract of the entry.
        unsafe { $host.check(f($($arg),*)) }
    }};
}

fn missing(entry: &str) -> Error {
    Error::new(
        ErrorCode::NotImplemented,
        format!("OrtApi::{entry} is not available"),
    )
}

/// The host capabilities of a loaded ONNX Runtime.
///
/// Every host error is returned as [`Error::Status`] with the code and message of the host status, which is
/// released afterwards.
pub struct OrtHost {
    api: NonNull<sys::OrtApi>,
}
// Safety: the function table is immutable and its entries may be called from any thread.
unsafe impl Send for OrtHost {}
unsafe impl Sync for OrtHost {}

impl OrtHost {
    /// Wrap the function table of the host.
    ///
    /// # Safety
    ///
    /// `api` must point to the `OrtApi` table of a loaded ONNX Runtime, or a table with the same layout and
    /// semantics, valid for the lifetime of every descriptor built with the returned host.
    pub unsafe fn new(api: *const sys::OrtApi) -> Result<Self> {
        let api =
            NonNull::new(api.cast_mut()).ok_or_else(|| Error::invalid_argument("null OrtApi"))?;
        Ok(Self { api })
    }

    /// Request the function table of [`sys::ORT_API_VERSION`] from the host entry point.
    ///
    /// # Safety
    ///
    /// `base` must be the api base the host passed to the library, see [`new`](Self::new).
    pub unsafe fn from_api_base(base: *const sys::OrtApiBase) -> Result<Self> {
        // Safety: the caller passes a valid api base or null.
        let base = unsafe { base.as_ref() }
            .ok_or_else(|| Error::invalid_argument("null OrtApiBase"))?;
        let get_api = Self::entry(base.GetApi, "GetApi")?;
        // Safety: `GetApi` accepts any version and returns null for the ones it does not provide.
        let api = unsafe { get_api(sys::ORT_API_VERSION) };
        if api.is_null() {
            return Err(Error::new(
                ErrorCode::NotImplemented,
                format!(
                    "the host does not provide API version {}",
                    sys::ORT_API_VERSION
                ),
            ));
        }
        log::debug!("using OrtApi version {}", sys::ORT_API_VERSION);
        // Safety: returned by the host for this version.
        unsafe { Self::new(api) }
    }

    /// The wrapped function table.
    pub fn as_ptr(&self) -> *const sys::OrtApi {
        self.api.as_ptr()
    }

    fn api(&self) -> &sys::OrtApi {
        // Safety: the table outlives the host object.
        unsafe { self.api.as_ref() }
    }

    fn entry<F>(entry: Option<F>, name: &str) -> Result<F> {
        entry.ok_or_else(|| missing(name))
    }

    /// Convert a status returned by the host, releasing it.
    ///
    /// # Safety
    ///
    /// `status` must be null or a status created by this host that is not used afterwards.
    unsafe fn check(&self, status: sys::OrtStatusPtr) -> Result<()> {
        if status.is_null() {
            return Ok(());
        }
        let api = self.api();
        let code = api
            .GetErrorCode
            // Safety: `status` is a live status of this host.
            .and_then(|get_code| unsafe { get_code(status) }.rs())
            .unwrap_or(ErrorCode::Fail);
        let message = match api.GetErrorMessage {
            // Safety: as above, the message is owned by the status.
            Some(get_message) => match unsafe { get_message(status) } {
                msg if msg.is_null() => String::new(),
                msg => unsafe { CStr::from_ptr(msg) }
                    .to_string_lossy()
                    .into_owned(),
            },
            None => String::new(),
        };
        if let Some(release) = api.ReleaseStatus {
            // Safety: the status is not used after this point.
            unsafe { release(status) };
        }
        Err(Error::new(code, message))
    }

    /// # Safety
    ///
    /// `info` must be a live type and shape info of this host.
    unsafe fn read_type_and_shape(
        &self,
        info: *const sys::OrtTensorTypeAndShapeInfo,
    ) -> Result<(ElementType, Vec<i64>)> {
        let mut raw_elem = sys::ONNXTensorElementDataType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UNDEFINED;
        ortcall!(self.GetTensorElementType(info, &mut raw_elem))?;
        let elem = ElementType::from_raw(raw_elem).ok_or_else(|| {
            Error::new(
                ErrorCode::NotImplemented,
                format!("tensor element type {raw_elem:?} is not supported"),
            )
        })?;
        let mut rank = 0;
        ortcall!(self.GetDimensionsCount(info, &mut rank))?;
        let mut dims = vec![0_i64; rank];
        ortcall!(self.GetDimensions(info, dims.as_mut_ptr(), rank))?;
        Ok((elem, dims))
    }
}
impl std::fmt::Debug for OrtHost {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("OrtHost").field("api", &self.api).finish()
    }
}

unsafe impl HostApi for OrtHost {
    unsafe fn kernel_context_input_count(
        &self,
        context: *const sys::OrtKernelContext,
    ) -> Result<usize> {
        let mut count = 0;
        ortcall!(self.KernelContext_GetInputCount(context, &mut count))?;
        Ok(count)
    }

    unsafe fn kernel_context_output_count(
        &self,
        context: *const sys::OrtKernelContext,
    ) -> Result<usize> {
        let mut count = 0;
        ortcall!(self.KernelContext_GetOutputCount(context, &mut count))?;
        Ok(count)
    }

    unsafe fn kernel_context_input(
        &self,
        context: *const sys::OrtKernelContext,
        index: usize,
    ) -> Result<*const sys::OrtValue> {
        let mut value = ptr::null();
        ortcall!(self.KernelContext_GetInput(context, index, &mut value))?;
        Ok(value)
    }

    unsafe fn kernel_context_output(
        &self,
        context: *mut sys::OrtKernelContext,
        index: usize,
        dims: &[i64],
    ) -> Result<*mut sys::OrtValue> {
        let mut value = ptr::null_mut();
        ortcall!(self.KernelContext_GetOutput(
            context,
            index,
            dims.as_ptr(),
            dims.len(),
            &mut value
        ))?;
        Ok(value)
    }

    unsafe fn tensor_type_and_shape(
        &self,
        value: *const sys::OrtValue,
    ) -> Result<(ElementType, Vec<i64>)> {
        let mut info = ptr::null_mut();
        ortcall!(self.GetTensorTypeAndShape(value, &mut info))?;
        // Safety: the info was just created by the host.
        let result = unsafe { self.read_type_and_shape(info) };
        if let Some(release) = self.api().ReleaseTensorTypeAndShapeInfo {
            // Safety: the info is not used after this point.
            unsafe { release(info) };
        }
        result
    }

    unsafe fn tensor_data(&self, value: *const sys::OrtValue) -> Result<*const c_void> {
        // the table of this API version has no read only accessor
        let data = unsafe { self.tensor_mutable_data(value.cast_mut()) }?;
        Ok(data.cast_const())
    }

    unsafe fn tensor_mutable_data(&self, value: *mut sys::OrtValue) -> Result<*mut c_void> {
        let mut data = ptr::null_mut();
        ortcall!(self.GetTensorMutableData(value, &mut data))?;
        Ok(data)
    }

    unsafe fn string_tensor_data_length(&self, value: *const sys::OrtValue) -> Result<usize> {
        let mut len = 0;
        ortcall!(self.GetStringTensorDataLength(value, &mut len))?;
        Ok(len)
    }

    unsafe fn string_tensor_content(
        &self,
        value: *const sys::OrtValue,
        buf: &mut [u8],
        offsets: &mut [usize],
    ) -> Result<()> {
        ortcall!(self.GetStringTensorContent(
            value,
            buf.as_mut_ptr().cast(),
            buf.len(),
            offsets.as_mut_ptr(),
            offsets.len()
        ))
    }

    unsafe fn fill_string_tensor(
        &self,
        value: *mut sys::OrtValue,
        strings: &[*const c_char],
    ) -> Result<()> {
        ortcall!(self.FillStringTensor(value, strings.as_ptr(), strings.len()))
    }

    unsafe fn kernel_info_input_count(&self, info: *const sys::OrtKernelInfo) -> Result<usize> {
        let mut count = 0;
        ortcall!(self.KernelInfo_GetInputCount(info, &mut count))?;
        Ok(count)
    }

    unsafe fn kernel_info_output_count(&self, info: *const sys::OrtKernelInfo) -> Result<usize> {
        let mut count = 0;
        ortcall!(self.KernelInfo_GetOutputCount(info, &mut count))?;
        Ok(count)
    }

    fn create_status(&self, code: ErrorCode, message: &CStr) -> sys::OrtStatusPtr {
        match self.api().CreateStatus {
            // Safety: the message is NUL terminated and copied by the host.
            Some(create) => unsafe { create(code.cpp(), message.as_ptr()) },
            None => {
                log::error!(
                    "OrtApi::CreateStatus is not available, dropping error {code:?}: {message:?}"
                );
                ptr::null_mut()
            }
        }
    }

    #[cfg(any(feature = "cuda", feature = "dml"))]
    unsafe fn kernel_context_resource(
        &self,
        context: *const sys::OrtKernelContext,
        resource_version: i32,
        resource_id: i32,
    ) -> Result<*mut c_void> {
        let mut resource = ptr::null_mut();
        ortcall!(self.KernelContext_GetResource(
            context,
            resource_version,
            resource_id,
            &mut resource
        ))?;
        Ok(resource)
    }
}
