//! `extern "system"` callbacks of the `OrtCustomOp` vtable.
//!
//! Schema callbacks read the descriptor. Kernel callbacks never unwind into the host: errors and panics are turned
//! into a host status.

use std::any::Any;
use std::ffi::{c_char, c_int, c_void, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr::NonNull;

use ort_lite_op_sys as sys;

use super::{OpDescriptor, OpKind};
use crate::host::{HostApi, KernelContext, KernelInfo};
use crate::signature::Binder;
use crate::{Error, ErrorCode, Result};

/// Per kernel state, created by `CreateKernel` and dropped by `KernelDestroy`.
struct Kernel<S> {
    num_inputs: usize,
    num_outputs: usize,
    execution_provider: String,
    // points into the descriptor, which outlives its kernels
    host: NonNull<dyn HostApi>,
    state: S,
}

pub(super) fn vtable<H: HostApi + 'static, K: OpKind>() -> sys::OrtCustomOp {
    sys::OrtCustomOp {
        version: sys::ORT_API_VERSION,
        CreateKernel: None,
        GetName: Some(get_name::<H, K>),
        GetExecutionProviderType: Some(get_execution_provider_type::<H, K>),
        GetInputType: Some(get_input_type::<H, K>),
        GetInputTypeCount: Some(get_input_type_count::<H, K>),
        GetOutputType: Some(get_output_type::<H, K>),
        GetOutputTypeCount: Some(get_output_type_count::<H, K>),
        KernelCompute: None,
        KernelDestroy: Some(kernel_destroy::<K>),
        GetInputCharacteristic: Some(get_characteristic),
        GetOutputCharacteristic: Some(get_characteristic),
        GetInputMemoryType: Some(get_input_memory_type),
        GetVariadicInputMinArity: Some(get_zero),
        GetVariadicInputHomogeneity: Some(get_zero),
        GetVariadicOutputMinArity: Some(get_zero),
        GetVariadicOutputHomogeneity: Some(get_zero),
        CreateKernelV2: Some(create_kernel::<H, K>),
        KernelComputeV2: Some(kernel_compute::<K>),
        InferOutputShapeFn: None,
        GetStartVersion: Some(get_start_version),
        GetEndVersion: Some(get_end_version),
    }
}

unsafe extern "system" fn get_name<H: HostApi + 'static, K: OpKind>(
    op: *const sys::OrtCustomOp,
) -> *const c_char {
    unsafe { OpDescriptor::<H, K>::from_raw(op) }
        .meta
        .op_name
        .as_ptr()
}

unsafe extern "system" fn get_execution_provider_type<H: HostApi + 'static, K: OpKind>(
    op: *const sys::OrtCustomOp,
) -> *const c_char {
    unsafe { OpDescriptor::<H, K>::from_raw(op) }
        .meta
        .execution_provider
        .as_ptr()
}

unsafe extern "system" fn get_input_type<H: HostApi + 'static, K: OpKind>(
    op: *const sys::OrtCustomOp,
    index: usize,
) -> sys::ONNXTensorElementDataType {
    unsafe { OpDescriptor::<H, K>::from_raw(op) }
        .meta
        .input_type(index)
}

unsafe extern "system" fn get_input_type_count<H: HostApi + 'static, K: OpKind>(
    op: *const sys::OrtCustomOp,
) -> usize {
    unsafe { OpDescriptor::<H, K>::from_raw(op) }
        .meta
        .input_types
        .len()
}

unsafe extern "system" fn get_output_type<H: HostApi + 'static, K: OpKind>(
    op: *const sys::OrtCustomOp,
    index: usize,
) -> sys::ONNXTensorElementDataType {
    unsafe { OpDescriptor::<H, K>::from_raw(op) }
        .meta
        .output_type(index)
}

unsafe extern "system" fn get_output_type_count<H: HostApi + 'static, K: OpKind>(
    op: *const sys::OrtCustomOp,
) -> usize {
    unsafe { OpDescriptor::<H, K>::from_raw(op) }
        .meta
        .output_types
        .len()
}

// Every input and output is optional, the host may pass fewer values than the signature declares.
unsafe extern "system" fn get_characteristic(
    _op: *const sys::OrtCustomOp,
    _index: usize,
) -> sys::OrtCustomOpInputOutputCharacteristic {
    sys::OrtCustomOpInputOutputCharacteristic::INPUT_OUTPUT_OPTIONAL
}

unsafe extern "system" fn get_input_memory_type(
    _op: *const sys::OrtCustomOp,
    _index: usize,
) -> sys::OrtMemType {
    sys::OrtMemType::OrtMemTypeDefault
}

unsafe extern "system" fn get_zero(_op: *const sys::OrtCustomOp) -> c_int {
    0
}

unsafe extern "system" fn get_start_version(_op: *const sys::OrtCustomOp) -> c_int {
    1
}

unsafe extern "system" fn get_end_version(_op: *const sys::OrtCustomOp) -> c_int {
    c_int::MAX
}

unsafe extern "system" fn create_kernel<H: HostApi + 'static, K: OpKind>(
    op: *const sys::OrtCustomOp,
    api: *const sys::OrtApi,
    info: *const sys::OrtKernelInfo,
    kernel: *mut *mut c_void,
) -> sys::OrtStatusPtr {
    let this = unsafe { OpDescriptor::<H, K>::from_raw(op) };
    let host: &(dyn HostApi + 'static) = &this.host;
    if !kernel.is_null() {
        unsafe { *kernel = std::ptr::null_mut() };
    }
    let result = guard("CreateKernel", || {
        if kernel.is_null() {
            return Err(Error::invalid_argument("null kernel out pointer"));
        }
        // Safety: `info` is the kernel info handle the host passed for this kernel creation.
        let info = unsafe { KernelInfo::new(api, info, host) }?;
        let num_inputs = info.input_count()?;
        let num_outputs = info.output_count()?;
        let state = this.kind.create_state(&info)?;
        let execution_provider = this
            .meta
            .execution_provider
            .to_str()
            .unwrap_or_default()
            .to_owned();
        log::trace!(
            "created kernel of {:?} with {num_inputs} inputs and {num_outputs} outputs",
            this.meta.op_name
        );
        Ok(Box::new(Kernel {
            num_inputs,
            num_outputs,
            execution_provider,
            host: NonNull::from(host),
            state,
        }))
    });
    match result {
        Ok(boxed) => {
            // Safety: checked non null above.
            unsafe { *kernel = Box::into_raw(boxed).cast() };
            std::ptr::null_mut()
        }
        Err(err) => into_status(host, &err),
    }
}

unsafe extern "system" fn kernel_compute<K: OpKind>(
    op_kernel: *mut c_void,
    context: *mut sys::OrtKernelContext,
) -> sys::OrtStatusPtr {
    // Safety: the host passes back the pointer written by `create_kernel`.
    let kernel = unsafe { &*op_kernel.cast::<Kernel<K::State>>() };
    // Safety: the descriptor owning the host outlives the kernel.
    let host = unsafe { kernel.host.as_ref() };
    let result = guard("KernelCompute", || {
        // Safety: `context` is the kernel context of this invocation and the host outlives it.
        let ctx = unsafe { KernelContext::new(context, host) }?;
        let mut binder = Binder::new(
            &ctx,
            &kernel.execution_provider,
            kernel.num_inputs,
            kernel.num_outputs,
        );
        K::compute(&kernel.state, &mut binder)
    });
    match result {
        Ok(()) => std::ptr::null_mut(),
        Err(err) => into_status(host, &err),
    }
}

unsafe extern "system" fn kernel_destroy<K: OpKind>(op_kernel: *mut c_void) {
    if op_kernel.is_null() {
        return;
    }
    log::trace!("destroying kernel");
    // Safety: the host passes back the pointer written by `create_kernel`, once.
    let kernel = unsafe { Box::from_raw(op_kernel.cast::<Kernel<K::State>>()) };
    if catch_unwind(AssertUnwindSafe(move || drop(kernel))).is_err() {
        log::error!("kernel state panicked while being dropped");
    }
}

/// Run `f`, catching panics.
fn guard<T>(what: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let result = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(Error::new(
            ErrorCode::Fail,
            format!("{what} panicked: {}", panic_message(&*payload)),
        )),
    };
    if let Err(err) = &result {
        log::error!("{what} failed: {err}");
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}

fn into_status(host: &dyn HostApi, err: &Error) -> sys::OrtStatusPtr {
    let message = CString::new(err.message().replace('\0', " ")).unwrap_or_default();
    host.create_status(err.code(), &message)
}
