//! Execution provider specific handles, available as compute function parameters.
//!
//! A `&CudaContext` or `&DmlContext` parameter contributes nothing to the operator schema. It is filled from the
//! resources of the kernel context at the start of every invocation.

use std::ffi::c_void;

use ort_lite_op_sys as sys;

use crate::host::KernelContext;
use crate::signature::{Binder, ComputeArg, Signature};
use crate::Result;

/// Device handles of the CUDA execution provider for the current invocation.
#[cfg(feature = "cuda")]
#[derive(Debug, Clone, Copy)]
pub struct CudaContext {
    /// The `cudaStream_t` the kernel should enqueue its work on.
    pub cuda_stream: *mut c_void,
    /// The `cudnnHandle_t` of the provider.
    pub cudnn_handle: *mut c_void,
    /// The `cublasHandle_t` of the provider.
    pub cublas_handle: *mut c_void,
}
#[cfg(feature = "cuda")]
impl CudaContext {
    /// Read the handles from the kernel context.
    pub fn init(ctx: &KernelContext) -> Result<Self> {
        use sys::cuda::*;
        Ok(Self {
            cuda_stream: ctx.resource(ORT_CUDA_RESOURCE_VERSION, CUDA_STREAM_T)?,
            cudnn_handle: ctx.resource(ORT_CUDA_RESOURCE_VERSION, CUDNN_HANDLE_T)?,
            cublas_handle: ctx.resource(ORT_CUDA_RESOURCE_VERSION, CUBLAS_HANDLE_T)?,
        })
    }
}
#[cfg(feature = "cuda")]
impl ComputeArg for &CudaContext {
    type State = CudaContext;
    type Item<'s> = &'s CudaContext;

    fn declare(_signature: &mut Signature) {}
    fn prepare(binder: &mut Binder<'_>) -> Result<CudaContext> {
        CudaContext::init(binder.context())
    }
    fn item(state: &mut CudaContext) -> &CudaContext {
        state
    }
    private_impl! {}
}

/// Device handles of the DirectML execution provider for the current invocation.
#[cfg(feature = "dml")]
#[derive(Debug, Clone, Copy)]
pub struct DmlContext {
    /// The `IDMLDevice` of the provider.
    pub dml_device: *mut c_void,
    /// The `ID3D12CommandQueue` of the provider.
    pub d3d12_command_queue: *mut c_void,
    /// The command list work is recorded into.
    pub cmd_list: *mut c_void,
    /// The command recorder of the provider.
    pub cmd_recorder: *mut c_void,
}
#[cfg(feature = "dml")]
impl DmlContext {
    /// Read the handles from the kernel context.
    pub fn init(ctx: &KernelContext) -> Result<Self> {
        use sys::dml::*;
        Ok(Self {
            dml_device: ctx.resource(ORT_DML_RESOURCE_VERSION, DML_DEVICE_T)?,
            d3d12_command_queue: ctx.resource(ORT_DML_RESOURCE_VERSION, D3D12_COMMAND_QUEUE_T)?,
            cmd_list: ctx.resource(ORT_DML_RESOURCE_VERSION, CMD_LIST_T)?,
            cmd_recorder: ctx.resource(ORT_DML_RESOURCE_VERSION, CMD_RECORDER_T)?,
        })
    }
}
#[cfg(feature = "dml")]
impl ComputeArg for &DmlContext {
    type State = DmlContext;
    type Item<'s> = &'s DmlContext;

    fn declare(_signature: &mut Signature) {}
    fn prepare(binder: &mut Binder<'_>) -> Result<DmlContext> {
        DmlContext::init(binder.context())
    }
    fn item(state: &mut DmlContext) -> &DmlContext {
        state
    }
    private_impl! {}
}

#[cfg(all(test, feature = "cuda"))]
mod tests {
    use super::*;
    use crate::signature::CPU_EXECUTION_PROVIDER;
    use crate::tests::MockContext;

    #[test]
    fn cuda_context_from_resources() {
        let mut mock = MockContext::new(vec![], &[]);
        let ctx = mock.context();
        let mut binder = Binder::new(&ctx, CPU_EXECUTION_PROVIDER, 0, 0);
        let mut state = <&CudaContext>::prepare(&mut binder).unwrap();
        let cuda = <&CudaContext>::item(&mut state);
        // the mock host hands out the resource id as the handle
        assert_eq!(cuda.cuda_stream as usize, 10000);
        assert_eq!(cuda.cudnn_handle as usize, 10001);
        assert_eq!(cuda.cublas_handle as usize, 10002);
        assert_eq!(binder.inputs_bound(), 0);
    }
}
