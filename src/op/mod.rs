//! The custom operator descriptor handed to the host.
//!
//! A [`LiteCustomOp`] owns a populated `OrtCustomOp` vtable together with everything its callbacks read: the
//! operator name, the execution provider name, the element types of the inputs and outputs and the user's compute
//! function. The host keeps a pointer to the vtable and calls back through it to query the schema and to create,
//! run and destroy kernels.
//!
//! Two user facing shapes lower to the same descriptor:
//! - a free compute function, see [`create_lite_custom_op`](crate::create_lite_custom_op).
//! - a struct implementing [`CustomOp`] with a compute method, see
//!     [`create_lite_custom_struct_op`](crate::create_lite_custom_struct_op).

mod custom;
mod function;
mod thunk;

use std::ffi::CString;
use std::ptr::NonNull;

use ort_lite_op_sys as sys;

pub use custom::CustomOp;
pub(crate) use custom::StructOp;
pub(crate) use function::FunctionOp;

use crate::host::{HostApi, KernelInfo};
use crate::signature::{Binder, Signature, CPU_EXECUTION_PROVIDER};
use crate::tensor::ElementType;
use crate::util::IntoCpp;
use crate::Result;

/// How an operator builds its per kernel state and runs an invocation.
pub(crate) trait OpKind: Send + Sync + 'static {
    /// State shared by all the invocations of one kernel.
    type State: Send + Sync + 'static;

    fn declare(signature: &mut Signature);

    fn create_state(&self, info: &KernelInfo<'_>) -> Result<Self::State>;

    fn compute(state: &Self::State, binder: &mut Binder<'_>) -> Result<()>;
}

/// Data read by the vtable callbacks.
pub(crate) struct OpMeta {
    op_name: CString,
    execution_provider: CString,
    signature: Signature,
    input_types: Vec<sys::ONNXTensorElementDataType>,
    output_types: Vec<sys::ONNXTensorElementDataType>,
}
impl OpMeta {
    fn new(op_name: &str, execution_provider: &str, signature: Signature) -> Result<Self> {
        let input_types = signature.inputs().iter().map(|t| t.cpp()).collect();
        let output_types = signature.outputs().iter().map(|t| t.cpp()).collect();
        Ok(Self {
            op_name: CString::new(op_name)?,
            execution_provider: CString::new(execution_provider)?,
            signature,
            input_types,
            output_types,
        })
    }

    fn input_type(&self, index: usize) -> sys::ONNXTensorElementDataType {
        self.input_types
            .get(index)
            .copied()
            .unwrap_or(
                sys::ONNXTensorElementDataType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UNDEFINED,
            )
    }

    fn output_type(&self, index: usize) -> sys::ONNXTensorElementDataType {
        self.output_types
            .get(index)
            .copied()
            .unwrap_or(
                sys::ONNXTensorElementDataType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UNDEFINED,
            )
    }
}

/// The concrete descriptor.
///
/// `raw` must stay the first field: the host hands back a pointer to it, which the callbacks cast to the whole
/// descriptor.
#[repr(C)]
pub(crate) struct OpDescriptor<H, K> {
    raw: sys::OrtCustomOp,
    meta: OpMeta,
    host: H,
    kind: K,
}
impl<H: HostApi + 'static, K: OpKind> OpDescriptor<H, K> {
    fn new(host: H, op_name: &str, execution_provider: &str, kind: K) -> Result<Box<Self>> {
        let mut signature = Signature::default();
        K::declare(&mut signature);
        let meta = OpMeta::new(op_name, execution_provider, signature)?;
        log::debug!(
            "lite custom op {op_name} on {execution_provider}: inputs {:?}, outputs {:?}",
            meta.signature.inputs(),
            meta.signature.outputs(),
        );
        if meta.signature.is_cpu_only() && execution_provider != CPU_EXECUTION_PROVIDER {
            log::warn!(
                "lite custom op {op_name} takes span or scalar inputs, which fail on {execution_provider}"
            );
        }
        Ok(Box::new(Self {
            raw: thunk::vtable::<H, K>(),
            meta,
            host,
            kind,
        }))
    }

    /// # Safety
    ///
    /// `op` must point to the `raw` field of a live `OpDescriptor<H, K>`.
    unsafe fn from_raw<'a>(op: *const sys::OrtCustomOp) -> &'a Self {
        unsafe { &*op.cast::<Self>() }
    }
}

/// Type erased access to a descriptor.
trait Descriptor: Send + Sync {
    fn meta(&self) -> &OpMeta;
}
impl<H: HostApi + 'static, K: OpKind> Descriptor for OpDescriptor<H, K> {
    fn meta(&self) -> &OpMeta {
        &self.meta
    }
}

/// A custom operator descriptor, ready to be registered with the host.
///
/// The descriptor lives on the heap and its address never changes. Pass [`as_mut_ptr`](Self::as_mut_ptr) to the
/// host's custom op domain and keep this value alive for as long as any session using the operator exists.
pub struct LiteCustomOp {
    // leaked box, freed on drop; the vtable pointer is derived from it and covers the whole descriptor
    descriptor: NonNull<dyn Descriptor>,
}
// Safety: the descriptor is `Send + Sync` and owned by this handle.
unsafe impl Send for LiteCustomOp {}
unsafe impl Sync for LiteCustomOp {}

impl LiteCustomOp {
    pub(crate) fn new<H: HostApi + 'static, K: OpKind>(
        host: H,
        op_name: &str,
        execution_provider: &str,
        kind: K,
    ) -> Result<Self> {
        let descriptor: Box<dyn Descriptor> =
            OpDescriptor::new(host, op_name, execution_provider, kind)?;
        Ok(Self {
            descriptor: NonNull::from(Box::leak(descriptor)),
        })
    }

    fn meta(&self) -> &OpMeta {
        // Safety: the descriptor lives until `self` is dropped.
        unsafe { self.descriptor.as_ref() }.meta()
    }

    /// The operator name.
    pub fn name(&self) -> &str {
        // created from a `&str`
        self.meta().op_name.to_str().unwrap_or_default()
    }

    /// The execution provider the operator is registered for.
    pub fn execution_provider(&self) -> &str {
        self.meta().execution_provider.to_str().unwrap_or_default()
    }

    /// The derived operator schema.
    pub fn signature(&self) -> &Signature {
        &self.meta().signature
    }

    /// Element types of the inputs, in order.
    pub fn input_types(&self) -> &[ElementType] {
        self.signature().inputs()
    }

    /// Element types of the outputs, in order.
    pub fn output_types(&self) -> &[ElementType] {
        self.signature().outputs()
    }

    /// The raw vtable.
    ///
    /// The pointer stays valid while `self` is alive, moving `self` does not move the descriptor.
    pub fn as_ptr(&self) -> *const sys::OrtCustomOp {
        self.descriptor.as_ptr().cast_const().cast()
    }

    /// The raw vtable, as taken by the host's registration functions.
    ///
    /// The host only reads through this pointer.
    pub fn as_mut_ptr(&mut self) -> *mut sys::OrtCustomOp {
        self.descriptor.as_ptr().cast()
    }
}
impl Drop for LiteCustomOp {
    fn drop(&mut self) {
        // Safety: leaked in `new` and not used after this point.
        drop(unsafe { Box::from_raw(self.descriptor.as_ptr()) });
    }
}
impl std::fmt::Debug for LiteCustomOp {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("LiteCustomOp")
            .field("name", &self.name())
            .field("execution_provider", &self.execution_provider())
            .field("inputs", &self.input_types())
            .field("outputs", &self.output_types())
            .finish()
    }
}

#[cfg(test)]
mod tests;
