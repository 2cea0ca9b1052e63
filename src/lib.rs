#![cfg_attr(deny_warnings, deny(warnings))]
#![cfg_attr(deny_warnings, deny(missing_docs))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Turn plain Rust functions and structs into ONNX Runtime custom operators.
//!
//! ONNX Runtime loads custom operators through a C ABI: a plugin hands the runtime an `OrtCustomOp` vtable, and the
//! runtime queries it for the operator name, its execution provider and the element types of its inputs and
//! outputs, then creates kernels and runs them through it. Writing such a vtable by hand means pulling every input
//! out of an opaque kernel context by index and keeping the reported schema in sync with that code.
//!
//! This crate derives both from the parameter list of a compute function. The function below declares one `f32`
//! input and one `f32` output, and its inputs are read and its output allocated through typed views:
//! ```rust,ignore
//! use ort_lite_op::tensor::Tensor;
//! use ort_lite_op::{create_lite_custom_op, Result, CPU_EXECUTION_PROVIDER};
//!
//! fn filter(x: &Tensor<f32>, z: &mut Tensor<f32>) -> Result<()> {
//!     let kept = x.data().iter().copied().filter(|v| *v > 2.0).collect::<Vec<_>>();
//!     z.allocate(&[kept.len() as i64])?.copy_from_slice(&kept);
//!     Ok(())
//! }
//!
//! let mut op = create_lite_custom_op(host, "Filter", CPU_EXECUTION_PROVIDER, filter)?;
//! assert_eq!(op.input_types(), &[ElementType::Float]);
//! // hand the vtable to the host, e.g. `CustomOpDomain_Add(domain, op.as_mut_ptr())`
//! ```
//!
//! Operators that keep state between invocations implement [`CustomOp`] and register one of their methods, see
//! [`create_lite_custom_struct_op`]. The available parameter kinds are listed in the [`signature`] module.
//!
//! All host calls go through the [`HostApi`](host::HostApi) trait. [`OrtHost`](host::OrtHost) implements it over
//! the runtime's `OrtApi` function table. Errors are reported to the host as statuses, panics in user code included, see
//! [`Error`].
//!
//! ## Cargo Features
//! - `ndarray`:
//!     Conversions between tensor views and `ndarray` array views.
//!     Adds a dependency to the `ndarray` crate.
//!     This feature is enabled by default.
//! - `half`:
//!     Support for half precision floating point numbers using the [`half`](https://docs.rs/half/latest/half/) crate.
//!     Without it [`scalar::f16`] and [`scalar::bf16`] are plain bit containers.
//!     This feature is enabled by default.
//! - `cuda`:
//!     The `&CudaContext` parameter kind, giving a compute function the stream and library handles of the CUDA
//!     execution provider.
//! - `dml`:
//!     The `&DmlContext` parameter kind for the DirectML execution provider.
//!
//! By default the `half` and `ndarray` features are enabled.

#[macro_use]
mod private;
#[cfg(any(feature = "cuda", feature = "dml"))]
pub mod device;
mod error;
pub mod host;
mod op;
pub mod scalar;
pub mod signature;
pub mod tensor;
pub mod util;

pub use error::{Error, ErrorCode, Result};
pub use op::{CustomOp, LiteCustomOp};
pub use ort_lite_op_sys as sys;
pub use signature::CPU_EXECUTION_PROVIDER;

use host::HostApi;
use op::{FunctionOp, StructOp};
use signature::{ComputeFn, ComputeMethod};

/// Create the descriptor of an operator computed by a free function or closure.
///
/// The parameter list of `compute_fn` defines the operator signature, see the [`signature`] module. The function
/// is copied into every kernel the host creates.
///
/// # Errors
///
/// Fails if `op_name` or `execution_provider` contain a NUL byte.
pub fn create_lite_custom_op<H, F, M>(
    host: H,
    op_name: &str,
    execution_provider: &str,
    compute_fn: F,
) -> Result<LiteCustomOp>
where
    H: HostApi + 'static,
    F: ComputeFn<M> + Clone,
    M: 'static,
{
    LiteCustomOp::new(
        host,
        op_name,
        execution_provider,
        FunctionOp::<F, M>::new(compute_fn),
    )
}

/// Create the descriptor of an operator implemented by a [`CustomOp`] type `T`.
///
/// `compute` is a method of `T` taking `&self`, usually `T::compute`. The parameters after the receiver define the
/// operator signature like the ones of a compute function. A `T` is constructed for every kernel the host creates.
///
/// # Errors
///
/// Fails if `op_name` or `execution_provider` contain a NUL byte.
pub fn create_lite_custom_struct_op<H, T, F, M>(
    host: H,
    op_name: &str,
    execution_provider: &str,
    compute: F,
) -> Result<LiteCustomOp>
where
    H: HostApi + 'static,
    T: CustomOp,
    F: ComputeMethod<T, M> + Clone,
    M: 'static,
{
    LiteCustomOp::new(
        host,
        op_name,
        execution_provider,
        StructOp::<T, F, M>::new(compute),
    )
}

#[cfg(test)]
mod tests;
