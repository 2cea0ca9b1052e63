use std::marker::PhantomData;

use super::OpKind;
use crate::host::KernelInfo;
use crate::signature::{Binder, ComputeMethod, Signature};
use crate::Result;

/// A custom operator with per kernel state.
///
/// One instance is constructed for every kernel the host creates, and all the invocations of that kernel call the
/// compute method on it, possibly from several threads. The compute method is registered separately, see
/// [`create_lite_custom_struct_op`](crate::create_lite_custom_struct_op), and its parameter list defines the
/// operator signature like the one of a compute function.
///
/// ```rust,ignore
/// struct Merge {
///     reverse: bool,
/// }
/// impl CustomOp for Merge {
///     fn new(_info: &KernelInfo<'_>) -> Result<Self> {
///         Ok(Self { reverse: false })
///     }
/// }
/// impl Merge {
///     fn compute(&self, strs: &StrTensor, sep: &str, out: Option<&mut StringTensor>) -> Result<()> {
///         ...
///     }
/// }
///
/// let op = create_lite_custom_struct_op(host, "Merge", CPU_EXECUTION_PROVIDER, Merge::compute)?;
/// ```
pub trait CustomOp: Sized + Send + Sync + 'static {
    /// Build the state of a new kernel.
    ///
    /// An error fails the kernel creation and is reported to the host.
    fn new(info: &KernelInfo<'_>) -> Result<Self>;
}

/// The compute method of `T` alongside the `T` instance of one kernel.
pub(crate) struct StructState<T, F> {
    op: T,
    compute: F,
}

pub(crate) struct StructOp<T, F, M> {
    compute: F,
    _marker: PhantomData<fn() -> (T, M)>,
}
impl<T, F, M> StructOp<T, F, M> {
    pub(crate) fn new(compute: F) -> Self {
        Self {
            compute,
            _marker: PhantomData,
        }
    }
}
impl<T, F, M> OpKind for StructOp<T, F, M>
where
    T: CustomOp,
    F: ComputeMethod<T, M> + Clone,
    M: 'static,
{
    type State = StructState<T, F>;

    fn declare(signature: &mut Signature) {
        F::declare(signature);
    }

    fn create_state(&self, info: &KernelInfo<'_>) -> Result<StructState<T, F>> {
        Ok(StructState {
            op: T::new(info)?,
            compute: self.compute.clone(),
        })
    }

    fn compute(state: &StructState<T, F>, binder: &mut Binder<'_>) -> Result<()> {
        state.compute.invoke(&state.op, binder)
    }
}
