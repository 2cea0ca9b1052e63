use std::marker::PhantomData;

use super::OpKind;
use crate::host::KernelInfo;
use crate::signature::{Binder, ComputeFn, Signature};
use crate::Result;

/// An operator whose compute function is a free function or closure.
///
/// Each kernel gets its own copy of the function, there is no other per kernel state.
pub(crate) struct FunctionOp<F, M> {
    compute_fn: F,
    _marker: PhantomData<fn() -> M>,
}
impl<F, M> FunctionOp<F, M> {
    pub(crate) fn new(compute_fn: F) -> Self {
        Self {
            compute_fn,
            _marker: PhantomData,
        }
    }
}
impl<F, M> OpKind for FunctionOp<F, M>
where
    F: ComputeFn<M> + Clone,
    M: 'static,
{
    type State = F;

    fn declare(signature: &mut Signature) {
        F::declare(signature);
    }

    fn create_state(&self, _info: &KernelInfo<'_>) -> Result<F> {
        Ok(self.compute_fn.clone())
    }

    fn compute(state: &F, binder: &mut Binder<'_>) -> Result<()> {
        state.invoke(binder)
    }
}
