//! Deriving an operator signature from the parameter list of a compute function.
//!
//! Every parameter type of a compute function implements [`ComputeArg`]. The trait tells what the parameter
//! contributes to the operator schema ([`ComputeArg::declare`]) and how to build it from the kernel context on every
//! invocation ([`ComputeArg::prepare`]). [`ComputeFn`] and [`ComputeMethod`] are implemented for functions whose
//! parameters all implement [`ComputeArg`], up to 12 parameters.
//!
//! The supported parameter kinds:
//!
//! | Parameter | Schema | Notes |
//! |---|---|---|
//! | `&KernelContext` | nothing | the raw invocation context |
//! | `&Tensor<T>`, `&StringTensor`, `&StrTensor` | one input | |
//! | `Span<'_, T>` | one input | CPU execution provider only, rank 1 |
//! | `T`, `&str`, `String` | one input | CPU execution provider only, a single element |
//! | `&mut Tensor<T>`, `&mut StringTensor` | one output | |
//! | `Option<..>` of any of the above | same as above | `None` when the host passes fewer inputs/outputs |
//!
//! Parameters bind to host indices in order: the i-th input parameter is host input i, and the same for outputs.
//! An absent optional parameter still takes its index.

use crate::host::KernelContext;
use crate::tensor::{Element, ElementType, StrTensor, StringTensor, Tensor};
use crate::util::Span;
use crate::{Error, Result};

/// Name of the CPU execution provider, the only provider that supports span and scalar parameters.
pub const CPU_EXECUTION_PROVIDER: &str = "CPUExecutionProvider";

/// The operator schema derived from a parameter list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    inputs: Vec<ElementType>,
    outputs: Vec<ElementType>,
    cpu_only: bool,
}
impl Signature {
    /// Derive the signature of a compute function.
    pub fn of<F: ComputeFn<M>, M>(_compute_fn: &F) -> Self {
        let mut signature = Signature::default();
        F::declare(&mut signature);
        signature
    }

    /// Derive the signature of the compute method of a struct operator.
    pub fn of_method<T, F: ComputeMethod<T, M>, M>(_compute: &F) -> Self {
        let mut signature = Signature::default();
        F::declare(&mut signature);
        signature
    }

    /// Element types of the inputs, in order.
    pub fn inputs(&self) -> &[ElementType] {
        &self.inputs
    }

    /// Element types of the outputs, in order.
    pub fn outputs(&self) -> &[ElementType] {
        &self.outputs
    }

    /// Whether some parameter is a span or a scalar, which restricts the operator to the CPU execution provider.
    pub fn is_cpu_only(&self) -> bool {
        self.cpu_only
    }

    /// Append an input of the given element type.
    pub fn add_input(&mut self, elem: ElementType) {
        self.inputs.push(elem);
    }

    /// Append an output of the given element type.
    pub fn add_output(&mut self, elem: ElementType) {
        self.outputs.push(elem);
    }

    fn add_cpu_input(&mut self, elem: ElementType) {
        self.add_input(elem);
        self.cpu_only = true;
    }
}

/// Walks the parameter list of one invocation, handing out input and output indices in order.
pub struct Binder<'k> {
    ctx: &'k KernelContext,
    execution_provider: &'k str,
    num_inputs: usize,
    num_outputs: usize,
    ith_input: usize,
    ith_output: usize,
}
impl<'k> Binder<'k> {
    pub(crate) fn new(
        ctx: &'k KernelContext,
        execution_provider: &'k str,
        num_inputs: usize,
        num_outputs: usize,
    ) -> Self {
        Self {
            ctx,
            execution_provider,
            num_inputs,
            num_outputs,
            ith_input: 0,
            ith_output: 0,
        }
    }

    /// The invocation context.
    pub fn context(&self) -> &'k KernelContext {
        self.ctx
    }

    /// The execution provider the kernel was registered for.
    pub fn execution_provider(&self) -> &'k str {
        self.execution_provider
    }

    /// Number of input indices handed out so far.
    pub fn inputs_bound(&self) -> usize {
        self.ith_input
    }

    /// Number of output indices handed out so far.
    pub fn outputs_bound(&self) -> usize {
        self.ith_output
    }

    fn next_input(&mut self) -> usize {
        let index = self.ith_input;
        self.ith_input += 1;
        index
    }

    fn next_output(&mut self) -> usize {
        let index = self.ith_output;
        self.ith_output += 1;
        index
    }

    /// The next input index, or `None` (index still consumed) if the host passed fewer inputs.
    fn next_optional_input(&mut self) -> Option<usize> {
        let present = self.ith_input < self.num_inputs;
        let index = self.next_input();
        present.then_some(index)
    }

    fn next_optional_output(&mut self) -> Option<usize> {
        let present = self.ith_output < self.num_outputs;
        let index = self.next_output();
        present.then_some(index)
    }

    fn require_cpu(&self, kind: &str) -> Result<()> {
        if self.execution_provider == CPU_EXECUTION_PROVIDER {
            Ok(())
        } else {
            Err(Error::runtime(format!(
                "{kind} input could only be applied to CPU EP"
            )))
        }
    }
}

/// A parameter kind of a compute function.
///
/// This trait is sealed, the implementations are listed in the [module documentation](self).
pub trait ComputeArg: Sized {
    /// Per invocation state owning the view the parameter borrows from.
    type State: 'static;
    /// The parameter as handed to the compute function.
    type Item<'s>;

    /// Append what this parameter contributes to the schema.
    fn declare(signature: &mut Signature);

    /// Build the state of this parameter, consuming the next input or output index.
    fn prepare(binder: &mut Binder<'_>) -> Result<Self::State>;

    /// Borrow the parameter out of its state.
    fn item(state: &mut Self::State) -> Self::Item<'_>;

    private_decl! {}
}

/// Shorthand for the parameter type handed to a compute function.
pub type ArgItem<'s, P> = <P as ComputeArg>::Item<'s>;

impl ComputeArg for &KernelContext {
    type State = KernelContext;
    type Item<'s> = &'s KernelContext;

    fn declare(_signature: &mut Signature) {}
    fn prepare(binder: &mut Binder<'_>) -> Result<KernelContext> {
        Ok(binder.context().reborrow())
    }
    fn item(state: &mut KernelContext) -> &KernelContext {
        state
    }
    private_impl! {}
}

impl<T: Element> ComputeArg for &Tensor<T> {
    type State = Tensor<T>;
    type Item<'s> = &'s Tensor<T>;

    fn declare(signature: &mut Signature) {
        signature.add_input(T::TYPE);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<Tensor<T>> {
        let index = binder.next_input();
        Tensor::new_input(binder.context(), index)
    }
    fn item(state: &mut Tensor<T>) -> &Tensor<T> {
        state
    }
    private_impl! {}
}

impl<T: Element> ComputeArg for Option<&Tensor<T>> {
    type State = Option<Tensor<T>>;
    type Item<'s> = Option<&'s Tensor<T>>;

    fn declare(signature: &mut Signature) {
        signature.add_input(T::TYPE);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<Option<Tensor<T>>> {
        binder
            .next_optional_input()
            .map(|index| Tensor::new_input(binder.context(), index))
            .transpose()
    }
    fn item(state: &mut Option<Tensor<T>>) -> Option<&Tensor<T>> {
        state.as_ref()
    }
    private_impl! {}
}

impl<T: Element> ComputeArg for &mut Tensor<T> {
    type State = Tensor<T>;
    type Item<'s> = &'s mut Tensor<T>;

    fn declare(signature: &mut Signature) {
        signature.add_output(T::TYPE);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<Tensor<T>> {
        let index = binder.next_output();
        Ok(Tensor::new_output(binder.context(), index))
    }
    fn item(state: &mut Tensor<T>) -> &mut Tensor<T> {
        state
    }
    private_impl! {}
}

impl<T: Element> ComputeArg for Option<&mut Tensor<T>> {
    type State = Option<Tensor<T>>;
    type Item<'s> = Option<&'s mut Tensor<T>>;

    fn declare(signature: &mut Signature) {
        signature.add_output(T::TYPE);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<Option<Tensor<T>>> {
        Ok(binder
            .next_optional_output()
            .map(|index| Tensor::new_output(binder.context(), index)))
    }
    fn item(state: &mut Option<Tensor<T>>) -> Option<&mut Tensor<T>> {
        state.as_mut()
    }
    private_impl! {}
}

fn span_input<T: Element>(binder: &Binder<'_>, index: usize) -> Result<Tensor<T>> {
    binder.require_cpu("span")?;
    let tensor = Tensor::new_input(binder.context(), index)?;
    tensor.as_span()?;
    Ok(tensor)
}

impl<T: Element> ComputeArg for Span<'_, T> {
    type State = Tensor<T>;
    type Item<'s> = Span<'s, T>;

    fn declare(signature: &mut Signature) {
        signature.add_cpu_input(T::TYPE);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<Tensor<T>> {
        let index = binder.next_input();
        span_input(binder, index)
    }
    fn item(state: &mut Tensor<T>) -> Span<'_, T> {
        Span::from_slice(state.data())
    }
    private_impl! {}
}

impl<T: Element> ComputeArg for Option<Span<'_, T>> {
    type State = Option<Tensor<T>>;
    type Item<'s> = Option<Span<'s, T>>;

    fn declare(signature: &mut Signature) {
        signature.add_cpu_input(T::TYPE);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<Option<Tensor<T>>> {
        match binder.next_optional_input() {
            Some(index) => span_input(binder, index).map(Some),
            None => Ok(None),
        }
    }
    fn item(state: &mut Option<Tensor<T>>) -> Option<Span<'_, T>> {
        state.as_ref().map(|tensor| Span::from_slice(tensor.data()))
    }
    private_impl! {}
}

fn scalar_input<T: Element>(binder: &Binder<'_>, index: usize) -> Result<T> {
    binder.require_cpu("scalar")?;
    Tensor::<T>::new_input(binder.context(), index)?.as_scalar()
}

macro_rules! impl_scalar_arg {
    ($($element:ty),*) => {$(
        impl ComputeArg for $element {
            type State = $element;
            type Item<'s> = $element;

            fn declare(signature: &mut Signature) {
                signature.add_cpu_input(<$element as Element>::TYPE);
            }
            fn prepare(binder: &mut Binder<'_>) -> Result<$element> {
                let index = binder.next_input();
                scalar_input(binder, index)
            }
            fn item(state: &mut $element) -> $element {
                *state
            }
            private_impl! {}
        }

        impl ComputeArg for Option<$element> {
            type State = Option<$element>;
            type Item<'s> = Option<$element>;

            fn declare(signature: &mut Signature) {
                signature.add_cpu_input(<$element as Element>::TYPE);
            }
            fn prepare(binder: &mut Binder<'_>) -> Result<Option<$element>> {
                match binder.next_optional_input() {
                    Some(index) => scalar_input(binder, index).map(Some),
                    None => Ok(None),
                }
            }
            fn item(state: &mut Option<$element>) -> Option<$element> {
                *state
            }
            private_impl! {}
        }
    )*};
}
impl_scalar_arg!(
    bool,
    f32,
    f64,
    crate::scalar::f16,
    crate::scalar::bf16,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64
);

impl ComputeArg for &StringTensor {
    type State = StringTensor;
    type Item<'s> = &'s StringTensor;

    fn declare(signature: &mut Signature) {
        signature.add_input(ElementType::String);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<StringTensor> {
        let index = binder.next_input();
        StringTensor::new_input(binder.context(), index)
    }
    fn item(state: &mut StringTensor) -> &StringTensor {
        state
    }
    private_impl! {}
}

impl ComputeArg for Option<&StringTensor> {
    type State = Option<StringTensor>;
    type Item<'s> = Option<&'s StringTensor>;

    fn declare(signature: &mut Signature) {
        signature.add_input(ElementType::String);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<Option<StringTensor>> {
        binder
            .next_optional_input()
            .map(|index| StringTensor::new_input(binder.context(), index))
            .transpose()
    }
    fn item(state: &mut Option<StringTensor>) -> Option<&StringTensor> {
        state.as_ref()
    }
    private_impl! {}
}

impl ComputeArg for &mut StringTensor {
    type State = StringTensor;
    type Item<'s> = &'s mut StringTensor;

    fn declare(signature: &mut Signature) {
        signature.add_output(ElementType::String);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<StringTensor> {
        let index = binder.next_output();
        Ok(StringTensor::new_output(binder.context(), index))
    }
    fn item(state: &mut StringTensor) -> &mut StringTensor {
        state
    }
    private_impl! {}
}

impl ComputeArg for Option<&mut StringTensor> {
    type State = Option<StringTensor>;
    type Item<'s> = Option<&'s mut StringTensor>;

    fn declare(signature: &mut Signature) {
        signature.add_output(ElementType::String);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<Option<StringTensor>> {
        Ok(binder
            .next_optional_output()
            .map(|index| StringTensor::new_output(binder.context(), index)))
    }
    fn item(state: &mut Option<StringTensor>) -> Option<&mut StringTensor> {
        state.as_mut()
    }
    private_impl! {}
}

impl ComputeArg for &StrTensor {
    type State = StrTensor;
    type Item<'s> = &'s StrTensor;

    fn declare(signature: &mut Signature) {
        signature.add_input(ElementType::String);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<StrTensor> {
        let index = binder.next_input();
        StrTensor::new_input(binder.context(), index)
    }
    fn item(state: &mut StrTensor) -> &StrTensor {
        state
    }
    private_impl! {}
}

impl ComputeArg for Option<&StrTensor> {
    type State = Option<StrTensor>;
    type Item<'s> = Option<&'s StrTensor>;

    fn declare(signature: &mut Signature) {
        signature.add_input(ElementType::String);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<Option<StrTensor>> {
        binder
            .next_optional_input()
            .map(|index| StrTensor::new_input(binder.context(), index))
            .transpose()
    }
    fn item(state: &mut Option<StrTensor>) -> Option<&StrTensor> {
        state.as_ref()
    }
    private_impl! {}
}

fn str_scalar_input(binder: &Binder<'_>, index: usize) -> Result<StrTensor> {
    binder.require_cpu("scalar")?;
    let tensor = StrTensor::new_input(binder.context(), index)?;
    tensor.as_scalar()?;
    Ok(tensor)
}

impl ComputeArg for &str {
    type State = StrTensor;
    type Item<'s> = &'s str;

    fn declare(signature: &mut Signature) {
        signature.add_cpu_input(ElementType::String);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<StrTensor> {
        let index = binder.next_input();
        str_scalar_input(binder, index)
    }
    fn item(state: &mut StrTensor) -> &str {
        // checked to hold a single string in `prepare`
        state.get(0).unwrap_or_default()
    }
    private_impl! {}
}

impl ComputeArg for Option<&str> {
    type State = Option<StrTensor>;
    type Item<'s> = Option<&'s str>;

    fn declare(signature: &mut Signature) {
        signature.add_cpu_input(ElementType::String);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<Option<StrTensor>> {
        match binder.next_optional_input() {
            Some(index) => str_scalar_input(binder, index).map(Some),
            None => Ok(None),
        }
    }
    fn item(state: &mut Option<StrTensor>) -> Option<&str> {
        state.as_ref().and_then(|tensor| tensor.get(0))
    }
    private_impl! {}
}

fn string_scalar_input(binder: &Binder<'_>, index: usize) -> Result<String> {
    binder.require_cpu("scalar")?;
    let tensor = StringTensor::new_input(binder.context(), index)?;
    tensor.as_scalar().map(str::to_owned)
}

impl ComputeArg for String {
    type State = Option<String>;
    type Item<'s> = String;

    fn declare(signature: &mut Signature) {
        signature.add_cpu_input(ElementType::String);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<Option<String>> {
        let index = binder.next_input();
        string_scalar_input(binder, index).map(Some)
    }
    fn item(state: &mut Option<String>) -> String {
        state.take().unwrap_or_default()
    }
    private_impl! {}
}

impl ComputeArg for Option<String> {
    type State = Option<String>;
    type Item<'s> = Option<String>;

    fn declare(signature: &mut Signature) {
        signature.add_cpu_input(ElementType::String);
    }
    fn prepare(binder: &mut Binder<'_>) -> Result<Option<String>> {
        match binder.next_optional_input() {
            Some(index) => string_scalar_input(binder, index).map(Some),
            None => Ok(None),
        }
    }
    fn item(state: &mut Option<String>) -> Option<String> {
        state.take()
    }
    private_impl! {}
}

/// The return type of a compute function, `()` or `Result<(), E>`.
pub trait ComputeOutput {
    /// Convert into the binding layer result.
    fn into_result(self) -> Result<()>;
}
impl ComputeOutput for () {
    fn into_result(self) -> Result<()> {
        Ok(())
    }
}
impl<E: Into<Error>> ComputeOutput for Result<(), E> {
    fn into_result(self) -> Result<()> {
        self.map_err(Into::into)
    }
}

/// A free function usable as the compute function of an operator.
///
/// `Marker` is the function pointer type of the parameter list, it only exists to keep the implementations for
/// different arities apart and is always inferred.
pub trait ComputeFn<Marker>: Send + Sync + 'static {
    /// Append the schema of all parameters, in order.
    fn declare(signature: &mut Signature);

    /// Build all parameters from the invocation and call the function.
    fn invoke(&self, binder: &mut Binder<'_>) -> Result<()>;
}

/// A compute method `fn(&T, ..)` of a struct operator `T`.
pub trait ComputeMethod<T, Marker>: Send + Sync + 'static {
    /// Append the schema of all parameters after the receiver, in order.
    fn declare(signature: &mut Signature);

    /// Build all parameters from the invocation and call the method on `op`.
    fn invoke(&self, op: &T, binder: &mut Binder<'_>) -> Result<()>;
}

macro_rules! impl_compute_fn {
    ($($param:ident),*) => {
        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<Func, Out, $($param),*> ComputeFn<fn($($param,)*) -> Out> for Func
        where
            Func: Send + Sync + 'static,
            Func: Fn($($param),*) -> Out + Fn($(ArgItem<'_, $param>),*) -> Out,
            Out: ComputeOutput,
            $($param: ComputeArg,)*
        {
            fn declare(signature: &mut Signature) {
                $($param::declare(signature);)*
            }

            fn invoke(&self, binder: &mut Binder<'_>) -> Result<()> {
                // Rust can not infer the higher ranked parameter types of `self` directly.
                #[allow(clippy::too_many_arguments)]
                fn call_inner<Out, $($param,)*>(
                    f: impl Fn($($param,)*) -> Out,
                    $($param: $param,)*
                ) -> Out {
                    f($($param,)*)
                }
                $(let mut $param = $param::prepare(binder)?;)*
                call_inner(self, $($param::item(&mut $param),)*).into_result()
            }
        }

        #[allow(non_snake_case, unused_variables, unused_mut)]
        impl<Func, T, Out, $($param),*> ComputeMethod<T, fn($($param,)*) -> Out> for Func
        where
            Func: Send + Sync + 'static,
            Func: Fn(&T, $($param),*) -> Out + Fn(&T, $(ArgItem<'_, $param>),*) -> Out,
            Out: ComputeOutput,
            $($param: ComputeArg,)*
        {
            fn declare(signature: &mut Signature) {
                $($param::declare(signature);)*
            }

            fn invoke(&self, op: &T, binder: &mut Binder<'_>) -> Result<()> {
                #[allow(clippy::too_many_arguments)]
                fn call_inner<T, Out, $($param,)*>(
                    f: impl Fn(&T, $($param,)*) -> Out,
                    op: &T,
                    $($param: $param,)*
                ) -> Out {
                    f(op, $($param,)*)
                }
                $(let mut $param = $param::prepare(binder)?;)*
                call_inner(self, op, $($param::item(&mut $param),)*).into_result()
            }
        }
    };
}
impl_compute_fn!();
impl_compute_fn!(P0);
impl_compute_fn!(P0, P1);
impl_compute_fn!(P0, P1, P2);
impl_compute_fn!(P0, P1, P2, P3);
impl_compute_fn!(P0, P1, P2, P3, P4);
impl_compute_fn!(P0, P1, P2, P3, P4, P5);
impl_compute_fn!(P0, P1, P2, P3, P4, P5, P6);
impl_compute_fn!(P0, P1, P2, P3, P4, P5, P6, P7);
impl_compute_fn!(P0, P1, P2, P3, P4, P5, P6, P7, P8);
impl_compute_fn!(P0, P1, P2, P3, P4, P5, P6, P7, P8, P9);
impl_compute_fn!(P0, P1, P2, P3, P4, P5, P6, P7, P8, P9, P10);
impl_compute_fn!(P0, P1, P2, P3, P4, P5, P6, P7, P8, P9, P10, P11);
