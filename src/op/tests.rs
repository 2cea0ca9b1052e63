use std::ffi::{c_int, CStr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use ort_lite_op_sys as sys;
use sys::ONNXTensorElementDataType as OnnxType;

use crate::host::{KernelContext, KernelInfo};
use crate::tensor::{ElementType, StrTensor, StringTensor, Tensor};
use crate::tests::{MockContext, MockHost, MockSession, MockStatus, MockValue};
use crate::{
    create_lite_custom_op, create_lite_custom_struct_op, CustomOp, Error, ErrorCode, Result,
    CPU_EXECUTION_PROVIDER,
};

fn filter(x: &Tensor<f32>, z: &mut Tensor<f32>) -> Result<()> {
    let kept = x
        .data()
        .iter()
        .copied()
        .filter(|v| *v > 2.0)
        .collect::<Vec<_>>();
    z.allocate(&[kept.len() as i64])?.copy_from_slice(&kept);
    Ok(())
}

fn add_optional(a: &Tensor<i32>, b: Option<&Tensor<i32>>, out: &mut Tensor<i32>) -> Result<()> {
    let values = match b {
        Some(b) => a.data().iter().zip(b.data()).map(|(x, y)| x + y).collect(),
        None => a.data().to_vec(),
    };
    out.allocate(a.shape()?)?.copy_from_slice(&values);
    Ok(())
}

struct Merge {
    reverse: bool,
}
impl CustomOp for Merge {
    fn new(info: &KernelInfo<'_>) -> Result<Self> {
        if info.output_count()? == 0 {
            return Err(Error::new(ErrorCode::InvalidGraph, "merge needs an output"));
        }
        Ok(Self {
            reverse: info.input_count()? > 2,
        })
    }
}
impl Merge {
    fn compute(&self, strs: &StrTensor, sep: &str, out: Option<&mut StringTensor>) -> Result<()> {
        let mut parts = strs.data();
        if self.reverse {
            parts.reverse();
        }
        let merged = parts.join(sep);
        if let Some(out) = out {
            out.set_string_output(&[merged], &[1])?;
        }
        Ok(())
    }
}

fn status(code: ErrorCode, message: &str) -> MockStatus {
    MockStatus {
        code,
        message: message.to_owned(),
    }
}

#[test]
fn filter_keeps_large_values() {
    let op = create_lite_custom_op(MockHost, "Filter", CPU_EXECUTION_PROVIDER, filter).unwrap();
    assert_eq!(op.input_types(), &[ElementType::Float]);
    assert_eq!(op.output_types(), &[ElementType::Float]);

    let mock = MockContext::new(
        vec![MockValue::tensor(&[4], &[1.0_f32, 2.0, 3.0, 4.0])],
        &[ElementType::Float],
    );
    MockSession::new(&op).run(&mock).unwrap();
    assert_eq!(mock.output::<f32>(0), (vec![2], vec![3.0, 4.0]));
}

#[test]
fn schema_queries() {
    let op = create_lite_custom_op(
        MockHost,
        "AddOptional",
        CPU_EXECUTION_PROVIDER,
        add_optional,
    )
    .unwrap();
    let raw = unsafe { &*op.as_ptr() };
    let ptr = op.as_ptr();
    unsafe {
        assert_eq!(raw.version, sys::ORT_API_VERSION);
        assert_eq!(CStr::from_ptr(raw.GetName.unwrap()(ptr)), c"AddOptional");
        assert_eq!(
            CStr::from_ptr(raw.GetExecutionProviderType.unwrap()(ptr)),
            c"CPUExecutionProvider"
        );
        assert_eq!(raw.GetInputTypeCount.unwrap()(ptr), 2);
        assert_eq!(raw.GetOutputTypeCount.unwrap()(ptr), 1);
        assert_eq!(
            raw.GetInputType.unwrap()(ptr, 1),
            OnnxType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT32
        );
        assert_eq!(
            raw.GetInputType.unwrap()(ptr, 2),
            OnnxType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UNDEFINED
        );
        assert_eq!(
            raw.GetOutputType.unwrap()(ptr, 0),
            OnnxType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT32
        );
        assert_eq!(
            raw.GetOutputType.unwrap()(ptr, 1),
            OnnxType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UNDEFINED
        );
        assert_eq!(
            raw.GetInputCharacteristic.unwrap()(ptr, 0),
            sys::OrtCustomOpInputOutputCharacteristic::INPUT_OUTPUT_OPTIONAL
        );
        assert_eq!(
            raw.GetOutputCharacteristic.unwrap()(ptr, 0),
            sys::OrtCustomOpInputOutputCharacteristic::INPUT_OUTPUT_OPTIONAL
        );
        assert_eq!(
            raw.GetInputMemoryType.unwrap()(ptr, 0),
            sys::OrtMemType::OrtMemTypeDefault
        );
        assert_eq!(raw.GetVariadicInputMinArity.unwrap()(ptr), 0);
        assert_eq!(raw.GetVariadicOutputHomogeneity.unwrap()(ptr), 0);
        assert_eq!(raw.GetStartVersion.unwrap()(ptr), 1);
        assert_eq!(raw.GetEndVersion.unwrap()(ptr), c_int::MAX);
    }
    assert!(raw.CreateKernel.is_none());
    assert!(raw.KernelCompute.is_none());
    assert!(raw.InferOutputShapeFn.is_none());
    assert!(raw.CreateKernelV2.is_some());
    assert!(raw.KernelComputeV2.is_some());
}

#[test]
fn optional_input_absent() {
    let op = create_lite_custom_op(
        MockHost,
        "AddOptional",
        CPU_EXECUTION_PROVIDER,
        add_optional,
    )
    .unwrap();
    assert_eq!(op.input_types(), &[ElementType::Int32, ElementType::Int32]);

    let mock = MockContext::new(
        vec![MockValue::tensor(&[2], &[1_i32, 2])],
        &[ElementType::Int32],
    );
    MockSession::new(&op).run(&mock).unwrap();
    assert_eq!(mock.output::<i32>(0), (vec![2], vec![1, 2]));

    let mock = MockContext::new(
        vec![
            MockValue::tensor(&[2], &[1_i32, 2]),
            MockValue::tensor(&[2], &[10_i32, 20]),
        ],
        &[ElementType::Int32],
    );
    MockSession::new(&op).run(&mock).unwrap();
    assert_eq!(mock.output::<i32>(0), (vec![2], vec![11, 22]));
}

#[test]
fn scalar_rejected_off_cpu() {
    static CALLED: AtomicBool = AtomicBool::new(false);
    fn add_one(x: i32, out: &mut Tensor<i32>) -> Result<()> {
        CALLED.store(true, Ordering::SeqCst);
        out.allocate(&[1])?[0] = x + 1;
        Ok(())
    }
    let op = create_lite_custom_op(MockHost, "AddOne", "CUDAExecutionProvider", add_one).unwrap();
    assert!(op.signature().is_cpu_only());

    let mock = MockContext::new(
        vec![MockValue::tensor(&[1], &[1_i32])],
        &[ElementType::Int32],
    );
    assert_eq!(
        MockSession::new(&op).run(&mock).unwrap_err(),
        status(
            ErrorCode::RuntimeException,
            "scalar input could only be applied to CPU EP"
        )
    );
    assert!(!CALLED.load(Ordering::SeqCst));
    assert!(!mock.is_allocated(0));
}

#[test]
fn struct_op_merges_strings() {
    let op =
        create_lite_custom_struct_op(MockHost, "Merge", CPU_EXECUTION_PROVIDER, Merge::compute)
            .unwrap();
    assert_eq!(
        op.input_types(),
        &[ElementType::String, ElementType::String]
    );
    assert_eq!(op.output_types(), &[ElementType::String]);

    let mock = MockContext::new(
        vec![
            MockValue::strings(&[3], &["a", "b", "c"]),
            MockValue::strings(&[1], &["-"]),
        ],
        &[ElementType::String],
    );
    MockSession::new(&op).run(&mock).unwrap();
    assert_eq!(mock.output_strings(0), (vec![1], vec!["a-b-c".to_owned()]));
}

#[test]
fn struct_op_kernel_is_reused() {
    static CREATED: AtomicUsize = AtomicUsize::new(0);
    struct Counter {
        invocations: AtomicUsize,
    }
    impl CustomOp for Counter {
        fn new(_info: &KernelInfo<'_>) -> Result<Self> {
            CREATED.fetch_add(1, Ordering::SeqCst);
            Ok(Self {
                invocations: AtomicUsize::new(0),
            })
        }
    }
    impl Counter {
        fn compute(&self, out: &mut Tensor<u64>) -> Result<()> {
            let n = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;
            out.allocate(&[1])?[0] = n as u64;
            Ok(())
        }
    }

    let op = create_lite_custom_struct_op(
        MockHost,
        "Counter",
        CPU_EXECUTION_PROVIDER,
        Counter::compute,
    )
    .unwrap();
    let session = MockSession::new(&op);
    let first = MockContext::new(vec![], &[ElementType::UInt64]);
    let second = MockContext::new(vec![], &[ElementType::UInt64]);
    let kernel = session.create_kernel(&first.kernel_info()).unwrap();
    session.compute(kernel, &first).unwrap();
    session.compute(kernel, &second).unwrap();
    session.destroy_kernel(kernel);

    assert_eq!(CREATED.load(Ordering::SeqCst), 1);
    assert_eq!(first.output::<u64>(0), (vec![1], vec![1]));
    assert_eq!(second.output::<u64>(0), (vec![1], vec![2]));
}

#[test]
fn struct_op_constructor_failure() {
    let op =
        create_lite_custom_struct_op(MockHost, "Merge", CPU_EXECUTION_PROVIDER, Merge::compute)
            .unwrap();
    let mock = MockContext::new(
        vec![MockValue::strings(&[1], &["a"]), MockValue::strings(&[1], &["-"])],
        &[],
    );
    assert_eq!(
        MockSession::new(&op)
            .create_kernel(&mock.kernel_info())
            .unwrap_err(),
        status(ErrorCode::InvalidGraph, "merge needs an output")
    );
}

#[test]
fn shape_before_allocate() {
    fn peek(out: &mut Tensor<f32>) -> Result<()> {
        let _ = out.shape()?;
        Ok(())
    }
    let op = create_lite_custom_op(MockHost, "Peek", CPU_EXECUTION_PROVIDER, peek).unwrap();
    let mock = MockContext::new(vec![], &[ElementType::Float]);
    assert_eq!(
        MockSession::new(&op).run(&mock).unwrap_err(),
        status(
            ErrorCode::RuntimeException,
            "tensor shape is not yet initialized",
        )
    );
}

#[test]
fn scalar_from_wrong_shape() {
    fn negate(x: f32, out: &mut Tensor<f32>) -> Result<()> {
        out.allocate(&[1])?[0] = -x;
        Ok(())
    }
    let op = create_lite_custom_op(MockHost, "Negate", CPU_EXECUTION_PROVIDER, negate).unwrap();
    let mock = MockContext::new(
        vec![MockValue::tensor(&[2], &[1.0_f32, 2.0])],
        &[ElementType::Float],
    );
    assert_eq!(
        MockSession::new(&op).run(&mock).unwrap_err(),
        status(
            ErrorCode::RuntimeException,
            "invalid shape while trying to get a scalar from a tensor"
        )
    );
}

#[test]
fn element_type_mismatch() {
    let op = create_lite_custom_op(MockHost, "Filter", CPU_EXECUTION_PROVIDER, filter).unwrap();
    let mock = MockContext::new(
        vec![MockValue::tensor(&[1], &[1_i32])],
        &[ElementType::Float],
    );
    assert_eq!(
        MockSession::new(&op).run(&mock).unwrap_err(),
        status(
            ErrorCode::InvalidArgument,
            "input 0 holds Int32 elements, expected Float",
        )
    );
}

#[test]
fn user_error_passthrough() {
    fn unsupported(_x: &Tensor<u8>) -> Result<()> {
        Err(Error::new(ErrorCode::NotImplemented, "u8 is not supported yet"))
    }
    let op = create_lite_custom_op(MockHost, "Unsupported", CPU_EXECUTION_PROVIDER, unsupported)
        .unwrap();
    let mock = MockContext::new(vec![MockValue::tensor(&[1], &[1_u8])], &[]);
    assert_eq!(
        MockSession::new(&op).run(&mock).unwrap_err(),
        status(ErrorCode::NotImplemented, "u8 is not supported yet")
    );
}

#[test]
fn host_error_passthrough() {
    let op = create_lite_custom_op(MockHost, "Filter", CPU_EXECUTION_PROVIDER, filter).unwrap();
    let mock = MockContext::new(
        vec![MockValue::tensor(&[1], &[3.0_f32])],
        &[ElementType::Float],
    );
    mock.fail_outputs();
    assert_eq!(
        MockSession::new(&op).run(&mock).unwrap_err(),
        status(ErrorCode::EpFail, "out of device memory")
    );
}

#[test]
fn panic_becomes_status() {
    fn boom(_x: &Tensor<f32>) {
        panic!("boom")
    }
    let op = create_lite_custom_op(MockHost, "Boom", CPU_EXECUTION_PROVIDER, boom).unwrap();
    let mock = MockContext::new(vec![MockValue::tensor(&[1], &[1.0_f32])], &[]);
    assert_eq!(
        MockSession::new(&op).run(&mock).unwrap_err(),
        status(ErrorCode::Fail, "KernelCompute panicked: boom")
    );
}

#[test]
fn closure_with_captures() {
    let factor = 3.0_f32;
    let scale = move |x: &Tensor<f32>, y: &mut Tensor<f32>| -> Result<()> {
        let values = x.data().iter().map(|v| v * factor).collect::<Vec<_>>();
        y.allocate(x.shape()?)?.copy_from_slice(&values);
        Ok(())
    };
    let op = create_lite_custom_op(MockHost, "Scale", CPU_EXECUTION_PROVIDER, scale).unwrap();
    let mock = MockContext::new(
        vec![MockValue::tensor(&[2], &[1.0_f32, -2.0])],
        &[ElementType::Float],
    );
    MockSession::new(&op).run(&mock).unwrap();
    assert_eq!(mock.output::<f32>(0), (vec![2], vec![3.0, -6.0]));
}

#[test]
fn allocate_once_per_invocation() {
    fn twice(out: &mut Tensor<i64>) -> Result<()> {
        out.allocate(&[2])?.copy_from_slice(&[1, 2]);
        let again = out.allocate(&[5])?;
        assert_eq!(again, &[1, 2]);
        Ok(())
    }
    let op = create_lite_custom_op(MockHost, "Twice", CPU_EXECUTION_PROVIDER, twice).unwrap();
    let mock = MockContext::new(vec![], &[ElementType::Int64]);
    MockSession::new(&op).run(&mock).unwrap();
    assert_eq!(mock.output::<i64>(0), (vec![2], vec![1, 2]));
    assert_eq!(mock.output_allocations(0), 1);
}

#[test]
fn raw_context_parameter() {
    fn count(ctx: &KernelContext, _x: &Tensor<f32>, out: &mut Tensor<i64>) -> Result<()> {
        out.allocate(&[1])?[0] = ctx.input_count()? as i64;
        Ok(())
    }
    let op = create_lite_custom_op(MockHost, "Count", CPU_EXECUTION_PROVIDER, count).unwrap();
    assert_eq!(op.input_types(), &[ElementType::Float]);
    let mock = MockContext::new(
        vec![MockValue::tensor(&[1], &[1.0_f32])],
        &[ElementType::Int64],
    );
    MockSession::new(&op).run(&mock).unwrap();
    assert_eq!(mock.output::<i64>(0), (vec![1], vec![1]));
}

#[test]
fn invalid_names() {
    let err = create_lite_custom_op(MockHost, "Bad\0Name", CPU_EXECUTION_PROVIDER, filter)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}

#[test]
fn debug_format() {
    let op = create_lite_custom_op(MockHost, "Filter", CPU_EXECUTION_PROVIDER, filter).unwrap();
    assert_eq!(
        format!("{op:?}"),
        "LiteCustomOp { name: \"Filter\", execution_provider: \"CPUExecutionProvider\", inputs: [Float], outputs: [Float] }"
    );
}

#[test]
fn string_round_trip() {
    fn echo(x: &StringTensor, y: &mut StringTensor) -> Result<()> {
        y.set_string_output(x.data(), x.shape()?)
    }
    let op = create_lite_custom_op(MockHost, "Echo", CPU_EXECUTION_PROVIDER, echo).unwrap();
    let strings = ["", "αβ", "x", "日本", "", "z"];
    let mock = MockContext::new(
        vec![MockValue::strings(&[2, 3], &strings)],
        &[ElementType::String],
    );
    MockSession::new(&op).run(&mock).unwrap();
    let (shape, echoed) = mock.output_strings(0);
    assert_eq!(shape, vec![2, 3]);
    assert_eq!(echoed, strings);
}

#[test]
fn vtable_pointer_survives_moves() {
    let op = create_lite_custom_op(MockHost, "Filter", CPU_EXECUTION_PROVIDER, filter).unwrap();
    let ptr = op.as_ptr();
    let ops = vec![op];
    unsafe {
        assert_eq!(CStr::from_ptr((*ptr).GetName.unwrap()(ptr)), c"Filter");
        assert_eq!((*ptr).GetOutputTypeCount.unwrap()(ptr), 1);
        assert_eq!(
            (*ptr).GetInputType.unwrap()(ptr, 0),
            OnnxType::ONNX_TENSOR_ELEMENT_DATA_TYPE_FLOAT
        );
    }
    assert_eq!(ops[0].as_ptr(), ptr);

    let mock = MockContext::new(
        vec![MockValue::tensor(&[2], &[5.0_f32, 1.0])],
        &[ElementType::Float],
    );
    MockSession::new(&ops[0]).run(&mock).unwrap();
    assert_eq!(mock.output::<f32>(0), (vec![1], vec![5.0]));
}
