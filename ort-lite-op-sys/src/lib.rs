//! Unsafe declarations of the ONNX Runtime custom operator C ABI.
//!
//! Provides the raw layout of the `OrtCustomOp` vtable, the enums and codes exchanged across it and the opaque
//! handle types the host passes to operator callbacks.
//! For the common use case, it is recommended to use the high-level API provided by the `ort-lite-op` crate, where
//! a more detailed documentation can be found.
//!
//! The declarations are written by hand and follow `onnxruntime_c_api.h` of ONNX Runtime 1.17. Only the part of the
//! ABI an operator plugin touches is declared. The `OrtApi` function table is laid out up to its last entry a kernel
//! calls, with the entries in between kept as untyped slots.
//!
//! ## Cargo Features
//! By default all features are disabled.
//! - `cuda`: resource ids of the CUDA execution provider kernel context.
//! - `dml`: resource ids of the DirectML execution provider kernel context.

#![allow(non_snake_case, non_camel_case_types)]

use std::ffi::{c_char, c_int, c_void};

/// The `OrtCustomOp::version` reported by descriptors built against these declarations.
///
/// The host reads only the vtable slots that exist in this API version.
pub const ORT_API_VERSION: u32 = 17;

macro_rules! opaque {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            pub struct $name {
                _unused: [u8; 0],
                _marker: core::marker::PhantomData<(*mut u8, core::marker::PhantomPinned)>,
            }
        )*
    };
}
opaque! {
    /// Per invocation kernel context.
    OrtKernelContext;
    /// Kernel creation information.
    OrtKernelInfo;
    /// A value (tensor) owned by the host.
    OrtValue;
    /// An error status allocated by the host.
    OrtStatus;
    /// Shape inference context.
    OrtShapeInferContext;
    /// Element type and shape of a tensor value.
    OrtTensorTypeAndShapeInfo;
}

/// A status pointer, null means success.
pub type OrtStatusPtr = *mut OrtStatus;

/// Element type codes of tensors.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ONNXTensorElementDataType {
    ONNX_TENSOR_ELEMENT_DATA_TYPE_UNDEFINED = 0,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_FLOAT = 1,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT8 = 2,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_INT8 = 3,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT16 = 4,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_INT16 = 5,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_INT32 = 6,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_INT64 = 7,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_STRING = 8,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_BOOL = 9,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_FLOAT16 = 10,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_DOUBLE = 11,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT32 = 12,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT64 = 13,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_COMPLEX64 = 14,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_COMPLEX128 = 15,
    ONNX_TENSOR_ELEMENT_DATA_TYPE_BFLOAT16 = 16,
}

/// Error codes carried by an [`OrtStatus`].
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OrtErrorCode {
    ORT_OK = 0,
    ORT_FAIL = 1,
    ORT_INVALID_ARGUMENT = 2,
    ORT_NO_SUCHFILE = 3,
    ORT_NO_MODEL = 4,
    ORT_ENGINE_ERROR = 5,
    ORT_RUNTIME_EXCEPTION = 6,
    ORT_INVALID_PROTOBUF = 7,
    ORT_MODEL_LOADED = 8,
    ORT_NOT_IMPLEMENTED = 9,
    ORT_INVALID_GRAPH = 10,
    ORT_EP_FAIL = 11,
}

/// Whether an operator input or output must be present.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OrtCustomOpInputOutputCharacteristic {
    INPUT_OUTPUT_REQUIRED = 0,
    INPUT_OUTPUT_OPTIONAL = 1,
    INPUT_OUTPUT_VARIADIC = 2,
}

/// Memory placement of an operator input.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OrtMemType {
    OrtMemTypeCPUInput = -2,
    OrtMemTypeCPUOutput = -1,
    OrtMemTypeDefault = 0,
}

/// The custom operator vtable.
///
/// The host keeps a pointer to this struct for the lifetime of the session and calls back through it.
/// Field order is part of the ABI.
#[repr(C)]
pub struct OrtCustomOp {
    pub version: u32,
    pub CreateKernel: Option<
        unsafe extern "system" fn(
            op: *const OrtCustomOp,
            api: *const OrtApi,
            info: *const OrtKernelInfo,
        ) -> *mut c_void,
    >,
    pub GetName: Option<unsafe extern "system" fn(op: *const OrtCustomOp) -> *const c_char>,
    pub GetExecutionProviderType:
        Option<unsafe extern "system" fn(op: *const OrtCustomOp) -> *const c_char>,
    pub GetInputType: Option<
        unsafe extern "system" fn(
            op: *const OrtCustomOp,
            index: usize,
        ) -> ONNXTensorElementDataType,
    >,
    pub GetInputTypeCount: Option<unsafe extern "system" fn(op: *const OrtCustomOp) -> usize>,
    pub GetOutputType: Option<
        unsafe extern "system" fn(
            op: *const OrtCustomOp,
            index: usize,
        ) -> ONNXTensorElementDataType,
    >,
    pub GetOutputTypeCount: Option<unsafe extern "system" fn(op: *const OrtCustomOp) -> usize>,
    pub KernelCompute:
        Option<unsafe extern "system" fn(op_kernel: *mut c_void, context: *mut OrtKernelContext)>,
    pub KernelDestroy: Option<unsafe extern "system" fn(op_kernel: *mut c_void)>,
    pub GetInputCharacteristic: Option<
        unsafe extern "system" fn(
            op: *const OrtCustomOp,
            index: usize,
        ) -> OrtCustomOpInputOutputCharacteristic,
    >,
    pub GetOutputCharacteristic: Option<
        unsafe extern "system" fn(
            op: *const OrtCustomOp,
            index: usize,
        ) -> OrtCustomOpInputOutputCharacteristic,
    >,
    pub GetInputMemoryType:
        Option<unsafe extern "system" fn(op: *const OrtCustomOp, index: usize) -> OrtMemType>,
    pub GetVariadicInputMinArity:
        Option<unsafe extern "system" fn(op: *const OrtCustomOp) -> c_int>,
    pub GetVariadicInputHomogeneity:
        Option<unsafe extern "system" fn(op: *const OrtCustomOp) -> c_int>,
    pub GetVariadicOutputMinArity:
        Option<unsafe extern "system" fn(op: *const OrtCustomOp) -> c_int>,
    pub GetVariadicOutputHomogeneity:
        Option<unsafe extern "system" fn(op: *const OrtCustomOp) -> c_int>,
    pub CreateKernelV2: Option<
        unsafe extern "system" fn(
            op: *const OrtCustomOp,
            api: *const OrtApi,
            info: *const OrtKernelInfo,
            kernel: *mut *mut c_void,
        ) -> OrtStatusPtr,
    >,
    pub KernelComputeV2: Option<
        unsafe extern "system" fn(
            op_kernel: *mut c_void,
            context: *mut OrtKernelContext,
        ) -> OrtStatusPtr,
    >,
    pub InferOutputShapeFn: Option<
        unsafe extern "system" fn(
            op: *const OrtCustomOp,
            context: *mut OrtShapeInferContext,
        ) -> OrtStatusPtr,
    >,
    pub GetStartVersion: Option<unsafe extern "system" fn(op: *const OrtCustomOp) -> c_int>,
    pub GetEndVersion: Option<unsafe extern "system" fn(op: *const OrtCustomOp) -> c_int>,
}

/// An `OrtApi` entry the binding layer never calls.
///
/// Every entry of the table is a function pointer, so an untyped slot keeps the offsets of the typed ones.
pub type OrtApiSlot = Option<unsafe extern "system" fn()>;

/// Entry point of the host API, passed to a custom op library's `RegisterCustomOps`.
#[repr(C)]
pub struct OrtApiBase {
    pub GetApi: Option<unsafe extern "system" fn(version: u32) -> *const OrtApi>,
    pub GetVersionString: Option<unsafe extern "system" fn() -> *const c_char>,
}

/// The host API function table, up to `KernelContext_GetResource`.
///
/// The host owns the table and never frees it. Later API versions only append entries, so a table of a newer host
/// can be read through this declaration.
#[repr(C)]
pub struct OrtApi {
    pub CreateStatus:
        Option<unsafe extern "system" fn(code: OrtErrorCode, msg: *const c_char) -> *mut OrtStatus>,
    pub GetErrorCode: Option<unsafe extern "system" fn(status: *const OrtStatus) -> OrtErrorCode>,
    pub GetErrorMessage:
        Option<unsafe extern "system" fn(status: *const OrtStatus) -> *const c_char>,
    pub CreateEnv: OrtApiSlot,
    pub CreateEnvWithCustomLogger: OrtApiSlot,
    pub EnableTelemetryEvents: OrtApiSlot,
    pub DisableTelemetryEvents: OrtApiSlot,
    pub CreateSession: OrtApiSlot,
    pub CreateSessionFromArray: OrtApiSlot,
    pub Run: OrtApiSlot,
    pub CreateSessionOptions: OrtApiSlot,
    pub SetOptimizedModelFilePath: OrtApiSlot,
    pub CloneSessionOptions: OrtApiSlot,
    pub SetSessionExecutionMode: OrtApiSlot,
    pub EnableProfiling: OrtApiSlot,
    pub DisableProfiling: OrtApiSlot,
    pub EnableMemPattern: OrtApiSlot,
    pub DisableMemPattern: OrtApiSlot,
    pub EnableCpuMemArena: OrtApiSlot,
    pub DisableCpuMemArena: OrtApiSlot,
    pub SetSessionLogId: OrtApiSlot,
    pub SetSessionLogVerbosityLevel: OrtApiSlot,
    pub SetSessionLogSeverityLevel: OrtApiSlot,
    pub SetSessionGraphOptimizationLevel: OrtApiSlot,
    pub SetIntraOpNumThreads: OrtApiSlot,
    pub SetInterOpNumThreads: OrtApiSlot,
    pub CreateCustomOpDomain: OrtApiSlot,
    pub CustomOpDomain_Add: OrtApiSlot,
    pub AddCustomOpDomain: OrtApiSlot,
    pub RegisterCustomOpsLibrary: OrtApiSlot,
    pub SessionGetInputCount: OrtApiSlot,
    pub SessionGetOutputCount: OrtApiSlot,
    pub SessionGetOverridableInitializerCount: OrtApiSlot,
    pub SessionGetInputTypeInfo: OrtApiSlot,
    pub SessionGetOutputTypeInfo: OrtApiSlot,
    pub SessionGetOverridableInitializerTypeInfo: OrtApiSlot,
    pub SessionGetInputName: OrtApiSlot,
    pub SessionGetOutputName: OrtApiSlot,
    pub SessionGetOverridableInitializerName: OrtApiSlot,
    pub CreateRunOptions: OrtApiSlot,
    pub RunOptionsSetRunLogVerbosityLevel: OrtApiSlot,
    pub RunOptionsSetRunLogSeverityLevel: OrtApiSlot,
    pub RunOptionsSetRunTag: OrtApiSlot,
    pub RunOptionsGetRunLogVerbosityLevel: OrtApiSlot,
    pub RunOptionsGetRunLogSeverityLevel: OrtApiSlot,
    pub RunOptionsGetRunTag: OrtApiSlot,
    pub RunOptionsSetTerminate: OrtApiSlot,
    pub RunOptionsUnsetTerminate: OrtApiSlot,
    pub CreateTensorAsOrtValue: OrtApiSlot,
    pub CreateTensorWithDataAsOrtValue: OrtApiSlot,
    pub IsTensor: OrtApiSlot,
    pub GetTensorMutableData: Option<
        unsafe extern "system" fn(value: *mut OrtValue, out: *mut *mut c_void) -> OrtStatusPtr,
    >,
    pub FillStringTensor: Option<
        unsafe extern "system" fn(
            value: *mut OrtValue,
            s: *const *const c_char,
            s_len: usize,
        ) -> OrtStatusPtr,
    >,
    pub GetStringTensorDataLength:
        Option<unsafe extern "system" fn(value: *const OrtValue, len: *mut usize) -> OrtStatusPtr>,
    pub GetStringTensorContent: Option<
        unsafe extern "system" fn(
            value: *const OrtValue,
            s: *mut c_void,
            s_len: usize,
            offsets: *mut usize,
            offsets_len: usize,
        ) -> OrtStatusPtr,
    >,
    pub CastTypeInfoToTensorInfo: OrtApiSlot,
    pub GetOnnxTypeFromTypeInfo: OrtApiSlot,
    pub CreateTensorTypeAndShapeInfo: OrtApiSlot,
    pub SetTensorElementType: OrtApiSlot,
    pub SetDimensions: OrtApiSlot,
    pub GetTensorElementType: Option<
        unsafe extern "system" fn(
            info: *const OrtTensorTypeAndShapeInfo,
            out: *mut ONNXTensorElementDataType,
        ) -> OrtStatusPtr,
    >,
    pub GetDimensionsCount: Option<
        unsafe extern "system" fn(
            info: *const OrtTensorTypeAndShapeInfo,
            out: *mut usize,
        ) -> OrtStatusPtr,
    >,
    pub GetDimensions: Option<
        unsafe extern "system" fn(
            info: *const OrtTensorTypeAndShapeInfo,
            dim_values: *mut i64,
            dim_values_length: usize,
        ) -> OrtStatusPtr,
    >,
    pub GetSymbolicDimensions: OrtApiSlot,
    pub GetTensorShapeElementCount: OrtApiSlot,
    pub GetTensorTypeAndShape: Option<
        unsafe extern "system" fn(
            value: *const OrtValue,
            out: *mut *mut OrtTensorTypeAndShapeInfo,
        ) -> OrtStatusPtr,
    >,
    pub GetTypeInfo: OrtApiSlot,
    pub GetValueType: OrtApiSlot,
    pub CreateMemoryInfo: OrtApiSlot,
    pub CreateCpuMemoryInfo: OrtApiSlot,
    pub CompareMemoryInfo: OrtApiSlot,
    pub MemoryInfoGetName: OrtApiSlot,
    pub MemoryInfoGetId: OrtApiSlot,
    pub MemoryInfoGetMemType: OrtApiSlot,
    pub MemoryInfoGetType: OrtApiSlot,
    pub AllocatorAlloc: OrtApiSlot,
    pub AllocatorFree: OrtApiSlot,
    pub AllocatorGetInfo: OrtApiSlot,
    pub GetAllocatorWithDefaultOptions: OrtApiSlot,
    pub AddFreeDimensionOverride: OrtApiSlot,
    pub GetValue: OrtApiSlot,
    pub GetValueCount: OrtApiSlot,
    pub CreateValue: OrtApiSlot,
    pub CreateOpaqueValue: OrtApiSlot,
    pub GetOpaqueValue: OrtApiSlot,
    pub KernelInfoGetAttribute_float: OrtApiSlot,
    pub KernelInfoGetAttribute_int64: OrtApiSlot,
    pub KernelInfoGetAttribute_string: OrtApiSlot,
    pub KernelContext_GetInputCount: Option<
        unsafe extern "system" fn(
            context: *const OrtKernelContext,
            out: *mut usize,
        ) -> OrtStatusPtr,
    >,
    pub KernelContext_GetOutputCount: Option<
        unsafe extern "system" fn(
            context: *const OrtKernelContext,
            out: *mut usize,
        ) -> OrtStatusPtr,
    >,
    pub KernelContext_GetInput: Option<
        unsafe extern "system" fn(
            context: *const OrtKernelContext,
            index: usize,
            out: *mut *const OrtValue,
        ) -> OrtStatusPtr,
    >,
    pub KernelContext_GetOutput: Option<
        unsafe extern "system" fn(
            context: *mut OrtKernelContext,
            index: usize,
            dim_values: *const i64,
            dim_count: usize,
            out: *mut *mut OrtValue,
        ) -> OrtStatusPtr,
    >,
    pub ReleaseEnv: OrtApiSlot,
    pub ReleaseStatus: Option<unsafe extern "system" fn(input: *mut OrtStatus)>,
    pub ReleaseMemoryInfo: OrtApiSlot,
    pub ReleaseSession: OrtApiSlot,
    pub ReleaseValue: OrtApiSlot,
    pub ReleaseRunOptions: OrtApiSlot,
    pub ReleaseTypeInfo: OrtApiSlot,
    pub ReleaseTensorTypeAndShapeInfo:
        Option<unsafe extern "system" fn(input: *mut OrtTensorTypeAndShapeInfo)>,
    pub ReleaseSessionOptions: OrtApiSlot,
    pub ReleaseCustomOpDomain: OrtApiSlot,
    pub GetDenotationFromTypeInfo: OrtApiSlot,
    pub CastTypeInfoToMapTypeInfo: OrtApiSlot,
    pub CastTypeInfoToSequenceTypeInfo: OrtApiSlot,
    pub GetMapKeyType: OrtApiSlot,
    pub GetMapValueType: OrtApiSlot,
    pub GetSequenceElementType: OrtApiSlot,
    pub ReleaseMapTypeInfo: OrtApiSlot,
    pub ReleaseSequenceTypeInfo: OrtApiSlot,
    pub SessionEndProfiling: OrtApiSlot,
    pub SessionGetModelMetadata: OrtApiSlot,
    pub ModelMetadataGetProducerName: OrtApiSlot,
    pub ModelMetadataGetGraphName: OrtApiSlot,
    pub ModelMetadataGetDomain: OrtApiSlot,
    pub ModelMetadataGetDescription: OrtApiSlot,
    pub ModelMetadataLookupCustomMetadataMap: OrtApiSlot,
    pub ModelMetadataGetVersion: OrtApiSlot,
    pub ReleaseModelMetadata: OrtApiSlot,
    pub CreateEnvWithGlobalThreadPools: OrtApiSlot,
    pub DisablePerSessionThreads: OrtApiSlot,
    pub CreateThreadingOptions: OrtApiSlot,
    pub ReleaseThreadingOptions: OrtApiSlot,
    pub ModelMetadataGetCustomMetadataMapKeys: OrtApiSlot,
    pub AddFreeDimensionOverrideByName: OrtApiSlot,
    pub GetAvailableProviders: OrtApiSlot,
    pub ReleaseAvailableProviders: OrtApiSlot,
    pub GetStringTensorElementLength: OrtApiSlot,
    pub GetStringTensorElement: OrtApiSlot,
    pub FillStringTensorElement: OrtApiSlot,
    pub AddSessionConfigEntry: OrtApiSlot,
    pub CreateAllocator: OrtApiSlot,
    pub ReleaseAllocator: OrtApiSlot,
    pub RunWithBinding: OrtApiSlot,
    pub CreateIoBinding: OrtApiSlot,
    pub ReleaseIoBinding: OrtApiSlot,
    pub BindInput: OrtApiSlot,
    pub BindOutput: OrtApiSlot,
    pub BindOutputToDevice: OrtApiSlot,
    pub GetBoundOutputNames: OrtApiSlot,
    pub GetBoundOutputValues: OrtApiSlot,
    pub ClearBoundInputs: OrtApiSlot,
    pub ClearBoundOutputs: OrtApiSlot,
    pub TensorAt: OrtApiSlot,
    pub CreateAndRegisterAllocator: OrtApiSlot,
    pub SetLanguageProjection: OrtApiSlot,
    pub SessionGetProfilingStartTimeNs: OrtApiSlot,
    pub SetGlobalIntraOpNumThreads: OrtApiSlot,
    pub SetGlobalInterOpNumThreads: OrtApiSlot,
    pub SetGlobalSpinControl: OrtApiSlot,
    pub AddInitializer: OrtApiSlot,
    pub CreateEnvWithCustomLoggerAndGlobalThreadPools: OrtApiSlot,
    pub SessionOptionsAppendExecutionProvider_CUDA: OrtApiSlot,
    pub SessionOptionsAppendExecutionProvider_ROCM: OrtApiSlot,
    pub SessionOptionsAppendExecutionProvider_OpenVINO: OrtApiSlot,
    pub SetGlobalDenormalAsZero: OrtApiSlot,
    pub CreateArenaCfg: OrtApiSlot,
    pub ReleaseArenaCfg: OrtApiSlot,
    pub ModelMetadataGetGraphDescription: OrtApiSlot,
    pub SessionOptionsAppendExecutionProvider_TensorRT: OrtApiSlot,
    pub SetCurrentGpuDeviceId: OrtApiSlot,
    pub GetCurrentGpuDeviceId: OrtApiSlot,
    pub KernelInfoGetAttributeArray_float: OrtApiSlot,
    pub KernelInfoGetAttributeArray_int64: OrtApiSlot,
    pub CreateArenaCfgV2: OrtApiSlot,
    pub AddRunConfigEntry: OrtApiSlot,
    pub CreatePrepackedWeightsContainer: OrtApiSlot,
    pub ReleasePrepackedWeightsContainer: OrtApiSlot,
    pub CreateSessionWithPrepackedWeightsContainer: OrtApiSlot,
    pub CreateSessionFromArrayWithPrepackedWeightsContainer: OrtApiSlot,
    pub SessionOptionsAppendExecutionProvider_TensorRT_V2: OrtApiSlot,
    pub CreateTensorRTProviderOptions: OrtApiSlot,
    pub UpdateTensorRTProviderOptions: OrtApiSlot,
    pub GetTensorRTProviderOptionsAsString: OrtApiSlot,
    pub ReleaseTensorRTProviderOptions: OrtApiSlot,
    pub EnableOrtCustomOps: OrtApiSlot,
    pub RegisterAllocator: OrtApiSlot,
    pub UnregisterAllocator: OrtApiSlot,
    pub IsSparseTensor: OrtApiSlot,
    pub CreateSparseTensorAsOrtValue: OrtApiSlot,
    pub FillSparseTensorCoo: OrtApiSlot,
    pub FillSparseTensorCsr: OrtApiSlot,
    pub FillSparseTensorBlockSparse: OrtApiSlot,
    pub CreateSparseTensorWithValuesAsOrtValue: OrtApiSlot,
    pub UseCooIndices: OrtApiSlot,
    pub UseCsrIndices: OrtApiSlot,
    pub UseBlockSparseIndices: OrtApiSlot,
    pub GetSparseTensorFormat: OrtApiSlot,
    pub GetSparseTensorValuesTypeAndShape: OrtApiSlot,
    pub GetSparseTensorValues: OrtApiSlot,
    pub GetSparseTensorIndicesTypeShape: OrtApiSlot,
    pub GetSparseTensorIndices: OrtApiSlot,
    pub HasValue: OrtApiSlot,
    pub KernelContext_GetGPUComputeStream: OrtApiSlot,
    pub GetTensorMemoryInfo: OrtApiSlot,
    pub GetExecutionProviderApi: OrtApiSlot,
    pub SessionOptionsSetCustomCreateThreadFn: OrtApiSlot,
    pub SessionOptionsSetCustomThreadCreationOptions: OrtApiSlot,
    pub SessionOptionsSetCustomJoinThreadFn: OrtApiSlot,
    pub SetGlobalCustomCreateThreadFn: OrtApiSlot,
    pub SetGlobalCustomThreadCreationOptions: OrtApiSlot,
    pub SetGlobalCustomJoinThreadFn: OrtApiSlot,
    pub SynchronizeBoundInputs: OrtApiSlot,
    pub SynchronizeBoundOutputs: OrtApiSlot,
    pub SessionOptionsAppendExecutionProvider_CUDA_V2: OrtApiSlot,
    pub CreateCUDAProviderOptions: OrtApiSlot,
    pub UpdateCUDAProviderOptions: OrtApiSlot,
    pub GetCUDAProviderOptionsAsString: OrtApiSlot,
    pub ReleaseCUDAProviderOptions: OrtApiSlot,
    pub SessionOptionsAppendExecutionProvider_MIGraphX: OrtApiSlot,
    pub AddExternalInitializers: OrtApiSlot,
    pub CreateOpAttr: OrtApiSlot,
    pub ReleaseOpAttr: OrtApiSlot,
    pub CreateOp: OrtApiSlot,
    pub InvokeOp: OrtApiSlot,
    pub ReleaseOp: OrtApiSlot,
    pub SessionOptionsAppendExecutionProvider: OrtApiSlot,
    pub CopyKernelInfo: OrtApiSlot,
    pub ReleaseKernelInfo: OrtApiSlot,
    pub GetTrainingApi: OrtApiSlot,
    pub SessionOptionsAppendExecutionProvider_CANN: OrtApiSlot,
    pub CreateCANNProviderOptions: OrtApiSlot,
    pub UpdateCANNProviderOptions: OrtApiSlot,
    pub GetCANNProviderOptionsAsString: OrtApiSlot,
    pub ReleaseCANNProviderOptions: OrtApiSlot,
    pub MemoryInfoGetDeviceType: OrtApiSlot,
    pub UpdateEnvWithCustomLogLevel: OrtApiSlot,
    pub SetGlobalIntraOpThreadAffinity: OrtApiSlot,
    pub RegisterCustomOpsLibrary_V2: OrtApiSlot,
    pub RegisterCustomOpsUsingFunction: OrtApiSlot,
    pub KernelInfo_GetInputCount: Option<
        unsafe extern "system" fn(info: *const OrtKernelInfo, out: *mut usize) -> OrtStatusPtr,
    >,
    pub KernelInfo_GetOutputCount: Option<
        unsafe extern "system" fn(info: *const OrtKernelInfo, out: *mut usize) -> OrtStatusPtr,
    >,
    pub KernelInfo_GetInputName: OrtApiSlot,
    pub KernelInfo_GetOutputName: OrtApiSlot,
    pub KernelInfo_GetInputTypeInfo: OrtApiSlot,
    pub KernelInfo_GetOutputTypeInfo: OrtApiSlot,
    pub KernelInfoGetAttribute_tensor: OrtApiSlot,
    pub HasSessionConfigEntry: OrtApiSlot,
    pub GetSessionConfigEntry: OrtApiSlot,
    pub SessionOptionsAppendExecutionProvider_Dnnl: OrtApiSlot,
    pub CreateDnnlProviderOptions: OrtApiSlot,
    pub UpdateDnnlProviderOptions: OrtApiSlot,
    pub GetDnnlProviderOptionsAsString: OrtApiSlot,
    pub ReleaseDnnlProviderOptions: OrtApiSlot,
    pub KernelInfo_GetNodeName: OrtApiSlot,
    pub KernelInfo_GetLogger: OrtApiSlot,
    pub KernelContext_GetLogger: OrtApiSlot,
    pub Logger_LogMessage: OrtApiSlot,
    pub Logger_GetLoggingSeverityLevel: OrtApiSlot,
    pub KernelInfoGetConstantInput_tensor: OrtApiSlot,
    pub CastTypeInfoToOptionalTypeInfo: OrtApiSlot,
    pub GetOptionalContainedTypeInfo: OrtApiSlot,
    pub GetResizedStringTensorElementBuffer: OrtApiSlot,
    pub KernelContext_GetAllocator: OrtApiSlot,
    pub GetBuildInfoString: OrtApiSlot,
    pub CreateROCMProviderOptions: OrtApiSlot,
    pub UpdateROCMProviderOptions: OrtApiSlot,
    pub GetROCMProviderOptionsAsString: OrtApiSlot,
    pub ReleaseROCMProviderOptions: OrtApiSlot,
    pub CreateAndRegisterAllocatorV2: OrtApiSlot,
    pub RunAsync: OrtApiSlot,
    pub UpdateTensorRTProviderOptionsWithValue: OrtApiSlot,
    pub GetTensorRTProviderOptionsByName: OrtApiSlot,
    pub UpdateCUDAProviderOptionsWithValue: OrtApiSlot,
    pub GetCUDAProviderOptionsByName: OrtApiSlot,
    pub KernelContext_GetResource: Option<
        unsafe extern "system" fn(
            context: *const OrtKernelContext,
            resource_version: c_int,
            resource_id: c_int,
            resource: *mut *mut c_void,
        ) -> OrtStatusPtr,
    >,
}

/// Resource ids of the CUDA execution provider, queried with `KernelContext_GetResource`.
#[cfg(feature = "cuda")]
pub mod cuda {
    use std::ffi::c_int;

    pub const ORT_CUDA_RESOURCE_VERSION: c_int = 1;
    pub const CUDA_RESOURCE_OFFSET: c_int = 10000;
    pub const CUDA_STREAM_T: c_int = CUDA_RESOURCE_OFFSET;
    pub const CUDNN_HANDLE_T: c_int = CUDA_RESOURCE_OFFSET + 1;
    pub const CUBLAS_HANDLE_T: c_int = CUDA_RESOURCE_OFFSET + 2;
}

/// Resource ids of the DirectML execution provider, queried with `KernelContext_GetResource`.
#[cfg(feature = "dml")]
pub mod dml {
    use std::ffi::c_int;

    pub const ORT_DML_RESOURCE_VERSION: c_int = 1;
    pub const DML_RESOURCE_OFFSET: c_int = 20000;
    pub const DML_DEVICE_T: c_int = DML_RESOURCE_OFFSET;
    pub const D3D12_COMMAND_QUEUE_T: c_int = DML_RESOURCE_OFFSET + 1;
    pub const CMD_LIST_T: c_int = DML_RESOURCE_OFFSET + 2;
    pub const CMD_RECORDER_T: c_int = DML_RESOURCE_OFFSET + 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_op_layout() {
        let ptr = std::mem::size_of::<usize>();
        // version is padded to pointer alignment, followed by 21 function pointers
        assert_eq!(std::mem::size_of::<OrtCustomOp>(), ptr + 21 * ptr);
        assert_eq!(std::mem::align_of::<OrtCustomOp>(), ptr);
    }

    #[test]
    fn api_layout() {
        let ptr = std::mem::size_of::<usize>();
        assert_eq!(std::mem::offset_of!(OrtApi, CreateStatus), 0);
        assert_eq!(std::mem::offset_of!(OrtApi, GetTensorMutableData), 51 * ptr);
        assert_eq!(
            std::mem::offset_of!(OrtApi, GetTensorTypeAndShape),
            65 * ptr
        );
        assert_eq!(
            std::mem::offset_of!(OrtApi, KernelContext_GetInput),
            90 * ptr
        );
        assert_eq!(std::mem::offset_of!(OrtApi, ReleaseStatus), 93 * ptr);
        assert_eq!(
            std::mem::offset_of!(OrtApi, KernelInfo_GetInputCount),
            230 * ptr
        );
        assert_eq!(std::mem::size_of::<OrtApi>(), 266 * ptr);
        assert_eq!(std::mem::size_of::<OrtApiBase>(), 2 * ptr);
    }

    #[test]
    fn enum_sizes() {
        assert_eq!(
            std::mem::size_of::<ONNXTensorElementDataType>(),
            std::mem::size_of::<c_int>()
        );
        assert_eq!(
            std::mem::size_of::<OrtMemType>(),
            std::mem::size_of::<c_int>()
        );
        assert_eq!(OrtMemType::OrtMemTypeCPUInput as c_int, -2);
    }
}
