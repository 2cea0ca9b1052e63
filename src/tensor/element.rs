use ort_lite_op_sys::ONNXTensorElementDataType as CElementType;

use crate::scalar::{bf16, f16};
use crate::util::{IntoCpp, IntoRust};

/// Element data types of tensors that can cross the operator boundary.
///
/// The host ABI also defines `Undefined` and complex codes, which have no counterpart here and are rejected when
/// read from the host.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ElementType {
    /// 32-bit floating point, `f32`
    Float = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_FLOAT as u8,
    /// 8-bit unsigned integer, `u8`
    UInt8 = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT8 as u8,
    /// 8-bit signed integer, `i8`
    Int8 = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT8 as u8,
    /// 16-bit unsigned integer, `u16`
    UInt16 = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT16 as u8,
    /// 16-bit signed integer, `i16`
    Int16 = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT16 as u8,
    /// 32-bit signed integer, `i32`
    Int32 = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT32 as u8,
    /// 64-bit signed integer, `i64`
    Int64 = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT64 as u8,
    /// Variable length strings, see [`StringTensor`](crate::tensor::StringTensor) and
    /// [`StrTensor`](crate::tensor::StrTensor).
    String = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_STRING as u8,
    /// Boolean, `bool`
    Bool = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_BOOL as u8,
    /// 16-bit floating point, [`ort_lite_op::scalar::f16`](`crate::scalar::f16`).
    Float16 = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_FLOAT16 as u8,
    /// 64-bit floating point, `f64`
    Double = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_DOUBLE as u8,
    /// 32-bit unsigned integer, `u32`
    UInt32 = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT32 as u8,
    /// 64-bit unsigned integer, `u64`
    UInt64 = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT64 as u8,
    /// 16-bit floating point using the bfloat16 format, [`ort_lite_op::scalar::bf16`](`crate::scalar::bf16`).
    BFloat16 = CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_BFLOAT16 as u8,
}
impl IntoRust for CElementType {
    type RsType = Option<ElementType>;
    fn rs(self) -> Self::RsType {
        Some(match self {
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_FLOAT => ElementType::Float,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT8 => ElementType::UInt8,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT8 => ElementType::Int8,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT16 => ElementType::UInt16,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT16 => ElementType::Int16,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT32 => ElementType::Int32,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT64 => ElementType::Int64,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_STRING => ElementType::String,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_BOOL => ElementType::Bool,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_FLOAT16 => ElementType::Float16,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_DOUBLE => ElementType::Double,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT32 => ElementType::UInt32,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT64 => ElementType::UInt64,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_BFLOAT16 => ElementType::BFloat16,
            CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UNDEFINED
            | CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_COMPLEX64
            | CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_COMPLEX128 => return None,
        })
    }
}
impl IntoCpp for ElementType {
    type CppType = CElementType;

    fn cpp(self) -> Self::CppType {
        match self {
            ElementType::Float => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_FLOAT,
            ElementType::UInt8 => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT8,
            ElementType::Int8 => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT8,
            ElementType::UInt16 => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT16,
            ElementType::Int16 => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT16,
            ElementType::Int32 => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT32,
            ElementType::Int64 => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_INT64,
            ElementType::String => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_STRING,
            ElementType::Bool => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_BOOL,
            ElementType::Float16 => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_FLOAT16,
            ElementType::Double => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_DOUBLE,
            ElementType::UInt32 => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT32,
            ElementType::UInt64 => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_UINT64,
            ElementType::BFloat16 => CElementType::ONNX_TENSOR_ELEMENT_DATA_TYPE_BFLOAT16,
        }
    }
}
impl ElementType {
    /// Convert an ABI element type code, `None` for codes without a Rust element type.
    ///
    /// Used by host adapters implementing [`HostApi::tensor_type_and_shape`](crate::host::HostApi).
    pub fn from_raw(raw: CElementType) -> Option<Self> {
        raw.rs()
    }
}
impl From<ElementType> for CElementType {
    fn from(elem: ElementType) -> Self {
        elem.cpp()
    }
}

/// A trait for numeric types that can be used as element types of a [`Tensor`](crate::tensor::Tensor).
///
/// Strings are not numeric elements, they have their own tensor views.
pub trait Element: Copy + Send + Sync + 'static {
    /// The [`ElementType`] enum variant of the implementing type.
    const TYPE: ElementType;
    private_decl! {}
}
macro_rules! impl_element {
    ($rust_type:path, $element_type_variant:ident) => {
        impl Element for $rust_type {
            const TYPE: ElementType = ElementType::$element_type_variant;
            private_impl! {}
        }
    };
}
impl_element!(bool, Bool);
impl_element!(f32, Float);
impl_element!(f64, Double);
impl_element!(f16, Float16);
impl_element!(bf16, BFloat16);
impl_element!(i8, Int8);
impl_element!(i16, Int16);
impl_element!(i32, Int32);
impl_element!(i64, Int64);
impl_element!(u8, UInt8);
impl_element!(u16, UInt16);
impl_element!(u32, UInt32);
impl_element!(u64, UInt64);
