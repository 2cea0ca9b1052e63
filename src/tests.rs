//! A host runtime double for unit tests.
//!
//! [`MockHost`] implements [`HostApi`] over plain Rust values: kernel contexts are [`MockContext`]s, values are
//! [`MockValue`]s and statuses are boxed [`MockStatus`]es. Output buffers are 8 byte aligned so any element type
//! can be viewed in place.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::ffi::{c_char, c_void, CStr};

use crate::host::{HostApi, KernelContext};
use crate::sys;
use crate::tensor::{Element, ElementType};
use crate::util::element_count;
use crate::{Error, ErrorCode, LiteCustomOp, Result};

#[ctor::ctor]
unsafe fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn elem_size(elem: ElementType) -> usize {
    match elem {
        ElementType::Bool | ElementType::Int8 | ElementType::UInt8 => 1,
        ElementType::Int16
        | ElementType::UInt16
        | ElementType::Float16
        | ElementType::BFloat16 => 2,
        ElementType::Int32 | ElementType::UInt32 | ElementType::Float => 4,
        ElementType::Int64 | ElementType::UInt64 | ElementType::Double => 8,
        ElementType::String => 0,
    }
}

enum MockData {
    Numeric(Vec<u64>),
    Strings(Vec<String>),
}

/// A tensor owned by the mock host.
pub(crate) struct MockValue {
    elem: ElementType,
    shape: Vec<i64>,
    data: MockData,
}
impl MockValue {
    pub(crate) fn tensor<T: Element>(shape: &[i64], values: &[T]) -> Self {
        assert_eq!(element_count(shape), values.len() as i64);
        let mut value = Self::zeroed(T::TYPE, shape);
        if let MockData::Numeric(words) = &mut value.data {
            // Safety: the buffer holds at least `values.len()` elements of `T` and is 8 byte aligned.
            let dst = unsafe {
                std::slice::from_raw_parts_mut(words.as_mut_ptr().cast::<T>(), values.len())
            };
            dst.copy_from_slice(values);
        }
        value
    }

    pub(crate) fn strings(shape: &[i64], values: &[&str]) -> Self {
        assert_eq!(element_count(shape), values.len() as i64);
        Self {
            elem: ElementType::String,
            shape: shape.to_vec(),
            data: MockData::Strings(values.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn zeroed(elem: ElementType, shape: &[i64]) -> Self {
        let data = if elem == ElementType::String {
            MockData::Strings(vec![String::new(); element_count(shape) as usize])
        } else {
            let bytes = element_count(shape) as usize * elem_size(elem);
            MockData::Numeric(vec![0; bytes.div_ceil(8)])
        };
        Self {
            elem,
            shape: shape.to_vec(),
            data,
        }
    }

    fn values<T: Element>(&self) -> Vec<T> {
        assert_eq!(self.elem, T::TYPE);
        match &self.data {
            MockData::Numeric(words) => {
                let len = element_count(&self.shape) as usize;
                // Safety: the buffer was created for `len` elements of `T`.
                unsafe { std::slice::from_raw_parts(words.as_ptr().cast::<T>(), len) }.to_vec()
            }
            MockData::Strings(_) => panic!("not a numeric tensor"),
        }
    }

    fn strings_data(&self) -> &[String] {
        match &self.data {
            MockData::Strings(strings) => strings,
            MockData::Numeric(_) => panic!("not a string tensor"),
        }
    }
}

/// One invocation as seen by the mock host.
pub(crate) struct MockContext {
    inputs: Vec<MockValue>,
    output_types: Vec<ElementType>,
    outputs: RefCell<Vec<Option<Box<MockValue>>>>,
    allocations: RefCell<Vec<usize>>,
    fail_outputs: Cell<bool>,
}
impl MockContext {
    pub(crate) fn new(inputs: Vec<MockValue>, output_types: &[ElementType]) -> Self {
        Self {
            inputs,
            output_types: output_types.to_vec(),
            outputs: RefCell::new(output_types.iter().map(|_| None).collect()),
            allocations: RefCell::new(vec![0; output_types.len()]),
            fail_outputs: Cell::new(false),
        }
    }

    /// Make every output allocation fail with an `EpFail` host error.
    pub(crate) fn fail_outputs(&self) {
        self.fail_outputs.set(true);
    }

    pub(crate) fn as_ptr(&self) -> *mut sys::OrtKernelContext {
        (self as *const Self).cast_mut().cast()
    }

    pub(crate) fn context(&mut self) -> KernelContext {
        static HOST: MockHost = MockHost;
        // Safety: the mock context outlives the tests using it.
        unsafe { KernelContext::new(self.as_ptr(), &HOST) }.unwrap()
    }

    pub(crate) fn kernel_info(&self) -> MockKernelInfo {
        MockKernelInfo {
            num_inputs: self.inputs.len(),
            num_outputs: self.output_types.len(),
        }
    }

    pub(crate) fn output<T: Element>(&self, index: usize) -> (Vec<i64>, Vec<T>) {
        let outputs = self.outputs.borrow();
        let value = outputs[index].as_ref().expect("output was not allocated");
        (value.shape.clone(), value.values())
    }

    pub(crate) fn output_strings(&self, index: usize) -> (Vec<i64>, Vec<String>) {
        let outputs = self.outputs.borrow();
        let value = outputs[index].as_ref().expect("output was not allocated");
        (value.shape.clone(), value.strings_data().to_vec())
    }

    pub(crate) fn is_allocated(&self, index: usize) -> bool {
        self.outputs.borrow()[index].is_some()
    }

    pub(crate) fn output_allocations(&self, index: usize) -> usize {
        self.allocations.borrow()[index]
    }
}

pub(crate) struct MockKernelInfo {
    pub(crate) num_inputs: usize,
    pub(crate) num_outputs: usize,
}
impl MockKernelInfo {
    pub(crate) fn as_ptr(&self) -> *const sys::OrtKernelInfo {
        (self as *const Self).cast()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MockStatus {
    pub(crate) code: ErrorCode,
    pub(crate) message: String,
}
impl MockStatus {
    /// # Safety
    ///
    /// `status` must be null or returned by [`MockHost::create_status`], and not used afterwards.
    pub(crate) unsafe fn take(status: sys::OrtStatusPtr) -> Option<MockStatus> {
        if status.is_null() {
            None
        } else {
            Some(*unsafe { Box::from_raw(status.cast::<MockStatus>()) })
        }
    }
}

pub(crate) struct MockHost;

fn host_error(message: &str) -> Error {
    Error::new(ErrorCode::Fail, message)
}

unsafe impl HostApi for MockHost {
    unsafe fn kernel_context_input_count(
        &self,
        context: *const sys::OrtKernelContext,
    ) -> Result<usize> {
        let ctx = unsafe { &*context.cast::<MockContext>() };
        Ok(ctx.inputs.len())
    }

    unsafe fn kernel_context_output_count(
        &self,
        context: *const sys::OrtKernelContext,
    ) -> Result<usize> {
        let ctx = unsafe { &*context.cast::<MockContext>() };
        Ok(ctx.output_types.len())
    }

    unsafe fn kernel_context_input(
        &self,
        context: *const sys::OrtKernelContext,
        index: usize,
    ) -> Result<*const sys::OrtValue> {
        let ctx = unsafe { &*context.cast::<MockContext>() };
        let value = ctx.inputs.get(index).ok_or_else(|| host_error("no such input"))?;
        Ok((value as *const MockValue).cast())
    }

    unsafe fn kernel_context_output(
        &self,
        context: *mut sys::OrtKernelContext,
        index: usize,
        dims: &[i64],
    ) -> Result<*mut sys::OrtValue> {
        let ctx = unsafe { &*context.cast::<MockContext>() };
        if ctx.fail_outputs.get() {
            return Err(Error::new(ErrorCode::EpFail, "out of device memory"));
        }
        let elem = *ctx
            .output_types
            .get(index)
            .ok_or_else(|| host_error("no such output"))?;
        let mut outputs = ctx.outputs.borrow_mut();
        let value = outputs[index].insert(Box::new(MockValue::zeroed(elem, dims)));
        ctx.allocations.borrow_mut()[index] += 1;
        Ok((&mut **value as *mut MockValue).cast())
    }

    unsafe fn tensor_type_and_shape(
        &self,
        value: *const sys::OrtValue,
    ) -> Result<(ElementType, Vec<i64>)> {
        let value = unsafe { &*value.cast::<MockValue>() };
        Ok((value.elem, value.shape.clone()))
    }

    unsafe fn tensor_data(&self, value: *const sys::OrtValue) -> Result<*const c_void> {
        let value = unsafe { &*value.cast::<MockValue>() };
        match &value.data {
            MockData::Numeric(words) => Ok(words.as_ptr().cast()),
            MockData::Strings(_) => Err(host_error("not a numeric tensor")),
        }
    }

    unsafe fn tensor_mutable_data(&self, value: *mut sys::OrtValue) -> Result<*mut c_void> {
        let value = unsafe { &mut *value.cast::<MockValue>() };
        match &mut value.data {
            MockData::Numeric(words) => Ok(words.as_mut_ptr().cast()),
            MockData::Strings(_) => Err(host_error("not a numeric tensor")),
        }
    }

    unsafe fn string_tensor_data_length(&self, value: *const sys::OrtValue) -> Result<usize> {
        let value = unsafe { &*value.cast::<MockValue>() };
        match &value.data {
            MockData::Strings(strings) => Ok(strings.iter().map(String::len).sum()),
            MockData::Numeric(_) => Err(host_error("not a string tensor")),
        }
    }

    unsafe fn string_tensor_content(
        &self,
        value: *const sys::OrtValue,
        buf: &mut [u8],
        offsets: &mut [usize],
    ) -> Result<()> {
        let value = unsafe { &*value.cast::<MockValue>() };
        let MockData::Strings(strings) = &value.data else {
            return Err(host_error("not a string tensor"));
        };
        if offsets.len() != strings.len() {
            return Err(Error::new(ErrorCode::InvalidArgument, "offsets length mismatch"));
        }
        let mut pos = 0;
        for (s, offset) in strings.iter().zip(offsets.iter_mut()) {
            *offset = pos;
            buf[pos..pos + s.len()].copy_from_slice(s.as_bytes());
            pos += s.len();
        }
        Ok(())
    }

    unsafe fn fill_string_tensor(
        &self,
        value: *mut sys::OrtValue,
        strings: &[*const c_char],
    ) -> Result<()> {
        let value = unsafe { &mut *value.cast::<MockValue>() };
        let MockData::Strings(dst) = &mut value.data else {
            return Err(host_error("not a string tensor"));
        };
        if dst.len() != strings.len() {
            return Err(Error::new(ErrorCode::InvalidArgument, "string count mismatch"));
        }
        for (dst, src) in dst.iter_mut().zip(strings) {
            *dst = unsafe { CStr::from_ptr(*src) }
                .to_str()
                .map_err(|_| host_error("invalid utf8"))?
                .to_owned();
        }
        Ok(())
    }

    unsafe fn kernel_info_input_count(&self, info: *const sys::OrtKernelInfo) -> Result<usize> {
        Ok(unsafe { &*info.cast::<MockKernelInfo>() }.num_inputs)
    }

    unsafe fn kernel_info_output_count(&self, info: *const sys::OrtKernelInfo) -> Result<usize> {
        Ok(unsafe { &*info.cast::<MockKernelInfo>() }.num_outputs)
    }

    fn create_status(&self, code: ErrorCode, message: &CStr) -> sys::OrtStatusPtr {
        let status = MockStatus {
            code,
            message: message.to_string_lossy().into_owned(),
        };
        Box::into_raw(Box::new(status)).cast()
    }

    #[cfg(any(feature = "cuda", feature = "dml"))]
    unsafe fn kernel_context_resource(
        &self,
        _context: *const sys::OrtKernelContext,
        _resource_version: i32,
        resource_id: i32,
    ) -> Result<*mut c_void> {
        Ok(resource_id as usize as *mut c_void)
    }
}

/// Drive a descriptor through its vtable the way the host does.
pub(crate) struct MockSession<'a> {
    op: &'a LiteCustomOp,
}
impl<'a> MockSession<'a> {
    pub(crate) fn new(op: &'a LiteCustomOp) -> Self {
        Self { op }
    }

    fn raw(&self) -> &sys::OrtCustomOp {
        // Safety: the descriptor is alive for `'a`.
        unsafe { &*self.op.as_ptr() }
    }

    pub(crate) fn create_kernel(&self, info: &MockKernelInfo) -> Result<*mut c_void, MockStatus> {
        let create = self.raw().CreateKernelV2.expect("CreateKernelV2");
        let mut kernel = std::ptr::null_mut();
        let status = unsafe {
            create(
                self.op.as_ptr(),
                std::ptr::null(),
                info.as_ptr(),
                &mut kernel,
            )
        };
        match unsafe { MockStatus::take(status) } {
            None => Ok(kernel),
            Some(status) => {
                assert!(kernel.is_null());
                Err(status)
            }
        }
    }

    pub(crate) fn compute(&self, kernel: *mut c_void, ctx: &MockContext) -> Result<(), MockStatus> {
        let compute = self.raw().KernelComputeV2.expect("KernelComputeV2");
        let status = unsafe { compute(kernel, ctx.as_ptr()) };
        match unsafe { MockStatus::take(status) } {
            None => Ok(()),
            Some(status) => Err(status),
        }
    }

    pub(crate) fn destroy_kernel(&self, kernel: *mut c_void) {
        let destroy = self.raw().KernelDestroy.expect("KernelDestroy");
        unsafe { destroy(kernel) };
    }

    /// Create a kernel for `ctx`, run it once and destroy it.
    pub(crate) fn run(&self, ctx: &MockContext) -> Result<(), MockStatus> {
        let kernel = self.create_kernel(&ctx.kernel_info())?;
        let result = self.compute(kernel, ctx);
        self.destroy_kernel(kernel);
        result
    }
}
