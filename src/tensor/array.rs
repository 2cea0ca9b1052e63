use ndarray::{ArrayBase, ArrayView, ArrayViewMut, Data, Dimension, IxDyn};

use super::{Element, Tensor};
use crate::{Error, Result};

fn array_dim<Dim: Dimension>(shape: &[i64]) -> Result<Dim> {
    if let Some(arr_ndim) = Dim::NDIM {
        if arr_ndim != shape.len() {
            return Err(Error::invalid_argument(format!(
                "dimension mismatch: {} != {arr_ndim}",
                shape.len()
            )));
        }
    }
    let mut dim = Dim::zeros(shape.len());
    for (i, d) in shape.iter().enumerate() {
        dim[i] = usize::try_from(*d)
            .map_err(|_| Error::invalid_argument(format!("invalid dimension {d}")))?;
    }
    Ok(dim)
}

fn tensor_dims(shape: &[usize]) -> Result<Vec<i64>> {
    shape
        .iter()
        .map(|d| {
            i64::try_from(*d)
                .map_err(|_| Error::invalid_argument(format!("array dimension {d} overflows i64")))
        })
        .collect()
}

fn shape_error(err: ndarray::ShapeError) -> Error {
    Error::invalid_argument(format!("tensor buffer does not match its shape: {err}"))
}

impl<T: Element> Tensor<T> {
    /// Get an array view of the tensor.
    ///
    /// Fails if the shape is not known yet or if the number of dimensions of the tensor does not match `Dim`.
    pub fn as_array<Dim: Dimension>(&self) -> Result<ArrayView<'_, T, Dim>> {
        let dim = array_dim::<Dim>(self.shape()?)?;
        ArrayView::from_shape(dim, self.data()).map_err(shape_error)
    }

    /// Get an array view of the tensor with dynamic number of dimensions.
    pub fn as_array_dyn(&self) -> Result<ArrayView<'_, T, IxDyn>> {
        self.as_array()
    }

    /// Get a mutable array view of an allocated output.
    pub fn as_array_mut<Dim: Dimension>(&mut self) -> Result<ArrayViewMut<'_, T, Dim>> {
        let dim = array_dim::<Dim>(self.shape()?)?;
        ArrayViewMut::from_shape(dim, self.data_mut()?).map_err(shape_error)
    }

    /// Allocate the output with the shape of `array` and copy its elements in row major order.
    pub fn allocate_from_array<S, D>(&mut self, array: &ArrayBase<S, D>) -> Result<()>
    where
        S: Data<Elem = T>,
        D: Dimension,
    {
        let shape = tensor_dims(array.shape())?;
        let buf = self.allocate(&shape)?;
        if buf.len() != array.len() {
            return Err(Error::invalid_argument(format!(
                "output {} was already allocated with a different shape",
                self.index()
            )));
        }
        for (dst, src) in buf.iter_mut().zip(array.iter()) {
            *dst = *src;
        }
        Ok(())
    }
}
