use std::fmt::{Debug, Formatter, Result};

use super::{Element, StrTensor, StringTensor, Tensor};

impl<T: Element + Debug> Debug for Tensor<T> {
    fn fmt(&self, f: &mut Formatter) -> Result {
        f.debug_struct("Tensor")
            .field("index", &self.index())
            .field("is_input", &self.is_input())
            .field("shape", &self.shape().ok())
            .field("data", &self.data())
            .finish()
    }
}

impl Debug for StringTensor {
    fn fmt(&self, f: &mut Formatter) -> Result {
        f.debug_struct("StringTensor")
            .field("index", &self.index())
            .field("is_input", &self.is_input())
            .field("shape", &self.shape().ok())
            .field("data", &self.data())
            .finish()
    }
}

impl Debug for StrTensor {
    fn fmt(&self, f: &mut Formatter) -> Result {
        f.debug_struct("StrTensor")
            .field("index", &self.index())
            .field("shape", &self.shape())
            .field("data", &self.data())
            .finish()
    }
}
