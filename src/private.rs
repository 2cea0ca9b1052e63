//! Sealing of public traits that must not be implemented outside this crate.

/// Token type that only this crate can name.
#[doc(hidden)]
pub struct Private;

macro_rules! private_decl {
    () => {
        /// Prevents implementations outside this crate.
        #[doc(hidden)]
        fn __private(&self, _: crate::private::Private);
    };
}

macro_rules! private_impl {
    () => {
        fn __private(&self, _: crate::private::Private) {}
    };
}
