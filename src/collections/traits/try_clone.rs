use std::convert::Infallible;
use std::error::Error;

/// A fallible version of [`Clone`].
///
/// Collections in this crate build copies of their elements through this trait, so that a copy
/// which can't be completed (because it would need to allocate, open a handle or anything else that
/// might fail) is reported as an [`Err`] rather than a panic. The collection then discards any
/// partial work and hands the error back to the caller.
///
/// Types which are [`Clone`] and can't fail use [`Infallible`] as their error.
///
/// # Examples
/// ```
/// # use dynamic_array::collections::traits::TryClone;
/// let name = String::from("ferris");
/// assert_eq!(name.try_clone(), Ok(String::from("ferris")));
/// ```
pub trait TryClone: Sized {
    /// The error produced when a copy fails.
    type Error: Error + 'static;

    /// Attempts to create a copy of `self`.
    fn try_clone(&self) -> Result<Self, Self::Error>;
}

macro_rules! impl_infallible {
    ($($t:ty),* $(,)?) => {
        $(
            impl TryClone for $t {
                type Error = Infallible;

                #[inline]
                fn try_clone(&self) -> Result<Self, Infallible> {
                    Ok(self.clone())
                }
            }
        )*
    };
}

impl_infallible!(
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64, bool, char, (),
    String,
);

impl<T: ?Sized> TryClone for &T {
    type Error = Infallible;

    #[inline]
    fn try_clone(&self) -> Result<Self, Infallible> {
        Ok(*self)
    }
}

impl<T: TryClone> TryClone for Box<T> {
    type Error = T::Error;

    fn try_clone(&self) -> Result<Self, Self::Error> {
        Ok(Box::new((**self).try_clone()?))
    }
}

impl<T: TryClone> TryClone for Option<T> {
    type Error = T::Error;

    fn try_clone(&self) -> Result<Self, Self::Error> {
        self.as_ref().map(TryClone::try_clone).transpose()
    }
}
