// MIT/Apache2 License

//! Compile-time introspection of function pointer signatures.
//!
//! Given a function pointer type, [`Signature`] names its argument tuple and
//! result type and [`ArgAt`] names the argument at a given position. This
//! lets one fn-pointer alias be the single source of truth for a foreign
//! entry point: the wrappers around it spell their parameter and return
//! types as `Arg<F, N>` and `Output<F>` instead of repeating them.
//!
//! Asking for an argument past the end of the signature does not compile:
//!
//! ```compile_fail
//! use sourdough::signature::Arg;
//!
//! type TwoArgs = fn(u8, u16) -> u32;
//! let _oob: Arg<TwoArgs, 2> = 0;
//! ```

/// A function pointer type whose shape can be inspected.
pub trait Signature: Copy {
    /// The arguments, as a tuple.
    type Args;
    /// The return type.
    type Output;
    /// The number of arguments.
    const ARITY: usize;

    /// Call the function with its arguments packed into a tuple.
    ///
    /// # Safety
    ///
    /// For `unsafe` function pointers, the caller must uphold the
    /// function's own contract.
    unsafe fn call(self, args: Self::Args) -> Self::Output;
}

/// The type of the argument at position `I`.
pub trait ArgAt<const I: usize>: Signature {
    type Type;
}

/// Shorthand for the return type of `F`.
pub type Output<F> = <F as Signature>::Output;

/// Shorthand for the type of the `I`th argument of `F`.
pub type Arg<F, const I: usize> = <F as ArgAt<I>>::Type;

macro_rules! arg_at {
    ($fty:ty; [$($all:ident),*]; ) => {};
    ($fty:ty; [$($all:ident),*]; $idx:literal => $cur:ident $(, $ridx:literal => $rest:ident)*) => {
        impl<R, $($all),*> ArgAt<$idx> for $fty {
            type Type = $cur;
        }

        arg_at!($fty; [$($all),*]; $($ridx => $rest),*);
    };
}

macro_rules! signatures {
    ($($arity:literal: ($($idx:literal => $arg:ident),*);)*) => {
        $(
            impl<R, $($arg),*> Signature for fn($($arg),*) -> R {
                type Args = ($($arg,)*);
                type Output = R;
                const ARITY: usize = $arity;

                #[allow(non_snake_case)]
                unsafe fn call(self, ($($arg,)*): Self::Args) -> R {
                    (self)($($arg),*)
                }
            }

            impl<R, $($arg),*> Signature for unsafe extern "C" fn($($arg),*) -> R {
                type Args = ($($arg,)*);
                type Output = R;
                const ARITY: usize = $arity;

                #[allow(non_snake_case)]
                unsafe fn call(self, ($($arg,)*): Self::Args) -> R {
                    (self)($($arg),*)
                }
            }

            arg_at!(fn($($arg),*) -> R; [$($arg),*]; $($idx => $arg),*);
            arg_at!(unsafe extern "C" fn($($arg),*) -> R; [$($arg),*]; $($idx => $arg),*);
        )*
    };
}

signatures! {
    0: ();
    1: (0 => A0);
    2: (0 => A0, 1 => A1);
    3: (0 => A0, 1 => A1, 2 => A2);
    4: (0 => A0, 1 => A1, 2 => A2, 3 => A3);
    5: (0 => A0, 1 => A1, 2 => A2, 3 => A3, 4 => A4);
    6: (0 => A0, 1 => A1, 2 => A2, 3 => A3, 4 => A4, 5 => A5);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::any::TypeId;

    fn type_of<T: 'static>() -> TypeId {
        TypeId::of::<T>()
    }

    type Sample = fn(u8, i16, u32) -> u64;
    type Foreign = unsafe extern "C" fn(*mut u8, u64) -> libc::c_int;

    #[test]
    fn exposes_output_and_arity() {
        assert_eq!(type_of::<Output<Sample>>(), type_of::<u64>());
        assert_eq!(<Sample as Signature>::ARITY, 3);
        assert_eq!(<fn() -> () as Signature>::ARITY, 0);
    }

    #[test]
    fn exposes_each_argument() {
        assert_eq!(type_of::<Arg<Sample, 0>>(), type_of::<u8>());
        assert_eq!(type_of::<Arg<Sample, 1>>(), type_of::<i16>());
        assert_eq!(type_of::<Arg<Sample, 2>>(), type_of::<u32>());
        assert_eq!(type_of::<Arg<Foreign, 1>>(), type_of::<u64>());
        assert_eq!(type_of::<Output<Foreign>>(), type_of::<libc::c_int>());
    }

    #[test]
    fn calls_through_the_tuple() {
        fn add(a: u8, b: i16, c: u32) -> u64 {
            a as u64 + b as u64 + c as u64
        }

        let f: Sample = add;
        assert_eq!(unsafe { f.call((1, 2, 3)) }, 6);
    }
}
