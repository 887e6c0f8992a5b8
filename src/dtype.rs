//! Element types shared by the host and compute worlds.
//!
//! Both worlds address array memory through a runtime [`ScalarType`] tag. The
//! compile-time side of the tag is the [`Scalar`] trait, implemented once per
//! numeric primitive. Code that has to act on a runtime tag instantiates a
//! generic body through [`with_scalar_type!`], which is the single place the
//! fixed type set is enumerated.

/// Runtime tag for the fixed numeric element type set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl ScalarType {
    /// Size of one element in bytes.
    pub const fn size_bytes(&self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::I64 | ScalarType::U64 | ScalarType::F64 => 8,
        }
    }

    /// Lowercase type name, e.g. `"f64"`.
    pub const fn name(&self) -> &'static str {
        match self {
            ScalarType::I8 => "i8",
            ScalarType::I16 => "i16",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
            ScalarType::U8 => "u8",
            ScalarType::U16 => "u16",
            ScalarType::U32 => "u32",
            ScalarType::U64 => "u64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A numeric element type usable in both worlds.
///
/// This trait is sealed: the implementors are exactly the ten primitives the
/// [`ScalarType`] tag enumerates. Buffer reinterpretation relies on every
/// implementor being a plain, padding-free numeric type.
pub trait Scalar:
    sealed::Sealed + Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static
{
    /// The runtime tag corresponding to this type.
    const TYPE: ScalarType;
}

macro_rules! impl_scalar {
    ($ty:ty, $tag:ident) => {
        impl sealed::Sealed for $ty {}
        impl Scalar for $ty {
            const TYPE: ScalarType = ScalarType::$tag;
        }
    };
}

impl_scalar!(i8, I8);
impl_scalar!(i16, I16);
impl_scalar!(i32, I32);
impl_scalar!(i64, I64);
impl_scalar!(u8, U8);
impl_scalar!(u16, U16);
impl_scalar!(u32, U32);
impl_scalar!(u64, U64);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);

/// Instantiate a generic body for the concrete type behind a runtime tag.
///
/// Every arm of the fixed type set expands to the same body, so a conversion
/// routine written once generically covers the whole set without a per-type
/// copy of the code.
macro_rules! with_scalar_type {
    ($tag:expr, $T:ident => $body:expr) => {
        match $tag {
            $crate::dtype::ScalarType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::ScalarType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::ScalarType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::ScalarType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::ScalarType::U8 => {
                type $T = u8;
                $body
            }
            $crate::dtype::ScalarType::U16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::ScalarType::U32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::ScalarType::U64 => {
                type $T = u64;
                $body
            }
            $crate::dtype::ScalarType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::ScalarType::F64 => {
                type $T = f64;
                $body
            }
        }
    };
}

pub(crate) use with_scalar_type;
