//! Type-directed conversion between host values and native types.
//!
//! # Responsibility
//! - Describe native parameter/return shapes (`NativeType`).
//! - Convert `HostValue -> T` (`FromHost`) and `T -> HostValue` (`IntoHost`)
//!   with explicit range and shape validation.
//!
//! # Invariants
//! - No blind casts: lossy conversions are rejected with `ConversionError`.
//! - In-range values round-trip host -> native -> host unchanged.

use crate::value::{
    HostValue, HOST_TYPE_BOOL, HOST_TYPE_FLOAT, HOST_TYPE_INT, HOST_TYPE_LIST, HOST_TYPE_NONE,
    HOST_TYPE_STR,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Largest integer magnitude an `f64` represents exactly (2^53).
const F64_EXACT_INT_LIMIT: i64 = 1 << 53;

/// Native parameter or return type of one export.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeType {
    Unit,
    Bool,
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
    Str,
    List(Box<NativeType>),
    Optional(Box<NativeType>),
}

impl Display for NativeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unit => f.write_str("unit"),
            Self::Bool => f.write_str("bool"),
            Self::I8 => f.write_str("i8"),
            Self::I16 => f.write_str("i16"),
            Self::I32 => f.write_str("i32"),
            Self::I64 => f.write_str("i64"),
            Self::U8 => f.write_str("u8"),
            Self::U16 => f.write_str("u16"),
            Self::U32 => f.write_str("u32"),
            Self::U64 => f.write_str("u64"),
            Self::F32 => f.write_str("f32"),
            Self::F64 => f.write_str("f64"),
            Self::Str => f.write_str("str"),
            Self::List(inner) => write!(f, "list[{inner}]"),
            Self::Optional(inner) => write!(f, "option[{inner}]"),
        }
    }
}

/// Where in a call a conversion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionSite {
    /// Zero-based argument position.
    Argument(usize),
    ReturnValue,
}

/// A value that could not be converted losslessly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub site: Option<ConversionSite>,
    pub source_type: String,
    pub target_type: String,
    pub detail: Option<String>,
}

impl ConversionError {
    pub fn new(source_type: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            site: None,
            source_type: source_type.into(),
            target_type: target_type.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Pins the error to a call site; an already placed error keeps its site.
    pub fn at(mut self, site: ConversionSite) -> Self {
        if self.site.is_none() {
            self.site = Some(site);
        }
        self
    }

    /// Argument position, when the failure happened on the way in.
    pub fn argument_position(&self) -> Option<usize> {
        match self.site {
            Some(ConversionSite::Argument(position)) => Some(position),
            _ => None,
        }
    }
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.site {
            Some(ConversionSite::Argument(position)) => write!(f, "argument {position}: ")?,
            Some(ConversionSite::ReturnValue) => write!(f, "return value: ")?,
            None => {}
        }
        write!(
            f,
            "cannot convert {} to {}",
            self.source_type, self.target_type
        )?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl Error for ConversionError {}

/// Host -> native conversion for one native argument type.
pub trait FromHost: Sized {
    fn native_type() -> NativeType;
    fn from_host(value: &HostValue) -> Result<Self, ConversionError>;
}

/// Native -> host conversion for one native return type.
pub trait IntoHost {
    fn native_type() -> NativeType;
    fn into_host(self) -> Result<HostValue, ConversionError>;
}

fn mismatch<T: FromHost>(value: &HostValue) -> ConversionError {
    ConversionError::new(value.type_name(), T::native_type().to_string())
}

macro_rules! impl_host_integer {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromHost for $ty {
                fn native_type() -> NativeType {
                    NativeType::$variant
                }

                fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
                    match value {
                        HostValue::Int(raw) => <$ty>::try_from(*raw).map_err(|_| {
                            mismatch::<$ty>(value).with_detail(format!(
                                "{raw} is outside [{}, {}]",
                                <$ty>::MIN,
                                <$ty>::MAX
                            ))
                        }),
                        _ => Err(mismatch::<$ty>(value)),
                    }
                }
            }

            impl IntoHost for $ty {
                fn native_type() -> NativeType {
                    NativeType::$variant
                }

                fn into_host(self) -> Result<HostValue, ConversionError> {
                    i64::try_from(self).map(HostValue::Int).map_err(|_| {
                        ConversionError::new(NativeType::$variant.to_string(), HOST_TYPE_INT)
                            .with_detail(format!("{self} exceeds the host integer range"))
                    })
                }
            }
        )*
    };
}

impl_host_integer!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
);

impl FromHost for f64 {
    fn native_type() -> NativeType {
        NativeType::F64
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Float(raw) => Ok(*raw),
            HostValue::Int(raw) if (-F64_EXACT_INT_LIMIT..=F64_EXACT_INT_LIMIT).contains(raw) => {
                Ok(*raw as f64)
            }
            HostValue::Int(raw) => Err(mismatch::<f64>(value)
                .with_detail(format!("{raw} is not exactly representable as f64"))),
            _ => Err(mismatch::<f64>(value)),
        }
    }
}

impl IntoHost for f64 {
    fn native_type() -> NativeType {
        NativeType::F64
    }

    fn into_host(self) -> Result<HostValue, ConversionError> {
        Ok(HostValue::Float(self))
    }
}

impl FromHost for f32 {
    fn native_type() -> NativeType {
        NativeType::F32
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        let wide = f64::from_host(value).map_err(|err| {
            ConversionError {
                target_type: NativeType::F32.to_string(),
                ..err
            }
        })?;
        if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
            return Err(mismatch::<f32>(value).with_detail(format!("{wide} overflows f32")));
        }
        let narrow = wide as f32;
        if f64::from(narrow) != wide && !wide.is_nan() {
            return Err(mismatch::<f32>(value)
                .with_detail(format!("{wide} is not exactly representable as f32")));
        }
        Ok(narrow)
    }
}

impl IntoHost for f32 {
    fn native_type() -> NativeType {
        NativeType::F32
    }

    fn into_host(self) -> Result<HostValue, ConversionError> {
        Ok(HostValue::Float(f64::from(self)))
    }
}

impl FromHost for bool {
    fn native_type() -> NativeType {
        NativeType::Bool
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Bool(raw) => Ok(*raw),
            _ => Err(mismatch::<bool>(value)),
        }
    }
}

impl IntoHost for bool {
    fn native_type() -> NativeType {
        NativeType::Bool
    }

    fn into_host(self) -> Result<HostValue, ConversionError> {
        Ok(HostValue::Bool(self))
    }
}

impl FromHost for String {
    fn native_type() -> NativeType {
        NativeType::Str
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::Str(raw) => Ok(raw.clone()),
            _ => Err(mismatch::<String>(value)),
        }
    }
}

impl IntoHost for String {
    fn native_type() -> NativeType {
        NativeType::Str
    }

    fn into_host(self) -> Result<HostValue, ConversionError> {
        Ok(HostValue::Str(self))
    }
}

impl IntoHost for () {
    fn native_type() -> NativeType {
        NativeType::Unit
    }

    fn into_host(self) -> Result<HostValue, ConversionError> {
        Ok(HostValue::None)
    }
}

impl<T: FromHost> FromHost for Vec<T> {
    fn native_type() -> NativeType {
        NativeType::List(Box::new(T::native_type()))
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        let HostValue::List(items) = value else {
            return Err(mismatch::<Self>(value));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                T::from_host(item).map_err(|err| ConversionError {
                    source_type: HOST_TYPE_LIST.to_string(),
                    target_type: <Self as FromHost>::native_type().to_string(),
                    detail: Some(format!("element {index}: {}", describe_inner(&err))),
                    site: None,
                })
            })
            .collect()
    }
}

impl<T: IntoHost> IntoHost for Vec<T> {
    fn native_type() -> NativeType {
        NativeType::List(Box::new(T::native_type()))
    }

    fn into_host(self) -> Result<HostValue, ConversionError> {
        self.into_iter()
            .enumerate()
            .map(|(index, item)| {
                item.into_host().map_err(|err| ConversionError {
                    source_type: <Self as IntoHost>::native_type().to_string(),
                    target_type: HOST_TYPE_LIST.to_string(),
                    detail: Some(format!("element {index}: {}", describe_inner(&err))),
                    site: None,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(HostValue::List)
    }
}

impl<T: FromHost> FromHost for Option<T> {
    fn native_type() -> NativeType {
        NativeType::Optional(Box::new(T::native_type()))
    }

    fn from_host(value: &HostValue) -> Result<Self, ConversionError> {
        match value {
            HostValue::None => Ok(None),
            other => T::from_host(other).map(Some).map_err(|err| ConversionError {
                target_type: <Self as FromHost>::native_type().to_string(),
                ..err
            }),
        }
    }
}

impl<T: IntoHost> IntoHost for Option<T> {
    fn native_type() -> NativeType {
        NativeType::Optional(Box::new(T::native_type()))
    }

    fn into_host(self) -> Result<HostValue, ConversionError> {
        match self {
            Some(inner) => inner.into_host(),
            None => Ok(HostValue::None),
        }
    }
}

fn describe_inner(err: &ConversionError) -> String {
    match &err.detail {
        Some(detail) => format!("{} -> {} ({detail})", err.source_type, err.target_type),
        None => format!("{} -> {}", err.source_type, err.target_type),
    }
}

/// Host type name a native value would be boxed as; used for signature hints.
pub fn host_type_for(native: &NativeType) -> &'static str {
    match native {
        NativeType::Unit => HOST_TYPE_NONE,
        NativeType::Bool => HOST_TYPE_BOOL,
        NativeType::F32 | NativeType::F64 => HOST_TYPE_FLOAT,
        NativeType::Str => HOST_TYPE_STR,
        NativeType::List(_) => HOST_TYPE_LIST,
        NativeType::Optional(inner) => host_type_for(inner),
        _ => HOST_TYPE_INT,
    }
}
