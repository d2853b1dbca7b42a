use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Datum;

impl Datum {
    /// Version number for the current implementations of [`serde::Deserialize`] and
    /// [`serde::Serialize`] for [`Datum`]. Any data serialized with an older version *can not* be
    /// deserialized with the later version.
    ///
    /// Hash codes of constants are derived from this encoding, so they are only comparable between
    /// processes that agree on this number.
    pub const SERDE_VERSION: u8 = 1;
}

#[derive(Clone, Copy)]
enum Variant {
    None,
    Int,
    UnsignedInt,
    Double,
    Text,
    ByteArray,
    Numeric,
}

const VARIANTS: &[&str] = &[
    "None",
    "Int",
    "UnsignedInt",
    "Double",
    "Text",
    "ByteArray",
    "Numeric",
];

#[inline(always)]
fn serialize_variant<S, T>(serializer: S, variant: Variant, value: &T) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: ?Sized + Serialize,
{
    serializer.serialize_newtype_variant("Datum", variant as _, VARIANTS[variant as usize], value)
}

/// Doubles are encoded by their bits, with all zeroes and all NaNs collapsed to one encoding each
/// so that values which compare equal encode equally.
fn canonical_f64_bits(f: f64) -> u64 {
    if f == 0.0 {
        0.0f64.to_bits()
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

impl Serialize for Datum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Datum::None => {
                serializer.serialize_unit_variant("Datum", Variant::None as _, VARIANTS[0])
            }
            Datum::Int(v) => serialize_variant(serializer, Variant::Int, v),
            Datum::UnsignedInt(v) => serialize_variant(serializer, Variant::UnsignedInt, v),
            Datum::Double(f) => {
                serialize_variant(serializer, Variant::Double, &canonical_f64_bits(*f))
            }
            Datum::Text(s) => serialize_variant(serializer, Variant::Text, s.as_bytes()),
            Datum::ByteArray(bytes) => serialize_variant(serializer, Variant::ByteArray, &**bytes),
            // Trailing zeroes are stripped so that `1.50` and `1.5` encode identically
            Datum::Numeric(d) => {
                serialize_variant(serializer, Variant::Numeric, &d.normalize().serialize())
            }
        }
    }
}

/// Mirror of the serialized form of [`Datum`]. Variant order must match [`Variant`].
#[derive(Deserialize)]
#[serde(rename = "Datum")]
enum DatumRepr {
    None,
    Int(i64),
    UnsignedInt(u64),
    Double(u64),
    Text(Vec<u8>),
    ByteArray(Vec<u8>),
    Numeric([u8; 16]),
}

impl<'de> Deserialize<'de> for Datum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match DatumRepr::deserialize(deserializer)? {
            DatumRepr::None => Datum::None,
            DatumRepr::Int(v) => Datum::Int(v),
            DatumRepr::UnsignedInt(v) => Datum::UnsignedInt(v),
            DatumRepr::Double(bits) => Datum::Double(f64::from_bits(bits)),
            DatumRepr::Text(bytes) => Datum::Text(
                String::from_utf8(bytes)
                    .map_err(serde::de::Error::custom)?
                    .into(),
            ),
            DatumRepr::ByteArray(bytes) => Datum::ByteArray(bytes.into()),
            DatumRepr::Numeric(bytes) => Datum::Numeric(Arc::new(Decimal::deserialize(bytes))),
        })
    }
}
