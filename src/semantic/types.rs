//! Closed enumerations bound to deck values
//!
//! These implement [`DeckEnum`] so a [`crate::cst::ValueNode`] can be
//! narrowed to a known token set: surface mnemonics for surface cards
//! and the lattice shape numbers of a `LAT` parameter.

use crate::cst::value::{DeckEnum, Value};
use crate::error::KermaError;
use crate::result::Result;

/// The surface mnemonics of the deck grammar.
///
/// Slashed mnemonics such as `C/X` (a cylinder parallel to the x axis,
/// as opposed to `CX` on the axis) are spelled `COverX` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceType {
    P,
    Px,
    Py,
    Pz,
    So,
    S,
    Sx,
    Sy,
    Sz,
    COverX,
    COverY,
    COverZ,
    Cx,
    Cy,
    Cz,
    KOverX,
    KOverY,
    KOverZ,
    Kx,
    Ky,
    Kz,
    Sq,
    Gq,
    Tx,
    Ty,
    Tz,
    X,
    Y,
    Z,
    Box,
    Rpp,
    Sph,
    Rcc,
    Rhp,
    Hex,
    Rec,
    Trc,
    Ell,
    Wed,
    Arb,
}

impl SurfaceType {
    const TABLE: [(SurfaceType, &'static str); 40] = [
        (SurfaceType::P, "P"),
        (SurfaceType::Px, "PX"),
        (SurfaceType::Py, "PY"),
        (SurfaceType::Pz, "PZ"),
        (SurfaceType::So, "SO"),
        (SurfaceType::S, "S"),
        (SurfaceType::Sx, "SX"),
        (SurfaceType::Sy, "SY"),
        (SurfaceType::Sz, "SZ"),
        (SurfaceType::COverX, "C/X"),
        (SurfaceType::COverY, "C/Y"),
        (SurfaceType::COverZ, "C/Z"),
        (SurfaceType::Cx, "CX"),
        (SurfaceType::Cy, "CY"),
        (SurfaceType::Cz, "CZ"),
        (SurfaceType::KOverX, "K/X"),
        (SurfaceType::KOverY, "K/Y"),
        (SurfaceType::KOverZ, "K/Z"),
        (SurfaceType::Kx, "KX"),
        (SurfaceType::Ky, "KY"),
        (SurfaceType::Kz, "KZ"),
        (SurfaceType::Sq, "SQ"),
        (SurfaceType::Gq, "GQ"),
        (SurfaceType::Tx, "TX"),
        (SurfaceType::Ty, "TY"),
        (SurfaceType::Tz, "TZ"),
        (SurfaceType::X, "X"),
        (SurfaceType::Y, "Y"),
        (SurfaceType::Z, "Z"),
        (SurfaceType::Box, "BOX"),
        (SurfaceType::Rpp, "RPP"),
        (SurfaceType::Sph, "SPH"),
        (SurfaceType::Rcc, "RCC"),
        (SurfaceType::Rhp, "RHP"),
        (SurfaceType::Hex, "HEX"),
        (SurfaceType::Rec, "REC"),
        (SurfaceType::Trc, "TRC"),
        (SurfaceType::Ell, "ELL"),
        (SurfaceType::Wed, "WED"),
        (SurfaceType::Arb, "ARB"),
    ];

    /// The canonical upper-case mnemonic.
    pub fn mnemonic(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(t, _)| *t == self)
            .map(|(_, m)| *m)
            .unwrap_or("P")
    }

    pub fn parse(token: &str) -> Result<SurfaceType> {
        let upper = token.to_ascii_uppercase();
        Self::TABLE
            .iter()
            .find(|(_, m)| *m == upper)
            .map(|(t, _)| *t)
            .ok_or_else(|| KermaError::type_mismatch("surface mnemonic", token))
    }
}

impl DeckEnum for SurfaceType {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(token) => SurfaceType::parse(token),
            other => Err(KermaError::type_mismatch(
                "surface mnemonic",
                format!("{other:?}"),
            )),
        }
    }

    fn to_value(&self) -> Value {
        Value::Text(self.mnemonic().to_string())
    }
}

/// Lattice shapes selected by the `LAT` cell parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lattice {
    /// `LAT=1`
    Hexahedral,
    /// `LAT=2`
    HexagonalPrism,
}

impl Lattice {
    pub fn number(self) -> i64 {
        match self {
            Lattice::Hexahedral => 1,
            Lattice::HexagonalPrism => 2,
        }
    }
}

impl DeckEnum for Lattice {
    fn from_value(value: &Value) -> Result<Self> {
        let number = match value {
            Value::Integer(n) => *n,
            Value::Real(r) if r.fract() == 0.0 => *r as i64,
            other => {
                return Err(KermaError::type_mismatch(
                    "lattice shape number",
                    format!("{other:?}"),
                ));
            }
        };
        match number {
            1 => Ok(Lattice::Hexahedral),
            2 => Ok(Lattice::HexagonalPrism),
            other => Err(KermaError::type_mismatch(
                "lattice shape number",
                other.to_string(),
            )),
        }
    }

    fn to_value(&self) -> Value {
        Value::Integer(self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::value::{ValueNode, ValueType};
    use crate::error::ErrorKind;

    #[test]
    fn mnemonics_parse_either_case() {
        assert_eq!(SurfaceType::parse("so").unwrap(), SurfaceType::So);
        assert_eq!(SurfaceType::parse("C/z").unwrap(), SurfaceType::COverZ);
        assert_eq!(SurfaceType::parse("cz").unwrap(), SurfaceType::Cz);
        let err = SurfaceType::parse("nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn value_nodes_bind_to_surface_types() {
        let mut node = ValueNode::new("so", ValueType::Text).unwrap();
        node.convert_to_enum::<SurfaceType>(false, true).unwrap();
        assert_eq!(node.value_as::<SurfaceType>().unwrap(), SurfaceType::So);
        assert_eq!(node.format(), "so");

        node.set_enum(SurfaceType::Cz).unwrap();
        assert_eq!(node.format(), "CZ");
    }

    #[test]
    fn lattice_numbers_round_trip() {
        assert_eq!(
            Lattice::from_value(&Value::Integer(1)).unwrap(),
            Lattice::Hexahedral
        );
        assert_eq!(
            Lattice::from_value(&Value::Real(2.0)).unwrap(),
            Lattice::HexagonalPrism
        );
        assert_eq!(Lattice::Hexahedral.to_value(), Value::Integer(1));
        let err = Lattice::from_value(&Value::Integer(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }
}
