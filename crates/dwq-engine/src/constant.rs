//! Typed integer constants.
//!
//! A constant carries an arbitrary-precision value plus a *domain* that
//! decides how the value renders and whether arithmetic on it makes sense.
//! Plain numbers live in the decimal/hex/octal/binary domains; symbolic
//! domains (DW_TAG_*, DW_AT_*, ... — declared by the debug-info crate)
//! render through name tables and reject arithmetic.

use std::fmt;

use num_bigint::BigInt;

/// Rendering and arithmetic policy for a constant.
///
/// Domains are static singletons; two constants are in the same domain
/// iff they hold the same `&'static dyn ConstantDomain` pointer.
pub trait ConstantDomain: Sync {
    /// Short identifier used in diagnostics and hashing.
    fn name(&self) -> &'static str;

    /// Render `value` in this domain.
    fn show(&self, value: &BigInt, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// Whether arithmetic words may operate on constants of this domain.
    fn safe_arith(&self) -> bool {
        false
    }
}

pub struct DecDomain;
pub struct HexDomain;
pub struct OctDomain;
pub struct BinDomain;
pub struct BoolDomain;

/// Addresses render in hex; kept separate from `HexDomain` so that
/// diagnostics can tell an address apart from a plain hex literal.
pub struct AddressDomain;

impl ConstantDomain for DecDomain {
    fn name(&self) -> &'static str {
        "dec"
    }
    fn show(&self, value: &BigInt, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{value}")
    }
    fn safe_arith(&self) -> bool {
        true
    }
}

impl ConstantDomain for HexDomain {
    fn name(&self) -> &'static str {
        "hex"
    }
    fn show(&self, value: &BigInt, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{value:#x}")
    }
    fn safe_arith(&self) -> bool {
        true
    }
}

impl ConstantDomain for OctDomain {
    fn name(&self) -> &'static str {
        "oct"
    }
    fn show(&self, value: &BigInt, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{value:#o}")
    }
    fn safe_arith(&self) -> bool {
        true
    }
}

impl ConstantDomain for BinDomain {
    fn name(&self) -> &'static str {
        "bin"
    }
    fn show(&self, value: &BigInt, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{value:#b}")
    }
    fn safe_arith(&self) -> bool {
        true
    }
}

impl ConstantDomain for BoolDomain {
    fn name(&self) -> &'static str {
        "bool"
    }
    fn show(&self, value: &BigInt, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if value.sign() == num_bigint::Sign::NoSign {
            write!(f, "false")
        } else {
            write!(f, "true")
        }
    }
}

impl ConstantDomain for AddressDomain {
    fn name(&self) -> &'static str {
        "address"
    }
    fn show(&self, value: &BigInt, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{value:#x}")
    }
    fn safe_arith(&self) -> bool {
        true
    }
}

pub static DEC_DOMAIN: &dyn ConstantDomain = &DecDomain;
pub static HEX_DOMAIN: &dyn ConstantDomain = &HexDomain;
pub static OCT_DOMAIN: &dyn ConstantDomain = &OctDomain;
pub static BIN_DOMAIN: &dyn ConstantDomain = &BinDomain;
pub static BOOL_DOMAIN: &dyn ConstantDomain = &BoolDomain;
pub static ADDRESS_DOMAIN: &dyn ConstantDomain = &AddressDomain;

/// An integer with a rendering domain.
#[derive(Clone)]
pub struct Constant {
    value: BigInt,
    dom: &'static dyn ConstantDomain,
}

impl Constant {
    pub fn new(value: impl Into<BigInt>, dom: &'static dyn ConstantDomain) -> Self {
        Self {
            value: value.into(),
            dom,
        }
    }

    /// A constant in the plain decimal domain.
    pub fn dec(value: impl Into<BigInt>) -> Self {
        Self::new(value, DEC_DOMAIN)
    }

    pub fn bool(value: bool) -> Self {
        Self::new(if value { 1 } else { 0 }, BOOL_DOMAIN)
    }

    pub fn value(&self) -> &BigInt {
        &self.value
    }

    pub fn dom(&self) -> &'static dyn ConstantDomain {
        self.dom
    }

    /// Same value, different domain.
    pub fn retype(&self, dom: &'static dyn ConstantDomain) -> Self {
        Self {
            value: self.value.clone(),
            dom,
        }
    }

    /// The value as an u64, if it fits. Used by words that feed addresses
    /// into coverages.
    pub fn to_u64(&self) -> Option<u64> {
        use num_traits::ToPrimitive;
        self.value.to_u64()
    }

    /// Domain identity: same static domain object.
    pub fn same_dom(&self, other: &Constant) -> bool {
        std::ptr::eq(
            self.dom as *const dyn ConstantDomain as *const (),
            other.dom as *const dyn ConstantDomain as *const (),
        )
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dom.show(&self.value, f)
    }
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constant({self}, dom={})", self.dom.name())
    }
}
