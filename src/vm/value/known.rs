//! This module contains a representation of concrete word values for the EVM
//! that can be known and manipulated statically.

use std::fmt::{Display, Formatter};

use ethnum::{I256, U256};

use crate::constant::WORD_SIZE_BITS;

/// The type of data whose value is concretely known during symbolic execution.
///
/// # Representation
///
/// At the low level at which this analyzer works, all values on the EVM are
/// just bags of bits in a 256-bit word. Operations on a `KnownWord` may treat
/// this word numerically in a signed or unsigned fashion. Such numeric
/// operations are, where possible, implemented in terms of standard operators
/// to provide a natural usage experience.
///
/// All arithmetic wraps at the word boundary, matching the EVM rather than
/// mathematical integers. Use [`Self::masked`] to re-wrap results at a
/// narrower word width.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct KnownWord {
    value: U256,
}

impl KnownWord {
    /// Creates a known word representing zero.
    #[must_use]
    pub fn zero() -> Self {
        Self { value: U256::ZERO }
    }

    /// Creates a known word representing one.
    #[must_use]
    pub fn one() -> Self {
        Self { value: U256::ONE }
    }

    /// Constructs a new `KnownWord` from the numeric `value`.
    #[must_use]
    pub fn new(value: impl Into<U256>) -> Self {
        let value = value.into();
        Self { value }
    }

    /// Constructs a new `KnownWord` from `bytes` in big-endian (network)
    /// ordering, as bytes appear in the bytecode and on the wire.
    #[must_use]
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let value = U256::from_be_bytes(bytes);
        Self { value }
    }

    /// Gets the bytes of this word in big-endian ordering.
    #[must_use]
    pub fn to_be_bytes(self) -> [u8; 32] {
        self.value.to_be_bytes()
    }

    /// Gets the numeric value of the known word.
    #[must_use]
    pub fn value(&self) -> U256 {
        self.value
    }

    /// Gets the numeric value of the known word, interpreting the bit pattern
    /// as a signed number.
    #[must_use]
    pub fn value_signed(&self) -> I256 {
        I256::from_ne_bytes(self.value.to_ne_bytes())
    }

    /// Re-wraps the word at `width_bits`, discarding any bits above the
    /// requested width.
    ///
    /// A width of [`WORD_SIZE_BITS`] or more leaves the word unchanged.
    #[must_use]
    pub fn masked(self, width_bits: usize) -> Self {
        if width_bits >= WORD_SIZE_BITS {
            return self;
        }
        let mask = (U256::ONE << width_bits) - U256::ONE;
        Self {
            value: self.value & mask,
        }
    }

    /// Performs signed division of two known words, with division by zero
    /// yielding zero as on the EVM.
    #[must_use]
    pub fn signed_div(self, rhs: Self) -> Self {
        let left = self.value_signed();
        let right = rhs.value_signed();

        let result = if right == I256::ZERO {
            I256::ZERO
        } else {
            left.wrapping_div(right)
        };

        Self {
            value: U256::from_ne_bytes(result.to_ne_bytes()),
        }
    }

    /// Performs signed modulo of two known words, with modulo by zero yielding
    /// zero as on the EVM.
    #[must_use]
    pub fn signed_rem(self, rhs: Self) -> Self {
        let left = self.value_signed();
        let right = rhs.value_signed();

        let result = if right == I256::ZERO {
            I256::ZERO
        } else {
            left.wrapping_rem(right)
        };

        Self {
            value: U256::from_ne_bytes(result.to_ne_bytes()),
        }
    }

    /// Performs exponentiation of two known words, wrapping at the word
    /// boundary.
    #[must_use]
    pub fn exp(self, rhs: Self) -> Self {
        // Square-and-multiply over the full exponent width, as the exponent
        // need not fit in a machine integer.
        let mut result = U256::ONE;
        let mut base = self.value;
        let mut exponent = rhs.value;

        while exponent != U256::ZERO {
            if exponent & U256::ONE == U256::ONE {
                result = result.wrapping_mul(base);
            }
            base = base.wrapping_mul(base);
            exponent >>= 1;
        }

        Self { value: result }
    }

    /// Computes less-than of two known words.
    #[must_use]
    pub fn lt(self, rhs: Self) -> Self {
        Self::from(self.value < rhs.value)
    }

    /// Computes greater-than of two known words.
    #[must_use]
    pub fn gt(self, rhs: Self) -> Self {
        Self::from(self.value > rhs.value)
    }

    /// Computes signed less-than of two known words.
    #[must_use]
    pub fn signed_lt(self, rhs: Self) -> Self {
        Self::from(self.value_signed() < rhs.value_signed())
    }

    /// Computes signed greater-than of two known words.
    #[must_use]
    pub fn signed_gt(self, rhs: Self) -> Self {
        Self::from(self.value_signed() > rhs.value_signed())
    }

    /// Computes equality of two known words.
    #[must_use]
    pub fn eq_word(self, rhs: Self) -> Self {
        Self::from(self.value == rhs.value)
    }

    /// Checks if `self` is zero, producing one if it is and zero otherwise.
    #[must_use]
    pub fn is_zero(self) -> Self {
        Self::from(self.value == U256::ZERO)
    }

    /// Gets the byte at `offset` in this word, counting from the most
    /// significant byte as the `BYTE` opcode does.
    ///
    /// Offsets past the end of the word yield zero.
    #[must_use]
    pub fn byte(self, offset: Self) -> Self {
        if offset.value >= U256::from(32u8) {
            return Self::zero();
        }
        let index = offset.value.as_usize();
        Self::new(self.value.to_be_bytes()[index])
    }

    /// Sign-extends the value from the `(size + 1)`-byte width to the full
    /// word width.
    ///
    /// Sizes of 31 or more leave the word unchanged.
    #[must_use]
    pub fn sign_extend(self, size: Self) -> Self {
        if size.value >= U256::from(31u8) {
            return self;
        }
        let bits = (size.value.as_usize() + 1) * 8;
        let sign_bit = U256::ONE << (bits - 1);
        let mask = (U256::ONE << bits) - U256::ONE;

        let value = if self.value & sign_bit == U256::ZERO {
            self.value & mask
        } else {
            self.value | !mask
        };
        Self { value }
    }

    /// Computes the signed (arithmetic) right shift of `self` by `rhs`.
    #[must_use]
    pub fn sar(self, rhs: Self) -> Self {
        if rhs.value >= U256::from(256u16) {
            return if self.value_signed() < I256::ZERO {
                Self { value: U256::MAX }
            } else {
                Self::zero()
            };
        }
        let result = self.value_signed() >> rhs.value.as_u32();
        Self {
            value: U256::from_ne_bytes(result.to_ne_bytes()),
        }
    }
}

impl std::ops::Add<KnownWord> for KnownWord {
    type Output = KnownWord;

    /// Performs wrapping addition of two known words.
    fn add(self, rhs: KnownWord) -> Self::Output {
        KnownWord::new(self.value.wrapping_add(rhs.value))
    }
}

impl std::ops::Mul<KnownWord> for KnownWord {
    type Output = KnownWord;

    /// Performs wrapping multiplication of two known words.
    fn mul(self, rhs: KnownWord) -> Self::Output {
        KnownWord::new(self.value.wrapping_mul(rhs.value))
    }
}

impl std::ops::Sub<KnownWord> for KnownWord {
    type Output = KnownWord;

    /// Performs wrapping subtraction of two known words.
    fn sub(self, rhs: KnownWord) -> Self::Output {
        KnownWord::new(self.value.wrapping_sub(rhs.value))
    }
}

impl std::ops::Div<KnownWord> for KnownWord {
    type Output = KnownWord;

    /// Performs unsigned division of two known words, with division by zero
    /// yielding zero as on the EVM.
    fn div(self, rhs: KnownWord) -> Self::Output {
        if rhs.value == U256::ZERO {
            KnownWord::zero()
        } else {
            KnownWord::new(self.value.wrapping_div(rhs.value))
        }
    }
}

impl std::ops::Rem<KnownWord> for KnownWord {
    type Output = KnownWord;

    /// Performs unsigned modulo of two known words, with modulo by zero
    /// yielding zero as on the EVM.
    fn rem(self, rhs: KnownWord) -> Self::Output {
        if rhs.value == U256::ZERO {
            KnownWord::zero()
        } else {
            KnownWord::new(self.value.wrapping_rem(rhs.value))
        }
    }
}

impl std::ops::BitAnd<KnownWord> for KnownWord {
    type Output = KnownWord;

    /// Computes bitwise and of two known words.
    fn bitand(self, rhs: KnownWord) -> Self::Output {
        KnownWord::new(self.value & rhs.value)
    }
}

impl std::ops::BitOr<KnownWord> for KnownWord {
    type Output = KnownWord;

    /// Computes bitwise or of two known words.
    fn bitor(self, rhs: KnownWord) -> Self::Output {
        KnownWord::new(self.value | rhs.value)
    }
}

impl std::ops::BitXor<KnownWord> for KnownWord {
    type Output = KnownWord;

    /// Computes bitwise xor of two known words.
    fn bitxor(self, rhs: KnownWord) -> Self::Output {
        KnownWord::new(self.value ^ rhs.value)
    }
}

impl std::ops::Not for KnownWord {
    type Output = KnownWord;

    /// Computes the bitwise negation of `self`.
    fn not(self) -> Self::Output {
        KnownWord::new(!self.value)
    }
}

impl std::ops::Shl<KnownWord> for KnownWord {
    type Output = KnownWord;

    /// Computes the left shift of `self` by `rhs`, with shifts of a word or
    /// more yielding zero as on the EVM.
    fn shl(self, rhs: KnownWord) -> Self::Output {
        if rhs.value >= U256::from(256u16) {
            KnownWord::zero()
        } else {
            KnownWord::new(self.value << rhs.value.as_u32())
        }
    }
}

impl std::ops::Shr<KnownWord> for KnownWord {
    type Output = KnownWord;

    /// Computes the unsigned right shift of `self` by `rhs`, with shifts of a
    /// word or more yielding zero as on the EVM.
    fn shr(self, rhs: KnownWord) -> Self::Output {
        if rhs.value >= U256::from(256u16) {
            KnownWord::zero()
        } else {
            KnownWord::new(self.value >> rhs.value.as_u32())
        }
    }
}

impl From<usize> for KnownWord {
    fn from(value: usize) -> Self {
        Self::new(value as u128)
    }
}

impl From<u32> for KnownWord {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<bool> for KnownWord {
    /// Obtains a known word from a [`bool`], with one representing truth.
    fn from(value: bool) -> Self {
        if value {
            Self::one()
        } else {
            Self::zero()
        }
    }
}

impl From<KnownWord> for U256 {
    fn from(value: KnownWord) -> Self {
        value.value
    }
}

impl From<KnownWord> for u32 {
    fn from(value: KnownWord) -> Self {
        value.value.as_u32()
    }
}

impl From<KnownWord> for usize {
    fn from(value: KnownWord) -> Self {
        value.value.as_usize()
    }
}

impl From<KnownWord> for bool {
    /// Obtains a [`bool`] from a known word, with any non-zero value
    /// representing truth.
    fn from(value: KnownWord) -> Self {
        value.value != U256::ZERO
    }
}

/// Pretty-prints the known word as a hexadecimal-encoded number as it is
/// easier for humans to work with.
impl Display for KnownWord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = hex::encode(self.value.to_be_bytes());
        let str = str.trim_start_matches('0');
        let str = if str.is_empty() { "0" } else { str };
        write!(f, "0x{str}")
    }
}

#[cfg(test)]
mod test {
    use ethnum::U256;

    use crate::vm::value::known::KnownWord;

    #[test]
    fn arithmetic_wraps_at_word_boundary() {
        let max = KnownWord::new(U256::MAX);
        let one = KnownWord::one();

        assert_eq!(max + one, KnownWord::zero());
        assert_eq!(KnownWord::zero() - one, max);
    }

    #[test]
    fn can_mask_to_narrower_width() {
        let word = KnownWord::new(0x1ffu32);

        assert_eq!(word.masked(8), KnownWord::new(0xffu32));
        assert_eq!(word.masked(256), word);
    }

    #[test]
    fn division_by_zero_yields_zero() {
        let a = KnownWord::new(0x2u32);
        let zero = KnownWord::zero();

        assert_eq!(a / zero, zero);
        assert_eq!(a % zero, zero);
        assert_eq!(a.signed_div(zero), zero);
        assert_eq!(a.signed_rem(zero), zero);
    }

    #[test]
    fn comparisons_produce_boolean_words() {
        let small = KnownWord::new(0x2u32);
        let large = KnownWord::new(0x7u32);

        assert_eq!(small.lt(large), KnownWord::one());
        assert_eq!(small.gt(large), KnownWord::zero());
        assert_eq!(small.eq_word(small), KnownWord::one());
        assert_eq!(KnownWord::zero().is_zero(), KnownWord::one());
    }

    #[test]
    fn signed_comparisons_respect_the_sign_bit() {
        // The all-ones pattern is -1 when read as signed.
        let minus_one = KnownWord::new(U256::MAX);
        let three = KnownWord::new(0x3u32);

        assert_eq!(minus_one.signed_lt(three), KnownWord::one());
        assert_eq!(minus_one.signed_gt(three), KnownWord::zero());
        assert_eq!(minus_one.lt(three), KnownWord::zero());
    }

    #[test]
    fn exponentiation_wraps() {
        let base = KnownWord::new(0x7u32);
        let exponent = KnownWord::new(0x2u32);

        assert_eq!(base.exp(exponent), KnownWord::new(49u32));
        assert_eq!(base.exp(KnownWord::zero()), KnownWord::one());
    }

    #[test]
    fn byte_extracts_from_the_big_end() {
        let word = KnownWord::from_be_bytes({
            let mut bytes = [0u8; 32];
            bytes[0] = 0xab;
            bytes[31] = 0xcd;
            bytes
        });

        assert_eq!(word.byte(KnownWord::zero()), KnownWord::new(0xabu32));
        assert_eq!(word.byte(KnownWord::new(31u32)), KnownWord::new(0xcdu32));
        assert_eq!(word.byte(KnownWord::new(32u32)), KnownWord::zero());
    }

    #[test]
    fn sign_extend_propagates_the_sign_bit() {
        let word = KnownWord::new(0xffu32);
        let extended = word.sign_extend(KnownWord::zero());

        assert_eq!(extended, KnownWord::new(U256::MAX));
        assert_eq!(
            KnownWord::new(0x7fu32).sign_extend(KnownWord::zero()),
            KnownWord::new(0x7fu32)
        );
    }

    #[test]
    fn shifts_saturate_past_the_word_width() {
        let value = KnownWord::new(0b1110u32);

        assert_eq!(value << KnownWord::new(4u32), KnownWord::new(0b1110_0000u32));
        assert_eq!(value >> KnownWord::new(1u32), KnownWord::new(0b111u32));
        assert_eq!(value << KnownWord::new(256u32), KnownWord::zero());
        assert_eq!(value >> KnownWord::new(256u32), KnownWord::zero());
    }

    #[test]
    fn arithmetic_shift_preserves_the_sign() {
        let minus_one = KnownWord::new(U256::MAX);

        assert_eq!(minus_one.sar(KnownWord::new(8u32)), minus_one);
        assert_eq!(minus_one.sar(KnownWord::new(300u32)), minus_one);
        assert_eq!(
            KnownWord::new(0b1011u32).sar(KnownWord::new(2u32)),
            KnownWord::new(0b10u32)
        );
    }
}
