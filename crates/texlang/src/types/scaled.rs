use std::fmt::Write;

/// Scaled numbers.
///
/// This is the fixed-width numeric type TeX uses for dimensions,
///     described in part 7 "arithmetic with scaled dimensions" of TeX.2021.
/// There is one sign bit, 15 bits for the integer part and 16 bits for the fractional part.
/// The inner value is the number multiplied by 2^16.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scaled(pub i32);

/// Error returned when a scaled computation leaves the range of valid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowError;

impl Scaled {
    pub const ZERO: Scaled = Scaled(0);

    pub const ONE: Scaled = Scaled(1 << 16);

    pub const TWO: Scaled = Scaled(1 << 17);

    /// Maximum possible dimension in TeX, which is (2^30-1)/2^16.
    ///
    /// This is _not_ the maximum of the inner type, which is (2^31-1)/2^16.
    /// TeX.2021.421.
    pub const MAX_DIMEN: Scaled = Scaled((1 << 30) - 1);

    /// Create a scaled number from an integer in the range `(-2^14, 2^14)`.
    pub fn from_integer(i: i32) -> Result<Scaled, OverflowError> {
        if i >= (1 << 14) || i <= -(1 << 14) {
            Err(OverflowError)
        } else {
            Ok(Scaled(Scaled::ONE.0 * i))
        }
    }

    /// Creates a scaled number from the digits of a decimal fraction.
    ///
    /// TeX.2021.102.
    pub fn from_decimal_fraction(digits: &[u8]) -> Scaled {
        let mut a = 0;
        for d in digits.iter().take(17).rev() {
            a = (a + (*d as i32) * Scaled::TWO.0) / 10
        }
        Scaled((a + 1) / 2)
    }

    /// Calculates _xn_/_d_ and the remainder, where _x_ is this number and
    ///     _n_ and _d_ are integers in the range `[1,2^16]`.
    ///
    /// TeX.2021.107 computes this with 32-bit arithmetic; 64-bit integers make it direct.
    pub fn xn_over_d(&self, n: i32, d: i32) -> Result<(Scaled, Scaled), OverflowError> {
        let b = (self.0 as i64) * (n as i64);
        let remainder = b % (d as i64);
        let b = b / (d as i64);
        if b < -(Scaled::MAX_DIMEN.0 as i64) || b > Scaled::MAX_DIMEN.0 as i64 {
            return Err(OverflowError);
        }
        Ok((Scaled(b as i32), Scaled(remainder as i32)))
    }

    /// TeX.2021.105
    pub fn nx_plus_y(self, mut n: i32, y: Scaled) -> Result<Scaled, OverflowError> {
        let max_answer = Scaled::MAX_DIMEN;
        if n == 0 {
            return Ok(y);
        }
        let mut x = self;
        if n < 0 {
            n = -n;
            x = -x;
        }
        if x <= (max_answer - y) / n && -x <= (max_answer + y) / n {
            Ok(x * n + y)
        } else {
            Err(OverflowError)
        }
    }

    pub fn integer_part(self) -> i32 {
        self.0 / Scaled::ONE.0
    }

    pub fn fractional_part(self) -> Scaled {
        self % Scaled::ONE.0
    }

    pub fn abs(self) -> Scaled {
        Scaled(self.0.wrapping_abs())
    }

    /// Prints the number without the `pt` unit.
    ///
    /// TeX.2021.103.
    pub fn write_number<W: Write>(&self, w: &mut W) -> std::fmt::Result {
        if self.0 < 0 {
            w.write_char('-')?;
        }
        write!(w, "{}.", self.abs().integer_part())?;
        let mut f = self.abs().fractional_part() * 10 + Scaled(5);
        let mut delta = Scaled(10);
        loop {
            if delta > Scaled::ONE {
                // round the last digit
                f = f + Scaled(0o100000 - 50000);
            }
            let digit = b'0' + (f.integer_part() as u8);
            w.write_char(digit as char)?;
            f = f.fractional_part() * 10;
            delta = delta * 10;
            if f <= delta {
                break;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Scaled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_number(f)?;
        write!(f, "pt")
    }
}

impl std::ops::Add<Scaled> for Scaled {
    type Output = Scaled;
    fn add(self, rhs: Scaled) -> Self::Output {
        Scaled(self.0.wrapping_add(rhs.0))
    }
}

impl std::ops::Sub<Scaled> for Scaled {
    type Output = Scaled;
    fn sub(self, rhs: Scaled) -> Self::Output {
        Scaled(self.0.wrapping_sub(rhs.0))
    }
}

impl std::ops::Mul<i32> for Scaled {
    type Output = Scaled;
    fn mul(self, rhs: i32) -> Self::Output {
        Scaled(self.0.wrapping_mul(rhs))
    }
}

impl std::ops::Div<i32> for Scaled {
    type Output = Scaled;
    fn div(self, rhs: i32) -> Self::Output {
        Scaled(self.0 / rhs)
    }
}

impl std::ops::Rem<i32> for Scaled {
    type Output = Scaled;
    fn rem(self, rhs: i32) -> Self::Output {
        Scaled(self.0 % rhs)
    }
}

impl std::ops::Neg for Scaled {
    type Output = Scaled;
    fn neg(self) -> Self::Output {
        Scaled(self.0.wrapping_neg())
    }
}

/// Unit of a dimension.
///
/// TeX.2021.458 and chapter 10 of the TeXBook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaledUnit {
    Point,
    Pica,
    Inch,
    BigPoint,
    Centimeter,
    Millimeter,
    DidotPoint,
    Cicero,
    ScaledPoint,
}

impl ScaledUnit {
    /// All units, in the order TeX tries their keywords.
    pub const ALL: [ScaledUnit; 9] = [
        ScaledUnit::Point,
        ScaledUnit::Pica,
        ScaledUnit::Inch,
        ScaledUnit::BigPoint,
        ScaledUnit::Centimeter,
        ScaledUnit::Millimeter,
        ScaledUnit::DidotPoint,
        ScaledUnit::Cicero,
        ScaledUnit::ScaledPoint,
    ];

    /// Parses a unit from its two character abbreviation.
    pub fn parse(s: &str) -> Option<Self> {
        ScaledUnit::ALL.into_iter().find(|unit| unit.abbreviation() == s)
    }

    pub fn abbreviation(&self) -> &'static str {
        use ScaledUnit::*;
        match self {
            Point => "pt",
            Pica => "pc",
            Inch => "in",
            BigPoint => "bp",
            Centimeter => "cm",
            Millimeter => "mm",
            DidotPoint => "dd",
            Cicero => "cc",
            ScaledPoint => "sp",
        }
    }

    /// Returns the fraction (_n_, _d_) that converts this unit to points.
    ///
    /// A length of _x_ in this unit is _nx_/_d_ points.
    pub fn conversion_fraction(&self) -> (i32, i32) {
        use ScaledUnit::*;
        match self {
            Point => (1, 1),
            Pica => (12, 1),
            Inch => (7227, 100),
            BigPoint => (7227, 7200),
            Centimeter => (7227, 254),
            Millimeter => (7227, 2540),
            DidotPoint => (1238, 1157),
            Cicero => (14856, 1157),
            ScaledPoint => (1, 1 << 16),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! display_tests {
        ($( ($name: ident, $input: expr, $want: expr), )+) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(format!("{}", $input), $want);
                }
            )+
        };
    }

    display_tests!(
        (display_zero, Scaled::ZERO, "0.0pt"),
        (display_one, Scaled::ONE, "1.0pt"),
        (display_half, Scaled(1 << 15), "0.5pt"),
        (display_negative, -Scaled::TWO, "-2.0pt"),
        (display_negative_fraction, Scaled(-(1 << 15)), "-0.5pt"),
        (display_one_sp, Scaled(1), "0.00002pt"),
        (display_max_dimen, Scaled::MAX_DIMEN, "16383.99998pt"),
    );

    #[test]
    fn from_integer_out_of_range() {
        assert_eq!(Scaled::from_integer(1 << 14), Err(OverflowError));
        assert_eq!(Scaled::from_integer(3), Ok(Scaled(3 << 16)));
    }

    #[test]
    fn from_decimal_fraction() {
        assert_eq!(Scaled::from_decimal_fraction(&[5]), Scaled(1 << 15));
        assert_eq!(Scaled::from_decimal_fraction(&[2, 5]), Scaled(1 << 14));
    }

    #[test]
    fn xn_over_d_inches() {
        let (n, d) = ScaledUnit::Inch.conversion_fraction();
        let (got, _) = Scaled::ONE.xn_over_d(n, d).unwrap();
        assert_eq!(got, Scaled(4736286));
    }

    #[test]
    fn unit_parse() {
        assert_eq!(ScaledUnit::parse("cc"), Some(ScaledUnit::Cicero));
        assert_eq!(ScaledUnit::parse("px"), None);
    }
}
