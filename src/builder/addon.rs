use super::symbol::{left_code, ModulePattern, ParityPattern, DIGIT_MODULES};
use crate::common::{
    checksum::{addon2_checksum, addon5_checksum},
    digits::DigitString,
    error::BarcodeResult,
};

// EAN-2 / EAN-5 supplements
//------------------------------------------------------------------------------

pub const EAN2_MODULES: usize = 20;
pub const EAN5_MODULES: usize = 47;
const START_GUARD: u8 = 0b1011;
const SEPARATOR: u8 = 0b01;

/// EAN-2 parity keyed by the value modulo 4.
pub const EAN2_PARITY: [ParityPattern; 4] = [
    ParityPattern::new("LL"),
    ParityPattern::new("LG"),
    ParityPattern::new("GL"),
    ParityPattern::new("GG"),
];

/// EAN-5 parity keyed by the weighted checksum.
pub const EAN5_PARITY: [ParityPattern; 10] = [
    ParityPattern::new("GGLLL"),
    ParityPattern::new("GLGLL"),
    ParityPattern::new("GLLGL"),
    ParityPattern::new("GLLLG"),
    ParityPattern::new("LGGLL"),
    ParityPattern::new("LLGGL"),
    ParityPattern::new("LLLGG"),
    ParityPattern::new("LGLGL"),
    ParityPattern::new("LGLLG"),
    ParityPattern::new("LLGLG"),
];

pub fn encode2(digits: &str) -> BarcodeResult<ModulePattern> {
    let digits = DigitString::parse(digits, 2)?;
    let parity = EAN2_PARITY[addon2_checksum(&digits)? as usize];
    Ok(encode_with_parity(&digits, parity))
}

pub fn encode5(digits: &str) -> BarcodeResult<ModulePattern> {
    let digits = DigitString::parse(digits, 5)?;
    let parity = EAN5_PARITY[addon5_checksum(&digits)? as usize];
    Ok(encode_with_parity(&digits, parity))
}

/// Start guard, then each digit from the L or G table with a `01`
/// separator between digits. Only the start guard is marked.
fn encode_with_parity(digits: &DigitString, parity: ParityPattern) -> ModulePattern {
    let n = digits.len();
    let mut pattern = ModulePattern::with_capacity(4 + n * DIGIT_MODULES + (n - 1) * 2);

    pattern.push_guard(START_GUARD, 4);
    for (i, (&digit, p)) in digits.digits().iter().zip(parity.iter()).enumerate() {
        if i > 0 {
            pattern.push_code(SEPARATOR, 2);
        }
        pattern.push_code(left_code(digit, p), DIGIT_MODULES);
    }
    pattern
}

#[cfg(test)]
mod addon_tests {
    use test_case::test_case;

    use super::{encode2, encode5, EAN2_MODULES, EAN5_MODULES};
    use crate::common::error::BarcodeError;

    #[test_case("00")]
    #[test_case("02")]
    #[test_case("57")]
    #[test_case("99")]
    fn test_encode2_len(digits: &str) {
        let p = encode2(digits).unwrap();
        assert_eq!(p.module_count(), EAN2_MODULES);
        assert_eq!(&p.bars()[..4], &[1, 0, 1, 1]);
        assert_eq!(p.guard_positions(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_encode2_pattern() {
        // 12 % 4 == 0 -> LL
        let p = encode2("12").unwrap();
        assert_eq!(p.to_debug_str(), "#.##..##..#.#..#..##");
        // 34 % 4 == 2 -> GL
        let p = encode2("34").unwrap();
        assert_eq!(p.to_debug_str(), "#.##.#....#.#.#...##");
    }

    #[test]
    fn test_encode5_pattern() {
        // checksum 1 -> GLGLL
        let p = encode5("52495").unwrap();
        assert_eq!(p.module_count(), EAN5_MODULES);
        assert_eq!(p.to_debug_str(), "#.##.###..#.#..#..##.#..###.#.#...#.##.#.##...#");
    }

    #[test_case("1", BarcodeError::InvalidLength { expected: 2, found: 1 })]
    #[test_case("1x", BarcodeError::InvalidCharacter('x'))]
    fn test_encode2_rejects(digits: &str, err: BarcodeError) {
        assert_eq!(encode2(digits), Err(err));
    }

    #[test_case("1234", BarcodeError::InvalidLength { expected: 5, found: 4 })]
    #[test_case("12 45", BarcodeError::InvalidCharacter(' '))]
    fn test_encode5_rejects(digits: &str, err: BarcodeError) {
        assert_eq!(encode5(digits), Err(err));
    }
}
