use crate::common::{digits::DigitString, error::BarcodeResult};

// Module pattern
//------------------------------------------------------------------------------

/// Fixed length run of modules, 1 dark and 0 light, plus the indices whose
/// bars are drawn taller than the nominal symbol height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePattern {
    bars: Vec<u8>,
    guards: Vec<usize>,
}

impl ModulePattern {
    pub(crate) fn with_capacity(len: usize) -> Self {
        Self { bars: Vec::with_capacity(len), guards: Vec::new() }
    }

    pub fn bars(&self) -> &[u8] {
        &self.bars
    }

    pub fn module_count(&self) -> usize {
        self.bars.len()
    }

    pub fn guard_positions(&self) -> &[usize] {
        &self.guards
    }

    pub fn is_dark(&self, i: usize) -> bool {
        self.bars[i] == 1
    }

    pub fn is_guard(&self, i: usize) -> bool {
        self.guards.binary_search(&i).is_ok()
    }

    /// Writes the `len` low bits of `code`, most significant first.
    pub(crate) fn push_code(&mut self, code: u8, len: usize) {
        self.bars.extend((0..len).rev().map(|s| (code >> s) & 1));
    }

    pub(crate) fn push_guard(&mut self, code: u8, len: usize) {
        let start = self.bars.len();
        self.push_code(code, len);
        self.guards.extend(start..start + len);
    }

    pub fn to_debug_str(&self) -> String {
        self.bars.iter().map(|&b| if b == 1 { '#' } else { '.' }).collect()
    }
}

// Digit tables
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Parity {
    /// Odd parity, left hand A set.
    L,
    /// Even parity, left hand B set.
    G,
}

/// Per-digit choice between the L and G tables.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ParityPattern(&'static str);

impl ParityPattern {
    pub(crate) const fn new(pattern: &'static str) -> Self {
        Self(pattern)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Parity> {
        self.0.bytes().map(|b| if b == b'L' { Parity::L } else { Parity::G })
    }
}

pub const L_CODES: [u8; 10] = [
    0b0001101, 0b0011001, 0b0010011, 0b0111101, 0b0100011, 0b0110001, 0b0101111, 0b0111011,
    0b0110111, 0b0001011,
];

pub const G_CODES: [u8; 10] = [
    0b0100111, 0b0110011, 0b0011011, 0b0100001, 0b0011101, 0b0111001, 0b0000101, 0b0010001,
    0b0001001, 0b0010111,
];

pub const R_CODES: [u8; 10] = [
    0b1110010, 0b1100110, 0b1101100, 0b1000010, 0b1011100, 0b1001110, 0b1010000, 0b1000100,
    0b1001000, 0b1110100,
];

/// Left half parity keyed by the leading digit.
pub const EAN13_PARITY: [ParityPattern; 10] = [
    ParityPattern::new("LLLLLL"),
    ParityPattern::new("LLGLGG"),
    ParityPattern::new("LLGGLG"),
    ParityPattern::new("LLGGGL"),
    ParityPattern::new("LGLLGG"),
    ParityPattern::new("LGGLLG"),
    ParityPattern::new("LGGGLL"),
    ParityPattern::new("LGLGLG"),
    ParityPattern::new("LGLGGL"),
    ParityPattern::new("LGGLGL"),
];

pub const DIGIT_MODULES: usize = 7;

pub(crate) fn left_code(digit: u8, parity: Parity) -> u8 {
    match parity {
        Parity::L => L_CODES[digit as usize],
        Parity::G => G_CODES[digit as usize],
    }
}

// EAN-13 symbol
//------------------------------------------------------------------------------

pub const EAN13_MODULES: usize = 95;
const START_GUARD: u8 = 0b101;
const CENTER_GUARD: u8 = 0b01010;
const END_GUARD: u8 = 0b101;

/// Encodes 13 digits into the 95 module EAN-13 pattern.
///
/// Checksum correctness is the caller's concern; only length and digit
/// content are enforced here.
pub fn encode(digits: &str) -> BarcodeResult<ModulePattern> {
    let digits = DigitString::parse(digits, 13)?;
    Ok(encode_digits(&digits))
}

pub(crate) fn encode_digits(digits: &DigitString) -> ModulePattern {
    debug_assert!(digits.len() == 13, "EAN-13 needs 13 digits, got {}", digits.len());

    let d = digits.digits();
    let parity = EAN13_PARITY[d[0] as usize];
    let mut pattern = ModulePattern::with_capacity(EAN13_MODULES);

    pattern.push_guard(START_GUARD, 3);
    for (&digit, p) in d[1..7].iter().zip(parity.iter()) {
        pattern.push_code(left_code(digit, p), DIGIT_MODULES);
    }
    pattern.push_guard(CENTER_GUARD, 5);
    for &digit in &d[7..13] {
        pattern.push_code(R_CODES[digit as usize], DIGIT_MODULES);
    }
    pattern.push_guard(END_GUARD, 3);

    debug_assert!(pattern.module_count() == EAN13_MODULES);
    pattern
}

#[cfg(test)]
mod symbol_tests {
    use test_case::test_case;

    use super::{encode, ModulePattern, EAN13_PARITY, G_CODES, L_CODES, R_CODES};
    use crate::common::error::BarcodeError;

    #[test]
    fn test_push_code() {
        let mut p = ModulePattern::with_capacity(10);
        p.push_guard(0b101, 3);
        p.push_code(0b0001101, 7);
        assert_eq!(p.to_debug_str(), "#.#...##.#");
        assert_eq!(p.guard_positions(), &[0, 1, 2]);
        assert!(p.is_guard(2));
        assert!(!p.is_guard(3));
    }

    #[test]
    fn test_tables_disjoint() {
        for i in 0..10 {
            for j in 0..10 {
                assert_ne!(L_CODES[i], G_CODES[j]);
                assert_ne!(L_CODES[i], R_CODES[j]);
            }
            // R is the bitwise complement of L
            assert_eq!(R_CODES[i], !L_CODES[i] & 0x7f);
        }
        assert!(EAN13_PARITY.iter().all(|p| p.as_str().starts_with('L')));
    }

    #[test]
    fn test_encode() {
        let p = encode("9787564922351").unwrap();
        assert_eq!(p.module_count(), 95);
        assert_eq!(
            p.to_debug_str(),
            "#.#.###.##...#..#..#...#.##...#....#.#.#...##.#.#.###.#..##.##..##.##..#....#.#..###.##..##.#.#"
        );
        let guards = [0, 1, 2, 45, 46, 47, 48, 49, 92, 93, 94];
        assert_eq!(p.guard_positions(), &guards);
    }

    #[test_case("978756492235", BarcodeError::InvalidLength { expected: 13, found: 12 })]
    #[test_case("978756492235a", BarcodeError::InvalidCharacter('a'))]
    fn test_encode_rejects(digits: &str, err: BarcodeError) {
        assert_eq!(encode(digits), Err(err));
    }

    #[test]
    fn test_encode_ignores_checksum() {
        assert!(encode("0000000000000").is_ok());
    }
}
