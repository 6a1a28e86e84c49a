//! CCITT Huffman code dictionaries
//!
//! ITU-T T.4 and T.6 define variable-length run codes for white and
//! black runs, plus a short mode-code alphabet for two-dimensional
//! coding. The dictionaries are built once per process and shared by
//! every decoder instance.

use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::io::BitSource;

/// A run-length code value
///
/// Make-up codes (length >= 64) chain onto the following code; a
/// terminating code (length < 64) completes the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCode {
    /// Run length in pixels
    pub length: u16,
    /// True for make-up codes, which must be followed by another code
    pub makeup: bool,
}

/// A two-dimensional coding mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode2d {
    /// Pass mode: skip to b2 without a color change
    Pass,
    /// Horizontal mode: two explicit run lengths follow
    Horizontal,
    /// Vertical mode with offset -3..=3 from b1
    Vertical(i8),
    /// End-of-line code (T.4 only)
    EndOfLine,
}

/// Index of a node within a [`CodeTable`]; 0 marks an absent child
/// since the root can never be a child.
type NodeIndex = u16;

#[derive(Debug, Clone, Copy)]
enum Node {
    Branch { zero: NodeIndex, one: NodeIndex },
    Leaf(u16),
}

/// A binary prefix-code dictionary stored as a flat node arena
pub struct CodeTable<V> {
    nodes: Vec<Node>,
    values: Vec<V>,
}

impl<V> CodeTable<V> {
    fn new() -> Self {
        Self {
            nodes: vec![Node::Branch { zero: 0, one: 0 }],
            values: Vec::new(),
        }
    }

    /// Inserts `value` under the code written as a string of '0'/'1'
    ///
    /// Only used at table construction; conflicting codes are a bug in
    /// the built-in tables, hence the panics.
    fn add(&mut self, code: &str, value: V) {
        let value_index = self.values.len() as u16;
        self.values.push(value);

        let mut idx = 0usize;
        let last = code.len() - 1;
        for (i, c) in code.chars().enumerate() {
            let bit = c == '1';
            let child = match self.nodes[idx] {
                Node::Branch { zero, one } => if bit { one } else { zero },
                Node::Leaf(_) => panic!("code {} conflicts with a shorter code", code),
            };

            let child = if child == 0 {
                let new_index = self.nodes.len() as NodeIndex;
                self.nodes.push(if i == last {
                    Node::Leaf(value_index)
                } else {
                    Node::Branch { zero: 0, one: 0 }
                });
                match &mut self.nodes[idx] {
                    Node::Branch { zero, one } => {
                        if bit { *one = new_index } else { *zero = new_index }
                    }
                    Node::Leaf(_) => unreachable!(),
                }
                new_index
            } else {
                child
            };
            idx = child as usize;
        }
        match self.nodes[idx] {
            Node::Leaf(_) => {}
            Node::Branch { .. } => panic!("code {} is a prefix of a longer code", code),
        }
    }

    /// Consumes bits until a complete code is recognized
    ///
    /// An undefined bit sequence is corrupt input, not a panic.
    pub fn decode(&self, bits: &mut BitSource) -> Result<&V> {
        let mut idx = 0usize;
        loop {
            let bit = bits.read_bit()?;
            let child = match self.nodes[idx] {
                Node::Branch { zero, one } => if bit { one } else { zero },
                Node::Leaf(_) => unreachable!(),
            };
            if child == 0 {
                return Err(Error::CorruptData("undefined Huffman code".to_string()));
            }
            match self.nodes[child as usize] {
                Node::Leaf(v) => return Ok(&self.values[v as usize]),
                Node::Branch { .. } => idx = child as usize,
            }
        }
    }
}

/// Terminating white run codes, indexed by run length 0..=63
const WHITE_TERMINATING: [&str; 64] = [
    "00110101", "000111", "0111", "1000", "1011", "1100", "1110", "1111",
    "10011", "10100", "00111", "01000", "001000", "000011", "110100", "110101",
    "101010", "101011", "0100111", "0001100", "0001000", "0010111", "0000011", "0000100",
    "0101000", "0101011", "0010011", "0100100", "0011000", "00000010", "00000011", "00011010",
    "00011011", "00010010", "00010011", "00010100", "00010101", "00010110", "00010111", "00101000",
    "00101001", "00101010", "00101011", "00101100", "00101101", "00000100", "00000101", "00001010",
    "00001011", "01010010", "01010011", "01010100", "01010101", "00100100", "00100101", "01011000",
    "01011001", "01011010", "01011011", "01001010", "01001011", "00110010", "00110011", "00110100",
];

/// White make-up codes for run lengths 64..=1728
const WHITE_MAKEUP: [(u16, &str); 27] = [
    (64, "11011"), (128, "10010"), (192, "010111"), (256, "0110111"),
    (320, "00110110"), (384, "00110111"), (448, "01100100"), (512, "01100101"),
    (576, "01101000"), (640, "01100111"), (704, "011001100"), (768, "011001101"),
    (832, "011010010"), (896, "011010011"), (960, "011010100"), (1024, "011010101"),
    (1088, "011010110"), (1152, "011010111"), (1216, "011011000"), (1280, "011011001"),
    (1344, "011011010"), (1408, "011011011"), (1472, "010011000"), (1536, "010011001"),
    (1600, "010011010"), (1664, "011000"), (1728, "010011011"),
];

/// Terminating black run codes, indexed by run length 0..=63
const BLACK_TERMINATING: [&str; 64] = [
    "0000110111", "010", "11", "10", "011", "0011", "0010", "00011",
    "000101", "000100", "0000100", "0000101", "0000111", "00000100", "00000111", "000011000",
    "0000010111", "0000011000", "0000001000", "00001100111", "00001101000", "00001101100", "00000110111", "00000101000",
    "00000010111", "00000011000", "000011001010", "000011001011", "000011001100", "000011001101", "000001101000", "000001101001",
    "000001101010", "000001101011", "000011010010", "000011010011", "000011010100", "000011010101", "000011010110", "000011010111",
    "000001101100", "000001101101", "000011011010", "000011011011", "000001010100", "000001010101", "000001010110", "000001010111",
    "000001100100", "000001100101", "000001010010", "000001010011", "000000100100", "000000110111", "000000111000", "000000100111",
    "000000101000", "000001011000", "000001011001", "000000101011", "000000101100", "000001011010", "000001100110", "000001100111",
];

/// Black make-up codes for run lengths 64..=1728
const BLACK_MAKEUP: [(u16, &str); 27] = [
    (64, "0000001111"), (128, "000011001000"), (192, "000011001001"), (256, "000001011011"),
    (320, "000000110011"), (384, "000000110100"), (448, "000000110101"), (512, "0000001101100"),
    (576, "0000001101101"), (640, "0000001001010"), (704, "0000001001011"), (768, "0000001001100"),
    (832, "0000001001101"), (896, "0000001110010"), (960, "0000001110011"), (1024, "0000001110100"),
    (1088, "0000001110101"), (1152, "0000001110110"), (1216, "0000001110111"), (1280, "0000001010010"),
    (1344, "0000001010011"), (1408, "0000001010100"), (1472, "0000001010101"), (1536, "0000001011010"),
    (1600, "0000001011011"), (1664, "0000001100100"), (1728, "0000001100101"),
];

/// Extended make-up codes 1792..=2560, shared by both colors
const EXTENDED_MAKEUP: [(u16, &str); 13] = [
    (1792, "00000001000"), (1856, "00000001100"), (1920, "00000001101"),
    (1984, "000000010010"), (2048, "000000010011"), (2112, "000000010100"),
    (2176, "000000010101"), (2240, "000000010110"), (2304, "000000010111"),
    (2368, "000000011100"), (2432, "000000011101"), (2496, "000000011110"),
    (2560, "000000011111"),
];

fn build_run_table(terminating: &[&str; 64], makeup: &[(u16, &str); 27]) -> CodeTable<RunCode> {
    let mut table = CodeTable::new();
    for (length, code) in terminating.iter().enumerate() {
        table.add(code, RunCode { length: length as u16, makeup: false });
    }
    for &(length, code) in makeup {
        table.add(code, RunCode { length, makeup: true });
    }
    for &(length, code) in &EXTENDED_MAKEUP {
        table.add(code, RunCode { length, makeup: true });
    }
    table
}

fn build_mode_table() -> CodeTable<Mode2d> {
    let mut table = CodeTable::new();
    table.add("1", Mode2d::Vertical(0));
    table.add("011", Mode2d::Vertical(1));
    table.add("010", Mode2d::Vertical(-1));
    table.add("001", Mode2d::Horizontal);
    table.add("0001", Mode2d::Pass);
    table.add("000011", Mode2d::Vertical(2));
    table.add("000010", Mode2d::Vertical(-2));
    table.add("0000011", Mode2d::Vertical(3));
    table.add("0000010", Mode2d::Vertical(-3));
    table.add("000000000001", Mode2d::EndOfLine);
    table
}

/// White run-length dictionary
pub static WHITE_CODES: Lazy<CodeTable<RunCode>> =
    Lazy::new(|| build_run_table(&WHITE_TERMINATING, &WHITE_MAKEUP));

/// Black run-length dictionary
pub static BLACK_CODES: Lazy<CodeTable<RunCode>> =
    Lazy::new(|| build_run_table(&BLACK_TERMINATING, &BLACK_MAKEUP));

/// Two-dimensional mode dictionary
pub static MODE_CODES: Lazy<CodeTable<Mode2d>> = Lazy::new(build_mode_table);

const fn build_leading_runs(ones: bool) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0usize;
    while i < 256 {
        let b = if ones { !(i as u8) } else { i as u8 };
        table[i] = b.leading_zeros() as u8;
        i += 1;
    }
    table
}

/// Leading-zero-bit count for each byte value (8 for 0x00)
pub static ZERO_RUNS: [u8; 256] = build_leading_runs(false);

/// Leading-one-bit count for each byte value (8 for 0xFF)
pub static ONE_RUNS: [u8; 256] = build_leading_runs(true);
