//! G-code blocks
//!
//! Just enough of a G-code front end for the probe plugin: a byte-fed
//! line assembler and a word tokenizer that pulls out the M-code and the
//! `P`/`S` value words. Any other word is remembered so validation can
//! reject blocks with unused words.

use heapless::{String, Vec};

use crate::status::Status;

/// Longest accepted line, without terminator
pub const MAX_LINE_LEN: usize = 96;

/// Set of word letters present in a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Words(u32);

impl Words {
    /// No words
    pub const EMPTY: Words = Words(0);

    fn bit(letter: char) -> u32 {
        1 << (letter as u32 - 'A' as u32)
    }

    /// Add a letter (`A`..=`Z`)
    pub fn insert(&mut self, letter: char) {
        if letter.is_ascii_uppercase() {
            self.0 |= Self::bit(letter);
        }
    }

    /// Check for a letter
    pub fn contains(self, letter: char) -> bool {
        letter.is_ascii_uppercase() && self.0 & Self::bit(letter) != 0
    }

    /// Letters in `self` but not in `other`
    pub fn without(self, other: Words) -> Words {
        Words(self.0 & !other.0)
    }

    /// Check for no letters
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Build from a list of letters
    pub fn of(letters: &[char]) -> Words {
        let mut w = Words::EMPTY;
        for l in letters {
            w.insert(*l);
        }
        w
    }
}

/// A tokenized block
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Block {
    /// M-code number, if the block has one
    pub mcode: Option<u16>,
    /// `P` word value; NaN if the number was malformed
    pub p: Option<f32>,
    /// `S` word value; NaN if the number was malformed
    pub s: Option<f32>,
    /// Every word letter present, `M` included
    pub words: Words,
}

impl Block {
    /// Tokenize one line
    ///
    /// Spaces are ignored, letters are case-insensitive, `( )` comments
    /// and anything after `;` are skipped.
    pub fn parse(line: &str) -> Result<Block, Status> {
        let mut block = Block::default();
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                ' ' | '\t' | '\r' | '\n' => continue,
                ';' => break,
                '(' => {
                    for c in chars.by_ref() {
                        if c == ')' {
                            break;
                        }
                    }
                    continue;
                }
                _ => {}
            }

            let letter = c.to_ascii_uppercase();
            if !letter.is_ascii_uppercase() {
                return Err(Status::ExpectedCommandLetter);
            }

            let mut number: String<16> = String::new();
            while let Some(&n) = chars.peek() {
                if n == ' ' {
                    chars.next();
                    continue;
                }
                if !(n.is_ascii_digit() || n == '.' || n == '-' || n == '+') {
                    break;
                }
                if number.push(n).is_err() {
                    return Err(Status::BadNumberFormat);
                }
                chars.next();
            }
            let value: f32 = number.parse().unwrap_or(f32::NAN);

            match letter {
                'M' => {
                    if block.mcode.is_some() {
                        return Err(Status::GcodeModalGroupViolation);
                    }
                    block.mcode = Some(as_code(value).ok_or(Status::BadNumberFormat)?);
                }
                'P' => block.p = Some(value),
                'S' => block.s = Some(value),
                _ => {}
            }
            block.words.insert(letter);
        }

        Ok(block)
    }

    /// Words other than `M` and the given consumed letters
    pub fn unused_words(&self, consumed: &[char]) -> Words {
        let mut used = Words::of(consumed);
        used.insert('M');
        self.words.without(used)
    }
}

/// Whole non-negative number that fits a command code
fn as_code(value: f32) -> Option<u16> {
    let in_range = value >= 0.0 && value <= u16::MAX as f32;
    if in_range && (value as u16) as f32 == value {
        Some(value as u16)
    } else {
        None
    }
}

/// Byte-fed line assembler
///
/// Collects bytes until `\n` or `\r`. Over-long lines are discarded whole
/// and reported once complete.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    buffer: Vec<u8, MAX_LINE_LEN>,
    overflow: bool,
    /// Buffer holds a line already handed out
    complete: bool,
}

/// Outcome of feeding one byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent<'a> {
    /// A complete non-empty line
    Line(&'a str),
    /// A line exceeded [`MAX_LINE_LEN`] or was not UTF-8
    Invalid,
}

impl LineBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.overflow = false;
        self.complete = false;
    }

    /// Feed a single byte
    ///
    /// Returns an event when a terminator completes a line. Blank lines
    /// produce nothing.
    pub fn feed(&mut self, byte: u8) -> Option<LineEvent<'_>> {
        if self.complete {
            self.reset();
        }

        if byte != b'\n' && byte != b'\r' {
            if self.buffer.push(byte).is_err() {
                self.overflow = true;
            }
            return None;
        }

        if self.overflow {
            self.reset();
            return Some(LineEvent::Invalid);
        }
        if self.buffer.is_empty() {
            return None;
        }

        self.complete = true;
        match core::str::from_utf8(&self.buffer) {
            Ok(line) => Some(LineEvent::Line(line)),
            Err(_) => Some(LineEvent::Invalid),
        }
    }
}
