//-
// Copyright (c) 2026, Freemail Developers
//
// This file is part of Freemail.
//
// Freemail is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public  License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Freemail is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Freemail. If not, see <http://www.gnu.org/licenses/>.

//! The two base-32 text forms used in account files and addresses.
//!
//! Addresses embed the mailsite key body in RFC 4648 base-32 (upper case, no
//! padding), which is what makes them usable as a domain label.
//!
//! RSA key components are stored as radix-32 numerals: digits `0-9a-v`, most
//! significant digit first, no leading zeroes. Since 32 is a power of two,
//! conversion is a matter of regrouping bits and needs no arbitrary-precision
//! arithmetic.

const RFC4648: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const RADIX32: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Encode `data` in RFC 4648 base-32 without padding.
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8 + 4) / 5);
    let mut acc: u16 = 0;
    let mut bits = 0;

    for &byte in data {
        acc = (acc << 8) | u16::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(char::from(RFC4648[usize::from((acc >> bits) & 31)]));
        }
        acc &= (1 << bits) - 1;
    }

    if bits > 0 {
        out.push(char::from(RFC4648[usize::from((acc << (5 - bits)) & 31)]));
    }

    out
}

/// Decode unpadded RFC 4648 base-32, ignoring case.
///
/// Trailing bits which do not make up a whole byte are discarded.
pub fn decode(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut acc: u16 = 0;
    let mut bits = 0;

    for c in text.bytes() {
        let value = match c.to_ascii_uppercase() {
            c @ b'A'..=b'Z' => c - b'A',
            c @ b'2'..=b'7' => c - b'2' + 26,
            _ => return None,
        };

        acc = (acc << 5) | u16::from(value);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
            acc &= (1 << bits) - 1;
        }
    }

    Some(out)
}

/// Format the unsigned big-endian integer in `magnitude` as a radix-32
/// numeral.
pub fn to_radix32(magnitude: &[u8]) -> String {
    let mut digits = Vec::with_capacity(magnitude.len() * 8 / 5 + 1);
    let mut acc: u16 = 0;
    let mut bits = 0;

    for &byte in magnitude.iter().rev() {
        acc |= u16::from(byte) << bits;
        bits += 8;
        while bits >= 5 {
            digits.push(RADIX32[usize::from(acc & 31)]);
            acc >>= 5;
            bits -= 5;
        }
    }
    if bits > 0 {
        digits.push(RADIX32[usize::from(acc & 31)]);
    }

    while digits.len() > 1 && digits.last() == Some(&b'0') {
        digits.pop();
    }
    if digits.is_empty() {
        digits.push(b'0');
    }

    digits.into_iter().rev().map(char::from).collect()
}

/// Parse a radix-32 numeral into an unsigned big-endian integer.
///
/// Upper-case digits are accepted. Returns `None` if `text` is empty or
/// contains anything but digits.
pub fn from_radix32(text: &str) -> Option<Vec<u8>> {
    if text.is_empty() {
        return None;
    }

    let mut bytes = Vec::with_capacity(text.len() * 5 / 8 + 1);
    let mut acc: u16 = 0;
    let mut bits = 0;

    for c in text.bytes().rev() {
        let value = match c.to_ascii_lowercase() {
            c @ b'0'..=b'9' => c - b'0',
            c @ b'a'..=b'v' => c - b'a' + 10,
            _ => return None,
        };

        acc |= u16::from(value) << bits;
        bits += 5;
        if bits >= 8 {
            bytes.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if acc != 0 {
        bytes.push(acc as u8);
    }

    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    bytes.reverse();
    Some(bytes)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn rfc4648_vectors() {
        assert_eq!("", encode(b""));
        assert_eq!("MY", encode(b"f"));
        assert_eq!("MZXQ", encode(b"fo"));
        assert_eq!("MZXW6", encode(b"foo"));
        assert_eq!("MZXW6YQ", encode(b"foob"));
        assert_eq!("MZXW6YTB", encode(b"fooba"));
        assert_eq!("MZXW6YTBOI", encode(b"foobar"));

        assert_eq!(Some(b"foobar".to_vec()), decode("MZXW6YTBOI"));
        assert_eq!(Some(b"foob".to_vec()), decode("mzxw6yq"));
        assert_eq!(None, decode("MZXW6YTBO1"));
    }

    #[test]
    fn radix32_numerals() {
        assert_eq!("0", to_radix32(&[]));
        assert_eq!("0", to_radix32(&[0, 0]));
        assert_eq!("h", to_radix32(&[17]));
        assert_eq!("10", to_radix32(&[32]));
        assert_eq!("100", to_radix32(&[4, 0]));
        assert_eq!("4hk", to_radix32(&[0x12, 0x34]));

        assert_eq!(Some(vec![17]), from_radix32("h"));
        assert_eq!(Some(vec![0x12, 0x34]), from_radix32("4HK"));
        assert_eq!(Some(vec![0x12, 0x34]), from_radix32("004hk"));
        assert_eq!(Some(vec![]), from_radix32("0"));
        assert_eq!(None, from_radix32(""));
        assert_eq!(None, from_radix32("4hw"));
        assert_eq!(None, from_radix32("-1"));
    }

    proptest! {
        #[test]
        fn radix32_preserves_value(
            magnitude in prop::collection::vec(any::<u8>(), 0..64)
        ) {
            let mut expected = magnitude.clone();
            while expected.first() == Some(&0) {
                expected.remove(0);
            }

            let text = to_radix32(&magnitude);
            prop_assert_eq!(Some(expected), from_radix32(&text));
        }

        #[test]
        fn rfc4648_preserves_bytes(
            data in prop::collection::vec(any::<u8>(), 0..64)
        ) {
            prop_assert_eq!(Some(data.clone()), decode(&encode(&data)));
        }
    }
}
