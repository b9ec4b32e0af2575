//! Dot-separated version comparison.
//!
//! `compare` returns `None` when either side has a part that is not a
//! valid version component; callers decide what an uncomparable version
//! means for them.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Compare parts as strings and allow trailing letters (`1.2b`).
    pub lexicographical: bool,
    /// Pad the shorter version with `0` parts before comparing.
    pub zero_extend: bool,
}

pub fn compare(v1: &str, v2: &str, opts: CompareOptions) -> Option<Ordering> {
    let mut a: Vec<&str> = v1.split('.').collect();
    let mut b: Vec<&str> = v2.split('.').collect();

    let valid = |p: &&str| is_valid_part(p, opts.lexicographical);
    if !a.iter().all(valid) || !b.iter().all(valid) {
        return None;
    }

    if opts.zero_extend {
        while a.len() < b.len() {
            a.push("0");
        }
        while b.len() < a.len() {
            b.push("0");
        }
    }

    for (x, y) in a.iter().zip(b.iter()) {
        let ord = if opts.lexicographical {
            x.cmp(y)
        } else {
            numeric_cmp(x, y)
        };
        if ord != Ordering::Equal {
            return Some(ord);
        }
    }

    Some(a.len().cmp(&b.len()))
}

/// `compare` with default options.
pub fn compare_versions(v1: &str, v2: &str) -> Option<Ordering> {
    compare(v1, v2, CompareOptions::default())
}

fn is_valid_part(part: &str, lexicographical: bool) -> bool {
    let digits = part.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    let rest = &part[digits..];
    if lexicographical {
        rest.bytes().all(|c| c.is_ascii_alphabetic())
    } else {
        rest.is_empty()
    }
}

/// Digit strings of any length, compared by value.
fn numeric_cmp(x: &str, y: &str) -> Ordering {
    let x = x.trim_start_matches('0');
    let y = y.trim_start_matches('0');
    x.len().cmp(&y.len()).then_with(|| x.cmp(y))
}
