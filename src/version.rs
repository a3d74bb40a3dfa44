//! apk-style version comparison.
//!
//! Orders version strings of the shape `pkgver-rN`: dotted segments where
//! digit runs compare numerically and letter runs lexically, `_alpha`,
//! `_beta`, `_pre` and `_rc` suffixes sort before the plain version while
//! `_cvs`, `_svn`, `_git`, `_hg` and `_p` sort after it, and the `-rN`
//! release counter breaks remaining ties numerically. This covers the
//! version shapes aports actually use; anything stranger still gets a
//! stable total order.

use std::cmp::Ordering;

/// Compare two version strings.
pub fn compare(a: &str, b: &str) -> Ordering {
    let (base_a, rel_a) = split_release(a);
    let (base_b, rel_b) = split_release(b);

    let tokens_a = tokenize(base_a);
    let tokens_b = tokenize(base_b);

    let mut i = 0;
    loop {
        match (tokens_a.get(i), tokens_b.get(i)) {
            (Some(x), Some(y)) => {
                let ord = cmp_token(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(Token::Suffix(rank, _)), None) => {
                return if *rank < 0 {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
            }
            (Some(_), None) => return Ordering::Greater,
            (None, Some(Token::Suffix(rank, _))) => {
                return if *rank < 0 {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
            }
            (None, Some(_)) => return Ordering::Less,
            (None, None) => break,
        }
        i += 1;
    }

    rel_a.cmp(&rel_b)
}

/// Split the `-rN` release counter off a version. Missing counter is 0.
fn split_release(version: &str) -> (&str, u64) {
    if let Some(pos) = version.rfind("-r") {
        if let Ok(release) = version[pos + 2..].parse() {
            return (&version[..pos], release);
        }
    }
    (version, 0)
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    /// Run of digits (kept as text so huge versions don't overflow).
    Num(&'a str),
    /// Run of letters.
    Alpha(&'a str),
    /// `_name[N]` suffix: (rank relative to the plain version, N).
    Suffix(i8, u64),
}

fn suffix_rank(name: &str) -> i8 {
    match name {
        "alpha" => -4,
        "beta" => -3,
        "pre" => -2,
        "rc" => -1,
        "cvs" => 1,
        "svn" => 2,
        "git" => 3,
        "hg" => 4,
        "p" => 5,
        _ => 6,
    }
}

fn tokenize(base: &str) -> Vec<Token<'_>> {
    let bytes = base.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            tokens.push(Token::Num(&base[start..i]));
        } else if c.is_ascii_alphabetic() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            tokens.push(Token::Alpha(&base[start..i]));
        } else if c == b'_' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
                i += 1;
            }
            let name = &base[start..i];
            let num_start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let number = base[num_start..i].parse().unwrap_or(0);
            tokens.push(Token::Suffix(suffix_rank(name), number));
        } else {
            // '.' and any other separator just ends the current token
            i += 1;
        }
    }
    tokens
}

fn cmp_token(a: &Token, b: &Token) -> Ordering {
    use Token::*;
    match (a, b) {
        (Num(x), Num(y)) => cmp_digits(x, y),
        (Alpha(x), Alpha(y)) => x.cmp(y),
        (Suffix(rank_a, num_a), Suffix(rank_b, num_b)) => {
            rank_a.cmp(rank_b).then(num_a.cmp(num_b))
        }
        // digits sort after letters at the same position
        (Num(_), Alpha(_)) => Ordering::Greater,
        (Alpha(_), Num(_)) => Ordering::Less,
        // pre-release suffixes sort below any continuation, post above
        (Suffix(rank, _), _) => {
            if *rank < 0 {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (_, Suffix(rank, _)) => {
            if *rank < 0 {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
    }
}

/// Compare digit runs numerically without parsing into a fixed width.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
