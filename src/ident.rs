//! Identifier synthesis: turn free-form protocol labels into valid Rust
//! identifiers, in both UpperCamel and lower_snake form.
//!
//! Labels come straight out of standards prose, so they carry spaces, punctuation,
//! parentheses, slashes, acronym runs ("TAIList") and sometimes a leading
//! numeral ("200 kbps"). Tokenization splits on camel-case boundaries,
//! hex/decimal literals and any other non-alphanumeric byte; runs of single
//! capitals fold back into one acronym token. A purely numeric *first* token
//! is expanded to English number words so the identifier stays pronounceable.

/// A label broken into word tokens, renderable as camel or snake case.
#[derive(Debug, Clone)]
pub struct Ident {
    words: Vec<String>,
}

impl Ident {
    pub fn new(label: &str) -> Self {
        // a bare hyphen would otherwise tokenize to nothing
        let words = if label == "-" {
            vec!["minus".to_string()]
        } else {
            tokenize(label)
        };
        Ident { words }
    }

    /// UpperCamel rendering: lowercase-initial tokens get capitalized,
    /// acronym tokens pass through unchanged.
    pub fn upper_camel(&self) -> String {
        if self.words.is_empty() {
            return "Unnamed".to_string();
        }
        let mut out = String::new();
        for word in &self.words {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) if first.is_lowercase() => {
                    out.extend(first.to_uppercase());
                    out.push_str(chars.as_str());
                }
                _ => out.push_str(word),
            }
        }
        fix_reserved(out)
    }

    /// lower_snake rendering: lowercase everything, join with underscores.
    pub fn snake(&self) -> String {
        if self.words.is_empty() {
            return "unnamed".to_string();
        }
        let joined = self
            .words
            .iter()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join("_");
        fix_reserved(joined)
    }
}

/// UpperCamel form of a label, e.g. `"foo bar (baz)"` -> `"FooBarBaz"`.
pub fn upper_camel_case(label: &str) -> String {
    Ident::new(label).upper_camel()
}

/// lower_snake form of a label, e.g. `"FooBar (baz)"` -> `"foo_bar_baz"`.
pub fn snake_case(label: &str) -> String {
    Ident::new(label).snake()
}

/// Identifiers that collide with Rust keywords are shortened by one character
/// (so `type` renders as `typ`). Applied to both rendered forms.
fn fix_reserved(ident: String) -> String {
    const RESERVED: &[&str] = &["type"];
    if RESERVED.contains(&ident.as_str()) {
        let mut s = ident;
        s.pop();
        s
    } else {
        ident
    }
}

/// One scanned piece of the label, before acronym folding.
enum Piece {
    /// `[A-Z][a-z]*`, `0x` + digits, a digit run, or a lowercase run.
    Word(String),
    /// A single non-alphanumeric character.
    Separator(char),
}

/// Scan the label into pieces. Mirrors a longest-match-at-point scan of
/// `[A-Z][a-z]*` / `0x<digits>` / `<digits>` / single separator, with
/// lowercase runs as the leftover text between matches.
fn scan(label: &str) -> Vec<Piece> {
    let chars: Vec<char> = label.chars().collect();
    let mut pieces = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_uppercase() {
            let mut word = String::new();
            word.push(c);
            i += 1;
            while i < chars.len() && chars[i].is_ascii_lowercase() {
                word.push(chars[i]);
                i += 1;
            }
            pieces.push(Piece::Word(word));
        } else if c == '0'
            && chars.get(i + 1) == Some(&'x')
            && chars.get(i + 2).is_some_and(|c| c.is_ascii_digit())
        {
            let mut word = String::from("0x");
            i += 2;
            while i < chars.len() && chars[i].is_ascii_digit() {
                word.push(chars[i]);
                i += 1;
            }
            pieces.push(Piece::Word(word));
        } else if c.is_ascii_digit() {
            let mut word = String::new();
            while i < chars.len() && chars[i].is_ascii_digit() {
                word.push(chars[i]);
                i += 1;
            }
            pieces.push(Piece::Word(word));
        } else if c.is_ascii_lowercase() {
            let mut word = String::new();
            while i < chars.len() && chars[i].is_ascii_lowercase() {
                word.push(chars[i]);
                i += 1;
            }
            pieces.push(Piece::Word(word));
        } else {
            pieces.push(Piece::Separator(c));
            i += 1;
        }
    }
    pieces
}

/// Split a label into word tokens. Consecutive single capitals accumulate
/// into one acronym token ("TAI" stays whole). A numeric token in first
/// position expands to English number words, themselves re-tokenized.
fn tokenize(label: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut acronym: Option<String> = None;

    for piece in scan(label) {
        match piece {
            Piece::Separator(c) => {
                if c == '+' {
                    tokens.push("plus".to_string());
                }
                if let Some(a) = acronym.take() {
                    tokens.push(a);
                }
            }
            Piece::Word(word) => {
                let single_upper =
                    word.len() == 1 && word.chars().next().is_some_and(|c| c.is_ascii_uppercase());
                if single_upper {
                    match acronym.as_mut() {
                        Some(a) => a.push_str(&word),
                        None => acronym = Some(word),
                    }
                } else {
                    if let Some(a) = acronym.take() {
                        tokens.push(a);
                    }
                    let is_number = word.starts_with("0x") || word.chars().all(|c| c.is_ascii_digit());
                    if is_number && tokens.is_empty() {
                        tokens.extend(tokenize(&number_to_words(&word)));
                        continue;
                    }
                    tokens.push(word);
                }
            }
        }
    }
    if let Some(a) = acronym {
        tokens.push(a);
    }
    tokens
}

/// English expansion of a numeric token ("200" -> "two hundred",
/// "0x0006" -> "six"). Hex tokens carry only decimal digits after the `0x`
/// prefix, so the digit portion is read as a plain number. Values too large
/// for u64 fall back to digit-by-digit words.
fn number_to_words(token: &str) -> String {
    let digits = token.strip_prefix("0x").unwrap_or(token);
    match digits.parse::<u64>() {
        Ok(n) => spell_number(n),
        Err(_) => digits
            .chars()
            .filter_map(|c| c.to_digit(10))
            .map(|d| spell_number(d as u64))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];
const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];
const SCALES: [&str; 7] = [
    "", "thousand", "million", "billion", "trillion", "quadrillion", "quintillion",
];

fn spell_under_thousand(n: u64) -> String {
    debug_assert!(n < 1000);
    if n < 20 {
        return ONES[n as usize].to_string();
    }
    if n < 100 {
        let tens = TENS[(n / 10) as usize];
        return if n % 10 == 0 {
            tens.to_string()
        } else {
            format!("{}-{}", tens, ONES[(n % 10) as usize])
        };
    }
    let hundreds = format!("{} hundred", ONES[(n / 100) as usize]);
    if n % 100 == 0 {
        hundreds
    } else {
        format!("{} and {}", hundreds, spell_under_thousand(n % 100))
    }
}

/// British-style spelling ("one hundred and twenty-three"); the connective
/// words and hyphens all split apart again during re-tokenization.
fn spell_number(n: u64) -> String {
    if n == 0 {
        return "zero".to_string();
    }
    // break into thousand-groups, least significant first
    let mut groups = Vec::new();
    let mut rest = n;
    while rest > 0 {
        groups.push(rest % 1000);
        rest /= 1000;
    }
    let mut parts = Vec::new();
    for (scale, &group) in groups.iter().enumerate().rev() {
        if group == 0 {
            continue;
        }
        let words = spell_under_thousand(group);
        if scale == 0 {
            parts.push(words);
        } else {
            parts.push(format!("{} {}", words, SCALES[scale]));
        }
    }
    parts.join(", ")
}
