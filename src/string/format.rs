//! `printf`-style formatting into a [`FurryString`].
//!
//! Output is byte-for-byte what C's `printf` produces for the same format
//! and values, so files written with `%02X` and friends keep their exact
//! layout. Arguments are passed as a slice of [`Arg`], which is what the
//! [`furry_printf!`](crate::furry_printf) and
//! [`furry_cat_printf!`](crate::furry_cat_printf) macros build; functions
//! that already hold an argument slice forward it to
//! [`FurryString::printf`] directly.
//!
//! Supported conversions: `d i u o x X c s f F e E g G p %`, flags
//! `- + space # 0`, width and precision (numeric or `*`), and length
//! modifiers `hh h l ll z j t L`. Without a length modifier integers are
//! 32-bit, like C's `int`; `l` and wider are 64-bit. `%c` takes a `char`
//! and writes its UTF-8 encoding, so a non-ASCII character produces two to
//! four bytes where C would write one.

use super::FurryString;
use crate::error::{Error, Result};
use core::fmt;

/// One formatting argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    Int(i64),
    Uint(u64),
    Float(f64),
    Char(char),
    Str(&'a [u8]),
    Ptr(usize),
}

macro_rules! arg_from {
    ($variant:ident as $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Arg<'_> {
                fn from(v: $t) -> Self {
                    Arg::$variant(v as $target)
                }
            }
        )*
    };
}

arg_from!(Int as i64: i8, i16, i32, i64, isize);
arg_from!(Uint as u64: u8, u16, u32, u64, usize);
arg_from!(Float as f64: f32, f64);

impl From<char> for Arg<'_> {
    fn from(c: char) -> Self {
        Arg::Char(c)
    }
}

impl From<bool> for Arg<'_> {
    fn from(b: bool) -> Self {
        Arg::Int(i64::from(b))
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::Str(s.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(s: &'a [u8]) -> Self {
        Arg::Str(s)
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(s: &'a String) -> Self {
        Arg::Str(s.as_bytes())
    }
}

impl<'a> From<&'a FurryString> for Arg<'a> {
    fn from(s: &'a FurryString) -> Self {
        Arg::Str(s.as_bytes())
    }
}

impl<T> From<*const T> for Arg<'_> {
    fn from(p: *const T) -> Self {
        Arg::Ptr(p as usize)
    }
}

impl<T> From<*mut T> for Arg<'_> {
    fn from(p: *mut T) -> Self {
        Arg::Ptr(p as usize)
    }
}

/// Overwrite `$s` with `printf`-formatted output.
///
/// ```
/// use furry_core::{furry_printf, FurryString};
///
/// let mut s = FurryString::new();
/// furry_printf!(s, "Key: %02X %s", 0x0A, "value").unwrap();
/// assert_eq!(s.as_bytes(), b"Key: 0A value");
/// ```
#[macro_export]
macro_rules! furry_printf {
    ($s:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $s.printf($fmt, &[$($crate::string::Arg::from($arg)),*])
    };
}

/// Append `printf`-formatted output to `$s`.
#[macro_export]
macro_rules! furry_cat_printf {
    ($s:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $s.cat_printf($fmt, &[$($crate::string::Arg::from($arg)),*])
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Length {
    Char,
    Short,
    Int,
    Wide,
}

impl Length {
    fn signed(self, v: i64) -> i64 {
        match self {
            Length::Char => i64::from(v as i8),
            Length::Short => i64::from(v as i16),
            Length::Int => i64::from(v as i32),
            Length::Wide => v,
        }
    }

    fn unsigned(self, v: u64) -> u64 {
        match self {
            Length::Char => u64::from(v as u8),
            Length::Short => u64::from(v as u16),
            Length::Int => u64::from(v as u32),
            Length::Wide => v,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Spec {
    left: bool,
    plus: bool,
    space: bool,
    alt: bool,
    zero: bool,
    width: usize,
    precision: Option<usize>,
    length: Length,
}

impl Default for Spec {
    fn default() -> Self {
        Self {
            left: false,
            plus: false,
            space: false,
            alt: false,
            zero: false,
            width: 0,
            precision: None,
            length: Length::Int,
        }
    }
}

struct Args<'s, 'a> {
    args: &'s [Arg<'a>],
    next: usize,
}

impl<'a> Args<'_, 'a> {
    fn next(&mut self) -> Result<Arg<'a>> {
        let arg = self.args.get(self.next).copied().ok_or(Error::InvalidFormat)?;
        self.next += 1;
        Ok(arg)
    }

    fn next_int(&mut self) -> Result<i64> {
        match self.next()? {
            Arg::Int(v) => Ok(v),
            Arg::Uint(v) => Ok(v as i64),
            Arg::Char(c) => Ok(i64::from(u32::from(c))),
            _ => Err(Error::InvalidFormat),
        }
    }

    fn next_uint(&mut self) -> Result<u64> {
        match self.next()? {
            Arg::Int(v) => Ok(v as u64),
            Arg::Uint(v) => Ok(v),
            Arg::Char(c) => Ok(u64::from(u32::from(c))),
            Arg::Ptr(p) => Ok(p as u64),
            _ => Err(Error::InvalidFormat),
        }
    }

    fn next_float(&mut self) -> Result<f64> {
        match self.next()? {
            Arg::Float(v) => Ok(v),
            Arg::Int(v) => Ok(v as f64),
            Arg::Uint(v) => Ok(v as f64),
            _ => Err(Error::InvalidFormat),
        }
    }
}

/// Write `body` preceded by `sign`, padded to the spec's width.
///
/// Zero padding goes between the sign/prefix and the digits.
fn pad(out: &mut Vec<u8>, spec: &Spec, sign: &[u8], body: &[u8], zero_pad: bool) {
    let len = sign.len() + body.len();
    let fill = spec.width.saturating_sub(len);
    if spec.left {
        out.extend_from_slice(sign);
        out.extend_from_slice(body);
        out.resize(out.len() + fill, b' ');
    } else if zero_pad {
        out.extend_from_slice(sign);
        out.resize(out.len() + fill, b'0');
        out.extend_from_slice(body);
    } else {
        out.resize(out.len() + fill, b' ');
        out.extend_from_slice(sign);
        out.extend_from_slice(body);
    }
}

fn digits(mut v: u64, radix: u64, upper: bool) -> Vec<u8> {
    let table: &[u8; 16] = if upper {
        b"0123456789ABCDEF"
    } else {
        b"0123456789abcdef"
    };
    let mut out = Vec::new();
    loop {
        out.push(table[(v % radix) as usize]);
        v /= radix;
        if v == 0 {
            break;
        }
    }
    out.reverse();
    out
}

fn write_integer(out: &mut Vec<u8>, spec: &Spec, negative: bool, magnitude: u64, conv: u8) {
    let (radix, upper) = match conv {
        b'o' => (8, false),
        b'x' => (16, false),
        b'X' => (16, true),
        _ => (10, false),
    };
    let mut body = if spec.precision == Some(0) && magnitude == 0 {
        Vec::new()
    } else {
        digits(magnitude, radix, upper)
    };
    if let Some(precision) = spec.precision {
        if precision > body.len() {
            let mut padded = vec![b'0'; precision - body.len()];
            padded.extend_from_slice(&body);
            body = padded;
        }
    }
    if conv == b'o' && spec.alt && body.first() != Some(&b'0') {
        body.insert(0, b'0');
    }

    let mut prefix: Vec<u8> = Vec::new();
    if matches!(conv, b'd' | b'i') {
        if negative {
            prefix.push(b'-');
        } else if spec.plus {
            prefix.push(b'+');
        } else if spec.space {
            prefix.push(b' ');
        }
    }
    if spec.alt && magnitude != 0 {
        match conv {
            b'x' => prefix.extend_from_slice(b"0x"),
            b'X' => prefix.extend_from_slice(b"0X"),
            _ => {}
        }
    }
    let zero_pad = spec.zero && spec.precision.is_none();
    pad(out, spec, &prefix, &body, zero_pad);
}

/// Rust renders `1.5e2`; C wants `1.5e+02`.
fn c_exponent(rendered: &str, upper: bool, alt: bool) -> Vec<u8> {
    let (mantissa, exponent) = rendered.split_once('e').unwrap_or((rendered, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let mut out = mantissa.as_bytes().to_vec();
    if alt && !mantissa.contains('.') {
        out.push(b'.');
    }
    out.push(if upper { b'E' } else { b'e' });
    out.push(if exponent < 0 { b'-' } else { b'+' });
    let abs = exponent.unsigned_abs();
    if abs < 10 {
        out.push(b'0');
    }
    out.extend_from_slice(abs.to_string().as_bytes());
    out
}

fn strip_fraction_zeros(body: &mut Vec<u8>) {
    let mantissa_end = body
        .iter()
        .position(|&b| b == b'e' || b == b'E')
        .unwrap_or(body.len());
    if !body[..mantissa_end].contains(&b'.') {
        return;
    }
    let mut cut = mantissa_end;
    while cut > 0 && body[cut - 1] == b'0' {
        cut -= 1;
    }
    if cut > 0 && body[cut - 1] == b'.' {
        cut -= 1;
    }
    body.drain(cut..mantissa_end);
}

fn write_float(out: &mut Vec<u8>, spec: &Spec, value: f64, conv: u8) {
    let upper = conv.is_ascii_uppercase();
    let negative = value.is_sign_negative() && !value.is_nan();
    let sign: &[u8] = if negative {
        b"-"
    } else if spec.plus {
        b"+"
    } else if spec.space {
        b" "
    } else {
        b""
    };

    if !value.is_finite() {
        let body: &[u8] = match (value.is_nan(), upper) {
            (true, false) => b"nan",
            (true, true) => b"NAN",
            (false, false) => b"inf",
            (false, true) => b"INF",
        };
        pad(out, spec, sign, body, false);
        return;
    }

    let magnitude = value.abs();
    let precision = spec.precision.unwrap_or(6);
    let body = match conv.to_ascii_lowercase() {
        b'f' => {
            let mut body = format!("{magnitude:.precision$}").into_bytes();
            if spec.alt && precision == 0 {
                body.push(b'.');
            }
            body
        }
        b'e' => c_exponent(&format!("{magnitude:.precision$e}"), upper, spec.alt),
        _ => {
            let significant = precision.max(1);
            let probe = format!("{:.*e}", significant - 1, magnitude);
            let exponent: i64 = probe
                .split_once('e')
                .and_then(|(_, e)| e.parse().ok())
                .unwrap_or(0);
            let mut body = if exponent < -4 || exponent >= significant as i64 {
                c_exponent(&probe, upper, spec.alt)
            } else {
                let decimals = (significant as i64 - 1 - exponent) as usize;
                let mut body = format!("{magnitude:.decimals$}").into_bytes();
                if spec.alt && decimals == 0 {
                    body.push(b'.');
                }
                body
            };
            if !spec.alt {
                strip_fraction_zeros(&mut body);
            }
            body
        }
    };
    pad(out, spec, sign, &body, spec.zero);
}

const MAX_FIELD: usize = i32::MAX as usize;

/// Format `fmt` with `args` into `out`.
///
/// Nothing is written to `out` if the format is invalid or the arguments do
/// not match it.
pub(crate) fn format_into(out: &mut Vec<u8>, fmt: &[u8], args: &[Arg<'_>]) -> Result<()> {
    let mut args = Args { args, next: 0 };
    let mut buf = Vec::with_capacity(fmt.len());
    let mut i = 0;

    while i < fmt.len() {
        let b = fmt[i];
        i += 1;
        if b != b'%' {
            buf.push(b);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = fmt.get(i) {
            match flag {
                b'-' => spec.left = true,
                b'+' => spec.plus = true,
                b' ' => spec.space = true,
                b'#' => spec.alt = true,
                b'0' => spec.zero = true,
                _ => break,
            }
            i += 1;
        }

        if fmt.get(i) == Some(&b'*') {
            i += 1;
            let width = args.next_int()?;
            if width < 0 {
                spec.left = true;
            }
            spec.width = width.unsigned_abs() as usize;
        } else {
            while let Some(d) = fmt.get(i).filter(|d| d.is_ascii_digit()) {
                spec.width = spec.width.saturating_mul(10).saturating_add(usize::from(d - b'0'));
                i += 1;
            }
        }

        if fmt.get(i) == Some(&b'.') {
            i += 1;
            if fmt.get(i) == Some(&b'*') {
                i += 1;
                let precision = args.next_int()?;
                spec.precision = usize::try_from(precision).ok();
            } else {
                let mut precision = 0usize;
                while let Some(d) = fmt.get(i).filter(|d| d.is_ascii_digit()) {
                    precision = precision.saturating_mul(10).saturating_add(usize::from(d - b'0'));
                    i += 1;
                }
                spec.precision = Some(precision);
            }
        }

        // C caps both at INT_MAX and reports overflow as an error.
        if spec.width > MAX_FIELD || spec.precision.is_some_and(|p| p > MAX_FIELD) {
            return Err(Error::InvalidFormat);
        }

        match (fmt.get(i), fmt.get(i + 1)) {
            (Some(b'h'), Some(b'h')) => {
                spec.length = Length::Char;
                i += 2;
            }
            (Some(b'l'), Some(b'l')) => {
                spec.length = Length::Wide;
                i += 2;
            }
            (Some(b'h'), _) => {
                spec.length = Length::Short;
                i += 1;
            }
            (Some(b'l' | b'z' | b'j' | b't' | b'q'), _) => {
                spec.length = Length::Wide;
                i += 1;
            }
            (Some(b'L'), _) => i += 1,
            _ => {}
        }

        let conv = *fmt.get(i).ok_or(Error::InvalidFormat)?;
        i += 1;
        match conv {
            b'%' => buf.push(b'%'),
            b'd' | b'i' => {
                let v = spec.length.signed(args.next_int()?);
                write_integer(&mut buf, &spec, v < 0, v.unsigned_abs(), conv);
            }
            b'u' | b'o' | b'x' | b'X' => {
                let v = spec.length.unsigned(args.next_uint()?);
                write_integer(&mut buf, &spec, false, v, conv);
            }
            b'c' => {
                let mut encoded = [0u8; 4];
                let body: &[u8] = match args.next()? {
                    Arg::Char(c) if c.is_ascii() => {
                        encoded[0] = c as u8;
                        &encoded[..1]
                    }
                    Arg::Char(c) => c.encode_utf8(&mut encoded).as_bytes(),
                    Arg::Int(v) => {
                        encoded[0] = v as u8;
                        &encoded[..1]
                    }
                    Arg::Uint(v) => {
                        encoded[0] = v as u8;
                        &encoded[..1]
                    }
                    _ => return Err(Error::InvalidFormat),
                };
                pad(&mut buf, &spec, b"", body, false);
            }
            b's' => {
                let Arg::Str(s) = args.next()? else {
                    return Err(Error::InvalidFormat);
                };
                let s = &s[..super::cstr_len(s)];
                let s = match spec.precision {
                    Some(p) if p < s.len() => &s[..p],
                    _ => s,
                };
                pad(&mut buf, &spec, b"", s, false);
            }
            b'p' => {
                let v = args.next_uint()?;
                let mut body = b"0x".to_vec();
                body.extend_from_slice(&digits(v, 16, false));
                pad(&mut buf, &spec, b"", &body, false);
            }
            b'f' | b'F' | b'e' | b'E' | b'g' | b'G' => {
                let v = args.next_float()?;
                write_float(&mut buf, &spec, v, conv);
            }
            _ => return Err(Error::InvalidFormat),
        }
    }

    out.extend_from_slice(&buf);
    Ok(())
}

impl FurryString {
    /// Overwrite the string with `printf`-formatted output.
    ///
    /// Takes an already collected argument list, so wrappers can forward
    /// their own arguments. Returns the number of bytes written. On error the
    /// string is left unchanged.
    pub fn printf(&mut self, fmt: impl AsRef<[u8]>, args: &[Arg<'_>]) -> Result<usize> {
        let mut out = Vec::new();
        format_into(&mut out, fmt.as_ref(), args)?;
        self.set_bytes(&out);
        Ok(out.len())
    }

    /// Append `printf`-formatted output.
    ///
    /// Formats into a scratch string first, so the result is exactly what
    /// [`printf`](Self::printf) on a fresh string followed by
    /// [`concat`](Self::concat) would give.
    pub fn cat_printf(&mut self, fmt: impl AsRef<[u8]>, args: &[Arg<'_>]) -> Result<usize> {
        let mut scratch = FurryString::new();
        let written = scratch.printf(fmt, args)?;
        self.concat(&scratch);
        Ok(written)
    }

    /// Create a string from `printf`-formatted output.
    pub fn alloc_printf(fmt: impl AsRef<[u8]>, args: &[Arg<'_>]) -> Result<FurryString> {
        let mut s = FurryString::new();
        s.printf(fmt, args)?;
        Ok(s)
    }

    /// Overwrite the string with Rust-formatted output.
    pub fn format(&mut self, args: fmt::Arguments<'_>) {
        self.reset();
        self.concat_format(args);
    }

    /// Append Rust-formatted output.
    pub fn concat_format(&mut self, args: fmt::Arguments<'_>) {
        // Writing into a FurryString cannot fail.
        let _ = fmt::Write::write_fmt(self, args);
    }
}
