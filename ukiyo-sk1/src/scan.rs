//! Scanner for SK1 directive lines.
//!
//! Every non-empty line of an SK1 file is one directive in a
//! restricted call syntax: `name(arg1, arg2, ...)` where arguments are
//! literal numbers, quoted strings or nested tuples. The scanner turns
//! one line into a [`Directive`]; it never interprets the directive,
//! that is the loader's job.

use ukiyo_model::Point;

/// One literal argument of a directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A numeric literal. Integers and reals are not distinguished.
    Num(f64),
    /// A quoted string literal.
    Str(String),
    /// A parenthesized tuple of values.
    Tuple(Vec<Value>),
}

impl Value {
    /// The value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as an `i64`. Reals are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|v| v as i64)
    }

    /// The value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a tuple slice.
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Self::Tuple(t) => Some(t),
            _ => None,
        }
    }

    /// A 2-tuple of numbers as a point.
    pub fn as_point(&self) -> Option<Point> {
        let t = self.as_tuple()?;
        match t {
            [x, y] => Some(Point::new(x.as_f64()?, y.as_f64()?)),
            _ => None,
        }
    }
}

/// A scanned directive: name plus literal arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub args: Vec<Value>,
}

impl Directive {
    /// The `i`-th argument as an `f64`.
    pub fn num(&self, i: usize) -> Option<f64> {
        self.args.get(i)?.as_f64()
    }

    /// The `i`-th argument as an `i64`.
    pub fn int(&self, i: usize) -> Option<i64> {
        self.args.get(i)?.as_i64()
    }

    /// The `i`-th argument as a string slice.
    pub fn str(&self, i: usize) -> Option<&str> {
        self.args.get(i)?.as_str()
    }

    /// The `i`-th argument as a tuple slice.
    pub fn tuple(&self, i: usize) -> Option<&[Value]> {
        self.args.get(i)?.as_tuple()
    }

    /// The `i`-th argument as a point.
    pub fn point(&self, i: usize) -> Option<Point> {
        self.args.get(i)?.as_point()
    }

    /// Arguments `i..i + 6` as transform coefficients.
    pub fn coeff(&self, i: usize) -> Option<[f64; 6]> {
        let mut c = [0.0; 6];
        for (slot, j) in c.iter_mut().zip(i..i + 6) {
            *slot = self.num(j)?;
        }
        Some(c)
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.offset += 1;
        Some(b)
    }

    fn forward(&mut self) {
        self.offset += 1;
    }

    fn forward_while(&mut self, f: impl Fn(u8) -> bool) {
        while let Some(b) = self.peek_byte() {
            if f(b) {
                self.forward();
            } else {
                break;
            }
        }
    }

    fn eat(&mut self, b: u8) -> Option<()> {
        if self.peek_byte() == Some(b) {
            self.forward();
            Some(())
        } else {
            None
        }
    }

    fn skip_spaces(&mut self) {
        self.forward_while(|b| b == b' ' || b == b'\t');
    }

    fn at_end(&self) -> bool {
        self.offset >= self.data.len()
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn read_name(r: &mut Reader<'_>) -> Option<String> {
    let start = r.offset;
    r.forward_while(is_name_byte);

    if r.offset == start {
        return None;
    }

    std::str::from_utf8(&r.data[start..r.offset])
        .ok()
        .map(str::to_owned)
}

fn read_number(r: &mut Reader<'_>) -> Option<f64> {
    let start = r.offset;

    if matches!(r.peek_byte(), Some(b'+' | b'-')) {
        r.forward();
    }
    r.forward_while(|b| b.is_ascii_digit());
    if r.peek_byte() == Some(b'.') {
        r.forward();
        r.forward_while(|b| b.is_ascii_digit());
    }
    if matches!(r.peek_byte(), Some(b'e' | b'E')) {
        r.forward();
        if matches!(r.peek_byte(), Some(b'+' | b'-')) {
            r.forward();
        }
        r.forward_while(|b| b.is_ascii_digit());
    }

    std::str::from_utf8(&r.data[start..r.offset])
        .ok()?
        .parse()
        .ok()
}

fn read_string(r: &mut Reader<'_>) -> Option<String> {
    let quote = r.read_byte()?;
    let mut out = Vec::new();

    loop {
        match r.read_byte()? {
            b if b == quote => break,
            b'\\' => match r.read_byte()? {
                b'n' => out.push(b'\n'),
                b't' => out.push(b'\t'),
                b'r' => out.push(b'\r'),
                b => out.push(b),
            },
            b => out.push(b),
        }
    }

    String::from_utf8(out).ok()
}

fn read_tuple(r: &mut Reader<'_>) -> Option<Vec<Value>> {
    r.eat(b'(')?;
    let mut values = Vec::new();

    loop {
        r.skip_spaces();

        if r.eat(b')').is_some() {
            break;
        }

        values.push(read_value(r)?);
        r.skip_spaces();

        // A trailing comma before `)` is produced by 1-tuples.
        if r.eat(b',').is_none() {
            r.eat(b')')?;
            break;
        }
    }

    Some(values)
}

fn read_value(r: &mut Reader<'_>) -> Option<Value> {
    match r.peek_byte()? {
        b'(' => read_tuple(r).map(Value::Tuple),
        b'\'' | b'"' => read_string(r).map(Value::Str),
        b'+' | b'-' | b'.' | b'0'..=b'9' => read_number(r).map(Value::Num),
        _ => None,
    }
}

/// Scan one directive line.
///
/// Returns `None` for lines that do not fit the call syntax; the
/// caller decides whether that is a skippable unknown record or a
/// reportable malformed one.
pub fn parse_directive(line: &str) -> Option<Directive> {
    let mut r = Reader::new(line.trim().as_bytes());

    let name = read_name(&mut r)?;
    r.skip_spaces();
    let args = read_tuple(&mut r)?;
    r.skip_spaces();

    if !r.at_end() {
        return None;
    }

    Some(Directive { name, args })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_ok(line: &str) -> Directive {
        parse_directive(line).unwrap()
    }

    #[test]
    fn empty_args() {
        let d = scan_ok("b()");
        assert_eq!(d.name, "b");
        assert!(d.args.is_empty());
    }

    #[test]
    fn numbers() {
        let d = scan_ok("r(1,0,0,1,10,10)");
        assert_eq!(d.name, "r");
        assert_eq!(d.coeff(0), Some([1.0, 0.0, 0.0, 1.0, 10.0, 10.0]));
    }

    #[test]
    fn negative_and_real_numbers() {
        let d = scan_ok("bs(-1.5,2e3,0)");
        assert_eq!(d.num(0), Some(-1.5));
        assert_eq!(d.num(1), Some(2000.0));
        assert_eq!(d.int(2), Some(0));
    }

    #[test]
    fn strings_and_tuples() {
        let d = scan_ok("layer('L1',1,1,0,0,(\"RGB\",0.2,0.3,0.6))");
        assert_eq!(d.str(0), Some("L1"));
        let color = d.tuple(5).unwrap();
        assert_eq!(color[0].as_str(), Some("RGB"));
        assert_eq!(color[1].as_f64(), Some(0.2));
    }

    #[test]
    fn nested_tuples() {
        let d = scan_ok("layout('A4',(595.276,841.89),0)");
        assert_eq!(d.str(0), Some("A4"));
        assert_eq!(
            d.tuple(1).unwrap(),
            &[Value::Num(595.276), Value::Num(841.89)]
        );
    }

    #[test]
    fn point_argument() {
        let d = scan_ok("guide((0.0,5.5),0)");
        assert_eq!(d.point(0), Some(Point::new(0.0, 5.5)));
    }

    #[test]
    fn escaped_string() {
        let d = scan_ok(r"txt('it\'s',(1,0,0,1,0,0),0,0,0.0,0.0,1.0)");
        assert_eq!(d.str(0), Some("it's"));
    }

    #[test]
    fn tuple_with_spaces() {
        let d = scan_ok("layout('A4', (595.276, 841.89), 0)");
        assert_eq!(d.tuple(1).unwrap().len(), 2);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_directive("not a directive"), None);
        assert_eq!(parse_directive("r(1,0,0,1,10,10) trailing"), None);
        assert_eq!(parse_directive(""), None);
    }
}
