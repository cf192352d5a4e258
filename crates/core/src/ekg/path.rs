//! Declarative EKG trace geometry.
//!
//! Traces are written with absolute `M`, `L` and `C` commands in a 100x100
//! view box, with or without separators between tokens. Cubic curves are flattened into line pieces so that a trace can
//! be drawn up to a fraction of its arc length.

use crate::{OpticalEkgError, Result};

const CURVE_SAMPLES: usize = 16;

pub type Point = [f32; 2];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
}

/// Parsed and flattened trace.
#[derive(Debug, Clone, PartialEq)]
pub struct TracePath {
    commands: Vec<PathCommand>,
    subpaths: Vec<Vec<Point>>,
    length: f32,
}

impl TracePath {
    pub fn parse(raw: &str) -> Result<Self> {
        let commands = parse_commands(raw)?;
        let subpaths = flatten(&commands);
        let length = subpaths.iter().map(|points| polyline_length(points)).sum();
        Ok(Self {
            commands,
            subpaths,
            length,
        })
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Flattened polylines, one per `M` command.
    pub fn subpaths(&self) -> &[Vec<Point>] {
        &self.subpaths
    }

    /// Total arc length in view box units.
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Polylines covering the first `fraction` of the arc length.
    pub fn partial(&self, fraction: f32) -> Vec<Vec<Point>> {
        let mut remaining = fraction.clamp(0.0, 1.0) * self.length;
        let mut drawn = Vec::new();

        for points in &self.subpaths {
            let Some(first) = points.first() else {
                continue;
            };
            let mut piece = vec![*first];
            for pair in points.windows(2) {
                let segment = distance(pair[0], pair[1]);
                if segment <= remaining {
                    piece.push(pair[1]);
                    remaining -= segment;
                } else {
                    if segment > 0.0 && remaining > 0.0 {
                        piece.push(lerp(pair[0], pair[1], remaining / segment));
                    }
                    remaining = 0.0;
                    break;
                }
            }
            if piece.len() > 1 {
                drawn.push(piece);
            }
            if remaining <= 0.0 {
                break;
            }
        }

        drawn
    }
}

fn parse_commands(raw: &str) -> Result<Vec<PathCommand>> {
    let tokens = tokenize(raw)?;

    let mut commands = Vec::new();
    let mut cursor = tokens.into_iter().peekable();
    let mut started = false;
    while let Some(token) = cursor.next() {
        let Token::Command(command) = token else {
            return Err(OpticalEkgError::InvalidPath(
                "coordinates without a command".to_string(),
            ));
        };
        let arity = match command {
            'M' | 'L' => 1,
            'C' => 3,
            other => {
                return Err(OpticalEkgError::InvalidPath(format!(
                    "unsupported command `{other}`"
                )))
            }
        };
        if !started && command != 'M' {
            return Err(OpticalEkgError::InvalidPath(
                "trace must start with `M`".to_string(),
            ));
        }
        started = true;

        // Repeated coordinate groups reuse the last command, with `M` turning
        // into `L` after its first point.
        let mut current = command;
        loop {
            let mut points = Vec::with_capacity(arity);
            for _ in 0..arity {
                points.push(next_point(&mut cursor, current)?);
            }
            commands.push(match current {
                'M' => PathCommand::MoveTo(points[0]),
                'L' => PathCommand::LineTo(points[0]),
                _ => PathCommand::CubicTo(points[0], points[1], points[2]),
            });
            if current == 'M' {
                current = 'L';
            }
            if !matches!(cursor.peek(), Some(Token::Number(_))) {
                break;
            }
        }
    }

    if commands.is_empty() {
        return Err(OpticalEkgError::InvalidPath("empty trace".to_string()));
    }
    Ok(commands)
}

#[derive(Debug, Clone, Copy)]
enum Token {
    Command(char),
    Number(f32),
}

/// Splits a trace into command letters and numbers. Separators are optional
/// wherever the next token is unambiguous, so `M0-5L10,0` reads as
/// `M 0 -5 L 10 0`.
fn tokenize(raw: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut number = String::new();
    for c in raw.chars() {
        match c {
            'e' | 'E' if !number.is_empty() => number.push(c),
            '-' | '+' => {
                if !number.ends_with(['e', 'E']) {
                    flush(&mut number, &mut tokens)?;
                }
                number.push(c);
            }
            c if c.is_ascii_digit() || c == '.' => number.push(c),
            c if c.is_ascii_alphabetic() => {
                flush(&mut number, &mut tokens)?;
                tokens.push(Token::Command(c));
            }
            c if c == ',' || c.is_whitespace() => flush(&mut number, &mut tokens)?,
            other => {
                return Err(OpticalEkgError::InvalidPath(format!(
                    "unexpected character `{other}`"
                )))
            }
        }
    }
    flush(&mut number, &mut tokens)?;
    Ok(tokens)
}

fn flush(number: &mut String, tokens: &mut Vec<Token>) -> Result<()> {
    if !number.is_empty() {
        tokens.push(Token::Number(parse_number(number)?));
        number.clear();
    }
    Ok(())
}

fn parse_number(raw: &str) -> Result<f32> {
    raw.parse::<f32>()
        .map_err(|_| OpticalEkgError::InvalidPath(format!("invalid number `{raw}`")))
}

fn next_point(
    cursor: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
    command: char,
) -> Result<Point> {
    let mut coordinate = || match cursor.next() {
        Some(Token::Number(value)) => Ok(value),
        _ => Err(OpticalEkgError::InvalidPath(format!(
            "`{command}` is missing coordinates"
        ))),
    };
    Ok([coordinate()?, coordinate()?])
}

fn flatten(commands: &[PathCommand]) -> Vec<Vec<Point>> {
    let mut subpaths: Vec<Vec<Point>> = Vec::new();
    for command in commands {
        match *command {
            PathCommand::MoveTo(point) => subpaths.push(vec![point]),
            PathCommand::LineTo(point) => {
                if let Some(points) = subpaths.last_mut() {
                    points.push(point);
                }
            }
            PathCommand::CubicTo(c1, c2, end) => {
                if let Some(points) = subpaths.last_mut() {
                    let start = *points.last().unwrap_or(&end);
                    for i in 1..=CURVE_SAMPLES {
                        let t = i as f32 / CURVE_SAMPLES as f32;
                        points.push(cubic_point(start, c1, c2, end, t));
                    }
                }
            }
        }
    }
    subpaths
}

fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    [
        a * p0[0] + b * p1[0] + c * p2[0] + d * p3[0],
        a * p0[1] + b * p1[1] + c * p2[1] + d * p3[1],
    ]
}

fn polyline_length(points: &[Point]) -> f32 {
    points.windows(2).map(|pair| distance(pair[0], pair[1])).sum()
}

fn distance(a: Point, b: Point) -> f32 {
    ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt()
}

fn lerp(a: Point, b: Point, t: f32) -> Point {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end_point(drawn: &[Vec<Point>]) -> Point {
        *drawn.last().and_then(|points| points.last()).unwrap()
    }

    #[test]
    fn parses_line_and_curve_commands() {
        let path = TracePath::parse("M 0,50 L 15,50 C 17,50 18,50 20,50").unwrap();
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo([0.0, 50.0]),
                PathCommand::LineTo([15.0, 50.0]),
                PathCommand::CubicTo([17.0, 50.0], [18.0, 50.0], [20.0, 50.0]),
            ]
        );
        assert!((path.length() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn accepts_compact_syntax() {
        let path = TracePath::parse("M0,0 L10,0 20,0").unwrap();
        assert_eq!(path.commands().len(), 3);
        assert!((path.length() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn commands_and_signs_separate_numbers() {
        let path = TracePath::parse("M0,0L10,0").unwrap();
        assert_eq!(
            path.commands(),
            &[PathCommand::MoveTo([0.0, 0.0]), PathCommand::LineTo([10.0, 0.0])]
        );

        let path = TracePath::parse("M0-5L10-5C1e1-5,2e+1-5 30-5").unwrap();
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo([0.0, -5.0]),
                PathCommand::LineTo([10.0, -5.0]),
                PathCommand::CubicTo([10.0, -5.0], [20.0, -5.0], [30.0, -5.0]),
            ]
        );
    }

    #[test]
    fn partial_follows_arc_length() {
        let path = TracePath::parse("M 0,0 L 10,0 L 10,10").unwrap();

        assert!(path.partial(0.0).is_empty());
        assert_eq!(end_point(&path.partial(0.25)), [5.0, 0.0]);
        assert_eq!(end_point(&path.partial(0.75)), [10.0, 5.0]);
        assert_eq!(end_point(&path.partial(1.0)), [10.0, 10.0]);
        assert_eq!(end_point(&path.partial(2.0)), [10.0, 10.0]);
    }

    #[test]
    fn rejects_malformed_traces() {
        assert!(TracePath::parse("").is_err());
        assert!(TracePath::parse("L 0,0").is_err());
        assert!(TracePath::parse("M 0").is_err());
        assert!(TracePath::parse("M 0,0 Q 1,1 2,2").is_err());
        assert!(TracePath::parse("M 0,0 L a,b").is_err());
        assert!(TracePath::parse("M 0,0 L 1..,2").is_err());
        assert!(TracePath::parse("M 0;0").is_err());
    }
}
