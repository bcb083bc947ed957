//! Independent source waveforms.
//!
//! A source description is either a bare number (`"5"`, `"2.2m"`), meaning a
//! constant, or a call such as `pulse(0,5,1u,10n,10n,1u,2u)`. Every piecewise
//! waveform is desugared into a PWL table at parse time so evaluation only has
//! to deal with three shapes: constant, sinusoid and PWL.

use std::f64::consts::PI;

use log::warn;
use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{eof, opt},
    multi::separated_list0,
    sequence::{delimited, terminated},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::parser::parse_number_alert;

/// The source functions a description may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Dc,
    Impulse,
    Step,
    Square,
    Triangle,
    Pulse,
    Sin,
    Pwl,
    PwlRepeating,
}

impl SourceKind {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "dc" => Some(SourceKind::Dc),
            "impulse" => Some(SourceKind::Impulse),
            "step" => Some(SourceKind::Step),
            "square" => Some(SourceKind::Square),
            "triangle" => Some(SourceKind::Triangle),
            "pulse" => Some(SourceKind::Pulse),
            "sin" => Some(SourceKind::Sin),
            "pwl" => Some(SourceKind::Pwl),
            "pwl_repeating" => Some(SourceKind::PwlRepeating),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Dc => "dc",
            SourceKind::Impulse => "impulse",
            SourceKind::Step => "step",
            SourceKind::Square => "square",
            SourceKind::Triangle => "triangle",
            SourceKind::Pulse => "pulse",
            SourceKind::Sin => "sin",
            SourceKind::Pwl => "pwl",
            SourceKind::PwlRepeating => "pwl_repeating",
        }
    }
}

/// What actually gets evaluated
#[derive(Debug, Clone, PartialEq)]
pub enum Waveform {
    Constant(f64),
    Sin {
        offset: f64,
        amplitude: f64,
        freq: f64,
        delay: f64,
        /// Phase offset as a fraction of a cycle
        phase: f64,
    },
    Pwl {
        table: Vec<(f64, f64)>,
        repeating: bool,
    },
}

/// A parsed source description
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub kind: SourceKind,
    /// Argument values with defaults filled in
    pub args: Vec<f64>,
    pub waveform: Waveform,
    /// Value at time 0
    pub dc: f64,
    /// Repeat period, 0 if the source is not periodic
    pub period: f64,
}

impl Source {
    /// A constant source
    pub fn dc(value: f64) -> Self {
        Source {
            kind: SourceKind::Dc,
            args: vec![value],
            waveform: Waveform::Constant(value),
            dc: value,
            period: 0.0,
        }
    }

    /// Parse a source description
    pub fn parse(spec: &str) -> Result<Self> {
        if !spec.contains('(') {
            return Ok(Source::dc(parse_number_alert(spec)?));
        }

        let (name, raw_args) = match source_call(spec) {
            Ok((_, call)) => call,
            Err(_) => {
                return Err(SimError::BadSource {
                    spec: spec.to_string(),
                    reason: "expected name(arg, arg, ...)".to_string(),
                })
            }
        };
        let kind = SourceKind::from_name(name).ok_or_else(|| SimError::BadSource {
            spec: spec.to_string(),
            reason: format!("unknown source function '{}'", name),
        })?;

        // Empty arguments keep their default
        let mut args = Vec::with_capacity(raw_args.len());
        for raw in raw_args {
            let raw = raw.trim();
            if raw.is_empty() {
                args.push(None);
            } else {
                args.push(Some(parse_number_alert(raw)?));
            }
        }
        if args.len() == 1 && args[0].is_none() {
            args.clear();
        }

        Ok(Source::build(kind, &args))
    }

    fn build(kind: SourceKind, args: &[Option<f64>]) -> Self {
        let arg = |index: usize, default: f64| args.get(index).copied().flatten().unwrap_or(default);

        match kind {
            SourceKind::Dc => Source::dc(arg(0, 0.0)),
            SourceKind::Impulse => {
                let height = arg(0, 1.0);
                let width = arg(1, 1e-9).abs();
                let table = vec![(0.0, 0.0), (width / 2.0, height), (width, 0.0)];
                Source::from_pwl(kind, vec![height, width], table, false)
            }
            SourceKind::Step => {
                let v1 = arg(0, 0.0);
                let v2 = arg(1, 1.0);
                let delay = arg(2, 0.0).max(0.0);
                let rise = arg(3, 1e-9).abs();
                let table = vec![(delay, v1), (delay + rise, v2)];
                Source::from_pwl(kind, vec![v1, v2, delay, rise], table, false)
            }
            SourceKind::Square => {
                let v1 = arg(0, 0.0);
                let v2 = arg(1, 1.0);
                let freq = arg(2, 1.0).abs();
                let duty_cycle = arg(3, 50.0).abs().min(100.0);
                let period = if freq == 0.0 { f64::INFINITY } else { 1.0 / freq };
                // Edges take 1% of the period each
                let t_change = 0.01 * period;
                let t_pw = 0.01 * duty_cycle * 0.98 * period;
                let table = vec![
                    (0.0, v1),
                    (t_change, v2),
                    (t_change + t_pw, v2),
                    (t_change + t_pw + t_change, v1),
                    (period, v1),
                ];
                Source::from_pwl(kind, vec![v1, v2, freq, duty_cycle], table, true)
            }
            SourceKind::Triangle => {
                let v1 = arg(0, 0.0);
                let v2 = arg(1, 1.0);
                let freq = arg(2, 1.0).abs();
                let period = if freq == 0.0 { f64::INFINITY } else { 1.0 / freq };
                let table = vec![(0.0, v1), (period / 2.0, v2), (period, v1)];
                Source::from_pwl(kind, vec![v1, v2, freq], table, true)
            }
            SourceKind::Pulse => {
                let v1 = arg(0, 0.0);
                let v2 = arg(1, 1.0);
                let delay = arg(2, 0.0).max(0.0);
                let rise = arg(3, 1e-9).abs();
                let fall = arg(4, 1e-9).abs();
                let width = arg(5, 1e9).abs();
                let period = arg(6, 1e9).abs();

                let t1 = delay;
                let t2 = t1 + rise;
                let t3 = t2 + width;
                let t4 = t3 + fall;
                let table = vec![(t1, v1), (t2, v2), (t3, v2), (t4, v1), (period, v1)];
                Source::from_pwl(kind, vec![v1, v2, delay, rise, fall, width, period], table, true)
            }
            SourceKind::Sin => {
                let offset = arg(0, 0.0);
                let amplitude = arg(1, 1.0);
                let freq = arg(2, 1.0).abs();
                let delay = arg(3, 0.0).max(0.0);
                let phase = arg(4, 0.0);
                let period = if freq > 0.0 { 1.0 / freq } else { 0.0 };
                let waveform = Waveform::Sin {
                    offset,
                    amplitude,
                    freq,
                    delay,
                    phase: phase / 360.0,
                };
                Source::from_waveform(kind, vec![offset, amplitude, freq, delay, phase], waveform, period)
            }
            SourceKind::Pwl | SourceKind::PwlRepeating => {
                let values: Vec<f64> = args.iter().map(|a| a.unwrap_or(0.0)).collect();
                if values.len() % 2 == 1 {
                    warn!("pwl source has an odd number of values, ignoring the last one");
                }
                let table = values.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect();
                Source::from_pwl(kind, values, table, kind == SourceKind::PwlRepeating)
            }
        }
    }

    fn from_pwl(kind: SourceKind, args: Vec<f64>, table: Vec<(f64, f64)>, repeating: bool) -> Self {
        // Wrapping needs a finite, positive period: the last table time
        let period = match table.last() {
            Some(&(t_last, _)) if repeating && t_last.is_finite() && t_last > 0.0 => t_last,
            _ => 0.0,
        };
        let waveform = Waveform::Pwl {
            table,
            repeating: period > 0.0,
        };
        Source::from_waveform(kind, args, waveform, period)
    }

    fn from_waveform(kind: SourceKind, args: Vec<f64>, waveform: Waveform, period: f64) -> Self {
        let mut source = Source {
            kind,
            args,
            waveform,
            dc: 0.0,
            period,
        };
        source.dc = source.value(0.0);
        source
    }

    /// Source value at time `t`
    pub fn value(&self, t: f64) -> f64 {
        match &self.waveform {
            Waveform::Constant(v) => *v,
            Waveform::Sin {
                offset,
                amplitude,
                freq,
                delay,
                phase,
            } => {
                if t < *delay {
                    offset + amplitude * (2.0 * PI * phase).sin()
                } else {
                    offset + amplitude * (2.0 * PI * (freq * (t - delay) + phase)).sin()
                }
            }
            Waveform::Pwl { table, repeating } => pwl_value(table, self.wrap(t, *repeating)),
        }
    }

    /// The next time after `t` at which the waveform changes behavior, if any
    pub fn inflection_point(&self, t: f64) -> Option<f64> {
        match &self.waveform {
            Waveform::Constant(_) => None,
            Waveform::Sin { delay, .. } => (t < *delay).then_some(*delay),
            Waveform::Pwl { table, repeating } => {
                if table.len() < 2 {
                    return None;
                }
                if !*repeating {
                    return table.iter().map(|&(tp, _)| tp).find(|&tp| tp > t);
                }
                // Search this period, then the next one
                let base = (t / self.period).floor() * self.period;
                [base, base + self.period].iter().find_map(|&start| {
                    table
                        .iter()
                        .map(|&(tp, _)| start + tp)
                        .find(|&tp| tp > t)
                })
            }
        }
    }

    fn wrap(&self, t: f64, repeating: bool) -> f64 {
        if repeating {
            t - (t / self.period).floor() * self.period
        } else {
            t
        }
    }
}

fn pwl_value(table: &[(f64, f64)], t: f64) -> f64 {
    match table.len() {
        0 => return 0.0,
        1 => return table[0].1,
        _ => {}
    }

    let (mut last_t, mut last_v) = table[0];
    if t > last_t {
        for &(next_t, next_v) in &table[1..] {
            // Out-of-order entries are skipped
            if next_t > last_t && t < next_t {
                return last_v + (next_v - last_v) * (t - last_t) / (next_t - last_t);
            }
            last_t = next_t;
            last_v = next_v;
        }
    }
    last_v
}

/// `name(arg, arg, ...)`; the closing parenthesis may be omitted
fn source_call(input: &str) -> IResult<&str, (&str, Vec<&str>)> {
    let (input, name) = delimited(
        multispace0,
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        multispace0,
    )(input)?;
    let (input, _) = char('(')(input)?;
    let (input, args) = separated_list0(char(','), take_while(|c: char| c != ',' && c != ')'))(input)?;
    let (input, _) = terminated(opt(char(')')), multispace0)(input)?;
    let (input, _) = eof(input)?;
    Ok((input, (name, args)))
}
