//! Scales mapping data values into panel coordinates and colors.
//!
//! Continuous domains are "niced" to round tick boundaries using the classic 1/2/5/10 step
//! selection. Temporal scales step through calendar units (seconds up to years) in UTC.

use chrono::Datelike as _;

use crate::compile::data::{Datum, MS_PER_DAY, date_ms, parse_temporal, utc_from_ms};
use crate::foundation::core::Color;

/// One guide tick: panel position plus its label.
#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    /// Position in panel coordinates.
    pub pos: f64,
    /// Formatted label.
    pub label: String,
}

/// Continuous linear scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    /// Create a scale mapping `domain` onto `range`.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Map a domain value into range space. A degenerate domain maps to the range start.
    pub fn map(&self, x: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let denom = d1 - d0;
        if denom == 0.0 {
            return r0;
        }
        r0 + (x - d0) / denom * (r1 - r0)
    }

    /// Domain as authored.
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Output range.
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Nice tick values inside the domain.
    pub fn tick_values(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = ordered(self.domain);
        let eps = (hi - lo).abs() * 1e-9;
        nice_ticks(lo, hi, count)
            .into_iter()
            .filter(|v| *v >= lo - eps && *v <= hi + eps)
            .collect()
    }

    /// Ticks with positions and number labels.
    pub fn ticks(&self, count: usize) -> Vec<Tick> {
        let values = self.tick_values(count);
        let step = tick_step(&values);
        values
            .into_iter()
            .map(|v| Tick {
                pos: self.map(v),
                label: format_number(v, step),
            })
            .collect()
    }
}

/// Extend `(min, max)` outwards to nice tick boundaries.
///
/// A degenerate extent is widened first so the scale never collapses.
pub fn nice_domain(min: f64, max: f64, count: usize) -> (f64, f64) {
    let (mut lo, mut hi) = ordered((min, max));
    if lo == hi {
        if lo == 0.0 {
            hi = 1.0;
        } else {
            let pad = lo.abs() * 0.1;
            lo -= pad;
            hi += pad;
        }
    }
    let ticks = nice_ticks(lo, hi, count);
    match (ticks.first(), ticks.last()) {
        (Some(a), Some(b)) if ticks.len() >= 2 => (*a, *b),
        _ => (lo, hi),
    }
}

fn ordered((a, b): (f64, f64)) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

fn nice_ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    if count == 0 || !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }
    if min == max {
        return vec![min];
    }
    let (min, max) = ordered((min, max));
    let step = nice_step((max - min) / count as f64);
    if step == 0.0 {
        return vec![min, max];
    }
    let start = (min / step).floor() * step;
    let stop = (max / step).ceil() * step;
    let n = ((stop - start) / step).round().clamp(0.0, 10_000.0) as u64;
    (0..=n).map(|i| clean(start + step * i as f64, step)).collect()
}

fn nice_step(step: f64) -> f64 {
    if !step.is_finite() || step <= 0.0 {
        return 0.0;
    }
    let base = 10_f64.powf(step.log10().floor());
    let error = step / base;
    let nice = if error >= 7.5 {
        10.0
    } else if error >= 3.5 {
        5.0
    } else if error >= 1.5 {
        2.0
    } else {
        1.0
    };
    nice * base
}

// Snap accumulated float error (0.30000000000000004) back onto the step grid.
fn clean(v: f64, step: f64) -> f64 {
    let decimals = step_decimals(step) as i32 + 2;
    let f = 10_f64.powi(decimals);
    let out = (v * f).round() / f;
    if out == 0.0 { 0.0 } else { out }
}

fn tick_step(values: &[f64]) -> f64 {
    match values {
        [a, b, ..] => (b - a).abs(),
        _ => 1.0,
    }
}

fn step_decimals(step: f64) -> usize {
    if !step.is_finite() || step <= 0.0 || step >= 1.0 {
        return 0;
    }
    (-(step.log10() + 1e-9).floor()).clamp(0.0, 12.0) as usize
}

/// Format a tick value with as many decimals as the tick step needs and comma grouping.
pub fn format_number(v: f64, step: f64) -> String {
    let decimals = step_decimals(step);
    let s = format!("{:.*}", decimals, v.abs());
    let (int, frac) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s.as_str(), None),
    };
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let negative = v < 0.0 && s.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Discrete band or point scale over an ordered list of values.
#[derive(Clone, Debug, PartialEq)]
pub struct BandScale {
    domain: Vec<Datum>,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
    point: bool,
}

impl BandScale {
    /// Band scale with the default bar padding (inner 0.1, outer 0.05).
    pub fn band(domain: Vec<Datum>, range: (f64, f64)) -> Self {
        Self {
            domain,
            range,
            padding_inner: 0.1,
            padding_outer: 0.05,
            point: false,
        }
    }

    /// Point scale: zero-width bands with half a step of outer padding.
    pub fn point(domain: Vec<Datum>, range: (f64, f64)) -> Self {
        Self {
            domain,
            range,
            padding_inner: 1.0,
            padding_outer: 0.5,
            point: true,
        }
    }

    /// Override padding in band units.
    pub fn with_padding(mut self, inner: f64, outer: f64) -> Self {
        self.padding_inner = inner.clamp(0.0, 1.0);
        self.padding_outer = outer.max(0.0);
        self
    }

    /// Ordered domain values.
    pub fn domain(&self) -> &[Datum] {
        &self.domain
    }

    /// Output range.
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Distance between the starts of adjacent bands.
    pub fn step(&self) -> f64 {
        let n = self.domain.len() as f64;
        if n == 0.0 {
            return 0.0;
        }
        let span = (self.range.1 - self.range.0).abs();
        let denom = if self.point {
            (n - 1.0) + 2.0 * self.padding_outer
        } else {
            n - self.padding_inner + 2.0 * self.padding_outer
        };
        if denom <= 0.0 { span } else { span / denom }
    }

    /// Width of one band (zero for point scales).
    pub fn bandwidth(&self) -> f64 {
        if self.point {
            0.0
        } else {
            self.step() * (1.0 - self.padding_inner)
        }
    }

    /// Index of a value in the domain.
    pub fn index_of(&self, v: &Datum) -> Option<usize> {
        self.domain.iter().position(|d| d == v)
    }

    /// Start of the band for `v`, in range space.
    pub fn start(&self, v: &Datum) -> Option<f64> {
        let i = self.index_of(v)?;
        let (r0, r1) = self.range;
        let step = self.step();
        let offset = step * self.padding_outer + step * i as f64;
        Some(if r1 >= r0 {
            r0 + offset
        } else {
            r0 - offset - self.bandwidth()
        })
    }

    /// Center of the band for `v`, in range space.
    pub fn center(&self, v: &Datum) -> Option<f64> {
        self.start(v).map(|s| s + self.bandwidth() / 2.0)
    }

    /// One tick per domain value, at the band center.
    pub fn ticks(&self) -> Vec<Tick> {
        self.domain
            .iter()
            .filter_map(|d| {
                self.center(d).map(|pos| Tick {
                    pos,
                    label: d.label(),
                })
            })
            .collect()
    }
}

/// Calendar unit used for temporal ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

const SECOND: f64 = 1000.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;

const TIME_STEPS: [(TimeUnit, f64); 17] = [
    (TimeUnit::Second, 1.0),
    (TimeUnit::Second, 5.0),
    (TimeUnit::Second, 15.0),
    (TimeUnit::Second, 30.0),
    (TimeUnit::Minute, 1.0),
    (TimeUnit::Minute, 5.0),
    (TimeUnit::Minute, 15.0),
    (TimeUnit::Minute, 30.0),
    (TimeUnit::Hour, 1.0),
    (TimeUnit::Hour, 3.0),
    (TimeUnit::Hour, 6.0),
    (TimeUnit::Hour, 12.0),
    (TimeUnit::Day, 1.0),
    (TimeUnit::Day, 2.0),
    (TimeUnit::Day, 7.0),
    (TimeUnit::Month, 1.0),
    (TimeUnit::Month, 3.0),
];

impl TimeUnit {
    fn approx_ms(self) -> f64 {
        match self {
            Self::Second => SECOND,
            Self::Minute => MINUTE,
            Self::Hour => HOUR,
            Self::Day => MS_PER_DAY,
            Self::Month => 30.0 * MS_PER_DAY,
            Self::Year => 365.0 * MS_PER_DAY,
        }
    }
}

/// Continuous scale over epoch milliseconds with calendar-aware ticks (UTC).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeScale {
    linear: LinearScale,
}

impl TimeScale {
    /// Create a time scale; the domain is in epoch milliseconds.
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        let (lo, hi) = ordered(domain);
        let domain = if lo == hi {
            (lo - MS_PER_DAY / 2.0, hi + MS_PER_DAY / 2.0)
        } else {
            (lo, hi)
        };
        Self {
            linear: LinearScale::new(domain, range),
        }
    }

    /// Map epoch milliseconds into range space.
    pub fn map(&self, ms: f64) -> f64 {
        self.linear.map(ms)
    }

    /// Domain in epoch milliseconds.
    pub fn domain(&self) -> (f64, f64) {
        self.linear.domain()
    }

    /// Calendar ticks with formatted labels.
    pub fn ticks(&self, count: usize) -> Vec<Tick> {
        let (lo, hi) = self.linear.domain();
        if count == 0 {
            return Vec::new();
        }
        let target = (hi - lo) / count as f64;
        let (unit, step) = TIME_STEPS
            .iter()
            .copied()
            .find(|(u, n)| u.approx_ms() * n >= target)
            .unwrap_or_else(|| {
                let years = nice_step(target / TimeUnit::Year.approx_ms()).max(1.0);
                (TimeUnit::Year, years)
            });

        let values = match unit {
            TimeUnit::Month | TimeUnit::Year => calendar_ticks(lo, hi, unit, step as i64),
            _ => {
                let size = unit.approx_ms() * step;
                let start = (lo / size).ceil() as i64;
                let stop = (hi / size).floor() as i64;
                (start..=stop).take(1000).map(|i| i as f64 * size).collect()
            }
        };
        values
            .into_iter()
            .map(|ms| Tick {
                pos: self.map(ms),
                label: format_time(ms, unit),
            })
            .collect()
    }
}

fn calendar_ticks(lo: f64, hi: f64, unit: TimeUnit, step: i64) -> Vec<f64> {
    let step = step.max(1);
    let Some(first) = utc_from_ms(lo) else {
        return Vec::new();
    };
    let (y0, m0) = (i64::from(first.year()), i64::from(first.month0()));
    let mut months = y0 * 12 + m0;
    if unit == TimeUnit::Year {
        months = (y0.div_euclid(step) * step) * 12;
    } else {
        months -= months.rem_euclid(step);
    }
    let stride = if unit == TimeUnit::Year { step * 12 } else { step };
    let mut out = Vec::new();
    while out.len() < 1000 {
        let year = i32::try_from(months.div_euclid(12)).ok();
        let month = months.rem_euclid(12) as u32 + 1;
        let Some(ms) = year.and_then(|y| date_ms(y, month, 1)) else {
            break;
        };
        if ms > hi {
            break;
        }
        if ms >= lo {
            out.push(ms);
        }
        months += stride;
    }
    out
}

fn format_time(ms: f64, unit: TimeUnit) -> String {
    let Some(t) = utc_from_ms(ms) else {
        return String::new();
    };
    let pattern = match unit {
        TimeUnit::Year => "%Y",
        TimeUnit::Month if t.month() == 1 => "%Y",
        TimeUnit::Month => "%b",
        TimeUnit::Day => "%b %d",
        TimeUnit::Hour | TimeUnit::Minute => "%H:%M",
        TimeUnit::Second => "%H:%M:%S",
    };
    t.format(pattern).to_string()
}

/// A resolved positional scale.
#[derive(Clone, Debug, PartialEq)]
pub enum PositionScale {
    /// Quantitative.
    Linear(LinearScale),
    /// Nominal/ordinal.
    Band(BandScale),
    /// Temporal.
    Time(TimeScale),
}

impl PositionScale {
    /// Map a datum to its position (band center for discrete scales).
    ///
    /// Returns `None` for values the scale cannot place (nulls, non-numeric, unknown category).
    pub fn map(&self, v: &Datum) -> Option<f64> {
        match self {
            Self::Linear(s) => v.as_f64().map(|x| s.map(x)),
            Self::Band(s) => s.center(v),
            Self::Time(s) => parse_temporal(v).ok().flatten().map(|x| s.map(x)),
        }
    }

    /// Map a raw number (linear/time only).
    pub fn map_number(&self, x: f64) -> Option<f64> {
        match self {
            Self::Linear(s) => Some(s.map(x)),
            Self::Time(s) => Some(s.map(x)),
            Self::Band(_) => None,
        }
    }

    /// Band width for discrete scales, zero otherwise.
    pub fn bandwidth(&self) -> f64 {
        match self {
            Self::Band(s) => s.bandwidth(),
            _ => 0.0,
        }
    }

    /// Return `true` for continuous scales (gridlines are drawn for these).
    pub fn is_continuous(&self) -> bool {
        !matches!(self, Self::Band(_))
    }

    /// Output range.
    pub fn range(&self) -> (f64, f64) {
        match self {
            Self::Linear(s) => s.range(),
            Self::Band(s) => s.range(),
            Self::Time(s) => s.linear.range(),
        }
    }

    /// Position of the zero baseline, clamped into the range.
    pub fn baseline(&self) -> f64 {
        let (r0, r1) = self.range();
        match self {
            Self::Linear(s) => {
                let (lo, hi) = ordered(s.domain());
                s.map(0.0_f64.clamp(lo, hi))
            }
            _ => r0.max(r1),
        }
    }

    /// Guide ticks for `count` requested ticks (discrete scales tick every value).
    pub fn ticks(&self, count: usize) -> Vec<Tick> {
        match self {
            Self::Linear(s) => s.ticks(count),
            Self::Band(s) => s.ticks(),
            Self::Time(s) => s.ticks(count),
        }
    }
}

/// Tableau 10, the default categorical scheme.
pub const TABLEAU10: [Color; 10] = [
    Color::rgb(0x4c, 0x78, 0xa8),
    Color::rgb(0xf5, 0x85, 0x18),
    Color::rgb(0xe4, 0x57, 0x56),
    Color::rgb(0x72, 0xb7, 0xb2),
    Color::rgb(0x54, 0xa2, 0x4b),
    Color::rgb(0xee, 0xca, 0x3b),
    Color::rgb(0xb2, 0x79, 0xa2),
    Color::rgb(0xff, 0x9d, 0xa6),
    Color::rgb(0x9d, 0x75, 0x5d),
    Color::rgb(0xba, 0xb0, 0xac),
];

/// Default color for marks without a color encoding.
pub const DEFAULT_MARK_COLOR: Color = TABLEAU10[0];

/// Light end of the sequential ramp.
pub const RAMP_LOW: Color = Color::rgb(0xde, 0xeb, 0xf7);
/// Dark end of the sequential ramp.
pub const RAMP_HIGH: Color = Color::rgb(0x08, 0x30, 0x6b);

/// A resolved color scale.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorScale {
    /// Discrete values cycled through the categorical palette.
    Ordinal {
        /// Ordered domain.
        domain: Vec<Datum>,
    },
    /// Continuous ramp over `[min, max]`.
    Sequential {
        /// Numeric domain.
        domain: (f64, f64),
    },
}

impl ColorScale {
    /// Color for a datum; unknown or non-numeric values fall back to the default mark color.
    pub fn map(&self, v: &Datum) -> Color {
        match self {
            Self::Ordinal { domain } => domain
                .iter()
                .position(|d| d == v)
                .map(|i| TABLEAU10[i % TABLEAU10.len()])
                .unwrap_or(DEFAULT_MARK_COLOR),
            Self::Sequential { domain } => match v.as_f64() {
                Some(x) => ramp(x, *domain),
                None => DEFAULT_MARK_COLOR,
            },
        }
    }

}

/// Sequential ramp color for `x` within `(lo, hi)`.
pub fn ramp(x: f64, (lo, hi): (f64, f64)) -> Color {
    let t = if hi == lo { 0.5 } else { (x - lo) / (hi - lo) };
    RAMP_LOW.lerp(RAMP_HIGH, t)
}

#[cfg(test)]
#[path = "../../tests/unit/compile/scale.rs"]
mod tests;
