//! Encoding channel resolution, aggregation, stacking and domain extraction.

use std::collections::BTreeMap;

use crate::compile::data::{Datum, Record, Table, field_value, parse_temporal};
use crate::foundation::error::{ChartError, ChartResult};
use crate::spec::model::{ChannelDef, Encoding, SortDef};

/// Record key holding the lower end of a stacked interval.
pub const STACK_LO: &str = "__stack_lo";
/// Record key holding the upper end of a stacked interval.
pub const STACK_HI: &str = "__stack_hi";

/// Semantic field type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// Continuous numbers.
    Quantitative,
    /// Unordered categories.
    Nominal,
    /// Ordered categories.
    Ordinal,
    /// Dates and times.
    Temporal,
}

impl FieldType {
    /// Parse a grammar type name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "quantitative" => Some(Self::Quantitative),
            "nominal" => Some(Self::Nominal),
            "ordinal" => Some(Self::Ordinal),
            "temporal" => Some(Self::Temporal),
            _ => None,
        }
    }

    /// Nominal or ordinal.
    pub fn is_discrete(self) -> bool {
        matches!(self, Self::Nominal | Self::Ordinal)
    }
}

/// Aggregate operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregate {
    /// Number of records.
    Count,
    /// Sum.
    Sum,
    /// Arithmetic mean (`mean`).
    Mean,
    /// Arithmetic mean (`average`).
    Average,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
    /// Median.
    Median,
}

impl Aggregate {
    /// Parse an aggregate name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "mean" => Some(Self::Mean),
            "average" => Some(Self::Average),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "median" => Some(Self::Median),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Average => "average",
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "median",
        }
    }

    fn title_prefix(self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Sum => "Sum",
            Self::Mean => "Mean",
            Self::Average => "Average",
            Self::Min => "Min",
            Self::Max => "Max",
            Self::Median => "Median",
        }
    }

    /// Reduce a group of records.
    pub fn apply(self, rows: &[&Record], field: Option<&str>) -> Datum {
        if self == Self::Count {
            return Datum::Number(rows.len() as f64);
        }
        let mut values: Vec<f64> = match field {
            Some(f) => rows
                .iter()
                .filter_map(|r| field_value(r, f).as_f64())
                .collect(),
            None => Vec::new(),
        };
        if values.is_empty() {
            return Datum::Null;
        }
        let n = values.len() as f64;
        let v = match self {
            Self::Count => n,
            Self::Sum => values.iter().sum(),
            Self::Mean | Self::Average => values.iter().sum::<f64>() / n,
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Median => {
                values.sort_by(f64::total_cmp);
                quantile_sorted(&values, 0.5)
            }
        };
        Datum::Number(v)
    }
}

/// Quantile of sorted values using linear interpolation between closest ranks (R-7).
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted {
        [] => f64::NAN,
        [only] => *only,
        _ => {
            let h = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
            let lo = h.floor() as usize;
            let hi = h.ceil() as usize;
            sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
        }
    }
}

/// Encoding channel name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChannelName {
    /// `x`.
    X,
    /// `y`.
    Y,
    /// `x2`.
    X2,
    /// `y2`.
    Y2,
    /// `color`.
    Color,
    /// `size`.
    Size,
    /// `opacity`.
    Opacity,
    /// `text`.
    Text,
    /// `theta`.
    Theta,
}

impl ChannelName {
    /// Grammar name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::X2 => "x2",
            Self::Y2 => "y2",
            Self::Color => "color",
            Self::Size => "size",
            Self::Opacity => "opacity",
            Self::Text => "text",
            Self::Theta => "theta",
        }
    }
}

/// A resolved encoding channel.
#[derive(Clone, Debug)]
pub struct Channel {
    /// Channel name.
    pub name: ChannelName,
    /// Record key carrying the encoded value (rewritten after aggregation).
    pub field: Option<String>,
    /// Field as written in the chart JSON.
    pub source_field: Option<String>,
    /// Semantic type.
    pub ty: FieldType,
    /// Aggregate operation.
    pub aggregate: Option<Aggregate>,
    /// Raw definition.
    pub def: ChannelDef,
}

impl Channel {
    fn resolve(name: ChannelName, def: &ChannelDef, fallback: Option<FieldType>) -> ChartResult<Self> {
        let aggregate = match def.aggregate.as_deref() {
            Some(a) => Some(Aggregate::parse(a).ok_or_else(|| {
                ChartError::compilation(format!(
                    "unsupported aggregate '{a}' on channel '{}'",
                    name.as_str()
                ))
            })?),
            None => None,
        };
        let ty = match def.ty.as_deref() {
            Some(t) => FieldType::parse(t).ok_or_else(|| {
                ChartError::compilation(format!(
                    "unsupported field type '{t}' on channel '{}'",
                    name.as_str()
                ))
            })?,
            None if aggregate.is_some() => FieldType::Quantitative,
            None if def.field.is_none() => fallback.unwrap_or(FieldType::Nominal),
            None => fallback.ok_or_else(|| {
                ChartError::compilation(format!(
                    "channel '{}' needs a type for field '{}'",
                    name.as_str(),
                    def.field.as_deref().unwrap_or_default()
                ))
            })?,
        };
        if def.field.is_none() && def.value.is_none() && aggregate != Some(Aggregate::Count) {
            return Err(ChartError::compilation(format!(
                "channel '{}' needs a field or a value",
                name.as_str()
            )));
        }
        Ok(Self {
            name,
            field: def.field.clone(),
            source_field: def.field.clone(),
            ty,
            aggregate,
            def: def.clone(),
        })
    }

    /// Return `true` when the channel reads a record key.
    pub fn is_field(&self) -> bool {
        self.field.is_some()
    }

    /// Title for guides: explicit title, then the axis/legend title, then a derived one.
    pub fn title(&self) -> Option<String> {
        if let Some(t) = &self.def.title {
            return Some(t.clone());
        }
        if let Some(Some(axis)) = &self.def.axis
            && let Some(t) = &axis.title
        {
            return Some(t.clone());
        }
        if let Some(Some(legend)) = &self.def.legend
            && let Some(t) = &legend.title
        {
            return Some(t.clone());
        }
        match (self.aggregate, self.source_field.as_deref()) {
            (Some(Aggregate::Count), _) => Some("Count of Records".to_string()),
            (Some(a), Some(f)) => Some(format!("{} of {f}", a.title_prefix())),
            (None, Some(f)) => Some(f.to_string()),
            _ => None,
        }
    }

    /// `axis: null` hides the axis.
    pub fn axis_hidden(&self) -> bool {
        matches!(self.def.axis, Some(None))
    }

    /// `legend: null` hides the legend.
    pub fn legend_hidden(&self) -> bool {
        matches!(self.def.legend, Some(None))
    }

    /// Whether continuous domains include zero.
    pub fn zero(&self, default: bool) -> bool {
        self.def.scale.as_ref().and_then(|s| s.zero).unwrap_or(default)
    }

    /// The datum this channel encodes for a record (constant value when there is no field).
    pub fn datum<'a>(&self, record: &'a Record) -> std::borrow::Cow<'a, Datum> {
        match &self.field {
            Some(f) => std::borrow::Cow::Borrowed(field_value(record, f)),
            None => std::borrow::Cow::Owned(
                self.def
                    .value
                    .as_ref()
                    .map(Datum::from_json)
                    .unwrap_or(Datum::Null),
            ),
        }
    }
}

/// All resolved channels of one unit spec.
#[derive(Clone, Debug, Default)]
pub struct Channels {
    /// `x`.
    pub x: Option<Channel>,
    /// `y`.
    pub y: Option<Channel>,
    /// `x2`.
    pub x2: Option<Channel>,
    /// `y2`.
    pub y2: Option<Channel>,
    /// `color`.
    pub color: Option<Channel>,
    /// `size`.
    pub size: Option<Channel>,
    /// `opacity`.
    pub opacity: Option<Channel>,
    /// `text`.
    pub text: Option<Channel>,
    /// `theta`.
    pub theta: Option<Channel>,
}

impl Channels {
    /// Resolve an encoding block. Unknown channel names are rejected.
    pub fn resolve(enc: Option<&Encoding>) -> ChartResult<Self> {
        let Some(enc) = enc else {
            return Ok(Self::default());
        };
        if let Some(name) = enc.unsupported.keys().next() {
            return Err(ChartError::compilation(format!(
                "unsupported encoding channel '{name}'"
            )));
        }
        let one = |name, def: &Option<ChannelDef>, fallback| {
            def.as_ref()
                .map(|d| Channel::resolve(name, d, fallback))
                .transpose()
        };
        let x = one(ChannelName::X, &enc.x, None)?;
        let y = one(ChannelName::Y, &enc.y, None)?;
        let x2 = one(ChannelName::X2, &enc.x2, x.as_ref().map(|c| c.ty))?;
        let y2 = one(ChannelName::Y2, &enc.y2, y.as_ref().map(|c| c.ty))?;
        Ok(Self {
            x,
            y,
            x2,
            y2,
            color: one(ChannelName::Color, &enc.color, None)?,
            size: one(ChannelName::Size, &enc.size, None)?,
            opacity: one(ChannelName::Opacity, &enc.opacity, None)?,
            text: one(ChannelName::Text, &enc.text, Some(FieldType::Nominal))?,
            theta: one(ChannelName::Theta, &enc.theta, None)?,
        })
    }

    /// Iterate over the present channels.
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        [
            &self.x,
            &self.y,
            &self.x2,
            &self.y2,
            &self.color,
            &self.size,
            &self.opacity,
            &self.text,
            &self.theta,
        ]
        .into_iter()
        .flatten()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
        [
            &mut self.x,
            &mut self.y,
            &mut self.x2,
            &mut self.y2,
            &mut self.color,
            &mut self.size,
            &mut self.opacity,
            &mut self.text,
            &mut self.theta,
        ]
        .into_iter()
        .flatten()
    }

    /// Reject fields no record carries. Empty tables are not checked.
    pub fn check_fields(&self, table: &Table) -> ChartResult<()> {
        if table.is_empty() {
            return Ok(());
        }
        for c in self.iter() {
            if let Some(f) = &c.source_field
                && !table.has_field(f)
            {
                return Err(ChartError::compilation(format!(
                    "field '{f}' on channel '{}' is not present in the data",
                    c.name.as_str()
                )));
            }
        }
        Ok(())
    }

    /// Return `true` when any channel aggregates.
    pub fn has_aggregate(&self) -> bool {
        self.iter().any(|c| c.aggregate.is_some())
    }

    /// Group by all non-aggregated field channels and reduce the aggregated ones.
    ///
    /// Aggregated channels are rewritten to read their output key (`sum_value`, `count`, ...).
    /// Groups keep first-appearance order.
    pub fn aggregate(&mut self, table: &Table) -> Table {
        if !self.has_aggregate() {
            return table.clone();
        }
        let mut keys: Vec<String> = Vec::new();
        for f in self
            .iter()
            .filter(|c| c.aggregate.is_none())
            .filter_map(|c| c.field.as_ref())
        {
            if !keys.contains(f) {
                keys.push(f.clone());
            }
        }

        let mut index: BTreeMap<Vec<Datum>, usize> = BTreeMap::new();
        let mut groups: Vec<(Vec<Datum>, Vec<&Record>)> = Vec::new();
        for row in table.rows() {
            let key: Vec<Datum> = keys.iter().map(|k| field_value(row, k).clone()).collect();
            match index.get(&key) {
                Some(&i) => groups[i].1.push(row),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push((key, vec![row]));
                }
            }
        }

        let mut outputs = Vec::new();
        for c in self.iter_mut() {
            if let Some(op) = c.aggregate {
                let out = match &c.source_field {
                    Some(f) => format!("{}_{f}", op.name()),
                    None => op.name().to_string(),
                };
                outputs.push((out.clone(), op, c.source_field.clone()));
                c.field = Some(out);
            }
        }

        let rows = groups
            .into_iter()
            .map(|(key, members)| {
                let mut rec: Record = keys.iter().cloned().zip(key).collect();
                for (out, op, src) in &outputs {
                    rec.insert(out.clone(), op.apply(&members, src.as_deref()));
                }
                rec
            })
            .collect();
        Table::from_records(rows)
    }
}

/// Stack `measure` values per `group` key, in `order` of the color domain.
///
/// Positive and negative values stack independently away from zero. The interval is written
/// to [`STACK_LO`]/[`STACK_HI`]; record order is preserved.
pub fn stack(table: &Table, measure: &str, group: Option<&str>, series: &str, order: &[Datum]) -> Table {
    let mut idx: Vec<usize> = (0..table.len()).collect();
    let rank = |r: &Record| {
        let v = field_value(r, series);
        order.iter().position(|d| d == v).unwrap_or(order.len())
    };
    idx.sort_by_key(|&i| rank(&table.rows()[i]));

    let mut pos: BTreeMap<Datum, f64> = BTreeMap::new();
    let mut neg: BTreeMap<Datum, f64> = BTreeMap::new();
    let mut rows: Vec<Record> = table.rows().to_vec();
    for i in idx {
        let rec = &mut rows[i];
        let key = group.map(|g| field_value(rec, g).clone()).unwrap_or(Datum::Null);
        let Some(v) = field_value(rec, measure).as_f64() else {
            continue;
        };
        let acc = if v >= 0.0 { &mut pos } else { &mut neg };
        let lo = *acc.get(&key).unwrap_or(&0.0);
        let hi = lo + v;
        acc.insert(key, hi);
        rec.insert(STACK_LO.to_string(), Datum::Number(lo));
        rec.insert(STACK_HI.to_string(), Datum::Number(hi));
    }
    Table::from_records(rows)
}

/// Resolved scale domain, shareable across facet cells.
#[derive(Clone, Debug, PartialEq)]
pub enum Domain {
    /// Numeric (or epoch-millisecond) interval.
    Continuous(f64, f64),
    /// Ordered discrete values.
    Discrete(Vec<Datum>),
}

/// Numeric extent of `values`; temporal values are converted to epoch milliseconds.
pub fn continuous_extent<'a>(
    values: impl IntoIterator<Item = &'a Datum>,
    ty: FieldType,
) -> ChartResult<Option<(f64, f64)>> {
    let mut ext: Option<(f64, f64)> = None;
    for d in values {
        let v = match ty {
            FieldType::Temporal => parse_temporal(d)?,
            _ => d.as_f64(),
        };
        if let Some(v) = v {
            ext = Some(match ext {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
    }
    Ok(ext)
}

/// Distinct values ordered per the channel's `sort`.
///
/// Ascending by default, `"descending"` reverses, `null` keeps first appearance, and an
/// explicit list puts its values first.
pub fn discrete_domain<'a>(
    values: impl IntoIterator<Item = &'a Datum>,
    sort: Option<&Option<SortDef>>,
) -> Vec<Datum> {
    let mut seen: Vec<Datum> = Vec::new();
    for d in values {
        if !d.is_null() && !seen.contains(d) {
            seen.push(d.clone());
        }
    }
    match sort {
        Some(None) => seen,
        Some(Some(SortDef::Order(o))) if o == "descending" => {
            seen.sort();
            seen.reverse();
            seen
        }
        Some(Some(SortDef::Values(explicit))) => {
            let mut head: Vec<Datum> = Vec::new();
            for v in explicit.iter().map(Datum::from_json) {
                if seen.contains(&v) && !head.contains(&v) {
                    head.push(v);
                }
            }
            let mut tail: Vec<Datum> = seen.into_iter().filter(|d| !head.contains(d)).collect();
            tail.sort();
            head.extend(tail);
            head
        }
        _ => {
            seen.sort();
            seen
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/encode.rs"]
mod tests;
