//! Lowering of normalized chart specs into scenes.
//!
//! A unit spec is compiled in two steps: [`plan_unit`] resolves channels, aggregates and
//! stacks the data and fixes scale domains; [`render_unit`] turns the plan into mark groups and
//! guides. Facets plan the whole table once and render each cell against the shared domains.

use crate::compile::axis::{AxisOrient, AxisSpec, tick_count};
use crate::compile::data::{Datum, Table, field_value, parse_temporal};
use crate::compile::encode::{
    Channel, Channels, Domain, FieldType, STACK_HI, STACK_LO, continuous_extent, discrete_domain,
    stack,
};
use crate::compile::layout::{
    CHART_PADDING, COMPOSITE_SPACING, CONTINUOUS_PANEL_EXTENT, GRID_COLOR, GUIDE_PADDING,
    GUIDE_TITLE_FONT_SIZE, LEGEND_OFFSET, Margins, STEP_PER_CATEGORY, TITLE_FONT_SIZE,
    guide_title_style, measure_text, title_style,
};
use crate::compile::legend::{LegendKind, LegendSpec, SymbolShape};
use crate::compile::marks::{MarkInput, MarkStyle, Positional, build_marks};
use crate::compile::scale::{
    BandScale, ColorScale, DEFAULT_MARK_COLOR, LinearScale, PositionScale, TimeScale, nice_domain,
};
use crate::compile::scene::{
    Anchor, Baseline, GroupRole, Primitive, Scene, SceneGroup, Stroke,
};
use crate::foundation::core::{Color, Point, Rect, Size, Vec2};
use crate::foundation::error::{ChartError, ChartResult};
use crate::spec::model::{
    ChannelDef, ChartSpec, DataSource, FacetDef, MarkProps, MarkType, SizeDef, TitleDef,
};
use crate::spec::normalize::NormalizedSpec;

/// Compile a normalized spec into a scene.
///
/// Deterministic: the same spec always yields the same scene.
#[tracing::instrument(skip_all)]
pub fn compile_chart(spec: &NormalizedSpec) -> ChartResult<Scene> {
    let chart: ChartSpec = serde_json::from_value(spec.as_value().clone())
        .map_err(|e| ChartError::compilation(format!("malformed chart specification: {e}")))?;
    let background = match chart.background.as_deref() {
        Some(c) => parse_color(c)?,
        None => Color::WHITE,
    };
    let mut scene = compile_view(&chart, None)?;
    scene.background = background;
    tracing::debug!(
        marks = scene.mark_count(),
        width = scene.size.width,
        height = scene.size.height,
        "compiled chart"
    );
    Ok(scene)
}

fn compile_view(chart: &ChartSpec, inherited: Option<&Table>) -> ChartResult<Scene> {
    if chart.layer.is_some() {
        return Err(ChartError::compilation(
            "layer composition is not supported",
        ));
    }
    if chart.repeat.is_some() {
        return Err(ChartError::compilation(
            "repeat composition is not supported",
        ));
    }
    let data = resolve_data(chart.data.as_ref(), inherited)?;
    let body = if let Some(facet) = &chart.facet {
        compile_facet(chart, facet, &data)?
    } else if let Some(children) = &chart.hconcat {
        compile_concat(children, &data, Direction::Horizontal)?
    } else if let Some(children) = &chart.vconcat {
        compile_concat(children, &data, Direction::Vertical)?
    } else {
        let plan = plan_unit(chart, &data, &SharedDomains::default())?;
        render_unit(&plan, true)
    };
    Ok(with_title(body, chart.title.as_ref()))
}

fn resolve_data(data: Option<&DataSource>, inherited: Option<&Table>) -> ChartResult<Table> {
    match data {
        Some(ds) if ds.url.is_some() || ds.name.is_some() => Err(ChartError::compilation(
            "external data references are not supported; use inline data.values",
        )),
        Some(ds) => Ok(Table::from_values(ds.values.as_deref().unwrap_or_default())),
        None => Ok(inherited.cloned().unwrap_or_default()),
    }
}

/// Parse a color string, failing with a compilation error.
pub fn parse_color(s: &str) -> ChartResult<Color> {
    Color::parse(s).ok_or_else(|| ChartError::compilation(format!("invalid color '{s}'")))
}

fn with_title(body: Scene, title: Option<&TitleDef>) -> Scene {
    let Some(title) = title.map(TitleDef::text).filter(|t| !t.is_empty()) else {
        return body;
    };
    let title_w = measure_text(title, TITLE_FONT_SIZE).0 + 2.0 * CHART_PADDING;
    let band = CHART_PADDING + TITLE_FONT_SIZE + GUIDE_PADDING;
    let width = body.size.width.max(title_w);
    let mut scene = Scene::new(
        Size::new(width, body.size.height + band),
        body.background,
    );
    scene.push(
        SceneGroup::new(GroupRole::Title).with(Primitive::Text {
            pos: Point::new(width / 2.0, CHART_PADDING),
            text: title.to_string(),
            style: title_style(),
        }),
    );
    let dx = (width - body.size.width) / 2.0;
    scene.place(body, Vec2::new(dx, band));
    scene
}

/// Domains fixed ahead of planning (facet cells share them).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SharedDomains {
    /// `x` domain.
    pub x: Option<Domain>,
    /// `y` domain.
    pub y: Option<Domain>,
    /// `color` domain.
    pub color: Option<Domain>,
}

/// A unit spec with channels, data and domains resolved.
#[derive(Clone, Debug)]
pub struct UnitPlan {
    /// Mark type.
    pub mark: MarkType,
    /// Constant mark properties.
    pub style: MarkStyle,
    /// Resolved channels.
    pub channels: Channels,
    /// Aggregated and stacked records.
    pub table: Table,
    /// Measure is stacked.
    pub stacked: bool,
    /// Resolved domains.
    pub domains: SharedDomains,
    /// Plot area size.
    pub plot: Size,
}

/// Resolve a unit spec against `data`; domains present in `shared` are used as-is.
pub fn plan_unit(chart: &ChartSpec, data: &Table, shared: &SharedDomains) -> ChartResult<UnitPlan> {
    let mark_def = chart
        .mark
        .as_ref()
        .ok_or_else(|| ChartError::compilation("a unit specification needs a mark"))?;
    let name = mark_def.type_name();
    let mark = MarkType::parse(name)
        .ok_or_else(|| ChartError::compilation(format!("unsupported mark type '{name}'")))?;

    let mut channels = Channels::resolve(chart.encoding.as_ref())?;
    channels.check_fields(data)?;
    let style = mark_style(mark, mark_def.props(), &channels)?;

    let mut table = if mark == MarkType::Boxplot {
        data.clone()
    } else {
        channels.aggregate(data)
    };

    let color_domain = match (&shared.color, &channels.color) {
        (Some(d), _) => Some(d.clone()),
        (None, Some(c)) if c.is_field() => Some(channel_domain(c, None, &table, false, false, 0.0)?),
        _ => None,
    };

    let stack_axis = stack_axis(mark, &channels);
    if let (Some(measure), Some(color), Some(Domain::Discrete(order))) =
        (stack_axis, channels.color.as_ref(), color_domain.as_ref())
    {
        let (m, other) = match measure {
            StackAxis::Y => (&channels.y, &channels.x),
            StackAxis::X => (&channels.x, &channels.y),
        };
        if let (Some(mf), Some(cf)) = (m.as_ref().and_then(|c| c.field.as_deref()), color.field.as_deref()) {
            let group = other.as_ref().and_then(|c| c.field.as_deref());
            table = stack(&table, mf, group, cf, order);
        }
    }
    let stacked = stack_axis.is_some()
        && matches!(color_domain, Some(Domain::Discrete(_)))
        && table.rows().iter().any(|r| r.contains_key(STACK_HI));

    let zero_default = mark != MarkType::Boxplot;
    let (x_domain, width) = positional(
        chart.width.as_ref(),
        channels.x.as_ref(),
        channels.x2.as_ref(),
        &shared.x,
        &table,
        stacked && stack_axis == Some(StackAxis::X),
        zero_default,
    )?;
    let (y_domain, height) = positional(
        chart.height.as_ref(),
        channels.y.as_ref(),
        channels.y2.as_ref(),
        &shared.y,
        &table,
        stacked && stack_axis == Some(StackAxis::Y),
        zero_default,
    )?;

    Ok(UnitPlan {
        mark,
        style,
        channels,
        table,
        stacked,
        domains: SharedDomains {
            x: x_domain,
            y: y_domain,
            color: color_domain,
        },
        plot: Size::new(width, height),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StackAxis {
    X,
    Y,
}

// Bars and areas stack on their single quantitative axis when a color field splits them.
fn stack_axis(mark: MarkType, channels: &Channels) -> Option<StackAxis> {
    if !matches!(mark, MarkType::Bar | MarkType::Area) {
        return None;
    }
    let color = channels.color.as_ref()?;
    if !color.is_field() || !color.ty.is_discrete() {
        return None;
    }
    let quant = |c: &Option<Channel>| {
        c.as_ref()
            .is_some_and(|c| c.ty == FieldType::Quantitative && c.is_field())
    };
    match (quant(&channels.x), quant(&channels.y)) {
        (false, true) if channels.y2.is_none() => Some(StackAxis::Y),
        (true, false) if channels.x2.is_none() => Some(StackAxis::X),
        _ => None,
    }
}

fn mark_style(
    mark: MarkType,
    props: Option<&MarkProps>,
    channels: &Channels,
) -> ChartResult<MarkStyle> {
    let constant = |c: &Option<Channel>| {
        c.as_ref()
            .filter(|c| !c.is_field())
            .and_then(|c| c.def.value.clone())
    };
    let color = match (
        props.and_then(|p| p.color.as_deref()),
        constant(&channels.color),
    ) {
        (_, Some(serde_json::Value::String(s))) => parse_color(&s)?,
        (Some(s), _) => parse_color(s)?,
        _ if mark == MarkType::Text => Color::BLACK,
        _ => DEFAULT_MARK_COLOR,
    };
    let number = |v: Option<serde_json::Value>| v.and_then(|v| v.as_f64());
    Ok(MarkStyle {
        color,
        opacity: number(constant(&channels.opacity)).or(props.and_then(|p| p.opacity)),
        filled: props.and_then(|p| p.filled),
        size: number(constant(&channels.size)).or(props.and_then(|p| p.size)),
        stroke_width: props.and_then(|p| p.stroke_width),
        inner_radius: props.and_then(|p| p.inner_radius).unwrap_or(0.0),
    })
}

/// Requested panel length along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
enum PanelSize {
    Fixed(f64),
    Step(f64),
    Auto,
}

impl PanelSize {
    fn resolve(def: Option<&SizeDef>) -> ChartResult<Self> {
        let positive = |v: f64, what: &str| {
            if v.is_finite() && v > 0.0 {
                Ok(v)
            } else {
                Err(ChartError::compilation(format!("{what} must be positive, got {v}")))
            }
        };
        match def {
            None => Ok(Self::Auto),
            Some(SizeDef::Fixed(len)) => positive(*len, "panel size").map(Self::Fixed),
            Some(SizeDef::Step { step }) => positive(*step, "panel step").map(Self::Step),
            Some(SizeDef::Keyword(k)) if k == "container" => Ok(Self::Auto),
            Some(SizeDef::Keyword(k)) => Err(ChartError::compilation(format!(
                "unsupported panel size '{k}'"
            ))),
        }
    }

    fn fixed(self) -> Option<f64> {
        match self {
            Self::Fixed(len) => Some(len),
            _ => None,
        }
    }

    // A step only sizes discrete scales; continuous ones fall back to the default extent.
    fn length_for(self, domain: &Domain) -> f64 {
        match (self, domain) {
            (Self::Fixed(len), _) => len,
            (Self::Step(step), Domain::Discrete(v)) => step * v.len().max(1) as f64,
            _ => default_length(domain),
        }
    }
}

/// Domain and panel length for one positional axis.
fn positional(
    size: Option<&SizeDef>,
    ch: Option<&Channel>,
    ch2: Option<&Channel>,
    shared: &Option<Domain>,
    table: &Table,
    stacked: bool,
    zero_default: bool,
) -> ChartResult<(Option<Domain>, f64)> {
    let size = PanelSize::resolve(size)?;
    let Some(ch) = ch.filter(|c| c.is_field()) else {
        return Ok((None, size.fixed().unwrap_or(CONTINUOUS_PANEL_EXTENT)));
    };
    if let Some(d) = shared {
        return Ok((Some(d.clone()), size.length_for(d)));
    }
    if ch.ty.is_discrete() {
        let d = channel_domain(ch, ch2, table, stacked, zero_default, 0.0)?;
        let len = size.length_for(&d);
        return Ok((Some(d), len));
    }
    let len = size.fixed().unwrap_or(CONTINUOUS_PANEL_EXTENT);
    let d = channel_domain(ch, ch2, table, stacked, zero_default, len)?;
    Ok((Some(d), len))
}

fn default_length(d: &Domain) -> f64 {
    match d {
        Domain::Discrete(v) => STEP_PER_CATEGORY * v.len().max(1) as f64,
        Domain::Continuous(..) => CONTINUOUS_PANEL_EXTENT,
    }
}

fn channel_domain(
    ch: &Channel,
    ch2: Option<&Channel>,
    table: &Table,
    stacked: bool,
    zero_default: bool,
    length: f64,
) -> ChartResult<Domain> {
    let key = ch.field.as_deref().unwrap_or_default();
    let key2 = ch2.and_then(|c| c.field.as_deref());
    let rows = table.rows();

    if let Some(explicit) = ch.def.scale.as_ref().and_then(|s| s.domain.as_ref()) {
        let values: Vec<Datum> = explicit.iter().map(Datum::from_json).collect();
        if ch.ty.is_discrete() {
            return Ok(Domain::Discrete(values));
        }
        return match continuous_extent(&values, ch.ty)? {
            Some((lo, hi)) if values.len() == 2 => Ok(Domain::Continuous(lo, hi)),
            _ => Err(ChartError::compilation(format!(
                "scale domain for field '{key}' must be [min, max]"
            ))),
        };
    }

    if ch.ty.is_discrete() {
        let values = rows
            .iter()
            .map(|r| field_value(r, key))
            .chain(key2.into_iter().flat_map(|k2| rows.iter().map(move |r| field_value(r, k2))));
        return Ok(Domain::Discrete(discrete_domain(values, ch.def.sort.as_ref())));
    }

    let extent = if stacked {
        let values = rows
            .iter()
            .flat_map(|r| [field_value(r, STACK_LO), field_value(r, STACK_HI)]);
        continuous_extent(values, FieldType::Quantitative)?
    } else {
        let values = rows
            .iter()
            .map(|r| field_value(r, key))
            .chain(key2.into_iter().flat_map(|k2| rows.iter().map(move |r| field_value(r, k2))));
        continuous_extent(values, ch.ty)?
    };

    match ch.ty {
        FieldType::Temporal => {
            let (lo, hi) = extent.unwrap_or((0.0, 0.0));
            Ok(Domain::Continuous(lo, hi))
        }
        _ => {
            let (mut lo, mut hi) = extent.unwrap_or((0.0, 1.0));
            if ch.zero(zero_default) {
                lo = lo.min(0.0);
                hi = hi.max(0.0);
            }
            if length > 0.0 {
                let (lo, hi) = nice_domain(lo, hi, tick_count(length));
                return Ok(Domain::Continuous(lo, hi));
            }
            Ok(Domain::Continuous(lo, hi))
        }
    }
}

fn position_scale(
    domain: &Domain,
    ty: FieldType,
    mark: MarkType,
    range: (f64, f64),
    discrete_range: (f64, f64),
) -> PositionScale {
    match domain {
        Domain::Discrete(values) => {
            let values = values.clone();
            match mark {
                MarkType::Rect => PositionScale::Band(
                    BandScale::band(values, discrete_range).with_padding(0.0, 0.0),
                ),
                MarkType::Bar | MarkType::Tick | MarkType::Boxplot => {
                    PositionScale::Band(BandScale::band(values, discrete_range))
                }
                _ => PositionScale::Band(BandScale::point(values, discrete_range)),
            }
        }
        Domain::Continuous(lo, hi) if ty == FieldType::Temporal => {
            PositionScale::Time(TimeScale::new((*lo, *hi), range))
        }
        Domain::Continuous(lo, hi) => PositionScale::Linear(LinearScale::new((*lo, *hi), range)),
    }
}

fn aux_scale(ch: Option<&Channel>, table: &Table, range: (f64, f64)) -> Option<LinearScale> {
    let ch = ch.filter(|c| c.is_field())?;
    let key = ch.field.as_deref()?;
    let values: Vec<f64> = table
        .rows()
        .iter()
        .filter_map(|r| field_value(r, key).as_f64())
        .collect();
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min).min(0.0);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    hi.is_finite().then(|| LinearScale::new((lo, hi), range))
}

fn color_scale(domain: &Domain) -> ColorScale {
    match domain {
        Domain::Discrete(values) => ColorScale::Ordinal {
            domain: values.clone(),
        },
        Domain::Continuous(lo, hi) => ColorScale::Sequential { domain: (*lo, *hi) },
    }
}

/// Temporal color fields are colored by epoch milliseconds.
fn color_values(plan: &UnitPlan) -> Table {
    let Some(c) = plan.channels.color.as_ref() else {
        return plan.table.clone();
    };
    let (Some(key), FieldType::Temporal) = (c.field.as_deref(), c.ty) else {
        return plan.table.clone();
    };
    let rows = plan
        .table
        .rows()
        .iter()
        .map(|r| {
            let mut r = r.clone();
            if let Ok(Some(ms)) = parse_temporal(field_value(&r, key)) {
                r.insert(key.to_string(), Datum::Number(ms));
            }
            r
        })
        .collect();
    Table::from_records(rows)
}

/// Build the legend for a plan's color channel, if it has one.
pub fn legend_for(plan: &UnitPlan) -> Option<LegendSpec> {
    let ch = plan.channels.color.as_ref().filter(|c| c.is_field())?;
    if ch.legend_hidden() {
        return None;
    }
    let domain = plan.domains.color.as_ref()?;
    let kind = match domain {
        Domain::Discrete(values) => {
            let scale = color_scale(domain);
            LegendKind::Symbol {
                entries: values.iter().map(|v| (v.label(), scale.map(v))).collect(),
                shape: match plan.mark {
                    MarkType::Bar
                    | MarkType::Rect
                    | MarkType::Area
                    | MarkType::Arc
                    | MarkType::Square
                    | MarkType::Boxplot => SymbolShape::Square,
                    _ => SymbolShape::Circle,
                },
            }
        }
        Domain::Continuous(lo, hi) => {
            let unit = (0.0, 1.0);
            let scale = if ch.ty == FieldType::Temporal {
                PositionScale::Time(TimeScale::new((*lo, *hi), unit))
            } else {
                PositionScale::Linear(LinearScale::new((*lo, *hi), unit))
            };
            let labels = scale
                .ticks(5)
                .into_iter()
                .map(|t| (lo + t.pos * (hi - lo), t.label))
                .collect();
            LegendKind::Gradient {
                domain: (*lo, *hi),
                labels,
            }
        }
    };
    Some(LegendSpec {
        title: ch.title(),
        kind,
    })
}

fn bound(c: &Option<Channel>) -> Option<&Channel> {
    c.as_ref().filter(|c| c.is_field())
}

/// Render a plan into a scene with axes, gridlines and (optionally) its legend.
pub fn render_unit(plan: &UnitPlan, show_legend: bool) -> Scene {
    let plot = plan.plot;
    let ch = &plan.channels;

    let xs = match (bound(&ch.x), &plan.domains.x) {
        (Some(c), Some(d)) => Some(position_scale(d, c.ty, plan.mark, (0.0, plot.width), (0.0, plot.width))),
        _ => None,
    };
    let ys = match (bound(&ch.y), &plan.domains.y) {
        (Some(c), Some(d)) => Some(position_scale(d, c.ty, plan.mark, (plot.height, 0.0), (0.0, plot.height))),
        _ => None,
    };
    let colors = plan.domains.color.as_ref().map(color_scale);
    let color_table = color_values(plan);

    let (size_range, opacity_range) = match plan.mark {
        MarkType::Trail => ((1.0, 10.0), (0.3, 0.8)),
        MarkType::Text => ((8.0, 24.0), (0.3, 0.8)),
        _ => ((9.0, 361.0), (0.3, 0.8)),
    };
    let input = MarkInput {
        mark: plan.mark,
        style: plan.style,
        rows: color_table.rows(),
        plot,
        x: match (bound(&ch.x), xs.as_ref()) {
            (Some(channel), Some(scale)) => Some(Positional { channel, scale }),
            _ => None,
        },
        y: match (bound(&ch.y), ys.as_ref()) {
            (Some(channel), Some(scale)) => Some(Positional { channel, scale }),
            _ => None,
        },
        x2: ch.x2.as_ref().filter(|c| c.is_field()),
        y2: ch.y2.as_ref().filter(|c| c.is_field()),
        stacked: plan.stacked,
        color: match (ch.color.as_ref(), colors.as_ref()) {
            (Some(c), Some(s)) if c.is_field() => Some((c, s)),
            _ => None,
        },
        size: ch
            .size
            .as_ref()
            .zip(aux_scale(ch.size.as_ref(), &plan.table, size_range)),
        opacity: ch
            .opacity
            .as_ref()
            .zip(aux_scale(ch.opacity.as_ref(), &plan.table, opacity_range)),
        text: ch.text.as_ref(),
        theta: ch.theta.as_ref().filter(|c| c.is_field()),
    };
    let marks = build_marks(&input);

    let axis_for = |c: Option<&Channel>, orient| {
        let c = c.filter(|c| c.is_field() && !c.axis_hidden())?;
        let def = c.def.axis.clone().flatten().unwrap_or_default();
        Some(AxisSpec {
            orient,
            title: c.title(),
            grid: def.grid,
            label_angle: def.label_angle,
        })
    };
    let mut guides = Vec::new();
    let mut margins = Margins::default();
    if plan.mark != MarkType::Arc {
        if let (Some(spec), Some(scale)) = (axis_for(ch.x.as_ref(), AxisOrient::Bottom), xs.as_ref()) {
            let layout = spec.layout(scale, plot.width);
            margins.bottom = spec.extent(&layout);
            guides.push((spec, scale, layout));
        }
        if let (Some(spec), Some(scale)) = (axis_for(ch.y.as_ref(), AxisOrient::Left), ys.as_ref()) {
            let layout = spec.layout(scale, plot.height);
            margins.left = spec.extent(&layout);
            guides.push((spec, scale, layout));
        }
    }
    let legend = show_legend.then(|| legend_for(plan)).flatten();
    let legend_size = legend.as_ref().map(LegendSpec::size);
    if let Some(size) = legend_size {
        margins.right = LEGEND_OFFSET + size.width;
    }

    let origin = Vec2::new(CHART_PADDING + margins.left, CHART_PADDING + margins.top);
    let body_h = plot.height.max(legend_size.map(|s| s.height).unwrap_or(0.0));
    let size = Size::new(
        origin.x + plot.width + margins.right + CHART_PADDING,
        origin.y + body_h + margins.bottom + CHART_PADDING,
    );
    let mut scene = Scene::new(size, Color::WHITE);

    if plan.mark != MarkType::Arc {
        scene.push(
            SceneGroup::new(GroupRole::Background)
                .with(Primitive::Rect {
                    rect: Rect::new(0.0, 0.0, plot.width, plot.height),
                    fill: None,
                    stroke: Some(Stroke::new(GRID_COLOR, 1.0)),
                })
                .at(origin),
        );
    }
    for (spec, scale, layout) in &guides {
        let (axis, grid) = spec.arrange(scale, layout, plot);
        if let Some(grid) = grid {
            scene.push(grid.at(origin));
        }
        scene.push(axis.at(origin));
    }
    for g in marks {
        scene.push(g.at(origin));
    }
    if let Some(legend) = legend {
        scene.push(
            legend
                .arrange()
                .at(origin + Vec2::new(plot.width + LEGEND_OFFSET, 0.0)),
        );
    }
    scene
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Horizontal,
    Vertical,
}

fn compile_concat(children: &[ChartSpec], data: &Table, dir: Direction) -> ChartResult<Scene> {
    if children.is_empty() {
        let key = match dir {
            Direction::Horizontal => "hconcat",
            Direction::Vertical => "vconcat",
        };
        return Err(ChartError::compilation(format!("{key} needs at least one view")));
    }
    let scenes = children
        .iter()
        .map(|c| compile_view(c, Some(data)))
        .collect::<ChartResult<Vec<_>>>()?;
    let gap = |i: usize| if i == 0 { 0.0 } else { COMPOSITE_SPACING };
    let size = match dir {
        Direction::Horizontal => Size::new(
            scenes
                .iter()
                .enumerate()
                .map(|(i, s)| s.size.width + gap(i))
                .sum(),
            scenes.iter().map(|s| s.size.height).fold(0.0, f64::max),
        ),
        Direction::Vertical => Size::new(
            scenes.iter().map(|s| s.size.width).fold(0.0, f64::max),
            scenes
                .iter()
                .enumerate()
                .map(|(i, s)| s.size.height + gap(i))
                .sum(),
        ),
    };
    let mut scene = Scene::new(size, Color::WHITE);
    let mut cursor = 0.0;
    for (i, child) in scenes.into_iter().enumerate() {
        cursor += gap(i);
        let (offset, advance) = match dir {
            Direction::Horizontal => (Vec2::new(cursor, 0.0), child.size.width),
            Direction::Vertical => (Vec2::new(0.0, cursor), child.size.height),
        };
        scene.place(child, offset);
        cursor += advance;
    }
    Ok(scene)
}

fn facet_field<'a>(def: &'a ChannelDef, role: &str) -> ChartResult<&'a str> {
    def.field
        .as_deref()
        .ok_or_else(|| ChartError::compilation(format!("facet {role} needs a field")))
}

fn compile_facet(chart: &ChartSpec, facet: &FacetDef, data: &Table) -> ChartResult<Scene> {
    let inner = chart
        .spec
        .as_deref()
        .ok_or_else(|| ChartError::compilation("facet composition requires a 'spec'"))?;
    if inner.is_composite() || inner.layer.is_some() || inner.repeat.is_some() {
        return Err(ChartError::compilation(
            "facet.spec must be a unit specification",
        ));
    }
    let table = resolve_data(inner.data.as_ref(), Some(data))?;

    let wrapped = facet.wrapped.field.is_some();
    let (row_def, col_def) = if wrapped {
        (None, Some(&facet.wrapped))
    } else {
        (facet.row.as_ref(), facet.column.as_ref())
    };
    if row_def.is_none() && col_def.is_none() {
        return Err(ChartError::compilation(
            "facet needs a row, column or field definition",
        ));
    }
    let values_of = |def: Option<&ChannelDef>, role| -> ChartResult<Option<(String, Vec<Datum>)>> {
        let Some(def) = def else {
            return Ok(None);
        };
        let field = facet_field(def, role)?;
        if !table.is_empty() && !table.has_field(field) {
            return Err(ChartError::compilation(format!(
                "facet field '{field}' is not present in the data"
            )));
        }
        let values = discrete_domain(
            table.rows().iter().map(|r| field_value(r, field)),
            def.sort.as_ref(),
        );
        Ok(Some((field.to_string(), values)))
    };
    let rows = values_of(row_def, "row")?;
    let cols = values_of(col_def, "column")?;
    if [&rows, &cols]
        .into_iter()
        .flatten()
        .any(|(_, values)| values.is_empty())
    {
        return Err(ChartError::compilation(
            "facet has no data values to split into panels",
        ));
    }

    let full = plan_unit(inner, &table, &SharedDomains::default())?;
    let shared = full.domains.clone();

    // Cell coordinates (grid row, grid column) with their filters and header label.
    struct Cell {
        at: (usize, usize),
        scene: Scene,
        header: Option<String>,
    }
    let row_vals: Vec<Option<&Datum>> = match &rows {
        Some((_, v)) => v.iter().map(Some).collect(),
        None => vec![None],
    };
    let col_vals: Vec<Option<&Datum>> = match &cols {
        Some((_, v)) => v.iter().map(Some).collect(),
        None => vec![None],
    };
    let wrap = if wrapped {
        chart.columns.map(|c| c.max(1) as usize).unwrap_or(col_vals.len().max(1))
    } else {
        col_vals.len().max(1)
    };

    let mut cells = Vec::new();
    for (ri, rv) in row_vals.iter().enumerate() {
        for (ci, cv) in col_vals.iter().enumerate() {
            let subset = table.filter(|r| {
                let row_ok = match (&rows, rv) {
                    (Some((f, _)), Some(v)) => field_value(r, f) == *v,
                    _ => true,
                };
                let col_ok = match (&cols, cv) {
                    (Some((f, _)), Some(v)) => field_value(r, f) == *v,
                    _ => true,
                };
                row_ok && col_ok
            });
            let plan = plan_unit(inner, &subset, &shared)?;
            let at = if wrapped {
                (ci / wrap, ci % wrap)
            } else {
                (ri, ci)
            };
            let header = if wrapped { cv.map(Datum::label) } else { None };
            cells.push(Cell {
                at,
                scene: render_unit(&plan, false),
                header,
            });
        }
    }

    let grid_rows = cells.iter().map(|c| c.at.0 + 1).max().unwrap_or(1);
    let grid_cols = cells.iter().map(|c| c.at.1 + 1).max().unwrap_or(1);
    let cell_w = cells.iter().map(|c| c.scene.size.width).fold(0.0, f64::max);
    let cell_h = cells.iter().map(|c| c.scene.size.height).fold(0.0, f64::max);
    let header_h = GUIDE_TITLE_FONT_SIZE + GUIDE_PADDING;
    let cell_header = if wrapped { header_h } else { 0.0 };
    let row_header_w = match &rows {
        Some((_, values)) if !wrapped => {
            values
                .iter()
                .map(|v| measure_text(&v.label(), GUIDE_TITLE_FONT_SIZE).0)
                .fold(0.0, f64::max)
                + GUIDE_PADDING * 2.0
        }
        _ => 0.0,
    };
    let top = if !wrapped && cols.is_some() { header_h } else { 0.0 };
    let pitch_x = cell_w + COMPOSITE_SPACING;
    let pitch_y = cell_h + cell_header + COMPOSITE_SPACING;

    let legend = legend_for(&full);
    let legend_size = legend.as_ref().map(LegendSpec::size);
    let grid_w = row_header_w + grid_cols as f64 * pitch_x - COMPOSITE_SPACING;
    let grid_h = top + grid_rows as f64 * pitch_y - COMPOSITE_SPACING;
    let size = Size::new(
        grid_w + legend_size.map(|s| LEGEND_OFFSET + s.width).unwrap_or(0.0),
        grid_h.max(top + legend_size.map(|s| s.height).unwrap_or(0.0)),
    );
    let mut scene = Scene::new(size, Color::WHITE);

    let mut headers = SceneGroup::new(GroupRole::Header);
    if !wrapped && let Some((_, values)) = &cols {
        for (ci, v) in values.iter().enumerate() {
            headers.push(Primitive::Text {
                pos: Point::new(row_header_w + ci as f64 * pitch_x + cell_w / 2.0, 0.0),
                text: v.label(),
                style: guide_title_style(Anchor::Middle, Baseline::Top),
            });
        }
    }
    if !wrapped && let Some((_, values)) = &rows {
        for (ri, v) in values.iter().enumerate() {
            headers.push(Primitive::Text {
                pos: Point::new(GUIDE_PADDING, top + ri as f64 * pitch_y + cell_h / 2.0),
                text: v.label(),
                style: guide_title_style(Anchor::Start, Baseline::Middle),
            });
        }
    }
    for cell in cells {
        let x = row_header_w + cell.at.1 as f64 * pitch_x;
        let y = top + cell.at.0 as f64 * pitch_y;
        if let Some(label) = cell.header {
            headers.push(Primitive::Text {
                pos: Point::new(x + cell_w / 2.0, y),
                text: label,
                style: guide_title_style(Anchor::Middle, Baseline::Top),
            });
        }
        scene.place(cell.scene, Vec2::new(x, y + cell_header));
    }
    if !headers.items.is_empty() {
        scene.push(headers);
    }
    if let Some(legend) = legend {
        scene.push(
            legend
                .arrange()
                .at(Vec2::new(grid_w + LEGEND_OFFSET, top)),
        );
    }
    Ok(scene)
}

#[cfg(test)]
#[path = "../../tests/unit/compile/compiler.rs"]
mod tests;
