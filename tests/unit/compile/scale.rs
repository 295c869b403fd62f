use super::*;

fn text(s: &str) -> Datum {
    Datum::Text(s.to_string())
}

#[test]
fn nice_domain_rounds_outwards() {
    assert_eq!(nice_domain(0.0, 55.0, 5), (0.0, 60.0));
    assert_eq!(nice_domain(3.2, 97.0, 10), (0.0, 100.0));
    assert_eq!(nice_domain(0.0, 0.0, 5), (0.0, 1.0));
}

#[test]
fn linear_ticks_stay_inside_the_domain() {
    let s = LinearScale::new((0.0, 60.0), (350.0, 0.0));
    let ticks = s.ticks(6);
    let labels: Vec<&str> = ticks.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, ["0", "10", "20", "30", "40", "50", "60"]);
    assert_eq!(ticks[0].pos, 350.0);
    assert_eq!(ticks.last().unwrap().pos, 0.0);
}

#[test]
fn fractional_ticks_do_not_accumulate_float_noise() {
    let s = LinearScale::new((0.0, 1.0), (0.0, 100.0));
    let labels: Vec<String> = s.ticks(10).into_iter().map(|t| t.label).collect();
    assert!(labels.contains(&"0.3".to_string()), "{labels:?}");
}

#[test]
fn numbers_are_grouped_with_commas() {
    assert_eq!(format_number(1_234_567.0, 1.0), "1,234,567");
    assert_eq!(format_number(-2500.0, 500.0), "-2,500");
    assert_eq!(format_number(0.25, 0.05), "0.25");
    assert_eq!(format_number(-0.0, 1.0), "0");
}

#[test]
fn band_scale_matches_padding_math() {
    let s = BandScale::band(vec![text("A"), text("B")], (0.0, 500.0));
    let step = 500.0 / (2.0 - 0.1 + 0.1);
    assert!((s.step() - step).abs() < 1e-9);
    assert!((s.bandwidth() - step * 0.9).abs() < 1e-9);
    assert!((s.start(&text("A")).unwrap() - step * 0.05).abs() < 1e-9);
    assert!(s.start(&text("C")).is_none());
}

#[test]
fn point_scale_centers_a_single_value() {
    let s = BandScale::point(vec![text("only")], (0.0, 200.0));
    assert_eq!(s.bandwidth(), 0.0);
    assert_eq!(s.center(&text("only")), Some(100.0));
}

#[test]
fn time_ticks_follow_calendar_months() {
    let jan = date_ms(2024, 1, 1).unwrap();
    let dec = date_ms(2024, 12, 1).unwrap();
    let s = TimeScale::new((jan, dec), (0.0, 500.0));
    let labels: Vec<String> = s.ticks(6).into_iter().map(|t| t.label).collect();
    assert_eq!(labels, ["2024", "Apr", "Jul", "Oct"]);
}

#[test]
fn time_ticks_use_years_for_long_spans() {
    let a = date_ms(1990, 1, 1).unwrap();
    let b = date_ms(2020, 1, 1).unwrap();
    let labels: Vec<String> = TimeScale::new((a, b), (0.0, 500.0))
        .ticks(6)
        .into_iter()
        .map(|t| t.label)
        .collect();
    assert_eq!(labels, ["1990", "1995", "2000", "2005", "2010", "2015", "2020"]);
}

#[test]
fn position_scale_baseline_clamps_to_domain() {
    let s = PositionScale::Linear(LinearScale::new((10.0, 20.0), (100.0, 0.0)));
    assert_eq!(s.baseline(), 100.0);
    let s = PositionScale::Linear(LinearScale::new((-10.0, 10.0), (100.0, 0.0)));
    assert_eq!(s.baseline(), 50.0);
}

#[test]
fn ordinal_colors_cycle_through_tableau10() {
    let domain: Vec<Datum> = (0..12).map(|i| Datum::Number(f64::from(i))).collect();
    let s = ColorScale::Ordinal { domain };
    assert_eq!(s.map(&Datum::Number(0.0)).to_hex(), "#4c78a8");
    assert_eq!(s.map(&Datum::Number(1.0)).to_hex(), "#f58518");
    assert_eq!(s.map(&Datum::Number(10.0)), s.map(&Datum::Number(0.0)));
    assert_eq!(s.map(&text("unknown")), DEFAULT_MARK_COLOR);
}

#[test]
fn sequential_ramp_spans_light_to_dark() {
    let s = ColorScale::Sequential { domain: (0.0, 10.0) };
    assert_eq!(s.map(&Datum::Number(0.0)), RAMP_LOW);
    assert_eq!(s.map(&Datum::Number(10.0)), RAMP_HIGH);
}
