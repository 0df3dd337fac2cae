use approx::assert_abs_diff_eq;
use chart_pipeline::ResourceChartConfig;
use chart_pipeline::api::{LevelSpecConfig, ZoomLevelConfig, default_zoom_levels};
use chart_pipeline::core::{
    Bounds, Boundable, DataSource, DateTimeScale, Drawable, Invalidatable, TimeUnit,
};
use chart_pipeline::interaction::{WheelInput, WheelPlatform};
use chart_pipeline::render::{RecordingSurface, VectorSurface};
use chart_pipeline::resource::{
    Activity, ActivityIterator, ActivityRegistry, Calendar, Resource, ResourceChart,
    TimeTrackingMode, ZoomLevelRef, ZoomLevels, clamp_start_pixel,
};
use proptest::prelude::*;

const DAY: f64 = 86_400_000.0;
const JAN_1_2024: f64 = 1_704_067_200_000.0;

/// 1000px of content (twenty 50px days) behind an 800px viewport.
fn configured_chart(surface: &mut RecordingSurface) -> ResourceChart {
    let config = ResourceChartConfig::default().with_zoom_levels(vec![
        ZoomLevelConfig::new(vec![LevelSpecConfig::new(TimeUnit::Day)]).with_unit_pix_size(50.0),
    ]);
    let mut chart = ResourceChart::new();
    chart.setup(&config).expect("setup");
    chart.set_resources(
        (0..8)
            .map(|index| {
                Resource::new(format!("crew {index}")).with_activity(
                    Activity::new(JAN_1_2024 + 0.25 * DAY, JAN_1_2024 + 19.5 * DAY)
                        .with_minutes_per_day(60.0),
                )
            })
            .collect(),
    );
    chart.set_parent_bounds(Some(Bounds::new(0.0, 0.0, 810.0, 362.0)));
    let stage = surface.create_layer(None);
    chart.set_container(Some(stage));
    chart.draw(surface).expect("draw");
    chart
}

#[test]
fn wheel_pan_from_the_origin_moves_by_the_delta() {
    let mut surface = RecordingSurface::new();
    let mut chart = configured_chart(&mut surface);
    let before = chart.viewport();
    assert_abs_diff_eq!(before.full_pixel_extent, 1000.0);
    assert_abs_diff_eq!(before.viewport_width, 800.0);
    assert_abs_diff_eq!(before.current_start_pixel, 0.0);

    assert!(chart.handle_wheel(WheelInput::new(100.0, 0.0, WheelPlatform::Other)));
    chart.draw(&mut surface).expect("draw");

    let after = chart.viewport();
    assert_abs_diff_eq!(after.current_start_pixel, 100.0, epsilon = 1e-9);
    let start = chart.current_start_date().expect("start date");
    assert_abs_diff_eq!(start, JAN_1_2024 + 2.0 * DAY, epsilon = 1e-3);
    let scale = chart.x_scale();
    assert_abs_diff_eq!(scale.pix_to_date(scale.date_to_pix(start)), start, epsilon = 1e-3);
    let (start_ratio, end_ratio) = after.x_ratios();
    assert_abs_diff_eq!(start_ratio, 0.1, epsilon = 1e-9);
    assert_abs_diff_eq!(end_ratio, 0.9, epsilon = 1e-9);
}

#[test]
fn start_date_before_the_data_pins_to_the_left_edge() {
    let mut surface = RecordingSurface::new();
    let mut chart = configured_chart(&mut surface);
    chart.set_current_start_date(JAN_1_2024 - 30.0 * DAY);
    chart.draw(&mut surface).expect("draw");
    assert_abs_diff_eq!(chart.viewport().current_start_pixel, 0.0);
    assert_abs_diff_eq!(
        chart.current_start_date().expect("start date"),
        JAN_1_2024,
        epsilon = 1e-3
    );
}

#[test]
fn activities_are_enumerated_across_resources() {
    let mut surface = RecordingSurface::new();
    let chart = configured_chart(&mut surface);
    let mut cursor = chart.activities();
    let mut visited = Vec::new();
    while cursor.advance() {
        visited.push((cursor.resource_index(), cursor.activity_index()));
    }
    assert_eq!(visited.len(), 8);
    assert_eq!(visited[3], (Some(3), Some(0)));
}

#[test]
fn activity_cursor_skips_empty_resources() {
    let registry = ActivityRegistry::from_counts([2, 0, 0, 1]);
    let mut cursor = ActivityIterator::new(&registry);
    assert_eq!(cursor.rows_count(), 3);
    assert!(cursor.select(2));
    assert_eq!(cursor.resource_index(), Some(3));
    assert_eq!(cursor.activity_index(), Some(0));
    assert!(!cursor.select(3));
    assert_eq!(cursor.index(), Some(2));
}

#[test]
fn zoom_references_clamp_or_miss() {
    let mut levels = ZoomLevels::new();
    assert!(levels.replace(&default_zoom_levels()));
    assert_eq!(levels.resolve(&ZoomLevelRef::Index(-3)), Some(0));
    assert_eq!(levels.resolve(&ZoomLevelRef::Index(40)), Some(2));
    assert_eq!(levels.resolve(&ZoomLevelRef::from("weeks")), Some(1));
    assert_eq!(levels.resolve(&ZoomLevelRef::from("fortnights")), None);

    assert!(levels.select(&ZoomLevelRef::from(2usize)).is_some());
    assert_eq!(levels.current_ref(), ZoomLevelRef::from("months"));
}

#[test]
fn zoom_changes_keep_the_chart_consistent_after_draw() {
    let mut surface = RecordingSurface::new();
    let mut chart = configured_chart(&mut surface);
    chart.set_zoom_levels(&default_zoom_levels());
    assert!(chart.set_zoom_level(ZoomLevelRef::from("days")));
    chart.draw(&mut surface).expect("draw");
    assert!(chart.is_consistent());
    assert_abs_diff_eq!(chart.x_scale().unit_pix_size(), 220.0);
    let viewport = chart.viewport();
    assert!(viewport.current_start_pixel <= viewport.max_start_pixel());
}

#[test]
fn availability_tracking_sizes_rows_by_working_time() {
    let mut surface = RecordingSurface::new();
    let mut chart = configured_chart(&mut surface);
    assert_abs_diff_eq!(chart.viewport().full_pixel_height, 432.0);

    let config = ResourceChartConfig::default()
        .with_time_tracking_mode(TimeTrackingMode::AvailabilityPerChart)
        .with_calendar(Calendar::default().with_working_minutes(480.0));
    chart.setup(&config).expect("setup");
    chart.draw(&mut surface).expect("draw");
    assert_eq!(chart.time_tracking_mode(), TimeTrackingMode::AvailabilityPerChart);
    assert_abs_diff_eq!(chart.viewport().full_pixel_height, 8.0 * 204.0);
    assert!(chart.rows().conflicts.is_empty());
    assert!(chart.is_consistent());
}

#[test]
fn overbooked_crew_gets_a_conflict_strip() {
    let mut surface = RecordingSurface::new();
    let mut chart = configured_chart(&mut surface);
    let mut resources = chart.resources().to_vec();
    resources[3] = resources[3].clone().with_activity(
        Activity::new(JAN_1_2024 + 0.25 * DAY, JAN_1_2024 + 19.5 * DAY).with_minutes_per_day(1_400.0),
    );
    chart.set_resources(resources);
    chart.draw(&mut surface).expect("draw");

    let rows = chart.rows();
    assert!(rows.has_conflicts(3));
    // Weekdays only, split by each weekend.
    assert!(rows.conflicts.iter().all(|span| span.resource == 3 && span.label == "0.35h (1.46%)"));
    assert_eq!(rows.conflicts.len(), 3);
    assert_eq!(rows.registry.total(), 9);
}

proptest! {
    #[test]
    fn clamped_start_stays_in_the_scrollable_range(
        start in -5_000.0f64..5_000.0,
        full in 0.0f64..4_000.0,
        viewport in 0.0f64..4_000.0,
    ) {
        let clamped = clamp_start_pixel(start, full, viewport);
        prop_assert!(clamped >= 0.0);
        prop_assert!(clamped <= (full - viewport).max(0.0));
        if viewport >= full {
            prop_assert_eq!(clamped, 0.0);
        }
        prop_assert_eq!(clamp_start_pixel(clamped, full, viewport), clamped);
    }

    #[test]
    fn date_pixel_mapping_round_trips(
        unit_index in 0usize..4,
        unit_pix_size in 1.0f64..400.0,
        offset_days in -400.0f64..400.0,
    ) {
        let unit = [TimeUnit::Hour, TimeUnit::Day, TimeUnit::Week, TimeUnit::Month][unit_index];
        let mut scale = DateTimeScale::new();
        scale.set_unit_spec(unit, 1, unit_pix_size);
        scale.set_start_date(JAN_1_2024);
        let date = JAN_1_2024 + offset_days * DAY;
        let round_trip = scale.pix_to_date(scale.date_to_pix(date));
        prop_assert!((round_trip - date).abs() <= 1.0);
        prop_assert!(scale.date_to_pix(JAN_1_2024).abs() <= 1e-6);
    }

    #[test]
    fn wheel_pan_lands_on_the_clamped_offset(dx in -300.0f64..600.0) {
        let mut surface = RecordingSurface::new();
        let mut chart = configured_chart(&mut surface);
        chart.handle_wheel(WheelInput::new(dx, 0.0, WheelPlatform::Other));
        chart.draw(&mut surface).expect("draw");
        let viewport = chart.viewport();
        let expected = clamp_start_pixel(dx, viewport.full_pixel_extent, viewport.viewport_width);
        prop_assert!((viewport.current_start_pixel - expected).abs() <= 1e-6);
    }
}
