use approx::assert_relative_eq;
use chart_pipeline::axis::{
    Axis, FixedSizeMeasurer, OverlapMode, StaggerSettings, resolve_ordinal_overlap,
    resolve_stagger,
};
use chart_pipeline::core::{Bounds, Boundable, Drawable, OrdinalScale};
use chart_pipeline::render::{RecordingSurface, VectorSurface};
use proptest::prelude::*;

fn row_of_labels(count: usize, spacing: f64, width: f64) -> Vec<Option<Bounds>> {
    (0..count)
        .map(|index| Some(Bounds::new(index as f64 * spacing, 0.0, width, 12.0)))
        .collect()
}

fn ordinal_axis(count: usize) -> Axis {
    let mut axis = Axis::new();
    let values = (0..count).map(|index| format!("c{index}")).collect();
    axis.set_scale(Some(Box::new(OrdinalScale::new(values))));
    axis.set_measurer(Box::new(FixedSizeMeasurer::new(40.0, 12.0)));
    axis.set_parent_bounds(Some(Bounds::new(0.0, 0.0, 150.0, 100.0)));
    axis
}

#[test]
fn dense_labels_keep_every_other_one() {
    // 40px boxes every 30px: each label hits both neighbors.
    let bounds = row_of_labels(5, 30.0, 40.0);
    assert_eq!(
        resolve_ordinal_overlap(&bounds, true, true),
        vec![true, false, true, false, true]
    );
}

#[test]
fn axis_draws_the_walk_forward_selection_once() {
    let mut surface = RecordingSurface::new();
    let stage = surface.create_layer(None);
    let mut axis = ordinal_axis(5);
    axis.set_container(Some(stage));

    assert_eq!(axis.labels_to_draw().labels, vec![true, false, true, false, true]);
    axis.draw(&mut surface).expect("draw");
    let texts: Vec<&str> = surface
        .visible_texts()
        .iter()
        .map(|text| text.text.as_str())
        .collect();
    assert_eq!(texts, vec!["c0", "c2", "c4"]);

    let calls = axis.measure_calls();
    axis.draw(&mut surface).expect("redraw");
    assert_eq!(axis.measure_calls(), calls);
}

#[test]
fn hidden_last_label_frees_its_neighbor() {
    let mut axis = ordinal_axis(5);
    axis.set_draw_last_label(false);
    assert_eq!(axis.labels_to_draw().labels, vec![true, false, true, false, false]);

    axis.set_draw_first_label(false);
    assert_eq!(axis.labels_to_draw().labels, vec![false, true, false, true, false]);
}

#[test]
fn allow_overlap_keeps_every_label() {
    let mut axis = ordinal_axis(5);
    axis.set_overlap_mode(OverlapMode::AllowOverlap);
    assert_eq!(axis.labels_to_draw().drawn_count(), 5);
}

#[test]
fn neighbor_collisions_stagger_over_two_lines() {
    let layout = resolve_stagger(&row_of_labels(5, 30.0, 40.0), &StaggerSettings::default());
    assert_eq!(layout.lines, 2);
    assert!(layout.states.iter().all(|drawn| *drawn));
    assert_eq!(layout.line_members, vec![vec![0, 2, 4], vec![1, 3]]);
    assert_relative_eq!(layout.line_offset(1), 12.0);
    assert_relative_eq!(layout.total_size(), 24.0);
}

#[test]
fn capped_stagger_drops_inside_lines() {
    // Every label overlaps its two successors, so three lines would be needed.
    let bounds = row_of_labels(7, 20.0, 45.0);
    let layout = resolve_stagger(
        &bounds,
        &StaggerSettings {
            max_lines: Some(2),
            ..StaggerSettings::default()
        },
    );
    assert_eq!(layout.lines, 2);
    assert_eq!(layout.auto_lines, 3);
    assert!(layout.states[0]);
    assert!(layout.states[6]);
    assert!(layout.states.iter().any(|drawn| !drawn));
}

prop_compose! {
    fn label_row()(count in 2usize..24, spacing in 5.0f64..60.0, width in 1.0f64..80.0)
        -> Vec<Option<Bounds>> {
        row_of_labels(count, spacing, width)
    }
}

prop_compose! {
    fn uneven_label_row()(boxes in proptest::collection::vec((0.0f64..60.0, 1.0f64..150.0), 2..24))
        -> Vec<Option<Bounds>> {
        let mut left = 0.0;
        boxes
            .into_iter()
            .map(|(step, width)| {
                left += step;
                Some(Bounds::new(left, 0.0, width, 12.0))
            })
            .collect()
    }
}

proptest! {
    #[test]
    fn first_and_last_follow_their_flags(
        bounds in label_row(),
        draw_first in any::<bool>(),
        draw_last in any::<bool>(),
    ) {
        let states = resolve_ordinal_overlap(&bounds, draw_first, draw_last);
        prop_assert_eq!(states.len(), bounds.len());
        prop_assert_eq!(states[0], draw_first);
        prop_assert_eq!(states[bounds.len() - 1], draw_last);
    }

    #[test]
    fn drawn_middle_labels_never_touch_their_predecessor(bounds in label_row()) {
        let states = resolve_ordinal_overlap(&bounds, true, true);
        let last = bounds.len() - 1;
        let drawn: Vec<usize> = (0..bounds.len()).filter(|index| states[*index]).collect();
        for pair in drawn.windows(2) {
            if pair[1] == last {
                continue;
            }
            let (prev, own) = (bounds[pair[0]].expect("box"), bounds[pair[1]].expect("box"));
            prop_assert!(!own.intersects(Some(&prev)));
        }
        for index in drawn.iter().copied().filter(|index| *index != 0 && *index != last) {
            let own = bounds[index].expect("box");
            prop_assert!(!own.intersects(bounds[last].as_ref()));
        }
    }

    #[test]
    fn disjoint_labels_are_all_drawn(count in 2usize..30, width in 1.0f64..50.0, gap in 0.5f64..20.0) {
        let bounds = row_of_labels(count, width + gap, width);
        prop_assert!(resolve_ordinal_overlap(&bounds, true, true).iter().all(|drawn| *drawn));
    }

    #[test]
    fn single_line_stagger_is_plain_overlap(
        bounds in label_row(),
        draw_first in any::<bool>(),
        draw_last in any::<bool>(),
    ) {
        let layout = resolve_stagger(
            &bounds,
            &StaggerSettings {
                lines: Some(1),
                draw_first,
                draw_last,
                ..StaggerSettings::default()
            },
        );
        prop_assert_eq!(layout.states, resolve_ordinal_overlap(&bounds, draw_first, draw_last));
    }

    #[test]
    fn auto_stagger_lines_are_collision_free(bounds in label_row()) {
        let layout = resolve_stagger(&bounds, &StaggerSettings::default());
        prop_assert!(layout.lines >= 1);
        prop_assert!(layout.lines <= bounds.len());
        prop_assert!(layout.states.iter().all(|drawn| *drawn));
        for members in &layout.line_members {
            for pair in members.windows(2) {
                let (prev, own) = (bounds[pair[0]].expect("box"), bounds[pair[1]].expect("box"));
                prop_assert!(!own.intersects(Some(&prev)));
            }
        }
    }

    #[test]
    fn neighbor_only_collisions_need_two_lines(count in 2usize..40) {
        let layout = resolve_stagger(&row_of_labels(count, 30.0, 40.0), &StaggerSettings::default());
        prop_assert_eq!(layout.lines, 2);
        prop_assert_eq!(layout.auto_lines, 2);
    }

    #[test]
    fn limited_lines_keep_line_neighbors_apart(bounds in uneven_label_row(), lines in 1usize..5) {
        let layout = resolve_stagger(
            &bounds,
            &StaggerSettings {
                lines: Some(lines),
                ..StaggerSettings::default()
            },
        );
        let last = bounds.len() - 1;
        for (line, members) in layout.line_members.iter().enumerate() {
            prop_assert!(members.iter().all(|index| index % layout.lines == line));
            for pair in members.windows(2) {
                // Both forced labels are drawn regardless of each other.
                if pair[0] == 0 && pair[1] == last {
                    continue;
                }
                let (prev, own) = (bounds[pair[0]].expect("box"), bounds[pair[1]].expect("box"));
                prop_assert!(!own.intersects(Some(&prev)), "labels {} and {} share a line", pair[0], pair[1]);
            }
        }
    }
}
