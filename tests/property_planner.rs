//! Property-based tests for gap analysis, chapter selection and path assembly

use proptest::prelude::*;

use cielo::domain::models::{ChapterRole, Curriculum, ScoreMap};
use cielo::services::{analyze_gaps, assemble_path, select_direct, verification_queue};

fn adaptive_ids() -> Vec<String> {
    Curriculum::builtin()
        .catalog
        .adaptive()
        .map(|c| c.id.clone())
        .collect()
}

/// Random ratings for a random subset of the adaptive chapters
fn score_map() -> impl Strategy<Value = ScoreMap> {
    let ids = adaptive_ids();
    proptest::collection::vec(proptest::option::of((1i64..=7, 1i64..=7)), ids.len()).prop_map(
        move |ratings| {
            let mut scores = ScoreMap::new();
            for (id, rating) in ids.iter().zip(ratings) {
                if let Some((capability, limitation)) = rating {
                    scores = scores.with(id.clone(), capability, limitation);
                }
            }
            scores
        },
    )
}

proptest! {
    #[test]
    fn gaps_cover_exactly_the_scored_adaptive_chapters(scores in score_map()) {
        let catalog = Curriculum::builtin().catalog;
        let gaps = analyze_gaps(&catalog, &scores);

        prop_assert_eq!(gaps.len(), scores.len());
        for (chapter, gap) in gaps.iter() {
            let entry = scores.get(chapter).unwrap();
            prop_assert_eq!(i64::from(gap), entry.capability - entry.limitation);
            prop_assert!((-6..=6).contains(&gap));
        }

        let positions: Vec<usize> = gaps.iter().map(|(c, _)| catalog.position(c).unwrap()).collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn direct_selection_is_sorted_and_stable(scores in score_map(), threshold in 1u8..=7) {
        let catalog = Curriculum::builtin().catalog;
        let gaps = analyze_gaps(&catalog, &scores);
        let selected = select_direct(&gaps, &scores, true, threshold);

        for pair in selected.windows(2) {
            let (a, b) = (gaps.get(&pair[0]).unwrap(), gaps.get(&pair[1]).unwrap());
            prop_assert!(a >= b);
            if a == b {
                prop_assert!(catalog.position(&pair[0]) < catalog.position(&pair[1]));
            }
        }

        for (chapter, gap) in gaps.iter() {
            let capability = scores.get(chapter).unwrap().capability;
            let kept = selected.iter().any(|c| c == chapter);
            prop_assert_eq!(kept, gap > 0 || capability < i64::from(threshold));
        }
    }

    #[test]
    fn unfiltered_selection_keeps_every_scored_chapter(scores in score_map()) {
        let catalog = Curriculum::builtin().catalog;
        let gaps = analyze_gaps(&catalog, &scores);
        prop_assert_eq!(select_direct(&gaps, &scores, false, 6).len(), gaps.len());
    }

    #[test]
    fn verification_queue_holds_only_positive_gaps(scores in score_map()) {
        let catalog = Curriculum::builtin().catalog;
        let gaps = analyze_gaps(&catalog, &scores);
        let queue = verification_queue(&gaps);

        let positive = gaps.iter().filter(|(_, g)| *g > 0).count();
        prop_assert_eq!(queue.len(), positive);
        prop_assert!(queue.iter().all(|c| gaps.get(c).unwrap() > 0));
    }

    #[test]
    fn assembled_path_is_wrapped_by_fixed_chapters(scores in score_map()) {
        let catalog = Curriculum::builtin().catalog;
        let gaps = analyze_gaps(&catalog, &scores);
        let mandatory = select_direct(&gaps, &scores, true, 6);
        let path = assemble_path(&catalog, &mandatory);

        prop_assert_eq!(path.len(), mandatory.len() + 3);
        prop_assert_eq!(path.get(0).unwrap(), catalog.opening().id.as_str());
        prop_assert_eq!(path.get(path.len() - 2).unwrap(), catalog.risk().id.as_str());
        prop_assert_eq!(path.get(path.len() - 1).unwrap(), catalog.closing().id.as_str());
        prop_assert_eq!(path.middle(), mandatory.as_slice());

        for chapter in path.chapters() {
            let count = path.chapters().iter().filter(|c| *c == chapter).count();
            prop_assert_eq!(count, 1);
        }
        for chapter in path.middle() {
            prop_assert_eq!(catalog.get(chapter).unwrap().role, ChapterRole::Adaptive);
        }
    }

    #[test]
    fn planning_is_deterministic(scores in score_map()) {
        let catalog = Curriculum::builtin().catalog;
        let first = assemble_path(
            &catalog,
            &select_direct(&analyze_gaps(&catalog, &scores), &scores, true, 6),
        );
        let second = assemble_path(
            &catalog,
            &select_direct(&analyze_gaps(&catalog, &scores), &scores, true, 6),
        );
        prop_assert_eq!(first, second);
    }
}
