mod common;

use common::{cortical_surface, seeded_config, smooth_map};
use ndarray::array;
use spinmap::SpinMapError;
use spinmap::atrophy::zscore_flip;
use spinmap::correlation::{pearson, pearson_test};
use spinmap::results::{ResultKey, ResultStore, cohort_spin_tests};
use spinmap::spin::spatial_correlation;
use spinmap::similarity::{cross_similarity, pairwise_similarity, significance_fraction};
use spinmap::types::BrainMap;
use sphererot::Hemisphere;

#[test]
fn pearson_matches_hand_computation() {
    let x = [1.0, 2.0, 3.0, 4.0, 5.0];
    let y = [2.0, 4.0, 5.0, 4.0, 5.0];
    let r = pearson(&x, &y, "x", "y").expect("pearson");
    assert!((r - 6.0 / 60f64.sqrt()).abs() < 1e-12);

    let test = pearson_test(&x, &y, "x", "y").expect("test");
    assert!((test.r2 - 0.6).abs() < 1e-12);
    assert!((test.t - 7.5f64.sqrt() * r).abs() < 1e-9);
    assert!((test.p - 0.1240).abs() < 1e-3);
}

#[test]
fn perfect_parametric_correlation_has_zero_p() {
    let x = [1.0, 2.0, 3.0, 4.0];
    let y = [2.0, 4.0, 6.0, 8.0];
    let test = pearson_test(&x, &y, "x", "y").expect("test");
    assert_eq!(test.p, 0.0);
}

#[test]
fn pairwise_similarity_is_symmetric() {
    let surface = cortical_surface();
    let maps = vec![
        ("a".to_string(), BrainMap::new(smooth_map(&surface, 1.0, 0.0, 0.0))),
        ("b".to_string(), BrainMap::new(smooth_map(&surface, 0.7, 0.7, 0.0))),
        ("c".to_string(), BrainMap::new(smooth_map(&surface, 0.0, 0.0, 1.0))),
    ];
    let matrix =
        pairwise_similarity(&maps, &surface, &seeded_config(20, 6), None).expect("similarity");
    assert_eq!(matrix.r.dim(), (3, 3));
    for i in 0..3 {
        assert!((matrix.r[(i, i)] - 1.0).abs() < 1e-12);
        for j in 0..3 {
            assert_eq!(matrix.r[(i, j)], matrix.r[(j, i)]);
            assert_eq!(matrix.p[(i, j)], matrix.p[(j, i)]);
        }
    }
    assert_eq!(matrix.row_labels, vec!["a", "b", "c"]);
}

#[test]
fn cross_similarity_has_rows_by_columns() {
    let surface = cortical_surface();
    let rows = vec![
        ("pt_0.1".to_string(), BrainMap::new(smooth_map(&surface, 1.0, 0.2, 0.0))),
        ("pt_0.5".to_string(), BrainMap::new(smooth_map(&surface, 0.9, 0.3, 0.0))),
    ];
    let columns = vec![
        ("ltle".to_string(), BrainMap::new(smooth_map(&surface, 0.0, 1.0, 0.0))),
        ("rtle".to_string(), BrainMap::new(smooth_map(&surface, 0.0, 0.5, 0.5))),
        ("ige".to_string(), BrainMap::new(smooth_map(&surface, 0.4, 0.0, 0.8))),
    ];
    let matrix = cross_similarity(&rows, &columns, &surface, &seeded_config(10, 2), None)
        .expect("cross");
    assert_eq!(matrix.r.dim(), (2, 3));
    assert_eq!(matrix.column_labels, vec!["ltle", "rtle", "ige"]);
    assert!(matrix.p.iter().all(|p| (0.0..=1.0).contains(p)));
}

#[test]
fn significance_fraction_counts_per_region() {
    let p_maps = vec![
        vec![0.01, 0.2, 0.04],
        vec![0.03, 0.5, 0.9],
        vec![0.2, 0.01, 0.02],
        vec![0.001, 0.6, 0.05],
    ];
    let fraction = significance_fraction(&p_maps, 0.05).expect("fraction");
    assert_eq!(fraction, vec![0.75, 0.25, 0.5]);

    assert!(significance_fraction(&p_maps, 1.5).is_err());
    let ragged = vec![vec![0.1, 0.2], vec![0.3]];
    assert!(matches!(
        significance_fraction(&ragged, 0.05),
        Err(SpinMapError::Configuration(_))
    ));
}

#[test]
fn zscore_flip_swaps_right_focus_subjects() {
    let data = array![
        [1.0, 2.0, 10.0, 20.0],
        [3.0, 4.0, 12.0, 24.0],
        [2.0, 3.0, 14.0, 22.0],
        [5.0, 6.0, 11.0, 21.0],
    ];
    let groups: Vec<String> = ["C", "C", "L", "R"].iter().map(|s| s.to_string()).collect();
    let z = zscore_flip(&data, &groups, "C", "R").expect("zscore");

    // control mean/sd per region: (2, sqrt 2), (3, sqrt 2), (11, sqrt 2), (22, 2 sqrt 2)
    let sqrt2 = 2f64.sqrt();
    assert!((z[(2, 0)] - 0.0).abs() < 1e-12);
    assert!((z[(2, 2)] - 3.0 / sqrt2).abs() < 1e-12);
    // right-focus subject: halves swapped
    assert!((z[(3, 0)] - 0.0).abs() < 1e-12);
    assert!((z[(3, 1)] - (-1.0 / (2.0 * sqrt2))).abs() < 1e-12);
    assert!((z[(3, 2)] - 3.0 / sqrt2).abs() < 1e-12);
    assert!((z[(3, 3)] - 3.0 / sqrt2).abs() < 1e-12);
}

#[test]
fn zscore_flip_rejects_degenerate_controls() {
    let data = array![[1.0, 2.0], [1.0, 3.0], [4.0, 5.0]];
    let groups: Vec<String> = ["C", "C", "L"].iter().map(|s| s.to_string()).collect();
    let err = zscore_flip(&data, &groups, "C", "R").expect_err("zero variance");
    assert!(matches!(err, SpinMapError::Numerical(_)));

    let odd = array![[1.0, 2.0, 3.0], [2.0, 3.0, 4.0]];
    let groups: Vec<String> = ["C", "C"].iter().map(|s| s.to_string()).collect();
    assert!(matches!(
        zscore_flip(&odd, &groups, "C", "R"),
        Err(SpinMapError::Configuration(_))
    ));
}

#[test]
fn result_store_rejects_duplicate_keys() {
    let mut store = ResultStore::new();
    store
        .insert(ResultKey::new("multi", Hemisphere::Left), 0.4)
        .expect("first");
    store
        .insert(ResultKey::new("multi", Hemisphere::Right), 0.1)
        .expect("second");
    let err = store
        .insert(ResultKey::new("multi", Hemisphere::Left), 0.9)
        .expect_err("duplicate");
    assert!(matches!(err, SpinMapError::Configuration(msg) if msg.contains("multi:L")));
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(&ResultKey::new("multi", Hemisphere::Left)), Some(&0.4));
}

#[test]
fn result_keys_parse_from_cohort_and_hemisphere() {
    let key: ResultKey = "tle:L".parse().expect("key");
    assert_eq!(key, ResultKey::new("tle", Hemisphere::Left));
    assert_eq!(key.to_string(), "tle:L");
    assert!("tle".parse::<ResultKey>().is_err());
    assert!(":R".parse::<ResultKey>().is_err());
    assert!("tle:both".parse::<ResultKey>().is_err());
}

#[test]
fn cohort_spin_tests_share_one_rotation_stream() {
    let surface = cortical_surface();
    let reference = smooth_map(&surface, 0.0, 1.0, 0.3);
    let left = smooth_map(&surface, 0.1, 0.9, 0.2);
    let right = smooth_map(&surface, 0.8, 0.0, 0.4);
    let maps = vec![
        (ResultKey::new("tle", Hemisphere::Right), right.clone()),
        (ResultKey::new("tle", Hemisphere::Left), left.clone()),
    ];
    let config = seeded_config(40, 19);
    let store = cohort_spin_tests(&maps, &reference, &surface, &config, None).expect("cohorts");
    assert_eq!(store.len(), 2);

    let keys: Vec<String> = store.iter().map(|(k, _)| k.to_string()).collect();
    assert_eq!(keys, vec!["tle:L", "tle:R"]);

    let direct = spatial_correlation(&left, &reference, &surface, &config).expect("direct");
    let stored = store
        .get(&ResultKey::new("tle", Hemisphere::Left))
        .expect("left result");
    assert_eq!(*stored, direct);

    let duplicated = vec![
        (ResultKey::new("ige", Hemisphere::Left), left.clone()),
        (ResultKey::new("ige", Hemisphere::Left), right),
    ];
    assert!(matches!(
        cohort_spin_tests(&duplicated, &reference, &surface, &config, None),
        Err(SpinMapError::Configuration(_))
    ));
}
