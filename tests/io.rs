use std::fs::File;
use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use spinmap::config::{Parcellation, SurfaceName};
use spinmap::io::{
    read_brain_map, read_connectome, read_epicentre_json, read_surface, spin_json,
    write_epicentre_json, write_store_json,
};
use spinmap::results::{ResultKey, ResultStore};
use spinmap::types::{EpicentreResult, SpinResult};
use sphererot::{Compartment, Hemisphere};
use tempfile::tempdir;

#[test]
fn reads_labelled_csv_map() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("map.csv");
    std::fs::write(&path, "region,value\nlh_a,0.5\nlh_b,-1.25\nrh_a,3\n").expect("write");

    let map = read_brain_map(&path).expect("read");
    assert_eq!(map.values, vec![0.5, -1.25, 3.0]);
    assert_eq!(
        map.labels,
        Some(vec!["lh_a".to_string(), "lh_b".to_string(), "rh_a".to_string()])
    );
}

#[test]
fn reads_unlabelled_whitespace_map() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("map.txt");
    std::fs::write(&path, "thickness\n1.5\n2\n-0.25\n").expect("write");

    let map = read_brain_map(&path).expect("read");
    assert_eq!(map.values, vec![1.5, 2.0, -0.25]);
    assert!(map.labels.is_none());
}

#[test]
fn missing_map_value_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("map.tsv");
    std::fs::write(&path, "region\tvalue\nlh_a\t0.5\nlh_b\tNA\n").expect("write");
    assert!(read_brain_map(&path).is_err());
}

#[test]
fn reads_labelled_connectome() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("fc.csv");
    std::fs::write(&path, "seed,lh_a,lh_b\nlh_a,1,0.25\nlh_b,0.25,1\n").expect("write");

    let connectome = read_connectome(&path).expect("read");
    assert_eq!(connectome.n_seeds(), 2);
    assert_eq!(connectome.n_targets(), 2);
    assert_eq!(connectome.values()[(0, 1)], 0.25);
    assert_eq!(
        connectome.row_labels(),
        Some(&["lh_a".to_string(), "lh_b".to_string()][..])
    );
    assert_eq!(
        connectome.column_labels(),
        Some(&["lh_a".to_string(), "lh_b".to_string()][..])
    );
}

#[test]
fn reads_gzipped_surface_table() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("sphere.tsv.gz");
    let file = File::create(&path).expect("create");
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(
            b"region\themisphere\tx\ty\tz\nlh_a\tL\t1\t0\t0\nlh_b\tL\t0\t1\t0\nrh_a\tR\t-1\t0\t0\nrh_b\tR\t0\t0\t1\n",
        )
        .expect("write");
    encoder.finish().expect("finish");

    let surface = read_surface(&path, SurfaceName::Fsa5, Parcellation::Aparc).expect("read");
    assert_eq!(surface.len(), 4);
    assert_eq!(surface.labels(), vec!["lh_a", "lh_b", "rh_a", "rh_b"]);
    assert_eq!(surface.regions()[2].hemisphere, Hemisphere::Right);
    assert_eq!(surface.regions()[3].point, [0.0, 0.0, 1.0]);
}

#[test]
fn unknown_hemisphere_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("sphere.csv");
    std::fs::write(&path, "region,hemisphere,x,y,z\nlh_a,middle,1,0,0\n").expect("write");
    assert!(read_surface(&path, SurfaceName::Fsa5, Parcellation::Aparc).is_err());
}

#[test]
fn epicentre_json_reads_back() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("epi.json");
    let result = EpicentreResult {
        seeds: vec!["lh_a".to_string(), "lh \"b\"".to_string()],
        r: vec![0.125, -0.5],
        p: vec![0.01, 0.75],
    };
    write_epicentre_json(&result, &path).expect("write");
    let back = read_epicentre_json(&path).expect("read");
    assert_eq!(back, result);
}

#[test]
fn spin_json_writes_null_for_absent_fields() {
    let result = SpinResult {
        r: 0.5,
        p: 0.25,
        null: None,
        rotation_count: 3,
        identity_rotations: 0,
        seed: None,
    };
    let json = spin_json(&result);
    assert!(json.contains("\"seed\":null"));
    assert!(json.contains("\"null\":null"));
    assert!(json.contains("\"rotation_count\":3"));

    let with_null = SpinResult {
        null: Some(vec![0.1, f64::NAN]),
        seed: Some(7),
        ..result
    };
    let json = spin_json(&with_null);
    assert!(json.contains("\"seed\":7"));
    assert!(json.contains("\"null\":[0.1,null]"));
}

#[test]
fn surface_compartments_come_from_column_or_parcellation() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("sphere.csv");
    std::fs::write(
        &path,
        "region,hemisphere,compartment,x,y,z\nlh_a,L,ctx,1,0,0\nlh_thal,L,sctx,0,1,0\nrh_a,R,ctx,-1,0,0\n",
    )
    .expect("write");
    let surface =
        read_surface(&path, SurfaceName::Fsa5WithSctx, Parcellation::AparcAseg).expect("read");
    let compartments: Vec<Compartment> =
        surface.regions().iter().map(|r| r.compartment).collect();
    assert_eq!(
        compartments,
        vec![Compartment::Cortex, Compartment::Subcortex, Compartment::Cortex]
    );

    let mut table = String::from("region,hemisphere,x,y,z\n");
    for i in 0..70 {
        let hemi = if i % 2 == 0 { "L" } else { "R" };
        table.push_str(&format!("r{i},{hemi},1,{i},2\n"));
    }
    let path = dir.path().join("aseg.csv");
    std::fs::write(&path, table).expect("write");
    let surface =
        read_surface(&path, SurfaceName::Fsa5WithSctx, Parcellation::AparcAseg).expect("read");
    assert_eq!(surface.regions()[67].compartment, Compartment::Cortex);
    assert_eq!(surface.regions()[68].compartment, Compartment::Subcortex);
    assert_eq!(surface.regions()[69].compartment, Compartment::Subcortex);
}

#[test]
fn result_store_is_written_in_key_order() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("cohorts.json");
    let result = |r: f64| SpinResult {
        r,
        p: 0.5,
        null: None,
        rotation_count: 1,
        identity_rotations: 0,
        seed: Some(4),
    };
    let mut store = ResultStore::new();
    store
        .insert(ResultKey::new("tle", Hemisphere::Right), result(0.25))
        .expect("insert");
    store
        .insert(ResultKey::new("ige", Hemisphere::Left), result(-0.5))
        .expect("insert");
    write_store_json(&store, spin_json, &path).expect("write");

    let text = std::fs::read_to_string(&path).expect("read");
    let ige = text.find("\"ige:L\":{\"r\":-0.5,").expect("ige entry");
    let tle = text.find("\"tle:R\":{\"r\":0.25,").expect("tle entry");
    assert!(ige < tle);
    assert!(text.trim_end().starts_with('{') && text.trim_end().ends_with('}'));
}
