use std::fs;

use polycut::{deviation, flatten, Triangulator};

fn run_fixture(name: &str, expected_triangles: usize, max_deviation: f64) {
    // fixtures are arrays of rings: outer first, then holes
    type Rings = Vec<Vec<[f64; 2]>>;
    let raw = fs::read_to_string(format!("./tests/fixtures/{name}.json")).unwrap();
    let rings: Rings = serde_json::from_str(&raw).unwrap();

    let (coords, hole_starts) = flatten::<f64, u32>(&rings);

    let mut triangulator = Triangulator::new();
    let mut triangles = Vec::new();
    triangulator
        .triangulate(&coords, &hole_starts, &mut triangles)
        .unwrap();

    assert_eq!(triangles.len(), expected_triangles * 3);
    if !triangles.is_empty() {
        assert!(deviation(&coords, &hole_starts, &triangles) <= max_deviation);
    }
}

// a concave rectilinear hall, 12 vertices
#[test]
fn fixture_plaza() {
    run_fixture("plaza", 10, 0.0);
}

// the same hall with a rectangular courtyard cut out
#[test]
fn fixture_plaza_courtyard() {
    run_fixture("plaza-courtyard", 16, 0.0);
}

// 240-vertex zigzag ribbon; large enough to go through the Morton index
#[test]
fn fixture_ridge() {
    run_fixture("ridge", 238, 0.0);
}

// all vertices on one line; nothing to triangulate
#[test]
fn fixture_needle() {
    run_fixture("needle", 0, 0.0);
}
