//! Triangulate a small polygon with a hole and print the mesh.
//!
//! Run with `cargo run --example triangulate`.

use polycut::{deviation, flatten, Triangulator};

fn main() {
    // an L-shaped room with a square pillar cut out
    let rings = vec![
        vec![
            [0.0, 0.0],
            [60.0, 0.0],
            [60.0, 30.0],
            [30.0, 30.0],
            [30.0, 60.0],
            [0.0, 60.0],
        ],
        vec![[10.0, 10.0], [10.0, 20.0], [20.0, 20.0], [20.0, 10.0]],
    ];

    let (coords, hole_starts) = flatten::<f64, u32>(&rings);

    let mut triangulator = Triangulator::new();
    let mut triangles = Vec::new();
    triangulator
        .triangulate(&coords, &hole_starts, &mut triangles)
        .expect("valid input buffers");

    println!("{} triangles:", triangles.len() / 3);
    for tri in triangles.chunks_exact(3) {
        let v = |i: u32| (coords[2 * i as usize], coords[2 * i as usize + 1]);
        println!(
            "  [{} {} {}]  {:?} {:?} {:?}",
            tri[0],
            tri[1],
            tri[2],
            v(tri[0]),
            v(tri[1]),
            v(tri[2])
        );
    }
    println!(
        "area deviation: {:e}",
        deviation(&coords, &hole_starts, &triangles)
    );
}
