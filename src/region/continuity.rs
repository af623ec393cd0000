use super::memory::MemoryRegion;
use super::RegionError;
use crate::template::NODES_PER_ELEMENT;

use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Local nodes of each element face: faces `2d` and `2d + 1` are ξ(d+1) = 0 and ξ(d+1) = 1.
///
/// The first node is the face origin; the second and third are its neighbours along the
/// two in-face directions.
const FACES: [[usize; 4]; 6] = [
    [0, 2, 4, 6],
    [1, 3, 5, 7],
    [0, 1, 4, 5],
    [2, 3, 6, 7],
    [0, 1, 2, 3],
    [4, 5, 6, 7],
];

/// Largest position mismatch found across the faces shared by two elements
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContinuityReport {
    pub shared_faces: usize,
    pub max_deviation: f64,
    /// The pair of elements where `max_deviation` occurs
    pub worst_pair: Option<(usize, usize)>,
}

fn corner(local_node: usize) -> [f64; 3] {
    [
        (local_node & 1) as f64,
        ((local_node >> 1) & 1) as f64,
        ((local_node >> 2) & 1) as f64,
    ]
}

/// ξ on a face given the face's origin corner and its two in-face neighbour corners
fn face_xi(origin: usize, along_s: usize, along_t: usize, s: f64, t: f64) -> [f64; 3] {
    let (o, a, b) = (corner(origin), corner(along_s), corner(along_t));
    [0, 1, 2].map(|d| o[d] + s * (a[d] - o[d]) + t * (b[d] - o[d]))
}

#[derive(Clone, Copy, Debug)]
struct FaceSide {
    element: usize,
    face: usize,
}

/// Sample every face shared by two committed elements on a `samples × samples` grid and
/// report the largest distance between the two elements' interpolated positions.
///
/// Faces are matched by their set of global node identifiers; the parametrisation of the
/// second element's face is recovered from where the first element's face corners appear.
pub fn check_faces(region: &MemoryRegion, samples: usize) -> Result<ContinuityReport, RegionError> {
    let mut faces: BTreeMap<[usize; 4], SmallVec<[FaceSide; 2]>> = BTreeMap::new();
    for element in region.elements() {
        let nodes = element.nodes()?;
        for (face, locals) in FACES.iter().enumerate() {
            let mut key = locals.map(|n| nodes[n]);
            key.sort_unstable();
            faces.entry(key).or_default().push(FaceSide {
                element: element.id,
                face,
            });
        }
    }

    let shared: Vec<(FaceSide, FaceSide)> = faces
        .values()
        .filter(|sides| sides.len() > 1)
        .flat_map(|sides| sides[1..].iter().map(move |other| (sides[0], *other)))
        .collect();

    let steps = samples.max(2);
    let deviations = shared
        .par_iter()
        .map(|(a, b)| face_deviation(region, *a, *b, steps).map(|d| (d, (a.element, b.element))))
        .collect::<Result<Vec<_>, RegionError>>()?;

    let worst = deviations
        .iter()
        .copied()
        .fold(None, |worst: Option<(f64, (usize, usize))>, candidate| match worst {
            Some(w) if w.0 >= candidate.0 => Some(w),
            _ => Some(candidate),
        });

    Ok(ContinuityReport {
        shared_faces: shared.len(),
        max_deviation: worst.map_or(0.0, |w| w.0),
        worst_pair: worst.map(|w| w.1),
    })
}

fn face_deviation(
    region: &MemoryRegion,
    a: FaceSide,
    b: FaceSide,
    steps: usize,
) -> Result<f64, RegionError> {
    let element_a = region
        .element(a.element)
        .ok_or(RegionError::ElementDoesntExist(a.element))?;
    let element_b = region
        .element(b.element)
        .ok_or(RegionError::ElementDoesntExist(b.element))?;
    let (nodes_a, nodes_b) = (element_a.nodes()?, element_b.nodes()?);

    let face_a = FACES[a.face];
    // local node of b that shares a global node with the given local node of a
    let matching = |local_a: usize| -> usize {
        let global = nodes_a[local_a];
        FACES[b.face]
            .iter()
            .copied()
            .find(|&local_b| nodes_b[local_b] == global)
            .unwrap_or(NODES_PER_ELEMENT)
    };
    let face_b = [matching(face_a[0]), matching(face_a[1]), matching(face_a[2])];
    if face_b.contains(&NODES_PER_ELEMENT) {
        return Ok(f64::INFINITY);
    }

    let mut max_deviation: f64 = 0.0;
    for i in 0..steps {
        for j in 0..steps {
            let s = i as f64 / (steps - 1) as f64;
            let t = j as f64 / (steps - 1) as f64;
            let xa = region.evaluate(a.element, face_xi(face_a[0], face_a[1], face_a[2], s, t))?;
            let xb = region.evaluate(b.element, face_xi(face_b[0], face_b[1], face_b[2], s, t))?;
            max_deviation = max_deviation.max((xa - xb).norm());
        }
    }
    Ok(max_deviation)
}
