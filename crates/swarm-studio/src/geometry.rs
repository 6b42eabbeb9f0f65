//! Unit box mesh.

/// Non-indexed-per-face box: 4 vertices per face so each face has its own normal.
#[derive(Debug, Clone)]
pub struct BoxGeometry {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub indices: Vec<u16>,
}

//   6 ---- 4
//  /|     /|
// 0 ---- 2 |
// | 7 -- | 5
// |/     |/
// 1 ---- 3
const CORNERS: [[f32; 3]; 8] = [
    [-0.5, 0.5, 0.5],
    [-0.5, -0.5, 0.5],
    [0.5, 0.5, 0.5],
    [0.5, -0.5, 0.5],
    [0.5, 0.5, -0.5],
    [0.5, -0.5, -0.5],
    [-0.5, 0.5, -0.5],
    [-0.5, -0.5, -0.5],
];

/// Corner indices per face: front, right, back, left, top, bottom.
const FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [2, 3, 4, 5],
    [4, 5, 6, 7],
    [6, 7, 0, 1],
    [6, 0, 4, 2],
    [1, 7, 3, 5],
];

const NORMALS: [[f32; 3]; 6] = [
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 0.0],
    [0.0, 0.0, -1.0],
    [-1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, -1.0, 0.0],
];

const FACE_UVS: [f32; 8] = [0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0];

impl BoxGeometry {
    pub fn unit() -> Self {
        let mut positions = Vec::with_capacity(6 * 4 * 3);
        let mut normals = Vec::with_capacity(6 * 4 * 3);
        let mut uvs = Vec::with_capacity(6 * 8);
        let mut indices = Vec::with_capacity(6 * 6);

        for (face, (corners, normal)) in FACES.iter().zip(NORMALS).enumerate() {
            for &corner in corners {
                positions.extend_from_slice(&CORNERS[corner]);
                normals.extend_from_slice(&normal);
            }
            uvs.extend_from_slice(&FACE_UVS);

            let base = (face * 4) as u16;
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 1, base + 3]);
        }

        Self {
            positions,
            normals,
            uvs,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}
