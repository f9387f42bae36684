use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::otsu_level;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::geometry::{approximate_polygon_dp, arc_length};

use crate::marker::{MarkerDetection, Point2f, Quad};

/// Payload cells per marker row/column
const GRID: usize = 5;
/// Full glyph size in cells, payload plus the black border ring
const CELLS: usize = GRID + 2;
/// Cell size in the rectified patch
const CELL_PX: u32 = 10;
/// Rectified patch side length
const PATCH_PX: u32 = CELLS as u32 * CELL_PX;

/// Row codewords of the marker family, true = white cell. Each row carries
/// two data bits, at columns 1 (high) and 3 (low); the remaining columns
/// are parity, keeping every pair of codewords at distance >= 3. Five rows
/// of two bits give a 10-bit identifier, most significant row first.
const ROW_CODES: [[bool; GRID]; 4] = [
    [true, false, false, false, false],
    [true, false, true, true, true],
    [false, true, false, false, true],
    [false, true, true, true, false],
];

/// Tunables for marker detection
#[derive(Debug, Clone)]
pub struct DetectorParams {
    /// Radius of the local-mean window used for binarization
    pub block_radius: u32,
    /// Offset below the local mean at which a pixel counts as ink
    pub mean_offset: i32,
    /// Contours with a shorter perimeter than this are skipped
    pub min_perimeter: f64,
    /// Candidate quads with any side shorter than this are skipped
    pub min_side: f32,
    /// Polygon approximation tolerance as a fraction of the perimeter
    pub epsilon_frac: f64,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            block_radius: 15,
            mean_offset: 10,
            min_perimeter: 60.0,
            min_side: 12.0,
            epsilon_frac: 0.05,
        }
    }
}

/// Detect and decode every marker in the image. Corners come out in
/// canonical order (marker top-left first, then clockwise) regardless of
/// how the marker lies on the page.
pub fn detect_markers(gray: &GrayImage, params: &DetectorParams) -> Vec<MarkerDetection> {
    let binary = binarize(gray, params.block_radius, params.mean_offset);

    let mut detections = Vec::new();
    for quad in candidate_quads(&binary, params) {
        if let Some(detection) = decode_quad(gray, &quad) {
            detections.push(detection);
        }
    }
    detections
}

/// Summed-area table with a zero top/left border, so any rectangle sum is
/// four lookups
fn compute_integral_image(gray: &GrayImage) -> Vec<u64> {
    let (width, height) = gray.dimensions();
    let stride = width as usize + 1;
    let mut integral = vec![0u64; stride * (height as usize + 1)];

    for y in 0..height as usize {
        let mut row_sum = 0u64;
        for x in 0..width as usize {
            row_sum += gray.get_pixel(x as u32, y as u32)[0] as u64;
            integral[(y + 1) * stride + (x + 1)] = integral[y * stride + (x + 1)] + row_sum;
        }
    }
    integral
}

/// Mean intensity of the window around (cx, cy), clipped to the image
fn region_mean(integral: &[u64], width: u32, height: u32, cx: u32, cy: u32, radius: u32) -> f64 {
    let stride = width as usize + 1;
    let x0 = cx.saturating_sub(radius) as usize;
    let y0 = cy.saturating_sub(radius) as usize;
    let x1 = ((cx + radius).min(width - 1) + 1) as usize;
    let y1 = ((cy + radius).min(height - 1) + 1) as usize;

    let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
        - integral[y0 * stride + x1]
        - integral[y1 * stride + x0];
    sum as f64 / ((x1 - x0) * (y1 - y0)) as f64
}

/// Local-mean threshold: pixels darker than the surrounding mean by more
/// than `offset` become foreground (255). Robust against the uneven
/// lighting of photographed pages, where a single global threshold fails.
fn binarize(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let integral = compute_integral_image(gray);
    let mut binary = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mean = region_mean(&integral, width, height, x, y, block_radius);
            let threshold = mean - offset as f64;
            let value = if (gray.get_pixel(x, y)[0] as f64) < threshold {
                255
            } else {
                0
            };
            binary.put_pixel(x, y, Luma([value]));
        }
    }
    binary
}

/// Twice the signed area; positive means clockwise in screen coordinates
/// (y pointing down)
fn signed_area(quad: &Quad) -> f32 {
    let mut sum = 0.0;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        sum += a.x * b.y - b.x * a.y;
    }
    sum
}

fn is_convex(quad: &Quad) -> bool {
    let mut sign = 0.0f32;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let c = quad[(i + 2) % 4];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross != 0.0 {
            if sign != 0.0 && cross.signum() != sign {
                return false;
            }
            sign = cross.signum();
        }
    }
    true
}

fn min_side_length(quad: &Quad) -> f32 {
    (0..4)
        .map(|i| (quad[(i + 1) % 4] - quad[i]).norm())
        .fold(f32::INFINITY, f32::min)
}

/// Outer contours of the foreground reduced to convex quadrilaterals,
/// wound clockwise in screen coordinates
fn candidate_quads(binary: &GrayImage, params: &DetectorParams) -> Vec<Quad> {
    let contours = find_contours::<i32>(binary);

    let mut quads = Vec::new();
    for contour in &contours {
        if contour.border_type != BorderType::Outer {
            continue;
        }
        let perimeter = arc_length(&contour.points, true);
        if perimeter < params.min_perimeter {
            continue;
        }

        let polygon = approximate_polygon_dp(&contour.points, perimeter * params.epsilon_frac, true);
        if polygon.len() != 4 {
            continue;
        }

        let mut quad = [Point2f::new(0.0, 0.0); 4];
        for (corner, point) in quad.iter_mut().zip(polygon.iter()) {
            *corner = Point2f::new(point.x as f32, point.y as f32);
        }
        if signed_area(&quad) < 0.0 {
            quad.reverse();
        }
        if !is_convex(&quad) || min_side_length(&quad) < params.min_side {
            continue;
        }
        quads.push(quad);
    }
    quads
}

/// Perspective-warp the quad onto a square patch, one corner per patch
/// corner. Samples falling outside the source read as white, so partial
/// markers fail the border check instead of decoding garbage.
fn rectify_patch(gray: &GrayImage, quad: &Quad) -> Option<GrayImage> {
    let size = PATCH_PX as f32;
    let from = [
        (quad[0].x, quad[0].y),
        (quad[1].x, quad[1].y),
        (quad[2].x, quad[2].y),
        (quad[3].x, quad[3].y),
    ];
    let to = [(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)];
    let projection = Projection::from_control_points(from, to)?;

    let mut patch = GrayImage::new(PATCH_PX, PATCH_PX);
    warp_into(
        gray,
        &projection,
        Interpolation::Bilinear,
        Luma([255]),
        &mut patch,
    );
    Some(patch)
}

/// Classify each patch cell as white/black by majority over an inner
/// sample window, skipping 2 px of margin against cell bleed
fn sample_cells(patch: &GrayImage, threshold: u8) -> [[bool; CELLS]; CELLS] {
    let mut cells = [[false; CELLS]; CELLS];
    for row in 0..CELLS {
        for col in 0..CELLS {
            let mut white = 0u32;
            let mut total = 0u32;
            for y in (row as u32 * CELL_PX + 2)..((row as u32 + 1) * CELL_PX - 2) {
                for x in (col as u32 * CELL_PX + 2)..((col as u32 + 1) * CELL_PX - 2) {
                    if patch.get_pixel(x, y)[0] > threshold {
                        white += 1;
                    }
                    total += 1;
                }
            }
            cells[row][col] = white * 2 > total;
        }
    }
    cells
}

/// Strip the border ring, rejecting the patch unless every border cell is
/// black
fn payload_cells(cells: &[[bool; CELLS]; CELLS]) -> Option<[[bool; GRID]; GRID]> {
    for i in 0..CELLS {
        if cells[0][i] || cells[CELLS - 1][i] || cells[i][0] || cells[i][CELLS - 1] {
            return None;
        }
    }

    let mut payload = [[false; GRID]; GRID];
    for row in 0..GRID {
        for col in 0..GRID {
            payload[row][col] = cells[row + 1][col + 1];
        }
    }
    Some(payload)
}

/// Rotate a square cell grid a quarter turn clockwise
fn rotate_cells<const N: usize>(grid: &[[bool; N]; N]) -> [[bool; N]; N] {
    let mut rotated = [[false; N]; N];
    for row in 0..N {
        for col in 0..N {
            rotated[row][col] = grid[N - 1 - col][row];
        }
    }
    rotated
}

/// Total Hamming distance of the payload to the nearest codeword, per row
fn grid_distance(grid: &[[bool; GRID]; GRID]) -> u32 {
    grid.iter()
        .map(|row| {
            ROW_CODES
                .iter()
                .map(|code| {
                    row.iter()
                        .zip(code.iter())
                        .filter(|(a, b)| a != b)
                        .count() as u32
                })
                .min()
                .unwrap_or(u32::MAX)
        })
        .sum()
}

/// Identifier of an exactly-matching payload, two bits per row
fn grid_id(grid: &[[bool; GRID]; GRID]) -> Option<u32> {
    let mut id = 0u32;
    for row in grid {
        let data = ROW_CODES.iter().position(|code| code == row)?;
        id = (id << 2) | data as u32;
    }
    Some(id)
}

/// Decode one candidate quad against the marker family. Only an exact
/// (distance 0) codeword match at some rotation is accepted; the winning
/// rotation tells which detected corner is the marker's canonical
/// top-left.
fn decode_quad(gray: &GrayImage, quad: &Quad) -> Option<MarkerDetection> {
    let patch = rectify_patch(gray, quad)?;
    let threshold = otsu_level(&patch);
    let cells = sample_cells(&patch, threshold);
    let payload = payload_cells(&cells)?;

    let mut grid = payload;
    let mut matched = None;
    for rotation in 0..4usize {
        if rotation > 0 {
            grid = rotate_cells(&grid);
        }
        if grid_distance(&grid) == 0 {
            matched = grid_id(&grid).map(|id| (id, rotation));
            break;
        }
    }
    let (id, rotation) = matched?;

    let start = (4 - rotation) % 4;
    let corners = [
        quad[start],
        quad[(start + 1) % 4],
        quad[(start + 2) % 4],
        quad[(start + 3) % 4],
    ];
    Some(MarkerDetection { id, corners })
}

/// Render a marker glyph onto a grayscale canvas with its outer top-left
/// cell at (x, y). `quarter_turns` rotates the glyph clockwise, the way
/// inward-facing copies are laid out on a printed sheet. Identifiers are
/// 10 bits; the glyph must fit inside the canvas.
pub fn draw_marker(
    canvas: &mut GrayImage,
    x: u32,
    y: u32,
    cell_px: u32,
    id: u32,
    quarter_turns: u8,
) {
    let mut cells = [[false; CELLS]; CELLS];
    for row in 0..GRID {
        let data = ((id >> (2 * (GRID - 1 - row))) & 0b11) as usize;
        for col in 0..GRID {
            cells[row + 1][col + 1] = ROW_CODES[data][col];
        }
    }
    for _ in 0..(quarter_turns % 4) {
        cells = rotate_cells(&cells);
    }

    for row in 0..CELLS {
        for col in 0..CELLS {
            let value = if cells[row][col] { 255 } else { 0 };
            for dy in 0..cell_px {
                for dx in 0..cell_px {
                    canvas.put_pixel(
                        x + col as u32 * cell_px + dx,
                        y + row as u32 * cell_px + dy,
                        Luma([value]),
                    );
                }
            }
        }
    }
}
