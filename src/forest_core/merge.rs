use crate::forest_core::grid::Grid;

/// Cumulative height field: cell-wise maximum across per-species fields,
/// zero-filled when no species exist. Field order never matters.
pub fn merge_max(fields: &[&Grid<f32>], width: usize, height: usize) -> Grid<f32> {
    let mut out = Grid::filled(width, height, 0.0f32);
    for field in fields {
        for y in 0..height {
            for x in 0..width {
                let v = field.get(x, y);
                if v > out.get(x, y) {
                    out.set(x, y, v);
                }
            }
        }
    }
    out
}
