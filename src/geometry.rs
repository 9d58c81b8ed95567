//! Placement of the clock and the paused caption on the screen.
//!
//! Nothing here is cached: the terminal can be resized at any moment, so
//! every draw asks for the current size and recomputes its origin.

/// Origin that centers a `block_w` x `block_h` block inside the container.
///
/// Computed as `(W - w) / 2` rather than `W/2 - w/2`, so that an 80x24
/// container with a 40x7 block gives `(20, 8)`.
///
/// Integer division truncates toward zero. A block larger than the
/// container gets a negative origin and is clipped when drawn.
pub fn center_block(container_w: i32, container_h: i32, block_w: i32, block_h: i32) -> (i32, i32) {
    ((container_w - block_w) / 2, (container_h - block_h) / 2)
}

/// Origin of a one-line caption, centered horizontally at three quarters of the height.
pub fn caption_origin(container_w: i32, container_h: i32, caption_w: i32) -> (i32, i32) {
    let (x, _) = center_block(container_w, container_h, caption_w, 1);
    (x, container_h * 3 / 4)
}

/// Clamp a size or count into a cell coordinate.
pub fn cells(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
