/// The seam between the interpreter and whatever renders the drawing.
///
/// Callbacks arrive synchronously, in strict program order: statement order
/// first, then loop-iteration order (outer loop major). Nothing is buffered
/// and nothing is rolled back — if the run later fails, points that were
/// already delivered stay delivered, and the caller decides what to discard.
pub trait Canvas {
    /// One computed drawing point, already scaled, rotated and translated.
    fn point(&mut self, x: f64, y: f64);

    /// The current top-level loop has emitted its last point.
    fn line_complete(&mut self) {}

    /// The whole program has been consumed without error.
    fn program_complete(&mut self) {}
}
