/// Rounds an average score to the nearest half star for display.
///
/// Ties go away from zero (`f64::round`), so 3.25 shows as 3.5 stars.
pub fn star_score(average_score: f64) -> f64 {
    (average_score * 2.0).round() / 2.0
}
